use serde_json::Number;
use thiserror::Error;

use super::Command;
use crate::engine::{Store, StoreError};
use crate::models::{Address, User};

/// Runs one command against the store and produces the lines to show the user.
#[derive(Clone, Debug)]
pub struct CommandProcessor {
    store: Store,
}

impl CommandProcessor {
    pub fn new(store: Store) -> CommandProcessor {
        CommandProcessor { store }
    }

    /// Never fails, errors are turned into a message just like successes.
    pub async fn process(&self, command: Command) -> Vec<String> {
        let verb = match &command {
            Command::Write { .. } => "writing user",
            Command::Read { .. } => "reading user",
            Command::ReadAll { .. } => "reading all records",
            Command::Delete { .. } => "deleting user",
        };

        match self.execute(command).await {
            Ok(lines) => lines,
            Err(e) => {
                debug!("Command failed: {0:?}", e);
                vec![format!("Error {0}: {1}", verb, e)]
            }
        }
    }

    pub async fn execute(&self, command: Command) -> Result<Vec<String>, CommandProcessorError> {
        match command {
            Command::Write {
                collection,
                name,
                age,
                contact,
                company,
                address,
            } => {
                let age: Number = age
                    .parse()
                    .map_err(|_| CommandProcessorError::InvalidAge(age.clone()))?;
                let user = User {
                    name: name.clone(),
                    age,
                    contact,
                    company,
                    address: Address::in_city(address),
                };

                self.store.write(&collection, &name, &user).await?;
                Ok(vec!["User written successfully".to_string()])
            }
            Command::Read { collection, name } => {
                let user: User = self.store.read(&collection, &name).await?;
                Ok(vec![format!("User: {0:?}", user)])
            }
            Command::ReadAll { collection } => Ok(self.store.read_all(&collection).await?),
            Command::Delete { collection, name } => {
                self.store.delete(&collection, &name).await?;
                Ok(vec!["User deleted successfully".to_string()])
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum CommandProcessorError {
    #[error("Age must be a number, got {0}")]
    InvalidAge(String),
    #[error(transparent)]
    StoreError(#[from] StoreError),
}
