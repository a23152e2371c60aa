use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::constants::DEFAULT_DATA_DIR;

#[derive(Debug, Parser)]
#[command(name = "folio")]
#[command(author, version, about = "A CLI for interacting with the users database", long_about = None)]
pub struct Cli {
    /// Directory to store data
    #[arg(short, long, global = true, env = "FOLIO_DIR", default_value = DEFAULT_DATA_DIR)]
    pub dir: PathBuf,

    /// Log what the store is doing
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Remove temp files left behind by interrupted writes before running the command
    #[arg(long, global = true)]
    pub sweep: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Clone, Debug, PartialEq, Subcommand)]
pub enum Command {
    /// Write a user to the collection
    Write {
        collection: String,
        name: String,
        /// Must be a number, kept exactly as typed
        age: String,
        contact: String,
        company: String,
        /// City the user lives in
        address: String,
    },

    /// Read a user from the collection
    Read { collection: String, name: String },

    /// Read all users from a collection
    #[command(name = "readall")]
    ReadAll { collection: String },

    /// Delete a user from the collection
    Delete { collection: String, name: String },
}
