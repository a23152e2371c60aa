use foliolib::engine::Store;
use foliolib::models::{Address, User};
use log::LevelFilter;
use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};
use tempfile::TempDir;

/// Opens a store in a fresh temp directory. Keep the TempDir alive for as long as the store is used.
pub async fn _create_store() -> Result<(TempDir, Store), Box<dyn std::error::Error>> {
    //Only the first test in a binary gets to set the logger
    let _ = CombinedLogger::init(vec![TermLogger::new(
        LevelFilter::Debug,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);

    let tmp = TempDir::new()?;
    let store = Store::new(tmp.path().join("db"), None).await?;

    Ok((tmp, store))
}

pub fn _get_user(name: &str, age: u64) -> User {
    User {
        name: name.to_string(),
        age: age.into(),
        contact: "23344333".to_string(),
        company: "Myrl Tech".to_string(),
        address: Address::in_city("bangalore".to_string()),
    }
}
