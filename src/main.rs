//Vendor Imports
#[macro_use]
extern crate log;
extern crate simplelog;
use clap::Parser;
use simplelog::{ColorChoice, CombinedLogger, Config, LevelFilter, TermLogger, TerminalMode};
use std::process;

//Application Imports
use foliolib::engine::{Options, Store};
use foliolib::processor::{Cli, CommandProcessor};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    if let Err(e) = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )]) {
        eprintln!("Unable to set up logging: {}", e);
    }

    let options = Options::new().with_sweep_temp_files(cli.sweep);
    let store = match Store::new(&cli.dir, Some(options)).await {
        Ok(s) => s,
        Err(e) => {
            error!("Error initializing store: {}", e);
            process::exit(1);
        }
    };

    let processor = CommandProcessor::new(store);
    for line in processor.process(cli.command).await {
        println!("{}", line);
    }
}
