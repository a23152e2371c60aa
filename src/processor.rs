//! This module covers taking a parsed command line and running it against a store

mod command;
pub use command::Cli;
pub use command::Command;

mod command_processor;
pub use command_processor::CommandProcessor;
pub use command_processor::CommandProcessorError;
