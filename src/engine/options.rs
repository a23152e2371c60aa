//! Knobs handed to a store when it is opened.

use std::fmt;
use std::sync::Arc;

/// Debug level sink the store reports what it is doing to.
///
/// Purely observational, nothing the store does depends on it.
pub trait Logger: fmt::Debug + Send + Sync {
    fn debug(&self, args: fmt::Arguments<'_>);
}

/// Forwards to whatever the `log` facade has been set up with.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogLogger {}

impl Logger for LogLogger {
    fn debug(&self, args: fmt::Arguments<'_>) {
        debug!("{}", args);
    }
}

#[derive(Clone, Debug, Default)]
pub struct Options {
    /// Falls back to `LogLogger` when not set
    pub logger: Option<Arc<dyn Logger>>,
    /// Remove `.json.tmp` files left behind by interrupted writes when opening
    pub sweep_temp_files: bool,
}

impl Options {
    pub fn new() -> Options {
        Options::default()
    }

    pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Options {
        self.logger = Some(logger);
        self
    }

    pub fn with_sweep_temp_files(mut self, sweep: bool) -> Options {
        self.sweep_temp_files = sweep;
        self
    }
}
