//! CLI error type.

use std::fmt;
use std::io;

use dlwatch::config::ConfigError;
use dlwatch::engine::EngineError;

/// Errors surfaced to the user by the CLI.
#[derive(Debug)]
pub enum CliError {
    /// Invalid setting or environment problem.
    Config(String),
    /// The configuration file could not be loaded.
    ConfigFile(ConfigError),
    /// Logging could not be initialized.
    Logging(String),
    /// Extraction or download failed.
    Engine(EngineError),
    /// Writing a status line failed.
    Output(io::Error),
}

impl CliError {
    /// Check if this is a user interruption rather than a failure.
    pub fn is_interrupted(&self) -> bool {
        matches!(self, CliError::Engine(e) if e.is_interrupted())
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::ConfigFile(e) => write!(f, "{}", e),
            CliError::Logging(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Engine(e) => write!(f, "{}", e),
            CliError::Output(e) => write!(f, "Failed to write output: {}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::ConfigFile(e) => Some(e),
            CliError::Engine(e) => Some(e),
            CliError::Output(e) => Some(e),
            CliError::Config(_) | CliError::Logging(_) => None,
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::ConfigFile(e)
    }
}

impl From<EngineError> for CliError {
    fn from(e: EngineError) -> Self {
        CliError::Engine(e)
    }
}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        CliError::Output(e)
    }
}
