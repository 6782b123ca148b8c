use console::style;
use std::fmt;
use std::io;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug)]
pub enum CliError {
    /// Speech generation failed
    Speech(polyvox_core::Error),
    /// Model worker could not be reached
    ConnectionError(String),
    /// Invalid input
    InvalidInput(String),
    /// Configuration error
    ConfigError(String),
    /// Some smoke test cases failed
    SmokeFailed { failed: usize, total: usize },
    /// I/O error
    Io(io::Error),
    /// Serialization error
    Serialization(serde_json::Error),
    /// Other errors
    Other(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Speech(err) => {
                write!(f, "{}", polyvox_core::error_status(err))
            }
            CliError::ConnectionError(msg) => {
                write!(f, "Connection error: {}", msg)
            }
            CliError::InvalidInput(msg) => {
                write!(f, "Invalid input: {}", msg)
            }
            CliError::ConfigError(msg) => {
                write!(f, "Configuration error: {}", msg)
            }
            CliError::SmokeFailed { failed, total } => {
                write!(
                    f,
                    "{} of {} languages failed",
                    style(failed).red().bold(),
                    total
                )
            }
            CliError::Io(e) => {
                write!(f, "I/O error: {}", e)
            }
            CliError::Serialization(e) => {
                write!(f, "Serialization error: {}", e)
            }
            CliError::Other(msg) => {
                write!(f, "{}", msg)
            }
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Speech(e) => Some(e),
            CliError::Io(e) => Some(e),
            CliError::Serialization(e) => Some(e),
            _ => None,
        }
    }
}

impl From<polyvox_core::Error> for CliError {
    fn from(e: polyvox_core::Error) -> Self {
        match e {
            polyvox_core::Error::Connection(msg) => CliError::ConnectionError(format!(
                "{msg} (is the model worker running? set --endpoint or POLYVOX_MODEL_ENDPOINT)"
            )),
            other => CliError::Speech(other),
        }
    }
}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        CliError::Io(e)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Serialization(e)
    }
}

impl From<toml::de::Error> for CliError {
    fn from(e: toml::de::Error) -> Self {
        CliError::ConfigError(e.to_string())
    }
}

impl From<toml::ser::Error> for CliError {
    fn from(e: toml::ser::Error) -> Self {
        CliError::ConfigError(e.to_string())
    }
}
