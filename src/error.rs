//! Custom error types for nextup.
//!
//! Playback continuity never fails loudly: most of these errors are logged and
//! swallowed by the engine. They exist so stores, config loading and stream
//! resolution can report what went wrong.

use std::error::Error;
use std::fmt;
use std::io;

/// Application error types.
#[derive(Debug)]
pub enum AppError {
    /// File I/O errors
    Io(io::Error),
    /// JSON parsing errors
    Parse(String),
    /// Configuration errors
    Config(String),
    /// Progress or preference store errors
    Store(String),
    /// Requested catalog entry does not exist
    NotFound(String),
    /// Invalid input from the host or the user
    InvalidInput(String),
    /// Neither the preferred quality nor any ranked fallback is present
    UnresolvableStream {
        /// Quality labels the stream map actually offers
        available: Vec<String>,
    },
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Io(err) => write!(f, "I/O error: {}", err),
            AppError::Parse(msg) => write!(f, "Parse error: {}", msg),
            AppError::Config(msg) => write!(f, "Config error: {}", msg),
            AppError::Store(msg) => write!(f, "Store error: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            AppError::UnresolvableStream { available } if available.is_empty() => {
                write!(f, "No playable stream: no qualities available")
            }
            AppError::UnresolvableStream { available } => {
                write!(f, "No playable stream: available {}", available.join(", "))
            }
        }
    }
}

impl Error for AppError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            AppError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Io(err)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Parse(err.to_string())
    }
}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for AppError {
    fn from(err: toml::ser::Error) -> Self {
        AppError::Config(err.to_string())
    }
}

/// Result type alias using AppError.
pub type Result<T> = std::result::Result<T, AppError>;
