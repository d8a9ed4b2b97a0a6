//! Error types for the rotating logger.

use std::io;
use std::path::PathBuf;

/// Result type for logger operations.
pub type Result<T> = std::result::Result<T, LogError>;

#[derive(Debug, thiserror::Error)]
pub enum LogError {
    /// Invalid construction parameter (permission mode, level name).
    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Opening the next rotated file failed.
    #[error("failed to open log file {}: {source}", path.display())]
    Open { path: PathBuf, source: io::Error },

    #[error("failed to serialize log payload: {0}")]
    Serialization(String),

    /// The rotation strategy cannot produce another writer.
    #[error("rotation unavailable: {0}")]
    Rotation(String),

    /// A fatal-class call was rendered; the caller should terminate the process.
    #[error("fatal: {message}")]
    Fatal { message: String },

    /// A panic-class call was rendered; the caller should raise an unrecoverable error.
    #[error("panic: {message}")]
    Panic { message: String },
}

impl LogError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, LogError::Fatal { .. })
    }

    pub fn is_panic(&self) -> bool {
        matches!(self, LogError::Panic { .. })
    }

    /// Whether this is a fatal- or panic-class escalation rather than a failure.
    pub fn is_escalation(&self) -> bool {
        self.is_fatal() || self.is_panic()
    }

    /// Apply the escalation policy: exit for `Fatal`, panic otherwise.
    pub fn escalate(self) -> ! {
        match self {
            LogError::Fatal { .. } => std::process::exit(1),
            LogError::Panic { message } => panic!("{message}"),
            other => panic!("{other}"),
        }
    }
}

impl From<serde_json::Error> for LogError {
    fn from(e: serde_json::Error) -> Self {
        LogError::Serialization(e.to_string())
    }
}
