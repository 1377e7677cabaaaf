//! Error taxonomy for storage operations and the user-facing error sink

use std::io;

use thiserror::Error;

/// Failure modes a storage backend may surface.
///
/// Every backend maps its native failures onto this taxonomy so the
/// lifecycle manager and navigator can react uniformly without knowing
/// which backend is active.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The requested file or folder does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Local disk or network failure.
    #[error("i/o error: {0}")]
    Io(String),

    /// Missing or expired credential.
    #[error("authentication required: {0}")]
    Auth(String),

    /// The active backend does not support the requested operation.
    /// Carries a user-facing message.
    #[error("{0}")]
    CapabilityUnavailable(String),

    /// The user dismissed a dialog. Not a failure; never reported.
    #[error("cancelled")]
    Cancelled,
}

impl StorageError {
    pub fn capability(message: impl Into<String>) -> Self {
        Self::CapabilityUnavailable(message.into())
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Map an I/O error onto the taxonomy, keeping the operation context.
    pub fn from_io(context: &str, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound(context.to_string()),
            _ => Self::Io(format!("{context}: {err}")),
        }
    }
}

/// Sink for user-facing error messages.
///
/// Hosts map this to a modal, a status bar, or the console; the core calls
/// it uniformly instead of choosing a presentation.
pub trait ErrorSink: Send + Sync {
    fn report_error(&self, message: &str);
}

/// Default sink: routes messages to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogErrorSink;

impl ErrorSink for LogErrorSink {
    fn report_error(&self, message: &str) {
        tracing::error!("{message}");
    }
}
