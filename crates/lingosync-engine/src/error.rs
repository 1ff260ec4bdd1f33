//! Engine error types.

use thiserror::Error;

use lingosync_connect::ConnectError;

/// Errors that can stop a track or, before the locale loop starts, the run.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A store request failed.
    #[error(transparent)]
    Store(#[from] ConnectError),

    /// The source locale has no remote content to translate from.
    #[error("source locale {0} has no localization to translate from")]
    MissingSource(String),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
