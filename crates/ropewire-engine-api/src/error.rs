use std::path::PathBuf;
use thiserror::Error;

/// Failures the engine reports through a completion callback.
///
/// The boundary layer relays these verbatim; it never interprets, retries,
/// or logs them.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("file not found: {0}")]
    NotFound(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot decode content as {encoding}")]
    Decode { encoding: String },

    #[error("unsupported encoding: {0}")]
    UnsupportedEncoding(String),

    #[error("invalid search pattern: {0}")]
    InvalidPattern(String),
}
