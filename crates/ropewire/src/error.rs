use ropewire_engine_api::EngineError;
use thiserror::Error;

use crate::stream::StreamError;

/// Failure of one bridge operation, as observed by the caller.
///
/// Nothing is retried or logged on the way up; a rejected operation is the
/// sole failure signal.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The engine reported the failure through its completion callback.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// The caller-owned byte source or sink failed mid-transfer.
    #[error(transparent)]
    Stream(#[from] StreamError),

    /// The engine discarded a completion callback without invoking it,
    /// violating the fires-exactly-once contract.
    #[error("engine discarded the completion callback without settling it")]
    Disconnected,
}
