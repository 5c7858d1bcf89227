//! Boundary layer between a native text-buffer engine and calling code.
//!
//! The engine stores, diffs, and searches text; this crate is the protocol
//! at its edge. Structured query results cross the boundary as flat `u32`
//! arrays and are decoded back into [`Point`]/[`Range`] values; bulk bytes
//! stream through caller-owned sources and sinks under an acknowledged,
//! one-chunk-in-flight contract; and the engine's raw completion callbacks
//! are correlated into single-shot waitable [`Operation`]s.

pub mod client;
pub mod encoding;
pub mod error;
pub mod oneshot;
pub mod pump;
pub mod stream;
pub mod wire;


pub use client::{BufferHandle, Destination, LoadOptions, LoadResult, Source, SubsequenceMatch};
pub use encoding::Encoding;
pub use error::BridgeError;
pub use oneshot::{Operation, Resolver};
pub use stream::{ByteSink, ByteSource, ReadSource, SourceConsumer, StreamError, WriteSink};

// Engine-facing contract, re-exported for callers that implement or mock it.
pub use ropewire_engine_api::{
    Accumulator, Completion, ContentReader, EngineError, Point, ProgressFn, Range,
    SubsequenceCompletion, SubsequenceHit, SubsequenceHits, TextEngine,
};
