//! Raw calling convention for the native text-buffer engine.
//!
//! The engine delivers structured results (points, ranges, match lists) as
//! flat `u32` arrays and reports completion of asynchronous work through
//! single-shot callbacks. This crate pins down that contract — the geometry
//! value types, the [`TextEngine`] trait, and the engine-side streaming
//! collaborators ([`Accumulator`], [`ContentReader`]) — so the boundary
//! layer and the engine agree on exactly what crosses between them.

pub mod engine;
pub mod error;
pub mod geometry;

pub use engine::{
    Accumulator, Completion, ContentReader, ProgressFn, SubsequenceCompletion, SubsequenceHit,
    SubsequenceHits, TextEngine,
};
pub use error::EngineError;
pub use geometry::{Point, Range};
