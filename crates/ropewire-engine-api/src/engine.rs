use std::path::Path;

use crate::error::EngineError;
use crate::geometry::Point;

/// Completion callback for an asynchronous engine entry point.
///
/// The engine invokes it exactly once, possibly from a background worker
/// thread, with either the operation's result or the failure that ended it.
pub type Completion<T> = Box<dyn FnOnce(Result<T, EngineError>) + Send + 'static>;

/// Repeatable progress callback carrying the number of bytes processed so
/// far. May fire any number of times before the completion fires; it never
/// carries resolution semantics.
pub type ProgressFn = Box<dyn FnMut(u64) + Send + 'static>;

/// Completion for subsequence word search. `None` means the engine produced
/// no candidate words at all, as opposed to an empty match list. This entry
/// point has no failure path.
pub type SubsequenceCompletion = Box<dyn FnOnce(Option<SubsequenceHits>) + Send + 'static>;

/// One candidate word from a subsequence search, in engine ranking order.
#[derive(Debug, Clone, PartialEq)]
pub struct SubsequenceHit {
    pub word: String,
    pub score: i32,
}

/// Raw subsequence search result.
///
/// `positions` is shared by all hits: for each hit, in order, it holds one
/// count `n` followed by `n` row/column pairs. The runs tile the array
/// exactly, with no gaps or overlaps.
#[derive(Debug, Clone, PartialEq)]
pub struct SubsequenceHits {
    pub matches: Vec<SubsequenceHit>,
    pub positions: Vec<u32>,
}

/// Engine-side byte collector for a streamed load, bound to a target
/// encoding token at construction.
pub trait Accumulator: Send {
    /// Append one chunk of raw bytes, in arrival order.
    fn write(&mut self, chunk: &[u8]);

    /// Seal the accumulator against further writes. Writing after sealing
    /// violates the boundary contract.
    fn seal(&mut self);
}

/// Engine-side source of encoded buffer content for a streamed save.
///
/// Dropping the reader releases its engine-side resources; callers rely on
/// this on both the success and the failure path.
pub trait ContentReader: Send {
    /// Fill `buf` with the next run of encoded bytes, returning how many
    /// bytes were produced. Zero means the content is exhausted.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, EngineError>;
}

/// The raw engine ABI.
///
/// Search results cross the boundary as flat `u32` arrays: ranges as
/// consecutive `[start_row, start_column, end_row, end_column]` quads,
/// points as consecutive pairs. Range-scoped queries receive the scope the
/// same way. No richer structure crosses in either direction.
///
/// Asynchronous entry points take a completion callback as their final
/// argument and may invoke it from a background thread; synchronous
/// variants return the flat array directly and block the calling thread.
pub trait TextEngine: Send + Sync {
    /// Current end of the buffer.
    fn extent(&self) -> Point;

    /// First match of `pattern` within `scope` (whole buffer when `None`),
    /// as an empty array or a single range quad.
    fn search(&self, pattern: &str, scope: Option<[u32; 4]>, done: Completion<Vec<u32>>);

    /// All matches of `pattern` within `scope`, in document order.
    fn search_all(&self, pattern: &str, scope: Option<[u32; 4]>, done: Completion<Vec<u32>>);

    fn search_sync(
        &self,
        pattern: &str,
        scope: Option<[u32; 4]>,
    ) -> Result<Vec<u32>, EngineError>;

    fn search_all_sync(
        &self,
        pattern: &str,
        scope: Option<[u32; 4]>,
    ) -> Result<Vec<u32>, EngineError>;

    /// Words in `scope` matching `query` as a character subsequence, ranked
    /// by the engine's own scoring, at most `max_count` of them.
    fn search_words_with_subsequence(
        &self,
        query: &str,
        extra_word_characters: &str,
        max_count: u32,
        scope: [u32; 4],
        done: SubsequenceCompletion,
    );

    /// New byte collector for a streamed load targeting `encoding`.
    fn new_accumulator(&self, encoding: &str) -> Box<dyn Accumulator>;

    /// New content reader yielding the buffer encoded as `encoding`.
    fn new_reader(&self, encoding: &str) -> Box<dyn ContentReader>;

    /// Replace buffer content from a file the engine reads itself.
    ///
    /// The completion's payload is the patch against the previous content as
    /// a flat range array, or `None` when `compute_patch` is false.
    fn load_path(
        &self,
        path: &Path,
        encoding: &str,
        discard_changes: bool,
        compute_patch: bool,
        progress: Option<ProgressFn>,
        done: Completion<Option<Vec<u32>>>,
    );

    /// Replace buffer content from a sealed accumulator.
    fn load_accumulated(
        &self,
        content: Box<dyn Accumulator>,
        discard_changes: bool,
        compute_patch: bool,
        progress: Option<ProgressFn>,
        done: Completion<Option<Vec<u32>>>,
    );

    /// Write the buffer to a file the engine owns end to end.
    fn save_path(&self, path: &Path, encoding: &str, done: Completion<()>);

    /// Whether the recorded base text is byte-equivalent to the given file.
    fn base_text_matches_path(&self, path: &Path, encoding: &str, done: Completion<bool>);

    /// Whether the recorded base text is byte-equivalent to the accumulated
    /// content.
    fn base_text_matches_accumulated(&self, content: Box<dyn Accumulator>, done: Completion<bool>);
}
