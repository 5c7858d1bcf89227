//! The caller-facing surface over one engine buffer.
//!
//! [`BufferHandle`] owns no text. It canonicalizes encodings, hands
//! range-scoped queries to the engine as flat quads, correlates the
//! engine's callbacks into waitable [`Operation`]s, and decodes the flat
//! payloads those callbacks carry.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::debug;
use serde::{Deserialize, Serialize};

use ropewire_engine_api::{Point, ProgressFn, Range, SubsequenceHits, TextEngine};

use crate::encoding::Encoding;
use crate::error::BridgeError;
use crate::oneshot::{self, Operation};
use crate::pump;
use crate::stream::{ByteSink, ByteSource};
use crate::wire;

/// Where a load or base-text comparison reads from.
pub enum Source {
    /// The engine opens and reads the file itself.
    Path(PathBuf),
    /// A caller-owned push stream, accumulated through the bridge.
    Stream(Box<dyn ByteSource + Send>),
}

impl Source {
    pub fn stream(source: impl ByteSource + Send + 'static) -> Self {
        Self::Stream(Box::new(source))
    }
}

impl From<PathBuf> for Source {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl From<&Path> for Source {
    fn from(path: &Path) -> Self {
        Self::Path(path.to_path_buf())
    }
}

/// Where a save writes to.
pub enum Destination {
    /// The engine writes the file itself.
    Path(PathBuf),
    /// A caller-owned acknowledged sink, pumped through the bridge.
    Sink(Box<dyn ByteSink + Send>),
}

impl Destination {
    pub fn sink(sink: impl ByteSink + Send + 'static) -> Self {
        Self::Sink(Box::new(sink))
    }
}

impl From<PathBuf> for Destination {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl From<&Path> for Destination {
    fn from(path: &Path) -> Self {
        Self::Path(path.to_path_buf())
    }
}

/// Options for [`BufferHandle::load`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadOptions {
    /// Compute a patch against the base text and report it in the result.
    pub patch: bool,
    /// Discard unsaved buffer changes instead of preserving them across the
    /// load.
    pub force: bool,
    /// Charset name; canonicalized before it reaches the engine.
    pub encoding: String,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            patch: true,
            force: false,
            encoding: "UTF-8".to_string(),
        }
    }
}

/// Outcome of a completed load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadResult {
    /// Ranges of base text the load replaced, when patch computation was
    /// requested.
    pub changes: Option<Vec<Range>>,
}

impl LoadResult {
    fn from_flat(changes: Option<Vec<u32>>) -> Self {
        Self {
            changes: changes.map(|flat| wire::decode_range_array(&flat)),
        }
    }
}

/// One ranked word from a subsequence search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubsequenceMatch {
    pub word: String,
    pub score: i32,
    /// Positions of the matched characters, in document order.
    pub positions: Vec<Point>,
}

/// Caller-facing handle over one engine buffer.
///
/// Concurrent loads or saves on the same buffer are a caller error; the
/// handle imposes no ordering or mutual exclusion across operations.
#[derive(Clone)]
pub struct BufferHandle {
    engine: Arc<dyn TextEngine>,
}

impl BufferHandle {
    pub fn new(engine: Arc<dyn TextEngine>) -> Self {
        Self { engine }
    }

    /// Current end of the buffer.
    pub fn extent(&self) -> Point {
        self.engine.extent()
    }

    /// First match of `pattern` anywhere in the buffer.
    pub fn find(&self, pattern: &str) -> Operation<Option<Range>> {
        self.find_in_range(pattern, None)
    }

    /// First match of `pattern` within `scope`, or the whole buffer when
    /// `None`.
    ///
    /// Resolves to `None` when nothing matches; an empty engine payload is
    /// "no match", never a zero-width range.
    pub fn find_in_range(&self, pattern: &str, scope: Option<Range>) -> Operation<Option<Range>> {
        let (resolver, operation) = oneshot::channel();
        self.engine.search(
            pattern,
            scope.map(|range| wire::encode_range(&range)),
            Box::new(move |result| {
                resolver.settle(result.map(first_range).map_err(BridgeError::from));
            }),
        );
        operation
    }

    /// Every match of `pattern` in the buffer, in document order.
    pub fn find_all(&self, pattern: &str) -> Operation<Vec<Range>> {
        self.find_all_in_range(pattern, None)
    }

    /// Every match of `pattern` within `scope`, in document order, possibly
    /// empty.
    pub fn find_all_in_range(&self, pattern: &str, scope: Option<Range>) -> Operation<Vec<Range>> {
        let (resolver, operation) = oneshot::channel();
        self.engine.search_all(
            pattern,
            scope.map(|range| wire::encode_range(&range)),
            Box::new(move |result| {
                resolver.settle(
                    result
                        .map(|flat| wire::decode_range_array(&flat))
                        .map_err(BridgeError::from),
                );
            }),
        );
        operation
    }

    /// Blocking counterpart of [`find`](Self::find).
    pub fn find_sync(&self, pattern: &str) -> Result<Option<Range>, BridgeError> {
        self.find_in_range_sync(pattern, None)
    }

    /// Blocking counterpart of [`find_in_range`](Self::find_in_range).
    pub fn find_in_range_sync(
        &self,
        pattern: &str,
        scope: Option<Range>,
    ) -> Result<Option<Range>, BridgeError> {
        let flat = self
            .engine
            .search_sync(pattern, scope.map(|range| wire::encode_range(&range)))?;
        Ok(first_range(flat))
    }

    /// Blocking counterpart of [`find_all`](Self::find_all).
    pub fn find_all_sync(&self, pattern: &str) -> Result<Vec<Range>, BridgeError> {
        self.find_all_in_range_sync(pattern, None)
    }

    /// Blocking counterpart of [`find_all_in_range`](Self::find_all_in_range).
    pub fn find_all_in_range_sync(
        &self,
        pattern: &str,
        scope: Option<Range>,
    ) -> Result<Vec<Range>, BridgeError> {
        let flat = self
            .engine
            .search_all_sync(pattern, scope.map(|range| wire::encode_range(&range)))?;
        Ok(wire::decode_range_array(&flat))
    }

    /// Words matching `query` as a character subsequence anywhere in the
    /// buffer, ranked by the engine.
    pub fn find_words_with_subsequence(
        &self,
        query: &str,
        extra_word_characters: &str,
        max_count: u32,
    ) -> Operation<Option<Vec<SubsequenceMatch>>> {
        self.find_words_with_subsequence_in_range(
            query,
            extra_word_characters,
            max_count,
            Range::to_extent(self.engine.extent()),
        )
    }

    /// Words matching `query` as a character subsequence within `scope`.
    ///
    /// Resolves to `None` when the engine reports no candidates at all,
    /// distinct from an empty list. Ranking is the engine's own; nothing is
    /// re-sorted here.
    pub fn find_words_with_subsequence_in_range(
        &self,
        query: &str,
        extra_word_characters: &str,
        max_count: u32,
        scope: Range,
    ) -> Operation<Option<Vec<SubsequenceMatch>>> {
        let (resolver, operation) = oneshot::channel();
        self.engine.search_words_with_subsequence(
            query,
            extra_word_characters,
            max_count,
            wire::encode_range(&scope),
            Box::new(move |hits| {
                resolver.resolve(hits.map(decode_subsequence_hits));
            }),
        );
        operation
    }

    /// Replace the buffer's content from a file or stream.
    ///
    /// `progress` may fire any number of times before the operation
    /// settles; it carries no resolution semantics.
    pub fn load(
        &self,
        source: Source,
        options: LoadOptions,
        progress: Option<ProgressFn>,
    ) -> Operation<LoadResult> {
        let encoding = Encoding::canonical(&options.encoding);
        match source {
            Source::Path(path) => {
                debug!("load of {} as {encoding}", path.display());
                let (resolver, operation) = oneshot::channel();
                self.engine.load_path(
                    &path,
                    encoding.as_str(),
                    options.force,
                    options.patch,
                    progress,
                    Box::new(move |result| {
                        resolver
                            .settle(result.map(LoadResult::from_flat).map_err(BridgeError::from));
                    }),
                );
                operation
            }
            Source::Stream(mut stream) => {
                debug!("streamed load as {encoding}");
                let accumulator = self.engine.new_accumulator(encoding.as_str());
                match pump::accumulate(accumulator, stream.as_mut()) {
                    Ok(content) => {
                        let (resolver, operation) = oneshot::channel();
                        self.engine.load_accumulated(
                            content,
                            options.force,
                            options.patch,
                            progress,
                            Box::new(move |result| {
                                resolver.settle(
                                    result.map(LoadResult::from_flat).map_err(BridgeError::from),
                                );
                            }),
                        );
                        operation
                    }
                    Err(error) => Operation::settled(Err(error.into())),
                }
            }
        }
    }

    /// Write the buffer's content, encoded as `encoding`, to a file or
    /// sink.
    ///
    /// A failed streamed save leaves the destination in an indeterminate
    /// state; bytes already acknowledged are not rolled back.
    pub fn save(&self, destination: Destination, encoding: &str) -> Operation<()> {
        let encoding = Encoding::canonical(encoding);
        match destination {
            Destination::Path(path) => {
                debug!("save of {} as {encoding}", path.display());
                let (resolver, operation) = oneshot::channel();
                self.engine.save_path(
                    &path,
                    encoding.as_str(),
                    Box::new(move |result| resolver.settle(result.map_err(BridgeError::from))),
                );
                operation
            }
            Destination::Sink(mut sink) => {
                debug!("streamed save as {encoding}");
                let reader = self.engine.new_reader(encoding.as_str());
                Operation::settled(pump::pump_to_sink(reader, sink.as_mut()).map(|_written| ()))
            }
        }
    }

    /// Whether the buffer's recorded base text is byte-equivalent to the
    /// given file or stream content.
    pub fn base_text_matches_file(&self, source: Source, encoding: &str) -> Operation<bool> {
        let encoding = Encoding::canonical(encoding);
        match source {
            Source::Path(path) => {
                let (resolver, operation) = oneshot::channel();
                self.engine.base_text_matches_path(
                    &path,
                    encoding.as_str(),
                    Box::new(move |result| resolver.settle(result.map_err(BridgeError::from))),
                );
                operation
            }
            Source::Stream(mut stream) => {
                let accumulator = self.engine.new_accumulator(encoding.as_str());
                match pump::accumulate(accumulator, stream.as_mut()) {
                    Ok(content) => {
                        let (resolver, operation) = oneshot::channel();
                        self.engine.base_text_matches_accumulated(
                            content,
                            Box::new(move |result| {
                                resolver.settle(result.map_err(BridgeError::from));
                            }),
                        );
                        operation
                    }
                    Err(error) => Operation::settled(Err(error.into())),
                }
            }
        }
    }
}

fn first_range(flat: Vec<u32>) -> Option<Range> {
    if flat.is_empty() {
        None
    } else {
        Some(wire::decode_range(&flat, 0))
    }
}

/// Slice each hit's positions out of the shared length-prefixed array,
/// advancing one cursor across it. The runs must tile the array exactly.
fn decode_subsequence_hits(hits: SubsequenceHits) -> Vec<SubsequenceMatch> {
    let positions = hits.positions;
    let mut cursor = 0usize;
    let mut matches = Vec::with_capacity(hits.matches.len());
    for hit in hits.matches {
        let count = positions[cursor] as usize;
        cursor += 1;
        let (points, consumed) = wire::decode_point_array(&positions, cursor, count);
        cursor += consumed;
        matches.push(SubsequenceMatch {
            word: hit.word,
            score: hit.score,
            positions: points,
        });
    }
    assert_eq!(
        cursor,
        positions.len(),
        "subsequence position runs do not tile the shared array"
    );
    matches
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::{SourceConsumer, StreamError};
    use crate::tests::StubEngine;
    use pretty_assertions::assert_eq;
    use ropewire_engine_api::{EngineError, SubsequenceHit};

    struct ChunkSource {
        chunks: Vec<Vec<u8>>,
        fail_instead_of_end: bool,
    }

    impl ChunkSource {
        fn of(chunks: &[&[u8]]) -> Self {
            Self {
                chunks: chunks.iter().map(|c| c.to_vec()).collect(),
                fail_instead_of_end: false,
            }
        }
    }

    impl crate::stream::ByteSource for ChunkSource {
        fn feed(&mut self, consumer: &mut dyn SourceConsumer) {
            for chunk in self.chunks.drain(..) {
                consumer.data(&chunk);
            }
            if self.fail_instead_of_end {
                consumer.fail(StreamError::Io(std::io::Error::other("peer reset")));
            } else {
                consumer.end();
            }
        }
    }

    #[test]
    fn find_decodes_an_empty_payload_to_none() {
        let stub = StubEngine::shared();
        stub.script_search(Ok(vec![]));
        let handle = BufferHandle::new(stub.clone());

        let found = handle.find("needle").wait().unwrap();

        assert_eq!(found, None);
    }

    #[test]
    fn find_decodes_a_single_quad() {
        let stub = StubEngine::shared();
        stub.script_search(Ok(vec![1, 2, 1, 8]));
        let handle = BufferHandle::new(stub.clone());

        let found = handle.find("needle").wait().unwrap();

        assert_eq!(
            found,
            Some(Range::new(Point::new(1, 2), Point::new(1, 8)))
        );
    }

    #[test]
    fn find_in_range_hands_the_scope_to_the_engine_as_a_quad() {
        let stub = StubEngine::shared();
        stub.script_search(Ok(vec![]));
        let handle = BufferHandle::new(stub.clone());
        let scope = Range::new(Point::new(2, 0), Point::new(4, 10));

        handle.find_in_range("needle", Some(scope)).wait().unwrap();

        assert_eq!(stub.log().scopes, vec![Some([2, 0, 4, 10])]);
    }

    #[test]
    fn find_all_decodes_an_empty_payload_to_an_empty_list() {
        let stub = StubEngine::shared();
        stub.script_search_all(Ok(vec![]));
        let handle = BufferHandle::new(stub.clone());

        let found = handle.find_all("needle").wait().unwrap();

        assert_eq!(found, vec![]);
    }

    #[test]
    fn engine_search_failure_rejects_the_operation() {
        let stub = StubEngine::shared();
        stub.script_search(Err(EngineError::InvalidPattern("(".into())));
        let handle = BufferHandle::new(stub.clone());

        let outcome = handle.find("(").wait();

        assert!(matches!(
            outcome,
            Err(BridgeError::Engine(EngineError::InvalidPattern(_)))
        ));
    }

    #[test]
    fn sync_variants_decode_identically() {
        let stub = StubEngine::shared();
        stub.script_search(Ok(vec![0, 0, 0, 3]));
        stub.script_search_all(Ok(vec![0, 0, 0, 3, 2, 0, 2, 3]));
        let handle = BufferHandle::new(stub.clone());

        let first = handle.find_sync("abc").unwrap();
        let all = handle.find_all_sync("abc").unwrap();

        assert_eq!(first, Some(Range::new(Point::ZERO, Point::new(0, 3))));
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn subsequence_positions_are_sliced_by_length_prefix() {
        let stub = StubEngine::shared();
        stub.script_subsequence(Some(SubsequenceHits {
            matches: vec![
                SubsequenceHit { word: "alpha".into(), score: 30 },
                SubsequenceHit { word: "beta".into(), score: 20 },
                SubsequenceHit { word: "gamma".into(), score: 10 },
            ],
            // Counts [2, 0, 3] with 2 * (2 + 0 + 3) position integers.
            positions: vec![2, 0, 4, 1, 0, 0, 3, 5, 0, 6, 2, 9, 9],
        }));
        let handle = BufferHandle::new(stub.clone());

        let matches = handle
            .find_words_with_subsequence("ab", "", 10)
            .wait()
            .unwrap()
            .expect("candidates were scripted");

        let counts: Vec<usize> = matches.iter().map(|m| m.positions.len()).collect();
        assert_eq!(counts, vec![2, 0, 3]);
        assert_eq!(
            matches[0].positions,
            vec![Point::new(0, 4), Point::new(1, 0)]
        );
        assert_eq!(matches[2].positions[2], Point::new(9, 9));
    }

    #[test]
    fn subsequence_null_result_resolves_to_none() {
        let stub = StubEngine::shared();
        stub.script_subsequence(None);
        let handle = BufferHandle::new(stub.clone());

        let matches = handle.find_words_with_subsequence("zz", "", 10).wait().unwrap();

        assert!(matches.is_none());
    }

    #[test]
    fn subsequence_default_scope_is_the_whole_buffer() {
        let stub = StubEngine::shared();
        stub.set_extent(Point::new(12, 7));
        stub.script_subsequence(None);
        let handle = BufferHandle::new(stub.clone());

        handle.find_words_with_subsequence("ab", "_", 5).wait().unwrap();

        let log = stub.log();
        let (query, extra, max_count, scope) =
            log.subsequence_args.clone().expect("engine saw the call");
        assert_eq!(query, "ab");
        assert_eq!(extra, "_");
        assert_eq!(max_count, 5);
        assert_eq!(scope, [0, 0, 12, 7]);
    }

    #[test]
    fn streamed_load_accumulates_chunks_in_order() {
        let stub = StubEngine::shared();
        stub.script_load(Ok(None));
        let handle = BufferHandle::new(stub.clone());
        let source = Source::stream(ChunkSource::of(&[b"ab", b"cd"]));

        let result = handle.load(source, LoadOptions::default(), None).wait().unwrap();

        assert_eq!(result, LoadResult { changes: None });
        let log = stub.log();
        assert_eq!(log.accumulated, b"abcd");
        assert!(log.sealed);
        assert_eq!(log.accumulator_encoding.as_deref(), Some("UTF-8"));
    }

    #[test]
    fn streamed_load_forwards_the_option_flags() {
        let stub = StubEngine::shared();
        stub.script_load(Ok(Some(vec![0, 0, 3, 0])));
        let handle = BufferHandle::new(stub.clone());
        let options = LoadOptions {
            patch: true,
            force: true,
            encoding: "utf8".into(),
        };

        let result = handle
            .load(Source::stream(ChunkSource::of(&[b"x"])), options, None)
            .wait()
            .unwrap();

        assert_eq!(
            result.changes,
            Some(vec![Range::new(Point::ZERO, Point::new(3, 0))])
        );
        let log = stub.log();
        assert_eq!(log.load_flags, Some((true, true)));
    }

    #[test]
    fn failed_source_rejects_the_load_without_reaching_the_engine() {
        let stub = StubEngine::shared();
        let handle = BufferHandle::new(stub.clone());
        let mut source = ChunkSource::of(&[b"partial"]);
        source.fail_instead_of_end = true;

        let outcome = handle
            .load(Source::stream(source), LoadOptions::default(), None)
            .wait();

        assert!(matches!(outcome, Err(BridgeError::Stream(_))));
        let log = stub.log();
        assert!(!log.sealed);
        assert!(log.load_flags.is_none());
    }

    #[test]
    fn load_progress_is_forwarded_and_separate_from_completion() {
        let stub = StubEngine::shared();
        stub.script_load(Ok(None));
        let handle = BufferHandle::new(stub.clone());
        let seen = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = seen.clone();
        let progress: ProgressFn = Box::new(move |bytes| sink.lock().unwrap().push(bytes));

        handle
            .load(
                Source::stream(ChunkSource::of(&[b"abcd"])),
                LoadOptions::default(),
                Some(progress),
            )
            .wait()
            .unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![4]);
    }

    #[test]
    fn streamed_save_pumps_the_reader_into_the_sink() {
        let stub = StubEngine::shared();
        stub.script_reader_chunks(&[b"hello ", b"world"]);
        let handle = BufferHandle::new(stub.clone());
        let written = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = crate::stream::WriteSink::new(SharedBuffer(written.clone()));

        handle.save(Destination::sink(sink), "utf8").wait().unwrap();

        assert_eq!(*written.lock().unwrap(), b"hello world");
        let log = stub.log();
        assert_eq!(log.reader_encoding.as_deref(), Some("UTF-8"));
        assert!(log.reader_released);
    }

    struct SharedBuffer(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn base_text_comparison_bridges_streams_like_load() {
        let stub = StubEngine::shared();
        stub.script_compare(Ok(true));
        let handle = BufferHandle::new(stub.clone());

        let matches = handle
            .base_text_matches_file(Source::stream(ChunkSource::of(&[b"ab", b"cd"])), "UTF8")
            .wait()
            .unwrap();

        assert!(matches);
        let log = stub.log();
        assert_eq!(log.accumulated, b"abcd");
        assert!(log.sealed);
    }

    #[test]
    fn path_save_goes_straight_to_the_engine() {
        let stub = StubEngine::shared();
        stub.script_save(Ok(()));
        let handle = BufferHandle::new(stub.clone());

        handle
            .save(Destination::Path("/tmp/out.txt".into()), "utf_8")
            .wait()
            .unwrap();

        let log = stub.log();
        assert_eq!(
            log.path_ops,
            vec![("save", PathBuf::from("/tmp/out.txt"), "UTF-8".to_string())]
        );
        // No reader was ever created for a path save.
        assert!(!log.reader_released);
        assert!(log.reader_encoding.is_none());
    }

    #[test]
    fn load_options_default_matches_the_documented_contract() {
        let options = LoadOptions::default();
        assert!(options.patch);
        assert!(!options.force);
        assert_eq!(options.encoding, "UTF-8");
    }
}
