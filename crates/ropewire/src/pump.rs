//! Byte transfer between caller-owned streams and the engine's streaming
//! collaborators.
//!
//! Ingestion drives a push [`ByteSource`] into an engine [`Accumulator`];
//! emission pulls an engine [`ContentReader`] into an acknowledged
//! [`ByteSink`]. Both directions preserve chunk order, never pipeline, and
//! release the engine-side resource on every exit path before a failure is
//! reported.

use log::trace;

use ropewire_engine_api::{Accumulator, ContentReader};

use crate::error::BridgeError;
use crate::stream::{ByteSink, ByteSource, SourceConsumer, StreamError};

/// Fixed chunk size of the save pump's scratch buffer.
pub const CHUNK_SIZE: usize = 10 * 1024;

enum IngestState {
    /// Accepting chunks.
    Streaming(Box<dyn Accumulator>),
    /// Saw `end`; the accumulator is sealed.
    Sealed(Box<dyn Accumulator>),
    /// Saw `fail`; the accumulator was released unsealed.
    Failed(StreamError),
}

struct Ingest {
    state: Option<IngestState>,
}

impl SourceConsumer for Ingest {
    fn data(&mut self, chunk: &[u8]) {
        // Chunks arriving after a terminal signal are dropped.
        if let Some(IngestState::Streaming(accumulator)) = self.state.as_mut() {
            accumulator.write(chunk);
        }
    }

    fn end(&mut self) {
        match self.state.take() {
            Some(IngestState::Streaming(mut accumulator)) => {
                accumulator.seal();
                self.state = Some(IngestState::Sealed(accumulator));
            }
            other => self.state = other,
        }
    }

    fn fail(&mut self, error: StreamError) {
        match self.state.take() {
            // Dropping the unsealed accumulator releases it; the load is
            // never issued.
            Some(IngestState::Streaming(_)) => {
                trace!("byte source failed; accumulator released unsealed");
                self.state = Some(IngestState::Failed(error));
            }
            other => self.state = other,
        }
    }
}

/// Drive `source` to completion into `accumulator`, returning it sealed.
pub(crate) fn accumulate(
    accumulator: Box<dyn Accumulator>,
    source: &mut dyn ByteSource,
) -> Result<Box<dyn Accumulator>, StreamError> {
    let mut ingest = Ingest {
        state: Some(IngestState::Streaming(accumulator)),
    };
    source.feed(&mut ingest);
    match ingest.state {
        Some(IngestState::Sealed(accumulator)) => Ok(accumulator),
        Some(IngestState::Failed(error)) => Err(error),
        _ => Err(StreamError::Other(anyhow::anyhow!(
            "byte source returned without a terminal signal"
        ))),
    }
}

enum PumpState {
    Reading,
    Writing(usize),
    Draining,
    Done,
    Failed(BridgeError),
}

/// Pump the reader's content into `sink`, one acknowledged chunk at a time.
///
/// Returns the total number of bytes written. The reader is released on
/// every exit path, before a failure is reported; after a failure no
/// further reads or writes occur.
pub(crate) fn pump_to_sink(
    mut reader: Box<dyn ContentReader>,
    sink: &mut dyn ByteSink,
) -> Result<u64, BridgeError> {
    let mut scratch = vec![0u8; CHUNK_SIZE];
    let mut written: u64 = 0;
    let mut state = PumpState::Reading;

    loop {
        state = match state {
            PumpState::Reading => match reader.read(&mut scratch) {
                Ok(0) => PumpState::Draining,
                Ok(n) => PumpState::Writing(n),
                Err(error) => PumpState::Failed(error.into()),
            },
            // The sink's return is the write acknowledgment; nothing is
            // pipelined past it.
            PumpState::Writing(n) => match sink.write(&scratch[..n]) {
                Ok(()) => {
                    written += n as u64;
                    PumpState::Reading
                }
                Err(error) => PumpState::Failed(error.into()),
            },
            PumpState::Draining => match sink.finish() {
                Ok(()) => PumpState::Done,
                Err(error) => PumpState::Failed(error.into()),
            },
            PumpState::Done => {
                trace!("save pump drained after {written} bytes");
                return Ok(written);
            }
            PumpState::Failed(error) => {
                drop(reader);
                return Err(error);
            }
        };
    }
}
