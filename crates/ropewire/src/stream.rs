//! Caller-owned byte stream collaborators.
//!
//! A [`ByteSource`] pushes chunks at the bridge: `data` signals terminated
//! by exactly one `end` or `fail`. A [`ByteSink`] is pulled, acknowledging
//! each write by returning from it. Both stay owned by the caller for their
//! full lifetime; the bridge borrows them only for the span of a single
//! load or save.

use thiserror::Error;

/// Failure signaled by a caller-owned source or sink.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("stream I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// Any other failure a foreign stream wants to surface.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Receives the signals a [`ByteSource`] emits.
pub trait SourceConsumer {
    /// One chunk of bytes, in stream order.
    fn data(&mut self, chunk: &[u8]);

    /// Terminal signal: the stream ended cleanly.
    fn end(&mut self);

    /// Terminal signal: the stream failed.
    fn fail(&mut self, error: StreamError);
}

/// Push-based byte producer.
pub trait ByteSource {
    /// Emit the whole stream into `consumer`: zero or more `data` signals
    /// followed by exactly one `end` or `fail`, then return.
    fn feed(&mut self, consumer: &mut dyn SourceConsumer);
}

/// Pull/acknowledge byte consumer.
pub trait ByteSink {
    /// Accept one chunk. Returning `Ok` is the write acknowledgment; the
    /// next chunk is never offered before the previous one returns.
    fn write(&mut self, chunk: &[u8]) -> Result<(), StreamError>;

    /// Terminal signal: no more writes will follow.
    fn finish(&mut self) -> Result<(), StreamError>;
}

/// Adapts any [`std::io::Read`] into a [`ByteSource`].
pub struct ReadSource<R> {
    reader: R,
}

impl<R: std::io::Read> ReadSource<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: std::io::Read> ByteSource for ReadSource<R> {
    fn feed(&mut self, consumer: &mut dyn SourceConsumer) {
        let mut chunk = [0u8; 8 * 1024];
        loop {
            match self.reader.read(&mut chunk) {
                Ok(0) => return consumer.end(),
                Ok(n) => consumer.data(&chunk[..n]),
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return consumer.fail(e.into()),
            }
        }
    }
}

/// Adapts any [`std::io::Write`] into a [`ByteSink`].
pub struct WriteSink<W> {
    writer: W,
}

impl<W: std::io::Write> WriteSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Hand the wrapped writer back once the transfer is over.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: std::io::Write> ByteSink for WriteSink<W> {
    fn write(&mut self, chunk: &[u8]) -> Result<(), StreamError> {
        self.writer.write_all(chunk)?;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), StreamError> {
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[derive(Default)]
    struct Recorder {
        chunks: Vec<Vec<u8>>,
        ended: bool,
        failed: Option<StreamError>,
    }

    impl SourceConsumer for Recorder {
        fn data(&mut self, chunk: &[u8]) {
            self.chunks.push(chunk.to_vec());
        }

        fn end(&mut self) {
            self.ended = true;
        }

        fn fail(&mut self, error: StreamError) {
            self.failed = Some(error);
        }
    }

    #[test]
    fn read_source_feeds_until_end() {
        let mut source = ReadSource::new(Cursor::new(b"hello world".to_vec()));
        let mut recorder = Recorder::default();
        source.feed(&mut recorder);

        let total: Vec<u8> = recorder.chunks.concat();
        assert_eq!(total, b"hello world");
        assert!(recorder.ended);
        assert!(recorder.failed.is_none());
    }

    #[test]
    fn read_source_surfaces_io_failure() {
        struct Broken;
        impl std::io::Read for Broken {
            fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
                Err(std::io::Error::other("disk on fire"))
            }
        }

        let mut source = ReadSource::new(Broken);
        let mut recorder = Recorder::default();
        source.feed(&mut recorder);

        assert!(recorder.chunks.is_empty());
        assert!(!recorder.ended);
        assert!(matches!(recorder.failed, Some(StreamError::Io(_))));
    }

    #[test]
    fn write_sink_collects_acknowledged_chunks() {
        let mut sink = WriteSink::new(Vec::new());
        sink.write(b"ab").unwrap();
        sink.write(b"cd").unwrap();
        sink.finish().unwrap();
        assert_eq!(sink.into_inner(), b"abcd");
    }
}
