use bytes::Bytes;
use tessera_media::{MediaSink, SinkError};
use tracing::trace;

/// Single-slot append queue over one sink.
///
/// `&mut self` on [`push`](Self::push) makes overlapping appends
/// unrepresentable; each push waits for the sink to go idle first, then
/// for its own append to complete.
pub struct AppendQueue<S> {
    sink: S,
    bytes_appended: u64,
    appends: usize,
}

impl<S: MediaSink> AppendQueue<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            bytes_appended: 0,
            appends: 0,
        }
    }

    /// Append `bytes` once the sink is idle and wait for it to be applied.
    ///
    /// # Errors
    ///
    /// Returns the sink's error when it refuses the append or fails to
    /// apply it. The queue stays usable.
    pub async fn push(&mut self, bytes: Bytes) -> Result<(), SinkError> {
        // A fresh sink may still be initialising.
        self.sink.updated().await?;

        let len = bytes.len() as u64;
        self.sink.begin_append(bytes)?;
        self.sink.updated().await?;

        self.bytes_appended += len;
        self.appends += 1;
        trace!(len, total = self.bytes_appended, "append completed");
        Ok(())
    }

    /// Wait until no operation is in flight.
    ///
    /// # Errors
    ///
    /// Surfaces an error from an append that nobody awaited.
    pub async fn drain(&mut self) -> Result<(), SinkError> {
        self.sink.updated().await
    }

    pub fn bytes_appended(&self) -> u64 {
        self.bytes_appended
    }

    pub fn appends(&self) -> usize {
        self.appends
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }
}
