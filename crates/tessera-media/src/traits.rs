use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tessera_core::{CodecDescriptor, StreamGroup};

use crate::{PlayError, SinkError};

/// Incremental buffering target fed by one assembler.
///
/// At most one append may be in flight. Callers check [`is_updating`] and
/// await [`updated`] before the next [`begin_append`].
///
/// [`is_updating`]: MediaSink::is_updating
/// [`updated`]: MediaSink::updated
/// [`begin_append`]: MediaSink::begin_append
#[async_trait]
pub trait MediaSink: Send + Sync {
    /// Whether an operation is still in flight.
    fn is_updating(&self) -> bool;

    /// Start appending `bytes`.
    ///
    /// # Errors
    ///
    /// [`SinkError::Busy`] when an operation is already in flight.
    fn begin_append(&self, bytes: Bytes) -> Result<(), SinkError>;

    /// Resolve once no operation is in flight, surfacing the outcome of the
    /// last append.
    async fn updated(&self) -> Result<(), SinkError>;
}

/// A media source attached to one playback element.
#[async_trait]
pub trait MediaTarget: Send + Sync + 'static {
    type Sink: MediaSink;

    /// Object URL exposing this target to the playback element.
    fn object_url(&self) -> &str;

    /// Create a sink for `codec`. Creation is the real support test.
    ///
    /// # Errors
    ///
    /// [`SinkError::CreationFailed`] when the environment refuses the codec.
    fn add_sink(&self, codec: &CodecDescriptor) -> Result<Self::Sink, SinkError>;

    /// Signal that no further data will arrive.
    ///
    /// # Errors
    ///
    /// [`SinkError::InvalidState`] while an append is in flight.
    fn end_of_stream(&self) -> Result<(), SinkError>;

    /// Ask the playback element to start.
    async fn play(&self) -> Result<(), PlayError>;

    /// Detach sinks and revoke the object URL.
    fn release(&self);
}

/// The playback environment: capability queries and target creation.
#[async_trait]
pub trait MediaEnvironment: Send + Sync + 'static {
    type Target: MediaTarget;

    /// Whether incremental buffering exists at all.
    fn supports_streaming(&self) -> bool;

    /// Capability query. May report false positives.
    fn is_type_supported(&self, codec: &CodecDescriptor) -> bool;

    /// Create a target bound to the playback element of `group`.
    fn attach(&self, group: StreamGroup) -> Result<Self::Target, SinkError>;

    /// Degraded mode: play one self-contained segment without buffering.
    async fn play_single_segment(&self, group: StreamGroup, bytes: Bytes) -> Result<(), PlayError>;
}

#[async_trait]
impl<E: MediaEnvironment> MediaEnvironment for Arc<E> {
    type Target = E::Target;

    fn supports_streaming(&self) -> bool {
        (**self).supports_streaming()
    }

    fn is_type_supported(&self, codec: &CodecDescriptor) -> bool {
        (**self).is_type_supported(codec)
    }

    fn attach(&self, group: StreamGroup) -> Result<Self::Target, SinkError> {
        (**self).attach(group)
    }

    async fn play_single_segment(&self, group: StreamGroup, bytes: Bytes) -> Result<(), PlayError> {
        (**self).play_single_segment(group, bytes).await
    }
}
