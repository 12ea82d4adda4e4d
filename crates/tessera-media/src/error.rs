use tessera_core::CodecDescriptor;
use thiserror::Error;

/// Failures of the incremental buffering primitive.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SinkError {
    #[error("Incremental buffering is not supported: {0}")]
    Unsupported(String),

    #[error("Failed to attach media target: {0}")]
    AttachFailed(String),

    #[error("Failed to create sink for {codec}: {reason}")]
    CreationFailed {
        codec: CodecDescriptor,
        reason: String,
    },

    #[error("Sink is busy with a previous operation")]
    Busy,

    #[error("Append rejected: {0}")]
    AppendRejected(String),

    #[error("Invalid sink state: {0}")]
    InvalidState(String),

    #[error("Media target already released")]
    Released,
}

/// Failures to start playback.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlayError {
    /// The environment's autoplay policy refused playback. Expected, not a
    /// failure of the recording.
    #[error("Playback not allowed: {0}")]
    NotAllowed(String),

    #[error("Playback failed: {0}")]
    Failed(String),
}

impl PlayError {
    pub fn is_policy_rejection(&self) -> bool {
        matches!(self, Self::NotAllowed(_))
    }
}
