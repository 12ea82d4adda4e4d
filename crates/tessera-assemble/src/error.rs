use std::time::Duration;

use tessera_core::{ChunkIndex, StreamGroup};
use tessera_media::{CodecAttempt, PlayError, SinkError};
use tessera_net::NetError;
use thiserror::Error;

/// Why a single chunk was skipped.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChunkError {
    #[error("fetch failed: {0}")]
    Fetch(NetError),

    #[error("fetch timed out after {0:?}")]
    Timeout(Duration),

    #[error("append failed: {0}")]
    Append(SinkError),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChunkFailure {
    pub index: ChunkIndex,
    pub error: ChunkError,
}

/// What the single-segment fallback did after sink setup failed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FallbackOutcome {
    Disabled,
    /// Chunk 0 was not listed. Later chunks lack the container header and
    /// cannot play on their own, so nothing was fetched.
    NoInitialChunk,
    Played { index: ChunkIndex },
    PlayRejected { index: ChunkIndex, error: PlayError },
    FetchFailed { index: ChunkIndex, error: ChunkError },
}

impl FallbackOutcome {
    pub fn played(&self) -> bool {
        matches!(self, Self::Played { .. })
    }
}

/// Assembly outcome errors. Only [`is_fatal`](Self::is_fatal) variants mean
/// nothing is playable.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AssemblyError {
    #[error("No chunks found for {group}")]
    NoChunksFound { group: StreamGroup },

    #[error("{} of {total} chunks failed", .failed.len())]
    PartialChunkFailure {
        failed: Vec<ChunkFailure>,
        total: usize,
    },

    #[error("All {total} chunks failed")]
    AllChunksFailed {
        failed: Vec<ChunkFailure>,
        total: usize,
    },

    #[error("No supported codec ({} candidates rejected)", .attempts.len())]
    NoSupportedCodec { attempts: Vec<CodecAttempt> },

    #[error("Sink creation failed: {error}")]
    SinkCreationFailed {
        error: SinkError,
        fallback: FallbackOutcome,
    },

    #[error("Failed to finalize stream: {0}")]
    FinalizeFailed(SinkError),

    #[error("Chunk listing unavailable: {0}")]
    CatalogUnavailable(String),
}

impl AssemblyError {
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Self::NoChunksFound { .. } | Self::PartialChunkFailure { .. }
        )
    }
}
