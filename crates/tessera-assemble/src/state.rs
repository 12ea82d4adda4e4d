use tessera_core::{AssemblyStatus, CodecDescriptor, StreamGroup};

use crate::{AssemblyError, ChunkFailure};

/// How the group is being played.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PlaybackMode {
    #[default]
    Streaming,
    /// Incremental buffering was unavailable; only the first chunk was
    /// handed to the environment as a standalone segment.
    SingleSegmentFallback,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum AutoplayOutcome {
    #[default]
    NotAttempted,
    Disabled,
    Started,
    /// Refused by the environment. Expected under autoplay policies.
    Blocked(String),
}

/// Observable per-group assembly state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssemblyState {
    pub group: StreamGroup,
    pub status: AssemblyStatus,
    pub chunks_processed: usize,
    pub chunks_total: usize,
    pub bytes_appended: u64,
    pub codec: Option<CodecDescriptor>,
    pub failed_chunks: Vec<ChunkFailure>,
    pub last_error: Option<AssemblyError>,
    pub mode: PlaybackMode,
    pub autoplay: AutoplayOutcome,
}

impl AssemblyState {
    pub fn new(group: StreamGroup) -> Self {
        Self {
            group,
            status: AssemblyStatus::Idle,
            chunks_processed: 0,
            chunks_total: 0,
            bytes_appended: 0,
            codec: None,
            failed_chunks: Vec::new(),
            last_error: None,
            mode: PlaybackMode::default(),
            autoplay: AutoplayOutcome::default(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// `(processed, total)`.
    pub fn progress(&self) -> (usize, usize) {
        (self.chunks_processed, self.chunks_total)
    }
}
