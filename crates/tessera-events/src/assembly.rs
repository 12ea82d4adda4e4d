use tessera_core::{AssemblyStatus, ChunkIndex, CodecDescriptor, StreamGroup};

/// Events emitted by a buffer assembler.
#[derive(Clone, Debug, PartialEq)]
pub enum AssemblyEvent {
    /// State machine transition.
    StatusChanged {
        group: StreamGroup,
        status: AssemblyStatus,
    },
    /// A codec was negotiated for the group's sink.
    CodecSelected {
        group: StreamGroup,
        codec: CodecDescriptor,
    },
    /// A candidate codec was rejected during negotiation.
    CodecRejected {
        group: StreamGroup,
        codec: CodecDescriptor,
        reason: String,
    },
    /// A chunk's bytes were appended to the sink.
    ChunkAppended {
        group: StreamGroup,
        index: ChunkIndex,
        bytes: u64,
    },
    /// A chunk was skipped; assembly continues.
    ChunkFailed {
        group: StreamGroup,
        index: ChunkIndex,
        error: String,
    },
    /// Emitted after every chunk, appended or skipped.
    Progress {
        group: StreamGroup,
        processed: usize,
        total: usize,
    },
    /// End-of-stream was signalled to the sink.
    EndOfStream { group: StreamGroup },
    /// Autoplay attempt outcome. Rejection is expected and not an error.
    Autoplay { group: StreamGroup, started: bool },
    /// Single-segment fallback mode was attempted.
    Fallback {
        group: StreamGroup,
        index: ChunkIndex,
        played: bool,
    },
}

impl AssemblyEvent {
    pub fn group(&self) -> StreamGroup {
        match self {
            Self::StatusChanged { group, .. }
            | Self::CodecSelected { group, .. }
            | Self::CodecRejected { group, .. }
            | Self::ChunkAppended { group, .. }
            | Self::ChunkFailed { group, .. }
            | Self::Progress { group, .. }
            | Self::EndOfStream { group }
            | Self::Autoplay { group, .. }
            | Self::Fallback { group, .. } => *group,
        }
    }
}
