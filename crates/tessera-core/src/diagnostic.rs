use std::fmt;

use crate::{ChunkIndex, SessionId, SignalSource, StreamGroup};

/// Non-fatal catalog finding. Recorded, logged and published; never aborts
/// a listing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CatalogDiagnostic {
    /// Two classification signals disagreed; the more trusted one won.
    GroupMismatch {
        index: ChunkIndex,
        resolved: StreamGroup,
        resolved_by: SignalSource,
        conflicting: StreamGroup,
        conflicting_from: SignalSource,
    },
    /// The same index appeared more than once; the last record was kept.
    DuplicateIndex { group: StreamGroup, index: ChunkIndex },
    /// Indices between `after` and `before` are missing.
    Gap {
        group: StreamGroup,
        after: ChunkIndex,
        before: ChunkIndex,
    },
    /// A group tag the catalog does not recognise; treated as absent.
    UnknownGroupTag { index: ChunkIndex, tag: String },
    /// No signal identified a group; the chunk was dropped.
    Unclassified { index: ChunkIndex, locator: String },
    /// The locator could not be resolved to a URL; the chunk was dropped.
    InvalidLocator {
        index: ChunkIndex,
        locator: String,
        reason: String,
    },
    /// The record names another session; the chunk was dropped.
    ForeignSession { index: ChunkIndex, session: SessionId },
    /// The record at `position` (within `bucket`, if grouped) could not be
    /// decoded; it was dropped.
    MalformedRecord {
        bucket: Option<String>,
        position: usize,
        reason: String,
    },
}

impl CatalogDiagnostic {
    /// Chunk the finding is about. `None` when the record never decoded.
    pub fn index(&self) -> Option<ChunkIndex> {
        match self {
            Self::GroupMismatch { index, .. }
            | Self::DuplicateIndex { index, .. }
            | Self::UnknownGroupTag { index, .. }
            | Self::Unclassified { index, .. }
            | Self::InvalidLocator { index, .. }
            | Self::ForeignSession { index, .. } => Some(*index),
            Self::Gap { after, .. } => Some(*after),
            Self::MalformedRecord { .. } => None,
        }
    }
}

impl fmt::Display for CatalogDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GroupMismatch {
                index,
                resolved,
                resolved_by,
                conflicting,
                conflicting_from,
            } => write!(
                f,
                "chunk {index}: {resolved_by} says {resolved}, {conflicting_from} says {conflicting}; using {resolved}"
            ),
            Self::DuplicateIndex { group, index } => {
                write!(f, "{group} chunk {index} listed more than once; keeping last")
            }
            Self::Gap {
                group,
                after,
                before,
            } => write!(f, "{group} chunks missing between {after} and {before}"),
            Self::UnknownGroupTag { index, tag } => {
                write!(f, "chunk {index}: unknown group tag {tag:?}")
            }
            Self::Unclassified { index, locator } => {
                write!(f, "chunk {index}: no group for locator {locator}")
            }
            Self::InvalidLocator {
                index,
                locator,
                reason,
            } => write!(f, "chunk {index}: invalid locator {locator}: {reason}"),
            Self::ForeignSession { index, session } => {
                write!(f, "chunk {index}: belongs to session {session}")
            }
            Self::MalformedRecord {
                bucket: Some(bucket),
                position,
                reason,
            } => write!(f, "{bucket} record {position} is malformed: {reason}"),
            Self::MalformedRecord {
                bucket: None,
                position,
                reason,
            } => write!(f, "record {position} is malformed: {reason}"),
        }
    }
}
