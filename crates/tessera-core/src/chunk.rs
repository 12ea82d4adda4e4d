use url::Url;

use crate::{ChunkIndex, SessionId, StreamGroup};

/// One uploaded, immutable byte segment of a recording.
///
/// `group` is already resolved by the catalog; `locator` is an absolute
/// URL the bytes can be fetched from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Chunk {
    pub session: SessionId,
    pub index: ChunkIndex,
    pub group: StreamGroup,
    pub locator: Url,
    /// Informational only.
    pub size_bytes: Option<u64>,
}

impl Chunk {
    pub fn new(session: SessionId, index: ChunkIndex, group: StreamGroup, locator: Url) -> Self {
        Self {
            session,
            index,
            group,
            locator,
            size_bytes: None,
        }
    }

    pub fn with_size(mut self, size_bytes: u64) -> Self {
        self.size_bytes = Some(size_bytes);
        self
    }
}
