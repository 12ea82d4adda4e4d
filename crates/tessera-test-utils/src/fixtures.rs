//! Chunk and listing builders.

use bytes::Bytes;
use serde_json::{Value, json};
use tessera_core::{Chunk, ChunkIndex, SessionId, StreamGroup};
use url::Url;

/// Deterministic payload for a chunk: group tag, index, then filler so
/// concatenations are easy to check.
#[must_use]
pub fn chunk_payload(group: StreamGroup, index: u64) -> Bytes {
    let mut out = format!("{group}:{index};").into_bytes();
    out.extend(std::iter::repeat_n(b'.', 16));
    Bytes::from(out)
}

/// Concatenation of [`chunk_payload`] for `indices` in the given order.
#[must_use]
pub fn expected_stream(group: StreamGroup, indices: impl IntoIterator<Item = u64>) -> Vec<u8> {
    indices
        .into_iter()
        .flat_map(|i| chunk_payload(group, i).to_vec())
        .collect()
}

/// Path a chunk is stored under, relative to a storage base.
#[must_use]
pub fn chunk_path(session: &SessionId, group: StreamGroup, index: u64) -> String {
    format!("{session}/{group}/{index}.webm")
}

/// Resolved chunk rooted at `base`.
#[must_use]
pub fn chunk(base: &Url, session: &SessionId, group: StreamGroup, index: u64) -> Chunk {
    let locator = base
        .join(&chunk_path(session, group, index))
        .expect("join chunk locator");
    Chunk::new(session.clone(), ChunkIndex::new(index), group, locator)
}

/// Resolved chunks for `indices`, in the order given.
#[must_use]
pub fn chunks(
    base: &Url,
    session: &SessionId,
    group: StreamGroup,
    indices: impl IntoIterator<Item = u64>,
) -> Vec<Chunk> {
    indices
        .into_iter()
        .map(|i| chunk(base, session, group, i))
        .collect()
}

/// One listing record in the backend's camelCase shape.
#[must_use]
pub fn listing_record(session: &SessionId, group: StreamGroup, index: u64) -> Value {
    json!({
        "sessionId": session.as_str(),
        "chunkIndex": index,
        "streamType": group.as_str(),
        "path": chunk_path(session, group, index),
        "sizeBytes": chunk_payload(group, index).len(),
    })
}

/// `{"chunks": [..]}` listing body from pre-built records.
#[must_use]
pub fn listing_body(records: impl IntoIterator<Item = Value>) -> Value {
    json!({ "chunks": records.into_iter().collect::<Vec<_>>() })
}
