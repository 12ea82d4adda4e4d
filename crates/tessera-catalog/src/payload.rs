//! Wire shapes of the backend chunk listing.

use serde::Deserialize;
use serde_json::Value;
use tracing::trace;

use crate::{CatalogError, CatalogResult};

/// One chunk record as the backend sends it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawChunk {
    #[serde(alias = "chunk_index", alias = "index")]
    pub chunk_index: u64,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub locator: Option<String>,
    #[serde(
        default,
        alias = "streamGroup",
        alias = "stream_type",
        alias = "stream_group"
    )]
    pub stream_type: Option<String>,
    #[serde(default, alias = "size", alias = "size_bytes")]
    pub size_bytes: Option<u64>,
    #[serde(default, alias = "session_id")]
    pub session_id: Option<String>,
}

impl RawChunk {
    /// First non-empty of `url`, `path`, `locator`.
    pub fn locator(&self) -> Option<&str> {
        [&self.url, &self.path, &self.locator]
            .into_iter()
            .flatten()
            .map(|s| s.trim())
            .find(|s| !s.is_empty())
    }
}

/// A raw chunk plus the listing bucket it appeared under, if the payload
/// was grouped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawRecord {
    pub bucket: Option<String>,
    pub chunk: RawChunk,
}

/// A record that did not decode as a [`RawChunk`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RejectedRecord {
    pub bucket: Option<String>,
    /// Position within its array.
    pub position: usize,
    pub reason: String,
}

/// Records of a listing in the order the backend sent them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawListing {
    pub records: Vec<RawRecord>,
    pub rejected: Vec<RejectedRecord>,
}

impl RawListing {
    /// Decode any of the accepted listing shapes: `{"chunks": [..]}`, a bare
    /// array, or an object keyed by stream group.
    ///
    /// Records are decoded one by one; a malformed record lands in
    /// [`rejected`](Self::rejected) instead of failing the listing. In a
    /// grouped object, keys whose value is not an array are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Decode`](crate::CatalogError::Decode) when the
    /// body is not JSON or is neither an array nor an object.
    pub fn from_slice(body: &[u8]) -> CatalogResult<Self> {
        let mut listing = Self::default();
        match serde_json::from_slice::<Value>(body)? {
            Value::Array(items) => listing.extend(None, items),
            Value::Object(mut fields) => match fields.remove("chunks") {
                Some(Value::Array(items)) => listing.extend(None, items),
                _ => {
                    for (bucket, value) in fields {
                        match value {
                            Value::Array(items) => listing.extend(Some(bucket), items),
                            _ => trace!(%bucket, "ignoring non-array listing key"),
                        }
                    }
                }
            },
            other => {
                return Err(CatalogError::Decode(format!(
                    "expected an array or object, got {}",
                    kind(&other)
                )));
            }
        }
        Ok(listing)
    }

    pub fn from_chunks(chunks: impl IntoIterator<Item = RawChunk>) -> Self {
        Self {
            records: chunks
                .into_iter()
                .map(|chunk| RawRecord {
                    bucket: None,
                    chunk,
                })
                .collect(),
            rejected: Vec::new(),
        }
    }

    fn extend(&mut self, bucket: Option<String>, items: Vec<Value>) {
        for (position, item) in items.into_iter().enumerate() {
            match serde_json::from_value::<RawChunk>(item) {
                Ok(chunk) => self.records.push(RawRecord {
                    bucket: bucket.clone(),
                    chunk,
                }),
                Err(e) => self.rejected.push(RejectedRecord {
                    bucket: bucket.clone(),
                    position,
                    reason: e.to_string(),
                }),
            }
        }
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
