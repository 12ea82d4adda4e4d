#![forbid(unsafe_code)]

//! Chunk catalog: fetches a session's chunk listing, resolves each chunk's
//! stream group and returns per-group lists in playback order.

mod catalog;
mod classify;
mod error;
mod payload;
mod source;

pub use catalog::{CatalogListing, ChunkCatalog, ChunkList, normalize};
pub use classify::{Classification, GroupSignal, classify};
pub use error::{CatalogError, CatalogResult};
pub use payload::{RawChunk, RawListing, RawRecord, RejectedRecord};
pub use source::{ChunkSource, HttpChunkSource};
