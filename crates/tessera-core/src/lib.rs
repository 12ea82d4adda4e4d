#![forbid(unsafe_code)]

//! Shared data model for segmented recording playback.
//!
//! Every other `tessera-*` crate speaks in these types: a recording is a
//! list of [`Chunk`]s per [`StreamGroup`], reassembled in [`ChunkIndex`]
//! order into a sink whose format is picked from [`CodecDescriptor`]s.

mod chunk;
mod codec;
mod diagnostic;
mod error;
mod group;
mod ids;
mod status;

pub use chunk::Chunk;
pub use codec::CodecDescriptor;
pub use diagnostic::CatalogDiagnostic;
pub use error::{CoreError, CoreResult};
pub use group::{SignalSource, StreamGroup};
pub use ids::{ChunkIndex, SessionId};
pub use status::AssemblyStatus;
