#![forbid(unsafe_code)]

//! Playback environment abstraction.
//!
//! A [`MediaEnvironment`] hands out [`MediaTarget`]s (a media source bound to
//! one playback element). A target creates [`MediaSink`]s for a codec; a sink
//! accepts one append at a time. [`MediaLease`] guarantees a target is
//! released exactly once, and [`CodecNegotiator`] picks the sink format.

mod error;
mod lease;
pub mod memory;
mod negotiate;
mod traits;

pub use error::{PlayError, SinkError};
pub use lease::MediaLease;
pub use memory::{
    JournalEntry, MediaOp, MemoryEnvConfig, MemoryEnvironment, MemorySink, MemoryTarget,
};
pub use negotiate::{CodecAttempt, CodecNegotiator, CodecRejection, Negotiated, NoSupportedCodec};
pub use traits::{MediaEnvironment, MediaSink, MediaTarget};
