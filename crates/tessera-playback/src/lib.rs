#![forbid(unsafe_code)]

//! Playback session: runs one buffer assembler per displayed stream group
//! and owns their teardown.

mod error;
mod session;

pub use error::{PlaybackError, PlaybackResult};
pub use session::PlaybackSession;
