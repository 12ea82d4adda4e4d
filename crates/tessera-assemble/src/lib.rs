#![forbid(unsafe_code)]

//! Buffer assembly: turns an ordered chunk list into one continuous media
//! stream by fetching each chunk and appending it to a sink, one append at
//! a time.

mod assembler;
mod error;
mod options;
mod queue;
mod state;

pub use assembler::{AssemblyHandle, AssemblyReport, BufferAssembler};
pub use error::{AssemblyError, ChunkError, ChunkFailure, FallbackOutcome};
pub use options::AssemblerOptions;
pub use queue::AppendQueue;
pub use state::{AssemblyState, AutoplayOutcome, PlaybackMode};
