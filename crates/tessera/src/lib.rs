#![forbid(unsafe_code)]

//! # Tessera
//!
//! Facade crate for rebuilding recorded sessions (webcam and screen-share
//! streams uploaded as independent chunks) into continuous playback.
//!
//! ## Quick start
//!
//! ```ignore
//! use tessera::prelude::*;
//!
//! let config = TesseraConfig::new("https://api.example.com/v1".parse()?);
//! let mut session = config.session(MemoryEnvironment::default())?;
//!
//! let mut state = session.start(SessionId::new("abc"), StreamGroup::Webcam).await?;
//! let done = state.wait_for(AssemblyState::is_terminal).await?;
//! ```

// ── Re-export sub-crates ────────────────────────────────────────────────

pub mod assemble {
    pub use tessera_assemble::*;
}

pub mod catalog {
    pub use tessera_catalog::*;
}

pub mod core {
    pub use tessera_core::*;
}

pub mod events {
    pub use tessera_events::*;
}

pub mod media {
    pub use tessera_media::*;
}

pub mod net {
    pub use tessera_net::*;
}

pub mod playback {
    pub use tessera_playback::*;
}

// ── Configuration ───────────────────────────────────────────────────────

mod config;

pub use config::{SharedNet, TesseraConfig};

// ── Prelude ─────────────────────────────────────────────────────────────

pub mod prelude {
    pub use tessera_assemble::{
        AssemblerOptions, AssemblyError, AssemblyState, AutoplayOutcome, PlaybackMode,
    };
    pub use tessera_catalog::{CatalogError, ChunkCatalog, ChunkList};
    pub use tessera_core::{
        AssemblyStatus, Chunk, ChunkIndex, CodecDescriptor, SessionId, StreamGroup,
    };
    pub use tessera_events::{AssemblyEvent, CatalogEvent, Event, EventBus, PlaybackEvent};
    pub use tessera_media::{MediaEnvironment, MemoryEnvConfig, MemoryEnvironment};
    pub use tessera_net::{NetError, NetOptions, RetryPolicy};
    pub use tessera_playback::{PlaybackError, PlaybackResult, PlaybackSession};

    pub use crate::{SharedNet, TesseraConfig};
}
