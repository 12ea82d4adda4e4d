#![forbid(unsafe_code)]

//! Unified event bus for the tessera playback pipeline.

mod assembly;
mod bus;
mod catalog;
mod event;
mod playback;

pub use assembly::AssemblyEvent;
pub use bus::EventBus;
pub use catalog::CatalogEvent;
pub use event::Event;
pub use playback::PlaybackEvent;
