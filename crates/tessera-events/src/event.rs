use crate::{AssemblyEvent, CatalogEvent, PlaybackEvent};

/// Unified event for the playback pipeline.
///
/// Hierarchical: each subsystem has its own variant with a sub-enum.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    Catalog(CatalogEvent),
    Assembly(AssemblyEvent),
    Playback(PlaybackEvent),
}

impl From<CatalogEvent> for Event {
    fn from(e: CatalogEvent) -> Self {
        Self::Catalog(e)
    }
}

impl From<AssemblyEvent> for Event {
    fn from(e: AssemblyEvent) -> Self {
        Self::Assembly(e)
    }
}

impl From<PlaybackEvent> for Event {
    fn from(e: PlaybackEvent) -> Self {
        Self::Playback(e)
    }
}
