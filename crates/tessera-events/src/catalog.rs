use tessera_core::{CatalogDiagnostic, SessionId, StreamGroup};

/// Events emitted while listing and normalizing chunks.
#[derive(Clone, Debug, PartialEq)]
pub enum CatalogEvent {
    /// A group listing was normalized.
    Listed {
        session: SessionId,
        group: StreamGroup,
        chunks: usize,
    },
    /// A non-fatal finding about the listing.
    Diagnostic {
        session: SessionId,
        diagnostic: CatalogDiagnostic,
    },
}
