use tessera_catalog::CatalogError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlaybackError {
    #[error("Chunk listing failed: {0}")]
    Catalog(#[from] CatalogError),

    #[error("No session is being played")]
    NoSession,
}

pub type PlaybackResult<T> = Result<T, PlaybackError>;
