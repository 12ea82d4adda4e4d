use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("unknown stream group: {0}")]
    UnknownGroup(String),

    #[error("invalid codec descriptor: {0}")]
    InvalidCodec(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
