//! The structured error surface of the core (spec.md §7). Every error kind
//! named there gets one variant; nothing here is retried internally.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GeomgError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("layer dimensions do not match the container's padded size")]
    UnalignedLayer,

    #[error("cumulative compressed offset would exceed u32::MAX")]
    TableOverflow,

    #[error("container cannot hold more than 255 layers")]
    TooManyLayers,

    #[error("compression failed: {0}")]
    CompressionFailure(String),

    #[error("sink write failed")]
    SinkIoError(#[from] std::io::Error),

    #[error("allocation failed: {0}")]
    OutOfMemory(String),
}

pub type Result<T> = std::result::Result<T, GeomgError>;
