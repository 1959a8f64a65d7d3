use thiserror::Error;

pub type Result<T> = std::result::Result<T, IndexError>;

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Unsupported snapshot schema_version {found} (expected {expected})")]
    UnsupportedSchema { found: u32, expected: u32 },

    #[error("Snapshot is empty")]
    EmptySnapshot,

    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}
