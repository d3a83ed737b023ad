use thiserror::Error;

/// Failure at the persistence boundary
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

impl From<String> for StorageError {
    fn from(s: String) -> Self {
        StorageError::Unavailable(s)
    }
}

impl From<&str> for StorageError {
    fn from(s: &str) -> Self {
        StorageError::Unavailable(s.to_string())
    }
}
