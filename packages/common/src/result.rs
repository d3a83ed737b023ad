use crate::error::StorageError;

/// Result type for persistence-boundary operations
pub type StorageResult<T> = Result<T, StorageError>;
