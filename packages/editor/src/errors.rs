//! Error types for the editor

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Mutation error: {0}")]
    Mutation(#[from] crate::mutations::MutationError),

    #[error("Document error: {0}")]
    Document(#[from] crate::serializer::DocumentError),

    #[error("Storage error: {0}")]
    Storage(#[from] funnel_common::StorageError),
}
