//! Persisted copy of the document under a single key.

use crate::serializer;
use crate::tree::Tree;
use crate::EditorError;
use funnel_common::KeyValueStore;
use tracing::{debug, warn};

pub const DEFAULT_DOCUMENT_KEY: &str = "funnel-builder:document";

#[derive(Debug)]
pub struct DocumentStore<S: KeyValueStore> {
    store: S,
    key: String,
}

impl<S: KeyValueStore> DocumentStore<S> {
    pub fn new(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn with_default_key(store: S) -> Self {
        Self::new(store, DEFAULT_DOCUMENT_KEY)
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Stored tree, if there is a readable one
    pub fn try_load(&self) -> Result<Option<Tree>, EditorError> {
        match self.store.get(&self.key)? {
            Some(raw) => Ok(Some(serializer::import_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Best-effort load; any failure is logged and reads as "nothing stored"
    pub fn load(&self) -> Option<Tree> {
        match self.try_load() {
            Ok(tree) => tree,
            Err(e) => {
                warn!(key = %self.key, error = %e, "Stored document unreadable, ignoring it");
                None
            }
        }
    }

    pub fn try_save(&mut self, tree: &Tree) -> Result<(), EditorError> {
        let raw = serializer::export_string(tree)?;
        self.store.set(&self.key, &raw)?;
        debug!(key = %self.key, bytes = raw.len(), "Saved document");
        Ok(())
    }

    /// Best-effort save; returns whether the write went through
    pub fn save(&mut self, tree: &Tree) -> bool {
        match self.try_save(tree) {
            Ok(()) => true,
            Err(e) => {
                warn!(key = %self.key, error = %e, "Failed to persist document");
                false
            }
        }
    }

    pub fn clear(&mut self) {
        if let Err(e) = self.store.remove(&self.key) {
            warn!(key = %self.key, error = %e, "Failed to clear stored document");
        }
    }

    pub fn inner(&self) -> &S {
        &self.store
    }

    pub fn into_inner(self) -> S {
        self.store
    }
}
