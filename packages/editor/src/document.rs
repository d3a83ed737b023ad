//! # Document Handle
//!
//! Holds the current tree as an immutable snapshot plus a version counter.
//!
//! ## Lifecycle
//!
//! ```text
//! Import → Snapshot → Mutation → Snapshot' → Export
//!   ↓         ↓          ↓           ↓          ↓
//! JSON    Arc<Tree>   cloned tree  published   JSON
//! ```
//!
//! A mutation works on a private copy of the tree; only when it succeeds is the
//! copy published and the version bumped. Readers holding an older snapshot
//! keep a consistent view.

use crate::mutations::{Mutation, MutationEffect};
use crate::resize::ResizeConfig;
use crate::serializer;
use crate::tree::Tree;
use crate::EditorError;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Result of a successful mutation
#[derive(Debug, Clone, PartialEq)]
pub struct MutationResult {
    /// Document version after the mutation
    pub version: u64,

    pub effect: MutationEffect,
}

/// Editable funnel document
#[derive(Debug, Clone, Default)]
pub struct Document {
    /// Current version number (increments on each successful mutation)
    pub version: u64,

    tree: Arc<Tree>,

    resize: ResizeConfig,
}

impl Document {
    pub fn new(tree: Tree) -> Self {
        Self {
            version: 0,
            tree: Arc::new(tree),
            resize: ResizeConfig::default(),
        }
    }

    pub fn with_resize_config(mut self, resize: ResizeConfig) -> Self {
        self.resize = resize;
        self
    }

    /// Load from any accepted document shape
    pub fn import(value: Value) -> Result<Self, EditorError> {
        Ok(Self::new(serializer::import(value)?))
    }

    pub fn from_json(source: &str) -> Result<Self, EditorError> {
        Ok(Self::new(serializer::import_str(source)?))
    }

    pub fn export(&self) -> Result<Value, EditorError> {
        Ok(serializer::export(&self.tree)?)
    }

    pub fn to_json(&self) -> Result<String, EditorError> {
        Ok(serializer::export_string(&self.tree)?)
    }

    /// Current snapshot
    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    /// Shared handle to the current snapshot
    pub fn snapshot(&self) -> Arc<Tree> {
        Arc::clone(&self.tree)
    }

    pub fn resize_config(&self) -> &ResizeConfig {
        &self.resize
    }

    /// Apply a mutation
    pub fn apply(&mut self, mutation: &Mutation) -> Result<MutationResult, EditorError> {
        let mut next = (*self.tree).clone();
        let effect = mutation.apply_with(&mut next, &self.resize)?;

        self.tree = Arc::new(next);
        self.version += 1;
        debug!(version = self.version, mutation = mutation.name(), "Published snapshot");

        Ok(MutationResult {
            version: self.version,
            effect,
        })
    }

    /// Apply mutations in order, stopping at the first failure
    ///
    /// Mutations before the failing one stay applied.
    pub fn apply_all<'a, I>(&mut self, mutations: I) -> Result<Vec<MutationResult>, EditorError>
    where
        I: IntoIterator<Item = &'a Mutation>,
    {
        mutations.into_iter().map(|m| self.apply(m)).collect()
    }

    /// Replace the whole tree (e.g. after loading a stored copy)
    pub fn replace(&mut self, tree: Tree) -> u64 {
        self.tree = Arc::new(tree);
        self.version += 1;
        self.version
    }
}
