//! # Funnel Editor
//!
//! Core document editing engine for the funnel builder.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ serializer: JSON (v1 / v2 / bare) → Tree    │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: Document snapshots + mutations      │
//! │  - Validate, then apply, then publish       │
//! │  - Containment: section → row → column → el │
//! │  - Column resize, templates, id generation  │
//! │  - EditSession: selection + workspace       │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ popups: targeting, frequency, triggers      │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Tree is source of truth**: renders and previews are derived views
//! 2. **All-or-nothing mutations**: a failed operation changes nothing
//! 3. **Snapshots are immutable**: readers keep whatever version they hold
//! 4. **Persistence is best-effort**: storage failures are logged, not fatal
//!
//! ## Usage
//!
//! ```rust,ignore
//! use funnel_editor::{Document, EditSession, ElementKind};
//!
//! let mut session = EditSession::new("client-1", Document::default());
//!
//! let section_id = session.add_section(&[50.0, 50.0])?;
//! let column_id = session.document.tree().collect_subtree(&section_id)[2].clone();
//! session.add_element(&column_id, ElementKind::Button, None)?;
//!
//! let json = session.document.to_json()?;
//! ```

mod document;
mod errors;
mod id_generator;
mod mutations;
mod node;
mod resize;
mod serializer;
mod session;
mod storage;
pub mod templates;
mod tree;

pub use document::{Document, MutationResult};
pub use errors::EditorError;
pub use id_generator::{get_seed, IdGenerator};
pub use mutations::{
    props_patch, InsertPosition, Mutation, MutationEffect, MutationError, PopupPatch,
};
pub use node::{Node, NodeKind, Props};
pub use resize::{compute_resize, RectLookup, ResizeConfig, DEFAULT_ROW_TOTAL, MIN_COLUMN_WIDTH};
pub use serializer::{
    export, export_string, import, import_str, DocumentError, CURRENT_VERSION,
};
pub use session::{EditSession, Workspace};
pub use storage::{DocumentStore, DEFAULT_DOCUMENT_KEY};
pub use templates::{ElementKind, Template};
pub use tree::{IntegrityViolation, Location, RootList, Tree};

// Re-export popup types for convenience
pub use funnel_popups::{PopupDefinition, PreviewContext};
