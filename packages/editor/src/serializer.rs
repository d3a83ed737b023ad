//! # Document Serialization
//!
//! Export always writes the current envelope:
//!
//! ```json
//! {"version": 2, "tree": {"pageRootIds": [...], "nodes": {...}, "popups": {...}}}
//! ```
//!
//! Import accepts three shapes:
//!
//! - **v2**: the envelope above; `pageRootIds`, `nodes` and `popups` must be
//!   an array, an object and an object
//! - **v1**: `{"version": 1, "tree": {"rootIds": [...], "nodes": {...}}}`;
//!   `rootIds` becomes `pageRootIds` and `popups` starts empty
//! - **bare**: a tree object with no envelope, in either of the above shapes
//!
//! Every shape then goes through node normalization: legacy `childIds` /
//! `childrenIds` lists become `children`, and missing node ids are taken from
//! their map key. A node or popup whose `id` disagrees with its key is rejected.

use crate::node::Node;
use crate::tree::Tree;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{info, warn};

pub const CURRENT_VERSION: u64 = 2;

const LEGACY_CHILD_FIELDS: [&str; 2] = ["childIds", "childrenIds"];

#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("Malformed document: {0}")]
    Malformed(String),

    #[error("Unsupported document version: {0}")]
    UnsupportedVersion(u64),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

fn malformed(reason: impl Into<String>) -> DocumentError {
    DocumentError::Malformed(reason.into())
}

#[derive(Serialize)]
struct Envelope<'a> {
    version: u64,
    tree: &'a Tree,
}

/// Versioned export value
pub fn export(tree: &Tree) -> Result<Value, DocumentError> {
    Ok(serde_json::to_value(Envelope {
        version: CURRENT_VERSION,
        tree,
    })?)
}

pub fn export_string(tree: &Tree) -> Result<String, DocumentError> {
    Ok(serde_json::to_string_pretty(&Envelope {
        version: CURRENT_VERSION,
        tree,
    })?)
}

pub fn import_str(source: &str) -> Result<Tree, DocumentError> {
    let value: Value = serde_json::from_str(source)?;
    import(value)
}

/// Accept any supported document shape and produce a current tree
pub fn import(value: Value) -> Result<Tree, DocumentError> {
    let Value::Object(mut root) = value else {
        return Err(malformed("document must be a JSON object"));
    };

    let tree = match root.remove("version") {
        Some(version) => {
            let version = version
                .as_u64()
                .ok_or_else(|| malformed("version must be a non-negative integer"))?;
            let tree = match root.remove("tree") {
                Some(Value::Object(tree)) => tree,
                Some(_) => return Err(malformed("tree must be an object")),
                None => return Err(malformed("missing tree")),
            };
            match version {
                2 => check_v2_shape(tree)?,
                1 => upgrade_v1(tree)?,
                other => return Err(DocumentError::UnsupportedVersion(other)),
            }
        }
        None => upgrade_bare(root)?,
    };

    let tree = normalize(tree)?;
    info!(
        sections = tree.page_root_ids.len(),
        nodes = tree.nodes.len(),
        popups = tree.popups.len(),
        "Imported document"
    );
    Ok(tree)
}

fn check_v2_shape(tree: Map<String, Value>) -> Result<Map<String, Value>, DocumentError> {
    if !tree.get("pageRootIds").is_some_and(Value::is_array) {
        return Err(malformed("tree.pageRootIds must be an array"));
    }
    if !tree.get("nodes").is_some_and(Value::is_object) {
        return Err(malformed("tree.nodes must be an object"));
    }
    if !tree.get("popups").is_some_and(Value::is_object) {
        return Err(malformed("tree.popups must be an object"));
    }
    Ok(tree)
}

fn upgrade_v1(mut tree: Map<String, Value>) -> Result<Map<String, Value>, DocumentError> {
    let root_ids = match tree.remove("rootIds") {
        Some(ids @ Value::Array(_)) => ids,
        _ => return Err(malformed("tree.rootIds must be an array")),
    };
    if !tree.get("nodes").is_some_and(Value::is_object) {
        return Err(malformed("tree.nodes must be an object"));
    }

    tree.insert("pageRootIds".to_string(), root_ids);
    tree.insert("popups".to_string(), Value::Object(Map::new()));
    Ok(tree)
}

/// Tree object saved before the version envelope existed
fn upgrade_bare(mut tree: Map<String, Value>) -> Result<Map<String, Value>, DocumentError> {
    if tree.contains_key("pageRootIds") {
        tree.entry("popups")
            .or_insert_with(|| Value::Object(Map::new()));
        check_v2_shape(tree)
    } else if tree.contains_key("rootIds") {
        upgrade_v1(tree)
    } else {
        Err(malformed("expected a versioned document or a tree with pageRootIds"))
    }
}

fn normalize(mut tree: Map<String, Value>) -> Result<Tree, DocumentError> {
    if let Some(Value::Object(nodes)) = tree.get_mut("nodes") {
        for (key, node) in nodes.iter_mut() {
            let Value::Object(fields) = node else {
                return Err(malformed(format!("node {} must be an object", key)));
            };
            normalize_node_fields(key, fields);
        }
    }

    let mut tree: Tree = serde_json::from_value(Value::Object(tree))
        .map_err(|e| malformed(format!("invalid tree: {}", e)))?;

    if let Some((key, node)) = tree.nodes.iter().find(|(key, node)| **key != node.id) {
        return Err(malformed(format!("node {} is stored under key {}", node.id, key)));
    }
    if let Some((key, popup)) = tree.popups.iter().find(|(key, popup)| **key != popup.id) {
        return Err(malformed(format!("popup {} is stored under key {}", popup.id, key)));
    }

    for node in tree.nodes.values_mut() {
        warn_dropped_children(node);
        node.normalize_children();
    }
    Ok(tree)
}

fn normalize_node_fields(key: &str, fields: &mut Map<String, Value>) {
    for legacy in LEGACY_CHILD_FIELDS {
        if let Some(children) = fields.remove(legacy) {
            if !fields.contains_key("children") {
                fields.insert("children".to_string(), children);
            }
        }
    }
    fields
        .entry("id")
        .or_insert_with(|| Value::from(key.to_string()));
}

fn warn_dropped_children(node: &Node) {
    if !node.kind.has_children() && !node.children().is_empty() {
        warn!(node_id = %node.id, "Dropping children listed on an element");
    }
}
