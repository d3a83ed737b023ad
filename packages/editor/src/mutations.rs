//! # Tree Mutations
//!
//! Structural operations on the document tree.
//!
//! ## Design Principles
//!
//! 1. **Validated first**: every check runs before the first write, so a
//!    failing operation leaves the tree exactly as it was
//! 2. **One outcome type**: every operation returns `Result<_, MutationError>`;
//!    nothing is silently skipped
//! 3. **Containment is enforced here**, not only at construction time
//!
//! ## Mutation Semantics
//!
//! ### Insert
//! - Root inserts accept sections only, into the page or a popup's root list
//! - Child inserts require the single allowed kind for the parent
//!
//! ### Move
//! - Detach, then splice under the new parent at `index` (counted after detach)
//! - Fails if the target is the node itself or one of its descendants
//! - Sections change root lists through `MoveSection`, never through `MoveNode`
//!
//! ### Delete
//! - Removes the node and its whole subtree

use crate::node::{Node, NodeKind, Props};
use crate::resize::ResizeConfig;
use crate::templates::Template;
use crate::tree::{Location, RootList, Tree};
use funnel_popups::{Animation, Frequency, PopupDefinition, Targeting, Trigger};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MutationError {
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    #[error("Parent not found: {0}")]
    ParentNotFound(String),

    #[error("Popup not found: {0}")]
    PopupNotFound(String),

    #[error("Moving {node_id} under {target_id} would create a cycle")]
    CycleDetected { node_id: String, target_id: String },

    #[error("Invalid structure: {0}")]
    InvalidStructure(String),

    #[error("Id already in use: {0}")]
    DuplicateId(String),

    #[error("Node is not an element: {0}")]
    NotAnElement(String),

    #[error("Node has no parent: {0}")]
    NoParent(String),
}

/// Where to put a node
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertPosition {
    /// `None` targets a root list
    #[serde(default)]
    pub parent_id: Option<String>,

    /// Splice index; `None` (or past the end) appends
    #[serde(default)]
    pub index: Option<usize>,

    /// Root list to use when `parent_id` is `None`; the page if unset
    #[serde(default)]
    pub popup_id: Option<String>,
}

impl InsertPosition {
    pub fn page() -> Self {
        Self::default()
    }

    pub fn popup(popup_id: impl Into<String>) -> Self {
        Self {
            popup_id: Some(popup_id.into()),
            ..Self::default()
        }
    }

    pub fn child_of(parent_id: impl Into<String>) -> Self {
        Self {
            parent_id: Some(parent_id.into()),
            ..Self::default()
        }
    }

    pub fn at(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }
}

/// Partial update of a popup; `None` fields are left alone
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PopupPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub triggers: Option<Vec<Trigger>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub targeting: Option<Targeting>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<Frequency>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub animation: Option<Animation>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<Props>,
}

fn splice(list: &mut Vec<String>, index: Option<usize>, id: String) -> usize {
    let at = index.map_or(list.len(), |i| i.min(list.len()));
    list.insert(at, id);
    at
}

impl Tree {
    /// Add a new node at `position`
    pub fn insert(&mut self, mut node: Node, position: &InsertPosition) -> Result<(), MutationError> {
        if self.contains(&node.id) {
            return Err(MutationError::DuplicateId(node.id));
        }
        if !node.children().is_empty() {
            return Err(MutationError::InvalidStructure(format!(
                "new {} {} must not reference existing children",
                node.kind, node.id
            )));
        }
        node.normalize_children();

        match &position.parent_id {
            None => {
                if node.kind != NodeKind::Section {
                    return Err(MutationError::InvalidStructure(format!(
                        "only sections can be placed at the root, got {}",
                        node.kind
                    )));
                }
                let list = RootList::from_popup_id(position.popup_id.as_deref());
                let roots = self.root_list_mut(&list).ok_or_else(|| {
                    MutationError::PopupNotFound(position.popup_id.clone().unwrap_or_default())
                })?;
                node.parent_id = None;
                splice(roots, position.index, node.id.clone());
            }
            Some(parent_id) => {
                self.check_child_kind(parent_id, node.kind)?;
                node.parent_id = Some(parent_id.clone());
                if let Some(children) = self.nodes.get_mut(parent_id).and_then(Node::children_mut) {
                    splice(children, position.index, node.id.clone());
                }
            }
        }

        debug!(node_id = %node.id, kind = %node.kind, "Inserted node");
        self.nodes.insert(node.id.clone(), node);
        Ok(())
    }

    /// Insert a prebuilt subtree; returns the id of its root
    pub fn insert_template(
        &mut self,
        template: Template,
        position: &InsertPosition,
    ) -> Result<String, MutationError> {
        let mut nodes = template.nodes.into_iter();
        let root = nodes
            .next()
            .ok_or_else(|| MutationError::InvalidStructure("empty template".to_string()))?;
        let root_id = root.id.clone();

        // Work on a copy so a bad template cannot leave half a subtree behind
        let mut next = self.clone();
        next.insert(root, position)?;
        for node in nodes {
            let parent_id = node.parent_id.clone().ok_or_else(|| {
                MutationError::InvalidStructure(format!("template node {} has no parent", node.id))
            })?;
            next.insert(node, &InsertPosition::child_of(parent_id))?;
        }

        *self = next;
        Ok(root_id)
    }

    /// Unlist `node_id` from its parent or root list without deleting it
    ///
    /// Returns where the node was listed; `None` if it was not listed anywhere.
    pub fn detach(&mut self, node_id: &str) -> Result<Option<Location>, MutationError> {
        if !self.contains(node_id) {
            return Err(MutationError::NodeNotFound(node_id.to_string()));
        }

        let location = self.location_of(node_id);
        match &location {
            Some(Location::Child { parent_id, index }) => {
                if let Some(children) = self.nodes.get_mut(parent_id).and_then(Node::children_mut) {
                    children.remove(*index);
                }
            }
            Some(Location::Root { list, index }) => {
                if let Some(roots) = self.root_list_mut(list) {
                    roots.remove(*index);
                }
            }
            None => {}
        }

        if let Some(node) = self.nodes.get_mut(node_id) {
            node.parent_id = None;
        }
        Ok(location)
    }

    /// Reattach an existing node under another parent
    pub fn move_node(&mut self, node_id: &str, to: &InsertPosition) -> Result<(), MutationError> {
        let kind = self
            .get(node_id)
            .map(|n| n.kind)
            .ok_or_else(|| MutationError::NodeNotFound(node_id.to_string()))?;

        let target_id = to.parent_id.as_deref().ok_or_else(|| {
            MutationError::InvalidStructure(format!(
                "{} {} cannot be moved to a root list; use MoveSection",
                kind, node_id
            ))
        })?;

        if !self.contains(target_id) {
            return Err(MutationError::ParentNotFound(target_id.to_string()));
        }
        if target_id == node_id || self.is_ancestor(node_id, target_id) {
            return Err(MutationError::CycleDetected {
                node_id: node_id.to_string(),
                target_id: target_id.to_string(),
            });
        }
        self.check_child_kind(target_id, kind)?;

        self.detach(node_id)?;
        if let Some(children) = self.nodes.get_mut(target_id).and_then(Node::children_mut) {
            splice(children, to.index, node_id.to_string());
        }
        if let Some(node) = self.nodes.get_mut(node_id) {
            node.parent_id = Some(target_id.to_string());
        }

        debug!(node_id = %node_id, target_id = %target_id, "Moved node");
        Ok(())
    }

    /// Reorder a section, or move it between the page and a popup
    pub fn move_section(
        &mut self,
        section_id: &str,
        list: &RootList,
        index: Option<usize>,
    ) -> Result<(), MutationError> {
        let node = self
            .get(section_id)
            .ok_or_else(|| MutationError::NodeNotFound(section_id.to_string()))?;
        if node.kind != NodeKind::Section {
            return Err(MutationError::InvalidStructure(format!(
                "only sections live in root lists, {} is a {}",
                section_id, node.kind
            )));
        }
        if let RootList::Popup(popup_id) = list {
            if !self.popups.contains_key(popup_id) {
                return Err(MutationError::PopupNotFound(popup_id.clone()));
            }
        }

        self.detach(section_id)?;
        if let Some(roots) = self.root_list_mut(list) {
            splice(roots, index, section_id.to_string());
        }
        Ok(())
    }

    /// Remove `node_id` and its whole subtree; returns every removed id
    pub fn delete_node(&mut self, node_id: &str) -> Result<Vec<String>, MutationError> {
        if !self.contains(node_id) {
            return Err(MutationError::NodeNotFound(node_id.to_string()));
        }

        let subtree = self.collect_subtree(node_id);
        self.detach(node_id)?;
        for id in &subtree {
            self.nodes.remove(id);
        }

        debug!(node_id = %node_id, removed = subtree.len(), "Deleted subtree");
        Ok(subtree)
    }

    /// Copy an element's props into `new_id`, placed right after the original
    pub fn duplicate_element(&mut self, element_id: &str, new_id: &str) -> Result<(), MutationError> {
        let original = self
            .get(element_id)
            .ok_or_else(|| MutationError::NodeNotFound(element_id.to_string()))?;
        if original.kind != NodeKind::Element {
            return Err(MutationError::NotAnElement(element_id.to_string()));
        }
        let parent_id = original
            .parent_id
            .clone()
            .ok_or_else(|| MutationError::NoParent(element_id.to_string()))?;

        let index = match self.location_of(element_id) {
            Some(Location::Child { index, .. }) => index,
            _ => return Err(MutationError::NoParent(element_id.to_string())),
        };

        let copy = Node::element(new_id).with_props(original.props.clone());
        self.insert(copy, &InsertPosition::child_of(parent_id).at(index + 1))
    }

    /// Shallow-merge `patch` into a node's props; `null` values remove keys
    pub fn update_props(&mut self, node_id: &str, patch: Props) -> Result<(), MutationError> {
        let node = self
            .nodes
            .get_mut(node_id)
            .ok_or_else(|| MutationError::NodeNotFound(node_id.to_string()))?;

        for (key, value) in patch {
            if value.is_null() {
                node.props.remove(&key);
            } else {
                node.props.insert(key, value);
            }
        }
        Ok(())
    }

    /// Register a popup; its root list must start empty
    pub fn add_popup(&mut self, popup: PopupDefinition) -> Result<(), MutationError> {
        if self.popups.contains_key(&popup.id) {
            return Err(MutationError::DuplicateId(popup.id));
        }
        if !popup.root_ids.is_empty() {
            return Err(MutationError::InvalidStructure(format!(
                "new popup {} must start without sections",
                popup.id
            )));
        }
        debug!(popup_id = %popup.id, "Added popup");
        self.popups.insert(popup.id.clone(), popup);
        Ok(())
    }

    pub fn update_popup(&mut self, popup_id: &str, patch: PopupPatch) -> Result<(), MutationError> {
        let popup = self
            .popups
            .get_mut(popup_id)
            .ok_or_else(|| MutationError::PopupNotFound(popup_id.to_string()))?;

        if let Some(name) = patch.name {
            popup.name = name;
        }
        if let Some(enabled) = patch.enabled {
            popup.enabled = enabled;
        }
        if let Some(triggers) = patch.triggers {
            popup.triggers = triggers;
        }
        if let Some(targeting) = patch.targeting {
            popup.targeting = targeting;
        }
        if let Some(frequency) = patch.frequency {
            popup.frequency = frequency;
        }
        if let Some(animation) = patch.animation {
            popup.animation = animation;
        }
        if let Some(style) = patch.style {
            popup.style = style;
        }
        Ok(())
    }

    /// Remove a popup and every node under its sections
    pub fn delete_popup(&mut self, popup_id: &str) -> Result<Vec<String>, MutationError> {
        let list = RootList::Popup(popup_id.to_string());
        if !self.popups.contains_key(popup_id) {
            return Err(MutationError::PopupNotFound(popup_id.to_string()));
        }

        let removed = self.collect_root_list(&list);
        for id in &removed {
            self.nodes.remove(id);
        }
        self.popups.remove(popup_id);

        debug!(popup_id = %popup_id, removed = removed.len(), "Deleted popup");
        Ok(removed)
    }

    fn check_child_kind(&self, parent_id: &str, kind: NodeKind) -> Result<(), MutationError> {
        let parent = self
            .get(parent_id)
            .ok_or_else(|| MutationError::ParentNotFound(parent_id.to_string()))?;

        match parent.kind.child_kind() {
            Some(allowed) if allowed == kind => Ok(()),
            Some(allowed) => Err(MutationError::InvalidStructure(format!(
                "{} {} only accepts {} children, got {}",
                parent.kind, parent_id, allowed, kind
            ))),
            None => Err(MutationError::InvalidStructure(format!(
                "{} {} cannot have children",
                parent.kind, parent_id
            ))),
        }
    }
}

/// Serializable editing command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum Mutation {
    InsertNode {
        node: Node,
        #[serde(default)]
        position: InsertPosition,
    },

    /// Insert a prebuilt subtree (section with rows and columns, etc.)
    InsertTemplate {
        template: Template,
        #[serde(default)]
        position: InsertPosition,
    },

    MoveNode {
        node_id: String,
        to: InsertPosition,
    },

    MoveSection {
        section_id: String,
        #[serde(default)]
        popup_id: Option<String>,
        #[serde(default)]
        index: Option<usize>,
    },

    DeleteNode {
        node_id: String,
    },

    DuplicateElement {
        element_id: String,
        new_id: String,
    },

    UpdateProps {
        node_id: String,
        props: Props,
    },

    /// Drag the boundary between two adjacent columns by `dx` pixels
    ResizeColumns {
        left_id: String,
        right_id: String,
        dx: f64,
        row_width: f64,
    },

    AddPopup {
        popup: PopupDefinition,
    },

    UpdatePopup {
        popup_id: String,
        patch: PopupPatch,
    },

    DeletePopup {
        popup_id: String,
    },
}

/// Ids a mutation brought into or removed from the tree
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MutationEffect {
    pub created: Vec<String>,
    pub removed: Vec<String>,
}

impl MutationEffect {
    fn created(id: impl Into<String>) -> Self {
        Self {
            created: vec![id.into()],
            removed: Vec::new(),
        }
    }

    fn removed(ids: Vec<String>) -> Self {
        Self {
            created: Vec::new(),
            removed: ids,
        }
    }
}

impl Mutation {
    pub fn name(&self) -> &'static str {
        match self {
            Mutation::InsertNode { .. } => "insert_node",
            Mutation::InsertTemplate { .. } => "insert_template",
            Mutation::MoveNode { .. } => "move_node",
            Mutation::MoveSection { .. } => "move_section",
            Mutation::DeleteNode { .. } => "delete_node",
            Mutation::DuplicateElement { .. } => "duplicate_element",
            Mutation::UpdateProps { .. } => "update_props",
            Mutation::ResizeColumns { .. } => "resize_columns",
            Mutation::AddPopup { .. } => "add_popup",
            Mutation::UpdatePopup { .. } => "update_popup",
            Mutation::DeletePopup { .. } => "delete_popup",
        }
    }

    /// Apply with the default resize floor
    pub fn apply(&self, tree: &mut Tree) -> Result<MutationEffect, MutationError> {
        self.apply_with(tree, &ResizeConfig::default())
    }

    pub fn apply_with(
        &self,
        tree: &mut Tree,
        resize: &ResizeConfig,
    ) -> Result<MutationEffect, MutationError> {
        let effect = match self {
            Mutation::InsertNode { node, position } => {
                tree.insert(node.clone(), position)?;
                MutationEffect::created(node.id.clone())
            }

            Mutation::InsertTemplate { template, position } => {
                let created = template.ids();
                tree.insert_template(template.clone(), position)?;
                MutationEffect {
                    created,
                    removed: Vec::new(),
                }
            }

            Mutation::MoveNode { node_id, to } => {
                tree.move_node(node_id, to)?;
                MutationEffect::default()
            }

            Mutation::MoveSection {
                section_id,
                popup_id,
                index,
            } => {
                tree.move_section(section_id, &RootList::from_popup_id(popup_id.as_deref()), *index)?;
                MutationEffect::default()
            }

            Mutation::DeleteNode { node_id } => MutationEffect::removed(tree.delete_node(node_id)?),

            Mutation::DuplicateElement { element_id, new_id } => {
                tree.duplicate_element(element_id, new_id)?;
                MutationEffect::created(new_id.clone())
            }

            Mutation::UpdateProps { node_id, props } => {
                tree.update_props(node_id, props.clone())?;
                MutationEffect::default()
            }

            Mutation::ResizeColumns {
                left_id,
                right_id,
                dx,
                row_width,
            } => {
                tree.resize_adjacent_columns(left_id, right_id, *dx, *row_width, resize)?;
                MutationEffect::default()
            }

            Mutation::AddPopup { popup } => {
                tree.add_popup(popup.clone())?;
                MutationEffect::created(popup.id.clone())
            }

            Mutation::UpdatePopup { popup_id, patch } => {
                tree.update_popup(popup_id, patch.clone())?;
                MutationEffect::default()
            }

            Mutation::DeletePopup { popup_id } => {
                let mut removed = tree.delete_popup(popup_id)?;
                removed.push(popup_id.clone());
                MutationEffect::removed(removed)
            }
        };

        debug!(mutation = self.name(), "Applied mutation");
        Ok(effect)
    }

    /// Check the mutation against `tree` without changing it
    pub fn validate(&self, tree: &Tree) -> Result<(), MutationError> {
        let mut scratch = tree.clone();
        self.apply(&mut scratch).map(|_| ())
    }
}

/// Convenience for building `UpdateProps` patches
pub fn props_patch<I, K>(entries: I) -> Props
where
    I: IntoIterator<Item = (K, Value)>,
    K: Into<String>,
{
    entries.into_iter().map(|(k, v)| (k.into(), v)).collect()
}
