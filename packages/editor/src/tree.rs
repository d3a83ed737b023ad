//! # Document Tree
//!
//! The page as a flat node map plus ordered root lists: one for the page and
//! one per popup. Containment lives in `children` lists; `parent_id` mirrors it.
//!
//! ## Invariants
//!
//! 1. Every id in a root list or `children` list exists in `nodes`
//! 2. A node is listed in exactly one place and its `parent_id` names that place
//! 3. No node is its own ancestor
//! 4. A node's children are all of the single next-lower kind
//!
//! [`Tree::verify`] reports every violation; the mutation engine keeps them.

use crate::node::{Node, NodeKind};
use funnel_popups::PopupDefinition;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tree {
    /// Section ids forming the main page, top to bottom
    pub page_root_ids: Vec<String>,

    pub nodes: BTreeMap<String, Node>,

    #[serde(default)]
    pub popups: BTreeMap<String, PopupDefinition>,
}

/// One of the tree's ordered section lists
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RootList {
    Page,
    Popup(String),
}

impl RootList {
    pub fn from_popup_id(popup_id: Option<&str>) -> Self {
        match popup_id {
            Some(id) => RootList::Popup(id.to_string()),
            None => RootList::Page,
        }
    }
}

/// Where a node is currently listed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    Root { list: RootList, index: usize },
    Child { parent_id: String, index: usize },
}

/// A broken invariant found by [`Tree::verify`]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IntegrityViolation {
    #[error("{owner} lists missing node {id}")]
    MissingNode { owner: String, id: String },

    #[error("node {id} is listed {count} times")]
    ListedMoreThanOnce { id: String, count: usize },

    #[error("node {id} has parentId {actual:?} but is listed under {expected:?}")]
    ParentMismatch {
        id: String,
        expected: Option<String>,
        actual: Option<String>,
    },

    #[error("{child_kind} {child_id} cannot sit under {parent_kind} {parent_id}")]
    InvalidChild {
        parent_id: String,
        parent_kind: NodeKind,
        child_id: String,
        child_kind: NodeKind,
    },

    #[error("root list {list} holds {kind} {id}, only sections may be roots")]
    NonSectionRoot { list: String, id: String, kind: NodeKind },

    #[error("node {id} is its own ancestor")]
    Cycle { id: String },

    #[error("node {id} is not reachable from any root")]
    Unreachable { id: String },
}

impl Tree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn parent_of(&self, id: &str) -> Option<&Node> {
        self.nodes
            .get(id)
            .and_then(|n| n.parent_id.as_deref())
            .and_then(|p| self.nodes.get(p))
    }

    /// Root list holding the section that contains `id`
    pub fn root_list_of(&self, id: &str) -> Option<RootList> {
        let top = self.ancestors(id).pop().unwrap_or_else(|| id.to_string());
        self.root_lists()
            .find(|(_, ids)| ids.iter().any(|r| *r == top))
            .map(|(list, _)| list)
    }

    pub fn popup(&self, id: &str) -> Option<&PopupDefinition> {
        self.popups.get(id)
    }

    pub fn root_list(&self, list: &RootList) -> Option<&Vec<String>> {
        match list {
            RootList::Page => Some(&self.page_root_ids),
            RootList::Popup(id) => self.popups.get(id).map(|p| &p.root_ids),
        }
    }

    pub(crate) fn root_list_mut(&mut self, list: &RootList) -> Option<&mut Vec<String>> {
        match list {
            RootList::Page => Some(&mut self.page_root_ids),
            RootList::Popup(id) => self.popups.get_mut(id).map(|p| &mut p.root_ids),
        }
    }

    /// Every root list: the page first, then popups in id order
    pub fn root_lists(&self) -> impl Iterator<Item = (RootList, &Vec<String>)> {
        std::iter::once((RootList::Page, &self.page_root_ids)).chain(
            self.popups
                .iter()
                .map(|(id, popup)| (RootList::Popup(id.clone()), &popup.root_ids)),
        )
    }

    /// Where `id` is currently listed, if anywhere
    pub fn location_of(&self, id: &str) -> Option<Location> {
        let node = self.nodes.get(id)?;

        if let Some(parent_id) = &node.parent_id {
            let parent = self.nodes.get(parent_id)?;
            let index = parent.children().iter().position(|c| c == id)?;
            return Some(Location::Child {
                parent_id: parent_id.clone(),
                index,
            });
        }

        self.root_lists().find_map(|(list, ids)| {
            ids.iter()
                .position(|r| r == id)
                .map(|index| Location::Root { list, index })
        })
    }

    /// Parent chain of `id`, nearest first; stops at a repeated id
    pub fn ancestors(&self, id: &str) -> Vec<String> {
        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        seen.insert(id.to_string());

        let mut current = self.nodes.get(id).and_then(|n| n.parent_id.clone());
        while let Some(parent_id) = current {
            if !seen.insert(parent_id.clone()) {
                break;
            }
            current = self.nodes.get(&parent_id).and_then(|n| n.parent_id.clone());
            chain.push(parent_id);
        }
        chain
    }

    /// Whether `ancestor` appears in the parent chain of `id`
    pub fn is_ancestor(&self, ancestor: &str, id: &str) -> bool {
        self.ancestors(id).iter().any(|a| a == ancestor)
    }

    /// `id` and every node reachable from it through `children`, pre-order
    pub fn collect_subtree(&self, id: &str) -> Vec<String> {
        let mut out = Vec::new();
        let mut visited = HashSet::new();
        let mut stack = vec![id.to_string()];

        while let Some(current) = stack.pop() {
            if !visited.insert(current.clone()) {
                continue;
            }
            if let Some(node) = self.nodes.get(&current) {
                stack.extend(node.children().iter().rev().cloned());
            }
            out.push(current);
        }
        out
    }

    /// Sections of `list` with all their descendants
    pub fn collect_root_list(&self, list: &RootList) -> Vec<String> {
        self.root_list(list)
            .map(|roots| roots.iter().flat_map(|r| self.collect_subtree(r)).collect())
            .unwrap_or_default()
    }

    /// Check every structural invariant; empty means consistent
    pub fn verify(&self) -> Vec<IntegrityViolation> {
        let mut violations = Vec::new();
        let mut owners: HashMap<&str, Vec<Option<&str>>> = HashMap::new();

        for (list, ids) in self.root_lists() {
            let label = match &list {
                RootList::Page => "page".to_string(),
                RootList::Popup(id) => format!("popup {}", id),
            };
            for id in ids {
                owners.entry(id.as_str()).or_default().push(None);
                match self.nodes.get(id) {
                    None => violations.push(IntegrityViolation::MissingNode {
                        owner: label.clone(),
                        id: id.clone(),
                    }),
                    Some(node) if node.kind != NodeKind::Section => {
                        violations.push(IntegrityViolation::NonSectionRoot {
                            list: label.clone(),
                            id: id.clone(),
                            kind: node.kind,
                        })
                    }
                    Some(_) => {}
                }
            }
        }

        for (parent_id, parent) in &self.nodes {
            for child_id in parent.children() {
                owners
                    .entry(child_id.as_str())
                    .or_default()
                    .push(Some(parent_id.as_str()));

                let Some(child) = self.nodes.get(child_id) else {
                    violations.push(IntegrityViolation::MissingNode {
                        owner: parent_id.clone(),
                        id: child_id.clone(),
                    });
                    continue;
                };
                if parent.kind.child_kind() != Some(child.kind) {
                    violations.push(IntegrityViolation::InvalidChild {
                        parent_id: parent_id.clone(),
                        parent_kind: parent.kind,
                        child_id: child_id.clone(),
                        child_kind: child.kind,
                    });
                }
            }
        }

        for (id, node) in &self.nodes {
            match owners.get(id.as_str()) {
                None => violations.push(IntegrityViolation::Unreachable { id: id.clone() }),
                Some(listed) if listed.len() > 1 => {
                    violations.push(IntegrityViolation::ListedMoreThanOnce {
                        id: id.clone(),
                        count: listed.len(),
                    })
                }
                Some(listed) => {
                    let expected = listed[0].map(str::to_string);
                    if expected != node.parent_id {
                        violations.push(IntegrityViolation::ParentMismatch {
                            id: id.clone(),
                            expected,
                            actual: node.parent_id.clone(),
                        });
                    }
                }
            }

            if self.has_parent_cycle(id) {
                violations.push(IntegrityViolation::Cycle { id: id.clone() });
            }
        }

        violations
    }

    fn has_parent_cycle(&self, id: &str) -> bool {
        let mut seen = HashSet::new();
        let mut current = Some(id.to_string());
        while let Some(node_id) = current {
            if !seen.insert(node_id.clone()) {
                return node_id == id;
            }
            current = self.nodes.get(&node_id).and_then(|n| n.parent_id.clone());
        }
        false
    }
}
