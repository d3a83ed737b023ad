//! # Node Model
//!
//! A funnel page is a strict four-level hierarchy:
//!
//! ```text
//! section → row → column → element
//! ```
//!
//! Containers list their children by id; elements are leaves. `props` is an
//! open bag of rendering configuration; only `width` on columns and `kind` on
//! elements mean anything to the engine.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Open key/value bag carried by every node
pub type Props = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Section,
    Row,
    Column,
    Element,
}

impl NodeKind {
    /// The only kind allowed directly under this one
    pub fn child_kind(self) -> Option<NodeKind> {
        match self {
            NodeKind::Section => Some(NodeKind::Row),
            NodeKind::Row => Some(NodeKind::Column),
            NodeKind::Column => Some(NodeKind::Element),
            NodeKind::Element => None,
        }
    }

    /// The only kind allowed directly above this one (`None` = root list)
    pub fn parent_kind(self) -> Option<NodeKind> {
        match self {
            NodeKind::Section => None,
            NodeKind::Row => Some(NodeKind::Section),
            NodeKind::Column => Some(NodeKind::Row),
            NodeKind::Element => Some(NodeKind::Column),
        }
    }

    pub fn has_children(self) -> bool {
        self.child_kind().is_some()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Section => "section",
            NodeKind::Row => "row",
            NodeKind::Column => "column",
            NodeKind::Element => "element",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry in the document tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: String,

    #[serde(rename = "type")]
    pub kind: NodeKind,

    /// `None` only for sections living in a root list
    #[serde(default)]
    pub parent_id: Option<String>,

    #[serde(default)]
    pub props: Props,

    /// Ordered child ids; always `Some` for containers, `None` for elements
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<String>>,
}

impl Node {
    pub fn new(id: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id: id.into(),
            kind,
            parent_id: None,
            props: Props::new(),
            children: kind.has_children().then(Vec::new),
        }
    }

    pub fn section(id: impl Into<String>) -> Self {
        Self::new(id, NodeKind::Section)
    }

    pub fn row(id: impl Into<String>) -> Self {
        Self::new(id, NodeKind::Row)
    }

    pub fn column(id: impl Into<String>) -> Self {
        Self::new(id, NodeKind::Column)
    }

    pub fn element(id: impl Into<String>) -> Self {
        Self::new(id, NodeKind::Element)
    }

    pub fn with_props(mut self, props: Props) -> Self {
        self.props = props;
        self
    }

    pub fn with_prop(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.props.insert(key.into(), value.into());
        self
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    /// Child ids in visual order (empty for elements)
    pub fn children(&self) -> &[String] {
        self.children.as_deref().unwrap_or(&[])
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<String>> {
        self.children.as_mut()
    }

    /// Numeric `width` prop of a column, if set
    pub fn width(&self) -> Option<f64> {
        self.props.get("width").and_then(Value::as_f64)
    }

    /// `kind` prop of an element (`"heading"`, `"button"`...)
    pub fn element_kind(&self) -> Option<&str> {
        self.props.get("kind").and_then(Value::as_str)
    }

    /// Make `children` agree with `kind`: containers get a list, elements none
    pub(crate) fn normalize_children(&mut self) {
        if self.kind.has_children() {
            self.children.get_or_insert_with(Vec::new);
        } else {
            self.children = None;
        }
    }
}
