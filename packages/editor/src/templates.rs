//! # Layout Templates
//!
//! Prebuilt subtrees for the "add section" / "add row" pickers and default
//! props for each element kind.

use crate::node::{Node, NodeKind, Props};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// A subtree ready for insertion: root first, then each node after its parent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub nodes: Vec<Node>,
}

impl Template {
    pub fn root(&self) -> Option<&Node> {
        self.nodes.first()
    }

    pub fn ids(&self) -> Vec<String> {
        self.nodes.iter().map(|n| n.id.clone()).collect()
    }
}

/// Column layouts offered when adding a section or row
pub const LAYOUTS: &[(&str, &[f64])] = &[
    ("1 column", &[100.0]),
    ("2 columns", &[50.0, 50.0]),
    ("3 columns", &[33.33, 33.33, 33.34]),
    ("4 columns", &[25.0, 25.0, 25.0, 25.0]),
    ("1/3 + 2/3", &[33.33, 66.67]),
    ("2/3 + 1/3", &[66.67, 33.33]),
];

/// `count` equal widths summing to 100
pub fn equal_widths(count: usize) -> Vec<f64> {
    let count = count.max(1);
    vec![100.0 / count as f64; count]
}

/// Section holding one row with a column per entry of `widths`
pub fn section_with_columns<F: FnMut() -> String>(next_id: &mut F, widths: &[f64]) -> Template {
    let section = Node::section(next_id()).with_prop("paddingY", 48);
    let mut nodes = vec![section.clone()];
    nodes.extend(row_nodes(next_id, &section.id, widths));
    Template { nodes }
}

/// Row (under an existing section) with a column per entry of `widths`
pub fn row_with_columns<F: FnMut() -> String>(
    next_id: &mut F,
    section_id: &str,
    widths: &[f64],
) -> Template {
    let mut nodes = row_nodes(next_id, section_id, widths);
    // The root is placed by the caller's position
    if let Some(row) = nodes.first_mut() {
        row.parent_id = None;
    }
    Template { nodes }
}

fn row_nodes<F: FnMut() -> String>(next_id: &mut F, section_id: &str, widths: &[f64]) -> Vec<Node> {
    let widths = if widths.is_empty() {
        equal_widths(1)
    } else {
        widths.to_vec()
    };

    let row = Node::row(next_id()).with_parent(section_id).with_prop("gap", 24);
    let row_id = row.id.clone();
    let mut nodes = vec![row];
    for width in widths {
        nodes.push(column(next_id(), width).with_parent(row_id.clone()));
    }
    nodes
}

pub fn column(id: impl Into<String>, width: f64) -> Node {
    Node::new(id, NodeKind::Column).with_prop("width", width)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    Heading,
    Text,
    Button,
    Image,
    Video,
    Form,
    Spacer,
    Divider,
}

impl ElementKind {
    pub const ALL: [ElementKind; 8] = [
        ElementKind::Heading,
        ElementKind::Text,
        ElementKind::Button,
        ElementKind::Image,
        ElementKind::Video,
        ElementKind::Form,
        ElementKind::Spacer,
        ElementKind::Divider,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ElementKind::Heading => "heading",
            ElementKind::Text => "text",
            ElementKind::Button => "button",
            ElementKind::Image => "image",
            ElementKind::Video => "video",
            ElementKind::Form => "form",
            ElementKind::Spacer => "spacer",
            ElementKind::Divider => "divider",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == s)
    }
}

/// A new element of `kind` with its starting props
pub fn element(id: impl Into<String>, kind: ElementKind) -> Node {
    Node::element(id).with_props(default_props(kind))
}

pub fn default_props(kind: ElementKind) -> Props {
    let extra = match kind {
        ElementKind::Heading => json!({"text": "Your headline here", "level": 2, "align": "center"}),
        ElementKind::Text => json!({"text": "Tell visitors why this offer matters.", "align": "left"}),
        ElementKind::Button => json!({
            "label": "Get started",
            "action": {"type": "link", "href": "#"},
            "variant": "primary"
        }),
        ElementKind::Image => json!({"src": "", "alt": "", "fit": "cover"}),
        ElementKind::Video => json!({"url": "", "autoplay": false}),
        ElementKind::Form => json!({
            "fields": [{"name": "email", "type": "email", "required": true}],
            "submitLabel": "Subscribe"
        }),
        ElementKind::Spacer => json!({"height": 32}),
        ElementKind::Divider => json!({"thickness": 1, "color": "#e5e7eb"}),
    };

    let mut props = Props::new();
    props.insert("kind".to_string(), Value::from(kind.as_str()));
    if let Value::Object(map) = extra {
        props.extend(map);
    }
    props
}
