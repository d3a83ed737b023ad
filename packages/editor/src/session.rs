//! # Edit Session Management
//!
//! One user's editing state over a [`Document`]: what is selected, which root
//! list is being edited (the page or one popup), and whether the page is being
//! previewed. Builder actions ("add a two column section", "duplicate this
//! button") are turned into [`Mutation`]s here so every change still goes
//! through the document's validated path.

use crate::document::{Document, MutationResult};
use crate::id_generator::IdGenerator;
use crate::mutations::{InsertPosition, Mutation, MutationError, PopupPatch};
use crate::node::Props;
use crate::templates::{self, ElementKind};
use crate::tree::RootList;
use crate::EditorError;
use funnel_popups::{PopupDefinition, PreviewContext};
use tracing::info;

/// Root list currently shown on the canvas
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Workspace {
    #[default]
    Page,
    Popup(String),
}

impl Workspace {
    pub fn root_list(&self) -> RootList {
        match self {
            Workspace::Page => RootList::Page,
            Workspace::Popup(id) => RootList::Popup(id.clone()),
        }
    }

    fn position(&self) -> InsertPosition {
        match self {
            Workspace::Page => InsertPosition::page(),
            Workspace::Popup(id) => InsertPosition::popup(id.clone()),
        }
    }
}

/// Single-user edit session
pub struct EditSession {
    /// Unique session identifier
    pub id: String,

    /// Document being edited
    pub document: Document,

    selected: Option<String>,

    workspace: Workspace,

    preview: bool,

    ids: IdGenerator,
}

impl EditSession {
    /// Create new edit session; ids are seeded from the session id and clock
    pub fn new(id: impl Into<String>, document: Document) -> Self {
        let id = id.into();
        let ids = IdGenerator::new(&format!("{}:{}", id, chrono::Utc::now().timestamp_millis()));
        Self::with_ids(id, document, ids)
    }

    pub fn with_ids(id: impl Into<String>, document: Document, ids: IdGenerator) -> Self {
        Self {
            id: id.into(),
            document,
            selected: None,
            workspace: Workspace::Page,
            preview: false,
            ids,
        }
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn is_previewing(&self) -> bool {
        self.preview
    }

    /// Apply a mutation and fix up session state around it
    pub fn apply(&mut self, mutation: &Mutation) -> Result<MutationResult, EditorError> {
        let result = self.document.apply(mutation)?;

        let tree = self.document.tree();
        if self
            .selected
            .as_ref()
            .is_some_and(|id| result.effect.removed.contains(id))
        {
            self.selected = None;
        }
        if matches!(&self.workspace, Workspace::Popup(id) if tree.popup(id).is_none()) {
            self.workspace = Workspace::Page;
        }
        Ok(result)
    }

    /// Append a section with one row of columns to the active workspace
    pub fn add_section(&mut self, widths: &[f64]) -> Result<String, EditorError> {
        let template = {
            let mut next_id = self.id_source();
            templates::section_with_columns(&mut next_id, widths)
        };
        let section_id = template.ids().remove(0);
        let position = self.workspace.position();

        self.apply(&Mutation::InsertTemplate { template, position })?;
        self.selected = Some(section_id.clone());
        Ok(section_id)
    }

    pub fn add_row(&mut self, section_id: &str, widths: &[f64]) -> Result<String, EditorError> {
        let template = {
            let mut next_id = self.id_source();
            templates::row_with_columns(&mut next_id, section_id, widths)
        };
        let row_id = template.ids().remove(0);

        self.apply(&Mutation::InsertTemplate {
            template,
            position: InsertPosition::child_of(section_id),
        })?;
        self.selected = Some(row_id.clone());
        Ok(row_id)
    }

    pub fn add_column(&mut self, row_id: &str, width: f64) -> Result<String, EditorError> {
        let column_id = self.next_id();
        self.apply(&Mutation::InsertNode {
            node: templates::column(column_id.clone(), width),
            position: InsertPosition::child_of(row_id),
        })?;
        Ok(column_id)
    }

    /// Drop a new element into a column and select it
    pub fn add_element(
        &mut self,
        column_id: &str,
        kind: ElementKind,
        index: Option<usize>,
    ) -> Result<String, EditorError> {
        let element_id = self.next_id();
        self.apply(&Mutation::InsertNode {
            node: templates::element(element_id.clone(), kind),
            position: InsertPosition {
                parent_id: Some(column_id.to_string()),
                index,
                popup_id: None,
            },
        })?;
        self.selected = Some(element_id.clone());
        Ok(element_id)
    }

    pub fn move_node(&mut self, node_id: &str, to: InsertPosition) -> Result<(), EditorError> {
        self.apply(&Mutation::MoveNode {
            node_id: node_id.to_string(),
            to,
        })?;
        Ok(())
    }

    /// Move a section within or between root lists
    pub fn move_section(
        &mut self,
        section_id: &str,
        popup_id: Option<&str>,
        index: Option<usize>,
    ) -> Result<(), EditorError> {
        self.apply(&Mutation::MoveSection {
            section_id: section_id.to_string(),
            popup_id: popup_id.map(str::to_string),
            index,
        })?;
        Ok(())
    }

    pub fn delete_node(&mut self, node_id: &str) -> Result<Vec<String>, EditorError> {
        let result = self.apply(&Mutation::DeleteNode {
            node_id: node_id.to_string(),
        })?;
        Ok(result.effect.removed)
    }

    /// Duplicate an element next to itself and select the copy
    pub fn duplicate_element(&mut self, element_id: &str) -> Result<String, EditorError> {
        let new_id = self.next_id();
        self.apply(&Mutation::DuplicateElement {
            element_id: element_id.to_string(),
            new_id: new_id.clone(),
        })?;
        self.selected = Some(new_id.clone());
        Ok(new_id)
    }

    pub fn update_props(&mut self, node_id: &str, props: Props) -> Result<(), EditorError> {
        self.apply(&Mutation::UpdateProps {
            node_id: node_id.to_string(),
            props,
        })?;
        Ok(())
    }

    /// Drag the handle between two columns; returns their new widths
    pub fn resize_columns(
        &mut self,
        left_id: &str,
        right_id: &str,
        dx: f64,
        row_width: f64,
    ) -> Result<(f64, f64), EditorError> {
        self.apply(&Mutation::ResizeColumns {
            left_id: left_id.to_string(),
            right_id: right_id.to_string(),
            dx,
            row_width,
        })?;

        let tree = self.document.tree();
        match (tree.column_width(left_id), tree.column_width(right_id)) {
            (Some(left), Some(right)) => Ok((left, right)),
            _ => Err(MutationError::NodeNotFound(left_id.to_string()).into()),
        }
    }

    /// New popup with factory defaults and a one column section, opened for editing
    pub fn create_popup(&mut self, name: &str) -> Result<String, EditorError> {
        let popup_id = self.next_id();
        let template = {
            let mut next_id = self.id_source();
            templates::section_with_columns(&mut next_id, &[100.0])
        };

        self.apply(&Mutation::AddPopup {
            popup: PopupDefinition::new(popup_id.clone(), name),
        })?;
        self.apply(&Mutation::InsertTemplate {
            template,
            position: InsertPosition::popup(popup_id.clone()),
        })?;

        info!(popup_id = %popup_id, name = %name, "Created popup");
        self.workspace = Workspace::Popup(popup_id.clone());
        self.selected = None;
        Ok(popup_id)
    }

    pub fn update_popup(&mut self, popup_id: &str, patch: PopupPatch) -> Result<(), EditorError> {
        self.apply(&Mutation::UpdatePopup {
            popup_id: popup_id.to_string(),
            patch,
        })?;
        Ok(())
    }

    /// Remove a popup with all its content; returns the removed node ids
    pub fn delete_popup(&mut self, popup_id: &str) -> Result<Vec<String>, EditorError> {
        let result = self.apply(&Mutation::DeletePopup {
            popup_id: popup_id.to_string(),
        })?;
        Ok(result
            .effect
            .removed
            .into_iter()
            .filter(|id| id != popup_id)
            .collect())
    }

    pub fn select(&mut self, node_id: &str) -> Result<(), EditorError> {
        if !self.document.tree().contains(node_id) {
            return Err(MutationError::NodeNotFound(node_id.to_string()).into());
        }
        self.selected = Some(node_id.to_string());
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// Switch the canvas to the page or a popup; clears the selection
    pub fn set_workspace(&mut self, workspace: Workspace) -> Result<(), EditorError> {
        if let Workspace::Popup(popup_id) = &workspace {
            if self.document.tree().popup(popup_id).is_none() {
                return Err(MutationError::PopupNotFound(popup_id.clone()).into());
            }
        }
        self.workspace = workspace;
        self.selected = None;
        Ok(())
    }

    pub fn set_preview(&mut self, preview: bool) {
        self.preview = preview;
    }

    /// Context handed to the popup controller for `path`
    pub fn preview_context(&self, path: impl Into<String>) -> PreviewContext {
        PreviewContext {
            in_page_workspace: self.workspace == Workspace::Page,
            preview: self.preview,
            path: path.into(),
        }
    }

    fn next_id(&mut self) -> String {
        let mut next_id = self.id_source();
        next_id()
    }

    /// Id factory that skips ids already used by nodes or popups
    fn id_source(&mut self) -> impl FnMut() -> String + '_ {
        let tree = self.document.tree();
        let ids = &mut self.ids;
        move || ids.new_unique_id(|id| tree.contains(id) || tree.popups.contains_key(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeKind;
    use serde_json::json;

    fn session() -> EditSession {
        EditSession::with_ids("client-1", Document::default(), IdGenerator::from_seed("t"))
    }

    #[test]
    fn test_session_creation() {
        let session = EditSession::new("client-1", Document::default());

        assert_eq!(session.id, "client-1");
        assert_eq!(session.workspace(), &Workspace::Page);
        assert!(session.selected().is_none());
        assert!(!session.is_previewing());
    }

    #[test]
    fn test_add_section_builds_skeleton() {
        let mut session = session();
        let section_id = session.add_section(&[50.0, 50.0]).unwrap();

        let tree = session.document.tree();
        assert_eq!(tree.page_root_ids, vec![section_id.clone()]);
        let row_id = &tree.get(&section_id).unwrap().children()[0];
        assert_eq!(tree.get(row_id).unwrap().children().len(), 2);
        assert_eq!(session.selected(), Some(section_id.as_str()));
        assert!(tree.verify().is_empty());
    }

    #[test]
    fn test_ids_skip_existing_nodes() {
        let mut session = session();
        session
            .apply(&Mutation::InsertNode {
                node: crate::node::Node::section("t-1"),
                position: InsertPosition::page(),
            })
            .unwrap();

        let section_id = session.add_section(&[100.0]).unwrap();
        assert_eq!(section_id, "t-2");
    }

    #[test]
    fn test_deleting_selected_ancestor_clears_selection() {
        let mut session = session();
        let section_id = session.add_section(&[100.0]).unwrap();
        let column_id = {
            let tree = session.document.tree();
            let row_id = tree.get(&section_id).unwrap().children()[0].clone();
            tree.get(&row_id).unwrap().children()[0].clone()
        };
        let element_id = session.add_element(&column_id, ElementKind::Button, None).unwrap();
        assert_eq!(session.selected(), Some(element_id.as_str()));

        let removed = session.delete_node(&section_id).unwrap();
        assert!(removed.contains(&element_id));
        assert!(session.selected().is_none());
    }

    #[test]
    fn test_duplicate_selects_copy() {
        let mut session = session();
        let section_id = session.add_section(&[100.0]).unwrap();
        let column_id = session.document.tree().collect_subtree(&section_id)[2].clone();
        let original = session.add_element(&column_id, ElementKind::Heading, None).unwrap();

        let copy = session.duplicate_element(&original).unwrap();
        assert_eq!(session.selected(), Some(copy.as_str()));
        assert_eq!(
            session.document.tree().get(&column_id).unwrap().children(),
            [original, copy]
        );
    }

    #[test]
    fn test_failed_action_keeps_state() {
        let mut session = session();
        session.add_section(&[100.0]).unwrap();
        let version = session.document.version;
        let selected = session.selected().map(str::to_string);

        assert!(session.add_element("ghost", ElementKind::Text, None).is_err());
        assert_eq!(session.document.version, version);
        assert_eq!(session.selected().map(str::to_string), selected);
    }

    #[test]
    fn test_create_and_delete_popup() {
        let mut session = session();
        let popup_id = session.create_popup("Exit intent").unwrap();

        assert_eq!(session.workspace(), &Workspace::Popup(popup_id.clone()));
        let tree = session.document.tree();
        let popup = tree.popup(&popup_id).unwrap();
        assert_eq!(popup.name, "Exit intent");
        assert_eq!(popup.root_ids.len(), 1);
        let skeleton = tree.collect_root_list(&RootList::Popup(popup_id.clone()));
        assert_eq!(skeleton.len(), 3);
        assert_eq!(tree.get(&skeleton[2]).unwrap().kind, NodeKind::Column);

        // New sections go to the popup being edited
        let section_id = session.add_section(&[100.0]).unwrap();
        assert_eq!(session.document.tree().popup(&popup_id).unwrap().root_ids.len(), 2);
        assert!(session.document.tree().page_root_ids.is_empty());

        let removed = session.delete_popup(&popup_id).unwrap();
        assert!(removed.contains(&section_id));
        assert!(!removed.contains(&popup_id));
        assert_eq!(session.workspace(), &Workspace::Page);
        assert!(session.selected().is_none());
        assert!(session.document.tree().nodes.is_empty());
    }

    #[test]
    fn test_workspace_and_preview_context() {
        let mut session = session();
        assert!(session.set_workspace(Workspace::Popup("nope".into())).is_err());

        session.set_preview(true);
        let ctx = session.preview_context("/pricing");
        assert!(ctx.triggers_active());
        assert_eq!(ctx.path, "/pricing");

        let popup_id = session.create_popup("Promo").unwrap();
        assert!(!session.preview_context("/").triggers_active());

        session.set_workspace(Workspace::Page).unwrap();
        assert!(session.preview_context("/").triggers_active());
        assert!(session.document.tree().popup(&popup_id).is_some());
    }

    #[test]
    fn test_resize_and_props_through_session() {
        let mut session = session();
        let section_id = session.add_section(&[50.0, 50.0]).unwrap();
        let ids = session.document.tree().collect_subtree(&section_id);
        let (left, right) = (ids[2].clone(), ids[3].clone());

        let (l, r) = session.resize_columns(&left, &right, 100.0, 1000.0).unwrap();
        assert!((l - 60.0).abs() < 1e-9);
        assert!((r - 40.0).abs() < 1e-9);

        let patch = crate::mutations::props_patch([("background", json!("#fff"))]);
        session.update_props(&section_id, patch).unwrap();
        assert_eq!(
            session.document.tree().get(&section_id).unwrap().props["background"],
            "#fff"
        );
    }
}
