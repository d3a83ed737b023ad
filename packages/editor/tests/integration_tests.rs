//! Integration tests for editor crate

use funnel_common::{DirectoryStore, MemoryStore};
use funnel_editor::{
    Document, DocumentStore, EditSession, EditorError, ElementKind, IdGenerator, Mutation,
    MutationError, PopupPatch, RootList, Workspace,
};
use funnel_popups::{FrequencyStore, PopupController, SchedulerConfig, Targeting, TargetingMode};
use serde_json::json;

fn session() -> EditSession {
    EditSession::with_ids("it", Document::default(), IdGenerator::from_seed("it"))
}

fn first_column(session: &EditSession, section_id: &str) -> String {
    session.document.tree().collect_subtree(section_id)[2].clone()
}

#[test]
fn test_document_lifecycle() -> anyhow::Result<()> {
    let mut session = session();

    let hero = session.add_section(&[100.0])?;
    let column = first_column(&session, &hero);
    session.add_element(&column, ElementKind::Heading, None)?;
    session.add_element(&column, ElementKind::Button, None)?;

    let features = session.add_section(&[33.33, 33.33, 33.34])?;
    session.move_section(&features, None, Some(0))?;

    let json = session.document.to_json()?;
    let restored = Document::from_json(&json)?;

    assert_eq!(restored.tree(), session.document.tree());
    assert_eq!(restored.tree().page_root_ids, vec![features, hero]);
    assert!(restored.tree().verify().is_empty());
    Ok(())
}

#[test]
fn test_edit_session_workflow() -> anyhow::Result<()> {
    let mut session = session();
    let section = session.add_section(&[50.0, 50.0])?;
    let ids = session.document.tree().collect_subtree(&section);
    let (left, right) = (ids[2].clone(), ids[3].clone());

    let text = session.add_element(&left, ElementKind::Text, None)?;
    session.move_node(&text, funnel_editor::InsertPosition::child_of(right.clone()))?;
    assert_eq!(session.document.tree().get(&text).unwrap().parent_id.as_deref(), Some(right.as_str()));

    // A column can never go straight into a section
    let err = session
        .move_node(&left, funnel_editor::InsertPosition::child_of(section.clone()))
        .unwrap_err();
    assert!(matches!(err, EditorError::Mutation(MutationError::InvalidStructure(_))));

    // Nor into its own row's descendants
    let row = ids[1].clone();
    let err = session
        .move_node(&row, funnel_editor::InsertPosition::child_of(left.clone()))
        .unwrap_err();
    assert!(matches!(err, EditorError::Mutation(_)));

    assert!(session.document.tree().verify().is_empty());
    Ok(())
}

#[test]
fn test_legacy_document_upgrade() -> anyhow::Result<()> {
    let legacy = json!({
        "version": 1,
        "tree": {
            "rootIds": ["hero"],
            "nodes": {
                "hero": {"id": "hero", "type": "section", "props": {}, "childIds": ["row"]},
                "row": {"id": "row", "type": "row", "parentId": "hero", "props": {}, "childIds": ["col"]},
                "col": {"id": "col", "type": "column", "parentId": "row", "props": {"width": 100}, "childIds": ["cta"]},
                "cta": {"id": "cta", "type": "element", "parentId": "col", "props": {"kind": "button"}}
            }
        }
    });

    let doc = Document::import(legacy)?;
    assert!(doc.tree().verify().is_empty());
    assert!(doc.tree().popups.is_empty());

    let exported = doc.export()?;
    assert_eq!(exported["version"], 2);
    assert_eq!(exported["tree"]["pageRootIds"], json!(["hero"]));
    assert_eq!(exported["tree"]["nodes"]["col"]["children"], json!(["cta"]));
    assert!(exported["tree"]["nodes"]["cta"].get("children").is_none());
    Ok(())
}

#[test]
fn test_malformed_documents_rejected() {
    let cases = [
        json!({"version": 2, "tree": {"pageRootIds": "hero", "nodes": {}, "popups": {}}}),
        json!({"version": 2, "tree": {"pageRootIds": [], "nodes": [], "popups": {}}}),
        json!({"version": 2}),
        json!("just a string"),
    ];
    for case in cases {
        let err = Document::import(case.clone()).unwrap_err();
        assert!(matches!(err, EditorError::Document(_)), "{} accepted", case);
    }
}

#[test]
fn test_popup_editing_and_runtime() -> anyhow::Result<()> {
    let mut session = session();
    session.add_section(&[100.0])?;
    let popup_id = session.create_popup("Newsletter")?;
    assert_eq!(session.workspace(), &Workspace::Popup(popup_id.clone()));

    session.update_popup(
        &popup_id,
        PopupPatch {
            targeting: Some(Targeting {
                mode: TargetingMode::Include,
                include: vec!["/blog".to_string()],
                exclude: vec![],
            }),
            ..PopupPatch::default()
        },
    )?;

    session.set_workspace(Workspace::Page)?;
    session.set_preview(true);

    let tree = session.document.snapshot();
    let mut controller = PopupController::new(
        FrequencyStore::new(MemoryStore::new()),
        SchedulerConfig::default(),
    );

    controller.sync(&tree.popups, session.preview_context("/pricing"), 0);
    assert!(controller.next_due().is_none());

    controller.sync(&tree.popups, session.preview_context("/blog/launch"), 0);
    let due = controller.next_due().unwrap();
    assert_eq!(controller.tick(&tree.popups, due), Some(popup_id.clone()));
    assert_eq!(controller.frequency().read(&popup_id).count, 1);
    Ok(())
}

#[test]
fn test_popup_content_deleted_with_popup() -> anyhow::Result<()> {
    let mut session = session();
    let popup_id = session.create_popup("Exit")?;
    let section = session.document.tree().popup(&popup_id).unwrap().root_ids[0].clone();
    let column = first_column(&session, &section);
    let element = session.add_element(&column, ElementKind::Form, None)?;

    // Move the popup's section onto the page, then delete the now-empty popup
    session.move_section(&section, None, None)?;
    session.delete_popup(&popup_id)?;

    let tree = session.document.tree();
    assert!(tree.contains(&element));
    assert_eq!(tree.root_list_of(&element), Some(RootList::Page));
    assert!(tree.verify().is_empty());
    Ok(())
}

#[test]
fn test_document_store_round_trip_on_disk() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let mut session = session();
    session.add_section(&[25.0, 25.0, 25.0, 25.0])?;

    let mut store = DocumentStore::with_default_key(DirectoryStore::open(dir.path())?);
    assert!(store.save(session.document.tree()));

    let reopened = DocumentStore::with_default_key(DirectoryStore::open(dir.path())?);
    let tree = reopened.load().expect("stored document");
    assert_eq!(&tree, session.document.tree());
    Ok(())
}

#[test]
fn test_batch_from_json() -> anyhow::Result<()> {
    let batch: Vec<Mutation> = serde_json::from_value(json!([
        {"kind": "insert_node", "node": {"id": "s", "type": "section", "props": {}}, "position": {}},
        {"kind": "insert_node", "node": {"id": "r", "type": "row", "props": {}}, "position": {"parentId": "s"}},
        {"kind": "insert_node", "node": {"id": "a", "type": "column", "props": {"width": 50}}, "position": {"parentId": "r"}},
        {"kind": "insert_node", "node": {"id": "b", "type": "column", "props": {"width": 50}}, "position": {"parentId": "r"}},
        {"kind": "resize_columns", "leftId": "a", "rightId": "b", "dx": -1000, "rowWidth": 500}
    ]))?;

    let mut doc = Document::default();
    let results = doc.apply_all(&batch)?;
    assert_eq!(results.last().unwrap().version, 5);

    let tree = doc.tree();
    assert_eq!(tree.get("a").unwrap().width(), Some(3.0));
    assert_eq!(tree.get("b").unwrap().width(), Some(97.0));
    Ok(())
}
