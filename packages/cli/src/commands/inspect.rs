use super::Context;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use funnel_editor::{NodeKind, PopupDefinition, Tree};
use funnel_popups::{FrequencyMode, TargetingMode, Trigger};
use std::fmt::Write as _;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Document to inspect (defaults to the stored document)
    pub input: Option<PathBuf>,
}

pub fn inspect(args: InspectArgs, ctx: &Context) -> Result<()> {
    let tree = ctx.load_tree(args.input.as_deref())?;
    print!("{}", render_outline(&tree));
    Ok(())
}

/// Indented outline of the page and every popup
pub fn render_outline(tree: &Tree) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "{} ({} sections)", "page".bold(), tree.page_root_ids.len());
    for id in &tree.page_root_ids {
        render_node(tree, id, 1, &mut out);
    }

    for popup in tree.popups.values() {
        let _ = writeln!(out, "{}", describe_popup(popup));
        for id in &popup.root_ids {
            render_node(tree, id, 1, &mut out);
        }
    }

    let _ = writeln!(out, "{} nodes", tree.nodes.len());
    out
}

fn render_node(tree: &Tree, id: &str, depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);
    let Some(node) = tree.get(id) else {
        let _ = writeln!(out, "{}{} {}", indent, "missing".red(), id);
        return;
    };

    let detail = match node.kind {
        NodeKind::Column => node
            .width()
            .map(|w| format!(" {:.2}%", w))
            .unwrap_or_default(),
        NodeKind::Element => node
            .element_kind()
            .map(|k| format!(" [{}]", k))
            .unwrap_or_default(),
        _ => String::new(),
    };
    let _ = writeln!(out, "{}{} {}{}", indent, node.kind.as_str().cyan(), id, detail.dimmed());

    for child in node.children() {
        render_node(tree, child, depth + 1, out);
    }
}

fn describe_popup(popup: &PopupDefinition) -> String {
    let triggers: Vec<String> = popup
        .triggers
        .iter()
        .map(|t| match t {
            Trigger::OnPageLoad => "on_page_load".to_string(),
            Trigger::AfterSeconds { seconds } => format!("after {}s", seconds),
        })
        .collect();
    let targeting = match popup.targeting.mode {
        TargetingMode::All => "all",
        TargetingMode::Include => "include",
        TargetingMode::Exclude => "exclude",
    };
    let frequency = match popup.frequency.mode {
        FrequencyMode::EveryVisit => "every_visit".to_string(),
        FrequencyMode::Once => "once".to_string(),
        FrequencyMode::Cooldown => format!("cooldown {}h", popup.frequency.cooldown_hours),
    };

    format!(
        "{} {} \"{}\" ({}; triggers: {}; targeting: {}; frequency: {})",
        "popup".bold(),
        popup.id,
        popup.name,
        if popup.enabled { "enabled" } else { "disabled" },
        if triggers.is_empty() { "none".to_string() } else { triggers.join(", ") },
        targeting,
        frequency
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use funnel_editor::{InsertPosition, Node};

    #[test]
    fn test_outline_lists_every_node() {
        colored::control::set_override(false);

        let mut tree = Tree::new();
        tree.insert(Node::section("hero"), &InsertPosition::page()).unwrap();
        tree.insert(Node::row("row"), &InsertPosition::child_of("hero")).unwrap();
        tree.insert(Node::column("col").with_prop("width", 100), &InsertPosition::child_of("row"))
            .unwrap();
        tree.insert(
            Node::element("cta").with_prop("kind", "button"),
            &InsertPosition::child_of("col"),
        )
        .unwrap();
        tree.add_popup(PopupDefinition::new("promo", "Promo")).unwrap();

        let outline = render_outline(&tree);
        assert!(outline.contains("page (1 sections)"));
        assert!(outline.contains("      column col 100.00%"));
        assert!(outline.contains("        element cta [button]"));
        assert!(outline.contains("popup promo \"Promo\" (enabled; triggers: on_page_load"));
        assert!(outline.ends_with("4 nodes\n"));
    }
}
