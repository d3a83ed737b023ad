use super::Context;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use funnel_common::KeyValueStore;
use funnel_editor::Tree;
use funnel_popups::{now_millis, FrequencyState, FrequencyStore};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct PopupsArgs {
    /// Document to evaluate (defaults to the stored document)
    pub input: Option<PathBuf>,

    /// Page path to evaluate targeting against
    #[arg(short, long)]
    pub path: Option<String>,

    /// Record a show for this popup first, as if a visitor had seen it
    #[arg(long, value_name = "POPUP_ID")]
    pub record: Option<String>,

    /// Forget the recorded shows of this popup first
    #[arg(long, value_name = "POPUP_ID")]
    pub reset: Option<String>,
}

/// Auto-trigger eligibility of one popup
#[derive(Debug, Clone, PartialEq)]
pub struct PopupRow {
    pub id: String,
    pub name: String,
    pub enabled: bool,
    pub targeted: bool,
    pub frequency_ok: bool,
    pub state: FrequencyState,
}

impl PopupRow {
    pub fn eligible(&self) -> bool {
        self.enabled && self.targeted && self.frequency_ok
    }
}

pub fn popups(args: PopupsArgs, ctx: &Context) -> Result<()> {
    let tree = ctx.load_tree(args.input.as_deref())?;
    let path = args.path.unwrap_or_else(|| ctx.config.default_path.clone());
    let mut frequency =
        FrequencyStore::with_prefix(ctx.open_store()?, ctx.config.frequency_key_prefix.clone());
    let now = now_millis();

    for popup_id in args.reset.iter().chain(args.record.iter()) {
        if tree.popup(popup_id).is_none() {
            anyhow::bail!("Unknown popup: {}", popup_id);
        }
    }
    if let Some(popup_id) = &args.reset {
        frequency.reset(popup_id);
    }
    if let Some(popup_id) = &args.record {
        let state = frequency.record_show(popup_id, now);
        println!("{} Recorded show #{} for {}", "✓".green(), state.count, popup_id);
    }

    let rows = evaluate(&tree, &frequency, &path, now);
    println!("Popups for {}", path.bold());
    if rows.is_empty() {
        println!("   (none)");
    }
    for row in rows {
        let verdict = if row.eligible() {
            "eligible".green()
        } else {
            "blocked".red()
        };
        println!(
            "   {} {} \"{}\"  enabled={} targeted={} frequency={} shows={}",
            verdict,
            row.id,
            row.name,
            row.enabled,
            row.targeted,
            row.frequency_ok,
            row.state.count
        );
    }
    Ok(())
}

/// Check every popup against `path` and its recorded shows
pub fn evaluate<S: KeyValueStore>(
    tree: &Tree,
    frequency: &FrequencyStore<S>,
    path: &str,
    now: i64,
) -> Vec<PopupRow> {
    tree.popups
        .values()
        .map(|popup| {
            let state = frequency.read(&popup.id);
            PopupRow {
                id: popup.id.clone(),
                name: popup.name.clone(),
                enabled: popup.enabled,
                targeted: popup.targeting.allows(path),
                frequency_ok: popup.frequency.allows(&state, now),
                state,
            }
        })
        .collect()
}
