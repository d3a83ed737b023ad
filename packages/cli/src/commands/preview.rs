use super::Context;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use funnel_common::KeyValueStore;
use funnel_editor::Tree;
use funnel_popups::{now_millis, PopupController, PreviewContext};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

#[derive(Args, Debug)]
pub struct PreviewArgs {
    /// Document to preview (defaults to the stored document)
    pub input: Option<PathBuf>,

    /// Page path the visitor lands on
    #[arg(short, long)]
    pub path: Option<String>,

    /// Stop after this many seconds
    #[arg(short, long, default_value = "30")]
    pub seconds: u64,

    /// Open this popup right away, as a button action would
    #[arg(long, value_name = "POPUP_ID")]
    pub open: Option<String>,
}

pub fn preview(args: PreviewArgs, ctx: &Context) -> Result<()> {
    let tree = ctx.load_tree(args.input.as_deref())?;
    let path = args.path.unwrap_or_else(|| ctx.config.default_path.clone());

    let frequency = funnel_popups::FrequencyStore::with_prefix(
        ctx.open_store()?,
        ctx.config.frequency_key_prefix.clone(),
    );
    let mut controller = PopupController::new(frequency, ctx.config.scheduler());

    println!("👀 {} {} ({}s)", "Previewing".green().bold(), path, args.seconds);

    if let Some(popup_id) = &args.open {
        let popup = tree
            .popup(popup_id)
            .ok_or_else(|| anyhow::anyhow!("Unknown popup: {}", popup_id))?;
        controller.sync(&tree.popups, PreviewContext::previewing(path.clone()), now_millis());
        controller.open_manual(popup, now_millis())?;
        println!("   {} {} (manual)", "opened".green(), popup_id);
        return Ok(());
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let opened = runtime.block_on(run_preview(
        &tree,
        &mut controller,
        &path,
        Duration::from_secs(args.seconds),
    ));

    match opened {
        Some(popup_id) => println!("   {} {}", "opened".green(), popup_id),
        None => println!("   {} no popup opened", "·".dimmed()),
    }
    Ok(())
}

/// Run the page's popup triggers in real time until one opens or none remain
pub async fn run_preview<S: KeyValueStore>(
    tree: &Tree,
    controller: &mut PopupController<S>,
    path: &str,
    limit: Duration,
) -> Option<String> {
    controller.sync(&tree.popups, PreviewContext::previewing(path), now_millis());
    let deadline = tokio::time::Instant::now() + limit;

    while let Some(due) = controller.next_due() {
        let wait = Duration::from_millis((due - now_millis()).max(0) as u64);
        tokio::select! {
            _ = tokio::time::sleep(wait) => {}
            _ = tokio::time::sleep_until(deadline) => {
                info!("Preview time limit reached");
                return None;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Preview interrupted");
                return None;
            }
        }

        if let Some(popup_id) = controller.tick(&tree.popups, now_millis()) {
            return Some(popup_id);
        }
    }
    None
}
