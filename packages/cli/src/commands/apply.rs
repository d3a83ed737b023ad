use super::{read_tree, write_output, Context};
use anyhow::{Context as _, Result};
use clap::Args;
use colored::Colorize;
use funnel_editor::{Document, Mutation};
use serde_json::Value;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct ApplyArgs {
    /// Document to edit
    pub input: PathBuf,

    /// JSON file holding one mutation or an array of them
    pub mutations: PathBuf,

    /// Where to write the edited document (stdout if omitted)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Also persist the result as the stored document
    #[arg(long)]
    pub store: bool,
}

pub fn apply(args: ApplyArgs, ctx: &Context) -> Result<()> {
    let tree = read_tree(&args.input)?;
    let source = std::fs::read_to_string(&args.mutations)
        .with_context(|| format!("Cannot read {}", args.mutations.display()))?;
    let batch = parse_batch(&source)?;

    let mut doc = Document::new(tree).with_resize_config(ctx.config.resize());
    for (i, mutation) in batch.iter().enumerate() {
        doc.apply(mutation)
            .with_context(|| format!("Mutation #{} ({}) failed", i + 1, mutation.name()))?;
    }
    eprintln!(
        "{} Applied {} mutations (version {})",
        "✓".green(),
        batch.len(),
        doc.version
    );

    write_output(&doc.to_json()?, args.output.as_deref())?;
    if args.store {
        ctx.document_store()?.try_save(doc.tree())?;
    }
    Ok(())
}

/// A single mutation object or an array of them
pub fn parse_batch(source: &str) -> Result<Vec<Mutation>> {
    let value: Value = serde_json::from_str(source)?;
    let batch = match value {
        Value::Array(_) => serde_json::from_value(value)?,
        other => vec![serde_json::from_value(other)?],
    };
    Ok(batch)
}
