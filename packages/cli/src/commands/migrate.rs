use super::{read_tree, write_output, Context};
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct MigrateArgs {
    /// Document in any accepted shape (v1, v2, or a bare tree)
    pub input: PathBuf,

    /// Where to write the current format (stdout if omitted)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Also persist the result as the stored document
    #[arg(long)]
    pub store: bool,
}

pub fn migrate(args: MigrateArgs, ctx: &Context) -> Result<()> {
    let tree = read_tree(&args.input)?;
    write_output(&funnel_editor::export_string(&tree)?, args.output.as_deref())?;

    if args.store {
        let mut store = ctx.document_store()?;
        store.try_save(&tree)?;
        eprintln!("{} Stored under {}", "✓".green(), store.key());
    }
    Ok(())
}
