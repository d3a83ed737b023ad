use super::Context;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Document to check (defaults to the stored document)
    pub input: Option<PathBuf>,
}

pub fn validate(args: ValidateArgs, ctx: &Context) -> Result<()> {
    let tree = ctx.load_tree(args.input.as_deref())?;
    let violations = tree.verify();

    if violations.is_empty() {
        println!(
            "{} {} nodes, {} popups, no issues found",
            "✓".green(),
            tree.nodes.len(),
            tree.popups.len()
        );
        return Ok(());
    }

    for violation in &violations {
        println!("{} {}", "✗".red(), violation);
    }
    println!();
    println!("   {} {}", "Errors:".red(), violations.len());

    // Exit with error code if there are errors
    std::process::exit(1);
}
