mod commands;
mod config;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{
    apply, inspect, migrate, popups, preview, validate, ApplyArgs, Context, InspectArgs,
    MigrateArgs, PopupsArgs, PreviewArgs, ValidateArgs,
};

/// Funnel builder CLI - inspect, migrate and preview funnel documents
#[derive(Parser, Debug)]
#[command(name = "funnel")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log filter used when RUST_LOG is unset (e.g. "debug", "funnel_popups=debug")
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the page and popup outline of a document
    Inspect(InspectArgs),

    /// Check a document's structural integrity
    Validate(ValidateArgs),

    /// Upgrade a document to the current format
    Migrate(MigrateArgs),

    /// Apply a batch of mutations to a document
    Apply(ApplyArgs),

    /// Show which popups may auto-open on a path
    Popups(PopupsArgs),

    /// Run popup triggers for a page in real time
    Preview(PreviewArgs),
}

fn main() {
    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = std::env::current_dir()
        .map_err(anyhow::Error::from)
        .and_then(Context::load)
        .and_then(|ctx| match cli.command {
            Command::Inspect(args) => inspect(args, &ctx),
            Command::Validate(args) => validate(args, &ctx),
            Command::Migrate(args) => migrate(args, &ctx),
            Command::Apply(args) => apply(args, &ctx),
            Command::Popups(args) => popups(args, &ctx),
            Command::Preview(args) => preview(args, &ctx),
        });

    if let Err(err) = result {
        eprintln!();
        eprintln!("{} {:#}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
