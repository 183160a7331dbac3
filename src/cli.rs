///
/// This module implements the CLI interface for serifian-templates: argument
/// parsing, subcommand routing and the `run` entry point used by `main` and by
/// integration tests.
///
/// With no arguments the full fixed pipeline runs: clone `typst/templates`,
/// discover every folder holding a `main.typ`, and build a `<name>.sr`
/// package for each one under `Templates/`.
use crate::config::Config;
use crate::discover::discover;
use crate::load_config::resolve_config;
use crate::pipeline::run_pipeline;
use crate::toolchain::SystemToolchain;
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;

/// CLI for serifian-templates: build Serifian template packages from Typst templates.
#[derive(Parser, Debug)]
#[clap(
    name = "serifian-templates",
    version,
    about = "Clone Typst templates and package each one as a Serifian .sr template with a rendered preview"
)]
pub struct Cli {
    /// Path to an optional YAML config file
    #[clap(long, global = true)]
    pub config: Option<PathBuf>,

    /// Keep generating the remaining templates after one fails
    #[clap(long, global = true)]
    pub keep_going: bool,

    #[clap(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch, discover and generate every template package (the default)
    Generate,
    /// List template folders under an existing tree without fetching anything
    Discover {
        /// Directory to scan; defaults to the configured repos directory
        #[clap(long)]
        root: Option<PathBuf>,
    },
}

fn load(cli: &Cli) -> Result<Config> {
    let mut config = resolve_config(cli.config.as_deref())?;
    if cli.keep_going {
        config.keep_going = true;
    }
    Ok(config)
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    let config = load(&cli)?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match cli.command.unwrap_or(Commands::Generate) {
        Commands::Generate => {
            tracing::info!(command = "generate", "Starting template generation");
            let toolchain = SystemToolchain::new(config.tools.clone());
            let report = run_pipeline(&config, &toolchain, &mut out).await.map_err(|e| {
                tracing::error!(command = "generate", error = %e, "Template generation failed");
                anyhow::Error::new(e)
            })?;

            for failure in &report.failed {
                tracing::error!(folder = %failure.folder, error = %failure.error, "Template was not generated");
            }
            if !report.is_success() {
                anyhow::bail!(
                    "{} of {} templates failed",
                    report.failed.len(),
                    report.failed.len() + report.generated.len()
                );
            }
            tracing::info!(command = "generate", generated = report.generated.len(), "Template generation complete");
            Ok(())
        }
        Commands::Discover { root } => {
            let root = root.unwrap_or_else(|| crate::layout::Layout::new(&config.templates_root).repos_dir());
            tracing::info!(command = "discover", root = %root.display(), "Listing template folders");
            for folder in discover(&root, &config.entry_point)? {
                writeln!(out, "{folder}")?;
            }
            Ok(())
        }
    }
}
