//! High-level pipeline: fetch → discover → generate for every template.
//!
//! # Responsibilities
//! - Fetch every configured repository (by default just `typst/templates`)
//! - Discover template folders once, under the whole `repos/` tree
//! - Generate one package per folder, in discovery order, writing the folder
//!   to the output stream before each generation
//!
//! # Error Handling
//! Fail-fast by default: the first failing fetch, discovery or package aborts
//! the run. With `keep_going`, package failures are collected in the report
//! and the remaining folders are still processed. Fetch and discovery
//! failures always abort.

use std::io::{self, Write};

use thiserror::Error;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::contract::Toolchain;
use crate::discover::{discover, DiscoveryError, TemplateFolder};
use crate::fetch::{fetch, FetchError};
use crate::generate::{generate, GenerateError, GenerateOptions, TemplatePackage};
use crate::layout::Layout;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error("template {folder}: {source}")]
    Generate {
        folder: TemplateFolder,
        #[source]
        source: GenerateError,
    },

    #[error("failed to write progress output: {0}")]
    Output(#[from] io::Error),
}

/// A package that could not be built under `keep_going`.
#[derive(Debug)]
pub struct FailedTemplate {
    pub folder: TemplateFolder,
    pub error: GenerateError,
}

#[derive(Debug, Default)]
pub struct PipelineReport {
    pub generated: Vec<TemplatePackage>,
    pub failed: Vec<FailedTemplate>,
}

impl PipelineReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

impl From<&Config> for GenerateOptions {
    fn from(config: &Config) -> Self {
        Self {
            entry_point: config.entry_point.clone(),
            preview_page: config.preview_page,
            preview_dpi: config.preview_dpi,
        }
    }
}

/// Prints each folder to `out` and builds its package, honouring `keep_going`.
pub async fn generate_all<T, W>(
    folders: &[TemplateFolder],
    layout: &Layout,
    options: &GenerateOptions,
    keep_going: bool,
    toolchain: &T,
    out: &mut W,
) -> Result<PipelineReport, PipelineError>
where
    T: Toolchain + ?Sized,
    W: Write,
{
    let mut report = PipelineReport::default();

    for folder in folders {
        writeln!(out, "{folder}")?;
        out.flush()?;

        match generate(folder, layout, options, toolchain).await {
            Ok(package) => report.generated.push(package),
            Err(e) if keep_going => {
                warn!(folder = %folder, error = %e, "Package failed, continuing with next template");
                report.failed.push(FailedTemplate {
                    folder: folder.clone(),
                    error: e,
                });
            }
            Err(e) => {
                error!(folder = %folder, error = %e, "Package failed, aborting run");
                return Err(PipelineError::Generate {
                    folder: folder.clone(),
                    source: e,
                });
            }
        }
    }

    Ok(report)
}

pub async fn run_pipeline<T, W>(
    config: &Config,
    toolchain: &T,
    out: &mut W,
) -> Result<PipelineReport, PipelineError>
where
    T: Toolchain + ?Sized,
    W: Write,
{
    let layout = Layout::new(&config.templates_root);
    info!(root = %layout.root().display(), "Starting template generation pipeline");

    for repository in &config.repositories {
        fetch(repository, &config.host, &layout, toolchain).await?;
    }

    let folders = discover(&layout.repos_dir(), &config.entry_point)?;
    let options = GenerateOptions::from(config);
    let report = generate_all(&folders, &layout, &options, config.keep_going, toolchain, out).await?;

    info!(
        generated = report.generated.len(),
        failed = report.failed.len(),
        "Template generation pipeline finished"
    );
    Ok(report)
}
