//! # contract: the external tools a package run depends on
//!
//! Generating a template package needs four outside programs: a git client,
//! a recursive copier, the Typst compiler and an image converter. This module
//! names them as a single capability set, the [`Toolchain`] trait, so that
//! fetching and generation can run against the real executables
//! ([`crate::toolchain::SystemToolchain`]) or against an in-process fake
//! ([`crate::fake::FakeToolchain`]) in tests.
//!
//! ## Mocking & Testing
//! - The trait is annotated for `mockall`; `MockToolchain` is generated under
//!   `cfg(test)` and with the `test-export-mocks` feature.
//!
//! ## Errors
//! - Every capability returns a [`ToolError`]. A non-zero exit status is an
//!   error, never a silently ignored outcome.

use std::path::Path;
use std::process::ExitStatus;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;

/// Failure of a single external tool invocation.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("failed to launch `{tool}`: {source}")]
    Launch {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{tool}` exited with {status}: {stderr}")]
    Failed {
        tool: String,
        status: String,
        stderr: String,
    },

    #[error("`{tool}` did not finish within {after:?}")]
    TimedOut { tool: String, after: Duration },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ToolError {
    /// Builds a [`ToolError::Failed`] from a finished process.
    pub fn failed(tool: impl Into<String>, status: ExitStatus, stderr: &[u8]) -> Self {
        ToolError::Failed {
            tool: tool.into(),
            status: status.to_string(),
            stderr: String::from_utf8_lossy(stderr).trim().to_string(),
        }
    }
}

/// The set of external capabilities used to fetch templates and render packages.
///
/// Implementations must not return `Ok` unless the tool actually succeeded.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Toolchain: Send + Sync {
    /// Clone the repository at `url` into `destination`.
    async fn clone_repository(&self, url: &str, destination: &Path) -> Result<(), ToolError>;

    /// Check out `reference` (branch, tag or commit) inside an existing clone.
    async fn checkout(&self, repository: &Path, reference: &str) -> Result<(), ToolError>;

    /// Recursively copy `source` to `destination`, which must not exist yet.
    async fn copy_tree(&self, source: &Path, destination: &Path) -> Result<(), ToolError>;

    /// Compile the Typst document at `source` into a PDF at `output`.
    async fn compile_document(&self, source: &Path, output: &Path) -> Result<(), ToolError>;

    /// Render page `page` (zero based) of `document` at `dpi` into the image `output`.
    async fn rasterize_page(
        &self,
        document: &Path,
        page: u32,
        dpi: u32,
        output: &Path,
    ) -> Result<(), ToolError>;
}
