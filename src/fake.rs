//! In-process [`Toolchain`] for tests: no git, cp, typst or convert required.
//!
//! Every call is recorded so tests can assert which steps ran and in what order.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::contract::{ToolError, Toolchain};

/// A source containing this marker fails to "compile".
pub const FAIL_COMPILE_MARKER: &str = "// fail-compile";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolCall {
    Clone { url: String, destination: PathBuf },
    Checkout { repository: PathBuf, reference: String },
    CopyTree { source: PathBuf, destination: PathBuf },
    Compile { source: PathBuf, output: PathBuf },
    Rasterize { document: PathBuf, page: u32, dpi: u32, output: PathBuf },
}

#[derive(Default)]
pub struct FakeToolchain {
    clone_fixture: Option<PathBuf>,
    fail_clone: bool,
    calls: Mutex<Vec<ToolCall>>,
}

impl FakeToolchain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cloning copies `fixture` into the clone destination.
    pub fn with_clone_fixture(mut self, fixture: impl Into<PathBuf>) -> Self {
        self.clone_fixture = Some(fixture.into());
        self
    }

    pub fn failing_clone(mut self) -> Self {
        self.fail_clone = true;
        self
    }

    pub fn calls(&self) -> Vec<ToolCall> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    fn record(&self, call: ToolCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }
}

fn failure(tool: &str, stderr: impl Into<String>) -> ToolError {
    ToolError::Failed {
        tool: tool.to_string(),
        status: "exit status: 1".to_string(),
        stderr: stderr.into(),
    }
}

/// Copies `source` to `destination` the way `cp -r` does for a destination that does not exist.
pub fn copy_dir_recursive(source: &Path, destination: &Path) -> std::io::Result<()> {
    fs::create_dir_all(destination)?;
    for entry in fs::read_dir(source)? {
        let entry = entry?;
        let target = destination.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir_recursive(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

#[async_trait]
impl Toolchain for FakeToolchain {
    async fn clone_repository(&self, url: &str, destination: &Path) -> Result<(), ToolError> {
        self.record(ToolCall::Clone {
            url: url.to_string(),
            destination: destination.to_path_buf(),
        });
        if self.fail_clone {
            return Err(failure("git", format!("fatal: repository '{url}' not found")));
        }
        match &self.clone_fixture {
            Some(fixture) => copy_dir_recursive(fixture, destination)?,
            None => fs::create_dir_all(destination)?,
        }
        Ok(())
    }

    async fn checkout(&self, repository: &Path, reference: &str) -> Result<(), ToolError> {
        self.record(ToolCall::Checkout {
            repository: repository.to_path_buf(),
            reference: reference.to_string(),
        });
        Ok(())
    }

    async fn copy_tree(&self, source: &Path, destination: &Path) -> Result<(), ToolError> {
        self.record(ToolCall::CopyTree {
            source: source.to_path_buf(),
            destination: destination.to_path_buf(),
        });
        copy_dir_recursive(source, destination)?;
        Ok(())
    }

    async fn compile_document(&self, source: &Path, output: &Path) -> Result<(), ToolError> {
        self.record(ToolCall::Compile {
            source: source.to_path_buf(),
            output: output.to_path_buf(),
        });
        let text = fs::read_to_string(source)?;
        if text.contains(FAIL_COMPILE_MARKER) {
            return Err(failure("typst", format!("error: failed to compile {}", source.display())));
        }
        fs::write(output, format!("%PDF-fake\n{text}"))?;
        Ok(())
    }

    async fn rasterize_page(
        &self,
        document: &Path,
        page: u32,
        dpi: u32,
        output: &Path,
    ) -> Result<(), ToolError> {
        self.record(ToolCall::Rasterize {
            document: document.to_path_buf(),
            page,
            dpi,
            output: output.to_path_buf(),
        });
        if !document.exists() {
            return Err(failure(
                "convert",
                format!("unable to open image '{}'", document.display()),
            ));
        }
        fs::write(output, format!("JPEG page={page} dpi={dpi}"))?;
        Ok(())
    }
}
