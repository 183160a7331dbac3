//! Production [`Toolchain`]: shells out to the real executables named in [`ToolsConfig`].

use std::ffi::OsString;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, error, info};

use crate::config::ToolsConfig;
use crate::contract::{ToolError, Toolchain};

pub struct SystemToolchain {
    tools: ToolsConfig,
}

impl SystemToolchain {
    pub fn new(tools: ToolsConfig) -> Self {
        Self { tools }
    }

    async fn run(&self, tool: &str, command: Command) -> Result<(), ToolError> {
        run_tool(tool, command, self.tools.timeout()).await
    }
}

/// Runs `command` to completion and maps its outcome onto [`ToolError`].
///
/// The child is killed if `timeout` elapses first.
pub async fn run_tool(
    tool: &str,
    mut command: Command,
    timeout: Option<Duration>,
) -> Result<(), ToolError> {
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    debug!(tool, command = ?command, "Launching external tool");

    let pending = command.output();
    let output = match timeout {
        Some(after) => match tokio::time::timeout(after, pending).await {
            Ok(output) => output,
            Err(_) => {
                error!(tool, timeout = ?after, "External tool timed out, killed");
                return Err(ToolError::TimedOut {
                    tool: tool.to_string(),
                    after,
                });
            }
        },
        None => pending.await,
    };

    match output {
        Ok(out) if out.status.success() => {
            info!(tool, status = ?out.status, "External tool finished");
            Ok(())
        }
        Ok(out) => {
            let err = ToolError::failed(tool, out.status, &out.stderr);
            error!(tool, status = ?out.status, error = %err, "External tool exited with non-zero code");
            Err(err)
        }
        Err(e) => {
            error!(tool, error = ?e, "Failed to launch external tool");
            Err(ToolError::Launch {
                tool: tool.to_string(),
                source: e,
            })
        }
    }
}

#[async_trait]
impl Toolchain for SystemToolchain {
    async fn clone_repository(&self, url: &str, destination: &Path) -> Result<(), ToolError> {
        let mut command = Command::new(&self.tools.git);
        command.arg("clone").arg(url).arg(destination);
        self.run(&self.tools.git, command).await
    }

    async fn checkout(&self, repository: &Path, reference: &str) -> Result<(), ToolError> {
        let mut command = Command::new(&self.tools.git);
        command.arg("-C").arg(repository).arg("checkout").arg(reference);
        self.run(&self.tools.git, command).await
    }

    async fn copy_tree(&self, source: &Path, destination: &Path) -> Result<(), ToolError> {
        let mut command = Command::new(&self.tools.cp);
        command.arg("-r").arg(source).arg(destination);
        self.run(&self.tools.cp, command).await
    }

    async fn compile_document(&self, source: &Path, output: &Path) -> Result<(), ToolError> {
        let mut command = Command::new(&self.tools.typst);
        command.arg("compile").arg(source).arg(output);
        self.run(&self.tools.typst, command).await
    }

    async fn rasterize_page(
        &self,
        document: &Path,
        page: u32,
        dpi: u32,
        output: &Path,
    ) -> Result<(), ToolError> {
        // ImageMagick selects a page with a `[n]` suffix on the input path.
        let mut input = OsString::from(document.as_os_str());
        input.push(format!("[{page}]"));

        let mut command = Command::new(&self.tools.convert);
        command
            .arg("-density")
            .arg(dpi.to_string())
            .arg(input)
            .arg(output);
        self.run(&self.tools.convert, command).await
    }
}
