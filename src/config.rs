use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

/// Settings for a full template generation run.
///
/// Every field has a default, so an empty YAML document (or no file at all)
/// yields the fixed pipeline: clone `typst/templates` from GitHub and build
/// packages under `Templates/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub templates_root: PathBuf,
    pub host: String,
    pub repositories: Vec<RepositoryRef>,
    pub entry_point: String,
    pub preview_dpi: u32,
    pub preview_page: u32,
    pub keep_going: bool,
    pub tools: ToolsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            templates_root: PathBuf::from("Templates"),
            host: "github.com".to_string(),
            repositories: vec![RepositoryRef::new("typst", "templates")],
            entry_point: "main.typ".to_string(),
            preview_dpi: 300,
            preview_page: 0,
            keep_going: false,
            tools: ToolsConfig::default(),
        }
    }
}

impl Config {
    pub fn trace_loaded(&self) {
        info!(
            templates_root = %self.templates_root.display(),
            repositories = self.repositories.len(),
            entry_point = %self.entry_point,
            keep_going = self.keep_going,
            "Loaded Config"
        );
        debug!(?self, "Config loaded (full debug)");
    }
}

/// A remote template repository, identified by author and name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryRef {
    pub author: String,
    pub repo: String,
    /// Branch, tag or commit to check out after cloning.
    #[serde(default)]
    pub reference: Option<String>,
}

impl RepositoryRef {
    pub fn new(author: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            author: author.into(),
            repo: repo.into(),
            reference: None,
        }
    }

    /// `https://<host>/<author>/<repo>.git`
    pub fn clone_url(&self, host: &str) -> String {
        format!("https://{}/{}/{}.git", host, self.author, self.repo)
    }
}

impl fmt::Display for RepositoryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.author, self.repo)?;
        if let Some(reference) = &self.reference {
            write!(f, "@{reference}")?;
        }
        Ok(())
    }
}

/// Executable names and limits for the external tools.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub git: String,
    pub cp: String,
    pub typst: String,
    pub convert: String,
    /// Kill any single tool invocation running longer than this.
    pub timeout_secs: Option<u64>,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            git: "git".to_string(),
            cp: "cp".to_string(),
            typst: "typst".to_string(),
            convert: "convert".to_string(),
            timeout_secs: None,
        }
    }
}

impl ToolsConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}
