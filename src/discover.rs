//! Finds template folders: directories that directly contain the entry-point document.

use std::ffi::OsStr;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf, MAIN_SEPARATOR};

use thiserror::Error;
use tracing::{debug, error, info};

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("failed to read directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A directory known to directly contain an entry-point document.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TemplateFolder {
    path: PathBuf,
}

impl TemplateFolder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Last path segment of the folder, used as the package name.
    pub fn name(&self) -> Option<&OsStr> {
        self.path.file_name()
    }
}

/// Renders the folder with exactly one trailing separator, e.g. `Templates/repos/a/`.
impl fmt::Display for TemplateFolder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shown = self.path.display().to_string();
        let trimmed = shown.trim_end_matches(['/', MAIN_SEPARATOR]);
        write!(f, "{trimmed}{MAIN_SEPARATOR}")
    }
}

/// Recursively lists the folders under `root` containing a file named `entry_point`.
///
/// Results are depth-first pre-order. Each listing is sorted by name, so the
/// order is stable across platforms. Symlinked directories are not descended
/// into. Any unreadable directory fails the whole walk.
pub fn discover(root: &Path, entry_point: &str) -> Result<Vec<TemplateFolder>, DiscoveryError> {
    let mut folders = Vec::new();
    visit_dir(root, entry_point, &mut folders)?;
    info!(root = %root.display(), count = folders.len(), "Template discovery finished");
    Ok(folders)
}

fn read_sorted(dir: &Path) -> io::Result<Vec<fs::DirEntry>> {
    let mut entries = fs::read_dir(dir)?.collect::<io::Result<Vec<_>>>()?;
    entries.sort_by_key(|entry| entry.file_name());
    Ok(entries)
}

fn visit_dir(
    dir: &Path,
    entry_point: &str,
    results: &mut Vec<TemplateFolder>,
) -> Result<(), DiscoveryError> {
    let entries = read_sorted(dir).map_err(|e| {
        error!(error = ?e, path = %dir.display(), "Failed to read directory during discovery");
        DiscoveryError::ReadDir {
            path: dir.to_path_buf(),
            source: e,
        }
    })?;

    for entry in entries {
        let path = entry.path();
        // Symlinked directories are not followed: a clone may link outside the tree or back to a parent.
        let file_type = entry.file_type().map_err(|e| {
            error!(error = ?e, path = %path.display(), "Failed to read entry type during discovery");
            DiscoveryError::ReadDir {
                path: path.clone(),
                source: e,
            }
        })?;
        if file_type.is_dir() {
            visit_dir(&path, entry_point, results)?;
        } else if entry.file_name() == entry_point {
            debug!(path = %dir.display(), "Found template folder");
            results.push(TemplateFolder::new(dir));
        }
    }
    Ok(())
}
