use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, error, info};

use crate::config::RepositoryRef;
use crate::contract::{ToolError, Toolchain};
use crate::layout::Layout;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid repository reference `{0}`: author and name must be non-empty single path segments")]
    InvalidRepository(String),

    #[error("failed to remove previous clone at {path}: {source}")]
    Clean {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to clone {repository}: {source}")]
    Clone {
        repository: String,
        #[source]
        source: ToolError,
    },

    #[error("failed to check out `{reference}` in {repository}: {source}")]
    Checkout {
        repository: String,
        reference: String,
        #[source]
        source: ToolError,
    },
}

fn is_segment(value: &str) -> bool {
    !value.is_empty()
        && value != "."
        && value != ".."
        && !value.contains('/')
        && !value.contains(std::path::MAIN_SEPARATOR)
}

/// Removes whatever is at `path`, like `rm -rf`: a directory tree, a file or a
/// symlink. A path that does not exist is not an error.
pub fn remove_path_if_exists(path: &Path) -> io::Result<()> {
    let metadata = match fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e),
    };
    if metadata.is_dir() {
        fs::remove_dir_all(path)?;
        debug!(path = %path.display(), "Removed existing directory");
    } else {
        fs::remove_file(path)?;
        debug!(path = %path.display(), "Removed existing file");
    }
    Ok(())
}

/// Replaces any local copy of `repository` with a fresh clone and returns the clone directory.
pub async fn fetch<T>(
    repository: &RepositoryRef,
    host: &str,
    layout: &Layout,
    toolchain: &T,
) -> Result<PathBuf, FetchError>
where
    T: Toolchain + ?Sized,
{
    if !is_segment(&repository.author) || !is_segment(&repository.repo) {
        error!(repository = %repository, "Rejected repository reference");
        return Err(FetchError::InvalidRepository(repository.to_string()));
    }

    let url = repository.clone_url(host);
    let destination = layout.clone_dir(repository);

    remove_path_if_exists(&destination).map_err(|e| {
        error!(error = ?e, path = %destination.display(), "Failed to remove existing clone");
        FetchError::Clean {
            path: destination.clone(),
            source: e,
        }
    })?;

    info!(url = %url, path = %destination.display(), "Cloning template repository");
    toolchain
        .clone_repository(&url, &destination)
        .await
        .map_err(|e| {
            error!(error = %e, url = %url, "Clone failed");
            FetchError::Clone {
                repository: repository.to_string(),
                source: e,
            }
        })?;

    if let Some(reference) = &repository.reference {
        toolchain
            .checkout(&destination, reference)
            .await
            .map_err(|e| {
                error!(error = %e, reference = %reference, "Checkout failed");
                FetchError::Checkout {
                    repository: repository.to_string(),
                    reference: reference.clone(),
                    source: e,
                }
            })?;
        info!(reference = %reference, path = %destination.display(), "Checked out git reference");
    }

    info!(repository = %repository, path = %destination.display(), "Repository fetched");
    Ok(destination)
}
