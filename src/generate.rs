//! Builds one `<name>.sr` template package from a discovered template folder.
//!
//! Steps run strictly in order and each one must succeed before the next starts:
//!   1. derive the package name from the folder's last path segment; the
//!      reference package name `Empty` is refused
//!   2. delete any previous package of that name
//!   3. create the package directory
//!   4. copy the template source into `Typst/`
//!   5. copy the reference `Serifian.plist`
//!   6. compile the entry document to `preview.pdf`
//!   7. render the first page of `preview.pdf` to `preview.jpg`
//!
//! A failed step stops the build; earlier steps are not rolled back, so a
//! partially built package may remain on disk until the next run replaces it.

use std::fs;
use std::io;
use std::path::PathBuf;

use thiserror::Error;
use tracing::{error, info};

use crate::contract::{ToolError, Toolchain};
use crate::discover::TemplateFolder;
use crate::fetch::remove_path_if_exists;
use crate::layout::{Layout, REFERENCE_PACKAGE};

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("template folder {0} has no name segment")]
    UnnamedFolder(PathBuf),

    #[error("template folder {0} is named like the reference package and would replace it")]
    ReservedName(PathBuf),

    #[error("failed to prepare package directory {path}: {source}")]
    Prepare {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to copy template source into {path}: {source}")]
    CopySource {
        path: PathBuf,
        #[source]
        source: ToolError,
    },

    #[error("failed to copy metadata {from} to {to}: {source}")]
    CopyMetadata {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to compile {path}: {source}")]
    Compile {
        path: PathBuf,
        #[source]
        source: ToolError,
    },

    #[error("failed to render preview of {path}: {source}")]
    Rasterize {
        path: PathBuf,
        #[source]
        source: ToolError,
    },
}

/// Fixed parameters shared by every package of a run.
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    pub entry_point: String,
    pub preview_page: u32,
    pub preview_dpi: u32,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            entry_point: "main.typ".to_string(),
            preview_page: 0,
            preview_dpi: 300,
        }
    }
}

/// A fully built package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplatePackage {
    pub name: String,
    pub dir: PathBuf,
    pub document: PathBuf,
    pub preview: PathBuf,
}

pub async fn generate<T>(
    folder: &TemplateFolder,
    layout: &Layout,
    options: &GenerateOptions,
    toolchain: &T,
) -> Result<TemplatePackage, GenerateError>
where
    T: Toolchain + ?Sized,
{
    let dir_name = folder
        .name()
        .ok_or_else(|| GenerateError::UnnamedFolder(folder.path().to_path_buf()))?;
    if dir_name == REFERENCE_PACKAGE {
        error!(folder = %folder, "Template name collides with the reference package");
        return Err(GenerateError::ReservedName(folder.path().to_path_buf()));
    }
    let name = dir_name.to_string_lossy().into_owned();
    let package = layout.package(dir_name, &options.entry_point);
    info!(template = %name, package = %package.dir.display(), "Generating template package");

    let prepare = |e: io::Error| {
        error!(error = ?e, path = %package.dir.display(), "Failed to prepare package directory");
        GenerateError::Prepare {
            path: package.dir.clone(),
            source: e,
        }
    };
    remove_path_if_exists(&package.dir).map_err(prepare)?;
    fs::create_dir_all(&package.dir).map_err(prepare)?;

    toolchain
        .copy_tree(folder.path(), &package.typst_dir)
        .await
        .map_err(|e| {
            error!(error = %e, source_folder = %folder, "Failed to copy template source");
            GenerateError::CopySource {
                path: package.typst_dir.clone(),
                source: e,
            }
        })?;

    let reference = layout.reference_metadata();
    fs::copy(&reference, &package.metadata).map_err(|e| {
        error!(error = ?e, from = %reference.display(), "Failed to copy reference metadata");
        GenerateError::CopyMetadata {
            from: reference.clone(),
            to: package.metadata.clone(),
            source: e,
        }
    })?;

    toolchain
        .compile_document(&package.entry_document, &package.document)
        .await
        .map_err(|e| {
            error!(error = %e, path = %package.entry_document.display(), "Compilation failed, skipping preview");
            GenerateError::Compile {
                path: package.entry_document.clone(),
                source: e,
            }
        })?;

    toolchain
        .rasterize_page(
            &package.document,
            options.preview_page,
            options.preview_dpi,
            &package.preview,
        )
        .await
        .map_err(|e| {
            error!(error = %e, path = %package.document.display(), "Preview rendering failed");
            GenerateError::Rasterize {
                path: package.document.clone(),
                source: e,
            }
        })?;

    info!(template = %name, preview = %package.preview.display(), "Template package generated");
    Ok(TemplatePackage {
        name,
        dir: package.dir,
        document: package.document,
        preview: package.preview,
    })
}
