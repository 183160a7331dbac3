//! Where things live under the templates root.
//!
//! ```text
//! <root>/repos/<author>/<repo>/...     cloned sources
//! <root>/Empty.sr/Serifian.plist       reference metadata
//! <root>/<name>.sr/Typst/...           copied template source
//! <root>/<name>.sr/Serifian.plist
//! <root>/<name>.sr/preview.pdf
//! <root>/<name>.sr/preview.jpg
//! ```

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

use crate::config::RepositoryRef;

pub const REPOS_DIR: &str = "repos";
pub const PACKAGE_EXTENSION: &str = "sr";
pub const REFERENCE_PACKAGE: &str = "Empty";
pub const TYPST_DIR: &str = "Typst";
pub const METADATA_FILE: &str = "Serifian.plist";
pub const PREVIEW_DOCUMENT: &str = "preview.pdf";
pub const PREVIEW_IMAGE: &str = "preview.jpg";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    root: PathBuf,
}

impl Layout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn repos_dir(&self) -> PathBuf {
        self.root.join(REPOS_DIR)
    }

    pub fn clone_dir(&self, repository: &RepositoryRef) -> PathBuf {
        self.repos_dir()
            .join(&repository.author)
            .join(&repository.repo)
    }

    /// The metadata file every generated package receives a copy of.
    pub fn reference_metadata(&self) -> PathBuf {
        self.package_dir(REFERENCE_PACKAGE).join(METADATA_FILE)
    }

    /// `<root>/<name>.sr`; `name` need not be UTF-8.
    pub fn package_dir(&self, name: impl AsRef<OsStr>) -> PathBuf {
        let mut dir_name = OsString::from(name.as_ref());
        dir_name.push(".");
        dir_name.push(PACKAGE_EXTENSION);
        self.root.join(dir_name)
    }

    pub fn package(&self, name: impl AsRef<OsStr>, entry_point: &str) -> PackagePaths {
        PackagePaths::new(self.package_dir(name), entry_point)
    }
}

/// Paths inside a single `<name>.sr` package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackagePaths {
    pub dir: PathBuf,
    pub typst_dir: PathBuf,
    pub metadata: PathBuf,
    pub entry_document: PathBuf,
    pub document: PathBuf,
    pub preview: PathBuf,
}

impl PackagePaths {
    fn new(dir: PathBuf, entry_point: &str) -> Self {
        let typst_dir = dir.join(TYPST_DIR);
        Self {
            metadata: dir.join(METADATA_FILE),
            entry_document: typst_dir.join(entry_point),
            document: dir.join(PREVIEW_DOCUMENT),
            preview: dir.join(PREVIEW_IMAGE),
            typst_dir,
            dir,
        }
    }
}
