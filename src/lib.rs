#![doc = "serifian-templates: builds Serifian template packages from Typst template repositories."]

//! Fetches a repository of Typst templates, finds every folder holding an
//! entry document and turns each into a `<name>.sr` package with a rendered
//! preview. External programs are reached only through [`contract::Toolchain`].

pub mod cli;
pub mod config;
pub mod contract;
pub mod discover;
#[cfg(any(test, feature = "test-export-mocks"))]
pub mod fake;
pub mod fetch;
pub mod generate;
pub mod layout;
pub mod load_config;
pub mod pipeline;
pub mod toolchain;

pub use cli::{run, Cli, Commands};
