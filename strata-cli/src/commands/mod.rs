//! Command implementations for the StrataML CLI
//!
//! Each command module provides a `run` function that executes the command logic.

pub mod doctor;
pub mod index;
pub mod lineage;
pub mod list;
pub mod status;

use std::path::{Path, PathBuf};

/// Resolve a workspace path argument, keeping it as given if it can't be
/// canonicalized (the core reports unreadable roots itself).
pub fn workspace_root(path: &str) -> PathBuf {
    Path::new(path)
        .canonicalize()
        .unwrap_or_else(|_| PathBuf::from(path))
}
