//! StrataML core - workspace indexing, lineage and compliance engine.
//!
//! A StrataML workspace keeps its ML artifacts in three category
//! directories under a single root:
//!
//! - `datasets/<name>/<version>/` with `metadata.yaml` and split dirs
//! - `runs/run-<date>-<ordinal>/` with config, metrics, system info and log
//! - `models/<name>/<version>/` with metadata, metrics, card and weights
//!
//! This crate turns that layout into a [`WorkspaceIndex`] (with a derived
//! lineage map), navigates lineage through a [`LineageGraph`], and checks the
//! workspace against a fixed set of compliance rules.
//!
//! # Usage
//!
//! ```no_run
//! use strata_core::{ComplianceEngine, WorkspaceIndexer};
//!
//! # fn main() -> strata_core::Result<()> {
//! let index = WorkspaceIndexer::new("/path/to/workspace").index_all()?;
//! println!("{}", index.to_json()?);
//!
//! let report = ComplianceEngine::new("/path/to/workspace").run(Some("runs"))?;
//! assert_eq!(report.validation_results.len(), 1);
//! # Ok(())
//! # }
//! ```

pub mod compliance;
pub mod error;
pub mod index;
pub mod layout;
pub mod lineage;
pub mod loader;
pub mod scanner;
pub mod types;

pub use compliance::{ComplianceEngine, Outcome, RuleId, ValidationReport};
pub use error::{Error, Result};
pub use index::{IndexScope, WorkspaceIndexer};
pub use lineage::{EdgeKind, LineageGraph};
pub use scanner::ArtifactScanner;
pub use types::{LineageRecord, WorkspaceIndex};
