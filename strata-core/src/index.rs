//! Workspace index assembly.
//!
//! [`WorkspaceIndexer`] drives the [`ArtifactScanner`] over each category,
//! folds the raw records into the index maps, then hands the finished
//! snapshot to the lineage resolver. Every call rebuilds from disk; nothing
//! is cached between calls.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::Utc;

use crate::error::Result;
use crate::lineage;
use crate::scanner::{ensure_readable_root, ArtifactScanner};
use crate::types::{DatasetMap, IndexMetadata, ModelMap, RunMap, WorkspaceIndex};

/// Which categories to index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IndexScope {
    /// All categories plus lineage.
    #[default]
    All,
    Datasets,
    Runs,
    Models,
}

/// Builds a [`WorkspaceIndex`] from a workspace root.
#[derive(Debug, Clone)]
pub struct WorkspaceIndexer {
    root: PathBuf,
}

impl WorkspaceIndexer {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Index every category and resolve lineage.
    pub fn index_all(&self) -> Result<WorkspaceIndex> {
        self.index(IndexScope::All)
    }

    /// Index the categories selected by `scope`.
    ///
    /// Lineage is only resolved for [`IndexScope::All`]; a partial index
    /// carries an empty lineage map. Fails only when the workspace root
    /// itself cannot be read.
    pub fn index(&self, scope: IndexScope) -> Result<WorkspaceIndex> {
        ensure_readable_root(&self.root)?;

        let start = Instant::now();
        let scanner = ArtifactScanner::new(&self.root);
        let mut index = WorkspaceIndex {
            metadata: IndexMetadata {
                indexed_at: Utc::now().to_rfc3339(),
                project_root: self.root.to_string_lossy().to_string(),
            },
            ..WorkspaceIndex::default()
        };

        if matches!(scope, IndexScope::All | IndexScope::Datasets) {
            index.datasets = index_datasets(&scanner);
        }
        if matches!(scope, IndexScope::All | IndexScope::Runs) {
            index.runs = index_runs(&scanner);
        }
        if matches!(scope, IndexScope::All | IndexScope::Models) {
            index.models = index_models(&scanner);
        }
        if scope == IndexScope::All {
            index.lineage = lineage::resolve(&index);
        }

        let stats = index.summary();
        tracing::info!(
            "Indexed {} dataset versions, {} runs, {} model versions in {}ms",
            stats.dataset_versions,
            stats.runs,
            stats.model_versions,
            start.elapsed().as_millis()
        );
        Ok(index)
    }
}

pub fn index_datasets(scanner: &ArtifactScanner) -> DatasetMap {
    scanner
        .scan_datasets()
        .into_iter()
        .map(|dataset| (dataset.name, dataset.versions.into_iter().collect::<BTreeMap<_, _>>()))
        .collect()
}

pub fn index_runs(scanner: &ArtifactScanner) -> RunMap {
    scanner
        .scan_runs()
        .into_iter()
        .map(|run| (run.id, run.record))
        .collect()
}

pub fn index_models(scanner: &ArtifactScanner) -> ModelMap {
    scanner
        .scan_models()
        .into_iter()
        .map(|model| (model.name, model.versions.into_iter().collect::<BTreeMap<_, _>>()))
        .collect()
}
