//! Data model shared by the indexer, lineage resolver and CLI.
//!
//! Every mapping is a `BTreeMap`, so serialized output is ordered by key
//! and never depends on the order the filesystem listed entries in.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::loader::{empty_document, Document};

/// One version of a dataset (`datasets/<name>/<version>/`).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetVersion {
    /// Parsed `metadata.yaml`, or `{}`.
    pub metadata: Document,

    /// Entry count per split directory; absent splits have no key.
    pub sample_counts: BTreeMap<String, u64>,

    /// Path relative to the workspace root.
    pub path: String,
}

/// One run directory (`runs/<run-id>/`).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub config: Document,

    /// Conventionally `{summary, history[]}`, but kept whatever its shape.
    pub metrics: Document,

    /// OS, runtime, frameworks and hardware of the executing machine.
    pub system: Document,

    /// Bounded prefix of `log.txt`.
    pub log_preview: String,

    pub path: String,
}

/// A recognized model artifact file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelFile {
    pub name: String,
    pub size: u64,
    pub path: String,
}

/// One version of a model (`models/<name>/<version>/`).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelVersion {
    pub metadata: Document,
    pub metrics: Document,

    /// Bounded prefix of `card.md`.
    pub card_preview: String,

    pub model_files: Vec<ModelFile>,
    pub path: String,
}

/// Dataset name -> version tag -> record.
pub type DatasetMap = BTreeMap<String, BTreeMap<String, DatasetVersion>>;

/// Run id -> record.
pub type RunMap = BTreeMap<String, RunRecord>;

/// Model name -> version tag -> record.
pub type ModelMap = BTreeMap<String, BTreeMap<String, ModelVersion>>;

/// Entity id -> lineage record.
pub type LineageMap = BTreeMap<String, LineageRecord>;

/// Declared relationships of one artifact.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LineageRecord {
    /// Keyed by run id.
    Run {
        dataset: String,
        model: String,
        experiment: String,
    },
    /// Keyed by `"{model}/{version}"`; only present when a run id is declared.
    Model { run_id: String, dataset: String },
    /// Keyed by `"{dataset}/{version}"`.
    Dataset {
        #[serde(default = "empty_document")]
        derived_from: Document,
        #[serde(default = "empty_document")]
        source: Document,
    },
}

impl LineageRecord {
    /// The record's `type` tag.
    pub fn kind(&self) -> &'static str {
        match self {
            LineageRecord::Run { .. } => "run",
            LineageRecord::Model { .. } => "model",
            LineageRecord::Dataset { .. } => "dataset",
        }
    }
}

/// When and where the index was built.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexMetadata {
    /// RFC 3339 timestamp.
    pub indexed_at: String,
    pub project_root: String,
}

/// Complete in-memory index of a workspace.
///
/// The three category maps are always present, empty when the category
/// directory is absent.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceIndex {
    pub datasets: DatasetMap,
    pub runs: RunMap,
    pub models: ModelMap,
    pub lineage: LineageMap,
    pub metadata: IndexMetadata,
}

impl WorkspaceIndex {
    /// Count artifacts per category.
    pub fn summary(&self) -> SummaryStats {
        SummaryStats {
            datasets: self.datasets.len(),
            dataset_versions: self.datasets.values().map(BTreeMap::len).sum(),
            runs: self.runs.len(),
            models: self.models.len(),
            model_versions: self.models.values().map(BTreeMap::len).sum(),
        }
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse an index previously produced by [`WorkspaceIndex::to_json`].
    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Artifact counts for status displays.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryStats {
    pub datasets: usize,
    pub dataset_versions: usize,
    pub runs: usize,
    pub models: usize,
    pub model_versions: usize,
}
