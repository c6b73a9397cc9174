//! Artifact discovery over the category directories.
//!
//! The scanner turns `datasets/`, `runs/` and `models/` into raw
//! per-artifact records. It is deliberately forgiving:
//!
//! - an absent category directory scans as empty
//! - unreadable entries are skipped with a `warn!`
//! - missing or malformed files become empty documents / previews
//!
//! Entries are visited in sorted name order so that anything derived from
//! scan order (log output, message order) is stable.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::error::{Error, Result};
use crate::layout::{self, SPLITS};
use crate::loader::{load_structured, read_preview, DocumentFormat};
use crate::types::{DatasetVersion, ModelFile, ModelVersion, RunRecord};

/// Fail fast when the workspace root cannot be listed.
///
/// This is the only scan failure that reaches the caller; everything below
/// the root is tolerant.
pub fn ensure_readable_root(root: &Path) -> Result<()> {
    fs::read_dir(root)
        .map(|_| ())
        .map_err(|source| Error::WorkspaceRoot {
            path: root.to_path_buf(),
            source,
        })
}

/// A directory entry seen while listing a category.
#[derive(Clone, Debug)]
pub struct Entry {
    pub name: String,
    pub path: PathBuf,
    pub is_dir: bool,
}

/// List a directory, sorted by name.
///
/// Returns an empty list when the directory is absent or unreadable.
pub fn list_entries(dir: &Path) -> Vec<Entry> {
    let read = match fs::read_dir(dir) {
        Ok(read) => read,
        Err(e) => {
            if dir.exists() {
                tracing::warn!("Failed to list {}: {}", dir.display(), e);
            }
            return Vec::new();
        }
    };

    let mut entries: Vec<Entry> = read
        .filter_map(|entry| entry.ok())
        .map(|entry| {
            let path = entry.path();
            Entry {
                name: entry.file_name().to_string_lossy().to_string(),
                is_dir: path.is_dir(),
                path,
            }
        })
        .collect();
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    entries
}

/// Subdirectories of a category directory, excluding reserved names.
pub fn list_artifact_dirs(dir: &Path) -> Vec<Entry> {
    list_entries(dir)
        .into_iter()
        .filter(|e| e.is_dir && !layout::is_reserved(&e.name))
        .collect()
}

/// Count the entries directly inside a directory.
fn count_entries(dir: &Path) -> Option<u64> {
    fs::read_dir(dir).ok().map(|read| read.count() as u64)
}

/// Path of `path` relative to `root`, falling back to the full path.
pub fn relative_path(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|_| path.to_string_lossy().to_string())
}

/// All versions of one dataset.
#[derive(Clone, Debug)]
pub struct ScannedDataset {
    pub name: String,
    pub versions: Vec<(String, DatasetVersion)>,
}

/// All versions of one model.
#[derive(Clone, Debug)]
pub struct ScannedModel {
    pub name: String,
    pub versions: Vec<(String, ModelVersion)>,
}

/// One run directory.
#[derive(Clone, Debug)]
pub struct ScannedRun {
    pub id: String,
    pub record: RunRecord,
}

/// Walks the category directories of one workspace.
#[derive(Clone, Debug)]
pub struct ArtifactScanner {
    root: PathBuf,
}

impl ArtifactScanner {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Scan `datasets/<name>/<version>/`.
    pub fn scan_datasets(&self) -> Vec<ScannedDataset> {
        let start = Instant::now();
        let datasets: Vec<ScannedDataset> = list_artifact_dirs(&self.root.join(layout::DATASETS_DIR))
            .into_iter()
            .map(|dataset| ScannedDataset {
                versions: self.version_dirs(&dataset.path, |dir| self.scan_dataset_version(dir)),
                name: dataset.name,
            })
            .collect();

        tracing::debug!(
            "Scanned {} datasets in {:.1}ms",
            datasets.len(),
            start.elapsed().as_secs_f64() * 1000.0
        );
        datasets
    }

    fn scan_dataset_version(&self, dir: &Path) -> DatasetVersion {
        let metadata = load_structured(&dir.join(layout::DATASET_METADATA_FILE), DocumentFormat::Yaml);

        let sample_counts = SPLITS
            .iter()
            .filter_map(|split| {
                let split_dir = dir.join(split);
                if !split_dir.is_dir() {
                    return None;
                }
                count_entries(&split_dir).map(|count| (split.to_string(), count))
            })
            .collect();

        DatasetVersion {
            metadata: metadata.into_document(),
            sample_counts,
            path: relative_path(&self.root, dir),
        }
    }

    /// Scan `runs/run-*/`.
    pub fn scan_runs(&self) -> Vec<ScannedRun> {
        let start = Instant::now();
        let mut skipped = 0usize;
        let runs: Vec<ScannedRun> = list_artifact_dirs(&self.root.join(layout::RUNS_DIR))
            .into_iter()
            .filter(|entry| {
                let keep = layout::is_run_dir(&entry.name);
                if !keep {
                    skipped += 1;
                }
                keep
            })
            .map(|entry| ScannedRun {
                record: self.scan_run(&entry.path),
                id: entry.name,
            })
            .collect();

        tracing::debug!(
            "Scanned {} runs ({} skipped) in {:.1}ms",
            runs.len(),
            skipped,
            start.elapsed().as_secs_f64() * 1000.0
        );
        runs
    }

    fn scan_run(&self, dir: &Path) -> RunRecord {
        RunRecord {
            config: load_structured(&dir.join(layout::RUN_CONFIG_FILE), DocumentFormat::Yaml)
                .into_document(),
            metrics: load_structured(&dir.join(layout::RUN_METRICS_FILE), DocumentFormat::Json)
                .into_document(),
            system: load_structured(&dir.join(layout::RUN_SYSTEM_FILE), DocumentFormat::Json)
                .into_document(),
            log_preview: read_preview(&dir.join(layout::RUN_LOG_FILE), layout::LOG_PREVIEW_CHARS),
            path: relative_path(&self.root, dir),
        }
    }

    /// Scan `models/<name>/<version>/`.
    pub fn scan_models(&self) -> Vec<ScannedModel> {
        let start = Instant::now();
        let models: Vec<ScannedModel> = list_artifact_dirs(&self.root.join(layout::MODELS_DIR))
            .into_iter()
            .map(|model| ScannedModel {
                versions: self.version_dirs(&model.path, |dir| self.scan_model_version(dir)),
                name: model.name,
            })
            .collect();

        tracing::debug!(
            "Scanned {} models in {:.1}ms",
            models.len(),
            start.elapsed().as_secs_f64() * 1000.0
        );
        models
    }

    fn scan_model_version(&self, dir: &Path) -> ModelVersion {
        ModelVersion {
            metadata: load_structured(&dir.join(layout::MODEL_METADATA_FILE), DocumentFormat::Yaml)
                .into_document(),
            metrics: load_structured(&dir.join(layout::MODEL_METRICS_FILE), DocumentFormat::Yaml)
                .into_document(),
            card_preview: read_preview(&dir.join(layout::MODEL_CARD_FILE), layout::CARD_PREVIEW_CHARS),
            model_files: self.model_files(dir),
            path: relative_path(&self.root, dir),
        }
    }

    /// Recognized model artifacts directly inside a version directory.
    pub fn model_files(&self, dir: &Path) -> Vec<ModelFile> {
        list_entries(dir)
            .into_iter()
            .filter(|e| !e.is_dir && e.path.is_file() && layout::is_model_artifact(&e.path))
            .filter_map(|e| {
                let size = match fs::metadata(&e.path) {
                    Ok(m) => m.len(),
                    Err(err) => {
                        tracing::warn!("Failed to stat {}: {}", e.path.display(), err);
                        return None;
                    }
                };
                Some(ModelFile {
                    path: relative_path(&self.root, &e.path),
                    name: e.name,
                    size,
                })
            })
            .collect()
    }

    /// Version-tagged subdirectories of an artifact, each scanned with `scan`.
    fn version_dirs<T>(&self, artifact_dir: &Path, scan: impl Fn(&Path) -> T) -> Vec<(String, T)> {
        list_entries(artifact_dir)
            .into_iter()
            .filter(|e| e.is_dir && layout::is_version_tag(&e.name))
            .map(|e| {
                let record = scan(&e.path);
                (e.name, record)
            })
            .collect()
    }
}
