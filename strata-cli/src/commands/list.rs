//! List command - Tabulate datasets, runs or models

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::Serialize;
use strata_core::layout::{self, latest_version, parse_run_id};
use strata_core::loader::{field, field_text, value_text};
use strata_core::types::WorkspaceIndex;
use strata_core::{IndexScope, WorkspaceIndexer};

use super::workspace_root;
use crate::constants::{NAME_COLUMN_WIDTH, TEXT_COLUMN_WIDTH};
use crate::output::{Alignment, Column, Output, OutputConfig, OutputFormat, Outputter, TableOutput};

/// Artifact category to list
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Category {
    Datasets,
    Runs,
    Models,
}

impl Category {
    fn scope(self) -> IndexScope {
        match self {
            Category::Datasets => IndexScope::Datasets,
            Category::Runs => IndexScope::Runs,
            Category::Models => IndexScope::Models,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DatasetRow {
    pub name: String,
    pub versions: usize,
    pub latest: String,
    pub train: Option<u64>,
    pub val: Option<u64>,
    pub test: Option<u64>,
    pub source: String,
}

#[derive(Debug, Serialize)]
pub struct RunRow {
    pub id: String,
    pub date: Option<String>,
    pub experiment: String,
    pub model: String,
    pub dataset: String,
}

#[derive(Debug, Serialize)]
pub struct ModelRow {
    pub name: String,
    pub versions: usize,
    pub latest: String,
    pub run_id: String,
    pub framework: String,
    pub files: usize,
}

/// Rows of one category.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Listing {
    Datasets(Vec<DatasetRow>),
    Runs(Vec<RunRow>),
    Models(Vec<ModelRow>),
}

impl Listing {
    pub fn from_index(index: &WorkspaceIndex, category: Category) -> Self {
        match category {
            Category::Datasets => Listing::Datasets(dataset_rows(index)),
            Category::Runs => Listing::Runs(run_rows(index)),
            Category::Models => Listing::Models(model_rows(index)),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Listing::Datasets(rows) => rows.len(),
            Listing::Runs(rows) => rows.len(),
            Listing::Models(rows) => rows.len(),
        }
    }
}

impl Outputter for Listing {
    fn to_table(&self, config: &OutputConfig) -> String {
        let name = Column::new("Name", "name").with_max_width(NAME_COLUMN_WIDTH);
        let count = |title: &str, key: &str| Column::new(title, key).with_alignment(Alignment::Right);

        match self {
            Listing::Datasets(rows) => TableOutput::format_with_columns(
                rows,
                &[
                    name,
                    count("Versions", "versions"),
                    Column::new("Latest", "latest"),
                    count("Train", "train"),
                    count("Val", "val"),
                    count("Test", "test"),
                    Column::new("Source", "source").with_max_width(TEXT_COLUMN_WIDTH),
                ],
                config,
            ),
            Listing::Runs(rows) => TableOutput::format_with_columns(
                rows,
                &[
                    Column::new("Run", "id").with_max_width(NAME_COLUMN_WIDTH),
                    Column::new("Date", "date"),
                    Column::new("Experiment", "experiment").with_max_width(TEXT_COLUMN_WIDTH),
                    Column::new("Model", "model"),
                    Column::new("Dataset", "dataset"),
                ],
                config,
            ),
            Listing::Models(rows) => TableOutput::format_with_columns(
                rows,
                &[
                    name,
                    count("Versions", "versions"),
                    Column::new("Latest", "latest"),
                    Column::new("Run", "run_id"),
                    Column::new("Framework", "framework"),
                    count("Files", "files"),
                ],
                config,
            ),
        }
    }
}

fn dataset_rows(index: &WorkspaceIndex) -> Vec<DatasetRow> {
    index
        .datasets
        .iter()
        .map(|(name, versions)| {
            let latest = latest_version(versions.keys()).unwrap_or_default();
            let record = versions.get(latest);
            let split = |s: &str| record.and_then(|r| r.sample_counts.get(s).copied());
            DatasetRow {
                name: name.clone(),
                versions: versions.len(),
                latest: latest.to_string(),
                train: split(layout::SPLITS[0]),
                val: split(layout::SPLITS[1]),
                test: split(layout::SPLITS[2]),
                source: record
                    .and_then(|r| field(&r.metadata, "source"))
                    .map(value_text)
                    .unwrap_or_default(),
            }
        })
        .collect()
}

fn run_rows(index: &WorkspaceIndex) -> Vec<RunRow> {
    index
        .runs
        .iter()
        .map(|(id, run)| RunRow {
            id: id.clone(),
            date: parse_run_id(id).map(|parsed| parsed.date.to_string()),
            experiment: field_text(&run.config, "experiment"),
            model: field_text(&run.config, "model"),
            dataset: field_text(&run.config, "dataset"),
        })
        .collect()
}

fn model_rows(index: &WorkspaceIndex) -> Vec<ModelRow> {
    index
        .models
        .iter()
        .map(|(name, versions)| {
            let latest = latest_version(versions.keys()).unwrap_or_default();
            let record = versions.get(latest);
            let meta = |key: &str| {
                record
                    .map(|r| field_text(&r.metadata, key))
                    .unwrap_or_default()
            };
            ModelRow {
                name: name.clone(),
                versions: versions.len(),
                latest: latest.to_string(),
                run_id: meta("run_id"),
                framework: meta("framework"),
                files: record.map(|r| r.model_files.len()).unwrap_or(0),
            }
        })
        .collect()
}

/// Run the list command.
pub fn run(path: &str, category: Category, format: OutputFormat) -> Result<()> {
    let root = workspace_root(path);
    let index = WorkspaceIndexer::new(&root)
        .index(category.scope())
        .with_context(|| format!("Failed to read workspace {}", root.display()))?;

    let listing = Listing::from_index(&index, category);
    tracing::debug!("Listing {} {:?}", listing.len(), category);
    Output::new(listing, format).render()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeMap;
    use strata_core::types::{DatasetVersion, ModelFile, ModelVersion};

    fn index() -> WorkspaceIndex {
        let mut index = WorkspaceIndex::default();

        let mut iris = BTreeMap::new();
        iris.insert(
            "v1".to_string(),
            DatasetVersion {
                sample_counts: BTreeMap::from([("train".to_string(), 3)]),
                ..DatasetVersion::default()
            },
        );
        iris.insert(
            "v2".to_string(),
            DatasetVersion {
                metadata: json!({"source": "uci"}),
                sample_counts: BTreeMap::from([
                    ("train".to_string(), 120),
                    ("val".to_string(), 30),
                ]),
                path: "datasets/iris/v2".into(),
            },
        );
        index.datasets.insert("iris".into(), iris);

        index.models.insert(
            "clf".into(),
            BTreeMap::from([(
                "v1".to_string(),
                ModelVersion {
                    metadata: json!({"run_id": "run-2024-01-01-001", "framework": "torch"}),
                    model_files: vec![ModelFile {
                        name: "model.pt".into(),
                        size: 10,
                        path: "models/clf/v1/model.pt".into(),
                    }],
                    ..ModelVersion::default()
                },
            )]),
        );
        index
    }

    #[test]
    fn test_dataset_rows_use_latest_version() {
        let rows = dataset_rows(&index());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].versions, 2);
        assert_eq!(rows[0].latest, "v2");
        assert_eq!(rows[0].train, Some(120));
        assert_eq!(rows[0].test, None);
        assert_eq!(rows[0].source, "uci");
    }

    #[test]
    fn test_model_rows() {
        let rows = model_rows(&index());
        assert_eq!(rows[0].run_id, "run-2024-01-01-001");
        assert_eq!(rows[0].framework, "torch");
        assert_eq!(rows[0].files, 1);
    }

    #[test]
    fn test_listing_json_is_array() {
        let listing = Listing::from_index(&index(), Category::Runs);
        assert_eq!(listing.len(), 0);
        assert_eq!(serde_json::to_value(&listing).unwrap(), json!([]));
    }

    #[test]
    fn test_listing_table() {
        let listing = Listing::from_index(&index(), Category::Datasets);
        let config = OutputConfig {
            format: OutputFormat::Table,
            no_truncate: true,
            width: None,
        };
        let table = Outputter::to_table(&listing, &config);
        assert!(table.contains("iris"));
        assert!(table.contains("120"));
    }
}
