//! Index command - Build the workspace index
//!
//! Scans datasets, runs and models, resolves lineage, and emits the index as
//! JSON. With `--output` the index goes to a file and a summary is printed.

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use strata_core::types::SummaryStats;
use strata_core::{IndexScope, WorkspaceIndexer};

use super::workspace_root;
use crate::output::{Output, OutputFormat, TableDisplay};

/// What was written by `strataml index --output`.
#[derive(Debug, Serialize)]
pub struct IndexSummary {
    pub output: String,
    pub project_root: String,
    #[serde(flatten)]
    pub stats: SummaryStats,
    pub lineage: usize,
    pub duration_ms: u64,
}

impl TableDisplay for IndexSummary {
    fn to_table(&self) -> String {
        let mut lines = vec![format!("{}", "Workspace indexed".green().bold())];
        lines.push(format!("  {}: {}", "Root".cyan(), self.project_root));
        lines.push(format!(
            "  {}: {} ({} versions)",
            "Datasets".cyan(),
            self.stats.datasets,
            self.stats.dataset_versions
        ));
        lines.push(format!("  {}: {}", "Runs".cyan(), self.stats.runs));
        lines.push(format!(
            "  {}: {} ({} versions)",
            "Models".cyan(),
            self.stats.models,
            self.stats.model_versions
        ));
        lines.push(format!("  {}: {}", "Lineage".cyan(), self.lineage));
        lines.push(format!("  {}: {}", "Written to".cyan(), self.output));
        lines.push(format!("\n{}", format!("({} ms)", self.duration_ms).dimmed()));
        lines.join("\n")
    }
}

/// Run the index command.
pub fn run(
    path: &str,
    scope: IndexScope,
    output: Option<&str>,
    format: OutputFormat,
) -> Result<()> {
    let start = std::time::Instant::now();
    let root = workspace_root(path);

    let index = WorkspaceIndexer::new(&root)
        .index(scope)
        .with_context(|| format!("Failed to index {}", root.display()))?;
    let json = index.to_json()?;

    let Some(output) = output else {
        println!("{}", json);
        return Ok(());
    };

    write_index(Path::new(output), &json)?;
    tracing::info!("Wrote index to {}", output);

    let summary = IndexSummary {
        output: output.to_string(),
        project_root: index.metadata.project_root.clone(),
        stats: index.summary(),
        lineage: index.lineage.len(),
        duration_ms: start.elapsed().as_millis() as u64,
    };
    Output::new(summary, format).render()
}

fn write_index(path: &Path, json: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
}
