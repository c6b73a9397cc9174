//! Status command - Summarize a StrataML workspace
//!
//! Shows artifact counts and the most recent runs, plus a hint for what to
//! do next.

use std::time::Instant;

use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use strata_core::layout::{self, parse_run_id};
use strata_core::loader::field_text;
use strata_core::types::{SummaryStats, WorkspaceIndex};
use strata_core::WorkspaceIndexer;

use super::workspace_root;
use crate::config::CONFIG_FILE;
use crate::constants::RECENT_RUNS_LIMIT;
use crate::output::{Output, OutputFormat, TableDisplay};

/// One line of the recent-runs list.
#[derive(Debug, Clone, Serialize)]
pub struct RecentRun {
    pub id: String,
    /// Date encoded in a conventional run id.
    pub date: Option<String>,
    pub experiment: String,
    pub model: String,
    pub dataset: String,
}

/// Status information for a StrataML workspace.
#[derive(Debug, Clone, Serialize)]
pub struct StatusInfo {
    pub project_root: String,
    /// Whether `.stratarc.toml` exists
    pub config_exists: bool,
    pub summary: SummaryStats,
    pub recent_runs: Vec<RecentRun>,
    /// Recommended next action
    pub next_action: Option<String>,
    /// Time taken to gather status (in milliseconds)
    pub duration_ms: u64,
}

impl TableDisplay for StatusInfo {
    fn to_table(&self) -> String {
        let mut lines = Vec::new();

        let total = self.summary.datasets + self.summary.runs + self.summary.models;
        if total > 0 {
            lines.push(format!("{}", "StrataML Workspace".green().bold()));
        } else {
            lines.push(format!("{}", "StrataML Workspace: Empty".yellow().bold()));
        }
        lines.push(format!("  {}: {}", "Root".cyan(), self.project_root));
        lines.push(format!(
            "  {}: {} ({} versions)",
            "Datasets".cyan(),
            self.summary.datasets,
            self.summary.dataset_versions
        ));
        lines.push(format!("  {}: {}", "Runs".cyan(), self.summary.runs));
        lines.push(format!(
            "  {}: {} ({} versions)",
            "Models".cyan(),
            self.summary.models,
            self.summary.model_versions
        ));
        lines.push(format!(
            "  {}: {}",
            "Config".cyan(),
            if self.config_exists { "Yes" } else { "No" }
        ));

        if !self.recent_runs.is_empty() {
            lines.push(String::new());
            lines.push(format!("{}", "Recent runs:".cyan().bold()));
            for run in &self.recent_runs {
                let mut detail = Vec::new();
                if !run.experiment.is_empty() {
                    detail.push(run.experiment.clone());
                }
                if !run.model.is_empty() || !run.dataset.is_empty() {
                    detail.push(format!("{} on {}", or_dash(&run.model), or_dash(&run.dataset)));
                }
                lines.push(format!("  {}  {}", run.id, detail.join(", ").dimmed()));
            }
        }

        if let Some(action) = &self.next_action {
            lines.push(String::new());
            lines.push(format!("{}: {}", "Next action".yellow(), action));
        }

        lines.push(format!(
            "\n{}",
            format!("({} ms)", self.duration_ms).dimmed()
        ));

        lines.join("\n")
    }
}

fn or_dash(s: &str) -> &str {
    if s.is_empty() {
        "-"
    } else {
        s
    }
}

/// Most recent runs, newest first.
pub fn recent_runs(index: &WorkspaceIndex, limit: usize) -> Vec<RecentRun> {
    layout::recent_run_ids(index.runs.keys(), limit)
        .into_iter()
        .filter_map(|id| index.runs.get(id).map(|run| (id, run)))
        .map(|(id, run)| RecentRun {
            id: id.to_string(),
            date: parse_run_id(id).map(|parsed| parsed.date.to_string()),
            experiment: field_text(&run.config, "experiment"),
            model: field_text(&run.config, "model"),
            dataset: field_text(&run.config, "dataset"),
        })
        .collect()
}

/// Run the status command.
pub fn run(path: &str, format: OutputFormat) -> Result<()> {
    let start = Instant::now();
    let root = workspace_root(path);

    let index = WorkspaceIndexer::new(&root)
        .index_all()
        .with_context(|| format!("Failed to read workspace {}", root.display()))?;

    let summary = index.summary();
    let next_action = if summary.datasets + summary.runs + summary.models == 0 {
        Some("Add datasets under datasets/<name>/<version>/".to_string())
    } else {
        Some("strataml doctor".to_string())
    };

    let status = StatusInfo {
        project_root: index.metadata.project_root.clone(),
        config_exists: root.join(CONFIG_FILE).exists(),
        summary,
        recent_runs: recent_runs(&index, RECENT_RUNS_LIMIT),
        next_action,
        duration_ms: start.elapsed().as_millis() as u64,
    };

    Output::new(status, format).render()
}
