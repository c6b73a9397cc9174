//! Lineage command - Walk the lineage graph from one artifact
//!
//! Downstream by default (what was built from the artifact); `--upstream`
//! walks back to the runs and datasets it came from.

use anyhow::{bail, Context, Result};
use serde::Serialize;
use strata_core::lineage::LineageHop;
use strata_core::{LineageGraph, LineageRecord, WorkspaceIndexer};

use super::workspace_root;
use crate::constants::NAME_COLUMN_WIDTH;
use crate::output::{
    Alignment, Column, Output, OutputConfig, OutputFormat, Outputter, TableOutput,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Upstream,
    Downstream,
}

/// Lineage of one artifact
#[derive(Debug, Serialize)]
pub struct LineageResult {
    pub id: String,
    /// The artifact's own record; absent for referenced-only ids.
    pub record: Option<LineageRecord>,
    pub direction: Direction,
    pub hops: Vec<LineageHop>,
    /// Ids referenced anywhere in the workspace that have no record.
    pub unresolved: Vec<String>,
}

impl Outputter for LineageResult {
    fn to_table(&self, config: &OutputConfig) -> String {
        use colored::Colorize;

        let kind = self
            .record
            .as_ref()
            .map(LineageRecord::kind)
            .unwrap_or("not indexed");
        let direction = match self.direction {
            Direction::Upstream => "upstream",
            Direction::Downstream => "downstream",
        };

        let mut output = format!(
            "{} {} {}\n",
            self.id.cyan().bold(),
            format!("({})", kind).dimmed(),
            format!("{} lineage", direction).dimmed()
        );

        if self.hops.is_empty() {
            output.push_str(&format!("No {} artifacts", direction));
        } else {
            output.push_str(&TableOutput::format_with_columns(
                &self.hops,
                &[
                    Column::new("Depth", "depth").with_alignment(Alignment::Right),
                    Column::new("Artifact", "id").with_max_width(NAME_COLUMN_WIDTH),
                    Column::new("Edge", "via"),
                    Column::new("Indexed", "indexed"),
                ],
                config,
            ));
        }

        if !self.unresolved.is_empty() {
            output.push_str(&format!(
                "\n{} {}",
                "Unresolved references:".yellow(),
                self.unresolved.join(", ")
            ));
        }
        output
    }
}

/// Run the lineage command.
pub fn run(id: &str, path: &str, upstream: bool, format: OutputFormat) -> Result<()> {
    let root = workspace_root(path);
    let index = WorkspaceIndexer::new(&root)
        .index_all()
        .with_context(|| format!("Failed to read workspace {}", root.display()))?;

    let graph = LineageGraph::from_lineage(&index.lineage);
    if !graph.has_node(id) {
        bail!(
            "No lineage for '{}' ({} artifacts have lineage records)",
            id,
            index.lineage.len()
        );
    }

    let (direction, hops) = if upstream {
        (Direction::Upstream, graph.upstream(id))
    } else {
        (Direction::Downstream, graph.downstream(id))
    };

    let result = LineageResult {
        id: id.to_string(),
        record: index.lineage.get(id).cloned(),
        direction,
        hops,
        unresolved: graph.dangling(),
    };
    Output::new(result, format).render()
}
