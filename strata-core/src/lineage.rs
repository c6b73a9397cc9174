//! Cross-artifact lineage.
//!
//! [`resolve`] derives the flat lineage map from a finished index without
//! touching the disk. [`LineageGraph`] loads that map into a petgraph
//! `DiGraph` for upstream/downstream questions:
//!
//! ```text
//! dataset --trains--> run --produces--> model
//!    |                                    ^
//!    +---------------feeds----------------+
//! parent dataset --derives--> dataset
//! ```

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::Serialize;
use serde_json::Value;

use crate::loader::{empty_document, field, field_text, Document};
use crate::types::{LineageMap, LineageRecord, WorkspaceIndex};

/// Derive the lineage map from an index.
///
/// Records are inserted runs, then models, then datasets, so the result is
/// the same whatever order the directories were listed in. A model and a
/// dataset sharing `"{name}/{version}"` resolve to the dataset record.
pub fn resolve(index: &WorkspaceIndex) -> LineageMap {
    let mut lineage = LineageMap::new();

    for (run_id, run) in &index.runs {
        lineage.insert(
            run_id.clone(),
            LineageRecord::Run {
                dataset: field_text(&run.config, "dataset"),
                model: field_text(&run.config, "model"),
                experiment: field_text(&run.config, "experiment"),
            },
        );
    }

    for (name, versions) in &index.models {
        for (version, model) in versions {
            let run_id = field_text(&model.metadata, "run_id");
            if run_id.is_empty() {
                continue;
            }
            lineage.insert(
                format!("{}/{}", name, version),
                LineageRecord::Model {
                    run_id,
                    dataset: dataset_name(&model.metadata),
                },
            );
        }
    }

    for (name, versions) in &index.datasets {
        for (version, dataset) in versions {
            lineage.insert(
                format!("{}/{}", name, version),
                LineageRecord::Dataset {
                    derived_from: field_or_empty(&dataset.metadata, "derived_from"),
                    source: field_or_empty(&dataset.metadata, "source"),
                },
            );
        }
    }

    lineage
}

/// `dataset.name` of a model's metadata. A bare string is accepted too.
fn dataset_name(metadata: &Document) -> String {
    match field(metadata, "dataset") {
        Some(dataset @ Value::Object(_)) => field_text(dataset, "name"),
        Some(Value::String(s)) => s.clone(),
        _ => String::new(),
    }
}

fn field_or_empty(doc: &Document, key: &str) -> Document {
    field(doc, key).cloned().unwrap_or_else(empty_document)
}

/// Relationship carried by a lineage edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    /// dataset -> run
    Trains,
    /// run -> model
    Produces,
    /// dataset -> model
    Feeds,
    /// parent dataset -> derived dataset
    Derives,
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EdgeKind::Trains => "trains",
            EdgeKind::Produces => "produces",
            EdgeKind::Feeds => "feeds",
            EdgeKind::Derives => "derives",
        };
        f.write_str(s)
    }
}

/// A node reached by a traversal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineageHop {
    pub id: String,
    /// Edge followed to reach this node.
    pub via: EdgeKind,
    /// Hops from the starting node.
    pub depth: usize,
    /// Whether the node has its own lineage record.
    pub indexed: bool,
}

/// Directed lineage graph over artifact ids.
///
/// Nodes are lineage ids plus any referenced id the index does not know
/// about (kept as dangling nodes so broken references stay visible).
pub struct LineageGraph {
    graph: DiGraph<String, EdgeKind>,
    node_map: HashMap<String, NodeIndex>,
    indexed: HashSet<String>,
}

impl LineageGraph {
    /// Build the graph from a resolved lineage map.
    pub fn from_lineage(lineage: &LineageMap) -> Self {
        let mut graph = Self {
            graph: DiGraph::new(),
            node_map: HashMap::with_capacity(lineage.len()),
            indexed: lineage.keys().cloned().collect(),
        };

        for id in lineage.keys() {
            graph.node(id);
        }

        for (id, record) in lineage {
            match record {
                LineageRecord::Run { dataset, .. } => {
                    if let Some(src) = resolve_reference(lineage, dataset) {
                        graph.add_edge(&src, id, EdgeKind::Trains);
                    }
                }
                LineageRecord::Model { run_id, dataset } => {
                    if let Some(src) = resolve_reference(lineage, run_id) {
                        graph.add_edge(&src, id, EdgeKind::Produces);
                    }
                    if let Some(src) = resolve_reference(lineage, dataset) {
                        graph.add_edge(&src, id, EdgeKind::Feeds);
                    }
                }
                LineageRecord::Dataset { derived_from, .. } => {
                    if let Some(parent) = derived_reference(derived_from) {
                        if let Some(src) = resolve_reference(lineage, &parent) {
                            graph.add_edge(&src, id, EdgeKind::Derives);
                        }
                    }
                }
            }
        }

        graph
    }

    fn node(&mut self, id: &str) -> NodeIndex {
        if let Some(&idx) = self.node_map.get(id) {
            return idx;
        }
        let idx = self.graph.add_node(id.to_string());
        self.node_map.insert(id.to_string(), idx);
        idx
    }

    fn add_edge(&mut self, from: &str, to: &str, kind: EdgeKind) {
        let s = self.node(from);
        let d = self.node(to);
        self.graph.add_edge(s, d, kind);
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn has_node(&self, id: &str) -> bool {
        self.node_map.contains_key(id)
    }

    /// Everything `id` was built from (datasets, runs, parent datasets).
    pub fn upstream(&self, id: &str) -> Vec<LineageHop> {
        self.traverse_bfs(id, Direction::Incoming)
    }

    /// Everything built from `id`.
    pub fn downstream(&self, id: &str) -> Vec<LineageHop> {
        self.traverse_bfs(id, Direction::Outgoing)
    }

    /// Referenced ids with no lineage record of their own.
    pub fn dangling(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .node_map
            .keys()
            .filter(|id| !self.indexed.contains(*id))
            .cloned()
            .collect();
        ids.sort();
        ids
    }

    fn traverse_bfs(&self, id: &str, direction: Direction) -> Vec<LineageHop> {
        let start = match self.node_map.get(id) {
            Some(&idx) => idx,
            None => return vec![],
        };

        let mut visited: HashSet<NodeIndex> = HashSet::new();
        let mut result = Vec::new();
        let mut queue = VecDeque::new();

        visited.insert(start);
        queue.push_back((start, 0usize));

        while let Some((current, depth)) = queue.pop_front() {
            let mut edges: Vec<_> = self.graph.edges_directed(current, direction).collect();
            // petgraph yields edges newest first; keep insertion order instead.
            edges.reverse();

            for edge in edges {
                let neighbor = if direction == Direction::Outgoing {
                    edge.target()
                } else {
                    edge.source()
                };

                if visited.insert(neighbor) {
                    let node_id = self.graph[neighbor].clone();
                    result.push(LineageHop {
                        indexed: self.indexed.contains(&node_id),
                        id: node_id,
                        via: *edge.weight(),
                        depth: depth + 1,
                    });
                    queue.push_back((neighbor, depth + 1));
                }
            }
        }

        result
    }
}

/// Match a free-form reference against lineage ids.
///
/// An exact id wins; a bare name (`iris`) resolves to its latest
/// `iris/<version>` id; anything else is returned unchanged as a dangling
/// reference. Empty references resolve to nothing.
fn resolve_reference(lineage: &LineageMap, reference: &str) -> Option<String> {
    if reference.is_empty() {
        return None;
    }
    if lineage.contains_key(reference) {
        return Some(reference.to_string());
    }

    let prefix = format!("{}/", reference);
    let latest = lineage
        .range(prefix.clone()..)
        .take_while(|(id, _)| id.starts_with(&prefix))
        .filter(|(id, _)| !id[prefix.len()..].contains('/'))
        .map(|(id, _)| id.clone())
        .max();

    Some(latest.unwrap_or_else(|| reference.to_string()))
}

/// Parent reference of a dataset: either `"name/version"` or `{name, version}`.
fn derived_reference(derived_from: &Document) -> Option<String> {
    match derived_from {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Object(_) => {
            let name = field_text(derived_from, "name");
            if name.is_empty() {
                return None;
            }
            let version = field_text(derived_from, "version");
            if version.is_empty() {
                Some(name)
            } else {
                Some(format!("{}/{}", name, version))
            }
        }
        _ => None,
    }
}
