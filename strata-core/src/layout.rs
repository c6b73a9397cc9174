//! Directory convention of a StrataML workspace.
//!
//! ```text
//! <root>/
//!   datasets/<name>/v<N>/{metadata.yaml, train/, val/, test/}
//!   runs/run-YYYY-MM-DD-NNN/{config.yaml, metrics.json, system.json, log.txt}
//!   models/<name>/v<N>/{metadata.yaml, metrics.yaml, card.md, *.pth, ...}
//!   configs/{datasets,models,training,sweeps}/base.yaml
//! ```
//!
//! Everything here is naming convention only. Version tags are compared as
//! plain strings, never as semantic versions.

use std::cmp::Reverse;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

pub const DATASETS_DIR: &str = "datasets";
pub const RUNS_DIR: &str = "runs";
pub const MODELS_DIR: &str = "models";
pub const CONFIGS_DIR: &str = "configs";

/// Top-level entry names that are never artifacts.
pub const RESERVED_NAMES: &[&str] = &["README.md"];

/// Marker every version tag starts with.
pub const VERSION_PREFIX: &str = "v";

/// Marker every run directory starts with.
pub const RUN_PREFIX: &str = "run-";

/// Dataset splits, in reporting order.
pub const SPLITS: &[&str] = &["train", "val", "test"];

pub const DATASET_METADATA_FILE: &str = "metadata.yaml";

pub const RUN_CONFIG_FILE: &str = "config.yaml";
pub const RUN_METRICS_FILE: &str = "metrics.json";
pub const RUN_SYSTEM_FILE: &str = "system.json";
pub const RUN_LOG_FILE: &str = "log.txt";

pub const MODEL_METADATA_FILE: &str = "metadata.yaml";
pub const MODEL_METRICS_FILE: &str = "metrics.yaml";
pub const MODEL_CARD_FILE: &str = "card.md";

/// Maximum characters kept from a run log.
pub const LOG_PREVIEW_CHARS: usize = 500;

/// Maximum characters kept from a model card.
pub const CARD_PREVIEW_CHARS: usize = 1000;

/// File extensions recognized as trained model artifacts (case-sensitive).
pub const MODEL_EXTENSIONS: &[&str] = &["pth", "pt", "pkl", "onnx", "pb", "h5", "keras", "ckpt"];

/// Whether a directory entry name should be skipped at category level.
pub fn is_reserved(name: &str) -> bool {
    RESERVED_NAMES.contains(&name)
}

/// Whether a name follows the version-tag convention (`v1`, `v2`, ...).
pub fn is_version_tag(name: &str) -> bool {
    name.starts_with(VERSION_PREFIX)
}

/// Whether a directory name follows the run-id convention.
pub fn is_run_dir(name: &str) -> bool {
    name.starts_with(RUN_PREFIX)
}

/// Whether a file looks like a trained model artifact.
pub fn is_model_artifact(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| MODEL_EXTENSIONS.contains(&ext))
        .unwrap_or(false)
}

/// Pick the "latest" version tag: the lexicographic maximum.
///
/// `v10` sorts before `v9`; see DESIGN.md before relying on this past
/// single-digit versions.
pub fn latest_version<'a, I>(tags: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a String>,
{
    tags.into_iter().map(String::as_str).max()
}

static RUN_ID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^run-(?P<date>\d{4}-\d{2}-\d{2})-(?P<ordinal>\d+)$").expect("valid run-id regex")
});

/// Components of a conventional run id (`run-2024-01-01-001`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunId<'a> {
    pub date: &'a str,
    pub ordinal: u32,
}

/// Parse a run id into its date and ordinal. Custom run ids yield `None`.
pub fn parse_run_id(id: &str) -> Option<RunId<'_>> {
    let caps = RUN_ID_RE.captures(id)?;
    let date = caps.name("date")?.as_str();
    let ordinal = caps.name("ordinal")?.as_str().parse().ok()?;
    Some(RunId { date, ordinal })
}

/// Run ids newest first, limited to `limit`.
///
/// Ordering is the reverse of plain string order, which is chronological
/// for conventional ids.
pub fn recent_run_ids<'a, I>(ids: I, limit: usize) -> Vec<&'a str>
where
    I: IntoIterator<Item = &'a String>,
{
    let mut ids: Vec<&str> = ids.into_iter().map(String::as_str).collect();
    ids.sort_by_key(|id| Reverse(*id));
    ids.truncate(limit);
    ids
}
