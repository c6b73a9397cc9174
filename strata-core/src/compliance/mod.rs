//! Workspace compliance rules.
//!
//! Each rule is an independent check over the workspace root. A rule
//! appends human-readable messages to a shared [`Findings`] accumulator and
//! returns its own pass/fail. The [`ComplianceEngine`] runs one rule or all
//! of them and folds the results into a [`ValidationReport`].
//!
//! Rules never abort each other: a rule that finds the workspace broken
//! records what it found and returns `false`, and the next rule still runs.

mod artifacts;
mod lfs;
mod structure;

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::scanner::ensure_readable_root;

pub use lfs::{GitLfs, LfsProbe, DEFAULT_LARGE_FILE_BYTES, LFS_EXTENSIONS};

/// Signature shared by every rule.
pub type RuleFn = fn(&RuleContext<'_>, &mut Findings) -> bool;

/// Identifier of a registered rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleId {
    Layout,
    Schemas,
    Runs,
    Datasets,
    Models,
    Lfs,
}

impl RuleId {
    /// Every rule, in execution order.
    pub const ALL: [RuleId; 6] = [
        RuleId::Layout,
        RuleId::Schemas,
        RuleId::Runs,
        RuleId::Datasets,
        RuleId::Models,
        RuleId::Lfs,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RuleId::Layout => "layout",
            RuleId::Schemas => "schemas",
            RuleId::Runs => "runs",
            RuleId::Datasets => "datasets",
            RuleId::Models => "models",
            RuleId::Lfs => "lfs",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            RuleId::Layout => "Required directories and files",
            RuleId::Schemas => "Configuration templates",
            RuleId::Runs => "Run records",
            RuleId::Datasets => "Dataset versions",
            RuleId::Models => "Model versions",
            RuleId::Lfs => "Large file tracking",
        }
    }

    /// Numeric alias, if the rule has one.
    pub fn number(self) -> Option<u8> {
        match self {
            RuleId::Layout => Some(1),
            RuleId::Schemas => Some(2),
            RuleId::Runs => Some(3),
            RuleId::Datasets => Some(4),
            RuleId::Models => Some(5),
            RuleId::Lfs => None,
        }
    }

    fn check(self) -> RuleFn {
        match self {
            RuleId::Layout => structure::check_layout,
            RuleId::Schemas => structure::check_schemas,
            RuleId::Runs => artifacts::check_runs,
            RuleId::Datasets => artifacts::check_datasets,
            RuleId::Models => artifacts::check_models,
            RuleId::Lfs => lfs::check_lfs,
        }
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RuleId {
    type Err = String;

    /// Accepts rule names case-insensitively and the numeric aliases `1`-`5`.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        RuleId::ALL
            .into_iter()
            .find(|rule| {
                rule.as_str().eq_ignore_ascii_case(s)
                    || rule.number().is_some_and(|n| n.to_string() == s)
            })
            .ok_or_else(|| format!("Unknown rule: {}", s))
    }
}

/// Class of a compliance message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// One message, tagged with the rule that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    /// `None` for messages about the request itself (an unknown rule id).
    pub rule: Option<RuleId>,
    pub severity: Severity,
    pub message: String,
}

/// Messages accumulated across rules, in the order they were found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Findings {
    current: Option<RuleId>,
    entries: Vec<Finding>,
}

impl Findings {
    /// Attribute the following messages to `rule`.
    pub fn begin(&mut self, rule: RuleId) {
        self.current = Some(rule);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(Severity::Error, message);
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.push(Severity::Warning, message);
    }

    pub fn push(&mut self, severity: Severity, message: impl Into<String>) {
        self.entries.push(Finding {
            rule: self.current,
            severity,
            message: message.into(),
        });
    }

    /// Messages of one severity, in order.
    pub fn messages(&self, severity: Severity) -> Vec<String> {
        messages(&self.entries, severity)
    }

    pub fn errors(&self) -> Vec<String> {
        self.messages(Severity::Error)
    }

    pub fn warnings(&self) -> Vec<String> {
        self.messages(Severity::Warning)
    }

    pub fn into_entries(self) -> Vec<Finding> {
        self.entries
    }
}

fn messages(entries: &[Finding], severity: Severity) -> Vec<String> {
    entries
        .iter()
        .filter(|f| f.severity == severity)
        .map(|f| f.message.clone())
        .collect()
}

/// What a rule gets to look at.
pub struct RuleContext<'a> {
    pub root: &'a Path,
    pub probe: &'a dyn LfsProbe,
    /// Files strictly larger than this must be LFS-tracked.
    pub large_file_bytes: u64,
}

/// Overall classification of a validation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Success,
    Degraded,
    Failed,
}

impl Outcome {
    pub fn exit_code(self) -> i32 {
        match self {
            Outcome::Success => 0,
            Outcome::Degraded => 1,
            Outcome::Failed => 2,
        }
    }
}

/// Result of a validation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Logical AND of every rule that ran.
    pub success: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    /// Rule id -> pass/fail, for every rule that ran.
    pub validation_results: BTreeMap<String, bool>,
    /// Every message with the rule it came from.
    #[serde(skip)]
    pub findings: Vec<Finding>,
}

impl ValidationReport {
    fn from_findings(validation_results: BTreeMap<String, bool>, findings: Findings) -> Self {
        let entries = findings.into_entries();
        Self {
            success: validation_results.values().all(|passed| *passed),
            errors: messages(&entries, Severity::Error),
            warnings: messages(&entries, Severity::Warning),
            validation_results,
            findings: entries,
        }
    }

    /// Whether `rule` produced any message of `severity`.
    pub fn has_findings(&self, rule: RuleId, severity: Severity) -> bool {
        self.findings
            .iter()
            .any(|f| f.rule == Some(rule) && f.severity == severity)
    }

    /// Classify the report. In strict mode warnings fail the run.
    pub fn outcome(&self, strict: bool) -> Outcome {
        if !self.success || !self.errors.is_empty() {
            Outcome::Failed
        } else if !self.warnings.is_empty() {
            if strict {
                Outcome::Failed
            } else {
                Outcome::Degraded
            }
        } else {
            Outcome::Success
        }
    }
}

/// Runs compliance rules over one workspace.
pub struct ComplianceEngine {
    root: PathBuf,
    probe: Box<dyn LfsProbe>,
    large_file_bytes: u64,
}

impl ComplianceEngine {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            probe: Box::new(GitLfs),
            large_file_bytes: DEFAULT_LARGE_FILE_BYTES,
        }
    }

    /// Replace the `git lfs` subprocess probe.
    pub fn with_probe(mut self, probe: Box<dyn LfsProbe>) -> Self {
        self.probe = probe;
        self
    }

    pub fn with_large_file_threshold(mut self, bytes: u64) -> Self {
        self.large_file_bytes = bytes;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Run every registered rule.
    pub fn run_all(&self) -> Result<ValidationReport> {
        self.run_rules(&RuleId::ALL)
    }

    /// Run the rule named by `selection`, or every rule when `None`.
    ///
    /// An unrecognized id is not an `Err`: it yields a failed report whose
    /// only error names the id.
    pub fn run(&self, selection: Option<&str>) -> Result<ValidationReport> {
        let Some(selection) = selection else {
            return self.run_all();
        };

        match selection.parse::<RuleId>() {
            Ok(rule) => self.run_rules(&[rule]),
            Err(message) => {
                ensure_readable_root(&self.root)?;
                tracing::debug!("{}", message);
                let mut findings = Findings::default();
                findings.error(message);
                let mut report = ValidationReport::from_findings(BTreeMap::new(), findings);
                report.success = false;
                Ok(report)
            }
        }
    }

    /// Run the given rules in order.
    pub fn run_rules(&self, rules: &[RuleId]) -> Result<ValidationReport> {
        ensure_readable_root(&self.root)?;

        let ctx = RuleContext {
            root: &self.root,
            probe: self.probe.as_ref(),
            large_file_bytes: self.large_file_bytes,
        };
        let mut findings = Findings::default();
        let mut validation_results = BTreeMap::new();

        for rule in rules {
            let start = Instant::now();
            findings.begin(*rule);
            let passed = (rule.check())(&ctx, &mut findings);
            tracing::debug!(
                "Rule {} {} in {:.1}ms",
                rule,
                if passed { "passed" } else { "failed" },
                start.elapsed().as_secs_f64() * 1000.0
            );
            validation_results.insert(rule.as_str().to_string(), passed);
        }

        let report = ValidationReport::from_findings(validation_results, findings);
        tracing::info!(
            "Validation finished: {} errors, {} warnings",
            report.errors.len(),
            report.warnings.len()
        );
        Ok(report)
    }
}
