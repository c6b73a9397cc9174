//! Doctor command - Compliance check for a StrataML workspace
//!
//! Runs the compliance rules (all of them, or the one named by `--rule`) and
//! reports per-rule status, errors and warnings. The process exit code
//! reflects the outcome:
//! - 0: every rule passed without warnings
//! - 1: warnings only (non-strict)
//! - 2: any error, or any warning in strict mode

use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use strata_core::compliance::{ComplianceEngine, Outcome, RuleId, Severity, ValidationReport};

use super::workspace_root;
use crate::output::{Output, OutputFormat, TableDisplay};

/// Status of a single rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckStatus {
    fn colored_icon(&self) -> String {
        match self {
            CheckStatus::Ok => "[OK]".green().to_string(),
            CheckStatus::Warning => "[!!]".yellow().to_string(),
            CheckStatus::Error => "[!!]".red().to_string(),
        }
    }
}

/// A single rule's line in the report
#[derive(Debug, Clone, Serialize)]
pub struct CheckItem {
    pub status: CheckStatus,
    pub rule: String,
    pub label: String,
}

/// Result of a doctor run
#[derive(Debug, Serialize)]
pub struct DoctorResult {
    pub outcome: Outcome,
    pub strict: bool,
    #[serde(flatten)]
    pub report: ValidationReport,
    #[serde(skip)]
    pub checks: Vec<CheckItem>,
}

impl DoctorResult {
    pub fn new(report: ValidationReport, strict: bool) -> Self {
        let checks = report
            .validation_results
            .iter()
            .map(|(rule, passed)| {
                let parsed = rule.parse::<RuleId>().ok();
                let status = match (*passed, parsed) {
                    (false, _) => CheckStatus::Error,
                    (true, Some(id)) if report.has_findings(id, Severity::Warning) => {
                        CheckStatus::Warning
                    }
                    (true, _) => CheckStatus::Ok,
                };
                CheckItem {
                    status,
                    rule: rule.clone(),
                    label: parsed.map(RuleId::description).unwrap_or_default().to_string(),
                }
            })
            .collect();

        Self {
            outcome: report.outcome(strict),
            strict,
            report,
            checks,
        }
    }
}

impl TableDisplay for DoctorResult {
    fn to_table(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("{}\n", "StrataML Workspace Check".cyan().bold()));
        output.push_str(&format!("{}\n", "\u{2500}".repeat(40).dimmed()));

        for check in &self.checks {
            output.push_str(&format!(
                "{} {:<9} {}\n",
                check.status.colored_icon(),
                check.rule,
                check.label.dimmed()
            ));
        }

        if !self.report.errors.is_empty() {
            output.push_str(&format!("\n{}\n", "Errors:".red().bold()));
            for error in &self.report.errors {
                output.push_str(&format!("  - {}\n", error));
            }
        }

        if !self.report.warnings.is_empty() {
            output.push_str(&format!("\n{}\n", "Warnings:".yellow().bold()));
            for warning in &self.report.warnings {
                output.push_str(&format!("  - {}\n", warning));
            }
        }

        let verdict = match self.outcome {
            Outcome::Success => "All checks passed".green().bold(),
            Outcome::Degraded => "Passed with warnings".yellow().bold(),
            Outcome::Failed => "Checks failed".red().bold(),
        };
        output.push_str(&format!("\n{}", verdict));
        if self.strict {
            output.push_str(&format!(" {}", "(strict)".dimmed()));
        }

        output
    }
}

/// Run the doctor command and return the process exit code.
pub fn run(
    path: &str,
    rule: Option<&str>,
    strict: bool,
    large_file_bytes: Option<u64>,
    format: OutputFormat,
) -> Result<i32> {
    let root = workspace_root(path);

    let mut engine = ComplianceEngine::new(&root);
    if let Some(bytes) = large_file_bytes {
        engine = engine.with_large_file_threshold(bytes);
    }

    let report = engine
        .run(rule)
        .with_context(|| format!("Failed to check {}", root.display()))?;

    let result = DoctorResult::new(report, strict);
    let code = result.outcome.exit_code();
    Output::new(result, format).render()?;
    Ok(code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use strata_core::compliance::Finding;

    type Message<'a> = (RuleId, &'a str);

    fn report(
        results: &[(&str, bool)],
        errors: &[Message<'_>],
        warnings: &[Message<'_>],
    ) -> ValidationReport {
        ValidationReport {
            success: results.iter().all(|(_, ok)| *ok) && errors.is_empty(),
            errors: errors.iter().map(|(_, m)| m.to_string()).collect(),
            warnings: warnings.iter().map(|(_, m)| m.to_string()).collect(),
            validation_results: results
                .iter()
                .map(|(id, ok)| (id.to_string(), *ok))
                .collect::<BTreeMap<_, _>>(),
            findings: [
                tagged(Severity::Error, errors),
                tagged(Severity::Warning, warnings),
            ]
            .concat(),
        }
    }

    fn tagged(severity: Severity, messages: &[Message<'_>]) -> Vec<Finding> {
        messages
            .iter()
            .map(|(rule, message)| Finding {
                rule: Some(*rule),
                severity,
                message: message.to_string(),
            })
            .collect()
    }

    #[test]
    fn test_check_statuses() {
        let result = DoctorResult::new(
            report(
                &[("datasets", true), ("runs", false), ("layout", true)],
                &[(RuleId::Runs, "Run run-2024-01-01-001 missing Run metrics (metrics.json)")],
                &[(RuleId::Datasets, "Dataset iris/v1 missing test split")],
            ),
            false,
        );

        let status: Vec<(&str, CheckStatus)> = result
            .checks
            .iter()
            .map(|c| (c.rule.as_str(), c.status))
            .collect();
        assert_eq!(
            status,
            vec![
                ("datasets", CheckStatus::Warning),
                ("layout", CheckStatus::Ok),
                ("runs", CheckStatus::Error),
            ]
        );
        assert_eq!(result.outcome, Outcome::Failed);
    }

    #[test]
    fn test_warnings_follow_their_rule() {
        let result = DoctorResult::new(
            report(
                &[("datasets", true), ("lfs", true), ("models", true)],
                &[],
                &[(RuleId::Lfs, "Dataset-sized file not tracked by LFS: data/big.csv")],
            ),
            false,
        );

        let warned: Vec<&str> = result
            .checks
            .iter()
            .filter(|c| c.status == CheckStatus::Warning)
            .map(|c| c.rule.as_str())
            .collect();
        assert_eq!(warned, vec!["lfs"]);
    }

    #[test]
    fn test_strict_turns_warnings_into_failure() {
        let warn_only = report(
            &[("models", true)],
            &[],
            &[(RuleId::Models, "Model clf/v1 missing Model card (card.md)")],
        );
        assert_eq!(DoctorResult::new(warn_only.clone(), false).outcome, Outcome::Degraded);
        assert_eq!(DoctorResult::new(warn_only, true).outcome, Outcome::Failed);
    }

    #[test]
    fn test_json_keeps_report_contract() {
        let result = DoctorResult::new(report(&[("runs", true)], &[], &[]), false);
        let value = serde_json::to_value(&result).unwrap();

        assert_eq!(value["success"], serde_json::json!(true));
        assert_eq!(value["outcome"], serde_json::json!("success"));
        assert_eq!(value["validation_results"]["runs"], serde_json::json!(true));
        assert!(value.get("checks").is_none());
    }

    #[test]
    fn test_table_lists_messages() {
        colored::control::set_override(false);
        let result = DoctorResult::new(
            report(
                &[("runs", false)],
                &[(RuleId::Runs, "Run run-1 missing Training log (log.txt)")],
                &[],
            ),
            false,
        );
        let table = TableDisplay::to_table(&result);
        assert!(table.contains("[!!] runs"));
        assert!(table.contains("Run run-1 missing Training log (log.txt)"));
        assert!(table.contains("Checks failed"));
    }
}
