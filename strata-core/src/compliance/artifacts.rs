//! Per-artifact checks for runs, dataset versions and model versions.
//!
//! Unlike the indexer, these rules load documents strictly so that a
//! malformed file turns into an error message carrying the parser detail.

use std::path::Path;

use serde_json::Value;

use super::{Findings, RuleContext};
use crate::layout::{self, DATASETS_DIR, MODELS_DIR, RUNS_DIR, SPLITS};
use crate::loader::{field, parse_document, value_text, DocumentFormat};
use crate::scanner::{list_artifact_dirs, list_entries, Entry};

/// Files every run directory must contain.
pub const RUN_FILES: &[(&str, &str)] = &[
    (layout::RUN_CONFIG_FILE, "Run configuration"),
    (layout::RUN_METRICS_FILE, "Run metrics"),
    (layout::RUN_SYSTEM_FILE, "System information"),
    (layout::RUN_LOG_FILE, "Training log"),
];

pub const RUN_CONFIG_FIELDS: &[&str] = &["run_id", "experiment", "model", "dataset"];

pub const DATASET_METADATA_FIELDS: &[&str] =
    &["name", "version", "created_at", "description", "source", "hash"];

/// Supplementary model files; absence is only a warning.
pub const MODEL_FILES: &[(&str, &str)] = &[
    (layout::MODEL_METADATA_FILE, "Model metadata"),
    (layout::MODEL_METRICS_FILE, "Model metrics"),
    (layout::MODEL_CARD_FILE, "Model card"),
];

pub const MODEL_METADATA_FIELDS: &[&str] = &[
    "name",
    "version",
    "created_at",
    "run_id",
    "dataset",
    "code",
    "framework",
];

pub(super) fn check_runs(ctx: &RuleContext<'_>, findings: &mut Findings) -> bool {
    let mut ok = true;

    for run in list_artifact_dirs(&ctx.root.join(RUNS_DIR)) {
        if !layout::is_run_dir(&run.name) {
            continue;
        }
        tracing::debug!("Checking run {}", run.name);
        ok &= check_run(&run, findings);
    }

    ok
}

fn check_run(run: &Entry, findings: &mut Findings) -> bool {
    let mut ok = true;

    for (file, label) in RUN_FILES {
        if !run.path.join(file).is_file() {
            findings.error(format!("Run {} missing {} ({})", run.name, label, file));
            ok = false;
        }
    }

    let config_path = run.path.join(layout::RUN_CONFIG_FILE);
    if config_path.is_file() {
        match parse_document(&config_path, DocumentFormat::Yaml) {
            Ok(config @ Value::Object(_)) => {
                for key in RUN_CONFIG_FIELDS {
                    if field(&config, key).is_none() {
                        findings.error(format!("Run {} config missing field: {}", run.name, key));
                        ok = false;
                    }
                }
            }
            Ok(_) => {
                findings.error(format!("Run {} config is not a mapping", run.name));
                ok = false;
            }
            Err(e) => {
                findings.error(format!("Invalid YAML in run config {}: {}", run.name, e));
                ok = false;
            }
        }
    }

    let metrics_path = run.path.join(layout::RUN_METRICS_FILE);
    if metrics_path.is_file() {
        match parse_document(&metrics_path, DocumentFormat::Json) {
            Ok(Value::Object(_)) => {}
            Ok(_) => {
                findings.error(format!(
                    "Run {} {} is not a valid JSON object",
                    run.name,
                    layout::RUN_METRICS_FILE
                ));
                ok = false;
            }
            Err(e) => {
                findings.error(format!("Invalid JSON in run metrics {}: {}", run.name, e));
                ok = false;
            }
        }
    }

    ok
}

pub(super) fn check_datasets(ctx: &RuleContext<'_>, findings: &mut Findings) -> bool {
    let mut ok = true;

    for dataset in list_artifact_dirs(&ctx.root.join(DATASETS_DIR)) {
        for version in list_artifact_dirs(&dataset.path) {
            let id = format!("{}/{}", dataset.name, version.name);
            tracing::debug!("Checking dataset {}", id);
            ok &= check_dataset_version(&id, &version.path, findings);
        }
    }

    ok
}

fn check_dataset_version(id: &str, dir: &Path, findings: &mut Findings) -> bool {
    for split in SPLITS {
        if !dir.join(split).is_dir() {
            findings.warning(format!("Dataset {} missing {} split", id, split));
        }
    }

    let metadata_path = dir.join(layout::DATASET_METADATA_FILE);
    if !metadata_path.is_file() {
        findings.error(format!(
            "Dataset {} missing {}",
            id,
            layout::DATASET_METADATA_FILE
        ));
        return false;
    }

    match parse_document(&metadata_path, DocumentFormat::Yaml) {
        Ok(metadata @ Value::Object(_)) => {
            check_metadata("Dataset", id, &metadata, DATASET_METADATA_FIELDS, findings)
        }
        Ok(_) => {
            findings.error(format!("Dataset {} metadata is not a mapping", id));
            false
        }
        Err(e) => {
            findings.error(format!("Invalid YAML in dataset metadata {}: {}", id, e));
            false
        }
    }
}

pub(super) fn check_models(ctx: &RuleContext<'_>, findings: &mut Findings) -> bool {
    let mut ok = true;

    for model in list_artifact_dirs(&ctx.root.join(MODELS_DIR)) {
        for version in list_artifact_dirs(&model.path) {
            let id = format!("{}/{}", model.name, version.name);
            tracing::debug!("Checking model {}", id);
            ok &= check_model_version(&id, &version.path, findings);
        }
    }

    ok
}

fn check_model_version(id: &str, dir: &Path, findings: &mut Findings) -> bool {
    for (file, label) in MODEL_FILES {
        if !dir.join(file).is_file() {
            findings.warning(format!("Model {} missing {} ({})", id, label, file));
        }
    }

    let has_artifact = list_entries(dir)
        .iter()
        .any(|e| !e.is_dir && e.path.is_file() && layout::is_model_artifact(&e.path));
    if !has_artifact {
        findings.warning(format!("Model {} has no recognized model artifact", id));
    }

    let metadata_path = dir.join(layout::MODEL_METADATA_FILE);
    if !metadata_path.is_file() {
        return true;
    }

    match parse_document(&metadata_path, DocumentFormat::Yaml) {
        Ok(metadata @ Value::Object(_)) => {
            check_metadata("Model", id, &metadata, MODEL_METADATA_FIELDS, findings)
        }
        Ok(_) => {
            findings.error(format!("Model {} metadata is not a mapping", id));
            false
        }
        Err(e) => {
            findings.error(format!("Invalid YAML in model metadata {}: {}", id, e));
            false
        }
    }
}

/// Required fields plus the version-tag format shared by datasets and models.
fn check_metadata(
    kind: &str,
    id: &str,
    metadata: &Value,
    required: &[&str],
    findings: &mut Findings,
) -> bool {
    let mut ok = true;

    for key in required {
        if field(metadata, key).is_none() {
            findings.error(format!("{} {} metadata missing field: {}", kind, id, key));
            ok = false;
        }
    }

    // A non-string version (e.g. `version: 1`) is never a valid tag.
    let version = field(metadata, "version");
    if !version.and_then(Value::as_str).is_some_and(layout::is_version_tag) {
        findings.error(format!(
            "{} {} has invalid version format: {}",
            kind,
            id,
            version.map(value_text).unwrap_or_default()
        ));
        ok = false;
    }

    ok
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compliance::tests::FakeProbe;
    use crate::compliance::DEFAULT_LARGE_FILE_BYTES;
    use std::fs;
    use tempfile::TempDir;

    fn run(rule: fn(&RuleContext<'_>, &mut Findings) -> bool, root: &Path) -> (bool, Findings) {
        let probe = FakeProbe::installed();
        let ctx = RuleContext {
            root,
            probe: &probe,
            large_file_bytes: DEFAULT_LARGE_FILE_BYTES,
        };
        let mut findings = Findings::default();
        let ok = rule(&ctx, &mut findings);
        (ok, findings)
    }

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn complete_run(dir: &Path) {
        write(
            &dir.join("config.yaml"),
            "run_id: run-2024-01-01-001\nexperiment: baseline\nmodel: clf\ndataset: iris\n",
        );
        write(&dir.join("metrics.json"), r#"{"summary": {"accuracy": 0.9}}"#);
        write(&dir.join("system.json"), r#"{"os": "linux"}"#);
        write(&dir.join("log.txt"), "epoch 1\n");
    }

    #[test]
    fn test_runs_complete_passes() {
        let dir = TempDir::new().unwrap();
        complete_run(&dir.path().join("runs/run-2024-01-01-001"));

        let (ok, findings) = run(check_runs, dir.path());
        assert!(ok);
        assert!(findings.errors().is_empty());
    }

    #[test]
    fn test_runs_ignores_non_run_dirs() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("runs/scratch")).unwrap();
        fs::write(dir.path().join("runs/README.md"), "# runs").unwrap();

        let (ok, findings) = run(check_runs, dir.path());
        assert!(ok);
        assert!(findings.errors().is_empty());
    }

    #[test]
    fn test_runs_config_fields_and_metrics_shape() {
        let dir = TempDir::new().unwrap();
        let run_dir = dir.path().join("runs/run-2024-02-01-001");
        complete_run(&run_dir);
        write(&run_dir.join("config.yaml"), "experiment: baseline\nmodel: clf\n");
        write(&run_dir.join("metrics.json"), "[0.1, 0.2]");

        let (ok, findings) = run(check_runs, dir.path());
        assert!(!ok);
        assert_eq!(
            findings.errors(),
            vec![
                "Run run-2024-02-01-001 config missing field: run_id".to_string(),
                "Run run-2024-02-01-001 config missing field: dataset".to_string(),
                "Run run-2024-02-01-001 metrics.json is not a valid JSON object".to_string(),
            ]
        );
    }

    #[test]
    fn test_runs_malformed_documents() {
        let dir = TempDir::new().unwrap();
        let run_dir = dir.path().join("runs/run-2024-03-01-001");
        complete_run(&run_dir);
        write(&run_dir.join("config.yaml"), "model: [unclosed");
        write(&run_dir.join("metrics.json"), "{not json");

        let (ok, findings) = run(check_runs, dir.path());
        assert!(!ok);
        assert_eq!(findings.errors().len(), 2);
        assert!(findings.errors()[0].starts_with("Invalid YAML in run config run-2024-03-01-001: "));
        assert!(findings.errors()[1].starts_with("Invalid JSON in run metrics run-2024-03-01-001: "));
    }

    #[test]
    fn test_datasets_missing_splits_warn() {
        let dir = TempDir::new().unwrap();
        let version = dir.path().join("datasets/iris/v1");
        fs::create_dir_all(version.join("train")).unwrap();
        write(
            &version.join("metadata.yaml"),
            "name: iris\nversion: v1\ncreated_at: 2024-01-01\ndescription: flowers\nsource: uci\nhash: abc\n",
        );

        let (ok, findings) = run(check_datasets, dir.path());
        assert!(ok);
        assert!(findings.errors().is_empty());
        assert_eq!(
            findings.warnings(),
            vec![
                "Dataset iris/v1 missing val split".to_string(),
                "Dataset iris/v1 missing test split".to_string(),
            ]
        );
    }

    #[test]
    fn test_datasets_metadata_errors() {
        let dir = TempDir::new().unwrap();
        let base = dir.path().join("datasets/iris");
        for split in SPLITS {
            fs::create_dir_all(base.join("v1").join(split)).unwrap();
            fs::create_dir_all(base.join("v2").join(split)).unwrap();
        }
        write(&base.join("v2/metadata.yaml"), "name: iris\nversion: 2\n");

        let (ok, findings) = run(check_datasets, dir.path());
        assert!(!ok);
        assert!(findings.warnings().is_empty());
        assert_eq!(findings.errors()[0], "Dataset iris/v1 missing metadata.yaml");
        assert!(findings
            .errors()
            .contains(&"Dataset iris/v2 metadata missing field: hash".to_string()));
        assert_eq!(
            findings.errors().last().unwrap(),
            "Dataset iris/v2 has invalid version format: 2"
        );
    }

    #[test]
    fn test_models_supplementary_files_warn() {
        let dir = TempDir::new().unwrap();
        let version = dir.path().join("models/clf/v1");
        write(&version.join("model.pt"), "weights");

        let (ok, findings) = run(check_models, dir.path());
        assert!(ok);
        assert!(findings.errors().is_empty());
        assert_eq!(findings.warnings().len(), 3);
        assert!(findings.warnings()[0].contains("metadata.yaml"));
    }

    #[test]
    fn test_models_no_artifact_and_bad_metadata() {
        let dir = TempDir::new().unwrap();
        let version = dir.path().join("models/clf/v1");
        write(&version.join("metrics.yaml"), "accuracy: 0.9\n");
        write(&version.join("card.md"), "# clf\n");
        write(&version.join("metadata.yaml"), "name: clf\nversion: one\n");

        let (ok, findings) = run(check_models, dir.path());
        assert!(!ok);
        assert_eq!(
            findings.warnings(),
            vec!["Model clf/v1 has no recognized model artifact".to_string()]
        );
        assert!(findings
            .errors()
            .contains(&"Model clf/v1 metadata missing field: framework".to_string()));
        assert!(findings
            .errors()
            .contains(&"Model clf/v1 has invalid version format: one".to_string()));
    }

    #[test]
    fn test_models_artifact_must_be_a_file() {
        let dir = TempDir::new().unwrap();
        let version = dir.path().join("models/clf/v1");
        fs::create_dir_all(version.join("checkpoint.pt")).unwrap();
        write(&version.join("card.md"), "# clf\n");

        let (_, findings) = run(check_models, dir.path());
        assert!(findings
            .warnings()
            .contains(&"Model clf/v1 has no recognized model artifact".to_string()));

        write(&version.join("model.onnx"), "weights");
        let (_, findings) = run(check_models, dir.path());
        assert!(!findings
            .warnings()
            .iter()
            .any(|w| w.contains("no recognized model artifact")));
    }
}
