//! Workspace skeleton checks: required layout and configuration templates.

use serde_json::Value;

use super::{Findings, RuleContext};
use crate::layout::CONFIGS_DIR;
use crate::loader::{parse_document, DocumentFormat};

/// Directories every workspace must have, with a human label.
pub const REQUIRED_DIRS: &[(&str, &str)] = &[
    ("configs", "Configuration files"),
    ("data", "Raw and processed data"),
    ("datasets", "Versioned datasets"),
    ("docs", "Documentation"),
    ("environments", "Environment definitions"),
    ("experiments", "Experiment definitions"),
    ("models", "Trained models"),
    ("runs", "Training runs"),
    ("scripts", "Utility scripts"),
    ("src", "Source code"),
    ("spaces", "Interactive spaces"),
    ("tools", "Workspace tooling"),
];

/// Files every workspace must have, relative to the root.
pub const REQUIRED_FILES: &[(&str, &str)] = &[
    ("README.md", "Project documentation"),
    (".gitignore", "Git ignore rules"),
    (".gitattributes", "Git attributes"),
    (".lfsconfig", "Git LFS configuration"),
    ("requirements.txt", "Runtime requirements"),
    ("requirements-dev.txt", "Development requirements"),
    ("requirements-gpu.txt", "GPU requirements"),
    ("environments/system.yaml", "System environment"),
];

/// Configuration templates under `configs/`.
pub const CONFIG_TEMPLATES: &[&str] = &[
    "datasets/base.yaml",
    "models/base.yaml",
    "training/base.yaml",
    "sweeps/base.yaml",
];

pub(super) fn check_layout(ctx: &RuleContext<'_>, findings: &mut Findings) -> bool {
    let mut ok = true;

    for (name, label) in REQUIRED_DIRS {
        let path = ctx.root.join(name);
        if !path.exists() {
            findings.error(format!("Required directory missing: {} ({})", label, name));
            ok = false;
        } else if !path.is_dir() {
            findings.error(format!(
                "Required path exists but is not a directory: {} ({})",
                label, name
            ));
            ok = false;
        }
    }

    for (name, label) in REQUIRED_FILES {
        if !ctx.root.join(name).is_file() {
            findings.error(format!("Required file missing: {} ({})", label, name));
            ok = false;
        }
    }

    ok
}

pub(super) fn check_schemas(ctx: &RuleContext<'_>, findings: &mut Findings) -> bool {
    let configs = ctx.root.join(CONFIGS_DIR);
    let mut ok = true;

    for template in CONFIG_TEMPLATES {
        let path = configs.join(template);
        if !path.is_file() {
            findings.error(format!("Missing configuration template: configs/{}", template));
            ok = false;
            continue;
        }

        match parse_document(&path, DocumentFormat::Yaml) {
            Ok(Value::Object(_)) => {}
            Ok(_) => {
                findings.error(format!("Invalid YAML structure in configs/{}", template));
                ok = false;
            }
            Err(e) => {
                findings.error(format!("Invalid YAML in configs/{}: {}", template, e));
                ok = false;
            }
        }
    }

    ok
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compliance::tests::FakeProbe;
    use crate::compliance::DEFAULT_LARGE_FILE_BYTES;
    use std::fs;
    use std::path::Path;
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

    fn scaffold(root: &Path) {
        for (name, _) in REQUIRED_DIRS {
            fs::create_dir_all(root.join(name)).unwrap();
        }
        for (name, _) in REQUIRED_FILES {
            fs::write(root.join(name), "").unwrap();
        }
    }

    #[test]
    fn test_layout_complete_workspace_passes() {
        let dir = TempDir::new().unwrap();
        scaffold(dir.path());

        let (ok, findings) = run(check_layout, dir.path());
        assert!(ok);
        assert!(findings.errors().is_empty());
    }

    #[test]
    fn test_layout_reports_each_missing_item() {
        let dir = TempDir::new().unwrap();
        let (ok, findings) = run(check_layout, dir.path());

        assert!(!ok);
        assert_eq!(
            findings.errors().len(),
            REQUIRED_DIRS.len() + REQUIRED_FILES.len()
        );
        assert!(findings
            .errors()
            .iter()
            .any(|e| e.starts_with("Required directory missing") && e.contains("(datasets)")));
        assert!(findings
            .errors()
            .iter()
            .any(|e| e.contains("(environments/system.yaml)")));
    }

    #[test]
    fn test_layout_file_in_place_of_directory() {
        let dir = TempDir::new().unwrap();
        scaffold(dir.path());
        fs::remove_dir_all(dir.path().join("tools")).unwrap();
        fs::write(dir.path().join("tools"), "not a dir").unwrap();

        let (ok, findings) = run(check_layout, dir.path());
        assert!(!ok);
        assert_eq!(findings.errors().len(), 1);
        assert!(findings.errors()[0].contains("not a directory"));
    }

    #[test]
    fn test_schemas() {
        let dir = TempDir::new().unwrap();
        let configs = dir.path().join("configs");
        for sub in ["datasets", "models", "training", "sweeps"] {
            fs::create_dir_all(configs.join(sub)).unwrap();
        }
        fs::write(configs.join("datasets/base.yaml"), "name: base\n").unwrap();
        fs::write(configs.join("models/base.yaml"), "- a\n- b\n").unwrap();
        fs::write(configs.join("training/base.yaml"), "lr: [0.1\n").unwrap();

        let (ok, findings) = run(check_schemas, dir.path());
        assert!(!ok);
        assert_eq!(findings.errors().len(), 3);
        assert!(findings.errors()[0].starts_with("Invalid YAML structure in configs/models"));
        assert!(findings.errors()[1].starts_with("Invalid YAML in configs/training/base.yaml: "));
        assert_eq!(
            findings.errors()[2],
            "Missing configuration template: configs/sweeps/base.yaml"
        );
    }

    #[test]
    fn test_schemas_all_present() {
        let dir = TempDir::new().unwrap();
        for template in CONFIG_TEMPLATES {
            let path = dir.path().join("configs").join(template);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, "key: value\n").unwrap();
        }

        let (ok, findings) = run(check_schemas, dir.path());
        assert!(ok);
        assert!(findings.errors().is_empty());
    }

    #[test]
    fn test_schemas_empty_templates_fail() {
        let dir = TempDir::new().unwrap();
        for template in CONFIG_TEMPLATES {
            let path = dir.path().join("configs").join(template);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, "").unwrap();
        }

        let (ok, findings) = run(check_schemas, dir.path());
        assert!(!ok);
        assert_eq!(
            findings.errors(),
            CONFIG_TEMPLATES
                .iter()
                .map(|t| format!("Invalid YAML structure in configs/{}", t))
                .collect::<Vec<_>>()
        );
    }
}
