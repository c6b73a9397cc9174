//! Large-file tracking checks.
//!
//! The only rule that leaves the process: it asks `git lfs` whether it is
//! installed and whether each large file is tracked. Both questions go
//! through [`LfsProbe`] so the rule can run against a fake in tests.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;

use ignore::WalkBuilder;

use super::{Findings, RuleContext};
use crate::error::ProbeError;
use crate::scanner::relative_path;

/// Files strictly larger than this (1 MiB) should be tracked by LFS.
pub const DEFAULT_LARGE_FILE_BYTES: u64 = 1024 * 1024;

/// Extensions of files expected to live in LFS.
pub const LFS_EXTENSIONS: &[&str] = &[
    "pth", "pt", "pkl", "h5", "hdf5", "onnx", "pb", "png", "jpg", "jpeg", "csv", "parquet",
];

const GITATTRIBUTES: &str = ".gitattributes";
const LFS_FILTER: &str = "filter=lfs";

/// Questions the LFS rule asks of git.
pub trait LfsProbe {
    /// Version string of the LFS extension; fails when it is unavailable.
    fn version(&self, root: &Path) -> Result<String, ProbeError>;

    /// Whether `relative` (relative to `root`) is tracked by LFS.
    fn is_tracked(&self, root: &Path, relative: &Path) -> Result<bool, ProbeError>;
}

/// Probe backed by the `git lfs` subcommand.
#[derive(Debug, Clone, Copy, Default)]
pub struct GitLfs;

impl GitLfs {
    fn git(root: &Path, args: &[&str]) -> Result<String, ProbeError> {
        let output = Command::new("git")
            .args(args)
            .current_dir(root)
            .output()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => ProbeError::NotInstalled,
                _ => ProbeError::Failed(e.to_string()),
            })?;

        if !output.status.success() {
            return Err(ProbeError::Failed(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

impl LfsProbe for GitLfs {
    fn version(&self, root: &Path) -> Result<String, ProbeError> {
        // `git lfs` without the extension installed exits non-zero.
        Self::git(root, &["lfs", "version"]).map_err(|e| match e {
            ProbeError::Failed(_) => ProbeError::NotInstalled,
            other => other,
        })
    }

    fn is_tracked(&self, root: &Path, relative: &Path) -> Result<bool, ProbeError> {
        let relative = relative.to_string_lossy().into_owned();
        let listed = Self::git(
            root,
            &["lfs", "ls-files", "--name-only", "--include", relative.as_str()],
        )?;
        Ok(!listed.is_empty())
    }
}

pub(super) fn check_lfs(ctx: &RuleContext<'_>, findings: &mut Findings) -> bool {
    match ctx.probe.version(ctx.root) {
        Ok(version) => tracing::debug!("Using {}", version),
        Err(e) => {
            findings.error(e.to_string());
            return false;
        }
    }

    let attributes = match std::fs::read_to_string(ctx.root.join(GITATTRIBUTES)) {
        Ok(content) => content,
        Err(_) => {
            findings.error("Missing .gitattributes file for LFS configuration");
            return false;
        }
    };
    if !attributes.contains(LFS_FILTER) {
        findings.warning("No LFS filters found in .gitattributes");
    }

    for path in large_files(ctx.root, ctx.large_file_bytes) {
        let relative = PathBuf::from(relative_path(ctx.root, &path));
        let tracked = ctx.probe.is_tracked(ctx.root, &relative).unwrap_or_else(|e| {
            tracing::debug!("LFS lookup failed for {}: {}", relative.display(), e);
            false
        });
        if !tracked {
            findings.warning(format!(
                "Large file not tracked by LFS: {}",
                relative.display()
            ));
        }
    }

    true
}

/// Files under `root` with an LFS extension and more than `threshold` bytes.
///
/// Honors `.gitignore` and never descends into `.git`. Sorted by path.
pub fn large_files(root: &Path, threshold: u64) -> Vec<PathBuf> {
    let mut builder = WalkBuilder::new(root);
    builder
        .hidden(false)
        .git_ignore(true)
        .git_global(false)
        .git_exclude(true)
        .filter_entry(|entry| entry.file_name() != ".git");

    let mut files: Vec<PathBuf> = builder
        .build()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|ft| ft.is_file()).unwrap_or(false))
        .filter(|entry| {
            entry
                .path()
                .extension()
                .and_then(|e| e.to_str())
                .map(|ext| LFS_EXTENSIONS.contains(&ext))
                .unwrap_or(false)
        })
        .filter(|entry| {
            entry
                .metadata()
                .map(|m| m.len() > threshold)
                .unwrap_or(false)
        })
        .map(|entry| entry.into_path())
        .collect();

    files.sort();
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compliance::tests::FakeProbe;
    use std::fs;
    use tempfile::TempDir;

    fn run(root: &Path, probe: &FakeProbe, threshold: u64) -> (bool, Findings) {
        let ctx = RuleContext {
            root,
            probe,
            large_file_bytes: threshold,
        };
        let mut findings = Findings::default();
        let ok = check_lfs(&ctx, &mut findings);
        (ok, findings)
    }

    #[test]
    fn test_lfs_not_installed_is_error() {
        let dir = TempDir::new().unwrap();
        let probe = FakeProbe {
            installed: false,
            tracked: Vec::new(),
        };

        let (ok, findings) = run(dir.path(), &probe, DEFAULT_LARGE_FILE_BYTES);
        assert!(!ok);
        assert_eq!(
            findings.errors(),
            vec!["Git LFS is not installed or not configured".to_string()]
        );
    }

    #[test]
    fn test_lfs_missing_gitattributes() {
        let dir = TempDir::new().unwrap();
        let (ok, findings) = run(dir.path(), &FakeProbe::installed(), DEFAULT_LARGE_FILE_BYTES);
        assert!(!ok);
        assert_eq!(findings.errors().len(), 1);
        assert!(findings.errors()[0].contains(".gitattributes"));
    }

    #[test]
    fn test_lfs_without_filters_warns() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(".gitattributes"), "*.txt text\n").unwrap();

        let (ok, findings) = run(dir.path(), &FakeProbe::installed(), DEFAULT_LARGE_FILE_BYTES);
        assert!(ok);
        assert!(findings.errors().is_empty());
        assert_eq!(findings.warnings(), vec!["No LFS filters found in .gitattributes".to_string()]);
    }

    #[test]
    fn test_lfs_untracked_large_files_warn() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(".gitattributes"),
            "*.pt filter=lfs diff=lfs merge=lfs -text\n",
        )
        .unwrap();
        fs::create_dir_all(dir.path().join("models/clf/v1")).unwrap();
        fs::create_dir_all(dir.path().join("data")).unwrap();
        let big = vec![0u8; 64];
        fs::write(dir.path().join("models/clf/v1/model.pt"), &big).unwrap();
        fs::write(dir.path().join("data/train.csv"), &big).unwrap();
        fs::write(dir.path().join("data/notes.txt"), &big).unwrap();
        fs::write(dir.path().join("data/small.csv"), b"a,b").unwrap();

        let probe = FakeProbe {
            installed: true,
            tracked: vec!["models/clf/v1/model.pt".to_string()],
        };
        let (ok, findings) = run(dir.path(), &probe, 32);

        assert!(ok);
        assert!(findings.errors().is_empty());
        assert_eq!(
            findings.warnings(),
            vec!["Large file not tracked by LFS: data/train.csv".to_string()]
        );
    }

    #[test]
    fn test_large_files_sorted_and_skip_git_dir() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join(".git/lfs")).unwrap();
        fs::create_dir_all(dir.path().join("b")).unwrap();
        fs::create_dir_all(dir.path().join("a")).unwrap();
        let big = vec![1u8; 16];
        fs::write(dir.path().join(".git/lfs/blob.pt"), &big).unwrap();
        fs::write(dir.path().join("b/x.png"), &big).unwrap();
        fs::write(dir.path().join("a/y.png"), &big).unwrap();

        let files = large_files(dir.path(), 8);
        assert_eq!(
            files,
            vec![dir.path().join("a/y.png"), dir.path().join("b/x.png")]
        );
    }
}
