//! StrataML configuration loading from `.stratarc.toml`.
//!
//! The config file lives at the workspace root and is optional. A missing or
//! broken file falls back to defaults; command-line flags always win.
//!
//! # Example Configuration
//!
//! ```toml
//! [output]
//! format = "json"
//! color = false
//!
//! [doctor]
//! strict = true
//! large_file_mb = 5
//! ```

use serde::Deserialize;
use std::path::Path;

/// Name of the config file at the workspace root.
pub const CONFIG_FILE: &str = ".stratarc.toml";

/// Root configuration structure loaded from `.stratarc.toml`.
///
/// All sections are optional and will use defaults if not specified.
#[derive(Debug, Deserialize, Default)]
pub struct StrataConfig {
    /// Output formatting preferences.
    #[serde(default)]
    pub output: OutputSettings,

    /// Defaults for `strataml doctor`.
    #[serde(default)]
    pub doctor: DoctorSettings,
}

/// Output formatting preferences.
///
/// Command-line flags (e.g., `--format json`) override these settings.
#[derive(Debug, Deserialize, Default)]
pub struct OutputSettings {
    /// Default output format: `table` or `json`.
    #[serde(default)]
    pub format: Option<String>,

    /// Whether to use colored output. Auto-detected when unset.
    #[serde(default)]
    pub color: Option<bool>,
}

/// Compliance check settings.
#[derive(Debug, Deserialize, Default)]
pub struct DoctorSettings {
    /// Treat warnings as failures.
    #[serde(default)]
    pub strict: bool,

    /// Size above which an LFS-eligible file must be tracked, in MiB.
    #[serde(default)]
    pub large_file_mb: Option<u64>,
}

impl StrataConfig {
    /// Load configuration from `.stratarc.toml` in the given directory.
    ///
    /// If the config file doesn't exist or can't be parsed, returns defaults.
    /// Parse errors are logged as warnings but don't cause failures.
    pub fn load(root: &Path) -> Self {
        let config_path = root.join(CONFIG_FILE);
        if config_path.exists() {
            match std::fs::read_to_string(&config_path) {
                Ok(content) => match toml::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Failed to parse {}: {}", CONFIG_FILE, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read {}: {}", CONFIG_FILE, e);
                }
            }
        }
        Self::default()
    }

    /// Get the default output format, if configured.
    pub fn default_format(&self) -> Option<&str> {
        self.output.format.as_deref()
    }

    /// Returns the configured value, or `None` to use auto-detection.
    pub fn use_color(&self) -> Option<bool> {
        self.output.color
    }

    pub fn strict(&self) -> bool {
        self.doctor.strict
    }

    /// Large-file threshold in bytes, if configured.
    pub fn large_file_bytes(&self) -> Option<u64> {
        self.doctor
            .large_file_mb
            .map(|mb| mb.saturating_mul(1024 * 1024))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = StrataConfig::default();
        assert!(config.output.format.is_none());
        assert!(config.use_color().is_none());
        assert!(!config.strict());
        assert!(config.large_file_bytes().is_none());
    }

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
[output]
format = "json"
color = false

[doctor]
strict = true
large_file_mb = 5
"#;
        let config: StrataConfig = toml::from_str(toml_content).unwrap();

        assert_eq!(config.default_format(), Some("json"));
        assert_eq!(config.use_color(), Some(false));
        assert!(config.strict());
        assert_eq!(config.large_file_bytes(), Some(5 * 1024 * 1024));
    }

    #[test]
    fn test_partial_config() {
        let config: StrataConfig = toml::from_str("[doctor]\nstrict = true\n").unwrap();
        assert!(config.strict());
        assert!(config.default_format().is_none());
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let config = StrataConfig::load(dir.path());
        assert!(config.default_format().is_none());
    }

    #[test]
    fn test_load_invalid_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "[output\nformat = ").unwrap();

        let config = StrataConfig::load(dir.path());
        assert!(config.default_format().is_none());
        assert!(!config.strict());
    }

    #[test]
    fn test_load_from_disk() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "[output]\nformat = \"json\"\n").unwrap();

        let config = StrataConfig::load(dir.path());
        assert_eq!(config.default_format(), Some("json"));
    }
}
