//! Output formatting module for the StrataML CLI
//!
//! Provides unified output formatting across all commands with support for
//! table (human-readable) and json (machine-readable) output.
//!
//! Automatically detects TTY context to adjust truncation behavior.

use clap::ValueEnum;
use serde::Serialize;
use std::io::IsTerminal;
use std::str::FromStr;

mod json;
mod table;

pub use self::json::JsonOutput;
pub use self::table::TableOutput;

/// Output format for CLI results
#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable table format (default)
    #[default]
    Table,
    /// JSON format for machine consumption
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown output format: '{}'", s)),
        }
    }
}

/// Configuration for output rendering
#[derive(Debug, Clone)]
pub struct OutputConfig {
    /// The output format to use
    pub format: OutputFormat,
    /// Disable truncation of long values
    pub no_truncate: bool,
    /// Override terminal width (None = auto-detect)
    pub width: Option<usize>,
}

impl OutputConfig {
    /// Create an OutputConfig with automatic TTY detection
    ///
    /// Truncation is disabled when output is piped or redirected.
    pub fn auto_detect(format: OutputFormat) -> Self {
        Self {
            format,
            no_truncate: !std::io::stdout().is_terminal(),
            width: None,
        }
    }

    /// Get the effective terminal width
    pub fn effective_width(&self) -> usize {
        self.width.unwrap_or_else(|| {
            terminal_size::terminal_size()
                .map(|(w, _)| w.0 as usize)
                .unwrap_or(80)
        })
    }

    /// Check if truncation should be applied
    pub fn should_truncate(&self) -> bool {
        !self.no_truncate
    }
}

/// Column definition for table output
#[derive(Debug, Clone)]
pub struct Column {
    /// Display name for the column header
    pub name: String,
    /// Key used to extract data from the serialized row
    pub key: String,
    /// Maximum width for this column (None = no limit)
    pub max_width: Option<usize>,
    /// Alignment for the column content
    pub align: Alignment,
}

impl Column {
    /// Create a new column with default settings
    pub fn new(name: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key: key.into(),
            max_width: None,
            align: Alignment::Left,
        }
    }

    /// Builder: set maximum width
    pub fn with_max_width(mut self, width: usize) -> Self {
        self.max_width = Some(width);
        self
    }

    /// Builder: set alignment
    pub fn with_alignment(mut self, align: Alignment) -> Self {
        self.align = align;
        self
    }
}

/// Text alignment for columns
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Alignment {
    #[default]
    Left,
    Right,
}

/// Trait for types that can be formatted as output
pub trait Outputter: Serialize + Sized {
    /// Render as table format
    fn to_table(&self, config: &OutputConfig) -> String;

    /// Render as JSON format
    fn to_json(&self, _config: &OutputConfig) -> String {
        JsonOutput::format(self)
    }

    /// Render using the format specified in config
    fn render(&self, config: &OutputConfig) -> String {
        match config.format {
            OutputFormat::Table => self.to_table(config),
            OutputFormat::Json => self.to_json(config),
        }
    }
}

/// Result wrapper for formatted output with automatic format selection
pub struct Output<T> {
    data: T,
    config: OutputConfig,
}

impl<T: Outputter> Output<T> {
    /// Create a new output wrapper with specified format
    pub fn new(data: T, format: OutputFormat) -> Self {
        Self {
            data,
            config: OutputConfig::auto_detect(format),
        }
    }

    /// Render the output to stdout
    pub fn render(&self) -> anyhow::Result<()> {
        println!("{}", self.render_to_string());
        Ok(())
    }

    /// Get the rendered string without printing
    pub fn render_to_string(&self) -> String {
        self.data.render(&self.config)
    }
}

/// Types whose table rendering needs no config (status blocks, reports)
pub trait TableDisplay: Serialize {
    /// Convert to table format string
    fn to_table(&self) -> String;
}

impl<T: TableDisplay + Serialize> Outputter for T {
    fn to_table(&self, _config: &OutputConfig) -> String {
        TableDisplay::to_table(self)
    }
}

/// Truncate a string to a maximum width (in characters) with ellipsis
pub fn truncate(s: &str, max_width: usize) -> String {
    if s.chars().count() <= max_width {
        s.to_string()
    } else if max_width <= 3 {
        s.chars().take(max_width).collect()
    } else {
        let truncated: String = s.chars().take(max_width - 3).collect();
        format!("{}...", truncated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_string() {
        assert_eq!(truncate("hello", 10), "hello");
    }

    #[test]
    fn test_truncate_long_string() {
        assert_eq!(truncate("hello world", 8), "hello...");
    }

    #[test]
    fn test_truncate_exact_length() {
        assert_eq!(truncate("hello", 5), "hello");
    }

    #[test]
    fn test_truncate_multibyte() {
        assert_eq!(truncate("ééééé", 5), "ééééé");
        assert_eq!(truncate("éééééé", 5), "éé...");
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!("JSON".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert_eq!("table".parse::<OutputFormat>(), Ok(OutputFormat::Table));
        assert!("csv".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_output_config_auto_detect() {
        let config = OutputConfig::auto_detect(OutputFormat::Table);
        assert_eq!(config.format, OutputFormat::Table);
    }

    #[derive(Serialize)]
    struct Written {
        message: String,
    }

    impl TableDisplay for Written {
        fn to_table(&self) -> String {
            format!("written: {}", self.message)
        }
    }

    #[test]
    fn test_render_dispatches_on_format() {
        let written = || Written {
            message: "Index written".to_string(),
        };
        let json = Output::new(written(), OutputFormat::Json).render_to_string();
        assert!(json.contains("\"message\": \"Index written\""));

        let table = Output::new(written(), OutputFormat::Table).render_to_string();
        assert_eq!(table, "written: Index written");
    }

    #[test]
    fn test_column_builder() {
        let col = Column::new("Runs", "runs")
            .with_max_width(50)
            .with_alignment(Alignment::Right);

        assert_eq!(col.name, "Runs");
        assert_eq!(col.key, "runs");
        assert_eq!(col.max_width, Some(50));
        assert_eq!(col.align, Alignment::Right);
    }
}
