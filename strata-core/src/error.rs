//! Error types for strata-core.
//!
//! Per-artifact problems never surface as errors: the indexer swallows them
//! into empty sub-structures and the compliance engine reports them as
//! findings. Only invocation-level failures use [`Error`].

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for strata-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Invocation-level failures.
#[derive(Error, Debug)]
pub enum Error {
    /// The workspace root is missing, not a directory, or unreadable.
    #[error("Workspace root is not readable: {path}: {source}")]
    WorkspaceRoot {
        /// Root that was requested.
        path: PathBuf,
        /// Underlying IO failure.
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization error for the index or report.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Why a structured document could not be parsed.
///
/// The loader used by indexing discards this; the compliance engine keeps
/// the message as the parser diagnostic of a MalformedDocument finding.
#[derive(Error, Debug)]
pub enum DocumentError {
    /// The file exists but could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML syntax or structure error.
    #[error("{0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON syntax error.
    #[error("{0}")]
    Json(#[from] serde_json::Error),
}

/// Failure talking to the external large-file subsystem.
#[derive(Error, Debug)]
pub enum ProbeError {
    /// The subsystem binary is absent or refuses to run.
    #[error("Git LFS is not installed or not configured")]
    NotInstalled,

    /// The subsystem ran but the call failed.
    #[error("git lfs call failed: {0}")]
    Failed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::WorkspaceRoot {
            path: PathBuf::from("/nope"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };
        assert!(err.to_string().contains("/nope"));

        let err = ProbeError::NotInstalled;
        assert!(err.to_string().contains("Git LFS"));
    }
}
