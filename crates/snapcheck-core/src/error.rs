//! Unified error types for snapcheck

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Unified error type for all snapcheck operations
#[derive(Error, Debug)]
pub enum SnapcheckError {
    // Configuration errors
    #[error("Baseline not found at {}. Run a recording session first.", path.display())]
    BaselineNotFound { path: PathBuf },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Baseline at {} is malformed: {source}", path.display())]
    BaselineFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    // Infrastructure errors
    #[error("Navigation to {url} timed out after {timeout:?}")]
    NavigationTimeout { url: String, timeout: Duration },

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Artifact was not written to disk at {}", path.display())]
    ArtifactWrite { path: PathBuf },

    #[error("Observation bridge error: {0}")]
    Bridge(String),

    // Lifecycle errors
    #[error("Recorder already finished; a new session is required")]
    RecorderFinished,

    // Verification
    #[error("Verification failed: {failed} of {total} pages did not match the baseline")]
    VerificationFailed { failed: usize, total: usize },

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // Generic
    #[error("{0}")]
    Other(String),
}

/// Coarse classification of an error, used to decide whether a run can continue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Run cannot start (missing or unreadable inputs)
    Configuration,
    /// Browser, filesystem or bridge failure; aborts the run
    Infrastructure,
    /// Content mismatch on replay
    Assertion,
    /// Misuse of a finished session object
    Lifecycle,
}

impl SnapcheckError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::BaselineNotFound { .. } | Self::Configuration(_) | Self::BaselineFormat { .. } => {
                ErrorKind::Configuration
            }
            Self::VerificationFailed { .. } => ErrorKind::Assertion,
            Self::RecorderFinished => ErrorKind::Lifecycle,
            Self::NavigationTimeout { .. }
            | Self::Browser(_)
            | Self::ArtifactWrite { .. }
            | Self::Bridge(_)
            | Self::Io(_)
            | Self::Serialization(_)
            | Self::Other(_) => ErrorKind::Infrastructure,
        }
    }
}

/// Result type alias using SnapcheckError
pub type Result<T> = std::result::Result<T, SnapcheckError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_baseline_is_configuration() {
        let err = SnapcheckError::BaselineNotFound {
            path: PathBuf::from("baseline/steps.json"),
        };
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(err.to_string().contains("Run a recording session first"));
    }

    #[test]
    fn test_timeout_is_infrastructure() {
        let err = SnapcheckError::NavigationTimeout {
            url: "https://example.com".to_string(),
            timeout: Duration::from_secs(60),
        };
        assert_eq!(err.kind(), ErrorKind::Infrastructure);
    }
}
