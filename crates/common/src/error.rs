use std::path::PathBuf;

/// Matjip error types
#[derive(Debug, thiserror::Error)]
pub enum MatjipError {
    /// Text could not be turned into a vector
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Encoded vectors disagree in dimensionality
    #[error("Dimension mismatch for {what}: expected {expected}, found {found}")]
    DimensionMismatch {
        what: String,
        expected: usize,
        found: usize,
    },

    /// Query issued before a successful build or load
    #[error("Index not ready: build or load an index first")]
    IndexNotReady,

    /// Primary index artifact is absent
    #[error("Snapshot not found: {}", .0.display())]
    SnapshotNotFound(PathBuf),

    /// Snapshot present but internally inconsistent
    #[error("Snapshot corrupt: {0}")]
    SnapshotCorrupt(String),

    /// I/O failure while writing or reading a snapshot
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// LLM related error
    #[error("LLM error: {0}")]
    Llm(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// General error (anyhow integration)
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl MatjipError {
    /// Create encoding error
    pub fn encoding<S: Into<String>>(msg: S) -> Self {
        Self::Encoding(msg.into())
    }

    /// Create snapshot corruption error
    pub fn snapshot_corrupt<S: Into<String>>(msg: S) -> Self {
        Self::SnapshotCorrupt(msg.into())
    }

    /// Create persistence error
    pub fn persistence<S: Into<String>>(msg: S) -> Self {
        Self::Persistence(msg.into())
    }

    /// Create LLM error
    pub fn llm<S: Into<String>>(msg: S) -> Self {
        Self::Llm(msg.into())
    }

    /// Create config error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Create invalid input error
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Whether the caller should be told to build the index first
    pub fn needs_build(&self) -> bool {
        matches!(self, Self::IndexNotReady | Self::SnapshotNotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_needs_build() {
        assert!(MatjipError::IndexNotReady.needs_build());
        assert!(MatjipError::SnapshotNotFound(PathBuf::from("db")).needs_build());
        assert!(!MatjipError::snapshot_corrupt("count mismatch").needs_build());
        assert!(!MatjipError::persistence("disk full").needs_build());
    }

    #[test]
    fn test_dimension_mismatch_message() {
        let err = MatjipError::DimensionMismatch {
            what: "record 3".to_string(),
            expected: 768,
            found: 384,
        };
        assert_eq!(
            err.to_string(),
            "Dimension mismatch for record 3: expected 768, found 384"
        );
    }
}
