//! Error types for session persistence

/// Failure of one storage sink
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Filesystem failure
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Record could not be serialized
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Backend not reachable
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// Backend refused the record
    #[error("write rejected: {0}")]
    Rejected(String),
}

/// Failure to assemble a fallback chain
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    /// A target marked `assure_initialization` could not be initialized
    #[error("persistence target '{target}' failed to initialize: {source}")]
    InitializationFailed {
        target: String,
        #[source]
        source: StorageError,
    },

    /// Two targets share a name
    #[error("duplicate persistence target '{0}'")]
    DuplicateTarget(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_error_names_target() {
        let err = ChainError::InitializationFailed {
            target: "primary".into(),
            source: StorageError::Unavailable("connection refused".into()),
        };
        assert_eq!(
            err.to_string(),
            "persistence target 'primary' failed to initialize: storage unavailable: connection refused"
        );
    }
}
