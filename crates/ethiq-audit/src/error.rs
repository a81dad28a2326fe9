//! Error types for audit storage and reporting.

use thiserror::Error;

/// Result type alias for audit operations.
pub type Result<T> = std::result::Result<T, AuditError>;

/// Errors that can occur while persisting or reading audit data.
#[derive(Debug, Error)]
pub enum AuditError {
    /// The embedded database failed.
    #[error("Database error: {0}")]
    Database(#[from] sled::Error),

    /// A record could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A stored key is not a valid task id.
    #[error("Corrupt audit key: {0}")]
    CorruptKey(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corrupt_key_display() {
        let err = AuditError::CorruptKey("not-a-uuid".to_string());
        assert_eq!(err.to_string(), "Corrupt audit key: not-a-uuid");
    }

    #[test]
    fn test_serialization_from() {
        let json_err = serde_json::from_str::<u32>("nope").unwrap_err();
        let err: AuditError = json_err.into();
        assert!(matches!(err, AuditError::Serialization(_)));
    }
}
