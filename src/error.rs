//! Error types for sqlweave.

use thiserror::Error;

/// The main error type for compilation and execution.
#[derive(Debug, Error)]
pub enum WeaveError {
    /// The dialect name is not one of the supported backends.
    #[error("Unknown dialect: '{0}'. Expected: postgres, mysql, mariadb, mssql or oracle")]
    UnknownDialect(String),

    /// The operation kind has no SQL statement in this compiler.
    #[error("Operation type is not supported by the SQL query compiler: {0}")]
    UnsupportedOperation(String),

    /// The query description is structurally unusable.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// The execution callback failed.
    #[error("Execution error: {0}")]
    Execution(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Config file could not be parsed.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl WeaveError {
    /// Create an invalid query error.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidQuery(message.into())
    }

    /// Create an execution error from anything displayable.
    pub fn execution(err: impl std::fmt::Display) -> Self {
        Self::Execution(err.to_string())
    }
}

/// Result type alias for sqlweave operations.
pub type WeaveResult<T> = Result<T, WeaveError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = WeaveError::UnknownDialect("sqlite".to_string());
        assert_eq!(
            err.to_string(),
            "Unknown dialect: 'sqlite'. Expected: postgres, mysql, mariadb, mssql or oracle"
        );
        let err = WeaveError::invalid("bulk create requires rows");
        assert_eq!(err.to_string(), "Invalid query: bulk create requires rows");
    }
}
