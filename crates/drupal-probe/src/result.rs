//! Result and error types for drupal-probe.

use thiserror::Error;

/// Result type for drupal-probe operations
pub type ProbeResult<T> = Result<T, ProbeError>;

/// Errors that can occur in drupal-probe
#[derive(Debug, Error)]
pub enum ProbeError {
    /// A form field name that cannot produce a usable identifier
    #[error("Invalid field name {name:?}: {reason}")]
    InvalidFieldName {
        /// The rejected name
        name: String,
        /// Why it was rejected
        reason: String,
    },

    /// Template placeholders left without a value
    #[error("Unresolved placeholders {placeholders:?} in {pattern:?}")]
    UnresolvedPlaceholder {
        /// Placeholder keys, without braces
        placeholders: Vec<String>,
        /// The partially resolved text
        pattern: String,
    },

    /// Storage does not know the entity type
    #[error("Invalid entity type specified: {entity_type}")]
    UnknownEntityType {
        /// Entity type id
        entity_type: String,
    },

    /// Storage collaborator failure
    #[error("Storage error ({entity_type}): {message}")]
    Storage {
        /// Entity type id
        entity_type: String,
        /// Error message
        message: String,
    },

    /// External command exited with a non-zero status
    #[error("Command `{command}` failed ({status}): {output}")]
    CommandExecution {
        /// Invoked command line
        command: String,
        /// Exit status description
        status: String,
        /// Captured stderr followed by stdout
        output: String,
    },

    /// External command exceeded its timeout
    #[error("Command `{command}` timed out after {ms}ms")]
    CommandTimeout {
        /// Invoked command line
        command: String,
        /// Timeout in milliseconds
        ms: u64,
    },

    /// Browser driving agent failure
    #[error("Browser error: {message}")]
    Browser {
        /// Error message
        message: String,
    },

    /// Assertion failed
    #[error("Assertion failed: {message}")]
    AssertionFailed {
        /// Error message
        message: String,
    },

    /// Kernel bootstrap failed
    #[error("Bootstrap failed: {message}")]
    Bootstrap {
        /// Error message
        message: String,
    },

    /// Watchdog found log entries at or above the configured severity
    #[error("Log check failed:\n{}", messages.join("\n"))]
    LogCheckFailed {
        /// Formatted log messages
        messages: Vec<String>,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl ProbeError {
    /// Create an assertion failure
    #[must_use]
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::AssertionFailed {
            message: message.into(),
        }
    }

    /// Create a storage error for an entity type
    #[must_use]
    pub fn storage(entity_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Storage {
            entity_type: entity_type.into(),
            message: message.into(),
        }
    }

    /// Create a browser error
    #[must_use]
    pub fn browser(message: impl Into<String>) -> Self {
        Self::Browser {
            message: message.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_field_name_display() {
        let err = ProbeError::InvalidFieldName {
            name: String::new(),
            reason: "field name is empty".to_string(),
        };
        assert!(err.to_string().contains("Invalid field name"));
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn test_unknown_entity_type_display() {
        let err = ProbeError::UnknownEntityType {
            entity_type: "widget".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid entity type specified: widget");
    }

    #[test]
    fn test_log_check_failed_lists_every_message() {
        let err = ProbeError::LogCheckFailed {
            messages: vec!["php - Error: a".to_string(), "php - Error: b".to_string()],
        };
        let text = err.to_string();
        assert!(text.contains("php - Error: a"));
        assert!(text.contains("php - Error: b"));
    }

    #[test]
    fn test_command_execution_carries_output() {
        let err = ProbeError::CommandExecution {
            command: "drush cr".to_string(),
            status: "exit status: 1".to_string(),
            output: "boom".to_string(),
        };
        assert!(err.to_string().contains("drush cr"));
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn test_io_error_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: ProbeError = io_err.into();
        assert!(err.to_string().contains("I/O"));
    }
}
