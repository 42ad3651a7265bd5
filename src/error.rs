//! Error types for chartlink operations.
//!
//! Configuration and schema errors abort a render before anything reaches the
//! drawing collaborator. Nothing in this crate retries.

use std::io;
use thiserror::Error;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in chartlink operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid option value (e.g. band padding >= 1).
    #[error("invalid option '{option}': {message}")]
    Config {
        /// Option name.
        option: String,
        /// Why the value is rejected.
        message: String,
    },

    /// A data point is missing a field the chart declared it needs.
    #[error("data point {index} is missing required field '{field}'")]
    Schema {
        /// Missing field name.
        field: String,
        /// Position of the offending data point in its dataset.
        index: usize,
    },

    /// Two data points share the same lifecycle key within one render pass.
    #[error("duplicate element key {key}")]
    DuplicateKey {
        /// Rendered form of the duplicated key.
        key: String,
    },

    /// A hierarchy node violates the leaf/internal invariant.
    #[error("malformed hierarchy node '{key}': a node needs exactly one of a value or children")]
    MalformedTree {
        /// Key of the offending node.
        key: String,
    },

    /// Zero-width scale domain.
    #[error("degenerate scale: {0}")]
    DegenerateScale(String),

    /// Color parsing error.
    #[error("invalid color: {0}")]
    InvalidColor(String),

    /// A user-supplied accessor (tooltip content, key extractor) failed.
    #[error("accessor failed: {0}")]
    Accessor(String),

    /// Configuration parsing error with line number.
    #[error("configuration error at line {line}: {message}")]
    ConfigParse {
        /// Line number where the error occurred (1-indexed).
        line: usize,
        /// Error message describing the issue.
        message: String,
    },

    /// Configuration file not found.
    #[error("configuration file not found: {0}")]
    ConfigNotFound(String),

    /// I/O error (configuration files).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Shorthand for [`Error::Config`].
    pub fn config(option: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Config {
            option: option.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_names_option() {
        let err = Error::config("bar_padding", "must be in [0, 1)");
        let display = err.to_string();
        assert!(display.contains("bar_padding"));
        assert!(display.contains("[0, 1)"));
    }

    #[test]
    fn test_schema_error_includes_field_and_index() {
        let err = Error::Schema {
            field: "v".to_string(),
            index: 3,
        };
        let display = err.to_string();
        assert!(display.contains("'v'"));
        assert!(display.contains('3'));
    }

    #[test]
    fn test_malformed_tree_includes_key() {
        let err = Error::MalformedTree {
            key: "burst".to_string(),
        };
        assert!(err.to_string().contains("burst"));
    }

    #[test]
    fn test_config_parse_includes_line() {
        let err = Error::ConfigParse {
            line: 42,
            message: "invalid value".to_string(),
        };
        let display = err.to_string();
        assert!(display.contains("42"), "Error should include line number: {display}");
        assert!(display.contains("invalid value"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Error>();
    }
}
