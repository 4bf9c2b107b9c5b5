//! Error types for sqlbind.

use thiserror::Error;

/// The main error type for sqlbind operations.
#[derive(Debug, Error)]
pub enum BindError {
    /// A token pattern handed to the lexer is not a valid regular expression.
    #[error("Invalid pattern for token kind '{kind}': {source}")]
    Pattern {
        kind: String,
        #[source]
        source: regex::Error,
    },

    /// A placeholder prefix was followed by something other than a name.
    #[error("Malformed placeholder at position {position}: expected a parameter name, found '{found}'")]
    MalformedPlaceholder { position: usize, found: String },

    /// The value cannot be written as a SQL literal.
    #[error("Unsupported value type {kind}: {value}")]
    UnsupportedValueType { kind: &'static str, value: String },

    /// A length placeholder is bound to a value that has no length.
    #[error("Cannot take the length of '{name}': {kind} values have no length")]
    LengthNotSupported { name: String, kind: &'static str },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BindError {
    /// Create a malformed placeholder error for the token at `position`.
    pub fn malformed(position: usize, found: impl Into<String>) -> Self {
        Self::MalformedPlaceholder {
            position,
            found: found.into(),
        }
    }

    /// Create an unsupported value error.
    pub fn unsupported(kind: &'static str, value: impl Into<String>) -> Self {
        Self::UnsupportedValueType {
            kind,
            value: value.into(),
        }
    }
}

/// Result type alias for sqlbind operations.
pub type BindResult<T> = Result<T, BindError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BindError::malformed(7, "=");
        assert_eq!(
            err.to_string(),
            "Malformed placeholder at position 7: expected a parameter name, found '='"
        );
    }

    #[test]
    fn test_length_error_display() {
        let err = BindError::LengthNotSupported {
            name: "id".to_string(),
            kind: "integer",
        };
        assert_eq!(
            err.to_string(),
            "Cannot take the length of 'id': integer values have no length"
        );
    }
}
