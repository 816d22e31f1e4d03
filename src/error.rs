//! Error types for request compilation.

use thiserror::Error;

/// The main error type for building and compiling requests.
///
/// None of these are recoverable for the call that produced them: a failed
/// compile never yields partial SQL.
#[derive(Debug, Error)]
pub enum QueryError {
    /// The request tree disagrees with the schema registry.
    #[error("Schema error in {entity}: {message}")]
    Schema { entity: String, message: String },

    /// A column reference carries an alias handle that no node of the
    /// compiled tree owns.
    #[error("Unresolved alias {alias} referenced from {path}")]
    AliasResolution { path: String, alias: String },

    /// Two explicitly named aliases would render to the same identifier.
    #[error("Ambiguous alias '{alias}': used by both {first} and {second}")]
    Ambiguity {
        alias: String,
        first: String,
        second: String,
    },

    /// A raw SQL fragment does not carry one argument per placeholder.
    #[error(
        "Argument mismatch in {path}: {placeholders} placeholder(s) but {arguments} argument(s)"
    )]
    Arguments {
        path: String,
        placeholders: usize,
        arguments: usize,
    },

    /// Schema configuration could not be parsed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl QueryError {
    /// Create a schema error for the given entity.
    pub fn schema(entity: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Schema {
            entity: entity.into(),
            message: message.into(),
        }
    }

    /// Create an alias resolution error.
    pub fn unresolved(path: impl Into<String>, alias: impl Into<String>) -> Self {
        Self::AliasResolution {
            path: path.into(),
            alias: alias.into(),
        }
    }
}

/// Result type alias for request operations.
pub type QueryResult<T> = Result<T, QueryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = QueryError::schema("A", "unknown association 'c'");
        assert_eq!(err.to_string(), "Schema error in A: unknown association 'c'");

        let err = QueryError::unresolved("A.b", "TableAlias#7");
        assert_eq!(
            err.to_string(),
            "Unresolved alias TableAlias#7 referenced from A.b"
        );
    }

    #[test]
    fn test_ambiguity_display() {
        let err = QueryError::Ambiguity {
            alias: "x".to_string(),
            first: "A".to_string(),
            second: "A.b".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Ambiguous alias 'x': used by both A and A.b"
        );
    }
}
