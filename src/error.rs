//! Errors surfaced by queries over delegation data

use crate::datasets::ParseError;

/// Error type for source collection and queries
///
/// Every variant is fatal to the query that raised it: a missing or broken
/// registry would silently under-report matches.
#[derive(Debug)]
pub enum RirError {
    /// A source's feed could not be decoded
    Parse {
        source_name: String,
        error: ParseError,
    },
    /// A source could not be fetched
    SourceUnavailable { source_name: String, reason: String },
    /// The address given to a containment query is not an IP literal
    UnparsableQueryAddress { input: String, reason: String },
    /// Query arguments failed validation
    InvalidQuery(String),
    /// Some producers ended without delivering their records
    Incomplete { expected: usize, delivered: usize },
}

impl std::fmt::Display for RirError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RirError::Parse { source_name, error } => {
                write!(f, "failed to parse {} data: {}", source_name, error)
            }
            RirError::SourceUnavailable {
                source_name,
                reason,
            } => write!(f, "{} data unavailable: {}", source_name, reason),
            RirError::UnparsableQueryAddress { input, reason } => {
                write!(f, "invalid IP address '{}': {}", input, reason)
            }
            RirError::InvalidQuery(msg) => write!(f, "invalid query: {}", msg),
            RirError::Incomplete {
                expected,
                delivered,
            } => write!(
                f,
                "only {} of {} sources delivered records",
                delivered, expected
            ),
        }
    }
}

impl std::error::Error for RirError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RirError::Parse { error, .. } => Some(error),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_rir_error_display() {
        let err = RirError::SourceUnavailable {
            source_name: "apnic".to_string(),
            reason: "HTTP 404".to_string(),
        };
        assert_eq!(err.to_string(), "apnic data unavailable: HTTP 404");

        let err = RirError::Incomplete {
            expected: 5,
            delivered: 3,
        };
        assert_eq!(err.to_string(), "only 3 of 5 sources delivered records");
    }

    #[test]
    fn test_parse_error_is_source() {
        let err = RirError::Parse {
            source_name: "arin".to_string(),
            error: ParseError::MissingField {
                line: 1,
                expected: 7,
                found: 2,
            },
        };
        assert!(err.source().is_some());
        assert!(err.to_string().starts_with("failed to parse arin data: line 1"));
    }
}
