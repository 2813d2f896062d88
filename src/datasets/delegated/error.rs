//! Errors raised while decoding a delegation feed

/// A structural failure in one line of a delegation feed.
///
/// The feed format is assumed to be well-formed, so any of these aborts the
/// parse of the whole feed.
#[derive(Debug)]
pub enum ParseError {
    /// The line has fewer pipe-delimited fields than its kind requires
    MissingField {
        line: usize,
        expected: usize,
        found: usize,
    },
    /// A field could not be decoded into its typed value
    MalformedField {
        line: usize,
        field: &'static str,
        value: String,
        reason: String,
    },
    /// The underlying reader failed
    Io(std::io::Error),
}

impl ParseError {
    pub(crate) fn malformed(
        line: usize,
        field: &'static str,
        value: &str,
        reason: impl std::fmt::Display,
    ) -> Self {
        ParseError::MalformedField {
            line,
            field,
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Line number (1-based) the error was raised on, if any
    pub fn line(&self) -> Option<usize> {
        match self {
            ParseError::MissingField { line, .. } | ParseError::MalformedField { line, .. } => {
                Some(*line)
            }
            ParseError::Io(_) => None,
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::MissingField {
                line,
                expected,
                found,
            } => write!(
                f,
                "line {}: expected at least {} fields, found {}",
                line, expected, found
            ),
            ParseError::MalformedField {
                line,
                field,
                value,
                reason,
            } => write!(
                f,
                "line {}: cannot decode {} '{}': {}",
                line, field, value, reason
            ),
            ParseError::Io(e) => write!(f, "read error: {}", e),
        }
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ParseError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ParseError {
    fn from(e: std::io::Error) -> Self {
        ParseError::Io(e)
    }
}
