//! Error types for JSV template compilation and record coding.

use thiserror::Error;

/// Error raised while compiling a template string.
///
/// Every variant carries the 0-based column (index of the last consumed
/// character) at which the problem was detected, rendered into the message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    /// Input ran out in the middle of the template grammar.
    #[error("End of string reached unexpectedly: column {column}")]
    UnexpectedEnd { column: usize },

    /// A character outside the set the current grammar state accepts.
    #[error("Expecting {expected}: column {column}")]
    UnexpectedCharacter {
        expected: &'static str,
        column: usize,
    },

    /// `{}` is not a template; objects need at least one key.
    #[error("Object must contain at least 1 key: column {column}")]
    EmptyObject { column: usize },

    /// Invalid escape sequence inside a key string.
    #[error("Expecting a valid escape character: column {column}")]
    BadEscape { column: usize },

    /// Non-hex character inside a `\uXXXX` escape.
    #[error("Expecting a hex character ([0-9A-Fa-f]): column {column}")]
    BadHexDigit { column: usize },
}

/// Error raised while decoding a record against a compiled template.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    /// Input ran out mid-construct.
    #[error("End of string reached unexpectedly: column {column}")]
    UnexpectedEnd { column: usize },

    /// Input ran out while scanning for a specific delimiter.
    #[error("End of string reached unexpectedly while awaiting {expected}: column {column}")]
    UnexpectedEndAwaiting { expected: String, column: usize },

    /// A character outside the expected delimiter set.
    #[error("Expecting {expected}: column {column}")]
    UnexpectedCharacter { expected: String, column: usize },

    /// Invalid escape sequence inside a string literal.
    #[error("Expecting a valid escape character: column {column}")]
    BadEscape { column: usize },

    /// Non-hex character inside a `\uXXXX` escape.
    #[error("Expecting a hex character ([0-9A-Fa-f]): column {column}")]
    BadHexDigit { column: usize },

    /// A leaf slot held something the JSON value parser rejected.
    #[error("{message}: column {column}")]
    InvalidValue { message: String, column: usize },
}

/// Error raised while encoding a record whose shape disagrees with the
/// template node it is checked against, at any depth.
#[derive(Error, Debug)]
pub enum EncodeError {
    /// An object-shaped template node received a non-object value.
    #[error("Expecting a dictionary")]
    ExpectingObject,

    /// An array-shaped template node received a non-array value.
    #[error("Expecting a list")]
    ExpectingArray,

    /// A leaf value could not be serialized as JSON.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Errors shared by the string sub-lexer, mapped into [`TemplateError`] or
/// [`RecordError`] depending on which parser invoked it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ScanError {
    UnexpectedEnd { column: usize },
    BadEscape { column: usize },
    BadHexDigit { column: usize },
}

impl From<ScanError> for TemplateError {
    fn from(err: ScanError) -> Self {
        match err {
            ScanError::UnexpectedEnd { column } => TemplateError::UnexpectedEnd { column },
            ScanError::BadEscape { column } => TemplateError::BadEscape { column },
            ScanError::BadHexDigit { column } => TemplateError::BadHexDigit { column },
        }
    }
}

impl From<ScanError> for RecordError {
    fn from(err: ScanError) -> Self {
        match err {
            ScanError::UnexpectedEnd { column } => RecordError::UnexpectedEnd { column },
            ScanError::BadEscape { column } => RecordError::BadEscape { column },
            ScanError::BadHexDigit { column } => RecordError::BadHexDigit { column },
        }
    }
}

/// Render a set of expected characters the way error messages cite them:
/// `` `a` ``, `` `a` or `b` ``, `` `a`, `b` or `c` ``.
pub(crate) fn expected_set(chars: &[char]) -> String {
    let quoted: Vec<String> = chars.iter().map(|c| format!("`{}`", c)).collect();
    match quoted.len() {
        0 => String::new(),
        1 => quoted[0].clone(),
        n => format!("{} or {}", quoted[..n - 1].join(", "), quoted[n - 1]),
    }
}
