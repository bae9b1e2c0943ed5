//! Error types and Result alias
//!
//! Errors follow SQLite's result-code model: a coarse `ErrorCode` plus an
//! optional human-readable message. Lexer and parser errors additionally
//! carry the source position they were raised at.

use std::fmt;

/// SQLite-style result codes used by the front-end
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Successful result
    Ok,
    /// Generic error (malformed SQL, bad literal, ...)
    Error,
    /// Internal logic error
    Internal,
    /// Library used incorrectly
    Misuse,
    /// Parameter or register out of range
    Range,
    /// Table or column not found
    NotFound,
    /// Datatype mismatch
    Mismatch,
    /// Feature not implemented
    Unsupported,
}

impl ErrorCode {
    /// Short description of the code, matching sqlite3_errstr() wording
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::Ok => "not an error",
            ErrorCode::Error => "SQL logic error",
            ErrorCode::Internal => "internal error",
            ErrorCode::Misuse => "bad parameter or other API misuse",
            ErrorCode::Range => "column index out of range",
            ErrorCode::NotFound => "unknown operation",
            ErrorCode::Mismatch => "datatype mismatch",
            ErrorCode::Unsupported => "unsupported operation",
        }
    }
}

/// Front-end error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    /// Result code
    pub code: ErrorCode,
    /// Optional detail message
    pub message: Option<String>,
    /// Source line (1-based) for lex/parse errors
    pub line: Option<u32>,
    /// Source column (1-based) for lex/parse errors
    pub column: Option<u32>,
}

impl Error {
    /// Create an error from a bare code
    pub fn new(code: ErrorCode) -> Self {
        Error {
            code,
            message: None,
            line: None,
            column: None,
        }
    }

    /// Create an error with a message
    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Error {
            code,
            message: Some(message.into()),
            line: None,
            column: None,
        }
    }

    /// Attach a source position
    pub fn at(mut self, line: u32, column: u32) -> Self {
        self.line = Some(line);
        self.column = Some(column);
        self
    }

    /// Parse error at a source position
    pub fn parse(line: u32, column: u32, what: impl fmt::Display) -> Self {
        Error::with_message(
            ErrorCode::Error,
            format!("parse error at line {}, col {}: {}", line, column, what),
        )
        .at(line, column)
    }

    /// Illegal-token error at a source position
    pub fn illegal_token(line: u32, column: u32, lexeme: &str) -> Self {
        Error::with_message(
            ErrorCode::Error,
            format!("illegal token at line {}, col {}: {:?}", line, column, lexeme),
        )
        .at(line, column)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(msg) => write!(f, "{}", msg),
            None => write!(f, "{}", self.code.as_str()),
        }
    }
}

impl std::error::Error for Error {}

/// Result type alias for front-end operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let e = Error::new(ErrorCode::Mismatch);
        assert_eq!(e.to_string(), "datatype mismatch");

        let e = Error::with_message(ErrorCode::Error, "unknown table: t1");
        assert_eq!(e.to_string(), "unknown table: t1");
    }

    #[test]
    fn test_parse_error_position() {
        let e = Error::parse(3, 7, "expected expression");
        assert_eq!(e.line, Some(3));
        assert_eq!(e.column, Some(7));
        assert_eq!(
            e.to_string(),
            "parse error at line 3, col 7: expected expression"
        );
    }

    #[test]
    fn test_illegal_token_message() {
        let e = Error::illegal_token(1, 5, "\\");
        assert!(e.to_string().starts_with("illegal token at line 1, col 5:"));
    }
}
