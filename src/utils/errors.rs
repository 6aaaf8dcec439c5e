//! Diagnostic record types for the front end.
//!
//! Both passes are recovery-oriented: neither returns `Err`. Lexical
//! problems travel in-band as `Error` tokens and are materialized into
//! [`LexicalError`] records for display; the parser accumulates
//! [`ParseError`] records as it synchronizes past bad input.

use crate::utils::location::SourceLocation;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// A lexical diagnostic, derived from an in-band `Error` token.
///
/// The lexeme carries the offending text; for malformed numbers it is the
/// full message the lexer produced (e.g. `Invalid number with leading
/// zero: 0123`).
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LexicalError {
    /// Offending text or lexer-produced message
    pub lexeme: String,
    /// Where the token started
    pub location: SourceLocation,
}

impl fmt::Display for LexicalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid token, {} at line {}, column {}",
            self.lexeme, self.location.line, self.location.column
        )
    }
}

/// A syntactic diagnostic accumulated during parsing.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseError {
    /// Where the parser was looking when the error was recorded
    pub location: SourceLocation,
    /// Human-readable description
    pub message: String,
}

impl ParseError {
    /// Create a new parse error at the given location.
    pub fn new(location: SourceLocation, message: impl Into<String>) -> Self {
        Self {
            location,
            message: message.into(),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Line {}, Col {}: {}",
            self.location.line, self.location.column, self.message
        )
    }
}
