//! Token types produced by the lexer.
//!
//! Tokens are immutable once emitted. Error and indent-marker tokens are
//! in-band: they stay in the token list and are interpreted by later
//! passes rather than being discarded here.

use crate::utils::location::SourceLocation;
use serde::Serialize;
use std::fmt;

/// A token in the source code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    /// The kind of token
    pub kind: TokenKind,
    /// The lexeme (raw text; for markers, the decimal indent level)
    pub lexeme: String,
    /// Where the token started
    pub location: SourceLocation,
    /// Lexer symbol table id, set only for identifiers
    pub symbol_id: Option<usize>,
}

impl Token {
    /// Create a new token.
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, location: SourceLocation) -> Self {
        Self {
            kind,
            lexeme: lexeme.into(),
            location,
            symbol_id: None,
        }
    }

    /// Create an identifier token bound to a symbol table id.
    pub fn identifier(lexeme: impl Into<String>, location: SourceLocation, id: usize) -> Self {
        Self {
            kind: TokenKind::Identifier,
            lexeme: lexeme.into(),
            location,
            symbol_id: Some(id),
        }
    }

    /// The end-of-input sentinel used when peeking past the token list.
    pub fn end_of_input() -> Self {
        Token::new(TokenKind::EndOfInput, "EOF", SourceLocation::new(0, 0))
    }

    /// Check if this is the end-of-input token.
    pub fn is_end(&self) -> bool {
        self.kind == TokenKind::EndOfInput
    }

    /// Check if this is an indent marker.
    pub fn is_indent_marker(&self) -> bool {
        self.kind == TokenKind::IndentMarker
    }

    /// The indent level carried by a marker token (0 for anything else).
    pub fn indent_level(&self) -> i64 {
        self.lexeme.parse().unwrap_or(0)
    }

    /// Check for an exact kind/lexeme pair.
    pub fn is(&self, kind: TokenKind, lexeme: &str) -> bool {
        self.kind == kind && self.lexeme == lexeme
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.kind, self.lexeme)
    }
}

/// The kind of a token.
///
/// The set is closed; `Assignment`, `Boolean` and `Arithmetic` are reserved
/// kinds that flow through the APIs but are not produced by this lexer
/// (assignment is lexed as `Operator` `=`, booleans as the keywords
/// `True`/`False`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TokenKind {
    /// Reserved word
    Keyword,
    /// Name bound in the lexer symbol table
    Identifier,
    /// Integer, radix-prefixed or float literal
    Number,
    /// String literal (lexeme is the raw content between the quotes)
    String,
    /// Operator such as `+` or `==`
    Operator,
    /// One of `(` `)` `:` `,`
    Delimiter,
    /// Reserved: dedicated assignment kind
    Assignment,
    /// Reserved: dedicated boolean kind
    Boolean,
    /// Reserved: dedicated arithmetic kind
    Arithmetic,
    /// End of the token stream
    EndOfInput,
    /// In-band lexical error; the lexeme describes the problem
    Error,
    /// Start-of-line marker; the lexeme is the decimal indent level
    IndentMarker,
}

/// Reserved words of the language.
pub const KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class", "continue",
    "def", "del", "elif", "else", "except", "finally", "for", "from", "global", "if", "import",
    "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return", "try", "while",
    "with", "yield",
];

impl TokenKind {
    /// Check whether a lexeme is a reserved word.
    pub fn is_keyword(lexeme: &str) -> bool {
        KEYWORDS.contains(&lexeme)
    }

    /// Get a human-readable name for this token kind.
    pub fn name(&self) -> &'static str {
        match self {
            TokenKind::Keyword => "keyword",
            TokenKind::Identifier => "identifier",
            TokenKind::Number => "number",
            TokenKind::String => "string",
            TokenKind::Operator => "operator",
            TokenKind::Delimiter => "delimiter",
            TokenKind::Assignment => "assignment",
            TokenKind::Boolean => "boolean",
            TokenKind::Arithmetic => "arithmetic",
            TokenKind::EndOfInput => "end of input",
            TokenKind::Error => "error",
            TokenKind::IndentMarker => "indent",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
