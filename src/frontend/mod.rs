//! Front end: lexer, parser, AST and symbol tables for the Python-subset
//! language.
//!
//! The accepted language is a strict, restricted subset of Python:
//!
//! ```text
//! def clamp(x, lo, hi):
//!     if x < lo:
//!         return lo
//!     elif x > hi:
//!         return hi
//!     else:
//!         return x
//! y = clamp(5, 0, 3)
//! ```
//!
//! Indentation is tokenized explicitly: every physical line opens with an
//! indent marker whose level drives block recognition in the parser.

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod scope;
pub mod symtab;
pub mod token;

pub use ast::{Node, NodeKind, NumericType};
pub use lexer::Lexer;
pub use parser::{parse_tokens, ParseOutput, Parser};
pub use scope::{Role, ScopedSymbolTable, Symbol};
pub use symtab::{LexSymbol, LexSymbolTable};
pub use token::{Token, TokenKind};

/// Tokenize source text, returning the token stream and the lexer symbol
/// table rows.
pub fn tokenize(source: &str) -> (Vec<Token>, Vec<LexSymbol>) {
    let mut lexer = Lexer::new(source);
    let tokens = lexer.tokenize();
    let symbols = lexer.into_symbols().entries().to_vec();
    (tokens, symbols)
}

/// Lex and parse source text in one call.
pub fn parse(source: &str) -> ParseOutput {
    let mut lexer = Lexer::new(source);
    let tokens = lexer.tokenize();
    parse_tokens(tokens)
}
