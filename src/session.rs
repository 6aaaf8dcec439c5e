//! Host-facing surface of the front end.
//!
//! A [`Session`] owns one piece of source text and the artifacts derived
//! from it. The host drives it with `load` / `run_lexer` / `run_parser` /
//! `clear` and reads results either from the returned display reports or
//! through the structured accessors. No file I/O happens here; the host
//! is responsible for it.

use crate::frontend::ast::Node;
use crate::frontend::lexer::Lexer;
use crate::frontend::parser::{parse_tokens, ParseOutput};
use crate::frontend::scope::Symbol;
use crate::frontend::symtab::LexSymbol;
use crate::frontend::token::{Token, TokenKind};
use crate::utils::errors::ParseError;
use serde::Serialize;

/// Display-ready output of a lexer run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LexerReport {
    /// One line per displayed token: `N. <kind, detail> at line L, column C`
    pub tokens: Vec<String>,
    /// One line per lexical error
    pub errors: Vec<String>,
    /// One `id,name,dataType,value` row per symbol
    pub symbols: Vec<String>,
}

/// Display-ready output of a parser run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParserReport {
    /// Rendered parse tree
    pub tree: String,
    /// One `Line L, Col C: message` row per parse error
    pub errors: Vec<String>,
    /// One `ID: <id> ,<name>,<dataType>,<value>,<role>,<scope>` row per symbol
    pub symbols: Vec<String>,
}

/// One source text and everything the front end derived from it.
#[derive(Debug, Default)]
pub struct Session {
    source: String,
    tokens: Vec<Token>,
    lex_symbols: Vec<LexSymbol>,
    lexed: bool,
    program: Option<Node>,
    parse_errors: Vec<ParseError>,
    parser_symbols: Vec<Symbol>,
}

impl Session {
    /// Create an empty session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load source text, discarding artifacts of any previous run.
    pub fn load(&mut self, source: &str) {
        self.clear();
        self.source = source.to_string();
    }

    /// Reset everything to empty.
    pub fn clear(&mut self) {
        self.source.clear();
        self.tokens.clear();
        self.lex_symbols.clear();
        self.lexed = false;
        self.program = None;
        self.parse_errors.clear();
        self.parser_symbols.clear();
    }

    /// Run the lexer over the loaded source.
    pub fn run_lexer(&mut self) -> LexerReport {
        let mut lexer = Lexer::new(self.source.clone());
        self.tokens = lexer.tokenize();
        self.lex_symbols = lexer.into_symbols().entries().to_vec();
        self.lexed = true;

        let mut token_lines = Vec::new();
        let mut count = 1;

        for token in &self.tokens {
            if token.is_end() {
                break;
            }
            if token.is_indent_marker() || token.kind == TokenKind::Error {
                continue;
            }

            let detail = match token.kind {
                TokenKind::Identifier => format!(
                    "identifier, {}",
                    token.symbol_id.map(|id| id.to_string()).unwrap_or_default()
                ),
                TokenKind::Keyword => format!("keyword, {}", token.lexeme),
                TokenKind::Number => format!("number, {}", token.lexeme),
                TokenKind::String => format!("string, \"{}\"", token.lexeme),
                TokenKind::Operator => format!("operator, {}", token.lexeme),
                TokenKind::Delimiter => token.lexeme.clone(),
                _ => "unknown".to_string(),
            };
            token_lines.push(format!(
                "{}. <{}> at line {}, column {}",
                count, detail, token.location.line, token.location.column
            ));
            count += 1;
        }

        let error_lines = Lexer::lexical_errors(&self.tokens)
            .iter()
            .enumerate()
            .map(|(i, e)| format!("{}. Lexical Error: {}", i + 1, e))
            .collect();

        let symbol_lines = self
            .lex_symbols
            .iter()
            .map(|s| format!("{},{},{},{}", s.id, s.name, s.data_type, s.value))
            .collect();

        LexerReport {
            tokens: token_lines,
            errors: error_lines,
            symbols: symbol_lines,
        }
    }

    /// Run the parser over the lexed tokens.
    ///
    /// Requires a prior [`run_lexer`](Self::run_lexer); without one the
    /// report carries a single error and no tree.
    pub fn run_parser(&mut self) -> ParserReport {
        if !self.lexed {
            return ParserReport {
                tree: String::new(),
                errors: vec!["Lexer has not been run.".to_string()],
                symbols: Vec::new(),
            };
        }

        let ParseOutput {
            program,
            errors,
            symbols,
        } = parse_tokens(self.tokens.clone());

        let tree = program.render();
        self.program = Some(program);
        self.parse_errors = errors;
        self.parser_symbols = symbols;

        ParserReport {
            tree,
            errors: self.parse_errors.iter().map(|e| e.to_string()).collect(),
            symbols: self
                .parser_symbols
                .iter()
                .map(|s| {
                    format!(
                        "ID: {} ,{},{},{},{},{}",
                        s.id, s.name, s.data_type, s.value, s.role, s.scope
                    )
                })
                .collect(),
        }
    }

    /// The loaded source text.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The raw token stream of the last lexer run.
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// The lexer symbol table of the last lexer run.
    pub fn lex_symbols(&self) -> &[LexSymbol] {
        &self.lex_symbols
    }

    /// The tree of the last parser run.
    pub fn program(&self) -> Option<&Node> {
        self.program.as_ref()
    }

    /// The diagnostics of the last parser run.
    pub fn parse_errors(&self) -> &[ParseError] {
        &self.parse_errors
    }

    /// The parser symbol table of the last parser run.
    pub fn parser_symbols(&self) -> &[Symbol] {
        &self.parser_symbols
    }
}
