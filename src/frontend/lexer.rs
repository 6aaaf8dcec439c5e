//! Lexer for the Python-subset language.
//!
//! The lexer is a character-driven state machine over an ASCII byte
//! stream. Indentation is a first-class lexical phenomenon: every physical
//! line starts with exactly one indent-marker token carrying the line's
//! indent level (4-space units, tabs counting as 4, partial units
//! truncated). Malformed input never stops tokenization; problems are
//! emitted as in-band `Error` tokens.
//!
//! After tokenization a post-scan over the raw source seeds type guesses
//! into the lexer symbol table (literal assignments and call-shaped
//! occurrences). The post-scan never removes or reorders tokens.

use crate::frontend::symtab::{LexSymbolTable, UNKNOWN};
use crate::frontend::token::{Token, TokenKind};
use crate::utils::errors::LexicalError;
use crate::utils::location::SourceLocation;
use once_cell::sync::Lazy;
use regex::Regex;

/// Spaces per indent unit; a tab counts as one full unit.
const INDENT_UNIT: usize = 4;

static ASSIGN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([a-zA-Z_][a-zA-Z0-9_]*)\s*=\s*([^\n#]+)").unwrap());
static CALL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b([a-zA-Z_][a-zA-Z0-9_]*)\s*\(").unwrap());
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static INT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]+$").unwrap());
static FLOAT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]+\.[0-9]+$").unwrap());
static STRING_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"^(".*"|'.*')$"#).unwrap());
static BOOL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(True|False)$").unwrap());

/// A lexer for tokenizing source text.
pub struct Lexer {
    source: String,
    pos: usize,
    line: usize,
    column: usize,
    new_line: bool,
    symbols: LexSymbolTable,
}

impl Lexer {
    /// Create a new lexer for the given source.
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            pos: 0,
            line: 1,
            column: 1,
            new_line: true,
            symbols: LexSymbolTable::new(),
        }
    }

    /// Tokenize the entire input.
    ///
    /// The returned stream ends in a single `EndOfInput` token, carries one
    /// `IndentMarker` per physical line, and keeps `Error` tokens in-band.
    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        self.new_line = true;

        loop {
            if self.new_line {
                let marker_loc = self.location();
                let level = self.indent_width() / INDENT_UNIT;
                while self.peek(0) == ' ' || self.peek(0) == '\t' {
                    self.advance();
                }
                tokens.push(Token::new(
                    TokenKind::IndentMarker,
                    level.to_string(),
                    marker_loc,
                ));
                self.new_line = false;
            }

            self.skip_whitespace();
            self.skip_comment();

            let c = self.peek(0);
            let start = self.location();

            if c == '\0' {
                tokens.push(Token::new(TokenKind::EndOfInput, "EOF", start));
                break;
            } else if c.is_ascii_alphabetic() || c == '_' {
                tokens.push(self.read_identifier());
            } else if c.is_ascii_digit() {
                tokens.push(self.read_number());
            } else if c == '"' {
                tokens.push(self.read_string());
            } else if matches!(c, '+' | '-' | '*' | '/' | '=' | '<' | '>' | '!' | '.') {
                tokens.push(self.read_operator());
            } else if matches!(c, '(' | ')' | ':' | ',') {
                let lexeme = self.advance().to_string();
                tokens.push(Token::new(TokenKind::Delimiter, lexeme, start));
            } else if c == '\n' {
                self.advance();
            } else {
                let lexeme = self.advance().to_string();
                tokens.push(Token::new(TokenKind::Error, lexeme, start));
            }
        }

        self.seed_types();
        tokens
    }

    /// The symbol table populated during tokenization and seeding.
    pub fn symbols(&self) -> &LexSymbolTable {
        &self.symbols
    }

    /// Consume the lexer, yielding its symbol table.
    pub fn into_symbols(self) -> LexSymbolTable {
        self.symbols
    }

    /// Materialize display records for the in-band `Error` tokens.
    pub fn lexical_errors(tokens: &[Token]) -> Vec<LexicalError> {
        tokens
            .iter()
            .filter(|t| t.kind == TokenKind::Error)
            .map(|t| LexicalError {
                lexeme: t.lexeme.clone(),
                location: t.location,
            })
            .collect()
    }

    fn location(&self) -> SourceLocation {
        SourceLocation::new(self.line, self.column)
    }

    /// Look ahead by `offset` characters without consuming ('\0' past end).
    fn peek(&self, offset: usize) -> char {
        self.source
            .as_bytes()
            .get(self.pos + offset)
            .map(|&b| b as char)
            .unwrap_or('\0')
    }

    /// Consume one character, updating line/column bookkeeping.
    ///
    /// A newline flags the start of a line; any later non-indent character
    /// clears the flag again, so a newline swallowed inside a token (a
    /// triple-quoted string) does not leave a marker pending mid-line.
    fn advance(&mut self) -> char {
        let c = self.peek(0);
        self.pos += 1;
        self.column += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
            self.new_line = true;
        } else if self.new_line && c != ' ' && c != '\t' {
            self.new_line = false;
        }
        c
    }

    /// Raw indent width of the run of spaces/tabs at the cursor, without
    /// consuming anything.
    fn indent_width(&self) -> usize {
        let bytes = self.source.as_bytes();
        let mut width = 0;
        let mut p = self.pos;
        while p < bytes.len() {
            match bytes[p] {
                b' ' => width += 1,
                b'\t' => width += INDENT_UNIT,
                _ => break,
            }
            p += 1;
        }
        width
    }

    fn skip_whitespace(&mut self) {
        while self.peek(0) != '\n' && self.peek(0) != '\0' && self.peek(0).is_ascii_whitespace() {
            self.advance();
        }
    }

    fn skip_comment(&mut self) {
        if self.peek(0) == '#' {
            while self.peek(0) != '\n' && self.peek(0) != '\0' {
                self.advance();
            }
        }
    }

    fn read_identifier(&mut self) -> Token {
        let start = self.location();
        let mut value = String::new();
        while self.peek(0).is_ascii_alphanumeric() || self.peek(0) == '_' {
            value.push(self.advance());
        }

        if TokenKind::is_keyword(&value) {
            Token::new(TokenKind::Keyword, value, start)
        } else {
            let id = self.symbols.insert(&value);
            Token::identifier(value, start, id)
        }
    }

    fn read_number(&mut self) -> Token {
        let start = self.location();
        let mut value = String::new();

        if self.peek(0) == '0' {
            value.push(self.advance());
            let next = self.peek(0).to_ascii_lowercase();

            if next == 'x' || next == 'o' || next == 'b' {
                value.push(self.advance());
                let base = match next {
                    'x' => 16,
                    'o' => 8,
                    _ => 2,
                };

                let mut has_valid_digit = false;
                while self.peek(0).is_ascii_alphanumeric() {
                    let c = self.peek(0);
                    let valid = match base {
                        2 => c == '0' || c == '1',
                        8 => ('0'..='7').contains(&c),
                        _ => c.is_ascii_hexdigit(),
                    };
                    if !valid {
                        // The bad character is reported but not consumed
                        return Token::new(
                            TokenKind::Error,
                            format!("Invalid digit for base {}: {}{}", base, value, c),
                            start,
                        );
                    }
                    value.push(self.advance());
                    has_valid_digit = true;
                }

                if !has_valid_digit {
                    return Token::new(
                        TokenKind::Error,
                        format!("Expected digits after prefix: {}", value),
                        start,
                    );
                }
                return Token::new(TokenKind::Number, value, start);
            }

            if self.peek(0).is_ascii_digit() {
                while self.peek(0).is_ascii_digit() {
                    value.push(self.advance());
                }
                return Token::new(
                    TokenKind::Error,
                    format!("Invalid number with leading zero: {}", value),
                    start,
                );
            }
        }

        while self.peek(0).is_ascii_digit() {
            value.push(self.advance());
        }

        if self.peek(0) == '.' {
            value.push(self.advance());
            while self.peek(0).is_ascii_digit() {
                value.push(self.advance());
            }
        }

        // An identifier glued to the digits poisons the whole run
        if self.peek(0).is_ascii_alphabetic() || self.peek(0) == '_' {
            while self.peek(0).is_ascii_alphanumeric() || self.peek(0) == '_' {
                value.push(self.advance());
            }
            return Token::new(TokenKind::Error, value, start);
        }

        Token::new(TokenKind::Number, value, start)
    }

    fn read_string(&mut self) -> Token {
        let start = self.location();
        let mut value = String::new();

        self.advance(); // opening quote
        let mut triple = false;

        if self.peek(0) == '"' {
            self.advance();
            if self.peek(0) == '"' {
                self.advance();
                triple = true;
            } else {
                return Token::new(TokenKind::String, "", start);
            }
        }

        loop {
            if self.peek(0) == '\0' {
                return Token::new(TokenKind::Error, "Unterminated string", start);
            }
            if !triple && self.peek(0) == '\n' {
                return Token::new(TokenKind::Error, "Unterminated string", start);
            }

            if triple {
                if self.peek(0) == '"' && self.peek(1) == '"' && self.peek(2) == '"' {
                    self.advance();
                    self.advance();
                    self.advance();
                    break;
                }
            } else if self.peek(0) == '"' {
                self.advance();
                break;
            }

            value.push(self.advance());
        }

        Token::new(TokenKind::String, value, start)
    }

    fn read_operator(&mut self) -> Token {
        let start = self.location();
        let c = self.advance();
        let mut value = c.to_string();

        if matches!(c, '=' | '!' | '<' | '>') && self.peek(0) == '=' {
            value.push(self.advance());
        }

        if c == '.' {
            return Token::new(TokenKind::Operator, ".", start);
        }

        Token::new(TokenKind::Operator, value, start)
    }

    /// Best-effort type seeding over the raw source text.
    ///
    /// Assignments of literal RHS refine (type, value); a call-shaped
    /// `name(` marks `name` as a function. Non-literal RHS leaves both
    /// fields untouched.
    fn seed_types(&mut self) {
        let mut updates: Vec<(String, &'static str, String)> = Vec::new();

        for caps in ASSIGN_RE.captures_iter(&self.source) {
            let name = caps[1].to_string();
            let cleaned = WHITESPACE_RE.replace_all(&caps[2], "").into_owned();

            if INT_RE.is_match(&cleaned) {
                updates.push((name, "int", cleaned));
            } else if FLOAT_RE.is_match(&cleaned) {
                updates.push((name, "float", cleaned));
            } else if STRING_RE.is_match(&cleaned) {
                updates.push((name, "string", cleaned));
            } else if BOOL_RE.is_match(&cleaned) {
                updates.push((name, "bool", cleaned));
            } else {
                updates.push((name, UNKNOWN, UNKNOWN.to_string()));
            }
        }

        for caps in CALL_RE.captures_iter(&self.source) {
            updates.push((caps[1].to_string(), "function", UNKNOWN.to_string()));
        }

        for (name, data_type, value) in updates {
            self.symbols.update_type(&name, data_type, &value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(source: &str) -> Vec<Token> {
        Lexer::new(source).tokenize()
    }

    fn kinds_and_lexemes(tokens: &[Token]) -> Vec<(TokenKind, String)> {
        tokens
            .iter()
            .map(|t| (t.kind, t.lexeme.clone()))
            .collect()
    }

    /// Kind/lexeme pairs with indent markers stripped, for invariance checks.
    fn visible(tokens: &[Token]) -> Vec<(TokenKind, String)> {
        tokens
            .iter()
            .filter(|t| t.kind != TokenKind::IndentMarker)
            .map(|t| (t.kind, t.lexeme.clone()))
            .collect()
    }

    #[test]
    fn test_empty_source() {
        let tokens = lex("");
        assert_eq!(
            kinds_and_lexemes(&tokens),
            vec![
                (TokenKind::IndentMarker, "0".to_string()),
                (TokenKind::EndOfInput, "EOF".to_string()),
            ]
        );
    }

    #[test]
    fn test_simple_assignment() {
        let tokens = lex("x = 1 + 2");
        assert_eq!(
            kinds_and_lexemes(&tokens),
            vec![
                (TokenKind::IndentMarker, "0".to_string()),
                (TokenKind::Identifier, "x".to_string()),
                (TokenKind::Operator, "=".to_string()),
                (TokenKind::Number, "1".to_string()),
                (TokenKind::Operator, "+".to_string()),
                (TokenKind::Number, "2".to_string()),
                (TokenKind::EndOfInput, "EOF".to_string()),
            ]
        );
        assert_eq!(tokens[1].symbol_id, Some(0));
        assert_eq!(tokens[1].location, SourceLocation::new(1, 1));
        assert_eq!(tokens[3].location, SourceLocation::new(1, 5));
    }

    #[test]
    fn test_one_marker_per_line() {
        let tokens = lex("a = 1\n    b = 2\n");
        let markers: Vec<&Token> = tokens.iter().filter(|t| t.is_indent_marker()).collect();
        assert_eq!(markers.len(), 3); // two source lines plus the trailing one
        assert_eq!(markers[0].lexeme, "0");
        assert_eq!(markers[1].lexeme, "1");
        assert_eq!(markers[2].lexeme, "0");
        // Markers sit at the first column of their line
        assert_eq!(markers[1].location, SourceLocation::new(2, 1));
        assert_eq!(markers[2].location, SourceLocation::new(3, 1));
    }

    #[test]
    fn test_tab_counts_as_one_unit() {
        let tokens = lex("\tx = 1");
        assert_eq!(tokens[0].lexeme, "1");
        // Partial units truncate
        let tokens = lex("      x = 1"); // 6 spaces
        assert_eq!(tokens[0].lexeme, "1");
    }

    #[test]
    fn test_blank_line_still_gets_marker() {
        let tokens = lex("a = 1\n\nb = 2");
        let markers: Vec<String> = tokens
            .iter()
            .filter(|t| t.is_indent_marker())
            .map(|t| t.lexeme.clone())
            .collect();
        assert_eq!(markers, vec!["0", "0", "0"]);
    }

    #[test]
    fn test_keywords_and_identifiers() {
        let tokens = lex("def foo"); // def reserved, foo not
        assert_eq!(tokens[1].kind, TokenKind::Keyword);
        assert_eq!(tokens[2].kind, TokenKind::Identifier);
        assert_eq!(tokens[2].symbol_id, Some(0));
    }

    #[test]
    fn test_radix_numbers() {
        let tokens = lex("0x1F 0o17 0b101");
        assert_eq!(tokens[1].lexeme, "0x1F");
        assert_eq!(tokens[2].lexeme, "0o17");
        assert_eq!(tokens[3].lexeme, "0b101");
        assert!(tokens[1..4].iter().all(|t| t.kind == TokenKind::Number));
    }

    #[test]
    fn test_invalid_digit_for_base() {
        let tokens = lex("0b12");
        assert_eq!(tokens[1].kind, TokenKind::Error);
        assert_eq!(tokens[1].lexeme, "Invalid digit for base 2: 0b12");
        // The bad character is re-lexed as its own token
        assert_eq!(tokens[2].kind, TokenKind::Number);
        assert_eq!(tokens[2].lexeme, "2");
    }

    #[test]
    fn test_missing_digits_after_prefix() {
        let tokens = lex("0x");
        assert_eq!(tokens[1].kind, TokenKind::Error);
        assert_eq!(tokens[1].lexeme, "Expected digits after prefix: 0x");
    }

    #[test]
    fn test_leading_zero_number() {
        let tokens = lex("0123");
        assert_eq!(tokens[1].kind, TokenKind::Error);
        assert_eq!(tokens[1].lexeme, "Invalid number with leading zero: 0123");
    }

    #[test]
    fn test_plain_zero_and_zero_float() {
        let tokens = lex("0 0.5");
        assert_eq!(tokens[1].kind, TokenKind::Number);
        assert_eq!(tokens[1].lexeme, "0");
        assert_eq!(tokens[2].kind, TokenKind::Number);
        assert_eq!(tokens[2].lexeme, "0.5");
    }

    #[test]
    fn test_identifier_glued_to_number() {
        let tokens = lex("123abc");
        assert_eq!(tokens[1].kind, TokenKind::Error);
        assert_eq!(tokens[1].lexeme, "123abc");
    }

    #[test]
    fn test_float_literal() {
        let tokens = lex("3.14");
        assert_eq!(tokens[1].kind, TokenKind::Number);
        assert_eq!(tokens[1].lexeme, "3.14");
    }

    #[test]
    fn test_strings() {
        let tokens = lex("\"hello\"");
        assert_eq!(tokens[1].kind, TokenKind::String);
        assert_eq!(tokens[1].lexeme, "hello");

        let tokens = lex("\"\"");
        assert_eq!(tokens[1].kind, TokenKind::String);
        assert_eq!(tokens[1].lexeme, "");
    }

    #[test]
    fn test_triple_quoted_string_spans_lines() {
        let tokens = lex("\"\"\"a\nb\"\"\"");
        assert_eq!(tokens[1].kind, TokenKind::String);
        assert_eq!(tokens[1].lexeme, "a\nb");
    }

    #[test]
    fn test_multiline_string_emits_no_mid_line_marker() {
        let tokens = lex("s = \"\"\"line1\nline2\"\"\"\nt = 1");
        let markers: Vec<&Token> = tokens.iter().filter(|t| t.is_indent_marker()).collect();
        // The newline swallowed by the string starts no new line of tokens
        assert_eq!(markers.len(), 2);
        assert_eq!(markers[0].location, SourceLocation::new(1, 1));
        assert_eq!(markers[1].location, SourceLocation::new(3, 1));
    }

    #[test]
    fn test_unterminated_string() {
        let tokens = lex("\"hello");
        assert_eq!(tokens[1].kind, TokenKind::Error);
        assert_eq!(tokens[1].lexeme, "Unterminated string");

        let tokens = lex("\"hello\nx = 1");
        assert_eq!(tokens[1].kind, TokenKind::Error);
        assert_eq!(tokens[1].lexeme, "Unterminated string");
    }

    #[test]
    fn test_operators() {
        let tokens = lex("a == b != c <= d >= e < f > g = h . i");
        let ops: Vec<String> = tokens
            .iter()
            .filter(|t| t.kind == TokenKind::Operator)
            .map(|t| t.lexeme.clone())
            .collect();
        assert_eq!(ops, vec!["==", "!=", "<=", ">=", "<", ">", "=", "."]);
    }

    #[test]
    fn test_delimiters() {
        let tokens = lex("f(a, b):");
        let delims: Vec<String> = tokens
            .iter()
            .filter(|t| t.kind == TokenKind::Delimiter)
            .map(|t| t.lexeme.clone())
            .collect();
        assert_eq!(delims, vec!["(", ",", ")", ":"]);
    }

    #[test]
    fn test_unrecognized_character() {
        let tokens = lex("@");
        assert_eq!(tokens[1].kind, TokenKind::Error);
        assert_eq!(tokens[1].lexeme, "@");
    }

    #[test]
    fn test_comment_does_not_change_tokens() {
        let with = lex("x = 1 # trailing\ny = 2");
        let without = lex("x = 1\ny = 2");
        assert_eq!(visible(&with), visible(&without));
    }

    #[test]
    fn test_intra_line_whitespace_does_not_change_tokens() {
        let tight = lex("x=1+2");
        let spaced = lex("x  =  1  +  2");
        assert_eq!(visible(&tight), visible(&spaced));
    }

    #[test]
    fn test_positions_are_one_based() {
        let tokens = lex("a = 1\nb = 2");
        for token in tokens.iter().filter(|t| !t.is_end()) {
            assert!(token.location.line >= 1);
            assert!(token.location.column >= 1);
        }
    }

    #[test]
    fn test_seeding_literal_assignments() {
        let mut lexer = Lexer::new("x = 5\ny = 2.5\ns = \"hi\"\nb = True\nz = x + 1");
        lexer.tokenize();
        let symbols = lexer.symbols();
        let entry = symbols.get("x").unwrap();
        assert_eq!((entry.data_type.as_str(), entry.value.as_str()), ("int", "5"));
        let entry = symbols.get("y").unwrap();
        assert_eq!(
            (entry.data_type.as_str(), entry.value.as_str()),
            ("float", "2.5")
        );
        let entry = symbols.get("s").unwrap();
        assert_eq!(
            (entry.data_type.as_str(), entry.value.as_str()),
            ("string", "\"hi\"")
        );
        let entry = symbols.get("b").unwrap();
        assert_eq!(
            (entry.data_type.as_str(), entry.value.as_str()),
            ("bool", "True")
        );
        // Complex RHS leaves both fields unknown
        let entry = symbols.get("z").unwrap();
        assert_eq!(
            (entry.data_type.as_str(), entry.value.as_str()),
            (UNKNOWN, UNKNOWN)
        );
    }

    #[test]
    fn test_seeding_call_shape() {
        let mut lexer = Lexer::new("foo(1, 2)\nbar = foo");
        lexer.tokenize();
        assert_eq!(lexer.symbols().get("foo").unwrap().data_type, "function");
    }

    #[test]
    fn test_lexical_error_records() {
        let tokens = lex("0123\n@");
        let errors = Lexer::lexical_errors(&tokens);
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].lexeme, "Invalid number with leading zero: 0123");
        assert_eq!(errors[1].location.line, 2);
    }
}
