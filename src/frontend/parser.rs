//! Recursive-descent parser for the Python-subset language.
//!
//! The parser consumes the lexer's token stream, resolving
//! indentation-delimited blocks by matching indent markers against an
//! expectation stack. It declares names into a scoped symbol table as it
//! goes and folds constant expressions at parse time, so symbol entries
//! carry textual values alongside inferred types.
//!
//! Parsing never aborts: errors are accumulated and the parser
//! synchronizes to the next statement boundary, so a run over malformed
//! input still yields a (partial) tree.

use crate::frontend::ast::{Node, NodeKind, NumericType};
use crate::frontend::scope::{Role, ScopedSymbolTable, Symbol, UNKNOWN};
use crate::frontend::token::{Token, TokenKind};
use crate::utils::errors::ParseError;

/// Keywords the parser skips to while recovering from an error.
const SYNC_KEYWORDS: [&str; 4] = ["def", "if", "while", "return"];

/// Everything a parse run produces.
#[derive(Debug)]
pub struct ParseOutput {
    /// Root of the (possibly partial) tree
    pub program: Node,
    /// Accumulated syntactic diagnostics
    pub errors: Vec<ParseError>,
    /// Parser symbol table entries in allocation order
    pub symbols: Vec<Symbol>,
}

/// Parse a token stream in one call.
pub fn parse_tokens(tokens: Vec<Token>) -> ParseOutput {
    let mut parser = Parser::new(tokens);
    let program = parser.parse_program();
    let Parser {
        errors, symbols, ..
    } = parser;
    ParseOutput {
        program,
        errors,
        symbols: symbols.entries().to_vec(),
    }
}

/// A parser over an ordered token list ending in `EndOfInput`.
pub struct Parser {
    tokens: Vec<Token>,
    /// Index of the token after `current`
    index: usize,
    current: Token,
    errors: Vec<ParseError>,
    indent_stack: Vec<i64>,
    symbols: ScopedSymbolTable,
}

impl Parser {
    /// Create a parser over the given tokens.
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.is_empty() {
            tokens.push(Token::end_of_input());
        }
        let mut parser = Self {
            tokens,
            index: 0,
            current: Token::end_of_input(),
            errors: Vec::new(),
            indent_stack: vec![0],
            symbols: ScopedSymbolTable::new(),
        };
        parser.advance();
        parser
    }

    /// Parse the whole token stream into a `Program` node.
    pub fn parse_program(&mut self) -> Node {
        let mut program = Node::program();
        while !self.current.is_end() {
            if self.current.is_indent_marker() {
                self.expect_indent(0);
            }
            if let Some(stmt) = self.parse_statement() {
                program.add_child(stmt);
            }
        }
        program
    }

    /// Diagnostics accumulated so far.
    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    /// The scoped symbol table.
    pub fn symbols(&self) -> &ScopedSymbolTable {
        &self.symbols
    }

    // Cursor helpers

    fn advance(&mut self) {
        if self.index < self.tokens.len() {
            self.current = self.tokens[self.index].clone();
            self.index += 1;
        }
    }

    fn peek_next(&self) -> Token {
        self.tokens
            .get(self.index)
            .cloned()
            .unwrap_or_else(Token::end_of_input)
    }

    fn error(&mut self, message: impl Into<String>) {
        self.errors
            .push(ParseError::new(self.current.location, message));
    }

    fn match_token(&mut self, kind: TokenKind, lexeme: Option<&str>) -> bool {
        if self.current.kind == kind && lexeme.map(|l| self.current.lexeme == l).unwrap_or(true) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind, lexeme: Option<&str>, message: &str) {
        if !self.match_token(kind, lexeme) {
            self.error(message);
            self.synchronize();
        }
    }

    /// Skip forward to the next statement boundary: end of input, an indent
    /// marker, or a synchronizing keyword.
    fn synchronize(&mut self) {
        while !self.current.is_end()
            && !self.current.is_indent_marker()
            && !(self.current.kind == TokenKind::Keyword
                && SYNC_KEYWORDS.contains(&self.current.lexeme.as_str()))
        {
            self.advance();
        }
    }

    /// Check the marker opening a block line against the expected level.
    ///
    /// The marker is consumed whenever present; consecutive markers (blank
    /// lines) are checked against the same expectation.
    fn expect_indent(&mut self, expected: i64) {
        if !self.current.is_indent_marker() {
            self.error("Expected indentation at start of block");
            return;
        }
        if self.current.indent_level() != expected {
            self.error("Incorrect indentation level");
        }
        self.advance();
        if self.current.is_indent_marker() {
            self.expect_indent(expected);
        }
    }

    // Statements

    fn parse_statement(&mut self) -> Option<Node> {
        if self.current.is_end() {
            return None;
        }

        if self.current.kind == TokenKind::Identifier {
            let next = self.peek_next();
            if next.lexeme != "=" && next.lexeme != "(" {
                self.error(format!(
                    "Invalid statement starting with identifier: {}",
                    self.current.lexeme
                ));
                self.advance();
                return None;
            }
        }

        match self.current.kind {
            TokenKind::Keyword => {
                match self.current.lexeme.as_str() {
                    "if" => return self.parse_if(),
                    "while" => return self.parse_while(),
                    "def" => return self.parse_function_def(),
                    "return" => return self.parse_return(),
                    "for" => return self.parse_for(),
                    "elif" | "else" => {
                        if self.symbols.current_scope().starts_with("if block") {
                            // Control returns to the enclosing if handler
                            return None;
                        }
                        self.error(format!(
                            "Unexpected token at start of statement: {}",
                            self.current.lexeme
                        ));
                        self.synchronize();
                        return None;
                    }
                    _ => {}
                }
            }
            TokenKind::Identifier => {
                if self.peek_next().lexeme == "(" {
                    return self.parse_call_statement();
                }
                return self.parse_assignment();
            }
            _ => {
                self.error(format!(
                    "Unexpected token at start of statement: {}",
                    self.current.lexeme
                ));
                self.advance();
                return None;
            }
        }

        self.error("Invalid statement");
        self.advance();
        None
    }

    fn parse_assignment(&mut self) -> Option<Node> {
        let id_token = self.current.clone();
        self.expect(TokenKind::Identifier, None, "Expected identifier for assignment");

        if self.current.is(TokenKind::Operator, "=") {
            self.expect(TokenKind::Operator, Some("="), "Expected '=' in assignment");
        } else {
            self.expect(TokenKind::Assignment, Some("="), "Expected '=' in assignment");
        }

        let expr = match self.parse_expression() {
            Some(expr) => expr,
            None => {
                self.error("Expected expression after '='");
                return None;
            }
        };

        let value = self.evaluate_expression(&expr);
        let mut data_type = self.type_from_node(&expr);
        if data_type == UNKNOWN {
            data_type = "expr".to_string();
        }
        self.symbols
            .declare(&id_token.lexeme, &data_type, Role::Variable, &value);

        let mut node = Node::new(NodeKind::Assign, id_token.clone());
        node.add_child(Node::new(NodeKind::Identifier, id_token));
        node.add_child(expr);
        Some(node)
    }

    fn parse_return(&mut self) -> Option<Node> {
        let return_token = self.current.clone();
        self.expect(TokenKind::Keyword, Some("return"), "Expected 'return' keyword");

        let expr = self.parse_expression();
        let (return_type, return_value) = match &expr {
            Some(expr) => (self.type_from_node(expr), self.evaluate_expression(expr)),
            None => ("void".to_string(), "void".to_string()),
        };

        // Inside a function scope, the return refines the function's entry
        let scope = self.symbols.current_scope().to_string();
        if let Some(function_name) = scope.strip_suffix(" (function)") {
            let is_function = self
                .symbols
                .entry(function_name)
                .map(|e| e.role == Role::Function)
                .unwrap_or(false);
            if is_function {
                self.symbols.update_type(function_name, &return_type);
                self.symbols.update_value(function_name, &return_value);
            }
        }

        let mut node = Node::new(NodeKind::Return, return_token);
        if let Some(expr) = expr {
            node.add_child(expr);
        }
        Some(node)
    }

    fn parse_if(&mut self) -> Option<Node> {
        let if_token = self.current.clone();
        self.expect(TokenKind::Keyword, Some("if"), "Expected 'if' keyword");

        let condition = self.parse_expression();
        self.expect(
            TokenKind::Delimiter,
            Some(":"),
            "Expected ':' after if condition",
        );

        let if_indent = self.indent_stack.last().copied().unwrap_or(0);
        let block_indent = if_indent + 1;
        self.indent_stack.push(block_indent);
        self.expect_indent(block_indent);

        self.symbols.begin_scope("if block");
        let mut then_block = Node::new(NodeKind::Block, self.current.clone());
        while !self.current.is_end()
            && (!self.current.is_indent_marker() || self.current.indent_level() >= block_indent)
        {
            if self.current.is_indent_marker() {
                self.expect_indent(block_indent);
                continue;
            }
            match self.parse_statement() {
                Some(stmt) => then_block.add_child(stmt),
                // A yielded None is how elif/else hand control back
                None => break,
            }
        }
        self.symbols.end_scope();
        self.indent_stack.pop();

        // elif chains attach only at the if's own indentation level
        let mut elif_branches = Vec::new();
        loop {
            if self.current.is_indent_marker() {
                if self.current.indent_level() != if_indent {
                    break;
                }
                self.advance();
            }
            if !self.current.is(TokenKind::Keyword, "elif") {
                break;
            }

            let elif_token = self.current.clone();
            self.expect(TokenKind::Keyword, Some("elif"), "Expected 'elif' keyword");
            let elif_condition = self.parse_expression();
            self.expect(
                TokenKind::Delimiter,
                Some(":"),
                "Expected ':' after elif condition",
            );

            let elif_block_indent = if_indent + 1;
            self.indent_stack.push(elif_block_indent);
            self.expect_indent(elif_block_indent);

            self.symbols.begin_scope("elif block");
            let mut elif_block = Node::new(NodeKind::Block, self.current.clone());
            while !self.current.is_end()
                && (!self.current.is_indent_marker()
                    || self.current.indent_level() >= elif_block_indent)
            {
                if self.current.is_indent_marker() {
                    self.expect_indent(elif_block_indent);
                    continue;
                }
                if let Some(stmt) = self.parse_statement() {
                    elif_block.add_child(stmt);
                }
            }
            self.symbols.end_scope();
            self.indent_stack.pop();

            let mut elif_node = Node::new(NodeKind::Elif, elif_token);
            if let Some(condition) = elif_condition {
                elif_node.add_child(condition);
            }
            elif_node.add_child(elif_block);
            elif_branches.push(elif_node);
        }

        // An else at the same level as the if closes the chain
        let mut else_block = None;
        if self.current.is_indent_marker() {
            if self.current.indent_level() == if_indent {
                self.advance();
                if self.current.is(TokenKind::Keyword, "else") {
                    else_block = self.parse_else();
                }
            }
        } else if self.current.is(TokenKind::Keyword, "else") {
            else_block = self.parse_else();
        }

        let mut node = Node::new(NodeKind::If, if_token);
        if let Some(condition) = condition {
            node.add_child(condition);
        }
        node.add_child(then_block);
        for elif in elif_branches {
            node.add_child(elif);
        }
        if let Some(block) = else_block {
            node.add_child(block);
        }
        Some(node)
    }

    fn parse_else(&mut self) -> Option<Node> {
        let else_token = self.current.clone();
        self.expect(TokenKind::Keyword, Some("else"), "Expected 'else' keyword");
        self.expect(TokenKind::Delimiter, Some(":"), "Expected ':' after else");

        let current_indent = self.indent_stack.last().copied().unwrap_or(0);
        let block_indent = current_indent + 1;
        self.indent_stack.push(block_indent);
        self.expect_indent(block_indent);

        self.symbols.begin_scope("else block");
        // The else keyword token marks this block as the else branch
        let mut block = Node::new(NodeKind::Block, else_token);
        while !self.current.is_end()
            && (!self.current.is_indent_marker() || self.current.indent_level() >= block_indent)
        {
            if self.current.is_indent_marker() {
                self.expect_indent(block_indent);
                continue;
            }
            if let Some(stmt) = self.parse_statement() {
                block.add_child(stmt);
            }
        }
        self.symbols.end_scope();
        self.indent_stack.pop();

        Some(block)
    }

    fn parse_for(&mut self) -> Option<Node> {
        let for_token = self.current.clone();
        self.expect(TokenKind::Keyword, Some("for"), "Expected 'for' keyword");

        let var = match self.parse_primary() {
            Some(node) if node.kind == NodeKind::Identifier => node,
            _ => {
                self.error("Expected identifier after 'for'");
                return None;
            }
        };

        self.expect(
            TokenKind::Keyword,
            Some("in"),
            "Expected 'in' after loop variable",
        );

        let iterable = match self.parse_expression() {
            Some(expr) => expr,
            None => {
                self.error("Expected iterable expression after 'in'");
                return None;
            }
        };

        self.expect(
            TokenKind::Delimiter,
            Some(":"),
            "Expected ':' after for loop header",
        );

        let current_indent = self.indent_stack.last().copied().unwrap_or(0);
        let block_indent = current_indent + 1;
        self.indent_stack.push(block_indent);
        self.expect_indent(block_indent);

        self.symbols.begin_scope("for loop");
        let mut body = Node::new(NodeKind::Block, self.current.clone());
        while !self.current.is_end()
            && (!self.current.is_indent_marker() || self.current.indent_level() >= block_indent)
        {
            if self.current.is_indent_marker() {
                self.expect_indent(block_indent);
                continue;
            }
            if let Some(stmt) = self.parse_statement() {
                body.add_child(stmt);
            }
        }
        self.symbols.end_scope();
        self.indent_stack.pop();

        let mut node = Node::new(NodeKind::For, for_token);
        node.add_child(var);
        node.add_child(iterable);
        node.add_child(body);
        Some(node)
    }

    fn parse_while(&mut self) -> Option<Node> {
        let while_token = self.current.clone();
        self.expect(TokenKind::Keyword, Some("while"), "Expected 'while' keyword");

        let condition = self.parse_expression();
        self.expect(
            TokenKind::Delimiter,
            Some(":"),
            "Expected ':' after while condition",
        );

        let current_indent = self.indent_stack.last().copied().unwrap_or(0);
        let block_indent = current_indent + 1;
        self.indent_stack.push(block_indent);
        self.expect_indent(block_indent);

        self.symbols.begin_scope("while block");
        let mut body = Node::new(NodeKind::Block, self.current.clone());
        while !self.current.is_end()
            && (!self.current.is_indent_marker() || self.current.indent_level() >= block_indent)
        {
            if self.current.is_indent_marker() {
                self.expect_indent(block_indent);
                continue;
            }
            if let Some(stmt) = self.parse_statement() {
                body.add_child(stmt);
            }
        }
        self.symbols.end_scope();
        self.indent_stack.pop();

        let mut node = Node::new(NodeKind::While, while_token);
        if let Some(condition) = condition {
            node.add_child(condition);
        }
        node.add_child(body);
        Some(node)
    }

    fn parse_function_def(&mut self) -> Option<Node> {
        let def_token = self.current.clone();
        self.expect(TokenKind::Keyword, Some("def"), "Expected 'def' keyword");

        let name_token = self.current.clone();
        self.expect(TokenKind::Identifier, None, "Expected function name after 'def'");

        // The function lives in the enclosing scope; its parameters and
        // body live in the function's own scope.
        self.symbols
            .declare(&name_token.lexeme, "function", Role::Function, UNKNOWN);
        self.symbols
            .begin_scope(&format!("{} (function)", name_token.lexeme));

        self.expect(
            TokenKind::Delimiter,
            Some("("),
            "Expected '(' after function name",
        );

        let mut params = Vec::new();
        if self.current.kind == TokenKind::Identifier {
            self.symbols
                .declare(&self.current.lexeme, UNKNOWN, Role::Parameter, UNKNOWN);
            params.push(self.current.lexeme.clone());
            self.advance();

            while self.match_token(TokenKind::Delimiter, Some(",")) {
                if self.current.kind != TokenKind::Identifier {
                    self.error("Expected parameter name after ','");
                    break;
                }
                self.symbols
                    .declare(&self.current.lexeme, UNKNOWN, Role::Parameter, UNKNOWN);
                params.push(self.current.lexeme.clone());
                self.advance();
            }
        }

        self.expect(
            TokenKind::Delimiter,
            Some(")"),
            "Expected ')' after parameter list",
        );
        self.expect(
            TokenKind::Delimiter,
            Some(":"),
            "Expected ':' after function definition",
        );

        let current_indent = self.indent_stack.last().copied().unwrap_or(0);
        let block_indent = current_indent + 1;
        self.indent_stack.push(block_indent);
        self.expect_indent(block_indent);

        let mut body = Node::new(NodeKind::Block, self.current.clone());
        while !self.current.is_end()
            && (!self.current.is_indent_marker() || self.current.indent_level() >= block_indent)
        {
            if self.current.is_indent_marker() {
                self.expect_indent(block_indent);
                continue;
            }
            if let Some(stmt) = self.parse_statement() {
                body.add_child(stmt);
            }
        }
        self.symbols.end_scope();
        self.indent_stack.pop();

        let mut node = Node::new(
            NodeKind::FunctionDef {
                name: name_token.lexeme.clone(),
                params,
            },
            def_token.clone(),
        );
        node.add_child(Node::new(
            NodeKind::Identifier,
            Token::new(TokenKind::Identifier, name_token.lexeme, def_token.location),
        ));
        node.add_child(body);
        Some(node)
    }

    fn parse_call_statement(&mut self) -> Option<Node> {
        let name_token = self.current.clone();
        self.expect(
            TokenKind::Identifier,
            None,
            "Expected identifier for function call",
        );
        self.expect(
            TokenKind::Delimiter,
            Some("("),
            "Expected '(' in function call",
        );

        let mut args = Vec::new();
        if !self.match_token(TokenKind::Delimiter, Some(")")) {
            loop {
                match self.parse_expression() {
                    Some(arg) => args.push(arg),
                    None => {
                        self.error("Expected expression in function arguments");
                        break;
                    }
                }
                if !self.match_token(TokenKind::Delimiter, Some(",")) {
                    break;
                }
            }
            self.expect(
                TokenKind::Delimiter,
                Some(")"),
                "Expected ')' after arguments",
            );
        }

        // A call to an unseen name declares it as a function of unknown type
        let known_function = self
            .symbols
            .entry(&name_token.lexeme)
            .map(|e| e.role == Role::Function)
            .unwrap_or(false);
        if !known_function {
            self.symbols
                .declare(&name_token.lexeme, UNKNOWN, Role::Function, UNKNOWN);
        }

        let mut node = Node::new(NodeKind::Call, name_token.clone());
        node.add_child(Node::new(NodeKind::Identifier, name_token));
        for arg in args {
            node.add_child(arg);
        }
        Some(node)
    }

    fn parse_call_expression(&mut self) -> Option<Node> {
        let name_token = self.current.clone();
        self.expect(TokenKind::Identifier, None, "Expected function name");

        if !self.match_token(TokenKind::Delimiter, Some("(")) {
            self.error("Expected '(' after function name");
            return None;
        }

        let mut args = Vec::new();
        if !self.match_token(TokenKind::Delimiter, Some(")")) {
            loop {
                match self.parse_expression() {
                    Some(arg) => args.push(arg),
                    None => {
                        self.error("Expected expression in function arguments");
                        break;
                    }
                }
                if !self.match_token(TokenKind::Delimiter, Some(",")) {
                    break;
                }
            }
            if !self.match_token(TokenKind::Delimiter, Some(")")) {
                self.error("Expected ')' after function arguments");
                return None;
            }
        }

        let mut node = Node::new(NodeKind::Call, name_token.clone());
        node.add_child(Node::new(NodeKind::Identifier, name_token));
        for arg in args {
            node.add_child(arg);
        }
        Some(node)
    }

    // Expressions, lowest precedence first

    fn parse_expression(&mut self) -> Option<Node> {
        if self.current.is_end() {
            self.error("Unexpected end of file while parsing expression");
            return None;
        }
        self.parse_logical_or()
    }

    fn parse_logical_or(&mut self) -> Option<Node> {
        let mut node = self.parse_logical_and()?;
        loop {
            let op = self.current.clone();
            if !self.match_token(TokenKind::Keyword, Some("or")) {
                break;
            }
            match self.parse_logical_and() {
                Some(right) => node = binary(op, node, right),
                None => {
                    self.error("Expected right-hand expression after 'or'");
                    return Some(node);
                }
            }
        }
        Some(node)
    }

    fn parse_logical_and(&mut self) -> Option<Node> {
        let mut node = self.parse_equality()?;
        loop {
            let op = self.current.clone();
            if !self.match_token(TokenKind::Keyword, Some("and")) {
                break;
            }
            match self.parse_equality() {
                Some(right) => node = binary(op, node, right),
                None => {
                    self.error("Expected right-hand expression after 'and'");
                    return Some(node);
                }
            }
        }
        Some(node)
    }

    fn parse_equality(&mut self) -> Option<Node> {
        let mut node = self.parse_relational()?;
        loop {
            let op = self.current.clone();
            if !(self.match_token(TokenKind::Operator, Some("=="))
                || self.match_token(TokenKind::Operator, Some("!=")))
            {
                break;
            }
            match self.parse_relational() {
                Some(right) => node = binary(op, node, right),
                None => {
                    self.error("Expected right-hand expression after operator");
                    return None;
                }
            }
        }
        Some(node)
    }

    fn parse_relational(&mut self) -> Option<Node> {
        let mut node = self.parse_term()?;
        loop {
            let op = self.current.clone();
            if !(self.match_token(TokenKind::Operator, Some("<"))
                || self.match_token(TokenKind::Operator, Some(">"))
                || self.match_token(TokenKind::Operator, Some("<="))
                || self.match_token(TokenKind::Operator, Some(">=")))
            {
                break;
            }
            match self.parse_term() {
                Some(right) => node = binary(op, node, right),
                None => {
                    self.error("Expected right-hand expression after comparison");
                    return None;
                }
            }
        }
        Some(node)
    }

    fn parse_term(&mut self) -> Option<Node> {
        let mut node = self.parse_factor()?;
        loop {
            let op = self.current.clone();
            if !(self.match_token(TokenKind::Operator, Some("+"))
                || self.match_token(TokenKind::Operator, Some("-")))
            {
                break;
            }
            match self.parse_factor() {
                Some(right) => node = binary(op, node, right),
                None => {
                    self.error("Expected right-hand expression after operator");
                    return None;
                }
            }
        }
        Some(node)
    }

    fn parse_factor(&mut self) -> Option<Node> {
        let mut node = self.parse_unary()?;
        loop {
            let op = self.current.clone();
            if !(self.match_token(TokenKind::Operator, Some("*"))
                || self.match_token(TokenKind::Operator, Some("/"))
                || self.match_token(TokenKind::Operator, Some("%")))
            {
                break;
            }
            match self.parse_unary() {
                Some(right) => node = binary(op, node, right),
                None => {
                    self.error("Expected right-hand expression after operator");
                    return None;
                }
            }
        }
        Some(node)
    }

    fn parse_unary(&mut self) -> Option<Node> {
        let op = self.current.clone();
        if self.match_token(TokenKind::Operator, Some("-"))
            || self.match_token(TokenKind::Keyword, Some("not"))
        {
            return match self.parse_unary() {
                Some(operand) => {
                    let mut node = Node::new(NodeKind::UnaryOp, op);
                    node.add_child(operand);
                    Some(node)
                }
                None => {
                    self.error("Expected expression after unary operator");
                    None
                }
            };
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Option<Node> {
        if self.current.kind == TokenKind::Number {
            let num_token = self.current.clone();
            self.advance();
            return match parse_numeric(&num_token.lexeme) {
                Some(value) => {
                    let ty = if num_token.lexeme.contains('.') {
                        NumericType::Float
                    } else {
                        NumericType::Int
                    };
                    Some(Node::new(NodeKind::Number { value, ty }, num_token))
                }
                None => {
                    self.errors
                        .push(ParseError::new(num_token.location, "Invalid number format"));
                    None
                }
            };
        }

        if self.current.kind == TokenKind::String {
            let token = self.current.clone();
            self.advance();
            return Some(Node::new(NodeKind::Str, token));
        }

        if self.current.kind == TokenKind::Keyword
            && (self.current.lexeme == "True" || self.current.lexeme == "False")
        {
            let token = self.current.clone();
            self.advance();
            return Some(Node::new(NodeKind::Boolean, token));
        }

        if self.current.kind == TokenKind::Identifier {
            if self.peek_next().lexeme == "(" {
                return self.parse_call_expression();
            }
            let token = self.current.clone();
            self.advance();
            return Some(Node::new(NodeKind::Identifier, token));
        }

        if self.match_token(TokenKind::Delimiter, Some("(")) {
            let expr = self.parse_expression();
            self.expect(
                TokenKind::Delimiter,
                Some(")"),
                "Expected ')' after expression",
            );
            return expr;
        }

        self.error("Unexpected token in expression");
        self.advance();
        None
    }

    // Constant folding and type inference

    /// Fold an expression into its textual value.
    fn evaluate_expression(&self, node: &Node) -> String {
        match &node.kind {
            NodeKind::BinaryOp => {
                let left = node
                    .children
                    .first()
                    .map(|c| self.evaluate_expression(c))
                    .unwrap_or_else(|| UNKNOWN.to_string());
                let right = node
                    .children
                    .get(1)
                    .map(|c| self.evaluate_expression(c))
                    .unwrap_or_else(|| UNKNOWN.to_string());
                let op = node.token.lexeme.as_str();

                match op {
                    "and" => bool_text(truthy(&left) && truthy(&right)),
                    "or" => bool_text(truthy(&left) || truthy(&right)),
                    _ => match (parse_numeric(&left), parse_numeric(&right)) {
                        (Some(l), Some(r)) => match op {
                            "+" => format_number(l + r),
                            "-" => format_number(l - r),
                            "*" => format_number(l * r),
                            "/" => {
                                if r == 0.0 {
                                    "DivisionByZeroError".to_string()
                                } else {
                                    format_number(l / r)
                                }
                            }
                            "%" => {
                                if r as i64 == 0 {
                                    "DivisionByZeroError".to_string()
                                } else {
                                    ((l as i64) % (r as i64)).to_string()
                                }
                            }
                            "==" => bool_text(l == r),
                            "!=" => bool_text(l != r),
                            "<" => bool_text(l < r),
                            ">" => bool_text(l > r),
                            "<=" => bool_text(l <= r),
                            ">=" => bool_text(l >= r),
                            _ => format!("{} {} {}", left, op, right),
                        },
                        _ => format!("{} {} {}", left, op, right),
                    },
                }
            }
            NodeKind::UnaryOp => {
                let operand = node
                    .children
                    .first()
                    .map(|c| self.evaluate_expression(c))
                    .unwrap_or_else(|| UNKNOWN.to_string());
                let op = node.token.lexeme.as_str();

                if op == "not" {
                    return bool_text(!truthy(&operand));
                }
                match parse_numeric(&operand) {
                    Some(n) if op == "-" => format_number(-n),
                    Some(_) if op == "+" => operand,
                    _ => format!("{} {}", op, operand),
                }
            }
            NodeKind::Identifier => match self.symbols.entry(&node.token.lexeme) {
                Some(entry) => match entry.value.as_str() {
                    "true" => "True".to_string(),
                    "false" => "False".to_string(),
                    UNKNOWN => node.token.lexeme.clone(),
                    value => value.to_string(),
                },
                None => node.token.lexeme.clone(),
            },
            NodeKind::Number { .. } | NodeKind::Str | NodeKind::Boolean => {
                node.token.lexeme.clone()
            }
            NodeKind::Call => {
                let callee = node
                    .children
                    .first()
                    .map(|c| c.token.lexeme.as_str())
                    .unwrap_or("");
                match self.symbols.entry(callee) {
                    Some(entry) if entry.role == Role::Function => entry.value.clone(),
                    _ => UNKNOWN.to_string(),
                }
            }
            _ => UNKNOWN.to_string(),
        }
    }

    /// Infer the textual type tag of an expression.
    fn type_from_node(&self, node: &Node) -> String {
        match &node.kind {
            NodeKind::Number { ty, .. } => ty.to_string(),
            NodeKind::Str => "string".to_string(),
            NodeKind::Boolean => "boolean".to_string(),
            NodeKind::Identifier => self
                .symbols
                .entry(&node.token.lexeme)
                .map(|e| e.data_type.clone())
                .unwrap_or_else(|| UNKNOWN.to_string()),
            NodeKind::Call => {
                let callee = node
                    .children
                    .first()
                    .map(|c| c.token.lexeme.as_str())
                    .unwrap_or("");
                match self.symbols.entry(callee) {
                    Some(entry) if entry.role == Role::Function => entry.data_type.clone(),
                    _ => UNKNOWN.to_string(),
                }
            }
            NodeKind::BinaryOp => {
                // Arithmetic over two numeric operands keeps a numeric type
                if matches!(node.token.lexeme.as_str(), "+" | "-" | "*" | "/" | "%") {
                    let left = node.children.first().map(|c| self.type_from_node(c));
                    let right = node.children.get(1).map(|c| self.type_from_node(c));
                    if let (Some(left), Some(right)) = (left, right) {
                        let numeric = |t: &str| t == "int" || t == "float";
                        if numeric(&left) && numeric(&right) {
                            if left == "int" && right == "int" {
                                return "int".to_string();
                            }
                            return "float".to_string();
                        }
                    }
                }
                UNKNOWN.to_string()
            }
            _ => UNKNOWN.to_string(),
        }
    }
}

fn binary(op: Token, left: Node, right: Node) -> Node {
    let mut node = Node::new(NodeKind::BinaryOp, op);
    node.add_child(left);
    node.add_child(right);
    node
}

/// Read a textual operand as a number; accepts decimal and the lexer's
/// `0x`/`0o`/`0b` radix forms.
fn parse_numeric(text: &str) -> Option<f64> {
    let lower = text.to_ascii_lowercase();
    if let Some(rest) = lower.strip_prefix("0x") {
        return i64::from_str_radix(rest, 16).ok().map(|v| v as f64);
    }
    if let Some(rest) = lower.strip_prefix("0o") {
        return i64::from_str_radix(rest, 8).ok().map(|v| v as f64);
    }
    if let Some(rest) = lower.strip_prefix("0b") {
        return i64::from_str_radix(rest, 2).ok().map(|v| v as f64);
    }
    text.parse::<f64>().ok()
}

/// Six-decimal rendering used for folded arithmetic results.
fn format_number(value: f64) -> String {
    format!("{:.6}", value)
}

fn bool_text(value: bool) -> String {
    if value { "True" } else { "False" }.to_string()
}

fn truthy(text: &str) -> bool {
    text == "True" || text == "1"
}
