//! Abstract syntax tree for the Python-subset language.
//!
//! Nodes form a tagged variant; each node owns its ordered children and
//! the token it originated from, so destruction is recursive and no
//! back-edges exist. The indented text rendering is what the host shows
//! in its tree view; its structure is contractual, the exact glyphs are
//! not.

use crate::frontend::token::{Token, TokenKind};
use crate::utils::location::SourceLocation;
use serde::Serialize;
use std::fmt;

/// Type tag carried by a number literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NumericType {
    /// No decimal point in the lexeme
    Int,
    /// Decimal point present
    Float,
}

impl fmt::Display for NumericType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumericType::Int => write!(f, "int"),
            NumericType::Float => write!(f, "float"),
        }
    }
}

/// The kind of a syntax node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum NodeKind {
    /// Root; children are the top-level statements
    Program,
    /// Numeric literal with its parsed value and type tag
    Number {
        /// Parsed numeric value
        value: f64,
        /// `int` or `float`
        ty: NumericType,
    },
    /// String literal
    Str,
    /// `True` or `False`
    Boolean,
    /// Name reference
    Identifier,
    /// Two children: left, right; the token holds the operator
    BinaryOp,
    /// One child: operand; the token holds the operator
    UnaryOp,
    /// Two children: target identifier, value expression
    Assign,
    /// Children: condition, then-block, zero or more `Elif`, optional else block
    If,
    /// Two children: condition, then-block
    Elif,
    /// Two children: condition, body
    While,
    /// Three children: loop variable, iterable, body
    For,
    /// Children: name identifier, body
    FunctionDef {
        /// Function name
        name: String,
        /// Parameter names in declaration order
        params: Vec<String>,
    },
    /// Zero or one child: the returned expression
    Return,
    /// Children: callee identifier, then the argument expressions
    Call,
    /// Statement sequence; the else-branch variant carries token lexeme `else`
    Block,
}

/// A node of the syntax tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    /// What this node is
    pub kind: NodeKind,
    /// The originating token (lines/columns preserved from the lexer)
    pub token: Token,
    /// Ordered, exclusively owned children
    pub children: Vec<Node>,
}

impl Node {
    /// Create a childless node.
    pub fn new(kind: NodeKind, token: Token) -> Self {
        Self {
            kind,
            token,
            children: Vec::new(),
        }
    }

    /// Create the program root.
    pub fn program() -> Self {
        Node::new(
            NodeKind::Program,
            Token::new(TokenKind::EndOfInput, "Program", SourceLocation::start()),
        )
    }

    /// Append a child.
    pub fn add_child(&mut self, child: Node) {
        self.children.push(child);
    }

    /// Display name of the node kind. A `Block` whose token lexeme is
    /// `else` reports itself as `Else`.
    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            NodeKind::Program => "Program",
            NodeKind::Number { .. } => "Number",
            NodeKind::Str => "String",
            NodeKind::Boolean => "Boolean",
            NodeKind::Identifier => "Identifier",
            NodeKind::BinaryOp => "BinaryOp",
            NodeKind::UnaryOp => "UnaryOp",
            NodeKind::Assign => "Assign",
            NodeKind::If => "If",
            NodeKind::Elif => "Elif",
            NodeKind::While => "While",
            NodeKind::For => "For",
            NodeKind::FunctionDef { .. } => "FunctionDef",
            NodeKind::Return => "Return",
            NodeKind::Call => "Call",
            NodeKind::Block => {
                if self.token.lexeme == "else" {
                    "Else"
                } else {
                    "Block"
                }
            }
        }
    }

    /// Left operand of a binary operation.
    pub fn left(&self) -> Option<&Node> {
        match self.kind {
            NodeKind::BinaryOp => self.children.first(),
            _ => None,
        }
    }

    /// Right operand of a binary operation.
    pub fn right(&self) -> Option<&Node> {
        match self.kind {
            NodeKind::BinaryOp => self.children.get(1),
            _ => None,
        }
    }

    /// Operand of a unary operation.
    pub fn operand(&self) -> Option<&Node> {
        match self.kind {
            NodeKind::UnaryOp => self.children.first(),
            _ => None,
        }
    }

    /// Condition of an `If`, `Elif` or `While`.
    pub fn condition(&self) -> Option<&Node> {
        match self.kind {
            NodeKind::If | NodeKind::Elif | NodeKind::While => self.children.first(),
            _ => None,
        }
    }

    /// The `Elif` children of an `If`, in source order.
    pub fn elif_branches(&self) -> Vec<&Node> {
        match self.kind {
            NodeKind::If => self
                .children
                .iter()
                .skip(2)
                .filter(|c| c.kind == NodeKind::Elif)
                .collect(),
            _ => Vec::new(),
        }
    }

    /// The else branch of an `If`: the last child reporting itself as `Else`.
    pub fn else_branch(&self) -> Option<&Node> {
        match self.kind {
            NodeKind::If => self
                .children
                .iter()
                .skip(2)
                .rev()
                .find(|c| c.kind_name() == "Else"),
            _ => None,
        }
    }

    /// Render the tree as indented text with box-drawing connectors.
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.render_into(&mut out, "", true);
        out
    }

    /// JSON projection of the tree for the host.
    ///
    /// Each node becomes `{"type": ..., "value": ..., "children": [...]}`;
    /// `value` is omitted for `Program`, `Assign` and `Call` nodes, and
    /// `children` is omitted when empty.
    pub fn to_json(&self) -> serde_json::Value {
        let node_type = self.kind_name();
        let mut obj = serde_json::Map::new();
        obj.insert("type".to_string(), serde_json::Value::from(node_type));

        if !matches!(node_type, "Program" | "Assign" | "Call") {
            obj.insert(
                "value".to_string(),
                serde_json::Value::from(self.token.lexeme.as_str()),
            );
        }

        if !self.children.is_empty() {
            let children: Vec<serde_json::Value> =
                self.children.iter().map(Node::to_json).collect();
            obj.insert("children".to_string(), serde_json::Value::Array(children));
        }

        serde_json::Value::Object(obj)
    }

    fn render_into(&self, out: &mut String, prefix: &str, is_last: bool) {
        let child_prefix = format!("{}{}", prefix, if is_last { "    " } else { "│   " });

        match &self.kind {
            NodeKind::Program => {
                push_line(out, prefix, is_last, "Program");
                self.render_children(out, &child_prefix);
            }
            NodeKind::Number { .. }
            | NodeKind::Str
            | NodeKind::Boolean
            | NodeKind::Identifier => {
                push_line(
                    out,
                    prefix,
                    is_last,
                    &format!("{} [{}]", self.kind_name(), self.token.lexeme),
                );
            }
            NodeKind::BinaryOp => {
                push_line(out, prefix, is_last, "BinaryOp");
                if let Some(left) = self.children.first() {
                    left.render_into(out, &child_prefix, false);
                }
                push_line(out, &child_prefix, false, &self.token.lexeme);
                if let Some(right) = self.children.get(1) {
                    right.render_into(out, &child_prefix, true);
                }
            }
            NodeKind::UnaryOp => {
                push_line(
                    out,
                    prefix,
                    is_last,
                    &format!("UnaryOp [{}]", self.token.lexeme),
                );
                if let Some(operand) = self.children.first() {
                    operand.render_into(out, &child_prefix, true);
                }
            }
            NodeKind::Assign => {
                push_line(out, prefix, is_last, "Assignment");
                if let Some(target) = self.children.first() {
                    target.render_into(out, &child_prefix, false);
                }
                push_line(out, &child_prefix, false, "Operator [=]");
                if let Some(value) = self.children.get(1) {
                    value.render_into(out, &child_prefix, true);
                }
            }
            NodeKind::If => {
                push_line(out, prefix, is_last, "If");
                if let Some(condition) = self.children.first() {
                    condition.render_into(out, &child_prefix, false);
                }
                let only_then = self.children.len() <= 2;
                if let Some(then_block) = self.children.get(1) {
                    push_line(out, &child_prefix, only_then, "Then");
                    let then_prefix =
                        format!("{}{}", child_prefix, if only_then { "    " } else { "│   " });
                    then_block.render_into(out, &then_prefix, true);
                }
                let rest = &self.children[self.children.len().min(2)..];
                for (i, branch) in rest.iter().enumerate() {
                    branch.render_into(out, &child_prefix, i + 1 == rest.len());
                }
            }
            NodeKind::Elif => {
                push_line(out, prefix, is_last, "Elif");
                if let Some(condition) = self.children.first() {
                    condition.render_into(out, &child_prefix, false);
                }
                if let Some(then_block) = self.children.get(1) {
                    then_block.render_into(out, &child_prefix, true);
                }
            }
            NodeKind::While => {
                push_line(out, prefix, is_last, "While");
                if let Some(condition) = self.children.first() {
                    condition.render_into(out, &child_prefix, false);
                }
                if let Some(body) = self.children.get(1) {
                    push_line(out, &child_prefix, true, "Body");
                    let body_prefix = format!("{}    ", child_prefix);
                    body.render_into(out, &body_prefix, true);
                }
            }
            NodeKind::For => {
                push_line(out, prefix, is_last, "For");
                if let Some(var) = self.children.first() {
                    push_line(out, &child_prefix, false, "Variable");
                    let var_prefix = format!("{}│   ", child_prefix);
                    var.render_into(out, &var_prefix, true);
                }
                if let Some(iterable) = self.children.get(1) {
                    push_line(out, &child_prefix, false, "Iterable");
                    let iter_prefix = format!("{}│   ", child_prefix);
                    iterable.render_into(out, &iter_prefix, true);
                }
                if let Some(body) = self.children.get(2) {
                    push_line(out, &child_prefix, true, "Body");
                    let body_prefix = format!("{}    ", child_prefix);
                    body.render_into(out, &body_prefix, true);
                }
            }
            NodeKind::FunctionDef { name, params } => {
                push_line(out, prefix, is_last, &format!("FunctionDef [{}]", name));
                push_line(out, &child_prefix, false, "Parameters");
                let param_prefix = format!("{}│   ", child_prefix);
                for (i, param) in params.iter().enumerate() {
                    push_line(
                        out,
                        &param_prefix,
                        i + 1 == params.len(),
                        &format!("Parameter [{}]", param),
                    );
                }
                if let Some(body) = self.children.get(1) {
                    push_line(out, &child_prefix, true, "Body");
                    let body_prefix = format!("{}    ", child_prefix);
                    body.render_into(out, &body_prefix, true);
                }
            }
            NodeKind::Return => {
                push_line(out, prefix, is_last, "Return");
                if let Some(value) = self.children.first() {
                    value.render_into(out, &child_prefix, true);
                }
            }
            NodeKind::Call => {
                let callee = self
                    .children
                    .first()
                    .map(|c| c.token.lexeme.as_str())
                    .unwrap_or("");
                push_line(out, prefix, is_last, &format!("Call: {}", callee));
                let args = &self.children[self.children.len().min(1)..];
                if !args.is_empty() {
                    push_line(out, &child_prefix, false, "Arguments");
                    let arg_prefix = format!("{}│   ", child_prefix);
                    for (i, arg) in args.iter().enumerate() {
                        arg.render_into(out, &arg_prefix, i + 1 == args.len());
                    }
                }
            }
            NodeKind::Block => {
                push_line(out, prefix, is_last, self.kind_name());
                self.render_children(out, &child_prefix);
            }
        }
    }

    fn render_children(&self, out: &mut String, prefix: &str) {
        let count = self.children.len();
        for (i, child) in self.children.iter().enumerate() {
            child.render_into(out, prefix, i + 1 == count);
        }
    }
}

fn push_line(out: &mut String, prefix: &str, is_last: bool, text: &str) {
    out.push_str(prefix);
    out.push_str(if is_last { "└──" } else { "├──" });
    out.push_str(text);
    out.push('\n');
}
