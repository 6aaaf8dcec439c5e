//! Scoped symbol table populated by the parser.
//!
//! Entries live in a flat, append-only vector so they can be refined in
//! place while ids stay stable; visibility is a stack of frames, each a
//! name-to-id map labelled with its scope name. The global frame is pushed
//! at construction and never popped.

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// Placeholder for a type or value that has not been determined.
pub const UNKNOWN: &str = "unknown";

/// What a name was declared as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Role {
    /// Assignment target
    Variable,
    /// Function definition or call target
    Function,
    /// Function parameter
    Parameter,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Variable => write!(f, "variable"),
            Role::Function => write!(f, "function"),
            Role::Parameter => write!(f, "parameter"),
        }
    }
}

/// One row of the parser symbol table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Symbol {
    /// Allocation order, starting at 0; never reused
    pub id: usize,
    /// Declared name
    pub name: String,
    /// Inferred type, or `unknown`/`expr`
    pub data_type: String,
    /// Folded value, or `unknown`
    pub value: String,
    /// What the name was declared as
    pub role: Role,
    /// Label of the frame the name was declared in
    pub scope: String,
}

#[derive(Debug)]
struct Frame {
    label: String,
    bindings: HashMap<String, usize>,
}

impl Frame {
    fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            bindings: HashMap::new(),
        }
    }
}

/// Stack of lexical scopes over a flat entry vector.
#[derive(Debug)]
pub struct ScopedSymbolTable {
    entries: Vec<Symbol>,
    frames: Vec<Frame>,
}

impl Default for ScopedSymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopedSymbolTable {
    /// Create a table holding only the permanent global frame.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            frames: vec![Frame::new("global")],
        }
    }

    /// Push a new frame with the given label.
    pub fn begin_scope(&mut self, label: &str) {
        self.frames.push(Frame::new(label));
    }

    /// Pop the innermost frame. The global frame is never popped.
    pub fn end_scope(&mut self) {
        if self.frames.len() > 1 {
            self.frames.pop();
        }
    }

    /// Label of the innermost frame.
    pub fn current_scope(&self) -> &str {
        self.frames.last().map(|f| f.label.as_str()).unwrap_or("global")
    }

    /// Declare a name in the current frame.
    ///
    /// A name already bound in the current frame is refined in place: the
    /// type is filled in only while still unknown, the role is replaced,
    /// the value is replaced when the incoming value is known. Otherwise a
    /// fresh entry is appended and bound, even if the same name exists in
    /// an outer frame.
    pub fn declare(&mut self, name: &str, data_type: &str, role: Role, value: &str) {
        let frame = self.frames.last_mut().expect("global frame is permanent");

        if let Some(&id) = frame.bindings.get(name) {
            let entry = &mut self.entries[id];
            if entry.data_type == UNKNOWN {
                entry.data_type = data_type.to_string();
            }
            entry.role = role;
            if value != UNKNOWN {
                entry.value = value.to_string();
            }
            return;
        }

        let id = self.entries.len();
        self.entries.push(Symbol {
            id,
            name: name.to_string(),
            data_type: data_type.to_string(),
            value: value.to_string(),
            role,
            scope: frame.label.clone(),
        });
        frame.bindings.insert(name.to_string(), id);
    }

    /// Overwrite the type of the innermost visible binding of `name`.
    pub fn update_type(&mut self, name: &str, data_type: &str) {
        if let Some(id) = self.lookup(name) {
            self.entries[id].data_type = data_type.to_string();
        }
    }

    /// Overwrite the value of the innermost visible binding of `name`.
    pub fn update_value(&mut self, name: &str, value: &str) {
        if let Some(id) = self.lookup(name) {
            self.entries[id].value = value.to_string();
        }
    }

    /// Innermost visible id bound to `name`, walking frames top-down.
    pub fn lookup(&self, name: &str) -> Option<usize> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.bindings.get(name).copied())
    }

    /// Innermost visible entry bound to `name`.
    pub fn entry(&self, name: &str) -> Option<&Symbol> {
        self.lookup(name).map(|id| &self.entries[id])
    }

    /// All entries in allocation order.
    pub fn entries(&self) -> &[Symbol] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_frame_is_permanent() {
        let mut table = ScopedSymbolTable::new();
        assert_eq!(table.current_scope(), "global");
        table.end_scope();
        assert_eq!(table.current_scope(), "global");
    }

    #[test]
    fn test_declare_and_lookup_across_scopes() {
        let mut table = ScopedSymbolTable::new();
        table.declare("x", "int", Role::Variable, "1");
        table.begin_scope("if block");
        table.declare("x", "float", Role::Variable, "2.5");

        // Innermost binding wins
        let entry = table.entry("x").unwrap();
        assert_eq!(entry.id, 1);
        assert_eq!(entry.scope, "if block");

        table.end_scope();
        let entry = table.entry("x").unwrap();
        assert_eq!(entry.id, 0);
        assert_eq!(entry.data_type, "int");
    }

    #[test]
    fn test_same_name_distinct_ids_per_scope() {
        let mut table = ScopedSymbolTable::new();
        table.begin_scope("if block");
        table.declare("b", "int", Role::Variable, "2");
        table.end_scope();
        table.begin_scope("else block");
        table.declare("b", "int", Role::Variable, "4");
        table.end_scope();

        let ids: Vec<usize> = table.entries().iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![0, 1]);
        assert_eq!(table.entries()[0].scope, "if block");
        assert_eq!(table.entries()[1].scope, "else block");
    }

    #[test]
    fn test_redeclaration_refines_in_place() {
        let mut table = ScopedSymbolTable::new();
        table.declare("f", UNKNOWN, Role::Function, UNKNOWN);
        table.declare("f", "function", Role::Function, "unknown");
        let entry = table.entry("f").unwrap();
        assert_eq!(entry.id, 0);
        assert_eq!(entry.data_type, "function");
        assert_eq!(entry.value, UNKNOWN);

        table.declare("f", "int", Role::Variable, "3");
        let entry = table.entry("f").unwrap();
        // Type was already known; only role and value move
        assert_eq!(entry.data_type, "function");
        assert_eq!(entry.role, Role::Variable);
        assert_eq!(entry.value, "3");
        assert_eq!(table.entries().len(), 1);
    }

    #[test]
    fn test_update_walks_top_down() {
        let mut table = ScopedSymbolTable::new();
        table.declare("f", "function", Role::Function, UNKNOWN);
        table.begin_scope("f (function)");
        table.declare("a", UNKNOWN, Role::Parameter, UNKNOWN);
        table.update_type("f", "int");
        table.update_value("f", "5.000000");
        table.end_scope();

        let entry = table.entry("f").unwrap();
        assert_eq!(entry.data_type, "int");
        assert_eq!(entry.value, "5.000000");
    }

    #[test]
    fn test_lookup_missing() {
        let table = ScopedSymbolTable::new();
        assert!(table.lookup("ghost").is_none());
        assert!(table.entry("ghost").is_none());
    }
}
