//! Flat symbol table populated at lex time.
//!
//! This table is a lexical-name index, not a semantic table: each distinct
//! identifier name appears once, regardless of scope. Entries are refined
//! in place by the lexer's post-scan type seeding, so ids stay stable.

use serde::Serialize;
use std::collections::HashMap;

/// Placeholder for a type or value that has not been determined.
pub const UNKNOWN: &str = "unknown";

/// One row of the lexer symbol table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LexSymbol {
    /// Allocation order, starting at 0
    pub id: usize,
    /// Identifier name
    pub name: String,
    /// One of `int`, `float`, `string`, `bool`, `function`, `unknown`
    pub data_type: String,
    /// Literal text of the seeded value, or `unknown`
    pub value: String,
}

/// Name-to-entry mapping over an append-only entry vector.
#[derive(Debug, Default)]
pub struct LexSymbolTable {
    entries: Vec<LexSymbol>,
    index: HashMap<String, usize>,
}

impl LexSymbolTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a name, returning its id. An existing name keeps its id and
    /// entry unchanged.
    pub fn insert(&mut self, name: &str) -> usize {
        if let Some(&id) = self.index.get(name) {
            return id;
        }
        let id = self.entries.len();
        self.entries.push(LexSymbol {
            id,
            name: name.to_string(),
            data_type: UNKNOWN.to_string(),
            value: UNKNOWN.to_string(),
        });
        self.index.insert(name.to_string(), id);
        id
    }

    /// Refine an existing entry: the type is set only while still unknown,
    /// the value only while still unknown and when the new value is known.
    /// Names that were never inserted are ignored.
    pub fn update_type(&mut self, name: &str, data_type: &str, value: &str) {
        if let Some(&id) = self.index.get(name) {
            let entry = &mut self.entries[id];
            if entry.data_type == UNKNOWN {
                entry.data_type = data_type.to_string();
            }
            if entry.value == UNKNOWN && value != UNKNOWN {
                entry.value = value.to_string();
            }
        }
    }

    /// Look up an entry by name.
    pub fn get(&self, name: &str) -> Option<&LexSymbol> {
        self.index.get(name).map(|&id| &self.entries[id])
    }

    /// All entries in allocation order.
    pub fn entries(&self) -> &[LexSymbol] {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
