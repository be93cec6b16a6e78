//! Query-log formatting.
//!
//! The diagnostics collaborator hands back logged statements with positional
//! `?` placeholders and their bound values; this module renders them into
//! human-readable executed-query strings.

use crate::core::Value;

/// One logged statement with its bound values, in execution order.
#[derive(Debug, Clone)]
pub struct QueryLogEntry {
    pub statement: String,
    pub bindings: Vec<Value>,
}

impl QueryLogEntry {
    pub fn new(statement: impl Into<String>, bindings: Vec<Value>) -> Self {
        Self {
            statement: statement.into(),
            bindings,
        }
    }
}

/// Substitute each `?` placeholder positionally with its binding rendered as
/// a double-quoted string. Placeholders beyond the bound values are left in
/// place.
pub fn format_entry(entry: &QueryLogEntry) -> String {
    let mut out = String::with_capacity(entry.statement.len());
    let mut bindings = entry.bindings.iter();

    for ch in entry.statement.chars() {
        if ch == '?' {
            if let Some(value) = bindings.next() {
                out.push('"');
                out.push_str(&value.to_string());
                out.push('"');
                continue;
            }
        }
        out.push(ch);
    }

    out
}

/// Render a whole log in execution order.
pub fn format_queries(log: &[QueryLogEntry]) -> Vec<String> {
    log.iter().map(format_entry).collect()
}
