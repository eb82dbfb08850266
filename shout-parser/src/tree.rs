//! Human-readable rendering of the AST.
//!
//! The tree is drawn from the interchange form of the program, so every node tag and every field
//! name shows up exactly as it does in the JSON interchange.

use std::fmt::Write;

use serde_json::Value;

use crate::ast::Program;

const BRANCH: &str = "├── ";
const LAST_BRANCH: &str = "└── ";
const PIPE: &str = "│   ";
const SPACE: &str = "    ";

/// Renders `program` as a box-drawing tree, one node tag or leaf value per line.
pub fn render_tree(program: &Program) -> String {
    let mut out = String::new();
    match serde_json::to_value(program) {
        Ok(value) => render_root(&mut out, &value),
        Err(err) => {
            let _ = writeln!(out, "<unrenderable AST: {}>", err);
        }
    }
    out
}

fn render_root(out: &mut String, value: &Value) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let _ = writeln!(out, "{}", key);
                render_node(out, child, "");
            }
        }
        other => render_node(out, other, ""),
    }
}

fn render_node(out: &mut String, value: &Value, prefix: &str) {
    match value {
        Value::Object(map) => {
            let len = map.len();
            for (i, (key, child)) in map.iter().enumerate() {
                let last = i + 1 == len;
                render_line(out, prefix, last, key);
                render_node(out, child, &child_prefix(prefix, last));
            }
        }
        Value::Array(items) => {
            let len = items.len();
            for (i, item) in items.iter().enumerate() {
                let last = i + 1 == len;
                render_line(out, prefix, last, "List Item");
                render_node(out, item, &child_prefix(prefix, last));
            }
        }
        Value::String(leaf) => render_line(out, prefix, true, leaf),
        leaf => render_line(out, prefix, true, &leaf.to_string()),
    }
}

fn render_line(out: &mut String, prefix: &str, last: bool, label: &str) {
    let connector = if last { LAST_BRANCH } else { BRANCH };
    let _ = writeln!(out, "{}{}{}", prefix, connector, label);
}

fn child_prefix(prefix: &str, last: bool) -> String {
    format!("{}{}", prefix, if last { SPACE } else { PIPE })
}
