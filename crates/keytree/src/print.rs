//! Box-drawing debug dump of a subtree, for diagnostics and test
//! output.

use std::fmt::Write as _;

use crate::node::{NodeId, Tree};
use crate::value::Value;

/// Render the subtree rooted at `id` as an indented branch diagram:
///
/// ```text
/// root
/// ├─ title = "Demo"
/// └─ server @secure=true
///    ├─ host = "localhost"
///    └─ port = 8080
/// ```
pub fn print_node(tree: &Tree, id: NodeId) -> String {
    let mut out = String::new();
    out.push_str(&node_label(tree, id));
    print_children(tree, id, "", &mut out);
    out
}

fn node_label(tree: &Tree, id: NodeId) -> String {
    let node = tree.node(id);
    let mut label = String::new();
    if node.name().is_empty() {
        label.push_str("(anonymous)");
    } else {
        label.push_str(node.name());
    }
    for (name, value) in node.attrs() {
        let _ = write!(label, " @{name}={}", literal(value));
    }
    if !node.value().is_absent() {
        let _ = write!(label, " = {}", literal(node.value()));
    }
    label
}

fn literal(value: &Value) -> String {
    match value {
        Value::Str(s) => format!("{s:?}"),
        other => other.to_string(),
    }
}

fn print_children(tree: &Tree, id: NodeId, tab: &str, out: &mut String) {
    let children = tree.children(id);
    let last = children.len().saturating_sub(1);
    for (i, &child) in children.iter().enumerate() {
        let is_last = i == last;
        let branch = if is_last { "└─" } else { "├─" };
        out.push('\n');
        out.push_str(tab);
        out.push_str(branch);
        out.push(' ');
        out.push_str(&node_label(tree, child));
        let child_tab = format!("{tab}{}  ", if is_last { " " } else { "│" });
        print_children(tree, child, &child_tab, out);
    }
}
