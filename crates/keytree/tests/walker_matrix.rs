//! Walker and table behavior over parsed documents.

use keytree::{walk, NodeId, Table, Tree, Value, Visit, Visitor};

const DOC: &str = r#"
title = "report"
server {
  host = "localhost"
  port = 8080
}
users [
  {
    name = "ana"
    age = 34
    admin = true
  }
  {
    name = "bo"
    age = 27
  }
  {
    name = "cy"
    age = 41
    admin = false
  }
]
"#;

struct Collect {
    names: Vec<String>,
    prune: Option<String>,
    limit: Option<usize>,
}

impl Collect {
    fn new() -> Self {
        Collect {
            names: Vec::new(),
            prune: None,
            limit: None,
        }
    }
}

impl Visitor for Collect {
    fn node(&mut self, tree: &Tree, id: NodeId) -> Visit {
        self.names.push(tree.name(id).to_string());
        if self.limit == Some(self.names.len()) {
            return Visit::Stop;
        }
        if self.prune.as_deref() == Some(tree.name(id)) {
            return Visit::Skip;
        }
        Visit::Children
    }
}

#[test]
fn test_walk_parsed_document_preorder() {
    let tree = Tree::from_ktf_str(DOC).unwrap();
    let mut visitor = Collect::new();
    assert!(walk(&tree, tree.root(), &mut visitor));
    assert_eq!(
        visitor.names,
        vec![
            "", "title", "server", "host", "port", "users", "name", "age", "admin", "users",
            "name", "age", "users", "name", "age", "admin",
        ]
    );
}

#[test]
fn test_walk_prunes_subtrees() {
    let tree = Tree::from_ktf_str(DOC).unwrap();
    let mut visitor = Collect::new();
    visitor.prune = Some("users".to_string());
    assert!(walk(&tree, tree.root(), &mut visitor));
    // All three "users" nodes fire, none of their fields do.
    assert_eq!(
        visitor.names,
        vec!["", "title", "server", "host", "port", "users", "users", "users"]
    );
}

#[test]
fn test_walk_stop_is_global() {
    let tree = Tree::from_ktf_str(DOC).unwrap();
    let mut visitor = Collect::new();
    visitor.limit = Some(4);
    assert!(!walk(&tree, tree.root(), &mut visitor));
    assert_eq!(visitor.names, vec!["", "title", "server", "host"]);
}

#[test]
fn test_table_over_uniform_rows() {
    let tree = Tree::from_ktf_str(DOC).unwrap();
    let table = Table::new(&tree, tree.root());
    // Rows are the root's children; columns are the union of the row
    // children's names in first-seen order.
    assert_eq!(table.row_count(), 5);

    let users = tree.get(tree.root(), "users").unwrap();
    let table = Table::new(&tree, tree.parent(users).unwrap());
    assert_eq!(table.columns().len(), table.column_count());

    // Project just the users by tabulating a synthetic parent.
    let mut narrowed = Tree::new("");
    for i in 0..tree.count(tree.root(), "users") {
        let row = tree.child_at(tree.root(), "users", i).unwrap();
        let detachable = tree.clone().detach(row).unwrap();
        narrowed.attach(narrowed.root(), detachable);
    }
    let table = Table::new(&narrowed, narrowed.root());
    assert_eq!(table.row_count(), 3);
    assert_eq!(table.columns(), ["name", "age", "admin"]);
    assert_eq!(table.cell_named(1, "name"), Value::Str("bo".to_string()));
    assert_eq!(table.cell_named(1, "admin"), Value::Absent);
    assert_eq!(table.cell(2, 1), Value::Int(41));
    assert_eq!(table.cell(9, 0), Value::Absent);
}
