//! Row/column projection over a tree whose children are uniformly
//! shaped records. A thin view: the tree stays the single source of
//! truth, cells read through the ordinary node accessors.

use crate::node::{NodeId, Tree};
use crate::value::Value;

/// Tabular view over the children of one node.
///
/// Rows are the node's children in sibling order; columns are the child
/// names observed across the rows, in first-seen order. Cells missing
/// from a row read as [`Value::Absent`], so `cell(...).or(default)`
/// gives per-cell fallbacks.
///
/// # Example
///
/// ```
/// use keytree::{Table, TreeBuilder};
///
/// let tree = TreeBuilder::new()
///     .nodes(
///         "row",
///         vec![
///             TreeBuilder::new().key("name", "ana").key("age", 34),
///             TreeBuilder::new().key("name", "bo"),
///         ],
///     )
///     .build();
///
/// let table = Table::new(&tree, tree.root());
/// assert_eq!(table.row_count(), 2);
/// assert_eq!(table.columns(), ["name", "age"]);
/// assert_eq!(table.cell_named(1, "age").or(0).as_int().unwrap(), 0);
/// ```
pub struct Table<'a> {
    tree: &'a Tree,
    rows: Vec<NodeId>,
    columns: Vec<String>,
}

impl<'a> Table<'a> {
    /// Project the children of `node` as rows.
    pub fn new(tree: &'a Tree, node: NodeId) -> Self {
        let rows: Vec<NodeId> = tree.children(node).to_vec();
        let mut columns: Vec<String> = Vec::new();
        for &row in &rows {
            for &cell in tree.children(row) {
                let name = tree.name(cell);
                if !columns.iter().any(|c| c == name) {
                    columns.push(name.to_string());
                }
            }
        }
        Table {
            tree,
            rows,
            columns,
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Column names in first-seen order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// The node backing a row.
    pub fn row(&self, row: usize) -> Option<NodeId> {
        self.rows.get(row).copied()
    }

    /// Cell by column ordinal. Out-of-range rows or columns and missing
    /// cells all read as [`Value::Absent`].
    pub fn cell(&self, row: usize, column: usize) -> Value {
        match self.columns.get(column) {
            Some(name) => self.cell_named(row, name),
            None => Value::Absent,
        }
    }

    /// Cell by column name.
    pub fn cell_named(&self, row: usize, column: &str) -> Value {
        let Some(&row_id) = self.rows.get(row) else {
            return Value::Absent;
        };
        match self.tree.child(row_id, column) {
            Some(cell) => self.tree.value(cell).clone(),
            None => Value::Absent,
        }
    }
}
