//! Schema lookup
//!
//! The code generator's single inbound dependency: a way to resolve
//! `(table, column)` to a column index and declared type. `Schema` is an
//! in-memory implementation built by registering parsed CREATE TABLE
//! statements; anything that can answer `resolve_column` can stand in
//! for it.

use std::collections::HashMap;

use crate::error::{Error, ErrorCode, Result};
use crate::expr::affinity::{type_affinity, Affinity};
use crate::parser::ast::{CreateTableStmt, TableDefinition};

/// Result of resolving a column reference
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedColumn {
    /// Name of the owning table
    pub table: String,
    /// Cursor id assigned to the owning table
    pub cursor: i32,
    /// Zero-based column index within the table
    pub index: usize,
    /// Declared type string, if the column had one
    pub decl_type: Option<String>,
}

/// Column resolution interface consumed by the code generator
pub trait SchemaLookup {
    /// Resolve a column, optionally qualified by table name. Unqualified
    /// references search all tables in registration order.
    fn resolve_column(&self, table: Option<&str>, column: &str) -> Option<ResolvedColumn>;
}

/// A column in a registered table
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub decl_type: Option<String>,
    pub affinity: Affinity,
}

/// A registered table
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub name: String,
    pub cursor: i32,
    pub columns: Vec<Column>,
}

impl Table {
    /// Find a column by name (case-insensitive), returning its index
    pub fn column(&self, name: &str) -> Option<(usize, &Column)> {
        self.columns
            .iter()
            .enumerate()
            .find(|(_, c)| c.name.eq_ignore_ascii_case(name))
    }
}

/// In-memory schema registry
#[derive(Debug, Default)]
pub struct Schema {
    tables: Vec<Table>,
    by_name: HashMap<String, usize>,
    next_cursor: i32,
}

impl Schema {
    pub fn new() -> Self {
        Schema::default()
    }

    /// Register a table from a parsed CREATE TABLE statement. Cursor ids
    /// are assigned in registration order.
    pub fn create_table(&mut self, stmt: &CreateTableStmt) -> Result<()> {
        let key = stmt.name.name.to_lowercase();

        if self.by_name.contains_key(&key) {
            if stmt.if_not_exists {
                return Ok(());
            }
            return Err(Error::with_message(
                ErrorCode::Error,
                format!("table {} already exists", stmt.name.name),
            ));
        }

        let columns = match &stmt.definition {
            TableDefinition::Columns { columns, .. } => columns
                .iter()
                .map(|c| {
                    let decl_type = c.type_name.as_ref().map(|t| t.to_string());
                    let affinity =
                        type_affinity(c.type_name.as_ref().map(|t| t.name.as_str()).unwrap_or(""));
                    Column {
                        name: c.name.clone(),
                        decl_type,
                        affinity,
                    }
                })
                .collect(),
            TableDefinition::AsSelect(_) => {
                return Err(Error::with_message(
                    ErrorCode::Unsupported,
                    "CREATE TABLE AS SELECT requires query execution",
                ));
            }
        };

        let cursor = self.next_cursor;
        self.next_cursor += 1;
        self.tables.push(Table {
            name: stmt.name.name.clone(),
            cursor,
            columns,
        });
        self.by_name.insert(key, self.tables.len() - 1);
        Ok(())
    }

    /// Remove a table by name
    pub fn drop_table(&mut self, name: &str, if_exists: bool) -> Result<()> {
        let key = name.to_lowercase();
        match self.by_name.remove(&key) {
            Some(idx) => {
                self.tables.remove(idx);
                // Reindex the name map after the removal
                for (i, t) in self.tables.iter().enumerate() {
                    self.by_name.insert(t.name.to_lowercase(), i);
                }
                Ok(())
            }
            None if if_exists => Ok(()),
            None => Err(Error::with_message(
                ErrorCode::NotFound,
                format!("no such table: {}", name),
            )),
        }
    }

    /// Look up a table by name (case-insensitive)
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.by_name
            .get(&name.to_lowercase())
            .map(|&idx| &self.tables[idx])
    }

    /// Number of registered tables
    pub fn table_count(&self) -> usize {
        self.tables.len()
    }
}

impl SchemaLookup for Schema {
    fn resolve_column(&self, table: Option<&str>, column: &str) -> Option<ResolvedColumn> {
        match table {
            Some(name) => {
                let t = self.table(name)?;
                let (index, col) = t.column(column)?;
                Some(ResolvedColumn {
                    table: t.name.clone(),
                    cursor: t.cursor,
                    index,
                    decl_type: col.decl_type.clone(),
                })
            }
            None => {
                // Unqualified: first match in registration order
                for t in &self.tables {
                    if let Some((index, col)) = t.column(column) {
                        return Some(ResolvedColumn {
                            table: t.name.clone(),
                            cursor: t.cursor,
                            index,
                            decl_type: col.decl_type.clone(),
                        });
                    }
                }
                None
            }
        }
    }
}
