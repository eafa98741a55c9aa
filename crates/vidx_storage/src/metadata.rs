//! Table metadata shared with the host engine.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Definition of one vector index on a table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexDefinition {
    /// Index name, unique within the table.
    pub name: String,
    /// Column the index is built on.
    pub column: String,
}

impl IndexDefinition {
    /// Creates an index definition.
    pub fn new(name: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            column: column.into(),
        }
    }
}

/// Immutable snapshot of a table's metadata.
///
/// Snapshots are shared as `Arc<TableMetadata>`; a DDL change produces a new
/// snapshot rather than mutating an existing one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableMetadata {
    /// Database the table lives in.
    pub database: String,
    /// Table name.
    pub table: String,
    /// Stable table identifier.
    pub uuid: Uuid,
    /// Data path relative to the engine root, e.g. `data/db/table/`.
    pub relative_data_path: String,
    /// Vector indexes defined on the table, in definition order.
    pub vector_indices: Vec<IndexDefinition>,
}

impl TableMetadata {
    /// Creates metadata with a fresh uuid and no indexes.
    pub fn new(database: impl Into<String>, table: impl Into<String>) -> Self {
        let database = database.into();
        let table = table.into();
        Self {
            relative_data_path: format!("data/{database}/{table}/"),
            database,
            table,
            uuid: Uuid::new_v4(),
            vector_indices: Vec::new(),
        }
    }

    /// Adds a vector index definition.
    #[must_use]
    pub fn with_index(mut self, index: IndexDefinition) -> Self {
        self.vector_indices.push(index);
        self
    }

    /// Looks up an index definition by name.
    #[must_use]
    pub fn index(&self, name: &str) -> Option<&IndexDefinition> {
        self.vector_indices.iter().find(|i| i.name == name)
    }
}
