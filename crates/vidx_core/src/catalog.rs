//! Resolution of table identifiers to names.

use parking_lot::RwLock;
use std::collections::HashMap;
use uuid::Uuid;

/// Maps stable table identifiers to `(database, table)` names.
///
/// Tables may be dropped or renamed concurrently, so resolution is fallible
/// and callers must treat `None` as a normal outcome.
pub trait TableCatalog: Send + Sync {
    /// Resolves a table uuid to its current database and table name.
    fn resolve(&self, uuid: &Uuid) -> Option<(String, String)>;
}

/// A catalog held in memory.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    tables: RwLock<HashMap<Uuid, (String, String)>>,
}

impl MemoryCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or renames) a table.
    pub fn register(&self, uuid: Uuid, database: impl Into<String>, table: impl Into<String>) {
        self.tables
            .write()
            .insert(uuid, (database.into(), table.into()));
    }

    /// Forgets a dropped table.
    pub fn unregister(&self, uuid: &Uuid) {
        self.tables.write().remove(uuid);
    }
}

impl TableCatalog for MemoryCatalog {
    fn resolve(&self, uuid: &Uuid) -> Option<(String, String)> {
        self.tables.read().get(uuid).cloned()
    }
}
