use std::sync::Arc;

use dashmap::DashMap;

use crate::common::TableId;
use crate::error::{DbError, Result};
use crate::schema::TupleDesc;
use crate::storage::heap_file::HeapFile;

/// The narrow interface the storage/execution core consumes to resolve a table id to its heap
/// file, schema and name. The registry's own persistence and DDL surface (creating/dropping
/// tables, persisting the mapping across restarts) live outside this core.
pub trait Catalog: Send + Sync {
    fn get_table(&self, table_id: TableId) -> Result<Arc<HeapFile>>;
    fn get_table_name(&self, table_id: TableId) -> Result<String>;
    fn iter_table_ids(&self) -> Vec<TableId>;

    fn get_tuple_desc(&self, table_id: TableId) -> Result<TupleDesc> {
        Ok(self.get_table(table_id)?.schema().clone())
    }
}

/// An in-memory catalog sufficient to drive tests and example callers: tables are registered
/// directly rather than discovered from a persisted DDL log.
#[derive(Default)]
pub struct MemCatalog {
    tables: DashMap<TableId, (String, Arc<HeapFile>)>,
}

impl MemCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, name: &str, heap_file: HeapFile) -> TableId {
        let table_id = heap_file.table_id();
        self.tables
            .insert(table_id, (name.to_owned(), Arc::new(heap_file)));
        table_id
    }
}

impl Catalog for MemCatalog {
    fn get_table(&self, table_id: TableId) -> Result<Arc<HeapFile>> {
        self.tables
            .get(&table_id)
            .map(|entry| Arc::clone(&entry.1))
            .ok_or_else(|| DbError::NotFound(format!("no table with id {}", table_id)))
    }

    fn get_table_name(&self, table_id: TableId) -> Result<String> {
        self.tables
            .get(&table_id)
            .map(|entry| entry.0.clone())
            .ok_or_else(|| DbError::NotFound(format!("no table with id {}", table_id)))
    }

    fn iter_table_ids(&self) -> Vec<TableId> {
        self.tables.iter().map(|entry| *entry.key()).collect()
    }
}
