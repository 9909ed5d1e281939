use std::sync::Arc;

use super::Executor;
use crate::buffer::buffer_manager::BufferManager;
use crate::catalog::Catalog;
use crate::common::TableId;
use crate::concurrency::TransactionId;
use crate::error::{DbError, Result};
use crate::schema::TupleDesc;
use crate::tuple::Tuple;

/// Scans a table page by page, fetching each page from the buffer manager with read intent only
/// as it is needed (no prefetching).
pub struct SeqScan {
    tid: TransactionId,
    table_id: TableId,
    buffer_manager: Arc<BufferManager>,
    schema: TupleDesc,
    current_page: i32,
    num_pages: i32,
    page_buffer: Vec<Tuple>,
    pos: usize,
}

impl SeqScan {
    pub fn new(
        tid: TransactionId,
        table_id: TableId,
        alias: &str,
        buffer_manager: Arc<BufferManager>,
        catalog: &dyn Catalog,
    ) -> Result<Self> {
        let schema = catalog.get_tuple_desc(table_id)?.with_alias(alias);
        Ok(Self {
            tid,
            table_id,
            buffer_manager,
            schema,
            current_page: 0,
            num_pages: 0,
            page_buffer: Vec::new(),
            pos: 0,
        })
    }

    fn advance_page(&mut self) -> Result<()> {
        self.page_buffer = self
            .buffer_manager
            .read_page_tuples(self.tid, self.table_id, self.current_page)?;
        self.pos = 0;
        self.current_page += 1;
        Ok(())
    }
}

impl Executor for SeqScan {
    fn open(&mut self) -> Result<()> {
        self.num_pages = self.buffer_manager.num_pages(self.table_id)?;
        self.current_page = 0;
        self.page_buffer.clear();
        self.pos = 0;
        Ok(())
    }

    fn has_next(&mut self) -> Result<bool> {
        while self.pos >= self.page_buffer.len() {
            if self.current_page >= self.num_pages {
                return Ok(false);
            }
            self.advance_page()?;
        }
        Ok(true)
    }

    fn next(&mut self) -> Result<Tuple> {
        if !self.has_next()? {
            return Err(DbError::NoSuchElement);
        }
        let tuple = self.page_buffer[self.pos].clone();
        self.pos += 1;
        Ok(tuple)
    }

    fn close(&mut self) -> Result<()> {
        self.page_buffer.clear();
        Ok(())
    }

    fn rewind(&mut self) -> Result<()> {
        self.open()
    }

    fn tuple_desc(&self) -> &TupleDesc {
        &self.schema
    }

    fn children(&self) -> Vec<&dyn Executor> {
        vec![]
    }
}

#[cfg(test)]
mod tests {
    use std::thread;
    use std::time::Duration;

    use tempfile::tempdir;

    use super::*;
    use crate::catalog::MemCatalog;
    use crate::config::Config;
    use crate::field::{Type, Value};
    use crate::schema::FieldDesc;
    use crate::storage::page::Page;
    use crate::storage::heap_file::HeapFile;
    use crate::executors::delete::Delete;
    use crate::executors::filter::{Filter, Predicate};
    use crate::executors::insert::Insert;
    use crate::field::CompareOp;

    fn row_schema() -> TupleDesc {
        TupleDesc::new(vec![
            FieldDesc::new(Type::Int, Some("a".to_owned())),
            FieldDesc::new(Type::String(16), Some("b".to_owned())),
        ])
    }

    struct FixedRows {
        rows: Vec<Tuple>,
        schema: TupleDesc,
        pos: usize,
    }

    impl Executor for FixedRows {
        fn open(&mut self) -> Result<()> {
            self.pos = 0;
            Ok(())
        }
        fn has_next(&mut self) -> Result<bool> {
            Ok(self.pos < self.rows.len())
        }
        fn next(&mut self) -> Result<Tuple> {
            let t = self.rows[self.pos].clone();
            self.pos += 1;
            Ok(t)
        }
        fn close(&mut self) -> Result<()> {
            Ok(())
        }
        fn rewind(&mut self) -> Result<()> {
            self.pos = 0;
            Ok(())
        }
        fn tuple_desc(&self) -> &TupleDesc {
            &self.schema
        }
        fn children(&self) -> Vec<&dyn Executor> {
            vec![]
        }
    }

    fn drain(exec: &mut dyn Executor) -> Vec<Tuple> {
        exec.open().unwrap();
        let mut out = Vec::new();
        while exec.has_next().unwrap() {
            out.push(exec.next().unwrap());
        }
        out
    }

    /// Scenario: create T(a INT, b STRING(16)); insert {(1,"x"), (2,"yy"), (3,"zzz")} and commit;
    /// a fresh SeqScan sees the three rows in insertion order; deleting a=2 and committing leaves
    /// {(1,"x"),(3,"zzz")} for the next scan.
    #[test]
    fn insert_scan_delete_round_trip() {
        let dir = tempdir().unwrap();
        let schema = row_schema();
        let hf = HeapFile::open_or_create(&dir.path().join("t"), schema.clone(), 4096).unwrap();
        let catalog = Arc::new(MemCatalog::new());
        let table_id = catalog.register("t", hf);
        let bm = Arc::new(BufferManager::new(Config::default(), catalog.clone()));

        let seed = FixedRows {
            rows: vec![
                Tuple::new(vec![Value::Int(1), Value::Str("x".to_owned())]),
                Tuple::new(vec![Value::Int(2), Value::Str("yy".to_owned())]),
                Tuple::new(vec![Value::Int(3), Value::Str("zzz".to_owned())]),
            ],
            schema: schema.clone(),
            pos: 0,
        };
        let mut insert = Insert::new(1, table_id, Box::new(seed), Arc::clone(&bm), &schema).unwrap();
        drain(&mut insert);
        bm.transaction_complete(1, true).unwrap();

        let mut scan = SeqScan::new(2, table_id, "t", Arc::clone(&bm), catalog.as_ref()).unwrap();
        let rows = drain(&mut scan);
        let seen: Vec<i32> = rows.iter().map(|t| t.field(0).as_int().unwrap()).collect();
        assert_eq!(seen, vec![1, 2, 3]);
        bm.transaction_complete(2, true).unwrap();

        let target_scan = SeqScan::new(3, table_id, "t", Arc::clone(&bm), catalog.as_ref()).unwrap();
        let mut filtered = Filter::new(
            Predicate {
                field_index: 0,
                op: CompareOp::Eq,
                constant: Value::Int(2),
            },
            Box::new(target_scan),
        );
        let to_delete = drain(&mut filtered);
        assert_eq!(to_delete.len(), 1);

        let mut delete = Delete::new(3, Box::new(FixedRows { rows: to_delete, schema: schema.clone(), pos: 0 }), Arc::clone(&bm));
        drain(&mut delete);
        bm.transaction_complete(3, true).unwrap();

        let mut scan2 = SeqScan::new(4, table_id, "t", Arc::clone(&bm), catalog.as_ref()).unwrap();
        let remaining: Vec<i32> = drain(&mut scan2)
            .iter()
            .map(|t| t.field(0).as_int().unwrap())
            .collect();
        assert_eq!(remaining, vec![1, 3]);
    }

    /// Scenario: buffer_pages=2, page_size=64, a table of 5 pages; a SeqScan yields every row
    /// exactly once even though the cache cannot hold every page at once.
    #[test]
    fn eviction_with_tiny_buffer_keeps_scan_correct() {
        let dir = tempdir().unwrap();
        let schema = TupleDesc::new(vec![FieldDesc::new(Type::Int, Some("a".to_owned()))]);
        let page_size = 64usize;
        let hf = HeapFile::open_or_create(&dir.path().join("t"), schema.clone(), page_size).unwrap();

        let slots_per_page = Page::num_slots_for(page_size, schema.size());
        let total_rows = slots_per_page * 4 + 1;
        let mut page = hf.allocate_page().unwrap();
        for v in 0..total_rows as i32 {
            if page.num_empty_slots() == 0 {
                hf.write_page(&page).unwrap();
                page = hf.allocate_page().unwrap();
            }
            let mut t = Tuple::new(vec![Value::Int(v)]);
            page.insert(&mut t, &schema).unwrap();
        }
        hf.write_page(&page).unwrap();
        assert_eq!(hf.num_pages(), 5);

        let catalog = Arc::new(MemCatalog::new());
        let table_id = catalog.register("t", hf);
        let config = Config::new(page_size as u16, 2, 128, 100, 1000, 10).unwrap();
        let bm = Arc::new(BufferManager::new(config, catalog.clone()));

        let mut scan = SeqScan::new(1, table_id, "t", bm, catalog.as_ref()).unwrap();
        let mut seen: Vec<i32> = drain(&mut scan)
            .iter()
            .map(|t| t.field(0).as_int().unwrap())
            .collect();
        seen.sort();
        let expected: Vec<i32> = (0..total_rows as i32).collect();
        assert_eq!(seen, expected);
    }

    /// A SeqScan blocks on a page an uncommitted transaction holds exclusive, and observes the
    /// insert only once that transaction commits.
    #[test]
    fn concurrent_scan_blocks_until_insert_transaction_completes() {
        let dir = tempdir().unwrap();
        let schema = row_schema();
        let hf = HeapFile::open_or_create(&dir.path().join("t"), schema.clone(), 4096).unwrap();
        let catalog = Arc::new(MemCatalog::new());
        let table_id = catalog.register("t", hf);
        let bm = Arc::new(BufferManager::new(Config::default(), catalog.clone()));

        let mut seed = Tuple::new(vec![Value::Int(0), Value::Str("seed".to_owned())]);
        bm.insert_tuple(1, table_id, &mut seed).unwrap();
        bm.transaction_complete(1, true).unwrap();

        let mut row = Tuple::new(vec![Value::Int(42), Value::Str("k".to_owned())]);
        bm.insert_tuple(2, table_id, &mut row).unwrap();

        let bm2 = Arc::clone(&bm);
        let catalog2 = Arc::clone(&catalog);
        let handle = thread::spawn(move || {
            let mut scan = SeqScan::new(3, table_id, "t", bm2, catalog2.as_ref()).unwrap();
            drain(&mut scan)
        });

        thread::sleep(Duration::from_millis(30));
        assert!(!handle.is_finished(), "scan must block on the uncommitted exclusive lock");

        bm.transaction_complete(2, true).unwrap();
        let rows = handle.join().unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().any(|t| t.field(0).as_int() == Some(42)));
    }

    /// After an inserting transaction aborts, a later scan sees none of its rows.
    #[test]
    fn abort_hides_inserted_row_from_later_scan() {
        let dir = tempdir().unwrap();
        let schema = row_schema();
        let hf = HeapFile::open_or_create(&dir.path().join("t"), schema.clone(), 4096).unwrap();
        let catalog = Arc::new(MemCatalog::new());
        let table_id = catalog.register("t", hf);
        let bm = Arc::new(BufferManager::new(Config::default(), catalog.clone()));

        let mut row = Tuple::new(vec![Value::Int(42), Value::Str("k".to_owned())]);
        bm.insert_tuple(1, table_id, &mut row).unwrap();
        bm.transaction_complete(1, false).unwrap();

        let mut scan = SeqScan::new(2, table_id, "t", bm, catalog.as_ref()).unwrap();
        assert!(drain(&mut scan).is_empty());
    }
}
