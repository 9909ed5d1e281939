use std::sync::Arc;

use lazy_static::lazy_static;

use super::Executor;
use crate::buffer::buffer_manager::BufferManager;
use crate::common::TableId;
use crate::concurrency::TransactionId;
use crate::error::{DbError, Result};
use crate::field::{Type, Value};
use crate::schema::{FieldDesc, TupleDesc};
use crate::tuple::Tuple;

lazy_static! {
    static ref INSERT_SCHEMA: TupleDesc =
        TupleDesc::new(vec![FieldDesc::new(Type::Int, Some("count".to_owned()))]);
}

/// Drains its child on the first `next` call, inserting every row into `table_id`, and returns a
/// single row holding the number inserted. Further calls return end-of-input.
pub struct Insert {
    tid: TransactionId,
    table_id: TableId,
    child: Box<dyn Executor>,
    buffer_manager: Arc<BufferManager>,
    emitted: bool,
}

impl Insert {
    pub fn new(
        tid: TransactionId,
        table_id: TableId,
        child: Box<dyn Executor>,
        buffer_manager: Arc<BufferManager>,
        target_schema: &TupleDesc,
    ) -> Result<Self> {
        if !child.tuple_desc().type_compatible(target_schema) {
            return Err(DbError::Schema(
                "insert child schema does not match target table".to_owned(),
            ));
        }
        Ok(Self {
            tid,
            table_id,
            child,
            buffer_manager,
            emitted: false,
        })
    }
}

impl Executor for Insert {
    fn open(&mut self) -> Result<()> {
        self.child.open()?;
        self.emitted = false;
        Ok(())
    }

    fn has_next(&mut self) -> Result<bool> {
        Ok(!self.emitted)
    }

    fn next(&mut self) -> Result<Tuple> {
        if self.emitted {
            return Err(DbError::NoSuchElement);
        }
        let mut count = 0i32;
        while self.child.has_next()? {
            let mut tuple = self.child.next()?;
            self.buffer_manager
                .insert_tuple(self.tid, self.table_id, &mut tuple)?;
            count += 1;
        }
        self.emitted = true;
        Ok(Tuple::new(vec![Value::Int(count)]))
    }

    fn close(&mut self) -> Result<()> {
        self.child.close()
    }

    fn rewind(&mut self) -> Result<()> {
        self.emitted = false;
        self.child.rewind()
    }

    fn tuple_desc(&self) -> &TupleDesc {
        &INSERT_SCHEMA
    }

    fn children(&self) -> Vec<&dyn Executor> {
        vec![self.child.as_ref()]
    }
}
