use std::sync::Arc;

use lazy_static::lazy_static;

use super::Executor;
use crate::buffer::buffer_manager::BufferManager;
use crate::concurrency::TransactionId;
use crate::error::{DbError, Result};
use crate::field::{Type, Value};
use crate::schema::{FieldDesc, TupleDesc};
use crate::tuple::Tuple;

lazy_static! {
    static ref DELETE_SCHEMA: TupleDesc =
        TupleDesc::new(vec![FieldDesc::new(Type::Int, Some("count".to_owned()))]);
}

/// Drains its child on the first `next` call, deleting each row by its record id, and returns a
/// single row holding the number deleted.
pub struct Delete {
    tid: TransactionId,
    child: Box<dyn Executor>,
    buffer_manager: Arc<BufferManager>,
    emitted: bool,
}

impl Delete {
    pub fn new(tid: TransactionId, child: Box<dyn Executor>, buffer_manager: Arc<BufferManager>) -> Self {
        Self {
            tid,
            child,
            buffer_manager,
            emitted: false,
        }
    }
}

impl Executor for Delete {
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
            let tuple = self.child.next()?;
            let record_id = tuple
                .record_id()
                .ok_or_else(|| DbError::Schema("delete input row has no record id".to_owned()))?;
            self.buffer_manager.delete_tuple(self.tid, record_id)?;
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
        &DELETE_SCHEMA
    }

    fn children(&self) -> Vec<&dyn Executor> {
        vec![self.child.as_ref()]
    }
}
