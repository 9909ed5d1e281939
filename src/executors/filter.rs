use super::Executor;
use crate::error::{DbError, Result};
use crate::field::{CompareOp, Value};
use crate::schema::TupleDesc;
use crate::tuple::Tuple;

/// `field_index OP constant`, evaluated directly against each row the child produces.
pub struct Predicate {
    pub field_index: usize,
    pub op: CompareOp,
    pub constant: Value,
}

pub struct Filter {
    predicate: Predicate,
    child: Box<dyn Executor>,
    buffered: Option<Tuple>,
}

impl Filter {
    pub fn new(predicate: Predicate, child: Box<dyn Executor>) -> Self {
        Self {
            predicate,
            child,
            buffered: None,
        }
    }
}

impl Executor for Filter {
    fn open(&mut self) -> Result<()> {
        self.child.open()?;
        self.buffered = None;
        Ok(())
    }

    fn has_next(&mut self) -> Result<bool> {
        if self.buffered.is_some() {
            return Ok(true);
        }
        while self.child.has_next()? {
            let tuple = self.child.next()?;
            if self
                .predicate
                .op
                .apply(tuple.field(self.predicate.field_index), &self.predicate.constant)
            {
                self.buffered = Some(tuple);
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn next(&mut self) -> Result<Tuple> {
        if !self.has_next()? {
            return Err(DbError::NoSuchElement);
        }
        Ok(self.buffered.take().unwrap())
    }

    fn close(&mut self) -> Result<()> {
        self.child.close()
    }

    fn rewind(&mut self) -> Result<()> {
        self.buffered = None;
        self.child.rewind()
    }

    fn tuple_desc(&self) -> &TupleDesc {
        self.child.tuple_desc()
    }

    fn children(&self) -> Vec<&dyn Executor> {
        vec![self.child.as_ref()]
    }
}
