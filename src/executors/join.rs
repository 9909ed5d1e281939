use super::Executor;
use crate::error::{DbError, Result};
use crate::field::CompareOp;
use crate::schema::TupleDesc;
use crate::tuple::Tuple;

/// Applies `op` between `left_field` on the outer row and `right_field` on the inner row.
pub struct JoinPredicate {
    pub left_field: usize,
    pub op: CompareOp,
    pub right_field: usize,
}

impl JoinPredicate {
    fn matches(&self, left: &Tuple, right: &Tuple) -> bool {
        self.op
            .apply(left.field(self.left_field), right.field(self.right_field))
    }
}

/// Simple inner nested-loop join: for each outer (left) row, the inner (right) child is scanned
/// from the start; once it is exhausted the outer row advances and the inner child is rewound.
pub struct Join {
    predicate: JoinPredicate,
    left: Box<dyn Executor>,
    right: Box<dyn Executor>,
    schema: TupleDesc,
    current_left: Option<Tuple>,
    pending: Option<Tuple>,
}

impl Join {
    pub fn new(predicate: JoinPredicate, left: Box<dyn Executor>, right: Box<dyn Executor>) -> Self {
        let schema = TupleDesc::merge(left.tuple_desc(), right.tuple_desc());
        Self {
            predicate,
            left,
            right,
            schema,
            current_left: None,
            pending: None,
        }
    }

    fn fill_pending(&mut self) -> Result<()> {
        loop {
            if self.current_left.is_none() {
                if self.left.has_next()? {
                    self.current_left = Some(self.left.next()?);
                } else {
                    return Ok(());
                }
            }

            if self.right.has_next()? {
                let right_tuple = self.right.next()?;
                let left_tuple = self.current_left.as_ref().unwrap();
                if self.predicate.matches(left_tuple, &right_tuple) {
                    self.pending = Some(Tuple::merge(left_tuple, &right_tuple));
                    return Ok(());
                }
            } else {
                self.right.rewind()?;
                self.current_left = None;
            }
        }
    }
}

impl Executor for Join {
    fn open(&mut self) -> Result<()> {
        self.left.open()?;
        self.right.open()?;
        self.current_left = None;
        self.pending = None;
        Ok(())
    }

    fn has_next(&mut self) -> Result<bool> {
        if self.pending.is_some() {
            return Ok(true);
        }
        self.fill_pending()?;
        Ok(self.pending.is_some())
    }

    fn next(&mut self) -> Result<Tuple> {
        if !self.has_next()? {
            return Err(DbError::NoSuchElement);
        }
        Ok(self.pending.take().unwrap())
    }

    fn close(&mut self) -> Result<()> {
        self.left.close()?;
        self.right.close()
    }

    fn rewind(&mut self) -> Result<()> {
        self.left.rewind()?;
        self.right.rewind()?;
        self.current_left = None;
        self.pending = None;
        Ok(())
    }

    fn tuple_desc(&self) -> &TupleDesc {
        &self.schema
    }

    fn children(&self) -> Vec<&dyn Executor> {
        vec![self.left.as_ref(), self.right.as_ref()]
    }
}
