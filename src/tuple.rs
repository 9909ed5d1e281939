use crate::common::RecordId;
use crate::field::Value;

/// A row conforming to some `TupleDesc`. Carries its on-disk address once it has been read from
/// or written to a page; tuples constructed in memory (e.g. a join's output row) have none.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tuple {
    values: Vec<Value>,
    record_id: Option<RecordId>,
}

impl Tuple {
    pub fn new(values: Vec<Value>) -> Self {
        Self {
            values,
            record_id: None,
        }
    }

    pub fn with_record_id(values: Vec<Value>, record_id: RecordId) -> Self {
        Self {
            values,
            record_id: Some(record_id),
        }
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn field(&self, index: usize) -> &Value {
        &self.values[index]
    }

    pub fn record_id(&self) -> Option<RecordId> {
        self.record_id
    }

    pub fn set_record_id(&mut self, record_id: RecordId) {
        self.record_id = Some(record_id);
    }

    /// Concatenates two tuples field-wise, used to build a join's output row. The result has no
    /// record id of its own.
    pub fn merge(left: &Tuple, right: &Tuple) -> Tuple {
        let mut values = left.values.clone();
        values.extend(right.values.clone());
        Tuple::new(values)
    }
}
