use std::collections::HashMap;

use super::Executor;
use crate::error::{DbError, Result};
use crate::field::{Type, Value};
use crate::schema::{FieldDesc, TupleDesc};
use crate::tuple::Tuple;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AggOp {
    Min,
    Max,
    Sum,
    Avg,
    Count,
}

#[derive(Default)]
struct Accumulator {
    count: i64,
    sum: i64,
    min: Option<i32>,
    max: Option<i32>,
}

impl Accumulator {
    fn add(&mut self, value: &Value) {
        self.count += 1;
        if let Some(i) = value.as_int() {
            self.sum += i as i64;
            self.min = Some(self.min.map_or(i, |m| m.min(i)));
            self.max = Some(self.max.map_or(i, |m| m.max(i)));
        }
    }

    fn finish(&self, op: AggOp) -> i32 {
        match op {
            AggOp::Min => self.min.unwrap_or(0),
            AggOp::Max => self.max.unwrap_or(0),
            AggOp::Sum => self.sum as i32,
            AggOp::Avg => {
                if self.count == 0 {
                    0
                } else {
                    (self.sum / self.count) as i32
                }
            }
            AggOp::Count => self.count as i32,
        }
    }
}

/// Hash-grouped aggregation. Materializes its child fully on `open`: with `group_field` set, rows
/// are bucketed by that field's value; without it, the whole input collapses into one group.
pub struct Aggregate {
    child: Box<dyn Executor>,
    agg_field: usize,
    group_field: Option<usize>,
    op: AggOp,
    schema: TupleDesc,
    results: Vec<Tuple>,
    pos: usize,
}

impl Aggregate {
    pub fn new(
        child: Box<dyn Executor>,
        agg_field: usize,
        group_field: Option<usize>,
        op: AggOp,
    ) -> Result<Self> {
        let field_type = child.tuple_desc().fields()[agg_field].field_type;
        if op != AggOp::Count && !matches!(field_type, Type::Int) {
            return Err(DbError::IllegalArgument(
                "only COUNT is supported over a string field".to_owned(),
            ));
        }

        let schema = match group_field {
            Some(gf) => {
                let group_type = child.tuple_desc().fields()[gf].field_type;
                TupleDesc::new(vec![
                    FieldDesc::new(group_type, Some("group".to_owned())),
                    FieldDesc::new(Type::Int, Some("agg".to_owned())),
                ])
            }
            None => TupleDesc::new(vec![FieldDesc::new(Type::Int, Some("agg".to_owned()))]),
        };

        Ok(Self {
            child,
            agg_field,
            group_field,
            op,
            schema,
            results: Vec::new(),
            pos: 0,
        })
    }

    fn materialize(&mut self) -> Result<()> {
        let mut groups: HashMap<Option<Value>, Accumulator> = HashMap::new();
        while self.child.has_next()? {
            let tuple = self.child.next()?;
            let key = self.group_field.map(|gf| tuple.field(gf).clone());
            groups
                .entry(key)
                .or_default()
                .add(tuple.field(self.agg_field));
        }

        self.results = groups
            .into_iter()
            .map(|(key, acc)| {
                let agg_value = Value::Int(acc.finish(self.op));
                match key {
                    Some(group_value) => Tuple::new(vec![group_value, agg_value]),
                    None => Tuple::new(vec![agg_value]),
                }
            })
            .collect();
        self.pos = 0;
        Ok(())
    }
}

impl Executor for Aggregate {
    fn open(&mut self) -> Result<()> {
        self.child.open()?;
        self.materialize()
    }

    fn has_next(&mut self) -> Result<bool> {
        Ok(self.pos < self.results.len())
    }

    fn next(&mut self) -> Result<Tuple> {
        if !self.has_next()? {
            return Err(DbError::NoSuchElement);
        }
        let tuple = self.results[self.pos].clone();
        self.pos += 1;
        Ok(tuple)
    }

    fn close(&mut self) -> Result<()> {
        self.child.close()
    }

    fn rewind(&mut self) -> Result<()> {
        self.child.rewind()?;
        self.materialize()
    }

    fn tuple_desc(&self) -> &TupleDesc {
        &self.schema
    }

    fn children(&self) -> Vec<&dyn Executor> {
        vec![self.child.as_ref()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // A minimal in-memory executor used only to drive Aggregate's grouping logic in isolation.
    struct VecExec {
        rows: Vec<Tuple>,
        schema: TupleDesc,
        pos: usize,
    }

    impl Executor for VecExec {
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

    fn row(a: i32, b: i32) -> Tuple {
        Tuple::new(vec![Value::Int(a), Value::Int(b)])
    }

    #[test]
    fn grouped_sum() {
        let schema = TupleDesc::new(vec![
            FieldDesc::new(Type::Int, Some("g".to_owned())),
            FieldDesc::new(Type::Int, Some("v".to_owned())),
        ]);
        let rows = vec![row(1, 10), row(1, 20), row(2, 30), row(2, 40), row(2, 50)];
        let child = Box::new(VecExec { rows, schema, pos: 0 });
        let mut agg = Aggregate::new(child, 1, Some(0), AggOp::Sum).unwrap();
        agg.open().unwrap();

        let mut out = std::collections::HashMap::new();
        while agg.has_next().unwrap() {
            let t = agg.next().unwrap();
            out.insert(t.field(0).as_int().unwrap(), t.field(1).as_int().unwrap());
        }
        assert_eq!(out.get(&1), Some(&30));
        assert_eq!(out.get(&2), Some(&120));
    }
}
