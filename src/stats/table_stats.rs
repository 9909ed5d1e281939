use crate::config::Config;
use crate::error::{DbError, Result};
use crate::field::{CompareOp, Type, Value};
use crate::storage::heap_file::HeapFile;

use super::histogram::{IntHistogram, StringHistogram};

enum FieldHistogram {
    Int(IntHistogram),
    Str(StringHistogram),
}

/// Per-table cost and selectivity model: a two-pass scan builds one histogram per column (the
/// first pass finds each integer column's min/max; the second populates every histogram), then
/// `scan_cost`/`cardinality`/`estimate` answer planner queries cheaply.
pub struct TableStats {
    n_tuples: u64,
    num_pages: i32,
    io_cost_per_page: u64,
    histograms: Vec<FieldHistogram>,
}

impl TableStats {
    pub fn build(heap_file: &HeapFile, config: &Config) -> Result<Self> {
        let schema = heap_file.schema();
        let num_pages = heap_file.num_pages();

        let mut mins = vec![i32::MAX; schema.num_fields()];
        let mut maxs = vec![i32::MIN; schema.num_fields()];
        let mut n_tuples = 0u64;
        for page_no in 0..num_pages {
            let page = heap_file.read_page(page_no)?;
            for tuple in page.iter_tuples(schema) {
                n_tuples += 1;
                for (i, field) in schema.fields().iter().enumerate() {
                    if matches!(field.field_type, Type::Int) {
                        if let Some(v) = tuple.field(i).as_int() {
                            mins[i] = mins[i].min(v);
                            maxs[i] = maxs[i].max(v);
                        }
                    }
                }
            }
        }

        let mut histograms = Vec::with_capacity(schema.num_fields());
        for (i, field) in schema.fields().iter().enumerate() {
            histograms.push(match field.field_type {
                Type::Int => {
                    let (min, max) = if mins[i] > maxs[i] { (0, 0) } else { (mins[i], maxs[i]) };
                    FieldHistogram::Int(IntHistogram::new(config.num_hist_bins(), min, max)?)
                }
                Type::String(_) => FieldHistogram::Str(StringHistogram::new(config.num_hist_bins())?),
            });
        }

        for page_no in 0..num_pages {
            let page = heap_file.read_page(page_no)?;
            for tuple in page.iter_tuples(schema) {
                for (i, hist) in histograms.iter_mut().enumerate() {
                    match hist {
                        FieldHistogram::Int(h) => {
                            if let Some(v) = tuple.field(i).as_int() {
                                h.add_value(v);
                            }
                        }
                        FieldHistogram::Str(h) => {
                            if let Some(s) = tuple.field(i).as_str() {
                                h.add_value(s);
                            }
                        }
                    }
                }
            }
        }

        Ok(Self {
            n_tuples,
            num_pages,
            io_cost_per_page: config.io_cost_per_page(),
            histograms,
        })
    }

    pub fn scan_cost(&self) -> u64 {
        self.num_pages as u64 * self.io_cost_per_page
    }

    pub fn cardinality(&self, selectivity: f64) -> u64 {
        (self.n_tuples as f64 * selectivity).round() as u64
    }

    pub fn estimate(&self, field: usize, op: CompareOp, constant: &Value) -> Result<f64> {
        match (&self.histograms[field], constant) {
            (FieldHistogram::Int(h), Value::Int(v)) => h.estimate(op, *v),
            (FieldHistogram::Str(h), Value::Str(s)) => h.estimate(op, s),
            _ => Err(DbError::IllegalArgument(
                "predicate constant type does not match column type".to_owned(),
            )),
        }
    }
}
