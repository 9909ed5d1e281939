use crate::error::{DbError, Result};
use crate::field::CompareOp;

/// Fixed-width equi-width histogram over `i32` values, used for selectivity estimation of
/// `<, ≤, >, ≥, =, ≠` predicates.
pub struct IntHistogram {
    buckets: Vec<u64>,
    min: i32,
    max: i32,
    width: f64,
    total: u64,
}

impl IntHistogram {
    pub fn new(num_buckets: usize, min: i32, max: i32) -> Result<Self> {
        if num_buckets == 0 {
            return Err(DbError::IllegalArgument(
                "a histogram needs at least one bucket".to_owned(),
            ));
        }
        if min > max {
            return Err(DbError::IllegalArgument(
                "histogram min must not exceed max".to_owned(),
            ));
        }
        let width = (max as f64 - min as f64 + 1.0) / num_buckets as f64;
        Ok(Self {
            buckets: vec![0; num_buckets],
            min,
            max,
            width,
            total: 0,
        })
    }

    pub fn add_value(&mut self, value: i32) {
        if value < self.min || value > self.max {
            return;
        }
        let bucket = self.bucket_of(value);
        self.buckets[bucket] += 1;
        self.total += 1;
    }

    fn bucket_of(&self, value: i32) -> usize {
        let idx = ((value as f64 - self.min as f64) / self.width).floor() as usize;
        idx.min(self.buckets.len() - 1)
    }

    fn bucket_left(&self, bucket: usize) -> f64 {
        self.min as f64 + bucket as f64 * self.width
    }

    /// P(field < v).
    fn lt(&self, v: i32) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        if v <= self.min {
            return 0.0;
        }
        if v > self.max {
            return 1.0;
        }
        let bucket = self.bucket_of(v);
        let full: u64 = self.buckets[..bucket].iter().sum();
        let frac = (v as f64 - self.bucket_left(bucket)) / self.width;
        let partial = self.buckets[bucket] as f64 * frac.clamp(0.0, 1.0);
        (full as f64 + partial) / self.total as f64
    }

    /// P(field ≤ v).
    fn le(&self, v: i32) -> f64 {
        self.lt(v.saturating_add(1))
    }

    pub fn estimate(&self, op: CompareOp, v: i32) -> Result<f64> {
        match op {
            CompareOp::Lt => Ok(self.lt(v)),
            CompareOp::Le => Ok(self.le(v)),
            CompareOp::Gt => Ok(1.0 - self.le(v)),
            CompareOp::Ge => Ok(1.0 - self.lt(v)),
            CompareOp::Eq => Ok(self.le(v) - self.lt(v)),
            CompareOp::Ne => Ok(1.0 - (self.le(v) - self.lt(v))),
            CompareOp::Like => Err(DbError::IllegalArgument(
                "LIKE is not defined over integer histograms".to_owned(),
            )),
        }
    }
}

/// A string histogram delegates to an `IntHistogram` over a fixed encoding of each string's
/// leading bytes, so no first pass over the data is needed to find a min/max.
pub struct StringHistogram {
    inner: IntHistogram,
}

const PREFIX_LEN: usize = 4;
const BASE: i64 = 128;

fn encode(s: &str) -> i32 {
    let bytes = s.as_bytes();
    let mut key: i64 = 0;
    for i in 0..PREFIX_LEN {
        let byte = bytes.get(i).copied().unwrap_or(0).min(127) as i64;
        key = key * BASE + byte;
    }
    key as i32
}

impl StringHistogram {
    pub fn new(num_buckets: usize) -> Result<Self> {
        let max = BASE.pow(PREFIX_LEN as u32) as i32 - 1;
        Ok(Self {
            inner: IntHistogram::new(num_buckets, 0, max)?,
        })
    }

    pub fn add_value(&mut self, value: &str) {
        self.inner.add_value(encode(value));
    }

    pub fn estimate(&self, op: CompareOp, value: &str) -> Result<f64> {
        self.inner.estimate(op, encode(value))
    }
}
