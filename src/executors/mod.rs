pub mod aggregate;
pub mod delete;
pub mod filter;
pub mod insert;
pub mod join;
pub mod seq_scan;

use crate::error::Result;
use crate::schema::TupleDesc;
use crate::tuple::Tuple;

/// The pull-iterator contract every operator implements. This is the entire capability surface —
/// a closed set of operator variants, not an open class hierarchy: `SeqScan`, `Filter`, `Join`,
/// `Insert`, `Delete`, `Aggregate`.
pub trait Executor {
    /// Prepares the operator (and its children) to be pulled from. Idempotent after `close`.
    fn open(&mut self) -> Result<()>;

    /// True if another call to `next` would return a row rather than end-of-input.
    fn has_next(&mut self) -> Result<bool>;

    /// Pulls the next row. Callers must check `has_next` first; calling `next` past the end is a
    /// `NoSuchElement` error.
    fn next(&mut self) -> Result<Tuple>;

    /// Releases operator-local state. Does not have to be followed by another `open`.
    fn close(&mut self) -> Result<()>;

    /// Restarts the operator from the beginning where supported.
    fn rewind(&mut self) -> Result<()>;

    fn tuple_desc(&self) -> &TupleDesc;

    fn children(&self) -> Vec<&dyn Executor>;
}
