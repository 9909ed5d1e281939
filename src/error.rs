use thiserror::Error;

use crate::concurrency::TransactionId;

/// The closed set of outcome kinds an operator or storage call can produce.
#[derive(Error, Debug)]
pub enum DbError {
    /// A lock acquisition detected a cycle in the wait-for graph rooted at `tid`; `tid` must be
    /// aborted by the caller.
    #[error("transaction {tid} aborted (deadlock)")]
    TransactionAborted { tid: TransactionId },

    #[error("schema error: {0}")]
    Schema(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("page has no free slot")]
    NoSpace,

    #[error("buffer pool exhausted: no clean page to evict")]
    CachePressure,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("no such element")]
    NoSuchElement,

    #[error("illegal argument: {0}")]
    IllegalArgument(String),
}

pub type Result<T> = std::result::Result<T, DbError>;
