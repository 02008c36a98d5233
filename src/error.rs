//! Configuration-error taxonomy.
//!
//! Only caller-contract violations surface as errors: unknown option
//! strings, malformed resource bounds, unregistered vertices, an
//! out-of-range critical resource index. An instance with no feasible
//! source-sink path is *not* an error; [`run`](crate::BiDirectional::run)
//! succeeds and the getters report an empty path with infinite cost.

use thiserror::Error;

/// Errors raised while configuring the solver or declaring the graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("unknown direction '{0}': expected 'forward', 'backward' or 'both'")]
    UnknownDirection(String),

    #[error("unknown method '{0}': expected 'unprocessed', 'processed' or 'generated'")]
    UnknownMethod(String),

    #[error("critical resource index {index} out of range for {n_res} resources")]
    CriticalResOutOfRange { index: usize, n_res: usize },

    #[error("vertex {0} has not been registered with add_nodes")]
    UnknownVertex(usize),

    #[error("resource vector has length {got}, expected {expected}")]
    ResourceArityMismatch { expected: usize, got: usize },

    #[error("source and sink must be distinct vertices")]
    SourceIsSink,

    #[error("max_res and min_res must be non-empty and of equal length (got {max_len} and {min_len})")]
    MalformedResourceBounds { max_len: usize, min_len: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
