//! Unified error type for the crowd-mass pipeline.
//!
//! Numerical degeneracies (zero MAD, a single surviving point, an empty
//! largest cluster) are handled with floors and empty results. Only malformed
//! input shapes and I/O failures surface as errors.

use std::path::PathBuf;

use thiserror::Error;

/// Errors produced by the library.
#[derive(Debug, Error)]
pub enum MassError {
    /// Parallel coordinate arrays of different lengths.
    #[error("coordinate length mismatch: {left} vs {right} values")]
    LengthMismatch { left: usize, right: usize },

    /// The k-th neighbor does not exist for this point count.
    #[error("neighbor index k={k} needs at least {} points, got {point_count} points", .k + 1)]
    InsufficientPoints { k: usize, point_count: usize },

    /// A distance matrix row whose length differs from the row count.
    #[error("distance matrix is not square: row {row} has {len} entries, expected {expected}")]
    NonSquareMatrix {
        row: usize,
        len: usize,
        expected: usize,
    },

    /// An adjacency entry that points outside the graph.
    #[error("node {node} lists neighbor {neighbor} but the graph has {len} nodes")]
    NeighborOutOfRange {
        node: usize,
        neighbor: usize,
        len: usize,
    },

    /// A search source (or component member) outside the graph.
    #[error("node {node} is outside the graph of {len} nodes")]
    NodeOutOfRange { node: usize, len: usize },

    #[error("unknown city '{name}'. Available: {available}")]
    UnknownCity { name: String, available: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, MassError>;

/// Check that two parallel arrays have the same length.
pub(crate) fn ensure_same_len(left: usize, right: usize) -> Result<()> {
    if left != right {
        return Err(MassError::LengthMismatch { left, right });
    }
    Ok(())
}

/// Check that a tunable is finite and not negative.
pub(crate) fn ensure_non_negative(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(MassError::InvalidConfig(format!(
            "{name} must be finite and non-negative, got {value}"
        )));
    }
    Ok(())
}
