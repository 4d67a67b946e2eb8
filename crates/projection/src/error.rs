//! Error types for projection operations.

use thiserror::Error;
use zonal_common::CrsCode;

/// Result type for projection operations.
pub type ProjectionResult<T> = Result<T, ProjectionError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProjectionError {
    /// The code has no entry in the CRS definition database.
    #[error("unknown CRS {0}")]
    UnknownCrs(CrsCode),

    /// The stored definition could not be parsed.
    #[error("invalid definition for {code}: {message}")]
    InvalidDefinition { code: CrsCode, message: String },

    /// The transformation rejected a coordinate.
    #[error("transformation from {from} to {to} failed: {message}")]
    Failed {
        from: CrsCode,
        to: CrsCode,
        message: String,
    },

    /// Input coordinate is NaN or infinite.
    #[error("non-finite coordinate ({x}, {y})")]
    NonFinite { x: f64, y: f64 },
}
