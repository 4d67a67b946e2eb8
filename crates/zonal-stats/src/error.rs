//! Error types for zonal statistics.

use projection::ProjectionError;
use thiserror::Error;
use zonal_common::CrsCode;

/// Errors that can occur while loading, normalizing or overlaying layers.
///
/// "No contributing cells" is not an error: such regions get a
/// no-data statistic in the result table.
#[derive(Error, Debug)]
pub enum ZonalError {
    /// A grid or region carries no CRS and none was assumed.
    #[error("missing CRS on {0}")]
    MissingCrs(String),

    /// Grid and region are in different CRSs at overlay time.
    #[error("CRS mismatch for region {region}: grid is {grid_crs}, region is {region_crs}")]
    CrsMismatch {
        region: String,
        grid_crs: CrsCode,
        region_crs: CrsCode,
    },

    /// Malformed raster grid.
    #[error("invalid grid ({rows} rows x {cols} cols): {message}")]
    InvalidGrid {
        rows: usize,
        cols: usize,
        message: String,
    },

    /// Malformed region geometry.
    #[error("invalid geometry for region {region}: {message}")]
    InvalidGeometry { region: String, message: String },

    /// Cell index outside the grid.
    #[error("cell ({row}, {col}) is outside the {rows}x{cols} grid")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    /// Two regions share an identifier.
    #[error("duplicate region identifier: {0}")]
    DuplicateRegionId(String),

    /// Malformed vector source.
    #[error("invalid vector source: {0}")]
    InvalidVector(String),

    /// Exported field selection names an unknown column.
    #[error("unknown field: {0}")]
    UnknownField(String),

    /// Malformed delimited text.
    #[error("malformed delimited text at line {line}: {message}")]
    Delimited { line: usize, message: String },

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Reprojection failed.
    #[error("projection error: {0}")]
    Projection(#[from] ProjectionError),

    /// Storage/IO error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// GeoJSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Delimited text writer error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl ZonalError {
    /// Create an InvalidGrid error.
    pub fn invalid_grid(rows: usize, cols: usize, msg: impl Into<String>) -> Self {
        Self::InvalidGrid {
            rows,
            cols,
            message: msg.into(),
        }
    }

    /// Create an InvalidGeometry error.
    pub fn invalid_geometry(region: impl ToString, msg: impl Into<String>) -> Self {
        Self::InvalidGeometry {
            region: region.to_string(),
            message: msg.into(),
        }
    }

    /// Create an InvalidVector error.
    pub fn invalid_vector(msg: impl Into<String>) -> Self {
        Self::InvalidVector(msg.into())
    }

    /// Create a Delimited error.
    pub fn delimited(line: usize, msg: impl Into<String>) -> Self {
        Self::Delimited {
            line,
            message: msg.into(),
        }
    }
}

/// Result type for zonal statistics operations.
pub type Result<T> = std::result::Result<T, ZonalError>;
