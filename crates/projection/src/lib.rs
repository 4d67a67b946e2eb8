//! Coordinate reference system transformations.
//!
//! Geographic ⇄ Web Mercator uses the built-in spherical Mercator; other
//! EPSG pairs go through proj4rs.

pub mod error;
pub mod mercator;
pub mod transform;

pub use error::{ProjectionError, ProjectionResult};
pub use mercator::WebMercator;
pub use transform::{proj_string, CrsTransform, ProjTransform};
