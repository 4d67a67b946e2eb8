//! Common types shared across the zonal statistics workspace.

pub mod bbox;
pub mod crs;
pub mod fields;

pub use bbox::BoundingBox;
pub use crs::CrsCode;
pub use fields::{FieldNames, RegionId, DEFAULT_IDENTIFIER_FIELD, DEFAULT_STATISTIC_FIELD};
