//! Minimal load/store for the raster and vector layers.

pub mod esri_grid;
pub mod geojson;

pub use esri_grid::{read_esri_float_grid, write_esri_float_grid, EsriGridHeader};
pub use geojson::{parse_regions, read_regions, regions_to_geojson, write_regions};
