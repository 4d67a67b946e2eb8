//! Zonal Maximum of a Raster Hazard Surface over Administrative Polygons
//!
//! This crate turns a gridded measurement (e.g. ShakeMap MMI) into one
//! number per administrative region: the maximum cell value inside each
//! region's boundary. It provides:
//!
//! - **CRS normalization**: bring grid and regions into one target CRS
//! - **Overlay**: bbox-bounded cell search, even-odd containment of cell
//!   centers, maximum over non-nodata values
//! - **Export**: delimited text keyed by region identifier, geometry
//!   columns stripped
//!
//! # Architecture
//!
//! ```text
//! .hdr/.flt grid          GeoJSON regions
//!      │                        │
//!      ▼                        ▼
//! read_esri_float_grid     read_regions
//!      │                        │
//!      └──────────┬─────────────┘
//!                 ▼
//!           CrsNormalizer (target CRS, optional assumed CRS)
//!                 │
//!                 ▼
//!           ZonalOverlay::compute
//!                 │
//!                 ├─► per region: bbox ∩ extent → candidate cells
//!                 │               → center in polygon? → max
//!                 │
//!                 ├─► statistic written into region attributes
//!                 │
//!                 ▼
//!           ResultTable (region order)
//!                 │
//!                 ▼
//!           to_csv / write_delimited
//! ```
//!
//! # Example
//!
//! ```
//! use zonal_common::CrsCode;
//! use zonal_stats::{
//!     compute_zonal_max, to_csv, GridGeometry, PolygonRegion, RasterGrid, RegionSet, Ring,
//! };
//!
//! let grid = RasterGrid::new(
//!     GridGeometry::north_up(0.0, 2.0, 1.0, 2, 2),
//!     vec![2.0, 5.0, 9.0, -9999.0],
//!     Some(-9999.0),
//!     Some(CrsCode::WGS84),
//! )?;
//!
//! let square = Ring::new(vec![(0.0, 0.0), (2.0, 0.0), (2.0, 2.0), (0.0, 2.0)]);
//! let mut regions = RegionSet::new(vec![PolygonRegion::new(
//!     "A",
//!     vec![square],
//!     Some(CrsCode::WGS84),
//! )])?;
//!
//! let table = compute_zonal_max(&grid, &mut regions)?;
//! assert_eq!(to_csv(&table)?, "code_commu,OUT_max\nA,9\n");
//! # Ok::<(), zonal_stats::ZonalError>(())
//! ```

pub mod config;
pub mod containment;
pub mod error;
pub mod export;
pub mod io;
pub mod overlay;
pub mod projection;
pub mod raster;
pub mod region;
pub mod result;

// Re-export commonly used types at crate root
pub use config::ZonalConfig;
pub use containment::contains_point;
pub use error::{Result, ZonalError};
pub use export::{
    is_geometry_field, parse_delimited_text, parse_result_pairs, to_csv, to_csv_all,
    to_delimited_text, write_delimited, DelimitedTable, SEPARATOR,
};
pub use io::{
    parse_regions, read_esri_float_grid, read_regions, regions_to_geojson, write_esri_float_grid,
    write_regions, EsriGridHeader,
};
pub use overlay::{compute_zonal_max, region_max, RegionOutcome, ZonalOverlay, GEOMETRY_COLUMN};
pub use self::projection::{reproject_grid, CrsNormalizer};
pub use raster::{CellRange, GridGeometry, RasterGrid};
pub use region::{AttributeValue, Attributes, Polygon, PolygonRegion, RegionSet, Ring};
pub use result::{Column, ResultCounts, ResultRow, ResultTable};
pub use zonal_common::{CrsCode, FieldNames, RegionId};
