//! Coordinate Reference System identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A numeric EPSG-style CRS code.
///
/// Grids and regions carry an `Option<CrsCode>`; `None` means the source
/// never declared one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CrsCode(pub u32);

impl CrsCode {
    /// WGS84 Geographic (lon/lat in degrees)
    pub const WGS84: CrsCode = CrsCode(4326);
    /// Web Mercator (meters)
    pub const WEB_MERCATOR: CrsCode = CrsCode(3857);
    /// NAD83 Geographic
    pub const NAD83: CrsCode = CrsCode(4269);

    /// Wrap a numeric EPSG code.
    pub fn epsg(code: u32) -> Self {
        CrsCode(code)
    }

    /// The numeric code.
    pub fn code(&self) -> u32 {
        self.0
    }

    /// Parse a CRS identifier.
    ///
    /// Accepts formats like:
    /// - "EPSG:4326" / "epsg:4326"
    /// - "4326"
    /// - "urn:ogc:def:crs:EPSG::4326"
    /// - "CRS:84" / "urn:ogc:def:crs:OGC:1.3:CRS84" (WGS84 with lon/lat axis order)
    /// - "EPSG:900913" (legacy Web Mercator alias)
    pub fn parse(s: &str) -> Result<Self, CrsParseError> {
        let normalized = s.trim().to_uppercase();

        match normalized.as_str() {
            "CRS:84" | "CRS84" | "URN:OGC:DEF:CRS:OGC:1.3:CRS84" => return Ok(CrsCode::WGS84),
            "EPSG:900913" => return Ok(CrsCode::WEB_MERCATOR),
            _ => {}
        }

        // URN form may carry a version segment: urn:ogc:def:crs:EPSG:6.6:4326
        let digits = if normalized.starts_with("URN:OGC:DEF:CRS:EPSG:") {
            normalized.rsplit(':').next().unwrap_or_default()
        } else {
            normalized
                .strip_prefix("EPSG:")
                .unwrap_or(normalized.as_str())
        };

        match digits.parse::<u32>() {
            Ok(code) if code > 0 => Ok(CrsCode(code)),
            _ => Err(CrsParseError::UnsupportedCrs(s.to_string())),
        }
    }

    /// Check if this is a geographic (lat/lon) CRS.
    pub fn is_geographic(&self) -> bool {
        matches!(*self, CrsCode::WGS84 | CrsCode::NAD83)
    }
}

impl FromStr for CrsCode {
    type Err = CrsParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CrsCode::parse(s)
    }
}

impl fmt::Display for CrsCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.0)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CrsParseError {
    #[error("Unsupported CRS: {0}")]
    UnsupportedCrs(String),
}
