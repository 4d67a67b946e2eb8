//! ESRI float grid (`.hdr` + `.flt`) reader and writer.
//!
//! The header is a list of `key value` lines:
//!
//! ```text
//! ncols         4
//! nrows         3
//! xllcorner     -10.0      (or xllcenter)
//! yllcorner     30.0       (or yllcenter)
//! cellsize      0.5        (or xdim / ydim)
//! NODATA_value  -9999      (optional)
//! byteorder     LSBFIRST   (optional, LSBFIRST or MSBFIRST)
//! ```
//!
//! The `.flt` payload holds `nrows * ncols` 32-bit floats, top row first.
//! The format carries no CRS; callers pass one in or declare it later.

use std::path::{Path, PathBuf};

use bytes::{Buf, BufMut, Bytes, BytesMut};
use zonal_common::CrsCode;

use crate::error::{Result, ZonalError};
use crate::raster::{GridGeometry, RasterGrid};

/// Byte order of the `.flt` payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ByteOrder {
    #[default]
    LsbFirst,
    MsbFirst,
}

impl ByteOrder {
    fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "LSBFIRST" | "I" => Some(ByteOrder::LsbFirst),
            "MSBFIRST" | "M" => Some(ByteOrder::MsbFirst),
            _ => None,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            ByteOrder::LsbFirst => "LSBFIRST",
            ByteOrder::MsbFirst => "MSBFIRST",
        }
    }
}

/// Whether `xll`/`yll` name the lower-left corner or the lower-left cell center.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Corner,
    Center,
}

/// Parsed `.hdr` contents.
#[derive(Debug, Clone, PartialEq)]
pub struct EsriGridHeader {
    pub ncols: usize,
    pub nrows: usize,
    pub xll: f64,
    pub yll: f64,
    pub anchor: Anchor,
    /// Positive cell width
    pub xdim: f64,
    /// Positive cell height
    pub ydim: f64,
    pub nodata: Option<f32>,
    pub byte_order: ByteOrder,
}

impl EsriGridHeader {
    /// Parse header text. Keys are case-insensitive; unknown keys are ignored.
    pub fn parse(text: &str) -> Result<Self> {
        let mut ncols = None;
        let mut nrows = None;
        let mut xll = None;
        let mut yll = None;
        let mut x_anchor = None;
        let mut y_anchor = None;
        let mut cellsize = None;
        let mut xdim = None;
        let mut ydim = None;
        let mut nodata = None;
        let mut byte_order = ByteOrder::default();

        for line in text.lines() {
            let mut parts = line.split_whitespace();
            let (key, value) = match (parts.next(), parts.next()) {
                (Some(key), Some(value)) => (key.to_ascii_lowercase(), value),
                _ => continue,
            };

            match key.as_str() {
                "ncols" => ncols = Some(parse_num::<usize>(&key, value)?),
                "nrows" => nrows = Some(parse_num::<usize>(&key, value)?),
                "xllcorner" | "xllcenter" => {
                    xll = Some(parse_num::<f64>(&key, value)?);
                    x_anchor = Some(anchor_of(&key));
                }
                "yllcorner" | "yllcenter" => {
                    yll = Some(parse_num::<f64>(&key, value)?);
                    y_anchor = Some(anchor_of(&key));
                }
                "cellsize" => cellsize = Some(parse_num::<f64>(&key, value)?),
                "xdim" => xdim = Some(parse_num::<f64>(&key, value)?),
                "ydim" => ydim = Some(parse_num::<f64>(&key, value)?),
                "nodata_value" | "nodata" => nodata = Some(parse_num::<f32>(&key, value)?),
                "byteorder" => {
                    byte_order = ByteOrder::parse(value).ok_or_else(|| {
                        header_error(format!("unknown byteorder '{}'", value))
                    })?
                }
                _ => {}
            }
        }

        let ncols = ncols.ok_or_else(|| header_error("missing ncols"))?;
        let nrows = nrows.ok_or_else(|| header_error("missing nrows"))?;
        let xll = xll.ok_or_else(|| header_error("missing xllcorner/xllcenter"))?;
        let yll = yll.ok_or_else(|| header_error("missing yllcorner/yllcenter"))?;

        let anchor = match (x_anchor, y_anchor) {
            (Some(x), Some(y)) if x == y => x,
            _ => return Err(header_error("xll and yll must use the same anchor")),
        };

        let (xdim, ydim) = match (cellsize, xdim, ydim) {
            (_, Some(x), Some(y)) => (x, y),
            (Some(size), _, _) => (size, size),
            _ => return Err(header_error("missing cellsize (or xdim and ydim)")),
        };

        if !(xdim > 0.0) || !(ydim > 0.0) {
            return Err(ZonalError::invalid_grid(
                nrows,
                ncols,
                format!("cell size must be positive, got {} x {}", xdim, ydim),
            ));
        }

        Ok(Self {
            ncols,
            nrows,
            xll,
            yll,
            anchor,
            xdim,
            ydim,
            nodata,
            byte_order,
        })
    }

    /// Header for writing `grid` with corner anchors.
    ///
    /// Only north-up grids (positive width, negative height) have an ESRI
    /// representation.
    pub fn for_grid(grid: &RasterGrid, byte_order: ByteOrder) -> Result<Self> {
        let g = grid.geometry();
        if g.cell_width <= 0.0 || g.cell_height >= 0.0 {
            return Err(ZonalError::invalid_grid(
                g.rows,
                g.cols,
                "only north-up grids can be written as ESRI float grids",
            ));
        }
        let extent = grid.extent();
        Ok(Self {
            ncols: g.cols,
            nrows: g.rows,
            xll: extent.min_x,
            yll: extent.min_y,
            anchor: Anchor::Corner,
            xdim: g.cell_width,
            ydim: -g.cell_height,
            nodata: grid.nodata(),
            byte_order,
        })
    }

    /// Top-left anchored geometry.
    pub fn geometry(&self) -> GridGeometry {
        let (left, bottom) = match self.anchor {
            Anchor::Corner => (self.xll, self.yll),
            Anchor::Center => (self.xll - self.xdim / 2.0, self.yll - self.ydim / 2.0),
        };
        GridGeometry {
            origin_x: left,
            origin_y: bottom + self.nrows as f64 * self.ydim,
            cell_width: self.xdim,
            cell_height: -self.ydim,
            cols: self.ncols,
            rows: self.nrows,
        }
    }

    /// Render as `.hdr` text.
    pub fn to_text(&self) -> String {
        let (xkey, ykey) = match self.anchor {
            Anchor::Corner => ("xllcorner", "yllcorner"),
            Anchor::Center => ("xllcenter", "yllcenter"),
        };
        let mut out = format!(
            "ncols         {}\nnrows         {}\n{:<14}{}\n{:<14}{}\n",
            self.ncols, self.nrows, xkey, self.xll, ykey, self.yll
        );
        if self.xdim == self.ydim {
            out.push_str(&format!("cellsize      {}\n", self.xdim));
        } else {
            out.push_str(&format!("xdim          {}\nydim          {}\n", self.xdim, self.ydim));
        }
        if let Some(nodata) = self.nodata {
            out.push_str(&format!("NODATA_value  {}\n", nodata));
        }
        out.push_str(&format!("byteorder     {}\n", self.byte_order.as_str()));
        out
    }

    /// Payload size in bytes for these dimensions.
    pub fn expected_bytes(&self) -> Result<usize> {
        self.nrows
            .checked_mul(self.ncols)
            .and_then(|cells| cells.checked_mul(std::mem::size_of::<f32>()))
            .ok_or_else(|| {
                ZonalError::invalid_grid(self.nrows, self.ncols, "payload size overflows usize")
            })
    }
}

fn anchor_of(key: &str) -> Anchor {
    if key.ends_with("center") {
        Anchor::Center
    } else {
        Anchor::Corner
    }
}

fn parse_num<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse::<T>()
        .map_err(|_| header_error(format!("bad value '{}' for {}", value, key)))
}

fn header_error(msg: impl Into<String>) -> ZonalError {
    ZonalError::invalid_grid(0, 0, format!("ESRI header: {}", msg.into()))
}

/// Decode a `.flt` payload described by `header`.
pub fn decode_float_grid(
    header: &EsriGridHeader,
    payload: Bytes,
    crs: Option<CrsCode>,
) -> Result<RasterGrid> {
    let expected = header.expected_bytes()?;
    if payload.len() != expected {
        return Err(ZonalError::invalid_grid(
            header.nrows,
            header.ncols,
            format!("payload has {} bytes, expected {}", payload.len(), expected),
        ));
    }

    let mut buf = payload;
    let mut data = Vec::with_capacity(expected / std::mem::size_of::<f32>());
    while buf.has_remaining() {
        data.push(match header.byte_order {
            ByteOrder::LsbFirst => buf.get_f32_le(),
            ByteOrder::MsbFirst => buf.get_f32(),
        });
    }

    RasterGrid::new(header.geometry(), data, header.nodata, crs)
}

/// Encode grid values as a `.flt` payload.
pub fn encode_float_grid(grid: &RasterGrid, byte_order: ByteOrder) -> Bytes {
    let mut buf = BytesMut::with_capacity(grid.data().len() * std::mem::size_of::<f32>());
    for &value in grid.data() {
        match byte_order {
            ByteOrder::LsbFirst => buf.put_f32_le(value),
            ByteOrder::MsbFirst => buf.put_f32(value),
        }
    }
    buf.freeze()
}

/// `(hdr, flt)` paths for a grid given either file (or the bare stem).
pub fn sibling_paths(path: &Path) -> (PathBuf, PathBuf) {
    (path.with_extension("hdr"), path.with_extension("flt"))
}

/// Read an ESRI float grid from its `.hdr` or `.flt` path.
pub fn read_esri_float_grid(path: impl AsRef<Path>, crs: Option<CrsCode>) -> Result<RasterGrid> {
    let (hdr_path, flt_path) = sibling_paths(path.as_ref());

    let header = EsriGridHeader::parse(&std::fs::read_to_string(&hdr_path)?)?;
    let payload = Bytes::from(std::fs::read(&flt_path)?);
    let grid = decode_float_grid(&header, payload, crs)?;

    tracing::info!(
        path = %flt_path.display(),
        rows = header.nrows,
        cols = header.ncols,
        cell_width = header.xdim,
        cell_height = header.ydim,
        nodata = ?header.nodata,
        "Loaded ESRI float grid"
    );
    Ok(grid)
}

/// Write `grid` as an ESRI `.hdr` + `.flt` pair next to `path`.
pub fn write_esri_float_grid(path: impl AsRef<Path>, grid: &RasterGrid) -> Result<()> {
    let (hdr_path, flt_path) = sibling_paths(path.as_ref());
    let header = EsriGridHeader::for_grid(grid, ByteOrder::LsbFirst)?;

    std::fs::write(&hdr_path, header.to_text())?;
    std::fs::write(&flt_path, encode_float_grid(grid, header.byte_order))?;

    tracing::debug!(path = %flt_path.display(), "Wrote ESRI float grid");
    Ok(())
}
