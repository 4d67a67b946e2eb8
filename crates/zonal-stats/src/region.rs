//! Polygon regions and their attribute tables.

use std::collections::{BTreeMap, HashSet};
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};
use zonal_common::{BoundingBox, CrsCode, FieldNames, RegionId};

use crate::error::{Result, ZonalError};

/// A closed boundary loop.
///
/// The constructor closes the ring if the input does not repeat its
/// first vertex at the end.
#[derive(Debug, Clone, PartialEq)]
pub struct Ring {
    points: Vec<(f64, f64)>,
}

impl Ring {
    pub fn new(mut points: Vec<(f64, f64)>) -> Self {
        if let (Some(&first), Some(&last)) = (points.first(), points.last()) {
            if first != last {
                points.push(first);
            }
        }
        Self { points }
    }

    /// Vertices including the closing repeat of the first one.
    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    /// Number of distinct vertices (the closing repeat is not counted).
    pub fn vertex_count(&self) -> usize {
        self.points.len().saturating_sub(1)
    }

    /// Consecutive vertex pairs, closing edge included.
    pub fn edges(&self) -> impl Iterator<Item = ((f64, f64), (f64, f64))> + '_ {
        self.points.windows(2).map(|w| (w[0], w[1]))
    }

    pub fn bbox(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(self.points.iter().copied())
    }

    /// Apply a fallible coordinate mapping to every vertex.
    pub fn try_map<F, E>(&self, mut f: F) -> std::result::Result<Ring, E>
    where
        F: FnMut(f64, f64) -> std::result::Result<(f64, f64), E>,
    {
        let points = self
            .points
            .iter()
            .map(|&(x, y)| f(x, y))
            .collect::<std::result::Result<Vec<_>, E>>()?;
        Ok(Ring { points })
    }
}

/// One polygon: an exterior ring followed by zero or more holes.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    pub rings: Vec<Ring>,
}

impl Polygon {
    pub fn new(rings: Vec<Ring>) -> Self {
        Self { rings }
    }

    /// Exterior ring followed by holes, all given as vertex lists.
    pub fn from_coords(rings: Vec<Vec<(f64, f64)>>) -> Self {
        Self::new(rings.into_iter().map(Ring::new).collect())
    }
}

/// Attribute value kinds a region can carry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Null,
    Bool(bool),
    Integer(i64),
    Number(f64),
    Text(String),
}

impl AttributeValue {
    /// Render as a delimited-text field; `Null` is empty.
    pub fn to_field(&self) -> String {
        match self {
            AttributeValue::Null => String::new(),
            AttributeValue::Bool(b) => b.to_string(),
            AttributeValue::Integer(i) => i.to_string(),
            AttributeValue::Number(n) => n.to_string(),
            AttributeValue::Text(s) => s.clone(),
        }
    }
}

/// A region's attribute table, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attributes {
    values: BTreeMap<String, AttributeValue>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&AttributeValue> {
        self.values.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: AttributeValue) {
        self.values.insert(key.into(), value);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &AttributeValue)> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Write the zonal statistic under the configured statistic field.
    pub fn set_statistic(&mut self, fields: &FieldNames, value: Option<f32>) {
        let value = match value {
            Some(v) => AttributeValue::Number(v as f64),
            None => AttributeValue::Null,
        };
        self.values.insert(fields.statistic.clone(), value);
    }

    /// Statistic previously written by the overlay engine.
    ///
    /// Outer `None`: never computed. Inner `None`: computed, no data.
    pub fn statistic(&self, fields: &FieldNames) -> Option<Option<f64>> {
        match self.values.get(&fields.statistic)? {
            AttributeValue::Number(v) => Some(Some(*v)),
            AttributeValue::Integer(v) => Some(Some(*v as f64)),
            _ => Some(None),
        }
    }
}

impl FromIterator<(String, AttributeValue)> for Attributes {
    fn from_iter<T: IntoIterator<Item = (String, AttributeValue)>>(iter: T) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// An identified polygon (or multi-polygon) with a CRS and attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct PolygonRegion {
    pub id: RegionId,
    pub polygons: Vec<Polygon>,
    pub crs: Option<CrsCode>,
    pub attributes: Attributes,
}

impl PolygonRegion {
    /// Single-polygon region: exterior ring first, holes after.
    pub fn new(id: impl Into<RegionId>, rings: Vec<Ring>, crs: Option<CrsCode>) -> Self {
        Self::multi(id, vec![Polygon::new(rings)], crs)
    }

    pub fn multi(id: impl Into<RegionId>, polygons: Vec<Polygon>, crs: Option<CrsCode>) -> Self {
        Self {
            id: id.into(),
            polygons,
            crs,
            attributes: Attributes::new(),
        }
    }

    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = attributes;
        self
    }

    /// All rings of all parts, in order.
    pub fn rings(&self) -> impl Iterator<Item = &Ring> {
        self.polygons.iter().flat_map(|p| p.rings.iter())
    }

    /// Bounding box over every ring vertex.
    pub fn bbox(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(self.rings().flat_map(|r| r.points().iter().copied()))
    }

    /// Check the structural invariants the overlay relies on.
    pub fn validate(&self) -> Result<()> {
        if self.rings().next().is_none() {
            return Err(ZonalError::invalid_geometry(&self.id, "region has no rings"));
        }

        for (part, polygon) in self.polygons.iter().enumerate() {
            for (index, ring) in polygon.rings.iter().enumerate() {
                if ring.vertex_count() < 3 {
                    return Err(ZonalError::invalid_geometry(
                        &self.id,
                        format!(
                            "ring {} of part {} has {} vertices, at least 3 required",
                            index,
                            part,
                            ring.vertex_count()
                        ),
                    ));
                }
                if let Some(&(x, y)) = ring
                    .points()
                    .iter()
                    .find(|(x, y)| !x.is_finite() || !y.is_finite())
                {
                    return Err(ZonalError::invalid_geometry(
                        &self.id,
                        format!("ring {} of part {} has non-finite vertex ({}, {})", index, part, x, y),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Well-known text for the geometry.
    pub fn to_wkt(&self) -> String {
        fn write_polygon(out: &mut String, polygon: &Polygon) {
            out.push('(');
            for (i, ring) in polygon.rings.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                out.push('(');
                for (j, (x, y)) in ring.points().iter().enumerate() {
                    if j > 0 {
                        out.push_str(", ");
                    }
                    let _ = write!(out, "{} {}", x, y);
                }
                out.push(')');
            }
            out.push(')');
        }

        let mut out = String::new();
        if self.polygons.len() == 1 {
            out.push_str("POLYGON ");
            write_polygon(&mut out, &self.polygons[0]);
        } else {
            out.push_str("MULTIPOLYGON (");
            for (i, polygon) in self.polygons.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_polygon(&mut out, polygon);
            }
            out.push(')');
        }
        out
    }
}

/// Ordered regions with unique identifiers; order defines output order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegionSet {
    regions: Vec<PolygonRegion>,
}

impl RegionSet {
    /// Build a set, rejecting duplicate identifiers.
    pub fn new(regions: Vec<PolygonRegion>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(regions.len());
        for region in &regions {
            if !seen.insert(&region.id) {
                return Err(ZonalError::DuplicateRegionId(region.id.to_string()));
            }
        }
        Ok(Self { regions })
    }

    /// Append a region, rejecting a duplicate identifier.
    pub fn push(&mut self, region: PolygonRegion) -> Result<()> {
        if self.regions.iter().any(|r| r.id == region.id) {
            return Err(ZonalError::DuplicateRegionId(region.id.to_string()));
        }
        self.regions.push(region);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PolygonRegion> {
        self.regions.iter()
    }

    pub fn get(&self, id: &RegionId) -> Option<&PolygonRegion> {
        self.regions.iter().find(|r| &r.id == id)
    }

    pub fn regions(&self) -> &[PolygonRegion] {
        &self.regions
    }

    pub(crate) fn regions_mut(&mut self) -> &mut [PolygonRegion] {
        &mut self.regions
    }

    pub fn into_regions(self) -> Vec<PolygonRegion> {
        self.regions
    }
}

impl<'a> IntoIterator for &'a RegionSet {
    type Item = &'a PolygonRegion;
    type IntoIter = std::slice::Iter<'a, PolygonRegion>;

    fn into_iter(self) -> Self::IntoIter {
        self.regions.iter()
    }
}
