//! GeoJSON region layers.
//!
//! Reads a `FeatureCollection` of `Polygon` / `MultiPolygon` features into a
//! [`RegionSet`], in feature order, and writes a region set back out with
//! its attributes (including the statistic, `null` for no data).
//!
//! The CRS comes from the legacy top-level `crs` member when present
//! (`{"type": "name", "properties": {"name": "urn:ogc:def:crs:EPSG::4326"}}`),
//! otherwise from the caller.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use zonal_common::{CrsCode, FieldNames, RegionId};

use crate::error::{Result, ZonalError};
use crate::region::{AttributeValue, Attributes, Polygon, PolygonRegion, RegionSet, Ring};

#[derive(Debug, Deserialize)]
struct FeatureCollectionDoc {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    features: Vec<FeatureDoc>,
    #[serde(default)]
    crs: Option<CrsDoc>,
}

#[derive(Debug, Serialize, Deserialize)]
struct CrsDoc {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    properties: CrsProperties,
}

#[derive(Debug, Serialize, Deserialize)]
struct CrsProperties {
    name: String,
}

#[derive(Debug, Deserialize)]
struct FeatureDoc {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    properties: Option<Map<String, Value>>,
    geometry: Option<GeometryDoc>,
}

type Position = Vec<f64>;

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum GeometryDoc {
    Polygon { coordinates: Vec<Vec<Position>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<Position>>> },
    #[serde(other)]
    Unsupported,
}

/// Parse a FeatureCollection into regions.
///
/// The identifier comes from the `fields.identifier` property, falling back
/// to the feature's `id` member. A collection without a `crs` member gets
/// `default_crs`.
pub fn parse_regions(
    text: &str,
    fields: &FieldNames,
    default_crs: Option<CrsCode>,
) -> Result<RegionSet> {
    let doc: FeatureCollectionDoc = serde_json::from_str(text)?;
    if doc.kind != "FeatureCollection" {
        return Err(ZonalError::invalid_vector(format!(
            "expected a FeatureCollection, found '{}'",
            doc.kind
        )));
    }

    let crs = match &doc.crs {
        Some(crs) => Some(CrsCode::parse(&crs.properties.name).map_err(|e| {
            ZonalError::invalid_vector(format!("unrecognized crs member: {}", e))
        })?),
        None => default_crs,
    };

    let mut regions = Vec::with_capacity(doc.features.len());
    for (index, feature) in doc.features.into_iter().enumerate() {
        regions.push(feature_to_region(index, feature, fields, crs)?);
    }

    RegionSet::new(regions)
}

fn feature_to_region(
    index: usize,
    feature: FeatureDoc,
    fields: &FieldNames,
    crs: Option<CrsCode>,
) -> Result<PolygonRegion> {
    let properties = feature.properties.unwrap_or_default();

    let id = match properties.get(&fields.identifier).or(feature.id.as_ref()) {
        Some(value) => region_id(value).ok_or_else(|| {
            ZonalError::invalid_vector(format!("feature {} has unusable identifier {}", index, value))
        })?,
        None => {
            return Err(ZonalError::invalid_vector(format!(
                "feature {} has no '{}' property and no id",
                index, fields.identifier
            )))
        }
    };

    let polygons = match feature.geometry {
        Some(GeometryDoc::Polygon { coordinates }) => vec![polygon(&id, coordinates)?],
        Some(GeometryDoc::MultiPolygon { coordinates }) => coordinates
            .into_iter()
            .map(|rings| polygon(&id, rings))
            .collect::<Result<Vec<_>>>()?,
        Some(GeometryDoc::Unsupported) => {
            return Err(ZonalError::invalid_geometry(
                &id,
                "only Polygon and MultiPolygon geometries are supported",
            ))
        }
        None => return Err(ZonalError::invalid_geometry(&id, "feature has no geometry")),
    };

    let attributes: Attributes = properties
        .into_iter()
        .map(|(key, value)| (key, attribute_value(value)))
        .collect();

    Ok(PolygonRegion::multi(id, polygons, crs).with_attributes(attributes))
}

fn polygon(id: &RegionId, rings: Vec<Vec<Position>>) -> Result<Polygon> {
    rings
        .into_iter()
        .map(|ring| {
            ring.into_iter()
                .map(|position| match position.as_slice() {
                    [x, y, ..] => Ok((*x, *y)),
                    _ => Err(ZonalError::invalid_geometry(
                        id,
                        "position needs at least two coordinates",
                    )),
                })
                .collect::<Result<Vec<_>>>()
                .map(Ring::new)
        })
        .collect::<Result<Vec<_>>>()
        .map(Polygon::new)
}

fn region_id(value: &Value) -> Option<RegionId> {
    match value {
        Value::String(s) => Some(RegionId::Text(s.clone())),
        Value::Number(n) => n.as_i64().map(RegionId::Integer).or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| RegionId::Integer(f as i64))
        }),
        _ => None,
    }
}

fn attribute_value(value: Value) -> AttributeValue {
    match value {
        Value::Null => AttributeValue::Null,
        Value::Bool(b) => AttributeValue::Bool(b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => AttributeValue::Integer(i),
            None => AttributeValue::Number(n.as_f64().unwrap_or(f64::NAN)),
        },
        Value::String(s) => AttributeValue::Text(s),
        other => AttributeValue::Text(other.to_string()),
    }
}

/// Read regions from a GeoJSON file.
pub fn read_regions(
    path: impl AsRef<Path>,
    fields: &FieldNames,
    default_crs: Option<CrsCode>,
) -> Result<RegionSet> {
    let text = std::fs::read_to_string(path.as_ref())?;
    let regions = parse_regions(&text, fields, default_crs)?;
    tracing::info!(
        path = %path.as_ref().display(),
        regions = regions.len(),
        "Loaded regions"
    );
    Ok(regions)
}

/// Render regions as a FeatureCollection.
///
/// Each feature's properties are its attributes plus the identifier under
/// `fields.identifier`. The collection carries a `crs` member when the first
/// region declares one.
pub fn regions_to_geojson(regions: &RegionSet, fields: &FieldNames) -> Value {
    let features: Vec<Value> = regions
        .iter()
        .map(|region| {
            let mut properties = Map::new();
            for (key, value) in region.attributes.iter() {
                properties.insert(key.clone(), attribute_json(value));
            }
            properties.insert(fields.identifier.clone(), region_id_json(&region.id));

            json!({
                "type": "Feature",
                "properties": properties,
                "geometry": geometry_json(region),
            })
        })
        .collect();

    let mut collection = json!({
        "type": "FeatureCollection",
        "features": features,
    });

    if let Some(crs) = regions.iter().next().and_then(|r| r.crs) {
        let doc = CrsDoc {
            kind: Some("name".to_string()),
            properties: CrsProperties {
                name: format!("urn:ogc:def:crs:EPSG::{}", crs.code()),
            },
        };
        collection["crs"] = json!(doc);
    }

    collection
}

/// Write regions to a GeoJSON file.
pub fn write_regions(path: impl AsRef<Path>, regions: &RegionSet, fields: &FieldNames) -> Result<()> {
    let text = serde_json::to_string_pretty(&regions_to_geojson(regions, fields))?;
    std::fs::write(path.as_ref(), text)?;
    tracing::info!(
        path = %path.as_ref().display(),
        regions = regions.len(),
        "Wrote regions"
    );
    Ok(())
}

fn region_id_json(id: &RegionId) -> Value {
    match id {
        RegionId::Integer(i) => json!(i),
        RegionId::Text(s) => json!(s),
    }
}

fn attribute_json(value: &AttributeValue) -> Value {
    match value {
        AttributeValue::Null => Value::Null,
        AttributeValue::Bool(b) => json!(b),
        AttributeValue::Integer(i) => json!(i),
        // Non-finite numbers have no JSON form
        AttributeValue::Number(n) => serde_json::Number::from_f64(*n)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        AttributeValue::Text(s) => json!(s),
    }
}

fn geometry_json(region: &PolygonRegion) -> Value {
    let polygon_coords = |polygon: &Polygon| -> Value {
        Value::Array(
            polygon
                .rings
                .iter()
                .map(|ring| {
                    Value::Array(ring.points().iter().map(|&(x, y)| json!([x, y])).collect())
                })
                .collect(),
        )
    };

    if region.polygons.len() == 1 {
        json!({
            "type": "Polygon",
            "coordinates": polygon_coords(&region.polygons[0]),
        })
    } else {
        json!({
            "type": "MultiPolygon",
            "coordinates": region.polygons.iter().map(polygon_coords).collect::<Vec<_>>(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COMMUNES: &str = r#"{
        "type": "FeatureCollection",
        "crs": {"type": "name", "properties": {"name": "urn:ogc:def:crs:EPSG::4326"}},
        "features": [
            {
                "type": "Feature",
                "properties": {"code_commu": 2001, "nom": "Imouzzer", "pop": 1520.5},
                "geometry": {"type": "Polygon", "coordinates": [
                    [[-5.0, 33.0], [-4.0, 33.0], [-4.0, 34.0], [-5.0, 34.0], [-5.0, 33.0]],
                    [[-4.8, 33.2], [-4.2, 33.2], [-4.2, 33.8], [-4.8, 33.2]]
                ]}
            },
            {
                "type": "Feature",
                "id": "B-7",
                "properties": {"nom": null},
                "geometry": {"type": "MultiPolygon", "coordinates": [
                    [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0, 12.0], [0.0, 0.0]]],
                    [[[3.0, 3.0], [4.0, 3.0], [4.0, 4.0]]]
                ]}
            }
        ]
    }"#;

    #[test]
    fn test_parse_feature_collection() {
        let regions = parse_regions(COMMUNES, &FieldNames::default(), None).unwrap();
        assert_eq!(regions.len(), 2);

        let first = &regions.regions()[0];
        assert_eq!(first.id, RegionId::Integer(2001));
        assert_eq!(first.crs, Some(CrsCode::WGS84));
        assert_eq!(first.polygons.len(), 1);
        assert_eq!(first.polygons[0].rings.len(), 2);
        assert_eq!(
            first.attributes.get("nom"),
            Some(&AttributeValue::Text("Imouzzer".to_string()))
        );
        assert_eq!(first.attributes.get("pop"), Some(&AttributeValue::Number(1520.5)));

        let second = &regions.regions()[1];
        assert_eq!(second.id, RegionId::Text("B-7".to_string()));
        assert_eq!(second.polygons.len(), 2);
        // Unclosed ring is closed on construction
        assert_eq!(second.polygons[1].rings[0].points().len(), 4);
        assert_eq!(second.attributes.get("nom"), Some(&AttributeValue::Null));
    }

    #[test]
    fn test_default_crs_when_undeclared() {
        let text = r#"{"type": "FeatureCollection", "features": [
            {"type": "Feature", "properties": {"code_commu": "X"},
             "geometry": {"type": "Polygon", "coordinates": [[[0,0],[1,0],[0,1],[0,0]]]}}
        ]}"#;
        let undeclared = parse_regions(text, &FieldNames::default(), None).unwrap();
        assert_eq!(undeclared.regions()[0].crs, None);

        let assumed = parse_regions(text, &FieldNames::default(), Some(CrsCode::WGS84)).unwrap();
        assert_eq!(assumed.regions()[0].crs, Some(CrsCode::WGS84));
    }

    #[test]
    fn test_rejects_bad_inputs() {
        let fields = FieldNames::default();
        assert!(matches!(
            parse_regions(r#"{"type": "Feature", "features": []}"#, &fields, None),
            Err(ZonalError::InvalidVector(_))
        ));

        let no_id = r#"{"type": "FeatureCollection", "features": [
            {"type": "Feature", "properties": {},
             "geometry": {"type": "Polygon", "coordinates": [[[0,0],[1,0],[0,1],[0,0]]]}}
        ]}"#;
        assert!(matches!(
            parse_regions(no_id, &fields, None),
            Err(ZonalError::InvalidVector(_))
        ));

        let point = r#"{"type": "FeatureCollection", "features": [
            {"type": "Feature", "id": 1, "geometry": {"type": "Point", "coordinates": [0, 0]}}
        ]}"#;
        assert!(matches!(
            parse_regions(point, &fields, None),
            Err(ZonalError::InvalidGeometry { .. })
        ));

        let duplicate = r#"{"type": "FeatureCollection", "features": [
            {"type": "Feature", "id": 1, "geometry": {"type": "Polygon", "coordinates": [[[0,0],[1,0],[0,1]]]}},
            {"type": "Feature", "id": 1, "geometry": {"type": "Polygon", "coordinates": [[[0,0],[1,0],[0,1]]]}}
        ]}"#;
        assert!(matches!(
            parse_regions(duplicate, &fields, None),
            Err(ZonalError::DuplicateRegionId(_))
        ));

        assert!(matches!(
            parse_regions("not json", &fields, None),
            Err(ZonalError::Json(_))
        ));
    }

    #[test]
    fn test_written_collection_reads_back() {
        let fields = FieldNames::default();
        let mut regions = parse_regions(COMMUNES, &fields, None).unwrap();
        for region in regions.regions_mut() {
            region.attributes.set_statistic(&fields, Some(6.5));
        }

        let value = regions_to_geojson(&regions, &fields);
        assert_eq!(value["crs"]["properties"]["name"], "urn:ogc:def:crs:EPSG::4326");
        assert_eq!(value["features"][0]["properties"]["OUT_max"], 6.5);
        assert_eq!(value["features"][1]["geometry"]["type"], "MultiPolygon");

        let reread = parse_regions(&value.to_string(), &fields, None).unwrap();
        assert_eq!(reread.len(), 2);
        assert_eq!(reread.regions()[1].id, RegionId::Text("B-7".to_string()));
        assert_eq!(reread.regions()[0].polygons, regions.regions()[0].polygons);
        assert_eq!(
            reread.regions()[0].attributes.statistic(&fields),
            Some(Some(6.5))
        );
    }
}
