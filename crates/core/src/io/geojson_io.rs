//! GeoJSON reading/writing
//!
//! Catchment layers are read from a FeatureCollection of Polygon or
//! MultiPolygon features into a [`MemorySource`]. Every ring (exterior or
//! interior, of every polygon) becomes one part of the record's [`Shape`],
//! matching the flat part-offset layout of classic polygon containers.

use crate::error::{Error, Result};
use crate::source::MemorySource;
use crate::vector::{AttributeValue, Feature, FeatureCollection, Shape, ShapeRecord};
use geo_types::{Coord, Geometry, Point, Polygon};
use geojson::{GeoJson, JsonObject, JsonValue};
use std::fs;
use std::path::Path;

/// Read a polygon layer from a GeoJSON file
pub fn read_layer<P: AsRef<Path>>(path: P) -> Result<MemorySource> {
    let text = fs::read_to_string(path.as_ref())?;
    read_layer_from_str(&text)
}

/// Read a polygon layer from GeoJSON text
///
/// Field names are the union of all property keys, in first-seen order.
/// Features missing a property get `AttributeValue::Null` for it.
pub fn read_layer_from_str(text: &str) -> Result<MemorySource> {
    let features = parse_features(text)?;

    let mut fields: Vec<String> = Vec::new();
    for feature in &features {
        if let Some(props) = &feature.properties {
            for key in props.keys() {
                if !fields.iter().any(|f| f == key) {
                    fields.push(key.clone());
                }
            }
        }
    }

    let mut source = MemorySource::new(fields.clone());
    for (index, feature) in features.into_iter().enumerate() {
        let shape = match &feature.geometry {
            Some(geometry) => shape_from_value(&geometry.value, index)?,
            None => Shape::new(Vec::new(), Vec::new()),
        };
        let record = fields
            .iter()
            .map(|name| {
                feature
                    .properties
                    .as_ref()
                    .and_then(|p| p.get(name))
                    .map(attribute_from_json)
                    .unwrap_or(AttributeValue::Null)
            })
            .collect();
        source.push(ShapeRecord::new(shape, record))?;
    }

    Ok(source)
}

/// Read point features (outlets) from a GeoJSON file
pub fn read_points<P: AsRef<Path>>(path: P) -> Result<FeatureCollection> {
    let text = fs::read_to_string(path.as_ref())?;
    read_points_from_str(&text)
}

/// Read point features from GeoJSON text; other geometry types are rejected
pub fn read_points_from_str(text: &str) -> Result<FeatureCollection> {
    let mut collection = FeatureCollection::new();
    for (index, feature) in parse_features(text)?.into_iter().enumerate() {
        let point = match feature.geometry.as_ref().map(|g| &g.value) {
            Some(geojson::Value::Point(position)) => {
                let c = coord_from_position(position, index)?;
                Point::new(c.x, c.y)
            }
            _ => {
                return Err(Error::GeoJson(format!(
                    "feature {} is not a Point",
                    index
                )))
            }
        };

        let mut out = Feature::new(Geometry::Point(point));
        out.id = feature.id.as_ref().map(|id| match id {
            geojson::feature::Id::String(s) => s.clone(),
            geojson::feature::Id::Number(n) => n.to_string(),
        });
        if let Some(props) = &feature.properties {
            for (key, value) in props {
                out.set_property(key.clone(), attribute_from_json(value));
            }
        }
        collection.push(out);
    }
    Ok(collection)
}

/// Serialize polygon features to a GeoJSON FeatureCollection string.
///
/// Features without a polygonal geometry are written with a null geometry.
pub fn polygons_to_geojson(features: &[Feature]) -> String {
    let features = features
        .iter()
        .map(|f| {
            let geometry = match &f.geometry {
                Some(Geometry::Polygon(p)) => Some(geojson::Geometry::new(
                    geojson::Value::Polygon(polygon_positions(p)),
                )),
                Some(Geometry::MultiPolygon(mp)) => Some(geojson::Geometry::new(
                    geojson::Value::MultiPolygon(mp.0.iter().map(polygon_positions).collect()),
                )),
                _ => None,
            };

            let mut properties = JsonObject::new();
            let mut keys: Vec<&String> = f.properties.keys().collect();
            keys.sort();
            for key in keys {
                properties.insert(key.clone(), attribute_to_json(&f.properties[key]));
            }

            geojson::Feature {
                bbox: None,
                geometry,
                id: f.id.clone().map(geojson::feature::Id::String),
                properties: Some(properties),
                foreign_members: None,
            }
        })
        .collect();

    GeoJson::FeatureCollection(geojson::FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    })
    .to_string()
}

/// Write polygon features to a GeoJSON file
pub fn write_polygons<P: AsRef<Path>>(path: P, features: &[Feature]) -> Result<()> {
    fs::write(path.as_ref(), polygons_to_geojson(features))?;
    Ok(())
}

fn parse_features(text: &str) -> Result<Vec<geojson::Feature>> {
    match text.parse::<GeoJson>()? {
        GeoJson::FeatureCollection(fc) => Ok(fc.features),
        GeoJson::Feature(f) => Ok(vec![f]),
        GeoJson::Geometry(_) => Err(Error::GeoJson(
            "expected a Feature or FeatureCollection, found a bare Geometry".to_string(),
        )),
    }
}

fn shape_from_value(value: &geojson::Value, index: usize) -> Result<Shape> {
    let polygons: Vec<&Vec<Vec<Vec<f64>>>> = match value {
        geojson::Value::Polygon(rings) => vec![rings],
        geojson::Value::MultiPolygon(polys) => polys.iter().collect(),
        other => {
            return Err(Error::GeoJson(format!(
                "feature {}: expected Polygon or MultiPolygon, found {}",
                index,
                geometry_kind(other)
            )))
        }
    };

    let mut rings = Vec::new();
    for polygon in polygons {
        for ring in polygon {
            let coords = ring
                .iter()
                .map(|position| coord_from_position(position, index))
                .collect::<Result<Vec<_>>>()?;
            rings.push(coords);
        }
    }
    Ok(Shape::from_rings(rings))
}

fn coord_from_position(position: &[f64], index: usize) -> Result<Coord<f64>> {
    match position {
        [x, y, ..] => Ok(Coord { x: *x, y: *y }),
        _ => Err(Error::GeoJson(format!(
            "feature {}: position with {} ordinates",
            index,
            position.len()
        ))),
    }
}

fn polygon_positions(polygon: &Polygon<f64>) -> Vec<Vec<Vec<f64>>> {
    std::iter::once(polygon.exterior())
        .chain(polygon.interiors())
        .map(|ring| ring.0.iter().map(|c| vec![c.x, c.y]).collect())
        .collect()
}

fn attribute_from_json(value: &JsonValue) -> AttributeValue {
    match value {
        JsonValue::Null => AttributeValue::Null,
        JsonValue::Bool(b) => AttributeValue::Bool(*b),
        JsonValue::Number(n) => match n.as_i64() {
            Some(i) => AttributeValue::Int(i),
            None => n
                .as_f64()
                .map(AttributeValue::Float)
                .unwrap_or(AttributeValue::Null),
        },
        JsonValue::String(s) => AttributeValue::String(s.clone()),
        other => AttributeValue::String(other.to_string()),
    }
}

fn attribute_to_json(value: &AttributeValue) -> JsonValue {
    match value {
        AttributeValue::Null => JsonValue::Null,
        AttributeValue::Bool(b) => JsonValue::Bool(*b),
        AttributeValue::Int(i) => JsonValue::from(*i),
        AttributeValue::Float(f) => serde_json::Number::from_f64(*f)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null),
        AttributeValue::String(s) => JsonValue::String(s.clone()),
    }
}

fn geometry_kind(value: &geojson::Value) -> &'static str {
    match value {
        geojson::Value::Point(_) => "Point",
        geojson::Value::MultiPoint(_) => "MultiPoint",
        geojson::Value::LineString(_) => "LineString",
        geojson::Value::MultiLineString(_) => "MultiLineString",
        geojson::Value::Polygon(_) => "Polygon",
        geojson::Value::MultiPolygon(_) => "MultiPolygon",
        geojson::Value::GeometryCollection(_) => "GeometryCollection",
    }
}
