//! Vector data structures
//!
//! - `Shape`: flat coordinate list with part offsets, as stored by
//!   catchment layers (one part per ring)
//! - `ShapeRecord`: shape plus positional attribute values
//! - `Feature` / `FeatureCollection`: keyed attributes around a geo-types
//!   geometry, used for outlet points and result polygons

use geo_types::{Coord, Geometry, MultiPolygon};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Attribute value types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl AttributeValue {
    /// Interpret the value as a hierarchical code (reach or basin).
    ///
    /// Strings are trimmed. Integral numbers are rendered without a decimal
    /// part, which loses leading zeros; layers that rely on them must store
    /// codes as text.
    pub fn as_code(&self) -> Option<String> {
        match self {
            AttributeValue::String(s) => Some(s.trim().to_string()),
            AttributeValue::Int(i) => Some(i.to_string()),
            AttributeValue::Float(f) if f.is_finite() && f.fract() == 0.0 => {
                Some(format!("{}", *f as i64))
            }
            _ => None,
        }
    }

    /// Numeric value, if the attribute is stored as a number
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttributeValue::Int(i) => Some(*i as f64),
            AttributeValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, AttributeValue::Null)
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Null => write!(f, "null"),
            AttributeValue::Bool(b) => write!(f, "{}", b),
            AttributeValue::Int(i) => write!(f, "{}", i),
            AttributeValue::Float(v) => write!(f, "{}", v),
            AttributeValue::String(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        AttributeValue::String(s.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        AttributeValue::String(s)
    }
}

impl From<f64> for AttributeValue {
    fn from(v: f64) -> Self {
        AttributeValue::Float(v)
    }
}

impl From<i64> for AttributeValue {
    fn from(v: i64) -> Self {
        AttributeValue::Int(v)
    }
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self { min_x, min_y, max_x, max_y }
    }

    /// Inverted box that any `expand` call will overwrite
    pub fn empty() -> Self {
        Self {
            min_x: f64::INFINITY,
            min_y: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            max_y: f64::NEG_INFINITY,
        }
    }

    /// Bounding box of a coordinate list (empty box for no coordinates)
    pub fn from_coords<'a>(coords: impl IntoIterator<Item = &'a Coord<f64>>) -> Self {
        coords.into_iter().fold(Self::empty(), |mut bb, c| {
            bb.expand_coord(c);
            bb
        })
    }

    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x || self.min_y > self.max_y
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Inclusive on all four edges
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    pub fn expand_coord(&mut self, c: &Coord<f64>) {
        self.min_x = self.min_x.min(c.x);
        self.min_y = self.min_y.min(c.y);
        self.max_x = self.max_x.max(c.x);
        self.max_y = self.max_y.max(c.y);
    }

    pub fn expand(&mut self, other: &BoundingBox) {
        if other.is_empty() {
            return;
        }
        self.min_x = self.min_x.min(other.min_x);
        self.min_y = self.min_y.min(other.min_y);
        self.max_x = self.max_x.max(other.max_x);
        self.max_y = self.max_y.max(other.max_y);
    }
}

/// A polygon shape stored as one flat coordinate list.
///
/// `parts[i]` is the index in `points` where ring `i` starts; the ring ends
/// at `parts[i + 1]` or at the end of `points` for the last part. Holes and
/// disjoint pieces are both just additional parts.
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    pub bbox: BoundingBox,
    pub points: Vec<Coord<f64>>,
    pub parts: Vec<usize>,
}

impl Shape {
    /// Create a shape, computing its bounding box from the points
    pub fn new(points: Vec<Coord<f64>>, parts: Vec<usize>) -> Self {
        let bbox = BoundingBox::from_coords(&points);
        Self { bbox, points, parts }
    }

    /// Flatten a list of rings into a single shape, one part per ring
    pub fn from_rings<I>(rings: I) -> Self
    where
        I: IntoIterator<Item = Vec<Coord<f64>>>,
    {
        let mut points = Vec::new();
        let mut parts = Vec::new();
        for ring in rings {
            parts.push(points.len());
            points.extend(ring);
        }
        Self::new(points, parts)
    }

    /// Replace the computed bounding box with one supplied by the container
    pub fn with_bbox(mut self, bbox: BoundingBox) -> Self {
        self.bbox = bbox;
        self
    }

    pub fn num_parts(&self) -> usize {
        self.parts.len()
    }
}

/// A shape with its positional attribute values
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeRecord {
    pub shape: Shape,
    pub record: Vec<AttributeValue>,
}

impl ShapeRecord {
    pub fn new(shape: Shape, record: Vec<AttributeValue>) -> Self {
        Self { shape, record }
    }

    /// Attribute at a field position, `None` when out of range
    pub fn attribute(&self, index: usize) -> Option<&AttributeValue> {
        self.record.get(index)
    }
}

/// A geographic feature with geometry and attributes
#[derive(Debug, Clone)]
pub struct Feature {
    /// Feature geometry
    pub geometry: Option<Geometry<f64>>,
    /// Feature attributes
    pub properties: HashMap<String, AttributeValue>,
    /// Optional feature ID
    pub id: Option<String>,
}

impl Feature {
    /// Create a new feature with geometry
    pub fn new(geometry: Geometry<f64>) -> Self {
        Self {
            geometry: Some(geometry),
            properties: HashMap::new(),
            id: None,
        }
    }

    /// Set an attribute
    pub fn set_property(&mut self, key: impl Into<String>, value: AttributeValue) {
        self.properties.insert(key.into(), value);
    }

    /// Get an attribute
    pub fn get_property(&self, key: &str) -> Option<&AttributeValue> {
        self.properties.get(key)
    }
}

impl From<MultiPolygon<f64>> for Feature {
    fn from(mp: MultiPolygon<f64>) -> Self {
        Feature::new(Geometry::MultiPolygon(mp))
    }
}

/// Collection of features
#[derive(Debug, Clone, Default)]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new() -> Self {
        Self { features: Vec::new() }
    }

    pub fn push(&mut self, feature: Feature) {
        self.features.push(feature);
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Feature> {
        self.features.iter()
    }
}

impl IntoIterator for FeatureCollection {
    type Item = Feature;
    type IntoIter = std::vec::IntoIter<Feature>;

    fn into_iter(self) -> Self::IntoIter {
        self.features.into_iter()
    }
}
