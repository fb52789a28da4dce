//! Point-in-shape containment
//!
//! Bounding-box rejection first, then exact point-in-polygon on each part.
//! A point is inside a shape if any part contains it. Parts are not
//! classified as exterior or hole, so a point inside a hole ring is still
//! reported as contained.

use super::parts::polygon_parts;
use geo::{Contains, Point};
use ottobasin_core::{Result, Shape};

/// Where a point fell relative to a shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointLocation {
    /// Rejected by the bounding box; no polygon was tested
    OutsideBounds,
    /// Inside the bounding box but outside every part
    OutsideParts,
    /// Strictly inside the part at this index
    Inside { part: usize },
}

impl PointLocation {
    pub fn is_inside(&self) -> bool {
        matches!(self, PointLocation::Inside { .. })
    }
}

/// Locate a point relative to a shape.
///
/// Points exactly on a ring boundary are outside that part.
///
/// # Errors
/// `Error::MalformedRecord` if the bounding box admits the point and the
/// shape's part offsets are inconsistent.
pub fn locate(point: &Point<f64>, shape: &Shape, record: usize) -> Result<PointLocation> {
    if !shape.bbox.contains_point(point.x(), point.y()) {
        return Ok(PointLocation::OutsideBounds);
    }

    for (part, polygon) in polygon_parts(shape, record)?.enumerate() {
        if polygon.contains(point) {
            return Ok(PointLocation::Inside { part });
        }
    }

    Ok(PointLocation::OutsideParts)
}

/// True when any part of the shape strictly contains the point
pub fn contains(point: &Point<f64>, shape: &Shape, record: usize) -> Result<bool> {
    locate(point, shape, record).map(|loc| loc.is_inside())
}
