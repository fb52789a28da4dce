//! Polygon assembly from multi-part shapes
//!
//! A [`Shape`] stores every ring in one coordinate list; this module slices
//! it back into one `Polygon` per part. Rings are not checked for
//! simplicity or orientation, and holes come out as separate polygons.

use geo::{LineString, Polygon};
use ottobasin_core::{Error, Result, Shape};
use std::ops::Range;

/// Lazy iterator over the polygons of a shape, one per part
#[derive(Debug, Clone)]
pub struct PolygonParts<'a> {
    shape: &'a Shape,
    next: usize,
}

impl<'a> PolygonParts<'a> {
    /// Coordinate range of each part, without building polygons
    pub fn ranges(&self) -> impl Iterator<Item = Range<usize>> + 'a {
        let shape = self.shape;
        (0..shape.parts.len()).map(move |i| part_range(shape, i))
    }
}

impl Iterator for PolygonParts<'_> {
    type Item = Polygon<f64>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.shape.parts.len() {
            return None;
        }
        let range = part_range(self.shape, self.next);
        self.next += 1;
        let ring = LineString::from(self.shape.points[range].to_vec());
        Some(Polygon::new(ring, vec![]))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.shape.parts.len().saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for PolygonParts<'_> {}

/// Split a shape into its part polygons.
///
/// Offsets are validated up front, so the returned iterator itself cannot
/// fail. Each call starts from the first part again.
///
/// # Arguments
/// * `shape` - Multi-part shape
/// * `record` - Record index, used for error reporting only
///
/// # Errors
/// `Error::MalformedRecord` when an offset exceeds the coordinate count or
/// offsets decrease.
pub fn polygon_parts(shape: &Shape, record: usize) -> Result<PolygonParts<'_>> {
    validate_parts(shape, record)?;
    Ok(PolygonParts { shape, next: 0 })
}

/// Check that part offsets are non-decreasing and within the coordinate list
pub fn validate_parts(shape: &Shape, record: usize) -> Result<()> {
    let count = shape.points.len();
    let mut previous = 0;
    for (i, &start) in shape.parts.iter().enumerate() {
        if start > count {
            return Err(Error::MalformedRecord {
                record,
                reason: format!(
                    "part {} starts at offset {} but shape has {} points",
                    i, start, count
                ),
            });
        }
        if start < previous {
            return Err(Error::MalformedRecord {
                record,
                reason: format!(
                    "part {} starts at offset {} before previous part at {}",
                    i, start, previous
                ),
            });
        }
        previous = start;
    }
    Ok(())
}

fn part_range(shape: &Shape, i: usize) -> Range<usize> {
    let start = shape.parts[i];
    let end = shape
        .parts
        .get(i + 1)
        .copied()
        .unwrap_or(shape.points.len());
    start..end
}
