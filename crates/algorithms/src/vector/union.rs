//! Polygon repair and union
//!
//! - Repair: resolve self-touching and self-crossing rings into valid
//!   polygons, the zero-distance buffer equivalent
//! - Cascaded union: merge many polygons by pairwise reduction, which keeps
//!   the operands of each boolean operation small and balanced

use geo::{BooleanOps, MultiPolygon, Polygon};

/// Repair a possibly self-intersecting polygon.
///
/// The ring is run through a boolean union against an empty operand, which
/// rebuilds it under the even-odd fill rule. A valid polygon comes back
/// with the same area; a bow-tie comes back as its two lobes.
pub fn repair_polygon(polygon: &Polygon<f64>) -> MultiPolygon<f64> {
    MultiPolygon::new(vec![polygon.clone()]).union(&MultiPolygon::new(vec![]))
}

/// Union all polygons into one (possibly multi-part) geometry.
///
/// Inputs may touch, overlap or share edges. Returns an empty
/// `MultiPolygon` for no inputs.
pub fn cascaded_union(mut polygons: Vec<MultiPolygon<f64>>) -> MultiPolygon<f64> {
    while polygons.len() > 1 {
        let mut merged = Vec::with_capacity(polygons.len().div_ceil(2));
        let mut iter = polygons.into_iter();
        while let Some(a) = iter.next() {
            match iter.next() {
                Some(b) => merged.push(a.union(&b)),
                None => merged.push(a),
            }
        }
        polygons = merged;
    }

    polygons
        .pop()
        .unwrap_or_else(|| MultiPolygon::new(vec![]))
}
