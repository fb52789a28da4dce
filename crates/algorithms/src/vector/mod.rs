//! Vector operations on catchment shapes
//!
//! - Parts: split multi-part shapes into polygons
//! - Containment: bounding-box pre-filter plus exact point-in-polygon
//! - Union: self-intersection repair and cascaded polygon union

mod containment;
mod parts;
mod union;

pub use containment::{contains, locate, PointLocation};
pub use parts::{polygon_parts, validate_parts, PolygonParts};
pub use union::{cascaded_union, repair_polygon};
