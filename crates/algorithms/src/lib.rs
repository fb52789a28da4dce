//! # Ottobasin Algorithms
//!
//! Basin delineation over vector catchment layers.
//!
//! ## Available Algorithm Categories
//!
//! - **vector**: part assembly, point containment, polygon repair and union
//! - **hydrology**: hierarchical basin matching, delineation, grant criticality

pub mod hydrology;
pub mod vector;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::hydrology::{
        find_basin, grant_criticality, BasinResult, CriticalityParams, CriticalityReport,
        FindBasin, FindBasinParams, Outlet,
    };
    pub use crate::vector::{cascaded_union, contains, locate, PointLocation};
    pub use ottobasin_core::prelude::*;
}
