//! Hydrological analysis on ottobacia catchment layers
//!
//! - Basin codes: hierarchical reach/basin code matching
//! - Aggregation: repaired polygon union and area sums
//! - Delineation: two-pass basin search from an outlet point
//! - Criticality: granted flow against Q95 per outlet basin

mod aggregate;
mod basin_code;
mod criticality;
mod delineation;

pub use aggregate::{parse_area, parse_number, BasinAggregator};
pub use basin_code::{normalize_basin_code, SeedMatch};
pub use criticality::{
    grant_criticality, outlets_from_features, reference_flows, CriticalityParams,
    CriticalityReport, CriticalityRow, Outlet, UnresolvedOutlet, UnresolvedReason,
};
pub use delineation::{find_basin, BasinResult, FindBasin, FindBasinParams};
