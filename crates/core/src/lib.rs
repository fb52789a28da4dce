//! # Ottobasin Core
//!
//! Core types, traits and I/O for ottobacia basin delineation.
//!
//! This crate provides:
//! - `Shape` / `ShapeRecord`: polygon records stored as flat coordinates
//!   with part offsets, plus positional attributes
//! - `RecordSource`: restartable sequential access to a catchment layer
//! - `Algorithm`: trait for a consistent algorithm API
//! - I/O for GeoJSON catchment layers, outlet points and basin polygons

pub mod error;
pub mod io;
pub mod source;
pub mod vector;

pub use error::{Error, Result};
pub use source::{MemorySource, RecordIter, RecordSource};
pub use vector::{AttributeValue, BoundingBox, Feature, FeatureCollection, Shape, ShapeRecord};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::source::{MemorySource, RecordSource};
    pub use crate::vector::{AttributeValue, BoundingBox, Shape, ShapeRecord};
    pub use crate::Algorithm;
}

/// Core trait for all algorithms in Ottobasin.
///
/// Algorithms are pure functions that transform input data according to parameters.
pub trait Algorithm {
    /// Input type for the algorithm
    type Input;
    /// Output type for the algorithm
    type Output;
    /// Parameters controlling algorithm behavior
    type Params: Default;
    /// Error type for algorithm execution
    type Error: std::error::Error;

    /// Returns the algorithm name
    fn name(&self) -> &'static str;

    /// Returns a description of what the algorithm does
    fn description(&self) -> &'static str;

    /// Execute the algorithm
    fn execute(&self, input: Self::Input, params: Self::Params) -> std::result::Result<Self::Output, Self::Error>;

    /// Execute with default parameters
    fn execute_default(&self, input: Self::Input) -> std::result::Result<Self::Output, Self::Error> {
        self.execute(input, Self::Params::default())
    }
}
