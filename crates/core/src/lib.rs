//! # statgis core
//!
//! Data model for the statgis remote-sensing toolkit.
//!
//! This crate provides:
//! - `Raster`: single-band `f64` grid, `NaN` marks masked cells
//! - `GeoTransform`: north-up georeferencing
//! - `Frame`: timestamped multi-band image with properties
//! - `Collection`: ordered set of frames with filter/map/merge/sort
//! - `BandSelection`: explicit choice between all bands, a list or a pattern
//! - `Region`: geometry of interest for zonal reductions
//! - Algorithm trait for a consistent API

pub mod calendar;
pub mod collection;
pub mod error;
pub mod frame;
pub mod raster;
pub mod selection;
pub mod vector;

pub use calendar::{CalendarUnit, MS_PER_YEAR};
pub use collection::Collection;
pub use error::{Error, Result};
pub use frame::{Band, Frame};
pub use raster::{GeoTransform, Raster, RasterStatistics};
pub use selection::BandSelection;
pub use vector::{AttributeValue, Region};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::calendar::CalendarUnit;
    pub use crate::collection::Collection;
    pub use crate::error::{Error, Result};
    pub use crate::frame::Frame;
    pub use crate::raster::{GeoTransform, Raster};
    pub use crate::selection::BandSelection;
    pub use crate::vector::Region;
    pub use crate::Algorithm;
}

/// Core trait for the named operations of statgis.
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
