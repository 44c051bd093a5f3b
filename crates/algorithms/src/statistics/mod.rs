//! Statistical reductions of frames and collections
//!
//! - **reducer**: pluggable statistics and pixel-wise collection reduction
//! - **region**: spatial reduction over a geometry
//! - **zonal**: per-region statistic records for frames and collections
//! - **sample**: raw pixel values inside a region

pub mod reducer;
pub mod region;
pub mod sample;
pub mod zonal;

pub use reducer::{Accumulator, Reducer, Statistic, reduce_collection};
pub use region::{RegionParams, reduce_region, region_pixels};
pub use sample::{sample_collection, sample_frame};
pub use zonal::{
    ReducerSelection, ZonalParams, ZonalRecord, ZonalStatistics, zonal_statistics_collection,
    zonal_statistics_frame,
};
