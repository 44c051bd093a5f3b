//! # statgis algorithms
//!
//! Remote-sensing analysis over statgis frames and collections.
//!
//! ## Available Algorithm Categories
//!
//! - **timeseries**: time covariate, per-pixel linear trend, detrending,
//!   monthly/yearly aggregation, anomalies
//! - **statistics**: reducers, region reduction, zonal statistics, sampling
//! - **imagery**: expressions, spectral indices, sensor scaling and cloud
//!   masks, connected pixel count, plume extraction, water frequency
//! - **geomorphology**: hypsometric curve

mod frames;
mod maybe_rayon;

pub mod geomorphology;
pub mod imagery;
pub mod statistics;
pub mod timeseries;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::geomorphology::{HypsometricParams, hypsometric_curve};
    pub use crate::imagery::{
        LandsatMaskMode, PlumeParams, WaterBands, expression, frame_expression, landsat_cloud_mask,
        landsat_scaler, ndvi, ndwi, plume_characterization, sentinel_cloud_mask, sentinel_scaler,
        water_frequency,
    };
    pub use crate::statistics::{
        Reducer, ReducerSelection, RegionParams, ZonalParams, ZonalRecord, ZonalStatistics,
        reduce_collection, reduce_region, zonal_statistics_collection, zonal_statistics_frame,
    };
    pub use crate::timeseries::{
        Decomposition, PeriodicSummary, TimeSeriesProcessing, TrendModel, calc_anomalies,
        linear_fit, reduce_by_month, reduce_by_year, time_series_processing, trend,
    };
    pub use statgis_core::prelude::*;
}
