//! Imagery analysis algorithms
//!
//! Algorithms for remote sensing and spectral analysis:
//! - Expression: per-pixel formulas over bands and scalars
//! - Spectral indices: NDVI, NDWI, MNDWI, EVI, normalized difference
//! - Sensor preprocessing: Landsat / Sentinel-2 scaling and cloud masks
//! - Connected pixel count
//! - River plume extraction and surface water frequency

mod cloud_mask;
mod connectivity;
mod expression;
mod indices;
mod plume;
mod rename;
mod scaling;
mod water;

pub use cloud_mask::{
    DEFAULT_CLOUD_PROBABILITY, LandsatMaskMode, clear_bits_mask, landsat_cloud_mask,
    sentinel_cloud_mask, sentinel_probability_mask,
};
pub use connectivity::connected_pixel_count;
pub use expression::{Binding, expression, frame_expression};
pub use indices::{EviParams, evi, mndwi, ndvi, ndwi, normalized_difference};
pub use plume::{PlumeParams, plume_characterization};
pub use rename::{rename_bands, rename_collection};
pub use scaling::{landsat_scaler, scale_bands, sentinel_scaler};
pub use water::{WATER_BAND, WaterBands, water_detection, water_frequency};
