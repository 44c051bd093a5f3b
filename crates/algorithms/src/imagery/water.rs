//! Surface water frequency
//!
//! Each frame is classified into water / not water from EVI, mNDWI and
//! NDVI; the per-pixel mean of that classification over the collection is
//! the fraction of valid observations in which the pixel was water.

use serde::{Deserialize, Serialize};
use statgis_core::{Collection, Error, Frame, Raster, Result};
use tracing::debug;

use super::indices::{EviParams, evi, mndwi, ndvi};
use crate::frames::map_frames;
use crate::statistics::{Reducer, reduce_collection};

/// Name of the water classification and frequency band
pub const WATER_BAND: &str = "WATER";

/// Band names of the blue, green, red, NIR and SWIR inputs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaterBands {
    pub blue: String,
    pub green: String,
    pub red: String,
    pub nir: String,
    pub swir: String,
}

impl Default for WaterBands {
    fn default() -> Self {
        Self {
            blue: "SR_B2".into(),
            green: "SR_B3".into(),
            red: "SR_B4".into(),
            nir: "SR_B5".into(),
            swir: "SR_B6".into(),
        }
    }
}

/// 1 where the pixel is water, 0 where it is not.
///
/// Water: `EVI < 0.1 && (mNDWI > EVI || mNDWI > NDVI)`.
pub fn water_detection(frame: &Frame, bands: &WaterBands) -> Result<Raster> {
    let blue = frame.band(&bands.blue)?;
    let green = frame.band(&bands.green)?;
    let red = frame.band(&bands.red)?;
    let nir = frame.band(&bands.nir)?;
    let swir = frame.band(&bands.swir)?;

    let m = mndwi(green, swir)?;
    let e = evi(nir, red, blue, &EviParams::default())?;
    let n = ndvi(nir, red)?;

    let wet = m.zip_map(&e, |m, e| if m > e { 1.0 } else { 0.0 })?;
    let wet = wet.zip_map(&m.zip_map(&n, |m, n| if m > n { 1.0 } else { 0.0 })?, f64::max)?;
    e.zip_map(&wet, |e, w| if e < 0.1 && w > 0.0 { 1.0 } else { 0.0 })
}

/// Fraction of observations in which each pixel was classified as water.
///
/// Output is a single-band frame with band `WATER`.
pub fn water_frequency(collection: &Collection, bands: &WaterBands) -> Result<Frame> {
    if collection.is_empty() {
        return Err(Error::EmptyInput {
            operation: "water_frequency",
        });
    }

    let classified = map_frames(collection, |frame| {
        frame
            .empty_like()
            .with_band(WATER_BAND, water_detection(frame, bands)?)
    })?;
    debug!(frames = classified.len(), "classified water");

    let mean = reduce_collection(&classified, &Reducer::mean())?;
    let mean_band = format!("{WATER_BAND}_mean");
    mean.rename(&[mean_band.as_str()], &[WATER_BAND])
}
