//! Cloud masking from quality bands

use serde::{Deserialize, Serialize};
use statgis_core::{Frame, Raster, Result};
use tracing::debug;

/// Landsat `QA_PIXEL` bits
pub const LANDSAT_CIRRUS_BIT: u32 = 2;
pub const LANDSAT_CLOUD_BIT: u32 = 3;
pub const LANDSAT_SHADOW_BIT: u32 = 4;
pub const LANDSAT_SNOW_BIT: u32 = 5;

/// Sentinel-2 `QA60` bits
pub const SENTINEL_CLOUD_BIT: u32 = 10;
pub const SENTINEL_CIRRUS_BIT: u32 = 11;

/// Which `QA_PIXEL` classes mask a Landsat pixel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LandsatMaskMode {
    /// Cirrus, cloud, cloud shadow and snow
    #[default]
    AllClasses,
    /// Cloud only
    CloudOnly,
}

impl LandsatMaskMode {
    fn bits(&self) -> &'static [u32] {
        match self {
            LandsatMaskMode::AllClasses => &[
                LANDSAT_CIRRUS_BIT,
                LANDSAT_CLOUD_BIT,
                LANDSAT_SHADOW_BIT,
                LANDSAT_SNOW_BIT,
            ],
            LandsatMaskMode::CloudOnly => &[LANDSAT_CLOUD_BIT],
        }
    }
}

/// 1 where none of `bits` is set in `qa`, 0 otherwise (masked QA stays masked)
pub fn clear_bits_mask(qa: &Raster, bits: &[u32]) -> Raster {
    let flags = bits.iter().fold(0i64, |acc, bit| acc | (1i64 << *bit));
    qa.map(|v| if (v as i64) & flags == 0 { 1.0 } else { 0.0 })
}

fn mask_with_bits(frame: &Frame, qa_band: &str, bits: &[u32]) -> Result<Frame> {
    let mask = clear_bits_mask(frame.band(qa_band)?, bits);
    let mut out = frame.clone();
    out.update_mask(&mask)?;
    debug!(
        qa_band,
        clear = mask.statistics().mean.unwrap_or(f64::NAN),
        "applied quality mask"
    );
    Ok(out)
}

/// Mask Landsat Collection 2 pixels flagged in `QA_PIXEL`
pub fn landsat_cloud_mask(frame: &Frame, mode: LandsatMaskMode) -> Result<Frame> {
    mask_with_bits(frame, "QA_PIXEL", mode.bits())
}

/// Mask Sentinel-2 opaque clouds and cirrus flagged in `QA60`
pub fn sentinel_cloud_mask(frame: &Frame) -> Result<Frame> {
    mask_with_bits(frame, "QA60", &[SENTINEL_CLOUD_BIT, SENTINEL_CIRRUS_BIT])
}

/// Default cloud probability threshold, percent
pub const DEFAULT_CLOUD_PROBABILITY: f64 = 20.0;

/// Keep Sentinel-2 pixels whose `MSK_CLDPRB` is at most `probability` percent
pub fn sentinel_probability_mask(frame: &Frame, probability: f64) -> Result<Frame> {
    let mask = frame
        .band("MSK_CLDPRB")?
        .map(|p| if p <= probability { 1.0 } else { 0.0 });
    let mut out = frame.clone();
    out.update_mask(&mask)?;
    Ok(out)
}
