//! Surface reflectance and temperature scaling for Landsat and Sentinel-2
//!
//! Scaled bands replace the raw digital numbers in place; every other band
//! is left untouched.

use statgis_core::{BandSelection, Frame, Result};
use tracing::debug;

/// Landsat Collection 2 optical bands (`SR_B1` .. `SR_B7`)
pub const LANDSAT_OPTICAL: &str = "SR_B.";
/// Landsat Collection 2 thermal bands (`ST_B10`, ...)
pub const LANDSAT_THERMAL: &str = "ST_B.*";
/// Sentinel-2 spectral bands (`B1` .. `B12`, `B8A`)
pub const SENTINEL_SPECTRAL: &str = "B.*";

/// Apply `f` to every band whose name matches `pattern`.
///
/// A pattern matching no band is not an error.
pub fn scale_bands<F>(frame: &Frame, pattern: &str, f: F) -> Result<Frame>
where
    F: Fn(f64) -> f64,
{
    let names = BandSelection::pattern(pattern).matching(&frame.band_names())?;
    let mut out = frame.clone();
    for name in &names {
        let scaled = frame.band(name)?.map(&f);
        out.add_band(name.clone(), scaled)?;
    }
    debug!(pattern, bands = names.len(), "scaled bands");
    Ok(out)
}

/// Scale Landsat Collection 2 Level-2 products.
///
/// Optical: `DN * 0.0000275 - 0.2`; thermal: `DN * 0.00341802 + 149` (Kelvin).
pub fn landsat_scaler(frame: &Frame) -> Result<Frame> {
    let optical = scale_bands(frame, LANDSAT_OPTICAL, |v| v * 0.0000275 - 0.2)?;
    scale_bands(&optical, LANDSAT_THERMAL, |v| v * 0.00341802 + 149.0)
}

/// Scale Sentinel-2 Level-2A reflectances: `DN / 10000`
pub fn sentinel_scaler(frame: &Frame) -> Result<Frame> {
    scale_bands(frame, SENTINEL_SPECTRAL, |v| v / 10000.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use statgis_core::Raster;

    fn landsat_frame() -> Frame {
        Frame::with_timestamp(0)
            .with_band("SR_B2", Raster::filled(2, 2, 10000.0))
            .unwrap()
            .with_band("SR_B10", Raster::filled(2, 2, 10000.0))
            .unwrap()
            .with_band("ST_B10", Raster::filled(2, 2, 40000.0))
            .unwrap()
            .with_band("QA_PIXEL", Raster::filled(2, 2, 21824.0))
            .unwrap()
    }

    #[test]
    fn test_landsat_scaler() {
        let scaled = landsat_scaler(&landsat_frame()).unwrap();
        assert_relative_eq!(scaled.band("SR_B2").unwrap().get(0, 0).unwrap(), 0.075, epsilon = 1e-12);
        assert_relative_eq!(
            scaled.band("ST_B10").unwrap().get(0, 0).unwrap(),
            40000.0 * 0.00341802 + 149.0,
            epsilon = 1e-9
        );
        // `SR_B.` matches exactly one character after the prefix
        assert_eq!(scaled.band("SR_B10").unwrap().get(0, 0).unwrap(), 10000.0);
        assert_eq!(scaled.band("QA_PIXEL").unwrap().get(0, 0).unwrap(), 21824.0);
        assert_eq!(scaled.band_names(), landsat_frame().band_names());
    }

    #[test]
    fn test_sentinel_scaler_keeps_masked_and_unmatched() {
        let mut b4 = Raster::filled(2, 2, 1500.0);
        b4.set(0, 0, f64::NAN).unwrap();
        let frame = Frame::new()
            .with_band("B4", b4)
            .unwrap()
            .with_band("QA60", Raster::filled(2, 2, 1024.0))
            .unwrap();

        let scaled = sentinel_scaler(&frame).unwrap();
        assert!(scaled.band("B4").unwrap().get(0, 0).unwrap().is_nan());
        assert_relative_eq!(scaled.band("B4").unwrap().get(1, 1).unwrap(), 0.15);
        assert_eq!(scaled.band("QA60").unwrap().get(0, 0).unwrap(), 1024.0);
    }

    #[test]
    fn test_no_matching_band_is_identity() {
        let frame = Frame::new().with_band("QA60", Raster::filled(1, 1, 3.0)).unwrap();
        assert_eq!(sentinel_scaler(&frame).unwrap(), frame);
    }
}
