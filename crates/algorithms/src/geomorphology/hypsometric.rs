//! Hypsometric curve of a catchment
//!
//! Relative area above each relative height of a DEM clipped to a
//! catchment polygon. The curve starts at (area 1, height 0); each of the
//! `samples` height slices appends the fraction of pixels lying above the
//! slice's upper bound, at the slice's mid-height.

use geo::Geometry;
use serde::{Deserialize, Serialize};
use statgis_core::{Algorithm, Error, Frame, Result};
use tracing::debug;

use crate::statistics::{Reducer, Statistic, sample_frame};

/// Parameters for [`hypsometric_curve`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HypsometricParams {
    /// Elevation band of the DEM frame
    pub band: String,
    /// Number of height slices
    pub samples: usize,
    /// Sampling cell size in map units
    pub scale: f64,
}

impl Default for HypsometricParams {
    fn default() -> Self {
        Self {
            band: "elevation".into(),
            samples: 20,
            scale: 30.0,
        }
    }
}

/// Normalised area and height pairs, `samples + 1` of each
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HypsometricCurve {
    pub area: Vec<f64>,
    pub height: Vec<f64>,
}

/// Compute the hypsometric curve of `catchment` on the DEM `dem`.
///
/// # Errors
/// - `InvalidParameter` if `samples` is 0
/// - `EmptyInput` if the catchment holds no unmasked elevation
pub fn hypsometric_curve(
    dem: &Frame,
    catchment: &Geometry<f64>,
    params: &HypsometricParams,
) -> Result<HypsometricCurve> {
    if params.samples == 0 {
        return Err(Error::InvalidParameter {
            name: "samples",
            value: "0".into(),
            reason: "need at least one height slice".into(),
        });
    }

    let heights = sample_frame(dem, &params.band, catchment, params.scale)?;
    let mut limits = Reducer::min().combine(Reducer::max()).accumulator();
    for &h in &heights {
        limits.push(h);
    }
    if limits.count() == 0 {
        return Err(Error::EmptyInput {
            operation: "hypsometric_curve",
        });
    }
    let min = limits.finish(Statistic::Min);
    let max = limits.finish(Statistic::Max);
    let count = limits.count() as f64;
    let range = (max - min) / params.samples as f64;

    let mut curve = HypsometricCurve {
        area: Vec::with_capacity(params.samples + 1),
        height: Vec::with_capacity(params.samples + 1),
    };
    curve.area.push(1.0);
    curve.height.push(0.0);

    for i in 0..params.samples {
        let upper = min + range * (i + 1) as f64;
        let below = heights.iter().filter(|&&h| h >= min && h <= upper).count() as f64;
        curve.height.push((i as f64 + 0.5) / params.samples as f64);
        curve.area.push(1.0 - below / count);
    }

    debug!(min, max, pixels = heights.len(), samples = params.samples, "hypsometric curve");
    Ok(curve)
}

/// Hypsometric curve as an [`Algorithm`]
#[derive(Debug, Clone, Default)]
pub struct HypsometricCurveAlgorithm;

impl Algorithm for HypsometricCurveAlgorithm {
    type Input = (Frame, Geometry<f64>);
    type Output = HypsometricCurve;
    type Params = HypsometricParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "HypsometricCurve"
    }

    fn description(&self) -> &'static str {
        "Relative area above relative height within a catchment"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        let (dem, catchment) = input;
        hypsometric_curve(&dem, &catchment, &params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use geo::{Rect, coord};
    use statgis_core::{GeoTransform, Raster};

    /// 10 x 10 DEM, 30 m cells, elevation = 10 * row + col
    fn dem() -> Frame {
        let data: Vec<f64> = (0..100).map(f64::from).collect();
        let mut raster = Raster::from_vec(data, 10, 10).unwrap();
        raster.set_transform(GeoTransform::new(0.0, 300.0, 30.0, -30.0));
        Frame::new().with_band("elevation", raster).unwrap()
    }

    fn whole() -> Geometry<f64> {
        Rect::new(coord! { x: 0.0, y: 0.0 }, coord! { x: 300.0, y: 300.0 }).into()
    }

    #[test]
    fn test_uniform_distribution() {
        let params = HypsometricParams {
            samples: 4,
            ..HypsometricParams::default()
        };
        let curve = hypsometric_curve(&dem(), &whole(), &params).unwrap();

        let expected_area = [1.0, 0.75, 0.5, 0.25, 0.0];
        let expected_height = [0.0, 0.125, 0.375, 0.625, 0.875];
        for i in 0..5 {
            assert_relative_eq!(curve.area[i], expected_area[i], epsilon = 1e-12);
            assert_relative_eq!(curve.height[i], expected_height[i], epsilon = 1e-12);
        }
    }

    #[test]
    fn test_default_samples() {
        let curve = HypsometricCurveAlgorithm.execute_default((dem(), whole())).unwrap();
        assert_eq!(curve.area.len(), 21);
        assert_eq!(*curve.area.last().unwrap(), 0.0);
        assert!(curve.area.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn test_errors() {
        let outside: Geometry<f64> = Rect::new(coord! { x: 900.0, y: 900.0 }, coord! { x: 990.0, y: 990.0 }).into();
        assert!(matches!(
            hypsometric_curve(&dem(), &outside, &HypsometricParams::default()),
            Err(Error::EmptyInput { .. })
        ));
        let zero = HypsometricParams {
            samples: 0,
            ..HypsometricParams::default()
        };
        assert!(hypsometric_curve(&dem(), &whole(), &zero).is_err());
    }
}
