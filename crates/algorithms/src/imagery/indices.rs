//! Spectral vegetation and water indices
//!
//! All indices operate on single-band rasters sharing one grid. Pixels
//! where any input is masked, or where the denominator vanishes, are masked.

use serde::{Deserialize, Serialize};
use statgis_core::{Raster, Result};

use crate::frames::rows_to_vec;
use crate::maybe_rayon::*;

const EPS: f64 = 1e-10;

/// Row-parallel per-pixel combination of same-grid bands
fn per_pixel<F>(bands: &[&Raster], f: F) -> Result<Raster>
where
    F: Fn(&[f64]) -> Option<f64> + Sync + Send,
{
    let first = bands[0];
    for band in &bands[1..] {
        first.check_same_grid(band)?;
    }

    let (rows, cols) = first.shape();
    let data: Vec<Vec<f64>> = (0..rows)
        .into_par_iter()
        .map(|row| {
            let mut values = vec![0.0; bands.len()];
            let mut row_data = vec![f64::NAN; cols];
            for col in 0..cols {
                for (value, band) in values.iter_mut().zip(bands) {
                    *value = unsafe { band.get_unchecked(row, col) };
                }
                if values.iter().any(|v| v.is_nan()) {
                    continue;
                }
                if let Some(v) = f(&values) {
                    row_data[col] = v;
                }
            }
            row_data
        })
        .collect();

    first.with_data(rows_to_vec(data))
}

// ---------------------------------------------------------------------------
// Generic normalized difference
// ---------------------------------------------------------------------------

/// Compute the normalized difference between two bands:
///
/// `(band_a - band_b) / (band_a + band_b)`
///
/// Result is in the range [-1, 1] for non-negative reflectances.
pub fn normalized_difference(band_a: &Raster, band_b: &Raster) -> Result<Raster> {
    per_pixel(&[band_a, band_b], |v| {
        let sum = v[0] + v[1];
        (sum.abs() >= EPS).then(|| (v[0] - v[1]) / sum)
    })
}

/// Normalized Difference Vegetation Index
///
/// `NDVI = (NIR - Red) / (NIR + Red)`
pub fn ndvi(nir: &Raster, red: &Raster) -> Result<Raster> {
    normalized_difference(nir, red)
}

/// Normalized Difference Water Index (McFeeters, 1996)
///
/// `NDWI = (Green - NIR) / (Green + NIR)`
///
/// Positive values indicate water bodies.
pub fn ndwi(green: &Raster, nir: &Raster) -> Result<Raster> {
    normalized_difference(green, nir)
}

/// Modified Normalized Difference Water Index (Xu, 2006)
///
/// `MNDWI = (Green - SWIR) / (Green + SWIR)`
pub fn mndwi(green: &Raster, swir: &Raster) -> Result<Raster> {
    normalized_difference(green, swir)
}

// ---------------------------------------------------------------------------
// EVI
// ---------------------------------------------------------------------------

/// Parameters for EVI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EviParams {
    /// Gain factor (default: 2.5)
    pub g: f64,
    /// Aerosol coefficient for red band (default: 6.0)
    pub c1: f64,
    /// Aerosol coefficient for blue band (default: 7.5)
    pub c2: f64,
    /// Canopy background adjustment (default: 1.0)
    pub l: f64,
}

impl Default for EviParams {
    fn default() -> Self {
        Self {
            g: 2.5,
            c1: 6.0,
            c2: 7.5,
            l: 1.0,
        }
    }
}

/// Enhanced Vegetation Index (Huete et al., 2002)
///
/// `EVI = G * (NIR - Red) / (NIR + C1 * Red - C2 * Blue + L)`
pub fn evi(nir: &Raster, red: &Raster, blue: &Raster, params: &EviParams) -> Result<Raster> {
    let EviParams { g, c1, c2, l } = *params;
    per_pixel(&[nir, red, blue], move |v| {
        let denom = v[0] + c1 * v[1] - c2 * v[2] + l;
        (denom.abs() >= EPS).then(|| g * (v[0] - v[1]) / denom)
    })
}
