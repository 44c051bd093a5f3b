//! Per-pixel linear trend and detrending
//!
//! The trend of a band is an ordinary least squares fit against the `time`
//! covariate, computed independently at every pixel. Detrending subtracts
//! the fitted value and re-adds the collection-wide mean of the band, so the
//! stational series keeps the level of the original one.

use std::collections::HashMap;

use statgis_core::{BandSelection, Collection, Error, Frame, Raster, Result};
use tracing::{debug, warn};

use super::temporal::{TIME_BAND, add_time_bands};
use crate::frames::{map_frames, rows_to_vec};
use crate::imagery::{Binding, expression};
use crate::maybe_rayon::*;
use crate::statistics::{Reducer, reduce_collection};

/// Band holding `time * slope + intercept`
pub const PREDICTED_BAND: &str = "predicted";
/// Band holding `band - predicted + mean`
pub const STATIONAL_BAND: &str = "stational";

/// Per-pixel linear model `value = slope * time + intercept`.
///
/// Pixels with fewer than two valid samples, or no spread in time, are
/// masked in both rasters.
#[derive(Debug, Clone, PartialEq)]
pub struct TrendModel {
    pub slope: Raster,
    pub intercept: Raster,
}

impl TrendModel {
    /// Fitted value at `time` (years since the epoch) for every pixel
    pub fn predict(&self, time: f64) -> Result<Raster> {
        self.slope.zip_map(&self.intercept, |s, i| time * s + i)
    }

    /// Number of pixels with a defined fit
    pub fn fitted_count(&self) -> usize {
        self.slope.valid_count()
    }
}

/// Streaming simple regression of y on x (Welford co-moments)
#[derive(Debug, Clone, Copy, Default)]
struct Fit {
    n: f64,
    mean_x: f64,
    mean_y: f64,
    sxx: f64,
    sxy: f64,
}

impl Fit {
    fn push(&mut self, x: f64, y: f64) {
        self.n += 1.0;
        let dx = x - self.mean_x;
        self.mean_x += dx / self.n;
        self.mean_y += (y - self.mean_y) / self.n;
        self.sxx += dx * (x - self.mean_x);
        self.sxy += dx * (y - self.mean_y);
    }

    /// (slope, intercept), or `None` when the fit is undefined
    fn solve(&self) -> Option<(f64, f64)> {
        if self.n < 2.0 || self.sxx <= f64::EPSILON * self.n * self.mean_x.abs().max(1.0) {
            return None;
        }
        let slope = self.sxy / self.sxx;
        Some((slope, self.mean_y - slope * self.mean_x))
    }
}

/// Fit `band` against `time` at every pixel over the whole collection.
///
/// Only samples where both `time` and `band` are unmasked take part.
///
/// # Errors
/// - `EmptyInput` if the collection has no frames
/// - `InvalidBand` if any frame lacks `time` or `band`
pub fn linear_fit(collection: &Collection, band: &str) -> Result<TrendModel> {
    let first = collection.first().ok_or(Error::EmptyInput {
        operation: "linear_fit",
    })?;
    let template = first.band(band)?;

    let mut pairs: Vec<(&Raster, &Raster)> = Vec::with_capacity(collection.len());
    for frame in collection {
        let x = frame.band(TIME_BAND)?;
        let y = frame.band(band)?;
        template.check_same_grid(x)?;
        template.check_same_grid(y)?;
        pairs.push((x, y));
    }

    let (rows, cols) = template.shape();
    let fitted: Vec<(Vec<f64>, Vec<f64>)> = (0..rows)
        .into_par_iter()
        .map(|row| {
            let mut slope = vec![f64::NAN; cols];
            let mut intercept = vec![f64::NAN; cols];
            for col in 0..cols {
                let mut fit = Fit::default();
                for (x, y) in &pairs {
                    let xv = unsafe { x.get_unchecked(row, col) };
                    let yv = unsafe { y.get_unchecked(row, col) };
                    if xv.is_nan() || yv.is_nan() {
                        continue;
                    }
                    fit.push(xv, yv);
                }
                if let Some((s, i)) = fit.solve() {
                    slope[col] = s;
                    intercept[col] = i;
                }
            }
            (slope, intercept)
        })
        .collect();

    let (slopes, intercepts): (Vec<Vec<f64>>, Vec<Vec<f64>>) = fitted.into_iter().unzip();
    let model = TrendModel {
        slope: template.with_data(rows_to_vec(slopes))?,
        intercept: template.with_data(rows_to_vec(intercepts))?,
    };

    let masked = template.len() - model.fitted_count();
    if masked > 0 {
        warn!(
            band,
            masked,
            pixels = template.len(),
            "linear fit undefined at pixels with fewer than two valid samples"
        );
    }
    debug!(band, frames = pairs.len(), "fitted linear trend");
    Ok(model)
}

/// Fit the trend of `band` and detrend every frame.
///
/// Output frames carry `time`, `band`, `predicted` and `stational`, in that
/// order, where `predicted = time * slope + intercept` and
/// `stational = band - predicted + mean`, `mean` being the per-pixel mean of
/// `band` over the whole input collection.
pub fn trend(collection: &Collection, band: &str) -> Result<Collection> {
    if collection.is_empty() {
        return Err(Error::EmptyInput { operation: "trend" });
    }

    let mean = reduce_collection(&collection.select(&BandSelection::one(band))?, &Reducer::mean())?;
    let mean = mean.band(&format!("{band}_mean"))?.clone();

    let projected = add_time_bands(collection)?.select(&BandSelection::names([TIME_BAND, band]))?;
    let model = linear_fit(&projected, band)?;

    map_frames(&projected, |frame| detrend_frame(frame, band, &model, &mean))
}

fn detrend_frame(frame: &Frame, band: &str, model: &TrendModel, mean: &Raster) -> Result<Frame> {
    let fitted = HashMap::from([
        ("time", Binding::Band(frame.band(TIME_BAND)?)),
        ("slope", Binding::Band(&model.slope)),
        ("intercept", Binding::Band(&model.intercept)),
    ]);
    let predicted = expression("time * slope + intercept", &fitted)?;

    let residual = HashMap::from([
        ("band", Binding::Band(frame.band(band)?)),
        ("pred", Binding::Band(&predicted)),
        ("mean", Binding::Band(mean)),
    ]);
    let stational = expression("band - pred + mean", &residual)?;

    let mut out = frame.clone();
    out.add_band(PREDICTED_BAND, predicted)?;
    out.add_band(STATIONAL_BAND, stational)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::temporal::add_time_band;
    use approx::assert_relative_eq;
    use statgis_core::MS_PER_YEAR;

    /// Frame at `years` since the epoch with a 2 x 2 band `v`
    fn frame(years: f64, values: [f64; 4]) -> Frame {
        let ts = (years * MS_PER_YEAR).round() as i64;
        Frame::with_timestamp(ts)
            .with_band("v", Raster::from_vec(values.to_vec(), 2, 2).unwrap())
            .unwrap()
    }

    /// v = 3 t + 1 at pixel 0, constant 5 at pixel 1, one sample at pixel 2,
    /// alternating +-1 around 2 t at pixel 3
    fn series() -> Collection {
        (0..6)
            .map(|i| {
                let t = 50.0 + i as f64;
                let lonely = if i == 0 { 9.0 } else { f64::NAN };
                let wobble = 2.0 * t + if i % 2 == 0 { 1.0 } else { -1.0 };
                frame(t, [3.0 * t + 1.0, 5.0, lonely, wobble])
            })
            .collect()
    }

    #[test]
    fn test_linear_fit_recovers_line() {
        let timed = series().map(add_time_band).unwrap();
        let model = linear_fit(&timed, "v").unwrap();

        assert_relative_eq!(model.slope.get(0, 0).unwrap(), 3.0, epsilon = 1e-6);
        assert_relative_eq!(model.intercept.get(0, 0).unwrap(), 1.0, epsilon = 1e-4);
        assert_relative_eq!(model.slope.get(0, 1).unwrap(), 0.0, epsilon = 1e-9);
        assert_relative_eq!(model.intercept.get(0, 1).unwrap(), 5.0, epsilon = 1e-6);
        // fewer than two valid samples
        assert!(model.slope.get(1, 0).unwrap().is_nan());
        assert!(model.intercept.get(1, 0).unwrap().is_nan());
        assert_eq!(model.fitted_count(), 3);
    }

    #[test]
    fn test_predict() {
        let timed = series().map(add_time_band).unwrap();
        let model = linear_fit(&timed, "v").unwrap();
        let p = model.predict(60.0).unwrap();
        assert_relative_eq!(p.get(0, 0).unwrap(), 181.0, epsilon = 1e-4);
    }

    #[test]
    fn test_linear_fit_errors() {
        assert!(matches!(
            linear_fit(&Collection::new(), "v"),
            Err(Error::EmptyInput { .. })
        ));
        // no time band attached
        assert!(matches!(linear_fit(&series(), "v"), Err(Error::InvalidBand { .. })));
    }

    #[test]
    fn test_trend_bands_and_values() {
        let out = trend(&series(), "v").unwrap();
        assert_eq!(out.len(), 6);
        for frame in &out {
            assert_eq!(frame.band_names(), vec!["time", "v", "predicted", "stational"]);
        }

        // exact line: stational is the mean everywhere
        let mean_line = (0..6).map(|i| 3.0 * (50.0 + i as f64) + 1.0).sum::<f64>() / 6.0;
        for frame in &out {
            let s = frame.band(STATIONAL_BAND).unwrap().get(0, 0).unwrap();
            assert_relative_eq!(s, mean_line, epsilon = 1e-4);
        }

        // undefined fit propagates as masked
        assert!(out.frames()[0].band(STATIONAL_BAND).unwrap().get(1, 0).unwrap().is_nan());
    }

    #[test]
    fn test_stational_preserves_mean() {
        let input = series();
        let out = trend(&input, "v").unwrap();

        let mean_of = |c: &Collection, band: &str| {
            let values: Vec<f64> = c
                .iter()
                .map(|f| f.band(band).unwrap().get(1, 1).unwrap())
                .collect();
            values.iter().sum::<f64>() / values.len() as f64
        };
        assert_relative_eq!(mean_of(&out, STATIONAL_BAND), mean_of(&input, "v"), epsilon = 1e-6);
    }

    #[test]
    fn test_trend_errors() {
        assert!(matches!(trend(&Collection::new(), "v"), Err(Error::EmptyInput { .. })));
        assert!(matches!(trend(&series(), "NDVI"), Err(Error::InvalidBand { .. })));
    }
}
