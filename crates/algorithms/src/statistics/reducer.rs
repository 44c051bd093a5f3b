//! Reducers: pluggable statistics over sets of pixel values
//!
//! A [`Reducer`] is one or more [`Statistic`]s computed jointly over the same
//! inputs. It is used pixel-wise across the frames of a collection
//! ([`reduce_collection`]) and spatially over a region
//! ([`reduce_region`](super::reduce_region)).

use crate::frames::rows_to_vec;
use crate::maybe_rayon::*;
use serde::{Deserialize, Serialize};
use statgis_core::{Collection, Error, Frame, Raster, Result};
use tracing::debug;

/// A single summary statistic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Statistic {
    /// Arithmetic mean
    Mean,
    /// Standard deviation (population)
    StdDev,
    Min,
    Max,
    /// Number of unmasked values
    Count,
    Sum,
    Median,
}

impl Statistic {
    /// Suffix used in output band and record names
    pub fn name(&self) -> &'static str {
        match self {
            Statistic::Mean => "mean",
            Statistic::StdDev => "std_dev",
            Statistic::Min => "min",
            Statistic::Max => "max",
            Statistic::Count => "count",
            Statistic::Sum => "sum",
            Statistic::Median => "median",
        }
    }
}

/// One or more statistics evaluated over shared inputs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reducer {
    statistics: Vec<Statistic>,
}

impl Reducer {
    pub fn new(statistic: Statistic) -> Self {
        Self {
            statistics: vec![statistic],
        }
    }

    pub fn mean() -> Self {
        Self::new(Statistic::Mean)
    }

    pub fn std_dev() -> Self {
        Self::new(Statistic::StdDev)
    }

    pub fn min() -> Self {
        Self::new(Statistic::Min)
    }

    pub fn max() -> Self {
        Self::new(Statistic::Max)
    }

    pub fn count() -> Self {
        Self::new(Statistic::Count)
    }

    pub fn sum() -> Self {
        Self::new(Statistic::Sum)
    }

    pub fn median() -> Self {
        Self::new(Statistic::Median)
    }

    /// Mean, standard deviation, max, min and count, computed jointly
    pub fn all() -> Self {
        Self::mean()
            .combine(Self::std_dev())
            .combine(Self::max())
            .combine(Self::min())
            .combine(Self::count())
    }

    /// Append the statistics of `other`; duplicates are kept once
    pub fn combine(mut self, other: Reducer) -> Self {
        for stat in other.statistics {
            if !self.statistics.contains(&stat) {
                self.statistics.push(stat);
            }
        }
        self
    }

    pub fn statistics(&self) -> &[Statistic] {
        &self.statistics
    }

    /// Whether outputs carry a `_<statistic>` suffix in region reductions
    pub fn is_combined(&self) -> bool {
        self.statistics.len() > 1
    }

    fn needs_values(&self) -> bool {
        self.statistics.contains(&Statistic::Median)
    }

    /// Fresh accumulator able to produce every statistic of this reducer
    pub fn accumulator(&self) -> Accumulator {
        Accumulator::new(self.needs_values())
    }
}

/// Streaming accumulator over `f64` samples; `NaN` samples are skipped.
///
/// Mean and variance use Welford's update and Chan's merge so partial
/// accumulators from different tiles combine exactly.
#[derive(Debug, Clone)]
pub struct Accumulator {
    count: usize,
    mean: f64,
    m2: f64,
    sum: f64,
    min: f64,
    max: f64,
    values: Option<Vec<f64>>,
}

impl Accumulator {
    pub fn new(keep_values: bool) -> Self {
        Self {
            count: 0,
            mean: 0.0,
            m2: 0.0,
            sum: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            values: keep_values.then(Vec::new),
        }
    }

    pub fn push(&mut self, value: f64) {
        if value.is_nan() {
            return;
        }
        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
        self.sum += value;
        self.min = self.min.min(value);
        self.max = self.max.max(value);
        if let Some(values) = self.values.as_mut() {
            values.push(value);
        }
    }

    pub fn merge(&mut self, other: &Accumulator) {
        if other.count == 0 {
            return;
        }
        if self.count == 0 {
            let keep = self.values.is_some();
            *self = other.clone();
            if !keep {
                self.values = None;
            }
            return;
        }
        let n_a = self.count as f64;
        let n_b = other.count as f64;
        let n = n_a + n_b;
        let delta = other.mean - self.mean;
        self.mean += delta * n_b / n;
        self.m2 += other.m2 + delta * delta * n_a * n_b / n;
        self.count += other.count;
        self.sum += other.sum;
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
        if let (Some(values), Some(more)) = (self.values.as_mut(), other.values.as_ref()) {
            values.extend_from_slice(more);
        }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Final value of `statistic`.
    ///
    /// With no samples every statistic is masked (`NaN`) except `Count`,
    /// which is 0.
    pub fn finish(&self, statistic: Statistic) -> f64 {
        if self.count == 0 {
            return match statistic {
                Statistic::Count => 0.0,
                _ => f64::NAN,
            };
        }
        match statistic {
            Statistic::Mean => self.mean,
            Statistic::StdDev => (self.m2 / self.count as f64).max(0.0).sqrt(),
            Statistic::Min => self.min,
            Statistic::Max => self.max,
            Statistic::Count => self.count as f64,
            Statistic::Sum => self.sum,
            Statistic::Median => match self.values.as_ref() {
                Some(values) => median(values),
                None => f64::NAN,
            },
        }
    }
}

fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let n = sorted.len();
    if n == 0 {
        f64::NAN
    } else if n % 2 == 0 {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    } else {
        sorted[n / 2]
    }
}

/// Reduce a collection pixel-wise into a single frame.
///
/// Every band of the first frame is reduced; outputs are named
/// `<band>_<statistic>`, e.g. `NDVI_mean`. Frames must share the grid.
///
/// # Errors
/// - `EmptyInput` for an empty collection
/// - `InvalidBand` if a frame lacks a band of the first frame
pub fn reduce_collection(collection: &Collection, reducer: &Reducer) -> Result<Frame> {
    let first = collection.first().ok_or(Error::EmptyInput {
        operation: "reduce_collection",
    })?;
    let template = first
        .template()
        .ok_or_else(|| Error::Algorithm("first frame of the collection has no bands".into()))?;
    let bands = first.band_names();
    let frames: Vec<&Frame> = collection.iter().collect();
    reduce_frames(&frames, &bands, reducer, template)
}

/// Pixel-wise reduction of `bands` across `frames` on `template`'s grid.
///
/// An empty `frames` slice yields fully masked output bands, so callers that
/// enumerate a fixed set of periods always get an entry back.
pub(crate) fn reduce_frames(
    frames: &[&Frame],
    bands: &[String],
    reducer: &Reducer,
    template: &Raster,
) -> Result<Frame> {
    let stats = reducer.statistics();
    let (rows, cols) = template.shape();
    let mut out = Frame::new();

    for band in bands {
        if frames.is_empty() {
            for stat in stats {
                out.add_band(format!("{band}_{}", stat.name()), template.like(f64::NAN))?;
            }
            continue;
        }

        let rasters: Vec<&Raster> = frames
            .iter()
            .map(|f| f.band(band))
            .collect::<Result<_>>()?;
        for raster in &rasters {
            template.check_same_grid(raster)?;
        }

        // per row: one block of `cols` cells per statistic
        let row_blocks: Vec<Vec<f64>> = (0..rows)
            .into_par_iter()
            .map(|row| {
                let mut block = vec![f64::NAN; cols * stats.len()];
                for col in 0..cols {
                    let mut acc = reducer.accumulator();
                    for raster in &rasters {
                        acc.push(unsafe { raster.get_unchecked(row, col) });
                    }
                    for (k, stat) in stats.iter().enumerate() {
                        block[k * cols + col] = acc.finish(*stat);
                    }
                }
                block
            })
            .collect();

        for (k, stat) in stats.iter().enumerate() {
            let per_row: Vec<Vec<f64>> = row_blocks
                .iter()
                .map(|block| block[k * cols..(k + 1) * cols].to_vec())
                .collect();
            let raster = template.with_data(rows_to_vec(per_row))?;
            out.add_band(format!("{band}_{}", stat.name()), raster)?;
        }
    }

    debug!(
        frames = frames.len(),
        bands = bands.len(),
        statistics = stats.len(),
        "reduced frames pixel-wise"
    );
    Ok(out)
}
