//! Trend, seasonal and anomaly decomposition in one call

use serde::{Deserialize, Serialize};
use statgis_core::{Algorithm, BandSelection, Collection, Error, Result};
use tracing::info;

use super::anomaly::calc_anomalies;
use super::periodic::{PeriodicSummary, reduce_by_month};
use super::trend::{STATIONAL_BAND, trend};
use crate::statistics::Reducer;

/// Output of [`time_series_processing`]
#[derive(Debug, Clone, PartialEq)]
pub struct Decomposition {
    /// Frames with `time`, the band, `predicted`, `stational`,
    /// `stational_mean` and `anomaly`, sorted by timestamp
    pub series: Collection,
    /// Monthly mean of `stational`, months 1..=12
    pub monthly_mean: PeriodicSummary,
}

/// Detrend `band`, take monthly means of the stational series and compute
/// anomalies against them.
pub fn time_series_processing(collection: &Collection, band: &str) -> Result<Decomposition> {
    let trended = trend(collection, band)?;
    let monthly_mean = reduce_by_month(&trended, &Reducer::mean(), &BandSelection::one(STATIONAL_BAND))?;
    let series = calc_anomalies(&trended, &monthly_mean)?;

    info!(
        band,
        frames = series.len(),
        months = monthly_mean.len(),
        "decomposed time series"
    );
    Ok(Decomposition { series, monthly_mean })
}

/// Parameters for [`TimeSeriesProcessing`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSeriesParams {
    /// Band to decompose
    pub band: String,
}

impl Default for TimeSeriesParams {
    fn default() -> Self {
        Self { band: "NDVI".into() }
    }
}

/// Time-series decomposition as an [`Algorithm`]
#[derive(Debug, Clone, Default)]
pub struct TimeSeriesProcessing;

impl Algorithm for TimeSeriesProcessing {
    type Input = Collection;
    type Output = Decomposition;
    type Params = TimeSeriesParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "TimeSeriesProcessing"
    }

    fn description(&self) -> &'static str {
        "Linear trend, monthly stational means and anomalies of one band"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        time_series_processing(&input, &params.band)
    }
}
