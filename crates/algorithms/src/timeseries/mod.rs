//! Time-series decomposition of frame collections
//!
//! - **temporal**: `time` covariate and acquisition dates
//! - **trend**: per-pixel linear fit and detrending
//! - **periodic**: monthly and yearly aggregation
//! - **anomaly**: departures from the monthly means
//! - **pipeline**: the three stages chained

mod anomaly;
mod periodic;
mod pipeline;
mod temporal;
mod trend;

pub use anomaly::{ANOMALY_BAND, STATIONAL_MEAN_BAND, calc_anomalies};
pub use periodic::{PeriodicSummary, reduce_by_month, reduce_by_year};
pub use pipeline::{Decomposition, TimeSeriesParams, TimeSeriesProcessing, time_series_processing};
pub use temporal::{TIME_BAND, add_time_band, add_time_bands, extract_dates};
pub use trend::{PREDICTED_BAND, STATIONAL_BAND, TrendModel, linear_fit, trend};
