//! Anomalies against monthly means

use std::collections::HashMap;

use statgis_core::{CalendarUnit, Collection, Error, Frame, Result};
use tracing::debug;

use super::periodic::PeriodicSummary;
use super::trend::STATIONAL_BAND;
use crate::frames::map_frames;
use crate::imagery::{Binding, expression};

/// Band holding `stational - stational_mean`
pub const ANOMALY_BAND: &str = "anomaly";
/// Monthly mean of the stational band, as produced by a mean reduction
pub const STATIONAL_MEAN_BAND: &str = "stational_mean";

/// Attach each frame's monthly summary and compute `anomaly`.
///
/// Every frame gains the bands of the summary entry for its calendar month
/// and `anomaly = stational - stational_mean`. The output is sorted by
/// timestamp.
///
/// # Errors
/// - `InvalidParameter` if `monthly` is not keyed by month
/// - `MissingPeriod` if a month with frames has no summary entry
pub fn calc_anomalies(collection: &Collection, monthly: &PeriodicSummary) -> Result<Collection> {
    if monthly.unit() != CalendarUnit::Month {
        return Err(Error::InvalidParameter {
            name: "monthly",
            value: monthly.unit().name().into(),
            reason: "anomalies need a summary keyed by month".into(),
        });
    }

    let mut joined = Collection::new();
    for month in 1..=12 {
        let frames = collection.filter_calendar(CalendarUnit::Month, month, month)?;
        if frames.is_empty() {
            continue;
        }
        let summary = monthly.get(month)?;
        debug!(month, frames = frames.len(), "attaching monthly summary");
        let attached = frames.map(|frame| {
            let mut frame = frame.clone();
            frame.add_bands_from(summary)?;
            Ok(frame)
        })?;
        joined = joined.merge(attached);
    }
    joined.sort_by_timestamp();

    map_frames(&joined, add_anomaly)
}

fn add_anomaly(frame: &Frame) -> Result<Frame> {
    let bindings = HashMap::from([
        ("stat", Binding::Band(frame.band(STATIONAL_BAND)?)),
        ("mean", Binding::Band(frame.band(STATIONAL_MEAN_BAND)?)),
    ]);
    let anomaly = expression("stat - mean", &bindings)?;
    let mut out = frame.clone();
    out.add_band(ANOMALY_BAND, anomaly)?;
    Ok(out)
}
