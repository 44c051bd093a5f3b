//! Time covariate and acquisition dates

use chrono::{DateTime, Utc};
use statgis_core::calendar::years_since_epoch;
use statgis_core::{Collection, Error, Frame, Result};

use crate::frames::map_frames;

/// Name of the time covariate band
pub const TIME_BAND: &str = "time";

/// Append band `time`: fractional years (of 365 days) since the epoch.
///
/// The band is constant over the frame's grid.
///
/// # Errors
/// - `MissingTimestamp` if the frame has no timestamp
/// - `Algorithm` if the frame has no band to take the grid from
pub fn add_time_band(frame: &Frame) -> Result<Frame> {
    let time = years_since_epoch(frame.timestamp()?);
    let template = frame
        .template()
        .ok_or_else(|| Error::Algorithm("cannot add a time band to a frame without bands".into()))?;
    let mut out = frame.clone();
    out.add_band(TIME_BAND, template.like(time))?;
    Ok(out)
}

/// [`add_time_band`] over every frame
pub fn add_time_bands(collection: &Collection) -> Result<Collection> {
    map_frames(collection, add_time_band)
}

/// Acquisition dates of every frame, in collection order
pub fn extract_dates(collection: &Collection) -> Result<Vec<DateTime<Utc>>> {
    collection.dates()
}
