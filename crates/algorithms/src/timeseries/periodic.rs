//! Calendar-period aggregation
//!
//! Frames are bucketed by the month or year of their timestamp and each
//! bucket is reduced pixel-wise. The set of periods is fixed up front
//! (months 1..=12, or an inclusive year range), so a period with no frames
//! still appears, fully masked.

use std::collections::BTreeMap;

use statgis_core::{AttributeValue, BandSelection, CalendarUnit, Collection, Error, Frame, Result};
use tracing::{debug, warn};

use crate::statistics::Reducer;
use crate::statistics::reducer::reduce_frames;

/// One aggregated frame per calendar period
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodicSummary {
    unit: CalendarUnit,
    entries: BTreeMap<i32, Frame>,
}

impl PeriodicSummary {
    /// Build a summary from precomputed entries
    pub fn from_entries(unit: CalendarUnit, entries: BTreeMap<i32, Frame>) -> Self {
        Self { unit, entries }
    }

    pub fn unit(&self) -> CalendarUnit {
        self.unit
    }

    /// Aggregated frame of period `key`
    ///
    /// # Errors
    /// - `MissingPeriod` if the summary has no entry for `key`
    pub fn get(&self, key: i32) -> Result<&Frame> {
        self.entries.get(&key).ok_or(Error::MissingPeriod {
            unit: self.unit.name(),
            value: key,
        })
    }

    pub fn contains(&self, key: i32) -> bool {
        self.entries.contains_key(&key)
    }

    #[cfg(test)]
    pub(crate) fn remove(&mut self, key: i32) -> Option<Frame> {
        self.entries.remove(&key)
    }

    pub fn keys(&self) -> impl Iterator<Item = i32> + '_ {
        self.entries.keys().copied()
    }

    pub fn entries(&self) -> &BTreeMap<i32, Frame> {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries as a collection, in period order
    pub fn into_collection(self) -> Collection {
        self.entries.into_values().collect()
    }
}

/// Reduce `bands` over each calendar month 1..=12.
///
/// Output bands are named `<band>_<statistic>`; each entry carries a
/// `month` property.
pub fn reduce_by_month(collection: &Collection, reducer: &Reducer, bands: &BandSelection) -> Result<PeriodicSummary> {
    reduce_by_period(collection, reducer, bands, CalendarUnit::Month, 1, 12)
}

/// Reduce `bands` over each calendar year in `start..=end`.
///
/// Output bands are named `<band>_<statistic>`; each entry carries a
/// `year` property.
///
/// # Errors
/// - `InvalidParameter` if `start > end`
pub fn reduce_by_year(
    collection: &Collection,
    reducer: &Reducer,
    bands: &BandSelection,
    start: i32,
    end: i32,
) -> Result<PeriodicSummary> {
    if start > end {
        return Err(Error::InvalidParameter {
            name: "start",
            value: start.to_string(),
            reason: format!("first year is after the last year {end}"),
        });
    }
    reduce_by_period(collection, reducer, bands, CalendarUnit::Year, start, end)
}

fn reduce_by_period(
    collection: &Collection,
    reducer: &Reducer,
    bands: &BandSelection,
    unit: CalendarUnit,
    start: i32,
    end: i32,
) -> Result<PeriodicSummary> {
    let first = collection.first().ok_or(Error::EmptyInput {
        operation: "periodic reduction",
    })?;
    let template = collection
        .template()
        .ok_or_else(|| Error::Algorithm("collection frames have no bands".into()))?;
    let names = bands.resolve(&first.band_names())?;

    let mut keyed: Vec<(i32, &Frame)> = Vec::with_capacity(collection.len());
    for frame in collection {
        keyed.push((frame.calendar_value(unit)?, frame));
    }

    let mut entries = BTreeMap::new();
    for key in start..=end {
        let frames: Vec<&Frame> = keyed
            .iter()
            .filter(|(k, _)| *k == key)
            .map(|(_, frame)| *frame)
            .collect();
        if frames.is_empty() {
            warn!(unit = unit.name(), key, "no frames in period, output is masked");
        } else {
            debug!(unit = unit.name(), key, frames = frames.len(), "reducing period");
        }

        let mut reduced = reduce_frames(&frames, &names, reducer, template)?;
        reduced.set_property(unit.name(), AttributeValue::Int(i64::from(key)));
        entries.insert(key, reduced);
    }

    Ok(PeriodicSummary { unit, entries })
}
