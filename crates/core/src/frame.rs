//! Timestamped multi-band frames

use crate::calendar::{CalendarUnit, datetime_from_millis};
use crate::error::{Error, Result};
use crate::raster::Raster;
use crate::selection::BandSelection;
use crate::vector::AttributeValue;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// One named layer of a frame
#[derive(Debug, Clone, PartialEq)]
pub struct Band {
    pub name: String,
    pub raster: Raster,
}

/// A timestamped multi-band image.
///
/// All bands share the grid of the first band added; [`Frame::add_band`]
/// rejects rasters of any other shape. Band order is preserved.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    bands: Vec<Band>,
    /// Acquisition time, epoch milliseconds
    timestamp: Option<i64>,
    properties: BTreeMap<String, AttributeValue>,
}

impl Frame {
    /// Empty frame with no timestamp
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty frame acquired at `timestamp` (epoch milliseconds)
    pub fn with_timestamp(timestamp: i64) -> Self {
        Self {
            timestamp: Some(timestamp),
            ..Self::default()
        }
    }

    /// Frame with the same timestamp and properties and no bands
    pub fn empty_like(&self) -> Self {
        Self {
            bands: Vec::new(),
            timestamp: self.timestamp,
            properties: self.properties.clone(),
        }
    }

    // Time

    pub fn timestamp(&self) -> Result<i64> {
        self.timestamp.ok_or(Error::MissingTimestamp)
    }

    pub fn timestamp_opt(&self) -> Option<i64> {
        self.timestamp
    }

    pub fn set_timestamp(&mut self, timestamp: Option<i64>) {
        self.timestamp = timestamp;
    }

    pub fn datetime(&self) -> Result<DateTime<Utc>> {
        datetime_from_millis(self.timestamp()?)
    }

    /// Calendar month (1..=12) of the timestamp
    pub fn month(&self) -> Result<u32> {
        Ok(self.calendar_value(CalendarUnit::Month)? as u32)
    }

    pub fn year(&self) -> Result<i32> {
        self.calendar_value(CalendarUnit::Year)
    }

    pub fn calendar_value(&self, unit: CalendarUnit) -> Result<i32> {
        unit.of(self.timestamp()?)
    }

    // Bands

    /// Add a band, replacing any band of the same name in place
    pub fn add_band(&mut self, name: impl Into<String>, raster: Raster) -> Result<()> {
        if let Some(first) = self.bands.first() {
            first.raster.check_same_grid(&raster)?;
        }
        let name = name.into();
        match self.bands.iter_mut().find(|b| b.name == name) {
            Some(existing) => existing.raster = raster,
            None => self.bands.push(Band { name, raster }),
        }
        Ok(())
    }

    /// Builder form of [`Frame::add_band`]
    pub fn with_band(mut self, name: impl Into<String>, raster: Raster) -> Result<Self> {
        self.add_band(name, raster)?;
        Ok(self)
    }

    /// Copy every band of `other` onto this frame
    pub fn add_bands_from(&mut self, other: &Frame) -> Result<()> {
        for band in &other.bands {
            self.add_band(band.name.clone(), band.raster.clone())?;
        }
        Ok(())
    }

    pub fn band(&self, name: &str) -> Result<&Raster> {
        self.bands
            .iter()
            .find(|b| b.name == name)
            .map(|b| &b.raster)
            .ok_or_else(|| Error::invalid_band(name, self.band_names()))
    }

    pub fn has_band(&self, name: &str) -> bool {
        self.bands.iter().any(|b| b.name == name)
    }

    pub fn band_names(&self) -> Vec<String> {
        self.bands.iter().map(|b| b.name.clone()).collect()
    }

    pub fn bands(&self) -> &[Band] {
        &self.bands
    }

    pub fn band_count(&self) -> usize {
        self.bands.len()
    }

    /// First band's raster, which fixes the frame's grid
    pub fn template(&self) -> Option<&Raster> {
        self.bands.first().map(|b| &b.raster)
    }

    /// Grid shape (rows, cols), if the frame has any band
    pub fn shape(&self) -> Option<(usize, usize)> {
        self.template().map(|r| r.shape())
    }

    /// Project the frame onto a subset of its bands.
    ///
    /// Timestamp and properties are kept. `BandSelection::All` returns an
    /// identical frame.
    pub fn select(&self, selection: &BandSelection) -> Result<Frame> {
        let names = selection.resolve(&self.band_names())?;
        let mut out = self.empty_like();
        for name in names {
            let raster = self.band(&name)?.clone();
            out.add_band(name, raster)?;
        }
        Ok(out)
    }

    /// Bands whose whole name matches `pattern`
    pub fn select_pattern(&self, pattern: &str) -> Result<Frame> {
        self.select(&BandSelection::pattern(pattern))
    }

    /// Rename bands pairwise; unnamed bands are dropped, like a select
    pub fn rename(&self, from: &[&str], to: &[&str]) -> Result<Frame> {
        if from.len() != to.len() {
            return Err(Error::InvalidParameter {
                name: "to",
                value: format!("{} names", to.len()),
                reason: format!("expected {} names to match the selected bands", from.len()),
            });
        }
        let mut out = self.empty_like();
        for (old, new) in from.iter().zip(to) {
            out.add_band(*new, self.band(old)?.clone())?;
        }
        Ok(out)
    }

    /// Mask every band wherever `mask` is zero or masked
    pub fn update_mask(&mut self, mask: &Raster) -> Result<()> {
        for band in &mut self.bands {
            band.raster = band.raster.mask_where(mask)?;
        }
        Ok(())
    }

    // Properties

    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<AttributeValue>) {
        self.properties.insert(key.into(), value.into());
    }

    pub fn property(&self, key: &str) -> Option<&AttributeValue> {
        self.properties.get(key)
    }

    pub fn properties(&self) -> &BTreeMap<String, AttributeValue> {
        &self.properties
    }
}
