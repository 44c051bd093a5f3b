//! Ordered collections of frames

use crate::calendar::{CalendarUnit, datetime_from_millis};
use crate::error::Result;
use crate::frame::Frame;
use crate::raster::Raster;
use crate::selection::BandSelection;
use chrono::{DateTime, Utc};

/// An ordered sequence of frames.
///
/// Storage order is whatever the caller built; operations that care about
/// time order call [`Collection::sort_by_timestamp`] explicitly.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Collection {
    frames: Vec<Frame>,
}

impl Collection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_frames(frames: Vec<Frame>) -> Self {
        Self { frames }
    }

    pub fn push(&mut self, frame: Frame) {
        self.frames.push(frame);
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn iter(&self) -> impl Iterator<Item = &Frame> {
        self.frames.iter()
    }

    pub fn first(&self) -> Option<&Frame> {
        self.frames.first()
    }

    pub fn into_frames(self) -> Vec<Frame> {
        self.frames
    }

    /// Grid of the first band of the first frame
    pub fn template(&self) -> Option<&Raster> {
        self.frames.iter().find_map(|f| f.template())
    }

    /// Apply a fallible per-frame transformation, stopping at the first error
    pub fn map<F>(&self, f: F) -> Result<Collection>
    where
        F: FnMut(&Frame) -> Result<Frame>,
    {
        let frames = self.frames.iter().map(f).collect::<Result<Vec<_>>>()?;
        Ok(Collection { frames })
    }

    /// Frames for which `predicate` holds, in order
    pub fn filter<P>(&self, mut predicate: P) -> Collection
    where
        P: FnMut(&Frame) -> bool,
    {
        Collection {
            frames: self.frames.iter().filter(|f| predicate(f)).cloned().collect(),
        }
    }

    /// Frames whose calendar `unit` lies in `start..=end`.
    ///
    /// Every frame must carry a timestamp.
    pub fn filter_calendar(&self, unit: CalendarUnit, start: i32, end: i32) -> Result<Collection> {
        let mut frames = Vec::new();
        for frame in &self.frames {
            let value = frame.calendar_value(unit)?;
            if (start..=end).contains(&value) {
                frames.push(frame.clone());
            }
        }
        Ok(Collection { frames })
    }

    /// Append the frames of `other`
    pub fn merge(mut self, other: Collection) -> Collection {
        self.frames.extend(other.frames);
        self
    }

    /// Stable sort by timestamp; frames without one go last
    pub fn sort_by_timestamp(&mut self) {
        self.frames
            .sort_by_key(|f| (f.timestamp_opt().is_none(), f.timestamp_opt()));
    }

    /// Project every frame onto the same band selection
    pub fn select(&self, selection: &BandSelection) -> Result<Collection> {
        if *selection == BandSelection::All {
            return Ok(self.clone());
        }
        self.map(|f| f.select(selection))
    }

    /// Timestamps of all frames, in collection order
    pub fn timestamps(&self) -> Result<Vec<i64>> {
        self.frames.iter().map(|f| f.timestamp()).collect()
    }

    /// Acquisition dates of all frames, in collection order
    pub fn dates(&self) -> Result<Vec<DateTime<Utc>>> {
        self.frames
            .iter()
            .map(|f| datetime_from_millis(f.timestamp()?))
            .collect()
    }
}

impl FromIterator<Frame> for Collection {
    fn from_iter<I: IntoIterator<Item = Frame>>(iter: I) -> Self {
        Collection {
            frames: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Collection {
    type Item = Frame;
    type IntoIter = std::vec::IntoIter<Frame>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames.into_iter()
    }
}

impl<'a> IntoIterator for &'a Collection {
    type Item = &'a Frame;
    type IntoIter = std::slice::Iter<'a, Frame>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames.iter()
    }
}
