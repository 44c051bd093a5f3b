//! Zonal statistics
//!
//! Reduces a frame (or every frame of a collection) over a set of regions
//! and returns one flat record per (frame, region), tagged with the frame
//! timestamp so the records can be reassembled into a time series.

use serde::{Deserialize, Serialize};
use statgis_core::{Algorithm, BandSelection, Collection, Error, Frame, Region, Result};
use std::collections::BTreeMap;
use tracing::debug;

use crate::maybe_rayon::*;

use super::reducer::Reducer;
use super::region::{RegionParams, reduce_region};

/// Which reducer a zonal computation applies
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ReducerSelection {
    /// Mean, standard deviation, max, min and count over shared inputs
    #[default]
    All,
    /// A caller-supplied reducer
    Custom(Reducer),
}

impl ReducerSelection {
    pub fn to_reducer(&self) -> Reducer {
        match self {
            ReducerSelection::All => Reducer::all(),
            ReducerSelection::Custom(reducer) => reducer.clone(),
        }
    }
}

/// Parameters for zonal statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZonalParams {
    /// Sampling cell size in map units
    pub scale: f64,
    pub bands: BandSelection,
    pub reducer: ReducerSelection,
    /// Tiling hint for the spatial reduction
    pub tile_scale: usize,
}

impl Default for ZonalParams {
    fn default() -> Self {
        Self {
            scale: 30.0,
            bands: BandSelection::All,
            reducer: ReducerSelection::All,
            tile_scale: 1,
        }
    }
}

/// Statistics of one frame over one region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZonalRecord {
    pub region_id: String,
    /// Timestamp of the source frame, epoch milliseconds
    pub timestamp: Option<i64>,
    pub values: BTreeMap<String, f64>,
}

impl ZonalRecord {
    pub fn get(&self, key: &str) -> Option<f64> {
        self.values.get(key).copied()
    }
}

/// Zonal statistics of a single frame: one record per region
pub fn zonal_statistics_frame(
    frame: &Frame,
    regions: &[Region],
    params: &ZonalParams,
) -> Result<Vec<ZonalRecord>> {
    let selected = frame.select(&params.bands)?;
    let reducer = params.reducer.to_reducer();
    let region_params = RegionParams {
        scale: params.scale,
        tile_scale: params.tile_scale,
    };

    regions
        .iter()
        .map(|region| {
            let values = reduce_region(&selected, &reducer, &region.geometry, &region_params)?;
            Ok(ZonalRecord {
                region_id: region.id.clone(),
                timestamp: frame.timestamp_opt(),
                values,
            })
        })
        .collect()
}

/// Zonal statistics of every frame: one record per (frame, region), frame-major
pub fn zonal_statistics_collection(
    collection: &Collection,
    regions: &[Region],
    params: &ZonalParams,
) -> Result<Vec<ZonalRecord>> {
    let frames = collection.frames();
    let per_frame: Vec<Vec<ZonalRecord>> = (0..frames.len())
        .into_par_iter()
        .map(|i| zonal_statistics_frame(&frames[i], regions, params))
        .collect::<Result<Vec<_>>>()?;

    let records: Vec<ZonalRecord> = per_frame.into_iter().flatten().collect();
    debug!(
        frames = frames.len(),
        regions = regions.len(),
        records = records.len(),
        "computed zonal statistics"
    );
    Ok(records)
}

/// Zonal statistics over a collection as an [`Algorithm`]
#[derive(Debug, Clone, Default)]
pub struct ZonalStatistics;

impl Algorithm for ZonalStatistics {
    type Input = (Collection, Vec<Region>);
    type Output = Vec<ZonalRecord>;
    type Params = ZonalParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "ZonalStatistics"
    }

    fn description(&self) -> &'static str {
        "Per-frame, per-region summary statistics over a frame collection"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        let (collection, regions) = input;
        zonal_statistics_collection(&collection, &regions, &params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use geo::{Rect, coord};
    use statgis_core::{GeoTransform, Raster};

    fn constant_frame(ts: i64, value: f64) -> Frame {
        let mut raster = Raster::filled(6, 6, value);
        raster.set_transform(GeoTransform::new(0.0, 60.0, 10.0, -10.0));
        let mut other = raster.like(1.0);
        other.set(0, 0, 100.0).unwrap();
        Frame::with_timestamp(ts)
            .with_band("v", raster)
            .unwrap()
            .with_band("w", other)
            .unwrap()
    }

    fn regions() -> Vec<Region> {
        vec![
            Region::new("west", Rect::new(coord! { x: 0.0, y: 0.0 }, coord! { x: 30.0, y: 60.0 })),
            Region::new("east", Rect::new(coord! { x: 30.0, y: 0.0 }, coord! { x: 60.0, y: 60.0 })),
        ]
    }

    fn params(bands: BandSelection) -> ZonalParams {
        ZonalParams {
            scale: 10.0,
            bands,
            ..ZonalParams::default()
        }
    }

    #[test]
    fn test_constant_region_all_reducer() {
        let frame = constant_frame(1_000, 7.5);
        let records = zonal_statistics_frame(&frame, &regions(), &params(BandSelection::one("v"))).unwrap();

        assert_eq!(records.len(), 2);
        let west = &records[0];
        assert_eq!(west.region_id, "west");
        assert_eq!(west.timestamp, Some(1_000));
        assert_relative_eq!(west.get("v_mean").unwrap(), 7.5);
        assert_relative_eq!(west.get("v_min").unwrap(), 7.5);
        assert_relative_eq!(west.get("v_max").unwrap(), 7.5);
        assert_relative_eq!(west.get("v_std_dev").unwrap(), 0.0);
        assert_relative_eq!(west.get("v_count").unwrap(), 18.0);
        assert!(west.get("w_mean").is_none());
    }

    #[test]
    fn test_all_bands_by_default() {
        let frame = constant_frame(0, 2.0);
        let records = zonal_statistics_frame(&frame, &regions(), &params(BandSelection::All)).unwrap();
        assert_relative_eq!(records[0].get("w_max").unwrap(), 100.0);
        assert_relative_eq!(records[1].get("w_max").unwrap(), 1.0);
    }

    #[test]
    fn test_custom_single_reducer_uses_band_names() {
        let frame = constant_frame(0, 2.0);
        let p = ZonalParams {
            reducer: ReducerSelection::Custom(Reducer::sum()),
            ..params(BandSelection::All)
        };
        let records = zonal_statistics_frame(&frame, &regions(), &p).unwrap();
        assert_relative_eq!(records[1].get("v").unwrap(), 36.0);
        assert_relative_eq!(records[1].get("w").unwrap(), 18.0);
    }

    #[test]
    fn test_collection_records_are_frame_major() {
        let collection = Collection::from_frames(vec![constant_frame(10, 1.0), constant_frame(20, 2.0)]);
        let records = ZonalStatistics
            .execute((collection, regions()), params(BandSelection::one("v")))
            .unwrap();

        let keys: Vec<(Option<i64>, &str)> = records
            .iter()
            .map(|r| (r.timestamp, r.region_id.as_str()))
            .collect();
        assert_eq!(
            keys,
            vec![(Some(10), "west"), (Some(10), "east"), (Some(20), "west"), (Some(20), "east")]
        );
        assert_relative_eq!(records[3].get("v_mean").unwrap(), 2.0);
    }

    #[test]
    fn test_missing_band_is_an_error() {
        let frame = constant_frame(0, 1.0);
        let err = zonal_statistics_frame(&frame, &regions(), &params(BandSelection::one("x"))).unwrap_err();
        assert!(matches!(err, Error::InvalidBand { .. }));
    }
}
