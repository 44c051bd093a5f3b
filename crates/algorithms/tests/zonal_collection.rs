//! Zonal statistics over a small Landsat-like collection.

use approx::assert_relative_eq;
use geo::{Point, Polygon, Rect, coord, polygon};
use statgis_algorithms::imagery::{LandsatMaskMode, landsat_cloud_mask, landsat_scaler};
use statgis_algorithms::statistics::{
    Reducer, ReducerSelection, ZonalParams, ZonalRecord, zonal_statistics_collection,
    zonal_statistics_frame,
};
use statgis_core::{BandSelection, Collection, Frame, GeoTransform, Raster, Region};

const SIZE: usize = 8;
const CELL: f64 = 30.0;

/// 8 x 8 grid of 30 m cells with origin (0, 240)
fn raster(f: impl Fn(usize, usize) -> f64) -> Raster {
    let mut r = Raster::new(SIZE, SIZE);
    r.set_transform(GeoTransform::new(0.0, SIZE as f64 * CELL, CELL, -CELL));
    for row in 0..SIZE {
        for col in 0..SIZE {
            r.set(row, col, f(row, col)).unwrap();
        }
    }
    r
}

/// Raw digital numbers; row 0 is flagged as cloud in QA_PIXEL
fn scene(ts: i64, dn: f64) -> Frame {
    Frame::with_timestamp(ts)
        .with_band("SR_B4", raster(|_, _| dn))
        .unwrap()
        .with_band("SR_B5", raster(|row, col| dn + (row * SIZE + col) as f64))
        .unwrap()
        .with_band("QA_PIXEL", raster(|row, _| if row == 0 { 8.0 } else { 0.0 }))
        .unwrap()
}

fn collection() -> Collection {
    Collection::from_frames(vec![scene(1_000, 10_000.0), scene(2_000, 20_000.0)])
}

fn regions() -> Vec<Region> {
    let west: Polygon<f64> = polygon![
        (x: 0.0, y: 0.0),
        (x: 120.0, y: 0.0),
        (x: 120.0, y: 240.0),
        (x: 0.0, y: 240.0),
    ];
    let mut west = Region::new("west", west);
    west.set_property("kind", "polygon");
    vec![
        west,
        Region::new("east", Rect::new(coord! { x: 120.0, y: 0.0 }, coord! { x: 240.0, y: 240.0 })),
        Region::new("well", Point::new(15.0, 15.0)),
    ]
}

#[test]
fn records_per_frame_and_region() {
    let params = ZonalParams {
        bands: BandSelection::one("SR_B4"),
        ..ZonalParams::default()
    };
    let records = zonal_statistics_collection(&collection(), &regions(), &params).unwrap();
    assert_eq!(records.len(), 2 * 3);

    let west = &records[0];
    assert_eq!(west.region_id, "west");
    assert_eq!(west.timestamp, Some(1_000));
    // constant band: mean = min = max, no spread, count = pixels in region
    assert_relative_eq!(west.get("SR_B4_mean").unwrap(), 10_000.0);
    assert_relative_eq!(west.get("SR_B4_min").unwrap(), 10_000.0);
    assert_relative_eq!(west.get("SR_B4_max").unwrap(), 10_000.0);
    assert_relative_eq!(west.get("SR_B4_std_dev").unwrap(), 0.0);
    assert_relative_eq!(west.get("SR_B4_count").unwrap(), 32.0);

    let well = &records[5];
    assert_eq!(well.region_id, "well");
    assert_eq!(well.timestamp, Some(2_000));
    assert_relative_eq!(well.get("SR_B4_count").unwrap(), 1.0);
}

#[test]
fn preprocessing_then_zonal() {
    let prepared = collection()
        .map(|f| landsat_cloud_mask(&landsat_scaler(f)?, LandsatMaskMode::CloudOnly))
        .unwrap();

    let params = ZonalParams {
        bands: BandSelection::pattern("SR_B."),
        reducer: ReducerSelection::Custom(Reducer::count().combine(Reducer::mean())),
        ..ZonalParams::default()
    };
    let records = zonal_statistics_frame(&prepared.frames()[0], &regions(), &params).unwrap();

    // cloudy top row is masked: 7 rows x 4 columns remain per half
    let east = &records[1];
    assert_relative_eq!(east.get("SR_B4_count").unwrap(), 28.0);
    assert_relative_eq!(east.get("SR_B4_mean").unwrap(), 10_000.0 * 0.0000275 - 0.2, epsilon = 1e-12);
    assert!(east.get("QA_PIXEL_mean").is_none());
}

#[test]
fn tiling_matches_single_tile() {
    let collection = collection();
    let frame = &collection.frames()[0];
    let single = zonal_statistics_frame(frame, &regions(), &ZonalParams::default()).unwrap();
    let tiled = zonal_statistics_frame(
        frame,
        &regions(),
        &ZonalParams {
            tile_scale: 4,
            ..ZonalParams::default()
        },
    )
    .unwrap();
    for (a, b) in single.iter().zip(&tiled) {
        for (key, value) in &a.values {
            assert_relative_eq!(*value, b.values[key], epsilon = 1e-9);
        }
    }
}

#[test]
fn median_reducer_on_gradient() {
    let params = ZonalParams {
        bands: BandSelection::one("SR_B5"),
        reducer: ReducerSelection::Custom(Reducer::median()),
        ..ZonalParams::default()
    };
    let records = zonal_statistics_frame(&collection().frames()[0], &regions(), &params).unwrap();
    // west half holds columns 0..4 of every row: offsets 0..=59, median of 32 values
    let west = records[0].get("SR_B5").unwrap();
    assert_relative_eq!(west, 10_000.0 + 29.5);
}

#[test]
fn records_serialize_to_json() {
    let params = ZonalParams {
        bands: BandSelection::one("SR_B4"),
        reducer: ReducerSelection::Custom(Reducer::max()),
        ..ZonalParams::default()
    };
    let records = zonal_statistics_collection(&collection(), &regions(), &params).unwrap();
    let json = serde_json::to_string(&records).unwrap();
    let back: Vec<ZonalRecord> = serde_json::from_str(&json).unwrap();
    assert_eq!(back, records);

    let params_json = serde_json::to_string(&params).unwrap();
    let params_back: ZonalParams = serde_json::from_str(&params_json).unwrap();
    assert_eq!(params_back, params);
}
