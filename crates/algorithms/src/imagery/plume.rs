//! River plume extraction
//!
//! A plume is characterised from a user-drawn sample polygon: the blue,
//! green and red reflectance ranges observed inside the polygon (over water
//! only) are applied to the whole scene, and only large connected patches of
//! in-range pixels are kept.

use geo::Geometry;
use serde::{Deserialize, Serialize};
use statgis_core::{BandSelection, Error, Frame, Result};
use tracing::debug;

use super::connectivity::connected_pixel_count;
use super::expression::frame_expression;
use super::indices::ndwi;
use crate::statistics::{Reducer, RegionParams, reduce_region};

/// Parameters for [`plume_characterization`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlumeParams {
    pub blue: String,
    pub green: String,
    pub red: String,
    pub nir: String,
    /// Scale of the sample region reduction, map units
    pub scale: f64,
    /// Cap of the connected pixel count
    pub max_size: usize,
    /// Patches of this many pixels or fewer are discarded
    pub min_patch: usize,
}

impl Default for PlumeParams {
    fn default() -> Self {
        Self {
            blue: "SR_B2".into(),
            green: "SR_B3".into(),
            red: "SR_B4".into(),
            nir: "SR_B5".into(),
            scale: 30.0,
            max_size: 100,
            min_patch: 50,
        }
    }
}

/// Extract the river plume from a frame.
///
/// Adds `NDWI`, `plume_blue`, `plume_green`, `plume_red` and `plume` to the
/// frame and masks every band outside the plume.
///
/// # Errors
/// - `InvalidBand` if a colour band is missing
/// - `EmptyInput` if the sample region holds no unmasked water pixel
pub fn plume_characterization(
    frame: &Frame,
    sample_region: &Geometry<f64>,
    params: &PlumeParams,
) -> Result<Frame> {
    let mut image = frame.clone();

    let water_index = ndwi(frame.band(&params.green)?, frame.band(&params.nir)?)?;
    let water = water_index.map(|v| if v > 0.0 { 1.0 } else { 0.0 });
    image.add_band("NDWI", water_index)?;
    image.update_mask(&water)?;

    let colours = [
        ("plume_blue", params.blue.as_str()),
        ("plume_green", params.green.as_str()),
        ("plume_red", params.red.as_str()),
    ];
    let sample = image.select(&BandSelection::names(colours.iter().map(|(_, b)| *b)))?;
    let limits = reduce_region(
        &sample,
        &Reducer::min().combine(Reducer::max()),
        sample_region,
        &RegionParams::with_scale(params.scale),
    )?;

    for (output, band) in colours {
        let (min, max) = match (limits.get(&format!("{band}_min")), limits.get(&format!("{band}_max"))) {
            (Some(min), Some(max)) if !min.is_nan() && !max.is_nan() => (*min, *max),
            _ => {
                return Err(Error::EmptyInput {
                    operation: "plume_characterization",
                });
            }
        };
        debug!(band, min, max, "plume range");
        let in_range = frame_expression(
            &image,
            &format!("({band} > MINI && {band} < MAXI) ? 1 : 0"),
            &[("MINI", min), ("MAXI", max)],
        )?;
        image.add_band(output, in_range)?;
    }

    let plume = frame_expression(&image, "(plume_blue + plume_green + plume_red) / 3", &[])?;
    let plume_mask = plume.map(|v| if v > 0.0 { 1.0 } else { 0.0 });
    image.add_band("plume", plume)?;

    let min_patch = params.min_patch as f64;
    let patch_mask = connected_pixel_count(&plume_mask, params.max_size, false)?
        .map(|n| if n > min_patch { 1.0 } else { 0.0 });

    image.update_mask(&plume_mask)?;
    image.update_mask(&patch_mask)?;
    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{Rect, coord};
    use statgis_core::{GeoTransform, Raster};

    const N: usize = 20;

    /// 20 x 20 scene, 30 m cells. Water covers rows 0..12, cols 0..12 and a
    /// small 3 x 3 pond at rows 15..18, cols 15..18; the rest is land.
    /// Columns 0 and 11 of the main water body carry the extreme colours.
    fn scene() -> Frame {
        let mut blue = Raster::new(N, N);
        blue.set_transform(GeoTransform::new(0.0, 600.0, 30.0, -30.0));
        let mut green = blue.like(0.1);
        let mut red = blue.like(0.1);
        let mut nir = blue.like(0.4);

        let water = |r: usize, c: usize| (r < 12 && c < 12) || ((15..18).contains(&r) && (15..18).contains(&c));
        for r in 0..N {
            for c in 0..N {
                let (b, g, rd) = if !water(r, c) {
                    (0.1, 0.1, 0.1)
                } else if c == 0 && r < 12 {
                    (0.05, 0.29, 0.03)
                } else if c == 11 && r < 12 {
                    (0.07, 0.31, 0.05)
                } else {
                    (0.06, 0.30, 0.04)
                };
                blue.set(r, c, b).unwrap();
                green.set(r, c, g).unwrap();
                red.set(r, c, rd).unwrap();
                if water(r, c) {
                    nir.set(r, c, 0.1).unwrap();
                }
            }
        }

        Frame::with_timestamp(0)
            .with_band("SR_B2", blue)
            .unwrap()
            .with_band("SR_B3", green)
            .unwrap()
            .with_band("SR_B4", red)
            .unwrap()
            .with_band("SR_B5", nir)
            .unwrap()
    }

    /// Top row of the main water body
    fn sample_region() -> Geometry<f64> {
        Rect::new(coord! { x: 0.0, y: 570.0 }, coord! { x: 360.0, y: 600.0 }).into()
    }

    #[test]
    fn test_plume_keeps_large_in_range_patch() {
        let out = plume_characterization(&scene(), &sample_region(), &PlumeParams::default()).unwrap();
        let plume = out.band("plume").unwrap();

        assert_eq!(plume.valid_count(), 12 * 10);
        assert_eq!(plume.get(5, 5).unwrap(), 1.0);
        // extreme columns are out of range, land is not water, the pond is too small
        assert!(plume.get(5, 0).unwrap().is_nan());
        assert!(plume.get(5, 11).unwrap().is_nan());
        assert!(plume.get(19, 0).unwrap().is_nan());
        assert!(plume.get(16, 16).unwrap().is_nan());
        // every band shares the plume mask
        assert_eq!(out.band("SR_B2").unwrap().valid_count(), 120);
        assert!(out.has_band("NDWI"));
    }

    #[test]
    fn test_small_patch_survives_lower_threshold() {
        let params = PlumeParams {
            min_patch: 5,
            ..PlumeParams::default()
        };
        let out = plume_characterization(&scene(), &sample_region(), &params).unwrap();
        assert_eq!(out.band("plume").unwrap().get(16, 16).unwrap(), 1.0);
    }

    #[test]
    fn test_sample_region_on_land() {
        let land: Geometry<f64> = Rect::new(coord! { x: 450.0, y: 0.0 }, coord! { x: 600.0, y: 60.0 }).into();
        let err = plume_characterization(&scene(), &land, &PlumeParams::default()).unwrap_err();
        assert!(matches!(err, Error::EmptyInput { .. }));
    }
}
