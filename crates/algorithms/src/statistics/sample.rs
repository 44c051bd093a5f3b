//! Pixel sampling inside a region

use geo::Geometry;
use statgis_core::{Collection, Error, Frame, Result};

use crate::maybe_rayon::*;

use super::region::region_pixels;

/// All unmasked values of `band` sampled inside `geometry` at `scale`.
///
/// Values come back in sample order (rows of the sampling grid, top to
/// bottom). An empty vector means the region held no unmasked pixels.
pub fn sample_frame(frame: &Frame, band: &str, geometry: &Geometry<f64>, scale: f64) -> Result<Vec<f64>> {
    if !(scale.is_finite() && scale > 0.0) {
        return Err(Error::InvalidParameter {
            name: "scale",
            value: scale.to_string(),
            reason: "must be a positive number of map units".into(),
        });
    }
    let raster = frame.band(band)?;
    let values = region_pixels(raster, geometry, scale)?
        .into_iter()
        .map(|(row, col)| unsafe { raster.get_unchecked(row, col) })
        .filter(|v| !v.is_nan())
        .collect();
    Ok(values)
}

/// [`sample_frame`] for every frame of a collection, in collection order
pub fn sample_collection(
    collection: &Collection,
    band: &str,
    geometry: &Geometry<f64>,
    scale: f64,
) -> Result<Vec<Vec<f64>>> {
    let frames = collection.frames();
    (0..frames.len())
        .into_par_iter()
        .map(|i| sample_frame(&frames[i], band, geometry, scale))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{Rect, coord};
    use statgis_core::{GeoTransform, Raster};

    fn frame(offset: f64) -> Frame {
        let mut raster = Raster::new(4, 4);
        raster.set_transform(GeoTransform::new(0.0, 4.0, 1.0, -1.0));
        for row in 0..4 {
            for col in 0..4 {
                raster.set(row, col, offset + (row * 4 + col) as f64).unwrap();
            }
        }
        raster.set(0, 1, f64::NAN).unwrap();
        Frame::with_timestamp(0).with_band("b", raster).unwrap()
    }

    #[test]
    fn test_sample_skips_masked() {
        let region: Geometry<f64> = Rect::new(coord! { x: 0.0, y: 2.0 }, coord! { x: 2.0, y: 4.0 }).into();
        let values = sample_frame(&frame(0.0), "b", &region, 1.0).unwrap();
        assert_eq!(values, vec![0.0, 4.0, 5.0]);
    }

    #[test]
    fn test_sample_collection() {
        let region: Geometry<f64> = Rect::new(coord! { x: 0.0, y: 0.0 }, coord! { x: 4.0, y: 4.0 }).into();
        let col = Collection::from_frames(vec![frame(0.0), frame(100.0)]);
        let samples = sample_collection(&col, "b", &region, 1.0).unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].len(), 15);
        assert_eq!(samples[1][0], 100.0);
    }

    #[test]
    fn test_sample_missing_band() {
        let region: Geometry<f64> = Rect::new(coord! { x: 0.0, y: 0.0 }, coord! { x: 4.0, y: 4.0 }).into();
        assert!(sample_frame(&frame(0.0), "nope", &region, 1.0).is_err());
    }
}
