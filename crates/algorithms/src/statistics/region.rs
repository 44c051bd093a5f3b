//! Spatial reduction of a frame over a region
//!
//! The frame is sampled on a grid of cell size `scale` anchored at the raster
//! origin. A sample contributes when its centre lies inside the region; it
//! reads the pixel underneath (nearest neighbour). With `scale` equal to the
//! native cell size the samples are exactly the pixel centres.

use geo::{BoundingRect, Contains, Geometry, MultiPolygon, Point};
use serde::{Deserialize, Serialize};
use statgis_core::{Error, Frame, Raster, Result};
use std::collections::BTreeMap;
use tracing::debug;

use crate::maybe_rayon::*;

use super::reducer::{Accumulator, Reducer};

/// Parameters for region reductions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionParams {
    /// Sampling cell size in map units
    pub scale: f64,
    /// Number of tiles the samples are split into and reduced independently
    pub tile_scale: usize,
}

impl Default for RegionParams {
    fn default() -> Self {
        Self {
            scale: 30.0,
            tile_scale: 1,
        }
    }
}

impl RegionParams {
    pub fn with_scale(scale: f64) -> Self {
        Self {
            scale,
            ..Self::default()
        }
    }

    fn validate(&self) -> Result<()> {
        if !(self.scale.is_finite() && self.scale > 0.0) {
            return Err(Error::InvalidParameter {
                name: "scale",
                value: self.scale.to_string(),
                reason: "must be a positive number of map units".into(),
            });
        }
        if self.tile_scale == 0 {
            return Err(Error::InvalidParameter {
                name: "tile_scale",
                value: "0".into(),
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }
}

/// Reduce every band of `frame` over `geometry`.
///
/// Keys are the band name for a single-statistic reducer and
/// `<band>_<statistic>` for combined reducers. Statistics with no unmasked
/// samples are `NaN` (count is 0).
///
/// # Errors
/// - `InvalidParameter` for a non-positive scale, zero tile scale or an
///   unsupported geometry kind
pub fn reduce_region(
    frame: &Frame,
    reducer: &Reducer,
    geometry: &Geometry<f64>,
    params: &RegionParams,
) -> Result<BTreeMap<String, f64>> {
    params.validate()?;
    let mut out = BTreeMap::new();
    let Some(template) = frame.template() else {
        return Ok(out);
    };

    let pixels = region_pixels(template, geometry, params.scale)?;
    let tiles = params.tile_scale.min(pixels.len()).max(1);
    let chunk = pixels.len().div_ceil(tiles).max(1);

    for band in frame.bands() {
        let raster = &band.raster;
        let partials: Vec<Accumulator> = (0..tiles)
            .into_par_iter()
            .map(|t| {
                let mut acc = reducer.accumulator();
                let start = (t * chunk).min(pixels.len());
                let end = ((t + 1) * chunk).min(pixels.len());
                for &(row, col) in &pixels[start..end] {
                    acc.push(unsafe { raster.get_unchecked(row, col) });
                }
                acc
            })
            .collect();

        let mut acc = reducer.accumulator();
        for partial in &partials {
            acc.merge(partial);
        }

        for stat in reducer.statistics() {
            let key = if reducer.is_combined() {
                format!("{}_{}", band.name, stat.name())
            } else {
                band.name.clone()
            };
            out.insert(key, acc.finish(*stat));
        }
    }

    debug!(
        samples = pixels.len(),
        tiles,
        bands = frame.band_count(),
        "reduced region"
    );
    Ok(out)
}

/// Pixels (row, col) sampled inside `geometry` at `scale`, in sample order.
///
/// Point geometries sample the single pixel under each point. Samples
/// falling outside the raster are dropped.
pub fn region_pixels(
    template: &Raster,
    geometry: &Geometry<f64>,
    scale: f64,
) -> Result<Vec<(usize, usize)>> {
    match geometry {
        Geometry::Point(p) => return Ok(template.pixel_at(p.x(), p.y()).into_iter().collect()),
        Geometry::MultiPoint(mp) => {
            return Ok(mp.iter().filter_map(|p| template.pixel_at(p.x(), p.y())).collect());
        }
        _ => {}
    }

    let area = as_multi_polygon(geometry)?;
    let Some(bbox) = area.bounding_rect() else {
        return Ok(Vec::new());
    };

    let (min_x, min_y, max_x, max_y) = template.bounds();
    let x0 = bbox.min().x.max(min_x);
    let x1 = bbox.max().x.min(max_x);
    let y0 = bbox.min().y.max(min_y);
    let y1 = bbox.max().y.min(max_y);
    if x0 >= x1 || y0 >= y1 {
        return Ok(Vec::new());
    }

    let gt = template.transform();
    let step_x = scale * gt.pixel_width.signum();
    let step_y = scale * gt.pixel_height.signum();
    let (i_min, i_max) = index_span(gt.origin_x, step_x, x0, x1);
    let (j_min, j_max) = index_span(gt.origin_y, step_y, y0, y1);

    let mut pixels = Vec::new();
    for j in j_min..j_max {
        let y = gt.origin_y + (j as f64 + 0.5) * step_y;
        for i in i_min..i_max {
            let x = gt.origin_x + (i as f64 + 0.5) * step_x;
            if !area.contains(&Point::new(x, y)) {
                continue;
            }
            if let Some(pixel) = template.pixel_at(x, y) {
                pixels.push(pixel);
            }
        }
    }
    Ok(pixels)
}

/// Sample indices whose cells can intersect [lo, hi] along one axis
fn index_span(origin: f64, step: f64, lo: f64, hi: f64) -> (i64, i64) {
    let a = (lo - origin) / step;
    let b = (hi - origin) / step;
    let start = a.min(b).floor().max(0.0) as i64;
    let end = a.max(b).ceil().max(0.0) as i64;
    (start, end)
}

fn as_multi_polygon(geometry: &Geometry<f64>) -> Result<MultiPolygon<f64>> {
    match geometry {
        Geometry::Polygon(p) => Ok(MultiPolygon::new(vec![p.clone()])),
        Geometry::MultiPolygon(mp) => Ok(mp.clone()),
        Geometry::Rect(r) => Ok(MultiPolygon::new(vec![r.to_polygon()])),
        Geometry::Triangle(t) => Ok(MultiPolygon::new(vec![t.to_polygon()])),
        other => Err(Error::InvalidParameter {
            name: "geometry",
            value: geometry_kind(other).into(),
            reason: "regions must be points or areal geometries".into(),
        }),
    }
}

fn geometry_kind(geometry: &Geometry<f64>) -> &'static str {
    match geometry {
        Geometry::Point(_) => "Point",
        Geometry::Line(_) => "Line",
        Geometry::LineString(_) => "LineString",
        Geometry::Polygon(_) => "Polygon",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::GeometryCollection(_) => "GeometryCollection",
        Geometry::Rect(_) => "Rect",
        Geometry::Triangle(_) => "Triangle",
    }
}
