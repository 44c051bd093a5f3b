//! Single-band raster grid

use crate::error::{Error, Result};
use crate::raster::GeoTransform;
use ndarray::{Array2, ArrayView2, Zip};

/// A georeferenced 2D grid of `f64` cells.
///
/// Masked ("no data") cells are stored as `NaN` and propagate through every
/// element-wise operation in the toolkit.
///
/// # Example
///
/// ```ignore
/// use statgis_core::Raster;
///
/// let mut raster = Raster::new(100, 100);
/// raster.set(10, 20, 42.0)?;
/// assert_eq!(raster.get(10, 20)?, 42.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    /// Cell values in row-major order (row, col)
    data: Array2<f64>,
    transform: GeoTransform,
}

impl Raster {
    /// Create a new raster filled with zeros
    pub fn new(rows: usize, cols: usize) -> Self {
        Self::from_array(Array2::zeros((rows, cols)))
    }

    /// Create a new raster filled with a specific value
    pub fn filled(rows: usize, cols: usize, value: f64) -> Self {
        Self::from_array(Array2::from_elem((rows, cols), value))
    }

    /// Create a raster from row-major data
    pub fn from_vec(data: Vec<f64>, rows: usize, cols: usize) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(Error::InvalidDimensions {
                width: cols,
                height: rows,
            });
        }
        let array = Array2::from_shape_vec((rows, cols), data)
            .map_err(|e| Error::Other(e.to_string()))?;
        Ok(Self::from_array(array))
    }

    /// Create a raster from an ndarray
    pub fn from_array(data: Array2<f64>) -> Self {
        Self {
            data,
            transform: GeoTransform::default(),
        }
    }

    /// Same grid and georeferencing, every cell set to `fill_value`
    pub fn like(&self, fill_value: f64) -> Self {
        Self {
            data: Array2::from_elem(self.data.dim(), fill_value),
            transform: self.transform,
        }
    }

    /// Same georeferencing as `self`, new cell values.
    ///
    /// `data` must be row-major with `self`'s shape.
    pub fn with_data(&self, data: Vec<f64>) -> Result<Self> {
        let (rows, cols) = self.shape();
        let mut out = Self::from_vec(data, rows, cols)?;
        out.transform = self.transform;
        Ok(out)
    }

    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    pub fn cols(&self) -> usize {
        self.data.ncols()
    }

    /// Dimensions as (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }

    /// Total number of cells
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get value at (row, col)
    pub fn get(&self, row: usize, col: usize) -> Result<f64> {
        self.data
            .get((row, col))
            .copied()
            .ok_or(Error::IndexOutOfBounds {
                row,
                col,
                rows: self.rows(),
                cols: self.cols(),
            })
    }

    /// Get value at (row, col) without bounds checking
    ///
    /// # Safety
    /// Caller must ensure row < self.rows() and col < self.cols()
    pub unsafe fn get_unchecked(&self, row: usize, col: usize) -> f64 {
        unsafe { *self.data.uget((row, col)) }
    }

    /// Set value at (row, col)
    pub fn set(&mut self, row: usize, col: usize, value: f64) -> Result<()> {
        match self.data.get_mut((row, col)) {
            Some(cell) => {
                *cell = value;
                Ok(())
            }
            None => Err(Error::IndexOutOfBounds {
                row,
                col,
                rows: self.rows(),
                cols: self.cols(),
            }),
        }
    }

    pub fn view(&self) -> ArrayView2<'_, f64> {
        self.data.view()
    }

    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut Array2<f64> {
        &mut self.data
    }

    pub fn into_array(self) -> Array2<f64> {
        self.data
    }

    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    pub fn set_transform(&mut self, transform: GeoTransform) {
        self.transform = transform;
    }

    /// Cell size (assumes square cells)
    pub fn cell_size(&self) -> f64 {
        self.transform.cell_size()
    }

    /// Geographic bounds (min_x, min_y, max_x, max_y)
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        self.transform.bounds(self.cols(), self.rows())
    }

    /// Map coordinates of the centre of pixel (col, row)
    pub fn pixel_to_geo(&self, col: usize, row: usize) -> (f64, f64) {
        self.transform.pixel_to_geo(col, row)
    }

    /// Pixel (row, col) under a map point, if inside the grid
    pub fn pixel_at(&self, x: f64, y: f64) -> Option<(usize, usize)> {
        self.transform.pixel_at(x, y, self.rows(), self.cols())
    }

    /// Whether the cell at (row, col) is masked
    pub fn is_masked_at(&self, row: usize, col: usize) -> Result<bool> {
        Ok(self.get(row, col)?.is_nan())
    }

    /// Whether two rasters share the same shape
    pub fn same_grid(&self, other: &Raster) -> bool {
        self.shape() == other.shape()
    }

    /// Fail with `SizeMismatch` unless `other` has the same shape
    pub fn check_same_grid(&self, other: &Raster) -> Result<()> {
        if self.same_grid(other) {
            Ok(())
        } else {
            Err(Error::SizeMismatch {
                er: self.rows(),
                ec: self.cols(),
                ar: other.rows(),
                ac: other.cols(),
            })
        }
    }

    /// Apply `f` to every unmasked cell; masked cells stay masked
    pub fn map<F>(&self, f: F) -> Raster
    where
        F: Fn(f64) -> f64,
    {
        Raster {
            data: self.data.mapv(|v| if v.is_nan() { v } else { f(v) }),
            transform: self.transform,
        }
    }

    /// Combine two same-shaped rasters cell by cell.
    ///
    /// A cell masked in either input is masked in the output.
    pub fn zip_map<F>(&self, other: &Raster, f: F) -> Result<Raster>
    where
        F: Fn(f64, f64) -> f64,
    {
        self.check_same_grid(other)?;
        let data = Zip::from(&self.data)
            .and(&other.data)
            .map_collect(|&a, &b| if a.is_nan() || b.is_nan() { f64::NAN } else { f(a, b) });
        Ok(Raster {
            data,
            transform: self.transform,
        })
    }

    /// Copy of `self` masked wherever `mask` is zero or masked
    pub fn mask_where(&self, mask: &Raster) -> Result<Raster> {
        self.check_same_grid(mask)?;
        let data = Zip::from(&self.data)
            .and(&mask.data)
            .map_collect(|&v, &m| if m.is_nan() || m == 0.0 { f64::NAN } else { v });
        Ok(Raster {
            data,
            transform: self.transform,
        })
    }

    /// Number of unmasked cells
    pub fn valid_count(&self) -> usize {
        self.data.iter().filter(|v| !v.is_nan()).count()
    }

    /// Basic statistics over unmasked cells
    pub fn statistics(&self) -> RasterStatistics {
        let mut min: Option<f64> = None;
        let mut max: Option<f64> = None;
        let mut sum = 0.0;
        let mut count = 0usize;

        for &value in self.data.iter().filter(|v| !v.is_nan()) {
            min = Some(min.map_or(value, |m| m.min(value)));
            max = Some(max.map_or(value, |m| m.max(value)));
            sum += value;
            count += 1;
        }

        RasterStatistics {
            min,
            max,
            mean: (count > 0).then(|| sum / count as f64),
            valid_count: count,
            masked_count: self.len() - count,
        }
    }
}

/// Basic statistics for a raster
#[derive(Debug, Clone, PartialEq)]
pub struct RasterStatistics {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
    pub valid_count: usize,
    pub masked_count: usize,
}
