//! Main Raster type

use crate::error::{Error, Result};
use crate::raster::{GeoTransform, RasterElement};
use ndarray::{Array2, ArrayView2, ArrayViewMut2, Zip};

/// A georeferenced 2D raster grid.
///
/// `Raster<T>` stores values of type `T` in a 2D grid with associated
/// georeferencing. Elevation surfaces are `Raster<f64>` with NaN marking
/// no-data; object masks are `Raster<bool>` (see [`Mask`]).
///
/// # Example
///
/// ```ignore
/// use smrf_core::Raster;
///
/// let mut raster: Raster<f64> = Raster::new(100, 100);
/// raster.set(10, 20, 42.0)?;
/// let value = raster.get(10, 20)?;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Raster<T: RasterElement> {
    /// Raster data stored in row-major order (row, col)
    data: Array2<T>,
    /// Affine transformation
    transform: GeoTransform,
    /// No-data value
    nodata: Option<T>,
}

/// Boolean raster; `true` marks a cell judged non-ground.
pub type Mask = Raster<bool>;

impl<T: RasterElement> Raster<T> {
    /// Create a new raster filled with the element's zero value
    pub fn new(rows: usize, cols: usize) -> Self {
        Self::filled(rows, cols, T::zero())
    }

    /// Create a new raster filled with a specific value
    pub fn filled(rows: usize, cols: usize, value: T) -> Self {
        Self {
            data: Array2::from_elem((rows, cols), value),
            transform: GeoTransform::default(),
            nodata: None,
        }
    }

    /// Create a raster from existing row-major data
    pub fn from_vec(data: Vec<T>, rows: usize, cols: usize) -> Result<Self> {
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
    pub fn from_array(data: Array2<T>) -> Self {
        Self {
            data,
            transform: GeoTransform::default(),
            nodata: None,
        }
    }

    /// Create a raster with the same transform but a different element type
    pub fn with_same_meta<U: RasterElement>(&self, rows: usize, cols: usize) -> Raster<U> {
        Raster {
            data: Array2::from_elem((rows, cols), U::zero()),
            transform: self.transform,
            nodata: None,
        }
    }

    /// Create a raster with the same dimensions and metadata, filled with a value
    pub fn like(&self, fill_value: T) -> Self {
        Self {
            data: Array2::from_elem(self.data.dim(), fill_value),
            transform: self.transform,
            nodata: self.nodata,
        }
    }

    /// Apply `f` to every cell, keeping the transform
    pub fn map<U: RasterElement, F>(&self, f: F) -> Raster<U>
    where
        F: Fn(T) -> U,
    {
        Raster {
            data: self.data.mapv(f),
            transform: self.transform,
            nodata: None,
        }
    }

    /// Combine two rasters of identical shape cell by cell
    pub fn zip_map<U, V, F>(&self, other: &Raster<U>, f: F) -> Result<Raster<V>>
    where
        U: RasterElement,
        V: RasterElement,
        F: Fn(T, U) -> V,
    {
        self.ensure_same_shape(other)?;
        let data = Zip::from(&self.data)
            .and(&other.data)
            .map_collect(|&a, &b| f(a, b));
        Ok(Raster {
            data,
            transform: self.transform,
            nodata: None,
        })
    }

    /// Fail with [`Error::SizeMismatch`] unless `other` has this raster's shape
    pub fn ensure_same_shape<U: RasterElement>(&self, other: &Raster<U>) -> Result<()> {
        let (er, ec) = self.shape();
        let (ar, ac) = other.shape();
        if (er, ec) != (ar, ac) {
            return Err(Error::SizeMismatch { er, ec, ar, ac });
        }
        Ok(())
    }

    // Dimensions

    /// Number of rows
    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    /// Number of columns
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

    /// Whether the raster is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    // Data access

    /// Get value at (row, col)
    pub fn get(&self, row: usize, col: usize) -> Result<T> {
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

    /// Set value at (row, col)
    pub fn set(&mut self, row: usize, col: usize, value: T) -> Result<()> {
        if row >= self.rows() || col >= self.cols() {
            return Err(Error::IndexOutOfBounds {
                row,
                col,
                rows: self.rows(),
                cols: self.cols(),
            });
        }
        self.data[(row, col)] = value;
        Ok(())
    }

    /// Get a view of the underlying data
    pub fn view(&self) -> ArrayView2<'_, T> {
        self.data.view()
    }

    /// Get a mutable view of the underlying data
    pub fn view_mut(&mut self) -> ArrayViewMut2<'_, T> {
        self.data.view_mut()
    }

    /// Get a reference to the underlying array
    pub fn data(&self) -> &Array2<T> {
        &self.data
    }

    /// Get a mutable reference to the underlying array
    pub fn data_mut(&mut self) -> &mut Array2<T> {
        &mut self.data
    }

    /// Consume the raster and return the underlying array
    pub fn into_array(self) -> Array2<T> {
        self.data
    }

    // Metadata

    /// Get the geotransform
    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    /// Set the geotransform
    pub fn set_transform(&mut self, transform: GeoTransform) {
        self.transform = transform;
    }

    /// Get the no-data value
    pub fn nodata(&self) -> Option<T> {
        self.nodata
    }

    /// Set the no-data value
    pub fn set_nodata(&mut self, nodata: Option<T>) {
        self.nodata = nodata;
    }

    /// Cell size (assumes square cells)
    pub fn cell_size(&self) -> f64 {
        self.transform.cell_size()
    }

    // Value checks

    /// Check if a value is no-data
    pub fn is_nodata(&self, value: T) -> bool {
        value.is_nodata(self.nodata)
    }

    /// Number of cells holding no-data
    pub fn nodata_count(&self) -> usize {
        self.data.iter().filter(|v| self.is_nodata(**v)).count()
    }
}

impl Raster<f64> {
    /// Calculate basic statistics (min, max, mean, count of valid cells)
    pub fn statistics(&self) -> RasterStatistics {
        let mut min: Option<f64> = None;
        let mut max: Option<f64> = None;
        let mut sum = 0.0;
        let mut count = 0_usize;

        for &value in self.data.iter() {
            if self.is_nodata(value) {
                continue;
            }
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
            nodata_count: self.len() - count,
        }
    }

    /// Boolean mask of no-data cells
    pub fn nodata_mask(&self) -> Mask {
        let nodata = self.nodata;
        self.map(|v| v.is_nodata(nodata))
    }

    /// Copy of this raster with every `mask`ed cell set to NaN
    pub fn masked(&self, mask: &Mask) -> Result<Raster<f64>> {
        let mut out = self.zip_map(mask, |v, m| if m { f64::NAN } else { v })?;
        out.set_nodata(Some(f64::NAN));
        Ok(out)
    }
}

impl Mask {
    /// Cell-wise logical OR of two masks
    pub fn or(&self, other: &Mask) -> Result<Mask> {
        self.zip_map(other, |a, b| a || b)
    }

    /// Number of `true` cells
    pub fn count_true(&self) -> usize {
        self.data.iter().filter(|&&v| v).count()
    }
}

/// Basic statistics for an elevation raster
#[derive(Debug, Clone)]
pub struct RasterStatistics {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
    pub valid_count: usize,
    pub nodata_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raster_creation() {
        let raster: Raster<f64> = Raster::new(100, 200);
        assert_eq!(raster.rows(), 100);
        assert_eq!(raster.cols(), 200);
        assert_eq!(raster.shape(), (100, 200));
    }

    #[test]
    fn test_raster_access() {
        let mut raster: Raster<f64> = Raster::new(10, 10);
        raster.set(5, 5, 42.0).unwrap();
        assert_eq!(raster.get(5, 5).unwrap(), 42.0);
        assert!(raster.get(10, 0).is_err());
    }

    #[test]
    fn test_raster_statistics() {
        let mut raster: Raster<f64> = Raster::new(10, 10);
        for i in 0..10 {
            for j in 0..10 {
                raster.set(i, j, (i * 10 + j) as f64).unwrap();
            }
        }
        raster.set(0, 0, f64::NAN).unwrap();

        let stats = raster.statistics();
        assert_eq!(stats.min, Some(1.0));
        assert_eq!(stats.max, Some(99.0));
        assert_eq!(stats.valid_count, 99);
        assert_eq!(stats.nodata_count, 1);
    }

    #[test]
    fn test_mask_or_and_count() {
        let mut a = Mask::new(3, 3);
        let mut b = Mask::new(3, 3);
        a.set(0, 0, true).unwrap();
        b.set(0, 0, true).unwrap();
        b.set(2, 1, true).unwrap();
        let c = a.or(&b).unwrap();
        assert_eq!(c.count_true(), 2);
        assert!(c.get(2, 1).unwrap());
    }

    #[test]
    fn test_zip_map_shape_mismatch() {
        let a: Raster<f64> = Raster::new(3, 3);
        let b = Mask::new(3, 4);
        assert!(matches!(a.masked(&b), Err(Error::SizeMismatch { .. })));
    }

    #[test]
    fn test_masked_sets_nan() {
        let a: Raster<f64> = Raster::filled(2, 2, 1.0);
        let mut m = Mask::new(2, 2);
        m.set(1, 1, true).unwrap();
        let out = a.masked(&m).unwrap();
        assert!(out.get(1, 1).unwrap().is_nan());
        assert_eq!(out.nodata_count(), 1);
        assert_eq!(out.nodata_mask().count_true(), 1);
    }
}
