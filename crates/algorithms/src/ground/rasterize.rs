//! Point cloud binning onto a regular grid.
//!
//! Each point snaps to its nearest grid node; the elevations sharing a node
//! are reduced to one value, and nodes that received no point are filled by
//! a [`GapFill`] service so the surface has no holes.

use smrf_core::raster::{validate_cell_size, EdgeClamp, Grid, Mask, Raster};
use smrf_core::{Error, Result};
use tracing::{debug, info};

use crate::interpolation::{consolidate, Aggregation, GapFill};

/// An in-memory point cloud stored as three coordinate columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointCloud {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub z: Vec<f64>,
}

impl PointCloud {
    /// Build a cloud from coordinate columns of equal length.
    pub fn new(x: Vec<f64>, y: Vec<f64>, z: Vec<f64>) -> Result<Self> {
        if x.len() != y.len() || x.len() != z.len() {
            return Err(Error::LengthMismatch {
                x: x.len(),
                y: y.len(),
                z: z.len(),
            });
        }
        Ok(Self { x, y, z })
    }

    pub fn from_points(points: &[(f64, f64, f64)]) -> Self {
        let mut cloud = Self {
            x: Vec::with_capacity(points.len()),
            y: Vec::with_capacity(points.len()),
            z: Vec::with_capacity(points.len()),
        };
        for &(x, y, z) in points {
            cloud.x.push(x);
            cloud.y.push(y);
            cloud.z.push(z);
        }
        cloud
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// `(min_x, max_x, min_y, max_y)` over points with finite x and y
    pub fn extent(&self) -> Option<(f64, f64, f64, f64)> {
        self.x
            .iter()
            .zip(&self.y)
            .filter(|(x, y)| x.is_finite() && y.is_finite())
            .fold(None, |acc, (&x, &y)| match acc {
                None => Some((x, x, y, y)),
                Some((x0, x1, y0, y1)) => Some((x0.min(x), x1.max(x), y0.min(y), y1.max(y))),
            })
    }

    /// Ensure coordinate columns agree and the cloud is not empty.
    pub fn check(&self) -> Result<()> {
        if self.x.len() != self.y.len() || self.x.len() != self.z.len() {
            return Err(Error::LengthMismatch {
                x: self.x.len(),
                y: self.y.len(),
                z: self.z.len(),
            });
        }
        if self.is_empty() {
            return Err(Error::EmptyPointCloud);
        }
        Ok(())
    }
}

/// Derive a top-down grid at `cell_size` covering the cloud.
pub fn grid_for_cloud(cloud: &PointCloud, cell_size: f64) -> Result<Grid> {
    validate_cell_size(cell_size)?;
    cloud.check()?;
    let (min_x, max_x, min_y, max_y) = cloud.extent().ok_or(Error::NoPopulatedCells {
        dropped: cloud.len(),
    })?;
    // An extent narrower than one cell holds no node
    Grid::from_extent(min_x, max_x, min_y, max_y, cell_size).map_err(|e| match e {
        Error::InvalidDimensions { .. } => Error::NoPopulatedCells {
            dropped: cloud.len(),
        },
        other => other,
    })
}

/// Binning options
#[derive(Debug, Clone, Copy, Default)]
pub struct RasterizeParams {
    pub aggregation: Aggregation,
    pub edge_clamp: EdgeClamp,
}

/// Rasterized surface model
#[derive(Debug, Clone)]
pub struct Dsm {
    /// Elevation per node, with empty nodes filled
    pub surface: Raster<f64>,
    /// True where no point landed before filling
    pub empty: Mask,
    pub grid: Grid,
    /// Points that fell outside the grid or had no finite elevation
    pub dropped: usize,
}

/// Bin the cloud onto `grid` without filling.
///
/// Returns the binned raster (NaN where a node received no point) and the
/// number of points that did not contribute.
pub fn bin_points(
    cloud: &PointCloud,
    grid: &Grid,
    params: &RasterizeParams,
) -> Result<(Raster<f64>, usize)> {
    cloud.check()?;

    let mut indices = Vec::with_capacity(cloud.len());
    let mut values = Vec::with_capacity(cloud.len());
    for ((&x, &y), &z) in cloud.x.iter().zip(&cloud.y).zip(&cloud.z) {
        if let Some((row, col)) = grid.map_to_index(x, y, params.edge_clamp) {
            indices.push(grid.flat_index(row, col));
            values.push(z);
        }
    }

    let bins = consolidate(&indices, &values, params.aggregation)?;
    let used = values.iter().filter(|z| !z.is_nan()).count();
    let dropped = cloud.len() - used;
    if bins.is_empty() {
        return Err(Error::NoPopulatedCells { dropped });
    }

    let (rows, cols) = grid.shape();
    let mut data = vec![f64::NAN; rows * cols];
    for (index, value) in bins {
        data[index] = value;
    }

    let mut raster = Raster::from_vec(data, rows, cols)?;
    raster.set_transform(grid.geo_transform());
    raster.set_nodata(Some(f64::NAN));

    debug!(points = cloud.len(), dropped, "binned point cloud");
    Ok((raster, dropped))
}

/// Bin the cloud onto `grid` and fill the empty nodes.
pub fn rasterize(
    cloud: &PointCloud,
    grid: &Grid,
    params: &RasterizeParams,
    gap_fill: &dyn GapFill,
) -> Result<Dsm> {
    let (binned, dropped) = bin_points(cloud, grid, params)?;
    let empty = binned.nodata_mask();

    let mut surface = gap_fill.fill(&binned)?;
    surface.set_transform(grid.geo_transform());

    let stats = binned.statistics();
    info!(
        rows = grid.rows,
        cols = grid.cols,
        empty = empty.count_true(),
        dropped,
        z_min = stats.min,
        z_max = stats.max,
        "rasterized point cloud"
    );

    Ok(Dsm {
        surface,
        empty,
        grid: *grid,
        dropped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpolation::RelaxationFill;

    fn unit_grid() -> Grid {
        // Nodes at x = 0..=4, y = 4..=0 (top-down)
        Grid::new(0.0, 4.0, 1.0, -1.0, 5, 5).unwrap()
    }

    #[test]
    fn test_length_mismatch() {
        let err = PointCloud::new(vec![0.0], vec![0.0, 1.0], vec![0.0]).unwrap_err();
        assert!(err.is_data());
    }

    #[test]
    fn test_empty_cloud() {
        let cloud = PointCloud::default();
        let err = bin_points(&cloud, &unit_grid(), &RasterizeParams::default()).unwrap_err();
        assert!(matches!(err, Error::EmptyPointCloud));
    }

    #[test]
    fn test_min_aggregation_and_layout() {
        let cloud = PointCloud::from_points(&[(1.0, 4.0, 7.0), (1.2, 3.9, 5.0), (3.0, 0.0, 2.0)]);
        let (r, dropped) = bin_points(&cloud, &unit_grid(), &RasterizeParams::default()).unwrap();
        assert_eq!(dropped, 0);
        // y = 4 is the top row
        assert_eq!(r.get(0, 1).unwrap(), 5.0);
        assert_eq!(r.get(4, 3).unwrap(), 2.0);
        assert_eq!(r.nodata_count(), 23);
    }

    #[test]
    fn test_low_side_clamp() {
        // x = -0.6 snaps to -1 and is pulled in; x = 4.6 snaps to 5 and is dropped
        let cloud = PointCloud::from_points(&[(-0.6, 2.0, 1.0), (4.6, 2.0, 9.0)]);
        let (r, dropped) = bin_points(&cloud, &unit_grid(), &RasterizeParams::default()).unwrap();
        assert_eq!(dropped, 1);
        assert_eq!(r.get(2, 0).unwrap(), 1.0);
        assert!(r.get(2, 4).unwrap().is_nan());

        let symmetric = RasterizeParams {
            edge_clamp: EdgeClamp::Symmetric,
            ..Default::default()
        };
        let (r, dropped) = bin_points(&cloud, &unit_grid(), &symmetric).unwrap();
        assert_eq!(dropped, 0);
        assert_eq!(r.get(2, 4).unwrap(), 9.0);
    }

    #[test]
    fn test_everything_outside() {
        let cloud = PointCloud::from_points(&[(50.0, 50.0, 1.0), (-9.0, 2.0, 1.0)]);
        let err = bin_points(&cloud, &unit_grid(), &RasterizeParams::default()).unwrap_err();
        assert!(matches!(err, Error::NoPopulatedCells { dropped: 2 }));
        assert!(err.is_data());
    }

    #[test]
    fn test_rasterize_fills_every_cell() {
        let cloud = PointCloud::from_points(&[(0.0, 0.0, 1.0), (4.0, 4.0, 1.0), (2.0, 2.0, 1.0)]);
        let dsm = rasterize(
            &cloud,
            &unit_grid(),
            &RasterizeParams::default(),
            &RelaxationFill::default(),
        )
        .unwrap();
        assert_eq!(dsm.surface.nodata_count(), 0);
        assert_eq!(dsm.empty.count_true(), 22);
        assert!(!dsm.empty.get(2, 2).unwrap());
        for &v in dsm.surface.data().iter() {
            assert!((v - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_grid_for_cloud() {
        let cloud = PointCloud::from_points(&[(0.3, 0.2, 0.0), (9.7, 5.9, 0.0)]);
        let grid = grid_for_cloud(&cloud, 1.0).unwrap();
        assert_eq!(grid.x0, 1.0);
        assert_eq!(grid.y0, 5.0);
        assert_eq!(grid.shape(), (5, 9));

        let tiny = PointCloud::from_points(&[(0.2, 0.2, 0.0), (0.4, 0.3, 0.0)]);
        assert!(grid_for_cloud(&tiny, 1.0).unwrap_err().is_data());
    }
}
