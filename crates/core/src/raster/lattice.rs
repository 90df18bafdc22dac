//! Node-centred lattice linking map coordinates to raster cells.
//!
//! A [`Grid`] is a set of regularly spaced nodes: node `(row, col)` sits at
//! `(x0 + col * dx, y0 + row * dy)`. Columns normally run west to east
//! (`dx > 0`) and rows north to south (`dy < 0`). Each node is the centre of
//! one raster cell.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::raster::GeoTransform;

/// Relative tolerance used when comparing explicit x and y spacings.
const SPACING_TOLERANCE: f64 = 1e-9;

/// How coordinates that snap exactly one node beyond an axis are treated.
///
/// Snapping uses `k = round((coord - min) / cell_size)`. An index of `-1`
/// (just below the lowest node) is always pulled back to node 0. An index
/// of `n` (just past the highest node) is dropped under `LowSide`, and
/// pulled back to node `n - 1` under `Symmetric`. Anything further out is
/// always dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeClamp {
    #[default]
    LowSide,
    Symmetric,
}

/// A regular lattice of grid nodes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    /// X coordinate of column 0
    pub x0: f64,
    /// Y coordinate of row 0
    pub y0: f64,
    /// Signed column step
    pub dx: f64,
    /// Signed row step
    pub dy: f64,
    pub rows: usize,
    pub cols: usize,
}

impl Grid {
    /// Create a grid, validating spacing and dimensions.
    pub fn new(x0: f64, y0: f64, dx: f64, dy: f64, rows: usize, cols: usize) -> Result<Self> {
        if !(dx.is_finite() && dx != 0.0) {
            return Err(Error::InvalidParameter {
                name: "dx",
                value: dx.to_string(),
                reason: "grid spacing must be finite and non-zero".into(),
            });
        }
        if !(dy.is_finite() && dy != 0.0) {
            return Err(Error::InvalidParameter {
                name: "dy",
                value: dy.to_string(),
                reason: "grid spacing must be finite and non-zero".into(),
            });
        }
        if (dx.abs() - dy.abs()).abs() > SPACING_TOLERANCE * dx.abs() {
            return Err(Error::GridSpacingMismatch {
                dx: dx.abs(),
                dy: dy.abs(),
            });
        }
        if rows == 0 || cols == 0 {
            return Err(Error::InvalidDimensions {
                width: cols,
                height: rows,
            });
        }
        Ok(Self {
            x0,
            y0,
            dx,
            dy,
            rows,
            cols,
        })
    }

    /// Derive a top-down grid covering a point extent at `cell_size`.
    ///
    /// Nodes sit on whole multiples of the cell size: columns run from
    /// `ceil(min_x / c) * c` to `floor(max_x / c) * c`, rows from
    /// `floor(max_y / c) * c` down to `ceil(min_y / c) * c`.
    pub fn from_extent(
        min_x: f64,
        max_x: f64,
        min_y: f64,
        max_y: f64,
        cell_size: f64,
    ) -> Result<Self> {
        validate_cell_size(cell_size)?;

        let x_start = (min_x / cell_size).ceil() * cell_size;
        let x_end = (max_x / cell_size).floor() * cell_size;
        let y_top = (max_y / cell_size).floor() * cell_size;
        let y_bottom = (min_y / cell_size).ceil() * cell_size;

        let cols = node_count(x_start, x_end, cell_size);
        let rows = node_count(y_bottom, y_top, cell_size);

        Self::new(x_start, y_top, cell_size, -cell_size, rows, cols)
    }

    /// Build a grid from explicit node coordinate vectors.
    ///
    /// The cell size is taken from the first spacing of each vector (an
    /// axis with a single node borrows the other axis' spacing). The two
    /// spacings must agree in magnitude.
    pub fn from_coordinates(xi: &[f64], yi: &[f64]) -> Result<Self> {
        if xi.is_empty() || yi.is_empty() {
            return Err(Error::InvalidDimensions {
                width: xi.len(),
                height: yi.len(),
            });
        }

        let dx = xi.get(1).map(|x1| x1 - xi[0]);
        let dy = yi.get(1).map(|y1| y1 - yi[0]);

        let (dx, dy) = match (dx, dy) {
            (Some(dx), Some(dy)) => (dx, dy),
            (Some(dx), None) => (dx, -dx.abs()),
            (None, Some(dy)) => (dy.abs(), dy),
            (None, None) => return Err(Error::MissingParameter("cell_size")),
        };

        Self::new(xi[0], yi[0], dx, dy, yi.len(), xi.len())
    }

    /// Cell size (magnitude of the node spacing)
    pub fn cell_size(&self) -> f64 {
        self.dx.abs()
    }

    /// Dimensions as (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.rows * self.cols
    }

    /// Whether the grid has no nodes
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// X coordinates of every column
    pub fn x_coords(&self) -> Vec<f64> {
        (0..self.cols).map(|c| self.x0 + c as f64 * self.dx).collect()
    }

    /// Y coordinates of every row
    pub fn y_coords(&self) -> Vec<f64> {
        (0..self.rows).map(|r| self.y0 + r as f64 * self.dy).collect()
    }

    /// Map coordinates of node `(row, col)`
    pub fn node_to_map(&self, row: usize, col: usize) -> (f64, f64) {
        (
            self.x0 + col as f64 * self.dx,
            self.y0 + row as f64 * self.dy,
        )
    }

    /// Fractional `(row, col)` position of a map coordinate
    pub fn map_to_fractional(&self, x: f64, y: f64) -> (f64, f64) {
        ((y - self.y0) / self.dy, (x - self.x0) / self.dx)
    }

    /// Snap a map coordinate to its nearest node.
    ///
    /// Returns `None` when the coordinate falls outside the grid after
    /// applying the `clamp` policy.
    pub fn map_to_index(&self, x: f64, y: f64, clamp: EdgeClamp) -> Option<(usize, usize)> {
        let col = snap_axis(x, self.x0, self.dx, self.cols, clamp)?;
        let row = snap_axis(y, self.y0, self.dy, self.rows, clamp)?;
        Some((row, col))
    }

    /// Row-major flat index of `(row, col)`
    #[inline]
    pub fn flat_index(&self, row: usize, col: usize) -> usize {
        row * self.cols + col
    }

    /// Affine transform whose pixel centres coincide with the grid nodes
    pub fn geo_transform(&self) -> GeoTransform {
        GeoTransform::new(
            self.x0 - self.dx / 2.0,
            self.y0 - self.dy / 2.0,
            self.dx,
            self.dy,
        )
    }
}

/// Validate a user-supplied cell size.
pub fn validate_cell_size(cell_size: f64) -> Result<()> {
    if !(cell_size.is_finite() && cell_size > 0.0) {
        return Err(Error::InvalidParameter {
            name: "cell_size",
            value: cell_size.to_string(),
            reason: "cell size must be strictly positive".into(),
        });
    }
    Ok(())
}

fn node_count(start: f64, end: f64, step: f64) -> usize {
    if end < start {
        return 0;
    }
    ((end - start) / step).round() as usize + 1
}

/// Snap one coordinate onto an axis of `n` nodes starting at `origin`.
///
/// Indices are computed from the axis minimum so that the clamp applies to
/// the low *coordinate* side whatever the axis direction.
fn snap_axis(coord: f64, origin: f64, step: f64, n: usize, clamp: EdgeClamp) -> Option<usize> {
    if !coord.is_finite() {
        return None;
    }
    let c = step.abs();
    let min = if step > 0.0 {
        origin
    } else {
        origin + step * (n as f64 - 1.0)
    };
    let k = ((coord - min) / c).round() as i64;
    let n = n as i64;

    let k = match k {
        -1 => 0,
        k if k == n && clamp == EdgeClamp::Symmetric => n - 1,
        k if (0..n).contains(&k) => k,
        _ => return None,
    };

    let idx = if step > 0.0 { k } else { n - 1 - k };
    Some(idx as usize)
}
