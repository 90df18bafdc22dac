//! Bilinear sampling of a raster at map coordinates.
//!
//! Positions beyond the outermost nodes are clamped onto the border, which
//! amounts to edge replication of the surface.

use smrf_core::raster::{Grid, Raster};
use smrf_core::{Error, Result};

use crate::maybe_rayon::*;

/// Bilinearly interpolate `raster` (laid out on `grid`) at `(x, y)`.
pub fn sample_bilinear(raster: &Raster<f64>, grid: &Grid, x: f64, y: f64) -> f64 {
    let (rows, cols) = raster.shape();
    let (rf, cf) = grid.map_to_fractional(x, y);
    if !(rf.is_finite() && cf.is_finite()) || rows == 0 || cols == 0 {
        return f64::NAN;
    }

    let rf = rf.clamp(0.0, (rows - 1) as f64);
    let cf = cf.clamp(0.0, (cols - 1) as f64);
    let r0 = rf.floor() as usize;
    let c0 = cf.floor() as usize;
    let r1 = (r0 + 1).min(rows - 1);
    let c1 = (c0 + 1).min(cols - 1);
    let tr = rf - r0 as f64;
    let tc = cf - c0 as f64;

    let z = raster.data();
    let top = z[(r0, c0)] * (1.0 - tc) + z[(r0, c1)] * tc;
    let bottom = z[(r1, c0)] * (1.0 - tc) + z[(r1, c1)] * tc;
    top * (1.0 - tr) + bottom * tr
}

/// Sample `raster` at every `(xs[i], ys[i])`.
pub fn sample_bilinear_many(
    raster: &Raster<f64>,
    grid: &Grid,
    xs: &[f64],
    ys: &[f64],
) -> Result<Vec<f64>> {
    if (raster.rows(), raster.cols()) != grid.shape() {
        let (er, ec) = grid.shape();
        return Err(Error::SizeMismatch {
            er,
            ec,
            ar: raster.rows(),
            ac: raster.cols(),
        });
    }
    let n = xs.len().min(ys.len());
    Ok((0..n)
        .into_par_iter()
        .map(|i| sample_bilinear(raster, grid, xs[i], ys[i]))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn plane() -> (Raster<f64>, Grid) {
        let grid = Grid::new(10.0, 20.0, 2.0, -2.0, 5, 6).unwrap();
        let mut r = Raster::new(5, 6);
        for row in 0..5 {
            for col in 0..6 {
                let (x, y) = grid.node_to_map(row, col);
                r.set(row, col, 3.0 * x - y).unwrap();
            }
        }
        (r, grid)
    }

    #[test]
    fn test_bilinear_exact_on_plane() {
        let (r, g) = plane();
        assert_abs_diff_eq!(
            sample_bilinear(&r, &g, 13.0, 15.5),
            3.0 * 13.0 - 15.5,
            epsilon = 1e-10
        );
        assert_abs_diff_eq!(sample_bilinear(&r, &g, 10.0, 20.0), 10.0, epsilon = 1e-10);
    }

    #[test]
    fn test_bilinear_clamps_outside() {
        let (r, g) = plane();
        // Left of column 0: replicated edge value
        assert_abs_diff_eq!(sample_bilinear(&r, &g, 5.0, 20.0), 10.0, epsilon = 1e-10);
        assert!(sample_bilinear(&r, &g, f64::NAN, 20.0).is_nan());
    }

    #[test]
    fn test_many_checks_shape() {
        let (r, _) = plane();
        let other = Grid::new(0.0, 0.0, 1.0, -1.0, 3, 3).unwrap();
        assert!(sample_bilinear_many(&r, &other, &[0.0], &[0.0]).is_err());
    }

    #[test]
    fn test_many() {
        let (r, g) = plane();
        let out = sample_bilinear_many(&r, &g, &[10.0, 20.0], &[20.0, 12.0]).unwrap();
        assert_abs_diff_eq!(out[0], 10.0, epsilon = 1e-10);
        assert_abs_diff_eq!(out[1], 48.0, epsilon = 1e-10);
    }
}
