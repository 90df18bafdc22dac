//! Gradient magnitude of an elevation surface
//!
//! Partial derivatives use central differences in the interior and one-sided
//! differences on the border rows and columns, with unit sample spacing.
//! Dividing the surface by the cell size first turns the result into a
//! dimensionless slope (rise over run).

use crate::maybe_rayon::*;
use smrf_core::raster::{validate_cell_size, Raster};
use smrf_core::{Algorithm, Error, Result};

/// Parameters for gradient magnitude
#[derive(Debug, Clone)]
pub struct GradientParams {
    /// Horizontal spacing of the surface, in the same units as elevation
    pub cell_size: f64,
}

impl Default for GradientParams {
    fn default() -> Self {
        Self { cell_size: 1.0 }
    }
}

/// Gradient magnitude algorithm
#[derive(Debug, Clone, Default)]
pub struct GradientMagnitude;

impl Algorithm for GradientMagnitude {
    type Input = Raster<f64>;
    type Output = Raster<f64>;
    type Params = GradientParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "GradientMagnitude"
    }

    fn description(&self) -> &'static str {
        "Local slope magnitude from central differences"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        gradient_magnitude(&input, params.cell_size)
    }
}

/// Compute `sqrt((dz/dx)² + (dz/dy)²)` of `surface / cell_size`.
///
/// An axis of length one has a zero derivative. NaN cells propagate to
/// every output cell whose stencil touches them.
pub fn gradient_magnitude(surface: &Raster<f64>, cell_size: f64) -> Result<Raster<f64>> {
    validate_cell_size(cell_size)?;

    let (rows, cols) = surface.shape();
    let z = surface.data();

    let output_data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            (0..cols)
                .map(|col| {
                    let gx = axis_difference(cols, col, |c| z[(row, c)]);
                    let gy = axis_difference(rows, row, |r| z[(r, col)]);
                    (gx * gx + gy * gy).sqrt() / cell_size
                })
                .collect::<Vec<f64>>()
        })
        .collect();

    let mut output = Raster::from_vec(output_data, rows, cols)?;
    output.set_transform(*surface.transform());
    output.set_nodata(Some(f64::NAN));
    Ok(output)
}

/// Derivative along one axis at index `i` of `n` samples
#[inline]
fn axis_difference(n: usize, i: usize, at: impl Fn(usize) -> f64) -> f64 {
    if n < 2 {
        0.0
    } else if i == 0 {
        at(1) - at(0)
    } else if i == n - 1 {
        at(n - 1) - at(n - 2)
    } else {
        (at(i + 1) - at(i - 1)) / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn ramp(rows: usize, cols: usize, sx: f64, sy: f64) -> Raster<f64> {
        let mut r = Raster::new(rows, cols);
        for row in 0..rows {
            for col in 0..cols {
                r.set(row, col, sx * col as f64 + sy * row as f64).unwrap();
            }
        }
        r
    }

    #[test]
    fn test_flat_is_zero() {
        let g = gradient_magnitude(&Raster::filled(5, 5, 12.0), 1.0).unwrap();
        assert!(g.data().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_plane_slope_everywhere() {
        // z rises 3 per column and 4 per row on a 2-unit grid: slope 2.5
        let g = gradient_magnitude(&ramp(6, 7, 3.0, 4.0), 2.0).unwrap();
        for &v in g.data().iter() {
            assert_abs_diff_eq!(v, 2.5, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_single_row() {
        let g = gradient_magnitude(&ramp(1, 4, 1.0, 0.0), 1.0).unwrap();
        for &v in g.data().iter() {
            assert_abs_diff_eq!(v, 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_border_one_sided() {
        let mut r = Raster::filled(3, 3, 0.0);
        r.set(1, 1, 2.0).unwrap();
        let g = gradient_magnitude(&r, 1.0).unwrap();
        // Central difference straddles the peak
        assert_abs_diff_eq!(g.get(1, 1).unwrap(), 0.0, epsilon = 1e-12);
        // (0, 1): dz/dy one-sided = 2, dz/dx central = 0
        assert_abs_diff_eq!(g.get(0, 1).unwrap(), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_invalid_cell_size() {
        assert!(gradient_magnitude(&Raster::filled(2, 2, 0.0), 0.0).is_err());
    }
}
