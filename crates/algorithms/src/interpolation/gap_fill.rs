//! Gap filling: replace the no-data cells of a raster with a smooth surface
//! that honours every populated cell.
//!
//! The fill solves a discrete membrane problem over the unknown cells only:
//! at convergence each unknown cell equals the mean of its neighbours.
//!
//! - [`GapFillMethod::Laplacian`]: 4-neighbour mean (discrete ∇²z = 0)
//! - [`GapFillMethod::Springs`]: 8-neighbour mean, i.e. every cell tied to
//!   its horizontal, vertical and diagonal neighbours by equal springs
//!
//! Unknown cells are seeded with their nearest known value, then relaxed
//! with successive over-relaxation until the largest update drops below
//! the tolerance. The default relaxation factor is the optimum for the
//! Laplacian on a square of the grid's larger side, `2 / (1 + sin(π / n))`.

use std::f64::consts::PI;


use smrf_core::raster::{offset_within, Neighborhood, Raster};
use smrf_core::{Error, RasterElement, Result};
use tracing::{debug, warn};

use super::kdtree::KdTree;
use super::SamplePoint;

/// Interpolation kernel for [`RelaxationFill`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GapFillMethod {
    Laplacian,
    #[default]
    Springs,
}

impl GapFillMethod {
    /// Map a numeric method selector onto a kernel.
    ///
    /// Codes 0, 1 and 2 select the Laplacian kernel; 4 (the default) and 5
    /// select springs. Code 3 (biharmonic) is not supported.
    pub fn from_code(code: u8) -> Result<Self> {
        match code {
            0..=2 => Ok(GapFillMethod::Laplacian),
            4 | 5 => Ok(GapFillMethod::Springs),
            _ => Err(Error::InvalidParameter {
                name: "gap_fill_method",
                value: code.to_string(),
                reason: "supported methods are 0, 1, 2 (laplacian) and 4, 5 (springs)".into(),
            }),
        }
    }

    fn neighborhood(self) -> Neighborhood {
        match self {
            GapFillMethod::Laplacian => Neighborhood::Rook3x3,
            GapFillMethod::Springs => Neighborhood::Queen3x3,
        }
    }
}

impl TryFrom<u8> for GapFillMethod {
    type Error = Error;

    fn try_from(code: u8) -> Result<Self> {
        Self::from_code(code)
    }
}

/// A service that fills every no-data cell of a raster.
///
/// Implementations must leave populated cells untouched and return a raster
/// of the same shape with no NaN cells.
pub trait GapFill: Send + Sync {
    fn fill(&self, raster: &Raster<f64>) -> Result<Raster<f64>>;
}

/// Iterative relaxation gap fill.
#[derive(Debug, Clone)]
pub struct RelaxationFill {
    pub method: GapFillMethod,
    /// Stop once the largest per-sweep update, relative to the value range
    /// of the known cells, falls below this.
    pub tolerance: f64,
    pub max_iterations: usize,
    /// Over-relaxation factor in (0, 2); `None` picks [`optimal_omega`]
    pub omega: Option<f64>,
}

impl Default for RelaxationFill {
    fn default() -> Self {
        Self {
            method: GapFillMethod::default(),
            tolerance: 1e-8,
            max_iterations: 5_000,
            omega: None,
        }
    }
}

impl RelaxationFill {
    pub fn new(method: GapFillMethod) -> Self {
        Self {
            method,
            ..Default::default()
        }
    }
}

impl GapFill for RelaxationFill {
    fn fill(&self, raster: &Raster<f64>) -> Result<Raster<f64>> {
        let (rows, cols) = raster.shape();
        let nodata = raster.nodata();

        let mut known = Vec::new();
        let mut unknown = Vec::new();
        for ((row, col), &v) in raster.data().indexed_iter() {
            if v.is_nodata(nodata) {
                unknown.push((row, col));
            } else {
                known.push(SamplePoint::new(col as f64, row as f64, v));
            }
        }

        let mut output = raster.clone();
        output.set_nodata(Some(f64::NAN));
        if unknown.is_empty() {
            return Ok(output);
        }
        if known.is_empty() {
            return Err(Error::Algorithm("gap fill needs at least one populated cell".into()));
        }

        let tree = KdTree::build(&known);
        let (lo, hi) = known
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
                (lo.min(p.value), hi.max(p.value))
            });
        let threshold = self.tolerance * (hi - lo).max(1.0);

        let data = output.data_mut();
        for &(row, col) in &unknown {
            if let Some(n) = tree.nearest(col as f64, row as f64) {
                data[(row, col)] = n.point.value;
            }
        }

        let omega = self.omega.unwrap_or_else(|| optimal_omega(rows, cols));
        let offsets = self.method.neighborhood().offsets_no_center();
        let mut iterations = 0;
        let mut max_delta = f64::INFINITY;
        while iterations < self.max_iterations && max_delta > threshold {
            max_delta = 0.0;
            for &(row, col) in &unknown {
                let mut sum = 0.0;
                let mut n = 0;
                for &(dr, dc) in &offsets {
                    if let Some(cell) = offset_within(row, col, dr, dc, rows, cols) {
                        sum += data[cell];
                        n += 1;
                    }
                }
                if n == 0 {
                    continue;
                }
                let current = data[(row, col)];
                let delta = omega * (sum / n as f64 - current);
                data[(row, col)] = current + delta;
                max_delta = max_delta.max(delta.abs());
            }
            iterations += 1;
        }

        if max_delta > threshold {
            warn!(
                filled = unknown.len(),
                iterations,
                residual = max_delta,
                tolerance = threshold,
                "gap fill stopped at the sweep limit before converging"
            );
        } else {
            debug!(
                filled = unknown.len(),
                iterations,
                omega,
                residual = max_delta,
                "gap fill converged"
            );
        }
        Ok(output)
    }
}

/// Near-optimal SOR factor for a `rows` x `cols` grid.
pub fn optimal_omega(rows: usize, cols: usize) -> f64 {
    let n = rows.max(cols).max(2) as f64;
    2.0 / (1.0 + (PI / n).sin())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_method_codes() {
        assert_eq!(GapFillMethod::from_code(0).unwrap(), GapFillMethod::Laplacian);
        assert_eq!(GapFillMethod::from_code(4).unwrap(), GapFillMethod::Springs);
        assert_eq!(GapFillMethod::try_from(5).unwrap(), GapFillMethod::Springs);
        assert!(GapFillMethod::from_code(3).unwrap_err().is_configuration());
        assert!(GapFillMethod::from_code(9).is_err());
    }

    #[test]
    fn test_fill_leaves_known_cells() {
        let mut r = Raster::filled(6, 6, 2.0);
        r.set(2, 3, f64::NAN).unwrap();
        r.set(0, 0, f64::NAN).unwrap();
        let out = RelaxationFill::default().fill(&r).unwrap();
        assert_eq!(out.nodata_count(), 0);
        assert_abs_diff_eq!(out.get(2, 3).unwrap(), 2.0, epsilon = 1e-9);
        assert_eq!(out.get(1, 1).unwrap(), 2.0);
    }

    #[test]
    fn test_fill_reproduces_linear_ramp() {
        // A plane is harmonic, so both kernels should recover it in the hole
        for method in [GapFillMethod::Laplacian, GapFillMethod::Springs] {
            let mut r = Raster::new(12, 12);
            for row in 0..12 {
                for col in 0..12 {
                    r.set(row, col, 0.5 * col as f64 + 0.25 * row as f64).unwrap();
                }
            }
            for row in 3..8 {
                for col in 4..9 {
                    r.set(row, col, f64::NAN).unwrap();
                }
            }
            let out = RelaxationFill::new(method).fill(&r).unwrap();
            for row in 3..8 {
                for col in 4..9 {
                    let expected = 0.5 * col as f64 + 0.25 * row as f64;
                    assert_abs_diff_eq!(out.get(row, col).unwrap(), expected, epsilon = 1e-5);
                }
            }
        }
    }

    #[test]
    fn test_large_hole_converges_quickly() {
        let (rows, cols) = (80, 80);
        let plane = |row: usize, col: usize| 0.1 * col as f64 + 0.05 * row as f64;
        let mut r = Raster::new(rows, cols);
        for row in 0..rows {
            for col in 0..cols {
                let v = if (10..70).contains(&row) && (10..70).contains(&col) {
                    f64::NAN
                } else {
                    plane(row, col)
                };
                r.set(row, col, v).unwrap();
            }
        }
        for method in [GapFillMethod::Laplacian, GapFillMethod::Springs] {
            let fill = RelaxationFill {
                max_iterations: 1_000,
                ..RelaxationFill::new(method)
            };
            let out = fill.fill(&r).unwrap();
            for row in 10..70 {
                for col in 10..70 {
                    let v = out.get(row, col).unwrap();
                    assert_abs_diff_eq!(v, plane(row, col), epsilon = 1e-5);
                }
            }
        }
    }

    #[test]
    fn test_sweep_limit_still_fills() {
        let mut r = Raster::filled(20, 20, f64::NAN);
        r.set(0, 0, 0.0).unwrap();
        r.set(19, 19, 10.0).unwrap();
        let fill = RelaxationFill {
            max_iterations: 2,
            ..Default::default()
        };
        let out = fill.fill(&r).unwrap();
        assert_eq!(out.nodata_count(), 0);
        assert_eq!(out.get(19, 19).unwrap(), 10.0);
    }

    #[test]
    fn test_optimal_omega() {
        let small = optimal_omega(3, 3);
        let large = optimal_omega(200, 120);
        assert!(1.0 < small && small < large && large < 2.0);
        assert_abs_diff_eq!(optimal_omega(1, 1), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_fill_respects_sentinel_nodata() {
        let mut r = Raster::filled(3, 3, 1.0);
        r.set_nodata(Some(-9999.0));
        r.set(1, 1, -9999.0).unwrap();
        let out = RelaxationFill::default().fill(&r).unwrap();
        assert_abs_diff_eq!(out.get(1, 1).unwrap(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_fill_without_control_cells_fails() {
        let r = Raster::filled(3, 3, f64::NAN);
        assert!(RelaxationFill::default().fill(&r).is_err());
    }
}
