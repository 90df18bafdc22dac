//! Net cutting: splice a sparse lattice of background values into a surface.
//!
//! Large objects (wide roofs) survive any opening narrower than themselves.
//! Overwriting every `stride`-th row and column with a heavily opened
//! background estimate cuts such footprints into pieces no wider than the
//! net spacing, which a modest maximum window can then remove.

use smrf_core::raster::{validate_cell_size, Mask, Raster};
use smrf_core::{Error, Result};
use tracing::debug;

use super::progressive::pixels;
use crate::morphology::{opening, StructuringElement};

/// Surface after net cutting
#[derive(Debug, Clone)]
pub struct NetCut {
    /// Input surface with net cells replaced by the background estimate
    pub surface: Raster<f64>,
    /// True on net rows and columns
    pub mask: Mask,
    /// Row/column stride in pixels
    pub stride: usize,
}

/// Cut a net with `spacing` (map units) through `surface`.
///
/// The background estimate is an opening with radius `2 * stride`, where
/// `stride = ceil(spacing / cell_size)`. Rows and columns `0, stride,
/// 2 * stride, ...` take the background value.
pub fn net_cut(surface: &Raster<f64>, cell_size: f64, spacing: f64) -> Result<NetCut> {
    let stride = net_stride(spacing, cell_size)?;
    let background = opening(surface, &StructuringElement::Disk(2 * stride))?;

    let (rows, cols) = surface.shape();
    let mut mask: Mask = surface.with_same_meta(rows, cols);
    let mut cut = surface.clone();
    {
        let net = mask.data_mut();
        let z = cut.data_mut();
        let bg = background.data();
        for ((row, col), cell) in net.indexed_iter_mut() {
            if row % stride == 0 || col % stride == 0 {
                *cell = true;
                z[(row, col)] = bg[(row, col)];
            }
        }
    }

    debug!(stride, radius = 2 * stride, cells = mask.count_true(), "net cut");
    Ok(NetCut {
        surface: cut,
        mask,
        stride,
    })
}

/// Net stride in pixels for `spacing` on cells of `cell_size`.
///
/// A stride below 2 would put every row on the net and leave no off-net
/// cell to anchor the surface, so spacings up to one cell are rejected.
pub fn net_stride(spacing: f64, cell_size: f64) -> Result<usize> {
    validate_cell_size(cell_size)?;
    if !(spacing.is_finite() && spacing > 0.0) {
        return Err(Error::InvalidParameter {
            name: "net_spacing",
            value: spacing.to_string(),
            reason: "net spacing must be strictly positive".into(),
        });
    }
    let stride = pixels(spacing, cell_size);
    if stride < 2 {
        return Err(Error::InvalidParameter {
            name: "net_spacing",
            value: spacing.to_string(),
            reason: format!("net spacing must exceed the cell size {cell_size}"),
        });
    }
    Ok(stride)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_net_layout() {
        let surface = Raster::filled(7, 9, 1.0);
        let out = net_cut(&surface, 1.0, 3.0).unwrap();
        assert_eq!(out.stride, 3);
        for row in 0..7 {
            for col in 0..9 {
                let expected = row % 3 == 0 || col % 3 == 0;
                assert_eq!(out.mask.get(row, col).unwrap(), expected);
            }
        }
        // Flat surface: background equals the surface
        assert_eq!(out.surface.data(), surface.data());
    }

    #[test]
    fn test_net_breaks_wide_block() {
        let mut surface = Raster::filled(40, 40, 0.0);
        for row in 5..35 {
            for col in 5..35 {
                surface.set(row, col, 8.0).unwrap();
            }
        }
        let out = net_cut(&surface, 1.0, 10.0).unwrap();
        // Radius-20 opening removes the 30-wide block, so net cells drop to ground
        assert_eq!(out.surface.get(10, 17).unwrap(), 0.0);
        assert_eq!(out.surface.get(17, 20).unwrap(), 0.0);
        // Off-net cells keep their height
        assert_eq!(out.surface.get(17, 17).unwrap(), 8.0);
    }

    #[test]
    fn test_spacing_rounds_up() {
        let out = net_cut(&Raster::filled(5, 5, 0.0), 2.0, 3.0).unwrap();
        assert_eq!(out.stride, 2);
    }

    #[test]
    fn test_invalid_spacing() {
        assert!(net_cut(&Raster::filled(5, 5, 0.0), 1.0, 0.0).is_err());
        assert!(net_cut(&Raster::filled(5, 5, 0.0), 0.0, 3.0).is_err());
    }

    #[test]
    fn test_spacing_within_one_cell_is_rejected() {
        for (spacing, cell) in [(1.0, 1.0), (0.5, 1.0), (2.0, 2.0), (1.0 + 1e-12, 1.0)] {
            let err = net_cut(&Raster::filled(5, 5, 0.0), cell, spacing).unwrap_err();
            assert!(err.is_configuration(), "{spacing} at {cell}: {err}");
        }
        assert_eq!(net_stride(1.5, 1.0).unwrap(), 2);
        assert_eq!(net_stride(2.0, 1.0).unwrap(), 2);
    }
}
