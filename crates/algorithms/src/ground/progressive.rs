//! Progressive morphological filter
//!
//! Opens the surface with disks of increasing radius. At each step a cell
//! is flagged as an object when the opening lowers it by more than a
//! terrain slope could explain over that radius (`slope * radius`). Each
//! step opens the previous step's result, not the original surface.
//!
//! Reference:
//! Pingel, T.J., Clarke, K.C., McBride, W.A. (2013). An improved simple
//! morphological filter for the terrain classification of airborne LIDAR
//! data. ISPRS J. Photogramm. Remote Sens. 77, 21–30.

use smrf_core::raster::{validate_cell_size, Mask, Raster};
use smrf_core::{Algorithm, Error, Result};
use tracing::debug;

use super::config::WindowSpec;
use crate::morphology::{opening, StructuringElement};

/// Radius/cell-size ratios within this of an integer count as that integer.
const RATIO_EPSILON: f64 = 1e-9;

/// Slope used by the low-outlier pass.
pub const OUTLIER_SLOPE: f64 = 5.0;

/// Parameters for the progressive filter
#[derive(Debug, Clone)]
pub struct ProgressiveParams {
    /// Horizontal spacing of the surface (map units)
    pub cell_size: f64,
    /// Tolerated terrain slope (dz/dx)
    pub slope_threshold: f64,
    /// Window radii (map units)
    pub window: WindowSpec,
}

impl Default for ProgressiveParams {
    fn default() -> Self {
        Self {
            cell_size: 1.0,
            slope_threshold: 0.15,
            window: WindowSpec::Max(18.0),
        }
    }
}

/// Result of a progressive filter run
#[derive(Debug, Clone)]
pub struct ProgressiveOutput {
    /// True where a cell was judged an object
    pub mask: Mask,
    /// Surface after the largest opening
    pub surface: Raster<f64>,
    /// Window radius of each step, in pixels
    pub windows: Vec<usize>,
    /// Elevation threshold of each step
    pub thresholds: Vec<f64>,
}

/// Progressive filter algorithm
#[derive(Debug, Clone, Default)]
pub struct ProgressiveFilter;

impl Algorithm for ProgressiveFilter {
    type Input = Raster<f64>;
    type Output = ProgressiveOutput;
    type Params = ProgressiveParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "ProgressiveFilter"
    }

    fn description(&self) -> &'static str {
        "Flag raised objects by opening with growing windows and slope-scaled thresholds"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        progressive_filter(&input, &params)
    }
}

/// Whole-pixel radius for a map-unit radius
pub(crate) fn pixels(radius: f64, cell_size: f64) -> usize {
    (radius / cell_size - RATIO_EPSILON).ceil().max(0.0) as usize
}

/// Window radii in pixels for `window` at `cell_size`.
///
/// A single maximum expands to `1, 2, ..., ceil(max / cell_size)`.
pub fn window_pixels(window: &WindowSpec, cell_size: f64) -> Result<Vec<usize>> {
    validate_cell_size(cell_size)?;
    let radii = match window {
        WindowSpec::Max(max) => {
            if !(max.is_finite() && *max > 0.0) {
                return Err(Error::InvalidParameter {
                    name: "window",
                    value: max.to_string(),
                    reason: "maximum window must be strictly positive".into(),
                });
            }
            (1..=pixels(*max, cell_size)).collect()
        }
        WindowSpec::Sequence(radii) => {
            if radii.is_empty() || radii.iter().any(|r| !r.is_finite() || *r < 0.0) {
                return Err(Error::InvalidParameter {
                    name: "window",
                    value: format!("{radii:?}"),
                    reason: "window radii must be non-negative and non-empty".into(),
                });
            }
            radii.iter().map(|&r| pixels(r, cell_size)).collect()
        }
    };
    Ok(radii)
}

/// Elevation threshold per step: `slope * pixels * cell_size`
pub fn thresholds(windows: &[usize], slope_threshold: f64, cell_size: f64) -> Vec<f64> {
    windows
        .iter()
        .map(|&w| slope_threshold * w as f64 * cell_size)
        .collect()
}

/// Run the progressive filter on a fully populated surface.
pub fn progressive_filter(
    surface: &Raster<f64>,
    params: &ProgressiveParams,
) -> Result<ProgressiveOutput> {
    if !(params.slope_threshold.is_finite() && params.slope_threshold >= 0.0) {
        return Err(Error::InvalidParameter {
            name: "slope_threshold",
            value: params.slope_threshold.to_string(),
            reason: "slope threshold must be non-negative".into(),
        });
    }
    let windows = window_pixels(&params.window, params.cell_size)?;
    let thresholds = thresholds(&windows, params.slope_threshold, params.cell_size);

    let mut mask: Mask = surface.with_same_meta(surface.rows(), surface.cols());
    let mut current = surface.clone();

    for (&radius, &threshold) in windows.iter().zip(&thresholds) {
        let opened = opening(&current, &StructuringElement::Disk(radius))?;
        let flagged = current.zip_map(&opened, |c, o| c - o > threshold)?;
        let newly = flagged.zip_map(&mask, |f, m| f && !m)?.count_true();
        mask = mask.or(&flagged)?;
        current = opened;
        debug!(radius, threshold, newly, "progressive filter step");
    }

    Ok(ProgressiveOutput {
        mask,
        surface: current,
        windows,
        thresholds,
    })
}

/// Flag isolated low cells (dropouts) of a fully populated surface.
///
/// Runs the progressive filter on the negated surface with a one-cell
/// window and [`OUTLIER_SLOPE`].
pub fn low_outliers(surface: &Raster<f64>, cell_size: f64) -> Result<Mask> {
    let inverted = surface.map(|v| -v);
    let params = ProgressiveParams {
        cell_size,
        slope_threshold: OUTLIER_SLOPE,
        window: WindowSpec::Sequence(vec![cell_size]),
    };
    Ok(progressive_filter(&inverted, &params)?.mask)
}
