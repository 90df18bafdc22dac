//! Simple morphological filter (SMRF) orchestration.
//!
//! Stages: rasterize the cloud, flag low outliers, optionally cut a net,
//! run the progressive filter, gap-fill every non-ground cell into a
//! prospective ground surface, then (when an elevation threshold is set)
//! reclassify each point against that surface and interpolate a final
//! ground-only surface.

use std::fmt;

use smrf_core::raster::{Grid, Mask, Raster};
use smrf_core::{Algorithm, Error, Result};
use tracing::{info, warn};

use super::config::SmrfConfig;
use super::net_cut::{net_cut, net_stride};
use super::progressive::{low_outliers, progressive_filter, ProgressiveParams};
use super::rasterize::{grid_for_cloud, rasterize, PointCloud, RasterizeParams};
use crate::interpolation::{
    sample_bilinear_many, GapFill, NaturalNeighbor, RelaxationFill, SamplePoint,
    ScatteredInterpolator,
};
use crate::terrain::gradient_magnitude;

/// Minimum number of ground points for the final interpolation.
const MIN_GROUND_POINTS: usize = 3;

/// Degraded-but-valid conditions met during a run
#[derive(Debug, Clone, PartialEq)]
pub enum SmrfWarning {
    /// No elevation threshold: points were not reclassified and the
    /// ground surface is the prospective surface
    NoElevationThreshold,
    /// Too few ground points to interpolate; the ground surface is the
    /// prospective surface
    TooFewGroundPoints { count: usize },
    /// Points that fell outside the grid or had no finite elevation
    PointsDropped { count: usize },
}

impl fmt::Display for SmrfWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SmrfWarning::NoElevationThreshold => {
                write!(f, "no elevation threshold given; per-point classification skipped")
            }
            SmrfWarning::TooFewGroundPoints { count } => {
                write!(f, "only {count} ground points; using the prospective surface")
            }
            SmrfWarning::PointsDropped { count } => {
                write!(f, "{count} points were not rasterized")
            }
        }
    }
}

/// Everything a ground-filter run produces
#[derive(Debug, Clone)]
pub struct SmrfOutput {
    /// Final ground elevation surface
    pub ground_surface: Raster<f64>,
    /// Grid shared by every output raster
    pub grid: Grid,
    /// Per-point flag, true for objects. `None` without an elevation threshold.
    pub classification: Option<Vec<bool>>,
    /// Surface model with every non-ground cell gap-filled
    pub prospective_surface: Raster<f64>,
    /// Rasterized and gap-filled surface model
    pub dsm: Raster<f64>,
    /// Union of empty, low-outlier, object and net cells
    pub non_ground: Mask,
    /// Cells that received no point
    pub empty_cells: Mask,
    pub warnings: Vec<SmrfWarning>,
}

impl SmrfOutput {
    /// Indices of points classified as ground.
    pub fn ground_indices(&self) -> Option<Vec<usize>> {
        self.classification.as_ref().map(|flags| {
            flags
                .iter()
                .enumerate()
                .filter(|&(_, &object)| !object)
                .map(|(i, _)| i)
                .collect()
        })
    }
}

/// Ground filter with injectable gap-fill and interpolation services.
pub struct Smrf {
    config: SmrfConfig,
    gap_fill: Option<Box<dyn GapFill>>,
    interpolator: Box<dyn ScatteredInterpolator>,
}

impl fmt::Debug for Smrf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Smrf")
            .field("config", &self.config)
            .field("custom_gap_fill", &self.gap_fill.is_some())
            .finish_non_exhaustive()
    }
}

impl Smrf {
    /// Validate `config` and use the default services.
    pub fn new(config: SmrfConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            gap_fill: None,
            interpolator: Box::new(NaturalNeighbor::default()),
        })
    }

    /// Replace the gap-fill and scattered-interpolation services.
    ///
    /// A substitute gap fill takes precedence over `gap_fill_method`.
    pub fn with_services<G, I>(mut self, gap_fill: G, interpolator: I) -> Self
    where
        G: GapFill + 'static,
        I: ScatteredInterpolator + 'static,
    {
        self.gap_fill = Some(Box::new(gap_fill));
        self.interpolator = Box::new(interpolator);
        self
    }

    pub fn config(&self) -> &SmrfConfig {
        &self.config
    }

    /// Classify `cloud` with this filter's configuration.
    pub fn run(&self, cloud: &PointCloud) -> Result<SmrfOutput> {
        self.run_with(cloud, &self.config)
    }

    fn run_with(&self, cloud: &PointCloud, config: &SmrfConfig) -> Result<SmrfOutput> {
        config.validate()?;
        cloud.check()?;

        let default_fill;
        let gap_fill: &dyn GapFill = match &self.gap_fill {
            Some(custom) => custom.as_ref(),
            None => {
                default_fill = RelaxationFill::new(config.gap_fill_kind()?);
                &default_fill
            }
        };

        let grid = resolve_grid(cloud, config)?;
        let cell_size = grid.cell_size();
        let mut warnings = Vec::new();

        let dsm = rasterize(
            cloud,
            &grid,
            &RasterizeParams {
                aggregation: config.aggregation,
                edge_clamp: config.edge_clamp,
            },
            gap_fill,
        )?;
        if dsm.dropped > 0 {
            warn!(dropped = dsm.dropped, "points outside the grid were ignored");
            warnings.push(SmrfWarning::PointsDropped { count: dsm.dropped });
        }

        let low = low_outliers(&dsm.surface, cell_size)?;

        let (filter_input, net) = match config.net_spacing {
            Some(spacing) => {
                let cut = net_cut(&dsm.surface, cell_size, spacing)?;
                (cut.surface, cut.mask)
            }
            None => (dsm.surface.clone(), dsm.empty.like(false)),
        };

        let (slope_threshold, window) = match (config.slope_threshold, &config.window) {
            (Some(s), Some(w)) => (s, w.clone()),
            (None, _) => return Err(Error::MissingParameter("slope_threshold")),
            (_, None) => return Err(Error::MissingParameter("window")),
        };
        let objects = progressive_filter(
            &filter_input,
            &ProgressiveParams {
                cell_size,
                slope_threshold,
                window,
            },
        )?
        .mask;

        let non_ground = dsm.empty.or(&low)?.or(&objects)?.or(&net)?;
        info!(
            empty = dsm.empty.count_true(),
            low_outliers = low.count_true(),
            objects = objects.count_true(),
            net = net.count_true(),
            non_ground = non_ground.count_true(),
            "progressive filtering done"
        );

        let mut prospective = gap_fill.fill(&dsm.surface.masked(&non_ground)?)?;
        prospective.set_transform(grid.geo_transform());

        let (classification, ground_surface) = match config.elevation_tolerance() {
            None => {
                warn!("no elevation threshold given; skipping per-point classification");
                warnings.push(SmrfWarning::NoElevationThreshold);
                (None, prospective.clone())
            }
            Some((threshold, scaler)) => {
                let flags = reclassify(cloud, &grid, &prospective, threshold, scaler)?;
                let ground: Vec<SamplePoint> = flags
                    .iter()
                    .enumerate()
                    .filter(|&(_, &object)| !object)
                    .map(|(i, _)| SamplePoint::new(cloud.x[i], cloud.y[i], cloud.z[i]))
                    .collect();
                info!(
                    points = cloud.len(),
                    ground = ground.len(),
                    objects = cloud.len() - ground.len(),
                    "points reclassified"
                );

                let surface = if ground.len() < MIN_GROUND_POINTS {
                    warn!(count = ground.len(), "too few ground points to interpolate");
                    warnings.push(SmrfWarning::TooFewGroundPoints { count: ground.len() });
                    prospective.clone()
                } else {
                    self.interpolator.interpolate(&ground, &grid)?
                };
                (Some(flags), surface)
            }
        };

        Ok(SmrfOutput {
            ground_surface,
            grid,
            classification,
            prospective_surface: prospective,
            dsm: dsm.surface,
            non_ground,
            empty_cells: dsm.empty,
            warnings,
        })
    }
}

impl Algorithm for Smrf {
    type Input = PointCloud;
    type Output = SmrfOutput;
    type Params = SmrfConfig;
    type Error = Error;

    fn name(&self) -> &'static str {
        "SMRF"
    }

    fn description(&self) -> &'static str {
        "Simple morphological filter separating ground from object points"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        self.run_with(&input, &params)
    }
}

fn resolve_grid(cloud: &PointCloud, config: &SmrfConfig) -> Result<Grid> {
    let grid = match (&config.grid_x, &config.grid_y) {
        (Some(xi), Some(yi)) => {
            let grid = Grid::from_coordinates(xi, yi)?;
            if let Some(c) = config.cell_size {
                if (c - grid.cell_size()).abs() > 1e-9 * c {
                    return Err(Error::InvalidParameter {
                        name: "cell_size",
                        value: c.to_string(),
                        reason: format!("explicit grid spacing is {}", grid.cell_size()),
                    });
                }
            }
            grid
        }
        _ => {
            let cell_size = config.cell_size.ok_or(Error::MissingParameter("cell_size"))?;
            grid_for_cloud(cloud, cell_size)?
        }
    };
    if let Some(spacing) = config.net_spacing {
        net_stride(spacing, grid.cell_size())?;
    }
    Ok(grid)
}

/// Flag each point whose elevation departs from `surface` by more than
/// `threshold + scaler * slope`, where slope is the local gradient
/// magnitude of the surface. Points without a finite elevation are objects.
///
/// Sampling clamps to the grid, so points outside it (including those the
/// rasterizer dropped) are compared against the nearest border values and
/// still receive a classification.
pub fn reclassify(
    cloud: &PointCloud,
    grid: &Grid,
    surface: &Raster<f64>,
    threshold: f64,
    scaler: f64,
) -> Result<Vec<bool>> {
    let slope = gradient_magnitude(surface, grid.cell_size())?;
    let expected = sample_bilinear_many(surface, grid, &cloud.x, &cloud.y)?;
    let local_slope = sample_bilinear_many(&slope, grid, &cloud.x, &cloud.y)?;

    Ok(cloud
        .z
        .iter()
        .zip(expected.iter().zip(&local_slope))
        .map(|(&z, (&ez, &si))| !((z - ez).abs() <= threshold + scaler * si))
        .collect())
}
