//! LIDAR ground filtering
//!
//! - Rasterization: point cloud to a gap-filled surface model
//! - Progressive filter: multi-window opening with slope-scaled thresholds
//! - Low-outlier pass: the progressive filter on the inverted surface
//! - Net cutting: background lattice spliced into the surface model
//! - [`Smrf`]: the full pipeline with per-point reclassification

mod config;
mod net_cut;
mod pipeline;
mod progressive;
mod rasterize;

pub use config::{SmrfConfig, WindowSpec, DEFAULT_GAP_FILL_METHOD};
pub use net_cut::{net_cut, net_stride, NetCut};
pub use pipeline::{reclassify, Smrf, SmrfOutput, SmrfWarning};
pub use progressive::{
    low_outliers, progressive_filter, thresholds, window_pixels, ProgressiveFilter,
    ProgressiveOutput, ProgressiveParams, OUTLIER_SLOPE,
};
pub use rasterize::{bin_points, grid_for_cloud, rasterize, Dsm, PointCloud, RasterizeParams};
