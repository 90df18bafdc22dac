//! # SMRF Algorithms
//!
//! Ground filtering for airborne LIDAR point clouds with the simple
//! morphological filter.
//!
//! ## Modules
//!
//! - **morphology**: Erosion, dilation and opening with disk elements
//! - **interpolation**: Bin consolidation, gap fill, natural neighbor, bilinear sampling
//! - **terrain**: Gradient magnitude
//! - **ground**: Rasterization, progressive filter, net cutting, classification

pub mod ground;
pub mod interpolation;
mod maybe_rayon;
pub mod morphology;
pub mod terrain;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::ground::{
        low_outliers, net_cut, progressive_filter, rasterize, PointCloud, ProgressiveFilter,
        ProgressiveParams, Smrf, SmrfConfig, SmrfOutput, SmrfWarning, WindowSpec,
    };
    pub use crate::interpolation::{
        consolidate, Aggregation, GapFill, GapFillMethod, NaturalNeighbor, RelaxationFill,
        SamplePoint, ScatteredInterpolator,
    };
    pub use crate::morphology::{dilate, erode, opening, StructuringElement};
    pub use crate::terrain::gradient_magnitude;
    pub use smrf_core::prelude::*;
}
