//! Scattered-data services used by the ground filter
//!
//! - Bin consolidation: reduce values sharing a cell index
//! - Gap fill: replace no-data cells of a raster with a smooth interpolant
//! - Natural Neighbor: scattered samples onto a target grid (Sibson)
//! - Grid sampling: bilinear lookup of a raster at map coordinates
//!
//! Gap fill and scattered interpolation sit behind the [`GapFill`] and
//! [`ScatteredInterpolator`] traits so the pipeline can take substitutes.

mod consolidate;
mod gap_fill;
pub mod kdtree;
mod natural_neighbor;
mod sample;

pub use consolidate::{consolidate, Aggregation};
pub use gap_fill::{optimal_omega, GapFill, GapFillMethod, RelaxationFill};
pub use kdtree::{KdTree, NearestResult};
pub use natural_neighbor::{
    natural_neighbor, NaturalNeighbor, NaturalNeighborParams, ScatteredInterpolator,
};
pub use sample::{sample_bilinear, sample_bilinear_many};

/// A sample point with x, y coordinates and a value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplePoint {
    pub x: f64,
    pub y: f64,
    pub value: f64,
}

impl SamplePoint {
    pub fn new(x: f64, y: f64, value: f64) -> Self {
        Self { x, y, value }
    }

    /// Squared Euclidean distance to another point
    #[inline]
    pub fn dist_sq(&self, other_x: f64, other_y: f64) -> f64 {
        let dx = self.x - other_x;
        let dy = self.y - other_y;
        dx * dx + dy * dy
    }
}
