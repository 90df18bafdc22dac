//! Natural Neighbor (Sibson) Interpolation
//!
//! Locally adaptive interpolation that preserves data values exactly and
//! produces C1-continuous surfaces (except at data points where it is C0).
//!
//! Uses the discrete Sibson method: for each target node, measures the
//! "area stolen" from each natural neighbor's Voronoi cell on a local
//! sub-grid, then weights accordingly. Nodes outside the convex hull of the
//! samples are left as no-data.
//!
//! Reference:
//! Sibson, R. (1981). "A brief description of natural neighbour interpolation."
//! In Interpreting Multivariate Data, pp. 21–36.

use geo::{ConvexHull, Intersects, MultiPoint, Point, Polygon};
use smrf_core::raster::{Grid, Raster};
use smrf_core::{Error, Result};

use super::kdtree::KdTree;
use super::SamplePoint;
use crate::maybe_rayon::*;

/// A service interpolating scattered samples onto the nodes of a grid.
///
/// Nodes the interpolator cannot reach (e.g. outside the convex hull of
/// the samples) are NaN.
pub trait ScatteredInterpolator: Send + Sync {
    fn interpolate(&self, points: &[SamplePoint], grid: &Grid) -> Result<Raster<f64>>;
}

/// Parameters for Natural Neighbor interpolation
#[derive(Debug, Clone)]
pub struct NaturalNeighborParams {
    /// Maximum number of candidate points to consider (default: 20).
    /// Only the k nearest points participate in weight computation.
    pub max_neighbors: usize,
    /// Sub-grid resolution for discrete area estimation (default: 11).
    /// Must be odd (will be rounded up if even).
    pub sub_resolution: usize,
}

impl Default for NaturalNeighborParams {
    fn default() -> Self {
        Self {
            max_neighbors: 20,
            sub_resolution: 11,
        }
    }
}

/// Default [`ScatteredInterpolator`]: discrete Sibson interpolation.
#[derive(Debug, Clone, Default)]
pub struct NaturalNeighbor {
    pub params: NaturalNeighborParams,
}

impl ScatteredInterpolator for NaturalNeighbor {
    fn interpolate(&self, points: &[SamplePoint], grid: &Grid) -> Result<Raster<f64>> {
        natural_neighbor(points, grid, &self.params)
    }
}

/// Perform Natural Neighbor (Sibson) interpolation onto `grid`'s nodes.
///
/// # Algorithm (Discrete Sibson)
///
/// For each node at position (x, y) inside the convex hull:
/// 1. Find the k nearest sample points
/// 2. Lay a local sub-grid centred at (x, y)
/// 3. Assign each sub-cell to its nearest sample point (original Voronoi)
/// 4. Count sub-cells the node itself would claim ("stolen" area)
/// 5. Interpolated value = stolen-area weighted mean of neighbor values
pub fn natural_neighbor(
    points: &[SamplePoint],
    grid: &Grid,
    params: &NaturalNeighborParams,
) -> Result<Raster<f64>> {
    if points.len() < 3 {
        return Err(Error::Algorithm(format!(
            "Natural Neighbor requires at least 3 points, got {}",
            points.len()
        )));
    }

    let (rows, cols) = grid.shape();
    let k = params.max_neighbors.max(1).min(points.len());
    let sub_res = params.sub_resolution.max(3) | 1;

    let hull = convex_hull(points);
    let tree = KdTree::build(points);

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            (0..cols)
                .map(|col| {
                    let (x, y) = grid.node_to_map(row, col);
                    if !hull.intersects(&Point::new(x, y)) {
                        return f64::NAN;
                    }
                    sibson_at(&tree, x, y, k, sub_res)
                })
                .collect::<Vec<f64>>()
        })
        .collect();

    let mut output = Raster::from_vec(data, rows, cols)?;
    output.set_transform(grid.geo_transform());
    output.set_nodata(Some(f64::NAN));

    Ok(output)
}

fn convex_hull(points: &[SamplePoint]) -> Polygon<f64> {
    let cloud: MultiPoint<f64> = points.iter().map(|p| Point::new(p.x, p.y)).collect();
    cloud.convex_hull()
}

fn sibson_at(tree: &KdTree, cx: f64, cy: f64, k: usize, sub_res: usize) -> f64 {
    let neighbors = tree.k_nearest(cx, cy, k);
    let Some(first) = neighbors.first() else {
        return f64::NAN;
    };

    if first.distance_sq < 1e-20 {
        return first.point.value;
    }

    // Sub-grid covers the inner 60% of the neighbour range
    let max_dist = neighbors.last().map_or(0.0, |n| n.distance_sq.sqrt());
    let half_extent = max_dist * 0.6;
    let step = 2.0 * half_extent / (sub_res - 1) as f64;
    if step < 1e-15 {
        return first.point.value;
    }

    let mut stolen = vec![0_usize; neighbors.len()];
    let mut total_stolen = 0_usize;

    for sr in 0..sub_res {
        let sy = cy - half_extent + sr as f64 * step;
        for sc in 0..sub_res {
            let sx = cx - half_extent + sc as f64 * step;

            let (owner, owner_dist) = neighbors
                .iter()
                .enumerate()
                .map(|(i, n)| (i, n.point.dist_sq(sx, sy)))
                .fold((0, f64::INFINITY), |best, cur| if cur.1 < best.1 { cur } else { best });

            let dq = (sx - cx) * (sx - cx) + (sy - cy) * (sy - cy);
            if dq < owner_dist {
                stolen[owner] += 1;
                total_stolen += 1;
            }
        }
    }

    if total_stolen == 0 {
        return first.point.value;
    }

    neighbors
        .iter()
        .zip(&stolen)
        .filter(|(_, s)| **s > 0)
        .map(|(n, &s)| n.point.value * s as f64)
        .sum::<f64>()
        / total_stolen as f64
}
