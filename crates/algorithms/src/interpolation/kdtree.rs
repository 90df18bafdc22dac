//! 2D k-d tree for spatial indexing
//!
//! Nearest and k-nearest queries over scattered samples. Used to seed the
//! gap-fill relaxation and to pick candidate neighbours for natural
//! neighbour interpolation.
//!
//! Reference:
//! Bentley, J.L. (1975). Multidimensional binary search trees used
//! for associative searching. CACM, 18(9).

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use super::SamplePoint;

/// A 2D k-d tree for efficient spatial queries on sample points.
#[derive(Debug)]
pub struct KdTree {
    nodes: Vec<KdNode>,
    points: Vec<SamplePoint>,
}

#[derive(Debug)]
struct KdNode {
    /// Index into `points`
    point_idx: usize,
    /// Split on x when true, y otherwise
    split_x: bool,
    left: Option<usize>,
    right: Option<usize>,
}

/// Result of a nearest-neighbor query
#[derive(Debug, Clone, Copy)]
pub struct NearestResult {
    pub point: SamplePoint,
    pub distance_sq: f64,
    /// Index of the point in the slice the tree was built from
    pub index: usize,
}

/// Heap entry ordered by distance so the farthest candidate sits on top
#[derive(Debug, Clone, Copy, PartialEq)]
struct Candidate {
    distance_sq: f64,
    index: usize,
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance_sq
            .total_cmp(&other.distance_sq)
            .then(self.index.cmp(&other.index))
    }
}

impl KdTree {
    /// Build a k-d tree from sample points.
    ///
    /// Construction is O(n log n) using median selection on alternating axes.
    pub fn build(points: &[SamplePoint]) -> Self {
        let mut indices: Vec<usize> = (0..points.len()).collect();
        let mut nodes = Vec::with_capacity(points.len());
        if !points.is_empty() {
            build_recursive(points, &mut indices, true, &mut nodes);
        }
        Self {
            nodes,
            points: points.to_vec(),
        }
    }

    /// Number of points in the tree.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the tree is empty.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Find the single nearest point to (qx, qy).
    pub fn nearest(&self, qx: f64, qy: f64) -> Option<NearestResult> {
        self.k_nearest(qx, qy, 1).into_iter().next()
    }

    /// Find the k nearest points to (qx, qy), sorted by ascending distance.
    pub fn k_nearest(&self, qx: f64, qy: f64, k: usize) -> Vec<NearestResult> {
        if self.nodes.is_empty() || k == 0 {
            return Vec::new();
        }

        let mut heap = BinaryHeap::with_capacity(k + 1);
        self.knn_recursive(0, qx, qy, k, &mut heap);

        heap.into_sorted_vec()
            .into_iter()
            .map(|c| NearestResult {
                point: self.points[c.index],
                distance_sq: c.distance_sq,
                index: c.index,
            })
            .collect()
    }

    fn knn_recursive(
        &self,
        node_idx: usize,
        qx: f64,
        qy: f64,
        k: usize,
        heap: &mut BinaryHeap<Candidate>,
    ) {
        let node = &self.nodes[node_idx];
        let p = &self.points[node.point_idx];
        let distance_sq = p.dist_sq(qx, qy);

        let candidate = Candidate {
            distance_sq,
            index: node.point_idx,
        };
        if heap.len() < k {
            heap.push(candidate);
        } else if heap.peek().is_some_and(|worst| candidate < *worst) {
            heap.pop();
            heap.push(candidate);
        }

        let diff = if node.split_x { qx - p.x } else { qy - p.y };
        let (near, far) = if diff < 0.0 {
            (node.left, node.right)
        } else {
            (node.right, node.left)
        };

        if let Some(child) = near {
            self.knn_recursive(child, qx, qy, k, heap);
        }

        let bound = if heap.len() < k {
            f64::INFINITY
        } else {
            heap.peek().map_or(f64::INFINITY, |c| c.distance_sq)
        };
        if diff * diff < bound {
            if let Some(child) = far {
                self.knn_recursive(child, qx, qy, k, heap);
            }
        }
    }
}

fn build_recursive(
    points: &[SamplePoint],
    indices: &mut [usize],
    split_x: bool,
    nodes: &mut Vec<KdNode>,
) -> usize {
    let key = |i: &usize| if split_x { points[*i].x } else { points[*i].y };
    let median = indices.len() / 2;
    indices.select_nth_unstable_by(median, |a, b| key(a).total_cmp(&key(b)));

    let node_idx = nodes.len();
    nodes.push(KdNode {
        point_idx: indices[median],
        split_x,
        left: None,
        right: None,
    });

    let (left, rest) = indices.split_at_mut(median);
    let right = &mut rest[1..];

    if !left.is_empty() {
        let child = build_recursive(points, left, !split_x, nodes);
        nodes[node_idx].left = Some(child);
    }
    if !right.is_empty() {
        let child = build_recursive(points, right, !split_x, nodes);
        nodes[node_idx].right = Some(child);
    }

    node_idx
}
