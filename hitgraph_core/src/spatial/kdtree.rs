//! k-d tree for exact nearest-neighbour queries in feature space.
//!
//! Binary tree split at the median of the widest axis, with per-node
//! bounding boxes for pruning. Works for any number of feature dimensions.

use std::collections::BinaryHeap;

use super::Candidate;
use crate::traits::{distance_squared, NeighborIndex};

/// Default maximum number of points per leaf.
pub const DEFAULT_LEAF_SIZE: usize = 8;

/// Axis-aligned bounding box in feature space.
#[derive(Clone, Debug)]
struct Bounds {
    min: Vec<f32>,
    max: Vec<f32>,
}

impl Bounds {
    fn from_points(features: &[f32], num_features: usize, indices: &[usize]) -> Self {
        let mut min = vec![f32::MAX; num_features];
        let mut max = vec![f32::MIN; num_features];
        for &i in indices {
            let point = &features[i * num_features..(i + 1) * num_features];
            for (d, &v) in point.iter().enumerate() {
                min[d] = min[d].min(v);
                max[d] = max[d].max(v);
            }
        }
        Self { min, max }
    }

    /// Squared distance from a point to the box, 0.0 inside.
    #[inline]
    fn distance_squared(&self, p: &[f32]) -> f32 {
        let mut sum = 0.0;
        for (d, &v) in p.iter().enumerate() {
            let delta = (self.min[d] - v).max(0.0).max(v - self.max[d]);
            sum += delta * delta;
        }
        sum
    }

    fn widest_axis(&self) -> usize {
        let mut axis = 0;
        let mut widest = f32::MIN;
        for d in 0..self.min.len() {
            let extent = self.max[d] - self.min[d];
            if extent > widest {
                widest = extent;
                axis = d;
            }
        }
        axis
    }
}

/// k-d tree node.
enum KdNode {
    /// Leaf node containing point indices.
    Leaf { bounds: Bounds, indices: Vec<usize> },
    /// Internal node with two children.
    Internal {
        bounds: Bounds,
        left: Box<KdNode>,
        right: Box<KdNode>,
    },
}

impl KdNode {
    fn bounds(&self) -> &Bounds {
        match self {
            KdNode::Leaf { bounds, .. } => bounds,
            KdNode::Internal { bounds, .. } => bounds,
        }
    }
}

/// k-d tree over borrowed row-major features.
///
/// The tree stores only indices; feature values stay in the caller's buffer.
pub struct KdTree<'a> {
    root: Option<KdNode>,
    features: &'a [f32],
    num_features: usize,
}

impl<'a> KdTree<'a> {
    /// Build a tree with the default leaf size.
    pub fn build(features: &'a [f32], num_features: usize) -> Self {
        Self::build_with_leaf_size(features, num_features, DEFAULT_LEAF_SIZE)
    }

    /// Build a tree.
    ///
    /// # Arguments
    /// * `features` - Row-major point features
    /// * `num_features` - Features per point
    /// * `max_leaf_size` - Maximum points per leaf node
    ///
    /// # Performance
    /// Build time is O(n log² n).
    pub fn build_with_leaf_size(
        features: &'a [f32],
        num_features: usize,
        max_leaf_size: usize,
    ) -> Self {
        let num_points = if num_features == 0 {
            0
        } else {
            features.len() / num_features
        };
        if num_points == 0 {
            return Self {
                root: None,
                features,
                num_features,
            };
        }

        let indices: Vec<usize> = (0..num_points).collect();
        let root =
            Self::build_recursive(features, num_features, indices, max_leaf_size.max(1));

        Self {
            root: Some(root),
            features,
            num_features,
        }
    }

    fn build_recursive(
        features: &[f32],
        num_features: usize,
        mut indices: Vec<usize>,
        max_leaf_size: usize,
    ) -> KdNode {
        let bounds = Bounds::from_points(features, num_features, &indices);

        if indices.len() <= max_leaf_size {
            return KdNode::Leaf { bounds, indices };
        }

        let axis = bounds.widest_axis();
        indices.sort_by(|&a, &b| {
            features[a * num_features + axis].total_cmp(&features[b * num_features + axis])
        });

        let mid = indices.len() / 2;
        let right_indices = indices.split_off(mid);
        let left_indices = indices;

        let left = Self::build_recursive(features, num_features, left_indices, max_leaf_size);
        let right = Self::build_recursive(features, num_features, right_indices, max_leaf_size);

        KdNode::Internal {
            bounds,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    #[inline]
    fn point(&self, index: usize) -> &[f32] {
        &self.features[index * self.num_features..(index + 1) * self.num_features]
    }

    fn nearest_recursive(
        &self,
        node: &KdNode,
        query: &[f32],
        k: usize,
        heap: &mut BinaryHeap<Candidate>,
    ) {
        // Equal distance is not pruned: a lower index may still win the tie.
        if heap.len() == k {
            if let Some(worst) = heap.peek() {
                if node.bounds().distance_squared(query) > worst.dist_sq {
                    return;
                }
            }
        }

        match node {
            KdNode::Leaf { indices, .. } => {
                for &index in indices {
                    let candidate = Candidate {
                        dist_sq: distance_squared(self.point(index), query),
                        index,
                    };
                    if heap.len() < k {
                        heap.push(candidate);
                    } else if let Some(worst) = heap.peek() {
                        if candidate < *worst {
                            heap.pop();
                            heap.push(candidate);
                        }
                    }
                }
            }
            KdNode::Internal { left, right, .. } => {
                let left_dist = left.bounds().distance_squared(query);
                let right_dist = right.bounds().distance_squared(query);

                if left_dist <= right_dist {
                    self.nearest_recursive(left, query, k, heap);
                    self.nearest_recursive(right, query, k, heap);
                } else {
                    self.nearest_recursive(right, query, k, heap);
                    self.nearest_recursive(left, query, k, heap);
                }
            }
        }
    }
}

impl NeighborIndex for KdTree<'_> {
    fn len(&self) -> usize {
        if self.num_features == 0 {
            0
        } else {
            self.features.len() / self.num_features
        }
    }

    fn k_nearest(&self, query: &[f32], k: usize) -> Vec<usize> {
        let root = match self.root.as_ref() {
            Some(root) if k > 0 => root,
            _ => return Vec::new(),
        };

        let mut heap = BinaryHeap::with_capacity(k + 1);
        self.nearest_recursive(root, query, k, &mut heap);

        heap.into_sorted_vec().into_iter().map(|c| c.index).collect()
    }
}
