//! Batching of graph records into tensors.

use burn::prelude::*;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use hitgraph_io::GraphRecord;

use super::dataset::GraphSubset;
use crate::error::{HitTrainError, Result};

/// Several graphs merged into one disconnected graph.
///
/// Node indices of graph `g` are offset by `graph_ptr[g]`, so edge tensors
/// index directly into `x`.
#[derive(Debug, Clone)]
pub struct GraphBatch<B: Backend> {
    /// Node features, shape `[num_nodes, num_features]`.
    pub x: Tensor<B, 2>,
    /// Edge sources, shape `[num_edges]`.
    pub edge_sources: Tensor<B, 1, Int>,
    /// Edge targets, shape `[num_edges]`.
    pub edge_targets: Tensor<B, 1, Int>,
    /// Edge labels, shape `[num_edges]`.
    pub edge_labels: Tensor<B, 1, Int>,
    /// Node labels, shape `[num_nodes]`.
    pub node_labels: Tensor<B, 1, Int>,
    /// Graph index of every node, shape `[num_nodes]`.
    pub node_graph: Tensor<B, 1, Int>,
    /// Node offsets per graph, `num_graphs + 1` entries.
    pub graph_ptr: Vec<usize>,
    /// Host copy of the edge labels.
    pub host_edge_labels: Vec<i64>,
    /// Host copy of the node labels.
    pub host_node_labels: Vec<i64>,
}

impl<B: Backend> GraphBatch<B> {
    /// Merge `records` into a batch on `device`.
    ///
    /// # Errors
    /// `Training` for an empty slice, a graph without nodes, or records with
    /// different feature dimensions.
    pub fn from_records(records: &[GraphRecord], device: &B::Device) -> Result<Self> {
        let num_features = match records.first() {
            Some(record) => record.num_features,
            None => return Err(HitTrainError::training("cannot batch zero graphs")),
        };

        let num_nodes: usize = records.iter().map(GraphRecord::num_nodes).sum();
        let num_edges: usize = records.iter().map(GraphRecord::num_edges).sum();

        let mut x = Vec::with_capacity(num_nodes * num_features);
        let mut sources = Vec::with_capacity(num_edges);
        let mut targets = Vec::with_capacity(num_edges);
        let mut edge_labels = Vec::with_capacity(num_edges);
        let mut node_labels = Vec::with_capacity(num_nodes);
        let mut node_graph = Vec::with_capacity(num_nodes);
        let mut graph_ptr = Vec::with_capacity(records.len() + 1);
        graph_ptr.push(0);

        for (g, record) in records.iter().enumerate() {
            if record.num_features != num_features {
                return Err(HitTrainError::training(format!(
                    "graph {} has {} features, expected {}",
                    g, record.num_features, num_features
                )));
            }
            if record.num_nodes() == 0 {
                return Err(HitTrainError::training(format!("graph {} has no nodes", g)));
            }

            let offset = node_labels.len();
            x.extend_from_slice(&record.x);
            sources.extend(record.edge_sources.iter().map(|&s| (s + offset) as i64));
            targets.extend(record.edge_targets.iter().map(|&t| (t + offset) as i64));
            edge_labels.extend_from_slice(&record.edge_labels);
            node_labels.extend_from_slice(&record.node_labels);
            node_graph.extend(std::iter::repeat(g as i64).take(record.num_nodes()));
            graph_ptr.push(node_labels.len());
        }

        let int_tensor = |values: &[i64]| {
            Tensor::<B, 1, Int>::from_data(TensorData::new(values.to_vec(), [values.len()]), device)
        };

        Ok(Self {
            x: Tensor::from_data(TensorData::new(x, [num_nodes, num_features]), device),
            edge_sources: int_tensor(&sources),
            edge_targets: int_tensor(&targets),
            edge_labels: int_tensor(&edge_labels),
            node_labels: int_tensor(&node_labels),
            node_graph: int_tensor(&node_graph),
            graph_ptr,
            host_edge_labels: edge_labels,
            host_node_labels: node_labels,
        })
    }

    /// Number of graphs in the batch.
    pub fn num_graphs(&self) -> usize {
        self.graph_ptr.len() - 1
    }

    /// Total number of nodes.
    pub fn num_nodes(&self) -> usize {
        self.host_node_labels.len()
    }

    /// Total number of edges.
    pub fn num_edges(&self) -> usize {
        self.host_edge_labels.len()
    }
}

/// Iterates a subset in batches.
///
/// Without a shuffle seed the order is the subset order. With a seed, epoch
/// `e` uses a permutation drawn from `seed + e`.
#[derive(Debug, Clone)]
pub struct GraphLoader {
    subset: GraphSubset,
    batch_size: usize,
    shuffle_seed: Option<u64>,
}

impl GraphLoader {
    /// Create a loader yielding `batch_size` graphs per batch (at least one).
    pub fn new(subset: GraphSubset, batch_size: usize) -> Self {
        Self {
            subset,
            batch_size: batch_size.max(1),
            shuffle_seed: None,
        }
    }

    /// Shuffle with `seed + epoch` every epoch.
    pub fn with_shuffle_seed(mut self, seed: Option<u64>) -> Self {
        self.shuffle_seed = seed;
        self
    }

    /// Number of batches per epoch.
    pub fn num_batches(&self) -> usize {
        self.subset.len().div_ceil(self.batch_size)
    }

    /// Number of graphs.
    pub fn len(&self) -> usize {
        self.subset.len()
    }

    /// Check if the loader yields nothing.
    pub fn is_empty(&self) -> bool {
        self.subset.is_empty()
    }

    /// Subset positions visited in `epoch`.
    pub fn order(&self, epoch: usize) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.subset.len()).collect();
        if let Some(seed) = self.shuffle_seed {
            let mut rng = StdRng::seed_from_u64(seed.wrapping_add(epoch as u64));
            order.shuffle(&mut rng);
        }
        order
    }

    /// Batches for `epoch`, each loaded and merged when reached.
    pub fn iter<'a, B: Backend>(
        &'a self,
        epoch: usize,
        device: &'a B::Device,
    ) -> impl Iterator<Item = Result<GraphBatch<B>>> + 'a {
        let order = self.order(epoch);
        let chunks: Vec<Vec<usize>> = order
            .chunks(self.batch_size)
            .map(<[usize]>::to_vec)
            .collect();

        chunks.into_iter().map(move |chunk| {
            let records = chunk
                .iter()
                .map(|&position| self.subset.get(position))
                .collect::<Result<Vec<_>>>()?;
            GraphBatch::from_records(&records, device)
        })
    }
}
