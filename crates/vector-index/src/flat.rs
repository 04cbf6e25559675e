use crate::types::{select_neighbors, Metric, Neighbor, VectorId};
use serde::{Deserialize, Serialize};

/// Exhaustive scan over every stored vector. Exact distances, O(n) per
/// query, needs no training.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct FlatIndex {
    pub(crate) dim: usize,
    pub(crate) metric: Metric,
    ids: Vec<VectorId>,
    vectors: Vec<Vec<f32>>,
}

impl FlatIndex {
    pub(crate) fn new(dim: usize, metric: Metric) -> Self {
        Self {
            dim,
            metric,
            ids: Vec::new(),
            vectors: Vec::new(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.ids.len()
    }

    pub(crate) fn add(&mut self, vectors: &[Vec<f32>], ids: &[VectorId]) {
        self.ids.extend_from_slice(ids);
        self.vectors.extend(vectors.iter().cloned());
    }

    pub(crate) fn search_one(&self, query: &[f32], k: usize) -> Vec<Neighbor> {
        let candidates = self
            .ids
            .iter()
            .zip(self.vectors.iter())
            .map(|(&id, vector)| Neighbor {
                id,
                distance: self.metric.distance(query, vector),
            })
            .collect();
        select_neighbors(candidates, k)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NO_ID;

    #[test]
    fn scan_orders_by_distance() {
        let mut index = FlatIndex::new(2, Metric::L2);
        index.add(
            &[vec![0.0, 0.0], vec![3.0, 0.0], vec![1.0, 0.0]],
            &[0, 1, 2],
        );

        let hits = index.search_one(&[0.9, 0.0], 3);
        assert_eq!(hits[0].id, 2);
        assert_eq!(hits[1].id, 0);
        assert_eq!(hits[2].id, 1);
    }

    #[test]
    fn short_index_pads_results() {
        let mut index = FlatIndex::new(1, Metric::L2);
        index.add(&[vec![1.0]], &[0]);

        let hits = index.search_one(&[1.0], 4);
        assert_eq!(hits.len(), 4);
        assert_eq!(hits[0].id, 0);
        assert!(hits[1..].iter().all(|n| n.id == NO_ID));
    }
}
