use crate::kmeans;
use crate::types::{select_neighbors, Metric, Neighbor, PqParams, TrainParams, VectorId};
use serde::{Deserialize, Serialize};

/// Per-subspace centroid tables learned from a training sample.
///
/// A vector of dimension `d` is cut into `m` contiguous subspaces of
/// `d / m` components; each subspace is encoded as the index of its nearest
/// centroid. Search never decodes: it sums per-subspace distances out of a
/// query-specific lookup table (asymmetric distance computation).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct PqCodebook {
    m: usize,
    dsub: usize,
    /// `[m][codebook_size][dsub]`
    centroids: Vec<Vec<Vec<f32>>>,
}

impl PqCodebook {
    /// Train one k-means codebook per subspace. The seed is offset per
    /// subspace so the codebooks are independent but still reproducible.
    pub(crate) fn train(
        sample: &[Vec<f32>],
        dim: usize,
        params: PqParams,
        train: TrainParams,
    ) -> Self {
        let dsub = dim / params.m;
        let centroids = (0..params.m)
            .map(|sub| {
                let span = sub * dsub..(sub + 1) * dsub;
                let slice: Vec<Vec<f32>> =
                    sample.iter().map(|v| v[span.clone()].to_vec()).collect();
                kmeans::train_centroids(
                    &slice,
                    params.codebook_size(),
                    train.iterations,
                    train.seed.wrapping_add(sub as u64),
                )
            })
            .collect();

        Self {
            m: params.m,
            dsub,
            centroids,
        }
    }

    pub(crate) fn encode(&self, vector: &[f32]) -> Vec<u8> {
        (0..self.m)
            .map(|sub| {
                let span = &vector[sub * self.dsub..(sub + 1) * self.dsub];
                kmeans::nearest(&self.centroids[sub], span).0 as u8
            })
            .collect()
    }

    /// `table[sub][code]`: the distance contribution of each centroid of
    /// each subspace against `query`. Summing one entry per subspace gives
    /// the distance between the query and a reconstructed stored vector.
    pub(crate) fn distance_table(&self, query: &[f32], metric: Metric) -> Vec<Vec<f32>> {
        (0..self.m)
            .map(|sub| {
                let span = &query[sub * self.dsub..(sub + 1) * self.dsub];
                self.centroids[sub]
                    .iter()
                    .map(|centroid| metric.distance(span, centroid))
                    .collect()
            })
            .collect()
    }

    pub(crate) fn lookup(table: &[Vec<f32>], code: &[u8]) -> f32 {
        table
            .iter()
            .zip(code.iter())
            .map(|(row, &c)| row[c as usize])
            .sum()
    }
}

/// Product-quantized index: stores compact codes instead of full vectors and
/// scans them all with a per-query distance table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct PqIndex {
    pub(crate) dim: usize,
    pub(crate) metric: Metric,
    pub(crate) params: PqParams,
    pub(crate) train_params: TrainParams,
    codebook: Option<PqCodebook>,
    ids: Vec<VectorId>,
    codes: Vec<Vec<u8>>,
}

impl PqIndex {
    pub(crate) fn new(dim: usize, metric: Metric, params: PqParams, train: TrainParams) -> Self {
        Self {
            dim,
            metric,
            params,
            train_params: train,
            codebook: None,
            ids: Vec::new(),
            codes: Vec::new(),
        }
    }

    pub(crate) fn is_trained(&self) -> bool {
        self.codebook.is_some()
    }

    pub(crate) fn len(&self) -> usize {
        self.ids.len()
    }

    pub(crate) fn train(&mut self, sample: &[Vec<f32>]) {
        self.codebook = Some(PqCodebook::train(
            sample,
            self.dim,
            self.params,
            self.train_params,
        ));
    }

    /// Caller guarantees the index is trained.
    pub(crate) fn add(&mut self, vectors: &[Vec<f32>], ids: &[VectorId]) {
        let codebook = self.codebook.as_ref().unwrap();
        for (vector, &id) in vectors.iter().zip(ids.iter()) {
            self.ids.push(id);
            self.codes.push(codebook.encode(vector));
        }
    }

    pub(crate) fn search_one(&self, query: &[f32], k: usize) -> Vec<Neighbor> {
        let codebook = self.codebook.as_ref().unwrap();
        let table = codebook.distance_table(query, self.metric);

        let candidates = self
            .ids
            .iter()
            .zip(self.codes.iter())
            .map(|(&id, code)| Neighbor {
                id,
                distance: PqCodebook::lookup(&table, code),
            })
            .collect();
        select_neighbors(candidates, k)
    }
}
