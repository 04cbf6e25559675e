use crate::kmeans;
use crate::pq::PqCodebook;
use crate::types::{
    dot, select_neighbors, IvfParams, Metric, Neighbor, PqParams, TrainParams, VectorId,
};
use serde::{Deserialize, Serialize};

/// Inverted-file index: vectors are partitioned under k-means coarse
/// centroids and a search scans only the `nprobe` nearest partitions.
///
/// Partition assignment always uses squared Euclidean distance against the
/// coarse centroids; candidate distances inside a probed partition use the
/// configured metric.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct IvfFlatIndex {
    pub(crate) dim: usize,
    pub(crate) metric: Metric,
    pub(crate) params: IvfParams,
    pub(crate) train_params: TrainParams,
    centroids: Vec<Vec<f32>>,
    list_ids: Vec<Vec<VectorId>>,
    list_vectors: Vec<Vec<Vec<f32>>>,
    count: usize,
}

impl IvfFlatIndex {
    pub(crate) fn new(dim: usize, metric: Metric, params: IvfParams, train: TrainParams) -> Self {
        Self {
            dim,
            metric,
            params,
            train_params: train,
            centroids: Vec::new(),
            list_ids: Vec::new(),
            list_vectors: Vec::new(),
            count: 0,
        }
    }

    pub(crate) fn is_trained(&self) -> bool {
        !self.centroids.is_empty()
    }

    pub(crate) fn len(&self) -> usize {
        self.count
    }

    pub(crate) fn train(&mut self, sample: &[Vec<f32>]) {
        self.centroids = kmeans::train_centroids(
            sample,
            self.params.nlist,
            self.train_params.iterations,
            self.train_params.seed,
        );
        self.list_ids = vec![Vec::new(); self.params.nlist];
        self.list_vectors = vec![Vec::new(); self.params.nlist];
    }

    /// Caller guarantees the index is trained.
    pub(crate) fn add(&mut self, vectors: &[Vec<f32>], ids: &[VectorId]) {
        for (vector, &id) in vectors.iter().zip(ids.iter()) {
            let (list, _) = kmeans::nearest(&self.centroids, vector);
            self.list_ids[list].push(id);
            self.list_vectors[list].push(vector.clone());
            self.count += 1;
        }
    }

    pub(crate) fn search_one(&self, query: &[f32], k: usize) -> Vec<Neighbor> {
        let probes = kmeans::nearest_n(&self.centroids, query, self.params.nprobe);

        let mut candidates = Vec::new();
        for &list in &probes {
            for (&id, vector) in self.list_ids[list].iter().zip(self.list_vectors[list].iter()) {
                candidates.push(Neighbor {
                    id,
                    distance: self.metric.distance(query, vector),
                });
            }
        }
        select_neighbors(candidates, k)
    }
}

/// Composite inverted-file + product-quantization index.
///
/// Vectors are assigned to a coarse partition, then the *residual* against
/// the partition centroid is product-quantized, as faiss does for IVFPQ.
/// A probe rebuilds the distance table per partition: under L2 the residual
/// query against the residual codebook is exact for the reconstruction;
/// under inner product the table is built from the raw query and offset by
/// the query-centroid dot product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct IvfPqIndex {
    pub(crate) dim: usize,
    pub(crate) metric: Metric,
    pub(crate) ivf: IvfParams,
    pub(crate) pq: PqParams,
    pub(crate) train_params: TrainParams,
    centroids: Vec<Vec<f32>>,
    codebook: Option<PqCodebook>,
    list_ids: Vec<Vec<VectorId>>,
    list_codes: Vec<Vec<Vec<u8>>>,
    count: usize,
}

impl IvfPqIndex {
    pub(crate) fn new(
        dim: usize,
        metric: Metric,
        ivf: IvfParams,
        pq: PqParams,
        train: TrainParams,
    ) -> Self {
        Self {
            dim,
            metric,
            ivf,
            pq,
            train_params: train,
            centroids: Vec::new(),
            codebook: None,
            list_ids: Vec::new(),
            list_codes: Vec::new(),
            count: 0,
        }
    }

    pub(crate) fn is_trained(&self) -> bool {
        self.codebook.is_some()
    }

    pub(crate) fn len(&self) -> usize {
        self.count
    }

    pub(crate) fn train(&mut self, sample: &[Vec<f32>]) {
        self.centroids = kmeans::train_centroids(
            sample,
            self.ivf.nlist,
            self.train_params.iterations,
            self.train_params.seed,
        );

        let residuals: Vec<Vec<f32>> = sample
            .iter()
            .map(|vector| {
                let (list, _) = kmeans::nearest(&self.centroids, vector);
                residual(vector, &self.centroids[list])
            })
            .collect();

        self.codebook = Some(PqCodebook::train(
            &residuals,
            self.dim,
            self.pq,
            self.train_params,
        ));
        self.list_ids = vec![Vec::new(); self.ivf.nlist];
        self.list_codes = vec![Vec::new(); self.ivf.nlist];
    }

    /// Caller guarantees the index is trained.
    pub(crate) fn add(&mut self, vectors: &[Vec<f32>], ids: &[VectorId]) {
        let codebook = self.codebook.as_ref().unwrap();
        for (vector, &id) in vectors.iter().zip(ids.iter()) {
            let (list, _) = kmeans::nearest(&self.centroids, vector);
            let code = codebook.encode(&residual(vector, &self.centroids[list]));
            self.list_ids[list].push(id);
            self.list_codes[list].push(code);
            self.count += 1;
        }
    }

    pub(crate) fn search_one(&self, query: &[f32], k: usize) -> Vec<Neighbor> {
        let codebook = self.codebook.as_ref().unwrap();
        let probes = kmeans::nearest_n(&self.centroids, query, self.ivf.nprobe);

        let mut candidates = Vec::new();
        for &list in &probes {
            let centroid = &self.centroids[list];
            let (table, bias) = match self.metric {
                Metric::L2 => {
                    let residual_query = residual(query, centroid);
                    (codebook.distance_table(&residual_query, Metric::L2), 0.0)
                }
                Metric::InnerProduct => (
                    codebook.distance_table(query, Metric::InnerProduct),
                    -dot(query, centroid),
                ),
            };

            for (&id, code) in self.list_ids[list].iter().zip(self.list_codes[list].iter()) {
                candidates.push(Neighbor {
                    id,
                    distance: bias + PqCodebook::lookup(&table, code),
                });
            }
        }
        select_neighbors(candidates, k)
    }
}

fn residual(vector: &[f32], centroid: &[f32]) -> Vec<f32> {
    vector.iter().zip(centroid.iter()).map(|(v, c)| v - c).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NO_ID;

    fn two_blobs() -> Vec<Vec<f32>> {
        let mut points = Vec::new();
        for i in 0..16 {
            let j = i as f32 * 0.01;
            points.push(vec![j, j, 0.0, 0.0]);
            points.push(vec![10.0 + j, 10.0 + j, 10.0, 10.0]);
        }
        points
    }

    #[test]
    fn ivf_single_probe_stays_in_nearest_partition() {
        let sample = two_blobs();
        let mut index = IvfFlatIndex::new(
            4,
            Metric::L2,
            IvfParams {
                nlist: 2,
                nprobe: 1,
            },
            TrainParams::default(),
        );
        index.train(&sample);

        let ids: Vec<VectorId> = (0..sample.len() as VectorId).collect();
        index.add(&sample, &ids);
        assert_eq!(index.len(), sample.len());

        let hits = index.search_one(&[0.0, 0.0, 0.0, 0.0], 4);
        for hit in hits {
            // Even ids are the origin blob.
            assert_eq!(hit.id % 2, 0, "probe leaked into the far partition");
        }
    }

    #[test]
    fn ivf_underfilled_probe_pads() {
        let sample = two_blobs();
        let mut index = IvfFlatIndex::new(
            4,
            Metric::L2,
            IvfParams {
                nlist: 2,
                nprobe: 1,
            },
            TrainParams::default(),
        );
        index.train(&sample);
        // Only two vectors near the origin; a probe there can't fill k=5.
        index.add(&sample[0..1], &[0]);
        index.add(&sample[2..3], &[1]);

        let hits = index.search_one(&[0.0, 0.0, 0.0, 0.0], 5);
        assert_eq!(hits.len(), 5);
        assert!(hits[2..].iter().all(|n| n.id == NO_ID));
    }

    #[test]
    fn ivf_pq_recalls_nearby_blob() {
        let sample = two_blobs();
        let mut index = IvfPqIndex::new(
            4,
            Metric::L2,
            IvfParams {
                nlist: 2,
                nprobe: 2,
            },
            PqParams { m: 2, nbits: 2 },
            TrainParams::default(),
        );
        index.train(&sample);

        let ids: Vec<VectorId> = (0..sample.len() as VectorId).collect();
        index.add(&sample, &ids);

        let hits = index.search_one(&[10.0, 10.0, 10.0, 10.0], 4);
        for hit in hits {
            // Odd ids are the far blob.
            assert_eq!(hit.id % 2, 1, "pq scan surfaced the wrong blob");
        }
    }

    #[test]
    fn ivf_pq_inner_product_prefers_aligned_vectors() {
        let sample = two_blobs();
        let mut index = IvfPqIndex::new(
            4,
            Metric::InnerProduct,
            IvfParams {
                nlist: 2,
                nprobe: 2,
            },
            PqParams { m: 2, nbits: 2 },
            TrainParams::default(),
        );
        index.train(&sample);
        let ids: Vec<VectorId> = (0..sample.len() as VectorId).collect();
        index.add(&sample, &ids);

        let hits = index.search_one(&[1.0, 1.0, 1.0, 1.0], 2);
        // The large blob has a much larger dot product with the query.
        assert_eq!(hits[0].id % 2, 1);
    }
}
