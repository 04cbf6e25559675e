use crate::types::l2_sq;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Lloyd's k-means with seeded initialization.
///
/// Assignment always uses squared Euclidean distance, matching the coarse
/// quantizer of the indexes that call this. Callers guarantee
/// `data.len() >= k` and `k >= 1`.
pub(crate) fn train_centroids(
    data: &[Vec<f32>],
    k: usize,
    iterations: usize,
    seed: u64,
) -> Vec<Vec<f32>> {
    let dim = data[0].len();
    let mut rng = StdRng::seed_from_u64(seed);

    let mut centroids: Vec<Vec<f32>> = rand::seq::index::sample(&mut rng, data.len(), k)
        .into_iter()
        .map(|i| data[i].clone())
        .collect();

    let mut assignment = vec![0usize; data.len()];

    for round in 0..iterations {
        let mut changed = false;
        for (i, point) in data.iter().enumerate() {
            let (best, _) = nearest(&centroids, point);
            if assignment[i] != best {
                assignment[i] = best;
                changed = true;
            }
        }
        if !changed && round > 0 {
            break;
        }

        let mut sums = vec![vec![0.0f32; dim]; k];
        let mut counts = vec![0usize; k];
        for (point, &cluster) in data.iter().zip(assignment.iter()) {
            counts[cluster] += 1;
            for (sum, value) in sums[cluster].iter_mut().zip(point.iter()) {
                *sum += value;
            }
        }

        for cluster in 0..k {
            if counts[cluster] == 0 {
                centroids[cluster] = reseed_empty(data, &assignment, &centroids, &counts);
            } else {
                centroids[cluster] = sums[cluster]
                    .iter()
                    .map(|sum| sum / counts[cluster] as f32)
                    .collect();
            }
        }
    }

    centroids
}

/// Index and squared distance of the centroid closest to `point`.
pub(crate) fn nearest(centroids: &[Vec<f32>], point: &[f32]) -> (usize, f32) {
    let mut best = 0;
    let mut best_dist = f32::MAX;
    for (i, centroid) in centroids.iter().enumerate() {
        let dist = l2_sq(centroid, point);
        if dist < best_dist {
            best = i;
            best_dist = dist;
        }
    }
    (best, best_dist)
}

/// Centroid indexes of the `n` partitions closest to `point`, nearest first.
pub(crate) fn nearest_n(centroids: &[Vec<f32>], point: &[f32], n: usize) -> Vec<usize> {
    let mut ranked: Vec<(usize, f32)> = centroids
        .iter()
        .enumerate()
        .map(|(i, centroid)| (i, l2_sq(centroid, point)))
        .collect();
    ranked.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
    ranked.truncate(n);
    ranked.into_iter().map(|(i, _)| i).collect()
}

/// Replacement centroid for an empty cluster: the member of the largest
/// cluster farthest from its own centroid. Deterministic, so training stays
/// reproducible under a fixed seed.
fn reseed_empty(
    data: &[Vec<f32>],
    assignment: &[usize],
    centroids: &[Vec<f32>],
    counts: &[usize],
) -> Vec<f32> {
    let largest = counts
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(&a.0)))
        .map(|(cluster, _)| cluster)
        .unwrap_or(0);

    let mut farthest = 0;
    let mut farthest_dist = -1.0f32;
    for (i, point) in data.iter().enumerate() {
        if assignment[i] != largest {
            continue;
        }
        let dist = l2_sq(&centroids[largest], point);
        if dist > farthest_dist {
            farthest = i;
            farthest_dist = dist;
        }
    }
    data[farthest].clone()
}
