use crate::error::Result;
use async_trait::async_trait;

/// Default output dimension of the stub embedder
pub const DEFAULT_DIMENSION: usize = 384;

/// Text → fixed-length vector capability.
///
/// The model behind this seam is a black box: any implementation must
/// produce the same vector for the same text, with every vector exactly
/// `dimension()` long. Batch-oriented so backends can amortize per-call
/// overhead.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Fixed output dimension of every embedding
    fn dimension(&self) -> usize;

    /// Embed a batch of texts, one vector per input, in input order
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Deterministic hash-projection embedder.
///
/// Seeds a splitmix64 stream from a hash of the text and unrolls it into a
/// unit-normalized vector. Identical text always maps to the identical
/// vector, so exercising the chunk → index → search plumbing needs no model
/// download; the vectors carry no semantics at all.
#[derive(Debug, Clone, Copy)]
pub struct HashEmbedder {
    dimension: usize,
}

impl HashEmbedder {
    #[must_use]
    pub const fn new(dimension: usize) -> Self {
        Self { dimension }
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSION)
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|text| hash_embed(text, self.dimension))
            .collect())
    }
}

fn hash_embed(text: &str, dimension: usize) -> Vec<f32> {
    let mut state =
        fnv1a_64(text.as_bytes()) ^ (dimension as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    let mut vector = Vec::with_capacity(dimension);
    for _ in 0..dimension {
        let bits = splitmix64(&mut state);
        let high = (bits >> 32) as u32;
        // Top 23 bits become a mantissa in [1, 2); shift to [-1, 1).
        let unit = f32::from_bits(0x3f80_0000 | (high >> 9)) - 1.0;
        vector.push(unit.mul_add(2.0, -1.0));
    }
    normalize(&mut vector);
    vector
}

fn normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm == 0.0 {
        return;
    }
    for value in vector {
        *value /= norm;
    }
}

fn fnv1a_64(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in bytes {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

const fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn identical_text_embeds_identically() {
        let embedder = HashEmbedder::new(32);
        let texts = vec!["the same text".to_string(), "the same text".to_string()];
        let vectors = embedder.embed(&texts).await.unwrap();
        assert_eq!(vectors[0], vectors[1]);

        let again = embedder.embed(&texts[..1]).await.unwrap();
        assert_eq!(again[0], vectors[0]);
    }

    #[tokio::test]
    async fn different_text_embeds_differently() {
        let embedder = HashEmbedder::new(32);
        let texts = vec!["alpha".to_string(), "beta".to_string()];
        let vectors = embedder.embed(&texts).await.unwrap();
        assert_ne!(vectors[0], vectors[1]);
    }

    #[tokio::test]
    async fn output_is_unit_normalized() {
        let embedder = HashEmbedder::default();
        let vectors = embedder
            .embed(&["some document text".to_string()])
            .await
            .unwrap();

        assert_eq!(vectors[0].len(), DEFAULT_DIMENSION);
        let norm: f32 = vectors[0].iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }
}
