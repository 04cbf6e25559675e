use ragprobe_chunker::ChunkStrategy;
use ragprobe_vector_index::IndexKind;
use std::path::{Path, PathBuf};

/// `{dir}/{strategy}_chunks.json`
#[must_use]
pub fn chunk_table_path(dir: &Path, strategy: ChunkStrategy) -> PathBuf {
    dir.join(format!("{strategy}_chunks.json"))
}

/// `{dir}/{strategy}_{kind}_index`
#[must_use]
pub fn index_path(dir: &Path, strategy: ChunkStrategy, kind: IndexKind) -> PathBuf {
    dir.join(format!("{strategy}_{kind}_index"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artifact_names_follow_the_tag_convention() {
        let dir = Path::new("/data/out");
        assert_eq!(
            chunk_table_path(dir, ChunkStrategy::MaxFill),
            Path::new("/data/out/max_chunks.json")
        );
        assert_eq!(
            index_path(dir, ChunkStrategy::MinFill, IndexKind::IvfPq),
            Path::new("/data/out/min_ivf_pq_index")
        );
        assert_eq!(
            index_path(dir, ChunkStrategy::Passthrough, IndexKind::Flat),
            Path::new("/data/out/single_flat_index")
        );
    }
}
