use crate::error::{RetrievalError, Result};
use ragprobe_vector_index::VectorId;
use std::path::Path;

/// Ordered chunk texts, addressed by the id their vectors carry in the
/// index.
///
/// Persisted as a bare JSON array of strings whose array position IS the
/// vector id; the table is only ever written together with its index (see
/// `RetrievalStore`), which is what keeps the positional coupling sound.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkTable {
    chunks: Vec<String>,
}

impl ChunkTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_chunks(chunks: Vec<String>) -> Self {
        Self { chunks }
    }

    /// Chunk text under `id`, if the id names a stored chunk
    #[must_use]
    pub fn get(&self, id: VectorId) -> Option<&str> {
        let index = usize::try_from(id).ok()?;
        self.chunks.get(index).map(String::as_str)
    }

    pub fn push(&mut self, chunk: String) {
        self.chunks.push(chunk);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.chunks.iter()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.chunks
    }

    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let bytes = serde_json::to_vec_pretty(&self.chunks)?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, path).await?;
        log::info!("saved {} chunks to {path:?}", self.len());
        Ok(())
    }

    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let chunks: Vec<String> = serde_json::from_slice(&bytes)
            .map_err(|err| RetrievalError::corrupt(format!("{path:?}: {err}")))?;
        log::info!("loaded {} chunks from {path:?}", chunks.len());
        Ok(Self { chunks })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn lookup_by_position() {
        let table = ChunkTable::from_chunks(vec!["first".to_string(), "second".to_string()]);
        assert_eq!(table.get(0), Some("first"));
        assert_eq!(table.get(1), Some("second"));
        assert_eq!(table.get(2), None);
        assert_eq!(table.get(-1), None);
    }

    #[tokio::test]
    async fn round_trips_as_a_bare_json_array() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("max_chunks.json");

        let table = ChunkTable::from_chunks(vec!["a\n".to_string(), "第二句。".to_string()]);
        table.save(&path).await.unwrap();

        // The on-disk shape is a plain array, nothing wrapped around it.
        let raw: Vec<String> =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(raw, vec!["a\n", "第二句。"]);

        let reloaded = ChunkTable::load(&path).await.unwrap();
        assert_eq!(reloaded, table);
    }

    #[tokio::test]
    async fn malformed_file_is_corrupt() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("max_chunks.json");
        std::fs::write(&path, "{\"not\": \"an array\"}").unwrap();

        assert!(matches!(
            ChunkTable::load(&path).await,
            Err(RetrievalError::StoreCorrupt(_))
        ));
    }
}
