use crate::config::{ChunkStrategy, ChunkerConfig};
use crate::error::{ChunkerError, Result};
use regex::Regex;

/// Splits document text into ordered, non-empty chunks.
///
/// Separators stay attached to the segment they terminate, so concatenating
/// the returned chunks reproduces the input text exactly. Segments longer
/// than `max_len` are bisected at their character midpoint until they fit;
/// this fallback ignores word and sentence boundaries, which is accepted for
/// separator-free runs rather than silently worked around.
pub struct Chunker {
    config: ChunkerConfig,
    separator: Regex,
}

impl Chunker {
    /// Create a chunker, validating the config and compiling the separator
    /// pattern once.
    pub fn new(config: ChunkerConfig) -> Result<Self> {
        config.validate().map_err(ChunkerError::invalid_config)?;

        let pattern = config
            .separators
            .iter()
            .map(|s| regex::escape(s))
            .collect::<Vec<_>>()
            .join("|");
        let separator = Regex::new(&pattern)?;

        Ok(Self { config, separator })
    }

    /// Chunker config
    #[must_use]
    pub const fn config(&self) -> &ChunkerConfig {
        &self.config
    }

    /// Split `text` into chunks according to the configured strategy.
    ///
    /// Malformed or empty input yields an empty vector, never an error.
    /// Chunk order matches document order.
    #[must_use]
    pub fn split(&self, text: &str) -> Vec<String> {
        if text.is_empty() {
            return Vec::new();
        }

        let segments = self.split_segments(text);
        log::debug!(
            "split {} chars into {} segments ({})",
            text.chars().count(),
            segments.len(),
            self.config.strategy
        );

        match self.config.strategy {
            ChunkStrategy::MaxFill => self.accumulate_max(&segments),
            ChunkStrategy::MinFill => self.accumulate_min(&segments),
            ChunkStrategy::Passthrough => {
                segments.into_iter().map(str::to_string).collect()
            }
        }
    }

    /// Split on the separator alternation, keeping each separator attached to
    /// the preceding segment, then bisect anything still over `max_len`.
    fn split_segments<'a>(&self, text: &'a str) -> Vec<&'a str> {
        let mut raw = Vec::new();
        let mut last = 0;
        for m in self.separator.find_iter(text) {
            raw.push(&text[last..m.end()]);
            last = m.end();
        }
        if last < text.len() {
            raw.push(&text[last..]);
        }

        let mut segments = Vec::with_capacity(raw.len());
        for segment in raw {
            if char_len(segment) > self.config.max_len {
                bisect(segment, self.config.max_len, &mut segments);
            } else {
                segments.push(segment);
            }
        }
        segments
    }

    /// Fill each chunk up to `max_len`; flush when the next segment would
    /// overflow.
    fn accumulate_max(&self, segments: &[&str]) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut chunk = String::new();
        let mut chunk_len = 0;

        for segment in segments {
            let segment_len = char_len(segment);
            if chunk_len + segment_len > self.config.max_len && !chunk.is_empty() {
                chunks.push(std::mem::take(&mut chunk));
                chunk_len = 0;
            }
            chunk.push_str(segment);
            chunk_len += segment_len;
        }

        if !chunk.is_empty() {
            chunks.push(chunk);
        }
        chunks
    }

    /// Flush once the running chunk passes `min_len`. If taking the
    /// triggering segment would overflow `max_len`, it starts the next chunk
    /// instead, so finished chunks land in `(min_len, max_len]` whenever the
    /// input allows it.
    fn accumulate_min(&self, segments: &[&str]) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut chunk = String::new();
        let mut chunk_len = 0;

        for segment in segments {
            let segment_len = char_len(segment);
            if chunk_len + segment_len > self.config.min_len {
                if chunk_len + segment_len > self.config.max_len {
                    if !chunk.is_empty() {
                        chunks.push(std::mem::take(&mut chunk));
                    }
                    chunk.push_str(segment);
                    chunk_len = segment_len;
                } else {
                    chunk.push_str(segment);
                    chunks.push(std::mem::take(&mut chunk));
                    chunk_len = 0;
                }
            } else {
                chunk.push_str(segment);
                chunk_len += segment_len;
            }
        }

        if !chunk.is_empty() {
            chunks.push(chunk);
        }
        chunks
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Recursively bisect `segment` at its character midpoint until every piece
/// fits in `max_len`. Depth is bounded by log2(len / max_len).
fn bisect<'a>(segment: &'a str, max_len: usize, out: &mut Vec<&'a str>) {
    let len = char_len(segment);
    if len <= max_len {
        out.push(segment);
        return;
    }

    let mid = len / 2;
    let split_at = segment
        .char_indices()
        .nth(mid)
        .map_or(segment.len(), |(byte, _)| byte);

    bisect(&segment[..split_at], max_len, out);
    bisect(&segment[split_at..], max_len, out);
}
