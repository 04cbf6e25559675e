use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default lower bound for min-fill accumulation (characters)
pub const DEFAULT_MIN_LEN: usize = 10;

/// Default hard upper bound on chunk length (characters)
pub const DEFAULT_MAX_LEN: usize = 450;

/// Configuration for document chunking behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkerConfig {
    /// Separator patterns, tried as one alternation. Each separator stays
    /// attached to the segment it terminates.
    pub separators: Vec<String>,

    /// Minimum chunk size in characters (min-fill flush threshold)
    pub min_len: usize,

    /// Maximum chunk size in characters (hard limit)
    pub max_len: usize,

    /// Accumulation strategy
    pub strategy: ChunkStrategy,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            separators: vec!["\n".to_string(), "。".to_string()],
            min_len: DEFAULT_MIN_LEN,
            max_len: DEFAULT_MAX_LEN,
            strategy: ChunkStrategy::MaxFill,
        }
    }
}

impl ChunkerConfig {
    /// Config with the given strategy and default bounds/separators
    #[must_use]
    pub fn with_strategy(strategy: ChunkStrategy) -> Self {
        Self {
            strategy,
            ..Default::default()
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_len == 0 {
            return Err("max_len must be > 0".to_string());
        }

        if self.min_len >= self.max_len {
            return Err(format!(
                "min_len ({}) must be smaller than max_len ({})",
                self.min_len, self.max_len
            ));
        }

        if self.separators.is_empty() {
            return Err("at least one separator is required".to_string());
        }

        if self.separators.iter().any(String::is_empty) {
            return Err("separators must be non-empty".to_string());
        }

        Ok(())
    }
}

/// Strategy for accumulating split segments into chunks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkStrategy {
    /// Fill each chunk as close to `max_len` as possible before flushing.
    /// Produces the fewest, largest chunks.
    MaxFill,

    /// Flush as soon as the running chunk passes `min_len`, still capped at
    /// `max_len`. Produces many small chunks in `(min_len, max_len]`.
    MinFill,

    /// Every split segment becomes its own chunk, verbatim.
    Passthrough,
}

impl ChunkStrategy {
    /// Stable tag used in persisted artifact file names
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MaxFill => "max",
            Self::MinFill => "min",
            Self::Passthrough => "single",
        }
    }
}

impl fmt::Display for ChunkStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChunkStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "max" => Ok(Self::MaxFill),
            "min" => Ok(Self::MinFill),
            "single" => Ok(Self::Passthrough),
            other => Err(format!("unknown chunk strategy: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_valid() {
        assert!(ChunkerConfig::default().validate().is_ok());
    }

    #[test]
    fn config_validation() {
        let mut config = ChunkerConfig::default();

        config.max_len = 0;
        assert!(config.validate().is_err());

        config.max_len = 100;
        config.min_len = 100;
        assert!(config.validate().is_err());

        config.min_len = 10;
        config.separators.clear();
        assert!(config.validate().is_err());

        config.separators = vec!["\n".to_string()];
        assert!(config.validate().is_ok());
    }

    #[test]
    fn strategy_tags_round_trip() {
        for strategy in [
            ChunkStrategy::MaxFill,
            ChunkStrategy::MinFill,
            ChunkStrategy::Passthrough,
        ] {
            assert_eq!(strategy.as_str().parse::<ChunkStrategy>(), Ok(strategy));
        }
        assert!("avg".parse::<ChunkStrategy>().is_err());
    }
}
