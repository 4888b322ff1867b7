use crate::error::MsmError;
use serde::{Deserialize, Serialize};
use std::{fs::File, io::BufReader, path::Path};

/// Largest power-of-two batch with a precomputed Pippenger shape.
pub const MAX_PIPPENGER_LOG2: u32 = 20;
/// Smallest power-of-two batch with a precomputed Pippenger shape.
pub const MIN_PIPPENGER_LOG2: u32 = 2;

/// Tuning knobs for the MSM driver.
///
/// Read from the same kind of JSON files as the ones under `configs/bn254/`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MsmConfig {
    /// Batches with at most `max(min_naive_threshold, naive_points_per_thread * threads)` pairs
    /// skip Pippenger
    pub min_naive_threshold: usize,
    pub naive_points_per_thread: usize,
    /// Largest Pippenger call is `2^max_pippenger_log2` pairs; bigger batches are chunked
    pub max_pippenger_log2: u32,
}

impl Default for MsmConfig {
    fn default() -> Self {
        Self {
            min_naive_threshold: 8,
            naive_points_per_thread: 8,
            max_pippenger_log2: MAX_PIPPENGER_LOG2,
        }
    }
}

impl MsmConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, MsmError> {
        let config: Self = serde_json::from_reader(BufReader::new(File::open(path)?))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), MsmError> {
        // below 4 pairs a Pippenger call would have shards with no populated buckets
        if self.min_naive_threshold < 1 << MIN_PIPPENGER_LOG2 {
            return Err(MsmError::InvalidConfig(format!(
                "min_naive_threshold must be at least {}, got {}",
                1 << MIN_PIPPENGER_LOG2,
                self.min_naive_threshold
            )));
        }
        if !(MIN_PIPPENGER_LOG2..=MAX_PIPPENGER_LOG2).contains(&self.max_pippenger_log2) {
            return Err(MsmError::InvalidConfig(format!(
                "max_pippenger_log2 must be in [{MIN_PIPPENGER_LOG2}, {MAX_PIPPENGER_LOG2}], got {}",
                self.max_pippenger_log2
            )));
        }
        Ok(())
    }

    /// Number of pairs at or below which the naive path is taken.
    pub fn naive_threshold(&self, num_threads: usize) -> usize {
        self.min_naive_threshold.max(self.naive_points_per_thread.saturating_mul(num_threads))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = MsmConfig::default();
        config.validate().unwrap();
        assert_eq!(config.naive_threshold(1), 8);
        assert_eq!(config.naive_threshold(16), 128);
    }

    #[test]
    fn test_read_config_file() {
        let path = "configs/bn254/msm.config";
        let config = MsmConfig::from_file(path)
            .unwrap_or_else(|e| panic!("{path} could not be read: {e:?}"));
        assert_eq!(config, MsmConfig::default());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: MsmConfig = serde_json::from_str(r#"{"max_pippenger_log2": 12}"#).unwrap();
        assert_eq!(config.max_pippenger_log2, 12);
        assert_eq!(config.min_naive_threshold, 8);
    }

    #[test]
    fn test_reject_bad_config() {
        let mut config = MsmConfig { min_naive_threshold: 2, ..Default::default() };
        assert!(matches!(config.validate(), Err(MsmError::InvalidConfig(_))));
        config.min_naive_threshold = 8;
        config.max_pippenger_log2 = 21;
        assert!(matches!(config.validate(), Err(MsmError::InvalidConfig(_))));
    }
}
