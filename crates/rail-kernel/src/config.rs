//! Simulation timing and retry configuration.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::LayoutError;

/// Top-level simulation configuration.
///
/// Every field has a default, so `{}` is a valid config file.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Path locking retry and backoff
    pub locking: LockingConfig,

    /// Movement pacing
    pub movement: MovementConfig,

    /// Seed for backoff jitter. Each train derives its own stream from it;
    /// `None` draws a fresh seed per train.
    pub seed: Option<u64>,
}

/// How hard a train tries before abandoning a locking pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockingConfig {
    /// Lock requests per component before the pass is abandoned
    pub retry_limit: u32,

    /// Wait between requests for the same component (milliseconds)
    pub retry_delay_ms: u64,

    /// Minimum wait before restarting an abandoned pass (milliseconds)
    pub backoff_min_ms: u64,

    /// Random extra wait added to the backoff, drawn from `0..jitter`
    pub backoff_jitter_ms: u64,
}

/// Movement pacing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    /// Time spent on each intermediate step (milliseconds)
    pub step_delay_ms: u64,
}

impl Default for LockingConfig {
    fn default() -> Self {
        Self {
            retry_limit: 3,
            retry_delay_ms: 500,
            backoff_min_ms: 500,
            backoff_jitter_ms: 1000,
        }
    }
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self { step_delay_ms: 250 }
    }
}

impl SimulationConfig {
    /// Parse and validate a JSON config.
    pub fn from_json(json: &str) -> Result<Self, LayoutError> {
        let config: SimulationConfig =
            serde_json::from_str(json).map_err(|e| LayoutError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Short delays for tests and demos: same protocol, millisecond waits.
    pub fn fast() -> Self {
        Self {
            locking: LockingConfig {
                retry_limit: 3,
                retry_delay_ms: 5,
                backoff_min_ms: 5,
                backoff_jitter_ms: 10,
            },
            movement: MovementConfig { step_delay_ms: 2 },
            seed: None,
        }
    }

    /// Swap in the `fast()` delays, keeping everything else.
    pub fn with_fast_timing(self) -> Self {
        let fast = Self::fast();
        Self {
            locking: LockingConfig {
                retry_limit: self.locking.retry_limit,
                ..fast.locking
            },
            movement: fast.movement,
            ..self
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> Result<(), LayoutError> {
        if self.locking.retry_limit == 0 {
            return Err(LayoutError::Config(
                "locking.retry_limit must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn lock_retry_delay(&self) -> Duration {
        Duration::from_millis(self.locking.retry_delay_ms)
    }

    /// Randomized wait before restarting a locking pass.
    pub fn backoff<R: Rng>(&self, rng: &mut R) -> Duration {
        let jitter = if self.locking.backoff_jitter_ms > 0 {
            rng.random_range(0..self.locking.backoff_jitter_ms)
        } else {
            0
        };
        Duration::from_millis(self.locking.backoff_min_ms.saturating_add(jitter))
    }

    pub fn step_delay(&self) -> Duration {
        Duration::from_millis(self.movement.step_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_defaults() {
        let config = SimulationConfig::default();
        assert_eq!(config.locking.retry_limit, 3);
        assert_eq!(config.lock_retry_delay(), Duration::from_millis(500));
        assert_eq!(config.step_delay(), Duration::from_millis(250));
        assert_eq!(config.seed, None);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config =
            SimulationConfig::from_json(r#"{"locking": {"retry_limit": 5}, "seed": 7}"#).unwrap();
        assert_eq!(config.locking.retry_limit, 5);
        assert_eq!(config.locking.backoff_min_ms, 500);
        assert_eq!(config.movement.step_delay_ms, 250);
        assert_eq!(config.seed, Some(7));
    }

    #[test]
    fn test_invalid_json_rejected() {
        assert!(matches!(
            SimulationConfig::from_json(r#"{"locking": {"retry_limit": 0}}"#),
            Err(LayoutError::Config(_))
        ));
        assert!(SimulationConfig::from_json("not json").is_err());
    }

    #[test]
    fn test_backoff_within_bounds() {
        let config = SimulationConfig::default();
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        for _ in 0..100 {
            let wait = config.backoff(&mut rng);
            assert!(wait >= Duration::from_millis(500));
            assert!(wait < Duration::from_millis(1500));
        }
    }

    #[test]
    fn test_backoff_without_jitter() {
        let mut config = SimulationConfig::fast();
        config.locking.backoff_jitter_ms = 0;
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert_eq!(config.backoff(&mut rng), Duration::from_millis(5));
    }

    #[test]
    fn test_backoff_saturates() {
        let mut config = SimulationConfig::default();
        config.locking.backoff_min_ms = u64::MAX;
        config.locking.backoff_jitter_ms = 10;
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for _ in 0..20 {
            assert_eq!(config.backoff(&mut rng), Duration::from_millis(u64::MAX));
        }
    }

    #[test]
    fn test_fast_timing_keeps_loaded_settings() {
        let loaded =
            SimulationConfig::from_json(r#"{"locking": {"retry_limit": 5}, "seed": 42}"#).unwrap();
        let config = loaded.with_fast_timing();

        assert_eq!(config.seed, Some(42));
        assert_eq!(config.locking.retry_limit, 5);
        assert_eq!(config.lock_retry_delay(), SimulationConfig::fast().lock_retry_delay());
        assert_eq!(config.locking.backoff_min_ms, 5);
        assert_eq!(config.step_delay(), Duration::from_millis(2));
    }
}
