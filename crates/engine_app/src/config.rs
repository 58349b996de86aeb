//! Simulation configuration.

use std::path::PathBuf;

use anyhow::ensure;
use engine_entity::TickConfig;

/// Configuration for one simulation run.
#[derive(Debug, Clone, PartialEq)]
pub struct SimConfig {
    /// Target ticks per second.
    pub tick_rate: f64,
    /// Ticks to run before exiting.
    pub ticks: u64,
    /// Entities spawned at start-up, besides the player.
    pub population: usize,
    /// A snapshot is sent to the mirror every this many ticks.
    pub snapshot_interval: u64,
    /// Where class ids are persisted between runs. Ids are not kept when unset.
    pub class_map: Option<PathBuf>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tick_rate: 60.0,
            ticks: 600,
            population: 32,
            snapshot_interval: 30,
            class_map: None,
        }
    }
}

impl SimConfig {
    /// Override the tick rate.
    #[must_use]
    pub fn with_tick_rate(mut self, tick_rate: f64) -> Self {
        self.tick_rate = tick_rate;
        self
    }

    /// Override the number of ticks.
    #[must_use]
    pub fn with_ticks(mut self, ticks: u64) -> Self {
        self.ticks = ticks;
        self
    }

    /// Override the start-up population.
    #[must_use]
    pub fn with_population(mut self, population: usize) -> Self {
        self.population = population;
        self
    }

    /// Override the snapshot interval.
    #[must_use]
    pub fn with_snapshot_interval(mut self, interval: u64) -> Self {
        self.snapshot_interval = interval;
        self
    }

    /// Persist class ids at `path`.
    #[must_use]
    pub fn with_class_map(mut self, path: impl Into<PathBuf>) -> Self {
        self.class_map = Some(path.into());
        self
    }

    /// Reject settings the tick loop cannot run with.
    ///
    /// # Errors
    ///
    /// Fails for a non-positive tick rate or a zero tick count or interval.
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            self.tick_rate.is_finite() && self.tick_rate > 0.0,
            "tick rate must be positive, got {}",
            self.tick_rate
        );
        ensure!(self.ticks > 0, "tick count must be at least 1");
        ensure!(self.snapshot_interval > 0, "snapshot interval must be at least 1");
        Ok(())
    }

    /// The loop configuration for this run.
    #[must_use]
    pub fn tick_config(&self) -> TickConfig {
        TickConfig {
            tick_rate: self.tick_rate,
            max_ticks: self.ticks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_and_tick_config() {
        let config = SimConfig::default()
            .with_tick_rate(20.0)
            .with_ticks(5)
            .with_population(3)
            .with_snapshot_interval(2)
            .with_class_map("ids.json");
        assert!(config.validate().is_ok());
        assert_eq!(config.class_map, Some(PathBuf::from("ids.json")));
        let tick = config.tick_config();
        assert_eq!(tick.tick_rate, 20.0);
        assert_eq!(tick.max_ticks, 5);
    }

    #[test]
    fn test_validate_rejects_unrunnable_settings() {
        assert!(SimConfig::default().with_tick_rate(0.0).validate().is_err());
        assert!(SimConfig::default().with_tick_rate(f64::NAN).validate().is_err());
        assert!(SimConfig::default().with_ticks(0).validate().is_err());
        assert!(SimConfig::default().with_snapshot_interval(0).validate().is_err());
    }
}
