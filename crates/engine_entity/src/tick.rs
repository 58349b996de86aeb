//! Fixed-timestep simulation loop.
//!
//! Each tick:
//!
//! 1. Apply every operation queued in the remote inbox.
//! 2. Run one update pass over the added entities.
//! 3. Advance the tick counter.
//!
//! Remote operations are applied only at step 1, so they never interleave
//! with an update pass.

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::error::InvalidTickRate;
use crate::groups::EntityGroups;
use crate::inbox::RemoteInbox;

/// Configuration for the tick loop.
#[derive(Debug, Clone)]
pub struct TickConfig {
    /// Target ticks per second.
    pub tick_rate: f64,
    /// Maximum number of ticks to run (0 = unlimited).
    pub max_ticks: u64,
}

impl TickConfig {
    /// Wall-clock length of one tick.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidTickRate`] unless `tick_rate` is positive, finite and
    /// yields a representable [`Duration`].
    pub fn tick_duration(&self) -> Result<Duration, InvalidTickRate> {
        if !(self.tick_rate.is_finite() && self.tick_rate > 0.0) {
            return Err(InvalidTickRate(self.tick_rate));
        }
        Duration::try_from_secs_f64(1.0 / self.tick_rate).map_err(|_| InvalidTickRate(self.tick_rate))
    }
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            tick_rate: 60.0,
            max_ticks: 0,
        }
    }
}

/// The simulation's tick loop state.
#[derive(Debug)]
pub struct TickLoop {
    /// Number of completed ticks.
    tick_id: u64,
    /// Tick configuration.
    config: TickConfig,
    /// Validated length of one tick.
    tick_duration: Duration,
    /// The simulated entities.
    groups: EntityGroups,
    /// Operations handed over from other contexts.
    inbox: Option<RemoteInbox>,
}

impl TickLoop {
    /// Create a tick loop over a group manager.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidTickRate`] if the configured rate is not usable.
    pub fn new(config: TickConfig, groups: EntityGroups) -> Result<Self, InvalidTickRate> {
        let tick_duration = config.tick_duration()?;
        Ok(Self {
            tick_id: 0,
            config,
            tick_duration,
            groups,
            inbox: None,
        })
    }

    /// Drain `inbox` at the start of every tick.
    #[must_use]
    pub fn with_inbox(mut self, inbox: RemoteInbox) -> Self {
        self.inbox = Some(inbox);
        self
    }

    /// Returns the number of completed ticks.
    #[must_use]
    pub fn tick_id(&self) -> u64 {
        self.tick_id
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &TickConfig {
        &self.config
    }

    /// Returns the group manager.
    #[must_use]
    pub fn groups(&self) -> &EntityGroups {
        &self.groups
    }

    /// Returns the group manager for mutation between ticks.
    pub fn groups_mut(&mut self) -> &mut EntityGroups {
        &mut self.groups
    }

    /// Run one tick.
    pub fn tick(&mut self, dt: f64) {
        let applied = self
            .inbox
            .as_mut()
            .map_or(0, |inbox| inbox.drain_into(&mut self.groups));

        #[allow(clippy::cast_possible_truncation)]
        let step = dt as f32;
        self.groups.update(step);
        self.tick_id += 1;

        debug!(
            tick_id = self.tick_id,
            dt,
            applied,
            entities = self.groups.len(),
            "tick complete"
        );
    }

    /// Run the loop for the configured number of ticks, or indefinitely.
    ///
    /// Blocks the calling thread.
    pub fn run(&mut self) {
        self.run_with(|_| {});
    }

    /// Like [`run`](Self::run), calling `after_tick` once after every tick.
    pub fn run_with(&mut self, mut after_tick: impl FnMut(&mut Self)) {
        let tick_duration = self.tick_duration;
        let mut tick_count = 0u64;

        info!(
            tick_rate = self.config.tick_rate,
            max_ticks = self.config.max_ticks,
            "starting tick loop"
        );

        loop {
            let start = Instant::now();

            self.tick(tick_duration.as_secs_f64());
            after_tick(self);

            tick_count += 1;
            if self.config.max_ticks > 0 && tick_count >= self.config.max_ticks {
                info!(ticks = tick_count, entities = self.groups.len(), "tick loop complete");
                break;
            }

            let elapsed = start.elapsed();
            if elapsed < tick_duration {
                std::thread::sleep(tick_duration - elapsed);
            } else {
                warn!(
                    tick_id = self.tick_id,
                    elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
                    budget_ms = u64::try_from(tick_duration.as_millis()).unwrap_or(u64::MAX),
                    "tick exceeded time budget"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use engine_component::FieldAccess;

    use super::*;
    use crate::inbox::{RemoteOp, remote_channel};
    use crate::instance::EntityInstance;
    use crate::testkit;

    #[test]
    fn test_tick_advances_counter_and_updates() {
        let mut groups = EntityGroups::new(testkit::registry());
        let unit = groups.create("unit").unwrap();
        groups.add(unit);

        let mut tick_loop = TickLoop::new(TickConfig::default(), groups).unwrap();
        assert_eq!(tick_loop.tick_id(), 0);
        tick_loop.tick(0.25);
        tick_loop.tick(0.25);
        assert_eq!(tick_loop.tick_id(), 2);
        assert_eq!(tick_loop.groups().get(unit).unwrap().fields().float("age"), 0.5);
    }

    #[test]
    fn test_inbox_drained_before_update() {
        let groups = EntityGroups::new(testkit::registry());
        let registry = Arc::clone(groups.registry());
        let (tx, inbox) = remote_channel();
        let mut tick_loop = TickLoop::new(TickConfig::default(), groups)
            .unwrap()
            .with_inbox(inbox);

        let id = tick_loop.groups().ids().allocate();
        tx.send(RemoteOp::Spawn(Box::new(EntityInstance::new(
            id,
            Arc::clone(registry.kind("unit").unwrap()),
        ))))
        .unwrap();

        tick_loop.tick(0.5);
        let unit = tick_loop.groups().get(id).unwrap();
        assert!(unit.is_added());
        // Applied at the tick boundary, so it was updated in the same tick.
        assert_eq!(unit.fields().float("age"), 0.5);
    }

    #[test]
    fn test_run_limited_ticks() {
        let config = TickConfig {
            tick_rate: 1000.0, // fast for testing
            max_ticks: 5,
        };
        let mut tick_loop = TickLoop::new(config, EntityGroups::new(testkit::registry())).unwrap();
        let mut seen = Vec::new();
        tick_loop.run_with(|l| seen.push(l.tick_id()));
        assert_eq!(tick_loop.tick_id(), 5);
        assert_eq!(seen, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_unusable_tick_rates_are_rejected() {
        for tick_rate in [0.0, -30.0, f64::NAN, f64::INFINITY, 1.0e-310] {
            let config = TickConfig {
                tick_rate,
                max_ticks: 1,
            };
            assert!(config.tick_duration().is_err(), "{tick_rate}");
            let err = TickLoop::new(config, EntityGroups::new(testkit::registry())).unwrap_err();
            assert!(err.0.is_nan() || err.0 == tick_rate);
        }
        let config = TickConfig {
            tick_rate: 4.0,
            max_ticks: 1,
        };
        assert_eq!(config.tick_duration(), Ok(Duration::from_millis(250)));
    }
}
