//! Simulated-time source for the plugin.

use std::sync::Arc;

use sim_host::World;
use sim_types::SimTime;

/// Reads the host's simulated clock.
///
/// Wall time is never used: the host may pause, single-step or scale time and
/// the motion must follow it.
#[derive(Clone)]
pub struct WorldClock {
    world: Arc<dyn World>,
}

impl std::fmt::Debug for WorldClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorldClock")
            .field("world", &self.world.name())
            .finish()
    }
}

impl WorldClock {
    /// Clock of `world`.
    #[must_use]
    pub fn new(world: Arc<dyn World>) -> Self {
        Self { world }
    }

    /// Current simulated time.
    #[must_use]
    pub fn now(&self) -> SimTime {
        self.world.sim_time()
    }
}
