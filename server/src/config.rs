//! Timing parameters for a room's background loop

use shared::{INACTIVITY_CHECK_PERIOD, INACTIVITY_TIMEOUT, TICK_PERIOD};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoomConfig {
    /// Physics step and broadcast cadence
    pub tick_period: Duration,
    /// How often participants are checked for inactivity
    pub inactivity_check_period: Duration,
    /// Idle time after which a participant tears the room down
    pub inactivity_timeout: Duration,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            tick_period: TICK_PERIOD,
            inactivity_check_period: INACTIVITY_CHECK_PERIOD,
            inactivity_timeout: INACTIVITY_TIMEOUT,
        }
    }
}

impl RoomConfig {
    pub fn with_tick_period(mut self, tick_period: Duration) -> Self {
        self.tick_period = tick_period;
        self
    }

    pub fn with_inactivity_timeout(mut self, inactivity_timeout: Duration) -> Self {
        self.inactivity_timeout = inactivity_timeout;
        self
    }

    /// Ticks per second implied by the tick period.
    pub fn tick_rate(&self) -> f64 {
        1.0 / self.tick_period.as_secs_f64()
    }
}
