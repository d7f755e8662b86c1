//! Clock backed by the embassy time driver

use balboa_hal::Clock;
use embassy_time::Instant;

/// Milliseconds since the clock was created
#[derive(Debug, Clone, Copy)]
pub struct EmbassyClock {
    start: Instant,
}

impl EmbassyClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for EmbassyClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for EmbassyClock {
    fn now_ms(&self) -> u32 {
        // Truncation is the wrap the session timers expect
        self.start.elapsed().as_millis() as u32
    }
}
