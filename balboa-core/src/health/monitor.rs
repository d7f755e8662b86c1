//! Link health monitor
//!
//! The spa broadcasts status several times per second, so silence on the
//! bus means the cable, transceiver or mainboard is gone.

use balboa_hal::clock::elapsed_ms;

/// Link condition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkStatus {
    /// No frame seen yet
    Waiting,
    /// Frames arriving
    Up,
    /// No frame for the link timeout
    Lost,
}

/// Edge reported by the monitor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkTransition {
    Lost,
    Restored,
}

/// Watches the time since the last valid frame
#[derive(Debug, Clone)]
pub struct LinkMonitor {
    status: LinkStatus,
    /// Time of the last frame, or of the last reset
    last_frame_ms: u32,
    timeout_ms: u32,
}

impl LinkMonitor {
    /// Create a monitor that starts counting at `now`
    pub fn new(timeout_ms: u32, now: u32) -> Self {
        Self {
            status: LinkStatus::Waiting,
            last_frame_ms: now,
            timeout_ms,
        }
    }

    /// Start over as if just powered up
    pub fn reset(&mut self, now: u32) {
        self.status = LinkStatus::Waiting;
        self.last_frame_ms = now;
    }

    /// Record a valid frame
    ///
    /// Returns `Restored` on the first frame after a loss.
    pub fn frame_received(&mut self, now: u32) -> Option<LinkTransition> {
        self.last_frame_ms = now;
        let previous = self.status;
        self.status = LinkStatus::Up;
        (previous == LinkStatus::Lost).then_some(LinkTransition::Restored)
    }

    /// Check for silence
    ///
    /// Returns `Lost` once per outage.
    pub fn check(&mut self, now: u32) -> Option<LinkTransition> {
        if self.status == LinkStatus::Lost {
            return None;
        }
        if elapsed_ms(now, self.last_frame_ms) >= self.timeout_ms {
            self.status = LinkStatus::Lost;
            return Some(LinkTransition::Lost);
        }
        None
    }

    pub fn status(&self) -> LinkStatus {
        self.status
    }

    /// Check if frames are arriving
    pub fn is_healthy(&self) -> bool {
        self.status == LinkStatus::Up
    }

    /// Milliseconds since the last frame
    pub fn silence_ms(&self, now: u32) -> u32 {
        elapsed_ms(now, self.last_frame_ms)
    }
}
