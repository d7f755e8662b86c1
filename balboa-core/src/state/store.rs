//! Device state store
//!
//! Keeps the most recent status snapshot and works out what changed between
//! consecutive broadcasts.

use heapless::Vec;

use balboa_protocol::messages::{CHANNEL_BROADCAST, MSG_STATUS};
use balboa_protocol::{Frame, StatusSnapshot};

use super::events::SessionEvent;
use crate::switch::SwitchId;

/// Upper bound on events from one snapshot pair
pub const MAX_CHANGES: usize = 16;

/// Change events between two snapshots
pub type Changes = Vec<SessionEvent, MAX_CHANGES>;

/// Latest known device state
#[derive(Debug, Clone)]
pub struct DeviceStateStore {
    current: StatusSnapshot,
}

impl Default for DeviceStateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceStateStore {
    pub fn new() -> Self {
        Self {
            current: StatusSnapshot::UNKNOWN,
        }
    }

    /// Decode a status frame and make it the current state
    ///
    /// Returns `None` for anything that is not a complete status broadcast,
    /// leaving the current state untouched.
    pub fn apply(&mut self, frame: &Frame) -> Option<StatusSnapshot> {
        if frame.channel != CHANNEL_BROADCAST || frame.msg_type != MSG_STATUS {
            return None;
        }
        let mut next = StatusSnapshot::decode(&frame.payload)?;

        // An out-of-range setpoint is a glitch, not a new target
        if next.target_temp.is_none() && next.scale == self.current.scale {
            next.target_temp = self.current.target_temp;
        }

        self.current = next;
        Some(next)
    }

    /// Current state, [`StatusSnapshot::UNKNOWN`] before the first broadcast
    pub fn current(&self) -> StatusSnapshot {
        self.current
    }

    /// Forget everything, without producing change events
    pub fn reset(&mut self) {
        self.current = StatusSnapshot::UNKNOWN;
    }

    /// One event per field that differs between `prev` and `next`
    pub fn changes(prev: &StatusSnapshot, next: &StatusSnapshot) -> Changes {
        let mut changes = Changes::new();
        if prev == next {
            return changes;
        }

        // Capacity covers every field below
        for id in SwitchId::ALL {
            let on = id.is_on(next);
            if id.is_on(prev) != on {
                let _ = changes.push(SessionEvent::SwitchChanged { id, on });
            }
        }
        if prev.current_temp != next.current_temp {
            let _ = changes.push(SessionEvent::CurrentTemperature(next.current_temp));
        }
        if prev.target_temp != next.target_temp {
            let _ = changes.push(SessionEvent::TargetTemperature(next.target_temp));
        }
        if prev.heating != next.heating {
            let _ = changes.push(SessionEvent::Heating(next.heating));
        }
        if prev.high_range != next.high_range {
            let _ = changes.push(SessionEvent::HighRange(next.high_range));
        }
        if prev.rest_mode != next.rest_mode {
            let _ = changes.push(SessionEvent::RestMode(next.rest_mode));
        }
        if prev.circulation != next.circulation {
            let _ = changes.push(SessionEvent::Circulation(next.circulation));
        }
        changes
    }
}
