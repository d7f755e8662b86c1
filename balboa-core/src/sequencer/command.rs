//! Commands and their confirmation rules
//!
//! The bus has no command acknowledgement. A command counts as applied once
//! a status broadcast shows the state it asked for.

use balboa_protocol::{ClientMessage, StatusSnapshot, Temperature, ToggleItem};

use crate::switch::SwitchId;

const MINUTES_PER_DAY: u16 = 24 * 60;

/// A requested change to the spa
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    /// Drive a switch to the given state
    Switch { id: SwitchId, on: bool },
    /// Select the high (true) or low temperature range
    HighRange(bool),
    /// Change the target temperature
    Setpoint(Temperature),
    /// Set the spa clock
    Clock { hour: u8, minute: u8 },
}

/// What a command acts on; at most one command per target is pending
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandTarget {
    Switch(SwitchId),
    HighRange,
    Setpoint,
    Clock,
}

impl Command {
    /// Dedupe key
    pub fn target(&self) -> CommandTarget {
        match *self {
            Command::Switch { id, .. } => CommandTarget::Switch(id),
            Command::HighRange(_) => CommandTarget::HighRange,
            Command::Setpoint(_) => CommandTarget::Setpoint,
            Command::Clock { .. } => CommandTarget::Clock,
        }
    }

    /// Toggles flip state, so sending one twice undoes it
    pub fn is_toggle(&self) -> bool {
        matches!(self, Command::Switch { .. } | Command::HighRange(_))
    }

    /// Check whether `snapshot` already shows the requested state
    pub fn is_satisfied_by(&self, snapshot: &StatusSnapshot) -> bool {
        if !snapshot.known {
            return false;
        }
        match *self {
            Command::Switch { id, on } => id.is_on(snapshot) == on,
            Command::HighRange(high) => snapshot.high_range == high,
            Command::Setpoint(target) => snapshot.target_temp == Some(target),
            Command::Clock { hour, minute } => {
                // The minute may roll over before the next broadcast
                let wanted = hour as u16 * 60 + minute as u16;
                let shown = snapshot.hour as u16 * 60 + snapshot.minute as u16;
                shown == wanted || shown == (wanted + 1) % MINUTES_PER_DAY
            }
        }
    }

    /// Message that requests this command on `channel`
    pub fn to_message(&self, channel: u8) -> ClientMessage {
        match *self {
            Command::Switch { id, .. } => ClientMessage::Toggle {
                channel,
                item: id.toggle_item(),
            },
            Command::HighRange(_) => ClientMessage::Toggle {
                channel,
                item: ToggleItem::TempRange,
            },
            Command::Setpoint(temp) => ClientMessage::SetTemperature {
                channel,
                raw: temp.raw(),
            },
            Command::Clock { hour, minute } => ClientMessage::SetTime {
                channel,
                hour,
                minute,
            },
        }
    }
}

/// A command waiting for its turn or for confirmation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PendingCommand {
    pub command: Command,
    /// Times the command has been written to the bus
    pub attempts: u8,
    /// Confirmation timeouts so far
    pub retries: u8,
    /// When the command was queued (ms)
    pub enqueued_at: u32,
    /// When the command last went on the wire (ms)
    pub last_sent_at: Option<u32>,
    /// While set, the command is in flight and must not be resent
    pub deadline: Option<u32>,
}

impl PendingCommand {
    pub fn new(command: Command, now: u32) -> Self {
        Self {
            command,
            attempts: 0,
            retries: 0,
            enqueued_at: now,
            last_sent_at: None,
            deadline: None,
        }
    }

    pub fn is_in_flight(&self) -> bool {
        self.deadline.is_some()
    }

    /// Last time anything happened to this command
    pub fn last_activity(&self) -> u32 {
        self.last_sent_at.unwrap_or(self.enqueued_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use balboa_protocol::{PumpSpeed, StatusPayload, TempScale};

    fn snapshot(payload: StatusPayload) -> StatusSnapshot {
        StatusSnapshot::decode(payload.as_bytes()).unwrap()
    }

    #[test]
    fn test_switch_satisfaction() {
        let on = Command::Switch {
            id: SwitchId::Jet1,
            on: true,
        };
        let idle = snapshot(StatusPayload::new());
        let running = snapshot(StatusPayload::new().pump(0, PumpSpeed::Low));

        assert!(!on.is_satisfied_by(&idle));
        assert!(on.is_satisfied_by(&running));
        assert!(!on.is_satisfied_by(&StatusSnapshot::UNKNOWN));
    }

    #[test]
    fn test_setpoint_satisfaction() {
        let target = Temperature::setpoint(380, TempScale::Celsius).unwrap();
        let cmd = Command::Setpoint(target);

        assert!(cmd.is_satisfied_by(&snapshot(StatusPayload::new().celsius().target_raw(76))));
        assert!(!cmd.is_satisfied_by(&snapshot(StatusPayload::new().celsius().target_raw(75))));
        // Same raw value in the other scale is a different temperature
        assert!(!cmd.is_satisfied_by(&snapshot(StatusPayload::new().target_raw(76))));
    }

    #[test]
    fn test_clock_satisfaction_tolerates_rollover() {
        let cmd = Command::Clock {
            hour: 23,
            minute: 59,
        };
        assert!(cmd.is_satisfied_by(&snapshot(StatusPayload::new().time(23, 59))));
        assert!(cmd.is_satisfied_by(&snapshot(StatusPayload::new().time(0, 0))));
        assert!(!cmd.is_satisfied_by(&snapshot(StatusPayload::new().time(0, 1))));
    }

    #[test]
    fn test_messages() {
        let toggle = Command::HighRange(true).to_message(0x10);
        assert_eq!(
            toggle,
            ClientMessage::Toggle {
                channel: 0x10,
                item: ToggleItem::TempRange
            }
        );
        assert!(Command::HighRange(true).is_toggle());

        let clock = Command::Clock { hour: 7, minute: 30 };
        assert!(!clock.is_toggle());
        assert_eq!(clock.target(), CommandTarget::Clock);
    }
}
