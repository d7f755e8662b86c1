//! Command sequencer
//!
//! Holds at most one pending command per target and decides what may go on
//! the wire when the spa grants us a turn.

use heapless::Vec;

use balboa_hal::clock::{deadline_reached, elapsed_ms};
use balboa_protocol::{Frame, StatusSnapshot};

use super::command::{Command, CommandTarget, PendingCommand};
use crate::config::SessionConfig;

/// One slot per switch plus high range, setpoint and clock
pub const MAX_PENDING: usize = 9;

/// How a pending command left the queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandOutcome {
    /// A status broadcast showed the requested state
    Acked(CommandTarget),
    /// Retries or queue time ran out
    Failed(CommandTarget),
}

/// Outcomes produced by one sequencer call
pub type Outcomes = Vec<CommandOutcome, MAX_PENDING>;

/// Deduplicating command queue with confirmation tracking
#[derive(Debug, Clone)]
pub struct CommandSequencer {
    pending: Vec<PendingCommand, MAX_PENDING>,
    ack_timeout_ms: u32,
    max_retries: u8,
    queue_expiry_ms: u32,
}

impl CommandSequencer {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            pending: Vec::new(),
            ack_timeout_ms: config.ack_timeout_ms,
            max_retries: config.max_retries.max(1),
            queue_expiry_ms: config.queue_expiry_ms,
        }
    }

    /// Queue a command, replacing any pending command for the same target
    ///
    /// A replacement keeps its predecessor's deadline: if the old command is
    /// already on the wire, the new one waits for that attempt to resolve
    /// before it is considered, so a toggle is never sent twice in a row.
    pub fn enqueue(&mut self, command: Command, now: u32) -> PendingCommand {
        let mut entry = PendingCommand::new(command, now);
        let target = command.target();

        if let Some(slot) = self
            .pending
            .iter_mut()
            .find(|p| p.command.target() == target)
        {
            entry.deadline = slot.deadline;
            *slot = entry;
        } else {
            // One slot per target, cannot overflow
            let _ = self.pending.push(entry);
        }
        entry
    }

    /// Pick the frame to send on this clear-to-send, if any
    ///
    /// The chosen command is marked in flight until `now + ack_timeout`.
    pub fn next_to_send(
        &mut self,
        snapshot: &StatusSnapshot,
        channel: u8,
        now: u32,
    ) -> Option<Frame> {
        let ack_timeout_ms = self.ack_timeout_ms;
        let entry = self.pending.iter_mut().find(|p| {
            !p.is_in_flight()
                && !p.command.is_satisfied_by(snapshot)
                && (snapshot.known || !p.command.is_toggle())
        })?;

        let frame = entry.command.to_message(channel).to_frame().ok()?;
        entry.attempts = entry.attempts.saturating_add(1);
        entry.last_sent_at = Some(now);
        entry.deadline = Some(now.wrapping_add(ack_timeout_ms));
        Some(frame)
    }

    /// Acknowledge every command the new snapshot confirms
    pub fn on_status(&mut self, snapshot: &StatusSnapshot) -> Outcomes {
        let mut outcomes = Outcomes::new();
        self.pending.retain(|p| {
            if p.command.is_satisfied_by(snapshot) {
                let _ = outcomes.push(CommandOutcome::Acked(p.command.target()));
                false
            } else {
                true
            }
        });
        outcomes
    }

    /// Expire deadlines and fail commands that ran out of retries or time
    ///
    /// A command waiting for a turn fails once `queue_expiry_ms` passes
    /// since it was queued or last sent, whichever is later.
    pub fn check_timeouts(&mut self, now: u32) -> Outcomes {
        let mut outcomes = Outcomes::new();
        let max_retries = self.max_retries;
        let queue_expiry_ms = self.queue_expiry_ms;

        self.pending.retain_mut(|p| {
            if let Some(deadline) = p.deadline {
                if deadline_reached(now, deadline) {
                    p.deadline = None;
                    if p.attempts > 0 {
                        p.retries = p.retries.saturating_add(1);
                    }
                }
            }

            let exhausted = p.retries >= max_retries;
            let stale =
                !p.is_in_flight() && elapsed_ms(now, p.last_activity()) >= queue_expiry_ms;

            if exhausted || stale {
                let _ = outcomes.push(CommandOutcome::Failed(p.command.target()));
                false
            } else {
                true
            }
        });
        outcomes
    }

    /// Fail every pending command
    pub fn fail_all(&mut self) -> Outcomes {
        let outcomes = self
            .pending
            .iter()
            .map(|p| CommandOutcome::Failed(p.command.target()))
            .collect();
        self.pending.clear();
        outcomes
    }

    /// Pending command for `target`
    pub fn pending(&self, target: CommandTarget) -> Option<&PendingCommand> {
        self.pending.iter().find(|p| p.command.target() == target)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::switch::SwitchId;
    use balboa_protocol::{ClientMessage, PumpSpeed, StatusPayload, TempScale, Temperature};

    const CHANNEL: u8 = 0x10;

    fn config() -> SessionConfig {
        SessionConfig {
            ack_timeout_ms: 1000,
            max_retries: 3,
            queue_expiry_ms: 5000,
            ..SessionConfig::default()
        }
    }

    fn idle() -> StatusSnapshot {
        StatusSnapshot::decode(StatusPayload::new().as_bytes()).unwrap()
    }

    fn jet1_on() -> StatusSnapshot {
        StatusSnapshot::decode(StatusPayload::new().pump(0, PumpSpeed::High).as_bytes()).unwrap()
    }

    fn switch(id: SwitchId, on: bool) -> Command {
        Command::Switch { id, on }
    }

    #[test]
    fn test_enqueue_dedupes_by_target() {
        let mut seq = CommandSequencer::new(&config());
        seq.enqueue(switch(SwitchId::Jet1, true), 0);
        seq.enqueue(switch(SwitchId::Jet1, false), 10);
        seq.enqueue(switch(SwitchId::Jet2, true), 20);

        assert_eq!(seq.len(), 2);
        let pending = seq.pending(CommandTarget::Switch(SwitchId::Jet1)).unwrap();
        assert_eq!(pending.command, switch(SwitchId::Jet1, false));
    }

    #[test]
    fn test_send_marks_in_flight() {
        let mut seq = CommandSequencer::new(&config());
        seq.enqueue(switch(SwitchId::Jet1, true), 0);

        let frame = seq.next_to_send(&idle(), CHANNEL, 100).unwrap();
        assert_eq!(
            ClientMessage::from_frame(&frame).unwrap(),
            ClientMessage::Toggle {
                channel: CHANNEL,
                item: SwitchId::Jet1.toggle_item()
            }
        );

        // In flight: nothing else to send
        assert!(seq.next_to_send(&idle(), CHANNEL, 200).is_none());
        let pending = seq.pending(CommandTarget::Switch(SwitchId::Jet1)).unwrap();
        assert_eq!(pending.attempts, 1);
        assert_eq!(pending.deadline, Some(1100));
    }

    #[test]
    fn test_no_toggle_while_unknown() {
        let mut seq = CommandSequencer::new(&config());
        seq.enqueue(switch(SwitchId::Lights, true), 0);
        assert!(seq.next_to_send(&StatusSnapshot::UNKNOWN, CHANNEL, 0).is_none());

        seq.enqueue(Command::Clock { hour: 8, minute: 0 }, 0);
        let frame = seq.next_to_send(&StatusSnapshot::UNKNOWN, CHANNEL, 0).unwrap();
        assert_eq!(frame.msg_type, balboa_protocol::messages::MSG_SET_TIME);
    }

    #[test]
    fn test_satisfied_command_not_sent() {
        let mut seq = CommandSequencer::new(&config());
        seq.enqueue(switch(SwitchId::Jet1, true), 0);
        assert!(seq.next_to_send(&jet1_on(), CHANNEL, 0).is_none());

        let outcomes = seq.on_status(&jet1_on());
        assert_eq!(
            outcomes.as_slice(),
            &[CommandOutcome::Acked(CommandTarget::Switch(SwitchId::Jet1))]
        );
        assert!(seq.is_empty());
    }

    #[test]
    fn test_status_acks_in_flight_command() {
        let mut seq = CommandSequencer::new(&config());
        seq.enqueue(switch(SwitchId::Jet1, true), 0);
        seq.next_to_send(&idle(), CHANNEL, 0).unwrap();

        assert!(seq.on_status(&idle()).is_empty());
        assert_eq!(seq.on_status(&jet1_on()).len(), 1);
        assert!(seq.is_empty());
    }

    #[test]
    fn test_retries_then_fails_once() {
        let mut seq = CommandSequencer::new(&config());
        seq.enqueue(switch(SwitchId::Blower, true), 0);

        let mut now = 0;
        let mut failures = 0;
        for _ in 0..10 {
            let _ = seq.next_to_send(&idle(), CHANNEL, now);
            now += 1000;
            failures += seq
                .check_timeouts(now)
                .iter()
                .filter(|o| matches!(o, CommandOutcome::Failed(_)))
                .count();
        }

        assert_eq!(failures, 1);
        assert!(seq.pending(CommandTarget::Switch(SwitchId::Blower)).is_none());
    }

    #[test]
    fn test_timeout_allows_resend() {
        let mut seq = CommandSequencer::new(&config());
        seq.enqueue(switch(SwitchId::Jet2, true), 0);
        seq.next_to_send(&idle(), CHANNEL, 0).unwrap();

        assert!(seq.check_timeouts(999).is_empty());
        assert!(seq.next_to_send(&idle(), CHANNEL, 999).is_none());

        assert!(seq.check_timeouts(1000).is_empty());
        assert!(seq.next_to_send(&idle(), CHANNEL, 1000).is_some());
        let pending = seq.pending(CommandTarget::Switch(SwitchId::Jet2)).unwrap();
        assert_eq!((pending.attempts, pending.retries), (2, 1));
    }

    #[test]
    fn test_superseding_inherits_deadline() {
        let mut seq = CommandSequencer::new(&config());
        seq.enqueue(switch(SwitchId::Jet1, true), 0);
        seq.next_to_send(&idle(), CHANNEL, 0).unwrap();

        // User changes their mind while the toggle is on the wire
        let replaced = seq.enqueue(switch(SwitchId::Jet1, false), 100);
        assert_eq!(replaced.deadline, Some(1000));
        assert!(seq.next_to_send(&jet1_on(), CHANNEL, 500).is_none());

        // The first toggle took effect; only now may the second go out
        assert!(seq.check_timeouts(1000).is_empty());
        assert!(seq.next_to_send(&jet1_on(), CHANNEL, 1000).is_some());
    }

    #[test]
    fn test_superseded_toggle_that_never_landed() {
        let mut seq = CommandSequencer::new(&config());
        seq.enqueue(switch(SwitchId::Jet1, true), 0);
        seq.next_to_send(&idle(), CHANNEL, 0).unwrap();
        seq.enqueue(switch(SwitchId::Jet1, false), 100);

        // Spa still shows off, which is what the replacement wants
        let outcomes = seq.on_status(&idle());
        assert_eq!(outcomes.len(), 1);
        assert!(seq.is_empty());
    }

    #[test]
    fn test_unsent_command_expires() {
        let mut seq = CommandSequencer::new(&config());
        seq.enqueue(switch(SwitchId::Lights, true), 0);

        assert!(seq.check_timeouts(4999).is_empty());
        assert_eq!(
            seq.check_timeouts(5000).as_slice(),
            &[CommandOutcome::Failed(CommandTarget::Switch(SwitchId::Lights))]
        );
    }

    #[test]
    fn test_timed_out_command_expires_without_turns() {
        let mut seq = CommandSequencer::new(&config());
        seq.enqueue(switch(SwitchId::Jet1, true), 0);
        seq.next_to_send(&idle(), CHANNEL, 0).unwrap();

        // One timeout, then the spa stops granting turns
        assert!(seq.check_timeouts(1500).is_empty());
        assert!(seq.check_timeouts(4999).is_empty());
        assert_eq!(
            seq.check_timeouts(5000).as_slice(),
            &[CommandOutcome::Failed(CommandTarget::Switch(SwitchId::Jet1))]
        );
        assert!(seq.is_empty());
        assert!(seq.check_timeouts(3_600_000).is_empty());
    }

    #[test]
    fn test_setpoint_goes_out_once_known() {
        let mut seq = CommandSequencer::new(&config());
        let target = Temperature::setpoint(1020, TempScale::Fahrenheit).unwrap();
        seq.enqueue(Command::Setpoint(target), 0);

        let frame = seq.next_to_send(&idle(), CHANNEL, 0).unwrap();
        assert_eq!(
            ClientMessage::from_frame(&frame).unwrap(),
            ClientMessage::SetTemperature {
                channel: CHANNEL,
                raw: 102
            }
        );
    }

    #[test]
    fn test_fail_all() {
        let mut seq = CommandSequencer::new(&config());
        seq.enqueue(switch(SwitchId::Jet1, true), 0);
        seq.enqueue(Command::HighRange(true), 0);

        assert_eq!(seq.fail_all().len(), 2);
        assert!(seq.is_empty());
    }
}
