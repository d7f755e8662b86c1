//! Session controller
//!
//! Owns the serial link and everything that tracks the conversation with
//! one spa. `poll()` is the only place the link is touched: it drains the
//! receive buffer, answers the frames that need an answer and expires
//! timers. Everything else reads state or queues commands.

use heapless::Deque;

use balboa_hal::{Clock, Uart};
use balboa_protocol::{
    ClientMessage, FaultLogEntry, FilterSettings, Frame, LinkReader, ReaderStats, SpaConfiguration,
    SpaMessage, StatusSnapshot, Temperature, MAX_FRAME_SIZE,
};

use super::error::{CommandError, LinkFault, SessionError};
use super::listener::SessionListener;
use super::settings::SettingsTracker;
use crate::config::SessionConfig;
use crate::health::{LinkMonitor, LinkTransition};
use crate::sequencer::{Command, CommandOutcome, CommandSequencer, Outcomes};
use crate::state::{
    DeviceStateStore, Registration, RegistrationEvent, SessionEvent, ThermostatState,
};
use crate::switch::SwitchId;

/// Events buffered between `dispatch()` calls
pub const EVENT_QUEUE_DEPTH: usize = 32;

/// Bytes pulled from the link per read
const READ_CHUNK: usize = 64;

/// What one `poll()` did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PollSummary {
    /// Bytes read from the link
    pub bytes: usize,
    /// Valid frames received
    pub frames: usize,
    /// Frames written to the link
    pub sent: usize,
}

/// A client session with one spa
pub struct Session<L, C> {
    link: L,
    clock: C,
    config: SessionConfig,
    reader: LinkReader,
    store: DeviceStateStore,
    sequencer: CommandSequencer,
    registration: Registration,
    settings: SettingsTracker,
    monitor: LinkMonitor,
    events: Deque<SessionEvent, EVENT_QUEUE_DEPTH>,
    dropped_events: u32,
    fault: Option<LinkFault>,
}

impl<L: Uart, C: Clock> Session<L, C> {
    /// Create a session; nothing is read or written until `poll()`
    pub fn new(link: L, clock: C, config: SessionConfig) -> Self {
        let now = clock.now_ms();
        Self {
            link,
            clock,
            config,
            reader: LinkReader::new(),
            store: DeviceStateStore::new(),
            sequencer: CommandSequencer::new(&config),
            registration: Registration::Unregistered,
            settings: SettingsTracker::new(config.settings_refresh_ms, config.ack_timeout_ms, now),
            monitor: LinkMonitor::new(config.link_timeout_ms, now),
            events: Deque::new(),
            dropped_events: 0,
            fault: None,
        }
    }

    /// Drive the session for one tick
    ///
    /// Replies are written as soon as their frame is decoded, but a frame
    /// can wait up to one poll interval in the receive buffer first. The
    /// spa only waits a few milliseconds for an answer to clear-to-send,
    /// so `poll_interval_ms` must stay well under its polling period.
    ///
    /// After a link error the session stays faulted: the error is returned
    /// once, then `SessionError::Faulted` until [`Session::reinitialize`]
    /// or [`Session::reconnect`].
    pub fn poll(&mut self) -> Result<PollSummary, SessionError> {
        if self.fault.is_some() {
            return Err(SessionError::Faulted);
        }

        let mut summary = PollSummary::default();
        let mut chunk = [0u8; READ_CHUNK];
        loop {
            let count = match self.link.read_available(&mut chunk) {
                Ok(0) => break,
                Ok(count) => count,
                Err(_) => return Err(self.latch(LinkFault::Read)),
            };
            summary.bytes += count;
            self.reader.extend(&chunk[..count]);

            while let Some(frame) = self.reader.next_frame() {
                summary.frames += 1;
                if self.handle_frame(&frame)? {
                    summary.sent += 1;
                }
            }
        }

        let now = self.clock.now_ms();
        let outcomes = self.sequencer.check_timeouts(now);
        self.push_outcomes(&outcomes);

        if let Some(LinkTransition::Lost) = self.monitor.check(now) {
            self.registration = self.registration.transition(RegistrationEvent::LinkLost);
            self.push_event(SessionEvent::CommunicationLost);
        }

        Ok(summary)
    }

    /// Handle one received frame; returns true if a reply was written
    fn handle_frame(&mut self, frame: &Frame) -> Result<bool, SessionError> {
        let now = self.clock.now_ms();
        if let Some(LinkTransition::Restored) = self.monitor.frame_received(now) {
            self.push_event(SessionEvent::CommunicationRestored);
        }

        let message = SpaMessage::classify(frame);
        let ours = message
            .addressed_channel()
            .is_some_and(|channel| Some(channel) == self.registration.channel());

        match message {
            SpaMessage::NewClientQuery if self.registration.wants_id() => {
                self.registration = self
                    .registration
                    .transition(RegistrationEvent::NewClientQuery);
                self.send(&ClientMessage::IdRequest.to_frame()?)?;
                return Ok(true);
            }
            SpaMessage::IdAssigned { channel } => {
                let was_registered = self.registration.is_registered();
                self.registration = self
                    .registration
                    .transition(RegistrationEvent::IdAssigned(channel));
                match self.registration.channel() {
                    Some(channel) if !was_registered => {
                        self.send(&ClientMessage::IdAck { channel }.to_frame()?)?;
                        self.settings.rerequest(now);
                        self.push_event(SessionEvent::Registered { channel });
                        return Ok(true);
                    }
                    _ => {}
                }
            }
            SpaMessage::ClearToSend { channel } if ours => {
                self.answer_clear_to_send(channel, now)?;
                return Ok(true);
            }
            SpaMessage::Status => {
                let previous = self.store.current();
                if let Some(next) = self.store.apply(frame) {
                    for event in DeviceStateStore::changes(&previous, &next) {
                        self.push_event(event);
                    }
                    let outcomes = self.sequencer.on_status(&next);
                    self.push_outcomes(&outcomes);
                }
            }
            SpaMessage::Configuration { .. } if ours => {
                if let Some(config) = self.settings.on_configuration(&frame.payload) {
                    self.push_event(SessionEvent::ConfigurationReceived(config));
                }
            }
            SpaMessage::FaultLog { .. } if ours => {
                if let Some(entry) = self.settings.on_fault_log(&frame.payload) {
                    self.push_event(SessionEvent::FaultLogReceived(entry));
                }
            }
            SpaMessage::FilterCycles { .. } if ours => {
                if let Some(filters) = self.settings.on_filter_settings(&frame.payload) {
                    self.push_event(SessionEvent::FilterSettingsReceived(filters));
                }
            }
            _ => {}
        }
        Ok(false)
    }

    /// Write exactly one frame in the turn the spa granted us
    fn answer_clear_to_send(&mut self, channel: u8, now: u32) -> Result<(), SessionError> {
        let snapshot = self.store.current();
        let frame = match self.sequencer.next_to_send(&snapshot, channel, now) {
            Some(frame) => frame,
            None => match self.settings.next_request(now) {
                Some(kind) => ClientMessage::SettingsRequest { channel, kind }.to_frame()?,
                None => ClientMessage::NothingToSend { channel }.to_frame()?,
            },
        };
        self.send(&frame)
    }

    fn send(&mut self, frame: &Frame) -> Result<(), SessionError> {
        let mut buffer = [0u8; MAX_FRAME_SIZE];
        let len = frame.encode(&mut buffer)?;
        if self.link.write_blocking(&buffer[..len]).is_err() || self.link.flush().is_err() {
            return Err(self.latch(LinkFault::Write));
        }
        Ok(())
    }

    fn latch(&mut self, fault: LinkFault) -> SessionError {
        self.fault = Some(fault);
        SessionError::Link(fault)
    }

    fn push_event(&mut self, event: SessionEvent) {
        if self.events.is_full() {
            self.events.pop_front();
            self.dropped_events = self.dropped_events.saturating_add(1);
        }
        // Room was made above
        let _ = self.events.push_back(event);
    }

    fn push_outcomes(&mut self, outcomes: &Outcomes) {
        for outcome in outcomes {
            let event = match *outcome {
                CommandOutcome::Acked(target) => SessionEvent::CommandAcked(target),
                CommandOutcome::Failed(target) => SessionEvent::CommandFailed(target),
            };
            self.push_event(event);
        }
    }

    // Commands

    /// Request a switch state
    ///
    /// The switch reads as changed only once a status broadcast shows it.
    pub fn set_state(&mut self, id: SwitchId, on: bool) {
        let now = self.clock.now_ms();
        self.sequencer.enqueue(Command::Switch { id, on }, now);
    }

    /// Request a target temperature, in tenths of a degree on the spa's scale
    pub fn set_temperature(&mut self, x10: i16) -> Result<(), CommandError> {
        let snapshot = self.store.current();
        if !snapshot.known {
            return Err(CommandError::ScaleUnknown);
        }
        let target = Temperature::setpoint(x10, snapshot.scale).ok_or(CommandError::OutOfRange)?;
        let now = self.clock.now_ms();
        self.sequencer.enqueue(Command::Setpoint(target), now);
        Ok(())
    }

    /// Select the high or low temperature range
    pub fn set_high_range(&mut self, high: bool) {
        let now = self.clock.now_ms();
        self.sequencer.enqueue(Command::HighRange(high), now);
    }

    /// Set the spa clock
    pub fn set_time(&mut self, hour: u8, minute: u8) -> Result<(), CommandError> {
        if hour > 23 || minute > 59 {
            return Err(CommandError::OutOfRange);
        }
        let now = self.clock.now_ms();
        self.sequencer.enqueue(Command::Clock { hour, minute }, now);
        Ok(())
    }

    // State

    /// Switch state as last reported by the spa
    pub fn is_on(&self, id: SwitchId) -> bool {
        id.is_on(&self.store.current())
    }

    /// Latest status snapshot
    pub fn snapshot(&self) -> StatusSnapshot {
        self.store.current()
    }

    pub fn thermostat(&self) -> ThermostatState {
        ThermostatState::from_snapshot(&self.store.current())
    }

    /// Registered and hearing the spa
    pub fn is_communicating(&self) -> bool {
        self.registration.is_registered() && self.monitor.is_healthy()
    }

    /// Channel the spa assigned us
    pub fn channel(&self) -> Option<u8> {
        self.registration.channel()
    }

    pub fn configuration(&self) -> Option<SpaConfiguration> {
        self.settings.configuration()
    }

    pub fn fault_log(&self) -> Option<FaultLogEntry> {
        self.settings.fault_log()
    }

    pub fn filter_settings(&self) -> Option<FilterSettings> {
        self.settings.filter_settings()
    }

    pub fn pending_commands(&self) -> usize {
        self.sequencer.len()
    }

    pub fn reader_stats(&self) -> ReaderStats {
        self.reader.stats()
    }

    /// Events discarded because nobody drained the queue
    pub fn dropped_events(&self) -> u32 {
        self.dropped_events
    }

    pub fn poll_interval_ms(&self) -> u32 {
        self.config.poll_interval_ms
    }

    pub fn is_faulted(&self) -> bool {
        self.fault.is_some()
    }

    // Events

    /// Take the oldest undelivered event
    pub fn next_event(&mut self) -> Option<SessionEvent> {
        self.events.pop_front()
    }

    /// Deliver all queued events to `listener`; returns how many
    pub fn dispatch(&mut self, listener: &mut impl SessionListener) -> usize {
        let mut count = 0;
        while let Some(event) = self.events.pop_front() {
            listener.on_event(&event);
            count += 1;
        }
        count
    }

    // Recovery

    /// Clear a link fault and start over
    ///
    /// Pending commands are reported failed. The state store returns to
    /// unknown without change events.
    pub fn reinitialize(&mut self) {
        let now = self.clock.now_ms();
        self.fault = None;
        self.reader.reset();
        self.store.reset();
        self.registration = self.registration.transition(RegistrationEvent::LinkLost);
        self.settings.reset(now);
        self.monitor.reset(now);

        let outcomes = self.sequencer.fail_all();
        self.push_outcomes(&outcomes);
    }

    /// Swap in a new link, returning the old one, and reinitialize
    pub fn reconnect(&mut self, link: L) -> L {
        let old = core::mem::replace(&mut self.link, link);
        self.reinitialize();
        old
    }
}
