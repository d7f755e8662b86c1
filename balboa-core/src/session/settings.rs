//! Settings request scheduling
//!
//! Configuration is fetched once per registration. The fault log follows,
//! then the filter cycles once the fault log has arrived. Both are
//! refreshed periodically. A request without a reply is repeated after the
//! ack timeout.

use balboa_hal::clock::elapsed_ms;
use balboa_protocol::{FaultLogEntry, FilterSettings, SettingsKind, SpaConfiguration};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RequestState {
    Needed,
    Requested { at: u32 },
    Received,
}

/// Tracks which settings reports are still outstanding
#[derive(Debug, Clone)]
pub struct SettingsTracker {
    configuration: Option<SpaConfiguration>,
    fault_log: Option<FaultLogEntry>,
    filters: Option<FilterSettings>,
    config_state: RequestState,
    fault_state: RequestState,
    filter_state: RequestState,
    last_refresh_ms: u32,
    refresh_ms: u32,
    retry_ms: u32,
}

impl SettingsTracker {
    pub fn new(refresh_ms: u32, retry_ms: u32, now: u32) -> Self {
        Self {
            configuration: None,
            fault_log: None,
            filters: None,
            config_state: RequestState::Needed,
            fault_state: RequestState::Needed,
            filter_state: RequestState::Needed,
            last_refresh_ms: now,
            refresh_ms,
            retry_ms,
        }
    }

    /// Forget all reports and request them again
    pub fn reset(&mut self, now: u32) {
        *self = Self::new(self.refresh_ms, self.retry_ms, now);
    }

    /// Ask for everything again after the spa reassigned our channel
    pub fn rerequest(&mut self, now: u32) {
        self.config_state = RequestState::Needed;
        self.fault_state = RequestState::Needed;
        self.filter_state = RequestState::Needed;
        self.last_refresh_ms = now;
    }

    /// Settings report to request on this clear-to-send, if any
    pub fn next_request(&mut self, now: u32) -> Option<SettingsKind> {
        if self.fault_state == RequestState::Received
            && self.filter_state == RequestState::Received
            && elapsed_ms(now, self.last_refresh_ms) >= self.refresh_ms
        {
            self.fault_state = RequestState::Needed;
            self.filter_state = RequestState::Needed;
            self.last_refresh_ms = now;
        }

        let retry_ms = self.retry_ms;
        let due = |state: RequestState| match state {
            RequestState::Needed => true,
            RequestState::Requested { at } => elapsed_ms(now, at) >= retry_ms,
            RequestState::Received => false,
        };

        let kind = if due(self.config_state) {
            self.config_state = RequestState::Requested { at: now };
            SettingsKind::Configuration
        } else if due(self.fault_state) {
            self.fault_state = RequestState::Requested { at: now };
            SettingsKind::FaultLog
        } else if self.fault_state == RequestState::Received && due(self.filter_state) {
            self.filter_state = RequestState::Requested { at: now };
            SettingsKind::FilterCycles
        } else {
            return None;
        };
        Some(kind)
    }

    /// Record a configuration reply
    pub fn on_configuration(&mut self, payload: &[u8]) -> Option<SpaConfiguration> {
        let config = SpaConfiguration::decode(payload)?;
        self.configuration = Some(config);
        self.config_state = RequestState::Received;
        Some(config)
    }

    /// Record a fault log reply
    pub fn on_fault_log(&mut self, payload: &[u8]) -> Option<FaultLogEntry> {
        let entry = FaultLogEntry::decode(payload)?;
        self.fault_log = Some(entry);
        self.fault_state = RequestState::Received;
        Some(entry)
    }

    /// Record a filter cycle reply
    pub fn on_filter_settings(&mut self, payload: &[u8]) -> Option<FilterSettings> {
        let settings = FilterSettings::decode(payload)?;
        self.filters = Some(settings);
        self.filter_state = RequestState::Received;
        Some(settings)
    }

    pub fn configuration(&self) -> Option<SpaConfiguration> {
        self.configuration
    }

    pub fn fault_log(&self) -> Option<FaultLogEntry> {
        self.fault_log
    }

    pub fn filter_settings(&self) -> Option<FilterSettings> {
        self.filters
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REFRESH: u32 = 300_000;
    const RETRY: u32 = 1_500;

    const CONFIG: [u8; 5] = [0x0A, 0x00, 0x01, 0x81, 0x00];
    const FAULT: [u8; 6] = [0x01, 0x00, 0x10, 0x00, 0x08, 0x00];
    const FILTERS: [u8; 8] = [0x08, 0x00, 0x02, 0x00, 0x94, 0x00, 0x01, 0x00];

    #[test]
    fn test_request_order() {
        let mut tracker = SettingsTracker::new(REFRESH, RETRY, 0);

        assert_eq!(tracker.next_request(0), Some(SettingsKind::Configuration));
        assert_eq!(tracker.next_request(10), Some(SettingsKind::FaultLog));
        // Filter cycles wait for the fault log
        assert_eq!(tracker.next_request(20), None);

        tracker.on_configuration(&CONFIG).unwrap();
        tracker.on_fault_log(&FAULT).unwrap();
        assert_eq!(tracker.next_request(30), Some(SettingsKind::FilterCycles));

        tracker.on_filter_settings(&FILTERS).unwrap();
        assert_eq!(tracker.next_request(40), None);
        assert!(tracker.configuration().is_some());
        assert_eq!(tracker.fault_log().map(|f| f.code), Some(16));
        assert!(tracker.filter_settings().unwrap().filter2_enabled);
    }

    #[test]
    fn test_unanswered_request_repeated() {
        let mut tracker = SettingsTracker::new(REFRESH, RETRY, 0);
        assert_eq!(tracker.next_request(0), Some(SettingsKind::Configuration));
        tracker.on_fault_log(&FAULT).unwrap();
        tracker.on_filter_settings(&FILTERS).unwrap();

        assert_eq!(tracker.next_request(RETRY - 1), None);
        assert_eq!(
            tracker.next_request(RETRY),
            Some(SettingsKind::Configuration)
        );
    }

    #[test]
    fn test_periodic_refresh() {
        let mut tracker = SettingsTracker::new(REFRESH, RETRY, 0);
        tracker.on_configuration(&CONFIG).unwrap();
        tracker.on_fault_log(&FAULT).unwrap();
        tracker.on_filter_settings(&FILTERS).unwrap();

        assert_eq!(tracker.next_request(REFRESH - 1), None);
        assert_eq!(tracker.next_request(REFRESH), Some(SettingsKind::FaultLog));
        // Configuration is not refreshed
        tracker.on_fault_log(&FAULT).unwrap();
        assert_eq!(
            tracker.next_request(REFRESH + 10),
            Some(SettingsKind::FilterCycles)
        );
    }

    #[test]
    fn test_short_reply_ignored() {
        let mut tracker = SettingsTracker::new(REFRESH, RETRY, 0);
        assert!(tracker.on_configuration(&CONFIG[..3]).is_none());
        assert!(tracker.configuration().is_none());
    }
}
