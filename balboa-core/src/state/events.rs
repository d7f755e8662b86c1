//! Notifications produced by the session

use balboa_protocol::{
    FaultLogEntry, FilterSettings, HeatState, RestMode, SpaConfiguration, Temperature,
};

use crate::sequencer::CommandTarget;
use crate::switch::SwitchId;

/// Events delivered to session listeners
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SessionEvent {
    // State changes
    /// A switch changed state
    SwitchChanged { id: SwitchId, on: bool },
    /// Water temperature changed (`None` while the spa has no reading)
    CurrentTemperature(Option<Temperature>),
    /// Target temperature changed
    TargetTemperature(Option<Temperature>),
    Heating(HeatState),
    HighRange(bool),
    RestMode(RestMode),
    Circulation(bool),

    // Command results
    /// A status broadcast confirmed the command
    CommandAcked(CommandTarget),
    /// The command ran out of retries or queue time
    CommandFailed(CommandTarget),

    // Settings replies
    ConfigurationReceived(SpaConfiguration),
    FaultLogReceived(FaultLogEntry),
    FilterSettingsReceived(FilterSettings),

    // Link
    /// The spa assigned us a channel
    Registered { channel: u8 },
    /// Nothing heard on the bus for the link timeout
    CommunicationLost,
    /// Frames are arriving again after a loss
    CommunicationRestored,
}

impl SessionEvent {
    /// Check if this event reflects a status change
    pub fn is_state_change(&self) -> bool {
        matches!(
            self,
            SessionEvent::SwitchChanged { .. }
                | SessionEvent::CurrentTemperature(_)
                | SessionEvent::TargetTemperature(_)
                | SessionEvent::Heating(_)
                | SessionEvent::HighRange(_)
                | SessionEvent::RestMode(_)
                | SessionEvent::Circulation(_)
        )
    }

    /// Check if this event reports a problem
    pub fn is_error_event(&self) -> bool {
        matches!(
            self,
            SessionEvent::CommandFailed(_) | SessionEvent::CommunicationLost
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_change_events() {
        let event = SessionEvent::SwitchChanged {
            id: SwitchId::Jet1,
            on: true,
        };
        assert!(event.is_state_change());
        assert!(SessionEvent::Circulation(false).is_state_change());
        assert!(!SessionEvent::CommunicationLost.is_state_change());
    }

    #[test]
    fn test_error_events() {
        assert!(SessionEvent::CommunicationLost.is_error_event());
        assert!(SessionEvent::CommandFailed(CommandTarget::Clock).is_error_event());
        assert!(!SessionEvent::CommandAcked(CommandTarget::Clock).is_error_event());
    }
}
