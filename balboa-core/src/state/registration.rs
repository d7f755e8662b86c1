//! Client registration state machine
//!
//! A client has no channel until the spa assigns one. The spa asks "any new
//! clients?" on the negotiation channel; we answer with an ID request, the
//! spa replies with a channel and we acknowledge it.

use balboa_protocol::messages::clamp_client_channel;

/// Registration states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Registration {
    /// No channel, waiting for a new-client query
    #[default]
    Unregistered,
    /// ID request sent, waiting for an assignment
    Requested,
    /// Channel assigned and acknowledged
    Registered { channel: u8 },
}

/// Events that drive registration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegistrationEvent {
    /// "Any new clients?" seen on the negotiation channel
    NewClientQuery,
    /// The spa handed out a channel
    IdAssigned(u8),
    /// Bus silent for too long, or the session was reset
    LinkLost,
}

impl Registration {
    /// Channel we may answer on
    pub fn channel(&self) -> Option<u8> {
        match *self {
            Registration::Registered { channel } => Some(channel),
            _ => None,
        }
    }

    pub fn is_registered(&self) -> bool {
        matches!(self, Registration::Registered { .. })
    }

    /// Check whether a new-client query should be answered
    pub fn wants_id(&self) -> bool {
        !self.is_registered()
    }

    /// Process an event and return the next state
    pub fn transition(self, event: RegistrationEvent) -> Self {
        use Registration::*;
        use RegistrationEvent::*;

        match (self, event) {
            (_, LinkLost) => Unregistered,

            // A repeated query means our request was lost; stay and resend
            (Unregistered | Requested, NewClientQuery) => Requested,

            // Only accept an assignment we asked for; another client may be
            // negotiating at the same time
            (Requested, IdAssigned(channel)) => Registered {
                channel: clamp_client_channel(channel),
            },

            _ => self,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registration_flow() {
        let state = Registration::Unregistered;
        let requested = state.transition(RegistrationEvent::NewClientQuery);
        assert_eq!(requested, Registration::Requested);

        let registered = requested.transition(RegistrationEvent::IdAssigned(0x10));
        assert_eq!(registered, Registration::Registered { channel: 0x10 });
        assert_eq!(registered.channel(), Some(0x10));
    }

    #[test]
    fn test_assigned_channel_clamped() {
        let registered = Registration::Requested.transition(RegistrationEvent::IdAssigned(0x3A));
        assert_eq!(registered.channel(), Some(0x2F));
    }

    #[test]
    fn test_unsolicited_assignment_ignored() {
        let state = Registration::Unregistered.transition(RegistrationEvent::IdAssigned(0x11));
        assert_eq!(state, Registration::Unregistered);

        let state =
            Registration::Registered { channel: 0x10 }.transition(RegistrationEvent::IdAssigned(0x11));
        assert_eq!(state.channel(), Some(0x10));
    }

    #[test]
    fn test_registered_ignores_queries() {
        let state = Registration::Registered { channel: 0x10 };
        assert!(!state.wants_id());
        assert_eq!(state.transition(RegistrationEvent::NewClientQuery), state);
    }

    #[test]
    fn test_link_lost_from_any_state() {
        let states = [
            Registration::Unregistered,
            Registration::Requested,
            Registration::Registered { channel: 0x10 },
        ];
        for state in states {
            assert_eq!(
                state.transition(RegistrationEvent::LinkLost),
                Registration::Unregistered
            );
        }
    }
}
