//! Event delivery to the switch binding

use crate::state::SessionEvent;

/// Receives session events
///
/// Implemented for any `FnMut(&SessionEvent)`, so a closure is usually
/// enough.
pub trait SessionListener {
    fn on_event(&mut self, event: &SessionEvent);
}

impl<F: FnMut(&SessionEvent)> SessionListener for F {
    fn on_event(&mut self, event: &SessionEvent) {
        self(event)
    }
}
