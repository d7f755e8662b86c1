//! Inter-task communication channels
//!
//! The spa task owns the session; everything else reaches it through these.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;

use balboa_core::{SessionEvent, SwitchId};

/// Channel capacity for toggle requests
const TOGGLE_CHANNEL_SIZE: usize = 8;

/// Channel capacity for session events
const EVENT_CHANNEL_SIZE: usize = 16;

/// Switches to flip, applied by the spa task before its next poll
pub static TOGGLE_REQUESTS: Channel<CriticalSectionRawMutex, SwitchId, TOGGLE_CHANNEL_SIZE> =
    Channel::new();

/// Session events for the binding
pub static EVENT_CHANNEL: Channel<CriticalSectionRawMutex, SessionEvent, EVENT_CHANNEL_SIZE> =
    Channel::new();
