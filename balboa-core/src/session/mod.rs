//! Spa session
//!
//! [`Session`] ties the link, the state store, the command sequencer and
//! the health monitor together behind a small polling API.

pub mod controller;
pub mod error;
pub mod listener;
pub mod settings;

pub use controller::{PollSummary, Session, EVENT_QUEUE_DEPTH};
pub use error::{CommandError, LinkFault, SessionError};
pub use listener::SessionListener;
pub use settings::SettingsTracker;
