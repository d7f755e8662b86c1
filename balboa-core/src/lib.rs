//! Board-agnostic session logic for the Balboa spa bus driver
//!
//! This crate contains everything between the serial link and the switch
//! binding that does not depend on a specific board:
//!
//! - Session controller (registration, turn-taking, dispatch)
//! - Device state store and change detection
//! - Command sequencer (dedupe, confirmation, retries)
//! - Link health monitoring
//! - Configuration types and the TOML subset parser

#![no_std]
#![deny(unsafe_code)]

pub mod config;
pub mod health;
pub mod sequencer;
pub mod session;
pub mod state;
pub mod switch;

pub use session::{CommandError, Session, SessionError, SessionListener};
pub use state::SessionEvent;
pub use switch::SwitchId;
