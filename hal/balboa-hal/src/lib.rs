//! Balboa Hardware Abstraction Layer
//!
//! This crate defines the hardware traits the spa bus driver needs from a
//! board: a byte-oriented serial link and a monotonic millisecond clock.
//! Chip-specific HALs implement them so the same session logic runs on the
//! RP2040 firmware and in host tests.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  balboa-core (session, sequencer, ...)  │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  balboa-hal (this crate - traits)       │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//!             ┌───────────────┐
//!             │  balboa-hal-  │
//!             │    rp2040     │
//!             └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`uart::UartTx`], [`uart::UartRx`] - Serial communication
//! - [`clock::Clock`] - Monotonic time source

#![no_std]
#![deny(unsafe_code)]

pub mod clock;
pub mod uart;

pub use clock::Clock;
pub use uart::{Uart, UartConfig, UartRx, UartTx};
