//! RP2040-specific HAL for the spa bus driver
//!
//! Implements the `balboa-hal` traits on top of embassy-rp:
//!
//! - RS-485 link over a buffered UART with an optional driver-enable pin
//! - Millisecond clock backed by the embassy time driver
//! - GPIO allocation by number for config-driven pin assignment

#![no_std]
#![deny(unsafe_code)]

pub mod clock;
pub mod pins;
pub mod uart;

pub use clock::EmbassyClock;
pub use pins::{BusPeripherals, PinBank, PinError};
pub use uart::Rs485Link;
