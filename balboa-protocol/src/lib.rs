//! Balboa Spa Bus Protocol
//!
//! This crate implements the RS-485 protocol spoken between a Balboa spa
//! controller and its topside panels, WiFi modules and other clients. The
//! spa is the bus master: it broadcasts status several times per second and
//! grants each registered client a turn to speak with a clear-to-send frame.
//!
//! # Protocol Overview
//!
//! All messages use the same delimited frame format:
//! ```text
//! ┌──────┬────────┬─────────┬───────┬──────┬─────────────┬─────┬──────┐
//! │ 0x7E │ LENGTH │ CHANNEL │ MAGIC │ TYPE │ PAYLOAD     │ CRC │ 0x7E │
//! │ 1B   │ 1B     │ 1B      │ 1B    │ 1B   │ LENGTH - 5B │ 1B  │ 1B   │
//! └──────┴────────┴─────────┴───────┴──────┴─────────────┴─────┴──────┘
//! ```
//!
//! The delimiter is not escaped inside frames, so the [`LinkReader`] finds
//! frame boundaries by length and CRC rather than by delimiter alone.

#![no_std]
#![deny(unsafe_code)]

pub mod crc;
pub mod frame;
pub mod messages;
pub mod reader;
pub mod settings;
pub mod status;

pub use frame::{Frame, FrameError, FRAME_DELIMITER, MAX_FRAME_SIZE, MAX_PAYLOAD_SIZE};
pub use messages::{ClientMessage, SettingsKind, SpaMessage, ToggleItem};
pub use reader::{LinkReader, ReaderState, ReaderStats};
pub use settings::{FaultLogEntry, FilterCycle, FilterSettings, SpaConfiguration};
pub use status::{
    FilterMode, HeatState, PumpSpeed, RestMode, RunState, StatusPayload, StatusSnapshot,
    TempScale, Temperature,
};
