//! Device state tracking
//!
//! The spa is the source of truth. State here only ever changes when a
//! status broadcast says so; commands are never applied optimistically.

pub mod events;
pub mod registration;
pub mod store;
pub mod thermostat;

pub use events::SessionEvent;
pub use registration::{Registration, RegistrationEvent};
pub use store::{Changes, DeviceStateStore};
pub use thermostat::{ThermostatAction, ThermostatMode, ThermostatPreset, ThermostatState};
