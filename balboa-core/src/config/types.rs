//! Configuration type definitions
//!
//! These types represent the driver configuration. The firmware embeds it
//! as TOML and parses it at boot with [`super::parse_config`].

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::switch::SwitchId;

/// Session timing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SessionConfig {
    /// Interval between `poll()` calls (ms)
    pub poll_interval_ms: u32,
    /// How long a sent command may go unconfirmed before it is retried (ms)
    pub ack_timeout_ms: u32,
    /// Unconfirmed attempts before a command is reported failed
    pub max_retries: u8,
    /// Silence on the bus before communication is declared lost (ms)
    pub link_timeout_ms: u32,
    /// How long a command may wait for its first clear-to-send (ms)
    pub queue_expiry_ms: u32,
    /// Interval between fault log and filter cycle refreshes (ms)
    pub settings_refresh_ms: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 50,
            ack_timeout_ms: 1500,
            max_retries: 3,
            link_timeout_ms: 10_000,
            queue_expiry_ms: 30_000,
            settings_refresh_ms: 300_000,
        }
    }
}

/// GPIO pin assignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PinConfig {
    /// GPIO pin number (0-29 for RP2040)
    pub pin: u8,
    /// Pin is active-low (inverted)
    pub inverted: bool,
}

impl PinConfig {
    /// Create a new pin config
    pub const fn new(pin: u8) -> Self {
        Self {
            pin,
            inverted: false,
        }
    }

    /// Create an inverted (active-low) pin
    pub const fn inverted(pin: u8) -> Self {
        Self {
            pin,
            inverted: true,
        }
    }
}

/// RS-485 transceiver wiring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BusConfig {
    pub baudrate: u32,
    pub tx_pin: PinConfig,
    pub rx_pin: PinConfig,
    /// Driver enable, for transceivers without automatic direction control
    pub de_pin: Option<PinConfig>,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            baudrate: 115_200,
            tx_pin: PinConfig::new(0),
            rx_pin: PinConfig::new(1),
            de_pin: None,
        }
    }
}

/// Which switches the binding exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SwitchSet {
    bits: u8,
}

impl Default for SwitchSet {
    /// All switches exposed
    fn default() -> Self {
        Self::all()
    }
}

impl SwitchSet {
    pub const fn empty() -> Self {
        Self { bits: 0 }
    }

    pub const fn all() -> Self {
        Self { bits: 0x3F }
    }

    fn bit(id: SwitchId) -> u8 {
        match id {
            SwitchId::Jet1 => 0x01,
            SwitchId::Jet2 => 0x02,
            SwitchId::Jet3 => 0x04,
            SwitchId::Lights => 0x08,
            SwitchId::Lights2 => 0x10,
            SwitchId::Blower => 0x20,
        }
    }

    pub fn set(&mut self, id: SwitchId, enabled: bool) {
        if enabled {
            self.bits |= Self::bit(id);
        } else {
            self.bits &= !Self::bit(id);
        }
    }

    pub fn contains(&self, id: SwitchId) -> bool {
        self.bits & Self::bit(id) != 0
    }

    /// Iterate the exposed switches in status order
    pub fn iter(&self) -> impl Iterator<Item = SwitchId> + '_ {
        SwitchId::ALL.into_iter().filter(move |id| self.contains(*id))
    }
}

/// Local pushbuttons that toggle a switch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ButtonMap {
    /// Indexed in [`SwitchId::ALL`] order
    pins: [Option<PinConfig>; 6],
}

impl ButtonMap {
    pub fn set(&mut self, id: SwitchId, pin: Option<PinConfig>) {
        self.pins[id.index()] = pin;
    }

    pub fn get(&self, id: SwitchId) -> Option<PinConfig> {
        self.pins[id.index()]
    }

    /// Configured buttons, in status order
    pub fn iter(&self) -> impl Iterator<Item = (SwitchId, PinConfig)> + '_ {
        SwitchId::ALL
            .into_iter()
            .filter_map(move |id| self.get(id).map(|pin| (id, pin)))
    }
}

/// Complete driver configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SpaConfig {
    pub session: SessionConfig,
    pub bus: BusConfig,
    pub switches: SwitchSet,
    pub buttons: ButtonMap,
}

impl SpaConfig {
    /// Create a configuration with every value at its default
    pub fn new() -> Self {
        Self::default()
    }
}
