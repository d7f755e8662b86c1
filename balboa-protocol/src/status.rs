//! Status broadcast decoding
//!
//! The spa broadcasts its full state several times per second on channel
//! 0xFF (type 0x13). Offsets below index the frame payload, i.e. the bytes
//! after CHANNEL, MAGIC and TYPE.

// Payload offsets
const OFFSET_RUN_STATE: usize = 0;
const OFFSET_CURRENT_TEMP: usize = 2;
const OFFSET_HOUR: usize = 3;
const OFFSET_MINUTE: usize = 4;
const OFFSET_REST_MODE: usize = 5;
const OFFSET_FLAGS_DISPLAY: usize = 9;
const OFFSET_FLAGS_HEATING: usize = 10;
const OFFSET_PUMPS: usize = 11;
const OFFSET_FLAGS_AUX: usize = 13;
const OFFSET_LIGHTS: usize = 14;
const OFFSET_TARGET_TEMP: usize = 20;

/// Shortest status payload that carries every decoded field
pub const STATUS_MIN_PAYLOAD: usize = OFFSET_TARGET_TEMP + 1;

/// Raw temperature value the spa uses while it has no reading
const TEMP_UNKNOWN: u8 = 0xFF;

/// Setpoint limits, in tenths of a degree
pub const MIN_SETPOINT_C_X10: i16 = 70;
pub const MAX_SETPOINT_C_X10: i16 = 400;
pub const MIN_SETPOINT_F_X10: i16 = 450;
pub const MAX_SETPOINT_F_X10: i16 = 1040;

/// Water readings at or above boiling are sensor noise
const BOILING_C_X10: i16 = 1000;
const BOILING_F_X10: i16 = 2120;

/// Temperature scale the spa panel is set to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TempScale {
    /// Whole degrees Fahrenheit on the wire
    #[default]
    Fahrenheit,
    /// Half degrees Celsius on the wire
    Celsius,
}

/// A temperature as carried on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Temperature {
    raw: u8,
    scale: TempScale,
}

impl Temperature {
    /// Wrap a raw wire value
    pub const fn from_raw(raw: u8, scale: TempScale) -> Self {
        Self { raw, scale }
    }

    /// Convert tenths of a degree (in `scale`) to the nearest wire value
    ///
    /// Returns `None` if the value cannot be represented.
    pub fn from_x10(x10: i16, scale: TempScale) -> Option<Self> {
        if x10 < 0 {
            return None;
        }
        let x10 = i32::from(x10);
        let raw = match scale {
            TempScale::Fahrenheit => (x10 + 5) / 10,
            TempScale::Celsius => (x10 + 2) / 5,
        };
        u8::try_from(raw).ok().map(|raw| Self { raw, scale })
    }

    /// Build a setpoint, rejecting values outside the spa's range
    pub fn setpoint(x10: i16, scale: TempScale) -> Option<Self> {
        Self::from_x10(x10, scale).filter(|t| t.is_valid_setpoint())
    }

    /// Raw wire value
    pub fn raw(&self) -> u8 {
        self.raw
    }

    /// Scale of the raw value
    pub fn scale(&self) -> TempScale {
        self.scale
    }

    /// Temperature in tenths of a degree of its own scale
    ///
    /// For example, 38.5°C is returned as 385.
    pub fn to_x10(&self) -> i16 {
        match self.scale {
            TempScale::Fahrenheit => self.raw as i16 * 10,
            TempScale::Celsius => self.raw as i16 * 5,
        }
    }

    /// Check the value lies in the range the spa accepts as a target
    pub fn is_valid_setpoint(&self) -> bool {
        let x10 = self.to_x10();
        match self.scale {
            TempScale::Fahrenheit => (MIN_SETPOINT_F_X10..=MAX_SETPOINT_F_X10).contains(&x10),
            TempScale::Celsius => (MIN_SETPOINT_C_X10..=MAX_SETPOINT_C_X10).contains(&x10),
        }
    }

    /// Check the value is a believable water temperature
    fn is_plausible_reading(&self) -> bool {
        let x10 = self.to_x10();
        match self.scale {
            TempScale::Fahrenheit => x10 < BOILING_F_X10,
            TempScale::Celsius => x10 < BOILING_C_X10,
        }
    }
}

/// Overall controller state (payload byte 0)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RunState {
    Running,
    Initializing,
    /// Hold mode, pumps and heater locked out
    Hold,
    /// Sensor A/B temperatures shown on the panel
    AbTemps,
    Test,
    Other(u8),
}

impl RunState {
    fn from_byte(byte: u8) -> Self {
        match byte {
            0x00 => RunState::Running,
            0x01 => RunState::Initializing,
            0x05 => RunState::Hold,
            0x14 => RunState::AbTemps,
            0x17 => RunState::Test,
            other => RunState::Other(other),
        }
    }

    /// Check if the controller reports a condition that stops normal operation
    pub fn is_fault(&self) -> bool {
        matches!(self, RunState::Hold | RunState::Test)
    }
}

/// Heating mode (payload byte 5)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RestMode {
    /// Heats whenever the water drops below target
    Ready,
    /// Heats only during filter cycles
    Rest,
    /// Rest mode, temporarily heating after a panel button press
    ReadyInRest,
    Other(u8),
}

impl RestMode {
    fn from_byte(byte: u8) -> Self {
        match byte {
            0x00 => RestMode::Ready,
            0x01 => RestMode::Rest,
            0x03 => RestMode::ReadyInRest,
            other => RestMode::Other(other),
        }
    }
}

/// Heater activity (payload byte 10, bits 4-5)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HeatState {
    #[default]
    Off,
    Heating,
    /// Heat requested, waiting for the pump to run first
    Waiting,
}

impl HeatState {
    fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0 => HeatState::Off,
            2 => HeatState::Waiting,
            _ => HeatState::Heating,
        }
    }
}

/// Filter cycle activity (payload byte 9, bits 2-3)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FilterMode {
    #[default]
    Off,
    Cycle1,
    Cycle2,
    Both,
}

impl FilterMode {
    fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0 => FilterMode::Off,
            1 => FilterMode::Cycle1,
            2 => FilterMode::Cycle2,
            _ => FilterMode::Both,
        }
    }
}

/// Pump speed (payload byte 11, two bits per pump)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PumpSpeed {
    #[default]
    Off,
    Low,
    High,
}

impl PumpSpeed {
    fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0 => PumpSpeed::Off,
            1 => PumpSpeed::Low,
            _ => PumpSpeed::High,
        }
    }

    /// Single-speed pumps report `High` when running
    pub fn is_on(&self) -> bool {
        !matches!(self, PumpSpeed::Off)
    }
}

/// Decoded device state at one point in time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatusSnapshot {
    /// False only for [`StatusSnapshot::UNKNOWN`]
    pub known: bool,
    pub run_state: RunState,
    /// Water temperature, `None` while the spa has no reading
    pub current_temp: Option<Temperature>,
    pub target_temp: Option<Temperature>,
    pub hour: u8,
    pub minute: u8,
    pub clock_24h: bool,
    pub rest_mode: RestMode,
    pub scale: TempScale,
    pub filter_mode: FilterMode,
    pub heating: HeatState,
    pub high_range: bool,
    /// Jet pumps 1-3
    pub pumps: [PumpSpeed; 3],
    pub circulation: bool,
    pub blower: bool,
    pub lights1: bool,
    pub lights2: bool,
}

impl StatusSnapshot {
    /// State before any status broadcast has been received
    pub const UNKNOWN: Self = Self {
        known: false,
        run_state: RunState::Initializing,
        current_temp: None,
        target_temp: None,
        hour: 0,
        minute: 0,
        clock_24h: false,
        rest_mode: RestMode::Ready,
        scale: TempScale::Fahrenheit,
        filter_mode: FilterMode::Off,
        heating: HeatState::Off,
        high_range: false,
        pumps: [PumpSpeed::Off; 3],
        circulation: false,
        blower: false,
        lights1: false,
        lights2: false,
    };

    /// Decode a status payload
    ///
    /// Returns `None` when the payload is too short to hold every field.
    pub fn decode(payload: &[u8]) -> Option<Self> {
        if payload.len() < STATUS_MIN_PAYLOAD {
            return None;
        }

        let display = payload[OFFSET_FLAGS_DISPLAY];
        let scale = if display & 0x01 != 0 {
            TempScale::Celsius
        } else {
            TempScale::Fahrenheit
        };

        let current_temp = match payload[OFFSET_CURRENT_TEMP] {
            TEMP_UNKNOWN | 0 => None,
            raw => Some(Temperature::from_raw(raw, scale)).filter(|t| t.is_plausible_reading()),
        };
        let target_temp = Some(Temperature::from_raw(payload[OFFSET_TARGET_TEMP], scale))
            .filter(|t| t.is_valid_setpoint());

        let heating_flags = payload[OFFSET_FLAGS_HEATING];
        let pumps = payload[OFFSET_PUMPS];
        let aux = payload[OFFSET_FLAGS_AUX];
        let lights = payload[OFFSET_LIGHTS];

        Some(Self {
            known: true,
            run_state: RunState::from_byte(payload[OFFSET_RUN_STATE]),
            current_temp,
            target_temp,
            hour: payload[OFFSET_HOUR],
            minute: payload[OFFSET_MINUTE],
            clock_24h: display & 0x02 != 0,
            rest_mode: RestMode::from_byte(payload[OFFSET_REST_MODE]),
            scale,
            filter_mode: FilterMode::from_bits(display >> 2),
            heating: HeatState::from_bits(heating_flags >> 4),
            high_range: heating_flags & 0x04 != 0,
            pumps: [
                PumpSpeed::from_bits(pumps),
                PumpSpeed::from_bits(pumps >> 2),
                PumpSpeed::from_bits(pumps >> 4),
            ],
            circulation: aux & 0x02 != 0,
            blower: aux & 0x04 != 0,
            lights1: lights & 0x03 != 0,
            lights2: lights & 0x0C != 0,
        })
    }

    /// Check whether jet `index` (0-based) is running
    pub fn jet_on(&self, index: usize) -> bool {
        self.pumps.get(index).map(|p| p.is_on()).unwrap_or(false)
    }
}

/// Builder for status payloads, used by tests and bus simulators
#[derive(Debug, Clone, Copy)]
pub struct StatusPayload {
    bytes: [u8; STATUS_MIN_PAYLOAD + 3],
}

impl Default for StatusPayload {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusPayload {
    /// A running spa in °F with everything off and no temperature reading
    pub fn new() -> Self {
        let mut bytes = [0u8; STATUS_MIN_PAYLOAD + 3];
        bytes[OFFSET_CURRENT_TEMP] = TEMP_UNKNOWN;
        bytes[OFFSET_TARGET_TEMP] = 100;
        Self { bytes }
    }

    pub fn celsius(mut self) -> Self {
        self.bytes[OFFSET_FLAGS_DISPLAY] |= 0x01;
        self
    }

    pub fn current_raw(mut self, raw: u8) -> Self {
        self.bytes[OFFSET_CURRENT_TEMP] = raw;
        self
    }

    pub fn target_raw(mut self, raw: u8) -> Self {
        self.bytes[OFFSET_TARGET_TEMP] = raw;
        self
    }

    pub fn time(mut self, hour: u8, minute: u8) -> Self {
        self.bytes[OFFSET_HOUR] = hour;
        self.bytes[OFFSET_MINUTE] = minute;
        self
    }

    pub fn rest_mode(mut self, byte: u8) -> Self {
        self.bytes[OFFSET_REST_MODE] = byte;
        self
    }

    pub fn pump(mut self, index: usize, speed: PumpSpeed) -> Self {
        let bits = match speed {
            PumpSpeed::Off => 0,
            PumpSpeed::Low => 1,
            PumpSpeed::High => 2,
        };
        let shift = (index * 2) as u8;
        self.bytes[OFFSET_PUMPS] &= !(0x03 << shift);
        self.bytes[OFFSET_PUMPS] |= bits << shift;
        self
    }

    pub fn heating(mut self, state: HeatState) -> Self {
        let bits = match state {
            HeatState::Off => 0,
            HeatState::Heating => 1,
            HeatState::Waiting => 2,
        };
        self.bytes[OFFSET_FLAGS_HEATING] &= !0x30;
        self.bytes[OFFSET_FLAGS_HEATING] |= bits << 4;
        self
    }

    pub fn high_range(mut self, on: bool) -> Self {
        set_bit(&mut self.bytes[OFFSET_FLAGS_HEATING], 0x04, on);
        self
    }

    pub fn circulation(mut self, on: bool) -> Self {
        set_bit(&mut self.bytes[OFFSET_FLAGS_AUX], 0x02, on);
        self
    }

    pub fn blower(mut self, on: bool) -> Self {
        set_bit(&mut self.bytes[OFFSET_FLAGS_AUX], 0x04, on);
        self
    }

    pub fn lights1(mut self, on: bool) -> Self {
        set_bit(&mut self.bytes[OFFSET_LIGHTS], 0x03, on);
        self
    }

    pub fn lights2(mut self, on: bool) -> Self {
        set_bit(&mut self.bytes[OFFSET_LIGHTS], 0x0C, on);
        self
    }

    /// Raw payload bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

fn set_bit(byte: &mut u8, mask: u8, on: bool) {
    if on {
        *byte |= mask;
    } else {
        *byte &= !mask;
    }
}
