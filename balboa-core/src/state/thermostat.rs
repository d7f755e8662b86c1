//! Thermostat view of the status snapshot

use balboa_protocol::{HeatState, RestMode, StatusSnapshot, Temperature};

/// Heater mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ThermostatMode {
    /// Ready mode, heats on demand
    Heat,
    /// Rest mode, heats only during filter cycles
    Off,
}

/// What the heater is doing right now
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ThermostatAction {
    Heating,
    Idle,
}

/// Temperature range preset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ThermostatPreset {
    /// High range
    Home,
    /// Low range
    Eco,
}

/// Climate-style summary of the spa heater
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ThermostatState {
    pub current: Option<Temperature>,
    pub target: Option<Temperature>,
    pub action: ThermostatAction,
    pub mode: ThermostatMode,
    pub preset: ThermostatPreset,
}

impl ThermostatState {
    pub fn from_snapshot(snapshot: &StatusSnapshot) -> Self {
        Self {
            current: snapshot.current_temp,
            target: snapshot.target_temp,
            action: match snapshot.heating {
                HeatState::Heating => ThermostatAction::Heating,
                HeatState::Off | HeatState::Waiting => ThermostatAction::Idle,
            },
            mode: match snapshot.rest_mode {
                RestMode::Rest => ThermostatMode::Off,
                _ => ThermostatMode::Heat,
            },
            preset: if snapshot.high_range {
                ThermostatPreset::Home
            } else {
                ThermostatPreset::Eco
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use balboa_protocol::StatusPayload;

    #[test]
    fn test_view() {
        let payload = StatusPayload::new()
            .celsius()
            .current_raw(74)
            .target_raw(76)
            .heating(HeatState::Heating)
            .high_range(true);
        let snapshot = StatusSnapshot::decode(payload.as_bytes()).unwrap();
        let view = ThermostatState::from_snapshot(&snapshot);

        assert_eq!(view.current.map(|t| t.to_x10()), Some(370));
        assert_eq!(view.target.map(|t| t.to_x10()), Some(380));
        assert_eq!(view.action, ThermostatAction::Heating);
        assert_eq!(view.mode, ThermostatMode::Heat);
        assert_eq!(view.preset, ThermostatPreset::Home);
    }

    #[test]
    fn test_rest_mode_is_off() {
        let payload = StatusPayload::new()
            .rest_mode(0x01)
            .heating(HeatState::Waiting);
        let snapshot = StatusSnapshot::decode(payload.as_bytes()).unwrap();
        let view = ThermostatState::from_snapshot(&snapshot);

        assert_eq!(view.mode, ThermostatMode::Off);
        assert_eq!(view.action, ThermostatAction::Idle);
        assert_eq!(view.preset, ThermostatPreset::Eco);
    }
}
