//! Decoders for settings replies (configuration, fault log, filter cycles)
//!
//! These frames are addressed to our channel after a settings request. As
//! with status, offsets index the frame payload.

/// Installed equipment reported in a configuration reply (0x2E)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SpaConfiguration {
    /// Pumps 1-6, 0 = not installed, otherwise number of speeds
    pub pumps: [u8; 6],
    /// Lights 1-2, 0 = not installed
    pub lights: [u8; 2],
    pub circulation: bool,
    pub blower: bool,
    pub mister: bool,
    pub aux1: bool,
    pub aux2: bool,
}

impl SpaConfiguration {
    /// Minimum payload length
    pub const MIN_PAYLOAD: usize = 5;

    /// Decode a configuration payload
    pub fn decode(payload: &[u8]) -> Option<Self> {
        if payload.len() < Self::MIN_PAYLOAD {
            return None;
        }
        let (p0, p1, p2, p3, p4) = (payload[0], payload[1], payload[2], payload[3], payload[4]);

        Some(Self {
            pumps: [
                p0 & 0x03,
                (p0 >> 2) & 0x03,
                (p0 >> 4) & 0x03,
                (p0 >> 6) & 0x03,
                p1 & 0x03,
                (p1 >> 6) & 0x03,
            ],
            lights: [p2 & 0x03, (p2 >> 2) & 0x03],
            circulation: p3 & 0x80 != 0,
            blower: p3 & 0x03 != 0,
            mister: p4 & 0x30 != 0,
            aux1: p4 & 0x01 != 0,
            aux2: p4 & 0x02 != 0,
        })
    }

    /// Number of installed pumps
    pub fn pump_count(&self) -> usize {
        self.pumps.iter().filter(|&&p| p != 0).count()
    }
}

/// One entry of the spa fault log (0x28)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FaultLogEntry {
    /// Number of entries in the log
    pub total_entries: u8,
    /// Index of this entry
    pub entry: u8,
    pub code: u8,
    /// Human readable description of `code`
    pub message: &'static str,
    pub days_ago: u8,
    pub hour: u8,
    pub minute: u8,
}

impl FaultLogEntry {
    /// Minimum payload length
    pub const MIN_PAYLOAD: usize = 6;

    /// Decode a fault log payload
    pub fn decode(payload: &[u8]) -> Option<Self> {
        if payload.len() < Self::MIN_PAYLOAD {
            return None;
        }
        Some(Self {
            total_entries: payload[0],
            entry: payload[1],
            code: payload[2],
            message: fault_message(payload[2]),
            days_ago: payload[3],
            hour: payload[4],
            minute: payload[5],
        })
    }
}

/// Describe a fault code as shown on the spa panel
pub fn fault_message(code: u8) -> &'static str {
    match code {
        15 => "Sensors are out of sync",
        16 => "The water flow is low",
        17 => "The water flow has failed",
        18 | 21 => "The settings have been reset",
        19 => "Priming Mode",
        20 => "The clock has failed",
        22 => "Program memory failure",
        26 => "Sensors are out of sync -- Call for service",
        27 => "The heater is dry",
        28 => "The heater may be dry",
        29 => "The water is too hot",
        30 => "The heater is too hot",
        31 => "Sensor A Fault",
        32 => "Sensor B Fault",
        34 => "A pump may be stuck on",
        35 => "Hot fault",
        36 => "The GFCI test failed",
        37 => "Standby Mode (Hold Mode)",
        _ => "Unknown error",
    }
}

/// Start time and duration of one filter cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FilterCycle {
    pub start_hour: u8,
    pub start_minute: u8,
    pub duration_hours: u8,
    pub duration_minutes: u8,
}

impl FilterCycle {
    fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            start_hour: bytes[0],
            start_minute: bytes[1],
            duration_hours: bytes[2],
            duration_minutes: bytes[3],
        }
    }

    /// Total run time in minutes
    pub fn duration_total_minutes(&self) -> u16 {
        self.duration_hours as u16 * 60 + self.duration_minutes as u16
    }
}

/// Filter cycle schedule (0x23)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FilterSettings {
    pub filter1: FilterCycle,
    pub filter2: FilterCycle,
    pub filter2_enabled: bool,
}

impl FilterSettings {
    /// Minimum payload length
    pub const MIN_PAYLOAD: usize = 8;

    /// Decode a filter cycle payload
    pub fn decode(payload: &[u8]) -> Option<Self> {
        if payload.len() < Self::MIN_PAYLOAD {
            return None;
        }
        // Filter 2 enable shares a byte with its start hour
        let second = [payload[4] & 0x7F, payload[5], payload[6], payload[7]];
        let filter2_enabled = payload[4] & 0x80 != 0;

        Some(Self {
            filter1: FilterCycle::from_bytes(&payload[0..4]),
            filter2: FilterCycle::from_bytes(&second),
            filter2_enabled,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_decode() {
        // Two 2-speed pumps, one light, circulation pump, blower
        let payload = [0x0A, 0x00, 0x01, 0x81, 0x00, 0x00];
        let config = SpaConfiguration::decode(&payload).unwrap();

        assert_eq!(config.pumps, [2, 2, 0, 0, 0, 0]);
        assert_eq!(config.pump_count(), 2);
        assert_eq!(config.lights, [1, 0]);
        assert!(config.circulation);
        assert!(config.blower);
        assert!(!config.mister);
        assert!(!config.aux1);
        assert!(!config.aux2);
    }

    #[test]
    fn test_configuration_high_pumps_and_aux() {
        let payload = [0x00, 0xC1, 0x04, 0x00, 0x33];
        let config = SpaConfiguration::decode(&payload).unwrap();

        assert_eq!(config.pumps[4], 1);
        assert_eq!(config.pumps[5], 3);
        assert_eq!(config.lights, [0, 1]);
        assert!(config.mister);
        assert!(config.aux1);
        assert!(config.aux2);
    }

    #[test]
    fn test_configuration_short_payload() {
        assert!(SpaConfiguration::decode(&[0x0A, 0x00, 0x01, 0x81]).is_none());
    }

    #[test]
    fn test_fault_log_decode() {
        let payload = [0x18, 0x17, 0x10, 0x02, 0x0E, 0x1E];
        let entry = FaultLogEntry::decode(&payload).unwrap();

        assert_eq!(entry.total_entries, 24);
        assert_eq!(entry.entry, 23);
        assert_eq!(entry.code, 16);
        assert_eq!(entry.message, "The water flow is low");
        assert_eq!(entry.days_ago, 2);
        assert_eq!((entry.hour, entry.minute), (14, 30));
    }

    #[test]
    fn test_fault_messages() {
        assert_eq!(fault_message(18), fault_message(21));
        assert_eq!(fault_message(37), "Standby Mode (Hold Mode)");
        assert_eq!(fault_message(0), "Unknown error");
        assert_eq!(fault_message(33), "Unknown error");
    }

    #[test]
    fn test_filter_settings_decode() {
        let payload = [0x08, 0x00, 0x02, 0x00, 0x94, 0x1E, 0x01, 0x2D];
        let settings = FilterSettings::decode(&payload).unwrap();

        assert_eq!(settings.filter1.start_hour, 8);
        assert_eq!(settings.filter1.duration_total_minutes(), 120);
        assert!(settings.filter2_enabled);
        assert_eq!(settings.filter2.start_hour, 20);
        assert_eq!(settings.filter2.start_minute, 30);
        assert_eq!(settings.filter2.duration_total_minutes(), 105);
    }

    #[test]
    fn test_filter2_disabled() {
        let payload = [0x08, 0x00, 0x02, 0x00, 0x14, 0x00, 0x01, 0x00];
        let settings = FilterSettings::decode(&payload).unwrap();
        assert!(!settings.filter2_enabled);
        assert_eq!(settings.filter2.start_hour, 20);
    }
}
