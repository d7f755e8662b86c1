//! Switch identities
//!
//! Every switch the binding exposes maps to one toggle item on the bus and
//! one flag in the status broadcast.

use balboa_protocol::{StatusSnapshot, ToggleItem};

/// A boolean output of the spa
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SwitchId {
    Jet1,
    Jet2,
    Jet3,
    Lights,
    Lights2,
    Blower,
}

impl SwitchId {
    /// All switches, in status order
    pub const ALL: [SwitchId; 6] = [
        SwitchId::Jet1,
        SwitchId::Jet2,
        SwitchId::Jet3,
        SwitchId::Lights,
        SwitchId::Lights2,
        SwitchId::Blower,
    ];

    /// Position in [`SwitchId::ALL`]
    pub fn index(self) -> usize {
        match self {
            SwitchId::Jet1 => 0,
            SwitchId::Jet2 => 1,
            SwitchId::Jet3 => 2,
            SwitchId::Lights => 3,
            SwitchId::Lights2 => 4,
            SwitchId::Blower => 5,
        }
    }

    /// Configuration name
    pub fn name(self) -> &'static str {
        match self {
            SwitchId::Jet1 => "jet1",
            SwitchId::Jet2 => "jet2",
            SwitchId::Jet3 => "jet3",
            SwitchId::Lights => "lights",
            SwitchId::Lights2 => "lights2",
            SwitchId::Blower => "blower",
        }
    }

    /// Item to toggle on the bus
    pub fn toggle_item(self) -> ToggleItem {
        match self {
            SwitchId::Jet1 => ToggleItem::Jet1,
            SwitchId::Jet2 => ToggleItem::Jet2,
            SwitchId::Jet3 => ToggleItem::Jet3,
            SwitchId::Lights => ToggleItem::Lights,
            SwitchId::Lights2 => ToggleItem::Lights2,
            SwitchId::Blower => ToggleItem::Blower,
        }
    }

    /// Read this switch from a snapshot
    ///
    /// Everything reads as off before the first status broadcast.
    pub fn is_on(self, snapshot: &StatusSnapshot) -> bool {
        match self {
            SwitchId::Jet1 => snapshot.jet_on(0),
            SwitchId::Jet2 => snapshot.jet_on(1),
            SwitchId::Jet3 => snapshot.jet_on(2),
            SwitchId::Lights => snapshot.lights1,
            SwitchId::Lights2 => snapshot.lights2,
            SwitchId::Blower => snapshot.blower,
        }
    }

    /// Parse a switch name as used in configuration and logs
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "jet1" => Some(SwitchId::Jet1),
            "jet2" => Some(SwitchId::Jet2),
            "jet3" => Some(SwitchId::Jet3),
            "lights" | "light" => Some(SwitchId::Lights),
            "lights2" | "light2" => Some(SwitchId::Lights2),
            "blower" => Some(SwitchId::Blower),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use balboa_protocol::{PumpSpeed, StatusPayload};

    #[test]
    fn test_toggle_items_unique() {
        for (i, a) in SwitchId::ALL.iter().enumerate() {
            for b in &SwitchId::ALL[i + 1..] {
                assert_ne!(a.toggle_item(), b.toggle_item());
            }
        }
    }

    #[test]
    fn test_read_from_snapshot() {
        let payload = StatusPayload::new()
            .pump(1, PumpSpeed::Low)
            .lights1(true)
            .blower(true);
        let snapshot = StatusSnapshot::decode(payload.as_bytes()).unwrap();

        assert!(!SwitchId::Jet1.is_on(&snapshot));
        assert!(SwitchId::Jet2.is_on(&snapshot));
        assert!(!SwitchId::Jet3.is_on(&snapshot));
        assert!(SwitchId::Lights.is_on(&snapshot));
        assert!(!SwitchId::Lights2.is_on(&snapshot));
        assert!(SwitchId::Blower.is_on(&snapshot));
    }

    #[test]
    fn test_unknown_reads_off() {
        for id in SwitchId::ALL {
            assert!(!id.is_on(&StatusSnapshot::UNKNOWN));
        }
    }

    #[test]
    fn test_from_name() {
        assert_eq!(SwitchId::from_name("jet3"), Some(SwitchId::Jet3));
        assert_eq!(SwitchId::from_name("light2"), Some(SwitchId::Lights2));
        assert_eq!(SwitchId::from_name("heater"), None);

        for (i, id) in SwitchId::ALL.into_iter().enumerate() {
            assert_eq!(SwitchId::from_name(id.name()), Some(id));
            assert_eq!(id.index(), i);
        }
    }
}
