//! Simple TOML parser for driver configuration
//!
//! This is a minimal TOML parser that handles only the subset needed for
//! the spa configuration. It does NOT support the full TOML spec.
//!
//! Supported features:
//! - Key = value pairs (string, integer, boolean)
//! - [section] headers (`session`, `bus`, `switches`, `buttons`)
//! - Comments (# ...)
//!
//! NOT supported:
//! - Multi-line strings
//! - Arrays and inline tables
//! - Dotted keys

use super::types::{PinConfig, SpaConfig};
use crate::switch::SwitchId;

/// Parse error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// Invalid section header
    InvalidSection,
    /// Invalid value type
    InvalidValue,
    /// Invalid pin string
    InvalidPin,
    /// Line is neither a section, a comment nor a key/value pair
    InvalidLine,
}

/// Current parsing context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Root,
    Session,
    Bus,
    Switches,
    Buttons,
}

/// Parse TOML configuration into SpaConfig
///
/// Missing keys keep their defaults.
pub fn parse_config(input: &str) -> Result<SpaConfig, ParseError> {
    let mut config = SpaConfig::new();
    let mut section = Section::Root;

    for line in input.lines() {
        let line = line.trim();

        // Skip empty lines and comments
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if line.starts_with('[') {
            let header = line
                .strip_prefix('[')
                .and_then(|l| l.split('#').next())
                .map(str::trim)
                .and_then(|l| l.strip_suffix(']'))
                .ok_or(ParseError::InvalidSection)?;
            section = parse_section_header(header)?;
            continue;
        }

        let (key, value) = parse_key_value(line).ok_or(ParseError::InvalidLine)?;
        apply_value(section, key, value, &mut config)?;
    }

    Ok(config)
}

fn parse_section_header(header: &str) -> Result<Section, ParseError> {
    match header.trim() {
        "session" => Ok(Section::Session),
        "bus" => Ok(Section::Bus),
        "switches" => Ok(Section::Switches),
        "buttons" => Ok(Section::Buttons),
        _ => Err(ParseError::InvalidSection),
    }
}

fn apply_value(
    section: Section,
    key: &str,
    value: &str,
    config: &mut SpaConfig,
) -> Result<(), ParseError> {
    match section {
        Section::Session => {
            let s = &mut config.session;
            match key {
                "poll_interval_ms" => s.poll_interval_ms = parse_int(value)?,
                "ack_timeout_ms" => s.ack_timeout_ms = parse_int(value)?,
                "max_retries" => s.max_retries = parse_int(value)?,
                "link_timeout_ms" => s.link_timeout_ms = parse_int(value)?,
                "queue_expiry_ms" => s.queue_expiry_ms = parse_int(value)?,
                "settings_refresh_ms" => s.settings_refresh_ms = parse_int(value)?,
                _ => {} // Ignore unknown keys
            }
        }
        Section::Bus => {
            let b = &mut config.bus;
            match key {
                "baudrate" | "baud_rate" => b.baudrate = parse_int(value)?,
                "tx_pin" => b.tx_pin = parse_pin(value)?,
                "rx_pin" => b.rx_pin = parse_pin(value)?,
                "de_pin" => b.de_pin = Some(parse_pin(value)?),
                _ => {}
            }
        }
        Section::Switches => {
            if let Some(id) = SwitchId::from_name(key) {
                config.switches.set(id, parse_bool(value)?);
            }
        }
        Section::Buttons => {
            if let Some(id) = SwitchId::from_name(key) {
                config.buttons.set(id, Some(parse_pin(value)?));
            }
        }
        Section::Root => {}
    }
    Ok(())
}

/// Parse "key = value" line
fn parse_key_value(line: &str) -> Option<(&str, &str)> {
    let eq_pos = line.find('=')?;
    let key = line[..eq_pos].trim();
    let value = line[eq_pos + 1..].trim();

    // Remove inline comments
    let value = if let Some(hash_pos) = value.find('#') {
        // Make sure # is not inside a string
        let quote_count = value[..hash_pos].matches('"').count();
        if quote_count % 2 == 0 {
            value[..hash_pos].trim()
        } else {
            value
        }
    } else {
        value
    };

    if key.is_empty() || value.is_empty() {
        return None;
    }

    Some((key, value))
}

/// Parse a string value (removes quotes)
fn parse_string(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

/// Parse an integer value, allowing `_` digit separators
fn parse_int<T: core::str::FromStr>(value: &str) -> Result<T, ParseError> {
    let mut digits: heapless::String<16> = heapless::String::new();
    for c in value.chars().filter(|&c| c != '_') {
        digits.push(c).map_err(|_| ParseError::InvalidValue)?;
    }
    digits.parse().map_err(|_| ParseError::InvalidValue)
}

/// Parse a boolean value
fn parse_bool(value: &str) -> Result<bool, ParseError> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ParseError::InvalidValue),
    }
}

/// Parse a pin string like "gpio4" or "!gpio5"
fn parse_pin(value: &str) -> Result<PinConfig, ParseError> {
    let value = parse_string(value);
    let (inverted, s) = match value.strip_prefix('!') {
        Some(rest) => (true, rest),
        None => (false, value),
    };

    let pin: u8 = s
        .strip_prefix("gpio")
        .ok_or(ParseError::InvalidPin)?
        .parse()
        .map_err(|_| ParseError::InvalidPin)?;
    if pin > 29 {
        return Err(ParseError::InvalidPin);
    }

    Ok(PinConfig { pin, inverted })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionConfig;

    #[test]
    fn test_parse_key_value() {
        assert_eq!(parse_key_value("key = value"), Some(("key", "value")));
        assert_eq!(parse_key_value("key=123"), Some(("key", "123")));
        assert_eq!(
            parse_key_value("pin = \"gpio4\" # comment"),
            Some(("pin", "\"gpio4\""))
        );
        assert_eq!(parse_key_value("key ="), None);
        assert_eq!(parse_key_value("no equals"), None);
    }

    #[test]
    fn test_parse_pin() {
        let pin = parse_pin("gpio4").unwrap();
        assert_eq!(pin.pin, 4);
        assert!(!pin.inverted);

        let pin = parse_pin("\"!gpio12\"").unwrap();
        assert_eq!(pin.pin, 12);
        assert!(pin.inverted);

        assert_eq!(parse_pin("pin4"), Err(ParseError::InvalidPin));
        assert_eq!(parse_pin("gpio30"), Err(ParseError::InvalidPin));
    }

    #[test]
    fn test_parse_int_separators() {
        assert_eq!(parse_int::<u32>("300_000"), Ok(300_000));
        assert_eq!(parse_int::<u8>("300"), Err(ParseError::InvalidValue));
        assert_eq!(parse_int::<u32>("fast"), Err(ParseError::InvalidValue));
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = parse_config("# nothing here\n").unwrap();
        assert_eq!(config, SpaConfig::default());
    }

    #[test]
    fn test_parse_full_config() {
        let config_str = r#"
[session]
poll_interval_ms = 20
ack_timeout_ms = 2000   # slow mainboard
max_retries = 5
link_timeout_ms = 15_000

[bus]
baudrate = 115200
tx_pin = "gpio4"
rx_pin = "gpio5"
de_pin = "gpio6"

[switches]
jet3 = false
lights2 = false

[buttons]
lights = "!gpio14"
"#;

        let config = parse_config(config_str).unwrap();
        assert_eq!(config.session.poll_interval_ms, 20);
        assert_eq!(config.session.ack_timeout_ms, 2000);
        assert_eq!(config.session.max_retries, 5);
        assert_eq!(config.session.link_timeout_ms, 15_000);
        assert_eq!(
            config.session.queue_expiry_ms,
            SessionConfig::default().queue_expiry_ms
        );
        assert_eq!(config.bus.tx_pin.pin, 4);
        assert_eq!(config.bus.rx_pin.pin, 5);
        assert_eq!(config.bus.de_pin, Some(PinConfig::new(6)));
        assert!(config.switches.contains(SwitchId::Jet1));
        assert!(!config.switches.contains(SwitchId::Jet3));
        assert!(!config.switches.contains(SwitchId::Lights2));
        assert_eq!(
            config.buttons.get(SwitchId::Lights),
            Some(PinConfig::inverted(14))
        );
        assert_eq!(config.buttons.get(SwitchId::Jet1), None);
    }

    #[test]
    fn test_unknown_section_rejected() {
        assert_eq!(
            parse_config("[heater]\nmax_temp = 40\n"),
            Err(ParseError::InvalidSection)
        );
    }

    #[test]
    fn test_bad_value_rejected() {
        assert_eq!(
            parse_config("[session]\nmax_retries = lots\n"),
            Err(ParseError::InvalidValue)
        );
        assert_eq!(
            parse_config("[switches]\njet1 = yes\n"),
            Err(ParseError::InvalidValue)
        );
        assert_eq!(parse_config("[bus]\nstray line\n"), Err(ParseError::InvalidLine));
        assert_eq!(
            parse_config("[buttons]\nblower = \"pin3\"\n"),
            Err(ParseError::InvalidPin)
        );
    }
}
