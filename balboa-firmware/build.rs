//! Build script for balboa-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates spa.toml at compile time

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Switch names accepted in `[switches]` and `[buttons]`
const SWITCH_NAMES: &[&str] = &["jet1", "jet2", "jet3", "lights", "light", "lights2", "light2", "blower"];

fn main() {
    setup_linker();
    validate_config();
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    // Copy memory.x to the output directory
    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    // Tell rustc where to find memory.x
    println!("cargo:rustc-link-search={}", out_dir.display());

    // Re-run if memory.x changes
    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Validate spa.toml at compile time
fn validate_config() {
    println!("cargo:rerun-if-changed=spa.toml");

    let config_path = Path::new("spa.toml");
    if !config_path.exists() {
        fail(
            "spa.toml not found!",
            &["The firmware embeds spa.toml from the balboa-firmware directory.".to_string()],
        );
    }

    let content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => fail("Failed to read spa.toml", &[e.to_string()]),
    };

    let config: toml::Value = match toml::from_str(&content) {
        Ok(value) => value,
        Err(e) => {
            let lines: Vec<String> = e.to_string().lines().map(str::to_string).collect();
            fail("Invalid TOML syntax in spa.toml", &lines);
        }
    };

    let mut errors = Vec::new();
    validate_sections(&config, &mut errors);
    validate_session(&config, &mut errors);
    validate_bus(&config, &mut errors);
    validate_switches(&config, &mut errors);
    validate_buttons(&config, &mut errors);

    if !errors.is_empty() {
        fail("Invalid configuration in spa.toml", &errors);
    }

    println!("cargo:warning=spa.toml validated successfully");
}

/// Abort the build with a boxed error message
fn fail(title: &str, lines: &[String]) -> ! {
    let body = lines
        .iter()
        .map(|line| {
            let truncated = if line.len() > 62 {
                format!("{}...", &line[..59])
            } else {
                line.clone()
            };
            format!("║  • {:<62} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n");
    panic!(
        "\n\
        ╔══════════════════════════════════════════════════════════════════╗\n\
        ║  ERROR: {:<56} ║\n\
        ╠══════════════════════════════════════════════════════════════════╣\n\
        {}\n\
        ╚══════════════════════════════════════════════════════════════════╝\n",
        title, body
    );
}

/// Only the sections the firmware parser understands
fn validate_sections(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(table) = config.as_table() else {
        return;
    };
    for (name, value) in table {
        match name.as_str() {
            "session" | "bus" | "switches" | "buttons" => {
                if !value.is_table() {
                    errors.push(format!("[{}] must be a table", name));
                }
            }
            _ => errors.push(format!("unknown section or key '{}'", name)),
        }
    }
}

fn validate_session(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(session) = config.get("session").and_then(|v| v.as_table()) else {
        return;
    };

    let ranges: &[(&str, i64, i64)] = &[
        ("poll_interval_ms", 1, 1_000),
        ("ack_timeout_ms", 100, 60_000),
        ("max_retries", 1, 255),
        ("link_timeout_ms", 1_000, 600_000),
        ("queue_expiry_ms", 1_000, 3_600_000),
        ("settings_refresh_ms", 10_000, 86_400_000),
    ];
    for (key, min, max) in ranges {
        match session.get(*key) {
            None => {}
            Some(toml::Value::Integer(v)) if (*min..=*max).contains(v) => {}
            Some(_) => errors.push(format!("[session] {} must be an integer {}-{}", key, min, max)),
        }
    }

    if let (Some(toml::Value::Integer(poll)), Some(toml::Value::Integer(ack))) =
        (session.get("poll_interval_ms"), session.get("ack_timeout_ms"))
    {
        if ack <= poll {
            errors.push("[session] ack_timeout_ms must exceed poll_interval_ms".to_string());
        }
    }
}

fn validate_bus(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(bus) = config.get("bus").and_then(|v| v.as_table()) else {
        return;
    };

    if let Some(baud) = bus.get("baudrate") {
        match baud {
            toml::Value::Integer(v) if (1_200..=1_000_000).contains(v) => {}
            _ => errors.push("[bus] baudrate must be an integer 1200-1000000".to_string()),
        }
    }

    for key in ["tx_pin", "rx_pin", "de_pin"] {
        if bus.get(key).is_some_and(|value| pin_number(value).is_none()) {
            errors.push(format!("[bus] {} must be a pin like \"gpio2\"", key));
        }
    }
    for (key, expected) in [("tx_pin", 0), ("rx_pin", 1)] {
        if let Some(pin) = bus.get(key).and_then(pin_number) {
            if pin != expected {
                errors.push(format!("[bus] {} is fixed to gpio{} (UART0)", key, expected));
            }
        }
    }
    if let Some(de) = bus.get("de_pin").and_then(pin_number) {
        if de <= 1 {
            errors.push("[bus] de_pin conflicts with the UART pins".to_string());
        }
    }
}

fn validate_switches(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(switches) = config.get("switches").and_then(|v| v.as_table()) else {
        return;
    };
    for (name, value) in switches {
        if !SWITCH_NAMES.contains(&name.as_str()) {
            errors.push(format!("[switches] unknown switch '{}'", name));
        } else if !value.is_bool() {
            errors.push(format!("[switches] {} must be true or false", name));
        }
    }
}

fn validate_buttons(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(buttons) = config.get("buttons").and_then(|v| v.as_table()) else {
        return;
    };

    let de = config
        .get("bus")
        .and_then(|bus| bus.get("de_pin"))
        .and_then(pin_number);
    let mut seen = Vec::new();

    for (name, value) in buttons {
        if !SWITCH_NAMES.contains(&name.as_str()) {
            errors.push(format!("[buttons] unknown switch '{}'", name));
            continue;
        }
        let Some(pin) = pin_number(value) else {
            errors.push(format!("[buttons] {} must be a pin like \"!gpio14\"", name));
            continue;
        };
        if pin <= 1 || Some(pin) == de {
            errors.push(format!("[buttons] {} uses a bus pin (gpio{})", name, pin));
        }
        if seen.contains(&pin) {
            errors.push(format!("[buttons] gpio{} assigned twice", pin));
        }
        seen.push(pin);
    }
}

/// Parse "gpioN" or "!gpioN"
fn pin_number(value: &toml::Value) -> Option<u8> {
    let s = value.as_str()?;
    let s = s.strip_prefix('!').unwrap_or(s);
    let pin: u8 = s.strip_prefix("gpio")?.parse().ok()?;
    (pin <= 29).then_some(pin)
}
