//! Configuration loading
//!
//! build.rs has already validated spa.toml with the full TOML parser. If the
//! embedded subset parser still rejects it, the defaults are used.

use defmt::*;

use balboa_core::config::{parse_config, SpaConfig};

/// Parse the embedded configuration
pub fn load(source: &str) -> SpaConfig {
    match parse_config(source) {
        Ok(config) => {
            info!(
                "Config: poll={}ms ack={}ms retries={} link_timeout={}ms",
                config.session.poll_interval_ms,
                config.session.ack_timeout_ms,
                config.session.max_retries,
                config.session.link_timeout_ms
            );
            config
        }
        Err(e) => {
            error!("Embedded config rejected: {:?}, using defaults", e);
            SpaConfig::default()
        }
    }
}
