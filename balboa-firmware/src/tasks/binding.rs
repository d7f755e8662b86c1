//! Switch binding
//!
//! Reports the exposed switches as the spa confirms them and logs the rest
//! of the session's events at a level matching their weight.

use defmt::*;

use balboa_core::config::SwitchSet;
use balboa_core::SessionEvent;
use balboa_protocol::{TempScale, Temperature};

use crate::channels::EVENT_CHANNEL;

fn unit(t: &Temperature) -> &'static str {
    match t.scale() {
        TempScale::Celsius => "C",
        TempScale::Fahrenheit => "F",
    }
}

/// Binding task - consumes session events
#[embassy_executor::task]
pub async fn binding_task(switches: SwitchSet) {
    info!("Binding task started");
    for id in switches.iter() {
        debug!("Exposing switch {}", id.name());
    }

    loop {
        match EVENT_CHANNEL.receive().await {
            SessionEvent::SwitchChanged { id, on } => {
                if switches.contains(id) {
                    info!("Switch {}: {}", id.name(), if on { "ON" } else { "OFF" });
                } else {
                    debug!("Unexposed switch {}: {}", id.name(), on);
                }
            }
            SessionEvent::CurrentTemperature(Some(t)) => {
                info!("Water {=i16} x0.1 {}", t.to_x10(), unit(&t));
            }
            SessionEvent::CurrentTemperature(None) => info!("Water temperature unknown"),
            SessionEvent::TargetTemperature(Some(t)) => {
                info!("Setpoint {=i16} x0.1 {}", t.to_x10(), unit(&t));
            }
            SessionEvent::TargetTemperature(None) => debug!("Setpoint unknown"),
            SessionEvent::Heating(state) => info!("Heater: {:?}", state),
            SessionEvent::HighRange(high) => {
                info!("Range: {}", if high { "high" } else { "low" });
            }
            SessionEvent::RestMode(mode) => info!("Mode: {:?}", mode),
            SessionEvent::Circulation(on) => debug!("Circulation: {}", on),
            SessionEvent::CommandAcked(target) => debug!("Confirmed: {:?}", target),
            SessionEvent::CommandFailed(target) => warn!("Command failed: {:?}", target),
            SessionEvent::ConfigurationReceived(config) => info!(
                "Spa has {} pumps, lights {:?}, blower={}, circulation={}",
                config.pump_count(),
                config.lights,
                config.blower,
                config.circulation
            ),
            SessionEvent::FaultLogReceived(fault) => {
                if fault.total_entries > 0 {
                    warn!(
                        "Last fault {}: {} ({} days ago, {}:{})",
                        fault.code, fault.message, fault.days_ago, fault.hour, fault.minute
                    );
                } else {
                    debug!("Fault log empty");
                }
            }
            SessionEvent::FilterSettingsReceived(filters) => {
                let f1 = filters.filter1;
                info!(
                    "Filter 1 at {}:{} for {} min, filter 2 {}",
                    f1.start_hour,
                    f1.start_minute,
                    f1.duration_total_minutes(),
                    if filters.filter2_enabled { "enabled" } else { "disabled" }
                );
            }
            SessionEvent::Registered { channel } => info!("Registered on channel {=u8:#x}", channel),
            SessionEvent::CommunicationLost => error!("Spa communication lost"),
            SessionEvent::CommunicationRestored => info!("Spa communication restored"),
        }
    }
}
