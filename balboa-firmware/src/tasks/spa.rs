//! Spa bus task
//!
//! Owns the RS-485 link and the session. Toggle requests are applied
//! between polls and session events are forwarded to the binding.

use defmt::*;
use embassy_time::{Duration, Instant, Ticker, Timer};

use balboa_core::config::SessionConfig;
use balboa_core::{Session, SessionEvent};
use balboa_hal_rp2040::{EmbassyClock, Rs485Link};

use crate::channels::{EVENT_CHANNEL, TOGGLE_REQUESTS};

/// Pause before restarting the session after a link fault
const FAULT_BACKOFF_MS: u64 = 1_000;

/// Interval between bus statistics log lines
const STATS_INTERVAL_S: u64 = 60;

/// Spa task - polls the session every `poll_interval_ms`
#[embassy_executor::task]
pub async fn spa_task(link: Rs485Link, config: SessionConfig) {
    info!("Spa task started");

    let mut session = Session::new(link, EmbassyClock::new(), config);
    let mut ticker = Ticker::every(Duration::from_millis(session.poll_interval_ms() as u64));
    let mut last_stats = Instant::now();

    loop {
        ticker.next().await;

        while let Ok(id) = TOGGLE_REQUESTS.try_receive() {
            // Flip relative to what the spa last reported
            let on = !session.is_on(id);
            debug!("Request {} -> {}", id.name(), on);
            session.set_state(id, on);
        }

        match session.poll() {
            Ok(summary) => {
                if summary.sent > 0 {
                    trace!("Poll: {:?}", summary);
                }
            }
            Err(e) => {
                error!("Spa link fault: {:?}, restarting session", e);
                Timer::after(Duration::from_millis(FAULT_BACKOFF_MS)).await;
                session.reinitialize();
            }
        }

        session.dispatch(&mut |event: &SessionEvent| {
            if EVENT_CHANNEL.try_send(*event).is_err() {
                warn!("Event channel full, dropping {:?}", event);
            }
        });

        if last_stats.elapsed() >= Duration::from_secs(STATS_INTERVAL_S) {
            last_stats = Instant::now();
            let stats = session.reader_stats();
            info!(
                "Bus: {} frames, {} corrupt, {} bytes dropped, {} pending, communicating={}",
                stats.frames,
                stats.corrupt_frames,
                stats.dropped_bytes + stats.overflow_bytes,
                session.pending_commands(),
                session.is_communicating()
            );
            if session.dropped_events() > 0 {
                warn!("{} session events overwritten", session.dropped_events());
            }
        }
    }
}
