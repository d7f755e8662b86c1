//! Pushbutton task
//!
//! Samples the configured buttons and turns each debounced press into a
//! toggle request for its switch.

use defmt::*;
use embassy_rp::gpio::Input;
use embassy_time::{Duration, Ticker};
use heapless::Vec;

use balboa_core::SwitchId;

use crate::channels::TOGGLE_REQUESTS;

/// One button per switch at most
pub const MAX_BUTTONS: usize = 6;

/// Sampling interval in milliseconds
const SAMPLE_INTERVAL_MS: u64 = 10;

/// Consecutive samples a new level must hold
const DEBOUNCE_SAMPLES: u8 = 3;

/// A momentary button bound to a switch
pub struct Button {
    id: SwitchId,
    input: Input<'static>,
    active_low: bool,
    debounce: Debounce,
}

impl Button {
    pub fn new(id: SwitchId, input: Input<'static>, active_low: bool) -> Self {
        Self {
            id,
            input,
            active_low,
            debounce: Debounce::new(),
        }
    }

    fn is_pressed(&self) -> bool {
        self.input.is_high() != self.active_low
    }
}

#[derive(Clone, Copy)]
struct Debounce {
    stable: bool,
    count: u8,
}

impl Debounce {
    const fn new() -> Self {
        Self {
            stable: false,
            count: 0,
        }
    }

    /// Feed one sample; true on a debounced press
    fn update(&mut self, raw: bool) -> bool {
        if raw == self.stable {
            self.count = 0;
            return false;
        }
        self.count += 1;
        if self.count < DEBOUNCE_SAMPLES {
            return false;
        }
        self.stable = raw;
        self.count = 0;
        raw
    }
}

/// Buttons task - samples inputs and queues toggles
#[embassy_executor::task]
pub async fn buttons_task(mut buttons: Vec<Button, MAX_BUTTONS>) {
    info!("Buttons task started");

    let mut ticker = Ticker::every(Duration::from_millis(SAMPLE_INTERVAL_MS));

    loop {
        ticker.next().await;

        for button in buttons.iter_mut() {
            let raw = button.is_pressed();
            if button.debounce.update(raw) {
                debug!("Button {} pressed", button.id.name());
                if TOGGLE_REQUESTS.try_send(button.id).is_err() {
                    warn!("Toggle queue full, dropping press");
                }
            }
        }
    }
}
