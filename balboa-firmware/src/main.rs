//! Balboa spa bus client firmware
//!
//! Registers with a Balboa spa mainboard as an RS-485 client, mirrors its
//! status broadcasts and drives jets, lights and blower on request.
//! Runs on RP2040 boards with an RS-485 transceiver on UART0.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::peripherals::UART0;
use embassy_rp::uart::{BufferedInterruptHandler, Uart};
use heapless::Vec;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use balboa_hal::UartConfig;
use balboa_hal_rp2040::pins::{BUS_RX_PIN, BUS_TX_PIN};
use balboa_hal_rp2040::uart::embassy_config;
use balboa_hal_rp2040::{PinBank, Rs485Link};

use crate::tasks::{Button, MAX_BUTTONS};

/// Embedded configuration (compiled into firmware)
/// Edit spa.toml and rebuild to customize
const EMBEDDED_CONFIG: &str = include_str!("../spa.toml");

mod channels;
mod config;
mod tasks;

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
});

// UART buffers (must live forever)
static TX_BUF: StaticCell<[u8; 256]> = StaticCell::new();
static RX_BUF: StaticCell<[u8; 512]> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Balboa spa bus firmware starting...");

    let p = embassy_rp::init(Default::default());
    let config = config::load(EMBEDDED_CONFIG);
    let (bus, mut pins) = PinBank::split(p);

    if config.bus.tx_pin.pin != BUS_TX_PIN || config.bus.rx_pin.pin != BUS_RX_PIN {
        warn!("Bus pins are fixed to gpio0/gpio1, ignoring tx_pin/rx_pin");
    }

    // RS-485 transceiver on UART0
    let uart_config = embassy_config(&UartConfig {
        baudrate: config.bus.baudrate,
        ..UartConfig::default()
    });

    let tx_buf = TX_BUF.init([0u8; 256]);
    let rx_buf = RX_BUF.init([0u8; 512]);

    let uart = Uart::new_blocking(bus.uart, bus.tx, bus.rx, uart_config);
    let uart = uart.into_buffered(Irqs, tx_buf, rx_buf);

    let de_inverted = config.bus.de_pin.is_some_and(|pin| pin.inverted);
    let de = config.bus.de_pin.and_then(|pin| match pins.take(pin.pin) {
        Ok(gpio) => {
            // Start in receive mode
            let idle = if pin.inverted { Level::High } else { Level::Low };
            Some(Output::new(gpio, idle))
        }
        Err(e) => {
            error!("DE pin gpio{} unavailable: {:?}", pin.pin, e);
            None
        }
    });
    if de.is_none() {
        info!("No DE pin, assuming auto-direction transceiver");
    }

    let link = Rs485Link::new(uart, de, de_inverted);
    info!("Bus UART initialized at {} baud", config.bus.baudrate);

    // Local pushbuttons
    let mut buttons: Vec<Button, MAX_BUTTONS> = Vec::new();
    for (id, pin) in config.buttons.iter() {
        if !config.switches.contains(id) {
            warn!("Button for {} ignored, switch not exposed", id.name());
            continue;
        }
        match pins.take(pin.pin) {
            Ok(gpio) => {
                let pull = if pin.inverted { Pull::Up } else { Pull::Down };
                let button = Button::new(id, Input::new(gpio, pull), pin.inverted);
                // One button per switch, cannot overflow
                let _ = buttons.push(button);
            }
            Err(e) => error!("Button pin gpio{} unavailable: {:?}", pin.pin, e),
        }
    }

    spawner
        .spawn(tasks::spa_task(link, config.session))
        .unwrap();
    spawner.spawn(tasks::binding_task(config.switches)).unwrap();
    if !buttons.is_empty() {
        info!("{} buttons configured", buttons.len());
        spawner.spawn(tasks::buttons_task(buttons)).unwrap();
    }

    info!("All tasks spawned, firmware running");
}
