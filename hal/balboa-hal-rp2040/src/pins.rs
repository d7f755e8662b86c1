//! Pin allocation for config-driven hardware setup
//!
//! The bus UART is fixed to UART0 on GPIO0/GPIO1. Every other GPIO can be
//! taken by number, which is how the transceiver's DE pin is assigned from
//! the configuration file.

use embassy_rp::gpio::AnyPin;
use embassy_rp::peripherals::{PIN_0, PIN_1, UART0};
use embassy_rp::{Peri, Peripherals};

/// GPIO used for UART0 TX
pub const BUS_TX_PIN: u8 = 0;
/// GPIO used for UART0 RX
pub const BUS_RX_PIN: u8 = 1;

/// Number of GPIOs on the RP2040
const PIN_COUNT: usize = 30;

/// Error when requesting a pin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinError {
    /// Pin number out of range (0-29 valid)
    InvalidPin,
    /// Pin already taken
    AlreadyTaken,
    /// Pin owned by the bus UART
    Reserved,
}

/// Peripherals the bus UART is built from
pub struct BusPeripherals {
    pub uart: Peri<'static, UART0>,
    pub tx: Peri<'static, PIN_0>,
    pub rx: Peri<'static, PIN_1>,
}

/// Remaining GPIOs, taken by number
pub struct PinBank {
    pins: [Option<Peri<'static, AnyPin>>; PIN_COUNT],
}

impl PinBank {
    /// Split the peripherals into the bus UART and a bank of free pins
    pub fn split(p: Peripherals) -> (BusPeripherals, Self) {
        let bus = BusPeripherals {
            uart: p.UART0,
            tx: p.PIN_0,
            rx: p.PIN_1,
        };
        let bank = Self {
            pins: [
                None,
                None,
                Some(p.PIN_2.into()),
                Some(p.PIN_3.into()),
                Some(p.PIN_4.into()),
                Some(p.PIN_5.into()),
                Some(p.PIN_6.into()),
                Some(p.PIN_7.into()),
                Some(p.PIN_8.into()),
                Some(p.PIN_9.into()),
                Some(p.PIN_10.into()),
                Some(p.PIN_11.into()),
                Some(p.PIN_12.into()),
                Some(p.PIN_13.into()),
                Some(p.PIN_14.into()),
                Some(p.PIN_15.into()),
                Some(p.PIN_16.into()),
                Some(p.PIN_17.into()),
                Some(p.PIN_18.into()),
                Some(p.PIN_19.into()),
                Some(p.PIN_20.into()),
                Some(p.PIN_21.into()),
                Some(p.PIN_22.into()),
                Some(p.PIN_23.into()),
                Some(p.PIN_24.into()),
                Some(p.PIN_25.into()),
                Some(p.PIN_26.into()),
                Some(p.PIN_27.into()),
                Some(p.PIN_28.into()),
                Some(p.PIN_29.into()),
            ],
        };
        (bus, bank)
    }

    /// Take a pin by number
    pub fn take(&mut self, pin_num: u8) -> Result<Peri<'static, AnyPin>, PinError> {
        check_pin(pin_num)?;
        self.pins[pin_num as usize]
            .take()
            .ok_or(PinError::AlreadyTaken)
    }

    /// Check if a pin is available
    pub fn is_available(&self, pin_num: u8) -> bool {
        check_pin(pin_num).is_ok() && self.pins[pin_num as usize].is_some()
    }
}

/// Reject pins that can never be handed out
pub fn check_pin(pin_num: u8) -> Result<(), PinError> {
    if pin_num as usize >= PIN_COUNT {
        return Err(PinError::InvalidPin);
    }
    if pin_num == BUS_TX_PIN || pin_num == BUS_RX_PIN {
        return Err(PinError::Reserved);
    }
    Ok(())
}
