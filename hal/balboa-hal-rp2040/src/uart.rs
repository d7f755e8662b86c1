//! RS-485 link over an RP2040 buffered UART
//!
//! The transceiver's driver-enable (DE, usually tied to /RE) is raised
//! before a frame goes out and dropped once the last stop bit has left the
//! shift register. Boards with an auto-direction transceiver pass no pin.

use balboa_hal::uart::{DataBits, Parity, StopBits};
use balboa_hal::{UartConfig, UartRx, UartTx};
use embassy_rp::gpio::Output;
use embassy_rp::uart::{self, BufferedUart, Error};
use embassy_time::{block_for, Duration};
use embedded_io::{Read, ReadReady, Write};

/// Extra time DE stays high after the TX FIFO drains, covering the byte
/// still in the shift register (~87us at 115200)
const DEFAULT_TURNAROUND_US: u64 = 100;

/// Translate the board-agnostic line settings for embassy-rp
pub fn embassy_config(config: &UartConfig) -> uart::Config {
    let mut out = uart::Config::default();
    out.baudrate = config.baudrate;
    out.data_bits = match config.data_bits {
        DataBits::Seven => uart::DataBits::DataBits7,
        DataBits::Eight => uart::DataBits::DataBits8,
    };
    out.parity = match config.parity {
        Parity::None => uart::Parity::ParityNone,
        Parity::Even => uart::Parity::ParityEven,
        Parity::Odd => uart::Parity::ParityOdd,
    };
    out.stop_bits = match config.stop_bits {
        StopBits::One => uart::StopBits::STOP1,
        StopBits::Two => uart::StopBits::STOP2,
    };
    out
}

/// Half-duplex spa bus link
pub struct Rs485Link {
    uart: BufferedUart,
    de: Option<Output<'static>>,
    de_inverted: bool,
    turnaround: Duration,
}

impl Rs485Link {
    /// Wrap a buffered UART
    ///
    /// `de` is driven to its idle (receive) level immediately.
    pub fn new(uart: BufferedUart, de: Option<Output<'static>>, de_inverted: bool) -> Self {
        let mut link = Self {
            uart,
            de,
            de_inverted,
            turnaround: Duration::from_micros(DEFAULT_TURNAROUND_US),
        };
        link.set_driver(false);
        link
    }

    /// Override the post-transmit hold time
    pub fn with_turnaround(mut self, turnaround: Duration) -> Self {
        self.turnaround = turnaround;
        self
    }

    fn set_driver(&mut self, enabled: bool) {
        if let Some(de) = self.de.as_mut() {
            if enabled != self.de_inverted {
                de.set_high();
            } else {
                de.set_low();
            }
        }
    }
}

impl UartTx for Rs485Link {
    type Error = Error;

    fn write_blocking(&mut self, data: &[u8]) -> Result<(), Error> {
        self.set_driver(true);
        let result = self.uart.write_all(data);
        if result.is_err() {
            self.set_driver(false);
        }
        result
    }

    fn flush(&mut self) -> Result<(), Error> {
        let result = Write::flush(&mut self.uart);
        if self.de.is_some() {
            block_for(self.turnaround);
        }
        self.set_driver(false);
        result
    }
}

impl UartRx for Rs485Link {
    type Error = Error;

    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
        if buf.is_empty() || !self.uart.read_ready()? {
            return Ok(0);
        }
        self.uart.read(buf)
    }
}
