//! Frame encoding and decoding for the Balboa spa bus.
//!
//! Frame format:
//! - START (1 byte): 0x7E delimiter
//! - LENGTH (1 byte): counts itself, CHANNEL, MAGIC, TYPE, PAYLOAD and CRC
//! - CHANNEL (1 byte): 0xFF broadcast, 0xFE negotiation, else a client id
//! - MAGIC (1 byte): 0xAF on status broadcasts, 0xBF otherwise
//! - TYPE (1 byte): message type identifier
//! - PAYLOAD (LENGTH - 5 bytes): type-specific data
//! - CRC (1 byte): CRC-8 over LENGTH through the last payload byte
//! - END (1 byte): 0x7E delimiter

use heapless::Vec;

use crate::crc::crc8;

/// Frame delimiter, used both as start and end marker
pub const FRAME_DELIMITER: u8 = 0x7E;

/// Smallest plausible LENGTH byte (no payload)
pub const MIN_LENGTH: u8 = 5;

/// Largest plausible LENGTH byte
///
/// A LENGTH equal to the delimiter only shows up when the end marker of one
/// frame is mistaken for the start of the next.
pub const MAX_LENGTH: u8 = 0x7D;

/// Bytes of LENGTH, CHANNEL, MAGIC, TYPE and CRC around the payload
const OVERHEAD: usize = 5;

/// Maximum payload size in bytes
pub const MAX_PAYLOAD_SIZE: usize = MAX_LENGTH as usize - OVERHEAD;

/// Maximum complete frame size on the wire (LENGTH + both delimiters)
pub const MAX_FRAME_SIZE: usize = MAX_LENGTH as usize + 2;

/// Errors that can occur during frame parsing or encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Payload exceeds maximum allowed size
    PayloadTooLarge,
    /// CRC mismatch
    Checksum,
    /// Frame is incomplete (need more bytes)
    Incomplete,
    /// LENGTH byte outside the plausible range
    InvalidLength,
    /// Window does not start with the delimiter
    MissingStart,
    /// CRC matched but the end delimiter is missing
    MissingEnd,
    /// Frame is well formed but its payload does not fit its message type
    InvalidFrame,
    /// Buffer too small for encoding
    BufferTooSmall,
}

/// A parsed or constructed frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Destination or source channel
    pub channel: u8,
    /// Magic byte (0xAF / 0xBF)
    pub magic: u8,
    /// Message type identifier
    pub msg_type: u8,
    /// Payload data
    pub payload: Vec<u8, MAX_PAYLOAD_SIZE>,
}

impl Frame {
    /// Create a new frame with the given addressing and payload
    pub fn new(channel: u8, magic: u8, msg_type: u8, payload: &[u8]) -> Result<Self, FrameError> {
        if payload.len() > MAX_PAYLOAD_SIZE {
            return Err(FrameError::PayloadTooLarge);
        }

        let mut payload_vec = Vec::new();
        payload_vec
            .extend_from_slice(payload)
            .map_err(|_| FrameError::PayloadTooLarge)?;

        Ok(Self {
            channel,
            magic,
            msg_type,
            payload: payload_vec,
        })
    }

    /// Create a frame with no payload
    pub fn empty(channel: u8, magic: u8, msg_type: u8) -> Self {
        Self {
            channel,
            magic,
            msg_type,
            payload: Vec::new(),
        }
    }

    /// LENGTH byte this frame carries on the wire
    pub fn length_byte(&self) -> u8 {
        (self.payload.len() + OVERHEAD) as u8
    }

    /// Number of bytes this frame occupies on the wire
    pub fn wire_len(&self) -> usize {
        self.payload.len() + OVERHEAD + 2
    }

    /// Decode a frame from the start of `bytes`
    ///
    /// `bytes[0]` must be the start delimiter. Returns the frame and the
    /// number of bytes it occupied. Bytes after the frame are untouched.
    pub fn decode(bytes: &[u8]) -> Result<(Self, usize), FrameError> {
        match bytes.first() {
            None => return Err(FrameError::Incomplete),
            Some(&FRAME_DELIMITER) => {}
            Some(_) => return Err(FrameError::MissingStart),
        }

        let length = match bytes.get(1) {
            None => return Err(FrameError::Incomplete),
            Some(&length) => length,
        };
        if !(MIN_LENGTH..=MAX_LENGTH).contains(&length) {
            return Err(FrameError::InvalidLength);
        }

        let length = length as usize;
        let total = length + 2;
        if bytes.len() < total {
            return Err(FrameError::Incomplete);
        }

        // CRC sits at index LENGTH, covering LENGTH..CRC
        let expected = crc8(&bytes[1..length]);
        if bytes[length] != expected {
            return Err(FrameError::Checksum);
        }
        if bytes[length + 1] != FRAME_DELIMITER {
            return Err(FrameError::MissingEnd);
        }

        let frame = Self::new(bytes[2], bytes[3], bytes[4], &bytes[5..length])?;
        Ok((frame, total))
    }

    /// Encode this frame into a byte buffer
    ///
    /// Returns the number of bytes written
    pub fn encode(&self, buffer: &mut [u8]) -> Result<usize, FrameError> {
        let frame_len = self.wire_len();
        if buffer.len() < frame_len {
            return Err(FrameError::BufferTooSmall);
        }

        let length = self.length_byte();
        let payload_end = 5 + self.payload.len();

        buffer[0] = FRAME_DELIMITER;
        buffer[1] = length;
        buffer[2] = self.channel;
        buffer[3] = self.magic;
        buffer[4] = self.msg_type;
        buffer[5..payload_end].copy_from_slice(&self.payload);
        buffer[payload_end] = crc8(&buffer[1..payload_end]);
        buffer[payload_end + 1] = FRAME_DELIMITER;

        Ok(frame_len)
    }

    /// Encode this frame into a heapless Vec
    pub fn encode_to_vec(&self) -> Result<Vec<u8, MAX_FRAME_SIZE>, FrameError> {
        let mut buffer = [0u8; MAX_FRAME_SIZE];
        let len = self.encode(&mut buffer)?;
        let mut vec = Vec::new();
        vec.extend_from_slice(&buffer[..len])
            .map_err(|_| FrameError::BufferTooSmall)?;
        Ok(vec)
    }
}
