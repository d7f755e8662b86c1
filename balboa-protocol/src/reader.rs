//! Byte-stream framing for the spa bus
//!
//! The reader owns a bounded buffer that bytes are appended to as they
//! arrive. It can start at any offset in the stream (power-up, hot-plug)
//! and recovers from noise by dropping exactly one byte per failed decode
//! attempt, so it always makes forward progress.

use heapless::Vec;

use crate::frame::{Frame, FrameError, FRAME_DELIMITER, MAX_FRAME_SIZE};

/// Receive buffer capacity, two maximum-size frames
pub const READER_CAPACITY: usize = 2 * MAX_FRAME_SIZE;

/// Reader state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReaderState {
    /// Discarding bytes until a delimiter heads the buffer
    SeekSync,
    /// Delimiter found, waiting until LENGTH + 2 bytes are buffered
    Accumulate,
    /// A frame was just handed out; the next call resumes at SeekSync
    FrameReady,
}

/// Framing counters, useful for bus diagnostics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ReaderStats {
    /// Frames decoded successfully
    pub frames: u32,
    /// Decode attempts rejected (CRC, length, delimiters)
    pub corrupt_frames: u32,
    /// Bytes discarded while resynchronizing
    pub dropped_bytes: u32,
    /// Bytes discarded because the buffer was full
    pub overflow_bytes: u32,
}

/// Link reader state machine
#[derive(Debug, Clone)]
pub struct LinkReader {
    state: ReaderState,
    buffer: Vec<u8, READER_CAPACITY>,
    stats: ReaderStats,
}

impl Default for LinkReader {
    fn default() -> Self {
        Self::new()
    }
}

impl LinkReader {
    /// Create a new reader
    pub fn new() -> Self {
        Self {
            state: ReaderState::SeekSync,
            buffer: Vec::new(),
            stats: ReaderStats::default(),
        }
    }

    /// Drop all buffered bytes and start over
    ///
    /// Counters are kept.
    pub fn reset(&mut self) {
        self.state = ReaderState::SeekSync;
        self.buffer.clear();
    }

    /// Current state
    pub fn state(&self) -> ReaderState {
        self.state
    }

    /// Framing counters
    pub fn stats(&self) -> ReaderStats {
        self.stats
    }

    /// Number of bytes waiting in the buffer
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Append one received byte
    ///
    /// When the buffer is full the oldest byte is discarded.
    pub fn push(&mut self, byte: u8) {
        if self.buffer.is_full() {
            self.discard_front(1);
            self.stats.overflow_bytes = self.stats.overflow_bytes.saturating_add(1);
            self.state = ReaderState::SeekSync;
        }
        // Cannot fail, room was made above
        let _ = self.buffer.push(byte);
    }

    /// Append a run of received bytes
    pub fn extend(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.push(byte);
        }
    }

    /// Append one byte and return the frame it completed, if any
    pub fn feed(&mut self, byte: u8) -> Option<Frame> {
        self.push(byte);
        self.next_frame()
    }

    /// Return the next complete frame in the buffer
    ///
    /// Call repeatedly until it returns `None`; residual bytes after a
    /// frame stay buffered for the following call.
    pub fn next_frame(&mut self) -> Option<Frame> {
        loop {
            match self.state {
                ReaderState::FrameReady => {
                    self.state = ReaderState::SeekSync;
                }
                ReaderState::SeekSync => {
                    let skip = self
                        .buffer
                        .iter()
                        .position(|&b| b == FRAME_DELIMITER)
                        .unwrap_or(self.buffer.len());
                    if skip > 0 {
                        self.discard_front(skip);
                        self.stats.dropped_bytes =
                            self.stats.dropped_bytes.saturating_add(skip as u32);
                    }
                    if self.buffer.is_empty() {
                        return None;
                    }
                    self.state = ReaderState::Accumulate;
                }
                ReaderState::Accumulate => match Frame::decode(&self.buffer) {
                    Ok((frame, used)) => {
                        self.discard_front(used);
                        self.stats.frames = self.stats.frames.saturating_add(1);
                        self.state = ReaderState::FrameReady;
                        return Some(frame);
                    }
                    Err(FrameError::Incomplete) => return None,
                    Err(_) => {
                        // Drop only the false start; a real frame may begin
                        // anywhere after it
                        self.discard_front(1);
                        self.stats.corrupt_frames = self.stats.corrupt_frames.saturating_add(1);
                        self.stats.dropped_bytes = self.stats.dropped_bytes.saturating_add(1);
                        self.state = ReaderState::SeekSync;
                    }
                },
            }
        }
    }

    fn discard_front(&mut self, count: usize) {
        let len = self.buffer.len();
        let count = count.min(len);
        self.buffer.copy_within(count..len, 0);
        self.buffer.truncate(len - count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOTHING_TO_SEND: [u8; 7] = [0x7E, 0x05, 0x10, 0xBF, 0x07, 0x5B, 0x7E];
    const CLEAR_TO_SEND: [u8; 7] = [0x7E, 0x05, 0x10, 0xBF, 0x06, 0x5C, 0x7E];

    fn feed_all(reader: &mut LinkReader, bytes: &[u8]) -> Option<Frame> {
        let mut found = None;
        for &b in bytes {
            if let Some(frame) = reader.feed(b) {
                found = Some(frame);
            }
        }
        found
    }

    #[test]
    fn test_single_frame() {
        let mut reader = LinkReader::new();
        let frame = feed_all(&mut reader, &NOTHING_TO_SEND).unwrap();

        assert_eq!(frame.msg_type, 0x07);
        assert_eq!(reader.state(), ReaderState::FrameReady);
        assert_eq!(reader.buffered(), 0);
        assert_eq!(reader.stats().frames, 1);
    }

    #[test]
    fn test_waits_for_declared_length() {
        let mut reader = LinkReader::new();
        reader.extend(&NOTHING_TO_SEND[..4]);

        assert!(reader.next_frame().is_none());
        assert_eq!(reader.state(), ReaderState::Accumulate);
        assert_eq!(reader.buffered(), 4);
    }

    #[test]
    fn test_resync_after_garbage() {
        let mut reader = LinkReader::new();
        reader.extend(&[0x00, 0xFF, 0x12, 0x34]);
        reader.extend(&CLEAR_TO_SEND);

        let frame = reader.next_frame().unwrap();
        assert_eq!(frame.msg_type, 0x06);
        assert_eq!(reader.stats().dropped_bytes, 4);
    }

    #[test]
    fn test_back_to_back_frames_keep_residual() {
        let mut reader = LinkReader::new();
        reader.extend(&NOTHING_TO_SEND);
        reader.extend(&CLEAR_TO_SEND);

        assert_eq!(reader.next_frame().unwrap().msg_type, 0x07);
        assert_eq!(reader.buffered(), CLEAR_TO_SEND.len());
        assert_eq!(reader.next_frame().unwrap().msg_type, 0x06);
        assert!(reader.next_frame().is_none());
    }

    #[test]
    fn test_starts_on_end_delimiter() {
        // Joined mid-stream: the tail end marker of a frame precedes the next one
        let mut reader = LinkReader::new();
        reader.extend(&[0x5B, 0x7E]);
        reader.extend(&CLEAR_TO_SEND);

        assert_eq!(reader.next_frame().unwrap().msg_type, 0x06);
        assert_eq!(reader.stats().corrupt_frames, 1);
    }

    #[test]
    fn test_checksum_error_drops_one_byte() {
        let mut corrupted = NOTHING_TO_SEND;
        corrupted[5] ^= 0x01;

        let mut reader = LinkReader::new();
        reader.extend(&corrupted);
        assert!(reader.next_frame().is_none());

        let stats = reader.stats();
        assert_eq!(stats.corrupt_frames, 1);
        // The trailing delimiter survives as a candidate start
        assert_eq!(reader.buffered(), 1);
        assert_eq!(reader.state(), ReaderState::Accumulate);
    }

    #[test]
    fn test_recovers_after_corrupted_frame() {
        let mut corrupted = NOTHING_TO_SEND;
        corrupted[3] = 0x00;

        let mut reader = LinkReader::new();
        reader.extend(&corrupted);
        reader.extend(&CLEAR_TO_SEND);

        assert_eq!(reader.next_frame().unwrap().msg_type, 0x06);
        assert!(reader.next_frame().is_none());
    }

    #[test]
    fn test_noise_never_stalls() {
        let mut reader = LinkReader::new();
        // Delimiters with plausible lengths but no valid CRC anywhere
        for i in 0..1000u32 {
            let byte = if i % 3 == 0 { 0x7E } else { (i % 0x7D) as u8 };
            let _ = reader.feed(byte);
        }
        while reader.next_frame().is_some() {}

        // Any half-accumulated false frame is resolved within one maximum
        // frame length of filler
        for _ in 0..MAX_FRAME_SIZE {
            while reader.feed(0x00).is_some() {}
        }
        reader.extend(&NOTHING_TO_SEND);

        let frame = reader.next_frame().unwrap();
        assert_eq!(frame.msg_type, 0x07);
        assert!(reader.buffered() <= READER_CAPACITY);
    }

    #[test]
    fn test_overflow_discards_oldest() {
        let mut reader = LinkReader::new();
        for _ in 0..READER_CAPACITY + 10 {
            reader.push(0x00);
        }
        assert_eq!(reader.buffered(), READER_CAPACITY);
        assert_eq!(reader.stats().overflow_bytes, 10);
    }

    #[test]
    fn test_reset_clears_buffer() {
        let mut reader = LinkReader::new();
        reader.extend(&NOTHING_TO_SEND[..3]);
        let _ = reader.next_frame();
        reader.reset();

        assert_eq!(reader.state(), ReaderState::SeekSync);
        assert_eq!(reader.buffered(), 0);
        assert_eq!(feed_all(&mut reader, &CLEAR_TO_SEND).unwrap().msg_type, 0x06);
    }
}
