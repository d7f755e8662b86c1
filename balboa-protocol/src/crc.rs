//! CRC-8 used by the Balboa bus
//!
//! Polynomial 0x07, initial value 0x02, final xor 0x02, computed over the
//! LENGTH byte through the last payload byte.

const POLYNOMIAL: u8 = 0x07;
const INITIAL: u8 = 0x02;
const FINAL_XOR: u8 = 0x02;

/// Calculate the frame CRC over `data`
pub fn crc8(data: &[u8]) -> u8 {
    let mut crc = INITIAL;
    for &byte in data {
        crc = update(crc, byte);
    }
    crc ^ FINAL_XOR
}

/// Feed one byte into a running (not yet finalized) CRC
fn update(mut crc: u8, byte: u8) -> u8 {
    crc ^= byte;
    for _ in 0..8 {
        if crc & 0x80 != 0 {
            crc = (crc << 1) ^ POLYNOMIAL;
        } else {
            crc <<= 1;
        }
    }
    crc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nothing_to_send_crc() {
        // 7E 05 10 BF 07 5B 7E as captured on a real bus
        assert_eq!(crc8(&[0x05, 0x10, 0xBF, 0x07]), 0x5B);
    }

    #[test]
    fn test_id_request_crc() {
        assert_eq!(crc8(&[0x08, 0xFE, 0xBF, 0x01, 0x02, 0xF1, 0x73]), 0xB9);
    }

    #[test]
    fn test_toggle_crc() {
        assert_eq!(crc8(&[0x07, 0x10, 0xBF, 0x11, 0x04, 0x00]), 0x6A);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(crc8(&[]), INITIAL ^ FINAL_XOR);
    }

    #[test]
    fn test_single_bit_flip_changes_crc() {
        let data = [0x05, 0x10, 0xBF, 0x07];
        let reference = crc8(&data);
        for i in 0..data.len() {
            for bit in 0..8 {
                let mut corrupted = data;
                corrupted[i] ^= 1 << bit;
                assert_ne!(crc8(&corrupted), reference);
            }
        }
    }
}
