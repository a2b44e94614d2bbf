// CRC implementations for the channel framing.
// FAC: CRC-8, polynomial 0xD5, init 0xFF, final xor 0xFF.
// SDC and MSC segments: CRC-16-CCITT, polynomial 0x1021, init 0xFFFF.

const CRC8_POLYNOMIAL: u8 = 0xD5;
const CRC16_POLYNOMIAL: u16 = 0x1021;

/// Calculate the FAC CRC-8 over packed bytes
pub fn calculate_crc8(data: &[u8]) -> u8 {
    let mut crc: u8 = 0xFF;

    for &byte in data {
        crc ^= byte;
        for _ in 0..8 {
            if (crc & 0x80) != 0 {
                crc = (crc << 1) ^ CRC8_POLYNOMIAL;
            } else {
                crc <<= 1;
            }
        }
    }

    crc ^ 0xFF
}

/// Calculate the CRC-16-CCITT used by SDC records and MSC segments
pub fn calculate_crc16(data: &[u8]) -> u16 {
    let mut crc: u16 = 0xFFFF;

    for &byte in data {
        crc ^= (byte as u16) << 8;
        for _ in 0..8 {
            if (crc & 0x8000) != 0 {
                crc = (crc << 1) ^ CRC16_POLYNOMIAL;
            } else {
                crc <<= 1;
            }
        }
    }

    crc
}

/// Convert byte to bit array (MSB first)
pub fn byte_to_bits(byte: u8) -> [u8; 8] {
    let mut bits = [0u8; 8];
    for (i, bit) in bits.iter_mut().enumerate() {
        *bit = (byte >> (7 - i)) & 1;
    }
    bits
}

/// Convert bit array to byte (MSB first)
pub fn bits_to_byte(bits: &[u8]) -> u8 {
    let mut byte = 0u8;
    for (i, &bit) in bits.iter().enumerate().take(8) {
        if bit != 0 {
            byte |= 1 << (7 - i);
        }
    }
    byte
}

/// Convert bytes to bit vector
pub fn bytes_to_bits(bytes: &[u8]) -> Vec<u8> {
    let mut bits = Vec::with_capacity(bytes.len() * 8);
    for &byte in bytes {
        bits.extend_from_slice(&byte_to_bits(byte));
    }
    bits
}

/// Convert bit vector to bytes, zero-padding the last byte
pub fn bits_to_bytes(bits: &[u8]) -> Vec<u8> {
    let num_bytes = bits.len().div_ceil(8);
    let mut bytes = Vec::with_capacity(num_bytes);

    for i in 0..num_bytes {
        let start = i * 8;
        let end = (start + 8).min(bits.len());
        bytes.push(bits_to_byte(&bits[start..end]));
    }

    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crc8_detects_any_single_bit_flip() {
        let data = b"FAC parameter block";
        let crc = calculate_crc8(data);

        for byte_idx in 0..data.len() {
            for bit in 0..8 {
                let mut modified = data.to_vec();
                modified[byte_idx] ^= 1 << bit;
                assert_ne!(calculate_crc8(&modified), crc);
            }
        }
    }

    #[test]
    fn test_crc16_matches_ccitt_reference() {
        // Well-known CCITT-FALSE check value for "123456789"
        assert_eq!(calculate_crc16(b"123456789"), 0x29B1);
    }

    #[test]
    fn test_crc16_detects_any_single_bit_flip() {
        let data: Vec<u8> = (0u8..=63).collect();
        let crc = calculate_crc16(&data);

        for byte_idx in 0..data.len() {
            for bit in 0..8 {
                let mut modified = data.clone();
                modified[byte_idx] ^= 1 << bit;
                assert_ne!(calculate_crc16(&modified), crc);
            }
        }
    }

    #[test]
    fn test_bit_conversion() {
        let byte = 0b1011_0011;
        let bits = byte_to_bits(byte);
        assert_eq!(bits, [1, 0, 1, 1, 0, 0, 1, 1]);
        assert_eq!(bits_to_byte(&bits), byte);
    }

    #[test]
    fn test_bytes_bits_conversion() {
        let bytes = vec![0xAB, 0xCD, 0xEF];
        let bits = bytes_to_bits(&bytes);
        assert_eq!(bits.len(), 24);
        assert_eq!(bits_to_bytes(&bits), bytes);
    }
}
