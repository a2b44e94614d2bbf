//! Channel framing records.
//!
//! FAC: a fixed 72-bit word (64 parameter bits + CRC-8) spread over the
//! transmission four bits per frame. SDC: a small CRC-16-gated record
//! announcing the payload length and MIME type, spread twelve bits per
//! frame. MSC: the payload itself, split into CRC-16-gated segments of
//! at most 796 data bytes.

use byteorder::{BigEndian, ByteOrder};
use tracing::debug;

use crate::error::{Error, Result};
use crate::phy::crc::{bits_to_bytes, calculate_crc8, calculate_crc16};
use crate::utils::consts::{
    FAC_BITS, PAYLOAD_MAX, SDC_MIME_MAX, SEGMENT_DATA_MAX, SEGMENT_HEADER_BYTES, SERVICE_ID,
};

/// Parameters carried by (or assumed for) the FAC word
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FacParams {
    /// Robustness mode, 1 = mode B
    pub robustness_mode: u8,
    pub spectrum_occupancy: u8,
    /// True when long (multi-frame) time interleaving is signalled
    pub long_interleaving: bool,
    /// MSC constellation selector, 3 = 16-QAM
    pub msc_mode: u8,
    /// SDC constellation selector, 1 = 4-QAM
    pub sdc_mode: u8,
    pub num_services: u8,
    pub is_data_service: bool,
    pub service_id: u8,
}

impl Default for FacParams {
    /// The mode B / SO_0 profile this modem transmits
    fn default() -> Self {
        Self {
            robustness_mode: 1,
            spectrum_occupancy: 0,
            long_interleaving: false,
            msc_mode: 3,
            sdc_mode: 1,
            num_services: 1,
            is_data_service: true,
            service_id: SERVICE_ID,
        }
    }
}

fn put_bits(bits: &mut [u8], start: usize, len: usize, value: u32) {
    for i in 0..len {
        bits[start + i] = ((value >> (len - 1 - i)) & 1) as u8;
    }
}

fn get_bits(bits: &[u8], start: usize, len: usize) -> u32 {
    let mut value = 0u32;
    for &bit in &bits[start..start + len] {
        value = (value << 1) | (bit & 1) as u32;
    }
    value
}

/// Build the fixed 72-bit FAC word
pub fn encode_fac() -> Vec<u8> {
    let params = FacParams::default();
    let mut bits = vec![0u8; FAC_BITS];

    put_bits(&mut bits, 0, 2, params.robustness_mode as u32);
    put_bits(&mut bits, 2, 3, params.spectrum_occupancy as u32);
    put_bits(&mut bits, 5, 1, params.long_interleaving as u32);
    put_bits(&mut bits, 6, 3, params.msc_mode as u32);
    put_bits(&mut bits, 9, 3, params.sdc_mode as u32);
    put_bits(&mut bits, 12, 2, (params.num_services - 1) as u32);
    put_bits(&mut bits, 14, 1, params.is_data_service as u32);
    put_bits(&mut bits, 21, 7, params.service_id as u32);

    let crc = calculate_crc8(&bits_to_bytes(&bits[..64]));
    put_bits(&mut bits, 64, 8, crc as u32);
    bits
}

/// Parse and CRC-check a received FAC word (first 72 bits of `bits`)
pub fn decode_fac(bits: &[u8]) -> Result<FacParams> {
    if bits.len() < FAC_BITS {
        return Err(Error::TooShort);
    }
    let bits = &bits[..FAC_BITS];

    let crc = get_bits(bits, 64, 8) as u8;
    if crc != calculate_crc8(&bits_to_bytes(&bits[..64])) {
        debug!("FAC CRC mismatch");
        return Err(Error::CrcMismatch);
    }

    Ok(FacParams {
        robustness_mode: get_bits(bits, 0, 2) as u8,
        spectrum_occupancy: get_bits(bits, 2, 3) as u8,
        long_interleaving: get_bits(bits, 5, 1) == 1,
        msc_mode: get_bits(bits, 6, 3) as u8,
        sdc_mode: get_bits(bits, 9, 3) as u8,
        num_services: get_bits(bits, 12, 2) as u8 + 1,
        is_data_service: get_bits(bits, 14, 1) == 1,
        service_id: get_bits(bits, 21, 7) as u8,
    })
}

/// Serialise the SDC record: payload_len_24be, MIME (clipped to 32
/// bytes), 0x00 terminator, CRC-16 over everything preceding it.
pub fn encode_sdc(payload_len: usize, mime: &str) -> Result<Vec<u8>> {
    if payload_len > PAYLOAD_MAX {
        return Err(Error::PayloadTooLarge(payload_len));
    }

    let mime_bytes = mime.as_bytes();
    let mime_bytes = &mime_bytes[..mime_bytes.len().min(SDC_MIME_MAX)];

    let mut record = Vec::with_capacity(3 + mime_bytes.len() + 3);
    let mut len_field = [0u8; 3];
    BigEndian::write_u24(&mut len_field, payload_len as u32);
    record.extend_from_slice(&len_field);
    record.extend_from_slice(mime_bytes);
    record.push(0x00);

    let mut crc_field = [0u8; 2];
    BigEndian::write_u16(&mut crc_field, calculate_crc16(&record));
    record.extend_from_slice(&crc_field);
    Ok(record)
}

/// Parse and CRC-check an SDC record, returning (payload_len, mime)
pub fn decode_sdc(bytes: &[u8]) -> Result<(u32, String)> {
    if bytes.len() < 6 {
        return Err(Error::TooShort);
    }

    let terminator = bytes[3..]
        .iter()
        .take(SDC_MIME_MAX + 1)
        .position(|&b| b == 0x00)
        .ok_or(Error::TooShort)?;
    let crc_at = 3 + terminator + 1;
    if bytes.len() < crc_at + 2 {
        return Err(Error::TooShort);
    }

    if BigEndian::read_u16(&bytes[crc_at..crc_at + 2]) != calculate_crc16(&bytes[..crc_at]) {
        debug!("SDC CRC mismatch");
        return Err(Error::CrcMismatch);
    }

    let payload_len = BigEndian::read_u24(&bytes[..3]);
    let mime = String::from_utf8_lossy(&bytes[3..3 + terminator]).into_owned();
    Ok((payload_len, mime))
}

/// One MSC segment as carried on the wire
#[derive(Debug, Clone)]
pub struct Segment {
    pub seg_no: u16,
    pub total: u16,
    pub data: Vec<u8>,
    /// Whether the wire CRC verified; receivers ignore failed copies
    pub crc_ok: bool,
}

/// Split a payload into segments of at most 796 data bytes
pub fn segment_msc(payload: &[u8]) -> Result<Vec<Segment>> {
    if payload.len() > PAYLOAD_MAX {
        return Err(Error::PayloadTooLarge(payload.len()));
    }

    let total = payload.len().div_ceil(SEGMENT_DATA_MAX).max(1);
    let mut segments = Vec::with_capacity(total);
    for seg_no in 0..total {
        let start = seg_no * SEGMENT_DATA_MAX;
        let end = (start + SEGMENT_DATA_MAX).min(payload.len());
        segments.push(Segment {
            seg_no: seg_no as u16,
            total: total as u16,
            data: payload[start..end].to_vec(),
            crc_ok: true,
        });
    }
    Ok(segments)
}

/// Render a segment as index_16be, total_16be, data, crc16_be over
/// header and data
pub fn serialise_segment(segment: &Segment) -> Vec<u8> {
    let mut out = Vec::with_capacity(SEGMENT_HEADER_BYTES + segment.data.len() + 2);
    let mut header = [0u8; SEGMENT_HEADER_BYTES];
    BigEndian::write_u16(&mut header[0..2], segment.seg_no);
    BigEndian::write_u16(&mut header[2..4], segment.total);
    out.extend_from_slice(&header);
    out.extend_from_slice(&segment.data);

    let mut crc_field = [0u8; 2];
    BigEndian::write_u16(&mut crc_field, calculate_crc16(&out));
    out.extend_from_slice(&crc_field);
    out
}

/// Parse a decoded MSC byte stream back into segments.
///
/// Every segment but the last carries exactly 796 data bytes, so the
/// stream is self-describing up to the final segment, whose length is
/// not on the wire. When the SDC announced the payload length the exact
/// final length is known; otherwise candidate lengths are scanned for
/// one whose trailing CRC-16 verifies.
pub fn deserialise_segments(bytes: &[u8], announced_len: Option<usize>) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut pos = 0usize;

    while pos + SEGMENT_HEADER_BYTES + 2 <= bytes.len() {
        let seg_no = BigEndian::read_u16(&bytes[pos..pos + 2]);
        let total = BigEndian::read_u16(&bytes[pos + 2..pos + 4]);
        if total == 0 || seg_no >= total {
            // Padding after the last segment decodes to zeros
            break;
        }

        if seg_no + 1 < total {
            let body_len = SEGMENT_HEADER_BYTES + SEGMENT_DATA_MAX;
            if pos + body_len + 2 > bytes.len() {
                break;
            }
            let body = &bytes[pos..pos + body_len];
            let crc = BigEndian::read_u16(&bytes[pos + body_len..pos + body_len + 2]);
            let crc_ok = crc == calculate_crc16(body);
            if !crc_ok {
                debug!(seg_no, "segment CRC mismatch");
            }
            segments.push(Segment {
                seg_no,
                total,
                data: body[SEGMENT_HEADER_BYTES..].to_vec(),
                crc_ok,
            });
            pos += body_len + 2;
        } else {
            let max_len = (bytes.len() - pos - SEGMENT_HEADER_BYTES - 2).min(SEGMENT_DATA_MAX);
            let mut candidates: Vec<usize> = (0..=max_len).collect();
            if let Some(len) = announced_len {
                let expected = len.saturating_sub(SEGMENT_DATA_MAX * seg_no as usize);
                if expected <= max_len {
                    candidates.insert(0, expected);
                }
            }

            let mut found = false;
            for len in candidates {
                let end = pos + SEGMENT_HEADER_BYTES + len;
                let crc = BigEndian::read_u16(&bytes[end..end + 2]);
                if crc == calculate_crc16(&bytes[pos..end]) {
                    segments.push(Segment {
                        seg_no,
                        total,
                        data: bytes[pos + SEGMENT_HEADER_BYTES..end].to_vec(),
                        crc_ok: true,
                    });
                    found = true;
                    break;
                }
            }
            if !found {
                debug!(seg_no, "final segment CRC never verified");
                segments.push(Segment {
                    seg_no,
                    total,
                    data: Vec::new(),
                    crc_ok: false,
                });
            }
            break;
        }
    }

    segments
}

/// Concatenate segments 0..total-1, keeping per index only the first
/// copy whose CRC verified.
pub fn reassemble_msc(segments: &[Segment], expected_total: Option<u16>) -> Result<Vec<u8>> {
    let total = expected_total
        .or_else(|| segments.iter().find(|s| s.crc_ok).map(|s| s.total))
        .ok_or(Error::MissingSegment(0))?;

    let mut slots: Vec<Option<&Segment>> = vec![None; total as usize];
    for segment in segments.iter().filter(|s| s.crc_ok) {
        let index = segment.seg_no as usize;
        if index < slots.len() && slots[index].is_none() {
            slots[index] = Some(segment);
        }
    }

    let mut payload = Vec::new();
    for (index, slot) in slots.iter().enumerate() {
        match slot {
            Some(segment) => payload.extend_from_slice(&segment.data),
            None => {
                let seen_corrupt = segments.iter().any(|s| s.seg_no as usize == index);
                return Err(if seen_corrupt {
                    Error::CorruptSegment(index as u16)
                } else {
                    Error::MissingSegment(index as u16)
                });
            }
        }
    }
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fac_word_is_72_bits_with_trailing_crc() {
        let bits = encode_fac();
        assert_eq!(bits.len(), FAC_BITS);
        let crc = calculate_crc8(&bits_to_bytes(&bits[..64]));
        assert_eq!(get_bits(&bits, 64, 8) as u8, crc);
    }

    #[test]
    fn test_fac_round_trip_recovers_mode_b_profile() {
        let params = decode_fac(&encode_fac()).unwrap();
        assert_eq!(params.robustness_mode, 1);
        assert_eq!(params.spectrum_occupancy, 0);
        assert!(!params.long_interleaving);
        assert_eq!(params.msc_mode, 3);
        assert_eq!(params.sdc_mode, 1);
        assert_eq!(params.num_services, 1);
        assert!(params.is_data_service);
    }

    #[test]
    fn test_fac_rejects_any_single_bit_flip() {
        let bits = encode_fac();
        for i in 0..bits.len() {
            let mut corrupted = bits.clone();
            corrupted[i] ^= 1;
            assert!(matches!(decode_fac(&corrupted), Err(Error::CrcMismatch)));
        }
    }

    #[test]
    fn test_sdc_round_trip() {
        let record = encode_sdc(123_456, "image/jpeg").unwrap();
        let (len, mime) = decode_sdc(&record).unwrap();
        assert_eq!(len, 123_456);
        assert_eq!(mime, "image/jpeg");
    }

    #[test]
    fn test_sdc_clips_mime_to_32_bytes() {
        let long_mime = "application/x-very-long-subtype-name-indeed";
        let record = encode_sdc(10, long_mime).unwrap();
        let (_, mime) = decode_sdc(&record).unwrap();
        assert_eq!(mime.as_bytes(), &long_mime.as_bytes()[..32]);
    }

    #[test]
    fn test_sdc_rejects_any_single_bit_flip() {
        let record = encode_sdc(2_000, "image/png").unwrap();
        for byte_idx in 0..record.len() {
            for bit in 0..8 {
                let mut corrupted = record.clone();
                corrupted[byte_idx] ^= 1 << bit;
                assert!(decode_sdc(&corrupted).is_err(), "byte {byte_idx} bit {bit}");
            }
        }
    }

    #[test]
    fn test_sdc_refuses_oversize_payload() {
        assert!(matches!(
            encode_sdc(1 << 24, "image/jpeg"),
            Err(Error::PayloadTooLarge(_))
        ));
    }

    #[test]
    fn test_single_segment_layout() {
        let payload: Vec<u8> = (0u8..100).collect();
        let segments = segment_msc(&payload).unwrap();
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].seg_no, 0);
        assert_eq!(segments[0].total, 1);
        assert_eq!(segments[0].data.len(), 100);
        assert_eq!(serialise_segment(&segments[0]).len(), 106);
    }

    #[test]
    fn test_three_segment_split_and_reassembly() {
        let payload: Vec<u8> = (0..2000u32).map(|i| (i % 251) as u8).collect();
        let segments = segment_msc(&payload).unwrap();
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[0].data.len(), 796);
        assert_eq!(segments[1].data.len(), 796);
        assert_eq!(segments[2].data.len(), 408);

        let mut stream = Vec::new();
        for segment in &segments {
            stream.extend_from_slice(&serialise_segment(segment));
        }
        let parsed = deserialise_segments(&stream, None);
        assert_eq!(parsed.len(), 3);
        assert!(parsed.iter().all(|s| s.crc_ok));
        assert_eq!(reassemble_msc(&parsed, None).unwrap(), payload);
    }

    #[test]
    fn test_deserialise_ignores_trailing_padding() {
        let payload: Vec<u8> = (0u8..10).collect();
        let segments = segment_msc(&payload).unwrap();
        let mut stream = serialise_segment(&segments[0]);
        stream.extend_from_slice(&[0u8; 64]);
        let parsed = deserialise_segments(&stream, None);
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].data, payload);
    }

    #[test]
    fn test_segment_bit_flip_marks_copy_corrupt() {
        let payload: Vec<u8> = (0..1600u32).map(|i| i as u8).collect();
        let segments = segment_msc(&payload).unwrap();
        let mut stream = Vec::new();
        for segment in &segments {
            stream.extend_from_slice(&serialise_segment(segment));
        }
        stream[10] ^= 0x40; // inside segment 0 data
        let parsed = deserialise_segments(&stream, Some(payload.len()));
        assert!(!parsed[0].crc_ok);
        assert!(matches!(
            reassemble_msc(&parsed, None),
            Err(Error::CorruptSegment(0))
        ));
    }

    #[test]
    fn test_reassembly_reports_missing_segment() {
        let payload = vec![0x5Au8; 900];
        let segments = segment_msc(&payload).unwrap();
        assert_eq!(segments.len(), 2);
        assert!(matches!(
            reassemble_msc(&segments[1..], Some(2)),
            Err(Error::MissingSegment(0))
        ));
    }

    #[test]
    fn test_reassembly_keeps_first_valid_copy() {
        let payload = vec![0x11u8; 50];
        let mut segments = segment_msc(&payload).unwrap();
        let mut duplicate = segments[0].clone();
        duplicate.data = vec![0x22u8; 50];
        segments.push(duplicate);
        assert_eq!(reassemble_msc(&segments, Some(1)).unwrap(), payload);
    }
}
