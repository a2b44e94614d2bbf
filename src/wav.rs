//! Minimal PCM WAV framing: 16-bit little-endian mono at the internal
//! 12 kHz rate, written and parsed byte-exactly. Anything richer (other
//! widths, float data, multiple channels) is handled by the CLI through
//! `hound` before samples reach the core.

use byteorder::{ByteOrder, LittleEndian};

use crate::error::{Error, Result};
use crate::utils::consts::SAMPLE_RATE;

const HEADER_BYTES: usize = 44;

/// Render samples as a complete mono 16-bit PCM WAV file
pub fn write_wav_bytes(samples: &[f64]) -> Vec<u8> {
    let data_bytes = (samples.len() * 2) as u32;

    let mut header = [0u8; HEADER_BYTES];
    header[0..4].copy_from_slice(b"RIFF");
    LittleEndian::write_u32(&mut header[4..8], 36 + data_bytes);
    header[8..12].copy_from_slice(b"WAVE");
    header[12..16].copy_from_slice(b"fmt ");
    LittleEndian::write_u32(&mut header[16..20], 16);
    LittleEndian::write_u16(&mut header[20..22], 1); // PCM
    LittleEndian::write_u16(&mut header[22..24], 1); // mono
    LittleEndian::write_u32(&mut header[24..28], SAMPLE_RATE);
    LittleEndian::write_u32(&mut header[28..32], SAMPLE_RATE * 2);
    LittleEndian::write_u16(&mut header[32..34], 2); // block align
    LittleEndian::write_u16(&mut header[34..36], 16); // bits per sample
    header[36..40].copy_from_slice(b"data");
    LittleEndian::write_u32(&mut header[40..44], data_bytes);

    let mut out = Vec::with_capacity(HEADER_BYTES + samples.len() * 2);
    out.extend_from_slice(&header);

    let amplitude = i16::MAX as f64;
    let mut sample_field = [0u8; 2];
    for &sample in samples {
        let value = (sample.clamp(-1.0, 1.0) * amplitude).round() as i16;
        LittleEndian::write_i16(&mut sample_field, value);
        out.extend_from_slice(&sample_field);
    }
    out
}

/// Parse WAV bytes in the layout produced by [`write_wav_bytes`],
/// returning the samples and the file's sample rate.
pub fn parse_wav_bytes(bytes: &[u8]) -> Result<(Vec<f64>, u32)> {
    if bytes.len() < HEADER_BYTES {
        return Err(Error::InputMalformed("WAV shorter than its header".into()));
    }
    if &bytes[0..4] != b"RIFF" || &bytes[8..12] != b"WAVE" {
        return Err(Error::InputMalformed("missing RIFF/WAVE magic".into()));
    }
    if &bytes[12..16] != b"fmt " || &bytes[36..40] != b"data" {
        return Err(Error::InputMalformed("unexpected chunk layout".into()));
    }

    let format = LittleEndian::read_u16(&bytes[20..22]);
    let channels = LittleEndian::read_u16(&bytes[22..24]);
    let bits = LittleEndian::read_u16(&bytes[34..36]);
    if format != 1 || channels != 1 || bits != 16 {
        return Err(Error::InputMalformed("expected 16-bit mono PCM".into()));
    }

    let sample_rate = LittleEndian::read_u32(&bytes[24..28]);
    let data_bytes = LittleEndian::read_u32(&bytes[40..44]) as usize;
    if data_bytes % 2 != 0 || bytes.len() < HEADER_BYTES + data_bytes {
        return Err(Error::InputMalformed(
            "sample count inconsistent with header".into(),
        ));
    }

    let samples = bytes[HEADER_BYTES..HEADER_BYTES + data_bytes]
        .chunks_exact(2)
        .map(|chunk| LittleEndian::read_i16(chunk) as f64 / 32768.0)
        .collect();
    Ok((samples, sample_rate))
}
