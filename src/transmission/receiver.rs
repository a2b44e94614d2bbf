//! Top-level decoder: audio samples back to the payload, with a
//! diagnostics record describing how the decode went.

use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::dsp::resample::resample_linear;
use crate::error::{Error, Result};
use crate::fec::conv::viterbi_decode;
use crate::fec::interleave::{freq_deinterleave, time_deinterleave};
use crate::ofdm::demodulator::{
    coarse_sync, demodulate_frames, equalise, estimate_channel, estimate_snr_db,
};
use crate::phy::crc::bits_to_bytes;
use crate::phy::frame::{
    FacParams, decode_fac, decode_sdc, deserialise_segments, reassemble_msc,
};
use crate::phy::qam::{qam4_demap, qam16_demap};
use crate::phy::slots::SlotMap;
use crate::utils::consts::{
    FAC_SLOTS, FRAME_SAMPLES, MSC_CELLS_PER_FRAME, PUNCTURE_MSC, SAMPLE_RATE, SDC_SLOTS,
    SEGMENT_DATA_MAX, carrier_index,
};
use crate::wav::parse_wav_bytes;

/// How a decode went, independent of whether a payload was recovered
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostics {
    pub sample_rate_in: u32,
    pub file_duration_s: f64,
    pub mode: String,
    pub spectrum_occupancy: String,
    pub fec_rate: String,
    pub snr_db: f64,
    pub frames_decoded: usize,
    pub segment_errors: usize,
    pub decode_duration_ms: f64,
}

/// Decoder result: the payload when every segment was recovered, plus
/// whatever the SDC announced about it
#[derive(Debug, Clone)]
pub struct DecodeOutput {
    pub payload: Option<Vec<u8>>,
    pub mime: Option<String>,
    pub announced_len: Option<u32>,
    pub diagnostics: Diagnostics,
}

/// Configuration for the decoder
#[derive(Debug, Clone)]
pub struct DecoderConfig {
    /// Sample rate of the input handed to [`DrmReceiver::decode_samples`]
    pub sample_rate_in: u32,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            sample_rate_in: SAMPLE_RATE,
        }
    }
}

/// Decodes a DRM digital-SSTV transmission
pub struct DrmReceiver {
    config: DecoderConfig,
}

impl DrmReceiver {
    pub fn new(config: DecoderConfig) -> Self {
        Self { config }
    }

    pub fn new_default() -> Self {
        Self::new(DecoderConfig::default())
    }

    /// Decode a WAV file in the layout the encoder writes. The file's
    /// own sample rate applies, not the configured one.
    pub fn decode_wav(&self, wav_bytes: &[u8]) -> Result<DecodeOutput> {
        let (samples, sample_rate) = parse_wav_bytes(wav_bytes)?;
        self.decode_at(&samples, sample_rate)
    }

    /// Decode raw samples recorded at the configured input rate
    pub fn decode_samples(&self, samples: &[f64]) -> Result<DecodeOutput> {
        self.decode_at(samples, self.config.sample_rate_in)
    }

    fn decode_at(&self, samples: &[f64], sample_rate: u32) -> Result<DecodeOutput> {
        let started = Instant::now();
        let file_duration_s = samples.len() as f64 / sample_rate as f64;

        let resampled;
        let samples = if sample_rate == SAMPLE_RATE {
            samples
        } else {
            debug!("resampling {} Hz -> {} Hz", sample_rate, SAMPLE_RATE);
            resampled = resample_linear(samples, sample_rate, SAMPLE_RATE);
            resampled.as_slice()
        };

        if samples.len() < FRAME_SAMPLES {
            return Err(Error::InputMalformed(
                "not enough samples for one transmission frame".into(),
            ));
        }

        let start = coarse_sync(samples);
        let num_frames = (samples.len() - start) / FRAME_SAMPLES;
        if num_frames == 0 {
            return Err(Error::InputMalformed(
                "no whole frame after synchronisation".into(),
            ));
        }
        debug!("sync at sample {}, {} frame(s)", start, num_frames);

        let slots = SlotMap::get();
        let frames = demodulate_frames(samples, start, num_frames);

        let mut msc_bits = Vec::with_capacity(num_frames * MSC_CELLS_PER_FRAME * 4);
        let mut fac_bits = Vec::new();
        let mut sdc_bits = Vec::new();
        let mut snr_db = 0.0;

        for (frame_no, frame) in frames.iter().enumerate() {
            if frame_no == 0 {
                snr_db = estimate_snr_db(frame);
            }
            let channel = estimate_channel(frame);

            let mut cells = Vec::with_capacity(MSC_CELLS_PER_FRAME);
            for &(symbol, carrier) in slots.msc_order() {
                cells.push(equalise(frame[symbol][carrier], channel[symbol][carrier]));
            }
            let cells = freq_deinterleave(&time_deinterleave(&cells));
            for cell in &cells {
                msc_bits.extend_from_slice(&qam16_demap(*cell));
            }

            for &(symbol, k) in FAC_SLOTS.iter() {
                let carrier = carrier_index(k);
                let cell = equalise(frame[symbol][carrier], channel[symbol][carrier]);
                fac_bits.extend_from_slice(&qam4_demap(cell));
            }
            for &(symbol, k) in SDC_SLOTS.iter() {
                let carrier = carrier_index(k);
                let cell = equalise(frame[symbol][carrier], channel[symbol][carrier]);
                sdc_bits.extend_from_slice(&qam4_demap(cell));
            }
        }

        // Control channels accumulate a few bits per frame; short
        // transmissions simply fall back to the fixed mode B profile.
        let fac = match decode_fac(&fac_bits) {
            Ok(params) => {
                debug!(?params, "FAC recovered");
                params
            }
            Err(err) => {
                debug!("FAC unavailable ({err}), assuming mode B defaults");
                FacParams::default()
            }
        };
        let sdc = match decode_sdc(&bits_to_bytes(&sdc_bits)) {
            Ok((len, mime)) => {
                debug!("SDC recovered: {} bytes, {}", len, mime);
                Some((len, mime))
            }
            Err(err) => {
                debug!("SDC unavailable ({err})");
                None
            }
        };

        let decoded = viterbi_decode(&msc_bits, &PUNCTURE_MSC);
        let stream = bits_to_bytes(&decoded);

        let announced_len = sdc.as_ref().map(|(len, _)| *len as usize);
        let segments = deserialise_segments(&stream, announced_len);
        let segment_errors = segments.iter().filter(|s| !s.crc_ok).count();
        let expected_total =
            announced_len.map(|len| len.div_ceil(SEGMENT_DATA_MAX).max(1) as u16);

        let payload = match reassemble_msc(&segments, expected_total) {
            Ok(payload) => {
                info!(
                    "recovered {} bytes from {} frame(s), {} segment error(s)",
                    payload.len(),
                    num_frames,
                    segment_errors
                );
                Some(payload)
            }
            Err(err) => {
                warn!("no payload recovered: {err}");
                None
            }
        };

        let diagnostics = Diagnostics {
            sample_rate_in: sample_rate,
            file_duration_s,
            mode: mode_name(fac.robustness_mode).to_string(),
            spectrum_occupancy: format!("SO_{}", fac.spectrum_occupancy),
            fec_rate: "1/2".to_string(),
            snr_db,
            frames_decoded: num_frames,
            segment_errors,
            decode_duration_ms: started.elapsed().as_secs_f64() * 1e3,
        };

        Ok(DecodeOutput {
            payload,
            mime: sdc.as_ref().map(|(_, mime)| mime.clone()),
            announced_len: sdc.map(|(len, _)| len),
            diagnostics,
        })
    }
}

impl Default for DrmReceiver {
    fn default() -> Self {
        Self::new_default()
    }
}

fn mode_name(robustness_mode: u8) -> &'static str {
    match robustness_mode {
        0 => "A",
        1 => "B",
        2 => "C",
        _ => "D",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_too_few_samples_is_structural_error() {
        let receiver = DrmReceiver::new_default();
        let samples = vec![0.0f64; FRAME_SAMPLES / 2];
        assert!(matches!(
            receiver.decode_samples(&samples),
            Err(Error::InputMalformed(_))
        ));
    }

    #[test]
    fn test_silence_yields_diagnostics_but_no_payload() {
        let receiver = DrmReceiver::new_default();
        let samples = vec![0.0f64; FRAME_SAMPLES];
        let out = receiver.decode_samples(&samples).unwrap();
        assert!(out.payload.is_none());
        assert_eq!(out.diagnostics.frames_decoded, 1);
        assert_eq!(out.diagnostics.mode, "B");
    }
}
