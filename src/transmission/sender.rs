//! Top-level encoder: payload bytes to a DRM OFDM transmission.

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::fec::conv::conv_encode;
use crate::fec::interleave::{freq_interleave, time_interleave};
use crate::ofdm::modulator::{Cell, modulate_frame, normalise_peak};
use crate::phy::crc::bytes_to_bits;
use crate::phy::frame::{encode_fac, encode_sdc, segment_msc, serialise_segment};
use crate::phy::qam::{qam4_map, qam16_map};
use crate::phy::slots::SlotMap;
use crate::utils::consts::{
    FAC_BITS_PER_FRAME, FAC_SLOTS, FRAME_SAMPLES, FRAMES_PER_SUPERFRAME, MSC_BITS_PER_FRAME,
    MSC_BITS_PER_SUPERFRAME, MSC_CELLS_PER_FRAME, PAYLOAD_MAX, PUNCTURE_MSC, SAMPLE_RATE,
    SDC_BITS_PER_FRAME, SDC_SLOTS, carrier_index,
};
use crate::wav::write_wav_bytes;

/// Configuration for the encoder
#[derive(Debug, Clone)]
pub struct EncoderConfig {
    /// MIME type announced in the SDC (clipped to 32 bytes on the wire)
    pub mime: String,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            mime: "image/jpeg".to_string(),
        }
    }
}

/// Encodes an opaque payload into a DRM digital-SSTV transmission
pub struct DrmSender {
    config: EncoderConfig,
}

impl DrmSender {
    pub fn new(config: EncoderConfig) -> Self {
        Self { config }
    }

    pub fn new_default() -> Self {
        Self::new(EncoderConfig::default())
    }

    /// Encode a payload to 16-bit mono PCM WAV bytes at 12 kHz
    pub fn encode(&self, payload: &[u8]) -> Result<Vec<u8>> {
        let samples = self.encode_to_samples(payload)?;
        Ok(write_wav_bytes(&samples))
    }

    /// Encode a payload to the normalised sample vector of the
    /// transmission (whole frames, peak at 0.9)
    pub fn encode_to_samples(&self, payload: &[u8]) -> Result<Vec<f64>> {
        if payload.len() > PAYLOAD_MAX {
            return Err(Error::PayloadTooLarge(payload.len()));
        }

        // Payload -> serialised segments -> flat bitstream
        let segments = segment_msc(payload)?;
        let mut stream = Vec::new();
        for segment in &segments {
            stream.extend_from_slice(&serialise_segment(segment));
        }
        let bits = bytes_to_bits(&stream);
        info!(
            "payload {} bytes, {} segment(s), {} bits before coding",
            payload.len(),
            segments.len(),
            bits.len()
        );

        // FEC, zero-padded up to whole super-frames
        let mut coded = conv_encode(&bits, &PUNCTURE_MSC);
        let superframes = coded.len().div_ceil(MSC_BITS_PER_SUPERFRAME);
        coded.resize(superframes * MSC_BITS_PER_SUPERFRAME, 0);

        let fac_bits = encode_fac();
        let sdc_bits = bytes_to_bits(&encode_sdc(payload.len(), &self.config.mime)?);
        debug!(
            "FAC {} bits, SDC {} bits, {} super-frame(s)",
            fac_bits.len(),
            sdc_bits.len(),
            superframes
        );

        let num_frames = superframes * FRAMES_PER_SUPERFRAME;
        let mut samples = Vec::with_capacity(num_frames * FRAME_SAMPLES);
        for frame_no in 0..num_frames {
            let msc = &coded[frame_no * MSC_BITS_PER_FRAME..(frame_no + 1) * MSC_BITS_PER_FRAME];
            let cells = build_frame_cells(msc, &fac_bits, &sdc_bits, frame_no);
            samples.extend_from_slice(&modulate_frame(&cells));
        }
        normalise_peak(&mut samples);

        info!(
            "modulated {} frame(s), {} samples ({:.1} s)",
            num_frames,
            samples.len(),
            samples.len() as f64 / SAMPLE_RATE as f64
        );
        Ok(samples)
    }
}

/// Lay one frame's MSC, FAC and SDC bits out as data cells
fn build_frame_cells(msc_bits: &[u8], fac_bits: &[u8], sdc_bits: &[u8], frame_no: usize) -> Vec<Cell> {
    let slots = SlotMap::get();

    // 16-QAM MSC cells, frequency- then time-interleaved
    let mut msc_cells = Vec::with_capacity(MSC_CELLS_PER_FRAME);
    for chunk in msc_bits.chunks_exact(4) {
        msc_cells.push(qam16_map(chunk));
    }
    let msc_cells = time_interleave(&freq_interleave(&msc_cells));

    let mut cells = Vec::with_capacity(MSC_CELLS_PER_FRAME + FAC_SLOTS.len() + SDC_SLOTS.len());
    for (value, &(symbol, carrier)) in msc_cells.iter().zip(slots.msc_order()) {
        cells.push(Cell {
            symbol,
            carrier,
            value: *value,
        });
    }

    // FAC: four bits per frame, cycling through the 72-bit word
    let fac_offset = frame_no * FAC_BITS_PER_FRAME;
    for (j, &(symbol, k)) in FAC_SLOTS.iter().enumerate() {
        let b0 = fac_bits[(fac_offset + 2 * j) % fac_bits.len()];
        let b1 = fac_bits[(fac_offset + 2 * j + 1) % fac_bits.len()];
        cells.push(Cell {
            symbol,
            carrier: carrier_index(k),
            value: qam4_map(b0, b1),
        });
    }

    // SDC: twelve bits per frame over the byte-expanded record
    let sdc_offset = frame_no * SDC_BITS_PER_FRAME;
    for (j, &(symbol, k)) in SDC_SLOTS.iter().enumerate() {
        let b0 = sdc_bits[(sdc_offset + 2 * j) % sdc_bits.len()];
        let b1 = sdc_bits[(sdc_offset + 2 * j + 1) % sdc_bits.len()];
        cells.push(Cell {
            symbol,
            carrier: carrier_index(k),
            value: qam4_map(b0, b1),
        });
    }

    cells
}
