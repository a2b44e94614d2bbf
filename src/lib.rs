//! HAMDRM digital-SSTV modem.
//!
//! Encodes an opaque payload (typically a compressed still image) into a
//! narrowband DRM OFDM transmission rendered as 16-bit mono PCM audio at
//! 12 kHz, and decodes such audio back into the payload. The pipeline is
//! the DRM robustness-mode-B subset used by the EasyPal "Digital SSTV"
//! amateur-radio profile: rate-1/6 punctured convolutional coding with a
//! hard-decision Viterbi decoder, CRC-gated FAC/SDC/MSC channel framing,
//! frequency and time interleaving, Gray-coded 4-QAM/16-QAM, and a
//! pilot-equalised 29-carrier OFDM waveform.

pub mod dsp;
pub mod error;
pub mod fec;
pub mod ofdm;
pub mod phy;
pub mod transmission;
pub mod utils;
pub mod wav;

pub use error::{Error, Result};
pub use transmission::receiver::{DecodeOutput, DecoderConfig, Diagnostics, DrmReceiver};
pub use transmission::sender::{DrmSender, EncoderConfig};
