// OFDM engine: waveform synthesis on the encode side, synchronisation,
// demodulation, channel estimation and equalisation on the decode side.

pub mod demodulator;
pub mod modulator;

pub use demodulator::{coarse_sync, demodulate_frames, equalise, estimate_channel, estimate_snr_db};
pub use modulator::{Cell, modulate_frame, normalise_peak};
