// ============================================================================
// Physical Layer Parameters (DRM robustness mode B, narrowband SO_0)
// ============================================================================

/// Internal DSP sample rate (Hz)
pub const SAMPLE_RATE: u32 = 12_000;

/// Useful OFDM symbol length in samples (~21.33 ms)
pub const N_USEFUL: usize = 256;

/// Guard interval (cyclic prefix) length in samples
pub const N_GUARD: usize = N_USEFUL / 4;

/// Total OFDM symbol length in samples
pub const N_SYMBOL: usize = N_USEFUL + N_GUARD;

/// OFDM symbols per transmission frame
pub const SYMBOLS_PER_FRAME: usize = 15;

/// Samples per transmission frame (400 ms)
pub const FRAME_SAMPLES: usize = N_SYMBOL * SYMBOLS_PER_FRAME;

/// Transmission frames per super-frame (1.2 s)
pub const FRAMES_PER_SUPERFRAME: usize = 3;

/// Lowest active subcarrier, relative to the 1500 Hz centre carrier
pub const K_MIN: i32 = -10;

/// Highest active subcarrier
pub const K_MAX: i32 = 18;

/// Active subcarriers per symbol
pub const NUM_CARRIERS: usize = (K_MAX - K_MIN + 1) as usize;

/// FFT bin of the 1500 Hz centre carrier (1500 / (12000 / 256))
pub const CENTER_BIN: usize = 32;

/// Carriers that carry the pilot reference in every symbol
pub const PILOT_CARRIERS: [i32; 5] = [-9, -3, 4, 8, 12];

/// Fixed frequency-pilot positions as (symbol, carrier). All of them lie
/// on [`PILOT_CARRIERS`] and carry the same reference value, so the slot
/// classifier folds both pilot kinds into one.
pub const FREQ_PILOT_SLOTS: [(usize, i32); 7] = [
    (0, -9),
    (0, 8),
    (5, -3),
    (5, 12),
    (10, 4),
    (14, -9),
    (14, 8),
];

/// FAC cell positions as (symbol, carrier)
pub const FAC_SLOTS: [(usize, i32); 2] = [(0, -7), (0, 6)];

/// SDC cell positions as (symbol, carrier)
pub const SDC_SLOTS: [(usize, i32); 6] = [(0, -6), (0, -5), (0, -4), (0, 7), (0, 9), (0, 10)];

/// Pilot reference amplitude, ~+3 dB over data cells
pub const PILOT_AMPLITUDE: f64 = std::f64::consts::SQRT_2;

/// MSC data cells per frame: 16 in symbol 0, 24 in symbols 1..=14
pub const MSC_CELLS_PER_FRAME: usize = 352;

/// 16-QAM MSC bits per frame
pub const MSC_BITS_PER_FRAME: usize = MSC_CELLS_PER_FRAME * 4;

/// MSC bit capacity of one super-frame
pub const MSC_BITS_PER_SUPERFRAME: usize = MSC_BITS_PER_FRAME * FRAMES_PER_SUPERFRAME;

// Channel coding

/// Rate-1/6 mother code generator polynomials
pub const CONV_POLYS: [u32; 6] = [0o133, 0o171, 0o145, 0o165, 0o117, 0o135];

/// Constraint length of the convolutional code
pub const CONV_K: usize = 7;

/// MSC puncture pattern (3 bits kept per input bit)
pub const PUNCTURE_MSC: [u8; 6] = [1, 1, 0, 1, 0, 0];

/// FAC puncture pattern (4 bits kept per input bit)
pub const PUNCTURE_FAC: [u8; 6] = [1, 1, 0, 1, 1, 0];

/// SDC puncture pattern (2 bits kept per input bit)
pub const PUNCTURE_SDC: [u8; 6] = [1, 1, 0, 0, 0, 0];

// Channel framing

/// FAC word length in bits (64 data bits + CRC-8)
pub const FAC_BITS: usize = 72;

/// FAC bits mapped into each frame
pub const FAC_BITS_PER_FRAME: usize = 4;

/// SDC bits mapped into each frame
pub const SDC_BITS_PER_FRAME: usize = 12;

/// Service id carried in FAC bits 21..=27
pub const SERVICE_ID: u8 = 0;

/// Longest MIME string carried in the SDC record
pub const SDC_MIME_MAX: usize = 32;

/// Maximum data bytes in one MSC segment (800-byte segment minus header)
pub const SEGMENT_DATA_MAX: usize = 796;

/// MSC segment header bytes (2-byte index + 2-byte total)
pub const SEGMENT_HEADER_BYTES: usize = 4;

/// Largest payload the 24-bit SDC length field can describe
pub const PAYLOAD_MAX: usize = (1 << 24) - 1;

/// Index of carrier `k` within the active band
pub const fn carrier_index(k: i32) -> usize {
    (k - K_MIN) as usize
}
