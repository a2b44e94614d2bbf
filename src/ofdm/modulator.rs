//! OFDM waveform synthesis.
//!
//! Each symbol is built in the frequency domain (pilot references on the
//! pilot carriers, caller-supplied data cells elsewhere), transformed by
//! the inverse FFT, and prefixed with its cyclic guard interval: the
//! last N_g useful samples replayed ahead of the symbol.

use num_complex::Complex64;

use crate::dsp::fft::fft;
use crate::phy::slots::{SlotKind, SlotMap};
use crate::utils::consts::{
    CENTER_BIN, FRAME_SAMPLES, K_MIN, N_GUARD, N_USEFUL, NUM_CARRIERS, PILOT_AMPLITUDE,
    SYMBOLS_PER_FRAME,
};

/// One data-bearing cell of a frame
#[derive(Debug, Clone, Copy)]
pub struct Cell {
    /// Symbol index within the frame, 0..15
    pub symbol: usize,
    /// Carrier index within the active band, 0..29
    pub carrier: usize,
    pub value: Complex64,
}

/// FFT bin of active carrier index `idx`
pub(crate) fn carrier_bin(idx: usize) -> usize {
    (CENTER_BIN as i32 + K_MIN + idx as i32).rem_euclid(N_USEFUL as i32) as usize
}

/// Modulate one frame's data cells into its 4800-sample waveform.
/// Pilot slots are filled from the fixed reference; unsupplied data
/// slots stay empty.
pub fn modulate_frame(cells: &[Cell]) -> Vec<f64> {
    let slots = SlotMap::get();

    let mut grid = [[Complex64::new(0.0, 0.0); NUM_CARRIERS]; SYMBOLS_PER_FRAME];
    for cell in cells {
        grid[cell.symbol][cell.carrier] = cell.value;
    }

    let mut samples = Vec::with_capacity(FRAME_SAMPLES);
    let mut spectrum = vec![Complex64::new(0.0, 0.0); N_USEFUL];

    for sym in 0..SYMBOLS_PER_FRAME {
        spectrum.fill(Complex64::new(0.0, 0.0));
        for idx in 0..NUM_CARRIERS {
            spectrum[carrier_bin(idx)] = if slots.kind(sym, idx) == SlotKind::Pilot {
                Complex64::new(PILOT_AMPLITUDE, 0.0)
            } else {
                grid[sym][idx]
            };
        }

        fft(&mut spectrum, true);

        // Guard interval first, then the full useful part
        for value in &spectrum[N_USEFUL - N_GUARD..] {
            samples.push(value.re);
        }
        for value in &spectrum[..N_USEFUL] {
            samples.push(value.re);
        }
    }

    samples
}

/// Scale the whole transmission so its loudest sample sits at 0.9
pub fn normalise_peak(samples: &mut [f64]) {
    let peak = samples.iter().fold(0.0f64, |acc, &s| acc.max(s.abs()));
    if peak > 1e-9 {
        let scale = 0.9 / peak;
        for sample in samples.iter_mut() {
            *sample *= scale;
        }
    }
}
