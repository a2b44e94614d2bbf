//! OFDM demodulation: coarse timing recovery from the guard interval,
//! per-symbol FFT and carrier extraction, pilot-based channel estimation
//! with linear interpolation, equalisation and an SNR estimate.

use num_complex::Complex64;

use crate::dsp::fft::fft;
use crate::ofdm::modulator::carrier_bin;
use crate::phy::slots::{SlotKind, SlotMap};
use crate::utils::consts::{
    N_GUARD, N_SYMBOL, N_USEFUL, NUM_CARRIERS, PILOT_AMPLITUDE, SYMBOLS_PER_FRAME,
};

/// Demodulated carriers of one frame: 15 symbols x 29 carriers
pub type FrameGrid = Vec<Vec<Complex64>>;

/// Find the start of the first OFDM symbol by normalised correlation of
/// each candidate guard interval with the samples one useful-length
/// later; the cyclic prefix makes the two identical at the true offset.
/// Ties resolve to the earliest candidate.
pub fn coarse_sync(samples: &[f64]) -> usize {
    if samples.len() < N_SYMBOL {
        return 0;
    }
    let limit = (2 * N_SYMBOL).min(samples.len() - N_SYMBOL);

    let mut best_pos = 0usize;
    let mut best_corr = -1.0f64;
    for pos in 0..limit {
        let mut dot = 0.0;
        let mut energy_a = 0.0;
        let mut energy_b = 0.0;
        for i in 0..N_GUARD {
            let a = samples[pos + i];
            let b = samples[pos + N_USEFUL + i];
            dot += a * b;
            energy_a += a * a;
            energy_b += b * b;
        }
        let denom = (energy_a * energy_b).sqrt();
        let corr = if denom > 1e-12 { (dot / denom).abs() } else { 0.0 };
        if corr > best_corr {
            best_corr = corr;
            best_pos = pos;
        }
    }
    best_pos
}

/// Demodulate `num_frames` frames starting at sample `start`. The caller
/// guarantees the samples cover that many whole frames.
pub fn demodulate_frames(samples: &[f64], start: usize, num_frames: usize) -> Vec<FrameGrid> {
    let mut frames = Vec::with_capacity(num_frames);
    let mut buffer = vec![Complex64::new(0.0, 0.0); N_USEFUL];

    for frame_no in 0..num_frames {
        let mut grid: FrameGrid =
            vec![vec![Complex64::new(0.0, 0.0); NUM_CARRIERS]; SYMBOLS_PER_FRAME];
        for (sym, row) in grid.iter_mut().enumerate() {
            let base = start + (frame_no * SYMBOLS_PER_FRAME + sym) * N_SYMBOL + N_GUARD;
            for (value, &sample) in buffer.iter_mut().zip(&samples[base..base + N_USEFUL]) {
                *value = Complex64::new(sample, 0.0);
            }
            fft(&mut buffer, false);
            for (idx, carrier) in row.iter_mut().enumerate() {
                *carrier = buffer[carrier_bin(idx)] / N_USEFUL as f64;
            }
        }
        frames.push(grid);
    }
    frames
}

/// Per-symbol channel estimate. Pilot observations are divided by the
/// reference, non-pilot carriers are linearly interpolated between the
/// nearest pilots; a symbol without pilots inherits the previous
/// symbol's estimate (or a unit response at the start).
pub fn estimate_channel(frame: &FrameGrid) -> Vec<Vec<Complex64>> {
    let slots = SlotMap::get();
    let reference = Complex64::new(PILOT_AMPLITUDE, 0.0);
    let unit = vec![Complex64::new(1.0, 0.0); NUM_CARRIERS];

    let mut estimate = vec![unit.clone(); SYMBOLS_PER_FRAME];

    for sym in 0..SYMBOLS_PER_FRAME {
        let pilots: Vec<(usize, Complex64)> = (0..NUM_CARRIERS)
            .filter(|&idx| slots.kind(sym, idx) == SlotKind::Pilot)
            .map(|idx| (idx, frame[sym][idx] / reference))
            .collect();

        if pilots.is_empty() {
            estimate[sym] = if sym > 0 { estimate[sym - 1].clone() } else { unit.clone() };
            continue;
        }

        for idx in 0..NUM_CARRIERS {
            let before = pilots.iter().rev().find(|(p, _)| *p <= idx);
            let after = pilots.iter().find(|(p, _)| *p >= idx);
            estimate[sym][idx] = match (before, after) {
                (Some(&(b_idx, b_h)), Some(&(a_idx, a_h))) => {
                    if a_idx == b_idx {
                        b_h
                    } else {
                        let t = (idx - b_idx) as f64 / (a_idx - b_idx) as f64;
                        b_h + (a_h - b_h) * t
                    }
                }
                (Some(&(_, b_h)), None) => b_h,
                (None, Some(&(_, a_h))) => a_h,
                (None, None) => unreachable!(),
            };
        }
    }
    estimate
}

/// Divide a received cell by the channel estimate. A vanishing estimate
/// yields a zero cell rather than a blow-up.
pub fn equalise(rx: Complex64, h: Complex64) -> Complex64 {
    let denom = h.norm_sqr();
    if denom < 1e-12 {
        Complex64::new(0.0, 0.0)
    } else {
        Complex64::new(
            (rx.re * h.re + rx.im * h.im) / denom,
            (rx.im * h.re - rx.re * h.im) / denom,
        )
    }
}

/// Pilot-referenced SNR estimate over one frame, in dB, capped at +40
pub fn estimate_snr_db(frame: &FrameGrid) -> f64 {
    let slots = SlotMap::get();
    let reference = Complex64::new(PILOT_AMPLITUDE, 0.0);

    let mut signal = 0.0f64;
    let mut noise = 0.0f64;
    let mut observed = 0usize;
    for sym in 0..SYMBOLS_PER_FRAME {
        for idx in 0..NUM_CARRIERS {
            if slots.kind(sym, idx) == SlotKind::Pilot {
                signal += reference.norm_sqr();
                noise += (frame[sym][idx] - reference).norm_sqr();
                observed += 1;
            }
        }
    }

    if observed == 0 || noise < 1e-15 {
        40.0
    } else {
        10.0 * (signal / noise).log10()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ofdm::modulator::modulate_frame;

    #[test]
    fn test_coarse_sync_locks_to_frame_start() {
        let samples = modulate_frame(&[]);
        assert!(coarse_sync(&samples) <= 1);
    }

    #[test]
    fn test_coarse_sync_finds_shifted_start() {
        let mut samples = vec![0.0f64; 137];
        samples.extend(modulate_frame(&[]));
        let found = coarse_sync(&samples);
        assert!((136..=138).contains(&found), "found {found}");
    }

    #[test]
    fn test_equalise_inverts_channel() {
        let h = Complex64::new(0.3, -0.8);
        let tx = Complex64::new(-0.7, 0.2);
        let rx = tx * h;
        let out = equalise(rx, h);
        assert!((out - tx).norm() < 1e-12);
    }

    #[test]
    fn test_equalise_zeroes_dead_carrier() {
        let out = equalise(Complex64::new(1.0, 1.0), Complex64::new(0.0, 0.0));
        assert_eq!(out, Complex64::new(0.0, 0.0));
    }

    #[test]
    fn test_flat_channel_estimate_on_clean_pilots() {
        // Feed a synthetic frame whose pilot carriers hold the exact
        // reference: the estimate must be unity everywhere.
        let slots = SlotMap::get();
        let mut frame: FrameGrid =
            vec![vec![Complex64::new(0.0, 0.0); NUM_CARRIERS]; SYMBOLS_PER_FRAME];
        for sym in 0..SYMBOLS_PER_FRAME {
            for idx in 0..NUM_CARRIERS {
                if slots.kind(sym, idx) == SlotKind::Pilot {
                    frame[sym][idx] = Complex64::new(PILOT_AMPLITUDE, 0.0);
                }
            }
        }
        let estimate = estimate_channel(&frame);
        for row in &estimate {
            for h in row {
                assert!((h - Complex64::new(1.0, 0.0)).norm() < 1e-12);
            }
        }
        assert!((estimate_snr_db(&frame) - 40.0).abs() < 1e-12);
    }

    #[test]
    fn test_snr_drops_with_pilot_noise() {
        let slots = SlotMap::get();
        let mut frame: FrameGrid =
            vec![vec![Complex64::new(0.0, 0.0); NUM_CARRIERS]; SYMBOLS_PER_FRAME];
        for sym in 0..SYMBOLS_PER_FRAME {
            for idx in 0..NUM_CARRIERS {
                if slots.kind(sym, idx) == SlotKind::Pilot {
                    frame[sym][idx] = Complex64::new(PILOT_AMPLITUDE + 0.1, 0.05);
                }
            }
        }
        let snr = estimate_snr_db(&frame);
        assert!(snr > 10.0 && snr < 40.0, "snr {snr}");
    }
}
