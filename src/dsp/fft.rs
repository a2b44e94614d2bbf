//! In-place radix-2 Cooley-Tukey FFT.
//!
//! Supports power-of-two sizes up to 65536. The inverse transform is
//! scaled by 1/N, so `fft(fft(v, false), true)` recovers `v` up to
//! floating-point rounding.

use std::f64::consts::PI;

use num_complex::Complex64;

/// Transform `buf` in place. `inverse` selects the inverse transform.
pub fn fft(buf: &mut [Complex64], inverse: bool) {
    let n = buf.len();
    assert!(
        n.is_power_of_two() && n <= 1 << 16,
        "FFT size must be a power of two <= 65536"
    );
    if n < 2 {
        return;
    }

    // Decimation-in-time bit-reversal reordering
    let shift = usize::BITS - n.trailing_zeros();
    for i in 0..n {
        let j = i.reverse_bits() >> shift;
        if j > i {
            buf.swap(i, j);
        }
    }

    let sign = if inverse { 1.0 } else { -1.0 };
    let mut len = 2;
    while len <= n {
        let angle = sign * 2.0 * PI / len as f64;
        let w_len = Complex64::new(angle.cos(), angle.sin());
        for chunk in buf.chunks_exact_mut(len) {
            let (lower, upper) = chunk.split_at_mut(len / 2);
            let mut w = Complex64::new(1.0, 0.0);
            for (a, b) in lower.iter_mut().zip(upper.iter_mut()) {
                let t = *b * w;
                *b = *a - t;
                *a += t;
                w *= w_len;
            }
        }
        len <<= 1;
    }

    if inverse {
        let scale = 1.0 / n as f64;
        for value in buf.iter_mut() {
            *value *= scale;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_vector(n: usize) -> Vec<Complex64> {
        // Deterministic pseudo-random complex samples
        let mut state = 0x2545_F491_4F6C_DD1Du64;
        (0..n)
            .map(|_| {
                state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                let re = ((state >> 33) as f64 / (1u64 << 31) as f64) - 1.0;
                state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                let im = ((state >> 33) as f64 / (1u64 << 31) as f64) - 1.0;
                Complex64::new(re, im)
            })
            .collect()
    }

    #[test]
    fn test_impulse_transforms_to_flat_spectrum() {
        let mut buf = vec![Complex64::new(0.0, 0.0); 8];
        buf[0] = Complex64::new(1.0, 0.0);
        fft(&mut buf, false);
        for bin in &buf {
            assert!((bin - Complex64::new(1.0, 0.0)).norm() < 1e-12);
        }
    }

    #[test]
    fn test_single_tone_lands_in_one_bin() {
        let n = 64;
        let mut buf: Vec<Complex64> = (0..n)
            .map(|i| {
                let phase = 2.0 * PI * 5.0 * i as f64 / n as f64;
                Complex64::new(phase.cos(), phase.sin())
            })
            .collect();
        fft(&mut buf, false);
        for (bin, value) in buf.iter().enumerate() {
            if bin == 5 {
                assert!((value.norm() - n as f64).abs() < 1e-9);
            } else {
                assert!(value.norm() < 1e-9);
            }
        }
    }

    #[test]
    fn test_round_trip_recovers_input() {
        for n in [2usize, 16, 256, 1024] {
            let original = test_vector(n);
            let mut buf = original.clone();
            fft(&mut buf, false);
            fft(&mut buf, true);
            for (a, b) in buf.iter().zip(original.iter()) {
                assert!((a - b).norm() < 1e-6 * b.norm().max(1.0));
            }
        }
    }
}
