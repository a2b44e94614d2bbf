/// Naive linear-interpolation resampler for the decoder input boundary.
/// Adequate for clean recordings; the modem itself always runs at the
/// internal 12 kHz rate.
pub fn resample_linear(input: &[f64], rate_in: u32, rate_out: u32) -> Vec<f64> {
    if rate_in == rate_out || input.is_empty() {
        return input.to_vec();
    }

    let step = rate_in as f64 / rate_out as f64;
    let out_len = (input.len() as f64 / step).floor() as usize;
    let mut output = Vec::with_capacity(out_len);

    for i in 0..out_len {
        let pos = i as f64 * step;
        let idx = pos as usize;
        let frac = pos - idx as f64;
        let a = input[idx];
        let b = if idx + 1 < input.len() { input[idx + 1] } else { a };
        output.push(a + (b - a) * frac);
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_rate_is_identity() {
        let input = vec![0.0, 0.5, -0.5, 1.0];
        assert_eq!(resample_linear(&input, 12_000, 12_000), input);
    }

    #[test]
    fn test_exact_downsample_by_two_picks_every_other_sample() {
        let input: Vec<f64> = (0..100).map(|i| i as f64).collect();
        let output = resample_linear(&input, 24_000, 12_000);
        assert_eq!(output.len(), 50);
        for (i, &value) in output.iter().enumerate() {
            assert!((value - (2 * i) as f64).abs() < 1e-12);
        }
    }

    #[test]
    fn test_upsample_interpolates_midpoints() {
        let input = vec![0.0, 1.0, 2.0];
        let output = resample_linear(&input, 6_000, 12_000);
        assert_eq!(output.len(), 6);
        assert!((output[1] - 0.5).abs() < 1e-12);
        assert!((output[3] - 1.5).abs() < 1e-12);
    }
}
