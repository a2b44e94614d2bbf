//! Two-level MSC cell interleaving.
//!
//! Frequency: each OFDM symbol's MSC slots form a contiguous group of
//! 16 (symbol 0) or 24 (symbols 1..=14) cells inside the flat 352-cell
//! frame array; each group is permuted by a bijective bit-reversal
//! permutation. Time: a row-column transpose over the whole array.
//! Both permutations and their inverses are computed once and shared.

use std::sync::OnceLock;

use crate::phy::slots::SlotMap;
use crate::utils::consts::{MSC_CELLS_PER_FRAME, SYMBOLS_PER_FRAME};

/// Columns of the time-interleaver matrix
const TIME_COLS: usize = 30;
/// Rows of the time-interleaver matrix (ceil(352 / 30))
const TIME_ROWS: usize = MSC_CELLS_PER_FRAME.div_ceil(TIME_COLS);

struct PermTables {
    perm16: Vec<usize>,
    perm24: Vec<usize>,
    inv16: Vec<usize>,
    inv24: Vec<usize>,
}

impl PermTables {
    fn get() -> &'static PermTables {
        static TABLES: OnceLock<PermTables> = OnceLock::new();
        TABLES.get_or_init(|| {
            let perm16 = build_bit_reversal_perm(16);
            let perm24 = build_bit_reversal_perm(24);
            let inv16 = invert(&perm16);
            let inv24 = invert(&perm24);
            PermTables {
                perm16,
                perm24,
                inv16,
                inv24,
            }
        })
    }

    fn forward(&self, len: usize) -> &[usize] {
        match len {
            16 => &self.perm16,
            24 => &self.perm24,
            _ => unreachable!("MSC groups are 16 or 24 cells"),
        }
    }

    fn inverse(&self, len: usize) -> &[usize] {
        match len {
            16 => &self.inv16,
            24 => &self.inv24,
            _ => unreachable!("MSC groups are 16 or 24 cells"),
        }
    }
}

fn reverse_bits(value: usize, bits: u32) -> usize {
    let mut reversed = 0;
    for i in 0..bits {
        if value & (1 << i) != 0 {
            reversed |= 1 << (bits - 1 - i);
        }
    }
    reversed
}

/// Enumerate i = 0, 1, 2, ... and keep the bit-reversal of i whenever it
/// falls inside [0, n) and has not appeared yet. Total, hence bijective.
fn build_bit_reversal_perm(n: usize) -> Vec<usize> {
    let bits = n.max(2).next_power_of_two().trailing_zeros();
    let mut perm = Vec::with_capacity(n);
    let mut seen = vec![false; n];
    let mut i = 0usize;
    while perm.len() < n {
        let rev = reverse_bits(i, bits);
        if rev < n && !seen[rev] {
            seen[rev] = true;
            perm.push(rev);
        }
        i += 1;
    }
    perm
}

fn invert(perm: &[usize]) -> Vec<usize> {
    let mut inverse = vec![0usize; perm.len()];
    for (i, &p) in perm.iter().enumerate() {
        inverse[p] = i;
    }
    inverse
}

fn permute_groups<T: Copy + Default>(cells: &[T], inverse: bool) -> Vec<T> {
    debug_assert_eq!(cells.len(), MSC_CELLS_PER_FRAME);
    let tables = PermTables::get();
    let slots = SlotMap::get();
    let mut output = vec![T::default(); cells.len()];

    for sym in 0..SYMBOLS_PER_FRAME {
        let (offset, len) = slots.msc_group(sym);
        let perm = if inverse {
            tables.inverse(len)
        } else {
            tables.forward(len)
        };
        for (i, &p) in perm.iter().enumerate() {
            output[offset + p] = cells[offset + i];
        }
    }

    output
}

/// Per-symbol frequency interleave of the flat 352-cell frame array
pub fn freq_interleave<T: Copy + Default>(cells: &[T]) -> Vec<T> {
    permute_groups(cells, false)
}

pub fn freq_deinterleave<T: Copy + Default>(cells: &[T]) -> Vec<T> {
    permute_groups(cells, true)
}

/// Row-column time interleave: write row-by-row, read column-by-column,
/// skipping matrix positions past the end of the array.
pub fn time_interleave<T: Copy + Default>(cells: &[T]) -> Vec<T> {
    let mut output = Vec::with_capacity(cells.len());
    for col in 0..TIME_COLS {
        for row in 0..TIME_ROWS {
            let src = row * TIME_COLS + col;
            if src < cells.len() {
                output.push(cells[src]);
            }
        }
    }
    output
}

pub fn time_deinterleave<T: Copy + Default>(cells: &[T]) -> Vec<T> {
    let mut output = vec![T::default(); cells.len()];
    let mut pos = 0;
    for col in 0..TIME_COLS {
        for row in 0..TIME_ROWS {
            let dst = row * TIME_COLS + col;
            if dst < output.len() {
                output[dst] = cells[pos];
                pos += 1;
            }
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered_cells() -> Vec<u32> {
        (1..=MSC_CELLS_PER_FRAME as u32).collect()
    }

    #[test]
    fn test_bit_reversal_perm_is_bijective() {
        for n in [16usize, 24] {
            let perm = build_bit_reversal_perm(n);
            let mut sorted = perm.clone();
            sorted.sort_unstable();
            let expected: Vec<usize> = (0..n).collect();
            assert_eq!(sorted, expected);
        }
    }

    #[test]
    fn test_perm16_is_plain_bit_reversal() {
        let perm = build_bit_reversal_perm(16);
        assert_eq!(perm[0], 0);
        assert_eq!(perm[1], 8);
        assert_eq!(perm[2], 4);
        assert_eq!(perm[3], 12);
        assert_eq!(perm[15], 15);
    }

    #[test]
    fn test_freq_interleave_round_trip() {
        let cells = numbered_cells();
        assert_eq!(freq_deinterleave(&freq_interleave(&cells)), cells);
    }

    #[test]
    fn test_freq_interleave_moves_no_cell_across_symbols() {
        // Bijectivity inside each group: no nonzero cell becomes zero
        let cells = numbered_cells();
        let interleaved = freq_interleave(&cells);
        assert!(interleaved.iter().all(|&c| c != 0));
        let mut sorted = interleaved.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, cells);
    }

    #[test]
    fn test_time_interleave_round_trip() {
        let cells = numbered_cells();
        let interleaved = time_interleave(&cells);
        assert_eq!(interleaved.len(), cells.len());
        assert_eq!(time_deinterleave(&interleaved), cells);
    }

    #[test]
    fn test_combined_interleaver_round_trip() {
        let cells = numbered_cells();
        let forward = time_interleave(&freq_interleave(&cells));
        let back = freq_deinterleave(&time_deinterleave(&forward));
        assert_eq!(back, cells);
    }
}
