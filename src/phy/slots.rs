//! Slot classification of the 15 x 29 frame grid.
//!
//! Every (symbol, carrier) slot of a transmission frame is exactly one
//! of pilot, FAC, SDC or MSC. The classification is a pure function of
//! the physical parameters, so it is built once and held for the life of
//! the process, replacing per-cell membership scans with a table lookup.

use std::sync::OnceLock;

use crate::utils::consts::{
    FAC_SLOTS, FREQ_PILOT_SLOTS, K_MIN, MSC_CELLS_PER_FRAME, NUM_CARRIERS, PILOT_CARRIERS,
    SDC_SLOTS, SYMBOLS_PER_FRAME,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotKind {
    Pilot,
    Fac,
    Sdc,
    Msc,
}

pub struct SlotMap {
    kinds: [[SlotKind; NUM_CARRIERS]; SYMBOLS_PER_FRAME],
    /// Canonical MSC slot order: symbol-major, carrier-ascending
    msc_order: Vec<(usize, usize)>,
    /// Start of each symbol's contiguous MSC group within `msc_order`
    msc_group_offsets: [usize; SYMBOLS_PER_FRAME],
    msc_group_lens: [usize; SYMBOLS_PER_FRAME],
}

impl SlotMap {
    pub fn get() -> &'static SlotMap {
        static MAP: OnceLock<SlotMap> = OnceLock::new();
        MAP.get_or_init(SlotMap::build)
    }

    fn build() -> SlotMap {
        let mut kinds = [[SlotKind::Msc; NUM_CARRIERS]; SYMBOLS_PER_FRAME];

        for (sym, row) in kinds.iter_mut().enumerate() {
            for (idx, slot) in row.iter_mut().enumerate() {
                let k = K_MIN + idx as i32;
                *slot = if PILOT_CARRIERS.contains(&k) {
                    SlotKind::Pilot
                } else if FAC_SLOTS.contains(&(sym, k)) {
                    SlotKind::Fac
                } else if SDC_SLOTS.contains(&(sym, k)) {
                    SlotKind::Sdc
                } else {
                    SlotKind::Msc
                };
            }
        }

        // The fixed frequency pilots must land on pilot carriers; they
        // carry the same reference value, so the fold above is lossless.
        debug_assert!(
            FREQ_PILOT_SLOTS
                .iter()
                .all(|&(_, k)| PILOT_CARRIERS.contains(&k))
        );

        let mut msc_order = Vec::with_capacity(MSC_CELLS_PER_FRAME);
        let mut msc_group_offsets = [0usize; SYMBOLS_PER_FRAME];
        let mut msc_group_lens = [0usize; SYMBOLS_PER_FRAME];

        for sym in 0..SYMBOLS_PER_FRAME {
            msc_group_offsets[sym] = msc_order.len();
            for idx in 0..NUM_CARRIERS {
                if kinds[sym][idx] == SlotKind::Msc {
                    msc_order.push((sym, idx));
                }
            }
            msc_group_lens[sym] = msc_order.len() - msc_group_offsets[sym];
        }

        debug_assert_eq!(msc_order.len(), MSC_CELLS_PER_FRAME);

        SlotMap {
            kinds,
            msc_order,
            msc_group_offsets,
            msc_group_lens,
        }
    }

    pub fn kind(&self, symbol: usize, carrier: usize) -> SlotKind {
        self.kinds[symbol][carrier]
    }

    /// All MSC slots in canonical order
    pub fn msc_order(&self) -> &[(usize, usize)] {
        &self.msc_order
    }

    /// (offset, length) of one symbol's MSC group within the flat
    /// 352-cell canonical order
    pub fn msc_group(&self, symbol: usize) -> (usize, usize) {
        (self.msc_group_offsets[symbol], self.msc_group_lens[symbol])
    }
}
