// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/
//
// Copyright 2026 Oxide Computer Company

//! The closed set of address kinds resolved from a result bus, and the
//! per-kind bit-layout attributes of this chip generation.
//!
//! Every attribute lives in a constant table indexed by the selector
//! discriminant.  The handful of genuinely selector-specific algorithms
//! (op-bit copy, stats swizzle, huffman-hole zero insertion) key off these
//! tables rather than switching on the selector at every call site.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::bitops::BitMove;
use crate::MauError;

/// Logical tables per MAU stage
pub const LOGICAL_TABLES: usize = 16;
/// Physical SRAM rows per stage
pub const SRAM_ROWS: usize = 8;
/// Result buses per row; bus index = row * 2 + half
pub const BUS_HALVES: usize = 2;
/// Exact-match result buses per stage
pub const MATCH_BUSES: usize = SRAM_ROWS * BUS_HALVES;
/// Ternary-indirection buses per stage
pub const TIND_BUSES: usize = SRAM_ROWS * BUS_HALVES;
/// Logical TCAMs per stage
pub const LTCAMS: usize = 8;
/// Meter/selector ALUs per stage
pub const METER_ALUS: usize = 4;
/// Per-bus exact-match shift configurations (one per hit entry)
pub const MATCHES_PER_BUS: usize = 4;
/// Full result-bus payload width in bits
pub const RESULT_BUS_WIDTH: usize = 83;
/// Bit position of the embedded match address within the payload
pub const RESULT_MATCH_ADDR_POS: usize = 64;
/// Width of the embedded match address
pub const RESULT_MATCH_ADDR_BITS: usize = 19;

/// Number of distinct address selectors
pub const SELECTORS: usize = 8;

/// The eight address/value kinds reconstructed from a result bus.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum::EnumIter,
    strum::EnumCount,
    strum::IntoStaticStr,
)]
pub enum Selector {
    /// Immediate action data carried directly in the match overhead
    ImmData,
    /// Action-instruction memory address
    Instr,
    /// Action-data RAM address
    ActData,
    /// Statistics (counter) address
    Stats,
    /// Meter address, including the 3-bit meter-type field
    Meter,
    /// Idle-time address
    Idle,
    /// Next-table value driving match-dependent control flow
    NxtTab,
    /// Selector length feeding the selector ALU
    SelLen,
}

// Attribute tables, indexed by selector discriminant in declaration order.
// These encode the silicon bit layout of each resolved address and must not
// be changed independently of the hardware they model.
const ADDR_WIDTH: [u8; SELECTORS] = [32, 7, 23, 20, 27, 21, 8, 8];
const ADDR_MASK_WIDTH: [u8; SELECTORS] = [32, 6, 22, 19, 23, 20, 8, 8];
const ADDR_PFE_POS: [Option<u8>; SELECTORS] = [
    None,
    Some(6),
    Some(22),
    Some(19),
    Some(23),
    Some(20),
    None,
    None,
];
const ADDR_OP_POS: [Option<u8>; SELECTORS] =
    [None, None, None, None, Some(24), None, None, None];
const ADDR_OP_BITS: [u8; SELECTORS] = [0, 0, 0, 0, 3, 0, 0, 0];
const PHYS_BUS_PAD: [u8; SELECTORS] = [0, 0, 5, 3, 23, 4, 0, 0];
const PHYS_PERENTRY_BITS: [u8; SELECTORS] = [0, 1, 1, 1, 1, 1, 0, 0];
const VPN_SHIFT_POS: [Option<u8>; SELECTORS] =
    [None, None, Some(17), None, None, None, None, None];
const SWIZZLE_BITS: [u8; SELECTORS] = [0, 0, 0, 2, 0, 0, 0, 0];
const LOG_DFLT_BEFORE_MASK: [bool; SELECTORS] =
    [false, false, false, false, false, false, true, false];

impl Selector {
    /// All selectors, in resolution order
    pub const ALL: [Selector; SELECTORS] = [
        Selector::ImmData,
        Selector::Instr,
        Selector::ActData,
        Selector::Stats,
        Selector::Meter,
        Selector::Idle,
        Selector::NxtTab,
        Selector::SelLen,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Total bit width of the resolved address, including per-entry-enable
    /// and op bits
    pub fn addr_width(self) -> u32 {
        ADDR_WIDTH[self.index()] as u32
    }

    /// Width of the maskable (address proper) portion
    pub fn addr_mask_width(self) -> u32 {
        ADDR_MASK_WIDTH[self.index()] as u32
    }

    /// Mask covering the full resolved address
    pub fn addr_mask(self) -> u32 {
        width_mask(self.addr_width())
    }

    /// Mask applied to the configured default register before it is OR'd in
    pub fn dflt_mask(self) -> u32 {
        width_mask(self.addr_width())
    }

    /// Canonical position of the per-entry-enable bit within the resolved
    /// address, if this kind carries one
    pub fn pfe_pos_in_addr(self) -> Option<u32> {
        ADDR_PFE_POS[self.index()].map(|p| p as u32)
    }

    /// Canonical position of the op (meter-type) bits within the resolved
    /// address
    pub fn op_pos_in_addr(self) -> Option<u32> {
        ADDR_OP_POS[self.index()].map(|p| p as u32)
    }

    /// Width of the op bit window
    pub fn op_bits(self) -> u32 {
        ADDR_OP_BITS[self.index()] as u32
    }

    /// Zero bits sitting conceptually below the bus payload for this kind.
    /// These model subword/huffman bits the payload never carries.
    pub fn bus_pad(self) -> u32 {
        PHYS_BUS_PAD[self.index()] as u32
    }

    /// Number of per-entry bits copied into the address past the mask
    pub fn perentry_bits(self) -> u32 {
        PHYS_PERENTRY_BITS[self.index()] as u32
    }

    /// Bit position of the huffman hole where VPN-shift zeros are spliced in
    pub fn vpn_shift_pos(self) -> Option<u32> {
        VPN_SHIFT_POS[self.index()].map(|p| p as u32)
    }

    /// Width of the relocatable swizzle field
    pub fn swizzle_bits(self) -> u32 {
        SWIZZLE_BITS[self.index()] as u32
    }

    /// Whether the logical-space default is OR'd in before the logical mask
    /// is applied (true only for the next-table value)
    pub fn dflt_before_mask(self) -> bool {
        LOG_DFLT_BEFORE_MASK[self.index()]
    }

    /// The bit relocation performed for a given swizzle mode, if any.  Both
    /// destinations sit below the stats per-entry-enable position so the
    /// relocation never displaces that bit.
    pub fn swizzle(self, mode: u8) -> Option<BitMove> {
        let nbits = self.swizzle_bits();
        if nbits == 0 {
            return None;
        }
        match mode {
            1 => Some(BitMove { nbits, from: 13, to: 15 }),
            2 => Some(BitMove { nbits, from: 13, to: 17 }),
            _ => None,
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name: &'static str = self.into();
        write!(f, "{name}")
    }
}

impl TryFrom<usize> for Selector {
    type Error = MauError;

    fn try_from(v: usize) -> Result<Self, Self::Error> {
        Selector::ALL
            .get(v)
            .copied()
            .ok_or(MauError::InvalidSelector(v))
    }
}

/// A mask covering the low `bits` bits, for widths up to 32
pub(crate) fn width_mask(bits: u32) -> u32 {
    assert!(bits <= 32, "mask width {bits} out of range");
    (((1u64) << bits) - 1) as u32
}
