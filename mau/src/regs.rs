// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/
//
// Copyright 2026 Oxide Computer Company

//! A value-owned snapshot of the register state the resolver consumes.
//!
//! The register map itself (storage, addressing, field packing) is not
//! modeled here; this is the set of already-decoded configuration values a
//! resolver instance needs, captured as plain data.  Snapshots serialize to
//! JSON so verification harnesses can persist and replay fixtures.

use serde::{Deserialize, Serialize};

use crate::selector::{
    Selector, LOGICAL_TABLES, MATCHES_PER_BUS, MATCH_BUSES, METER_ALUS,
    SELECTORS, TIND_BUSES,
};
use crate::MatchKind;

/// Sentinel for "no per-entry-enable bit configured" in [`BusEntry`]
pub const NO_PFE: u8 = 0xff;

/// Per-(selector, bus, match-kind) extraction parameters.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct BusEntry {
    /// Bit shift applied to the padded payload.  Exact-match buses carry
    /// one shift per hit entry; the ternary path uses entry 0 only.
    pub shift: [u8; MATCHES_PER_BUS],
    /// Mask applied after extraction and op-bit merge
    pub mask: u32,
    /// Default OR'd in after the mask
    pub dflt: u32,
    /// Position of the per-entry-enable bit within the extracted value, or
    /// [`NO_PFE`]
    pub perentry_pos: u8,
    /// Whether the payload shifter for this bus is powered; a disabled
    /// shifter contributes all-zero data
    pub shifter_en: bool,
    /// Zero bits spliced into the huffman hole (action-data address only)
    pub vpn_shift: u8,
    /// Field relocation mode (statistics address only; 0 = none)
    pub swizzle_mode: u8,
}

impl Default for BusEntry {
    fn default() -> Self {
        BusEntry {
            shift: [0; MATCHES_PER_BUS],
            mask: 0,
            dflt: 0,
            perentry_pos: NO_PFE,
            shifter_en: false,
            vpn_shift: 0,
            swizzle_mode: 0,
        }
    }
}

/// Per-logical-table next-table registers.  Next-table resolution carries
/// two indirection tables: an actionbit map keyed off the TCAM payload
/// discriminant, and a generic map keyed off the extracted low 3 bits, with
/// the actionbit map taking precedence whenever enabled.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct NxtTabEntry {
    /// Value produced when the lookup misses
    pub miss: u16,
    /// Logical-space mask
    pub mask: u16,
    /// Logical-space default
    pub dflt: u16,
    /// Generic-map enable
    pub map_en: bool,
    /// Generic map, keyed off the extracted 3-bit low value
    pub map: [u16; 8],
    /// Actionbit-map enable, indexed by match kind (exact, ternary)
    pub actionbit_map_en: [bool; 2],
    /// Actionbit map, keyed off the 2-bit payload discriminant; the 1-bit
    /// exact-match discriminant uses entries 0 and 1
    pub actionbit_map: [u16; 4],
}

impl Default for NxtTabEntry {
    fn default() -> Self {
        NxtTabEntry {
            miss: 0,
            mask: 0xff,
            dflt: 0,
            map_en: false,
            map: [0; 8],
            actionbit_map_en: [false; 2],
            actionbit_map: [0; 4],
        }
    }
}

/// Per-logical-table properties that are not selector-scoped.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct TableEntry {
    /// Ingress (true) or egress (false) thread
    pub ingress: bool,
    /// Whether the table's gateway uses bitmask-ops comparisons
    pub bitmask_ops: bool,
}

/// Crossbar output-map registers: which logical table each physical bus
/// feeds, which LTCAMs drive each table's ternary path, and how the meter
/// ALUs are wired.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct XbarRegs {
    /// Logical table fed by each exact-match bus, if any
    pub match_bus_ltab: [Option<u8>; MATCH_BUSES],
    /// Logical table fed by each tind bus, if any
    pub tind_bus_ltab: [Option<u8>; TIND_BUSES],
    /// LTCAM bitmap per logical table
    pub ltab_ltcams: [u8; LOGICAL_TABLES],
    /// Logical table driving each meter ALU, if any
    pub meter_alu_ltab: [Option<u8>; METER_ALUS],
    /// Exact-match bus bitmap feeding each meter ALU
    pub meter_alu_match_bus: [u16; METER_ALUS],
    /// Tind bus bitmap feeding each meter ALU
    pub meter_alu_tind_bus: [u16; METER_ALUS],
}

impl Default for XbarRegs {
    fn default() -> Self {
        XbarRegs {
            match_bus_ltab: [None; MATCH_BUSES],
            tind_bus_ltab: [None; TIND_BUSES],
            ltab_ltcams: [0; LOGICAL_TABLES],
            meter_alu_ltab: [None; METER_ALUS],
            meter_alu_match_bus: [0; METER_ALUS],
            meter_alu_tind_bus: [0; METER_ALUS],
        }
    }
}

/// The complete register snapshot a resolver instance is constructed from.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RegSnapshot {
    /// Per-selector, per-exact-match-bus extraction parameters
    pub xm_bus: [[BusEntry; MATCH_BUSES]; SELECTORS],
    /// Per-selector, per-tind-bus extraction parameters
    pub tm_bus: [[BusEntry; TIND_BUSES]; SELECTORS],
    /// Per-selector, per-logical-table miss values (next-table's miss value
    /// lives in [`NxtTabEntry`] and this row is unused for it)
    pub miss: [[u32; LOGICAL_TABLES]; SELECTORS],
    /// Next-table registers
    pub nxt_tab: [NxtTabEntry; LOGICAL_TABLES],
    /// Crossbar output maps
    pub xbar: XbarRegs,
    /// Per-table properties
    pub table: [TableEntry; LOGICAL_TABLES],
}

impl Default for RegSnapshot {
    fn default() -> Self {
        RegSnapshot {
            xm_bus: [[BusEntry::default(); MATCH_BUSES]; SELECTORS],
            tm_bus: [[BusEntry::default(); TIND_BUSES]; SELECTORS],
            miss: [[0; LOGICAL_TABLES]; SELECTORS],
            nxt_tab: [NxtTabEntry::default(); LOGICAL_TABLES],
            xbar: XbarRegs::default(),
            table: [TableEntry::default(); LOGICAL_TABLES],
        }
    }
}

impl RegSnapshot {
    /// Serialize the snapshot for fixture capture.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Load a previously captured snapshot.
    pub fn from_json(text: &str) -> serde_json::Result<RegSnapshot> {
        serde_json::from_str(text)
    }

    /// The extraction parameters for one (selector, kind, bus)
    pub fn bus_entry(
        &self,
        sel: Selector,
        kind: MatchKind,
        bus: usize,
    ) -> &BusEntry {
        match kind {
            MatchKind::Exact => {
                assert!(bus < MATCH_BUSES, "match bus {bus} out of range");
                &self.xm_bus[sel.index()][bus]
            }
            MatchKind::Ternary => {
                assert!(bus < TIND_BUSES, "tind bus {bus} out of range");
                &self.tm_bus[sel.index()][bus]
            }
        }
    }

    /// Mutable access for harness/fixture construction
    pub fn bus_entry_mut(
        &mut self,
        sel: Selector,
        kind: MatchKind,
        bus: usize,
    ) -> &mut BusEntry {
        match kind {
            MatchKind::Exact => {
                assert!(bus < MATCH_BUSES, "match bus {bus} out of range");
                &mut self.xm_bus[sel.index()][bus]
            }
            MatchKind::Ternary => {
                assert!(bus < TIND_BUSES, "tind bus {bus} out of range");
                &mut self.tm_bus[sel.index()][bus]
            }
        }
    }
}
