// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/
//
// Copyright 2026 Oxide Computer Company

//! Result-bus configuration: typed accessors over the register snapshot,
//! the crossbar-derived logical-table maps (cached under a lock), and the
//! per-selector usage tallies.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use slog::debug;

use crate::regs::{BusEntry, RegSnapshot, NO_PFE};
use crate::selector::{
    Selector, LOGICAL_TABLES, MATCHES_PER_BUS, METER_ALUS, SELECTORS,
};
use crate::MatchKind;

/// How hardware-edge-case inconsistencies are treated.  The relaxed
/// defaults log and continue, matching normal simulation; a conformance
/// (DV) run clears them so the inconsistencies fail the lookup instead.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct ResolverPolicy {
    /// Tolerate a per-entry-enable position landing in padding or wrapping
    pub relax_shift_pfe_pos_check: bool,
    /// Tolerate an op-bit window landing in padding or wrapping
    pub relax_shift_op_pos_check: bool,
}

impl Default for ResolverPolicy {
    fn default() -> Self {
        ResolverPolicy {
            relax_shift_pfe_pos_check: true,
            relax_shift_op_pos_check: true,
        }
    }
}

impl ResolverPolicy {
    /// The strict policy used by conformance runs
    pub fn strict() -> Self {
        ResolverPolicy {
            relax_shift_pfe_pos_check: false,
            relax_shift_op_pos_check: false,
        }
    }
}

// The crossbar-derived maps, recomputed together and handed out as one
// consistent snapshot.
#[derive(Debug)]
struct BusMaps {
    ltab_match_buses: [u16; LOGICAL_TABLES],
    ltab_tind_buses: [u16; LOGICAL_TABLES],
    ltab_ltcams: [u8; LOGICAL_TABLES],
    ltab_alus: [u8; LOGICAL_TABLES],
    alu_match_buses: [u16; METER_ALUS],
    alu_tind_buses: [u16; METER_ALUS],
}

impl BusMaps {
    fn compute(regs: &RegSnapshot) -> BusMaps {
        let mut ltab_match_buses = [0u16; LOGICAL_TABLES];
        let mut ltab_tind_buses = [0u16; LOGICAL_TABLES];
        let mut ltab_alus = [0u8; LOGICAL_TABLES];

        for (bus, ltab) in regs.xbar.match_bus_ltab.iter().enumerate() {
            if let Some(lt) = ltab {
                assert!((*lt as usize) < LOGICAL_TABLES);
                ltab_match_buses[*lt as usize] |= 1 << bus;
            }
        }
        for (bus, ltab) in regs.xbar.tind_bus_ltab.iter().enumerate() {
            if let Some(lt) = ltab {
                assert!((*lt as usize) < LOGICAL_TABLES);
                ltab_tind_buses[*lt as usize] |= 1 << bus;
            }
        }
        for (alu, ltab) in regs.xbar.meter_alu_ltab.iter().enumerate() {
            if let Some(lt) = ltab {
                assert!((*lt as usize) < LOGICAL_TABLES);
                ltab_alus[*lt as usize] |= 1 << alu;
            }
        }

        BusMaps {
            ltab_match_buses,
            ltab_tind_buses,
            ltab_ltcams: regs.xbar.ltab_ltcams,
            ltab_alus,
            alu_match_buses: regs.xbar.meter_alu_match_bus,
            alu_tind_buses: regs.xbar.meter_alu_tind_bus,
        }
    }
}

// Per-selector hit/miss counters.  Incremented through the lookup path, so
// they must be cheap and shareable across concurrently simulated stages.
#[derive(Default)]
struct Tally {
    hits: [AtomicU64; SELECTORS],
    misses: [AtomicU64; SELECTORS],
}

/// A point-in-time copy of the usage tallies.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct TallyView {
    pub hits: [u64; SELECTORS],
    pub misses: [u64; SELECTORS],
}

/// The per-stage result-bus configuration object.
///
/// Owns a value snapshot of the relevant registers, answers the resolver's
/// parameter queries, and maintains the logical-table-to-physical-bus maps
/// derived from the crossbar registers.  The maps are recomputed lazily
/// after a snapshot replacement; the whole read-or-recompute path holds the
/// lock so readers never observe a partially built map.
pub struct ResultBus {
    log: slog::Logger,
    regs: RegSnapshot,
    policy: ResolverPolicy,
    maps: Mutex<Option<Arc<BusMaps>>>,
    tally: Tally,
}

impl ResultBus {
    pub fn new(
        log: &slog::Logger,
        regs: RegSnapshot,
        policy: ResolverPolicy,
    ) -> Self {
        ResultBus {
            log: log.new(slog::o!("unit" => "result-bus")),
            regs,
            policy,
            maps: Mutex::new(None),
            tally: Tally::default(),
        }
    }

    pub fn policy(&self) -> ResolverPolicy {
        self.policy
    }

    pub fn regs(&self) -> &RegSnapshot {
        &self.regs
    }

    /// Replace the register snapshot, as a control-plane write would, and
    /// invalidate the derived maps.
    pub fn replace_snapshot(&mut self, regs: RegSnapshot) {
        debug!(self.log, "register snapshot replaced");
        self.regs = regs;
        *self.maps.lock() = None;
    }

    fn maps(&self) -> Arc<BusMaps> {
        let mut guard = self.maps.lock();
        if let Some(maps) = &*guard {
            return maps.clone();
        }
        let maps = Arc::new(BusMaps::compute(&self.regs));
        debug!(self.log, "recomputed crossbar output maps");
        *guard = Some(maps.clone());
        maps
    }

    fn entry(&self, sel: Selector, kind: MatchKind, bus: usize) -> &BusEntry {
        self.regs.bus_entry(sel, kind, bus)
    }

    /// The payload shift for one (selector, bus, kind, hit entry).  The
    /// ternary path carries a single shift per bus.
    pub fn phy_shift(
        &self,
        sel: Selector,
        kind: MatchKind,
        bus: usize,
        match_idx: usize,
    ) -> u32 {
        assert!(match_idx < MATCHES_PER_BUS, "match {match_idx} out of range");
        let e = self.entry(sel, kind, bus);
        match kind {
            MatchKind::Exact => e.shift[match_idx] as u32,
            MatchKind::Ternary => e.shift[0] as u32,
        }
    }

    pub fn phy_mask(&self, sel: Selector, kind: MatchKind, bus: usize) -> u32 {
        self.entry(sel, kind, bus).mask
    }

    pub fn phy_dflt(&self, sel: Selector, kind: MatchKind, bus: usize) -> u32 {
        self.entry(sel, kind, bus).dflt & sel.dflt_mask()
    }

    /// The per-entry-enable bit position within the extracted value, if one
    /// is configured for this bus.
    pub fn perentry_pos(
        &self,
        sel: Selector,
        kind: MatchKind,
        bus: usize,
    ) -> Option<u32> {
        if sel.perentry_bits() == 0 {
            return None;
        }
        match self.entry(sel, kind, bus).perentry_pos {
            NO_PFE => None,
            pos => Some(pos as u32),
        }
    }

    pub fn payload_shifter_enable(
        &self,
        sel: Selector,
        kind: MatchKind,
        bus: usize,
    ) -> bool {
        self.entry(sel, kind, bus).shifter_en
    }

    /// Zero bits spliced into the action-data huffman hole for this bus
    /// (a 3-bit register field)
    pub fn vpn_shift(&self, kind: MatchKind, bus: usize) -> u32 {
        (self.entry(Selector::ActData, kind, bus).vpn_shift & 0x7) as u32
    }

    /// Statistics-address swizzle mode for this bus (a 2-bit register
    /// field)
    pub fn swizzle_mode(&self, kind: MatchKind, bus: usize) -> u8 {
        self.entry(Selector::Stats, kind, bus).swizzle_mode & 0x3
    }

    /// The miss value for (selector, logical table)
    pub fn miss_value(&self, sel: Selector, table: usize) -> u32 {
        assert!(table < LOGICAL_TABLES, "table {table} out of range");
        match sel {
            Selector::NxtTab => self.regs.nxt_tab[table].miss as u32,
            _ => self.regs.miss[sel.index()][table],
        }
    }

    pub fn nxt_tab_mask(&self, table: usize) -> u16 {
        assert!(table < LOGICAL_TABLES, "table {table} out of range");
        self.regs.nxt_tab[table].mask
    }

    pub fn nxt_tab_dflt(&self, table: usize) -> u16 {
        assert!(table < LOGICAL_TABLES, "table {table} out of range");
        self.regs.nxt_tab[table].dflt
    }

    pub fn nxt_tab_map_en(&self, table: usize) -> bool {
        assert!(table < LOGICAL_TABLES, "table {table} out of range");
        self.regs.nxt_tab[table].map_en
    }

    /// Generic-map entry for the extracted 3-bit low value
    pub fn nxt_tab_mapped(&self, table: usize, low3: u32) -> u16 {
        assert!(table < LOGICAL_TABLES, "table {table} out of range");
        self.regs.nxt_tab[table].map[(low3 & 0x7) as usize]
    }

    pub fn nxt_tab_actionbit_map_en(
        &self,
        table: usize,
        kind: MatchKind,
    ) -> bool {
        assert!(table < LOGICAL_TABLES, "table {table} out of range");
        let idx = match kind {
            MatchKind::Exact => 0,
            MatchKind::Ternary => 1,
        };
        self.regs.nxt_tab[table].actionbit_map_en[idx]
    }

    /// Actionbit-map entry for the payload discriminant
    pub fn nxt_tab_actionbit_mapped(&self, table: usize, code: u8) -> u16 {
        assert!(table < LOGICAL_TABLES, "table {table} out of range");
        self.regs.nxt_tab[table].actionbit_map[(code & 0x3) as usize]
    }

    /// Bitmap of physical buses feeding a logical table on the given path
    pub fn buses(&self, kind: MatchKind, table: usize) -> u16 {
        assert!(table < LOGICAL_TABLES, "table {table} out of range");
        let maps = self.maps();
        match kind {
            MatchKind::Exact => maps.ltab_match_buses[table],
            MatchKind::Ternary => maps.ltab_tind_buses[table],
        }
    }

    /// Bitmap of LTCAMs driving a logical table's ternary path
    pub fn ltcams(&self, table: usize) -> u8 {
        assert!(table < LOGICAL_TABLES, "table {table} out of range");
        self.maps().ltab_ltcams[table]
    }

    /// Bitmap of physical buses feeding a meter ALU on the given path
    pub fn meter_alu_buses(&self, kind: MatchKind, alu: u8) -> u16 {
        assert!((alu as usize) < METER_ALUS, "alu {alu} out of range");
        let maps = self.maps();
        match kind {
            MatchKind::Exact => maps.alu_match_buses[alu as usize],
            MatchKind::Ternary => maps.alu_tind_buses[alu as usize],
        }
    }

    /// The first meter ALU driven by a logical table, if any
    pub fn meter_alu_for_table(&self, table: usize) -> Option<u8> {
        assert!(table < LOGICAL_TABLES, "table {table} out of range");
        let alus = self.maps().ltab_alus[table];
        (alus != 0).then(|| alus.trailing_zeros() as u8)
    }

    /// All meter ALUs driven by a logical table
    pub fn meter_alus_for_table(&self, table: usize) -> Vec<u8> {
        assert!(table < LOGICAL_TABLES, "table {table} out of range");
        let alus = self.maps().ltab_alus[table];
        (0..METER_ALUS as u8).filter(|a| alus & (1 << a) != 0).collect()
    }

    pub fn table_ingress(&self, table: usize) -> bool {
        assert!(table < LOGICAL_TABLES, "table {table} out of range");
        self.regs.table[table].ingress
    }

    pub fn table_bitmask_ops(&self, table: usize) -> bool {
        assert!(table < LOGICAL_TABLES, "table {table} out of range");
        self.regs.table[table].bitmask_ops
    }

    pub(crate) fn tally_hit(&self, sel: Selector) {
        self.tally.hits[sel.index()].fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn tally_miss(&self, sel: Selector) {
        self.tally.misses[sel.index()].fetch_add(1, Ordering::Relaxed);
    }

    /// A point-in-time copy of the per-selector usage tallies
    pub fn tally(&self) -> TallyView {
        let mut view =
            TallyView { hits: [0; SELECTORS], misses: [0; SELECTORS] };
        for i in 0..SELECTORS {
            view.hits[i] = self.tally.hits[i].load(Ordering::Relaxed);
            view.misses[i] = self.tally.misses[i].load(Ordering::Relaxed);
        }
        view
    }
}
