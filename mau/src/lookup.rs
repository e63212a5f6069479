// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/
//
// Copyright 2026 Oxide Computer Company

//! Per-lookup address resolution.
//!
//! A [`LookupResult`] is the working set for one logical table in one
//! simulated cycle.  After `setup_lookup` caches the table's bus wiring and
//! the match engine reports hit/miss, each of the eight selectors can be
//! resolved: raw bus extraction (mask/shift/default), per-entry-enable and
//! op-bit placement, huffman-hole zero insertion, stats swizzle, OR-fan-in
//! across buses, exact∪ternary combination, hash-distribution merge, and
//! the next-table indirection maps.
//!
//! The per-entry and op bits are computed twice on purpose: once by the
//! general rotated-barrel formula and once by zone analysis.  The zone
//! analysis is authoritative; a divergence (possible only when the bit
//! position lands in the zero padding) is logged as a cross-check signal
//! and never silently dropped.

use slog::{debug, error, warn};

use crate::bitops::{
    barrel_bit, barrel_extract, barrel_window, classify_bit, insert_zeros,
    payload_bit, BitZone,
};
use crate::bus::{bus_half, bus_row};
use crate::config::ResultBus;
use crate::hash_dist::{HashDistribution, Phv};
use crate::selector::{
    width_mask, Selector, LOGICAL_TABLES, MATCHES_PER_BUS, MATCH_BUSES,
    RESULT_MATCH_ADDR_BITS, TIND_BUSES,
};
use crate::{BusWord, MatchKind, MauError, MauResult, ResultBusSource};

/// Sentinel marking the memoized next-table value as not yet computed
pub const NXT_TAB_INVALID: u16 = 0xffff;

/// Apply a logical-space default/mask pair in the order the selector
/// requires: the next-table value ORs its default in before masking, every
/// other selector masks first.
pub fn apply_dflt_mask(sel: Selector, v: u32, mask: u32, dflt: u32) -> u32 {
    if sel.dflt_before_mask() {
        (v | dflt) & mask
    } else {
        (v & mask) | dflt
    }
}

/// The per-(logical table, cycle) lookup working set.
pub struct LookupResult<'a> {
    log: slog::Logger,
    rbus: &'a ResultBus,
    rows: &'a dyn ResultBusSource,
    hash: &'a dyn HashDistribution,
    phv: Option<&'a Phv>,

    table: usize,
    set_up: bool,
    matched: bool,
    hit_entry: u8,
    payload: u8,
    gateway_inhibit: bool,
    gateway_nxt_tab: u16,

    // one bit per selector; prevents double-counting the usage tallies
    tallied: u8,
    // bus wiring cached by setup_lookup; stable for the cycle
    xm_buses: u16,
    tm_buses: u16,
    ltcams: u8,

    nxt_tab_raw: u16,
    nxt_tab_masked: u16,
    nxt_tab_final: u16,
}

impl<'a> LookupResult<'a> {
    pub fn new(
        log: &slog::Logger,
        rbus: &'a ResultBus,
        rows: &'a dyn ResultBusSource,
        hash: &'a dyn HashDistribution,
    ) -> Self {
        LookupResult {
            log: log.new(slog::o!("unit" => "lookup-result")),
            rbus,
            rows,
            hash,
            phv: None,
            table: 0,
            set_up: false,
            matched: false,
            hit_entry: 0,
            payload: 0,
            gateway_inhibit: false,
            gateway_nxt_tab: 0,
            tallied: 0,
            xm_buses: 0,
            tm_buses: 0,
            ltcams: 0,
            nxt_tab_raw: NXT_TAB_INVALID,
            nxt_tab_masked: NXT_TAB_INVALID,
            nxt_tab_final: NXT_TAB_INVALID,
        }
    }

    /// Begin a lookup cycle for one logical table: cache the table's bus
    /// wiring and clear all per-cycle state.
    pub fn setup_lookup(&mut self, phv: &'a Phv, table: usize) {
        assert!(table < LOGICAL_TABLES, "table {table} out of range");
        self.reset_addresses();
        self.phv = Some(phv);
        self.table = table;
        self.xm_buses = self.rbus.buses(MatchKind::Exact, table);
        self.tm_buses = self.rbus.buses(MatchKind::Ternary, table);
        self.ltcams = self.rbus.ltcams(table);
        self.set_up = true;
    }

    /// Clear all per-cycle state, returning the object to its
    /// pre-`setup_lookup` condition.
    pub fn reset_addresses(&mut self) {
        self.phv = None;
        self.set_up = false;
        self.matched = false;
        self.hit_entry = 0;
        self.payload = 0;
        self.gateway_inhibit = false;
        self.gateway_nxt_tab = 0;
        self.tallied = 0;
        self.xm_buses = 0;
        self.tm_buses = 0;
        self.ltcams = 0;
        self.nxt_tab_raw = NXT_TAB_INVALID;
        self.nxt_tab_masked = NXT_TAB_INVALID;
        self.nxt_tab_final = NXT_TAB_INVALID;
    }

    /// Record the match engine's outcome for this cycle.
    pub fn set_match(&mut self, hit: bool, hit_entry: u8) {
        assert!(
            (hit_entry as usize) < MATCHES_PER_BUS,
            "hit entry {hit_entry} out of range"
        );
        self.matched = hit;
        self.hit_entry = hit_entry;
    }

    /// Record the 2-bit TCAM payload discriminant.
    pub fn set_payload(&mut self, payload: u8) {
        assert!(payload < 4, "payload {payload} out of range");
        self.payload = payload;
    }

    pub fn set_gateway_inhibit(&mut self, inhibit: bool) {
        self.gateway_inhibit = inhibit;
    }

    /// The next-table value the gateway logic produced; consulted only when
    /// the gateway inhibited the table.
    pub fn set_gateway_next_table(&mut self, v: u16) {
        self.gateway_nxt_tab = v;
    }

    pub fn matched(&self) -> bool {
        self.matched
    }

    pub fn table(&self) -> usize {
        self.table
    }

    /// LTCAM bitmap cached for this cycle
    pub fn ltcams(&self) -> u8 {
        self.ltcams
    }

    /// The raw, masked, and mapped forms of the memoized next-table value
    pub fn next_table_forms(&self) -> (u16, u16, u16) {
        (self.nxt_tab_raw, self.nxt_tab_masked, self.nxt_tab_final)
    }

    fn bus_word(&self, kind: MatchKind, bus: usize) -> (BusWord, bool) {
        let (row, half) = (bus_row(bus), bus_half(bus));
        let mut word = BusWord::default();
        let driven = match kind {
            MatchKind::Exact => {
                assert!(bus < MATCH_BUSES, "match bus {bus} out of range");
                self.rows.match_output_bus(row, half, &mut word)
            }
            MatchKind::Ternary => {
                assert!(bus < TIND_BUSES, "tind bus {bus} out of range");
                self.rows.tind_output_bus(row, half, &mut word)
            }
        };
        (word, driven)
    }

    /// Read-only bus introspection for verification tooling.
    pub fn get_bus(
        &self,
        kind: MatchKind,
        bus: usize,
        word: &mut BusWord,
    ) -> bool {
        let (w, driven) = self.bus_word(kind, bus);
        *word = w;
        driven
    }

    /// The match address carried on a bus: the embedded field for the exact
    /// path, the TCAM match address for the ternary path.
    pub fn get_match_addr(&self, kind: MatchKind, bus: usize) -> u32 {
        let addr = match kind {
            MatchKind::Exact => self.bus_word(kind, bus).0.match_addr,
            MatchKind::Ternary => {
                self.rows.tcam_match_addr(bus_row(bus), bus_half(bus))
            }
        };
        addr & width_mask(RESULT_MATCH_ADDR_BITS as u32)
    }

    /// Resolve one selector's contribution from one physical bus.
    pub fn get_phy_data_bus(
        &self,
        sel: Selector,
        kind: MatchKind,
        bus: usize,
        match_idx: usize,
    ) -> MauResult<u32> {
        let shifter_en = self.rbus.payload_shifter_enable(sel, kind, bus);
        let (word, driven) = self.bus_word(kind, bus);
        let raw = word.data;
        // A powered-down shifter contributes zeros, but the enable/op
        // checks below still look at what the bus was driving.
        let data = if shifter_en { raw } else { 0 };
        if !shifter_en && driven && raw != 0 {
            warn!(
                self.log,
                "payload shifter disabled but bus driven";
                "sel" => %sel,
                "kind" => %kind,
                "bus" => bus,
                "data" => format!("{raw:#x}"),
            );
        }

        let pad = sel.bus_pad();
        let shift = self.rbus.phy_shift(sel, kind, bus, match_idx);
        let mask = self.rbus.phy_mask(sel, kind, bus);
        let dflt = self.rbus.phy_dflt(sel, kind, bus);

        let mut v = barrel_extract(data, shift, pad) & sel.addr_mask();
        if let Some(pos) = sel.vpn_shift_pos() {
            let n = self.rbus.vpn_shift(kind, bus);
            if n > 0 {
                v = insert_zeros(v, pos, n) & sel.addr_mask();
            }
        }

        let op = self.get_op(sel, kind, bus, shift, raw, driven, dflt)?;
        let pfe = self.get_pfe(sel, kind, bus, shift, raw, driven, dflt)?;

        // OR the op copy in before the mask, then the enable bit and the
        // default after it: defaults and per-entry enables are never
        // maskable away.
        let mut out = ((v | op) & mask) | pfe | dflt;
        if let Some(mv) = sel.swizzle(self.rbus.swizzle_mode(kind, bus)) {
            out = mv.apply(out);
        }
        Ok(out & sel.addr_mask())
    }

    // Extract the per-entry-enable bit and place it at its canonical
    // position within the resolved address.
    fn get_pfe(
        &self,
        sel: Selector,
        kind: MatchKind,
        bus: usize,
        shift: u32,
        raw: u64,
        driven: bool,
        dflt: u32,
    ) -> MauResult<u32> {
        let Some(addr_pos) = sel.pfe_pos_in_addr() else {
            return Ok(0);
        };
        let Some(cfg_pos) = self.rbus.perentry_pos(sel, kind, bus) else {
            return Ok(0);
        };
        let shifter_en = self.rbus.payload_shifter_enable(sel, kind, bus);
        let data = if shifter_en { raw } else { 0 };
        let pad = sel.bus_pad();
        let pos = cfg_pos + shift;

        let way1 = barrel_bit(data, pos, pad);
        let (bit, zone) = match classify_bit(pos, pad) {
            BitZone::Padding => (0, BitZone::Padding),
            BitZone::Payload => {
                (payload_bit(data, pos - pad), BitZone::Payload)
            }
            BitZone::Wrapped => {
                (payload_bit(data, (pos - pad) % 64), BitZone::Wrapped)
            }
        };
        if way1 != bit {
            error!(
                self.log,
                "per-entry enable cross-check diff";
                "sel" => %sel,
                "kind" => %kind,
                "bus" => bus,
                "pos" => pos,
                "pad" => pad,
                "way1" => way1,
                "way2" => bit,
            );
        }
        if zone == BitZone::Padding
            && shifter_en
            && driven
            && raw != 0
            && dflt & (1 << addr_pos) == 0
        {
            // The enable bit can never assert from inside the padding; a
            // live bus with no default coverage means the configuration is
            // inconsistent with the data being driven.
            if !self.rbus.policy().relax_shift_pfe_pos_check {
                return Err(MauError::PfePosInconsistent {
                    sel: sel.into(),
                    kind,
                    bus,
                    pos,
                    pad,
                });
            }
            error!(
                self.log,
                "per-entry enable position lands in bus padding";
                "sel" => %sel,
                "kind" => %kind,
                "bus" => bus,
                "pos" => pos,
                "pad" => pad,
            );
        }
        Ok(bit << addr_pos)
    }

    // Extract the op (meter-type) window and place it at its canonical
    // position within the resolved address.
    fn get_op(
        &self,
        sel: Selector,
        kind: MatchKind,
        bus: usize,
        shift: u32,
        raw: u64,
        driven: bool,
        dflt: u32,
    ) -> MauResult<u32> {
        let nbits = sel.op_bits();
        if nbits == 0 {
            return Ok(0);
        }
        let addr_pos = sel
            .op_pos_in_addr()
            .expect("op bits configured without a position");
        let shifter_en = self.rbus.payload_shifter_enable(sel, kind, bus);
        let data = if shifter_en { raw } else { 0 };
        let pad = sel.bus_pad();
        let pos = addr_pos + shift;

        let way1 = barrel_window(data, pos, pad, nbits);
        // In-window only when the whole op field fits inside the payload;
        // padding overlap and wrap both collapse to zero.
        let (val, in_window) = if pos < pad || pos - pad + nbits > 64 {
            (0, false)
        } else {
            (((data >> (pos - pad)) as u32) & width_mask(nbits), true)
        };
        if way1 != val {
            error!(
                self.log,
                "op bits cross-check diff";
                "sel" => %sel,
                "kind" => %kind,
                "bus" => bus,
                "pos" => pos,
                "pad" => pad,
                "way1" => way1,
                "way2" => val,
            );
        }
        if !in_window {
            let dflt_window = (dflt >> addr_pos) & width_mask(nbits);
            if shifter_en && driven && raw != 0 && dflt_window == 0 {
                if !self.rbus.policy().relax_shift_op_pos_check {
                    return Err(MauError::OpPosInconsistent {
                        sel: sel.into(),
                        kind,
                        bus,
                        pos,
                        pad,
                    });
                }
                error!(
                    self.log,
                    "op bit window unreachable from payload";
                    "sel" => %sel,
                    "kind" => %kind,
                    "bus" => bus,
                    "pos" => pos,
                    "pad" => pad,
                );
            }
        }
        Ok(val << addr_pos)
    }

    // The buses feeding one side of this table's lookup.  The selector
    // length is wired through the table's meter ALUs rather than the
    // table's own buses.
    fn side_buses(&self, sel: Selector, kind: MatchKind) -> u16 {
        if sel == Selector::SelLen {
            self.rbus
                .meter_alus_for_table(self.table)
                .iter()
                .fold(0, |acc, alu| {
                    acc | self.rbus.meter_alu_buses(kind, *alu)
                })
        } else {
            match kind {
                MatchKind::Exact => self.xm_buses,
                MatchKind::Ternary => self.tm_buses,
            }
        }
    }

    /// OR-combine one selector's contributions across every bus feeding
    /// this table on the given path.
    pub fn get_phy_data(
        &self,
        sel: Selector,
        kind: MatchKind,
    ) -> MauResult<u32> {
        assert!(self.set_up, "lookup not set up");
        let buses = self.side_buses(sel, kind);
        let match_idx = match kind {
            MatchKind::Exact => self.hit_entry as usize,
            MatchKind::Ternary => 0,
        };
        let mut v = 0;
        for bus in 0..MATCH_BUSES {
            if buses & (1 << bus) != 0 {
                v |= self.get_phy_data_bus(sel, kind, bus, match_idx)?;
            }
        }
        Ok(v)
    }

    fn apply_log_dflt_mask(&self, sel: Selector, v: u32) -> u32 {
        let (mask, dflt) = match sel {
            Selector::NxtTab => (
                self.rbus.nxt_tab_mask(self.table) as u32,
                self.rbus.nxt_tab_dflt(self.table) as u32,
            ),
            // every other selector's logical-space pair is the no-op
            _ => (u32::MAX, 0),
        };
        apply_dflt_mask(sel, v, mask, dflt)
    }

    fn apply_nxt_tab_map(&self, v: u32) -> u32 {
        if self.rbus.nxt_tab_map_en(self.table) {
            self.rbus.nxt_tab_mapped(self.table, v & 0x7) as u32
        } else {
            v
        }
    }

    // One side (exact or ternary) of the logical composition.  The
    // actionbit map, when enabled, replaces the physical bus entirely; the
    // next-table value defers its logical pass until the sides are
    // combined, so its map sees the OR'd value.
    fn log_data_side(
        &self,
        sel: Selector,
        kind: MatchKind,
    ) -> MauResult<u32> {
        if sel == Selector::NxtTab
            && self.rbus.nxt_tab_actionbit_map_en(self.table, kind)
        {
            let code = match kind {
                MatchKind::Exact => self.hit_entry & 0x1,
                MatchKind::Ternary => self.payload & 0x3,
            };
            return Ok(
                self.rbus.nxt_tab_actionbit_mapped(self.table, code) as u32
            );
        }
        let v = self.get_phy_data(sel, kind)?;
        if sel == Selector::NxtTab {
            return Ok(v);
        }
        Ok(self.apply_log_dflt_mask(sel, v))
    }

    fn hash_dist_result(&self, sel: Selector) -> u32 {
        let Some(phv) = self.phv else {
            return 0;
        };
        match sel {
            Selector::ImmData => self.hash.immediate_data(phv, self.table),
            Selector::ActData => self.hash.action_address(phv, self.table),
            Selector::Meter => self.hash.meter_address(phv, self.table),
            Selector::Stats => self.hash.stats_address(phv, self.table),
            _ => 0,
        }
    }

    fn tally_once(&mut self, sel: Selector, hit: bool) {
        let bit = 1u8 << sel.index();
        if self.tallied & bit == 0 {
            self.tallied |= bit;
            if hit {
                self.rbus.tally_hit(sel);
            } else {
                self.rbus.tally_miss(sel);
            }
        }
    }

    /// Resolve one selector for this table and cycle.  On a miss this is
    /// the configured miss value; on a hit, the exact∪ternary bus
    /// combination plus the hash-distribution contribution.
    pub fn get_log_data(
        &mut self,
        sel: Selector,
        post_predication: bool,
    ) -> MauResult<u32> {
        assert!(self.set_up, "lookup not set up");
        if sel == Selector::NxtTab {
            return self
                .resolve_next_table(post_predication)
                .map(|v| v as u32);
        }
        if !self.matched {
            self.tally_once(sel, false);
            return Ok(self.rbus.miss_value(sel, self.table));
        }
        self.tally_once(sel, true);
        let xm = self.log_data_side(sel, MatchKind::Exact)?;
        let tm = self.log_data_side(sel, MatchKind::Ternary)?;
        Ok(xm | tm | self.hash_dist_result(sel))
    }

    fn resolve_next_table(&mut self, honor_gateway: bool) -> MauResult<u16> {
        assert!(self.set_up, "lookup not set up");
        if honor_gateway && self.nxt_tab_final != NXT_TAB_INVALID {
            return Ok(self.nxt_tab_final);
        }

        let (raw, masked, mapped) =
            if honor_gateway && self.gateway_inhibit {
                // The gateway bypassed the match path; its value still goes
                // through the logical mask/default/map pass.
                let raw = self.gateway_nxt_tab as u32;
                let masked =
                    self.apply_log_dflt_mask(Selector::NxtTab, raw);
                debug!(
                    self.log,
                    "next-table from gateway";
                    "table" => self.table,
                    "raw" => raw,
                );
                (raw, masked, self.apply_nxt_tab_map(masked))
            } else if !self.matched {
                // The miss register holds a final next-table value.
                self.tally_once(Selector::NxtTab, false);
                let miss =
                    self.rbus.miss_value(Selector::NxtTab, self.table);
                (miss, miss, miss)
            } else {
                self.tally_once(Selector::NxtTab, true);
                let xm =
                    self.log_data_side(Selector::NxtTab, MatchKind::Exact)?;
                let tm = self
                    .log_data_side(Selector::NxtTab, MatchKind::Ternary)?;
                let raw = xm | tm;
                let masked =
                    self.apply_log_dflt_mask(Selector::NxtTab, raw);
                (raw, masked, self.apply_nxt_tab_map(masked))
            };

        if honor_gateway {
            self.nxt_tab_raw = raw as u16;
            self.nxt_tab_masked = masked as u16;
            self.nxt_tab_final = mapped as u16;
        }
        Ok(mapped as u16)
    }

    /// Resolve the next-table value, honoring gateway inhibit.  Memoized:
    /// repeated calls within one cycle return the identical value.
    pub fn extract_next_table(&mut self) -> MauResult<u16> {
        self.resolve_next_table(true)
    }

    /// The resolved selector length for this table's meter ALU path.
    /// Read-only: never tallies.
    pub fn get_selector_length(&self) -> MauResult<u32> {
        assert!(self.set_up, "lookup not set up");
        if !self.matched {
            return Ok(self.rbus.miss_value(Selector::SelLen, self.table));
        }
        let xm = self.get_phy_data(Selector::SelLen, MatchKind::Exact)?;
        let tm = self.get_phy_data(Selector::SelLen, MatchKind::Ternary)?;
        Ok(xm | tm)
    }

    /// The hash-derived selector address for this table's meter ALU.
    pub fn get_selector_address(&self) -> MauResult<u32> {
        let Some(phv) = self.phv else {
            return Ok(0);
        };
        let Some(alu) = self.rbus.meter_alu_for_table(self.table) else {
            debug!(
                self.log,
                "selector address requested with no meter alu";
                "table" => self.table,
            );
            return Ok(0);
        };
        let sel_len = self.get_selector_length()?;
        Ok(self.hash.selector_address(phv, self.table, alu, sel_len))
    }

    /// The hash-derived selector action-data address for this table's
    /// meter ALU.
    pub fn get_selector_action_address(&self) -> MauResult<u32> {
        let Some(phv) = self.phv else {
            return Ok(0);
        };
        let Some(alu) = self.rbus.meter_alu_for_table(self.table) else {
            debug!(
                self.log,
                "selector action address requested with no meter alu";
                "table" => self.table,
            );
            return Ok(0);
        };
        let sel_len = self.get_selector_length()?;
        Ok(self
            .hash
            .selector_action_address(phv, self.table, alu, sel_len))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_dflt_mask_ordering() {
        // Next-table ORs the default in first, so masked-off default bits
        // vanish; everything else masks first, so the default survives.
        let v = 0x0f0;
        let mask = 0x0ff;
        let dflt = 0xf00;
        assert_eq!(apply_dflt_mask(Selector::NxtTab, v, mask, dflt), 0x0f0);
        assert_eq!(apply_dflt_mask(Selector::Stats, v, mask, dflt), 0xff0);
    }
}
