// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/
//
// Copyright 2026 Oxide Computer Company

//! Programmable stand-ins for the row logic and the hash-distribution
//! unit.  Verification harnesses (and this crate's own tests) load bus
//! contents into a [`StubRows`] and drive the resolver against it instead
//! of a full pipeline model.

use crate::bus::{BusWord, ResultBusSource};
use crate::hash_dist::{HashDistribution, Phv};
use crate::selector::{BUS_HALVES, SRAM_ROWS};

/// A bank of programmable result buses.  Unset buses read as undriven
/// zeros.
#[derive(Clone, Debug, Default)]
pub struct StubRows {
    match_bus: [[Option<BusWord>; BUS_HALVES]; SRAM_ROWS],
    tind_bus: [[Option<BusWord>; BUS_HALVES]; SRAM_ROWS],
    tcam_addr: [[u32; BUS_HALVES]; SRAM_ROWS],
}

impl StubRows {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drive an exact-match result bus
    pub fn set_match_bus(&mut self, row: usize, half: usize, word: BusWord) {
        self.match_bus[row][half] = Some(word);
    }

    /// Drive a ternary-indirection bus
    pub fn set_tind_bus(&mut self, row: usize, half: usize, word: BusWord) {
        self.tind_bus[row][half] = Some(word);
    }

    pub fn set_tcam_match_addr(&mut self, row: usize, half: usize, addr: u32) {
        self.tcam_addr[row][half] = addr;
    }

    /// Stop driving every bus
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

impl ResultBusSource for StubRows {
    fn match_output_bus(
        &self,
        row: usize,
        half: usize,
        word: &mut BusWord,
    ) -> bool {
        match self.match_bus[row][half] {
            Some(w) => {
                *word = w;
                true
            }
            None => {
                *word = BusWord::default();
                false
            }
        }
    }

    fn tind_output_bus(
        &self,
        row: usize,
        half: usize,
        word: &mut BusWord,
    ) -> bool {
        match self.tind_bus[row][half] {
            Some(w) => {
                *word = w;
                true
            }
            None => {
                *word = BusWord::default();
                false
            }
        }
    }

    fn tcam_match_addr(&self, row: usize, half: usize) -> u32 {
        self.tcam_addr[row][half]
    }
}

/// A hash-distribution unit returning fixed per-kind contributions.
#[derive(Clone, Copy, Debug, Default)]
pub struct StubHashDist {
    pub immediate_data: u32,
    pub action_address: u32,
    pub meter_address: u32,
    pub stats_address: u32,
    pub selector_address: u32,
    pub selector_action_address: u32,
}

impl HashDistribution for StubHashDist {
    fn immediate_data(&self, _phv: &Phv, _table: usize) -> u32 {
        self.immediate_data
    }

    fn action_address(&self, _phv: &Phv, _table: usize) -> u32 {
        self.action_address
    }

    fn meter_address(&self, _phv: &Phv, _table: usize) -> u32 {
        self.meter_address
    }

    fn stats_address(&self, _phv: &Phv, _table: usize) -> u32 {
        self.stats_address
    }

    fn selector_address(
        &self,
        _phv: &Phv,
        _table: usize,
        _alu: u8,
        _sel_len: u32,
    ) -> u32 {
        self.selector_address
    }

    fn selector_action_address(
        &self,
        _phv: &Phv,
        _table: usize,
        _alu: u8,
        _sel_len: u32,
    ) -> u32 {
        self.selector_action_address
    }
}
