// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/
//
// Copyright 2026 Oxide Computer Company

//! The hash-distribution seam.  On a hit, hash-derived address components
//! are OR'd into the bus-derived result; the unit computing them from the
//! PHV is outside this crate and is consumed through [`HashDistribution`].

/// An opaque packet-header-vector handle.  The resolver never inspects it;
/// it is threaded through to the hash-distribution implementation.
#[derive(Clone, Debug, Default)]
pub struct Phv {
    words: Vec<u32>,
}

impl Phv {
    pub fn new() -> Self {
        Phv { words: Vec::new() }
    }

    pub fn from_words(words: Vec<u32>) -> Self {
        Phv { words }
    }

    pub fn word(&self, idx: usize) -> u32 {
        self.words.get(idx).copied().unwrap_or(0)
    }
}

/// Hash-derived address contributions, all pure functions of the PHV and
/// static configuration.
pub trait HashDistribution {
    /// Immediate-data contribution for a logical table
    fn immediate_data(&self, phv: &Phv, table: usize) -> u32;

    /// Action-data address contribution
    fn action_address(&self, phv: &Phv, table: usize) -> u32;

    /// Meter address contribution
    fn meter_address(&self, phv: &Phv, table: usize) -> u32;

    /// Statistics address contribution
    fn stats_address(&self, phv: &Phv, table: usize) -> u32;

    /// Selector address for (table, ALU) given the resolved selector length
    fn selector_address(
        &self,
        phv: &Phv,
        table: usize,
        alu: u8,
        sel_len: u32,
    ) -> u32;

    /// Selector-derived action-data address for (table, ALU)
    fn selector_action_address(
        &self,
        phv: &Phv,
        table: usize,
        alu: u8,
        sel_len: u32,
    ) -> u32;
}

/// A hash-distribution unit that contributes nothing; used when a harness
/// exercises only the bus-derived paths.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullHashDist;

impl HashDistribution for NullHashDist {
    fn immediate_data(&self, _phv: &Phv, _table: usize) -> u32 {
        0
    }

    fn action_address(&self, _phv: &Phv, _table: usize) -> u32 {
        0
    }

    fn meter_address(&self, _phv: &Phv, _table: usize) -> u32 {
        0
    }

    fn stats_address(&self, _phv: &Phv, _table: usize) -> u32 {
        0
    }

    fn selector_address(
        &self,
        _phv: &Phv,
        _table: usize,
        _alu: u8,
        _sel_len: u32,
    ) -> u32 {
        0
    }

    fn selector_action_address(
        &self,
        _phv: &Phv,
        _table: usize,
        _alu: u8,
        _sel_len: u32,
    ) -> u32 {
        0
    }
}
