// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/
//
// Copyright 2026 Oxide Computer Company

//! The physical result-bus abstraction.  The row logic that drives the
//! buses lives outside this crate; the resolver reads bus contents through
//! the [`ResultBusSource`] trait.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::selector::BUS_HALVES;

/// Which match path a bus (and its configuration) belongs to.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
pub enum MatchKind {
    /// Exact-match SRAM result
    Exact,
    /// Ternary (TCAM) result via the indirection bus
    Ternary,
}

impl fmt::Display for MatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchKind::Exact => write!(f, "exact"),
            MatchKind::Ternary => write!(f, "ternary"),
        }
    }
}

/// One result-bus payload: the 64-bit data word the resolver extracts
/// addresses from, plus the embedded match address used for ternary
/// sub-word selection and introspection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BusWord {
    pub data: u64,
    pub match_addr: u32,
}

/// The row of a bus index
pub fn bus_row(bus: usize) -> usize {
    bus / BUS_HALVES
}

/// The half (0 or 1) of a bus index
pub fn bus_half(bus: usize) -> usize {
    bus % BUS_HALVES
}

/// The bus index for (row, half)
pub fn bus_index(row: usize, half: usize) -> usize {
    row * BUS_HALVES + half
}

/// Read-only view of the per-row result buses.  Implemented by the MAU row
/// model in a full pipeline, and by [`crate::stub::StubRows`] in harnesses.
///
/// The boolean returns report whether the bus was actively driven this
/// cycle.  They feed diagnostics only; an undriven bus still yields its
/// (all-zero) contents.
pub trait ResultBusSource {
    /// Copy out the exact-match result bus for (row, half)
    fn match_output_bus(
        &self,
        row: usize,
        half: usize,
        word: &mut BusWord,
    ) -> bool;

    /// Copy out the ternary-indirection bus for (row, half)
    fn tind_output_bus(
        &self,
        row: usize,
        half: usize,
        word: &mut BusWord,
    ) -> bool;

    /// The TCAM match address for (row, half)
    fn tcam_match_addr(&self, row: usize, half: usize) -> u32;
}
