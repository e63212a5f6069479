// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/
//
// Copyright 2026 Oxide Computer Company

//! A software model of the Tofino MAU result-bus and lookup-result
//! resolution logic.
//!
//! Each MAU stage publishes the outcome of a match on a set of per-row
//! "result buses": raw payload words out of which the downstream action
//! logic reconstructs several independent physical addresses (immediate
//! data, action-instruction, action-data, statistics, meter and idle-time
//! addresses) plus the next-table value and selector length.  The
//! reconstruction is register-driven: per-bus shift/mask/default values,
//! per-entry-enable bit positions, huffman-hole zero insertion and a
//! stats-address bit relocation all come from chip configuration.
//!
//! This crate models that reconstruction bit-for-bit so that verification
//! harnesses can compare resolved addresses against hardware captures.  The
//! register state is consumed as a value-owned snapshot ([`regs`]); the
//! per-row bus contents and the hash-distribution unit are consumed through
//! traits ([`ResultBusSource`], [`HashDistribution`]) so a harness can drive
//! the resolver from recorded or synthetic state.

use thiserror::Error;

pub mod bitops;
mod bus;
mod config;
mod hash_dist;
mod lookup;
pub mod regs;
mod selector;
pub mod stub;

pub use bus::{bus_half, bus_index, bus_row, BusWord, MatchKind, ResultBusSource};
pub use config::{ResolverPolicy, ResultBus, TallyView};
pub use hash_dist::{HashDistribution, NullHashDist, Phv};
pub use lookup::{apply_dflt_mask, LookupResult, NXT_TAB_INVALID};
pub use selector::{
    Selector, LOGICAL_TABLES, LTCAMS, MATCHES_PER_BUS, MATCH_BUSES,
    METER_ALUS, RESULT_BUS_WIDTH, RESULT_MATCH_ADDR_BITS,
    RESULT_MATCH_ADDR_POS, SELECTORS, SRAM_ROWS, TIND_BUSES,
};

/// A specialized Result type for resolver operations
pub type MauResult<T> = Result<T, MauError>;

/// Error type conveying additional information about resolution errors.
///
/// Out-of-range indices are simulator-internal bugs and are asserted on, not
/// reported here.  These errors cover hardware-edge-case inconsistencies
/// that the relaxed policy merely logs; a strict policy escalates them so a
/// conformance run fails loudly.
#[derive(Error, Debug)]
pub enum MauError {
    /// A configured per-entry-enable bit position, combined with the bus
    /// shift, landed in the zero-padding region or wrapped past the payload
    /// while the bus was driving live data the default register does not
    /// cover.
    #[error(
        "{sel} per-entry enable bit unreachable on {kind} bus {bus}: \
         conceptual position {pos} with pad {pad}"
    )]
    PfePosInconsistent {
        sel: &'static str,
        kind: MatchKind,
        bus: usize,
        pos: u32,
        pad: u32,
    },
    /// As above, for the meter-type ("op") bit window.
    #[error(
        "{sel} op bits unreachable on {kind} bus {bus}: \
         conceptual position {pos} with pad {pad}"
    )]
    OpPosInconsistent {
        sel: &'static str,
        kind: MatchKind,
        bus: usize,
        pos: u32,
        pad: u32,
    },
    /// Found a numeric value that doesn't match a known address selector
    #[error("Invalid address selector: {}", .0)]
    InvalidSelector(usize),
    /// The model detected some internal inconsistency
    #[error("Internal error: {}", .0)]
    Internal(String),
}
