// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/
//
// Copyright 2026 Oxide Computer Company

//! End-to-end resolution tests driving the resolver through programmable
//! stub buses, the way a verification harness does.

use pretty_assertions::assert_eq;
use rand::{Rng, SeedableRng};

use mau::bitops::{insert_zeros, BitMove};
use mau::regs::{BusEntry, RegSnapshot, NO_PFE};
use mau::stub::{StubHashDist, StubRows};
use mau::{
    apply_dflt_mask, BusWord, LookupResult, MatchKind, MauError, Phv,
    ResolverPolicy, ResultBus, Selector,
};

const TABLE: usize = 7;

fn test_log() -> slog::Logger {
    common::logging::init("test", &None, common::logging::LogFormat::Human)
        .unwrap()
}

// A snapshot wiring the given exact-match and tind buses to TABLE.
fn wired(xm: &[usize], tm: &[usize]) -> RegSnapshot {
    let mut regs = RegSnapshot::default();
    for bus in xm {
        regs.xbar.match_bus_ltab[*bus] = Some(TABLE as u8);
    }
    for bus in tm {
        regs.xbar.tind_bus_ltab[*bus] = Some(TABLE as u8);
    }
    regs
}

fn live_entry(shift: u8, mask: u32) -> BusEntry {
    BusEntry {
        shift: [shift; 4],
        mask,
        dflt: 0,
        perentry_pos: NO_PFE,
        shifter_en: true,
        vpn_shift: 0,
        swizzle_mode: 0,
    }
}

// The hand-derived meter regression case: bus 3 (row 1, half 1), exact
// path, shift 5, pad 23, mask 0x00ff_ffff.  The payload drives bit 0 (the
// per-entry enable source: configured position 18 plus shift 5 lands on
// conceptual bit 23, payload bit 0) and bits 8:6 (the op window at
// conceptual position 24 + 5, payload bits 8:6).
#[test]
fn test_meter_end_to_end() -> anyhow::Result<()> {
    let log = test_log();
    let mut regs = wired(&[3], &[]);
    let e = regs.bus_entry_mut(Selector::Meter, MatchKind::Exact, 3);
    *e = live_entry(5, 0x00ff_ffff);
    e.perentry_pos = 18;

    let rbus = ResultBus::new(&log, regs, ResolverPolicy::default());
    let mut rows = StubRows::new();
    rows.set_match_bus(1, 1, BusWord { data: 0x1c1, match_addr: 0 });
    let hash = StubHashDist::default();
    let phv = Phv::new();

    let mut r = LookupResult::new(&log, &rbus, &rows, &hash);
    r.setup_lookup(&phv, TABLE);
    r.set_match(true, 0);

    // extracted value = 0x1c1 << (23 - 5) = 0x704_0000; the 24-bit mask
    // clears the op copy at 26:24 and the address bits above it, leaving
    // 0x04_0000; the enable bit lands at 23.
    let v = r.get_log_data(Selector::Meter, true)?;
    assert_eq!(v, 0x0084_0000);
    Ok(())
}

// Same configuration with a full 27-bit mask: the op window (payload bits
// 8:6 = 0b111) survives at 26:24 alongside the extracted address bits.
#[test]
fn test_meter_op_bits_survive_full_mask() -> anyhow::Result<()> {
    let log = test_log();
    let mut regs = wired(&[3], &[]);
    let e = regs.bus_entry_mut(Selector::Meter, MatchKind::Exact, 3);
    *e = live_entry(5, 0x07ff_ffff);
    e.perentry_pos = 18;

    let rbus = ResultBus::new(&log, regs, ResolverPolicy::default());
    let mut rows = StubRows::new();
    rows.set_match_bus(1, 1, BusWord { data: 0x1c1, match_addr: 0 });
    let hash = StubHashDist::default();
    let phv = Phv::new();

    let mut r = LookupResult::new(&log, &rbus, &rows, &hash);
    r.setup_lookup(&phv, TABLE);
    r.set_match(true, 0);

    let v = r.get_log_data(Selector::Meter, true)?;
    assert_eq!(v, 0x0784_0000);
    Ok(())
}

// Sweep the per-entry enable bit through all three zones: padding (below
// the meter path's 23 pad bits), payload, and the wrap past payload+pad.
#[test]
fn test_pfe_three_zones() -> anyhow::Result<()> {
    let log = test_log();
    let data: u64 = 0x9e37_79b9_7f4a_7c15;
    let pad = 23u32;
    let cfg_pos = 1u32;

    for shift in 0..=100u32 {
        let mut regs = wired(&[3], &[]);
        let e = regs.bus_entry_mut(Selector::Meter, MatchKind::Exact, 3);
        // mask 0 isolates the enable bit: nothing else survives
        *e = live_entry(shift as u8, 0);
        e.perentry_pos = cfg_pos as u8;

        let rbus = ResultBus::new(&log, regs, ResolverPolicy::default());
        let mut rows = StubRows::new();
        rows.set_match_bus(1, 1, BusWord { data, match_addr: 0 });
        let hash = StubHashDist::default();
        let phv = Phv::new();

        let mut r = LookupResult::new(&log, &rbus, &rows, &hash);
        r.setup_lookup(&phv, TABLE);
        r.set_match(true, 0);

        let pos = cfg_pos + shift;
        let expected = if pos < pad {
            0
        } else if pos < pad + 64 {
            ((data >> (pos - pad)) & 1) as u32
        } else {
            ((data >> ((pos - pad) % 64)) & 1) as u32
        };
        let v = r.get_log_data(Selector::Meter, true)?;
        assert_eq!(v, expected << 23, "shift {shift}");
    }
    Ok(())
}

// A strict policy escalates a padding-zone enable position (live bus, no
// default coverage) instead of logging it away.
#[test]
fn test_pfe_padding_strict_vs_relaxed() -> anyhow::Result<()> {
    let log = test_log();
    let build = |policy| {
        let mut regs = wired(&[3], &[]);
        let e = regs.bus_entry_mut(Selector::Meter, MatchKind::Exact, 3);
        *e = live_entry(5, 0x00ff_ffff);
        e.perentry_pos = 1; // 1 + 5 = 6, inside the 23-bit padding
        ResultBus::new(&log, regs, policy)
    };
    let mut rows = StubRows::new();
    rows.set_match_bus(1, 1, BusWord { data: 0x1, match_addr: 0 });
    let hash = StubHashDist::default();
    let phv = Phv::new();

    let rbus = build(ResolverPolicy::default());
    let mut r = LookupResult::new(&log, &rbus, &rows, &hash);
    r.setup_lookup(&phv, TABLE);
    r.set_match(true, 0);
    // relaxed: the enable contributes zero and resolution proceeds with
    // just the extracted address bits (payload bit 0 lands at bit 18)
    assert_eq!(r.get_log_data(Selector::Meter, true)?, 0x0004_0000);

    let rbus = build(ResolverPolicy::strict());
    let mut r = LookupResult::new(&log, &rbus, &rows, &hash);
    r.setup_lookup(&phv, TABLE);
    r.set_match(true, 0);
    match r.get_log_data(Selector::Meter, true) {
        Err(MauError::PfePosInconsistent { pos: 6, pad: 23, .. }) => {}
        other => panic!("expected strict inconsistency, got {other:?}"),
    }
    Ok(())
}

// Stats swizzle: resolving with mode 1 or 2 equals the mode-0 resolution
// with the documented relocation applied, and the inverse relocation
// returns it, on both the exact and ternary paths.
#[test]
fn test_stats_swizzle_roundtrip() -> anyhow::Result<()> {
    let log = test_log();
    let data: u64 = 0x0005_a5a5;

    for kind in [MatchKind::Exact, MatchKind::Ternary] {
        for mode in [1u8, 2u8] {
            let resolve = |mode: u8| -> anyhow::Result<u32> {
                let mut regs = match kind {
                    MatchKind::Exact => wired(&[2], &[]),
                    MatchKind::Ternary => wired(&[], &[2]),
                };
                let e = regs.bus_entry_mut(Selector::Stats, kind, 2);
                *e = live_entry(3, 0x7_ffff);
                e.swizzle_mode = mode;

                let rbus =
                    ResultBus::new(&log, regs, ResolverPolicy::default());
                let mut rows = StubRows::new();
                let word = BusWord { data, match_addr: 0 };
                match kind {
                    MatchKind::Exact => rows.set_match_bus(1, 0, word),
                    MatchKind::Ternary => rows.set_tind_bus(1, 0, word),
                }
                let hash = StubHashDist::default();
                let phv = Phv::new();
                let mut r = LookupResult::new(&log, &rbus, &rows, &hash);
                r.setup_lookup(&phv, TABLE);
                r.set_match(true, 0);
                Ok(r.get_log_data(Selector::Stats, true)?)
            };

            let plain = resolve(0)?;
            let swizzled = resolve(mode)?;
            let mv = Selector::Stats.swizzle(mode).unwrap();
            assert_eq!(swizzled, mv.apply(plain), "{kind} mode {mode}");
            assert_eq!(
                mv.inverse().apply(swizzled),
                plain,
                "{kind} mode {mode} unswizzle"
            );
        }
    }
    Ok(())
}

// Action-data VPN shift: zeros spliced into the huffman hole at bit 17.
#[test]
fn test_actdata_vpn_zero_insertion() -> anyhow::Result<()> {
    let log = test_log();
    let data: u64 = 0x002a_5a7d;

    let resolve = |vpn: u8| -> anyhow::Result<u32> {
        let mut regs = wired(&[4], &[]);
        let e = regs.bus_entry_mut(Selector::ActData, MatchKind::Exact, 4);
        *e = live_entry(5, 0x7f_ffff);
        e.vpn_shift = vpn;
        let rbus = ResultBus::new(&log, regs, ResolverPolicy::default());
        let mut rows = StubRows::new();
        rows.set_match_bus(2, 0, BusWord { data, match_addr: 0 });
        let hash = StubHashDist::default();
        let phv = Phv::new();
        let mut r = LookupResult::new(&log, &rbus, &rows, &hash);
        r.setup_lookup(&phv, TABLE);
        r.set_match(true, 0);
        Ok(r.get_log_data(Selector::ActData, true)?)
    };

    let base = resolve(0)?;
    let shifted = resolve(2)?;
    // bits below the hole are untouched, the hole is zero, and the bits
    // above it are the base bits moved up (clipped to the address width)
    assert_eq!(shifted & 0x1_ffff, base & 0x1_ffff);
    assert_eq!((shifted >> 17) & 0x3, 0);
    assert_eq!(shifted >> 19, (base >> 17) & 0xf);
    assert_eq!(shifted, insert_zeros(base, 17, 2) & 0x7f_ffff);
    Ok(())
}

// Property: splicing n zeros at p grows the value by exactly n bits,
// preserves the low bits, and relocates the high bits verbatim.
#[test]
fn test_zero_insertion_properties() -> anyhow::Result<()> {
    let mut rng = rand::rngs::StdRng::seed_from_u64(0x5eed);
    for _ in 0..1000 {
        let v: u32 = rng.gen_range(0..1 << 20);
        let p: u32 = rng.gen_range(0..16);
        let n: u32 = rng.gen_range(1..8);
        let out = insert_zeros(v, p, n);
        assert_eq!(out & ((1 << p) - 1), v & ((1 << p) - 1));
        assert_eq!((out >> p) & ((1 << n) - 1), 0);
        assert_eq!(out >> (p + n), v >> p);
        if v >> p != 0 {
            assert_eq!(
                64 - (out as u64).leading_zeros(),
                64 - (v as u64).leading_zeros() + n
            );
        }
    }
    Ok(())
}

// Fan-in across a two-bus bitmap equals the OR of each bus resolved alone.
#[test]
fn test_bus_fanin_or_commutes() -> anyhow::Result<()> {
    let log = test_log();
    let configure = |regs: &mut RegSnapshot| {
        let e = regs.bus_entry_mut(Selector::ImmData, MatchKind::Exact, 2);
        *e = live_entry(4, 0xffff_ffff);
        let e = regs.bus_entry_mut(Selector::ImmData, MatchKind::Exact, 9);
        *e = live_entry(11, 0x00ff_ff00);
    };
    let resolve = |xm: &[usize]| -> anyhow::Result<u32> {
        let mut regs = wired(xm, &[]);
        configure(&mut regs);
        let rbus = ResultBus::new(&log, regs, ResolverPolicy::default());
        let mut rows = StubRows::new();
        rows.set_match_bus(
            1,
            0,
            BusWord { data: 0x1234_5678_9abc_def0, match_addr: 0 },
        );
        rows.set_match_bus(
            4,
            1,
            BusWord { data: 0xfedc_ba98_7654_3210, match_addr: 0 },
        );
        let hash = StubHashDist::default();
        let phv = Phv::new();
        let mut r = LookupResult::new(&log, &rbus, &rows, &hash);
        r.setup_lookup(&phv, TABLE);
        r.set_match(true, 0);
        Ok(r.get_phy_data(Selector::ImmData, MatchKind::Exact)?)
    };

    let both = resolve(&[2, 9])?;
    let b0 = resolve(&[2])?;
    let b1 = resolve(&[9])?;
    assert_eq!(both, b0 | b1);
    Ok(())
}

// Repeated extraction within a cycle returns the identical value.
#[test]
fn test_next_table_idempotent() -> anyhow::Result<()> {
    let log = test_log();
    let mut regs = wired(&[3], &[]);
    let e = regs.bus_entry_mut(Selector::NxtTab, MatchKind::Exact, 3);
    *e = live_entry(7, 0xff);
    regs.nxt_tab[TABLE].mask = 0x3f;
    regs.nxt_tab[TABLE].dflt = 0x80;
    regs.nxt_tab[TABLE].map_en = true;
    regs.nxt_tab[TABLE].map = [0x10, 0x11, 0x12, 0x13, 0x14, 0x15, 0x16, 0x17];

    let rbus = ResultBus::new(&log, regs, ResolverPolicy::default());
    let mut rows = StubRows::new();
    rows.set_match_bus(
        1,
        1,
        BusWord { data: 0x0000_0000_0000_0280, match_addr: 0 },
    );
    let hash = StubHashDist::default();
    let phv = Phv::new();

    let mut r = LookupResult::new(&log, &rbus, &rows, &hash);
    r.setup_lookup(&phv, TABLE);
    r.set_match(true, 0);

    let first = r.extract_next_table()?;
    // raw = 0x280 >> 7 = 0x5; default OR'd before mask: (5 | 0x80) & 0x3f
    // = 5; generic map entry 5 = 0x15
    assert_eq!(first, 0x15);
    assert_eq!(r.extract_next_table()?, first);
    assert_eq!(r.extract_next_table()?, first);
    let (raw, masked, mapped) = r.next_table_forms();
    assert_eq!((raw, masked, mapped), (0x5, 0x5, 0x15));
    Ok(())
}

// The usage tallies move at most once per selector per cycle.
#[test]
fn test_tally_once_per_cycle() -> anyhow::Result<()> {
    let log = test_log();
    let mut regs = wired(&[3], &[]);
    *regs.bus_entry_mut(Selector::Stats, MatchKind::Exact, 3) =
        live_entry(0, 0x7_ffff);
    regs.miss[Selector::Idle.index()][TABLE] = 0xdead;

    let rbus = ResultBus::new(&log, regs, ResolverPolicy::default());
    let rows = StubRows::new();
    let hash = StubHashDist::default();
    let phv = Phv::new();

    let mut r = LookupResult::new(&log, &rbus, &rows, &hash);
    r.setup_lookup(&phv, TABLE);
    r.set_match(true, 0);
    for _ in 0..5 {
        r.get_log_data(Selector::Stats, true)?;
    }
    assert_eq!(rbus.tally().hits[Selector::Stats.index()], 1);

    // a fresh cycle tallies again
    r.setup_lookup(&phv, TABLE);
    r.set_match(true, 0);
    r.get_log_data(Selector::Stats, true)?;
    assert_eq!(rbus.tally().hits[Selector::Stats.index()], 2);

    // misses count on their own tally
    r.setup_lookup(&phv, TABLE);
    for _ in 0..3 {
        assert_eq!(r.get_log_data(Selector::Idle, true)?, 0xdead);
    }
    assert_eq!(rbus.tally().misses[Selector::Idle.index()], 1);
    assert_eq!(rbus.tally().hits[Selector::Idle.index()], 0);
    Ok(())
}

// Only the next-table selector ORs its logical default in ahead of the
// mask; everyone else masks first.
#[test]
fn test_dflt_mask_ordering_by_selector() -> anyhow::Result<()> {
    let mut rng = rand::rngs::StdRng::seed_from_u64(0xd00d);
    for _ in 0..1000 {
        let v: u32 = rng.gen();
        let mask: u32 = rng.gen();
        let dflt: u32 = rng.gen();
        for sel in Selector::ALL {
            let got = apply_dflt_mask(sel, v, mask, dflt);
            let expected = if sel == Selector::NxtTab {
                (v | dflt) & mask
            } else {
                (v & mask) | dflt
            };
            assert_eq!(got, expected, "{sel}");
        }
        // with the no-op logical pair every selector passes data through
        for sel in Selector::ALL {
            assert_eq!(apply_dflt_mask(sel, v, u32::MAX, 0), v);
        }
    }
    Ok(())
}

// A gateway-inhibited table resolves its next table from the gateway's
// value, never the buses.
#[test]
fn test_gateway_inhibit_next_table() -> anyhow::Result<()> {
    let log = test_log();
    let mut regs = wired(&[3], &[]);
    *regs.bus_entry_mut(Selector::NxtTab, MatchKind::Exact, 3) =
        live_entry(0, 0xff);
    regs.nxt_tab[TABLE].mask = 0xff;

    let rbus = ResultBus::new(&log, regs, ResolverPolicy::default());
    let mut rows = StubRows::new();
    rows.set_match_bus(1, 1, BusWord { data: 0x77, match_addr: 0 });
    let hash = StubHashDist::default();
    let phv = Phv::new();

    let mut r = LookupResult::new(&log, &rbus, &rows, &hash);
    r.setup_lookup(&phv, TABLE);
    r.set_match(true, 0);
    r.set_gateway_inhibit(true);
    r.set_gateway_next_table(0x2a);
    assert_eq!(r.extract_next_table()?, 0x2a);

    // pre-predication resolution still reads the bus path
    r.setup_lookup(&phv, TABLE);
    r.set_match(true, 0);
    r.set_gateway_inhibit(true);
    r.set_gateway_next_table(0x2a);
    assert_eq!(r.get_log_data(Selector::NxtTab, false)?, 0x77);
    Ok(())
}

// The ternary actionbit map replaces the bus path outright when enabled.
#[test]
fn test_actionbit_map_precedence() -> anyhow::Result<()> {
    let log = test_log();
    let mut regs = wired(&[], &[6]);
    *regs.bus_entry_mut(Selector::NxtTab, MatchKind::Ternary, 6) =
        live_entry(0, 0xff);
    regs.nxt_tab[TABLE].mask = 0xff;
    regs.nxt_tab[TABLE].actionbit_map_en[1] = true;
    regs.nxt_tab[TABLE].actionbit_map = [0x31, 0x32, 0x33, 0x34];

    let rbus = ResultBus::new(&log, regs, ResolverPolicy::default());
    let mut rows = StubRows::new();
    rows.set_tind_bus(3, 0, BusWord { data: 0x5c, match_addr: 0 });
    let hash = StubHashDist::default();
    let phv = Phv::new();

    let mut r = LookupResult::new(&log, &rbus, &rows, &hash);
    r.setup_lookup(&phv, TABLE);
    r.set_match(true, 0);
    r.set_payload(2);
    // the bus value 0x5c is ignored; payload discriminant 2 indexes the map
    assert_eq!(r.extract_next_table()?, 0x33);
    Ok(())
}

// A miss returns the configured miss value for every selector.
#[test]
fn test_miss_values() -> anyhow::Result<()> {
    let log = test_log();
    let mut regs = wired(&[3], &[]);
    for sel in Selector::ALL {
        if sel != Selector::NxtTab {
            regs.miss[sel.index()][TABLE] = 0x100 + sel.index() as u32;
        }
    }
    regs.nxt_tab[TABLE].miss = 0x42;

    let rbus = ResultBus::new(&log, regs, ResolverPolicy::default());
    let rows = StubRows::new();
    let hash = StubHashDist::default();
    let phv = Phv::new();

    let mut r = LookupResult::new(&log, &rbus, &rows, &hash);
    r.setup_lookup(&phv, TABLE);
    for sel in Selector::ALL {
        let expected = match sel {
            Selector::NxtTab => 0x42,
            _ => 0x100 + sel.index() as u32,
        };
        assert_eq!(r.get_log_data(sel, true)?, expected, "{sel}");
    }
    Ok(())
}

// A disabled payload shifter zeroes the bus contribution; the configured
// default still lands.
#[test]
fn test_payload_shifter_disabled() -> anyhow::Result<()> {
    let log = test_log();
    let mut regs = wired(&[3], &[]);
    let e = regs.bus_entry_mut(Selector::ImmData, MatchKind::Exact, 3);
    *e = live_entry(0, 0xffff_ffff);
    e.shifter_en = false;
    e.dflt = 0xab00_0000;

    let rbus = ResultBus::new(&log, regs, ResolverPolicy::default());
    let mut rows = StubRows::new();
    rows.set_match_bus(
        1,
        1,
        BusWord { data: 0xffff_ffff_ffff_ffff, match_addr: 0 },
    );
    let hash = StubHashDist::default();
    let phv = Phv::new();

    let mut r = LookupResult::new(&log, &rbus, &rows, &hash);
    r.setup_lookup(&phv, TABLE);
    r.set_match(true, 0);
    assert_eq!(r.get_log_data(Selector::ImmData, true)?, 0xab00_0000);
    Ok(())
}

// The selector length resolves through the meter ALU's buses, not the
// table's own, and feeds the hash-distribution selector address.
#[test]
fn test_selector_length_via_meter_alu() -> anyhow::Result<()> {
    let log = test_log();
    let mut regs = wired(&[3], &[]);
    regs.xbar.meter_alu_ltab[2] = Some(TABLE as u8);
    regs.xbar.meter_alu_match_bus[2] = 1 << 5;
    *regs.bus_entry_mut(Selector::SelLen, MatchKind::Exact, 5) =
        live_entry(2, 0xff);
    // the table's own bus carries a different value that must not be read
    *regs.bus_entry_mut(Selector::SelLen, MatchKind::Exact, 3) =
        live_entry(0, 0xff);

    let rbus = ResultBus::new(&log, regs, ResolverPolicy::default());
    let mut rows = StubRows::new();
    rows.set_match_bus(2, 1, BusWord { data: 0x34 << 2, match_addr: 0 });
    rows.set_match_bus(1, 1, BusWord { data: 0xff, match_addr: 0 });
    let hash =
        StubHashDist { selector_address: 0xabc0, ..Default::default() };
    let phv = Phv::new();

    let mut r = LookupResult::new(&log, &rbus, &rows, &hash);
    r.setup_lookup(&phv, TABLE);
    r.set_match(true, 0);
    assert_eq!(r.get_selector_length()?, 0x34);
    assert_eq!(r.get_selector_address()?, 0xabc0);
    Ok(())
}

// Hash-derived contributions OR into the hit result.
#[test]
fn test_hash_distribution_merge() -> anyhow::Result<()> {
    let log = test_log();
    let mut regs = wired(&[3], &[]);
    *regs.bus_entry_mut(Selector::Stats, MatchKind::Exact, 3) =
        live_entry(0, 0x7_ffff);

    let rbus = ResultBus::new(&log, regs, ResolverPolicy::default());
    let mut rows = StubRows::new();
    rows.set_match_bus(1, 1, BusWord { data: 0x00f0, match_addr: 0 });
    let hash = StubHashDist { stats_address: 0x0f00, ..Default::default() };
    let phv = Phv::new();

    let mut r = LookupResult::new(&log, &rbus, &rows, &hash);
    r.setup_lookup(&phv, TABLE);
    r.set_match(true, 0);
    // bus extraction = 0xf0 << 3 (stats pad) = 0x780, OR'd with the hash
    // contribution
    assert_eq!(r.get_log_data(Selector::Stats, true)?, 0x780 | 0x0f00);
    Ok(())
}

// DV introspection reads bus contents without touching the tallies.
#[test]
fn test_dv_introspection_no_side_effects() -> anyhow::Result<()> {
    let log = test_log();
    let regs = wired(&[3], &[]);
    let rbus = ResultBus::new(&log, regs, ResolverPolicy::default());
    let mut rows = StubRows::new();
    rows.set_match_bus(
        1,
        1,
        BusWord { data: 0x1234, match_addr: 0x7_1234 },
    );
    rows.set_tcam_match_addr(1, 1, 0x3_0000);
    let hash = StubHashDist::default();
    let phv = Phv::new();

    let mut r = LookupResult::new(&log, &rbus, &rows, &hash);
    r.setup_lookup(&phv, TABLE);

    let mut word = BusWord::default();
    assert!(r.get_bus(MatchKind::Exact, 3, &mut word));
    assert_eq!(word.data, 0x1234);
    assert_eq!(r.get_match_addr(MatchKind::Exact, 3), 0x7_1234);
    assert_eq!(r.get_match_addr(MatchKind::Ternary, 3), 0x3_0000);
    assert!(!r.get_bus(MatchKind::Ternary, 3, &mut word));
    assert_eq!(word.data, 0);

    let tally = rbus.tally();
    assert_eq!(tally.hits.iter().sum::<u64>(), 0);
    assert_eq!(tally.misses.iter().sum::<u64>(), 0);
    Ok(())
}

// The swizzle relocation is the only difference between two otherwise
// identical resolutions; check it against the documented BitMove directly.
#[test]
fn test_swizzle_params_match_modes() {
    assert_eq!(
        Selector::Stats.swizzle(1),
        Some(BitMove { nbits: 2, from: 13, to: 15 })
    );
    assert_eq!(
        Selector::Stats.swizzle(2),
        Some(BitMove { nbits: 2, from: 13, to: 17 })
    );
    assert_eq!(Selector::Stats.swizzle(0), None);
    assert_eq!(Selector::Meter.swizzle(1), None);
}
