// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Discrete-time context for alpha-cycle simulation.
//!
//! One alpha cycle (trial) is four quarters of `cyc_per_qtr` cycles each.
//! Quarters 0-2 form the minus phase and quarter 3 the plus phase.

use core::fmt;

/// Bit-set over the four quarters of an alpha cycle (Q1 = bit 0 .. Q4 = bit 3).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct Quarters(u8);

impl Quarters {
    pub const NONE: Quarters = Quarters(0);
    pub const Q1: Quarters = Quarters(1 << 0);
    pub const Q2: Quarters = Quarters(1 << 1);
    pub const Q3: Quarters = Quarters(1 << 2);
    pub const Q4: Quarters = Quarters(1 << 3);

    /// Build a set from quarter indexes (0..4). Indexes >= 4 are ignored.
    pub fn from_indexes(qtrs: &[usize]) -> Self {
        let mut bits = 0u8;
        for &q in qtrs {
            if q < 4 {
                bits |= 1 << q;
            }
        }
        Quarters(bits)
    }

    pub const fn union(self, other: Quarters) -> Quarters {
        Quarters(self.0 | other.0)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// True if quarter index `qtr` (0..4) is in the set.
    #[inline]
    pub const fn has(self, qtr: usize) -> bool {
        qtr < 4 && (self.0 & (1 << qtr)) != 0
    }

    /// True if the quarter after `qtr` (wrapping) is in the set.
    #[inline]
    pub const fn has_next(self, qtr: usize) -> bool {
        self.has((qtr + 1) % 4)
    }

    /// True if the quarter before `qtr` (wrapping) is in the set.
    #[inline]
    pub const fn has_prev(self, qtr: usize) -> bool {
        self.has((qtr + 3) % 4)
    }

    pub fn set(&mut self, qtr: usize, on: bool) {
        if qtr >= 4 {
            return;
        }
        if on {
            self.0 |= 1 << qtr;
        } else {
            self.0 &= !(1 << qtr);
        }
    }
}

impl core::ops::BitOr for Quarters {
    type Output = Quarters;
    fn bitor(self, rhs: Quarters) -> Quarters {
        self.union(rhs)
    }
}

impl fmt::Debug for Quarters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = ["Q1", "Q2", "Q3", "Q4"]
            .iter()
            .enumerate()
            .filter(|(i, _)| self.has(*i))
            .map(|(_, n)| *n)
            .collect();
        write!(f, "Quarters({})", names.join("|"))
    }
}

/// Time state for one simulation run.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct Context {
    /// Accumulated simulated time, in seconds
    pub time: f32,
    /// Cycle counter within the current alpha cycle (0 .. 4 * cyc_per_qtr)
    pub cycle: usize,
    /// Total cycles since the last reset
    pub cycle_tot: usize,
    /// Current quarter (0..4)
    pub quarter: usize,
    /// True during the plus phase (last quarter)
    pub plus_phase: bool,
    /// Simulated seconds per cycle
    pub time_per_cyc: f32,
    /// Cycles per quarter
    pub cyc_per_qtr: usize,
}

impl Default for Context {
    fn default() -> Self {
        Self::new(25, 0.001)
    }
}

impl Context {
    pub fn new(cyc_per_qtr: usize, time_per_cyc: f32) -> Self {
        Self {
            time: 0.0,
            cycle: 0,
            cycle_tot: 0,
            quarter: 0,
            plus_phase: false,
            time_per_cyc,
            cyc_per_qtr,
        }
    }

    /// Reset all counters, keeping the timing parameters.
    pub fn reset(&mut self) {
        self.time = 0.0;
        self.cycle = 0;
        self.cycle_tot = 0;
        self.quarter = 0;
        self.plus_phase = false;
        if self.cyc_per_qtr == 0 {
            self.cyc_per_qtr = 25;
            self.time_per_cyc = 0.001;
        }
    }

    /// Start of a new alpha cycle.
    pub fn alpha_cyc_start(&mut self) {
        self.cycle = 0;
        self.quarter = 0;
        self.plus_phase = false;
    }

    pub fn cycle_inc(&mut self) {
        self.cycle += 1;
        self.cycle_tot += 1;
        self.time += self.time_per_cyc;
    }

    pub fn quarter_inc(&mut self) {
        self.quarter += 1;
        self.plus_phase = self.quarter == 3;
    }

    /// Cycle index within the current quarter.
    pub fn quarter_cycle(&self) -> usize {
        self.cycle.saturating_sub(self.quarter * self.cyc_per_qtr)
    }

    /// True when `qtrs` contains the current quarter.
    #[inline]
    pub fn in_quarters(&self, qtrs: Quarters) -> bool {
        qtrs.has(self.quarter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quarters_next_prev_wrap() {
        let q = Quarters::Q1 | Quarters::Q4;
        assert!(q.has(0));
        assert!(q.has(3));
        assert!(!q.has(1));
        assert!(q.has_next(3)); // Q4 -> Q1
        assert!(q.has_next(2));
        assert!(!q.has_next(0));
        assert!(q.has_prev(0)); // Q1 <- Q4
        assert!(q.has_prev(1));
    }

    #[test]
    fn test_quarters_from_indexes() {
        let q = Quarters::from_indexes(&[1, 3, 9]);
        assert_eq!(q, Quarters::Q2 | Quarters::Q4);
    }

    #[test]
    fn test_quarter_cycle() {
        let mut ctx = Context::default();
        ctx.alpha_cyc_start();
        for _ in 0..30 {
            ctx.cycle_inc();
        }
        ctx.quarter_inc();
        assert_eq!(ctx.quarter_cycle(), 5);
        assert!(!ctx.plus_phase);
        ctx.quarter_inc();
        ctx.quarter_inc();
        assert!(ctx.plus_phase);
    }
}
