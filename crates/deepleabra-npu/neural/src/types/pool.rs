// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Inhibitory pools and per-pool gating state.
//!
//! Pool 0 always spans the whole layer. 4D layers add one sub-pool per
//! (pool-y, pool-x) position, numbered from 1 in row-major order.

use super::minmax::AvgMax;
use crate::inhib::FFFBInhib;

/// Running-average pool activity used for input scaling and adaptive inhibition.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct PoolActAvg {
    /// Running-average minus-phase activity
    pub act_m_avg: f32,
    /// Running-average plus-phase activity
    pub act_p_avg: f32,
    /// `act_p_avg` after the `ActAvgParams` adjustment, used in input scaling
    pub act_p_avg_eff: f32,
}

/// Gating state of one pool (stripe).
///
/// `cnt` is a signed counter: -1 never gated or just cleared, 0 gated this
/// instant, positive = quarters of continued maintenance, below -1 = quarters
/// since clearing. `now` is a one-cycle pulse set only on the evaluation cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct GateState {
    /// Gating unit activation at the moment of gating (0 if below threshold)
    pub act: f32,
    pub now: bool,
    pub cnt: i32,
}

impl Default for GateState {
    fn default() -> Self {
        Self {
            act: 0.0,
            now: false,
            cnt: -1,
        }
    }
}

impl GateState {
    pub fn init(&mut self) {
        *self = Self::default();
    }

    /// Copy the gating signals (`act`, `now`) from a source pool.
    ///
    /// The counter stays local: each consumer advances its own `cnt`.
    #[inline]
    pub fn copy_from(&mut self, src: &GateState) {
        self.act = src.act;
        self.now = src.now;
    }
}

/// One inhibitory pool: a contiguous neuron range with its own statistics.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct Pool {
    /// First neuron index (inclusive)
    pub st_idx: usize,
    /// Last neuron index (exclusive)
    pub ed_idx: usize,
    pub inhib: FFFBInhib,
    /// Minus-phase Act statistics captured at the end of quarter 3
    pub act_m: AvgMax,
    /// Plus-phase Act statistics captured at the end of quarter 4
    pub act_p: AvgMax,
    pub act_avg: PoolActAvg,
    pub gate: GateState,
}

impl Pool {
    pub fn new(st_idx: usize, ed_idx: usize) -> Self {
        Self {
            st_idx,
            ed_idx,
            ..Default::default()
        }
    }

    #[inline]
    pub fn range(&self) -> core::ops::Range<usize> {
        self.st_idx..self.ed_idx
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.ed_idx - self.st_idx
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ed_idx == self.st_idx
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_copy_keeps_counter() {
        let src = GateState {
            act: 0.8,
            now: true,
            cnt: 0,
        };
        let mut dst = GateState {
            act: 0.0,
            now: false,
            cnt: 3,
        };
        dst.copy_from(&src);
        assert_eq!(dst.act, 0.8);
        assert!(dst.now);
        assert_eq!(dst.cnt, 3);
    }

    #[test]
    fn test_gate_init() {
        let mut gs = GateState {
            act: 1.0,
            now: true,
            cnt: 5,
        };
        gs.init();
        assert_eq!(gs, GateState::default());
        assert_eq!(gs.cnt, -1);
    }
}
