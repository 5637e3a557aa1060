// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Thresholded burst output of superficial layers.

use crate::layer::Layer;
use deepleabra_npu_neural::{Context, Quarters};

/// How `burst` is derived from `act`, and in which quarters.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct BurstParams {
    /// Quarters in which bursting occurs (Q4 by default, Q2|Q4 for beta rhythm)
    pub burst_qtr: Quarters,
    /// Relative threshold between pool average (0) and max (1)
    pub thr_rel: f32,
    /// Absolute threshold floor
    pub thr_abs: f32,
}

impl Default for BurstParams {
    fn default() -> Self {
        Self {
            burst_qtr: Quarters::Q4,
            thr_rel: 0.1,
            thr_abs: 0.1,
        }
    }
}

impl BurstParams {
    #[inline]
    pub fn threshold(&self, avg: f32, max: f32) -> f32 {
        (avg + self.thr_rel * (max - avg)).max(self.thr_abs)
    }
}

impl Layer {
    /// Burst = act above the pool threshold, 0 otherwise. Only in burst quarters.
    pub(crate) fn burst_from_act(&mut self, ctx: &Context) {
        let bp = self.deep.burst;
        if !bp.burst_qtr.has(ctx.quarter) {
            return;
        }
        let first = if self.pools.len() > 1 { 1 } else { 0 };
        for pl in &self.pools[first..] {
            let thr = bp.threshold(pl.inhib.act.avg, pl.inhib.act.max);
            for nrn in self.neurons[pl.range()].iter_mut().filter(|n| !n.is_off()) {
                nrn.burst = if nrn.act > thr { nrn.act } else { 0.0 };
            }
        }
    }

    /// Save `burst` into `burst_prv` when the next quarter bursts again.
    pub(crate) fn burst_prv(&mut self, ctx: &Context) {
        if !self.deep.burst.burst_qtr.has_next(ctx.quarter) {
            return;
        }
        for nrn in &mut self.neurons {
            nrn.burst_prv = nrn.burst;
        }
    }
}
