// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Delayed context into CT layers.
//!
//! At the end of a burst quarter each `CTCtxt` pathway receives the full
//! sender value once (not a delta). The CT layer then replaces its `ctxt_ge`
//! with the sum of its pathway accumulators and clears them, so a second
//! drain in the same quarter adds nothing.

use crate::layer::{Layer, LayerKind};
use crate::path::{Path, PathKind};
use deepleabra_npu_neural::Context;

impl Path {
    /// Context pathways from the superficial layer of the same column are fixed one-to-one relays.
    pub(crate) fn ctctxt_defaults(&mut self) {
        if self.from_super {
            self.learn.learn = false;
            self.wt_init.mean = 0.5;
            self.wt_init.var = 0.0;
        }
    }

    /// Mark as the fixed pathway from the same column's superficial layer and re-apply defaults.
    pub fn set_from_super(&mut self, on: bool) {
        self.from_super = on;
        self.defaults();
    }

    /// Accumulate the full sender value into the receivers' context increments.
    #[inline]
    pub fn send_ctxt_ge(&mut self, si: usize, burst: f32) {
        let scdb = burst * self.gscale;
        let rng = self.send_range(si);
        for (sy, ri) in self.syns[rng.clone()].iter().zip(&self.s_con_idx[rng]) {
            self.ctxt_ge_inc[*ri] += scdb * sy.wt;
        }
    }

    /// Send every above-threshold sender value, if the sender is in its burst quarter.
    /// Superficial senders send `burst`; CT self-context sends `act`.
    pub(crate) fn send_ctxt_from(&mut self, send: &Layer, ctx: &Context) {
        if self.off || self.kind != PathKind::CTCtxt {
            return;
        }
        if !send.deep.burst.burst_qtr.has(ctx.quarter) {
            return;
        }
        let thr = send.act.opt_thresh.send;
        let use_burst = send.kind == LayerKind::Super;
        for (si, nrn) in send.neurons.iter().enumerate() {
            if nrn.is_off() {
                continue;
            }
            let val = if use_burst { nrn.burst } else { nrn.act };
            if val > thr {
                self.send_ctxt_ge(si, val);
            }
        }
    }

    /// Drain the context increments into `ctxt_ge`.
    pub(crate) fn recv_ctxt_ge_inc(&mut self, ctxt_ge: &mut [f32]) {
        for (ge, inc) in ctxt_ge.iter_mut().zip(self.ctxt_ge_inc.iter_mut()) {
            *ge += *inc;
            *inc = 0.0;
        }
    }

    /// Learning on delayed context: the sender term is the previous burst
    /// (or the trial-start activation for non-superficial senders), used for
    /// both short and medium sender averages. No learning-threshold skip.
    pub fn dwt_ctctxt(&mut self, send: &Layer, recv: &Layer) {
        if !self.learn.learn {
            return;
        }
        let use_burst = send.kind == LayerKind::Super;
        for (si, sn) in send.neurons.iter().enumerate() {
            let sact = if use_burst { sn.burst_prv } else { sn.act_q0 };
            let rng = self.send_range(si);
            for ci in rng.clone() {
                let rn = &recv.neurons[self.s_con_idx[ci]];
                let (err, bcm) = self.learn.chl_dwt(sact, sact, rn.avg_s_lrn, rn.avg_m, rn.avg_l);
                self.apply_dwt(ci, err, bcm, rn.avg_l_lrn);
            }
            self.max_norm(rng);
        }
    }
}

impl Layer {
    /// CT layers in their burst quarter replace `ctxt_ge` with the drained pathway increments.
    pub(crate) fn ctxt_from_ge(&mut self, ctx: &Context, paths: &mut [Path]) {
        if self.kind != LayerKind::CT || !self.deep.burst.burst_qtr.has(ctx.quarter) {
            return;
        }
        let mut ctxt: Vec<f32> = vec![0.0; self.neurons.len()];
        for &pi in &self.recv_paths {
            let pt = &mut paths[pi.0];
            if pt.off || pt.kind != PathKind::CTCtxt {
                continue;
            }
            pt.recv_ctxt_ge_inc(&mut ctxt);
        }
        for (nrn, ge) in self.neurons.iter_mut().zip(ctxt) {
            nrn.ctxt_ge = ge;
        }
    }

    /// Standing context adds to the regular excitatory input.
    pub(crate) fn ct_g_from_inc(&mut self) {
        for nrn in self.neurons.iter_mut().filter(|n| !n.is_off()) {
            let ge_raw = nrn.ge_raw + nrn.ctxt_ge;
            self.act.ge_from_raw(nrn, ge_raw);
            self.act.gi_from_raw(nrn, nrn.gi_raw);
        }
    }
}
