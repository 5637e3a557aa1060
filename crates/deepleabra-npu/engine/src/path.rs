// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Pathways
//!
//! A pathway owns every synapse between one sending and one receiving layer,
//! stored sender-major with a CSR-style index in both directions:
//!
//! ```text
//! sender si:   syns[s_con_idx_st[si] .. s_con_idx_st[si] + s_con_n[si]]
//!              receiver of each synapse in s_con_idx[..]
//! receiver ri: r_con_idx[r_con_idx_st[ri] ..]  -> sender index
//!              r_syn_idx[r_con_idx_st[ri] ..]  -> index into syns
//! ```
//!
//! Conductance increments are accumulated into pathway-private buffers
//! (`g_inc`, `ge_raw`, `ctxt_ge_inc`) so pathways into the same receiving
//! layer never write to shared memory; the receiving layer merges them.

use crate::error::{EngineError, Result};
use crate::layer::{Layer, LayerIndex};
use crate::pattern::Pattern;
use deepleabra_npu_neural::{AvgMax, LayerShape, NeuralError, NeuronFlags, Synapse};
use deepleabra_npu_plasticity::{
    LearnSynParams, TraceParams, WtBalRecv, WtInitParams, WtScaleParams,
};
use ndarray::Array2;
use rand::Rng;

/// Arena index of a pathway inside its network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct PathIndex(pub usize);

/// Pathway type; selects the send, receive and learning behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum PathKind {
    Forward,
    Back,
    Lateral,
    /// Drives inhibitory conductance instead of excitatory
    Inhib,
    /// Delayed burst context into a CT layer, sent once per burst quarter
    CTCtxt,
    /// Go / NoGo input into a GPiThal layer, kept separate per pathway
    GPiThal,
    /// Dopamine-gated eligibility-trace learning into a Matrix layer
    MatrixTrace,
    /// Direct dopamine-modulated Hebbian learning
    DaHebb,
}

impl PathKind {
    /// Pathways that take part in the per-cycle delta-send.
    #[inline]
    pub fn sends_g_delta(self) -> bool {
        !matches!(self, PathKind::CTCtxt)
    }

    /// Pathways whose increments fold directly into the receiver's `ge_inc` / `gi_inc`.
    #[inline]
    pub fn merges_into_recv(self) -> bool {
        !matches!(self, PathKind::CTCtxt | PathKind::GPiThal)
    }
}

#[derive(Debug, Clone)]
pub struct Path {
    pub name: String,
    pub kind: PathKind,
    pub send: LayerIndex,
    pub recv: LayerIndex,
    pub pattern: Pattern,
    pub off: bool,
    pub wt_init: WtInitParams,
    pub wt_scale: WtScaleParams,
    pub learn: LearnSynParams,
    /// Trace parameters, used by `MatrixTrace` pathways
    pub trace: TraceParams,
    /// `CTCtxt` pathway from the superficial layer of the same column
    pub from_super: bool,

    /// Net input scale from relative / absolute scaling and sender activity
    pub gscale: f32,

    pub s_con_n: Vec<usize>,
    pub s_con_idx_st: Vec<usize>,
    pub s_con_idx: Vec<usize>,
    pub r_con_n: Vec<usize>,
    pub r_con_idx_st: Vec<usize>,
    pub r_con_idx: Vec<usize>,
    pub r_syn_idx: Vec<usize>,
    /// Statistics of receiver connection counts; `avg` scales expected input
    pub r_con_n_avg_max: AvgMax,

    pub syns: Vec<Synapse>,
    /// Per-receiver conductance increment accumulated this cycle
    pub g_inc: Vec<f32>,
    /// Per-receiver raw conductance, kept separately by `GPiThal` pathways
    pub ge_raw: Vec<f32>,
    /// Per-receiver context increment of `CTCtxt` pathways, drained once per burst quarter
    pub ctxt_ge_inc: Vec<f32>,
    pub wb_recv: Vec<WtBalRecv>,
}

impl Path {
    pub fn new(name: impl Into<String>, send: LayerIndex, recv: LayerIndex, pattern: Pattern, kind: PathKind) -> Self {
        let mut pt = Self {
            name: name.into(),
            kind,
            send,
            recv,
            pattern,
            off: false,
            wt_init: WtInitParams::default(),
            wt_scale: WtScaleParams::default(),
            learn: LearnSynParams::default(),
            trace: TraceParams::default(),
            from_super: false,
            gscale: 1.0,
            s_con_n: Vec::new(),
            s_con_idx_st: Vec::new(),
            s_con_idx: Vec::new(),
            r_con_n: Vec::new(),
            r_con_idx_st: Vec::new(),
            r_con_idx: Vec::new(),
            r_syn_idx: Vec::new(),
            r_con_n_avg_max: AvgMax::default(),
            syns: Vec::new(),
            g_inc: Vec::new(),
            ge_raw: Vec::new(),
            ctxt_ge_inc: Vec::new(),
            wb_recv: Vec::new(),
        };
        pt.defaults();
        pt
    }

    /// Reset every parameter to the defaults for this pathway kind.
    pub fn defaults(&mut self) {
        self.wt_init = WtInitParams::default();
        self.wt_scale = WtScaleParams::default();
        self.learn = LearnSynParams::default();
        self.trace = TraceParams::default();
        match self.kind {
            PathKind::MatrixTrace | PathKind::DaHebb => self.matrix_defaults(),
            PathKind::CTCtxt => self.ctctxt_defaults(),
            _ => {}
        }
        self.update_params();
    }

    pub fn update_params(&mut self) {
        self.learn.update();
    }

    /// Build the sparse connectivity from the pattern.
    pub fn build(&mut self, send_name: &str, send_shape: &LayerShape, recv_name: &str, recv_shape: &LayerShape) -> Result<()> {
        let cons = self.pattern.connect(send_shape, recv_shape);
        if cons.dim() != (recv_shape.len(), send_shape.len()) {
            return Err(EngineError::PatternMismatch {
                send: send_name.to_string(),
                recv: recv_name.to_string(),
                reason: format!("connection matrix {:?} does not match layer sizes", cons.dim()),
            });
        }
        self.build_from_cons(&cons);
        Ok(())
    }

    fn build_from_cons(&mut self, cons: &Array2<bool>) {
        let (nr, ns) = cons.dim();
        self.s_con_n = vec![0; ns];
        self.r_con_n = vec![0; nr];
        for ((ri, si), on) in cons.indexed_iter() {
            if *on {
                self.r_con_n[ri] += 1;
                self.s_con_n[si] += 1;
            }
        }
        self.s_con_idx_st = prefix_starts(&self.s_con_n);
        self.r_con_idx_st = prefix_starts(&self.r_con_n);

        self.r_con_n_avg_max.init();
        for (ri, n) in self.r_con_n.iter().enumerate() {
            self.r_con_n_avg_max.update_val(*n as f32, ri);
        }
        self.r_con_n_avg_max.calc_avg();

        let nsyn: usize = self.s_con_n.iter().sum();
        self.syns = vec![Synapse::default(); nsyn];
        self.s_con_idx = vec![0; nsyn];
        self.r_con_idx = vec![0; nsyn];
        self.r_syn_idx = vec![0; nsyn];

        let mut s_con_fill = vec![0usize; ns];
        for ri in 0..nr {
            let rst = self.r_con_idx_st[ri];
            let mut rci = 0;
            for si in 0..ns {
                if !cons[[ri, si]] {
                    continue;
                }
                let sst = self.s_con_idx_st[si];
                let sci = s_con_fill[si];
                self.r_con_idx[rst + rci] = si;
                self.s_con_idx[sst + sci] = ri;
                self.r_syn_idx[rst + rci] = sst + sci;
                s_con_fill[si] += 1;
                rci += 1;
            }
        }

        self.g_inc = vec![0.0; nr];
        self.ge_raw = vec![0.0; nr];
        self.ctxt_ge_inc = vec![0.0; nr];
        self.wb_recv = vec![WtBalRecv::default(); nr];
    }

    /// Synapse range of sender `si`.
    #[inline]
    pub fn send_range(&self, si: usize) -> core::ops::Range<usize> {
        let st = self.s_con_idx_st[si];
        st..st + self.s_con_n[si]
    }

    pub fn n_syns(&self) -> usize {
        self.syns.len()
    }

    /// Initialize weights from `wt_init` and clear all learning state.
    pub fn init_weights<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for sy in self.syns.iter_mut() {
            if sy.scale == 0.0 {
                sy.scale = 1.0;
            }
            let wt = self.wt_init.gen(rng);
            sy.wt = wt;
            sy.lwt = self.learn.wt_sig.lin_from_sig_wt(wt);
            sy.wt *= sy.scale;
            sy.dwt = 0.0;
            sy.norm = 0.0;
            sy.moment = 0.0;
            sy.ntr = 0.0;
            sy.tr = 0.0;
        }
        for wb in self.wb_recv.iter_mut() {
            *wb = WtBalRecv::default();
        }
        self.init_g_inc();
    }

    pub fn init_g_inc(&mut self) {
        self.g_inc.iter_mut().for_each(|g| *g = 0.0);
        self.ge_raw.iter_mut().for_each(|g| *g = 0.0);
    }

    /// Accumulate a sender's activation change into the receivers' increments.
    #[inline]
    pub fn send_g_delta(&mut self, si: usize, delta: f32) {
        let scdel = delta * self.gscale;
        let rng = self.send_range(si);
        for (sy, ri) in self.syns[rng.clone()].iter().zip(&self.s_con_idx[rng]) {
            self.g_inc[*ri] += scdel * sy.wt;
        }
    }

    /// GPiThal pathways keep their own raw conductance; fold and clear the increment.
    pub(crate) fn fold_g_inc_into_raw(&mut self) {
        for (raw, inc) in self.ge_raw.iter_mut().zip(self.g_inc.iter_mut()) {
            *raw += *inc;
            *inc = 0.0;
        }
    }

    pub(crate) fn clear_g_inc(&mut self) {
        self.g_inc.iter_mut().for_each(|g| *g = 0.0);
    }

    /// Index into `syns` of the synapse from sender `si` to receiver `ri`.
    pub fn syn_index(&self, si: usize, ri: usize) -> Option<usize> {
        if ri >= self.r_con_n.len() {
            return None;
        }
        let st = self.r_con_idx_st[ri];
        let n = self.r_con_n[ri];
        (st..st + n)
            .find(|&ci| self.r_con_idx[ci] == si)
            .map(|ci| self.r_syn_idx[ci])
    }

    /// Synapse variable by name; NaN when the variable or the synapse does not exist.
    pub fn syn_value(&self, var: &str, si: usize, ri: usize) -> f32 {
        let Ok(vi) = Synapse::var_index(var) else {
            return f32::NAN;
        };
        self.syn_value_by_index(vi, si, ri)
    }

    pub fn syn_value_by_index(&self, vi: usize, si: usize, ri: usize) -> f32 {
        match self.syn_index(si, ri) {
            Some(idx) => self.syns[idx].var_by_index(vi),
            None => f32::NAN,
        }
    }

    /// Synapse variable by flat synapse index; NaN when out of range.
    pub fn syn_value_1d(&self, vi: usize, idx: usize) -> f32 {
        self.syns.get(idx).map_or(f32::NAN, |sy| sy.var_by_index(vi))
    }

    /// Set a synapse variable. Setting `Wt` also updates `LWt`.
    pub fn set_syn_value(&mut self, var: &str, si: usize, ri: usize, val: f32) -> Result<()> {
        let vi = Synapse::var_index(var)?;
        let idx = self.syn_index(si, ri).ok_or(NeuralError::IndexOutOfRange {
            index: si,
            len: self.s_con_n.len(),
        })?;
        let sy = &mut self.syns[idx];
        sy.set_var_by_index(vi, val);
        if var == "Wt" {
            self.learn.lwt_from_wt(sy);
        }
        Ok(())
    }

    /// Every synapse value of `var`, in sender-major order.
    pub fn syn_values(&self, var: &str) -> Result<Vec<f32>> {
        let vi = Synapse::var_index(var)?;
        Ok(self.syns.iter().map(|sy| sy.var_by_index(vi)).collect())
    }

    pub fn lrate_mult(&mut self, mult: f32) {
        self.learn.lrate_mult(mult);
    }

    /// XCAL weight change: error-driven and BCM terms from the running averages.
    pub fn dwt(&mut self, send: &Layer, recv: &Layer) {
        if !self.learn.learn {
            return;
        }
        let lrn_thr = self.learn.xcal.lrn_thr;
        for (si, sn) in send.neurons.iter().enumerate() {
            if sn.avg_s < lrn_thr && sn.avg_m < lrn_thr {
                continue;
            }
            let rng = self.send_range(si);
            for ci in rng.clone() {
                let rn = &recv.neurons[self.s_con_idx[ci]];
                let (err, bcm) =
                    self.learn
                        .chl_dwt(sn.avg_s_lrn, sn.avg_m, rn.avg_s_lrn, rn.avg_m, rn.avg_l);
                self.apply_dwt(ci, err, bcm, rn.avg_l_lrn);
            }
            self.max_norm(rng);
        }
    }

    /// Scale the error / BCM terms, apply norm and momentum, add to `dwt`.
    #[inline]
    pub(crate) fn apply_dwt(&mut self, ci: usize, err: f32, bcm: f32, ru_avg_l_lrn: f32) {
        let bcm = bcm * self.learn.xcal.long_lrate(ru_avg_l_lrn);
        let err = err * self.learn.xcal.m_lrn;
        self.apply_raw_dwt(ci, bcm + err);
    }

    #[inline]
    pub(crate) fn apply_raw_dwt(&mut self, ci: usize, dwt: f32) {
        let sy = &mut self.syns[ci];
        let mut dwt = dwt;
        let mut norm = 1.0;
        if self.learn.norm.on {
            norm = self.learn.norm.norm_from_abs_dwt(&mut sy.norm, dwt.abs());
        }
        if self.learn.momentum.on {
            dwt = norm * self.learn.momentum.moment_from_dwt(&mut sy.moment, dwt);
        } else {
            dwt *= norm;
        }
        sy.dwt += self.learn.lrate * dwt;
    }

    /// With normalization on, every synapse of a sender shares the max norm.
    pub(crate) fn max_norm(&mut self, rng: core::ops::Range<usize>) {
        if !self.learn.norm.on {
            return;
        }
        let syns = &mut self.syns[rng];
        let max_norm = syns.iter().fold(0.0f32, |mx, sy| if sy.norm > mx { sy.norm } else { mx });
        syns.iter_mut().for_each(|sy| sy.norm = max_norm);
    }

    /// Apply pending weight changes, using the receivers' balance factors when enabled.
    pub fn wt_from_dwt(&mut self) {
        if !self.learn.learn {
            return;
        }
        if self.learn.wt_bal.on {
            for (sy, ri) in self.syns.iter_mut().zip(&self.s_con_idx) {
                let wb = &self.wb_recv[*ri];
                self.learn.wt_from_dwt(wb.inc, wb.dec, sy);
            }
        } else {
            for sy in self.syns.iter_mut() {
                self.learn.wt_from_dwt(1.0, 1.0, sy);
            }
        }
    }

    /// Recompute per-receiver weight balance factors from the average strong weight.
    pub fn wt_bal_from_wt(&mut self, recv: &Layer) {
        if !self.learn.learn || !self.learn.wt_bal.on {
            return;
        }
        if !self.learn.wt_bal.targs && recv.kind.is_target() {
            return;
        }
        let avg_thr = self.learn.wt_bal.avg_thr;
        for ri in 0..self.r_con_n.len() {
            let nc = self.r_con_n[ri];
            if nc <= 1 {
                continue;
            }
            if recv.neurons[ri].has_flag(NeuronFlags::HAS_TARG) {
                continue;
            }
            let st = self.r_con_idx_st[ri];
            let mut sum_wt = 0.0f32;
            let mut sum_n = 0;
            for ci in st..st + nc {
                let wt = self.syns[self.r_syn_idx[ci]].wt;
                if wt >= avg_thr {
                    sum_wt += wt;
                    sum_n += 1;
                }
            }
            if sum_n > 0 {
                sum_wt /= sum_n as f32;
            } else {
                sum_wt = 0.0;
            }
            let (fact, inc, dec) = self.learn.wt_bal.wt_bal(sum_wt);
            self.wb_recv[ri] = WtBalRecv {
                avg: sum_wt,
                fact,
                inc,
                dec,
            };
        }
    }
}

fn prefix_starts(counts: &[usize]) -> Vec<usize> {
    let mut st = 0;
    counts
        .iter()
        .map(|n| {
            let s = st;
            st += n;
            s
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn built(pattern: Pattern, ns: usize, nr: usize) -> Path {
        let mut pt = Path::new("AToB", LayerIndex(0), LayerIndex(1), pattern, PathKind::Forward);
        pt.build("A", &LayerShape::new_2d(ns, 1), "B", &LayerShape::new_2d(nr, 1))
            .unwrap();
        pt
    }

    #[test]
    fn test_csr_indexes_consistent() {
        let pt = built(Pattern::Full, 3, 2);
        assert_eq!(pt.n_syns(), 6);
        assert_eq!(pt.s_con_n, vec![2, 2, 2]);
        assert_eq!(pt.r_con_n, vec![3, 3]);
        assert_eq!(pt.r_con_n_avg_max.avg, 3.0);
        for ri in 0..2 {
            for si in 0..3 {
                let idx = pt.syn_index(si, ri).unwrap();
                assert!(pt.send_range(si).contains(&idx));
                assert_eq!(pt.s_con_idx[idx], ri);
            }
        }
    }

    #[test]
    fn test_missing_synapse_is_nan() {
        let pt = built(Pattern::OneToOne, 3, 3);
        assert!(pt.syn_value("Wt", 0, 1).is_nan());
        assert!(pt.syn_value("Bogus", 0, 0).is_nan());
        assert!(pt.syn_value_1d(0, 99).is_nan());
    }

    #[test]
    fn test_set_wt_updates_lwt() {
        let mut pt = built(Pattern::OneToOne, 2, 2);
        pt.wt_init.var = 0.0;
        pt.init_weights(&mut StdRng::seed_from_u64(1));
        assert_eq!(pt.syn_value("Wt", 1, 1), 0.5);
        assert_eq!(pt.syn_value("LWt", 1, 1), 0.5);
        pt.set_syn_value("Wt", 1, 1, 0.15).unwrap();
        assert!((pt.syn_value("LWt", 1, 1) - 0.428_224_15).abs() < 1e-6);
        assert!(pt.set_syn_value("Wt", 0, 1, 0.1).is_err());
        assert!(matches!(
            pt.set_syn_value("Nope", 1, 1, 0.1),
            Err(EngineError::Variable(NeuralError::UnknownVariable(_)))
        ));
    }

    #[test]
    fn test_send_g_delta_scales_by_gscale() {
        let mut pt = built(Pattern::Full, 2, 2);
        pt.wt_init.var = 0.0;
        pt.init_weights(&mut StdRng::seed_from_u64(1));
        pt.gscale = 0.5;
        pt.send_g_delta(1, 0.4);
        assert!((pt.g_inc[0] - 0.1).abs() < 1e-7);
        assert!((pt.g_inc[1] - 0.1).abs() < 1e-7);
        pt.fold_g_inc_into_raw();
        assert_eq!(pt.g_inc[0], 0.0);
        assert!((pt.ge_raw[1] - 0.1).abs() < 1e-7);
    }

    #[test]
    fn test_kind_routing() {
        assert!(!PathKind::CTCtxt.sends_g_delta());
        assert!(PathKind::GPiThal.sends_g_delta());
        assert!(!PathKind::GPiThal.merges_into_recv());
        assert!(PathKind::Inhib.merges_into_recv());
    }
}
