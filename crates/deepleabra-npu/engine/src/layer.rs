// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Layers
//!
//! One struct serves every layer kind. The kind tag selects which extra
//! steps run in each phase; the parameters for the deep and PBWM extensions
//! live in [`DeepParams`] and [`PbwmParams`] and are ignored by kinds that do
//! not use them.
//!
//! Methods here never touch another layer. Anything that reads a second
//! layer (input scaling, drivers, gating broadcast) is orchestrated by the
//! network with owned snapshots.

use crate::deep::{DeepParams, Drive, ResolvedDriver};
use crate::neuromod::NeuroMod;
use crate::path::{Path, PathIndex};
use crate::pbwm::PbwmParams;
use deepleabra_npu_neural::{
    ActParams, Context, InhibParams, LayerShape, Neuron, NeuronFlags, Pool,
};
use deepleabra_npu_plasticity::{CosDiffStats, DaModParams, LearnNeurParams};
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::warn;

/// Arena index of a layer inside its network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct LayerIndex(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum LayerKind {
    /// Superficial cortical layer; computes `burst` during burst quarters
    Super,
    Input,
    Target,
    /// Receives a comparison value that is not used for learning
    Compare,
    /// Deep corticothalamic layer driven by delayed context
    CT,
    /// Thalamic relay layer with driver-based plus phase
    Pulvinar,
    /// Clamped 1x1 layer broadcasting its activation as dopamine
    ClampDa,
    /// Clamped 1x1 layer broadcasting its activation as serotonin
    ClampSe,
    /// Dorsal striatum Go or NoGo layer
    Matrix,
    GPe,
    /// Winner-take-all gating layer combining Go and NoGo drive
    GPiThal,
    /// Cholinergic interneurons broadcasting ACh from reward layers
    CIN,
    /// Deep PFC layer holding gated working-memory maintenance
    PFCDeep,
}

impl LayerKind {
    /// Layers whose external input is hard clamped at the start of an alpha cycle.
    #[inline]
    pub fn is_input(self) -> bool {
        matches!(self, LayerKind::Input | LayerKind::ClampDa | LayerKind::ClampSe)
    }

    /// Purely error-driven layers: no weight balance on their inputs.
    #[inline]
    pub fn is_target(self) -> bool {
        matches!(self, LayerKind::Target | LayerKind::Pulvinar)
    }

    /// Layers that get error-modulated BCM learning.
    #[inline]
    pub fn is_hidden(self) -> bool {
        !matches!(
            self,
            LayerKind::Input
                | LayerKind::Target
                | LayerKind::Compare
                | LayerKind::Pulvinar
                | LayerKind::ClampDa
                | LayerKind::ClampSe
        )
    }
}

/// Cross-layer references resolved once in `Network::build`.
#[derive(Debug, Clone, Default)]
pub(crate) struct LayerLinks {
    pub send_to: Vec<LayerIndex>,
    /// PFC deep layer: its superficial layer
    pub super_lay: Option<LayerIndex>,
    /// PFC output deep layer: the maintenance deep layer it clears
    pub maint_lay: Option<LayerIndex>,
    pub go_path: Option<PathIndex>,
    pub nogo_path: Option<PathIndex>,
    pub rew_lays: Vec<LayerIndex>,
    pub drivers: Vec<ResolvedDriver>,
}

#[derive(Debug, Clone)]
pub struct Layer {
    pub name: String,
    pub kind: LayerKind,
    pub shape: LayerShape,
    pub off: bool,

    pub act: ActParams,
    pub inhib: InhibParams,
    pub learn: LearnNeurParams,
    pub da_mod: DaModParams,
    pub deep: DeepParams,
    pub pbwm: PbwmParams,

    pub neuro_mod: NeuroMod,
    /// Layers receiving this layer's neuromodulator or gating broadcasts
    pub send_to: Vec<String>,

    pub neurons: Vec<Neuron>,
    /// Pool 0 spans the layer; 4D layers add sub-pools 1..=n_pools
    pub pools: Vec<Pool>,
    pub cos_diff: CosDiffStats,

    pub recv_paths: Vec<PathIndex>,
    pub send_paths: Vec<PathIndex>,

    pub(crate) links: LayerLinks,
    /// `(neuron, delta)` pairs produced by the last send phase
    pub(crate) sends: Vec<(usize, f32)>,
    pub(crate) topo_wts: Vec<f32>,
}

impl Layer {
    pub fn new(name: impl Into<String>, shape: LayerShape, kind: LayerKind) -> Self {
        let mut ly = Self {
            name: name.into(),
            kind,
            shape,
            off: false,
            act: ActParams::default(),
            inhib: InhibParams::default(),
            learn: LearnNeurParams::default(),
            da_mod: DaModParams::default(),
            deep: DeepParams::default(),
            pbwm: PbwmParams::default(),
            neuro_mod: NeuroMod::default(),
            send_to: Vec::new(),
            neurons: Vec::new(),
            pools: Vec::new(),
            cos_diff: CosDiffStats::default(),
            recv_paths: Vec::new(),
            send_paths: Vec::new(),
            links: LayerLinks::default(),
            sends: Vec::new(),
            topo_wts: Vec::new(),
        };
        ly.build_pools();
        ly.defaults();
        ly
    }

    /// Reset parameters to the defaults for this layer kind. Geometry, driver
    /// lists and send-to lists are configuration, not parameters, and are kept.
    pub fn defaults(&mut self) {
        self.act = ActParams::default();
        self.inhib = InhibParams::default();
        self.learn = LearnNeurParams::default();
        self.da_mod = DaModParams::default();
        self.deep.reset_params();
        self.pbwm.reset_params();
        match self.kind {
            LayerKind::ClampDa | LayerKind::ClampSe => {
                self.act.clamp.range_min = -1.0;
                self.act.clamp.range_max = 1.0;
            }
            LayerKind::Super | LayerKind::CT | LayerKind::Pulvinar => self.deep_defaults(),
            LayerKind::Matrix => self.matrix_defaults(),
            LayerKind::GPiThal => self.gpi_thal_defaults(),
            LayerKind::PFCDeep => self.pfc_deep_defaults(),
            _ => {}
        }
        self.update_params();
    }

    pub fn update_params(&mut self) {
        self.act.update();
        self.inhib.update();
        self.learn.update();
        self.update_topo_wts();
    }

    fn build_pools(&mut self) {
        let nn = self.shape.len();
        self.neurons = vec![Neuron::default(); nn];
        self.pools = vec![Pool::new(0, nn)];
        let np = self.shape.n_pools();
        let nu = self.shape.units_per_pool();
        for pi in 0..np {
            let st = pi * nu;
            self.pools.push(Pool::new(st, st + nu));
            for nrn in &mut self.neurons[st..st + nu] {
                nrn.sub_pool = pi + 1;
            }
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.neurons.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.neurons.is_empty()
    }

    #[inline]
    pub fn is_4d(&self) -> bool {
        self.shape.is_4d()
    }

    /// Number of sub-pools (0 for 2D layers).
    #[inline]
    pub fn n_sub_pools(&self) -> usize {
        self.pools.len() - 1
    }

    //////////////////////////////////////////////////////////////////
    // Init

    /// Reset running averages and activations, as done after weight init.
    pub fn init_weights_state(&mut self) {
        let init = self.inhib.act_avg.init;
        let eff = self.inhib.act_avg.eff_init();
        for pl in &mut self.pools {
            pl.act_avg.act_m_avg = init;
            pl.act_avg.act_p_avg = init;
            pl.act_avg.act_p_avg_eff = eff;
        }
        self.init_act_avg();
        self.init_acts();
        self.cos_diff.init();
    }

    pub fn init_act_avg(&mut self) {
        for nrn in &mut self.neurons {
            self.learn.init_act_avg(nrn);
        }
    }

    /// Full activation reset, including pool inhibition and gating state.
    pub fn init_acts(&mut self) {
        for nrn in &mut self.neurons {
            self.act.init_acts(nrn);
            nrn.burst = 0.0;
            nrn.burst_prv = 0.0;
            nrn.ctxt_ge = 0.0;
            nrn.act_g = 0.0;
            nrn.maint = 0.0;
            nrn.maint_ge = 0.0;
            nrn.da_lrn = 0.0;
        }
        for pl in &mut self.pools {
            pl.inhib.init();
            pl.act_m.init();
            pl.act_p.init();
            pl.gate.init();
        }
        self.neuro_mod.init();
    }

    pub fn init_ext(&mut self) {
        for nrn in &mut self.neurons {
            nrn.ext = 0.0;
            nrn.targ = 0.0;
            nrn.flags.clear(NeuronFlags::EXT_MASK);
        }
    }

    fn ext_flags(&self) -> (u8, bool) {
        match self.kind {
            LayerKind::Target => (NeuronFlags::HAS_TARG, true),
            LayerKind::Compare => (NeuronFlags::HAS_CMPR, true),
            _ => (NeuronFlags::HAS_EXT, false),
        }
    }

    /// Apply a flat input pattern. Target and Compare layers store it in
    /// `targ`, every other kind in `ext`. Extra values are ignored.
    pub fn apply_ext(&mut self, ext: &[f32]) {
        let (set_mask, to_targ) = self.ext_flags();
        for (nrn, &val) in self.neurons.iter_mut().zip(ext) {
            if nrn.is_off() {
                continue;
            }
            if to_targ {
                nrn.targ = val;
            } else {
                nrn.ext = val;
            }
            nrn.flags.clear(NeuronFlags::EXT_MASK);
            nrn.flags.set(set_mask);
        }
    }

    //////////////////////////////////////////////////////////////////
    // Alpha cycle

    /// Start-of-trial updates that only read this layer: long-term averages,
    /// pool activity averages and `act_q0`.
    pub(crate) fn alpha_cyc_init_avgs(&mut self, update_act_avg: bool) {
        self.avg_l_from_avg_m();
        if update_act_avg {
            let aa = self.inhib.act_avg;
            for pl in &mut self.pools {
                aa.avg_from_act(&mut pl.act_avg.act_m_avg, pl.act_m.avg);
                aa.avg_from_act(&mut pl.act_avg.act_p_avg, pl.act_p.avg);
                aa.eff_from_avg(&mut pl.act_avg.act_p_avg_eff, pl.act_avg.act_p_avg);
            }
        }
        for nrn in self.neurons.iter_mut().filter(|n| !n.is_off()) {
            nrn.act_q0 = nrn.act_p;
        }
    }

    /// Start-of-trial state reset, after input scaling has been computed.
    pub(crate) fn alpha_cyc_init_state(&mut self) {
        self.decay_state(self.act.init.decay);
        self.init_g_inc();
        if self.act.clamp.hard && self.kind.is_input() {
            self.hard_clamp();
        }
    }

    pub fn avg_l_from_avg_m(&mut self) {
        let err_mod = self.learn.avg_l.err_mod;
        let modv = self.cos_diff.mod_avg_l_lrn;
        for nrn in self.neurons.iter_mut().filter(|n| !n.is_off()) {
            self.learn.avg_l_from_avg_m(nrn);
            if err_mod {
                nrn.avg_l_lrn *= modv;
            }
        }
    }

    pub fn decay_state(&mut self, decay: f32) {
        for nrn in self.neurons.iter_mut().filter(|n| !n.is_off()) {
            self.act.decay_state(nrn, decay);
        }
        for pl in &mut self.pools {
            pl.inhib.decay(decay);
        }
    }

    /// Decay the neurons of sub-pool `pi` (1-based) and its inhibition.
    pub fn decay_state_pool(&mut self, pi: usize, decay: f32) {
        let Some(pl) = self.pools.get_mut(pi) else {
            return;
        };
        pl.inhib.decay(decay);
        for nrn in self.neurons[pl.range()].iter_mut().filter(|n| !n.is_off()) {
            self.act.decay_state(nrn, decay);
        }
    }

    pub fn hard_clamp(&mut self) {
        for nrn in self.neurons.iter_mut().filter(|n| !n.is_off()) {
            self.act.hard_clamp(nrn);
        }
    }

    pub(crate) fn init_g_inc(&mut self) {
        for nrn in self.neurons.iter_mut().filter(|n| !n.is_off()) {
            self.act.init_g_inc(nrn);
        }
    }

    //////////////////////////////////////////////////////////////////
    // Cycle

    /// Compute which neurons send a delta this cycle, updating `act_sent`.
    pub(crate) fn collect_g_delta(&mut self) {
        self.sends.clear();
        let send_thr = self.act.opt_thresh.send;
        let delta_thr = self.act.opt_thresh.delta;
        for (ni, nrn) in self.neurons.iter_mut().enumerate() {
            if nrn.is_off() {
                continue;
            }
            if nrn.act > send_thr {
                let delta = nrn.act - nrn.act_sent;
                if delta.abs() > delta_thr {
                    self.sends.push((ni, delta));
                    nrn.act_sent = nrn.act;
                }
            } else if nrn.act_sent > send_thr {
                // un-send the last above-threshold activation
                self.sends.push((ni, -nrn.act_sent));
                nrn.act_sent = 0.0;
            }
        }
    }

    /// Fold pathway increments into the neurons' `ge_inc` / `gi_inc`.
    pub(crate) fn recv_g_inc(&mut self, paths: &[Path]) {
        for &pi in &self.recv_paths {
            let pt = &paths[pi.0];
            if pt.off || !pt.kind.merges_into_recv() {
                continue;
            }
            if pt.kind == crate::path::PathKind::Inhib {
                for (nrn, inc) in self.neurons.iter_mut().zip(&pt.g_inc) {
                    nrn.gi_inc += *inc;
                }
            } else {
                for (nrn, inc) in self.neurons.iter_mut().zip(&pt.g_inc) {
                    nrn.ge_inc += *inc;
                }
            }
        }
    }

    /// Conductance integration with this layer's kind-specific extra drive.
    pub(crate) fn g_from_inc(&mut self, ctx: &Context, paths: &[Path], drive: Option<&[Option<Drive>]>) {
        self.recv_g_inc(paths);
        for nrn in self.neurons.iter_mut().filter(|n| !n.is_off()) {
            self.act.g_raw_from_inc(nrn);
        }
        match self.kind {
            LayerKind::CT => self.ct_g_from_inc(),
            LayerKind::GPiThal => self.gpi_g_from_inc(paths),
            LayerKind::PFCDeep => self.maint_g_inc(),
            LayerKind::Pulvinar => match drive {
                Some(drive) => self.pulvinar_g_from_inc(drive),
                None => self.g_from_raw(ctx),
            },
            _ => self.g_from_raw(ctx),
        }
    }

    /// Standard Ge / Gi from the raw conductances, with optional DA modulation of Ge.
    pub(crate) fn g_from_raw(&mut self, ctx: &Context) {
        let da = self.neuro_mod.da;
        let ge_mod = self.da_mod.ge_mod_on();
        for nrn in self.neurons.iter_mut().filter(|n| !n.is_off()) {
            let mut ge_raw = nrn.ge_raw;
            if ge_mod {
                ge_raw += self.da_mod.ge(da, ge_raw, ctx.plus_phase);
            }
            self.act.ge_from_raw(nrn, ge_raw);
            self.act.gi_from_raw(nrn, nrn.gi_raw);
        }
    }

    pub(crate) fn avg_max_ge(&mut self) {
        for pl in &mut self.pools {
            pl.inhib.ge.init();
            for ni in pl.range() {
                pl.inhib.ge.update_val(self.neurons[ni].ge, ni);
            }
            pl.inhib.ge.calc_avg();
        }
    }

    pub(crate) fn inhib_from_ge_act(&mut self) {
        self.inhib.layer.inhib(&mut self.pools[0].inhib);
        let lay_gi = self.pools[0].inhib.gi;
        if self.pools.len() > 1 {
            for pl in self.pools.iter_mut().skip(1) {
                self.inhib.pool.inhib(&mut pl.inhib);
                pl.inhib.lay_gi = lay_gi;
                pl.inhib.gi = pl.inhib.gi.max(lay_gi);
            }
            if self.deep.topo.on {
                self.topo_gi();
            }
            for pl in self.pools.iter().skip(1) {
                let gi = pl.inhib.gi;
                for nrn in self.neurons[pl.range()].iter_mut().filter(|n| !n.is_off()) {
                    self.inhib.self_inhib.inhib(&mut nrn.gi_self, nrn.act);
                    nrn.gi = gi + nrn.gi_self + nrn.gi_syn;
                }
            }
        } else {
            for nrn in self.neurons.iter_mut().filter(|n| !n.is_off()) {
                self.inhib.self_inhib.inhib(&mut nrn.gi_self, nrn.act);
                nrn.gi = lay_gi + nrn.gi_self + nrn.gi_syn;
            }
        }
        if self.kind == LayerKind::Matrix {
            self.matrix_out_ach_inhib();
        }
    }

    pub(crate) fn act_from_g(&mut self, ctx: &Context) {
        match self.kind {
            // set from the reward layers by the network
            LayerKind::CIN => {}
            LayerKind::Matrix => {
                self.act_from_g_base(ctx);
                self.da_ach_from_lay();
            }
            _ => self.act_from_g_base(ctx),
        }
    }

    fn act_from_g_base(&mut self, ctx: &Context) {
        let mut xx1 = self.act.xx1;
        if self.da_mod.gain_mod_on() {
            xx1.gain = self.da_mod.gain(self.neuro_mod.da, xx1.gain, ctx.plus_phase);
            xx1.update();
        }
        for nrn in self.neurons.iter_mut().filter(|n| !n.is_off()) {
            self.act.vm_from_g(nrn);
            self.act.act_from_g_xx1(nrn, &xx1);
            self.learn.avgs_from_act(nrn);
        }
    }

    pub(crate) fn avg_max_act(&mut self) {
        for pl in &mut self.pools {
            pl.inhib.act.init();
            for ni in pl.range() {
                let nrn = &self.neurons[ni];
                if nrn.is_off() {
                    continue;
                }
                pl.inhib.act.update_val(nrn.act, ni);
            }
            pl.inhib.act.calc_avg();
        }
    }

    //////////////////////////////////////////////////////////////////
    // Quarter

    pub(crate) fn quarter_final(&mut self, ctx: &Context) {
        for pl in &mut self.pools {
            match ctx.quarter {
                2 => pl.act_m = pl.inhib.act,
                3 => pl.act_p = pl.inhib.act,
                _ => {}
            }
        }
        let avg_dt = self.act.dt.avg_dt;
        for nrn in self.neurons.iter_mut().filter(|n| !n.is_off()) {
            match ctx.quarter {
                0 => nrn.act_q1 = nrn.act,
                1 => nrn.act_q2 = nrn.act,
                2 => {
                    nrn.act_m = nrn.act;
                    if nrn.has_flag(NeuronFlags::HAS_TARG) {
                        // clamped in the plus phase
                        nrn.ext = nrn.targ;
                        nrn.flags.set(NeuronFlags::HAS_EXT);
                    }
                }
                3 => {
                    nrn.act_p = nrn.act;
                    nrn.act_dif = nrn.act_p - nrn.act_m;
                    nrn.act_avg += avg_dt * (nrn.act - nrn.act_avg);
                }
                _ => {}
            }
        }
        if ctx.quarter == 3 {
            self.cos_diff_from_acts();
        }
    }

    /// Cosine between zero-mean minus and plus phase activations; drives BCM error modulation.
    pub fn cos_diff_from_acts(&mut self) {
        let avg_m = self.pools[0].act_m.avg;
        let avg_p = self.pools[0].act_p.avg;
        let mut cosv = 0.0f32;
        let mut ssm = 0.0f32;
        let mut ssp = 0.0f32;
        for nrn in self.neurons.iter().filter(|n| !n.is_off()) {
            let ap = nrn.act_p - avg_p;
            let am = nrn.act_m - avg_m;
            cosv += ap * am;
            ssm += am * am;
            ssp += ap * ap;
        }
        let dist = (ssm * ssp).sqrt();
        if dist != 0.0 {
            cosv /= dist;
        }
        let cd = &mut self.cos_diff;
        cd.cos = cosv;
        self.learn.cos_diff.avg_var_from_cos(&mut cd.avg, &mut cd.var, cosv);
        if self.kind.is_hidden() {
            cd.avg_lrn = 1.0 - cd.avg;
            cd.mod_avg_l_lrn = self.learn.avg_l.err_mod_from_lay_err(cd.avg_lrn);
        } else {
            cd.avg_lrn = 0.0;
            cd.mod_avg_l_lrn = 0.0;
        }
    }

    //////////////////////////////////////////////////////////////////
    // Stats

    /// Sum and mean squared error between plus and minus phase activations.
    /// Compare layers use `targ` as the plus phase. Differences below `tol` count as zero.
    pub fn mse(&self, tol: f32) -> (f64, f64) {
        let nn = self.neurons.len();
        if nn == 0 {
            return (0.0, 0.0);
        }
        let mut sse = 0.0f64;
        for nrn in self.neurons.iter().filter(|n| !n.is_off()) {
            let d = if self.kind == LayerKind::Compare {
                nrn.targ - nrn.act_m
            } else {
                nrn.act_p - nrn.act_m
            };
            if d.abs() < tol {
                continue;
            }
            sse += (d * d) as f64;
        }
        (sse, sse / nn as f64)
    }

    pub fn sse(&self, tol: f32) -> f64 {
        self.mse(tol).0
    }

    pub fn un_lesion_neurons(&mut self) {
        for nrn in &mut self.neurons {
            nrn.flags.clear(NeuronFlags::OFF);
        }
    }

    /// Turn off a random proportion of neurons; returns how many were lesioned.
    pub fn lesion_neurons<R: Rng + ?Sized>(&mut self, prop: f32, rng: &mut R) -> usize {
        self.un_lesion_neurons();
        if prop > 1.0 {
            warn!(
                target: "deepleabra_npu_engine",
                "[LAYER] {}: lesion proportion {} > 1, expected 0-1", self.name, prop
            );
            return 0;
        }
        let nn = self.neurons.len();
        let mut perm: Vec<usize> = (0..nn).collect();
        perm.shuffle(rng);
        let nl = (prop * nn as f32) as usize;
        for &ni in &perm[..nl] {
            self.neurons[ni].flags.set(NeuronFlags::OFF);
        }
        nl
    }
}
