// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Activation Parameters and Per-Neuron Updates
//!
//! ## Algorithm (one cycle, per neuron):
//! 1. `g_raw_from_inc`: fold the increments sent this cycle into the raw conductances
//! 2. `ge_from_raw` / `gi_from_raw`: integrate raw conductances with time constant `g_tau`
//! 3. `vm_from_g`: net current and membrane potential update
//! 4. `act_from_g`: noisy XX1 rate code, time-integrated at the Vm rate
//!
//! The operation order inside each function is fixed; the regression tests
//! compare results at 1e-8.

use super::chans::Chans;
use super::nxx1::NXX1Params;
use crate::types::{Neuron, NeuronFlags};

/// Thresholds that skip sending small or sub-threshold activation changes.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct OptThreshParams {
    /// Activation below which nothing is sent
    pub send: f32,
    /// Minimum activation change before a delta is sent
    pub delta: f32,
}

impl Default for OptThreshParams {
    fn default() -> Self {
        Self { send: 0.1, delta: 0.005 }
    }
}

/// Initial values applied by `init_acts` and `decay_state`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct InitParams {
    /// Proportion to decay toward initial values at the start of each alpha cycle
    pub decay: f32,
    pub vm: f32,
    pub act: f32,
    pub ge: f32,
}

impl Default for InitParams {
    fn default() -> Self {
        Self { decay: 1.0, vm: 0.4, act: 0.0, ge: 0.0 }
    }
}

/// Integration time constants.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct DtParams {
    pub integ: f32,
    pub vm_tau: f32,
    pub g_tau: f32,
    pub avg_tau: f32,

    // derived
    pub vm_dt: f32,
    pub g_dt: f32,
    pub avg_dt: f32,
}

impl Default for DtParams {
    fn default() -> Self {
        let mut dt = Self {
            integ: 1.0,
            vm_tau: 3.3,
            g_tau: 1.4,
            avg_tau: 200.0,
            vm_dt: 0.0,
            g_dt: 0.0,
            avg_dt: 0.0,
        };
        dt.update();
        dt
    }
}

impl DtParams {
    pub fn update(&mut self) {
        self.vm_dt = self.integ / self.vm_tau;
        self.g_dt = self.integ / self.g_tau;
        self.avg_dt = 1.0 / self.avg_tau;
    }

    /// Integrate a conductance toward its raw drive.
    #[inline]
    pub fn g_from_raw(&self, g_raw: f32, g: &mut f32) {
        *g += self.g_dt * (g_raw - *g);
    }
}

/// External input clamping.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct ClampParams {
    /// Clamp activation directly to the external input instead of driving Ge
    pub hard: bool,
    pub range_min: f32,
    pub range_max: f32,
    /// Soft clamp gain on external input added to GeRaw
    pub gain: f32,
    /// Mix soft-clamp input with synaptic input instead of adding
    pub avg: bool,
    pub avg_gain: f32,
}

impl Default for ClampParams {
    fn default() -> Self {
        Self {
            hard: true,
            range_min: 0.0,
            range_max: 0.95,
            gain: 0.2,
            avg: false,
            avg_gain: 0.2,
        }
    }
}

impl ClampParams {
    #[inline]
    pub fn clip(&self, val: f32) -> f32 {
        if val < self.range_min {
            self.range_min
        } else if val > self.range_max {
            self.range_max
        } else {
            val
        }
    }

    #[inline]
    pub fn avg_ge(&self, ext: f32, ge: f32) -> f32 {
        self.avg_gain * self.gain * ext + (1.0 - self.avg_gain) * ge
    }
}

/// Full activation parameter set of a layer.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct ActParams {
    pub xx1: NXX1Params,
    pub opt_thresh: OptThreshParams,
    pub init: InitParams,
    pub dt: DtParams,
    /// Maximal conductances
    pub gbar: Chans,
    /// Reversal potentials
    pub erev: Chans,
    pub clamp: ClampParams,
    pub vm_min: f32,
    pub vm_max: f32,

    // derived
    pub erev_sub_thr: Chans,
    pub thr_sub_erev: Chans,
}

impl Default for ActParams {
    fn default() -> Self {
        let mut ac = Self {
            xx1: NXX1Params::default(),
            opt_thresh: OptThreshParams::default(),
            init: InitParams::default(),
            dt: DtParams::default(),
            gbar: Chans::new(1.0, 0.1, 1.0, 1.0),
            erev: Chans::new(1.0, 0.3, 0.25, 0.25),
            clamp: ClampParams::default(),
            vm_min: 0.0,
            vm_max: 2.0,
            erev_sub_thr: Chans::default(),
            thr_sub_erev: Chans::default(),
        };
        ac.update();
        ac
    }
}

impl ActParams {
    /// Recompute every derived value; call after changing any parameter.
    pub fn update(&mut self) {
        self.erev_sub_thr = Chans::other_minus(&self.erev, self.xx1.thr);
        self.thr_sub_erev = Chans::minus_other(self.xx1.thr, &self.erev);
        self.xx1.update();
        self.dt.update();
    }

    /// Reset the per-cycle send / receive accumulators.
    #[inline]
    pub fn init_g_inc(&self, nrn: &mut Neuron) {
        nrn.act_sent = 0.0;
        nrn.ge_raw = 0.0;
        nrn.ge_inc = 0.0;
        nrn.gi_raw = 0.0;
        nrn.gi_inc = 0.0;
    }

    /// Decay activation state toward initial values by `decay` (1 = full reset).
    pub fn decay_state(&self, nrn: &mut Neuron, decay: f32) {
        if decay > 0.0 {
            nrn.act -= decay * (nrn.act - self.init.act);
            nrn.ge -= decay * (nrn.ge - self.init.ge);
            nrn.gi -= decay * nrn.gi;
            nrn.gi_self -= decay * nrn.gi_self;
            nrn.gk -= decay * nrn.gk;
            nrn.vm -= decay * (nrn.vm - self.init.vm);
        }
        nrn.act_del = 0.0;
        nrn.inet = 0.0;
    }

    /// Full activation reset. `gi_syn` is integrated state and is left alone.
    pub fn init_acts(&self, nrn: &mut Neuron) {
        nrn.act = self.init.act;
        nrn.act_lrn = self.init.act;
        nrn.ge = self.init.ge;
        nrn.gi = 0.0;
        nrn.gk = 0.0;
        nrn.gi_self = 0.0;
        nrn.inet = 0.0;
        nrn.vm = self.init.vm;
        nrn.targ = 0.0;
        nrn.ext = 0.0;
        nrn.act_del = 0.0;
        self.init_act_qs(nrn);
        self.init_g_inc(nrn);
    }

    pub fn init_act_qs(&self, nrn: &mut Neuron) {
        nrn.act_q0 = 0.0;
        nrn.act_q1 = 0.0;
        nrn.act_q2 = 0.0;
        nrn.act_m = 0.0;
        nrn.act_p = 0.0;
        nrn.act_dif = 0.0;
    }

    #[inline]
    pub fn g_raw_from_inc(&self, nrn: &mut Neuron) {
        nrn.ge_raw += nrn.ge_inc;
        nrn.ge_inc = 0.0;
        nrn.gi_raw += nrn.gi_inc;
        nrn.gi_inc = 0.0;
    }

    /// Integrate Ge from a raw excitatory drive, adding soft-clamped input when present.
    #[inline]
    pub fn ge_from_raw(&self, nrn: &mut Neuron, ge_raw: f32) {
        let mut ge_raw = ge_raw;
        if !self.clamp.hard && nrn.has_flag(NeuronFlags::HAS_EXT) {
            if self.clamp.avg {
                ge_raw = self.clamp.avg_ge(nrn.ext, ge_raw);
            } else {
                ge_raw += nrn.ext * self.clamp.gain;
            }
        }
        self.dt.g_from_raw(ge_raw, &mut nrn.ge);
    }

    /// Integrate the synaptic inhibition component `gi_syn` (never negative).
    #[inline]
    pub fn gi_from_raw(&self, nrn: &mut Neuron, gi_raw: f32) {
        self.dt.g_from_raw(gi_raw, &mut nrn.gi_syn);
        nrn.gi_syn = nrn.gi_syn.max(0.0);
    }

    #[inline]
    pub fn inet_from_g(&self, vm: f32, ge: f32, gi: f32, gk: f32) -> f32 {
        ge * (self.erev.e - vm)
            + self.gbar.l * (self.erev.l - vm)
            + gi * (self.erev.i - vm)
            + gk * (self.erev.k - vm)
    }

    #[inline]
    pub fn vm_from_g(&self, nrn: &mut Neuron) {
        let ge = nrn.ge * self.gbar.e;
        let gi = nrn.gi * self.gbar.i;
        let gk = nrn.gk * self.gbar.k;
        nrn.inet = self.inet_from_g(nrn.vm, ge, gi, gk);
        let nw_vm = nrn.vm + self.dt.vm_dt * nrn.inet;
        nrn.vm = nw_vm.clamp(self.vm_min, self.vm_max);
    }

    /// Excitatory conductance that would hold Vm exactly at threshold.
    #[inline]
    pub fn ge_thr_from_g(&self, nrn: &Neuron) -> f32 {
        (self.gbar.i * nrn.gi * self.erev_sub_thr.i
            + self.gbar.l * self.erev_sub_thr.l
            + self.gbar.k * nrn.gk * self.erev_sub_thr.k)
            / self.thr_sub_erev.e
    }

    /// Threshold conductance ignoring K adaptation, used for the learning activation.
    #[inline]
    pub fn ge_thr_from_g_no_k(&self, nrn: &Neuron) -> f32 {
        (self.gbar.i * nrn.gi * self.erev_sub_thr.i + self.gbar.l * self.erev_sub_thr.l)
            / self.thr_sub_erev.e
    }

    #[inline]
    pub fn has_hard_clamp(&self, nrn: &Neuron) -> bool {
        self.clamp.hard && nrn.has_flag(NeuronFlags::HAS_EXT)
    }

    pub fn act_from_g(&self, nrn: &mut Neuron) {
        self.act_from_g_xx1(nrn, &self.xx1);
    }

    /// Rate-code update through `xx1`, which may carry a modulated gain.
    pub fn act_from_g_xx1(&self, nrn: &mut Neuron, xx1: &NXX1Params) {
        if self.has_hard_clamp(nrn) {
            self.hard_clamp(nrn);
            return;
        }
        let (nw_act, nw_act_lrn) = if nrn.act < xx1.vm_act_thr && nrn.vm <= xx1.thr {
            let a = xx1.noisy_xx1(nrn.vm - xx1.thr);
            (a, a)
        } else {
            let ge = nrn.ge * self.gbar.e;
            let ge_thr = self.ge_thr_from_g(nrn);
            let a = xx1.noisy_xx1(ge - ge_thr);
            let ge_thr = self.ge_thr_from_g_no_k(nrn);
            (a, xx1.noisy_xx1(ge - ge_thr))
        };
        let cur_act = nrn.act;
        let nw_act = cur_act + self.dt.vm_dt * (nw_act - cur_act);
        nrn.act_del = nw_act - cur_act;
        nrn.act = nw_act;
        nrn.act_lrn += self.dt.vm_dt * (nw_act_lrn - nrn.act_lrn);
    }

    /// Clamp activation to the external input.
    pub fn hard_clamp(&self, nrn: &mut Neuron) {
        let clmp = self.clamp.clip(nrn.ext);
        nrn.act = clmp;
        nrn.act_lrn = clmp;
        nrn.vm = self.xx1.thr + nrn.act / self.xx1.gain;
        nrn.act_del = 0.0;
        nrn.inet = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decay_state_full_resets_to_init() {
        let ac = ActParams::default();
        let mut nrn = Neuron {
            act: 0.8,
            ge: 0.6,
            gi: 0.9,
            vm: 1.2,
            ..Default::default()
        };
        ac.decay_state(&mut nrn, 1.0);
        assert_eq!(nrn.act, 0.0);
        assert_eq!(nrn.ge, 0.0);
        assert_eq!(nrn.gi, 0.0);
        assert!((nrn.vm - 0.4).abs() < 1e-7);
    }

    #[test]
    fn test_hard_clamp_range() {
        let ac = ActParams::default();
        let mut nrn = Neuron {
            ext: 1.0,
            ..Default::default()
        };
        nrn.flags.set(NeuronFlags::HAS_EXT);
        ac.act_from_g(&mut nrn);
        assert_eq!(nrn.act, 0.95);
        assert!((nrn.vm - (0.5 + 0.95 / 100.0)).abs() < 1e-7);
    }

    #[test]
    fn test_gi_syn_never_negative() {
        let ac = ActParams::default();
        let mut nrn = Neuron::default();
        ac.gi_from_raw(&mut nrn, -1.0);
        assert_eq!(nrn.gi_syn, 0.0);
    }

    #[test]
    fn test_soft_clamp_adds_ext_drive() {
        let mut ac = ActParams::default();
        ac.clamp.hard = false;
        let mut nrn = Neuron {
            ext: 1.0,
            ..Default::default()
        };
        nrn.flags.set(NeuronFlags::HAS_EXT);
        ac.ge_from_raw(&mut nrn, 0.0);
        assert!((nrn.ge - ac.dt.g_dt * 0.2).abs() < 1e-7);
    }
}
