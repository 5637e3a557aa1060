// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # XCAL Synaptic Learning
//!
//! Weight changes are computed on the linear weight `lwt`; the effective
//! weight `wt` is a sigmoidal contrast-enhanced function of it.
//!
//! ## Algorithm (per synapse):
//! 1. `chl_dwt`: error term `xcal(s*r short, s*r medium)` and BCM term `xcal(s*r short, r avg_l)`
//! 2. mix: `dwt = lrate * (m_lrn * err + avg_l_lrn * bcm)`
//! 3. optional normalization by the running max |dwt| and momentum
//! 4. `wt_from_dwt`: soft-bounded update of `lwt`, then `wt = scale * sig(lwt)`

use deepleabra_npu_neural::Synapse;

// Go through f64 so the rounding matches the activation code.
#[inline]
fn pow32(x: f32, y: f32) -> f32 {
    (x as f64).powf(y as f64) as f32
}

/// The XCAL check-mark learning function.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct XCalParams {
    /// Multiplier on the error-driven term
    pub m_lrn: f32,
    /// Use the fixed `l_lrn` instead of the per-neuron `avg_l_lrn`
    pub set_l_lrn: bool,
    pub l_lrn: f32,
    /// Reversal point as a proportion of the threshold
    pub d_rev: f32,
    /// Minimum co-product below which no change happens
    pub d_thr: f32,
    /// Minimum short-term sender activity for any learning
    pub lrn_thr: f32,

    // derived
    pub d_rev_ratio: f32,
}

impl Default for XCalParams {
    fn default() -> Self {
        let mut xc = Self {
            m_lrn: 1.0,
            set_l_lrn: false,
            l_lrn: 1.0,
            d_rev: 0.1,
            d_thr: 0.0001,
            lrn_thr: 0.01,
            d_rev_ratio: 0.0,
        };
        xc.update();
        xc
    }
}

impl XCalParams {
    pub fn update(&mut self) {
        self.d_rev_ratio = if self.d_rev > 0.0 {
            -(1.0 - self.d_rev) / self.d_rev
        } else {
            -1.0
        };
    }

    /// Check-mark function of a co-product `srval` against threshold `thr_p`.
    #[inline]
    pub fn dwt(&self, srval: f32, thr_p: f32) -> f32 {
        if srval < self.d_thr {
            0.0
        } else if srval > thr_p * self.d_rev {
            srval - thr_p
        } else {
            srval * self.d_rev_ratio
        }
    }

    #[inline]
    pub fn long_lrate(&self, avg_l_lrn: f32) -> f32 {
        if self.set_l_lrn {
            self.l_lrn
        } else {
            avg_l_lrn
        }
    }
}

/// Sigmoidal weight contrast enhancement.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct WtSigParams {
    pub gain: f32,
    pub off: f32,
    /// Scale increases by `1 - lwt` and decreases by `lwt`
    pub soft_bound: bool,
}

impl Default for WtSigParams {
    fn default() -> Self {
        Self {
            gain: 6.0,
            off: 1.0,
            soft_bound: true,
        }
    }
}

impl WtSigParams {
    pub fn update(&mut self) {}

    /// Linear -> sigmoidal weight.
    pub fn sig_from_lin_wt(&self, lw: f32) -> f32 {
        if self.gain == 1.0 && self.off == 1.0 {
            return lw;
        }
        if self.gain == 6.0 && self.off == 1.0 {
            return sig_fun_61(lw);
        }
        sig_fun(lw, self.gain, self.off)
    }

    /// Sigmoidal -> linear weight.
    pub fn lin_from_sig_wt(&self, sw: f32) -> f32 {
        if self.gain == 1.0 && self.off == 1.0 {
            return sw;
        }
        if self.gain == 6.0 && self.off == 1.0 {
            return sig_inv_fun_61(sw);
        }
        sig_inv_fun(sw, self.gain, self.off)
    }
}

pub fn sig_fun(w: f32, gain: f32, off: f32) -> f32 {
    if w <= 0.0 {
        return 0.0;
    }
    if w >= 1.0 {
        return 1.0;
    }
    1.0 / (1.0 + pow32((off * (1.0 - w)) / w, gain))
}

/// `sig_fun` specialized for gain 6, offset 1.
pub fn sig_fun_61(w: f32) -> f32 {
    if w <= 0.0 {
        return 0.0;
    }
    if w >= 1.0 {
        return 1.0;
    }
    let pw = (1.0 - w) / w;
    1.0 / (1.0 + pw * pw * pw * pw * pw * pw)
}

pub fn sig_inv_fun(w: f32, gain: f32, off: f32) -> f32 {
    if w <= 0.0 {
        return 0.0;
    }
    if w >= 1.0 {
        return 1.0;
    }
    1.0 / (1.0 + pow32((1.0 - w) / w, 1.0 / gain) / off)
}

pub fn sig_inv_fun_61(w: f32) -> f32 {
    if w <= 0.0 {
        return 0.0;
    }
    if w >= 1.0 {
        return 1.0;
    }
    1.0 / (1.0 + pow32((1.0 - w) / w, 1.0 / 6.0))
}

/// Normalization of weight changes by a decaying running max of |dwt|.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct DWtNormParams {
    pub on: bool,
    pub decay_tau: f32,
    pub norm_min: f32,
    /// Learning rate compensation for the reduced effective rate
    pub lr_comp: f32,

    // derived
    pub decay_dt: f32,
    pub decay_dt_c: f32,
}

impl Default for DWtNormParams {
    fn default() -> Self {
        let mut dn = Self {
            on: true,
            decay_tau: 1000.0,
            norm_min: 0.001,
            lr_comp: 0.15,
            decay_dt: 0.0,
            decay_dt_c: 0.0,
        };
        dn.update();
        dn
    }
}

impl DWtNormParams {
    pub fn update(&mut self) {
        self.decay_dt = 1.0 / self.decay_tau;
        self.decay_dt_c = 1.0 - self.decay_dt;
    }

    /// Update the running max and return the normalization factor.
    #[inline]
    pub fn norm_from_abs_dwt(&self, norm: &mut f32, abs_dwt: f32) -> f32 {
        *norm = (self.decay_dt_c * *norm).max(abs_dwt);
        if *norm == 0.0 {
            return 1.0;
        }
        self.lr_comp / norm.max(self.norm_min)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct MomentumParams {
    pub on: bool,
    pub m_tau: f32,
    pub lr_comp: f32,

    // derived
    pub m_dt: f32,
    pub m_dt_c: f32,
}

impl Default for MomentumParams {
    fn default() -> Self {
        let mut mp = Self {
            on: true,
            m_tau: 10.0,
            lr_comp: 0.1,
            m_dt: 0.0,
            m_dt_c: 0.0,
        };
        mp.update();
        mp
    }
}

impl MomentumParams {
    pub fn update(&mut self) {
        self.m_dt = 1.0 / self.m_tau;
        self.m_dt_c = 1.0 - self.m_dt;
    }

    /// Accumulate `dwt` into the momentum and return the effective change.
    #[inline]
    pub fn moment_from_dwt(&self, moment: &mut f32, dwt: f32) -> f32 {
        *moment = self.m_dt_c * *moment + dwt;
        self.lr_comp * *moment
    }
}

/// Weight balance: keeps the average weight into each receiver in a target band
/// by biasing the soft-bound increase / decrease factors.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct WtBalParams {
    pub on: bool,
    /// Also apply to target (output) layers
    pub targs: bool,
    /// Averages below this are treated as this value
    pub avg_thr: f32,
    pub hi_thr: f32,
    pub hi_gain: f32,
    pub lo_thr: f32,
    pub lo_gain: f32,
}

impl Default for WtBalParams {
    fn default() -> Self {
        Self {
            on: false,
            targs: false,
            avg_thr: 0.25,
            hi_thr: 0.4,
            hi_gain: 4.0,
            lo_thr: 0.4,
            lo_gain: 6.0,
        }
    }
}

impl WtBalParams {
    /// `(fact, inc, dec)` for a receiver's average weight.
    pub fn wt_bal(&self, wb_avg: f32) -> (f32, f32, f32) {
        let mut fact = 0.0;
        let mut inc = 1.0;
        let mut dec = 1.0;
        if wb_avg < self.lo_thr {
            let wb_avg = wb_avg.max(self.avg_thr);
            fact = self.lo_gain * (self.lo_thr - wb_avg);
            dec = 1.0 / (1.0 + fact);
            inc = 2.0 - dec;
        } else if wb_avg > self.hi_thr {
            fact = self.hi_gain * (wb_avg - self.hi_thr);
            inc = 1.0 / (1.0 + fact);
            dec = 2.0 - inc;
        }
        (fact, inc, dec)
    }
}

/// Per-receiver weight balance state.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct WtBalRecv {
    pub avg: f32,
    pub fact: f32,
    pub inc: f32,
    pub dec: f32,
}

impl Default for WtBalRecv {
    fn default() -> Self {
        Self {
            avg: 0.0,
            fact: 0.0,
            inc: 1.0,
            dec: 1.0,
        }
    }
}

/// Synapse-level learning parameters of a pathway.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct LearnSynParams {
    pub learn: bool,
    pub lrate: f32,
    /// Original learning rate, restored by `lrate_mult(1)`
    pub lrate_init: f32,
    pub xcal: XCalParams,
    pub wt_sig: WtSigParams,
    pub norm: DWtNormParams,
    pub momentum: MomentumParams,
    pub wt_bal: WtBalParams,
}

impl Default for LearnSynParams {
    fn default() -> Self {
        Self {
            learn: true,
            lrate: 0.04,
            lrate_init: 0.04,
            xcal: XCalParams::default(),
            wt_sig: WtSigParams::default(),
            norm: DWtNormParams::default(),
            momentum: MomentumParams::default(),
            wt_bal: WtBalParams::default(),
        }
    }
}

impl LearnSynParams {
    pub fn update(&mut self) {
        self.xcal.update();
        self.wt_sig.update();
        self.norm.update();
        self.momentum.update();
    }

    /// Scale the learning rate relative to `lrate_init`.
    pub fn lrate_mult(&mut self, mult: f32) {
        self.lrate = self.lrate_init * mult;
    }

    /// Linear weight from the effective weight, factoring out the scale.
    #[inline]
    pub fn lwt_from_wt(&self, syn: &mut Synapse) {
        syn.lwt = self.wt_sig.lin_from_sig_wt(syn.wt / syn.scale);
    }

    #[inline]
    pub fn wt_from_lwt(&self, syn: &mut Synapse) {
        syn.wt = self.wt_sig.sig_from_lin_wt(syn.lwt);
        syn.wt *= syn.scale;
    }

    /// `(err, bcm)` terms from sender / receiver short, medium and long averages.
    #[inline]
    pub fn chl_dwt(
        &self,
        su_avg_s_lrn: f32,
        su_avg_m: f32,
        ru_avg_s_lrn: f32,
        ru_avg_m: f32,
        ru_avg_l: f32,
    ) -> (f32, f32) {
        let srs = su_avg_s_lrn * ru_avg_s_lrn;
        let srm = su_avg_m * ru_avg_m;
        let bcm = self.xcal.dwt(srs, ru_avg_l);
        let err = self.xcal.dwt(srs, srm);
        (err, bcm)
    }

    #[inline]
    pub fn bcm_dwt(&self, su_avg_s_lrn: f32, ru_avg_s_lrn: f32, ru_avg_l: f32) -> f32 {
        self.xcal.dwt(su_avg_s_lrn * ru_avg_s_lrn, ru_avg_l)
    }

    /// Apply the pending `dwt` with soft bounding and weight balance factors,
    /// then recompute `wt` and clear `dwt`.
    pub fn wt_from_dwt(&self, wb_inc: f32, wb_dec: f32, syn: &mut Synapse) {
        if syn.dwt == 0.0 {
            return;
        }
        if self.wt_sig.soft_bound {
            if syn.dwt > 0.0 {
                syn.dwt *= wb_inc * (1.0 - syn.lwt);
            } else {
                syn.dwt *= wb_dec * syn.lwt;
            }
        } else if syn.dwt > 0.0 {
            syn.dwt *= wb_inc;
        } else {
            syn.dwt *= wb_dec;
        }
        syn.lwt += syn.dwt;
        syn.lwt = syn.lwt.clamp(0.0, 1.0);
        syn.wt = syn.scale * self.wt_sig.sig_from_lin_wt(syn.lwt);
        syn.dwt = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xcal_check_mark() {
        let xc = XCalParams::default();
        assert_eq!(xc.dwt(0.00001, 0.5), 0.0);
        // above the reversal point: linear in srval - thr
        assert!((xc.dwt(0.3, 0.2) - 0.1).abs() < 1e-7);
        // below reversal point: negative slope back to zero
        let d = xc.dwt(0.01, 0.5);
        assert!(d < 0.0);
        assert!((d - 0.01 * -9.0).abs() < 1e-6);
    }

    #[test]
    fn test_sig_inverse_round_trip() {
        let ws = WtSigParams::default();
        for lw in [0.1f32, 0.35, 0.5, 0.8] {
            let sw = ws.sig_from_lin_wt(lw);
            assert!((ws.lin_from_sig_wt(sw) - lw).abs() < 1e-5);
        }
        assert_eq!(ws.sig_from_lin_wt(0.5), 0.5);
        let lin = WtSigParams {
            gain: 1.0,
            ..Default::default()
        };
        assert_eq!(lin.sig_from_lin_wt(0.3), 0.3);
    }

    #[test]
    fn test_generic_sig_matches_specialized() {
        for w in [0.2f32, 0.45, 0.7] {
            assert!((sig_fun(w, 6.0, 1.0) - sig_fun_61(w)).abs() < 1e-6);
        }
    }

    #[test]
    fn test_norm_and_momentum() {
        let dn = DWtNormParams::default();
        let mut norm = 0.0;
        assert_eq!(dn.norm_from_abs_dwt(&mut norm, 0.0), 1.0);
        let f = dn.norm_from_abs_dwt(&mut norm, 0.5);
        assert_eq!(norm, 0.5);
        assert!((f - 0.3).abs() < 1e-6);

        let mp = MomentumParams::default();
        let mut moment = 0.0;
        let d = mp.moment_from_dwt(&mut moment, 1.0);
        assert_eq!(moment, 1.0);
        assert!((d - 0.1).abs() < 1e-7);
        mp.moment_from_dwt(&mut moment, 0.0);
        assert!((moment - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_wt_bal_bands() {
        let wb = WtBalParams::default();
        assert_eq!(wb.wt_bal(0.4), (0.0, 1.0, 1.0));
        let (fact, inc, dec) = wb.wt_bal(0.1);
        // clamped up to avg_thr 0.25
        assert!((fact - 0.9).abs() < 1e-6);
        assert!(inc > 1.0 && dec < 1.0);
        assert!((inc + dec - 2.0).abs() < 1e-6);
        let (_, inc, dec) = wb.wt_bal(0.6);
        assert!(inc < 1.0 && dec > 1.0);
    }

    #[test]
    fn test_wt_from_dwt_soft_bound() {
        let ls = LearnSynParams::default();
        let mut syn = Synapse {
            lwt: 0.5,
            scale: 1.0,
            dwt: 0.2,
            ..Default::default()
        };
        ls.wt_from_dwt(1.0, 1.0, &mut syn);
        assert!((syn.lwt - 0.6).abs() < 1e-6);
        assert_eq!(syn.dwt, 0.0);
        assert!((syn.wt - sig_fun_61(syn.lwt)).abs() < 1e-7);

        // zero dwt leaves everything alone
        let before = syn;
        ls.wt_from_dwt(1.0, 1.0, &mut syn);
        assert_eq!(syn, before);
    }
}
