// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Dopamine modulation and eligibility-trace parameters for three-factor learning.

/// Dopamine receptor type expressed by a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum DaReceptors {
    /// Dopamine is excitatory; bursts increase weights (direct / Go pathway)
    #[default]
    D1R,
    /// Dopamine is inhibitory; bursts decrease weights (indirect / NoGo pathway)
    D2R,
}

/// Dopamine modulation of excitatory input or activation gain.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct DaModParams {
    pub on: bool,
    /// Modulate gain instead of Ge
    pub mod_gain: bool,
    /// Multiplier on DA in the minus phase (negative for D2-type neurons)
    pub minus: f32,
    /// Multiplier on DA in the plus phase
    pub plus: f32,
    pub neg_gain: f32,
    pub pos_gain: f32,
}

impl Default for DaModParams {
    fn default() -> Self {
        Self {
            on: false,
            mod_gain: false,
            minus: 0.0,
            plus: 0.01,
            neg_gain: 0.1,
            pos_gain: 0.1,
        }
    }
}

impl DaModParams {
    #[inline]
    pub fn ge_mod_on(&self) -> bool {
        self.on && !self.mod_gain
    }

    #[inline]
    pub fn gain_mod_on(&self) -> bool {
        self.on && self.mod_gain
    }

    /// DA-driven change to `ge`.
    #[inline]
    pub fn ge(&self, da: f32, ge: f32, plus_phase: bool) -> f32 {
        if plus_phase {
            self.plus * da * ge
        } else {
            self.minus * da * ge
        }
    }

    /// DA-modulated gain value.
    pub fn gain(&self, da: f32, gain: f32, plus_phase: bool) -> f32 {
        let da = if plus_phase { da * self.plus } else { da * self.minus };
        if da < 0.0 {
            gain * (1.0 + da * self.neg_gain)
        } else {
            gain * (1.0 + da * self.pos_gain)
        }
    }
}

/// Eligibility-trace learning parameters for Matrix pathways.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct TraceParams {
    /// Learning rate (and opposite sign) for stripes that did not gate
    pub not_gated_lr: f32,
    /// Extra learning rate factor for positive DA on NoGo units with a negative trace
    pub gate_no_go_pos_lr: f32,
    /// Trace decay from ACh; 0 disables
    pub ach_decay: f32,
    /// Multiplier on |new trace| giving the decay of the existing trace
    pub decay: f32,
    /// Use `2 * act * (1 - act)` as the receiver factor instead of `act`
    pub deriv: bool,
}

impl Default for TraceParams {
    fn default() -> Self {
        Self {
            not_gated_lr: 0.7,
            gate_no_go_pos_lr: 0.1,
            ach_decay: 0.0,
            decay: 1.0,
            deriv: true,
        }
    }
}

impl TraceParams {
    #[inline]
    pub fn lrn_factor(&self, act: f32) -> f32 {
        if !self.deriv {
            return act;
        }
        2.0 * act * (1.0 - act)
    }

    /// New trace increment for a synapse: positive when the receiver's stripe
    /// gated, negative and scaled by `not_gated_lr` otherwise.
    #[inline]
    pub fn new_trace(&self, gated: bool, ru_act: f32, su_act: f32) -> f32 {
        let new_ntr = self.lrn_factor(ru_act) * su_act;
        if gated {
            new_ntr
        } else {
            -self.not_gated_lr * new_ntr
        }
    }

    /// Fold a new increment into the trace; decay scales with |ntr|.
    #[inline]
    pub fn update_trace(&self, tr: f32, ntr: f32) -> f32 {
        let decay = (self.decay * ntr.abs()).min(1.0);
        tr + ntr - decay * tr
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_da_mod_ge_by_phase() {
        let dm = DaModParams::default();
        assert_eq!(dm.ge(1.0, 0.5, false), 0.0);
        assert!((dm.ge(1.0, 0.5, true) - 0.005).abs() < 1e-8);
        assert!(!dm.ge_mod_on());
    }

    #[test]
    fn test_da_mod_gain() {
        let dm = DaModParams {
            plus: 1.0,
            minus: 1.0,
            ..Default::default()
        };
        assert!((dm.gain(-1.0, 100.0, true) - 90.0).abs() < 1e-4);
        assert!((dm.gain(0.5, 100.0, false) - 105.0).abs() < 1e-4);
    }

    #[test]
    fn test_trace_sign_symmetry() {
        let tp = TraceParams::default();
        for (ra, sa) in [(0.3f32, 0.8f32), (0.9, 0.1), (0.5, 0.5)] {
            let gated = tp.new_trace(true, ra, sa);
            let not_gated = tp.new_trace(false, ra, sa);
            assert!(gated > 0.0);
            assert!(not_gated < 0.0);
            assert!((not_gated.abs() - tp.not_gated_lr * gated.abs()).abs() < 1e-7);
        }
    }

    #[test]
    fn test_trace_decay_capped() {
        let tp = TraceParams {
            decay: 10.0,
            ..Default::default()
        };
        // decay saturates at 1: old trace fully replaced by the new increment
        assert!((tp.update_trace(0.4, 0.5) - 0.5).abs() < 1e-7);
    }

    #[test]
    fn test_lrn_factor() {
        let mut tp = TraceParams::default();
        assert_eq!(tp.lrn_factor(0.5), 0.5);
        assert!((tp.lrn_factor(0.9) - 0.18).abs() < 1e-6);
        tp.deriv = false;
        assert_eq!(tp.lrn_factor(0.9), 0.9);
    }
}
