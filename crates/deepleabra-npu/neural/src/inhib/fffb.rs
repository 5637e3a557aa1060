// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # FFFB Inhibition
//!
//! ```text
//! ffNetin = Ge.avg + max_vs_avg * (Ge.max - Ge.avg)
//! ffi     = ff * (ffNetin - ff0)      if ffNetin > ff0, else 0
//! fbi    += fb_dt * (fb * Act.avg - fbi)
//! gi      = gi_gain * (ffi + fbi)
//! ```

use crate::types::AvgMax;

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct FFFBParams {
    pub on: bool,
    /// Overall inhibition gain
    pub gi: f32,
    pub ff: f32,
    pub fb: f32,
    /// Feedback integration time constant, in cycles
    pub fb_tau: f32,
    /// Proportion of max vs. average Ge in the FF term
    pub max_vs_avg: f32,
    /// FF zero point
    pub ff0: f32,

    // derived
    pub fb_dt: f32,
}

impl Default for FFFBParams {
    fn default() -> Self {
        let mut fb = Self {
            on: true,
            gi: 1.8,
            ff: 1.0,
            fb: 1.0,
            fb_tau: 1.4,
            max_vs_avg: 0.0,
            ff0: 0.1,
            fb_dt: 0.0,
        };
        fb.update();
        fb
    }
}

impl FFFBParams {
    pub fn update(&mut self) {
        self.fb_dt = 1.0 / self.fb_tau;
    }

    #[inline]
    pub fn ff_inhib(&self, avg_ge: f32, max_ge: f32) -> f32 {
        let ff_netin = avg_ge + self.max_vs_avg * (max_ge - avg_ge);
        if ff_netin > self.ff0 {
            self.ff * (ff_netin - self.ff0)
        } else {
            0.0
        }
    }

    #[inline]
    pub fn fb_inhib(&self, avg_act: f32) -> f32 {
        self.fb * avg_act
    }

    #[inline]
    pub fn fb_update(&self, fbi: &mut f32, new_fbi: f32) {
        *fbi += self.fb_dt * (new_fbi - *fbi);
    }

    /// Full inhibition update. `inh.ge` and `inh.act` must already hold the
    /// current pool statistics. Disabled params reset the state.
    pub fn inhib(&self, inh: &mut FFFBInhib) {
        if !self.on {
            inh.init();
            return;
        }
        let ffi = self.ff_inhib(inh.ge.avg, inh.ge.max);
        let fbi = self.fb_inhib(inh.act.avg);
        inh.ffi = ffi;
        self.fb_update(&mut inh.fbi, fbi);
        inh.gi = self.gi * (ffi + inh.fbi);
        inh.gi_orig = inh.gi;
    }
}

/// Computed inhibition state of one pool.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct FFFBInhib {
    pub ffi: f32,
    pub fbi: f32,
    /// Net inhibition added to each neuron's Gi
    pub gi: f32,
    /// `gi` before the layer-level max was applied
    pub gi_orig: f32,
    /// Layer-level inhibition (sub-pools only)
    pub lay_gi: f32,
    pub ge: AvgMax,
    pub act: AvgMax,
}

impl FFFBInhib {
    pub fn init(&mut self) {
        self.ffi = 0.0;
        self.fbi = 0.0;
        self.gi = 0.0;
        self.gi_orig = 0.0;
        self.lay_gi = 0.0;
        self.ge.init();
        self.act.init();
    }

    /// Scale inhibition state toward zero by `decay`.
    pub fn decay(&mut self, decay: f32) {
        self.ge.decay(decay);
        self.act.decay(decay);
        self.ffi -= decay * self.ffi;
        self.fbi -= decay * self.fbi;
        self.gi -= decay * self.gi;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ff_zero_point() {
        let fb = FFFBParams::default();
        assert_eq!(fb.ff_inhib(0.05, 0.2), 0.0);
        assert!((fb.ff_inhib(0.3, 0.5) - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_inhib_integrates_feedback() {
        let fb = FFFBParams::default();
        let mut inh = FFFBInhib::default();
        inh.ge.avg = 0.3;
        inh.act.avg = 0.5;
        fb.inhib(&mut inh);
        let fbi = fb.fb_dt * 0.5;
        assert!((inh.fbi - fbi).abs() < 1e-6);
        assert!((inh.gi - 1.8 * (0.2 + fbi)).abs() < 1e-5);
        assert_eq!(inh.gi, inh.gi_orig);
    }

    #[test]
    fn test_disabled_resets_state() {
        let fb = FFFBParams {
            on: false,
            ..Default::default()
        };
        let mut inh = FFFBInhib {
            gi: 1.0,
            fbi: 0.5,
            ..Default::default()
        };
        fb.inhib(&mut inh);
        assert_eq!(inh.gi, 0.0);
        assert_eq!(inh.fbi, 0.0);
    }
}
