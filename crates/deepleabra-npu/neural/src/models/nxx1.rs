// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Noisy X-over-X-plus-1 rate-code activation function.
//!
//! `x / (x + 1)` convolved with a gaussian noise kernel, approximated piecewise:
//! a sigmoid below zero, a linear interpolation just above zero, and a
//! gain-corrected XX1 beyond `interp_range`.

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct NXX1Params {
    /// Threshold on Vm for firing output activation
    pub thr: f32,
    /// Gain of the rate-coded activation function
    pub gain: f32,
    /// Variance of the gaussian noise kernel
    pub n_var: f32,
    /// Activation below which the direct `vm - thr` path is used
    pub vm_act_thr: f32,
    pub sig_mult: f32,
    pub sig_mult_pow: f32,
    pub sig_gain: f32,
    pub interp_range: f32,
    pub gain_cor_range: f32,
    pub gain_cor: f32,

    // derived
    pub sig_gain_n_var: f32,
    pub sig_mult_eff: f32,
    pub sig_val_at_0: f32,
    pub interp_val: f32,
}

impl Default for NXX1Params {
    fn default() -> Self {
        let mut xp = Self {
            thr: 0.5,
            gain: 100.0,
            n_var: 0.005,
            vm_act_thr: 0.01,
            sig_mult: 0.33,
            sig_mult_pow: 0.8,
            sig_gain: 3.0,
            interp_range: 0.01,
            gain_cor_range: 10.0,
            gain_cor: 0.1,
            sig_gain_n_var: 0.0,
            sig_mult_eff: 0.0,
            sig_val_at_0: 0.0,
            interp_val: 0.0,
        };
        xp.update();
        xp
    }
}

impl NXX1Params {
    /// Recompute derived values; call after changing any parameter.
    pub fn update(&mut self) {
        self.sig_gain_n_var = self.sig_gain / self.n_var;
        self.sig_mult_eff = self.sig_mult * pow32(self.gain * self.n_var, self.sig_mult_pow);
        self.sig_val_at_0 = 0.5 * self.sig_mult_eff;
        self.interp_val = self.xx1_gain_cor(self.interp_range) - self.sig_val_at_0;
    }

    #[inline]
    pub fn xx1(&self, x: f32) -> f32 {
        x / (x + 1.0)
    }

    /// XX1 with the gain reduced near threshold to compensate for the convolution.
    #[inline]
    pub fn xx1_gain_cor(&self, x: f32) -> f32 {
        let gain_cor_fact = (self.gain_cor_range - (x / self.n_var)) / self.gain_cor_range;
        if gain_cor_fact < 0.0 {
            return self.xx1(self.gain * x);
        }
        let new_gain = self.gain * (1.0 - self.gain_cor * gain_cor_fact);
        self.xx1(new_gain * x)
    }

    /// Noisy XX1 of `x` = (net input - threshold).
    #[inline]
    pub fn noisy_xx1(&self, x: f32) -> f32 {
        if x < 0.0 {
            self.sig_mult_eff / (1.0 + exp32(-(x * self.sig_gain_n_var)))
        } else if x < self.interp_range {
            let interp = 1.0 - ((self.interp_range - x) / self.interp_range);
            self.sig_val_at_0 + interp * self.interp_val
        } else {
            self.xx1_gain_cor(x)
        }
    }
}

// Transcendentals go through f64 so the rounding is platform independent.
#[inline]
pub(crate) fn exp32(x: f32) -> f32 {
    (x as f64).exp() as f32
}

#[inline]
pub(crate) fn pow32(x: f32, y: f32) -> f32 {
    (x as f64).powf(y as f64) as f32
}
