// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Running averages of neuron activity used by XCAL learning.
//!
//! ## Timescales
//! - `avg_ss` super-short, integrated every cycle from `act_lrn`
//! - `avg_s` short, integrated from `avg_ss` (plus-phase weighted)
//! - `avg_m` medium, integrated from `avg_s` (minus-phase weighted)
//! - `avg_l` long, integrated once per alpha cycle from `avg_m`; the BCM threshold

use deepleabra_npu_neural::Neuron;

/// Cycle-level running averages of activity.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct LrnActAvgParams {
    pub ss_tau: f32,
    pub s_tau: f32,
    pub m_tau: f32,
    /// Proportion of the medium average mixed into `avg_s_lrn`
    pub lrn_m: f32,
    /// Initial value for the short and medium averages
    pub init: f32,

    // derived
    pub ss_dt: f32,
    pub s_dt: f32,
    pub m_dt: f32,
    pub lrn_s: f32,
}

impl Default for LrnActAvgParams {
    fn default() -> Self {
        let mut aa = Self {
            ss_tau: 2.0,
            s_tau: 2.0,
            m_tau: 10.0,
            lrn_m: 0.1,
            init: 0.15,
            ss_dt: 0.0,
            s_dt: 0.0,
            m_dt: 0.0,
            lrn_s: 0.0,
        };
        aa.update();
        aa
    }
}

impl LrnActAvgParams {
    pub fn update(&mut self) {
        self.ss_dt = 1.0 / self.ss_tau;
        self.s_dt = 1.0 / self.s_tau;
        self.m_dt = 1.0 / self.m_tau;
        self.lrn_s = 1.0 - self.lrn_m;
    }

    /// Cascade the activation through the ss / s / m averages.
    #[inline]
    pub fn avgs_from_act(
        &self,
        ru_act: f32,
        avg_ss: &mut f32,
        avg_s: &mut f32,
        avg_m: &mut f32,
        avg_s_lrn: &mut f32,
    ) {
        *avg_ss += self.ss_dt * (ru_act - *avg_ss);
        *avg_s += self.s_dt * (*avg_ss - *avg_s);
        *avg_m += self.m_dt * (*avg_s - *avg_m);
        *avg_s_lrn = self.lrn_s * *avg_s + self.lrn_m * *avg_m;
    }
}

/// Long-term average activity, the floating BCM threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct AvgLParams {
    pub init: f32,
    /// Multiplier on `avg_m` driving `avg_l`
    pub gain: f32,
    /// Floor on `avg_l`
    pub min: f32,
    pub tau: f32,
    /// BCM learning rate at the maximum `avg_l`
    pub lrn_max: f32,
    /// BCM learning rate at the minimum `avg_l`
    pub lrn_min: f32,
    /// Scale `avg_l_lrn` by the layer's error level (cosine difference)
    pub err_mod: bool,
    pub mod_min: f32,

    // derived
    pub dt: f32,
    pub lrn_fact: f32,
}

impl Default for AvgLParams {
    fn default() -> Self {
        let mut al = Self {
            init: 0.4,
            gain: 2.5,
            min: 0.2,
            tau: 10.0,
            lrn_max: 0.5,
            lrn_min: 0.0001,
            err_mod: true,
            mod_min: 0.01,
            dt: 0.0,
            lrn_fact: 0.0,
        };
        al.update();
        al
    }
}

impl AvgLParams {
    pub fn update(&mut self) {
        self.dt = 1.0 / self.tau;
        self.lrn_fact = (self.lrn_max - self.lrn_min) / (self.gain - self.min);
    }

    /// Integrate `avg_l` from `avg_m` and derive the BCM learning rate.
    #[inline]
    pub fn avg_l_from_avg_m(&self, avg_m: f32, avg_l: &mut f32, lrn: &mut f32) {
        *avg_l += self.dt * (self.gain * avg_m - *avg_l);
        if *avg_l < self.min {
            *avg_l = self.min;
        }
        *lrn = self.lrn_fact * (*avg_l - self.min);
    }

    /// Error-based modulation factor from the layer's cosine-difference learning signal.
    #[inline]
    pub fn err_mod_from_lay_err(&self, lay_cos_diff_avg: f32) -> f32 {
        if !self.err_mod {
            return 1.0;
        }
        lay_cos_diff_avg.max(self.mod_min)
    }
}

/// Running average of the layer-level cosine difference between minus and plus phases.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct CosDiffParams {
    pub tau: f32,

    // derived
    pub dt: f32,
    pub dt_c: f32,
}

impl Default for CosDiffParams {
    fn default() -> Self {
        let mut cd = Self {
            tau: 100.0,
            dt: 0.0,
            dt_c: 0.0,
        };
        cd.update();
        cd
    }
}

impl CosDiffParams {
    pub fn update(&mut self) {
        self.dt = 1.0 / self.tau;
        self.dt_c = 1.0 - self.dt;
    }

    /// Update the running average and variance from a new cosine value.
    /// The first call (avg == 0) initializes the average directly.
    pub fn avg_var_from_cos(&self, avg: &mut f32, var: &mut f32, cos: f32) {
        if *avg == 0.0 {
            *avg = cos;
            *var = 0.0;
        } else {
            let del = cos - *avg;
            let incr = self.dt * del;
            *avg += incr;
            if *var == 0.0 {
                *var = 2.0 * self.dt_c * del * incr;
            } else {
                *var = self.dt_c * (*var + del * incr);
            }
        }
    }
}

/// Layer-level cosine difference statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct CosDiffStats {
    /// Cosine between zero-mean ActM and ActP of the last alpha cycle
    pub cos: f32,
    pub avg: f32,
    pub var: f32,
    /// `1 - avg` for hidden layers, 0 for clamped layers
    pub avg_lrn: f32,
    /// Error modulation applied to `avg_l_lrn`
    pub mod_avg_l_lrn: f32,
}

impl CosDiffStats {
    pub fn init(&mut self) {
        *self = Self::default();
    }
}

/// Neuron-level learning parameters.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct LearnNeurParams {
    pub act_avg: LrnActAvgParams,
    pub avg_l: AvgLParams,
    pub cos_diff: CosDiffParams,
}

impl LearnNeurParams {
    pub fn update(&mut self) {
        self.act_avg.update();
        self.avg_l.update();
        self.cos_diff.update();
    }

    pub fn init_act_avg(&self, nrn: &mut Neuron) {
        nrn.avg_ss = self.act_avg.init;
        nrn.avg_s = self.act_avg.init;
        nrn.avg_m = self.act_avg.init;
        nrn.avg_l = self.avg_l.init;
        nrn.avg_s_lrn = 0.0;
        nrn.act_avg = self.act_avg.init;
    }

    /// Per-cycle update of the short / medium averages from `act_lrn`.
    #[inline]
    pub fn avgs_from_act(&self, nrn: &mut Neuron) {
        self.act_avg.avgs_from_act(
            nrn.act_lrn,
            &mut nrn.avg_ss,
            &mut nrn.avg_s,
            &mut nrn.avg_m,
            &mut nrn.avg_s_lrn,
        );
    }

    /// Per-alpha-cycle update of `avg_l` and `avg_l_lrn`.
    #[inline]
    pub fn avg_l_from_avg_m(&self, nrn: &mut Neuron) {
        self.avg_l
            .avg_l_from_avg_m(nrn.avg_m, &mut nrn.avg_l, &mut nrn.avg_l_lrn);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_avgs_cascade_toward_act() {
        let ln = LearnNeurParams::default();
        let mut nrn = Neuron::default();
        ln.init_act_avg(&mut nrn);
        nrn.act_lrn = 1.0;
        for _ in 0..200 {
            ln.avgs_from_act(&mut nrn);
        }
        assert!(nrn.avg_ss > 0.99);
        assert!(nrn.avg_s > 0.99);
        assert!(nrn.avg_m > 0.99);
        assert!((nrn.avg_s_lrn - (0.9 * nrn.avg_s + 0.1 * nrn.avg_m)).abs() < 1e-6);
    }

    #[test]
    fn test_avg_l_floor_and_lrn() {
        let al = AvgLParams::default();
        let mut avg_l = 0.2;
        let mut lrn = 1.0;
        al.avg_l_from_avg_m(0.0, &mut avg_l, &mut lrn);
        assert_eq!(avg_l, al.min);
        assert_eq!(lrn, 0.0);

        let mut avg_l = 0.4;
        al.avg_l_from_avg_m(0.5, &mut avg_l, &mut lrn);
        // 0.4 + 0.1 * (1.25 - 0.4)
        assert!((avg_l - 0.485).abs() < 1e-6);
        assert!((lrn - al.lrn_fact * (0.485 - 0.2)).abs() < 1e-6);
    }

    #[test]
    fn test_err_mod() {
        let mut al = AvgLParams::default();
        assert_eq!(al.err_mod_from_lay_err(0.001), 0.01);
        assert_eq!(al.err_mod_from_lay_err(0.3), 0.3);
        al.err_mod = false;
        assert_eq!(al.err_mod_from_lay_err(0.3), 1.0);
    }

    #[test]
    fn test_cos_diff_first_value_sets_avg() {
        let cd = CosDiffParams::default();
        let mut avg = 0.0;
        let mut var = 0.0;
        cd.avg_var_from_cos(&mut avg, &mut var, 0.6);
        assert_eq!(avg, 0.6);
        assert_eq!(var, 0.0);
        cd.avg_var_from_cos(&mut avg, &mut var, 0.8);
        assert!((avg - 0.602).abs() < 1e-6);
        assert!(var > 0.0);
    }
}
