// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Layer-level inhibition parameters: FFFB for the layer and its sub-pools,
//! neuron self-inhibition, and running-average activity estimates.

use super::fffb::FFFBParams;

/// Neuron self-inhibition: a unit's own activation feeds back into its Gi.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct SelfInhibParams {
    pub on: bool,
    pub gi: f32,
    pub tau: f32,
    pub dt: f32,
}

impl Default for SelfInhibParams {
    fn default() -> Self {
        let mut si = Self {
            on: false,
            gi: 0.4,
            tau: 1.4,
            dt: 0.0,
        };
        si.update();
        si
    }
}

impl SelfInhibParams {
    pub fn update(&mut self) {
        self.dt = 1.0 / self.tau;
    }

    #[inline]
    pub fn inhib(&self, gi_self: &mut f32, act: f32) {
        if self.on {
            *gi_self += self.dt * (self.gi * act - *gi_self);
        } else {
            *gi_self = 0.0;
        }
    }
}

/// Expected and running-average activity of a layer, used to scale inputs.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct ActAvgParams {
    /// Initial estimate of average activity
    pub init: f32,
    /// Use `init` as a constant instead of the running average
    pub fixed: bool,
    /// Replace `init` with the first measured value
    pub use_first: bool,
    /// Integration time constant, in trials
    pub tau: f32,
    /// Multiplier from running average to the effective value
    pub adjust: f32,
    pub dt: f32,
}

impl Default for ActAvgParams {
    fn default() -> Self {
        let mut aa = Self {
            init: 0.15,
            fixed: false,
            use_first: true,
            tau: 100.0,
            adjust: 1.0,
            dt: 0.0,
        };
        aa.update();
        aa
    }
}

impl ActAvgParams {
    pub fn update(&mut self) {
        self.dt = 1.0 / self.tau;
    }

    /// Initial value of `act_p_avg_eff`.
    pub fn eff_init(&self) -> f32 {
        if self.fixed {
            self.init
        } else {
            self.adjust * self.init
        }
    }

    /// Update a running average from the current activity. Zero activity is ignored.
    pub fn avg_from_act(&self, avg: &mut f32, act: f32) {
        if act == 0.0 {
            return;
        }
        if self.use_first && *avg == self.init {
            *avg += 0.5 * (act - *avg);
        } else {
            *avg += self.dt * (act - *avg);
        }
    }

    pub fn eff_from_avg(&self, eff: &mut f32, avg: f32) {
        if self.fixed {
            *eff = self.init;
        } else {
            *eff = self.adjust * avg;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct InhibParams {
    pub layer: FFFBParams,
    /// Sub-pool inhibition (4D layers); off by default
    pub pool: FFFBParams,
    pub self_inhib: SelfInhibParams,
    pub act_avg: ActAvgParams,
}

impl Default for InhibParams {
    fn default() -> Self {
        Self {
            layer: FFFBParams::default(),
            pool: FFFBParams {
                on: false,
                ..Default::default()
            },
            self_inhib: SelfInhibParams::default(),
            act_avg: ActAvgParams::default(),
        }
    }
}

impl InhibParams {
    pub fn update(&mut self) {
        self.layer.update();
        self.pool.update();
        self.self_inhib.update();
        self.act_avg.update();
    }
}
