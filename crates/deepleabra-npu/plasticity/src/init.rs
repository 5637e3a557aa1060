// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Initial weight distribution and input scaling.

use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum WtInitDist {
    /// `mean + var * 2 * (u - 0.5)`, u uniform in [0, 1)
    Uniform,
    /// Always `mean`
    Mean,
}

/// Initial weight distribution of a pathway.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct WtInitParams {
    pub dist: WtInitDist,
    pub mean: f32,
    pub var: f32,
    /// Make weights symmetric with the reciprocal pathway, if any
    pub sym: bool,
}

impl Default for WtInitParams {
    fn default() -> Self {
        Self {
            dist: WtInitDist::Uniform,
            mean: 0.5,
            var: 0.25,
            sym: true,
        }
    }
}

impl WtInitParams {
    /// Draw one weight, clipped to the normalized range [0, 1].
    pub fn gen<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        let wt = match self.dist {
            WtInitDist::Mean => self.mean as f64,
            WtInitDist::Uniform => {
                let u: f64 = rng.gen();
                self.mean as f64 + self.var as f64 * 2.0 * (u - 0.5)
            }
        } as f32;
        wt.clamp(0.0, 1.0)
    }
}

/// Absolute and relative scaling of a pathway's synaptic input.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct WtScaleParams {
    /// Absolute multiplier, not normalized across pathways
    pub abs: f32,
    /// Relative scale, normalized by the sum over all pathways into the layer
    pub rel: f32,
}

impl Default for WtScaleParams {
    fn default() -> Self {
        Self { abs: 1.0, rel: 1.0 }
    }
}

impl WtScaleParams {
    /// Scaling factor from the sending layer's expected activity.
    ///
    /// `savg` is the sending layer's average activity, `snu` its unit count and
    /// `ncon` the average number of connections per receiver.
    pub fn slay_act_scale(&self, savg: f32, snu: f32, ncon: f32) -> f32 {
        const SEM_EXTRA: i32 = 2;
        let ncon = ncon.max(1.0);
        let slay_act_n = ((savg * snu).round() as i32).max(1);
        if ncon == snu {
            return 1.0 / slay_act_n as f32;
        }
        let r_max_act_n = ncon.min(slay_act_n as f32) as i32;
        let r_avg_act_n = ((savg * ncon).round() as i32).max(1);
        let r_exp_act_n = (r_avg_act_n + SEM_EXTRA).min(r_max_act_n);
        1.0 / r_exp_act_n as f32
    }

    /// `abs * rel * slay_act_scale(..)`
    pub fn full_scale(&self, savg: f32, snu: f32, ncon: f32) -> f32 {
        self.abs * self.rel * self.slay_act_scale(savg, snu, ncon)
    }
}
