// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # PFC deep layers
//!
//! A PFC stripe is a superficial layer `<name>` paired with a deep layer
//! `<name>D`. Gating signals from GPiThal set the deep pools' gate state;
//! one quarter later the deep layer copies its super activity into `maint`
//! and holds it as extra excitatory drive until the stripe is cleared.
//!
//! Gate counter per pool:
//!
//! ```text
//!  -1, -2, ...   not maintaining (counts down each gate quarter)
//!   0            just gated
//!   1, 2, ...    maintaining (counts up each gate quarter, cleared at max_maint)
//! ```

use super::GateType;
use crate::layer::{Layer, LayerKind};
use deepleabra_npu_neural::{Context, Quarters};

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct PFCGateParams {
    /// Quarters in which gating updates deep maintenance, one after the GPiThal gate quarters
    pub gate_qtr: Quarters,
    /// Output gating layer: activation is transient, only while gated
    pub out_gate: bool,
    /// Output gating evaluated in the first quarter only
    pub out_q1_only: bool,
}

impl Default for PFCGateParams {
    fn default() -> Self {
        Self {
            gate_qtr: Quarters::Q2 | Quarters::Q4,
            out_gate: false,
            out_q1_only: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct PFCMaintParams {
    /// Scale maintenance by the `PFCDyns` time course of each unit row
    pub use_dyn: bool,
    pub maint_gain: f32,
    /// Output gating clears the corresponding maintenance pool
    pub out_clear_maint: bool,
    /// Decay applied to super activations when a stripe is cleared
    pub clear: f32,
    /// Gate counts after which maintenance is dropped
    pub max_maint: i32,
}

impl Default for PFCMaintParams {
    fn default() -> Self {
        Self {
            use_dyn: false,
            maint_gain: 0.8,
            out_clear_maint: false,
            clear: 0.0,
            max_maint: 100,
        }
    }
}

/// Side effect of a gating event on another layer, applied by the network.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum PfcClear {
    /// Decay pool `pool` (1-based) of this stripe's super layer
    Super { pool: usize, decay: f32 },
    /// Clear established maintenance in pool `pool` of the paired maint layer
    Maint { pool: usize },
}

impl Layer {
    pub(crate) fn pfc_deep_defaults(&mut self) {
        let pg = &mut self.pbwm.pfc_gate;
        if pg.out_gate && pg.out_q1_only {
            self.pbwm.pfc_maint.max_maint = 1;
            pg.gate_qtr = Quarters::Q1;
        }
        self.pbwm.pfc_maint.use_dyn = !self.pbwm.pfc_dyns.is_empty();
        self.pbwm.gate.gate_type = if pg.out_gate { GateType::Out } else { GateType::Maint };
    }

    /// Name of the super layer of a PFC deep layer: the name without its trailing `D`.
    pub fn pfc_super_name(&self) -> Option<&str> {
        if self.kind != LayerKind::PFCDeep {
            return None;
        }
        self.name.strip_suffix('D')
    }

    /// Name of the maintenance deep layer an output deep layer clears: `...outD` -> `...mntD`.
    pub fn pfc_maint_name(&self) -> Option<String> {
        if self.kind != LayerKind::PFCDeep || !self.pbwm.pfc_gate.out_gate {
            return None;
        }
        self.name
            .strip_suffix("outD")
            .map(|prefix| format!("{prefix}mntD"))
    }

    /// Excitatory input including maintenance drive.
    pub(crate) fn maint_g_inc(&mut self) {
        for nrn in self.neurons.iter_mut().filter(|n| !n.is_off()) {
            let ge_raw = nrn.ge_raw + nrn.maint_ge;
            self.act.ge_from_raw(nrn, ge_raw);
            self.act.gi_from_raw(nrn, nrn.gi_raw);
        }
    }

    /// Register gating events on this cycle. Returns the clears to apply to
    /// the super and maint layers.
    pub(crate) fn pfc_deep_gating(&mut self, ctx: &Context) -> Vec<PfcClear> {
        let pg = self.pbwm.pfc_gate;
        let mp = self.pbwm.pfc_maint;
        let mut clears = Vec::new();
        if pg.out_gate && pg.out_q1_only && ctx.quarter > 1 {
            return clears;
        }
        for (pi, pl) in self.pools.iter_mut().enumerate().skip(1) {
            let gs = &mut pl.gate;
            if !gs.now {
                continue;
            }
            if gs.act > 0.0 {
                gs.cnt = 0;
                if pg.out_gate {
                    if mp.out_clear_maint {
                        clears.push(PfcClear::Maint { pool: pi });
                    }
                } else {
                    clears.push(PfcClear::Super { pool: pi, decay: mp.clear });
                }
            }
            // over-long maintenance, unless just gated
            if gs.cnt >= mp.max_maint {
                gs.cnt = -1;
            }
        }
        clears
    }

    /// Drop established maintenance in `pool`; returns the super-layer decay to apply.
    pub(crate) fn clear_maint(&mut self, pool: usize) -> Option<f32> {
        let gs = &mut self.pools.get_mut(pool)?.gate;
        if gs.cnt >= 1 {
            gs.cnt = -1;
            return Some(self.pbwm.pfc_maint.clear);
        }
        None
    }

    /// Advance every pool's gate counter in a gate quarter.
    pub(crate) fn update_gate_cnt(&mut self, ctx: &Context) {
        if !self.pbwm.pfc_gate.gate_qtr.has(ctx.quarter) {
            return;
        }
        for pl in self.pools.iter_mut().skip(1) {
            if pl.gate.cnt < 0 {
                pl.gate.cnt -= 1;
            } else {
                pl.gate.cnt += 1;
            }
        }
    }

    /// Capture super activity into `maint` on first gating and set `maint_ge`.
    /// `super_acts` and `super_units` are the super layer's activations and
    /// per-pool unit dims; deep pools stack `PFCDyns` row groups along Y.
    pub(crate) fn deep_maint(&mut self, ctx: &Context, super_acts: &[f32], super_units: (usize, usize)) {
        if !self.pbwm.pfc_gate.gate_qtr.has(ctx.quarter) {
            return;
        }
        let (_, xn) = self.shape.unit_dims();
        let nn = self.shape.units_per_pool();
        let (syn, sxn) = super_units;
        let snn = syn * sxn;
        if nn == 0 || xn == 0 || syn == 0 {
            return;
        }
        let mp = self.pbwm.pfc_maint;
        for ni in 0..self.neurons.len() {
            if self.neurons[ni].is_off() {
                continue;
            }
            let ui = ni % nn;
            let pi = ni / nn;
            let uy = ui / xn;
            let ux = ui % xn;
            let cnt = self.pools[self.neurons[ni].sub_pool].gate.cnt;
            let nrn = &mut self.neurons[ni];
            if cnt < 0 {
                nrn.maint = 0.0;
                nrn.maint_ge = 0.0;
            } else if cnt <= 1 {
                let si = pi * snn + (uy % syn) * sxn + ux;
                nrn.maint = mp.maint_gain * super_acts.get(si).copied().unwrap_or(0.0);
            }
            nrn.maint_ge = if mp.use_dyn {
                nrn.maint * self.pbwm.pfc_dyns.value(uy / syn, (cnt - 1) as f32)
            } else {
                nrn.maint
            };
        }
    }

    /// Pathways into this layer learn at the end of quarter 2 as well as at trial end.
    pub fn does_quarter2_dwt(&self) -> bool {
        match self.kind {
            LayerKind::PFCDeep => self.pbwm.pfc_gate.gate_qtr.has(1),
            LayerKind::Matrix => self.pbwm.matrix.learn_qtr.has(1),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pbwm::PFCDyns;
    use deepleabra_npu_neural::LayerShape;

    fn deep(name: &str, out: bool) -> Layer {
        let mut ly = Layer::new(name, LayerShape::new_4d(1, 2, 2, 2), LayerKind::PFCDeep);
        ly.pbwm.pfc_gate.out_gate = out;
        ly.pbwm.pfc_dyns = PFCDyns::maint_only();
        ly.defaults();
        ly
    }

    fn ctx_at(quarter: usize) -> Context {
        let mut ctx = Context::new(25, 0.001);
        ctx.quarter = quarter;
        ctx
    }

    #[test]
    fn test_out_gate_defaults() {
        let out = deep("PFCoutD", true);
        assert_eq!(out.pbwm.pfc_gate.gate_qtr, Quarters::Q1);
        assert_eq!(out.pbwm.pfc_maint.max_maint, 1);
        assert!(out.pbwm.pfc_maint.use_dyn);
        assert_eq!(out.gate_type(), GateType::Out);
        assert_eq!(out.pfc_super_name(), Some("PFCout"));
        assert_eq!(out.pfc_maint_name().as_deref(), Some("PFCmntD"));
        let mnt = deep("PFCmntD", false);
        assert_eq!(mnt.pfc_maint_name(), None);
        assert!(mnt.does_quarter2_dwt());
        assert!(!out.does_quarter2_dwt());
    }

    #[test]
    fn test_gating_resets_count_and_clears_super() {
        let mut ly = deep("PFCmntD", false);
        ly.pools[2].gate.now = true;
        ly.pools[2].gate.act = 0.5;
        ly.pools[1].gate.now = true;
        let clears = ly.pfc_deep_gating(&ctx_at(0));
        assert_eq!(clears, vec![PfcClear::Super { pool: 2, decay: 0.0 }]);
        assert_eq!(ly.pools[2].gate.cnt, 0);
        assert_eq!(ly.pools[1].gate.cnt, -1);
    }

    #[test]
    fn test_maintenance_counts_and_expires() {
        let mut ly = deep("PFCmntD", false);
        ly.pbwm.pfc_maint.max_maint = 2;
        ly.pools[1].gate.cnt = 0;
        let q2 = ctx_at(1);
        ly.update_gate_cnt(&q2);
        assert_eq!(ly.pools[1].gate.cnt, 1);
        assert_eq!(ly.pools[2].gate.cnt, -2);
        ly.update_gate_cnt(&ctx_at(2));
        assert_eq!(ly.pools[1].gate.cnt, 1);
        ly.update_gate_cnt(&q2);
        ly.pools[1].gate.now = true;
        ly.pfc_deep_gating(&ctx_at(2));
        assert_eq!(ly.pools[1].gate.cnt, -1);
    }

    #[test]
    fn test_deep_maint_copies_super() {
        let mut ly = deep("PFCmntD", false);
        ly.pools[1].gate.cnt = 1;
        // super: 2 pools of 2x2
        let super_acts: Vec<f32> = (0..8).map(|i| i as f32 * 0.1).collect();
        ly.deep_maint(&ctx_at(1), &super_acts, (2, 2));
        assert!((ly.neurons[3].maint - 0.8 * 0.3).abs() < 1e-6);
        assert_eq!(ly.neurons[3].maint_ge, ly.neurons[3].maint);
        assert_eq!(ly.neurons[5].maint, 0.0);

        // outside the gate quarter nothing changes
        ly.pools[1].gate.cnt = -1;
        ly.deep_maint(&ctx_at(2), &super_acts, (2, 2));
        assert!(ly.neurons[3].maint > 0.0);
    }

    #[test]
    fn test_clear_maint_only_established() {
        let mut ly = deep("PFCmntD", false);
        ly.pbwm.pfc_maint.clear = 0.5;
        ly.pools[1].gate.cnt = 0;
        assert_eq!(ly.clear_maint(1), None);
        ly.pools[1].gate.cnt = 3;
        assert_eq!(ly.clear_maint(1), Some(0.5));
        assert_eq!(ly.pools[1].gate.cnt, -1);
        assert_eq!(ly.clear_maint(7), None);
    }
}
