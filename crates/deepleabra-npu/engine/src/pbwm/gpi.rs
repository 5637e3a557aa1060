// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! GPiThal: combines Go and NoGo drive and decides gating once per gating quarter.

use crate::layer::Layer;
use crate::path::Path;
use deepleabra_npu_neural::{Context, Quarters};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct GPiGateParams {
    /// Quarters in which gating is evaluated, one before the PFC gate quarters
    pub gate_qtr: Quarters,
    /// Cycle within the quarter on which gating is evaluated
    pub cycle: usize,
    /// Extra Ge gain compensating for the subtracted NoGo input
    pub ge_gain: f32,
    /// Weight of NoGo relative to Go
    pub no_go: f32,
    /// Activation threshold for a pool to count as gated
    pub thr: f32,
    /// Zero the gate activation below threshold
    pub thr_act: bool,
}

impl Default for GPiGateParams {
    fn default() -> Self {
        Self {
            gate_qtr: Quarters::Q1 | Quarters::Q3,
            cycle: 18,
            ge_gain: 3.0,
            no_go: 1.0,
            thr: 0.2,
            thr_act: true,
        }
    }
}

impl GPiGateParams {
    /// `(ge_gain + no_go) * (go - no_go * nogo)`
    #[inline]
    pub fn ge_raw(&self, go_raw: f32, nogo_raw: f32) -> f32 {
        (self.ge_gain + self.no_go) * (go_raw - self.no_go * nogo_raw)
    }
}

impl Layer {
    pub(crate) fn gpi_thal_defaults(&mut self) {
        self.pbwm.gate.gate_type = super::GateType::MaintOut;
        self.inhib.layer.gi = 1.8;
        self.inhib.layer.fb = 0.2;
        self.inhib.pool.on = false;
        self.inhib.act_avg.fixed = true;
        self.inhib.act_avg.init = 1.0;
    }

    /// Raw Ge from the separately accumulated Go and NoGo pathway conductances.
    pub(crate) fn gpi_g_from_inc(&mut self, paths: &[Path]) {
        let (Some(go), Some(nogo)) = (self.links.go_path, self.links.nogo_path) else {
            return;
        };
        let go = &paths[go.0].ge_raw;
        let nogo = &paths[nogo.0].ge_raw;
        let gp = self.pbwm.gpi;
        for (ni, nrn) in self.neurons.iter_mut().enumerate() {
            if nrn.is_off() {
                continue;
            }
            nrn.ge_raw = gp.ge_raw(go[ni], nogo[ni]);
            self.act.ge_from_raw(nrn, nrn.ge_raw);
            self.act.gi_from_raw(nrn, nrn.gi_raw);
        }
    }

    /// Update each sub-pool's gate state. `now` is set only on the evaluation
    /// cycle of a gating quarter. The pool's most active unit decides.
    pub(crate) fn gpi_gate_from_act(&mut self, ctx: &Context) {
        let gp = self.pbwm.gpi;
        let qtr_cyc = ctx.quarter_cycle();
        let gating = gp.gate_qtr.has(ctx.quarter) && qtr_cyc == gp.cycle;
        let trial_start = ctx.quarter == 0 && qtr_cyc == 0;
        for pi in 1..self.pools.len() {
            let rng = self.pools[pi].range();
            let act = self.neurons[rng]
                .iter()
                .filter(|n| !n.is_off())
                .fold(None, |mx: Option<f32>, n| Some(mx.map_or(n.act, |m| m.max(n.act))));
            let Some(act) = act else {
                continue;
            };
            let gs = &mut self.pools[pi].gate;
            if trial_start {
                gs.act = 0.0;
            }
            if !gating {
                gs.now = false;
                continue;
            }
            gs.now = true;
            if act < gp.thr {
                gs.act = 0.0;
                if gs.cnt >= 0 {
                    gs.cnt += 1;
                } else {
                    gs.cnt -= 1;
                }
            } else {
                gs.cnt = 0;
                gs.act = act;
                debug!(
                    target: "deepleabra_npu_engine",
                    "[GATE] {} pool {} gated, act {:.3}", self.name, pi - 1, act
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::LayerKind;
    use deepleabra_npu_neural::LayerShape;

    fn gating_ctx(quarter: usize, qcyc: usize) -> Context {
        let mut ctx = Context::new(25, 0.001);
        ctx.quarter = quarter;
        ctx.cycle = quarter * 25 + qcyc;
        ctx
    }

    #[test]
    fn test_ge_raw_subtracts_nogo() {
        let gp = GPiGateParams::default();
        assert!((gp.ge_raw(0.5, 0.2) - 1.2).abs() < 1e-6);
        assert!(gp.ge_raw(0.2, 0.5) < 0.0);
    }

    #[test]
    fn test_gate_counter_state_machine() {
        let mut ly = Layer::new("GPiThal", LayerShape::new_4d(1, 2, 1, 1), LayerKind::GPiThal);
        ly.neurons[0].act = 0.5;
        ly.neurons[1].act = 0.1;

        // not the evaluation cycle
        ly.gpi_gate_from_act(&gating_ctx(0, 5));
        assert!(!ly.pools[1].gate.now);
        assert_eq!(ly.pools[1].gate.cnt, -1);

        ly.gpi_gate_from_act(&gating_ctx(0, 18));
        assert!(ly.pools[1].gate.now);
        assert_eq!(ly.pools[1].gate.cnt, 0);
        assert_eq!(ly.pools[1].gate.act, 0.5);
        assert!(ly.pools[2].gate.now);
        assert_eq!(ly.pools[2].gate.cnt, -2);
        assert_eq!(ly.pools[2].gate.act, 0.0);

        // now is a one-cycle pulse
        ly.gpi_gate_from_act(&gating_ctx(0, 19));
        assert!(!ly.pools[1].gate.now);

        // Q2 is not a gating quarter
        ly.gpi_gate_from_act(&gating_ctx(1, 18));
        assert!(!ly.pools[1].gate.now);

        ly.neurons[0].act = 0.05;
        ly.gpi_gate_from_act(&gating_ctx(2, 18));
        assert_eq!(ly.pools[1].gate.cnt, 1);
        assert_eq!(ly.pools[2].gate.cnt, -3);
    }

    #[test]
    fn test_gpi_defaults() {
        let ly = Layer::new("GPiThal", LayerShape::new_4d(1, 2, 1, 1), LayerKind::GPiThal);
        assert_eq!(ly.inhib.layer.gi, 1.8);
        assert!(!ly.inhib.pool.on);
        assert!(ly.inhib.act_avg.fixed);
    }
}
