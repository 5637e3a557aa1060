// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Dorsal striatum Matrix layers and their learning rules
//!
//! Go (D1R) and NoGo (D2R) Matrix layers learn through an eligibility trace
//! that is formed on every learning step and converted into a weight change
//! only when dopamine arrives:
//!
//! ```text
//! dwt   = da_lrn * tr                      (if da != 0; x gate_no_go_pos_lr for NoGo, da > 0, tr < 0)
//! ntr   = lrn_factor(ru_act) * su_act      (negated and x not_gated_lr when the stripe did not gate)
//! tr   += ntr - min(1, decay * |ntr|) * tr
//! ```

use crate::layer::{Layer, LayerKind};
use crate::path::Path;
use deepleabra_npu_neural::Quarters;
use deepleabra_npu_plasticity::DaReceptors;

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct MatrixParams {
    /// Quarters when learning takes place, matching the PFC gate quarters
    pub learn_qtr: Quarters,
    /// DA multiplier for shunted units: 0 full shunting, 1 none
    pub patch_shunt: f32,
    /// Also shunt ACh
    pub shunt_ach: bool,
    /// Extra inhibition on Out pools from lack of ACh: `gi += out_ach_inhib * (1 - ach)`
    pub out_ach_inhib: f32,
    /// Gain on positive DA for learning
    pub burst_gain: f32,
    /// Gain on negative DA for learning
    pub dip_gain: f32,
}

impl Default for MatrixParams {
    fn default() -> Self {
        Self {
            learn_qtr: Quarters::Q2 | Quarters::Q4,
            patch_shunt: 0.2,
            shunt_ach: true,
            out_ach_inhib: 0.3,
            burst_gain: 1.0,
            dip_gain: 1.0,
        }
    }
}

impl Layer {
    pub(crate) fn matrix_defaults(&mut self) {
        self.pbwm.gate.gate_type = super::GateType::MaintOut;
        self.inhib.layer.gi = 1.9;
        self.inhib.layer.fb = 0.5;
        self.inhib.pool.on = true;
        self.inhib.pool.gi = 1.9;
        self.inhib.pool.fb = 0.0;
        self.inhib.self_inhib.on = true;
        self.inhib.self_inhib.gi = 0.3;
        self.inhib.act_avg.fixed = true;
        self.inhib.act_avg.init = 0.2;
    }

    /// Learning DA from raw DA: burst / dip gains, then sign reversal for D2R.
    pub fn da_lrn_from_da(&self, da: f32) -> f32 {
        let mp = &self.pbwm.matrix;
        let da = if da > 0.0 { da * mp.burst_gain } else { da * mp.dip_gain };
        match self.pbwm.gate.da_r {
            DaReceptors::D2R => -da,
            DaReceptors::D1R => da,
        }
    }

    /// Bias Out-gating pools against gating when ACh is low.
    pub(crate) fn matrix_out_ach_inhib(&mut self) {
        let mp = self.pbwm.matrix;
        if mp.out_ach_inhib == 0.0 || !self.is_4d() {
            return;
        }
        let (_, pxn) = self.shape.pool_dims();
        let maint_n = self.pbwm.gate.maint_n;
        let lay_ach = self.neuro_mod.ach;
        for pi in 0..self.shape.n_pools() {
            if pi % pxn < maint_n {
                continue;
            }
            let rng = self.pools[pi + 1].range();
            for nrn in self.neurons[rng].iter_mut().filter(|n| !n.is_off()) {
                let ach = if mp.shunt_ach && nrn.shunt > 0.0 {
                    lay_ach * mp.patch_shunt
                } else {
                    lay_ach
                };
                nrn.gi += mp.out_ach_inhib * (1.0 - ach);
            }
        }
    }

    /// Per-unit learning DA, shunted for units receiving patch input.
    pub(crate) fn da_ach_from_lay(&mut self) {
        let lay_da = self.neuro_mod.da;
        let shunt = self.pbwm.matrix.patch_shunt;
        let vals: Vec<f32> = self
            .neurons
            .iter()
            .map(|nrn| {
                let da = if nrn.shunt > 0.0 { lay_da * shunt } else { lay_da };
                self.da_lrn_from_da(da)
            })
            .collect();
        for (nrn, da_lrn) in self.neurons.iter_mut().zip(vals) {
            if !nrn.is_off() {
                nrn.da_lrn = da_lrn;
            }
        }
    }
}

impl Path {
    pub(crate) fn matrix_defaults(&mut self) {
        self.learn.wt_sig.gain = 1.0;
        self.learn.norm.on = false;
        self.learn.momentum.on = false;
        self.learn.wt_bal.on = false;
    }

    pub fn clear_trace(&mut self) {
        for sy in &mut self.syns {
            sy.ntr = 0.0;
            sy.tr = 0.0;
        }
    }

    /// Dopamine-gated trace learning into a Matrix layer.
    pub fn dwt_matrix(&mut self, send: &Layer, recv: &Layer) {
        if !self.learn.learn {
            return;
        }
        let d2r = recv.pbwm.gate.da_r == DaReceptors::D2R;
        let da = recv.neuro_mod.da;
        let ach_dk = (recv.neuro_mod.ach * self.trace.ach_decay).min(1.0);
        let tp = self.trace;
        for (si, sn) in send.neurons.iter().enumerate() {
            let rng = self.send_range(si);
            for ci in rng.clone() {
                let ri = self.s_con_idx[ci];
                let rn = &recv.neurons[ri];
                let gate_act = recv.neuron_gate_state(ri).map_or(0.0, |g| g.act);
                let mut tr = self.syns[ci].tr;

                let mut dwt = 0.0;
                if da != 0.0 {
                    dwt = rn.da_lrn * tr;
                    if d2r && da > 0.0 && tr < 0.0 {
                        dwt *= tp.gate_no_go_pos_lr;
                    }
                }
                tr -= ach_dk * tr;

                let ntr = tp.new_trace(gate_act > 0.0, rn.act, sn.act);
                tr = tp.update_trace(tr, ntr);
                let sy = &mut self.syns[ci];
                sy.tr = tr;
                sy.ntr = ntr;
                if !self.learn.norm.on {
                    // shown in place of norm and moment
                    sy.norm = ntr;
                    sy.moment = tr;
                }
                self.apply_raw_dwt(ci, dwt);
            }
            self.max_norm(rng);
        }
    }

    /// Three-factor Hebbian rule: `da * ru_act * su_act`, no trace.
    pub fn dwt_da_hebb(&mut self, send: &Layer, recv: &Layer) {
        if !self.learn.learn {
            return;
        }
        let matrix = recv.kind == LayerKind::Matrix;
        for (si, sn) in send.neurons.iter().enumerate() {
            let rng = self.send_range(si);
            for ci in rng.clone() {
                let rn = &recv.neurons[self.s_con_idx[ci]];
                let da = if matrix { rn.da_lrn } else { recv.neuro_mod.da };
                self.apply_raw_dwt(ci, da * rn.act * sn.act);
            }
            self.max_norm(rng);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::LayerIndex;
    use crate::path::PathKind;
    use crate::pattern::Pattern;
    use deepleabra_npu_neural::LayerShape;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn go_nogo(da_r: DaReceptors) -> Layer {
        let mut ly = Layer::new("Matrix", LayerShape::new_4d(1, 2, 1, 1), LayerKind::Matrix);
        ly.pbwm.gate.da_r = da_r;
        ly.pbwm.gate.maint_n = 1;
        ly
    }

    #[test]
    fn test_da_lrn_reverses_for_d2r() {
        let mut go = go_nogo(DaReceptors::D1R);
        go.pbwm.matrix.burst_gain = 2.0;
        assert_eq!(go.da_lrn_from_da(0.5), 1.0);
        assert_eq!(go.da_lrn_from_da(-0.5), -0.5);
        let nogo = go_nogo(DaReceptors::D2R);
        assert_eq!(nogo.da_lrn_from_da(0.5), -0.5);
    }

    #[test]
    fn test_out_ach_inhib_only_out_pools() {
        let mut ly = go_nogo(DaReceptors::D1R);
        ly.neuro_mod.ach = 0.0;
        ly.matrix_out_ach_inhib();
        assert_eq!(ly.neurons[0].gi, 0.0);
        assert!((ly.neurons[1].gi - 0.3).abs() < 1e-7);

        ly.neurons[1].gi = 0.0;
        ly.neurons[1].shunt = 1.0;
        ly.neuro_mod.ach = 1.0;
        ly.matrix_out_ach_inhib();
        assert!((ly.neurons[1].gi - 0.3 * 0.8).abs() < 1e-7);
    }

    #[test]
    fn test_patch_shunts_da() {
        let mut ly = go_nogo(DaReceptors::D1R);
        ly.neuro_mod.da = 1.0;
        ly.neurons[1].shunt = 1.0;
        ly.da_ach_from_lay();
        assert_eq!(ly.neurons[0].da_lrn, 1.0);
        assert!((ly.neurons[1].da_lrn - 0.2).abs() < 1e-7);
    }

    fn trace_path(recv: &Layer) -> Path {
        let send_shape = LayerShape::new_2d(1, 1);
        let mut pt = Path::new("InToMatrix", LayerIndex(0), LayerIndex(1), Pattern::Full, PathKind::MatrixTrace);
        pt.build("In", &send_shape, &recv.name, &recv.shape).unwrap();
        pt.init_weights(&mut StdRng::seed_from_u64(2));
        pt
    }

    #[test]
    fn test_trace_sign_follows_gating() {
        let mut recv = go_nogo(DaReceptors::D1R);
        recv.neurons[0].act = 0.5;
        recv.neurons[1].act = 0.5;
        recv.pools[1].gate.act = 0.6;
        let mut send = Layer::new("In", LayerShape::new_2d(1, 1), LayerKind::Input);
        send.neurons[0].act = 1.0;
        let mut pt = trace_path(&recv);
        assert!(!pt.learn.momentum.on);

        pt.dwt_matrix(&send, &recv);
        let gated = pt.syns[pt.syn_index(0, 0).unwrap()];
        let not_gated = pt.syns[pt.syn_index(0, 1).unwrap()];
        assert!((gated.ntr - 0.5).abs() < 1e-7);
        assert!((not_gated.ntr + 0.35).abs() < 1e-7);
        // no DA, no weight change
        assert_eq!(gated.dwt, 0.0);
        assert_eq!(gated.moment, gated.tr);
    }

    #[test]
    fn test_nogo_positive_da_damped() {
        let mut recv = go_nogo(DaReceptors::D2R);
        recv.neuro_mod.da = 1.0;
        recv.da_ach_from_lay();
        let send = Layer::new("In", LayerShape::new_2d(1, 1), LayerKind::Input);
        let mut pt = trace_path(&recv);
        for sy in &mut pt.syns {
            sy.tr = -1.0;
        }
        pt.dwt_matrix(&send, &recv);
        let sy = pt.syns[0];
        // da_lrn -1, tr -1, damped by 0.1, times lrate
        assert!((sy.dwt - pt.learn.lrate * 0.1).abs() < 1e-7);
    }
}
