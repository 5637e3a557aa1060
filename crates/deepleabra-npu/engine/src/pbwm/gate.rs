// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Gating geometry and gate-state propagation.

use crate::layer::{Layer, LayerKind};
use deepleabra_npu_neural::{GateState, Pool};
use deepleabra_npu_plasticity::DaReceptors;

/// Which gating pools a layer represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum GateType {
    /// Maintenance gating: toggles active maintenance in PFC
    Maint,
    /// Output gating: drives deep layer activation
    Out,
    /// Both, Maint pools first along X then Out
    #[default]
    MaintOut,
}

/// Outer pool geometry shared by all layers of one gating circuit.
///
/// ```text
///   x:   0 .. maint_x-1 | maint_x .. maint_x+out_x-1
///        Maint pools    | Out pools
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct GateShape {
    pub gate_type: GateType,
    /// Go (D1R) or NoGo (D2R) population
    pub da_r: DaReceptors,
    pub y: usize,
    pub maint_x: usize,
    pub out_x: usize,
    /// Matrix layers: number of Maint pools along X; the rest are Out
    pub maint_n: usize,
}

impl GateShape {
    pub fn set(&mut self, y: usize, maint_x: usize, out_x: usize) {
        self.y = y;
        self.maint_x = maint_x;
        self.out_x = out_x;
    }

    #[inline]
    pub fn tot_x(&self) -> usize {
        self.maint_x + self.out_x
    }

    /// Index of pool `(py, px)` in the native layout of `typ`.
    pub fn index(&self, py: usize, px: usize, typ: GateType) -> usize {
        match typ {
            GateType::Maint if self.maint_x == 0 => 0,
            GateType::Maint => py * self.maint_x + px,
            GateType::Out if self.out_x == 0 => 0,
            GateType::Out => py * self.out_x + px,
            GateType::MaintOut => py * self.tot_x() + px,
        }
    }

    /// Index into the combined Maint+Out layout of 1D pool `idx` from layout `from`.
    pub fn full_index_1d(&self, idx: usize, from: GateType) -> usize {
        match from {
            GateType::Maint => {
                if self.maint_x == 0 {
                    return 0;
                }
                self.index(idx / self.maint_x, idx % self.maint_x, GateType::MaintOut)
            }
            GateType::Out => {
                if self.out_x == 0 {
                    return 0;
                }
                self.index(idx / self.out_x, idx % self.out_x + self.maint_x, GateType::MaintOut)
            }
            GateType::MaintOut => idx,
        }
    }

    /// Copy the circuit geometry. Gate type, receptor type and `maint_n` stay local.
    pub fn copy_geom_from(&mut self, src: &GateShape) {
        self.set(src.y, src.maint_x, src.out_x);
    }
}

impl Layer {
    /// Gating layout of this layer.
    pub fn gate_type(&self) -> GateType {
        match self.kind {
            LayerKind::GPiThal | LayerKind::Matrix => GateType::MaintOut,
            LayerKind::PFCDeep if self.pbwm.pfc_gate.out_gate => GateType::Out,
            LayerKind::PFCDeep => GateType::Maint,
            _ => GateType::MaintOut,
        }
    }

    /// Copy `act` and `now` from source pools (index 0 is the layer pool) laid out as `typ`.
    pub(crate) fn set_gate_states(&mut self, src: &[Pool], typ: GateType) {
        let myt = self.gate_type();
        if myt != GateType::MaintOut && typ != GateType::MaintOut && myt != typ {
            return;
        }
        if myt == typ {
            let mx = src.len().min(self.pools.len());
            for i in 1..mx {
                self.pools[i].gate.copy_from(&src[i].gate);
            }
            return;
        }
        let shape = self.pbwm.gate;
        for i in 1..self.pools.len() {
            let si = 1 + shape.full_index_1d(i - 1, myt);
            if let Some(sp) = src.get(si) {
                self.pools[i].gate.copy_from(&sp.gate);
            }
        }
    }

    /// Snapshot `act` into `act_g` for pools gating this cycle.
    pub(crate) fn rec_gate_act(&mut self) {
        for pl in self.pools.iter().skip(1) {
            if !pl.gate.now {
                continue;
            }
            for nrn in self.neurons[pl.range()].iter_mut().filter(|n| !n.is_off()) {
                nrn.act_g = nrn.act;
            }
        }
    }

    /// Gate state of the sub-pool that neuron `ni` belongs to.
    pub fn neuron_gate_state(&self, ni: usize) -> Option<&GateState> {
        let nrn = self.neurons.get(ni)?;
        if nrn.sub_pool == 0 {
            return None;
        }
        self.pools.get(nrn.sub_pool).map(|pl| &pl.gate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deepleabra_npu_neural::LayerShape;

    #[test]
    fn test_full_index_1d_table() {
        let mut gs = GateShape::default();
        gs.set(2, 3, 2);
        let maint: Vec<usize> = (0..6).map(|i| gs.full_index_1d(i, GateType::Maint)).collect();
        assert_eq!(maint, vec![0, 1, 2, 5, 6, 7]);
        let out: Vec<usize> = (0..4).map(|i| gs.full_index_1d(i, GateType::Out)).collect();
        assert_eq!(out, vec![3, 4, 8, 9]);
        assert_eq!(gs.full_index_1d(7, GateType::MaintOut), 7);
    }

    #[test]
    fn test_zero_width_maps_to_zero() {
        let mut gs = GateShape::default();
        gs.set(2, 0, 2);
        assert_eq!(gs.full_index_1d(3, GateType::Maint), 0);
        assert_eq!(gs.index(1, 1, GateType::Maint), 0);
    }

    #[test]
    fn test_set_gate_states_translates_out_pools() {
        let mut gpi = Layer::new("GPiThal", LayerShape::new_4d(1, 3, 1, 1), LayerKind::GPiThal);
        gpi.pbwm.gate.set(1, 2, 1);
        gpi.pools[3].gate.act = 0.7;
        gpi.pools[3].gate.now = true;
        gpi.pools[3].gate.cnt = 0;

        let mut out = Layer::new("PFCoutD", LayerShape::new_4d(1, 1, 1, 2), LayerKind::PFCDeep);
        out.pbwm.pfc_gate.out_gate = true;
        out.pbwm.gate.copy_geom_from(&gpi.pbwm.gate);
        out.pools[1].gate.cnt = 5;
        out.set_gate_states(&gpi.pools, GateType::MaintOut);
        assert_eq!(out.pools[1].gate.act, 0.7);
        assert!(out.pools[1].gate.now);
        // counters stay local
        assert_eq!(out.pools[1].gate.cnt, 5);

        // Maint and Out layouts never exchange directly
        let mut mnt = Layer::new("PFCmntD", LayerShape::new_4d(1, 2, 1, 2), LayerKind::PFCDeep);
        mnt.set_gate_states(&out.pools, GateType::Out);
        assert!(!mnt.pools[1].gate.now);
    }

    #[test]
    fn test_rec_gate_act_only_gating_pools() {
        let mut ly = Layer::new("MatrixGo", LayerShape::new_4d(1, 2, 1, 1), LayerKind::Matrix);
        ly.neurons[0].act = 0.4;
        ly.neurons[1].act = 0.6;
        ly.pools[2].gate.now = true;
        ly.rec_gate_act();
        assert_eq!(ly.neurons[0].act_g, 0.0);
        assert_eq!(ly.neurons[1].act_g, 0.6);
        assert_eq!(ly.neuron_gate_state(1).map(|g| g.now), Some(true));
    }
}
