// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Capability traits over layers.
//!
//! The network asks a layer what it can do through these traits instead of
//! matching on `LayerKind` at every call site. Every layer implements all of
//! them; the answers depend on the kind.

use crate::layer::{Layer, LayerKind};
use crate::neuromod::{Modulator, NeuroMod};
use crate::pbwm::GateType;
use deepleabra_npu_neural::{GateState, Pool};

pub trait HasPools {
    /// Pool 0 is the whole layer, sub-pools follow.
    fn pools(&self) -> &[Pool];

    /// Pool-0 maximum activation from the last cycle, 0 before the first one.
    fn layer_max_act(&self) -> f32 {
        self.pools()
            .first()
            .filter(|pl| pl.inhib.act.max_idx >= 0)
            .map_or(0.0, |pl| pl.inhib.act.max)
    }
}

pub trait HasGateState: HasPools {
    fn gating_layout(&self) -> GateType;

    /// Whether gate states broadcast by a GPiThal layer land here.
    fn receives_gating(&self) -> bool;

    /// Gate state of sub-pool `pool` (1-based).
    fn gate_state(&self, pool: usize) -> Option<&GateState> {
        if pool == 0 {
            return None;
        }
        self.pools().get(pool).map(|pl| &pl.gate)
    }
}

pub trait HasNeuromodulators {
    fn neuro_mod(&self) -> &NeuroMod;

    fn neuro_mod_mut(&mut self) -> &mut NeuroMod;

    fn receive_mod(&mut self, which: Modulator, val: f32) {
        self.neuro_mod_mut().set(which, val);
    }
}

pub trait ComputesBurst {
    fn computes_burst(&self) -> bool;
}

impl HasPools for Layer {
    fn pools(&self) -> &[Pool] {
        &self.pools
    }
}

impl HasGateState for Layer {
    fn gating_layout(&self) -> GateType {
        self.gate_type()
    }

    fn receives_gating(&self) -> bool {
        matches!(self.kind, LayerKind::Matrix | LayerKind::PFCDeep | LayerKind::GPiThal)
    }
}

impl HasNeuromodulators for Layer {
    fn neuro_mod(&self) -> &NeuroMod {
        &self.neuro_mod
    }

    fn neuro_mod_mut(&mut self) -> &mut NeuroMod {
        &mut self.neuro_mod
    }
}

impl ComputesBurst for Layer {
    fn computes_burst(&self) -> bool {
        self.kind == LayerKind::Super
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deepleabra_npu_neural::LayerShape;

    #[test]
    fn test_capabilities_by_kind() {
        let sup = Layer::new("Hid", LayerShape::new_2d(2, 2), LayerKind::Super);
        assert!(sup.computes_burst());
        assert!(!sup.receives_gating());
        assert!(sup.gate_state(0).is_none());

        let mtx = Layer::new("MatrixGo", LayerShape::new_4d(1, 2, 1, 1), LayerKind::Matrix);
        assert!(mtx.receives_gating());
        assert_eq!(mtx.gating_layout(), GateType::MaintOut);
        assert_eq!(mtx.gate_state(2).map(|g| g.cnt), Some(-1));
    }

    #[test]
    fn test_receive_mod_sets_level() {
        let mut ly = Layer::new("Matrix", LayerShape::new_4d(1, 1, 1, 1), LayerKind::Matrix);
        ly.receive_mod(Modulator::ACh, 0.7);
        assert_eq!(HasNeuromodulators::neuro_mod(&ly).ach, 0.7);
        assert_eq!(ly.layer_max_act(), 0.0);
    }

    #[test]
    fn test_layer_max_act_tracks_pool_max() {
        let mut ly = Layer::new("Rew", LayerShape::new_2d(1, 2), LayerKind::Input);
        assert_eq!(ly.pools[0].inhib.act.max, -f32::MAX);
        assert_eq!(ly.layer_max_act(), 0.0);

        ly.neurons[0].act = -0.3;
        ly.neurons[1].act = -0.6;
        ly.avg_max_act();
        assert!((ly.layer_max_act() + 0.3).abs() < 1e-7);
    }
}
