// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Network builders for the standard deep and PBWM circuits.
//!
//! Names follow fixed conventions that `Network::build` relies on:
//! `{name}CT` / `{name}P` for deep columns, `{prefix}MatrixGo`,
//! `{prefix}MatrixNoGo`, `{prefix}GPeNoGo`, `{prefix}GPiThal` for the dorsal
//! basal ganglia, and `{prefix}PFCmnt[D]` / `{prefix}PFCout[D]` for PFC stripes.

use crate::layer::{Layer, LayerIndex, LayerKind};
use crate::network::Network;
use crate::path::{Path, PathIndex, PathKind};
use crate::pattern::Pattern;
use crate::pbwm::PFCDyns;
use deepleabra_npu_neural::LayerShape;
use deepleabra_npu_plasticity::DaReceptors;

/// Layers of one deep column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeepLayers {
    pub super_lay: LayerIndex,
    pub ct: LayerIndex,
    pub pulvinar: Option<LayerIndex>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DorsalBG {
    pub go: LayerIndex,
    pub nogo: LayerIndex,
    pub gpe: LayerIndex,
    pub gpi: LayerIndex,
}

/// Super / deep pairs of the maintenance and output PFC stripes; either may be absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PfcLayers {
    pub mnt: Option<LayerIndex>,
    pub mnt_deep: Option<LayerIndex>,
    pub out: Option<LayerIndex>,
    pub out_deep: Option<LayerIndex>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PbwmLayers {
    pub bg: DorsalBG,
    pub pfc: PfcLayers,
}

/// Fixed basal-ganglia relay pathways: strong, uniform, non-learning.
fn bg_fixed(pt: &mut Path) {
    pt.learn.learn = false;
    pt.wt_init.mean = 0.8;
    pt.wt_init.var = 0.0;
    pt.wt_init.sym = false;
}

impl Network {
    //////////////////////////////////////////////////////////////////
    // Deep

    /// Context pathway from `send` into the CT layer `recv`.
    pub fn connect_ctxt_to_ct(&mut self, send: LayerIndex, recv: LayerIndex, pattern: Pattern) -> PathIndex {
        self.connect_layers(send, recv, pattern, PathKind::CTCtxt)
    }

    /// Fixed one-to-one context relay from a superficial layer to its own CT layer.
    pub fn connect_super_to_ct(&mut self, super_lay: LayerIndex, ct: LayerIndex) -> PathIndex {
        let pi = self.connect_ctxt_to_ct(super_lay, ct, Pattern::OneToOne);
        self.paths[pi.0].set_from_super(true);
        pi
    }

    fn add_deep(&mut self, name: &str, shape: LayerShape, pulvinar: bool) -> DeepLayers {
        let super_lay = self.add_layer(Layer::new(name, shape, LayerKind::Super));
        let ct = self.add_layer(Layer::new(format!("{name}CT"), shape, LayerKind::CT));
        self.connect_ctxt_to_ct(super_lay, ct, Pattern::Full);
        let pulvinar = pulvinar.then(|| {
            let mut pl = Layer::new(format!("{name}P"), shape, LayerKind::Pulvinar);
            pl.add_drivers(&[name]);
            self.add_layer(pl)
        });
        DeepLayers { super_lay, ct, pulvinar }
    }

    /// Super, CT and Pulvinar layers; the Pulvinar is driven by the Super layer.
    pub fn add_deep_2d(&mut self, name: &str, y: usize, x: usize) -> DeepLayers {
        self.add_deep(name, LayerShape::new_2d(y, x), true)
    }

    pub fn add_deep_4d(&mut self, name: &str, pool_y: usize, pool_x: usize, unit_y: usize, unit_x: usize) -> DeepLayers {
        self.add_deep(name, LayerShape::new_4d(pool_y, pool_x, unit_y, unit_x), true)
    }

    /// Super and CT layers only.
    pub fn add_deep_no_pulvinar(&mut self, name: &str, shape: LayerShape) -> DeepLayers {
        self.add_deep(name, shape, false)
    }

    /// Input layer with a Pulvinar layer `{name}P` driven by it.
    pub fn add_input_pulvinar(&mut self, name: &str, shape: LayerShape) -> (LayerIndex, LayerIndex) {
        let inp = self.add_layer(Layer::new(name, shape, LayerKind::Input));
        let mut pl = Layer::new(format!("{name}P"), shape, LayerKind::Pulvinar);
        pl.add_drivers(&[name]);
        (inp, self.add_layer(pl))
    }

    //////////////////////////////////////////////////////////////////
    // Basal ganglia

    /// Matrix layer with `n_y` x (`n_maint` + `n_out`) pools of `neur_y` x `neur_x` units.
    #[allow(clippy::too_many_arguments)]
    pub fn add_matrix_layer(
        &mut self,
        name: &str,
        n_y: usize,
        n_maint: usize,
        n_out: usize,
        neur_y: usize,
        neur_x: usize,
        da_r: DaReceptors,
    ) -> LayerIndex {
        let shape = LayerShape::new_4d(n_y, n_maint + n_out, neur_y, neur_x);
        let mut ly = Layer::new(name, shape, LayerKind::Matrix);
        ly.pbwm.gate.set(n_y, n_maint, n_out);
        ly.pbwm.gate.da_r = da_r;
        ly.pbwm.gate.maint_n = n_maint;
        self.add_layer(ly)
    }

    /// GPe layer with one unit per gating pool.
    pub fn add_gpe_layer(&mut self, name: &str, n_y: usize, n_maint: usize, n_out: usize) -> LayerIndex {
        let shape = LayerShape::new_4d(n_y, n_maint + n_out, 1, 1);
        self.add_layer(Layer::new(name, shape, LayerKind::GPe))
    }

    pub fn add_gpi_thal_layer(&mut self, name: &str, n_y: usize, n_maint: usize, n_out: usize) -> LayerIndex {
        let shape = LayerShape::new_4d(n_y, n_maint + n_out, 1, 1);
        let mut ly = Layer::new(name, shape, LayerKind::GPiThal);
        ly.pbwm.gate.set(n_y, n_maint, n_out);
        self.add_layer(ly)
    }

    /// 1x1 cholinergic layer tracking the magnitude of the named reward layers.
    pub fn add_cin_layer<S: AsRef<str>>(&mut self, name: &str, rew_lays: &[S]) -> LayerIndex {
        let mut ly = Layer::new(name, LayerShape::new_2d(1, 1), LayerKind::CIN);
        ly.pbwm.cin.rew_lays = rew_lays.iter().map(|s| s.as_ref().to_string()).collect();
        self.add_layer(ly)
    }

    /// 1x1 clamped dopamine source.
    pub fn add_clamp_da_layer(&mut self, name: &str) -> LayerIndex {
        self.add_layer(Layer::new(name, LayerShape::new_2d(1, 1), LayerKind::ClampDa))
    }

    /// Go and NoGo Matrix, GPe and GPiThal layers with their fixed pool-to-pool
    /// pathways: Go -> GPiThal, NoGo -> GPe -> GPiThal.
    pub fn add_dorsal_bg(&mut self, prefix: &str, n_y: usize, n_maint: usize, n_out: usize, neur_y: usize, neur_x: usize) -> DorsalBG {
        let go = self.add_matrix_layer(&format!("{prefix}MatrixGo"), n_y, n_maint, n_out, neur_y, neur_x, DaReceptors::D1R);
        let nogo = self.add_matrix_layer(&format!("{prefix}MatrixNoGo"), n_y, n_maint, n_out, neur_y, neur_x, DaReceptors::D2R);
        let gpe = self.add_gpe_layer(&format!("{prefix}GPeNoGo"), n_y, n_maint, n_out);
        let gpi = self.add_gpi_thal_layer(&format!("{prefix}GPiThal"), n_y, n_maint, n_out);

        for (send, recv, kind) in [
            (go, gpi, PathKind::GPiThal),
            (nogo, gpe, PathKind::Forward),
            (gpe, gpi, PathKind::GPiThal),
        ] {
            let pi = self.connect_layers(send, recv, Pattern::PoolOneToOne, kind);
            bg_fixed(&mut self.paths[pi.0]);
        }
        DorsalBG { go, nogo, gpe, gpi }
    }

    //////////////////////////////////////////////////////////////////
    // PFC

    /// PFC super layer and its deep layer `{name}D`. The deep layer stacks one
    /// block of `neur_y` rows per maintenance profile in `dyns`.
    #[allow(clippy::too_many_arguments)]
    pub fn add_pfc_layer(
        &mut self,
        name: &str,
        n_y: usize,
        n_x: usize,
        neur_y: usize,
        neur_x: usize,
        out: bool,
        dyns: PFCDyns,
    ) -> (LayerIndex, LayerIndex) {
        let mut sp = Layer::new(name, LayerShape::new_4d(n_y, n_x, neur_y, neur_x), LayerKind::Super);
        sp.pbwm.pfc_gate.out_gate = out;
        let sp = self.add_layer(sp);

        let rows = neur_y * dyns.len().max(1);
        let mut dp = Layer::new(format!("{name}D"), LayerShape::new_4d(n_y, n_x, rows, neur_x), LayerKind::PFCDeep);
        dp.pbwm.pfc_gate.out_gate = out;
        dp.pbwm.pfc_dyns = dyns;
        dp.defaults();
        (sp, self.add_layer(dp))
    }

    /// Maintenance and output PFC stripes; maintenance deep drives the output super layer.
    pub fn add_pfc(&mut self, prefix: &str, n_y: usize, n_maint: usize, n_out: usize, neur_y: usize, neur_x: usize) -> PfcLayers {
        let mut pfc = PfcLayers::default();
        if n_maint > 0 {
            let (s, d) = self.add_pfc_layer(&format!("{prefix}PFCmnt"), n_y, n_maint, neur_y, neur_x, false, PFCDyns::default());
            pfc.mnt = Some(s);
            pfc.mnt_deep = Some(d);
        }
        if n_out > 0 {
            let (s, d) = self.add_pfc_layer(&format!("{prefix}PFCout"), n_y, n_out, neur_y, neur_x, true, PFCDyns::default());
            pfc.out = Some(s);
            pfc.out_deep = Some(d);
        }
        if let (Some(mnt_d), Some(out)) = (pfc.mnt_deep, pfc.out) {
            self.connect_layers(mnt_d, out, Pattern::OneToOne, PathKind::Forward);
        }
        pfc
    }

    /// Dorsal BG plus PFC stripes, with GPiThal gating wired to Matrix and PFC deep layers.
    #[allow(clippy::too_many_arguments)]
    pub fn add_pbwm(
        &mut self,
        prefix: &str,
        n_y: usize,
        n_maint: usize,
        n_out: usize,
        neur_bg_y: usize,
        neur_bg_x: usize,
        neur_pfc_y: usize,
        neur_pfc_x: usize,
    ) -> PbwmLayers {
        let bg = self.add_dorsal_bg(prefix, n_y, n_maint, n_out, neur_bg_y, neur_bg_x);
        let pfc = self.add_pfc(prefix, n_y, n_maint, n_out, neur_pfc_y, neur_pfc_x);
        self.send_to_matrix_pfc(bg.gpi, prefix);
        self.send_pbwm_params(bg.gpi);
        PbwmLayers { bg, pfc }
    }

    /// Add the standard gating targets under `prefix` that exist in the network.
    pub fn send_to_matrix_pfc(&mut self, gpi: LayerIndex, prefix: &str) {
        let targets: Vec<String> = ["MatrixGo", "MatrixNoGo", "PFCmntD", "PFCoutD"]
            .iter()
            .map(|nm| format!("{prefix}{nm}"))
            .filter(|nm| self.layer_index(nm).is_ok())
            .collect();
        let ly = &mut self.layers[gpi.0];
        for nm in targets {
            if !ly.send_to.contains(&nm) {
                ly.send_to.push(nm);
            }
        }
    }

    /// Copy the gating geometry of `gpi` to every layer on its send-to list.
    pub fn send_pbwm_params(&mut self, gpi: LayerIndex) {
        let src = self.layers[gpi.0].pbwm.gate;
        let targets = self.layers[gpi.0].send_to.clone();
        for nm in targets {
            if let Some(ly) = self.layer_by_name_mut(&nm) {
                ly.pbwm.gate.copy_geom_from(&src);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pbwm::GateType;

    #[test]
    fn test_deep_column_names_and_wiring() {
        let mut net = Network::new("Deep");
        let dl = net.add_deep_2d("V1", 3, 3);
        assert_eq!(net.layers[dl.ct.0].name, "V1CT");
        let pi = dl.pulvinar.unwrap();
        assert_eq!(net.layers[pi.0].name, "V1P");
        assert_eq!(net.layers[pi.0].deep.drivers[0].layer, "V1");
        assert_eq!(net.paths[0].kind, PathKind::CTCtxt);
        net.build().unwrap();
        assert_eq!(net.layers[pi.0].links.drivers.len(), 1);

        let no = net.add_deep_no_pulvinar("IT", LayerShape::new_2d(2, 2));
        assert!(no.pulvinar.is_none());
        let rel = net.connect_super_to_ct(no.super_lay, no.ct);
        assert!(!net.paths[rel.0].learn.learn);
        assert!(net.build().is_ok());
    }

    #[test]
    fn test_pbwm_circuit_builds() {
        let mut net = Network::new("PBWM");
        let pb = net.add_pbwm("", 1, 2, 1, 2, 2, 2, 2);
        net.build().unwrap();

        let gpi = &net.layers[pb.bg.gpi.0];
        assert_eq!(gpi.send_to, vec!["MatrixGo", "MatrixNoGo", "PFCmntD", "PFCoutD"]);
        assert_eq!(gpi.links.send_to.len(), 4);
        assert!(gpi.links.go_path.is_some() && gpi.links.nogo_path.is_some());

        let out_d = &net.layers[pb.pfc.out_deep.unwrap().0];
        assert_eq!(out_d.gate_type(), GateType::Out);
        assert_eq!(out_d.pbwm.gate.maint_x, 2);
        assert_eq!(out_d.pbwm.gate.out_x, 1);
        assert_eq!(out_d.links.maint_lay, pb.pfc.mnt_deep);
        assert_eq!(out_d.pbwm.pfc_maint.max_maint, 1);

        let nogo = &net.layers[pb.bg.nogo.0];
        assert_eq!(nogo.pbwm.gate.da_r, DaReceptors::D2R);
        assert_eq!(nogo.pbwm.gate.maint_n, 2);

        let fixed = net.recv_path_by_send_name("GPiThal", "MatrixGo").unwrap();
        assert!(!fixed.learn.learn);
        assert_eq!(fixed.kind, PathKind::GPiThal);
    }

    #[test]
    fn test_gpi_without_nogo_fails_build() {
        let mut net = Network::new("BG");
        let go = net.add_matrix_layer("MatrixGo", 1, 1, 0, 1, 1, DaReceptors::D1R);
        let gpi = net.add_gpi_thal_layer("GPiThal", 1, 1, 0);
        net.connect_layers(go, gpi, Pattern::PoolOneToOne, PathKind::GPiThal);
        assert!(matches!(net.build(), Err(crate::error::EngineError::MissingPath { .. })));
    }

    #[test]
    fn test_pfc_dyns_stack_rows() {
        let mut net = Network::new("PFC");
        let (sp, dp) = net.add_pfc_layer("PFCmnt", 1, 2, 2, 3, false, PFCDyns::full_dyn(10.0));
        let n_dyn = net.layers[dp.0].pbwm.pfc_dyns.len();
        assert_eq!(net.layers[dp.0].shape.unit_dims(), (2 * n_dyn, 3));
        assert_eq!(net.layers[sp.0].shape.unit_dims(), (2, 3));
        assert!(net.layers[dp.0].pbwm.pfc_maint.use_dyn);
        net.build().unwrap();
        assert_eq!(net.layers[dp.0].links.super_lay, Some(sp));
    }
}
