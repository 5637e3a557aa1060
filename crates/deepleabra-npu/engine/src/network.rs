// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Network
//!
//! Owns every layer and pathway in two arenas and runs the per-cycle phases
//! over them. Each phase completes for all layers before the next begins:
//!
//! ```text
//! cycle:
//!   collect deltas (par layers) -> send into path buffers (par paths)
//!   -> fold GPiThal buffers -> driver snapshot -> g_from_inc (par layers)
//!   -> avg/max Ge, inhibition (par layers) -> act (par layers) -> CIN
//!   -> avg/max act (par layers) -> GPi gating + broadcast -> PFC gating
//!   -> record gate acts -> burst -> neuromodulator broadcast
//!
//! quarter_final:
//!   layer quarter end (par) -> PFC gate counters + maintenance
//!   -> optional quarter-2 learning -> CT context send + drain
//! ```
//!
//! Phases that read one layer and write another work from owned snapshots,
//! so no layer ever holds a reference into another while mutating.

use crate::capability::{ComputesBurst, HasGateState, HasNeuromodulators, HasPools};
use crate::deep::Drive;
use crate::error::{EngineError, Result};
use crate::layer::{Layer, LayerIndex, LayerKind, LayerLinks};
use crate::path::{Path, PathIndex, PathKind};
use crate::pattern::Pattern;
use crate::pbwm::pfc::PfcClear;
use crate::pbwm::GateType;
use ahash::AHashMap;
use deepleabra_npu_neural::{Context, LayerShape};
use deepleabra_npu_plasticity::DaReceptors;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

const DEFAULT_SEED: u64 = 1;

#[derive(Debug, Clone)]
pub struct Network {
    pub name: String,
    pub layers: Vec<Layer>,
    pub paths: Vec<Path>,
    /// Weight balance factors are recomputed every this many `wt_from_dwt` calls
    pub wt_bal_interval: usize,
    wt_bal_ctr: usize,
    name_index: AHashMap<String, LayerIndex>,
    built: bool,
    rng: StdRng,
    pool: Option<Arc<rayon::ThreadPool>>,
}

impl Network {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_seed(name, DEFAULT_SEED)
    }

    /// Network whose weight initialization draws from `seed`.
    pub fn with_seed(name: impl Into<String>, seed: u64) -> Self {
        Self {
            name: name.into(),
            layers: Vec::new(),
            paths: Vec::new(),
            wt_bal_interval: 10,
            wt_bal_ctr: 0,
            name_index: AHashMap::new(),
            built: false,
            rng: StdRng::seed_from_u64(seed),
            pool: None,
        }
    }

    /// Run the parallel phases on a dedicated pool of `n` threads; 0 uses the global pool.
    pub fn with_threads(mut self, n: usize) -> Self {
        self.pool = None;
        if n == 0 {
            return self;
        }
        match rayon::ThreadPoolBuilder::new()
            .num_threads(n)
            .thread_name(|i| format!("deepleabra-{i}"))
            .build()
        {
            Ok(pool) => self.pool = Some(Arc::new(pool)),
            Err(e) => warn!(
                target: "deepleabra_npu_engine",
                "[NETWORK] {}: could not build {}-thread pool, using global pool: {}", self.name, n, e
            ),
        }
        self
    }

    pub fn set_seed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    #[inline]
    pub fn is_built(&self) -> bool {
        self.built
    }

    //////////////////////////////////////////////////////////////////
    // Construction

    pub fn add_layer(&mut self, layer: Layer) -> LayerIndex {
        let li = LayerIndex(self.layers.len());
        self.name_index.entry(layer.name.clone()).or_insert(li);
        self.layers.push(layer);
        self.built = false;
        li
    }

    pub fn add_layer_2d(&mut self, name: &str, y: usize, x: usize, kind: LayerKind) -> LayerIndex {
        self.add_layer(Layer::new(name, LayerShape::new_2d(y, x), kind))
    }

    pub fn add_layer_4d(&mut self, name: &str, pool_y: usize, pool_x: usize, unit_y: usize, unit_x: usize, kind: LayerKind) -> LayerIndex {
        self.add_layer(Layer::new(name, LayerShape::new_4d(pool_y, pool_x, unit_y, unit_x), kind))
    }

    /// Connect two layers. The pathway is named `{send}To{recv}`.
    pub fn connect_layers(&mut self, send: LayerIndex, recv: LayerIndex, pattern: Pattern, kind: PathKind) -> PathIndex {
        let pi = PathIndex(self.paths.len());
        let name = format!("{}To{}", self.layers[send.0].name, self.layers[recv.0].name);
        self.paths.push(Path::new(name, send, recv, pattern, kind));
        self.layers[recv.0].recv_paths.push(pi);
        self.layers[send.0].send_paths.push(pi);
        self.built = false;
        pi
    }

    pub fn connect_layer_names(&mut self, send: &str, recv: &str, pattern: Pattern, kind: PathKind) -> Result<PathIndex> {
        let si = self.layer_index(send)?;
        let ri = self.layer_index(recv)?;
        Ok(self.connect_layers(si, ri, pattern, kind))
    }

    pub fn layer_index(&self, name: &str) -> Result<LayerIndex> {
        self.name_index
            .get(name)
            .copied()
            .ok_or_else(|| EngineError::LayerNotFound(name.to_string()))
    }

    pub fn layer_by_name(&self, name: &str) -> Option<&Layer> {
        self.name_index.get(name).map(|li| &self.layers[li.0])
    }

    pub fn layer_by_name_mut(&mut self, name: &str) -> Option<&mut Layer> {
        let li = *self.name_index.get(name)?;
        Some(&mut self.layers[li.0])
    }

    /// Pathway into `recv` from the layer named `send`.
    pub fn recv_path_by_send_name(&self, recv: &str, send: &str) -> Option<&Path> {
        let ly = self.layer_by_name(recv)?;
        ly.recv_paths
            .iter()
            .map(|pi| &self.paths[pi.0])
            .find(|pt| self.layers[pt.send.0].name == send)
    }

    pub fn recv_path_by_send_name_mut(&mut self, recv: &str, send: &str) -> Option<&mut Path> {
        let ly = self.layer_by_name(recv)?;
        let pi = ly
            .recv_paths
            .iter()
            .copied()
            .find(|pi| self.layers[self.paths[pi.0].send.0].name == send)?;
        Some(&mut self.paths[pi.0])
    }

    /// Reset every layer and pathway parameter to its kind's defaults.
    pub fn defaults(&mut self) {
        self.wt_bal_interval = 10;
        self.layers.iter_mut().for_each(Layer::defaults);
        self.paths.iter_mut().for_each(Path::defaults);
    }

    pub fn update_params(&mut self) {
        self.layers.iter_mut().for_each(Layer::update_params);
        self.paths.iter_mut().for_each(Path::update_params);
    }

    //////////////////////////////////////////////////////////////////
    // Build

    /// Build connectivity and resolve every name-based reference to arena
    /// indexes. Any configuration error leaves the network unbuilt.
    pub fn build(&mut self) -> Result<()> {
        self.built = false;
        self.name_index.clear();
        for (i, ly) in self.layers.iter().enumerate() {
            if self.name_index.insert(ly.name.clone(), LayerIndex(i)).is_some() {
                return Err(EngineError::DuplicateLayer(ly.name.clone()));
            }
        }

        for pt in self.paths.iter_mut() {
            let send = &self.layers[pt.send.0];
            let recv = &self.layers[pt.recv.0];
            if pt.kind == PathKind::CTCtxt && recv.kind != LayerKind::CT {
                return Err(EngineError::PatternMismatch {
                    send: send.name.clone(),
                    recv: recv.name.clone(),
                    reason: "context pathway must target a CT layer".to_string(),
                });
            }
            pt.build(&send.name, &send.shape, &recv.name, &recv.shape)?;
        }

        let mut links = Vec::with_capacity(self.layers.len());
        for ly in &self.layers {
            links.push(self.resolve_links(ly)?);
        }
        for (ly, lk) in self.layers.iter_mut().zip(links) {
            ly.links = lk;
        }

        self.built = true;
        let nsyn: usize = self.paths.iter().map(Path::n_syns).sum();
        info!(
            target: "deepleabra_npu_engine",
            "[NETWORK] {} built: {} layers, {} pathways, {} synapses",
            self.name,
            self.layers.len(),
            self.paths.len(),
            nsyn
        );
        Ok(())
    }

    fn resolve_links(&self, ly: &Layer) -> Result<LayerLinks> {
        let mut lk = LayerLinks::default();
        for target in &ly.send_to {
            let li = self.name_index.get(target).copied().ok_or_else(|| EngineError::InvalidSendTo {
                layer: ly.name.clone(),
                target: target.clone(),
            })?;
            lk.send_to.push(li);
        }
        if ly.send_to.is_empty() && (ly.modulator_source().is_some() || ly.kind == LayerKind::GPiThal) {
            warn!(
                target: "deepleabra_npu_engine",
                "[NETWORK] {}: layer {} broadcasts to no layers", self.name, ly.name
            );
        }

        match ly.kind {
            LayerKind::PFCDeep => {
                let super_name = ly.pfc_super_name().unwrap_or_default();
                let li = self
                    .name_index
                    .get(super_name)
                    .copied()
                    .ok_or_else(|| EngineError::LayerNotFound(super_name.to_string()))?;
                lk.super_lay = Some(li);
                lk.maint_lay = ly
                    .pfc_maint_name()
                    .and_then(|nm| self.name_index.get(&nm).copied());
            }
            LayerKind::GPiThal => {
                for &pi in &ly.recv_paths {
                    let pt = &self.paths[pi.0];
                    if pt.kind != PathKind::GPiThal {
                        continue;
                    }
                    let sly = &self.layers[pt.send.0];
                    if sly.kind == LayerKind::Matrix && sly.pbwm.gate.da_r == DaReceptors::D1R {
                        lk.go_path = Some(pi);
                    } else {
                        lk.nogo_path = Some(pi);
                    }
                }
                if lk.go_path.is_none() {
                    return Err(EngineError::MissingPath {
                        layer: ly.name.clone(),
                        what: "GPiThal pathway from a Go Matrix layer".to_string(),
                    });
                }
                if lk.nogo_path.is_none() {
                    return Err(EngineError::MissingPath {
                        layer: ly.name.clone(),
                        what: "GPiThal pathway from a NoGo (GPe) layer".to_string(),
                    });
                }
            }
            LayerKind::CIN => {
                for nm in &ly.pbwm.cin.rew_lays {
                    let li = self
                        .name_index
                        .get(nm)
                        .copied()
                        .ok_or_else(|| EngineError::LayerNotFound(nm.clone()))?;
                    lk.rew_lays.push(li);
                }
            }
            LayerKind::Pulvinar => {
                lk.drivers = ly.resolve_drivers(&self.layers, |nm| self.name_index.get(nm).copied())?;
            }
            _ => {}
        }
        Ok(lk)
    }

    //////////////////////////////////////////////////////////////////
    // Init

    /// Initialize weights from each pathway's `wt_init`, reset layer state,
    /// then copy weights onto reciprocal pathways where symmetry is requested.
    pub fn init_weights(&mut self) {
        self.wt_bal_ctr = 0;
        let Self { layers, paths, rng, .. } = self;
        for ly in layers.iter_mut().filter(|ly| !ly.off) {
            for &pi in &ly.send_paths {
                let pt = &mut paths[pi.0];
                if !pt.off {
                    pt.init_weights(rng);
                }
            }
            ly.init_weights_state();
        }
        for ly in layers.iter().filter(|ly| !ly.off) {
            for &pi in &ly.send_paths {
                let pt = &paths[pi.0];
                // lower layers are the source of symmetric weights
                if pt.off || !pt.wt_init.sym || pt.recv.0 < pt.send.0 {
                    continue;
                }
                let recip = ly
                    .recv_paths
                    .iter()
                    .copied()
                    .find(|rp| paths[rp.0].send == pt.recv);
                let Some(rpi) = recip else {
                    continue;
                };
                if paths[rpi.0].wt_init.sym {
                    init_wt_sym(paths, pi, rpi);
                }
            }
        }
    }

    pub fn init_acts(&mut self) {
        self.layers.iter_mut().filter(|ly| !ly.off).for_each(Layer::init_acts);
    }

    pub fn init_ext(&mut self) {
        self.layers.iter_mut().filter(|ly| !ly.off).for_each(Layer::init_ext);
    }

    pub fn apply_ext(&mut self, layer: &str, ext: &[f32]) -> Result<()> {
        let li = self.layer_index(layer)?;
        self.layers[li.0].apply_ext(ext);
        Ok(())
    }

    //////////////////////////////////////////////////////////////////
    // Alpha cycle

    /// Start of a trial: running averages, input scaling, state decay and
    /// clamping. Layers run in order, so a sender later in the list still has
    /// its previous trial's average when an earlier receiver scales its input.
    pub fn alpha_cyc_init(&mut self, update_act_avg: bool) {
        let Self { layers, paths, .. } = self;
        for li in 0..layers.len() {
            if layers[li].off {
                continue;
            }
            layers[li].alpha_cyc_init_avgs(update_act_avg);
            gscale_from_avg_act(layers, paths, li);
            layers[li].alpha_cyc_init_state();
            for &pi in &layers[li].recv_paths {
                paths[pi.0].init_g_inc();
            }
        }
    }

    /// One cycle of activation updating. Does nothing on an unbuilt network.
    pub fn cycle(&mut self, ctx: &Context) {
        if !self.built {
            warn!(target: "deepleabra_npu_engine", "[NETWORK] {}: cycle on unbuilt network", self.name);
            return;
        }
        trace!(target: "deepleabra_npu_engine", "[CYCLE] {} cycle {} quarter {}", self.name, ctx.cycle, ctx.quarter);
        let Self { layers, paths, pool, .. } = self;
        install(pool.as_deref(), || {
            send_phase(layers, paths);
            act_phase(layers, paths, ctx);
        });
        gate_phase(layers, ctx);
        install(pool.as_deref(), || {
            layers
                .par_iter_mut()
                .filter(|ly| !ly.off && ly.receives_gating())
                .for_each(|ly| ly.rec_gate_act());
            layers
                .par_iter_mut()
                .filter(|ly| !ly.off && ly.computes_burst())
                .for_each(|ly| ly.burst_from_act(ctx));
        });
        send_mods(layers);
    }

    /// End of quarter `ctx.quarter`.
    pub fn quarter_final(&mut self, ctx: &Context) {
        if !self.built {
            warn!(target: "deepleabra_npu_engine", "[NETWORK] {}: quarter_final on unbuilt network", self.name);
            return;
        }
        let Self { layers, paths, pool, .. } = self;
        install(pool.as_deref(), || {
            layers.par_iter_mut().filter(|ly| !ly.off).for_each(|ly| {
                ly.quarter_final(ctx);
                if ly.computes_burst() {
                    ly.burst_prv(ctx);
                }
            });
        });

        for di in 0..layers.len() {
            if layers[di].kind != LayerKind::PFCDeep || layers[di].off {
                continue;
            }
            layers[di].update_gate_cnt(ctx);
            let Some(si) = layers[di].links.super_lay else {
                continue;
            };
            let sly = &layers[si.0];
            let acts: Vec<f32> = sly.neurons.iter().map(|n| n.act).collect();
            let units = sly.shape.unit_dims();
            layers[di].deep_maint(ctx, &acts, units);
        }

        if ctx.quarter == 1 {
            let lays: &[Layer] = layers;
            install(pool.as_deref(), || {
                paths
                    .par_iter_mut()
                    .filter(|pt| path_active(pt, lays) && lays[pt.recv.0].does_quarter2_dwt())
                    .for_each(|pt| dwt_path(pt, lays));
            });
        }

        for pi in 0..paths.len() {
            if paths[pi].kind != PathKind::CTCtxt || !path_active(&paths[pi], layers) {
                continue;
            }
            let send = &layers[paths[pi].send.0];
            paths[pi].send_ctxt_from(send, ctx);
        }
        for ly in layers.iter_mut().filter(|ly| !ly.off && ly.kind == LayerKind::CT) {
            ly.ctxt_from_ge(ctx, paths);
        }
    }

    //////////////////////////////////////////////////////////////////
    // Learning

    /// Compute weight changes on every active pathway.
    pub fn dwt(&mut self) {
        let Self { layers, paths, pool, .. } = self;
        let lays: &[Layer] = layers;
        install(pool.as_deref(), || {
            paths
                .par_iter_mut()
                .filter(|pt| path_active(pt, lays))
                .for_each(|pt| dwt_path(pt, lays));
        });
    }

    /// Apply weight changes, recomputing weight balance every `wt_bal_interval` calls.
    pub fn wt_from_dwt(&mut self) {
        let Self { layers, paths, pool, .. } = self;
        let lays: &[Layer] = layers;
        install(pool.as_deref(), || {
            paths
                .par_iter_mut()
                .filter(|pt| path_active(pt, lays))
                .for_each(Path::wt_from_dwt);
        });
        self.wt_bal_ctr += 1;
        if self.wt_bal_ctr >= self.wt_bal_interval {
            self.wt_bal_ctr = 0;
            self.wt_bal_from_wt();
        }
    }

    pub fn wt_bal_from_wt(&mut self) {
        debug!(target: "deepleabra_npu_engine", "[LEARN] {}: weight balance update", self.name);
        let Self { layers, paths, pool, .. } = self;
        let lays: &[Layer] = layers;
        install(pool.as_deref(), || {
            paths
                .par_iter_mut()
                .filter(|pt| path_active(pt, lays))
                .for_each(|pt| {
                    let recv = &lays[pt.recv.0];
                    pt.wt_bal_from_wt(recv);
                });
        });
    }

    /// Set every pathway's learning rate to its initial rate times `mult`.
    pub fn lrate_mult(&mut self, mult: f32) {
        self.paths.iter_mut().for_each(|pt| pt.lrate_mult(mult));
    }

    //////////////////////////////////////////////////////////////////
    // Stats

    /// Summed squared error over Target and Compare layers.
    pub fn sse(&self, tol: f32) -> f64 {
        self.layers
            .iter()
            .filter(|ly| !ly.off && matches!(ly.kind, LayerKind::Target | LayerKind::Compare))
            .map(|ly| ly.sse(tol))
            .sum()
    }
}

fn install<R, F>(pool: Option<&rayon::ThreadPool>, f: F) -> R
where
    R: Send,
    F: FnOnce() -> R + Send,
{
    match pool {
        Some(p) => p.install(f),
        None => f(),
    }
}

#[inline]
fn path_active(pt: &Path, layers: &[Layer]) -> bool {
    !pt.off && !layers[pt.send.0].off && !layers[pt.recv.0].off
}

/// Copy weights of `from` onto the reciprocal synapses of `to`.
fn init_wt_sym(paths: &mut [Path], from: PathIndex, to: PathIndex) {
    let src = &paths[from.0];
    let dst = &paths[to.0];
    let mut updates = Vec::new();
    for si in 0..src.s_con_n.len() {
        for ci in src.send_range(si) {
            let ri = src.s_con_idx[ci];
            if let Some(rci) = dst.syn_index(ri, si) {
                updates.push((rci, src.syns[ci]));
            }
        }
    }
    let dst = &mut paths[to.0];
    for (rci, sy) in updates {
        let rsy = &mut dst.syns[rci];
        rsy.wt = sy.wt;
        rsy.lwt = sy.lwt;
        rsy.scale = sy.scale;
    }
}

/// Input scaling of layer `li`'s receiving pathways from sender activity,
/// normalized by the summed relative scales (excitatory and inhibitory apart).
fn gscale_from_avg_act(layers: &[Layer], paths: &mut [Path], li: usize) {
    let ly = &layers[li];
    let mut tot_ge_rel = 0.0f32;
    let mut tot_gi_rel = 0.0f32;
    for &pi in &ly.recv_paths {
        let pt = &mut paths[pi.0];
        if !path_active(pt, layers) {
            continue;
        }
        let sly = &layers[pt.send.0];
        let savg = sly.pools[0].act_avg.act_p_avg_eff;
        pt.gscale = pt
            .wt_scale
            .full_scale(savg, sly.len() as f32, pt.r_con_n_avg_max.avg);
        if pt.kind == PathKind::Inhib {
            tot_gi_rel += pt.wt_scale.rel;
        } else {
            tot_ge_rel += pt.wt_scale.rel;
        }
    }
    for &pi in &ly.recv_paths {
        let pt = &mut paths[pi.0];
        if !path_active(pt, layers) {
            continue;
        }
        let tot = if pt.kind == PathKind::Inhib { tot_gi_rel } else { tot_ge_rel };
        if tot > 0.0 {
            pt.gscale /= tot;
        }
    }
}

/// Deltas into path-private buffers. Senders are visited in index order
/// within each pathway, so sums do not depend on the thread count.
fn send_phase(layers: &mut [Layer], paths: &mut [Path]) {
    layers
        .par_iter_mut()
        .filter(|ly| !ly.off)
        .for_each(Layer::collect_g_delta);
    let lays: &[Layer] = layers;
    paths.par_iter_mut().for_each(|pt| {
        if !pt.kind.sends_g_delta() || !path_active(pt, lays) {
            return;
        }
        for &(si, delta) in &lays[pt.send.0].sends {
            pt.send_g_delta(si, delta);
        }
    });
    paths
        .iter_mut()
        .filter(|pt| pt.kind == PathKind::GPiThal)
        .for_each(Path::fold_g_inc_into_raw);
}

fn act_phase(layers: &mut [Layer], paths: &mut [Path], ctx: &Context) {
    let drives: Vec<Option<Vec<Option<Drive>>>> = {
        let lays: &[Layer] = layers;
        lays.par_iter().map(|ly| ly.driver_drives(ctx, lays)).collect()
    };
    {
        let pts: &[Path] = paths;
        layers
            .par_iter_mut()
            .zip(drives.par_iter())
            .filter(|(ly, _)| !ly.off)
            .for_each(|(ly, drv)| ly.g_from_inc(ctx, pts, drv.as_deref()));
    }
    paths
        .par_iter_mut()
        .filter(|pt| pt.kind.merges_into_recv())
        .for_each(Path::clear_g_inc);

    layers.par_iter_mut().filter(|ly| !ly.off).for_each(|ly| {
        ly.avg_max_ge();
        ly.inhib_from_ge_act();
    });

    // reward maxes from the previous cycle
    let rew_maxes: Vec<Option<Vec<f32>>> = layers
        .iter()
        .map(|ly| {
            (ly.kind == LayerKind::CIN).then(|| {
                ly.links
                    .rew_lays
                    .iter()
                    .map(|li| layers[li.0].layer_max_act())
                    .collect()
            })
        })
        .collect();
    layers
        .par_iter_mut()
        .filter(|ly| !ly.off)
        .for_each(|ly| ly.act_from_g(ctx));
    for (ly, rew) in layers.iter_mut().zip(rew_maxes) {
        if let (Some(rew), false) = (rew, ly.off) {
            ly.cin_act_from_rew(&rew);
        }
    }
    layers
        .par_iter_mut()
        .filter(|ly| !ly.off)
        .for_each(Layer::avg_max_act);
}

/// GPiThal gating and broadcast, then PFC deep gating with its clears.
fn gate_phase(layers: &mut [Layer], ctx: &Context) {
    for gi in 0..layers.len() {
        if layers[gi].kind != LayerKind::GPiThal || layers[gi].off {
            continue;
        }
        layers[gi].gpi_gate_from_act(ctx);
        let pools = layers[gi].pools.clone();
        let targets = layers[gi].links.send_to.clone();
        for t in targets {
            layers[t.0].set_gate_states(&pools, GateType::MaintOut);
        }
    }

    for di in 0..layers.len() {
        if layers[di].kind != LayerKind::PFCDeep || layers[di].off {
            continue;
        }
        let clears = layers[di].pfc_deep_gating(ctx);
        for clr in clears {
            match clr {
                PfcClear::Super { pool, decay } => {
                    if let Some(si) = layers[di].links.super_lay {
                        layers[si.0].decay_state_pool(pool, decay);
                    }
                }
                PfcClear::Maint { pool } => {
                    let Some(mi) = layers[di].links.maint_lay else {
                        continue;
                    };
                    if let Some(decay) = layers[mi.0].clear_maint(pool) {
                        if let Some(si) = layers[mi.0].links.super_lay {
                            layers[si.0].decay_state_pool(pool, decay);
                        }
                    }
                }
            }
        }
    }
}

/// Neuromodulator sources copy their level to their targets for the next cycle.
fn send_mods(layers: &mut [Layer]) {
    for li in 0..layers.len() {
        if layers[li].off {
            continue;
        }
        let Some((which, val)) = layers[li].mod_from_act() else {
            continue;
        };
        let targets = layers[li].links.send_to.clone();
        for t in targets {
            layers[t.0].receive_mod(which, val);
        }
    }
}

fn dwt_path(pt: &mut Path, layers: &[Layer]) {
    let send = &layers[pt.send.0];
    let recv = &layers[pt.recv.0];
    match pt.kind {
        PathKind::CTCtxt => pt.dwt_ctctxt(send, recv),
        PathKind::MatrixTrace => pt.dwt_matrix(send, recv),
        PathKind::DaHebb => pt.dwt_da_hebb(send, recv),
        _ => pt.dwt(send, recv),
    }
}
