// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Pulvinar (thalamic relay) plus phase
//!
//! In the minus phase a Pulvinar layer integrates its regular inputs. In its
//! burst quarter each driven unit instead gets
//! `(1 - drv_inhib) * ge_raw + drive_ge`, where `drv_inhib` scales with the
//! driver layer's max activation. Drivers are laid out back to back in the
//! unit space of one pool: driver `k` starts at the summed unit counts of
//! drivers `0..k`.
//!
//! Geometry mapping from driver to pulvinar:
//! - 2D to 2D: unit for unit
//! - 2D to 4D: the flat driver is copied into every pool
//! - 4D to 2D: each unit position takes the max (and active-pool avg) over driver pools
//! - 4D to 4D: driver pools are mapped onto pulvinar pools by rounded proportional
//!   windows, or collapsed into every pool when `no_topo` is set

use crate::error::{EngineError, Result};
use crate::layer::{Layer, LayerIndex, LayerKind};
use deepleabra_npu_neural::{Context, Quarters};

/// Driver pools whose max activation exceeds this contribute to the average.
const POOL_ACTIVE_THR: f32 = 0.5;

/// Driver activations are normalized by the driver layer max above this level.
const DRIVE_NORM_THR: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct PulvinarParams {
    /// Ignore drivers and integrate like a regular layer in every quarter
    pub drivers_off: bool,
    pub burst_qtr: Quarters,
    /// Multiplier on normalized driver activation
    pub drive_scale: f32,
    /// Driver max activation at which regular inputs are fully suppressed
    pub max_inhib: f32,
    /// Collapse all driver pools onto every pulvinar pool
    pub no_topo: bool,
    /// Proportion of the active-pool average mixed with the max
    pub avg_mix: f32,
    pub binarize: bool,
    pub bin_thr: f32,
    pub bin_on: f32,
    pub bin_off: f32,
}

impl Default for PulvinarParams {
    fn default() -> Self {
        Self {
            drivers_off: false,
            burst_qtr: Quarters::Q4,
            drive_scale: 0.3,
            max_inhib: 0.6,
            no_topo: false,
            avg_mix: 0.0,
            binarize: false,
            bin_thr: 0.4,
            bin_on: 0.3,
            bin_off: 0.0,
        }
    }
}

impl PulvinarParams {
    /// Effective driver conductance for a driver activation.
    #[inline]
    pub fn drive_ge(&self, act: f32) -> f32 {
        if self.binarize {
            if act >= self.bin_thr {
                self.bin_on
            } else {
                self.bin_off
            }
        } else {
            self.drive_scale * act
        }
    }

    #[inline]
    pub fn ge_from_max_avg(&self, max: f32, avg: f32) -> f32 {
        let deff = (1.0 - self.avg_mix) * max + self.avg_mix * avg;
        self.drive_ge(deff)
    }

    #[inline]
    pub fn drive_inhib(&self, drv_max: f32) -> f32 {
        (drv_max / self.max_inhib).min(1.0)
    }
}

/// A named driver layer of a Pulvinar layer.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct Driver {
    pub layer: String,
}

impl Driver {
    pub fn new(layer: impl Into<String>) -> Self {
        Self { layer: layer.into() }
    }
}

/// Driver resolved at build time: arena index and unit offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ResolvedDriver {
    pub layer: LayerIndex,
    pub off: usize,
}

/// Driver input for one pulvinar unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Drive {
    pub ge: f32,
    pub inhib: f32,
}

/// Driver activation for unit `dni`, normalized by the driver layer max.
fn drive_act(dly: &Layer, dni: usize) -> f32 {
    let nrn = &dly.neurons[dni];
    let act = if dly.kind == LayerKind::Super { nrn.burst } else { nrn.act };
    let lmax = dly.pools[0].inhib.act.max;
    if lmax > DRIVE_NORM_THR {
        act / lmax
    } else {
        act
    }
}

/// Max and active-pool average of unit `dni` over driver pools in the window.
fn pools_max_avg(dly: &Layer, dni: usize, py: core::ops::Range<usize>, px: core::ops::Range<usize>) -> (f32, f32) {
    let (_, dpxn) = dly.shape.pool_dims();
    let dnun = dly.shape.units_per_pool();
    let mut max = 0.0f32;
    let mut avg = 0.0f32;
    let mut avgn = 0;
    for dpy in py {
        for dpx in px.clone() {
            let pi = dpy * dpxn + dpx;
            let act = drive_act(dly, pi * dnun + dni);
            max = max.max(act);
            if dly.pools[1 + pi].inhib.act.max > POOL_ACTIVE_THR {
                avg += act;
                avgn += 1;
            }
        }
    }
    if avgn > 0 {
        avg /= avgn as f32;
    }
    (max, avg)
}

#[inline]
fn round_idx(v: f64) -> usize {
    v.round() as usize
}

impl Layer {
    /// Add driver layers by name.
    pub fn add_drivers<S: AsRef<str>>(&mut self, names: &[S]) {
        self.deep.add_drivers(names);
    }

    /// Resolve driver names to arena indexes and unit offsets.
    pub(crate) fn resolve_drivers<F>(&self, layers: &[Layer], lookup: F) -> Result<Vec<ResolvedDriver>>
    where
        F: Fn(&str) -> Option<LayerIndex>,
    {
        let mut res = Vec::with_capacity(self.deep.drivers.len());
        let mut off = 0;
        for drv in &self.deep.drivers {
            let li = lookup(&drv.layer).ok_or_else(|| EngineError::InvalidDriver {
                layer: self.name.clone(),
                reason: format!("driver layer not found: {}", drv.layer),
            })?;
            res.push(ResolvedDriver { layer: li, off });
            off += layers[li.0].shape.units_per_pool();
        }
        let mn = self.shape.units_per_pool();
        if off > mn {
            return Err(EngineError::InvalidDriver {
                layer: self.name.clone(),
                reason: format!("size of drivers: {} is greater than units: {}", off, mn),
            });
        }
        Ok(res)
    }

    /// Per-unit driver input for this cycle, or `None` when the layer integrates normally.
    /// Later drivers overwrite earlier ones on overlapping units.
    pub(crate) fn driver_drives(&self, ctx: &Context, layers: &[Layer]) -> Option<Vec<Option<Drive>>> {
        let pp = &self.deep.pulvinar;
        if self.kind != LayerKind::Pulvinar || pp.drivers_off || !pp.burst_qtr.has(ctx.quarter) {
            return None;
        }
        let nn = self.neurons.len();
        let mut drives: Vec<Option<Drive>> = vec![None; nn];
        let nun = self.shape.units_per_pool();
        let (pyn, pxn) = self.shape.pool_dims();
        let mut set = |tni: usize, ge: f32, inhib: f32| {
            if tni < nn {
                drives[tni] = Some(Drive { ge, inhib });
            }
        };

        for drv in &self.links.drivers {
            let dly = &layers[drv.layer.0];
            let inhib = pp.drive_inhib(dly.pools[0].inhib.act.max);
            match (dly.is_4d(), self.is_4d()) {
                (false, false) => {
                    for dni in 0..dly.neurons.len() {
                        let act = drive_act(dly, dni);
                        set(drv.off + dni, pp.ge_from_max_avg(act, act), inhib);
                    }
                }
                (false, true) => {
                    for dni in 0..dly.neurons.len() {
                        let act = drive_act(dly, dni);
                        let ge = pp.ge_from_max_avg(act, act);
                        for pi in 0..pyn * pxn {
                            set(pi * nun + drv.off + dni, ge, inhib);
                        }
                    }
                }
                (true, false) => {
                    let (dpyn, dpxn) = dly.shape.pool_dims();
                    for dni in 0..dly.shape.units_per_pool() {
                        let (max, avg) = pools_max_avg(dly, dni, 0..dpyn, 0..dpxn);
                        set(drv.off + dni, pp.ge_from_max_avg(max, avg), inhib);
                    }
                }
                (true, true) if pp.no_topo => {
                    let (dpyn, dpxn) = dly.shape.pool_dims();
                    for dni in 0..dly.shape.units_per_pool() {
                        let (max, avg) = pools_max_avg(dly, dni, 0..dpyn, 0..dpxn);
                        let ge = pp.ge_from_max_avg(max, avg);
                        for pi in 0..pyn * pxn {
                            set(pi * nun + drv.off + dni, ge, inhib);
                        }
                    }
                }
                (true, true) => {
                    let (dpyn, dpxn) = dly.shape.pool_dims();
                    let pyr = dpyn as f64 / pyn as f64;
                    let pxr = dpxn as f64 / pxn as f64;
                    for py in 0..pyn {
                        let ys = round_idx(py as f64 * pyr)..round_idx((py + 1) as f64 * pyr);
                        for px in 0..pxn {
                            let xs = round_idx(px as f64 * pxr)..round_idx((px + 1) as f64 * pxr);
                            let pni = (py * pxn + px) * nun;
                            for dni in 0..dly.shape.units_per_pool() {
                                let (max, avg) = pools_max_avg(dly, dni, ys.clone(), xs.clone());
                                set(pni + drv.off + dni, pp.ge_from_max_avg(max, avg), inhib);
                            }
                        }
                    }
                }
            }
        }
        Some(drives)
    }

    /// Burst-quarter conductances: driven units mix suppressed regular input with the drive.
    /// Undriven units keep their previous conductances.
    pub(crate) fn pulvinar_g_from_inc(&mut self, drives: &[Option<Drive>]) {
        for (nrn, drv) in self.neurons.iter_mut().zip(drives) {
            let Some(drv) = drv else {
                continue;
            };
            if nrn.is_off() {
                continue;
            }
            let ge_raw = (1.0 - drv.inhib) * nrn.ge_raw + drv.ge;
            self.act.ge_from_raw(nrn, ge_raw);
            self.act.gi_from_raw(nrn, nrn.gi_raw);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deepleabra_npu_neural::LayerShape;

    fn lookup_in(layers: &[Layer]) -> impl Fn(&str) -> Option<LayerIndex> + '_ {
        move |nm| layers.iter().position(|l| l.name == nm).map(LayerIndex)
    }

    #[test]
    fn test_drive_ge_linear_and_binarized() {
        let mut pp = PulvinarParams::default();
        assert!((pp.drive_ge(1.0) - 0.3).abs() < 1e-7);
        pp.binarize = true;
        assert_eq!(pp.drive_ge(0.5), 0.3);
        assert_eq!(pp.drive_ge(0.39), 0.0);
        assert_eq!(pp.drive_inhib(0.3), 0.5);
        assert_eq!(pp.drive_inhib(0.9), 1.0);
    }

    #[test]
    fn test_driver_offsets_and_size_check() {
        let mut layers = vec![
            Layer::new("A", LayerShape::new_2d(1, 2), LayerKind::Input),
            Layer::new("B", LayerShape::new_4d(2, 2, 1, 3), LayerKind::Super),
            Layer::new("P", LayerShape::new_2d(1, 5), LayerKind::Pulvinar),
        ];
        layers[2].add_drivers(&["A", "B"]);
        let res = layers[2].resolve_drivers(&layers, lookup_in(&layers)).unwrap();
        assert_eq!(res[0].off, 0);
        assert_eq!(res[1].off, 2);

        layers[2].add_drivers(&["A"]);
        let err = layers[2].resolve_drivers(&layers, lookup_in(&layers)).unwrap_err();
        assert!(matches!(err, EngineError::InvalidDriver { .. }));

        layers[2].deep.drivers = vec![Driver::new("Nope")];
        assert!(layers[2].resolve_drivers(&layers, lookup_in(&layers)).is_err());
    }

    #[test]
    fn test_2d_driver_suppresses_regular_input() {
        let mut layers = vec![
            Layer::new("In", LayerShape::new_2d(1, 2), LayerKind::Input),
            Layer::new("InP", LayerShape::new_2d(1, 2), LayerKind::Pulvinar),
        ];
        layers[0].neurons[0].act = 0.95;
        layers[0].neurons[1].act = 0.0;
        layers[0].avg_max_act();
        layers[1].add_drivers(&["In"]);
        let res = layers[1].resolve_drivers(&layers, lookup_in(&layers)).unwrap();
        layers[1].links.drivers = res;

        let mut ctx = Context::default();
        ctx.quarter = 2;
        assert!(layers[1].driver_drives(&ctx, &layers).is_none());
        ctx.quarter = 3;
        let drives = layers[1].driver_drives(&ctx, &layers).unwrap();
        let d0 = drives[0].unwrap();
        assert_eq!(d0.inhib, 1.0);
        assert!((d0.ge - 0.3).abs() < 1e-6);
        assert_eq!(drives[1].unwrap().ge, 0.0);

        let pulv = &mut layers[1];
        pulv.neurons[1].ge_raw = 0.5;
        pulv.pulvinar_g_from_inc(&drives);
        assert!(pulv.neurons[0].ge > 0.0);
        assert_eq!(pulv.neurons[1].ge, 0.0);
    }

    #[test]
    fn test_4d_driver_to_2d_takes_pool_max() {
        let mut layers = vec![
            Layer::new("V", LayerShape::new_4d(1, 2, 1, 1), LayerKind::Input),
            Layer::new("VP", LayerShape::new_2d(1, 1), LayerKind::Pulvinar),
        ];
        layers[0].neurons[0].act = 0.05;
        layers[0].neurons[1].act = 0.08;
        layers[0].avg_max_act();
        layers[1].add_drivers(&["V"]);
        layers[1].links.drivers = layers[1].resolve_drivers(&layers, lookup_in(&layers)).unwrap();
        let mut ctx = Context::default();
        ctx.quarter = 3;
        let drives = layers[1].driver_drives(&ctx, &layers).unwrap();
        // below the normalization threshold the raw max is used
        assert!((drives[0].unwrap().ge - 0.3 * 0.08).abs() < 1e-6);
    }

    #[test]
    fn test_4d_topo_windows() {
        let mut layers = vec![
            Layer::new("V", LayerShape::new_4d(1, 4, 1, 1), LayerKind::Input),
            Layer::new("VP", LayerShape::new_4d(1, 2, 1, 1), LayerKind::Pulvinar),
        ];
        for (i, nrn) in layers[0].neurons.iter_mut().enumerate() {
            nrn.act = [0.0, 1.0, 0.0, 0.0][i];
        }
        layers[0].avg_max_act();
        layers[1].add_drivers(&["V"]);
        layers[1].links.drivers = layers[1].resolve_drivers(&layers, lookup_in(&layers)).unwrap();
        let mut ctx = Context::default();
        ctx.quarter = 3;
        let drives = layers[1].driver_drives(&ctx, &layers).unwrap();
        assert!((drives[0].unwrap().ge - 0.3).abs() < 1e-6);
        assert_eq!(drives[1].unwrap().ge, 0.0);

        layers[1].deep.pulvinar.no_topo = true;
        let drives = layers[1].driver_drives(&ctx, &layers).unwrap();
        assert!((drives[1].unwrap().ge - 0.3).abs() < 1e-6);
    }
}
