// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Topographic inhibition between the pools of a 4D layer.
//!
//! Each pool's Gi is raised to the strongest Gaussian-weighted Gi of its
//! diagonal neighbors within `width`, with a layer-wide floor.

use crate::layer::Layer;
use ndarray::Array2;

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct TopoInhibParams {
    pub on: bool,
    /// Half-width of the neighborhood, in pools
    pub width: usize,
    /// Gaussian sigma as a proportion of `width`
    pub sigma: f32,
    /// Overall multiplier on neighbor inhibition
    pub gi: f32,
    /// Floor as a proportion of the max pool Gi in the layer
    pub lay_gi: f32,
}

impl Default for TopoInhibParams {
    fn default() -> Self {
        Self {
            on: false,
            width: 4,
            sigma: 0.5,
            gi: 10.0,
            lay_gi: 0.5,
        }
    }
}

impl TopoInhibParams {
    /// Weights by distance; index 0 is distance 1.
    pub fn weights(&self) -> Vec<f32> {
        let sig = self.width as f64 * self.sigma as f64;
        (0..self.width)
            .map(|i| {
                let x = (i + 1) as f64 / sig;
                self.gi * (-0.5 * x * x).exp() as f32
            })
            .collect()
    }
}

impl Layer {
    pub(crate) fn update_topo_wts(&mut self) {
        self.topo_wts = self.deep.topo.weights();
    }

    /// Raise each sub-pool's Gi to its strongest weighted neighbor, from the pre-max `gi_orig`.
    pub(crate) fn topo_gi(&mut self) {
        if !self.is_4d() || self.topo_wts.is_empty() {
            return;
        }
        let (pyn, pxn) = self.shape.pool_dims();
        let orig = Array2::from_shape_fn((pyn, pxn), |(py, px)| {
            self.pools[1 + py * pxn + px].inhib.gi_orig
        });
        let laymax = orig.iter().fold(0.0f32, |m, g| m.max(*g)) * self.deep.topo.lay_gi;
        let wd = self.topo_wts.len() as isize;
        let at = |py: isize, px: isize, d: usize| -> f32 {
            if py < 0 || px < 0 {
                return 0.0;
            }
            orig.get((py as usize, px as usize))
                .map_or(0.0, |g| self.topo_wts[d] * g)
        };
        let mut gis = Array2::from_elem((pyn, pxn), laymax);
        for ((py, px), mx) in gis.indexed_iter_mut() {
            let (py, px) = (py as isize, px as isize);
            for iy in 1..=wd {
                for ix in 1..=wd {
                    let d = (iy.min(ix) - 1) as usize;
                    *mx = mx
                        .max(at(py + iy, px + ix, d))
                        .max(at(py - iy, px + ix, d))
                        .max(at(py + iy, px - ix, d))
                        .max(at(py - iy, px - ix, d));
                }
            }
        }
        for ((py, px), mx) in gis.indexed_iter() {
            let pl = &mut self.pools[1 + py * pxn + px];
            pl.inhib.gi = pl.inhib.gi.max(*mx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::LayerKind;
    use deepleabra_npu_neural::LayerShape;

    #[test]
    fn test_weights_gaussian() {
        let tp = TopoInhibParams::default();
        let wts = tp.weights();
        assert_eq!(wts.len(), 4);
        // distance 1 with sigma 2: 10 * exp(-0.125)
        assert!((wts[0] - 8.824_969).abs() < 1e-4);
        assert!(wts[3] < wts[0]);
    }

    #[test]
    fn test_topo_gi_never_lowers_pool_gi() {
        let mut ly = Layer::new("V2", LayerShape::new_4d(3, 3, 1, 1), LayerKind::Super);
        ly.deep.topo.on = true;
        ly.update_params();
        for (i, pl) in ly.pools.iter_mut().enumerate().skip(1) {
            pl.inhib.gi_orig = if i == 1 { 0.2 } else { 0.0 };
            pl.inhib.gi = 0.9;
        }
        ly.topo_gi();
        // pool (0,0) only reaches diagonal neighbors; center gets the weight at distance 1
        let center = ly.pools[1 + 4].inhib.gi;
        assert!((center - 0.2 * ly.topo_wts[0]).abs() < 1e-5);
        assert!(ly.pools.iter().skip(1).all(|p| p.inhib.gi >= 0.9));
        // (0,1) is not diagonal to (0,0): only the layer floor applies
        assert_eq!(ly.pools[2].inhib.gi, 0.9);
    }
}
