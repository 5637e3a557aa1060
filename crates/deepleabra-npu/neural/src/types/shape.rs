// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Layer Geometry
//!
//! Layers are either 2D `[y, x]` or 4D `[pool_y, pool_x, unit_y, unit_x]`,
//! stored row-major. All flat-index arithmetic for pooled layers goes through
//! this type instead of being repeated inline.

use super::error::{NeuralError, NeuralResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum LayerShape {
    TwoD { y: usize, x: usize },
    FourD { pool_y: usize, pool_x: usize, unit_y: usize, unit_x: usize },
}

impl LayerShape {
    pub const fn new_2d(y: usize, x: usize) -> Self {
        LayerShape::TwoD { y, x }
    }

    pub const fn new_4d(pool_y: usize, pool_x: usize, unit_y: usize, unit_x: usize) -> Self {
        LayerShape::FourD { pool_y, pool_x, unit_y, unit_x }
    }

    #[inline]
    pub const fn is_4d(&self) -> bool {
        matches!(self, LayerShape::FourD { .. })
    }

    /// Total number of units.
    pub const fn len(&self) -> usize {
        match *self {
            LayerShape::TwoD { y, x } => y * x,
            LayerShape::FourD { pool_y, pool_x, unit_y, unit_x } => pool_y * pool_x * unit_y * unit_x,
        }
    }

    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of sub-pools (0 for 2D layers).
    pub const fn n_pools(&self) -> usize {
        match *self {
            LayerShape::TwoD { .. } => 0,
            LayerShape::FourD { pool_y, pool_x, .. } => pool_y * pool_x,
        }
    }

    /// Pool grid dimensions `(pool_y, pool_x)`; `(1, 1)` for 2D layers.
    pub const fn pool_dims(&self) -> (usize, usize) {
        match *self {
            LayerShape::TwoD { .. } => (1, 1),
            LayerShape::FourD { pool_y, pool_x, .. } => (pool_y, pool_x),
        }
    }

    /// Unit dimensions within one pool; the whole layer for 2D shapes.
    pub const fn unit_dims(&self) -> (usize, usize) {
        match *self {
            LayerShape::TwoD { y, x } => (y, x),
            LayerShape::FourD { unit_y, unit_x, .. } => (unit_y, unit_x),
        }
    }

    /// Units per pool (the whole layer for 2D shapes).
    pub const fn units_per_pool(&self) -> usize {
        let (uy, ux) = self.unit_dims();
        uy * ux
    }

    /// Raw dimensions; 2D shapes pad the trailing two with zeros.
    pub const fn dims(&self) -> [usize; 4] {
        match *self {
            LayerShape::TwoD { y, x } => [y, x, 0, 0],
            LayerShape::FourD { pool_y, pool_x, unit_y, unit_x } => [pool_y, pool_x, unit_y, unit_x],
        }
    }

    /// Flat index of `(y, x)` in a 2D layer.
    pub fn offset_2d(&self, y: usize, x: usize) -> NeuralResult<usize> {
        let (ny, nx) = self.unit_dims();
        if self.is_4d() || y >= ny || x >= nx {
            return Err(NeuralError::IndexOutOfRange { index: y * nx + x, len: self.len() });
        }
        Ok(y * nx + x)
    }

    /// Flat index of `(pool_y, pool_x, unit_y, unit_x)` in a 4D layer.
    pub fn offset_4d(&self, py: usize, px: usize, uy: usize, ux: usize) -> NeuralResult<usize> {
        let (npy, npx) = self.pool_dims();
        let (nuy, nux) = self.unit_dims();
        if !self.is_4d() || py >= npy || px >= npx || uy >= nuy || ux >= nux {
            return Err(NeuralError::IndexOutOfRange { index: 0, len: self.len() });
        }
        Ok(self.pool_unit_index(py * npx + px, uy * nux + ux))
    }

    /// Flat neuron index of unit `ui` inside zero-based pool `pi`.
    #[inline]
    pub const fn pool_unit_index(&self, pi: usize, ui: usize) -> usize {
        pi * self.units_per_pool() + ui
    }

    /// `(pool_y, pool_x)` of zero-based pool index `pi`.
    #[inline]
    pub const fn pool_coords(&self, pi: usize) -> (usize, usize) {
        let (_, npx) = self.pool_dims();
        (pi / npx, pi % npx)
    }

    /// Zero-based pool index and within-pool unit index of flat neuron `ni`.
    #[inline]
    pub const fn split_index(&self, ni: usize) -> (usize, usize) {
        let nun = self.units_per_pool();
        if nun == 0 {
            return (0, 0);
        }
        (ni / nun, ni % nun)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_2d_shape() {
        let sh = LayerShape::new_2d(4, 3);
        assert_eq!(sh.len(), 12);
        assert_eq!(sh.n_pools(), 0);
        assert_eq!(sh.offset_2d(2, 1), Ok(7));
        assert!(sh.offset_2d(4, 0).is_err());
        assert!(sh.offset_4d(0, 0, 0, 0).is_err());
    }

    #[test]
    fn test_4d_shape_indexing() {
        let sh = LayerShape::new_4d(2, 3, 2, 2);
        assert_eq!(sh.len(), 24);
        assert_eq!(sh.n_pools(), 6);
        assert_eq!(sh.units_per_pool(), 4);
        // pool (1, 2) is the 6th pool; unit (1, 0) is its 3rd unit
        assert_eq!(sh.offset_4d(1, 2, 1, 0), Ok(5 * 4 + 2));
        assert_eq!(sh.pool_coords(5), (1, 2));
        assert_eq!(sh.split_index(22), (5, 2));
        assert!(sh.offset_4d(2, 0, 0, 0).is_err());
    }
}
