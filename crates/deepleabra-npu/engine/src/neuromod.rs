// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Neuromodulator broadcast.
//!
//! Dopamine, acetylcholine and serotonin are layer-level scalars. Source
//! layers copy one value to every layer on their resolved send-to list at the
//! end of the cycle, outside the pathway machinery.

use crate::layer::{Layer, LayerKind};

/// Layer-level neuromodulator levels.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct NeuroMod {
    pub da: f32,
    pub ach: f32,
    pub se: f32,
}

impl NeuroMod {
    pub fn init(&mut self) {
        *self = Self::default();
    }

    #[inline]
    pub fn get(&self, which: Modulator) -> f32 {
        match which {
            Modulator::Da => self.da,
            Modulator::ACh => self.ach,
            Modulator::Se => self.se,
        }
    }

    #[inline]
    pub fn set(&mut self, which: Modulator, val: f32) {
        match which {
            Modulator::Da => self.da = val,
            Modulator::ACh => self.ach = val,
            Modulator::Se => self.se = val,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modulator {
    Da,
    ACh,
    Se,
}

impl Layer {
    /// Which modulator this layer broadcasts, if any.
    pub fn modulator_source(&self) -> Option<Modulator> {
        match self.kind {
            LayerKind::ClampDa => Some(Modulator::Da),
            LayerKind::CIN => Some(Modulator::ACh),
            LayerKind::ClampSe => Some(Modulator::Se),
            _ => None,
        }
    }

    /// First-unit activation as the broadcast value; also kept as this layer's own level.
    pub(crate) fn mod_from_act(&mut self) -> Option<(Modulator, f32)> {
        let which = self.modulator_source()?;
        let val = self.neurons.first().map_or(0.0, |n| n.act);
        self.neuro_mod.set(which, val);
        Some((which, val))
    }
}
