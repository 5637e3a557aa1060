// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Synapse state.
//!
//! Synapses live in a flat array owned by their pathway, ordered by sender.
//! `ntr` / `tr` are only used by trace-learning pathways and stay zero elsewhere.

use super::error::{NeuralError, NeuralResult};

/// Names of the synapse-level variables, in index order.
pub const SYNAPSE_VAR_NAMES: &[&str] = &["Wt", "LWt", "DWt", "Norm", "Moment", "Scale", "NTr", "Tr"];

#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct Synapse {
    /// Effective (sigmoid-contrast, scaled) weight
    pub wt: f32,
    /// Linear weight, the value learning operates on
    pub lwt: f32,
    /// Pending weight change
    pub dwt: f32,
    /// Running max of |dwt| for normalization
    pub norm: f32,
    /// Momentum accumulator
    pub moment: f32,
    /// Per-synapse scale multiplier on `wt`
    pub scale: f32,
    /// New trace increment from the last learning step
    pub ntr: f32,
    /// Eligibility trace
    pub tr: f32,
}

impl Synapse {
    pub fn var_index(name: &str) -> NeuralResult<usize> {
        SYNAPSE_VAR_NAMES
            .iter()
            .position(|n| *n == name)
            .ok_or_else(|| NeuralError::UnknownVariable(name.to_string()))
    }

    pub fn var_by_index(&self, idx: usize) -> f32 {
        match idx {
            0 => self.wt,
            1 => self.lwt,
            2 => self.dwt,
            3 => self.norm,
            4 => self.moment,
            5 => self.scale,
            6 => self.ntr,
            7 => self.tr,
            _ => f32::NAN,
        }
    }

    pub fn set_var_by_index(&mut self, idx: usize, val: f32) -> bool {
        let slot = match idx {
            0 => &mut self.wt,
            1 => &mut self.lwt,
            2 => &mut self.dwt,
            3 => &mut self.norm,
            4 => &mut self.moment,
            5 => &mut self.scale,
            6 => &mut self.ntr,
            7 => &mut self.tr,
            _ => return false,
        };
        *slot = val;
        true
    }
}
