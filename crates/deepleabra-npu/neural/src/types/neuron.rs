// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Neuron State
//!
//! Per-unit state of the rate-code neuron, including the auxiliary fields used by
//! deep (burst / context) and PBWM (gating / maintenance) layers.
//!
//! Every `f32` field that is visible to tooling is listed in [`NEURON_VAR_NAMES`];
//! the list order defines the variable index used by `var_by_index`.

use super::error::{NeuralError, NeuralResult};

/// Bit flags on a neuron.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct NeuronFlags(u8);

impl NeuronFlags {
    /// Lesioned / inactive
    pub const OFF: u8 = 1 << 0;
    /// Has external input in `ext`
    pub const HAS_EXT: u8 = 1 << 1;
    /// Has a target value in `targ`
    pub const HAS_TARG: u8 = 1 << 2;
    /// Has a comparison value in `targ` (not used for learning)
    pub const HAS_CMPR: u8 = 1 << 3;

    /// Mask of all external-input flags.
    pub const EXT_MASK: u8 = Self::HAS_EXT | Self::HAS_TARG | Self::HAS_CMPR;

    #[inline]
    pub const fn has(self, flag: u8) -> bool {
        self.0 & flag != 0
    }

    #[inline]
    pub fn set(&mut self, mask: u8) {
        self.0 |= mask;
    }

    #[inline]
    pub fn clear(&mut self, mask: u8) {
        self.0 &= !mask;
    }
}

/// Names of the neuron-level variables, in index order.
pub const NEURON_VAR_NAMES: &[&str] = &[
    "Act", "ActLrn", "Ge", "Gi", "Gk", "Inet", "Vm", "Targ", "Ext", "AvgSS", "AvgS", "AvgM",
    "AvgL", "AvgLLrn", "AvgSLrn", "ActQ0", "ActQ1", "ActQ2", "ActM", "ActP", "ActDif", "ActDel",
    "ActAvg", "Noise", "GiSyn", "GiSelf", "ActSent", "GeRaw", "GiRaw", "Burst", "BurstPrv",
    "CtxtGe", "ActG", "Maint", "MaintGe", "DALrn", "Shunt",
];

/// Rate-code neuron state.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct Neuron {
    pub flags: NeuronFlags,
    /// Index of the sub-pool this neuron belongs to (0 if the layer has no sub-pools)
    pub sub_pool: usize,

    pub act: f32,
    pub act_lrn: f32,
    pub ge: f32,
    pub gi: f32,
    pub gk: f32,
    pub inet: f32,
    pub vm: f32,
    pub targ: f32,
    pub ext: f32,

    pub avg_ss: f32,
    pub avg_s: f32,
    pub avg_m: f32,
    pub avg_l: f32,
    pub avg_l_lrn: f32,
    pub avg_s_lrn: f32,

    pub act_q0: f32,
    pub act_q1: f32,
    pub act_q2: f32,
    pub act_m: f32,
    pub act_p: f32,
    pub act_dif: f32,
    pub act_del: f32,
    pub act_avg: f32,
    pub noise: f32,

    pub gi_syn: f32,
    pub gi_self: f32,
    pub act_sent: f32,
    pub ge_raw: f32,
    pub ge_inc: f32,
    pub gi_raw: f32,
    pub gi_inc: f32,

    // deep
    /// Thresholded superficial activation during burst quarters
    pub burst: f32,
    /// `burst` from the previous burst quarter
    pub burst_prv: f32,
    /// Standing context conductance from CTCtxt pathways
    pub ctxt_ge: f32,

    // pbwm
    /// Activation recorded at the moment of gating
    pub act_g: f32,
    /// Maintained activation captured at gating
    pub maint: f32,
    /// Maintenance conductance added to GeRaw every cycle
    pub maint_ge: f32,
    /// Dopamine learning factor (receptor and gain adjusted)
    pub da_lrn: f32,
    /// Patch shunting signal
    pub shunt: f32,
}

impl Neuron {
    #[inline]
    pub fn is_off(&self) -> bool {
        self.flags.has(NeuronFlags::OFF)
    }

    #[inline]
    pub fn has_flag(&self, flag: u8) -> bool {
        self.flags.has(flag)
    }

    /// Index of a variable name in [`NEURON_VAR_NAMES`].
    pub fn var_index(name: &str) -> NeuralResult<usize> {
        NEURON_VAR_NAMES
            .iter()
            .position(|n| *n == name)
            .ok_or_else(|| NeuralError::UnknownVariable(name.to_string()))
    }

    /// Value of the variable at `idx`, or NaN for an invalid index.
    pub fn var_by_index(&self, idx: usize) -> f32 {
        match idx {
            0 => self.act,
            1 => self.act_lrn,
            2 => self.ge,
            3 => self.gi,
            4 => self.gk,
            5 => self.inet,
            6 => self.vm,
            7 => self.targ,
            8 => self.ext,
            9 => self.avg_ss,
            10 => self.avg_s,
            11 => self.avg_m,
            12 => self.avg_l,
            13 => self.avg_l_lrn,
            14 => self.avg_s_lrn,
            15 => self.act_q0,
            16 => self.act_q1,
            17 => self.act_q2,
            18 => self.act_m,
            19 => self.act_p,
            20 => self.act_dif,
            21 => self.act_del,
            22 => self.act_avg,
            23 => self.noise,
            24 => self.gi_syn,
            25 => self.gi_self,
            26 => self.act_sent,
            27 => self.ge_raw,
            28 => self.gi_raw,
            29 => self.burst,
            30 => self.burst_prv,
            31 => self.ctxt_ge,
            32 => self.act_g,
            33 => self.maint,
            34 => self.maint_ge,
            35 => self.da_lrn,
            36 => self.shunt,
            _ => f32::NAN,
        }
    }

    /// Set the variable at `idx`. Returns false for an invalid index.
    pub fn set_var_by_index(&mut self, idx: usize, val: f32) -> bool {
        let slot = match idx {
            0 => &mut self.act,
            1 => &mut self.act_lrn,
            2 => &mut self.ge,
            3 => &mut self.gi,
            4 => &mut self.gk,
            5 => &mut self.inet,
            6 => &mut self.vm,
            7 => &mut self.targ,
            8 => &mut self.ext,
            9 => &mut self.avg_ss,
            10 => &mut self.avg_s,
            11 => &mut self.avg_m,
            12 => &mut self.avg_l,
            13 => &mut self.avg_l_lrn,
            14 => &mut self.avg_s_lrn,
            15 => &mut self.act_q0,
            16 => &mut self.act_q1,
            17 => &mut self.act_q2,
            18 => &mut self.act_m,
            19 => &mut self.act_p,
            20 => &mut self.act_dif,
            21 => &mut self.act_del,
            22 => &mut self.act_avg,
            23 => &mut self.noise,
            24 => &mut self.gi_syn,
            25 => &mut self.gi_self,
            26 => &mut self.act_sent,
            27 => &mut self.ge_raw,
            28 => &mut self.gi_raw,
            29 => &mut self.burst,
            30 => &mut self.burst_prv,
            31 => &mut self.ctxt_ge,
            32 => &mut self.act_g,
            33 => &mut self.maint,
            34 => &mut self.maint_ge,
            35 => &mut self.da_lrn,
            36 => &mut self.shunt,
            _ => return false,
        };
        *slot = val;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_var_table_covers_every_index() {
        let mut nrn = Neuron::default();
        for (i, _) in NEURON_VAR_NAMES.iter().enumerate() {
            assert!(nrn.set_var_by_index(i, i as f32 + 0.5));
            assert_eq!(nrn.var_by_index(i), i as f32 + 0.5);
        }
        assert!(nrn.var_by_index(NEURON_VAR_NAMES.len()).is_nan());
    }

    #[test]
    fn test_var_index_lookup() {
        assert_eq!(Neuron::var_index("Act"), Ok(0));
        assert_eq!(Neuron::var_index("MaintGe"), Ok(34));
        assert!(matches!(
            Neuron::var_index("Bogus"),
            Err(NeuralError::UnknownVariable(_))
        ));
    }

    #[test]
    fn test_flags() {
        let mut nrn = Neuron::default();
        nrn.flags.set(NeuronFlags::HAS_EXT | NeuronFlags::HAS_TARG);
        assert!(nrn.has_flag(NeuronFlags::HAS_EXT));
        nrn.flags.clear(NeuronFlags::EXT_MASK);
        assert!(!nrn.has_flag(NeuronFlags::HAS_TARG));
        assert!(!nrn.is_off());
    }
}
