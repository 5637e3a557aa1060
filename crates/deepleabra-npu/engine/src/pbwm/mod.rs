// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Prefrontal / Basal-Ganglia Working Memory
//!
//! Gating runs through a fixed chain every alpha cycle:
//!
//! ```text
//!   Matrix Go / NoGo --GPiThal paths--> GPiThal --gate states--> Matrix, PFC deep
//!        ^   (DA, ACh)                     |
//!   ClampDa, CIN                           +-- gating quarter, cycle `gpi.cycle`
//!
//!   PFC super --(act at gating)--> PFC deep maint --MaintGe--> PFC deep act
//! ```
//!
//! Every gating layer stores one [`GateState`](deepleabra_npu_neural::GateState)
//! per sub-pool. Pool coordinates are shared through [`GateShape`], which maps
//! Maint-only and Out-only pool indexes into the combined Maint+Out space.

pub mod cin;
pub mod gate;
pub mod gpi;
pub mod matrix;
pub mod pfc;
pub mod pfcdyn;

pub use cin::CINParams;
pub use gate::{GateShape, GateType};
pub use gpi::GPiGateParams;
pub use matrix::MatrixParams;
pub use pfc::{PFCGateParams, PFCMaintParams};
pub use pfcdyn::{PFCDyn, PFCDyns};

/// PBWM parameters carried by every layer; each kind uses its subset.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct PbwmParams {
    /// Gating geometry, gate type and dopamine receptor
    pub gate: GateShape,
    pub matrix: MatrixParams,
    pub gpi: GPiGateParams,
    pub pfc_gate: PFCGateParams,
    pub pfc_maint: PFCMaintParams,
    /// Maintenance profiles selected by unit row in PFC deep layers
    pub pfc_dyns: PFCDyns,
    pub cin: CINParams,
}

impl PbwmParams {
    /// Reset parameters, keeping geometry, output-gate role, dynamics table and reward layers.
    pub fn reset_params(&mut self) {
        let out_gate = self.pfc_gate.out_gate;
        let rew_lays = core::mem::take(&mut self.cin.rew_lays);
        self.matrix = MatrixParams::default();
        self.gpi = GPiGateParams::default();
        self.pfc_gate = PFCGateParams {
            out_gate,
            ..Default::default()
        };
        self.pfc_maint = PFCMaintParams::default();
        self.cin = CINParams {
            rew_lays,
            ..Default::default()
        };
    }
}
