// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # DeepLeabra Neural Computation
//!
//! Platform-agnostic rate-code neural computation:
//! - **types**: neuron, synapse and pool state, gating state, time context, 2D/4D shapes
//! - **models**: conductance-based activation (`ActParams`) with the noisy XX1 rate code
//! - **inhib**: feed-forward / feed-back (FFFB) pooled inhibition, self inhibition,
//!   running-average activation
//!
//! ## Design Principles
//! - Plain data structs with `Default` impls carrying the standard parameters
//! - Per-neuron update functions take `&mut Neuron` and never allocate
//! - Float operation order is fixed so results are reproducible across platforms
//!
//! ## Usage
//!
//! ```
//! use deepleabra_npu_neural::{ActParams, Neuron};
//!
//! let act = ActParams::default();
//! let mut nrn = Neuron::default();
//! act.init_acts(&mut nrn);
//! nrn.ge_inc = 0.3;
//! act.g_raw_from_inc(&mut nrn);
//! let ge_raw = nrn.ge_raw;
//! act.ge_from_raw(&mut nrn, ge_raw);
//! act.vm_from_g(&mut nrn);
//! act.act_from_g(&mut nrn);
//! assert!(nrn.vm > act.init.vm);
//! ```

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod inhib;
pub mod models;
pub mod types;

// Re-export commonly used types
pub use inhib::{ActAvgParams, FFFBInhib, FFFBParams, InhibParams, SelfInhibParams};
pub use models::{ActParams, Chans, ClampParams, DtParams, NXX1Params};
pub use types::{
    AvgMax, Context, GateState, LayerShape, NeuralError, NeuralResult, Neuron, NeuronFlags,
    Pool, PoolActAvg, Quarters, Synapse, NEURON_VAR_NAMES, SYNAPSE_VAR_NAMES,
};
