// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # DeepLeabra Plasticity Module
//!
//! This crate implements the synaptic learning rules of the engine:
//! - XCAL check-mark function combining error-driven and BCM (self-organizing) terms
//! - Multi-timescale running averages of neuron activity (`AvgSS` .. `AvgL`)
//! - Sigmoidal weight contrast enhancement with soft bounding
//! - Weight-change normalization, momentum and weight balance
//! - Weight initialization and expected-activity input scaling
//! - Dopamine modulation and eligibility-trace parameters for three-factor learning
//!
//! ## Architecture
//! - Parameter structs are plain data with `Default` and an `update` that
//!   recomputes derived rates
//! - Learning functions operate on scalars or single neurons / synapses; the
//!   engine decides which synapses to visit and in which order

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod avgs;
pub mod init;
pub mod neuromod;
pub mod xcal;

// Re-export key types
pub use avgs::{AvgLParams, CosDiffParams, CosDiffStats, LearnNeurParams, LrnActAvgParams};
pub use init::{WtInitDist, WtInitParams, WtScaleParams};
pub use neuromod::{DaModParams, DaReceptors, TraceParams};
pub use xcal::{
    DWtNormParams, LearnSynParams, MomentumParams, WtBalParams, WtBalRecv, WtSigParams,
    XCalParams,
};
