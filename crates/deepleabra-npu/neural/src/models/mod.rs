// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Rate-Code Neuron Model
//!
//! Conductance-based point neuron with a noisy X/(X+1) rate-code output.
//!
//! ```text
//! Inet = ge (Ee - Vm) + gl (El - Vm) + gi (Ei - Vm) + gk (Ek - Vm)
//! Vm  += VmDt * Inet
//! act  = NXX1(ge - ge_thr)        ge_thr: Ge that puts Vm exactly at threshold
//! ```

pub mod act;
pub mod chans;
pub mod nxx1;

pub use act::{ActParams, ClampParams, DtParams, InitParams, OptThreshParams};
pub use chans::Chans;
pub use nxx1::NXX1Params;
