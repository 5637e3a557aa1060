// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

//! # DeepLeabra Engine
//!
//! Discrete-time network engine for rate-code cortical models with two
//! extensions on top of the base Leabra update:
//! - **deep**: superficial burst, delayed CT context, pulvinar relay with
//!   driver-based plus phase, topographic pool inhibition
//! - **pbwm**: basal-ganglia gating of PFC working memory (Matrix Go/NoGo,
//!   GPiThal, PFC maintenance), neuromodulator broadcast, trace learning
//!
//! ## Architecture
//! - Layers and pathways live in arenas on [`Network`], addressed by
//!   [`LayerIndex`] / [`PathIndex`]; names resolve once in [`Network::build`]
//! - One [`Layer`] type dispatches on [`LayerKind`]; one [`Path`] type on [`PathKind`]
//! - Rayon runs each cycle phase across layers or pathways; a phase finishes
//!   everywhere before the next one starts
//! - Pathways accumulate into private buffers that receivers merge, so no
//!   two threads ever write the same memory
//!
//! ## Usage
//!
//! ```
//! use deepleabra_npu_engine::{Network, LayerKind, PathKind, Pattern};
//! use deepleabra_npu_neural::Context;
//!
//! let mut net = Network::new("Demo");
//! let inp = net.add_layer_2d("Input", 4, 1, LayerKind::Input);
//! let hid = net.add_layer_2d("Hidden", 4, 1, LayerKind::Super);
//! net.connect_layers(inp, hid, Pattern::OneToOne, PathKind::Forward);
//! net.build().unwrap();
//! net.init_weights();
//!
//! net.apply_ext("Input", &[1.0, 0.0, 0.0, 0.0]).unwrap();
//! net.alpha_cyc_init(true);
//! let mut ctx = Context::default();
//! ctx.alpha_cyc_start();
//! for _ in 0..4 {
//!     for _ in 0..ctx.cyc_per_qtr {
//!         net.cycle(&ctx);
//!         ctx.cycle_inc();
//!     }
//!     net.quarter_final(&ctx);
//!     ctx.quarter_inc();
//! }
//! net.dwt();
//! net.wt_from_dwt();
//! ```

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod builders;
pub mod capability;
pub mod deep;
pub mod error;
pub mod layer;
pub mod network;
pub mod neuromod;
pub mod path;
pub mod pattern;
pub mod pbwm;
pub mod vars;

// Re-export key types
pub use builders::{DeepLayers, DorsalBG, PbwmLayers, PfcLayers};
pub use capability::{ComputesBurst, HasGateState, HasNeuromodulators, HasPools};
pub use deep::{BurstParams, DeepParams, Driver, PulvinarParams, TopoInhibParams};
pub use error::{EngineError, Result};
pub use layer::{Layer, LayerIndex, LayerKind};
pub use network::Network;
pub use neuromod::{Modulator, NeuroMod};
pub use path::{Path, PathIndex, PathKind};
pub use pattern::Pattern;
pub use pbwm::{
    CINParams, GPiGateParams, GateShape, GateType, MatrixParams, PFCDyn, PFCDyns, PFCGateParams,
    PFCMaintParams, PbwmParams,
};
pub use vars::LAYER_UNIT_VAR_NAMES;
