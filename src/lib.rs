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

//! # DeepLeabra
//!
//! Per-cycle activation and learning engine for rate-code cortical networks,
//! with deep-layer (burst / CT context / pulvinar) and PBWM (basal-ganglia
//! gated PFC working memory) extensions.
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! deepleabra = "0.0.1-beta.18"
//! ```
//!
//! ```rust
//! use deepleabra::prelude::*;
//!
//! let config = DeepLeabraConfig::default();
//! let mut net = network_from_config("Demo", &config);
//! let inp = net.add_layer_2d("Input", 2, 2, LayerKind::Input);
//! let hid = net.add_layer_2d("Hidden", 2, 2, LayerKind::Super);
//! net.connect_layers(inp, hid, Pattern::Full, PathKind::Forward);
//! net.build()?;
//! net.init_weights();
//!
//! let mut ctx = context_from_config(&config);
//! net.apply_ext("Input", &[1.0, 0.0, 0.0, 1.0])?;
//! run_trial(&mut net, &mut ctx);
//! net.dwt();
//! net.wt_from_dwt();
//! # Ok::<(), EngineError>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  neural: Neuron, Synapse, Pool, Context, ActParams,     │
//! │          FFFB inhibition                                │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  plasticity: XCAL, running averages, weight init,       │
//! │              trace and dopamine modulation              │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  engine: Network arena, cycle scheduler, deep + PBWM    │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! `config` and `observability` sit beside the stack: settings files and
//! `tracing` subscriber setup.
//!
//! ## License
//!
//! Apache-2.0

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Re-export the NPU
pub use deepleabra_npu_engine as engine;
pub use deepleabra_npu_neural as neural;
pub use deepleabra_npu_plasticity as plasticity;

// Re-export infrastructure
pub use deepleabra_config as config;
pub use deepleabra_observability as observability;

use deepleabra_config::DeepLeabraConfig;
use deepleabra_npu_engine::Network;
use deepleabra_npu_neural::Context;
use deepleabra_observability::{LogConfigError, LoggingConfig};

/// Network with the thread count, weight-balance interval and seed from `config`.
pub fn network_from_config(name: impl Into<String>, config: &DeepLeabraConfig) -> Network {
    let mut net =
        Network::with_seed(name, config.engine.seed).with_threads(config.engine.threads);
    net.wt_bal_interval = config.engine.wt_bal_interval;
    net
}

/// Fresh time context using the configured cycle timing.
pub fn context_from_config(config: &DeepLeabraConfig) -> Context {
    Context::new(config.time.cyc_per_qtr, config.time.time_per_cyc)
}

/// Console logging settings from the `[logging]` section.
pub fn logging_from_config(config: &DeepLeabraConfig) -> Result<LoggingConfig, LogConfigError> {
    LoggingConfig::from_level_format(&config.logging.level, &config.logging.format)
}

/// One alpha cycle: four quarters of `cyc_per_qtr` cycles, with running
/// averages updated at the start. Learning is left to the caller.
pub fn run_trial(net: &mut Network, ctx: &mut Context) {
    net.alpha_cyc_init(true);
    ctx.alpha_cyc_start();
    for _ in 0..4 {
        for _ in 0..ctx.cyc_per_qtr {
            net.cycle(ctx);
            ctx.cycle_inc();
        }
        net.quarter_final(ctx);
        ctx.quarter_inc();
    }
}

/// Prelude - commonly used types and functions
pub mod prelude {
    pub use crate::{context_from_config, logging_from_config, network_from_config, run_trial};
    pub use deepleabra_config::{load_config, validate_config, DeepLeabraConfig};
    pub use deepleabra_npu_engine::{
        EngineError, Layer, LayerIndex, LayerKind, Network, Path, PathIndex, PathKind, Pattern,
    };
    pub use deepleabra_npu_neural::{Context, LayerShape, Neuron, Synapse};
    pub use deepleabra_observability::{init_logging, parse_debug_flags, CrateDebugFlags};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_from_config() {
        let mut config = DeepLeabraConfig::default();
        config.engine.wt_bal_interval = 3;
        let net = network_from_config("Cfg", &config);
        assert_eq!(net.wt_bal_interval, 3);
        assert_eq!(net.name, "Cfg");
        assert!(!net.is_built());
    }

    #[test]
    fn test_context_from_config() {
        let mut config = DeepLeabraConfig::default();
        config.time.cyc_per_qtr = 10;
        let ctx = context_from_config(&config);
        assert_eq!(ctx.cyc_per_qtr, 10);
        assert_eq!(ctx.cycle, 0);
    }

    #[test]
    fn test_logging_from_config() {
        let mut config = DeepLeabraConfig::default();
        config.logging.format = "json".to_string();
        let log = logging_from_config(&config).unwrap();
        assert_eq!(log.format, observability::LogFormat::Json);
        assert_eq!(log.level, "info");
    }
}
