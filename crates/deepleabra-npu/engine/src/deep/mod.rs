// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Deep Predictive Learning
//!
//! Superficial layers compute a thresholded `burst` during their burst
//! quarters. At the end of a burst quarter the burst is sent once over
//! `CTCtxt` pathways; CT layers drain those accumulators into a standing
//! context conductance that persists until the next burst quarter.
//!
//! Pulvinar layers relay predictions in the minus phase and, during their
//! burst quarter, are driven by driver layers whose strength suppresses
//! the predictive input.
//!
//! ```text
//!   Super --burst--> CTCtxt --> CT --Forward--> Pulvinar <--driver-- Super
//!     ^                                            |
//!     +---------------------Back-------------------+
//! ```

pub mod burst;
pub mod ctxt;
pub mod pulvinar;
pub mod topo;

pub use burst::BurstParams;
pub use pulvinar::{Driver, PulvinarParams};
pub use topo::TopoInhibParams;

pub(crate) use pulvinar::{Drive, ResolvedDriver};

use crate::layer::{Layer, LayerKind};

/// Deep-extension parameters carried by every layer; each kind uses its subset.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct DeepParams {
    /// Burst computation on Super layers and burst quarters on CT layers
    pub burst: BurstParams,
    /// Topographic pool inhibition on 4D layers
    pub topo: TopoInhibParams,
    pub pulvinar: PulvinarParams,
    /// Driver layers of a Pulvinar layer, in offset order
    pub drivers: Vec<Driver>,
}

impl DeepParams {
    /// Reset parameters, keeping the driver list.
    pub fn reset_params(&mut self) {
        self.burst = BurstParams::default();
        self.topo = TopoInhibParams::default();
        self.pulvinar = PulvinarParams::default();
    }

    /// Add driver layers by name.
    pub fn add_drivers<S: AsRef<str>>(&mut self, names: &[S]) {
        self.drivers
            .extend(names.iter().map(|nm| Driver::new(nm.as_ref())));
    }
}

impl Layer {
    /// Deep layers keep their state across trials.
    pub(crate) fn deep_defaults(&mut self) {
        self.act.init.decay = 0.0;
        if self.kind == LayerKind::CT {
            // first activations can be far off
            self.inhib.act_avg.use_first = false;
        }
    }
}
