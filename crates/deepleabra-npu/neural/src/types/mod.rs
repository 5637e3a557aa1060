// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Core state types shared by every layer and pathway kind.

pub mod context;
pub mod error;
pub mod minmax;
pub mod neuron;
pub mod pool;
pub mod shape;
pub mod synapse;

pub use context::{Context, Quarters};
pub use error::{NeuralError, NeuralResult};
pub use minmax::AvgMax;
pub use neuron::{Neuron, NeuronFlags, NEURON_VAR_NAMES};
pub use pool::{GateState, Pool, PoolActAvg};
pub use shape::LayerShape;
pub use synapse::{Synapse, SYNAPSE_VAR_NAMES};
