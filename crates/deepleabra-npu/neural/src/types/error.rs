// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Error types for neural state access

/// Errors raised by variable lookups and shape checks.
///
/// Hot numeric accessors (`unit_value_1d`, `syn_value_1d`) never return these;
/// they yield `f32::NAN` for bad indexes so a running simulation is never halted
/// by a display read.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NeuralError {
    #[error("unknown variable name: {0}")]
    UnknownVariable(String),

    #[error("index {index} out of range (len {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("shape mismatch: expected {expected} values, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },
}

pub type NeuralResult<T> = Result<T, NeuralError>;
