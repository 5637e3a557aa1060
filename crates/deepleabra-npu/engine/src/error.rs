// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Engine error types.
//!
//! Every variant except `Variable` is a build-time configuration failure:
//! `Network::build` returns it and the network refuses to cycle. Per-cycle
//! methods are infallible.

use deepleabra_npu_neural::NeuralError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Layer not found: {0}")]
    LayerNotFound(String),

    #[error("Duplicate layer name: {0}")]
    DuplicateLayer(String),

    #[error("Layer {layer}: send-to target not found: {target}")]
    InvalidSendTo { layer: String, target: String },

    #[error("Layer {layer}: missing required pathway: {what}")]
    MissingPath { layer: String, what: String },

    #[error("Pulvinar layer {layer}: {reason}")]
    InvalidDriver { layer: String, reason: String },

    #[error("Pathway {send} -> {recv}: {reason}")]
    PatternMismatch {
        send: String,
        recv: String,
        reason: String,
    },

    #[error("Network has not been built")]
    NotBuilt,

    #[error(transparent)]
    Variable(#[from] NeuralError),
}

pub type Result<T> = std::result::Result<T, EngineError>;
