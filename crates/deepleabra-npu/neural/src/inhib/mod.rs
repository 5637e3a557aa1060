// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Pooled inhibition.
//!
//! FFFB (feed-forward + feed-back) inhibition produces a graded k-winners-take-all
//! dynamic: FF tracks the average excitatory drive into a pool, FB tracks the
//! pool's average activation.

pub mod fffb;
pub mod params;

pub use fffb::{FFFBInhib, FFFBParams};
pub use params::{ActAvgParams, InhibParams, SelfInhibParams};
