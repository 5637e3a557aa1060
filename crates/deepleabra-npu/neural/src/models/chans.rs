// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Per-channel values: excitatory, leak, inhibitory and potassium.

#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct Chans {
    pub e: f32,
    pub l: f32,
    pub i: f32,
    pub k: f32,
}

impl Chans {
    pub const fn new(e: f32, l: f32, i: f32, k: f32) -> Self {
        Self { e, l, i, k }
    }

    /// Each channel of `other` minus `val`.
    pub fn other_minus(other: &Chans, val: f32) -> Self {
        Self::new(other.e - val, other.l - val, other.i - val, other.k - val)
    }

    /// `val` minus each channel of `other`.
    pub fn minus_other(val: f32, other: &Chans) -> Self {
        Self::new(val - other.e, val - other.l, val - other.i, val - other.k)
    }
}
