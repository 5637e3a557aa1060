// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/// Running average and maximum over a set of values, with the index of the max.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct AvgMax {
    pub avg: f32,
    pub max: f32,
    pub max_idx: i32,
    pub sum: f32,
    pub n: i32,
}

impl Default for AvgMax {
    fn default() -> Self {
        Self {
            avg: 0.0,
            max: -f32::MAX,
            max_idx: -1,
            sum: 0.0,
            n: 0,
        }
    }
}

impl AvgMax {
    /// Reset for a new accumulation pass.
    #[inline]
    pub fn init(&mut self) {
        *self = Self::default();
    }

    #[inline]
    pub fn update_val(&mut self, val: f32, idx: usize) {
        self.sum += val;
        self.n += 1;
        if val > self.max {
            self.max = val;
            self.max_idx = idx as i32;
        }
    }

    /// Finalize the average. With no values, avg and max both become the (zero) sum.
    #[inline]
    pub fn calc_avg(&mut self) {
        if self.n > 0 {
            self.avg = self.sum / self.n as f32;
        } else {
            self.avg = self.sum;
            self.max = self.avg;
        }
    }

    /// Scale the summary stats toward zero by `decay`.
    #[inline]
    pub fn decay(&mut self, decay: f32) {
        self.max -= decay * self.max;
        self.avg -= decay * self.avg;
    }
}
