// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Time courses of PFC maintenance, one per row of deep-layer units.

/// One maintenance time course: starts at `init`, rises to 1 over
/// `rise_tau` gate counts, then decays over `decay_tau`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct PFCDyn {
    pub init: f32,
    pub rise_tau: f32,
    pub decay_tau: f32,
    pub desc: String,
}

impl PFCDyn {
    pub fn new(init: f32, rise_tau: f32, decay_tau: f32, desc: impl Into<String>) -> Self {
        Self {
            init,
            rise_tau,
            decay_tau,
            desc: desc.into(),
        }
    }

    /// Value at `time` gate counts after gating; clamped to `[0.001, 1]`.
    pub fn value(&self, time: f32) -> f32 {
        if time <= 0.0 {
            return self.init;
        }
        let val = if self.rise_tau > 0.0 && self.decay_tau > 0.0 {
            if time >= self.rise_tau {
                1.0 - (time - self.rise_tau) / self.decay_tau
            } else {
                self.init + (1.0 - self.init) * (time / self.rise_tau)
            }
        } else if self.rise_tau > 0.0 {
            self.init + (1.0 - self.init) * (time / self.rise_tau)
        } else if self.decay_tau > 0.0 {
            self.init - self.init * (time / self.decay_tau)
        } else {
            self.init
        };
        val.clamp(0.001, 1.0)
    }
}

/// Maintenance dynamics, indexed by unit row modulo the list length.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct PFCDyns(pub Vec<PFCDyn>);

impl PFCDyns {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Single stable maintenance course.
    pub fn maint_only() -> Self {
        Self(vec![PFCDyn::new(1.0, 0.0, 0.0, "maintained, stable")])
    }

    /// Five courses: stable, phasic, rising, decaying, rise then decay.
    pub fn full_dyn(tau: f32) -> Self {
        Self(vec![
            PFCDyn::new(1.0, 0.0, 0.0, "maintained, stable"),
            PFCDyn::new(1.0, 0.0, 1.0, "phasic, transient"),
            PFCDyn::new(0.1, tau, 0.0, "rising maintenance"),
            PFCDyn::new(1.0, 0.0, tau, "decaying maintenance"),
            PFCDyn::new(0.1, 0.5 * tau, tau, "rise then decay"),
        ])
    }

    /// Value of course `dyn_idx` at `time`; 1 when no courses are configured.
    pub fn value(&self, dyn_idx: usize, time: f32) -> f32 {
        if self.0.is_empty() {
            return 1.0;
        }
        self.0[dyn_idx % self.0.len()].value(time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_dyn_values() {
        let dyns = PFCDyns::full_dyn(10.0);
        assert_eq!(dyns.len(), 5);
        // stable
        assert_eq!(dyns.value(0, 5.0), 1.0);
        // phasic: gone after one count
        assert_eq!(dyns.value(1, 0.0), 1.0);
        assert_eq!(dyns.value(1, 1.0), 0.001);
        // rising
        assert!((dyns.value(2, 5.0) - 0.55).abs() < 1e-6);
        assert_eq!(dyns.value(2, 20.0), 1.0);
        // decaying
        assert!((dyns.value(3, 5.0) - 0.5).abs() < 1e-6);
        // rise then decay
        assert!((dyns.value(4, 2.5) - 0.55).abs() < 1e-6);
        assert!((dyns.value(4, 10.0) - 0.5).abs() < 1e-6);
        // wraps around
        assert_eq!(dyns.value(5, 5.0), dyns.value(0, 5.0));
    }

    #[test]
    fn test_empty_dyns_are_one() {
        assert_eq!(PFCDyns::default().value(3, 4.0), 1.0);
        assert_eq!(PFCDyns::maint_only().value(0, 1e6), 1.0);
    }
}
