// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Cholinergic interneurons: ACh from the magnitude of reward-layer activity.

use crate::layer::Layer;

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct CINParams {
    /// Reward magnitude above which activity is set to 1; 0 uses the raw magnitude
    pub rew_thr: f32,
    /// Layers whose absolute max activity signals reward
    pub rew_lays: Vec<String>,
}

impl Default for CINParams {
    fn default() -> Self {
        Self {
            rew_thr: 0.1,
            rew_lays: Vec::new(),
        }
    }
}

impl CINParams {
    #[inline]
    pub fn act_from_rew(&self, max_abs: f32) -> f32 {
        if self.rew_thr > 0.0 && max_abs > self.rew_thr {
            1.0
        } else {
            max_abs
        }
    }
}

impl Layer {
    /// Absolute max activity over the reward layers, given each one's pool-0 max.
    pub(crate) fn cin_act_from_rew(&mut self, rew_maxes: &[f32]) {
        let max_abs = rew_maxes.iter().fold(0.0f32, |mx, a| mx.max(a.abs()));
        let act = self.pbwm.cin.act_from_rew(max_abs);
        for nrn in self.neurons.iter_mut().filter(|n| !n.is_off()) {
            nrn.act = act;
            self.learn.avgs_from_act(nrn);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::LayerKind;
    use deepleabra_npu_neural::LayerShape;

    #[test]
    fn test_reward_magnitude_thresholded() {
        let mut cin = Layer::new("CIN", LayerShape::new_2d(1, 1), LayerKind::CIN);
        cin.cin_act_from_rew(&[0.05, -0.08]);
        assert!((cin.neurons[0].act - 0.08).abs() < 1e-7);
        cin.cin_act_from_rew(&[-0.5]);
        assert_eq!(cin.neurons[0].act, 1.0);

        cin.pbwm.cin.rew_thr = 0.0;
        cin.cin_act_from_rew(&[-0.5]);
        assert_eq!(cin.neurons[0].act, 0.5);
        cin.cin_act_from_rew(&[]);
        assert_eq!(cin.neurons[0].act, 0.0);
    }

    #[test]
    fn test_no_ach_before_reward_layer_cycles() {
        use crate::capability::HasPools;

        let rew = Layer::new("Rew", LayerShape::new_2d(1, 1), LayerKind::Input);
        let mut cin = Layer::new("CIN", LayerShape::new_2d(1, 1), LayerKind::CIN);
        cin.cin_act_from_rew(&[rew.layer_max_act()]);
        assert_eq!(cin.neurons[0].act, 0.0);
    }
}
