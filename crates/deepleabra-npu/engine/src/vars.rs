// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Read-only unit variable access by name, for logging and display.
//!
//! Neuron variables come first, in [`NEURON_VAR_NAMES`] order, followed by
//! layer and pool level values shown per unit.

use crate::error::Result;
use crate::layer::Layer;
use deepleabra_npu_neural::{NeuralError, NEURON_VAR_NAMES};

/// Per-unit views of layer-level neuromodulators and pool gate state.
pub const LAYER_UNIT_VAR_NAMES: &[&str] = &["DA", "ACh", "Se", "GateAct", "GateNow", "GateCnt"];

/// Every unit variable name, in index order.
pub fn unit_var_names() -> Vec<&'static str> {
    NEURON_VAR_NAMES
        .iter()
        .chain(LAYER_UNIT_VAR_NAMES)
        .copied()
        .collect()
}

impl Layer {
    pub fn unit_var_names(&self) -> Vec<&'static str> {
        unit_var_names()
    }

    pub fn unit_var_index(&self, name: &str) -> Result<usize> {
        unit_var_names()
            .iter()
            .position(|n| *n == name)
            .ok_or_else(|| NeuralError::UnknownVariable(name.to_string()).into())
    }

    /// Value of variable `var` for unit `idx`; NaN for any bad index.
    pub fn unit_value_1d(&self, var: usize, idx: usize) -> f32 {
        let Some(nrn) = self.neurons.get(idx) else {
            return f32::NAN;
        };
        let nv = NEURON_VAR_NAMES.len();
        if var < nv {
            return nrn.var_by_index(var);
        }
        let gate = self.neuron_gate_state(idx);
        match var - nv {
            0 => self.neuro_mod.da,
            1 => self.neuro_mod.ach,
            2 => self.neuro_mod.se,
            3 => gate.map_or(0.0, |g| g.act),
            4 => gate.map_or(0.0, |g| if g.now { 1.0 } else { 0.0 }),
            5 => gate.map_or(0.0, |g| g.cnt as f32),
            _ => f32::NAN,
        }
    }

    pub fn unit_value(&self, name: &str, idx: usize) -> f32 {
        match self.unit_var_index(name) {
            Ok(vi) => self.unit_value_1d(vi, idx),
            Err(_) => f32::NAN,
        }
    }

    /// Values of `name` for every unit.
    pub fn unit_values(&self, name: &str) -> Result<Vec<f32>> {
        let vi = self.unit_var_index(name)?;
        Ok((0..self.neurons.len()).map(|i| self.unit_value_1d(vi, i)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use crate::layer::LayerKind;
    use deepleabra_npu_neural::LayerShape;

    #[test]
    fn test_unknown_name_is_error() {
        let ly = Layer::new("Hid", LayerShape::new_2d(2, 1), LayerKind::Super);
        assert!(matches!(
            ly.unit_var_index("Bogus"),
            Err(EngineError::Variable(NeuralError::UnknownVariable(_)))
        ));
        assert!(ly.unit_values("Bogus").is_err());
        assert!(ly.unit_value("Bogus", 0).is_nan());
    }

    #[test]
    fn test_bad_index_is_nan() {
        let ly = Layer::new("Hid", LayerShape::new_2d(2, 1), LayerKind::Super);
        assert!(ly.unit_value_1d(0, 2).is_nan());
        assert!(ly.unit_value_1d(unit_var_names().len(), 0).is_nan());
    }

    #[test]
    fn test_layer_values_per_unit() {
        let mut ly = Layer::new("Matrix", LayerShape::new_4d(1, 2, 1, 1), LayerKind::Matrix);
        ly.neuro_mod.da = 0.4;
        ly.pools[2].gate.cnt = 3;
        ly.neurons[1].act = 0.9;
        assert_eq!(ly.unit_values("DA").unwrap(), vec![0.4, 0.4]);
        assert_eq!(ly.unit_values("GateCnt").unwrap(), vec![-1.0, 3.0]);
        assert_eq!(ly.unit_value("Act", 1), 0.9);
        let names = ly.unit_var_names();
        assert_eq!(names.len(), NEURON_VAR_NAMES.len() + 6);
        assert_eq!(ly.unit_var_index("GateNow").unwrap(), NEURON_VAR_NAMES.len() + 4);
    }
}
