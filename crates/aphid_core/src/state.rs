//! Typed state vectors for both model variants.

use crate::error::{Result, SimulationError};
use crate::traits::StateVector;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Full-model state. Aphid densities are per spike, spike densities per unit area.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FullState {
    /// Apterae on susceptible spikes.
    #[serde(rename = "X")]
    pub x: f64,
    /// Apterae on infected spikes.
    #[serde(rename = "Y")]
    pub y: f64,
    #[serde(rename = "US")]
    pub us: f64,
    #[serde(rename = "UI")]
    pub ui: f64,
    #[serde(rename = "VS")]
    pub vs: f64,
    #[serde(rename = "VI")]
    pub vi: f64,
    #[serde(rename = "S")]
    pub s: f64,
    #[serde(rename = "I")]
    pub i: f64,
}

impl FullState {
    /// Initial condition used by the standard scenarios.
    pub fn standard() -> Self {
        Self {
            x: 1.0,
            y: 0.0,
            us: 1.0,
            ui: 0.0,
            vs: 0.0,
            vi: 0.0,
            s: 5.0,
            i: 5.0,
        }
    }

    pub fn from_map(values: &BTreeMap<String, f64>) -> Result<Self> {
        let values = read_state(values, Self::NAMES)?;
        Self::from_slice(&values)
            .ok_or_else(|| SimulationError::invalid_state("FullState", "wrong dimension"))
    }

    /// Total spike density `S + I`.
    pub fn spikes(&self) -> f64 {
        self.s + self.i
    }
}

impl StateVector for FullState {
    const NAMES: &'static [&'static str] = &["X", "Y", "US", "UI", "VS", "VI", "S", "I"];

    fn to_vec(&self) -> Vec<f64> {
        vec![
            self.x, self.y, self.us, self.ui, self.vs, self.vi, self.s, self.i,
        ]
    }

    fn from_slice(values: &[f64]) -> Option<Self> {
        match *values {
            [x, y, us, ui, vs, vi, s, i] => Some(Self {
                x,
                y,
                us,
                ui,
                vs,
                vi,
                s,
                i,
            }),
            _ => None,
        }
    }
}

/// Simplified-model state; every component is per unit area.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SimplifiedState {
    #[serde(rename = "U")]
    pub u: f64,
    #[serde(rename = "V")]
    pub v: f64,
    #[serde(rename = "S")]
    pub s: f64,
    #[serde(rename = "I")]
    pub i: f64,
}

impl SimplifiedState {
    pub fn standard() -> Self {
        Self {
            u: 1.0,
            v: 0.0,
            s: 5.0,
            i: 5.0,
        }
    }

    pub fn from_map(values: &BTreeMap<String, f64>) -> Result<Self> {
        let values = read_state(values, Self::NAMES)?;
        Self::from_slice(&values)
            .ok_or_else(|| SimulationError::invalid_state("SimplifiedState", "wrong dimension"))
    }

    pub fn spikes(&self) -> f64 {
        self.s + self.i
    }
}

impl StateVector for SimplifiedState {
    const NAMES: &'static [&'static str] = &["U", "V", "S", "I"];

    fn to_vec(&self) -> Vec<f64> {
        vec![self.u, self.v, self.s, self.i]
    }

    fn from_slice(values: &[f64]) -> Option<Self> {
        match *values {
            [u, v, s, i] => Some(Self { u, v, s, i }),
            _ => None,
        }
    }
}

/// Rejects negative, non-finite, missing or unknown components.
pub fn validate_initial_state(names: &[&str], values: &[f64]) -> Result<()> {
    if names.len() != values.len() {
        return Err(SimulationError::invalid_state(
            "state",
            format!("expected {} components, got {}", names.len(), values.len()),
        ));
    }
    for (name, &value) in names.iter().zip(values) {
        if !value.is_finite() {
            return Err(SimulationError::invalid_state(name, "value must be finite"));
        }
        if value < 0.0 {
            return Err(SimulationError::invalid_state(
                name,
                format!("must be non-negative, got {value}"),
            ));
        }
    }
    Ok(())
}

fn read_state(values: &BTreeMap<String, f64>, names: &[&str]) -> Result<Vec<f64>> {
    if let Some(unknown) = values.keys().find(|key| !names.contains(&key.as_str())) {
        return Err(SimulationError::invalid_state(unknown, "unknown state variable"));
    }
    let ordered = names
        .iter()
        .map(|&name| {
            values
                .get(name)
                .copied()
                .ok_or_else(|| SimulationError::invalid_state(name, "missing"))
        })
        .collect::<Result<Vec<f64>>>()?;
    validate_initial_state(names, &ordered)?;
    Ok(ordered)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, f64)]) -> BTreeMap<String, f64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn full_state_from_map_orders_components() {
        let state = FullState::from_map(&map(&[
            ("I", 5.0),
            ("S", 5.0),
            ("VI", 0.0),
            ("VS", 0.0),
            ("UI", 0.0),
            ("US", 1.0),
            ("Y", 0.0),
            ("X", 1.0),
        ]))
        .expect("valid state");
        assert_eq!(state, FullState::standard());
        assert_eq!(state.to_vec(), vec![1.0, 0.0, 1.0, 0.0, 0.0, 0.0, 5.0, 5.0]);
    }

    #[test]
    fn state_maps_reject_negative_missing_and_unknown() {
        let err =
            SimplifiedState::from_map(&map(&[("U", -1.0), ("V", 0.0), ("S", 1.0), ("I", 1.0)]))
                .expect_err("negative");
        assert!(matches!(
            err,
            SimulationError::InvalidInitialState { ref name, .. } if name == "U"
        ));

        let err = SimplifiedState::from_map(&map(&[("U", 1.0), ("V", 0.0), ("S", 1.0)]))
            .expect_err("missing");
        assert!(err.to_string().contains("`I`: missing"));

        let err = SimplifiedState::from_map(&map(&[
            ("U", 1.0),
            ("V", 0.0),
            ("S", 1.0),
            ("I", 1.0),
            ("X", 1.0),
        ]))
        .expect_err("unknown");
        assert!(err.to_string().contains("unknown state variable"));
    }

    #[test]
    fn from_slice_checks_length() {
        assert!(SimplifiedState::from_slice(&[1.0, 2.0, 3.0]).is_none());
        assert_eq!(
            SimplifiedState::from_slice(&[1.0, 0.0, 5.0, 5.0]),
            Some(SimplifiedState::standard())
        );
        assert_eq!(FullState::standard().spikes(), 10.0);
    }

    #[test]
    fn serde_uses_model_names() {
        let json = serde_json::to_string(&SimplifiedState::standard()).expect("serialize");
        assert_eq!(json, r#"{"U":1.0,"V":0.0,"S":5.0,"I":5.0}"#);
    }
}
