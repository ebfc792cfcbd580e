//! Single-scenario WASM wrapper and shared decoding helpers.

use anyhow::{bail, Context, Result};
use aphid_core::integrator::{IntegrationStats, IntegratorSettings};
use aphid_core::models::ModelVariant;
use aphid_core::params::{Chemotype, FullParameters, SimplifiedParameters};
use aphid_core::scenario::{ModelSetup, Scenario, ScenarioOutcome};
use aphid_core::state::{FullState, SimplifiedState};
use aphid_core::time_grid::TimeGrid;
use aphid_core::trajectory::TrajectoryTable;
use aphid_core::traits::StateVector;
use js_sys::Float64Array;
use serde::Serialize;
use std::collections::BTreeMap;
use wasm_bindgen::prelude::*;

/// What a plotting front end receives for one run.
#[derive(Debug, Serialize)]
pub(crate) struct ScenarioTables {
    pub label: String,
    pub variant: &'static str,
    pub trajectory: Option<TrajectoryTable>,
    pub metrics: Option<TrajectoryTable>,
    pub stats: Option<IntegrationStats>,
    pub error: Option<String>,
}

impl ScenarioTables {
    /// One named column from the trajectory table or, failing that, the
    /// derived-metrics table.
    pub(crate) fn column(&self, name: &str) -> Result<Vec<f64>> {
        if let Some(error) = &self.error {
            bail!("Scenario {} failed: {error}", self.label);
        }
        for table in self.trajectory.iter().chain(self.metrics.iter()) {
            if let Some(index) = table.columns.iter().position(|column| column == name) {
                return Ok(table.rows.iter().map(|row| row[index]).collect());
            }
        }
        bail!("Unknown column \"{name}\" for scenario {}", self.label)
    }
}

impl From<&ScenarioOutcome> for ScenarioTables {
    fn from(outcome: &ScenarioOutcome) -> Self {
        let variant = outcome.variant.label();
        match &outcome.result {
            Ok(output) => Self {
                label: outcome.label.clone(),
                variant,
                trajectory: Some(output.trajectory.to_table()),
                metrics: output.metrics.as_ref().map(|metrics| metrics.to_table()),
                stats: Some(output.stats),
                error: None,
            },
            Err(err) => Self {
                label: outcome.label.clone(),
                variant,
                trajectory: None,
                metrics: None,
                stats: None,
                error: Some(err.to_string()),
            },
        }
    }
}

pub(crate) fn parse_variant(name: &str) -> Result<ModelVariant> {
    match name {
        "full" => Ok(ModelVariant::Full),
        "simplified" => Ok(ModelVariant::Simplified),
        other => bail!("Unknown model variant \"{other}\" (expected \"full\" or \"simplified\")"),
    }
}

pub(crate) fn parse_chemotype(name: &str) -> Result<Chemotype> {
    match name.to_ascii_uppercase().as_str() {
        "NIV" => Ok(Chemotype::Niv),
        "DON" => Ok(Chemotype::Don),
        _ => bail!("Unknown chemotype \"{name}\" (expected \"NIV\" or \"DON\")"),
    }
}

fn state_map<S: StateVector>(state: &S) -> BTreeMap<String, f64> {
    S::NAMES
        .iter()
        .zip(state.to_vec())
        .map(|(name, value)| (name.to_string(), value))
        .collect()
}

/// One configurable scenario, run on demand from JavaScript.
#[wasm_bindgen]
pub struct WasmSimulation {
    scenario: Scenario,
    settings: IntegratorSettings,
}

impl WasmSimulation {
    pub(crate) fn build(
        variant: &str,
        chemotype: &str,
        t_max: f64,
        samples: usize,
    ) -> Result<WasmSimulation> {
        let variant = parse_variant(variant)?;
        let chemotype = parse_chemotype(chemotype)?;
        let grid = TimeGrid::linspace(0.0, t_max, samples);
        grid.times().context("Invalid output grid")?;
        Ok(WasmSimulation {
            scenario: Scenario::new(
                format!("{}-{}", chemotype.label(), variant.label()),
                ModelSetup::standard(chemotype, variant),
                grid,
            ),
            settings: IntegratorSettings::default(),
        })
    }

    pub(crate) fn update_parameter(&mut self, name: &str, value: f64) -> Result<()> {
        match &mut self.scenario.setup {
            ModelSetup::Full { params, .. } => {
                let mut values = params.to_map();
                values.insert(name.to_string(), value);
                *params = FullParameters::from_map(&values)?;
            }
            ModelSetup::Simplified { params, .. } => {
                let mut values = params.to_map();
                values.insert(name.to_string(), value);
                *params = SimplifiedParameters::from_map(&values)?;
            }
        }
        Ok(())
    }

    pub(crate) fn update_initial(&mut self, name: &str, value: f64) -> Result<()> {
        match &mut self.scenario.setup {
            ModelSetup::Full { initial, .. } => {
                let mut values = state_map(initial);
                values.insert(name.to_string(), value);
                *initial = FullState::from_map(&values)?;
            }
            ModelSetup::Simplified { initial, .. } => {
                let mut values = state_map(initial);
                values.insert(name.to_string(), value);
                *initial = SimplifiedState::from_map(&values)?;
            }
        }
        Ok(())
    }

    pub(crate) fn tables(&self) -> ScenarioTables {
        let result = self.scenario.run(&self.settings);
        let outcome = ScenarioOutcome {
            label: self.scenario.label.clone(),
            variant: self.scenario.variant(),
            result,
        };
        ScenarioTables::from(&outcome)
    }
}

#[wasm_bindgen]
impl WasmSimulation {
    #[wasm_bindgen(constructor)]
    pub fn new(
        variant: &str,
        chemotype: &str,
        t_max: f64,
        samples: u32,
    ) -> Result<WasmSimulation, JsValue> {
        console_error_panic_hook::set_once();
        Self::build(variant, chemotype, t_max, samples as usize)
            .map_err(|err| JsValue::from_str(&format!("{err:#}")))
    }

    pub fn set_parameter(&mut self, name: &str, value: f64) -> Result<(), JsValue> {
        self.update_parameter(name, value)
            .map_err(|err| JsValue::from_str(&err.to_string()))
    }

    pub fn set_initial_state(&mut self, name: &str, value: f64) -> Result<(), JsValue> {
        self.update_initial(name, value)
            .map_err(|err| JsValue::from_str(&err.to_string()))
    }

    pub fn set_tolerances(&mut self, rel_tol: f64, abs_tol: f64) -> Result<(), JsValue> {
        let settings = IntegratorSettings {
            rel_tol,
            abs_tol,
            ..self.settings
        };
        settings
            .validate()
            .map_err(|err| JsValue::from_str(&err.to_string()))?;
        self.settings = settings;
        Ok(())
    }

    pub fn parameter_names(&self) -> Vec<String> {
        let names: &[&str] = match self.scenario.variant() {
            ModelVariant::Full => &FullParameters::NAMES,
            ModelVariant::Simplified => &SimplifiedParameters::NAMES,
        };
        names.iter().map(|name| name.to_string()).collect()
    }

    /// Runs the scenario and returns a single column as a typed array.
    pub fn run_column(&self, name: &str) -> Result<Float64Array, JsValue> {
        let values = self
            .tables()
            .column(name)
            .map_err(|err| JsValue::from_str(&err.to_string()))?;
        Ok(Float64Array::from(values.as_slice()))
    }

    /// Runs the scenario. A model failure is reported in the `error` field
    /// rather than thrown, so the caller can still plot the other runs.
    pub fn run(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.tables())
            .map_err(|err| JsValue::from_str(&format!("Failed to serialize trajectory: {err}")))
    }
}
