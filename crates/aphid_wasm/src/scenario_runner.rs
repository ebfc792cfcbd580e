//! Stepped runner for the standard scenario set.
//!
//! Scenarios run one batch per call so the browser can repaint between runs.

use crate::simulation::ScenarioTables;
use aphid_core::integrator::IntegratorSettings;
use aphid_core::scenario::{Scenario, ScenarioRunner};
use serde::Serialize;
use serde_wasm_bindgen::to_value;
use wasm_bindgen::prelude::*;

/// Progress payload for the stepped scenario runner.
#[derive(Serialize)]
struct ScenarioRunProgress<'a> {
    done: bool,
    completed: usize,
    total: usize,
    results: &'a [ScenarioTables],
}

#[wasm_bindgen]
pub struct WasmScenarioRunner {
    runner: ScenarioRunner,
    pending: Vec<Scenario>,
    total: usize,
    results: Vec<ScenarioTables>,
}

impl WasmScenarioRunner {
    pub(crate) fn with_settings(settings: IntegratorSettings) -> Self {
        let mut pending = ScenarioRunner::standard_set();
        // Popped from the back, so keep the natural order reversed.
        pending.reverse();
        let total = pending.len();
        Self {
            runner: ScenarioRunner::new(settings),
            pending,
            total,
            results: Vec::with_capacity(total),
        }
    }

    pub(crate) fn advance(&mut self, batch_size: usize) {
        for _ in 0..batch_size.max(1) {
            let Some(scenario) = self.pending.pop() else {
                break;
            };
            let outcome = self.runner.run_one(&scenario);
            self.results.push(ScenarioTables::from(&outcome));
        }
    }

    fn progress(&self) -> ScenarioRunProgress<'_> {
        ScenarioRunProgress {
            done: self.is_done(),
            completed: self.results.len(),
            total: self.total,
            results: &self.results,
        }
    }
}

#[wasm_bindgen]
impl WasmScenarioRunner {
    /// NIV/DON × full/simplified over the standard season.
    #[wasm_bindgen(constructor)]
    pub fn new(rel_tol: f64, abs_tol: f64) -> Result<WasmScenarioRunner, JsValue> {
        console_error_panic_hook::set_once();
        let settings = IntegratorSettings::with_tolerances(rel_tol, abs_tol);
        settings
            .validate()
            .map_err(|err| JsValue::from_str(&err.to_string()))?;
        Ok(Self::with_settings(settings))
    }

    pub fn is_done(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn run_steps(&mut self, batch_size: u32) -> Result<JsValue, JsValue> {
        self.advance(batch_size as usize);
        self.get_progress()
    }

    pub fn get_progress(&self) -> Result<JsValue, JsValue> {
        to_value(&self.progress())
            .map_err(|err| JsValue::from_str(&format!("Serialization error: {err}")))
    }
}
