//! Independent simulation runs and their collected results.
//!
//! Each scenario owns its parameters, initial state and grid; nothing is
//! shared between runs, so a failure in one never affects another.

use crate::error::Result;
use crate::integrator::{integrate_with_stats, IntegrationStats, IntegratorSettings};
use crate::metrics::{derive_metrics, DerivedMetrics};
use crate::models::{FullModel, ModelVariant, SimplifiedModel};
use crate::params::{Chemotype, FullParameters, SimplifiedParameters};
use crate::state::{FullState, SimplifiedState};
use crate::time_grid::TimeGrid;
use crate::trajectory::Trajectory;
use crate::traits::StateVector;
use serde::{Deserialize, Serialize};

/// End of the standard season, in days.
pub const STANDARD_T_MAX: f64 = 80.0;
pub const STANDARD_SAMPLES: usize = 101;

/// Model, parameters and initial condition of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "variant")]
pub enum ModelSetup {
    Full {
        params: FullParameters,
        initial: FullState,
    },
    Simplified {
        params: SimplifiedParameters,
        initial: SimplifiedState,
    },
}

impl ModelSetup {
    pub fn variant(&self) -> ModelVariant {
        match self {
            ModelSetup::Full { .. } => ModelVariant::Full,
            ModelSetup::Simplified { .. } => ModelVariant::Simplified,
        }
    }

    /// Chemotype parameters with the variant's standard initial condition.
    pub fn standard(chemotype: Chemotype, variant: ModelVariant) -> Self {
        match variant {
            ModelVariant::Full => ModelSetup::Full {
                params: FullParameters::for_chemotype(chemotype),
                initial: FullState::standard(),
            },
            ModelVariant::Simplified => ModelSetup::Simplified {
                params: SimplifiedParameters::for_chemotype(chemotype),
                initial: SimplifiedState::standard(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub label: String,
    pub setup: ModelSetup,
    pub grid: TimeGrid,
}

impl Scenario {
    pub fn new(label: impl Into<String>, setup: ModelSetup, grid: TimeGrid) -> Self {
        Self {
            label: label.into(),
            setup,
            grid,
        }
    }

    /// A chemotype/variant pair on the standard season grid.
    pub fn standard(chemotype: Chemotype, variant: ModelVariant) -> Self {
        Self::new(
            format!("{}-{}", chemotype.label(), variant.label()),
            ModelSetup::standard(chemotype, variant),
            TimeGrid::linspace(0.0, STANDARD_T_MAX, STANDARD_SAMPLES),
        )
    }

    pub fn variant(&self) -> ModelVariant {
        self.setup.variant()
    }

    /// Integrates the scenario; full-model runs also get derived metrics.
    pub fn run(&self, settings: &IntegratorSettings) -> Result<ScenarioOutput> {
        match &self.setup {
            ModelSetup::Full { params, initial } => {
                let model = FullModel::new(*params)?;
                let (trajectory, stats) =
                    integrate_with_stats(&model, &initial.to_vec(), &self.grid, settings)?;
                let metrics = derive_metrics(&trajectory)?;
                Ok(ScenarioOutput {
                    trajectory,
                    metrics: Some(metrics),
                    stats,
                })
            }
            ModelSetup::Simplified { params, initial } => {
                let model = SimplifiedModel::new(*params)?;
                let (trajectory, stats) =
                    integrate_with_stats(&model, &initial.to_vec(), &self.grid, settings)?;
                Ok(ScenarioOutput {
                    trajectory,
                    metrics: None,
                    stats,
                })
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioOutput {
    pub trajectory: Trajectory,
    /// Present for full-model runs only.
    pub metrics: Option<DerivedMetrics>,
    pub stats: IntegrationStats,
}

/// Result of one scenario; failures stay local to it.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioOutcome {
    pub label: String,
    pub variant: ModelVariant,
    pub result: Result<ScenarioOutput>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScenarioRunner {
    pub settings: IntegratorSettings,
}

impl ScenarioRunner {
    pub fn new(settings: IntegratorSettings) -> Self {
        Self { settings }
    }

    /// NIV and DON, each with the full and the simplified model.
    pub fn standard_set() -> Vec<Scenario> {
        Chemotype::ALL
            .iter()
            .flat_map(|&chemotype| {
                [ModelVariant::Full, ModelVariant::Simplified]
                    .into_iter()
                    .map(move |variant| Scenario::standard(chemotype, variant))
            })
            .collect()
    }

    /// Runs every scenario concurrently. Outcomes keep the order of `scenarios`.
    #[cfg(feature = "parallel")]
    pub fn run(&self, scenarios: &[Scenario]) -> Vec<ScenarioOutcome> {
        use rayon::prelude::*;
        scenarios
            .par_iter()
            .map(|scenario| self.run_one(scenario))
            .collect()
    }

    #[cfg(not(feature = "parallel"))]
    pub fn run(&self, scenarios: &[Scenario]) -> Vec<ScenarioOutcome> {
        self.run_sequential(scenarios)
    }

    pub fn run_sequential(&self, scenarios: &[Scenario]) -> Vec<ScenarioOutcome> {
        scenarios
            .iter()
            .map(|scenario| self.run_one(scenario))
            .collect()
    }

    pub fn run_one(&self, scenario: &Scenario) -> ScenarioOutcome {
        let result = scenario.run(&self.settings);
        match &result {
            Ok(output) => log::info!(
                "scenario {} finished: {} samples, {} accepted / {} rejected steps",
                scenario.label,
                output.trajectory.len(),
                output.stats.accepted_steps,
                output.stats.rejected_steps
            ),
            Err(err) => log::warn!("scenario {} failed: {}", scenario.label, err),
        }
        ScenarioOutcome {
            label: scenario.label.clone(),
            variant: scenario.variant(),
            result,
        }
    }
}

/// Finds an outcome by label.
pub fn find_outcome<'a>(
    outcomes: &'a [ScenarioOutcome],
    label: &str,
) -> Option<&'a ScenarioOutcome> {
    outcomes.iter().find(|outcome| outcome.label == label)
}
