//! Derived per-area and per-spike alate metrics.
//!
//! The full model tracks alatae per spike; the simplified model tracks them
//! per unit area. These transforms put both on the same footing so a
//! simplified run can be checked against a full one.

use crate::error::{Result, SimulationError};
use crate::state::{FullState, SimplifiedState};
use crate::trajectory::{Trajectory, TrajectoryTable};
use crate::traits::StateVector;
use serde::{Deserialize, Serialize};

/// Aggregates of a full-model trajectory, one entry per sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedMetrics {
    pub times: Vec<f64>,
    /// `S·US + I·UI`, comparable to simplified `U`.
    pub total_u: Vec<f64>,
    /// `S·VS + I·VI`, comparable to simplified `V`.
    pub total_v: Vec<f64>,
    pub per_spike_u: Vec<f64>,
    pub per_spike_v: Vec<f64>,
}

impl DerivedMetrics {
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn to_table(&self) -> TrajectoryTable {
        let columns = ["t", "totalU", "totalV", "perSpikeU", "perSpikeV"]
            .iter()
            .map(|name| name.to_string())
            .collect();
        let rows = self
            .times
            .iter()
            .zip(&self.total_u)
            .zip(&self.total_v)
            .zip(&self.per_spike_u)
            .zip(&self.per_spike_v)
            .map(|((((&t, &total_u), &total_v), &per_spike_u), &per_spike_v)| {
                vec![t, total_u, total_v, per_spike_u, per_spike_v]
            })
            .collect();
        TrajectoryTable { columns, rows }
    }
}

/// Per-spike alate densities of a simplified-model trajectory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerSpikeSeries {
    pub times: Vec<f64>,
    pub per_spike_u: Vec<f64>,
    pub per_spike_v: Vec<f64>,
}

/// Computes the full-model aggregates. Fails on the first sample with no spikes.
pub fn derive_metrics(trajectory: &Trajectory) -> Result<DerivedMetrics> {
    let states = trajectory
        .states::<FullState>()
        .ok_or_else(|| layout_error(trajectory, FullState::NAMES))?;

    let mut metrics = DerivedMetrics {
        times: trajectory.times(),
        total_u: Vec::with_capacity(states.len()),
        total_v: Vec::with_capacity(states.len()),
        per_spike_u: Vec::with_capacity(states.len()),
        per_spike_v: Vec::with_capacity(states.len()),
    };

    for (state, &time) in states.iter().zip(&metrics.times) {
        let spikes = spike_total(state.s, state.i, time)?;
        let total_u = state.s * state.us + state.i * state.ui;
        let total_v = state.s * state.vs + state.i * state.vi;
        metrics.total_u.push(total_u);
        metrics.total_v.push(total_v);
        metrics.per_spike_u.push(total_u / spikes);
        metrics.per_spike_v.push(total_v / spikes);
    }

    Ok(metrics)
}

/// `U/(S+I)` and `V/(S+I)` for a simplified-model trajectory.
pub fn simplified_per_spike(trajectory: &Trajectory) -> Result<PerSpikeSeries> {
    let states = trajectory
        .states::<SimplifiedState>()
        .ok_or_else(|| layout_error(trajectory, SimplifiedState::NAMES))?;
    let times = trajectory.times();
    let mut per_spike_u = Vec::with_capacity(states.len());
    let mut per_spike_v = Vec::with_capacity(states.len());
    for (state, &time) in states.iter().zip(&times) {
        let spikes = spike_total(state.s, state.i, time)?;
        per_spike_u.push(state.u / spikes);
        per_spike_v.push(state.v / spikes);
    }
    Ok(PerSpikeSeries {
        times,
        per_spike_u,
        per_spike_v,
    })
}

/// Sample-by-sample agreement between a full and a simplified run on the
/// same time grid.
///
/// Deviations are symmetric relative differences `|a - b| / max(|a|, |b|)`,
/// zero when both values are equal, so they stay within `[0, 2]` even when
/// one series is still zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelComparison {
    pub times: Vec<f64>,
    pub deviation_u: Vec<f64>,
    pub deviation_v: Vec<f64>,
    pub deviation_spikes: Vec<f64>,
    pub max_deviation_u: f64,
    pub max_deviation_v: f64,
    pub max_deviation_spikes: f64,
}

pub fn compare_models(full: &Trajectory, simplified: &Trajectory) -> Result<ModelComparison> {
    let metrics = derive_metrics(full)?;
    let reduced = simplified
        .states::<SimplifiedState>()
        .ok_or_else(|| layout_error(simplified, SimplifiedState::NAMES))?;
    let full_states = full
        .states::<FullState>()
        .ok_or_else(|| layout_error(full, FullState::NAMES))?;

    if metrics.times != simplified.times() {
        return Err(SimulationError::IncompatibleTrajectory(
            "full and simplified runs were sampled on different time grids".into(),
        ));
    }

    let deviation_u: Vec<f64> = metrics
        .total_u
        .iter()
        .zip(&reduced)
        .map(|(&a, b)| relative_deviation(a, b.u))
        .collect();
    let deviation_v: Vec<f64> = metrics
        .total_v
        .iter()
        .zip(&reduced)
        .map(|(&a, b)| relative_deviation(a, b.v))
        .collect();
    let deviation_spikes: Vec<f64> = full_states
        .iter()
        .zip(&reduced)
        .map(|(a, b)| relative_deviation(a.spikes(), b.spikes()))
        .collect();

    Ok(ModelComparison {
        max_deviation_u: deviation_u.iter().copied().fold(0.0, f64::max),
        max_deviation_v: deviation_v.iter().copied().fold(0.0, f64::max),
        max_deviation_spikes: deviation_spikes.iter().copied().fold(0.0, f64::max),
        times: metrics.times,
        deviation_u,
        deviation_v,
        deviation_spikes,
    })
}

pub fn relative_deviation(a: f64, b: f64) -> f64 {
    if a == b {
        return 0.0;
    }
    (a - b).abs() / a.abs().max(b.abs())
}

fn spike_total(s: f64, i: f64, time: f64) -> Result<f64> {
    let spikes = s + i;
    if spikes == 0.0 {
        return Err(SimulationError::DivisionUndefined {
            time,
            denominator: "S + I",
        });
    }
    Ok(spikes)
}

fn layout_error(trajectory: &Trajectory, expected: &[&str]) -> SimulationError {
    SimulationError::IncompatibleTrajectory(format!(
        "expected columns {:?}, found {:?}",
        expected,
        trajectory.names()
    ))
}
