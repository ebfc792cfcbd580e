use crate::error::{Result, SimulationError};
use serde::{Deserialize, Serialize};

/// Times at which a run must report its state.
///
/// Integration starts at the first time; the initial state is reported there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TimeGrid {
    /// Explicit, strictly increasing, non-negative times.
    Explicit(Vec<f64>),
    /// `count` evenly spaced times from `start` to `end`, both included.
    Even { start: f64, end: f64, count: usize },
}

impl TimeGrid {
    pub fn linspace(start: f64, end: f64, count: usize) -> Self {
        TimeGrid::Even { start, end, count }
    }

    /// Resolves and validates the grid.
    pub fn times(&self) -> Result<Vec<f64>> {
        let times = match self {
            TimeGrid::Explicit(times) => times.clone(),
            TimeGrid::Even { start, end, count } => even_times(*start, *end, *count)?,
        };
        validate(&times)?;
        Ok(times)
    }
}

fn even_times(start: f64, end: f64, count: usize) -> Result<Vec<f64>> {
    match count {
        0 => Err(SimulationError::InvalidTimeGrid(
            "count must be at least 1".into(),
        )),
        1 => Ok(vec![start]),
        _ => {
            if !(end > start) {
                return Err(SimulationError::InvalidTimeGrid(format!(
                    "end ({end}) must exceed start ({start})"
                )));
            }
            let intervals = (count - 1) as f64;
            let mut times: Vec<f64> = (0..count)
                .map(|idx| start + (end - start) * idx as f64 / intervals)
                .collect();
            times[count - 1] = end;
            Ok(times)
        }
    }
}

fn validate(times: &[f64]) -> Result<()> {
    if times.is_empty() {
        return Err(SimulationError::InvalidTimeGrid("no output times".into()));
    }
    for (idx, &t) in times.iter().enumerate() {
        if !t.is_finite() || t < 0.0 {
            return Err(SimulationError::InvalidTimeGrid(format!(
                "time #{idx} ({t}) must be finite and non-negative"
            )));
        }
    }
    if let Some(idx) = times.windows(2).position(|pair| pair[1] <= pair[0]) {
        return Err(SimulationError::InvalidTimeGrid(format!(
            "times must be strictly increasing (#{} = {}, #{} = {})",
            idx,
            times[idx],
            idx + 1,
            times[idx + 1]
        )));
    }
    Ok(())
}
