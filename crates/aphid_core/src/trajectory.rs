//! Time series produced by one integration.

use crate::traits::StateVector;
use serde::{Deserialize, Serialize};

/// One reported sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub time: f64,
    pub state: Vec<f64>,
}

/// Ordered samples at the requested output times. Built append-only by the
/// integrator and handed to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    names: Vec<String>,
    samples: Vec<Sample>,
}

/// Tabular view for plotting consumers: a `t` column followed by one column
/// per state variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<f64>>,
}

impl Trajectory {
    pub(crate) fn new(names: &[&str], capacity: usize) -> Self {
        Self {
            names: names.iter().map(|name| name.to_string()).collect(),
            samples: Vec::with_capacity(capacity),
        }
    }

    pub(crate) fn push(&mut self, time: f64, state: &[f64]) {
        self.samples.push(Sample {
            time,
            state: state.to_vec(),
        });
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn times(&self) -> Vec<f64> {
        self.samples.iter().map(|sample| sample.time).collect()
    }

    pub fn last(&self) -> Option<&Sample> {
        self.samples.last()
    }

    /// Values of one state variable across all samples.
    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        let index = self.names.iter().position(|candidate| candidate == name)?;
        Some(self.samples.iter().map(|sample| sample.state[index]).collect())
    }

    /// Typed states, or `None` when the trajectory belongs to another variant.
    pub fn states<S: StateVector>(&self) -> Option<Vec<S>> {
        if !self.has_layout(S::NAMES) {
            return None;
        }
        self.samples
            .iter()
            .map(|sample| S::from_slice(&sample.state))
            .collect()
    }

    pub(crate) fn has_layout(&self, names: &[&str]) -> bool {
        self.names.len() == names.len()
            && self.names.iter().zip(names).all(|(own, other)| own == other)
    }

    pub fn to_table(&self) -> TrajectoryTable {
        let mut columns = Vec::with_capacity(self.names.len() + 1);
        columns.push("t".to_string());
        columns.extend(self.names.iter().cloned());
        let rows = self
            .samples
            .iter()
            .map(|sample| {
                let mut row = Vec::with_capacity(sample.state.len() + 1);
                row.push(sample.time);
                row.extend_from_slice(&sample.state);
                row
            })
            .collect();
        TrajectoryTable { columns, rows }
    }
}

#[cfg(test)]
mod tests {
    use super::Trajectory;
    use crate::state::{FullState, SimplifiedState};
    use crate::traits::StateVector;

    fn sample_trajectory() -> Trajectory {
        let mut trajectory = Trajectory::new(SimplifiedState::NAMES, 2);
        trajectory.push(0.0, &[1.0, 0.0, 5.0, 5.0]);
        trajectory.push(0.5, &[2.0, 0.5, 6.0, 5.5]);
        trajectory
    }

    #[test]
    fn columns_are_looked_up_by_name() {
        let trajectory = sample_trajectory();
        assert_eq!(trajectory.column("V"), Some(vec![0.0, 0.5]));
        assert_eq!(trajectory.column("X"), None);
        assert_eq!(trajectory.times(), vec![0.0, 0.5]);
    }

    #[test]
    fn typed_states_require_matching_layout() {
        let trajectory = sample_trajectory();
        let states = trajectory
            .states::<SimplifiedState>()
            .expect("simplified layout");
        assert_eq!(states[0], SimplifiedState::standard());
        assert!(trajectory.states::<FullState>().is_none());
    }

    #[test]
    fn table_prepends_time_column() {
        let table = sample_trajectory().to_table();
        assert_eq!(table.columns, vec!["t", "U", "V", "S", "I"]);
        assert_eq!(table.rows[1], vec![0.5, 2.0, 0.5, 6.0, 5.5]);
    }
}
