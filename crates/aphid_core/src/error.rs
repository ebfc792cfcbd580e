//! Error taxonomy shared by every stage of a simulation run.
//!
//! Errors are local to a single run: a scenario runner collects them per
//! scenario instead of aborting sibling runs.

use std::fmt;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SimulationError>;

/// Why the adaptive integrator gave up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureCause {
    /// The step size fell below the configured floor without meeting tolerance.
    StepUnderflow,
    /// The caller-supplied step budget was exhausted before the final output time.
    StepLimitExceeded { max_steps: usize },
}

impl fmt::Display for FailureCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureCause::StepUnderflow => write!(f, "step size underflow"),
            FailureCause::StepLimitExceeded { max_steps } => {
                write!(f, "exceeded {max_steps} integration steps")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("invalid initial state `{name}`: {reason}")]
    InvalidInitialState { name: String, reason: String },

    /// A model singularity: `S + v·I = 0` or `S + I = 0`.
    #[error("division undefined at t = {time}: {denominator} is zero")]
    DivisionUndefined {
        time: f64,
        denominator: &'static str,
    },

    #[error("integration failed at t = {time} with step size {step_size:e}: {cause}")]
    IntegrationFailure {
        time: f64,
        step_size: f64,
        cause: FailureCause,
    },

    #[error("derivative of `{component}` is not finite at t = {time}")]
    NumericalDivergence { time: f64, component: String },

    #[error("invalid time grid: {0}")]
    InvalidTimeGrid(String),

    #[error("invalid integrator settings: {0}")]
    InvalidSettings(String),

    #[error("incompatible trajectory: {0}")]
    IncompatibleTrajectory(String),
}

impl SimulationError {
    pub(crate) fn invalid_parameter(name: &str, reason: impl Into<String>) -> Self {
        SimulationError::InvalidParameter {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_state(name: &str, reason: impl Into<String>) -> Self {
        SimulationError::InvalidInitialState {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    /// Singularities are recoverable at the scenario level; everything else is not.
    pub fn is_singularity(&self) -> bool {
        matches!(self, SimulationError::DivisionUndefined { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::{FailureCause, SimulationError};

    #[test]
    fn integration_failure_reports_time_step_and_cause() {
        let err = SimulationError::IntegrationFailure {
            time: 1.5,
            step_size: 1e-13,
            cause: FailureCause::StepLimitExceeded { max_steps: 10 },
        };
        let message = err.to_string();
        assert!(message.contains("t = 1.5"), "{message}");
        assert!(message.contains("1e-13"), "{message}");
        assert!(message.contains("exceeded 10 integration steps"), "{message}");
    }

    #[test]
    fn only_division_errors_are_singularities() {
        let singular = SimulationError::DivisionUndefined {
            time: 0.0,
            denominator: "S + I",
        };
        assert!(singular.is_singularity());
        assert!(!SimulationError::InvalidTimeGrid("empty".into()).is_singularity());
    }
}
