//! Adaptive-step driver around the Bogacki–Shampine pair.
//!
//! Steps are chosen by local error control alone. Requested output times that
//! fall inside an accepted step are filled by Hermite interpolation, so the
//! output grid never shortens a step; only the final step is truncated to
//! land on the last output time.

use crate::error::{FailureCause, Result, SimulationError};
use crate::solvers::{hermite_interpolate, BogackiShampine};
use crate::state::validate_initial_state;
use crate::time_grid::TimeGrid;
use crate::trajectory::Trajectory;
use crate::traits::DynamicalSystem;
use serde::{Deserialize, Serialize};

/// Tolerances and step bounds for [`integrate`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntegratorSettings {
    pub rel_tol: f64,
    pub abs_tol: f64,
    /// First trial step; `0` picks one from the initial slope.
    pub initial_step: f64,
    /// Step floor. The effective floor also grows with `|t|` to stay above
    /// round-off.
    pub min_step: f64,
    /// Step ceiling; `0` means a tenth of the integration span.
    pub max_step: f64,
    /// Budget of step attempts, accepted or rejected.
    pub max_steps: usize,
}

impl Default for IntegratorSettings {
    fn default() -> Self {
        Self {
            rel_tol: 1e-6,
            abs_tol: 1e-6,
            initial_step: 0.0,
            min_step: 1e-12,
            max_step: 0.0,
            max_steps: 100_000,
        }
    }
}

impl IntegratorSettings {
    pub fn with_tolerances(rel_tol: f64, abs_tol: f64) -> Self {
        Self {
            rel_tol,
            abs_tol,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.rel_tol.is_finite() || self.rel_tol < 100.0 * f64::EPSILON {
            return Err(SimulationError::InvalidSettings(format!(
                "rel_tol must be finite and at least {:e}",
                100.0 * f64::EPSILON
            )));
        }
        if !self.abs_tol.is_finite() || self.abs_tol <= 0.0 {
            return Err(SimulationError::InvalidSettings(
                "abs_tol must be finite and positive".into(),
            ));
        }
        for (name, value) in [
            ("initial_step", self.initial_step),
            ("min_step", self.min_step),
            ("max_step", self.max_step),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(SimulationError::InvalidSettings(format!(
                    "{name} must be finite and non-negative"
                )));
            }
        }
        if self.max_step > 0.0 && self.min_step > self.max_step {
            return Err(SimulationError::InvalidSettings(
                "min_step must not exceed max_step".into(),
            ));
        }
        if self.max_steps == 0 {
            return Err(SimulationError::InvalidSettings(
                "max_steps must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

/// Work done by one integration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrationStats {
    pub accepted_steps: usize,
    pub rejected_steps: usize,
    pub evaluations: usize,
}

/// Integrates `system` from `initial_state` at the first grid time and
/// reports the state at every grid time.
pub fn integrate(
    system: &impl DynamicalSystem,
    initial_state: &[f64],
    grid: &TimeGrid,
    settings: &IntegratorSettings,
) -> Result<Trajectory> {
    integrate_with_stats(system, initial_state, grid, settings).map(|(trajectory, _)| trajectory)
}

pub fn integrate_with_stats(
    system: &impl DynamicalSystem,
    initial_state: &[f64],
    grid: &TimeGrid,
    settings: &IntegratorSettings,
) -> Result<(Trajectory, IntegrationStats)> {
    settings.validate()?;
    let times = grid.times()?;
    let names = system.state_names();
    if system.dimension() != names.len() {
        return Err(SimulationError::InvalidSettings(format!(
            "system reports dimension {} but names {} components",
            system.dimension(),
            names.len()
        )));
    }
    validate_initial_state(names, initial_state)?;

    let dim = system.dimension();
    let mut trajectory = Trajectory::new(names, times.len());
    let mut stats = IntegrationStats::default();
    let mut y = initial_state.to_vec();
    trajectory.push(times[0], &y);
    if times.len() == 1 {
        return Ok((trajectory, stats));
    }

    let mut t = times[0];
    let t_end = times[times.len() - 1];
    let span = t_end - t;
    let max_step = if settings.max_step > 0.0 {
        settings.max_step
    } else {
        span / 10.0
    };

    let mut stepper = BogackiShampine::new(dim);
    stepper.prime(system, t, &y)?;
    stats.evaluations += 1;

    let mut h = if settings.initial_step > 0.0 {
        settings.initial_step
    } else {
        initial_step(&y, stepper.slope(), span.min(max_step), settings.rel_tol, settings.abs_tol)
    };

    let exponent = 1.0 / BogackiShampine::ERROR_ORDER as f64;
    let mut next_output = 1;
    let mut interpolated = vec![0.0; dim];

    while next_output < times.len() {
        let h_min = min_step_at(t, settings.min_step);
        h = h.max(h_min).min(max_step);

        let mut rejected_here = false;
        let (h_taken, t_new, error_norm) = loop {
            if stats.accepted_steps + stats.rejected_steps >= settings.max_steps {
                return Err(SimulationError::IntegrationFailure {
                    time: t,
                    step_size: h,
                    cause: FailureCause::StepLimitExceeded {
                        max_steps: settings.max_steps,
                    },
                });
            }

            // Stretch or truncate the last step to land on t_end, never
            // beyond the step ceiling.
            let last = t + 1.1 * h >= t_end && t_end - t <= max_step;
            if last {
                h = t_end - t;
            }

            let estimate =
                stepper.attempt(system, t, &y, h, settings.rel_tol, settings.abs_tol)?;
            stats.evaluations += 3;

            if estimate.error_norm <= 1.0 {
                let t_new = if last { t_end } else { t + h };
                break (h, t_new, estimate.error_norm);
            }

            stats.rejected_steps += 1;
            if h <= h_min {
                return Err(SimulationError::IntegrationFailure {
                    time: t,
                    step_size: h,
                    cause: FailureCause::StepUnderflow,
                });
            }
            let shrink = if rejected_here {
                0.5
            } else {
                (0.8 * estimate.error_norm.powf(-exponent)).max(0.1)
            };
            h = (h * shrink).max(h_min);
            rejected_here = true;
        };

        while next_output < times.len() && times[next_output] <= t_new {
            let t_out = times[next_output];
            if t_out == t_new {
                trajectory.push(t_out, stepper.trial());
            } else {
                hermite_interpolate(
                    t,
                    t_new - t,
                    &y,
                    stepper.slope(),
                    stepper.trial(),
                    stepper.trial_slope(),
                    t_out,
                    &mut interpolated,
                );
                trajectory.push(t_out, &interpolated);
            }
            next_output += 1;
        }

        stepper.accept(&mut y);
        stats.accepted_steps += 1;
        t = t_new;

        if !rejected_here {
            let grow = if error_norm > 0.0 {
                (0.8 * error_norm.powf(-exponent)).min(5.0)
            } else {
                5.0
            };
            h = h_taken * grow;
        } else {
            h = h_taken;
        }
    }

    log::debug!(
        "integrated {} components to t = {}: {} accepted, {} rejected, {} evaluations",
        dim,
        t,
        stats.accepted_steps,
        stats.rejected_steps,
        stats.evaluations
    );

    Ok((trajectory, stats))
}

fn min_step_at(t: f64, floor: f64) -> f64 {
    floor.max(16.0 * f64::EPSILON * t.abs())
}

/// First step from the initial slope, as in MATLAB's ode23: the step whose
/// predicted local error roughly matches the tolerance.
fn initial_step(y: &[f64], slope: &[f64], h_max: f64, rel_tol: f64, abs_tol: f64) -> f64 {
    let rate = y
        .iter()
        .zip(slope)
        .map(|(yi, fi)| fi.abs() / (rel_tol * yi.abs()).max(abs_tol))
        .fold(0.0, f64::max)
        / (0.8 * rel_tol.powf(1.0 / 3.0));
    if h_max * rate > 1.0 {
        1.0 / rate
    } else {
        h_max
    }
}
