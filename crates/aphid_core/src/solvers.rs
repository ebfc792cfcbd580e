use crate::error::{Result, SimulationError};
use crate::traits::DynamicalSystem;

/// Evaluates `system` and rejects non-finite rates.
pub(crate) fn evaluate(
    system: &impl DynamicalSystem,
    t: f64,
    x: &[f64],
    out: &mut [f64],
) -> Result<()> {
    system.apply(t, x, out)?;
    if let Some(index) = out.iter().position(|value| !value.is_finite()) {
        let component = system
            .state_names()
            .get(index)
            .map(|name| name.to_string())
            .unwrap_or_else(|| format!("#{index}"));
        return Err(SimulationError::NumericalDivergence { time: t, component });
    }
    Ok(())
}

/// Outcome of one trial step of an embedded pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepEstimate {
    /// Weighted max-norm of the local error; the step is acceptable when ≤ 1.
    pub error_norm: f64,
}

/// Bogacki–Shampine 3(2) embedded pair.
///
/// The third-order solution is propagated; the second-order companion only
/// serves the error estimate. The last stage is evaluated at the new point,
/// so an accepted step hands its final derivative to the next step (FSAL).
pub struct BogackiShampine {
    k1: Vec<f64>,
    k2: Vec<f64>,
    k3: Vec<f64>,
    k4: Vec<f64>,
    tmp: Vec<f64>,
    y_new: Vec<f64>,
}

impl BogackiShampine {
    const C2: f64 = 0.5;
    const C3: f64 = 0.75;

    const B1: f64 = 2.0 / 9.0;
    const B2: f64 = 1.0 / 3.0;
    const B3: f64 = 4.0 / 9.0;

    // Third-order minus second-order weights.
    const E1: f64 = -5.0 / 72.0;
    const E2: f64 = 1.0 / 12.0;
    const E3: f64 = 1.0 / 9.0;
    const E4: f64 = -1.0 / 8.0;

    /// Convergence order of the error estimate, used for step control.
    pub const ERROR_ORDER: i32 = 3;

    pub fn new(dim: usize) -> Self {
        Self {
            k1: vec![0.0; dim],
            k2: vec![0.0; dim],
            k3: vec![0.0; dim],
            k4: vec![0.0; dim],
            tmp: vec![0.0; dim],
            y_new: vec![0.0; dim],
        }
    }

    /// Primes the first stage with `f(t, y)`. Must be called before the first
    /// `attempt` and whenever the state is changed from outside.
    pub fn prime(&mut self, system: &impl DynamicalSystem, t: f64, y: &[f64]) -> Result<()> {
        evaluate(system, t, y, &mut self.k1)
    }

    /// Derivative at the current accepted point.
    pub fn slope(&self) -> &[f64] {
        &self.k1
    }

    /// Derivative at the trial point of the last attempt.
    pub fn trial_slope(&self) -> &[f64] {
        &self.k4
    }

    /// Trial solution of the last attempt.
    pub fn trial(&self) -> &[f64] {
        &self.y_new
    }

    /// Takes a trial step of size `h` from `(t, y)` without committing it.
    pub fn attempt(
        &mut self,
        system: &impl DynamicalSystem,
        t: f64,
        y: &[f64],
        h: f64,
        rel_tol: f64,
        abs_tol: f64,
    ) -> Result<StepEstimate> {
        let n = y.len();

        // k2 = f(t + h/2, y + h/2 k1)
        for i in 0..n {
            self.tmp[i] = y[i] + h * Self::C2 * self.k1[i];
        }
        evaluate(system, t + Self::C2 * h, &self.tmp, &mut self.k2)?;

        // k3 = f(t + 3h/4, y + 3h/4 k2)
        for i in 0..n {
            self.tmp[i] = y[i] + h * Self::C3 * self.k2[i];
        }
        evaluate(system, t + Self::C3 * h, &self.tmp, &mut self.k3)?;

        for i in 0..n {
            self.y_new[i] =
                y[i] + h * (Self::B1 * self.k1[i] + Self::B2 * self.k2[i] + Self::B3 * self.k3[i]);
        }

        // k4 = f(t + h, y_new)
        evaluate(system, t + h, &self.y_new, &mut self.k4)?;

        let mut error_norm: f64 = 0.0;
        for i in 0..n {
            let err = h
                * (Self::E1 * self.k1[i]
                    + Self::E2 * self.k2[i]
                    + Self::E3 * self.k3[i]
                    + Self::E4 * self.k4[i]);
            let scale = (rel_tol * y[i].abs().max(self.y_new[i].abs())).max(abs_tol);
            error_norm = error_norm.max(err.abs() / scale);
        }

        Ok(StepEstimate { error_norm })
    }

    /// Commits the last attempt: copies the trial point into `y` and reuses
    /// its slope as the next first stage.
    pub fn accept(&mut self, y: &mut [f64]) {
        y.copy_from_slice(&self.y_new);
        std::mem::swap(&mut self.k1, &mut self.k4);
    }
}

/// Cubic Hermite interpolation on `[t0, t0 + h]` from endpoint values and
/// slopes; third-order accurate, matching the pair it serves.
#[allow(clippy::too_many_arguments)]
pub fn hermite_interpolate(
    t0: f64,
    h: f64,
    y0: &[f64],
    f0: &[f64],
    y1: &[f64],
    f1: &[f64],
    t: f64,
    out: &mut [f64],
) {
    let theta = (t - t0) / h;
    let theta2 = theta * theta;
    let theta3 = theta2 * theta;

    let h00 = 2.0 * theta3 - 3.0 * theta2 + 1.0;
    let h10 = theta3 - 2.0 * theta2 + theta;
    let h01 = -2.0 * theta3 + 3.0 * theta2;
    let h11 = theta3 - theta2;

    for i in 0..out.len() {
        out[i] = h00 * y0[i] + h10 * h * f0[i] + h01 * y1[i] + h11 * h * f1[i];
    }
}
