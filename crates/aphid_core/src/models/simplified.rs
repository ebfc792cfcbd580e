use super::{nonzero, spike_rates};
use crate::error::{Result, SimulationError};
use crate::params::SimplifiedParameters;
use crate::state::SimplifiedState;
use crate::traits::{DynamicalSystem, StateVector};

/// Simplified model: alatae aggregated per unit area into unexposed `U` and
/// exposed `V`, with apterae assumed saturated on every spike.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimplifiedModel {
    params: SimplifiedParameters,
}

impl SimplifiedModel {
    pub fn new(params: SimplifiedParameters) -> Result<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &SimplifiedParameters {
        &self.params
    }

    pub fn derivative(&self, t: f64, state: &SimplifiedState) -> Result<SimplifiedState> {
        let p = &self.params;
        let SimplifiedState { u, v, s, i } = *state;

        let attraction = nonzero(s + p.v * i, "S + v·I", t)?;
        let spikes = nonzero(s + i, "S + I", t)?;

        let exposure = p.alpha * p.v * i * u / attraction;
        let per_spike = (u + v) / spikes;

        let du = -exposure + p.eta * v - p.c * u + p.e * (p.m * s - per_spike * s);
        let dv = exposure - p.eta * v - p.c * v + p.e * (p.m * i - per_spike * i);
        let (ds, di) = spike_rates(p.mu, p.k, p.r, p.delta, p.beta * v / p.k, s, i);

        Ok(SimplifiedState {
            u: du,
            v: dv,
            s: ds,
            i: di,
        })
    }
}

impl DynamicalSystem for SimplifiedModel {
    fn dimension(&self) -> usize {
        SimplifiedState::NAMES.len()
    }

    fn state_names(&self) -> &'static [&'static str] {
        SimplifiedState::NAMES
    }

    fn apply(&self, t: f64, x: &[f64], out: &mut [f64]) -> Result<()> {
        let state = SimplifiedState::from_slice(x).ok_or_else(|| {
            SimulationError::invalid_state(
                "state",
                format!("expected 4 components, got {}", x.len()),
            )
        })?;
        let rates = self.derivative(t, &state)?;
        out.copy_from_slice(&rates.to_vec());
        Ok(())
    }
}
