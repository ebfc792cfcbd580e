//! Derivative functions for the two model variants.
//!
//! Both share the spike sub-model: spikes appear at rate `mu` toward the
//! carrying capacity `K`, become infected by splash (`r`) and by exposed
//! alatae (`beta`), and leave the infectious class at rate `delta`.

mod full;
mod simplified;

pub use full::FullModel;
pub use simplified::SimplifiedModel;

use crate::error::{Result, SimulationError};
use serde::{Deserialize, Serialize};

/// Which of the two models a run integrates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelVariant {
    Full,
    Simplified,
}

impl ModelVariant {
    pub fn label(self) -> &'static str {
        match self {
            ModelVariant::Full => "full",
            ModelVariant::Simplified => "simplified",
        }
    }
}

/// Returns `value` unless it is exactly zero, in which case the named
/// denominator makes the model undefined at `t`.
pub(crate) fn nonzero(value: f64, denominator: &'static str, t: f64) -> Result<f64> {
    if value == 0.0 {
        return Err(SimulationError::DivisionUndefined {
            time: t,
            denominator,
        });
    }
    Ok(value)
}

/// Rates of the shared spike sub-model given the alate infection pressure
/// (`beta` times the relevant exposed-alate density).
pub(crate) fn spike_rates(
    mu: f64,
    k: f64,
    r: f64,
    delta: f64,
    pressure: f64,
    s: f64,
    i: f64,
) -> (f64, f64) {
    let splash = r * i * s / k;
    let vectored = pressure * s;
    let ds = mu * (k - (s + i)) - splash - vectored;
    let di = splash + vectored - delta * i;
    (ds, di)
}
