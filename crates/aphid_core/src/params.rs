//! Parameter sets for the full and simplified models.
//!
//! Both sets are validated once at construction and are read-only afterwards.
//! Construction from a name→value map fails fast on unknown or missing names,
//! non-finite values, non-positive denominators (`M`, `K`, `Gamma`) and
//! negative rates.

use crate::error::{Result, SimulationError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Parameters that appear as denominators and must be strictly positive.
const DENOMINATORS: &[&str] = &["M", "K", "Gamma"];

/// Toxin chemotype of the pathogen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Chemotype {
    /// Nivalenol producer; the baseline parameterization.
    Niv,
    /// Deoxynivalenol producer; NIV scaled by [`ChemotypeScaling::DON`].
    Don,
}

impl Chemotype {
    pub const ALL: [Chemotype; 2] = [Chemotype::Niv, Chemotype::Don];

    pub fn label(self) -> &'static str {
        match self {
            Chemotype::Niv => "NIV",
            Chemotype::Don => "DON",
        }
    }
}

/// Multiplicative factors turning one chemotype's parameters into another's.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChemotypeScaling {
    pub r: f64,
    pub b_i: f64,
    pub d_i: f64,
    pub v: f64,
    pub alpha: f64,
    pub beta: f64,
}

impl ChemotypeScaling {
    pub const DON: ChemotypeScaling = ChemotypeScaling {
        r: 1.5,
        b_i: 0.6,
        d_i: 1.2,
        v: 0.25,
        alpha: 0.1,
        beta: 0.5,
    };
}

/// Parameters of the full (eight-compartment) model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, f64>", into = "BTreeMap<String, f64>")]
pub struct FullParameters {
    /// Alate nymph production by alatae.
    pub a: f64,
    /// Alate nymph production by apterae on susceptible spikes.
    pub b_s: f64,
    /// Alate nymph production by apterae on infected spikes.
    pub b_i: f64,
    /// Apterous mortality on susceptible spikes.
    pub d_s: f64,
    /// Apterous mortality on infected spikes.
    pub d_i: f64,
    /// Aphid carrying capacity per spike.
    pub m: f64,
    /// Alate formation rate.
    pub e: f64,
    /// Landing bias of unexposed alatae toward infected spikes.
    pub v: f64,
    /// Alate post-settling mortality.
    pub c: f64,
    /// Mean residence time of an alate on a spike.
    pub gamma: f64,
    /// Chemotype-loss rate.
    pub eta: f64,
    /// Exposure coefficient.
    pub alpha: f64,
    /// Spike appearance rate.
    pub mu: f64,
    /// Spike carrying capacity per unit area.
    pub k: f64,
    /// Splash-infection rate.
    pub r: f64,
    /// Alate-borne transmission rate.
    pub beta: f64,
    /// Removal rate to post-infectious.
    pub delta: f64,
}

impl FullParameters {
    pub const NAMES: [&'static str; 17] = [
        "a", "bS", "bI", "dS", "dI", "M", "e", "v", "c", "Gamma", "eta", "alpha", "mu", "K", "r",
        "beta", "delta",
    ];

    /// The NIV baseline parameterization.
    pub fn niv_baseline() -> Self {
        Self {
            a: 0.8,
            b_s: 0.8,
            b_i: 1.0,
            d_s: 0.1,
            d_i: 0.1,
            m: 50.0,
            e: 0.2,
            v: 1.2,
            c: 0.18,
            gamma: 5.0,
            eta: 0.2,
            alpha: 0.5,
            mu: 0.1,
            k: 300.0,
            r: 0.1,
            beta: 0.01,
            delta: 0.02,
        }
    }

    pub fn for_chemotype(chemotype: Chemotype) -> Self {
        match chemotype {
            Chemotype::Niv => Self::niv_baseline(),
            Chemotype::Don => Self::niv_baseline().scaled(&ChemotypeScaling::DON),
        }
    }

    /// Applies chemotype scale factors; every other parameter is copied.
    pub fn scaled(&self, scaling: &ChemotypeScaling) -> Self {
        Self {
            r: self.r * scaling.r,
            b_i: self.b_i * scaling.b_i,
            d_i: self.d_i * scaling.d_i,
            v: self.v * scaling.v,
            alpha: self.alpha * scaling.alpha,
            beta: self.beta * scaling.beta,
            ..*self
        }
    }

    pub fn from_map(values: &BTreeMap<String, f64>) -> Result<Self> {
        let reader = MapReader::new(values, &Self::NAMES)?;
        let params = Self {
            a: reader.take("a")?,
            b_s: reader.take("bS")?,
            b_i: reader.take("bI")?,
            d_s: reader.take("dS")?,
            d_i: reader.take("dI")?,
            m: reader.take("M")?,
            e: reader.take("e")?,
            v: reader.take("v")?,
            c: reader.take("c")?,
            gamma: reader.take("Gamma")?,
            eta: reader.take("eta")?,
            alpha: reader.take("alpha")?,
            mu: reader.take("mu")?,
            k: reader.take("K")?,
            r: reader.take("r")?,
            beta: reader.take("beta")?,
            delta: reader.take("delta")?,
        };
        params.validate()?;
        Ok(params)
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        let value = match name {
            "a" => self.a,
            "bS" => self.b_s,
            "bI" => self.b_i,
            "dS" => self.d_s,
            "dI" => self.d_i,
            "M" => self.m,
            "e" => self.e,
            "v" => self.v,
            "c" => self.c,
            "Gamma" => self.gamma,
            "eta" => self.eta,
            "alpha" => self.alpha,
            "mu" => self.mu,
            "K" => self.k,
            "r" => self.r,
            "beta" => self.beta,
            "delta" => self.delta,
            _ => return None,
        };
        Some(value)
    }

    /// Re-checks every value; struct literals bypass `from_map`.
    pub fn validate(&self) -> Result<()> {
        for name in Self::NAMES {
            if let Some(value) = self.get(name) {
                check_value(name, value)?;
            }
        }
        Ok(())
    }

    pub fn to_map(&self) -> BTreeMap<String, f64> {
        Self::NAMES
            .iter()
            .filter_map(|&name| self.get(name).map(|value| (name.to_string(), value)))
            .collect()
    }
}

impl TryFrom<BTreeMap<String, f64>> for FullParameters {
    type Error = SimulationError;

    fn try_from(values: BTreeMap<String, f64>) -> Result<Self> {
        Self::from_map(&values)
    }
}

impl From<FullParameters> for BTreeMap<String, f64> {
    fn from(params: FullParameters) -> Self {
        params.to_map()
    }
}

/// Parameters of the simplified (four-compartment) model, a subset of the
/// full set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, f64>", into = "BTreeMap<String, f64>")]
pub struct SimplifiedParameters {
    pub alpha: f64,
    pub v: f64,
    pub eta: f64,
    pub c: f64,
    pub e: f64,
    pub m: f64,
    pub mu: f64,
    pub k: f64,
    pub r: f64,
    pub beta: f64,
    pub delta: f64,
}

impl SimplifiedParameters {
    pub const NAMES: [&'static str; 11] = [
        "alpha", "v", "eta", "c", "e", "M", "mu", "K", "r", "beta", "delta",
    ];

    pub fn for_chemotype(chemotype: Chemotype) -> Self {
        Self::from(&FullParameters::for_chemotype(chemotype))
    }

    pub fn from_map(values: &BTreeMap<String, f64>) -> Result<Self> {
        let reader = MapReader::new(values, &Self::NAMES)?;
        let params = Self {
            alpha: reader.take("alpha")?,
            v: reader.take("v")?,
            eta: reader.take("eta")?,
            c: reader.take("c")?,
            e: reader.take("e")?,
            m: reader.take("M")?,
            mu: reader.take("mu")?,
            k: reader.take("K")?,
            r: reader.take("r")?,
            beta: reader.take("beta")?,
            delta: reader.take("delta")?,
        };
        params.validate()?;
        Ok(params)
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        let value = match name {
            "alpha" => self.alpha,
            "v" => self.v,
            "eta" => self.eta,
            "c" => self.c,
            "e" => self.e,
            "M" => self.m,
            "mu" => self.mu,
            "K" => self.k,
            "r" => self.r,
            "beta" => self.beta,
            "delta" => self.delta,
            _ => return None,
        };
        Some(value)
    }

    pub fn validate(&self) -> Result<()> {
        for name in Self::NAMES {
            if let Some(value) = self.get(name) {
                check_value(name, value)?;
            }
        }
        Ok(())
    }

    pub fn to_map(&self) -> BTreeMap<String, f64> {
        Self::NAMES
            .iter()
            .filter_map(|&name| self.get(name).map(|value| (name.to_string(), value)))
            .collect()
    }
}

impl From<&FullParameters> for SimplifiedParameters {
    fn from(full: &FullParameters) -> Self {
        Self {
            alpha: full.alpha,
            v: full.v,
            eta: full.eta,
            c: full.c,
            e: full.e,
            m: full.m,
            mu: full.mu,
            k: full.k,
            r: full.r,
            beta: full.beta,
            delta: full.delta,
        }
    }
}

impl TryFrom<BTreeMap<String, f64>> for SimplifiedParameters {
    type Error = SimulationError;

    fn try_from(values: BTreeMap<String, f64>) -> Result<Self> {
        Self::from_map(&values)
    }
}

impl From<SimplifiedParameters> for BTreeMap<String, f64> {
    fn from(params: SimplifiedParameters) -> Self {
        params.to_map()
    }
}

fn check_value(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(SimulationError::invalid_parameter(name, "value must be finite"));
    }
    if DENOMINATORS.contains(&name) {
        if value <= 0.0 {
            return Err(SimulationError::invalid_parameter(
                name,
                format!("must be positive, got {value}"),
            ));
        }
    } else if value < 0.0 {
        return Err(SimulationError::invalid_parameter(
            name,
            format!("rate must be non-negative, got {value}"),
        ));
    }
    Ok(())
}

/// Looks up required names in a user-supplied map after rejecting unknown keys.
struct MapReader<'a> {
    values: &'a BTreeMap<String, f64>,
}

impl<'a> MapReader<'a> {
    fn new(values: &'a BTreeMap<String, f64>, known: &[&str]) -> Result<Self> {
        if let Some(unknown) = values.keys().find(|key| !known.contains(&key.as_str())) {
            return Err(SimulationError::invalid_parameter(unknown, "unknown parameter"));
        }
        Ok(Self { values })
    }

    fn take(&self, name: &str) -> Result<f64> {
        self.values
            .get(name)
            .copied()
            .ok_or_else(|| SimulationError::invalid_parameter(name, "missing"))
    }
}
