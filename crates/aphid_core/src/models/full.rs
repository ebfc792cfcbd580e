use super::{nonzero, spike_rates};
use crate::error::{Result, SimulationError};
use crate::params::FullParameters;
use crate::state::FullState;
use crate::traits::{DynamicalSystem, StateVector};

/// Full mechanistic model: apterae and alatae tracked per spike class, alatae
/// split by origin (susceptible/infected spike) and exposure.
///
/// Apterae and alatae on the same spike class share the carrying capacity
/// `M`; departing alatae form a common pool (rate of flux, `1/Gamma`) that
/// resettles in proportion to spike attractiveness.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FullModel {
    params: FullParameters,
}

impl FullModel {
    pub fn new(params: FullParameters) -> Result<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &FullParameters {
        &self.params
    }

    pub fn derivative(&self, t: f64, state: &FullState) -> Result<FullState> {
        let p = &self.params;
        let FullState {
            x,
            y,
            us,
            ui,
            vs,
            vi,
            s,
            i,
        } = *state;

        let attraction_u = nonzero(s + p.v * i, "S + v·I", t)?;
        let attraction_v = nonzero(s + i, "S + I", t)?;

        let ws = us + vs;
        let wi = ui + vi;
        let room_s = 1.0 - (x + ws) / p.m;
        let room_i = 1.0 - (y + wi) / p.m;
        let formation_s = p.e * (x + ws) * x / p.m;
        let formation_i = p.e * (y + wi) * y / p.m;

        let flux_u = (s * us + i * ui) / p.gamma;
        let flux_v = (s * vs + i * vi) / p.gamma;
        // Exposed alatae lose the landing bias.
        let landing_u = flux_u / attraction_u;
        let landing_v = flux_v / attraction_v;

        let dx = (p.a * ws + (p.b_s - p.d_s) * x) * room_s - formation_s;
        let dy = (p.a * wi + (p.b_i - p.d_i) * y) * room_i - formation_i;

        let dus = landing_u * room_s - us / p.gamma - p.c * us + p.eta * vs + formation_s;
        let dui =
            -p.alpha * ui + p.v * landing_u * room_i - ui / p.gamma - p.c * ui + p.eta * vi;
        let dvs = landing_v * room_s - vs / p.gamma - (p.c + p.eta) * vs;
        // Exposure feeds VI from US, while dUI depletes UI. Kept as published
        // pending confirmation of the cross-reference.
        let dvi =
            p.alpha * us + landing_v * room_i - vi / p.gamma - (p.c + p.eta) * vi + formation_i;

        let (ds, di) = spike_rates(p.mu, p.k, p.r, p.delta, p.beta * vs, s, i);

        Ok(FullState {
            x: dx,
            y: dy,
            us: dus,
            ui: dui,
            vs: dvs,
            vi: dvi,
            s: ds,
            i: di,
        })
    }
}

impl DynamicalSystem for FullModel {
    fn dimension(&self) -> usize {
        FullState::NAMES.len()
    }

    fn state_names(&self) -> &'static [&'static str] {
        FullState::NAMES
    }

    fn apply(&self, t: f64, x: &[f64], out: &mut [f64]) -> Result<()> {
        let state = FullState::from_slice(x).ok_or_else(|| {
            SimulationError::invalid_state(
                "state",
                format!("expected 8 components, got {}", x.len()),
            )
        })?;
        let rates = self.derivative(t, &state)?;
        out.copy_from_slice(&rates.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::FullModel;
    use crate::error::SimulationError;
    use crate::params::FullParameters;
    use crate::state::FullState;
    use crate::traits::{DynamicalSystem, StateVector};

    fn model() -> FullModel {
        FullModel::new(FullParameters::niv_baseline()).expect("valid parameters")
    }

    #[test]
    fn standard_state_rates_match_hand_evaluation() {
        let rates = model()
            .derivative(0.0, &FullState::standard())
            .expect("defined");

        // WS = 1, room_s = 1 - 2/50, formation_s = 0.2 * 2 * 1 / 50.
        let room_s = 1.0 - 2.0 / 50.0;
        let formation_s = 0.2 * 2.0 / 50.0;
        let expected_dx = (0.8 * 1.0 + 0.7 * 1.0) * room_s - formation_s;
        assert!((rates.x - expected_dx).abs() < 1e-12);

        // No apterae or alatae on infected spikes yet.
        assert_eq!(rates.y, 0.0);

        // flux_u = 5 / 5, landing_u = 1 / (5 + 1.2 * 5).
        let landing_u = 1.0 / 11.0;
        let expected_dus = landing_u * room_s - 0.2 - 0.18 + formation_s;
        assert!((rates.us - expected_dus).abs() < 1e-12);
        let expected_dui = 1.2 * landing_u;
        assert!((rates.ui - expected_dui).abs() < 1e-12);

        assert_eq!(rates.vs, 0.0);
        assert!((rates.vi - 0.5).abs() < 1e-12);

        let expected_ds = 0.1 * 290.0 - 0.1 * 25.0 / 300.0;
        let expected_di = 0.1 * 25.0 / 300.0 - 0.02 * 5.0;
        assert!((rates.s - expected_ds).abs() < 1e-12);
        assert!((rates.i - expected_di).abs() < 1e-12);
    }

    #[test]
    fn apply_does_not_touch_input_and_matches_typed_rates() {
        let model = model();
        let x = vec![3.0, 2.0, 1.0, 0.5, 0.25, 0.75, 40.0, 10.0];
        let before = x.clone();
        let mut out = vec![0.0; 8];
        model.apply(1.0, &x, &mut out).expect("defined");
        assert_eq!(x, before);

        let state = FullState::from_slice(&x).expect("eight components");
        let typed = model.derivative(1.0, &state).expect("defined");
        assert_eq!(out, typed.to_vec());
    }

    #[test]
    fn empty_field_is_a_division_singularity() {
        let mut state = FullState::standard();
        state.s = 0.0;
        state.i = 0.0;
        let err = model().derivative(2.0, &state).expect_err("singular");
        assert!(matches!(
            err,
            SimulationError::DivisionUndefined { time, .. } if time == 2.0
        ));
    }

    #[test]
    fn apply_rejects_wrong_dimension() {
        let mut out = vec![0.0; 8];
        assert!(model().apply(0.0, &[1.0; 4], &mut out).is_err());
    }

    #[test]
    fn spike_total_cannot_grow_at_capacity() {
        let mut state = FullState::standard();
        state.s = 200.0;
        state.i = 100.0;
        let rates = model().derivative(0.0, &state).expect("defined");
        assert!(rates.s + rates.i <= 0.0);
    }
}
