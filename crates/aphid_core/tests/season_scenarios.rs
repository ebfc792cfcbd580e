use aphid_core::integrator::{integrate, IntegratorSettings};
use aphid_core::metrics::{compare_models, derive_metrics, simplified_per_spike};
use aphid_core::models::{FullModel, ModelVariant, SimplifiedModel};
use aphid_core::params::{Chemotype, FullParameters, SimplifiedParameters};
use aphid_core::scenario::{find_outcome, Scenario, ScenarioRunner};
use aphid_core::state::{FullState, SimplifiedState};
use aphid_core::time_grid::TimeGrid;
use aphid_core::traits::StateVector;
use aphid_core::trajectory::Trajectory;

const NEGATIVE_SLACK: f64 = 1e-4;

fn season_grid() -> TimeGrid {
    TimeGrid::linspace(0.0, 80.0, 101)
}

fn run_full(chemotype: Chemotype, settings: &IntegratorSettings) -> anyhow::Result<Trajectory> {
    run_full_from(chemotype, &FullState::standard(), settings)
}

fn run_full_from(
    chemotype: Chemotype,
    initial: &FullState,
    settings: &IntegratorSettings,
) -> anyhow::Result<Trajectory> {
    let model = FullModel::new(FullParameters::for_chemotype(chemotype))?;
    Ok(integrate(&model, &initial.to_vec(), &season_grid(), settings)?)
}

fn run_simplified(chemotype: Chemotype) -> anyhow::Result<Trajectory> {
    let model = SimplifiedModel::new(SimplifiedParameters::for_chemotype(chemotype))?;
    Ok(integrate(
        &model,
        &SimplifiedState::standard().to_vec(),
        &season_grid(),
        &IntegratorSettings::default(),
    )?)
}

#[test]
fn full_seasons_stay_non_negative_and_below_capacity() -> anyhow::Result<()> {
    for chemotype in Chemotype::ALL {
        let trajectory = run_full(chemotype, &IntegratorSettings::default())?;
        assert_eq!(trajectory.len(), 101);

        let states = trajectory.states::<FullState>().expect("full-model layout");
        for (sample, state) in trajectory.samples().iter().zip(&states) {
            for (name, value) in FullState::NAMES.iter().zip(&sample.state) {
                assert!(
                    *value >= -NEGATIVE_SLACK,
                    "{chemotype:?}: {name} = {value} at t = {}",
                    sample.time
                );
            }
            assert!(
                state.spikes() <= 300.0 + 1e-3,
                "{chemotype:?}: S + I = {}",
                state.spikes()
            );
            assert!(state.x + state.us + state.vs <= 50.0 + 1e-2);
            assert!(state.y + state.ui + state.vi <= 50.0 + 1e-2);
        }

        let last = states.last().expect("samples");
        assert!(
            last.spikes() > 240.0,
            "{chemotype:?}: S + I should approach K by t = 80, got {}",
            last.spikes()
        );
    }
    Ok(())
}

#[test]
fn simplified_seasons_stay_non_negative() -> anyhow::Result<()> {
    for chemotype in Chemotype::ALL {
        let trajectory = run_simplified(chemotype)?;
        for sample in trajectory.samples() {
            assert!(
                sample.state.iter().all(|value| *value >= -NEGATIVE_SLACK),
                "{:?} at t = {}: {:?}",
                chemotype,
                sample.time,
                sample.state
            );
        }
        let per_spike = simplified_per_spike(&trajectory)?;
        assert!(per_spike.per_spike_u.iter().all(|value| value.is_finite()));
    }
    Ok(())
}

#[test]
fn full_model_aggregates_track_simplified_spike_totals() -> anyhow::Result<()> {
    let full = run_full(Chemotype::Niv, &IntegratorSettings::default())?;
    let simplified = run_simplified(Chemotype::Niv)?;
    let comparison = compare_models(&full, &simplified)?;

    assert_eq!(comparison.times.len(), 101);
    // Both spike totals are squeezed between the solutions of
    // N' = mu (K - N) - delta N and N' = mu (K - N), at most 1/6 apart.
    assert!(
        comparison.max_deviation_spikes < 0.2,
        "spike deviation {}",
        comparison.max_deviation_spikes
    );
    for deviation in comparison.deviation_u.iter().chain(&comparison.deviation_v) {
        assert!(deviation.is_finite());
        assert!((0.0..=2.0).contains(deviation));
    }
    // t = 0: S·US + I·UI = 5 against U = 1.
    assert!((comparison.deviation_u[0] - 0.8).abs() < 1e-12);

    let metrics = derive_metrics(&full)?;
    let last = metrics.len() - 1;
    assert!(metrics.total_u[last] > 0.0);
    assert!(metrics.total_v[last] > 0.0);
    Ok(())
}

/// Late-season bounds on the alate deviation, per chemotype: `(U, V)`.
fn late_season_bounds(chemotype: Chemotype) -> (f64, f64) {
    match chemotype {
        Chemotype::Niv => (0.35, 0.5),
        Chemotype::Don => (0.65, 0.45),
    }
}

#[test]
fn matched_alate_split_tracks_simplified_alatae_late_in_season() -> anyhow::Result<()> {
    // S·US + I·UI = 5·0.1 + 5·0.1 = U of the simplified standard state.
    let initial = FullState {
        us: 0.1,
        ui: 0.1,
        ..FullState::standard()
    };
    for chemotype in Chemotype::ALL {
        let full = run_full_from(chemotype, &initial, &IntegratorSettings::default())?;
        let simplified = run_simplified(chemotype)?;
        let comparison = compare_models(&full, &simplified)?;

        assert_eq!(comparison.deviation_u[0], 0.0);
        assert_eq!(comparison.deviation_v[0], 0.0);
        assert!(comparison.max_deviation_spikes < 0.2);

        // Once the apterae have saturated the spikes, both models produce
        // alatae at comparable rates.
        let (bound_u, bound_v) = late_season_bounds(chemotype);
        let late = comparison.times.len() - 20;
        for idx in late..comparison.times.len() {
            assert!(
                comparison.deviation_u[idx] < bound_u,
                "{chemotype:?}: U deviation {} at t = {}",
                comparison.deviation_u[idx],
                comparison.times[idx]
            );
            assert!(
                comparison.deviation_v[idx] < bound_v,
                "{chemotype:?}: V deviation {} at t = {}",
                comparison.deviation_v[idx],
                comparison.times[idx]
            );
        }
    }
    Ok(())
}

#[test]
fn literal_season_alatae_end_close_to_simplified() -> anyhow::Result<()> {
    let full = run_full(Chemotype::Niv, &IntegratorSettings::default())?;
    let simplified = run_simplified(Chemotype::Niv)?;
    let comparison = compare_models(&full, &simplified)?;
    let last = comparison.times.len() - 1;
    assert!(
        comparison.deviation_u[last] < 0.15,
        "U deviation {}",
        comparison.deviation_u[last]
    );
    assert!(
        comparison.deviation_v[last] < 0.35,
        "V deviation {}",
        comparison.deviation_v[last]
    );
    Ok(())
}

#[test]
fn tighter_tolerance_barely_moves_the_season() -> anyhow::Result<()> {
    let tight = IntegratorSettings {
        max_steps: 1_000_000,
        ..IntegratorSettings::with_tolerances(1e-8, 1e-8)
    };
    let reference = run_full(Chemotype::Niv, &tight)?;
    let default = run_full(Chemotype::Niv, &IntegratorSettings::default())?;
    for (a, b) in reference.samples().iter().zip(default.samples()) {
        for (x, y) in a.state.iter().zip(&b.state) {
            assert!(
                (x - y).abs() <= 1e-3 * x.abs().max(1.0),
                "t = {}: {} vs {}",
                a.time,
                x,
                y
            );
        }
    }
    Ok(())
}

#[test]
fn repeated_season_runs_are_identical() -> anyhow::Result<()> {
    let first = run_full(Chemotype::Don, &IntegratorSettings::default())?;
    let second = run_full(Chemotype::Don, &IntegratorSettings::default())?;
    assert_eq!(first, second);
    Ok(())
}

#[test]
fn standard_set_runs_in_parallel_like_in_sequence() {
    let runner = ScenarioRunner::default();
    let scenarios = ScenarioRunner::standard_set();
    let parallel = runner.run(&scenarios);
    let sequential = runner.run_sequential(&scenarios);
    assert_eq!(parallel, sequential);

    for outcome in &parallel {
        let output = outcome
            .result
            .as_ref()
            .unwrap_or_else(|err| panic!("{} failed: {err}", outcome.label));
        assert_eq!(output.trajectory.len(), 101);
        assert_eq!(
            output.metrics.is_some(),
            outcome.variant == ModelVariant::Full
        );
    }

    let don_full = find_outcome(&parallel, "DON-full").expect("DON-full present");
    let niv_full = find_outcome(&parallel, "NIV-full").expect("NIV-full present");
    assert_ne!(
        don_full.result.as_ref().map(|o| o.trajectory.clone()).ok(),
        niv_full.result.as_ref().map(|o| o.trajectory.clone()).ok()
    );
}

#[test]
fn custom_scenario_uses_its_own_grid() {
    let scenario = Scenario::new(
        "short-don",
        aphid_core::scenario::ModelSetup::standard(Chemotype::Don, ModelVariant::Full),
        TimeGrid::Explicit(vec![0.0, 0.5, 7.25]),
    );
    let output = scenario
        .run(&IntegratorSettings::default())
        .expect("short run succeeds");
    assert_eq!(output.trajectory.times(), vec![0.0, 0.5, 7.25]);
    let table = output.trajectory.to_table();
    assert_eq!(table.columns[0], "t");
    assert_eq!(table.columns.len(), 9);
}
