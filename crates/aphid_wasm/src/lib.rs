//! WASM bindings exposing `aphid_core` runs to plotting front ends.
//!
//! Trajectories cross the boundary as tables: a `t` column followed by one
//! column per state variable, plus derived-metric tables for full-model runs.

mod scenario_runner;
mod simulation;

pub use scenario_runner::WasmScenarioRunner;
pub use simulation::WasmSimulation;

