/// The `aphid_core` crate is the simulation engine for aphid-vectored spread of
/// Fusarium head blight across wheat spikes over a growing season.
///
/// Key components:
/// - **Params / State**: validated parameter sets (NIV/DON chemotypes) and typed state vectors.
/// - **Models**: the full eight-compartment model and the simplified four-compartment model.
/// - **Solvers / Integrator**: a Bogacki–Shampine 3(2) pair driven by adaptive step control,
///   with dense output onto a caller-supplied time grid.
/// - **Metrics**: per-area and per-spike alate aggregates for comparing the two models.
/// - **Scenario**: independent runs collected per chemotype and model variant.
pub mod error;
pub mod integrator;
pub mod metrics;
pub mod models;
pub mod params;
pub mod scenario;
pub mod solvers;
pub mod state;
pub mod time_grid;
pub mod traits;
pub mod trajectory;

pub use error::{FailureCause, Result, SimulationError};
