use crate::error::Result;

/// A continuous-time model `dx/dt = f(t, x)` with its parameters bound in.
///
/// Implementations must be pure: `apply` reads `x`, writes `out`, and touches
/// nothing else, so independent runs can share a model across threads.
pub trait DynamicalSystem {
    /// Returns the dimension of the state space.
    fn dimension(&self) -> usize;

    /// Names of the state components, in slice order.
    fn state_names(&self) -> &'static [&'static str];

    /// Evaluates the vector field.
    /// t: current time
    /// x: current state
    /// out: buffer to write dx/dt
    fn apply(&self, t: f64, x: &[f64], out: &mut [f64]) -> Result<()>;
}

/// A typed, fixed-size state vector of one model variant.
pub trait StateVector: Sized + Copy {
    /// Component names, in slice order.
    const NAMES: &'static [&'static str];

    fn to_vec(&self) -> Vec<f64>;

    /// Builds a state from a slice laid out in `NAMES` order.
    /// Returns `None` when the length does not match.
    fn from_slice(values: &[f64]) -> Option<Self>;
}
