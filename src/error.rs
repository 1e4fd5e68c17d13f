use thiserror::Error;

/// Failures the engine detects itself. Numerical failures raised inside
/// collaborators are not wrapped; they propagate to the caller unchanged.
#[derive(Debug, Error)]
pub enum SimulationError {
    /// `step` was asked to use the moving window but none is attached.
    /// Raised before any state mutation; attach a window and retry.
    #[error("a moving window was requested but none is attached to the simulation")]
    MovingWindowNotAttached,

    /// The requested particle-loading interval contains no grid point.
    /// Fatal to construction; the interval must span at least one grid spacing.
    #[error("no grid point lies strictly inside the loading interval [{min}, {max}]")]
    EmptyLoadingInterval { min: f64, max: f64 },

    /// Current correction was requested but the next-slot charge density has
    /// not been deposited since the last field push.
    #[error("current correction requires a freshly deposited charge density; rho_next is stale")]
    StaleChargeDensity,
}
