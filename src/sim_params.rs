use serde::{Deserialize, Serialize};

/// Runtime parameters derived from the configuration, used throughout the
/// simulation. Kept separate from the raw config so hot paths never touch
/// string-valued or optional fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimParams {
    // Grid
    pub nz: usize,
    pub nr: usize,
    pub n_modes: usize,
    pub zmin: f64,
    pub zmax: f64,
    pub rmax: f64,
    pub dz: f64,
    pub dr: f64,

    // Time
    pub dt: f64,

    // Spectral filtering
    pub n_filter_passes: u32,
}

impl SimParams {
    /// Volume of the grid cell at radial index `ir` (a full azimuthal ring).
    pub fn cell_volume(&self, ir: usize) -> f64 {
        let r = (ir as f64 + 0.5) * self.dr;
        2.0 * std::f64::consts::PI * r * self.dr * self.dz
    }
}
