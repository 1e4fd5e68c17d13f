use crate::sim_params::SimParams;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

// Configuration for the cylindrical grid
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct GridConfig {
    pub nz: usize,
    pub nr: usize,
    pub n_modes: usize,
    #[serde(default)]
    pub zmin: f64,
    pub zmax: f64,
    pub rmax: f64,
}

// Configuration for timing
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct TimingConfig {
    pub dt: f64,
    pub n_steps: u64,
}

// Configuration for the plasma loading region
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct PlasmaConfig {
    /// Requested loading bounds; snapped onto the grid at construction.
    pub p_zmin: f64,
    pub p_zmax: f64,
    pub p_rmin: f64,
    pub p_rmax: f64,
    /// Macroparticles per cell along z, r and theta.
    pub p_nz: u32,
    pub p_nr: u32,
    pub p_nt: u32,
    /// Peak electron density [particles per m^3].
    pub density: f64,
    /// Whether to load an ion species alongside the electrons.
    #[serde(default = "default_ions")]
    pub ions: bool,
    /// Thermal momentum spread (dimensionless u = gamma*v/c), 0 = cold.
    #[serde(default)]
    pub thermal_momentum: f64,
    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_ions() -> bool {
    true
}

fn default_seed() -> u64 {
    42
}

// Configuration for the moving window
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct WindowConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Window velocity as a fraction of c.
    #[serde(default = "default_velocity_factor")]
    pub velocity_factor: f64,
    /// Number of cells damped at the trailing edge.
    #[serde(default = "default_n_damp")]
    pub n_damp: usize,
}

fn default_velocity_factor() -> f64 {
    1.0
}

fn default_n_damp() -> usize {
    16
}

impl Default for WindowConfig {
    fn default() -> Self {
        WindowConfig {
            enabled: false,
            velocity_factor: default_velocity_factor(),
            n_damp: default_n_damp(),
        }
    }
}

// Configuration for the spectral solver
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct SolverConfig {
    /// Number of spectral low-pass filter passes applied to J and rho.
    #[serde(default = "default_filter_passes")]
    pub n_filter_passes: u32,
}

fn default_filter_passes() -> u32 {
    1
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            n_filter_passes: default_filter_passes(),
        }
    }
}

// Configuration for output settings
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct OutputConfig {
    pub directory: String,
    /// Iterations between field snapshots; 0 disables them.
    #[serde(default)]
    pub field_interval: u64,
    /// Iterations between particle dumps; 0 disables them.
    #[serde(default)]
    pub particle_interval: u64,
    /// Snapshot format: "json", "bincode" or "messagepack".
    pub format: Option<String>,
    #[serde(default)]
    pub save_final_positions: bool,
}

/// Main simulation configuration, loaded from a TOML file.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct SimulationConfig {
    pub grid: GridConfig,
    pub timing: TimingConfig,
    pub plasma: PlasmaConfig,
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default)]
    pub solver: SolverConfig,
    pub output: OutputConfig,
}

impl SimulationConfig {
    /// Loads the simulation configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();

        let config_str = std::fs::read_to_string(path_ref)
            .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path_ref.display(), e))?;
        let config: SimulationConfig = toml::from_str(&config_str)
            .map_err(|e| anyhow::anyhow!("Failed to parse TOML from '{}': {}", path_ref.display(), e))?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.grid.nz < 2 || self.grid.nr < 2 {
            anyhow::bail!("nz and nr must both be at least 2.");
        }
        if self.grid.n_modes == 0 {
            anyhow::bail!("n_modes must be at least 1.");
        }
        if self.grid.zmax <= self.grid.zmin {
            anyhow::bail!("zmax must be greater than zmin.");
        }
        if self.grid.rmax <= 0.0 {
            anyhow::bail!("rmax must be positive.");
        }
        if self.timing.dt <= 0.0 {
            anyhow::bail!("dt must be positive.");
        }
        if self.plasma.p_nz == 0 || self.plasma.p_nr == 0 || self.plasma.p_nt == 0 {
            anyhow::bail!("p_nz, p_nr and p_nt must all be at least 1.");
        }
        if self.plasma.density < 0.0 {
            anyhow::bail!("density must be non-negative.");
        }
        Ok(())
    }

    /// Converts the configuration into the derived runtime parameters.
    pub fn get_sim_params(&self) -> SimParams {
        let dz = (self.grid.zmax - self.grid.zmin) / self.grid.nz as f64;
        let dr = self.grid.rmax / self.grid.nr as f64;

        SimParams {
            nz: self.grid.nz,
            nr: self.grid.nr,
            n_modes: self.grid.n_modes,
            zmin: self.grid.zmin,
            zmax: self.grid.zmax,
            rmax: self.grid.rmax,
            dz,
            dr,
            dt: self.timing.dt,
            n_filter_passes: self.solver.n_filter_passes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_toml() -> &'static str {
        r#"
            [grid]
            nz = 64
            nr = 32
            n_modes = 2
            zmax = 1.0e-4
            rmax = 5.0e-5

            [timing]
            dt = 1.0e-15
            n_steps = 10

            [plasma]
            p_zmin = 0.0
            p_zmax = 1.0e-4
            p_rmin = 0.0
            p_rmax = 4.0e-5
            p_nz = 2
            p_nr = 2
            p_nt = 4
            density = 1.0e24

            [output]
            directory = "diags"
        "#
    }

    #[test]
    fn parses_minimal_config() {
        let config: SimulationConfig = toml::from_str(minimal_toml()).unwrap();
        config.validate().unwrap();
        assert_eq!(config.grid.nz, 64);
        assert_eq!(config.grid.zmin, 0.0);
        assert!(!config.window.enabled);
        assert_eq!(config.solver.n_filter_passes, 1);
        assert!(config.plasma.ions);
    }

    #[test]
    fn derives_grid_spacings() {
        let config: SimulationConfig = toml::from_str(minimal_toml()).unwrap();
        let params = config.get_sim_params();
        assert!((params.dz - 1.0e-4 / 64.0).abs() < 1e-20);
        assert!((params.dr - 5.0e-5 / 32.0).abs() < 1e-20);
    }

    #[test]
    fn rejects_degenerate_grid() {
        let mut config: SimulationConfig = toml::from_str(minimal_toml()).unwrap();
        config.grid.nz = 1;
        assert!(config.validate().is_err());
        config.grid.nz = 64;
        config.timing.dt = 0.0;
        assert!(config.validate().is_err());
    }
}
