use crate::config::SimulationConfig;
use crate::constants::{ELECTRON_MASS, ELEMENTARY_CHARGE, PROTON_MASS};
use crate::diagnostics::Diagnostic;
use crate::error::SimulationError;
use crate::fields::{Fields, GridField, SpectField};
use crate::grid::adapt_to_grid;
use crate::moving_window::MovingWindow;
use crate::particles::{DensityProfile, Species, SpeciesSpec};
use crate::progress::{ProgressReporter, TextProgress};
use anyhow::Result;
use log::{debug, info};

/// Per-call toggles for the stepping loop. Defaults match a full physics
/// run; individual sub-steps can be frozen for reduced tests (e.g. vacuum
/// propagation with `particle_feedback = false`).
#[derive(Debug, Clone, Copy)]
pub struct StepOptions {
    /// Apply particle-sourced currents when pushing the fields.
    pub particle_feedback: bool,
    /// Correct the spectral current for charge conservation.
    pub correct_currents: bool,
    /// Apply the spectral low-pass filter to J and rho.
    pub filter_currents: bool,
    /// Advance particle positions.
    pub move_positions: bool,
    /// Advance particle momenta.
    pub move_momenta: bool,
    /// Invoke the moving-window collaborator; one must be attached.
    pub use_moving_window: bool,
}

impl Default for StepOptions {
    fn default() -> Self {
        StepOptions {
            particle_feedback: true,
            correct_currents: true,
            filter_currents: true,
            move_positions: true,
            move_momenta: true,
            use_moving_window: true,
        }
    }
}

/// Top-level simulation state and the methods that drive the PIC cycle.
pub struct Simulation {
    pub fields: Fields,
    /// One container per species; the order is fixed for the whole run.
    pub species: Vec<Species>,
    pub dt: f64,
    /// Macroparticles per cell along z, kept for moving-window injection.
    particles_per_cell_z: u32,
    pub time: f64,
    pub iteration: u64,
    diagnostics: Vec<Box<dyn Diagnostic>>,
    moving_window: Option<MovingWindow>,
    progress: Box<dyn ProgressReporter>,
}

impl Simulation {
    /// Builds the field container, aligns the particle-loading region onto
    /// the grid, loads the species and performs the initial charge
    /// deposition at t = 0.
    pub fn new(config: &SimulationConfig, profile: Option<DensityProfile>) -> Result<Self> {
        let params = config.get_sim_params();
        let plasma = &config.plasma;
        let mut fields = Fields::new(&params);

        // Snap the requested loading interval onto the grid; this fixes the
        // particle counts along z and r.
        let z_align = adapt_to_grid(
            &fields.interp[0].z,
            plasma.p_zmin,
            plasma.p_zmax,
            plasma.p_nz,
        )?;
        let r_align = adapt_to_grid(
            &fields.interp[0].r,
            plasma.p_rmin,
            plasma.p_rmax,
            plasma.p_nr,
        )?;
        debug!(
            "Aligned loading region: z in [{:.3e}, {:.3e}] ({} particles), r in [{:.3e}, {:.3e}] ({} particles)",
            z_align.min, z_align.max, z_align.particle_count,
            r_align.min, r_align.max, r_align.particle_count
        );

        let electron_spec = SpeciesSpec {
            charge: -ELEMENTARY_CHARGE,
            mass: ELECTRON_MASS,
            density: plasma.density,
            zmin: z_align.min,
            zmax: z_align.max,
            npz: z_align.particle_count,
            rmin: r_align.min.max(0.0),
            rmax: r_align.max,
            npr: r_align.particle_count,
            nptheta: plasma.p_nt as usize,
            thermal_momentum: plasma.thermal_momentum,
            seed: plasma.seed,
        };
        let mut species = vec![Species::new(electron_spec.clone(), profile.clone())];
        if plasma.ions {
            species.push(Species::new(
                SpeciesSpec {
                    charge: ELEMENTARY_CHARGE,
                    mass: PROTON_MASS,
                    thermal_momentum: 0.0,
                    seed: plasma.seed + 1,
                    ..electron_spec
                },
                profile,
            ));
        }
        info!(
            "Loaded {} species with {} particles in total.",
            species.len(),
            species.iter().map(|s| s.len()).sum::<usize>()
        );
        debug!(
            "Net macroparticle charge: {:.3e} C",
            species.iter().map(|s| s.total_charge()).sum::<f64>()
        );

        // Initial charge deposition at t = 0: this becomes rho_prev for the
        // first step.
        fields.erase(GridField::Rho);
        for sp in &species {
            sp.deposit(&mut fields.interp, GridField::Rho);
        }
        fields.divide_by_volume(GridField::Rho);
        fields.interp2spect(SpectField::RhoPrev);

        Ok(Simulation {
            fields,
            species,
            dt: params.dt,
            particles_per_cell_z: plasma.p_nz,
            time: 0.0,
            iteration: 0,
            diagnostics: Vec::new(),
            moving_window: None,
            progress: Box::new(TextProgress::default()),
        })
    }

    /// Attaches a diagnostics collaborator. Only call between `step` calls.
    pub fn attach_diagnostic(&mut self, diagnostic: Box<dyn Diagnostic>) {
        self.diagnostics.push(diagnostic);
    }

    /// Detaches every diagnostics collaborator.
    pub fn detach_diagnostics(&mut self) {
        self.diagnostics.clear();
    }

    /// Attaches the moving-window collaborator, required for stepping with
    /// `use_moving_window`.
    pub fn attach_moving_window(&mut self, window: MovingWindow) {
        self.moving_window = Some(window);
    }

    pub fn detach_moving_window(&mut self) -> Option<MovingWindow> {
        self.moving_window.take()
    }

    /// Replaces the progress reporter (e.g. to silence it in tests).
    pub fn set_progress(&mut self, progress: Box<dyn ProgressReporter>) {
        self.progress = progress;
    }

    /// Advances the simulation by `n_steps` PIC cycles.
    ///
    /// Each cycle runs a fixed sub-step sequence required by the staggered
    /// leapfrog scheme: fields are gathered at t = n dt, momenta advance a
    /// full step, positions advance in two half steps with the current
    /// deposited in between at t = (n + 1/2) dt, the charge density is
    /// deposited at t = (n + 1) dt, the current is corrected against the
    /// previous and next charge densities, and the fields advance last.
    /// Reordering any of this breaks charge conservation or the time
    /// staggering; it is deliberately a single straight-line sequence.
    ///
    /// A collaborator failure aborts the remaining steps immediately and
    /// leaves the state as of the last fully completed step; the interrupted
    /// step's partial mutations are not rolled back.
    pub fn step(&mut self, n_steps: u64, options: &StepOptions) -> Result<()> {
        // Precondition for the entire loop, checked before any mutation.
        if options.use_moving_window && self.moving_window.is_none() {
            return Err(SimulationError::MovingWindowNotAttached.into());
        }

        for i_step in 0..n_steps {
            // Pre-step snapshots, before any mutation of this cycle.
            for diagnostic in &mut self.diagnostics {
                diagnostic.write(self.iteration, &self.fields, &self.species)?;
            }

            self.progress.report(i_step, n_steps);

            if options.use_moving_window {
                if let Some(window) = self.moving_window.as_mut() {
                    window.move_window(
                        &mut self.fields,
                        &mut self.species,
                        self.particles_per_cell_z,
                        self.dt,
                    );
                }
            }

            // Gather the fields at t = n dt.
            for sp in &mut self.species {
                sp.gather(&self.fields.interp);
            }

            if options.move_momenta {
                for sp in &mut self.species {
                    sp.push_momentum(self.dt);
                }
            }
            if options.move_positions {
                for sp in &mut self.species {
                    sp.half_push_position(self.dt);
                }
            }

            // Current on the interpolation grid at t = (n + 1/2) dt.
            self.fields.erase(GridField::J);
            for sp in &self.species {
                sp.deposit(&mut self.fields.interp, GridField::J);
            }
            self.fields.divide_by_volume(GridField::J);
            if options.use_moving_window {
                if let Some(window) = self.moving_window.as_ref() {
                    window.damp(&mut self.fields.interp, GridField::J);
                }
            }
            self.fields.interp2spect(SpectField::J);
            if options.filter_currents {
                self.fields.filter_spect(SpectField::J);
            }

            // Positions to t = (n + 1) dt.
            if options.move_positions {
                for sp in &mut self.species {
                    sp.half_push_position(self.dt);
                }
            }

            // Charge density on the interpolation grid at t = (n + 1) dt.
            self.fields.erase(GridField::Rho);
            for sp in &self.species {
                sp.deposit(&mut self.fields.interp, GridField::Rho);
            }
            self.fields.divide_by_volume(GridField::Rho);
            if options.use_moving_window {
                if let Some(window) = self.moving_window.as_ref() {
                    window.damp(&mut self.fields.interp, GridField::Rho);
                }
            }
            self.fields.interp2spect(SpectField::RhoNext);
            if options.filter_currents {
                self.fields.filter_spect(SpectField::RhoNext);
            }

            // Requires rho at t = (n + 1) dt, hence its place in the order.
            if options.correct_currents {
                self.fields.correct_currents()?;
            }

            // E and B to t = (n + 1) dt, then back to the interpolation grid.
            self.fields.push(options.particle_feedback);
            self.fields.spect2interp(SpectField::E);
            self.fields.spect2interp(SpectField::B);

            self.time += self.dt;
            self.iteration += 1;
        }
        Ok(())
    }
}
