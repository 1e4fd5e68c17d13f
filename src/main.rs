use anyhow::Result;
use log::{error, info};
use std::time::Instant;

use pic_engine::config::SimulationConfig;
use pic_engine::constants;
use pic_engine::diagnostics::{FieldSnapshotDiagnostic, ParticleDumpDiagnostic, SnapshotFormat};
use pic_engine::moving_window::MovingWindow;
use pic_engine::simulation::{Simulation, StepOptions};

fn main() -> Result<()> {
    env_logger::init();

    info!("Starting PIC engine...");

    let config = SimulationConfig::load("config.toml")?;
    info!(
        "Grid: {} x {} cells, {} azimuthal mode(s), dt = {:.3e} s.",
        config.grid.nz, config.grid.nr, config.grid.n_modes, config.timing.dt
    );

    let mut sim = Simulation::new(&config, None)?;

    // Attach the configured diagnostics.
    let format = SnapshotFormat::from_name(config.output.format.as_deref().unwrap_or("json"));
    if config.output.field_interval > 0 {
        sim.attach_diagnostic(Box::new(FieldSnapshotDiagnostic::new(
            config.output.directory.clone(),
            config.output.field_interval,
            format,
        )?));
    }
    if config.output.particle_interval > 0 {
        sim.attach_diagnostic(Box::new(ParticleDumpDiagnostic::new(
            config.output.directory.clone(),
            config.output.particle_interval,
        )?));
    }

    if config.window.enabled {
        let v = config.window.velocity_factor * constants::C_LIGHT;
        sim.attach_moving_window(MovingWindow::new(v, config.window.n_damp));
        info!(
            "Moving window attached: v = {:.3e} m/s, {} damping cells.",
            v, config.window.n_damp
        );
    }

    let options = StepOptions {
        use_moving_window: config.window.enabled,
        ..Default::default()
    };

    info!("Stepping {} iterations...", config.timing.n_steps);
    let start_time = Instant::now();
    if let Err(e) = sim.step(config.timing.n_steps, &options) {
        error!("Simulation aborted at iteration {}: {}", sim.iteration, e);
        return Err(e);
    }
    println!();
    let elapsed = start_time.elapsed();
    info!(
        "Completed {} iterations in {:.3} s ({:.2} ms/step), simulated time {:.3e} s.",
        sim.iteration,
        elapsed.as_secs_f64(),
        elapsed.as_secs_f64() * 1000.0 / sim.iteration.max(1) as f64,
        sim.time
    );

    if config.output.save_final_positions {
        std::fs::create_dir_all(&config.output.directory)?;
        let filename = format!("{}/final_positions.csv", config.output.directory);
        match csv::Writer::from_path(&filename) {
            Ok(mut writer) => {
                writer.write_record(["species", "z_m", "r_m"])?;
                for (is, sp) in sim.species.iter().enumerate() {
                    for ip in 0..sp.len() {
                        let r = (sp.x[ip] * sp.x[ip] + sp.y[ip] * sp.y[ip]).sqrt();
                        writer.write_record(&[
                            is.to_string(),
                            format!("{:.6e}", sp.z[ip]),
                            format!("{:.6e}", r),
                        ])?;
                    }
                }
                writer.flush()?;
                info!("Final positions saved to {}", filename);
            }
            Err(e) => error!("Error saving CSV file '{}': {}", filename, e),
        }
    }

    info!("Simulation Complete.");
    Ok(())
}
