use crate::fields::Fields;
use crate::particles::Species;
use anyhow::Result;
use log::{debug, error};
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

/// A diagnostics collaborator. The driver calls `write` once per step with
/// the current iteration index, before any field or particle mutation for
/// that step; the implementation decides whether this iteration is due.
pub trait Diagnostic {
    fn write(&mut self, iteration: u64, fields: &Fields, species: &[Species]) -> Result<()>;
}

/// On-disk format for field snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotFormat {
    Json,
    Bincode,
    MessagePack,
}

impl SnapshotFormat {
    pub fn from_name(name: &str) -> Self {
        match name {
            "json" => SnapshotFormat::Json,
            "bincode" => SnapshotFormat::Bincode,
            "messagepack" => SnapshotFormat::MessagePack,
            other => {
                error!("Unknown output format: {}. Using JSON instead.", other);
                SnapshotFormat::Json
            }
        }
    }

    fn extension(self) -> &'static str {
        match self {
            SnapshotFormat::Json => "json",
            SnapshotFormat::Bincode => "bin",
            SnapshotFormat::MessagePack => "msgpack",
        }
    }
}

/// Axisymmetric-mode field snapshot written at record intervals.
#[derive(Debug, Serialize)]
pub struct FieldSnapshot {
    pub iteration: u64,
    pub nz: usize,
    pub nr: usize,
    pub zmin: f64,
    pub dz: f64,
    pub dr: f64,
    pub rho: Vec<f64>,
    pub ez: Vec<f64>,
    pub er: Vec<f64>,
    pub particle_counts: Vec<usize>,
}

/// Periodically serializes a mode-0 field snapshot to disk.
pub struct FieldSnapshotDiagnostic {
    directory: PathBuf,
    period: u64,
    format: SnapshotFormat,
}

impl FieldSnapshotDiagnostic {
    pub fn new(directory: impl Into<PathBuf>, period: u64, format: SnapshotFormat) -> Result<Self> {
        let directory = directory.into();
        std::fs::create_dir_all(&directory)?;
        Ok(FieldSnapshotDiagnostic {
            directory,
            period,
            format,
        })
    }
}

impl Diagnostic for FieldSnapshotDiagnostic {
    fn write(&mut self, iteration: u64, fields: &Fields, species: &[Species]) -> Result<()> {
        if self.period == 0 || iteration % self.period != 0 {
            return Ok(());
        }
        let mode0 = &fields.interp[0];
        let snapshot = FieldSnapshot {
            iteration,
            nz: fields.nz,
            nr: fields.nr,
            zmin: fields.zmin(),
            dz: fields.dz,
            dr: fields.dr,
            rho: mode0.rho.iter().map(|c| c.re).collect(),
            ez: mode0.ez.iter().map(|c| c.re).collect(),
            er: mode0.er.iter().map(|c| c.re).collect(),
            particle_counts: species.iter().map(|s| s.len()).collect(),
        };

        let filename = self.directory.join(format!(
            "fields_{:08}.{}",
            iteration,
            self.format.extension()
        ));
        let mut file = File::create(&filename)?;
        match self.format {
            SnapshotFormat::Json => {
                let json_string = serde_json::to_string(&snapshot)?;
                file.write_all(json_string.as_bytes())?;
            }
            SnapshotFormat::Bincode => {
                bincode::serialize_into(file, &snapshot)?;
            }
            SnapshotFormat::MessagePack => {
                rmp_serde::encode::write(&mut file, &snapshot)?;
            }
        }
        debug!("Wrote field snapshot {}", filename.display());
        Ok(())
    }
}

/// Periodically dumps per-particle phase space to CSV.
pub struct ParticleDumpDiagnostic {
    directory: PathBuf,
    period: u64,
}

impl ParticleDumpDiagnostic {
    pub fn new(directory: impl Into<PathBuf>, period: u64) -> Result<Self> {
        let directory = directory.into();
        std::fs::create_dir_all(&directory)?;
        Ok(ParticleDumpDiagnostic { directory, period })
    }
}

impl Diagnostic for ParticleDumpDiagnostic {
    fn write(&mut self, iteration: u64, _fields: &Fields, species: &[Species]) -> Result<()> {
        if self.period == 0 || iteration % self.period != 0 {
            return Ok(());
        }
        let filename = self
            .directory
            .join(format!("particles_{:08}.csv", iteration));
        let mut writer = csv::Writer::from_path(&filename)?;
        writer.write_record(["species", "z_m", "r_m", "uz", "weight"])?;
        for (is, sp) in species.iter().enumerate() {
            for ip in 0..sp.len() {
                let r = (sp.x[ip] * sp.x[ip] + sp.y[ip] * sp.y[ip]).sqrt();
                writer.write_record(&[
                    is.to_string(),
                    format!("{:.6e}", sp.z[ip]),
                    format!("{:.6e}", r),
                    format!("{:.6e}", sp.uz[ip]),
                    format!("{:.6e}", sp.weight[ip]),
                ])?;
            }
        }
        writer.flush()?;
        debug!("Wrote particle dump {}", filename.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particles::SpeciesSpec;
    use crate::sim_params::SimParams;

    fn test_params() -> SimParams {
        SimParams {
            nz: 8,
            nr: 4,
            n_modes: 1,
            zmin: 0.0,
            zmax: 8.0e-6,
            rmax: 4.0e-6,
            dz: 1.0e-6,
            dr: 1.0e-6,
            dt: 1.0e-15,
            n_filter_passes: 1,
        }
    }

    fn scratch_dir(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("pic-engine-{}-{}", tag, std::process::id()))
    }

    fn small_species() -> Species {
        Species::new(
            SpeciesSpec {
                charge: -crate::constants::ELEMENTARY_CHARGE,
                mass: crate::constants::ELECTRON_MASS,
                density: 1.0e24,
                zmin: 0.0,
                zmax: 8.0e-6,
                npz: 8,
                rmin: 0.0,
                rmax: 3.0e-6,
                npr: 3,
                nptheta: 2,
                thermal_momentum: 0.0,
                seed: 1,
            },
            None,
        )
    }

    #[test]
    fn field_snapshot_respects_period_and_parses() {
        let dir = scratch_dir("fields");
        let fields = Fields::new(&test_params());
        let species = vec![small_species()];
        let mut diag =
            FieldSnapshotDiagnostic::new(&dir, 5, SnapshotFormat::Json).unwrap();

        diag.write(3, &fields, &species).unwrap();
        assert!(!dir.join("fields_00000003.json").exists());
        diag.write(5, &fields, &species).unwrap();
        let path = dir.join("fields_00000005.json");
        let contents = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&contents).unwrap();
        assert_eq!(value["iteration"], 5);
        assert_eq!(value["particle_counts"][0], 8 * 3 * 2);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn particle_dump_writes_every_particle() {
        let dir = scratch_dir("particles");
        let fields = Fields::new(&test_params());
        let species = vec![small_species()];
        let mut diag = ParticleDumpDiagnostic::new(&dir, 1).unwrap();
        diag.write(0, &fields, &species).unwrap();

        let contents = std::fs::read_to_string(dir.join("particles_00000000.csv")).unwrap();
        // Header plus one line per particle.
        assert_eq!(contents.lines().count(), 1 + 8 * 3 * 2);

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
