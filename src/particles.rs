use crate::constants::C_LIGHT;
use crate::fields::{Cplx, GridField, InterpGrid};
use rand::prelude::*;
use rand_distr::StandardNormal;
use rayon::prelude::*;
use std::sync::Arc;

/// Relative density factor in [0, 1] as a function of (z, r).
pub type DensityProfile = Arc<dyn Fn(f64, f64) -> f64 + Send + Sync>;

/// Loading parameters for one particle species.
#[derive(Debug, Clone)]
pub struct SpeciesSpec {
    pub charge: f64,
    pub mass: f64,
    /// Peak number density [m^-3].
    pub density: f64,
    /// Grid-aligned longitudinal loading bounds and total particle count
    /// along z (from `adapt_to_grid`).
    pub zmin: f64,
    pub zmax: f64,
    pub npz: usize,
    /// Grid-aligned radial loading bounds and total particle count along r.
    pub rmin: f64,
    pub rmax: f64,
    pub npr: usize,
    /// Number of particles along the azimuthal direction.
    pub nptheta: usize,
    /// Thermal momentum spread (dimensionless), 0 = cold.
    pub thermal_momentum: f64,
    pub seed: u64,
}

/// One particle species: SoA per-particle state plus the loading parameters
/// needed for moving-window injection. Momenta are dimensionless,
/// u = gamma v / c.
pub struct Species {
    pub charge: f64,
    pub mass: f64,
    pub density: f64,

    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub z: Vec<f64>,
    pub ux: Vec<f64>,
    pub uy: Vec<f64>,
    pub uz: Vec<f64>,
    pub inv_gamma: Vec<f64>,
    /// Physical particles represented by each macroparticle.
    pub weight: Vec<f64>,

    // Fields gathered at the particle positions (Cartesian components),
    // refreshed by `gather` and consumed by `push_momentum`.
    ex: Vec<f64>,
    ey: Vec<f64>,
    ez: Vec<f64>,
    bx: Vec<f64>,
    by: Vec<f64>,
    bz: Vec<f64>,

    // Loading bookkeeping for window injection.
    dz_part: f64,
    rmin: f64,
    rmax: f64,
    npr: usize,
    nptheta: usize,
    thermal_momentum: f64,
    profile: Option<DensityProfile>,
    rng: StdRng,
}

impl Species {
    /// Creates a species and loads its particles, evenly spaced over the
    /// aligned bounds, with weights set by the density and the optional
    /// profile.
    pub fn new(spec: SpeciesSpec, profile: Option<DensityProfile>) -> Self {
        let dz_part = (spec.zmax - spec.zmin) / spec.npz as f64;
        let mut species = Species {
            charge: spec.charge,
            mass: spec.mass,
            density: spec.density,
            x: Vec::new(),
            y: Vec::new(),
            z: Vec::new(),
            ux: Vec::new(),
            uy: Vec::new(),
            uz: Vec::new(),
            inv_gamma: Vec::new(),
            weight: Vec::new(),
            ex: Vec::new(),
            ey: Vec::new(),
            ez: Vec::new(),
            bx: Vec::new(),
            by: Vec::new(),
            bz: Vec::new(),
            dz_part,
            rmin: spec.rmin,
            rmax: spec.rmax,
            npr: spec.npr,
            nptheta: spec.nptheta,
            thermal_momentum: spec.thermal_momentum,
            profile,
            rng: StdRng::seed_from_u64(spec.seed),
        };
        species.load_slab(spec.zmin, spec.zmax);
        species
    }

    pub fn len(&self) -> usize {
        self.z.len()
    }

    pub fn is_empty(&self) -> bool {
        self.z.is_empty()
    }

    /// Total charge carried by the species [C].
    pub fn total_charge(&self) -> f64 {
        self.charge * self.weight.iter().sum::<f64>()
    }

    /// Loads fresh plasma between `z0` and `z1`, using the spacing the
    /// species was constructed with. Used at construction and by the moving
    /// window for the slab uncovered by a shift.
    pub fn load_slab(&mut self, z0: f64, z1: f64) {
        let n_cols = ((z1 - z0) / self.dz_part).round() as usize;
        if n_cols == 0 || self.npr == 0 {
            return;
        }
        let dr_part = (self.rmax - self.rmin) / self.npr as f64;
        let dtheta = 2.0 * std::f64::consts::PI / self.nptheta as f64;
        for icol in 0..n_cols {
            let z = z0 + (icol as f64 + 0.5) * self.dz_part;
            for irow in 0..self.npr {
                let r = self.rmin + (irow as f64 + 0.5) * dr_part;
                let w_base = match &self.profile {
                    Some(f) => self.density * f(z, r),
                    None => self.density,
                } * r * dr_part * self.dz_part * dtheta;
                for itheta in 0..self.nptheta {
                    let theta = itheta as f64 * dtheta;
                    self.x.push(r * theta.cos());
                    self.y.push(r * theta.sin());
                    self.z.push(z);
                    let (ux, uy, uz) = if self.thermal_momentum > 0.0 {
                        (
                            self.thermal_momentum * self.rng.sample::<f64, _>(StandardNormal),
                            self.thermal_momentum * self.rng.sample::<f64, _>(StandardNormal),
                            self.thermal_momentum * self.rng.sample::<f64, _>(StandardNormal),
                        )
                    } else {
                        (0.0, 0.0, 0.0)
                    };
                    self.ux.push(ux);
                    self.uy.push(uy);
                    self.uz.push(uz);
                    self.inv_gamma
                        .push(1.0 / (1.0 + ux * ux + uy * uy + uz * uz).sqrt());
                    self.weight.push(w_base);
                }
            }
        }
        let n = self.z.len();
        for scratch in [
            &mut self.ex,
            &mut self.ey,
            &mut self.ez,
            &mut self.bx,
            &mut self.by,
            &mut self.bz,
        ] {
            scratch.resize(n, 0.0);
        }
    }

    /// Drops every particle behind `zmin` (left behind by the moving
    /// window). Returns how many were removed.
    pub fn remove_left_of(&mut self, zmin: f64) -> usize {
        let keep: Vec<bool> = self.z.iter().map(|&z| z >= zmin).collect();
        let before = self.z.len();
        fn filter<T: Copy>(v: &mut Vec<T>, keep: &[bool]) {
            let mut i = 0;
            v.retain(|_| {
                let k = keep[i];
                i += 1;
                k
            });
        }
        filter(&mut self.x, &keep);
        filter(&mut self.y, &keep);
        filter(&mut self.z, &keep);
        filter(&mut self.ux, &keep);
        filter(&mut self.uy, &keep);
        filter(&mut self.uz, &keep);
        filter(&mut self.inv_gamma, &keep);
        filter(&mut self.weight, &keep);
        filter(&mut self.ex, &keep);
        filter(&mut self.ey, &keep);
        filter(&mut self.ez, &keep);
        filter(&mut self.bx, &keep);
        filter(&mut self.by, &keep);
        filter(&mut self.bz, &keep);
        before - self.z.len()
    }

    /// Interpolates E and B from the interpolation grids onto every particle
    /// position, summing the azimuthal modes, and stores the Cartesian
    /// components in the per-particle scratch arrays.
    pub fn gather(&mut self, grids: &[InterpGrid]) {
        let xs = &self.x;
        let ys = &self.y;
        let zs = &self.z;
        self.ex
            .par_iter_mut()
            .zip(self.ey.par_iter_mut())
            .zip(self.ez.par_iter_mut())
            .zip(self.bx.par_iter_mut())
            .zip(self.by.par_iter_mut())
            .zip(self.bz.par_iter_mut())
            .enumerate()
            .for_each(|(ip, (((((ex, ey), ez), bx), by), bz))| {
                let x = xs[ip];
                let y = ys[ip];
                let z = zs[ip];
                let r = (x * x + y * y).sqrt();
                let (cos_t, sin_t) = if r > 0.0 {
                    (x / r, y / r)
                } else {
                    (1.0, 0.0)
                };

                let g0 = &grids[0];
                let (i00, i01, i10, i11, w00, w01, w10, w11) = bilinear_weights(g0, z, r);
                let bilin = |arr: &[Cplx]| -> Cplx {
                    arr[i00] * w00 + arr[i01] * w01 + arr[i10] * w10 + arr[i11] * w11
                };

                // Sum of the azimuthal modes, F(theta) = sum_m Re(F_m e^{i m theta}).
                let e_itheta = Cplx::new(cos_t, sin_t);
                let mut phase = Cplx::new(1.0, 0.0);
                let (mut er, mut et, mut ezv) = (0.0, 0.0, 0.0);
                let (mut br, mut bt, mut bzv) = (0.0, 0.0, 0.0);
                for grid in grids {
                    er += (bilin(&grid.er) * phase).re;
                    et += (bilin(&grid.et) * phase).re;
                    ezv += (bilin(&grid.ez) * phase).re;
                    br += (bilin(&grid.br) * phase).re;
                    bt += (bilin(&grid.bt) * phase).re;
                    bzv += (bilin(&grid.bz) * phase).re;
                    phase *= e_itheta;
                }

                *ex = er * cos_t - et * sin_t;
                *ey = er * sin_t + et * cos_t;
                *ez = ezv;
                *bx = br * cos_t - bt * sin_t;
                *by = br * sin_t + bt * cos_t;
                *bz = bzv;
            });
    }

    /// Advances every particle's momentum by a full timestep with the
    /// relativistic Boris rotation, using the fields gathered beforehand.
    pub fn push_momentum(&mut self, dt: f64) {
        let econst = self.charge * dt / (2.0 * self.mass * C_LIGHT);
        let bconst = self.charge * dt / (2.0 * self.mass);
        let ex = &self.ex;
        let ey = &self.ey;
        let ez = &self.ez;
        let bx = &self.bx;
        let by = &self.by;
        let bz = &self.bz;
        self.ux
            .par_iter_mut()
            .zip(self.uy.par_iter_mut())
            .zip(self.uz.par_iter_mut())
            .zip(self.inv_gamma.par_iter_mut())
            .enumerate()
            .for_each(|(ip, (((ux, uy), uz), inv_gamma))| {
                // Half electric kick
                let umx = *ux + econst * ex[ip];
                let umy = *uy + econst * ey[ip];
                let umz = *uz + econst * ez[ip];
                let gamma_m = (1.0 + umx * umx + umy * umy + umz * umz).sqrt();

                // Magnetic rotation
                let tx = bconst * bx[ip] / gamma_m;
                let ty = bconst * by[ip] / gamma_m;
                let tz = bconst * bz[ip] / gamma_m;
                let t2 = tx * tx + ty * ty + tz * tz;
                let sx = 2.0 * tx / (1.0 + t2);
                let sy = 2.0 * ty / (1.0 + t2);
                let sz = 2.0 * tz / (1.0 + t2);
                let upx = umx + (umy * tz - umz * ty);
                let upy = umy + (umz * tx - umx * tz);
                let upz = umz + (umx * ty - umy * tx);
                let urx = umx + (upy * sz - upz * sy);
                let ury = umy + (upz * sx - upx * sz);
                let urz = umz + (upx * sy - upy * sx);

                // Second half electric kick
                *ux = urx + econst * ex[ip];
                *uy = ury + econst * ey[ip];
                *uz = urz + econst * ez[ip];
                *inv_gamma = 1.0 / (1.0 + *ux * *ux + *uy * *uy + *uz * *uz).sqrt();
            });
    }

    /// Advances every particle's position by half a timestep.
    pub fn half_push_position(&mut self, dt: f64) {
        let half_cdt = 0.5 * C_LIGHT * dt;
        let ux = &self.ux;
        let uy = &self.uy;
        let uz = &self.uz;
        let inv_gamma = &self.inv_gamma;
        self.x
            .par_iter_mut()
            .zip(self.y.par_iter_mut())
            .zip(self.z.par_iter_mut())
            .enumerate()
            .for_each(|(ip, ((x, y), z))| {
                let f = half_cdt * inv_gamma[ip];
                *x += f * ux[ip];
                *y += f * uy[ip];
                *z += f * uz[ip];
            });
    }

    /// Accumulates this species' un-normalized contribution to the named
    /// field on the interpolation grids. The driver divides by the cell
    /// volume once per deposit.
    pub fn deposit(&self, grids: &mut [InterpGrid], field: GridField) {
        for ip in 0..self.z.len() {
            let x = self.x[ip];
            let y = self.y[ip];
            let z = self.z[ip];
            let r = (x * x + y * y).sqrt();
            let (cos_t, sin_t) = if r > 0.0 {
                (x / r, y / r)
            } else {
                (1.0, 0.0)
            };
            let qw = self.charge * self.weight[ip];

            let (i00, i01, i10, i11, w00, w01, w10, w11) = bilinear_weights(&grids[0], z, r);

            // Deposit with e^{-i m theta}, doubled for m > 0 so that the
            // gather-side reconstruction recovers the field.
            let e_mitheta = Cplx::new(cos_t, -sin_t);
            let mut phase = Cplx::new(1.0, 0.0);
            match field {
                GridField::Rho => {
                    for (m, grid) in grids.iter_mut().enumerate() {
                        let coef = if m == 0 { 1.0 } else { 2.0 };
                        let amp = phase * (coef * qw);
                        grid.rho[i00] += amp * w00;
                        grid.rho[i01] += amp * w01;
                        grid.rho[i10] += amp * w10;
                        grid.rho[i11] += amp * w11;
                        phase *= e_mitheta;
                    }
                }
                GridField::J => {
                    let vfac = C_LIGHT * self.inv_gamma[ip];
                    let vx = self.ux[ip] * vfac;
                    let vy = self.uy[ip] * vfac;
                    let vz = self.uz[ip] * vfac;
                    let vr = vx * cos_t + vy * sin_t;
                    let vt = -vx * sin_t + vy * cos_t;
                    for (m, grid) in grids.iter_mut().enumerate() {
                        let coef = if m == 0 { 1.0 } else { 2.0 };
                        let base = phase * (coef * qw);
                        let (ar, at, az) = (base * vr, base * vt, base * vz);
                        grid.jr[i00] += ar * w00;
                        grid.jr[i01] += ar * w01;
                        grid.jr[i10] += ar * w10;
                        grid.jr[i11] += ar * w11;
                        grid.jt[i00] += at * w00;
                        grid.jt[i01] += at * w01;
                        grid.jt[i10] += at * w10;
                        grid.jt[i11] += at * w11;
                        grid.jz[i00] += az * w00;
                        grid.jz[i01] += az * w01;
                        grid.jz[i10] += az * w10;
                        grid.jz[i11] += az * w11;
                        phase *= e_mitheta;
                    }
                }
            }
        }
    }
}

/// Bilinear interpolation stencil of a position on an interpolation grid:
/// flat indices of the four surrounding grid points and their weights.
/// Positions outside the grid are clamped onto the edge cells.
#[inline(always)]
fn bilinear_weights(
    grid: &InterpGrid,
    z: f64,
    r: f64,
) -> (usize, usize, usize, usize, f64, f64, f64, f64) {
    let mut fz = (z - grid.z[0]) * grid.inv_dz;
    fz = fz.clamp(0.0, (grid.nz - 1) as f64 - 1e-9);
    let iz0 = fz as usize;
    let wz = fz - iz0 as f64;

    let mut fr = (r - grid.r[0]) * grid.inv_dr;
    fr = fr.clamp(0.0, (grid.nr - 1) as f64 - 1e-9);
    let ir0 = fr as usize;
    let wr = fr - ir0 as f64;

    let i00 = grid.idx(ir0, iz0);
    let i01 = grid.idx(ir0, iz0 + 1);
    let i10 = grid.idx(ir0 + 1, iz0);
    let i11 = grid.idx(ir0 + 1, iz0 + 1);
    (
        i00,
        i01,
        i10,
        i11,
        (1.0 - wz) * (1.0 - wr),
        wz * (1.0 - wr),
        (1.0 - wz) * wr,
        wz * wr,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::Fields;
    use crate::sim_params::SimParams;

    fn test_params() -> SimParams {
        SimParams {
            nz: 16,
            nr: 8,
            n_modes: 2,
            zmin: 0.0,
            zmax: 16.0e-6,
            rmax: 8.0e-6,
            dz: 1.0e-6,
            dr: 1.0e-6,
            dt: 1.0e-15,
            n_filter_passes: 1,
        }
    }

    fn electrons() -> Species {
        Species::new(
            SpeciesSpec {
                charge: -crate::constants::ELEMENTARY_CHARGE,
                mass: crate::constants::ELECTRON_MASS,
                density: 1.0e24,
                zmin: 2.0e-6,
                zmax: 14.0e-6,
                npz: 24,
                rmin: 0.0,
                rmax: 6.0e-6,
                npr: 12,
                nptheta: 4,
                thermal_momentum: 0.0,
                seed: 7,
            },
            None,
        )
    }

    #[test]
    fn loads_expected_particle_count_and_weights() {
        let species = electrons();
        assert_eq!(species.len(), 24 * 12 * 4);
        assert!(species.weight.iter().all(|&w| w > 0.0));
        // Total physical charge matches density times loaded volume.
        let volume = std::f64::consts::PI * (6.0e-6f64).powi(2) * 12.0e-6;
        let expected = -crate::constants::ELEMENTARY_CHARGE * 1.0e24 * volume;
        let rel = (species.total_charge() - expected).abs() / expected.abs();
        assert!(rel < 1e-12, "relative error {}", rel);
    }

    #[test]
    fn density_profile_scales_weights() {
        let uniform = electrons();
        let half = Species::new(
            SpeciesSpec {
                charge: -crate::constants::ELEMENTARY_CHARGE,
                mass: crate::constants::ELECTRON_MASS,
                density: 1.0e24,
                zmin: 2.0e-6,
                zmax: 14.0e-6,
                npz: 24,
                rmin: 0.0,
                rmax: 6.0e-6,
                npr: 12,
                nptheta: 4,
                thermal_momentum: 0.0,
                seed: 7,
            },
            Some(Arc::new(|_z, _r| 0.5)),
        );
        let rel = (half.total_charge() - 0.5 * uniform.total_charge()).abs()
            / uniform.total_charge().abs();
        assert!(rel < 1e-12);
    }

    #[test]
    fn deposit_conserves_charge() {
        let params = test_params();
        let mut fields = Fields::new(&params);
        let species = electrons();
        species.deposit(&mut fields.interp, GridField::Rho);
        fields.divide_by_volume(GridField::Rho);
        let mut integrated = 0.0;
        for ir in 0..params.nr {
            let vol = fields.cell_volume(ir);
            for iz in 0..params.nz {
                integrated += fields.interp[0].rho[ir * params.nz + iz].re * vol;
            }
        }
        let total = species.total_charge();
        let rel = (integrated - total).abs() / total.abs();
        assert!(rel < 1e-9, "relative error {}", rel);
    }

    #[test]
    fn gather_sees_uniform_field() {
        let params = test_params();
        let mut fields = Fields::new(&params);
        for v in fields.interp[0].ez.iter_mut() {
            *v = Cplx::new(5.0, 0.0);
        }
        let mut species = electrons();
        species.gather(&fields.interp);
        assert!(species.ez.iter().all(|&e| (e - 5.0).abs() < 1e-12));
        assert!(species.ex.iter().all(|&e| e.abs() < 1e-12));
    }

    #[test]
    fn boris_push_accelerates_against_ez_for_electrons() {
        let params = test_params();
        let mut fields = Fields::new(&params);
        let e0 = 1.0e9;
        for v in fields.interp[0].ez.iter_mut() {
            *v = Cplx::new(e0, 0.0);
        }
        let mut species = electrons();
        species.gather(&fields.interp);
        let dt = 1.0e-15;
        species.push_momentum(dt);
        let expected = species.charge * dt * e0 / (species.mass * C_LIGHT);
        for &uz in &species.uz {
            assert!(uz < 0.0);
            assert!((uz - expected).abs() / expected.abs() < 1e-9);
        }
    }

    #[test]
    fn half_push_moves_positions() {
        let mut species = electrons();
        for u in species.uz.iter_mut() {
            *u = 0.1;
        }
        for g in species.inv_gamma.iter_mut() {
            *g = 1.0 / (1.0f64 + 0.01).sqrt();
        }
        let z_before = species.z.clone();
        let dt = 1.0e-15;
        species.half_push_position(dt);
        let step = 0.5 * C_LIGHT * dt * 0.1 / (1.0f64 + 0.01).sqrt();
        for (before, after) in z_before.iter().zip(species.z.iter()) {
            assert!((after - before - step).abs() < 1e-19);
        }
    }

    #[test]
    fn removal_keeps_arrays_consistent() {
        let mut species = electrons();
        let n0 = species.len();
        let removed = species.remove_left_of(8.0e-6);
        assert!(removed > 0);
        assert_eq!(species.len(), n0 - removed);
        assert_eq!(species.x.len(), species.weight.len());
        assert!(species.z.iter().all(|&z| z >= 8.0e-6));
    }
}
