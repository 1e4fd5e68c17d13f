use crate::constants::{C_LIGHT, VACUUM_PERMITTIVITY};
use crate::error::SimulationError;
use crate::sim_params::SimParams;
use rustfft::num_complex::Complex;
use rustfft::num_traits::Zero;
use rustfft::{Fft, FftPlanner};
use std::sync::Arc;

pub type Cplx = Complex<f64>;

/// Interpolation-grid fields addressable by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridField {
    J,
    Rho,
}

/// Spectral-grid fields addressable by the driver. `RhoPrev` and `RhoNext`
/// are the two slots of the charge-density ring buffer; both are filled from
/// the single interpolation-side rho array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpectField {
    E,
    B,
    J,
    RhoPrev,
    RhoNext,
}

/// One azimuthal mode of the interpolation-space representation.
/// Row-major storage, radial rows with z contiguous: `idx = ir * nz + iz`.
#[derive(Debug)]
pub struct InterpGrid {
    pub nz: usize,
    pub nr: usize,
    pub dz: f64,
    pub dr: f64,
    pub inv_dz: f64,
    pub inv_dr: f64,
    /// Longitudinal grid-point positions (cell centers); advanced by the
    /// moving window.
    pub z: Vec<f64>,
    /// Radial grid-point positions (cell centers).
    pub r: Vec<f64>,

    pub er: Vec<Cplx>,
    pub et: Vec<Cplx>,
    pub ez: Vec<Cplx>,
    pub br: Vec<Cplx>,
    pub bt: Vec<Cplx>,
    pub bz: Vec<Cplx>,
    pub jr: Vec<Cplx>,
    pub jt: Vec<Cplx>,
    pub jz: Vec<Cplx>,
    pub rho: Vec<Cplx>,
}

impl InterpGrid {
    #[inline(always)]
    pub fn idx(&self, ir: usize, iz: usize) -> usize {
        ir * self.nz + iz
    }
}

/// One azimuthal mode of the spectral-space representation.
#[derive(Debug)]
pub(crate) struct SpectGrid {
    pub er: Vec<Cplx>,
    pub et: Vec<Cplx>,
    pub ez: Vec<Cplx>,
    pub br: Vec<Cplx>,
    pub bt: Vec<Cplx>,
    pub bz: Vec<Cplx>,
    pub jr: Vec<Cplx>,
    pub jt: Vec<Cplx>,
    pub jz: Vec<Cplx>,
    pub rho_prev: Vec<Cplx>,
    pub rho_next: Vec<Cplx>,
}

/// The field container: per-azimuthal-mode interpolation and spectral
/// representations of E, B, J and rho. The two representations are only
/// synchronized by explicit `interp2spect` / `spect2interp` calls; keeping
/// them consistent is the driver's responsibility.
pub struct Fields {
    pub nz: usize,
    pub nr: usize,
    pub n_modes: usize,
    pub dz: f64,
    pub dr: f64,
    pub dt: f64,
    zmin: f64,
    cell_volume: Vec<f64>,

    pub interp: Vec<InterpGrid>,
    pub(crate) spect: Vec<SpectGrid>,

    kz: Vec<f64>,
    kr: Vec<f64>,
    filter_z: Vec<f64>,
    filter_r: Vec<f64>,

    fft_z: Arc<dyn Fft<f64>>,
    ifft_z: Arc<dyn Fft<f64>>,
    fft_r: Arc<dyn Fft<f64>>,
    ifft_r: Arc<dyn Fft<f64>>,
    scratch_z: Vec<Cplx>,
    scratch_r: Vec<Cplx>,
    work: Vec<Cplx>,

    /// Whether rho_next was deposited since the last field push.
    rho_next_fresh: bool,
}

/// Wavenumbers of an unnormalized DFT over `n` samples spaced by `d`,
/// in standard wraparound order.
fn wavenumbers(n: usize, d: f64) -> Vec<f64> {
    (0..n)
        .map(|i| {
            let m = if i <= n / 2 {
                i as f64
            } else {
                i as f64 - n as f64
            };
            2.0 * std::f64::consts::PI * m / (n as f64 * d)
        })
        .collect()
}

/// Transform along both axes of a row-major `nr x nz` array. `work` must have
/// the same length as `data`; the result lands back in `data`.
fn fft2d(
    fft_z: &Arc<dyn Fft<f64>>,
    fft_r: &Arc<dyn Fft<f64>>,
    nz: usize,
    nr: usize,
    data: &mut [Cplx],
    work: &mut [Cplx],
    scratch_z: &mut [Cplx],
    scratch_r: &mut [Cplx],
) {
    // z-rows are contiguous: transform them in place first.
    for row in (0..nr * nz).step_by(nz) {
        fft_z.process_outofplace_with_scratch(
            &mut data[row..row + nz],
            &mut work[row..row + nz],
            scratch_z,
        );
    }
    // Transpose so r becomes contiguous, transform, transpose back.
    for ir in 0..nr {
        for iz in 0..nz {
            data[iz * nr + ir] = work[ir * nz + iz];
        }
    }
    for row in (0..nz * nr).step_by(nr) {
        fft_r.process_outofplace_with_scratch(
            &mut data[row..row + nr],
            &mut work[row..row + nr],
            scratch_r,
        );
    }
    for iz in 0..nz {
        for ir in 0..nr {
            data[ir * nz + iz] = work[iz * nr + ir];
        }
    }
}

impl Fields {
    pub fn new(params: &SimParams) -> Self {
        let (nz, nr, n_modes) = (params.nz, params.nr, params.n_modes);
        let n_cells = nz * nr;

        let z = crate::grid::axis(nz, params.zmin, params.zmax);
        let r = crate::grid::axis(nr, 0.0, params.rmax);
        let cell_volume: Vec<f64> = (0..nr).map(|ir| params.cell_volume(ir)).collect();

        let mut planner = FftPlanner::new();
        let fft_z = planner.plan_fft_forward(nz);
        let ifft_z = planner.plan_fft_inverse(nz);
        let fft_r = planner.plan_fft_forward(nr);
        let ifft_r = planner.plan_fft_inverse(nr);
        let scratch_z = vec![
            Cplx::zero();
            fft_z
                .get_outofplace_scratch_len()
                .max(ifft_z.get_outofplace_scratch_len())
        ];
        let scratch_r = vec![
            Cplx::zero();
            fft_r
                .get_outofplace_scratch_len()
                .max(ifft_r.get_outofplace_scratch_len())
        ];

        let kz = wavenumbers(nz, params.dz);
        let kr = wavenumbers(nr, params.dr);
        // Spectral equivalent of repeated binomial smoothing: one pass takes
        // the Nyquist component to exactly zero.
        let n_pass = params.n_filter_passes as i32;
        let filter_z: Vec<f64> = kz
            .iter()
            .map(|k| (0.5 * (1.0 + (k * params.dz).cos())).powi(n_pass))
            .collect();
        let filter_r: Vec<f64> = kr
            .iter()
            .map(|k| (0.5 * (1.0 + (k * params.dr).cos())).powi(n_pass))
            .collect();

        let interp = (0..n_modes)
            .map(|_| InterpGrid {
                nz,
                nr,
                dz: params.dz,
                dr: params.dr,
                inv_dz: 1.0 / params.dz,
                inv_dr: 1.0 / params.dr,
                z: z.clone(),
                r: r.clone(),
                er: vec![Cplx::zero(); n_cells],
                et: vec![Cplx::zero(); n_cells],
                ez: vec![Cplx::zero(); n_cells],
                br: vec![Cplx::zero(); n_cells],
                bt: vec![Cplx::zero(); n_cells],
                bz: vec![Cplx::zero(); n_cells],
                jr: vec![Cplx::zero(); n_cells],
                jt: vec![Cplx::zero(); n_cells],
                jz: vec![Cplx::zero(); n_cells],
                rho: vec![Cplx::zero(); n_cells],
            })
            .collect();
        let spect = (0..n_modes)
            .map(|_| SpectGrid {
                er: vec![Cplx::zero(); n_cells],
                et: vec![Cplx::zero(); n_cells],
                ez: vec![Cplx::zero(); n_cells],
                br: vec![Cplx::zero(); n_cells],
                bt: vec![Cplx::zero(); n_cells],
                bz: vec![Cplx::zero(); n_cells],
                jr: vec![Cplx::zero(); n_cells],
                jt: vec![Cplx::zero(); n_cells],
                jz: vec![Cplx::zero(); n_cells],
                rho_prev: vec![Cplx::zero(); n_cells],
                rho_next: vec![Cplx::zero(); n_cells],
            })
            .collect();

        Fields {
            nz,
            nr,
            n_modes,
            dz: params.dz,
            dr: params.dr,
            dt: params.dt,
            zmin: params.zmin,
            cell_volume,
            interp,
            spect,
            kz,
            kr,
            filter_z,
            filter_r,
            fft_z,
            ifft_z,
            fft_r,
            ifft_r,
            scratch_z,
            scratch_r,
            work: vec![Cplx::zero(); n_cells],
            rho_next_fresh: false,
        }
    }

    /// Lower edge of the simulation box along z.
    pub fn zmin(&self) -> f64 {
        self.zmin
    }

    /// Volume of the ring cell at radial index `ir`.
    pub fn cell_volume(&self, ir: usize) -> f64 {
        self.cell_volume[ir]
    }

    /// Zeroes the named field on the interpolation grid, across all modes.
    pub fn erase(&mut self, field: GridField) {
        for grid in &mut self.interp {
            match field {
                GridField::J => {
                    grid.jr.fill(Cplx::zero());
                    grid.jt.fill(Cplx::zero());
                    grid.jz.fill(Cplx::zero());
                }
                GridField::Rho => grid.rho.fill(Cplx::zero()),
            }
        }
    }

    /// Normalizes an accumulated deposit by the ring-cell volume.
    pub fn divide_by_volume(&mut self, field: GridField) {
        let nz = self.nz;
        for grid in &mut self.interp {
            for ir in 0..self.nr {
                let inv_vol = 1.0 / self.cell_volume[ir];
                let row = ir * nz..(ir + 1) * nz;
                match field {
                    GridField::J => {
                        for v in &mut grid.jr[row.clone()] {
                            *v *= inv_vol;
                        }
                        for v in &mut grid.jt[row.clone()] {
                            *v *= inv_vol;
                        }
                        for v in &mut grid.jz[row] {
                            *v *= inv_vol;
                        }
                    }
                    GridField::Rho => {
                        for v in &mut grid.rho[row] {
                            *v *= inv_vol;
                        }
                    }
                }
            }
        }
    }

    /// Copies the named field from the interpolation grid into its spectral
    /// slot and transforms it, for every mode.
    pub fn interp2spect(&mut self, field: SpectField) {
        let Fields {
            interp,
            spect,
            fft_z,
            fft_r,
            scratch_z,
            scratch_r,
            work,
            nz,
            nr,
            rho_next_fresh,
            ..
        } = self;
        for (ig, sg) in interp.iter().zip(spect.iter_mut()) {
            let pairs: Vec<(&Vec<Cplx>, &mut Vec<Cplx>)> = match field {
                SpectField::E => vec![(&ig.er, &mut sg.er), (&ig.et, &mut sg.et), (&ig.ez, &mut sg.ez)],
                SpectField::B => vec![(&ig.br, &mut sg.br), (&ig.bt, &mut sg.bt), (&ig.bz, &mut sg.bz)],
                SpectField::J => vec![(&ig.jr, &mut sg.jr), (&ig.jt, &mut sg.jt), (&ig.jz, &mut sg.jz)],
                SpectField::RhoPrev => vec![(&ig.rho, &mut sg.rho_prev)],
                SpectField::RhoNext => vec![(&ig.rho, &mut sg.rho_next)],
            };
            for (src, dst) in pairs {
                dst.copy_from_slice(src);
                fft2d(fft_z, fft_r, *nz, *nr, dst, work, scratch_z, scratch_r);
            }
        }
        if field == SpectField::RhoNext {
            *rho_next_fresh = true;
        }
    }

    /// Transforms the named field back onto the interpolation grid, for
    /// every mode.
    pub fn spect2interp(&mut self, field: SpectField) {
        let Fields {
            interp,
            spect,
            ifft_z,
            ifft_r,
            scratch_z,
            scratch_r,
            work,
            nz,
            nr,
            ..
        } = self;
        let norm = 1.0 / (*nz as f64 * *nr as f64);
        for (ig, sg) in interp.iter_mut().zip(spect.iter()) {
            let pairs: Vec<(&Vec<Cplx>, &mut Vec<Cplx>)> = match field {
                SpectField::E => vec![(&sg.er, &mut ig.er), (&sg.et, &mut ig.et), (&sg.ez, &mut ig.ez)],
                SpectField::B => vec![(&sg.br, &mut ig.br), (&sg.bt, &mut ig.bt), (&sg.bz, &mut ig.bz)],
                SpectField::J => vec![(&sg.jr, &mut ig.jr), (&sg.jt, &mut ig.jt), (&sg.jz, &mut ig.jz)],
                SpectField::RhoPrev => vec![(&sg.rho_prev, &mut ig.rho)],
                SpectField::RhoNext => vec![(&sg.rho_next, &mut ig.rho)],
            };
            for (src, dst) in pairs {
                dst.copy_from_slice(src);
                fft2d(ifft_z, ifft_r, *nz, *nr, dst, work, scratch_z, scratch_r);
                for v in dst.iter_mut() {
                    *v *= norm;
                }
            }
        }
    }

    /// Applies the spectral low-pass filter to the named field.
    pub fn filter_spect(&mut self, field: SpectField) {
        let (nz, nr) = (self.nz, self.nr);
        for sg in &mut self.spect {
            let targets: Vec<&mut Vec<Cplx>> = match field {
                SpectField::E => vec![&mut sg.er, &mut sg.et, &mut sg.ez],
                SpectField::B => vec![&mut sg.br, &mut sg.bt, &mut sg.bz],
                SpectField::J => vec![&mut sg.jr, &mut sg.jt, &mut sg.jz],
                SpectField::RhoPrev => vec![&mut sg.rho_prev],
                SpectField::RhoNext => vec![&mut sg.rho_next],
            };
            for arr in targets {
                for ir in 0..nr {
                    let fr = self.filter_r[ir];
                    for iz in 0..nz {
                        arr[ir * nz + iz] *= fr * self.filter_z[iz];
                    }
                }
            }
        }
    }

    /// Corrects the spectral current so that it satisfies the discrete
    /// continuity equation between `rho_prev` and `rho_next`. Requires
    /// `rho_next` to have been deposited since the last field push.
    pub fn correct_currents(&mut self) -> Result<(), SimulationError> {
        if !self.rho_next_fresh {
            return Err(SimulationError::StaleChargeDensity);
        }
        let (nz, nr) = (self.nz, self.nr);
        let inv_dt = 1.0 / self.dt;
        let i_unit = Cplx::new(0.0, 1.0);
        for sg in &mut self.spect {
            for ir in 0..nr {
                let kr = self.kr[ir];
                for iz in 0..nz {
                    let kz = self.kz[iz];
                    let k2 = kr * kr + kz * kz;
                    if k2 == 0.0 {
                        continue;
                    }
                    let i = ir * nz + iz;
                    // Continuity residual: d(rho)/dt + i k . J
                    let residual = i_unit * (kr * sg.jr[i] + kz * sg.jz[i])
                        + (sg.rho_next[i] - sg.rho_prev[i]) * inv_dt;
                    let alpha = i_unit * residual / k2;
                    sg.jr[i] += alpha * kr;
                    sg.jz[i] += alpha * kz;
                }
            }
        }
        Ok(())
    }

    /// Advances E and B by one full timestep in spectral space. When
    /// `particle_feedback` is false the J source term is omitted (vacuum
    /// propagation). Afterwards the charge-density ring buffer is promoted:
    /// `rho_next` becomes `rho_prev` and the next slot is marked stale.
    pub fn push(&mut self, particle_feedback: bool) {
        let (nz, nr) = (self.nz, self.nr);
        let dt = self.dt;
        let c2dt = C_LIGHT * C_LIGHT * dt;
        let jfac = if particle_feedback {
            dt / VACUUM_PERMITTIVITY
        } else {
            0.0
        };
        for sg in &mut self.spect {
            for ir in 0..nr {
                let kr = self.kr[ir];
                for iz in 0..nz {
                    let kz = self.kz[iz];
                    let i = ir * nz + iz;
                    let ic2dt = Cplx::new(0.0, c2dt);
                    let idt = Cplx::new(0.0, dt);

                    // dE/dt = c^2 (i k x B) - J / eps0
                    sg.er[i] += ic2dt * (-kz * sg.bt[i]) - jfac * sg.jr[i];
                    sg.et[i] += ic2dt * (kz * sg.br[i] - kr * sg.bz[i]) - jfac * sg.jt[i];
                    sg.ez[i] += ic2dt * (kr * sg.bt[i]) - jfac * sg.jz[i];

                    // dB/dt = -(i k x E), with the updated E
                    sg.br[i] += idt * (kz * sg.et[i]);
                    sg.bt[i] -= idt * (kz * sg.er[i] - kr * sg.ez[i]);
                    sg.bz[i] -= idt * (kr * sg.et[i]);
                }
            }
            std::mem::swap(&mut sg.rho_prev, &mut sg.rho_next);
        }
        self.rho_next_fresh = false;
    }

    /// Shifts every interpolation-grid array `n_cells` towards lower z and
    /// advances the longitudinal axis accordingly. The uncovered cells at the
    /// high-z edge are zeroed. Used by the moving window; spectral arrays are
    /// refreshed by the regular transform calls of the next sub-steps.
    pub(crate) fn roll_left(&mut self, n_cells: usize) {
        if n_cells == 0 {
            return;
        }
        let shift = n_cells as f64 * self.dz;
        let (nz, nr) = (self.nz, self.nr);
        let n = n_cells.min(nz);
        for grid in &mut self.interp {
            for arr in [
                &mut grid.er,
                &mut grid.et,
                &mut grid.ez,
                &mut grid.br,
                &mut grid.bt,
                &mut grid.bz,
                &mut grid.jr,
                &mut grid.jt,
                &mut grid.jz,
                &mut grid.rho,
            ] {
                for ir in 0..nr {
                    let row = &mut arr[ir * nz..(ir + 1) * nz];
                    row.copy_within(n.., 0);
                    for v in &mut row[nz - n..] {
                        *v = Cplx::zero();
                    }
                }
            }
            for z in &mut grid.z {
                *z += shift;
            }
        }
        self.zmin += shift;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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

    #[test]
    fn transforms_are_mutually_inverse() {
        let mut fields = Fields::new(&test_params());
        for (i, v) in fields.interp[0].er.iter_mut().enumerate() {
            *v = Cplx::new((i as f64 * 0.37).sin(), (i as f64 * 0.11).cos());
        }
        let original = fields.interp[0].er.clone();
        fields.interp2spect(SpectField::E);
        fields.spect2interp(SpectField::E);
        for (a, b) in original.iter().zip(fields.interp[0].er.iter()) {
            assert!((a - b).norm() < 1e-10);
        }
    }

    #[test]
    fn erase_and_divide_by_volume() {
        let mut fields = Fields::new(&test_params());
        let idx = fields.interp[0].idx(3, 5);
        fields.interp[0].jz[idx] = Cplx::new(6.0, 0.0);
        fields.divide_by_volume(GridField::J);
        let vol = fields.cell_volume(3);
        assert!((fields.interp[0].jz[idx].re - 6.0 / vol).abs() < 1e-12);
        fields.erase(GridField::J);
        assert!(fields.interp[0].jz.iter().all(|v| v.norm() == 0.0));
    }

    #[test]
    fn current_correction_enforces_continuity() {
        // Order-one spacings keep the residual check clear of float
        // cancellation noise.
        let params = SimParams {
            nz: 16,
            nr: 8,
            n_modes: 1,
            zmin: 0.0,
            zmax: 16.0,
            rmax: 8.0,
            dz: 1.0,
            dr: 1.0,
            dt: 0.5,
            n_filter_passes: 1,
        };
        let mut fields = Fields::new(&params);
        // Deposit incompatible J and rho histories through the public path.
        for (i, v) in fields.interp[0].jz.iter_mut().enumerate() {
            *v = Cplx::new((i as f64 * 0.13).sin(), 0.0);
        }
        for (i, v) in fields.interp[0].rho.iter_mut().enumerate() {
            *v = Cplx::new((i as f64 * 0.07).cos(), 0.0);
        }
        fields.interp2spect(SpectField::J);
        fields.interp2spect(SpectField::RhoPrev);
        for v in fields.interp[0].rho.iter_mut() {
            *v *= 0.5;
        }
        fields.interp2spect(SpectField::RhoNext);

        fields.correct_currents().unwrap();

        let inv_dt = 1.0 / fields.dt;
        let sg = &fields.spect[0];
        for ir in 0..fields.nr {
            let kr = fields.kr[ir];
            for iz in 0..fields.nz {
                let kz = fields.kz[iz];
                if kr * kr + kz * kz == 0.0 {
                    continue;
                }
                let i = ir * fields.nz + iz;
                let residual = Cplx::new(0.0, 1.0) * (kr * sg.jr[i] + kz * sg.jz[i])
                    + (sg.rho_next[i] - sg.rho_prev[i]) * inv_dt;
                assert!(
                    residual.norm() < 1e-9,
                    "continuity residual {} at ({}, {})",
                    residual.norm(),
                    ir,
                    iz
                );
            }
        }
    }

    #[test]
    fn correction_requires_fresh_rho_next() {
        let mut fields = Fields::new(&test_params());
        let err = fields.correct_currents().unwrap_err();
        assert!(matches!(err, SimulationError::StaleChargeDensity));

        // Depositing rho_next makes correction legal exactly once.
        fields.interp2spect(SpectField::RhoNext);
        fields.correct_currents().unwrap();
        fields.push(true);
        let err = fields.correct_currents().unwrap_err();
        assert!(matches!(err, SimulationError::StaleChargeDensity));
    }

    #[test]
    fn vacuum_push_preserves_zero_fields() {
        let mut fields = Fields::new(&test_params());
        // A nonzero current must not act on the fields without feedback.
        for v in fields.interp[0].jz.iter_mut() {
            *v = Cplx::new(1.0, 0.0);
        }
        fields.interp2spect(SpectField::J);
        fields.push(false);
        fields.spect2interp(SpectField::E);
        fields.spect2interp(SpectField::B);
        assert!(fields.interp[0].ez.iter().all(|v| v.norm() < 1e-14));
        assert!(fields.interp[0].bt.iter().all(|v| v.norm() < 1e-14));
    }

    #[test]
    fn feedback_push_sources_fields_from_current() {
        let mut fields = Fields::new(&test_params());
        for v in fields.interp[0].jz.iter_mut() {
            *v = Cplx::new(1.0, 0.0);
        }
        fields.interp2spect(SpectField::J);
        fields.push(true);
        fields.spect2interp(SpectField::E);
        let max_ez = fields.interp[0]
            .ez
            .iter()
            .map(|v| v.norm())
            .fold(0.0, f64::max);
        assert!(max_ez > 0.0);
    }

    #[test]
    fn filter_removes_nyquist_component() {
        let mut fields = Fields::new(&test_params());
        // Alternating sign along z is pure Nyquist.
        for ir in 0..fields.nr {
            for iz in 0..fields.nz {
                let i = ir * fields.nz + iz;
                fields.interp[0].jz[i] = Cplx::new(if iz % 2 == 0 { 1.0 } else { -1.0 }, 0.0);
            }
        }
        fields.interp2spect(SpectField::J);
        let nyquist = fields.nz / 2;
        assert!(fields.spect[0].jz[nyquist].norm() > 1.0);
        fields.filter_spect(SpectField::J);
        assert!(fields.spect[0].jz[nyquist].norm() < 1e-10);
    }

    #[test]
    fn roll_left_shifts_values_and_axis() {
        let mut fields = Fields::new(&test_params());
        let idx = fields.interp[0].idx(0, 5);
        fields.interp[0].ez[idx] = Cplx::new(3.0, 0.0);
        let zmin_before = fields.zmin();
        fields.roll_left(2);
        let moved = fields.interp[0].idx(0, 3);
        assert!((fields.interp[0].ez[moved].re - 3.0).abs() < 1e-15);
        assert!((fields.zmin() - zmin_before - 2.0 * fields.dz).abs() < 1e-18);
        // Uncovered cells are empty.
        let tail = fields.interp[0].idx(0, fields.nz - 1);
        assert_eq!(fields.interp[0].ez[tail], Cplx::new(0.0, 0.0));
    }
}
