//! Per-cell copy of the Eulerian state seen by the droplets.
//!
//! Gather: Eulerian fields -> per-cell buffers, shared by every droplet in a
//! cell. Derived thermodynamics is computed once per cell, not per droplet.
//! Rewritten wholesale each step.

use glam::DVec2;

use crate::backend::Backend;
use crate::error::{SdmError, SdmResult};
use crate::grid::{EulerianFields, GridGeometry};
use crate::thermo::ThermoRateLaws;

/// Cached environment, indexed by raveled cell id (or face id for velocities).
#[derive(Clone, Debug)]
pub struct EnvironmentCache {
    grid: GridGeometry,

    /// Dry air density (kg/m³)
    pub rhod: Vec<f64>,
    /// Density times potential temperature (kg K/m³)
    pub rhod_th: Vec<f64>,
    /// Density times vapour mixing ratio (kg/m³)
    pub rhod_rv: Vec<f64>,
    /// Vapour mixing ratio (kg/kg)
    pub r: Vec<f64>,
    /// Pressure (Pa)
    pub p: Vec<f64>,
    /// Temperature (K)
    pub t: Vec<f64>,
    /// Saturation vapour density (kg/m³)
    pub rho_vs: Vec<f64>,
    /// Kelvin curvature coefficient (m)
    pub kelvin_a: Vec<f64>,
    /// Dynamic viscosity of air (Pa s)
    pub eta: Vec<f64>,

    /// X velocity on left faces (m/s), size (nx+1) * ny
    pub vx: Vec<f64>,
    /// Y velocity on bottom faces (m/s), size nx * (ny+1)
    pub vy: Vec<f64>,
}

impl EnvironmentCache {
    /// Allocate buffers sized for the grid.
    pub fn new(grid: &GridGeometry) -> Self {
        let n = grid.cell_count();
        Self {
            grid: *grid,
            rhod: vec![0.0; n],
            rhod_th: vec![0.0; n],
            rhod_rv: vec![0.0; n],
            r: vec![0.0; n],
            p: vec![0.0; n],
            t: vec![0.0; n],
            rho_vs: vec![0.0; n],
            kelvin_a: vec![0.0; n],
            eta: vec![0.0; n],
            vx: vec![0.0; grid.x_face_count()],
            vy: vec![0.0; grid.y_face_count()],
        }
    }

    pub fn grid(&self) -> &GridGeometry {
        &self.grid
    }

    /// Copy the scalar fields and derive r, p, T and the per-cell rate-law
    /// coefficients.
    pub fn sync_thermo(
        &mut self,
        fields: &EulerianFields<'_>,
        laws: &dyn ThermoRateLaws,
        backend: Backend,
    ) -> SdmResult<()> {
        fields.validate(&self.grid)?;

        self.rhod.copy_from_slice(fields.rhod);
        self.rhod_th.copy_from_slice(fields.rhod_th);
        self.rhod_rv.copy_from_slice(fields.rhod_rv);

        let (rhod, rhod_th, rhod_rv) = (&self.rhod, &self.rhod_th, &self.rhod_rv);
        backend.fill_indexed(&mut self.r, |ij| rhod_rv[ij] / rhod[ij]);

        let r = &self.r;
        backend.fill_indexed(&mut self.p, |ij| laws.pressure(rhod_th[ij], r[ij]));

        let p = &self.p;
        backend.fill_indexed(&mut self.t, |ij| {
            laws.temperature(rhod_th[ij] / rhod[ij], p[ij], r[ij])
        });

        let t = &self.t;
        backend.fill_indexed(&mut self.rho_vs, |ij| laws.saturation_vapour_density(t[ij]));
        backend.fill_indexed(&mut self.kelvin_a, |ij| laws.kelvin_coefficient(t[ij]));
        backend.fill_indexed(&mut self.eta, |ij| laws.dynamic_viscosity(t[ij]));
        Ok(())
    }

    /// Rescale face Courant numbers to physical velocities.
    pub fn sync_velocity(&mut self, fields: &EulerianFields<'_>, dt: f64) -> SdmResult<()> {
        if !(dt.is_finite() && dt > 0.0) {
            return Err(SdmError::InvalidTimestep(dt));
        }
        fields.validate(&self.grid)?;

        let sx = self.grid.dx / dt;
        let sy = self.grid.dy / dt;
        for (v, c) in self.vx.iter_mut().zip(fields.courant_x) {
            *v = c * sx;
        }
        for (v, c) in self.vy.iter_mut().zip(fields.courant_y) {
            *v = c * sy;
        }
        Ok(())
    }

    /// Set a uniform flow; used by kinematic drivers and tests.
    pub fn set_uniform_velocity(&mut self, velocity: DVec2) {
        self.vx.fill(velocity.x);
        self.vy.fill(velocity.y);
    }

    /// Velocity at `pos`, linearly interpolated between the two staggered
    /// faces of the (periodically wrapped) cell containing it.
    #[inline]
    pub fn velocity_at(&self, pos: DVec2) -> DVec2 {
        let grid = &self.grid;
        let (i, j) = grid.wrapped_cell(pos);
        let fx = (pos.x / grid.dx - (pos.x / grid.dx).floor()).clamp(0.0, 1.0);
        let fy = (pos.y / grid.dy - (pos.y / grid.dy).floor()).clamp(0.0, 1.0);

        let u0 = self.vx[grid.x_face_index(i, j)];
        let u1 = self.vx[grid.x_face_index(i + 1, j)];
        let v0 = self.vy[grid.y_face_index(i, j)];
        let v1 = self.vy[grid.y_face_index(i, j + 1)];

        DVec2::new(u0 * (1.0 - fx) + u1 * fx, v0 * (1.0 - fy) + v1 * fy)
    }

    /// Ambient saturation ratio of a cell.
    #[inline]
    pub fn saturation_ratio(&self, cell: usize) -> f64 {
        self.rhod_rv[cell] / self.rho_vs[cell]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::thermo::StandardThermo;

    fn uniform_fields(grid: &GridGeometry) -> (Vec<f64>, Vec<f64>, Vec<f64>, Vec<f64>, Vec<f64>) {
        let n = grid.cell_count();
        (
            vec![1.1; n],
            vec![1.1 * 290.0; n],
            vec![1.1 * 0.008; n],
            vec![0.25; grid.x_face_count()],
            vec![-0.5; grid.y_face_count()],
        )
    }

    #[test]
    fn test_sync_derives_thermodynamics() {
        let grid = GridGeometry::new(3, 2, 10.0, 10.0);
        let (rhod, rhod_th, rhod_rv, cx, cy) = uniform_fields(&grid);
        let fields = EulerianFields {
            rhod: &rhod,
            rhod_th: &rhod_th,
            rhod_rv: &rhod_rv,
            courant_x: &cx,
            courant_y: &cy,
        };
        let mut env = EnvironmentCache::new(&grid);
        env.sync_thermo(&fields, &StandardThermo, Backend::Serial).unwrap();

        for ij in 0..grid.cell_count() {
            assert!((env.r[ij] - 0.008).abs() < 1e-15);
            assert!(env.t[ij] > 270.0 && env.t[ij] < 300.0);
            assert!(env.rho_vs[ij] > 0.0);
            assert!(env.eta[ij] > 1e-5 && env.eta[ij] < 2e-5);
        }
    }

    #[test]
    fn test_courant_rescaling() {
        let grid = GridGeometry::new(3, 2, 10.0, 4.0);
        let (rhod, rhod_th, rhod_rv, cx, cy) = uniform_fields(&grid);
        let fields = EulerianFields {
            rhod: &rhod,
            rhod_th: &rhod_th,
            rhod_rv: &rhod_rv,
            courant_x: &cx,
            courant_y: &cy,
        };
        let mut env = EnvironmentCache::new(&grid);
        env.sync_velocity(&fields, 2.0).unwrap();
        assert!(env.vx.iter().all(|&v| (v - 1.25).abs() < 1e-12));
        assert!(env.vy.iter().all(|&v| (v + 1.0).abs() < 1e-12));
        assert!(matches!(env.sync_velocity(&fields, 0.0), Err(SdmError::InvalidTimestep(_))));
    }

    #[test]
    fn test_velocity_interpolates_between_faces() {
        let grid = GridGeometry::new(2, 2, 1.0, 1.0);
        let mut env = EnvironmentCache::new(&grid);
        // vx grows linearly with the face index
        for j in 0..2 {
            for i in 0..3 {
                env.vx[grid.x_face_index(i, j)] = i as f64;
            }
        }
        let v = env.velocity_at(DVec2::new(0.25, 0.5));
        assert!((v.x - 0.25).abs() < 1e-12);
        assert_eq!(v.y, 0.0);

        // Position beyond the domain samples the wrapped cell
        let wrapped = env.velocity_at(DVec2::new(2.25, 0.5));
        assert!((wrapped.x - 0.25).abs() < 1e-12);
    }
}
