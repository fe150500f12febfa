//! Gravitational settling at terminal velocity.

use log::warn;

use super::DropletProcess;
use crate::backend::Backend;
use crate::droplets::DropletPopulation;
use crate::environment::EnvironmentCache;
use crate::error::SdmResult;
use crate::ode::{OdeStepper, OdeSystem};
use crate::thermo::terminal_velocity;
use crate::transform::GrowthTransform;

/// `dy/dt = -v_t(r, rho_a, eta)` over the Y positions.
pub struct SettlingSystem<'a, T: GrowthTransform> {
    pub transform: T,
    pub env: &'a EnvironmentCache,
    pub xi: &'a [f64],
    pub cell_id: &'a [usize],
}

impl<T: GrowthTransform> OdeSystem for SettlingSystem<'_, T> {
    fn rhs(&self, _state: &[f64], _t: f64, deriv: &mut [f64], backend: Backend) {
        let env = self.env;
        backend.fill_indexed(deriv, |d| {
            let cell = self.cell_id[d];
            let rw = self.transform.inverse(self.xi[d]);
            -terminal_velocity(rw, env.rhod[cell], env.eta[cell])
        });
    }
}

#[derive(Debug)]
pub struct SettlingProcess<S: OdeStepper, T: GrowthTransform> {
    stepper: S,
    transform: T,
}

impl<S: OdeStepper + Default, T: GrowthTransform> SettlingProcess<S, T> {
    pub fn new(transform: T) -> Self {
        Self {
            stepper: S::default(),
            transform,
        }
    }
}

impl<S: OdeStepper, T: GrowthTransform> DropletProcess for SettlingProcess<S, T> {
    fn name(&self) -> &'static str {
        "sedimentation"
    }

    fn advance(
        &mut self,
        droplets: &mut DropletPopulation,
        env: &EnvironmentCache,
        t: f64,
        dt: f64,
        backend: Backend,
    ) -> SdmResult<()> {
        let n = droplets.len();
        let system = SettlingSystem {
            transform: self.transform,
            env,
            xi: &droplets.xi,
            cell_id: &droplets.cell_id,
        };
        self.stepper.do_step(&system, &mut droplets.xy[n..], t, dt, backend);

        // Droplets leaving through the bottom or top are kept; the next sort
        // wraps their cell and the next advection step wraps their position.
        let height = env.grid().extent().y;
        let y = droplets.y();
        let escaped = backend.count_where(n, |d| !(0.0..height).contains(&y[d]));
        if escaped > 0 {
            warn!(
                "{} droplet(s) left the vertical domain during sedimentation",
                escaped
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::GridGeometry;
    use crate::ode::{Euler, RungeKutta4};
    use crate::thermo::{StandardThermo, ThermoRateLaws};
    use crate::transform::{CubedRadius, LogRadius};

    fn environment(grid: &GridGeometry) -> EnvironmentCache {
        let mut env = EnvironmentCache::new(grid);
        env.rhod.fill(1.2);
        env.eta.fill(StandardThermo.dynamic_viscosity(293.0));
        env
    }

    fn column(radii: &[f64], y0: f64, transform: &impl GrowthTransform) -> DropletPopulation {
        let mut pop = DropletPopulation::zeroed(radii.len());
        for (d, &r) in radii.iter().enumerate() {
            pop.xi[d] = transform.forward(r);
            pop.xy[radii.len() + d] = y0;
        }
        pop
    }

    #[test]
    fn test_larger_droplets_fall_faster() {
        let grid = GridGeometry::new(1, 1, 100.0, 100.0);
        let env = environment(&grid);
        let mut pop = column(&[5e-6, 20e-6, 100e-6], 50.0, &LogRadius);

        let mut process = SettlingProcess::<RungeKutta4, _>::new(LogRadius);
        process.advance(&mut pop, &env, 0.0, 1.0, Backend::Serial).unwrap();

        let y = pop.y();
        assert!(y[0] < 50.0);
        assert!(y[1] < y[0]);
        assert!(y[2] < y[1]);
        // x is untouched
        assert!(pop.x().iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_fall_distance_is_terminal_velocity_times_dt() {
        let grid = GridGeometry::new(1, 1, 100.0, 100.0);
        let env = environment(&grid);
        let r = 20e-6;
        let mut pop = column(&[r], 50.0, &CubedRadius);

        let mut process = SettlingProcess::<Euler, _>::new(CubedRadius);
        process.advance(&mut pop, &env, 0.0, 2.0, Backend::Serial).unwrap();

        let expected = 50.0 - 2.0 * terminal_velocity(r, env.rhod[0], env.eta[0]);
        assert!((pop.y()[0] - expected).abs() < 1e-9);
    }

    #[test]
    fn test_escaped_droplets_are_kept() {
        let grid = GridGeometry::new(1, 1, 10.0, 10.0);
        let env = environment(&grid);
        let mut pop = column(&[1e-3], 0.01, &LogRadius);

        let mut process = SettlingProcess::<Euler, _>::new(LogRadius);
        process.advance(&mut pop, &env, 0.0, 1.0, Backend::Serial).unwrap();
        assert_eq!(pop.len(), 1);
        assert!(pop.y()[0] < 0.0);
    }
}
