//! Condensational growth and evaporation.
//!
//! The rate law is evaluated in radius space,
//!
//! ```text
//! dr/dt = D_v (rho_v - rho_vs * a_w(r³, rd³, kappa) * exp(A / r)) / (rho_w * r)
//! ```
//!
//! and mapped into the integration coordinate by the growth transform.

use super::DropletProcess;
use crate::backend::Backend;
use crate::constants::{VAPOUR_DIFFUSIVITY, WATER_DENSITY};
use crate::droplets::DropletPopulation;
use crate::environment::EnvironmentCache;
use crate::error::{SdmError, SdmResult};
use crate::ode::{OdeStepper, OdeSystem};
use crate::thermo::{kelvin_term, water_activity};
use crate::transform::GrowthTransform;

/// Radial growth rate (m/s) of one droplet.
#[inline]
pub fn radial_growth_rate(rw: f64, rd3: f64, kappa: f64, rho_v: f64, rho_vs: f64, kelvin_a: f64) -> f64 {
    let surface = rho_vs * water_activity(rw * rw * rw, rd3, kappa) * kelvin_term(rw, kelvin_a);
    VAPOUR_DIFFUSIVITY * (rho_v - surface) / (WATER_DENSITY * rw)
}

/// `d(xi)/dt` for every droplet, using the environment of its cell.
pub struct GrowthSystem<'a, T: GrowthTransform> {
    pub transform: T,
    pub env: &'a EnvironmentCache,
    pub rd3: &'a [f64],
    pub kappa: &'a [f64],
    pub cell_id: &'a [usize],
}

impl<T: GrowthTransform> OdeSystem for GrowthSystem<'_, T> {
    fn rhs(&self, state: &[f64], _t: f64, deriv: &mut [f64], backend: Backend) {
        let env = self.env;
        backend.fill_indexed(deriv, |d| {
            let cell = self.cell_id[d];
            let rw = self.transform.inverse(state[d]);
            let drdt = radial_growth_rate(
                rw,
                self.rd3[d],
                self.kappa[d],
                env.rhod_rv[cell],
                env.rho_vs[cell],
                env.kelvin_a[cell],
            );
            self.transform.rate(state[d], drdt)
        });
    }
}

#[derive(Debug)]
pub struct GrowthProcess<S: OdeStepper, T: GrowthTransform> {
    stepper: S,
    transform: T,
}

impl<S: OdeStepper + Default, T: GrowthTransform> GrowthProcess<S, T> {
    pub fn new(transform: T) -> Self {
        Self {
            stepper: S::default(),
            transform,
        }
    }
}

impl<S: OdeStepper, T: GrowthTransform> DropletProcess for GrowthProcess<S, T> {
    fn name(&self) -> &'static str {
        "condensation"
    }

    fn advance(
        &mut self,
        droplets: &mut DropletPopulation,
        env: &EnvironmentCache,
        t: f64,
        dt: f64,
        backend: Backend,
    ) -> SdmResult<()> {
        let system = GrowthSystem {
            transform: self.transform,
            env,
            rd3: &droplets.rd3,
            kappa: &droplets.kappa,
            cell_id: &droplets.cell_id,
        };
        self.stepper.do_step(&system, &mut droplets.xi, t, dt, backend);

        let transform = self.transform;
        let (xi, rd3) = (&droplets.xi, &droplets.rd3);
        let wet_volume = |d: usize| transform.inverse(xi[d]).powi(3);
        match backend.find_first_violation(droplets.len(), |d| wet_volume(d) >= rd3[d]) {
            Some(droplet) => Err(SdmError::WetBelowDry {
                droplet,
                rw3: wet_volume(droplet),
                rd3: rd3[droplet],
            }),
            None => Ok(()),
        }
    }
}
