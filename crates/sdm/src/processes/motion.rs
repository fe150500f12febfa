//! Advection of droplet positions by the staggered flow field.

use glam::DVec2;

use super::DropletProcess;
use crate::backend::Backend;
use crate::droplets::DropletPopulation;
use crate::environment::EnvironmentCache;
use crate::error::SdmResult;
use crate::grid::wrap_periodic;
use crate::ode::{OdeStepper, OdeSystem};
use crate::sort::check_in_domain;

/// `d(x, y)/dt = v(x, y)` over the packed `xy` state.
pub struct MotionSystem<'a> {
    pub env: &'a EnvironmentCache,
}

impl OdeSystem for MotionSystem<'_> {
    fn rhs(&self, state: &[f64], _t: f64, deriv: &mut [f64], backend: Backend) {
        let n = state.len() / 2;
        let env = self.env;
        backend.fill_indexed(deriv, |k| {
            let d = k % n;
            let v = env.velocity_at(DVec2::new(state[d], state[n + d]));
            if k < n {
                v.x
            } else {
                v.y
            }
        });
    }
}

#[derive(Debug, Default)]
pub struct MotionProcess<S: OdeStepper> {
    stepper: S,
}

impl<S: OdeStepper> DropletProcess for MotionProcess<S> {
    fn name(&self) -> &'static str {
        "advection"
    }

    fn advance(
        &mut self,
        droplets: &mut DropletPopulation,
        env: &EnvironmentCache,
        t: f64,
        dt: f64,
        backend: Backend,
    ) -> SdmResult<()> {
        if droplets.is_empty() {
            return Ok(());
        }
        let system = MotionSystem { env };
        self.stepper.do_step(&system, &mut droplets.xy, t, dt, backend);

        let grid = env.grid();
        let extent = grid.extent();
        let (x, y) = droplets.xy_split_mut();
        backend.for_each_indexed(x, |_, a| *a = wrap_periodic(*a, extent.x));
        backend.for_each_indexed(y, |_, a| *a = wrap_periodic(*a, extent.y));

        check_in_domain(droplets, grid, backend)
    }
}
