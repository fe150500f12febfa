//! Explicit fixed-step ODE integrators shared by all droplet systems.
//!
//! A stepper advances a flat state vector by exactly one step; there is no
//! error control and no step rejection. Scratch vectors are owned by the
//! stepper and reused across steps.

use crate::backend::Backend;

/// Right-hand side of `dy/dt = f(y, t)` over a flat state vector.
pub trait OdeSystem: Sync {
    /// Write `f(state, t)` into `deriv`.
    fn rhs(&self, state: &[f64], t: f64, deriv: &mut [f64], backend: Backend);
}

/// Single-step explicit integration scheme.
pub trait OdeStepper: Send {
    /// Formal order of accuracy.
    fn order(&self) -> u32;

    /// Advance `state` from `t` to `t + dt`.
    fn do_step<S: OdeSystem>(&mut self, system: &S, state: &mut [f64], t: f64, dt: f64, backend: Backend);
}

fn ensure_len(buf: &mut Vec<f64>, len: usize) {
    if buf.len() != len {
        buf.resize(len, 0.0);
    }
}

/// Forward Euler: `y += dt * f(y, t)`.
#[derive(Debug, Default)]
pub struct Euler {
    deriv: Vec<f64>,
}

impl OdeStepper for Euler {
    fn order(&self) -> u32 {
        1
    }

    fn do_step<S: OdeSystem>(&mut self, system: &S, state: &mut [f64], t: f64, dt: f64, backend: Backend) {
        ensure_len(&mut self.deriv, state.len());
        system.rhs(state, t, &mut self.deriv, backend);
        backend.axpy(state, dt, &self.deriv);
    }
}

/// Classical fourth-order Runge-Kutta.
#[derive(Debug, Default)]
pub struct RungeKutta4 {
    k1: Vec<f64>,
    k2: Vec<f64>,
    k3: Vec<f64>,
    k4: Vec<f64>,
    stage: Vec<f64>,
}

impl OdeStepper for RungeKutta4 {
    fn order(&self) -> u32 {
        4
    }

    fn do_step<S: OdeSystem>(&mut self, system: &S, state: &mut [f64], t: f64, dt: f64, backend: Backend) {
        let len = state.len();
        for buf in [&mut self.k1, &mut self.k2, &mut self.k3, &mut self.k4, &mut self.stage] {
            ensure_len(buf, len);
        }
        let half = 0.5 * dt;

        system.rhs(state, t, &mut self.k1, backend);

        backend.axpy_into(&mut self.stage, state, half, &self.k1);
        system.rhs(&self.stage, t + half, &mut self.k2, backend);

        backend.axpy_into(&mut self.stage, state, half, &self.k2);
        system.rhs(&self.stage, t + half, &mut self.k3, backend);

        backend.axpy_into(&mut self.stage, state, dt, &self.k3);
        system.rhs(&self.stage, t + dt, &mut self.k4, backend);

        let (k1, k2, k3, k4) = (&self.k1, &self.k2, &self.k3, &self.k4);
        let sixth = dt / 6.0;
        backend.for_each_indexed(state, |i, y| {
            *y += sixth * (k1[i] + 2.0 * k2[i] + 2.0 * k3[i] + k4[i]);
        });
    }
}
