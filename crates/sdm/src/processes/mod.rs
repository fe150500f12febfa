//! Droplet processes: the three ODE systems and their step drivers.
//!
//! Each process pairs an [`OdeSystem`](crate::ode::OdeSystem) right-hand side
//! with a stepper and the post-step checks for its state. The stepper and
//! growth transform are chosen once at construction; the boxed driver hides
//! the concrete types while everything per droplet stays monomorphised.

mod growth;
mod motion;
mod settling;

pub use growth::{GrowthProcess, GrowthSystem};
pub use motion::{MotionProcess, MotionSystem};
pub use settling::{SettlingProcess, SettlingSystem};

use crate::backend::Backend;
use crate::config::{OdeAlgorithm, XiDefinition};
use crate::droplets::DropletPopulation;
use crate::environment::EnvironmentCache;
use crate::error::SdmResult;
use crate::ode::{Euler, OdeStepper, RungeKutta4};
use crate::transform::{CubedRadius, GrowthTransform, Identity, LogRadius, SquaredRadius};

/// One stage of the per-step droplet pipeline.
pub trait DropletProcess: Send {
    /// Stage name for logs.
    fn name(&self) -> &'static str;

    /// Advance the process state by `dt` starting at time `t`.
    fn advance(
        &mut self,
        droplets: &mut DropletPopulation,
        env: &EnvironmentCache,
        t: f64,
        dt: f64,
        backend: Backend,
    ) -> SdmResult<()>;
}

/// Advection by the interpolated flow.
pub fn motion_process(algo: OdeAlgorithm) -> Box<dyn DropletProcess> {
    match algo {
        OdeAlgorithm::Euler => Box::new(MotionProcess::<Euler>::default()),
        OdeAlgorithm::Rk4 => Box::new(MotionProcess::<RungeKutta4>::default()),
    }
}

/// Condensational growth integrated in the `xi` coordinate.
pub fn growth_process(algo: OdeAlgorithm, xi: XiDefinition) -> Box<dyn DropletProcess> {
    match algo {
        OdeAlgorithm::Euler => with_transform::<Euler, GrowthFactory>(xi),
        OdeAlgorithm::Rk4 => with_transform::<RungeKutta4, GrowthFactory>(xi),
    }
}

/// Gravitational settling; terminal velocity depends on the wet radius.
pub fn settling_process(algo: OdeAlgorithm, xi: XiDefinition) -> Box<dyn DropletProcess> {
    match algo {
        OdeAlgorithm::Euler => with_transform::<Euler, SettlingFactory>(xi),
        OdeAlgorithm::Rk4 => with_transform::<RungeKutta4, SettlingFactory>(xi),
    }
}

/// The `xi` threshold equivalent to a physical radius cutoff.
pub fn xi_threshold(xi: XiDefinition, radius: f64) -> f64 {
    match xi {
        XiDefinition::Id => Identity.threshold(radius),
        XiDefinition::Ln => LogRadius.threshold(radius),
        XiDefinition::P2 => SquaredRadius.threshold(radius),
        XiDefinition::P3 => CubedRadius.threshold(radius),
    }
}

/// Wet radius of `xi` under the configured transform.
pub fn wet_radius(xi_def: XiDefinition, xi: f64) -> f64 {
    match xi_def {
        XiDefinition::Id => Identity.inverse(xi),
        XiDefinition::Ln => LogRadius.inverse(xi),
        XiDefinition::P2 => SquaredRadius.inverse(xi),
        XiDefinition::P3 => CubedRadius.inverse(xi),
    }
}

/// `xi` of a wet radius under the configured transform.
pub fn growth_variable(xi_def: XiDefinition, radius: f64) -> f64 {
    match xi_def {
        XiDefinition::Id => Identity.forward(radius),
        XiDefinition::Ln => LogRadius.forward(radius),
        XiDefinition::P2 => SquaredRadius.forward(radius),
        XiDefinition::P3 => CubedRadius.forward(radius),
    }
}

trait ProcessFactory {
    fn build<S, T>(transform: T) -> Box<dyn DropletProcess>
    where
        S: OdeStepper + Default + 'static,
        T: GrowthTransform;
}

struct GrowthFactory;
struct SettlingFactory;

impl ProcessFactory for GrowthFactory {
    fn build<S, T>(transform: T) -> Box<dyn DropletProcess>
    where
        S: OdeStepper + Default + 'static,
        T: GrowthTransform,
    {
        Box::new(GrowthProcess::<S, T>::new(transform))
    }
}

impl ProcessFactory for SettlingFactory {
    fn build<S, T>(transform: T) -> Box<dyn DropletProcess>
    where
        S: OdeStepper + Default + 'static,
        T: GrowthTransform,
    {
        Box::new(SettlingProcess::<S, T>::new(transform))
    }
}

fn with_transform<S, F>(xi: XiDefinition) -> Box<dyn DropletProcess>
where
    S: OdeStepper + Default + 'static,
    F: ProcessFactory,
{
    match xi {
        XiDefinition::Id => F::build::<S, _>(Identity),
        XiDefinition::Ln => F::build::<S, _>(LogRadius),
        XiDefinition::P2 => F::build::<S, _>(SquaredRadius),
        XiDefinition::P3 => F::build::<S, _>(CubedRadius),
    }
}
