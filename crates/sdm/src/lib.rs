//! Super-droplet cloud microphysics: particle-mesh coupling and integration.
//!
//! A population of Lagrangian super-droplets, each standing for `n` identical
//! real droplets, is advected by the flow of an Eulerian grid, grows or
//! evaporates by vapour diffusion and settles under gravity. Per-cell
//! concentrations are reduced back onto the grid every step.
//!
//! # Example
//!
//! ```
//! use sdm::{EulerianFields, GridGeometry, SdmConfig, SuperDropletSim, STABLE_GROWTH_DT};
//!
//! let grid = GridGeometry::new(8, 8, 50.0, 50.0);
//! let config = SdmConfig {
//!     grid,
//!     sd_conc_mean: 4.0,
//!     ..SdmConfig::default()
//! };
//! let mut sim = SuperDropletSim::new(config).unwrap();
//!
//! let dt = STABLE_GROWTH_DT;
//! let n = grid.cell_count();
//! let rhod = vec![1.1; n];
//! let rhod_th = vec![1.1 * 290.0; n];
//! let rhod_rv = vec![1.1 * 0.004; n];
//! // 2 m/s to the right
//! let courant_x = vec![2.0 * dt / grid.dx; grid.x_face_count()];
//! let courant_y = vec![0.0; grid.y_face_count()];
//! let fields = EulerianFields {
//!     rhod: &rhod,
//!     rhod_th: &rhod_th,
//!     rhod_rv: &rhod_rv,
//!     courant_x: &courant_x,
//!     courant_y: &courant_y,
//! };
//!
//! sim.sync(&fields, dt).unwrap();
//! sim.equilibrate_wet_radii().unwrap();
//!
//! let diag = sim.step(&fields, dt).unwrap();
//! let droplets: f64 = diag.sd_conc.iter().sum();
//! assert_eq!(droplets, 8.0 * 8.0 * 4.0);
//! ```

pub mod backend;
pub mod config;
pub mod constants;
pub mod diagnostics;
pub mod droplets;
pub mod environment;
pub mod error;
pub mod grid;
pub mod ode;
pub mod processes;
pub mod simulation;
pub mod sort;
pub mod thermo;
pub mod transform;

pub use backend::Backend;
pub use config::{
    DrySpectrum, LognormalMode, OdeAlgorithm, ProcessFlags, SdmConfig, XiDefinition, STABLE_GROWTH_DT,
};
pub use diagnostics::{DiagnosticField, DiagnosticFields, DiagnosticsReducer};
pub use droplets::DropletPopulation;
pub use environment::EnvironmentCache;
pub use error::{SdmError, SdmResult};
pub use glam::DVec2;
pub use grid::{wrap_periodic, EulerianFields, GridGeometry};
pub use ode::{Euler, OdeStepper, OdeSystem, RungeKutta4};
pub use processes::DropletProcess;
pub use simulation::SuperDropletSim;
pub use sort::{CellSegments, SpatialIndex};
pub use thermo::{StandardThermo, ThermoRateLaws};
pub use transform::{CubedRadius, GrowthTransform, Identity, LogRadius, SquaredRadius};
