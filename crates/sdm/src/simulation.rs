//! Per-step coordinator for the droplet engine.
//!
//! A step runs, in order:
//! 1. sync the environment cache from the Eulerian fields
//! 2. assign droplets to cells and sort them
//! 3. advection (periodic wrap, bounds check)
//! 4. condensation (wet >= dry check)
//! 5. sedimentation
//! 6. re-sort and reduce the diagnostics
//!
//! Any error ends the run; droplet state is never clamped back into range.

use log::{debug, info, warn};

use crate::config::{SdmConfig, XiDefinition};
use crate::diagnostics::{DiagnosticFields, DiagnosticsReducer};
use crate::droplets::DropletPopulation;
use crate::environment::EnvironmentCache;
use crate::error::{SdmError, SdmResult};
use crate::grid::EulerianFields;
use crate::processes::{
    growth_process, growth_variable, motion_process, settling_process, wet_radius, xi_threshold,
    DropletProcess,
};
use crate::sort::{assign_cells, SpatialIndex};
use crate::thermo::{rw3_eq, StandardThermo, ThermoRateLaws};
use crate::transform::{CubedRadius, Identity, LogRadius, SquaredRadius};

/// Super-droplet engine: population, caches and the configured processes.
pub struct SuperDropletSim {
    config: SdmConfig,
    droplets: DropletPopulation,
    env: EnvironmentCache,
    index: SpatialIndex,
    reducer: DiagnosticsReducer,
    diagnostics: DiagnosticFields,
    thermo: Box<dyn ThermoRateLaws>,

    motion: Box<dyn DropletProcess>,
    growth: Option<Box<dyn DropletProcess>>,
    settling: Option<Box<dyn DropletProcess>>,

    ccn_xi_threshold: f64,
    env_synced: bool,
    time: f64,
    step_count: u64,
}

impl SuperDropletSim {
    /// Build the engine with the default thermodynamics.
    pub fn new(config: SdmConfig) -> SdmResult<Self> {
        Self::with_thermo(config, Box::new(StandardThermo))
    }

    /// Build the engine with caller-supplied thermodynamic rate laws.
    pub fn with_thermo(config: SdmConfig, thermo: Box<dyn ThermoRateLaws>) -> SdmResult<Self> {
        config.validate()?;
        let grid = config.grid;

        let droplets = sample_population(&config);
        if droplets.is_empty() {
            return Err(SdmError::InvalidConfig(format!(
                "sd_conc_mean {} on a {}x{} grid yields no droplets",
                config.sd_conc_mean, grid.nx, grid.ny
            )));
        }

        let flags = config.processes;
        if flags.coalescence {
            warn!("coalescence requested but not implemented; collisions are ignored");
        }

        info!(
            "super-droplet engine: {} droplets on {}x{} cells, xi = {:?}, backend = {:?}",
            droplets.len(),
            grid.nx,
            grid.ny,
            config.xi,
            config.backend
        );
        info!(
            "  processes: advection ({:?}), condensation {} ({:?}), sedimentation {} ({:?})",
            config.advection_algo,
            flags.condensation,
            config.growth_algo,
            flags.sedimentation,
            config.settling_algo
        );

        let motion = motion_process(config.advection_algo);
        let growth = flags
            .condensation
            .then(|| growth_process(config.growth_algo, config.xi));
        let settling = flags
            .sedimentation
            .then(|| settling_process(config.settling_algo, config.xi));

        Ok(Self {
            env: EnvironmentCache::new(&grid),
            index: SpatialIndex::new(),
            reducer: DiagnosticsReducer::new(&grid),
            diagnostics: DiagnosticFields::new(&grid),
            thermo,
            motion,
            growth,
            settling,
            ccn_xi_threshold: xi_threshold(config.xi, config.ccn_threshold_radius),
            env_synced: false,
            time: 0.0,
            step_count: 0,
            droplets,
            config,
        })
    }

    /// Advance every enabled process by `dt` and refresh the diagnostics.
    pub fn step(&mut self, fields: &EulerianFields<'_>, dt: f64) -> SdmResult<&DiagnosticFields> {
        self.sync(fields, dt)?;
        self.sort();
        self.advect(dt)?;
        self.condevap(dt)?;
        self.sediment(dt)?;
        self.time += dt;
        self.step_count += 1;

        self.diagnose();
        debug!(
            "step {}: t = {:.3} s, {} occupied cells",
            self.step_count,
            self.time,
            self.index.segments.len()
        );
        Ok(&self.diagnostics)
    }

    /// Pull the Eulerian state into the environment cache.
    pub fn sync(&mut self, fields: &EulerianFields<'_>, dt: f64) -> SdmResult<()> {
        self.env.sync_velocity(fields, dt)?;
        self.env
            .sync_thermo(fields, self.thermo.as_ref(), self.config.backend)?;
        self.env_synced = true;
        Ok(())
    }

    /// Recompute cell ownership and the sorted index.
    pub fn sort(&mut self) {
        self.index
            .rebuild(&mut self.droplets, &self.config.grid, self.config.backend);
    }

    pub fn advect(&mut self, dt: f64) -> SdmResult<()> {
        self.motion
            .advance(&mut self.droplets, &self.env, self.time, dt, self.config.backend)
    }

    pub fn condevap(&mut self, dt: f64) -> SdmResult<()> {
        match self.growth.as_mut() {
            Some(process) => {
                process.advance(&mut self.droplets, &self.env, self.time, dt, self.config.backend)
            }
            None => Ok(()),
        }
    }

    pub fn sediment(&mut self, dt: f64) -> SdmResult<()> {
        match self.settling.as_mut() {
            Some(process) => {
                process.advance(&mut self.droplets, &self.env, self.time, dt, self.config.backend)
            }
            None => Ok(()),
        }
    }

    /// Re-sort on current positions and refresh the output grids.
    pub fn diagnose(&mut self) -> &DiagnosticFields {
        self.sort();
        self.reducer.diagnose(
            &self.droplets,
            &self.index,
            self.ccn_xi_threshold,
            self.config.backend,
            &mut self.diagnostics,
        );
        &self.diagnostics
    }

    /// Move every droplet in a sub-saturated cell to its kappa-Köhler
    /// equilibrium wet radius. Droplets in saturated cells, or whose root is
    /// not bracketed, keep their radius. Requires a prior [`sync`](Self::sync).
    ///
    /// Returns the number of droplets moved.
    pub fn equilibrate_wet_radii(&mut self) -> SdmResult<usize> {
        if !self.env_synced {
            return Err(SdmError::InvalidConfig(
                "environment must be synced before equilibrating wet radii".to_string(),
            ));
        }
        let backend = self.config.backend;
        let xi_def = self.config.xi;
        assign_cells(&mut self.droplets, &self.config.grid, backend);

        let env = &self.env;
        let droplets = &mut self.droplets;
        let (rd3, kappa, cell_id) = (&droplets.rd3, &droplets.kappa, &droplets.cell_id);
        let mut targets = vec![None; droplets.len()];
        backend.fill_indexed(&mut targets, |d| {
            let cell = cell_id[d];
            rw3_eq(rd3[d], kappa[d], env.saturation_ratio(cell), env.kelvin_a[cell])
                .ok()
                .map(|rw3| growth_variable(xi_def, rw3.cbrt()))
        });

        backend.for_each_indexed(&mut droplets.xi, |d, xi| {
            if let Some(target) = targets[d] {
                *xi = target;
            }
        });
        let moved = targets.iter().filter(|t| t.is_some()).count();
        info!("equilibrated {} of {} droplets", moved, droplets.len());
        Ok(moved)
    }

    pub fn config(&self) -> &SdmConfig {
        &self.config
    }

    pub fn droplets(&self) -> &DropletPopulation {
        &self.droplets
    }

    /// Direct access to droplet state, for drivers that prescribe positions.
    pub fn droplets_mut(&mut self) -> &mut DropletPopulation {
        &mut self.droplets
    }

    pub fn environment(&self) -> &EnvironmentCache {
        &self.env
    }

    pub fn index(&self) -> &SpatialIndex {
        &self.index
    }

    pub fn diagnostics(&self) -> &DiagnosticFields {
        &self.diagnostics
    }

    /// Wet radius of droplet `d` (m).
    pub fn wet_radius(&self, d: usize) -> f64 {
        wet_radius(self.config.xi, self.droplets.xi[d])
    }

    pub fn total_multiplicity(&self) -> f64 {
        self.droplets.total_multiplicity()
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn step_count(&self) -> u64 {
        self.step_count
    }
}

fn sample_population(config: &SdmConfig) -> DropletPopulation {
    let (grid, spectrum) = (&config.grid, &config.spectrum);
    let (conc, kappa, seed) = (config.sd_conc_mean, config.kappa, config.seed);
    match config.xi {
        XiDefinition::Id => DropletPopulation::sample(grid, spectrum, conc, kappa, seed, &Identity),
        XiDefinition::Ln => DropletPopulation::sample(grid, spectrum, conc, kappa, seed, &LogRadius),
        XiDefinition::P2 => DropletPopulation::sample(grid, spectrum, conc, kappa, seed, &SquaredRadius),
        XiDefinition::P3 => DropletPopulation::sample(grid, spectrum, conc, kappa, seed, &CubedRadius),
    }
}
