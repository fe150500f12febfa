//! Long runs with every process enabled
//!
//! Multiplicity and droplet count are invariant; serial and parallel
//! backends produce identical states.

use sdm::{
    Backend, DrySpectrum, EulerianFields, GridGeometry, LognormalMode, OdeAlgorithm, SdmConfig,
    SuperDropletSim, XiDefinition, STABLE_GROWTH_DT,
};

const DT: f64 = STABLE_GROWTH_DT;

struct Fields {
    rhod: Vec<f64>,
    rhod_th: Vec<f64>,
    rhod_rv: Vec<f64>,
    courant_x: Vec<f64>,
    courant_y: Vec<f64>,
}

impl Fields {
    /// Sub-saturated air (~57% RH at ~280 K) in a shear flow: vx grows
    /// with height, vy alternates sign between columns.
    fn shear(grid: &GridGeometry) -> Self {
        let n = grid.cell_count();
        let mut courant_x = vec![0.0; grid.x_face_count()];
        for j in 0..grid.ny {
            for i in 0..=grid.nx {
                let vx = 0.5 + j as f64 * 0.25;
                courant_x[grid.x_face_index(i, j)] = vx * DT / grid.dx;
            }
        }
        let mut courant_y = vec![0.0; grid.y_face_count()];
        for j in 0..=grid.ny {
            for i in 0..grid.nx {
                let vy = if i % 2 == 0 { 0.3 } else { -0.3 };
                courant_y[grid.y_face_index(i, j)] = vy * DT / grid.dy;
            }
        }
        Self {
            rhod: vec![1.1; n],
            rhod_th: vec![1.1 * 290.0; n],
            rhod_rv: vec![1.1 * 0.004; n],
            courant_x,
            courant_y,
        }
    }

    fn view(&self) -> EulerianFields<'_> {
        EulerianFields {
            rhod: &self.rhod,
            rhod_th: &self.rhod_th,
            rhod_rv: &self.rhod_rv,
            courant_x: &self.courant_x,
            courant_y: &self.courant_y,
        }
    }
}

/// Micron-sized dry particles keep the explicit growth step stable at DT
fn config(xi: XiDefinition, backend: Backend) -> SdmConfig {
    SdmConfig {
        grid: GridGeometry::new(6, 5, 2.0, 2.0),
        sd_conc_mean: 40.0,
        spectrum: DrySpectrum {
            min_rd: 1e-6,
            max_rd: 2e-6,
            modes: vec![LognormalMode {
                mean_rd: 1.4e-6,
                sdev_rd: 1.3,
                n_tot: 1e6,
            }],
        },
        xi,
        advection_algo: OdeAlgorithm::Rk4,
        growth_algo: OdeAlgorithm::Rk4,
        settling_algo: OdeAlgorithm::Euler,
        backend,
        ..SdmConfig::default()
    }
}

fn run(config: SdmConfig, steps: usize) -> SuperDropletSim {
    let fields = Fields::shear(&config.grid);
    let mut sim = SuperDropletSim::new(config).unwrap();
    sim.sync(&fields.view(), DT).unwrap();
    sim.equilibrate_wet_radii().unwrap();
    for _ in 0..steps {
        sim.step(&fields.view(), DT).unwrap();
    }
    sim
}

#[test]
fn test_multiplicity_is_conserved() {
    for xi in [XiDefinition::Id, XiDefinition::Ln, XiDefinition::P2, XiDefinition::P3] {
        let config = config(xi, Backend::Parallel);
        let fields = Fields::shear(&config.grid);
        let mut sim = SuperDropletSim::new(config).unwrap();
        let n0 = sim.droplets().n.clone();
        let count = sim.droplets().len();

        sim.sync(&fields.view(), DT).unwrap();
        sim.equilibrate_wet_radii().unwrap();
        for _ in 0..200 {
            let diag = sim.step(&fields.view(), DT).unwrap();
            let sd: f64 = diag.sd_conc.iter().sum();
            assert_eq!(sd, count as f64);
        }

        assert_eq!(sim.droplets().n, n0, "xi = {:?}", xi);
        assert_eq!(sim.droplets().len(), count);
        let rd3 = &sim.droplets().rd3;
        for d in 0..count {
            assert!(sim.wet_radius(d).powi(3) >= rd3[d]);
        }
        assert_eq!(sim.step_count(), 200);
    }
}

/// The default configuration, all processes on, steps at the documented dt
/// from both a dry and an equilibrated start
#[test]
fn test_default_config_runs_with_condensation() {
    for xi in [XiDefinition::Id, XiDefinition::Ln, XiDefinition::P2, XiDefinition::P3] {
        for equilibrate in [false, true] {
            let config = SdmConfig {
                xi,
                ..SdmConfig::default()
            };
            assert!(config.processes.condensation && config.processes.sedimentation);
            let fields = Fields::shear(&config.grid);
            let mut sim = SuperDropletSim::new(config).unwrap();
            let n0 = sim.droplets().n.clone();

            sim.sync(&fields.view(), DT).unwrap();
            if equilibrate {
                assert_eq!(sim.equilibrate_wet_radii().unwrap(), sim.droplets().len());
            }
            for step in 0..10 {
                if let Err(e) = sim.step(&fields.view(), DT) {
                    panic!("xi = {:?}, equilibrated = {}: step {} failed: {}", xi, equilibrate, step, e);
                }
            }

            assert_eq!(sim.droplets().n, n0);
            let rd3 = &sim.droplets().rd3;
            for d in 0..sim.droplets().len() {
                let rw = sim.wet_radius(d);
                assert!(rw.is_finite() && rw.powi(3) >= rd3[d], "xi = {:?}: droplet {}", xi, d);
            }
        }
    }
}

#[test]
fn test_dry_radius_is_invariant() {
    let config = config(XiDefinition::Ln, Backend::Serial);
    let fields = Fields::shear(&config.grid);
    let mut sim = SuperDropletSim::new(config).unwrap();
    let rd3 = sim.droplets().rd3.clone();
    let kappa = sim.droplets().kappa.clone();

    sim.sync(&fields.view(), DT).unwrap();
    sim.equilibrate_wet_radii().unwrap();
    for _ in 0..50 {
        sim.step(&fields.view(), DT).unwrap();
    }
    assert_eq!(sim.droplets().rd3, rd3);
    assert_eq!(sim.droplets().kappa, kappa);
}

#[test]
fn test_serial_and_parallel_agree() {
    let serial = run(config(XiDefinition::P3, Backend::Serial), 100);
    let parallel = run(config(XiDefinition::P3, Backend::Parallel), 100);

    assert_eq!(serial.droplets().xy, parallel.droplets().xy);
    assert_eq!(serial.droplets().xi, parallel.droplets().xi);
    assert_eq!(serial.index().sorted_droplet_id, parallel.index().sorted_droplet_id);
    assert_eq!(serial.diagnostics(), parallel.diagnostics());
}
