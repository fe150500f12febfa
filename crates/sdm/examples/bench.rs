//! Super-droplet step throughput, serial vs parallel backend
//!
//! Run with: cargo run --release --example bench -p sdm

use std::time::Instant;

use anyhow::{Context, Result};
use sdm::{Backend, EulerianFields, GridGeometry, SdmConfig, SuperDropletSim, STABLE_GROWTH_DT};

const NX: usize = 128;
const NY: usize = 128;
const CELL_SIZE: f64 = 50.0;
const SD_CONC_MEAN: f64 = 32.0;

const WARMUP_STEPS: u32 = 3;
const BENCH_STEPS: u32 = 20;
const DT: f64 = STABLE_GROWTH_DT;

fn main() -> Result<()> {
    env_logger::init();

    println!("=== Super-droplet Benchmark ===");
    println!(
        "Grid: {}x{}, cell_size: {} m, {} droplets",
        NX,
        NY,
        CELL_SIZE,
        (SD_CONC_MEAN * (NX * NY) as f64) as usize
    );

    for backend in [Backend::Serial, Backend::Parallel] {
        let ms = bench(backend)?;
        println!("{:?}: {:.3} ms/step, {:.1} steps/sec", backend, ms, 1000.0 / ms);
    }
    Ok(())
}

fn bench(backend: Backend) -> Result<f64> {
    let grid = GridGeometry::new(NX, NY, CELL_SIZE, CELL_SIZE);
    let config = SdmConfig {
        grid,
        sd_conc_mean: SD_CONC_MEAN,
        backend,
        ..SdmConfig::default()
    };

    let n = grid.cell_count();
    let rhod = vec![1.1; n];
    let rhod_th = vec![1.1 * 290.0; n];
    let rhod_rv = vec![1.1 * 0.006; n];
    // 3 m/s across, 1 m/s downwards
    let courant_x = vec![3.0 * DT / CELL_SIZE; grid.x_face_count()];
    let courant_y = vec![-1.0 * DT / CELL_SIZE; grid.y_face_count()];
    let fields = EulerianFields {
        rhod: &rhod,
        rhod_th: &rhod_th,
        rhod_rv: &rhod_rv,
        courant_x: &courant_x,
        courant_y: &courant_y,
    };

    let mut sim = SuperDropletSim::new(config).context("benchmark configuration rejected")?;

    for _ in 0..WARMUP_STEPS {
        sim.step(&fields, DT).context("warmup step failed")?;
    }

    let start = Instant::now();
    for _ in 0..BENCH_STEPS {
        sim.step(&fields, DT).context("benchmark step failed")?;
    }
    let elapsed = start.elapsed();
    Ok(elapsed.as_secs_f64() * 1000.0 / BENCH_STEPS as f64)
}
