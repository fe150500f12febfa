//! Super-droplet population stored as a structure of arrays.
//!
//! Positions are kept in one contiguous `xy` vector (`x = xy[..n]`,
//! `y = xy[n..]`) so advection integrates a single ODE state vector.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::config::{DrySpectrum, LognormalMode};
use crate::grid::GridGeometry;
use crate::transform::GrowthTransform;

/// All super-droplets of the run. Allocated once, never resized.
#[derive(Clone, Debug)]
pub struct DropletPopulation {
    /// Positions: X components followed by Y components (m)
    pub xy: Vec<f64>,
    /// Dry radius cubed (m³); invariant
    pub rd3: Vec<f64>,
    /// Growth variable in the active transform space
    pub xi: Vec<f64>,
    /// Multiplicity (number of real droplets represented); invariant
    pub n: Vec<f64>,
    /// Solubility parameter; invariant
    pub kappa: Vec<f64>,
    /// Owning cell, recomputed every step by the spatial indexer
    pub cell_id: Vec<usize>,
}

impl DropletPopulation {
    /// Allocate `count` zeroed droplets.
    pub fn zeroed(count: usize) -> Self {
        Self {
            xy: vec![0.0; 2 * count],
            rd3: vec![0.0; count],
            xi: vec![0.0; count],
            n: vec![0.0; count],
            kappa: vec![0.0; count],
            cell_id: vec![0; count],
        }
    }

    /// Sample a population: uniform positions, log-uniform dry radii weighted
    /// by the two-mode lognormal spectrum, wet radius equal to dry radius.
    pub fn sample<T: GrowthTransform>(
        grid: &GridGeometry,
        spectrum: &DrySpectrum,
        sd_conc_mean: f64,
        kappa: f64,
        seed: u64,
        transform: &T,
    ) -> Self {
        let count = (sd_conc_mean * grid.cell_count() as f64).round() as usize;
        let mut pop = Self::zeroed(count);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let extent = grid.extent();

        {
            let (x, y) = pop.xy.split_at_mut(count);
            x.iter_mut().for_each(|v| *v = rng.gen_range(0.0..extent.x));
            y.iter_mut().for_each(|v| *v = rng.gen_range(0.0..extent.y));
        }

        let ln_min = spectrum.min_rd.ln();
        let ln_max = spectrum.max_rd.ln();
        // Each droplet represents an equal slice of ln(rd) space within a cell
        let multi = (ln_max - ln_min) / sd_conc_mean * grid.cell_volume();

        for i in 0..count {
            let ln_rd = rng.gen_range(ln_min..ln_max);
            let n_e: f64 = spectrum.modes.iter().map(|m| m.number_density(ln_rd)).sum();
            pop.n[i] = (multi * n_e).round().max(1.0);
            pop.rd3[i] = (3.0 * ln_rd).exp();
            pop.xi[i] = transform.forward(ln_rd.exp());
        }
        pop.kappa.fill(kappa);

        pop
    }

    /// Number of droplets.
    pub fn len(&self) -> usize {
        self.rd3.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.rd3.is_empty()
    }

    /// X positions.
    pub fn x(&self) -> &[f64] {
        &self.xy[..self.len()]
    }

    /// Y positions.
    pub fn y(&self) -> &[f64] {
        &self.xy[self.len()..]
    }

    /// Mutable (X, Y) position slices.
    pub fn xy_split_mut(&mut self) -> (&mut [f64], &mut [f64]) {
        let n = self.len();
        self.xy.split_at_mut(n)
    }

    /// Total number of real droplets represented.
    pub fn total_multiplicity(&self) -> f64 {
        self.n.iter().sum()
    }

    /// Wet radius of droplet `i` under `transform`.
    pub fn wet_radius<T: GrowthTransform>(&self, i: usize, transform: &T) -> f64 {
        transform.inverse(self.xi[i])
    }
}

impl LognormalMode {
    /// Number density per unit ln(r) (m⁻³) at `ln_r`.
    pub fn number_density(&self, ln_r: f64) -> f64 {
        let ln_sdev = self.sdev_rd.ln();
        let z = (ln_r - self.mean_rd.ln()) / ln_sdev;
        self.n_tot / ((2.0 * std::f64::consts::PI).sqrt() * ln_sdev) * (-0.5 * z * z).exp()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::{CubedRadius, LogRadius};

    fn spectrum() -> DrySpectrum {
        DrySpectrum::default()
    }

    #[test]
    fn test_sample_size_and_bounds() {
        let grid = GridGeometry::new(4, 3, 20.0, 10.0);
        let pop = DropletPopulation::sample(&grid, &spectrum(), 16.0, 0.61, 7, &LogRadius);

        assert_eq!(pop.len(), 4 * 3 * 16);
        assert_eq!(pop.xy.len(), 2 * pop.len());
        let extent = grid.extent();
        assert!(pop.x().iter().all(|&x| (0.0..extent.x).contains(&x)));
        assert!(pop.y().iter().all(|&y| (0.0..extent.y).contains(&y)));
        assert!(pop.n.iter().all(|&n| n >= 1.0 && n.fract() == 0.0));
        assert!(pop.kappa.iter().all(|&k| k == 0.61));
    }

    #[test]
    fn test_sample_starts_dry() {
        let grid = GridGeometry::new(2, 2, 1.0, 1.0);
        let transform = CubedRadius;
        let pop = DropletPopulation::sample(&grid, &spectrum(), 8.0, 0.5, 1, &transform);
        for i in 0..pop.len() {
            let rw = pop.wet_radius(i, &transform);
            assert!((rw.powi(3) - pop.rd3[i]).abs() <= 1e-12 * pop.rd3[i]);
        }
    }

    #[test]
    fn test_sample_is_reproducible() {
        let grid = GridGeometry::new(3, 3, 1.0, 1.0);
        let a = DropletPopulation::sample(&grid, &spectrum(), 4.0, 0.5, 42, &LogRadius);
        let b = DropletPopulation::sample(&grid, &spectrum(), 4.0, 0.5, 42, &LogRadius);
        assert_eq!(a.xy, b.xy);
        assert_eq!(a.rd3, b.rd3);
        assert_eq!(a.n, b.n);
    }

    #[test]
    fn test_lognormal_integrates_to_total() {
        let mode = LognormalMode {
            mean_rd: 0.04e-6,
            sdev_rd: 1.4,
            n_tot: 60e6,
        };
        // Trapezoid over ln(r) within +-8 geometric deviations
        let lo = mode.mean_rd.ln() - 8.0 * mode.sdev_rd.ln();
        let hi = mode.mean_rd.ln() + 8.0 * mode.sdev_rd.ln();
        let steps = 4000;
        let h = (hi - lo) / steps as f64;
        let integral: f64 = (0..=steps)
            .map(|k| {
                let w = if k == 0 || k == steps { 0.5 } else { 1.0 };
                w * mode.number_density(lo + k as f64 * h)
            })
            .sum::<f64>()
            * h;
        assert!((integral / mode.n_tot - 1.0).abs() < 1e-6);
    }
}
