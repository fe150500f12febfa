//! Droplet-to-grid diagnostics via segmented reduction over the sorted index.
//!
//! Scatter: per-droplet values -> per-cell sums -> dense output grids.
//! Cells with no droplets are zero.

use crate::backend::Backend;
use crate::droplets::DropletPopulation;
use crate::grid::GridGeometry;
use crate::sort::SpatialIndex;

/// Output fields exposed to the Eulerian side.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DiagnosticField {
    SdConc,
    NTot,
    NCcn,
}

impl DiagnosticField {
    pub const ALL: [DiagnosticField; 3] = [Self::SdConc, Self::NTot, Self::NCcn];

    pub fn name(&self) -> &'static str {
        match self {
            Self::SdConc => "sd_conc",
            Self::NTot => "n_tot",
            Self::NCcn => "n_ccn",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::SdConc => "super-droplet concentration",
            Self::NTot => "total droplet concentration",
            Self::NCcn => "concentration of droplets above the CCN radius",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            Self::SdConc => "1",
            Self::NTot | Self::NCcn => "m^-3",
        }
    }
}

/// Dense per-cell output grids, raveled `i + j * nx`.
#[derive(Clone, Debug, PartialEq)]
pub struct DiagnosticFields {
    /// Super-droplets per cell
    pub sd_conc: Vec<f64>,
    /// Real droplets per unit volume (m⁻³)
    pub n_tot: Vec<f64>,
    /// Real droplets above the CCN radius per unit volume (m⁻³)
    pub n_ccn: Vec<f64>,
}

impl DiagnosticFields {
    pub fn new(grid: &GridGeometry) -> Self {
        let n = grid.cell_count();
        Self {
            sd_conc: vec![0.0; n],
            n_tot: vec![0.0; n],
            n_ccn: vec![0.0; n],
        }
    }

    pub fn get(&self, field: DiagnosticField) -> &[f64] {
        match field {
            DiagnosticField::SdConc => &self.sd_conc,
            DiagnosticField::NTot => &self.n_tot,
            DiagnosticField::NCcn => &self.n_ccn,
        }
    }
}

/// Segmented reduce-by-key with staging buffers sized once for the grid.
#[derive(Clone, Debug)]
pub struct DiagnosticsReducer {
    /// Per-segment sums; only the first `segments.len()` entries are live
    sums: Vec<f64>,
    cell_volume: f64,
}

impl DiagnosticsReducer {
    pub fn new(grid: &GridGeometry) -> Self {
        Self {
            sums: vec![0.0; grid.cell_count()],
            cell_volume: grid.cell_volume(),
        }
    }

    /// Sum `value(droplet)` over every occupied cell.
    pub fn reduce_by_key<F>(&mut self, index: &SpatialIndex, backend: Backend, value: F) -> &[f64]
    where
        F: Fn(usize) -> f64 + Sync + Send,
    {
        let segments = &index.segments;
        let ids = &index.sorted_droplet_id;
        backend.reduce_segments(&segments.starts, segments.total_len(), &mut self.sums, |k| {
            value(ids[k])
        });
        &self.sums[..segments.len()]
    }

    /// Zero `out`, then write `scale * sum` into every occupied cell.
    pub fn scatter(&self, index: &SpatialIndex, out: &mut [f64], scale: f64) {
        out.fill(0.0);
        for (s, &cell) in index.segments.keys.iter().enumerate() {
            out[cell] = self.sums[s] * scale;
        }
    }

    /// Refresh all three output grids. `ccn_xi_threshold` is the CCN radius
    /// already mapped into growth-variable space.
    pub fn diagnose(
        &mut self,
        droplets: &DropletPopulation,
        index: &SpatialIndex,
        ccn_xi_threshold: f64,
        backend: Backend,
        out: &mut DiagnosticFields,
    ) {
        let inv_volume = 1.0 / self.cell_volume;
        let (n, xi) = (&droplets.n, &droplets.xi);

        self.reduce_by_key(index, backend, |_| 1.0);
        self.scatter(index, &mut out.sd_conc, 1.0);

        self.reduce_by_key(index, backend, |d| n[d]);
        self.scatter(index, &mut out.n_tot, inv_volume);

        self.reduce_by_key(index, backend, |d| if xi[d] > ccn_xi_threshold { n[d] } else { 0.0 });
        self.scatter(index, &mut out.n_ccn, inv_volume);
    }
}
