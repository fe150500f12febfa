//! Spatial index: which cell owns each droplet, and droplets grouped by cell.
//!
//! Rebuilt from scratch every step. The sort is stable, so droplets sharing a
//! cell stay in ascending id order and every downstream reduction is
//! reproducible on both backends.

use glam::DVec2;

use crate::backend::Backend;
use crate::droplets::DropletPopulation;
use crate::error::{SdmError, SdmResult};
use crate::grid::GridGeometry;

/// Distinct cell keys present in the sorted stream with their start offsets.
#[derive(Clone, Debug, Default)]
pub struct CellSegments {
    /// Distinct cell ids, ascending
    pub keys: Vec<usize>,
    /// Offset of the first droplet of each key in the sorted order
    pub starts: Vec<usize>,
    total: usize,
}

impl CellSegments {
    /// Number of occupied cells.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Droplet count of segment `s`.
    pub fn count(&self, s: usize) -> usize {
        let end = self.starts.get(s + 1).copied().unwrap_or(self.total);
        end - self.starts[s]
    }

    /// Length of the underlying sorted stream.
    pub fn total_len(&self) -> usize {
        self.total
    }

    fn rebuild(&mut self, sorted_keys: &[usize]) {
        self.keys.clear();
        self.starts.clear();
        self.total = sorted_keys.len();
        for (k, &key) in sorted_keys.iter().enumerate() {
            if self.keys.last() != Some(&key) {
                self.keys.push(key);
                self.starts.push(k);
            }
        }
    }
}

/// Droplet ids sorted by owning cell.
#[derive(Clone, Debug, Default)]
pub struct SpatialIndex {
    /// Cell id of the k-th droplet in sorted order (non-decreasing)
    pub sorted_cell_id: Vec<usize>,
    /// Permutation of droplet ids
    pub sorted_droplet_id: Vec<usize>,
    pub segments: CellSegments,
}

impl SpatialIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recompute `cell_id` for every droplet and rebuild the sorted index.
    pub fn rebuild(&mut self, droplets: &mut DropletPopulation, grid: &GridGeometry, backend: Backend) {
        let n = droplets.len();
        assign_cells(droplets, grid, backend);

        self.sorted_droplet_id.resize(n, 0);
        backend.fill_indexed(&mut self.sorted_droplet_id, |k| k);
        backend.sort_ids_by_key(&mut self.sorted_droplet_id, &droplets.cell_id);

        self.sorted_cell_id.resize(n, 0);
        let (ids, cell_id) = (&self.sorted_droplet_id, &droplets.cell_id);
        backend.fill_indexed(&mut self.sorted_cell_id, |k| cell_id[ids[k]]);

        self.segments.rebuild(&self.sorted_cell_id);
    }

    pub fn len(&self) -> usize {
        self.sorted_droplet_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sorted_droplet_id.is_empty()
    }
}

/// `cell_id[i] = wrap(floor(x/dx)) + wrap(floor(y/dy)) * nx`.
pub fn assign_cells(droplets: &mut DropletPopulation, grid: &GridGeometry, backend: Backend) {
    let n = droplets.len();
    let (xy, cell_id) = (&droplets.xy, &mut droplets.cell_id);
    backend.fill_indexed(cell_id, |k| {
        let (i, j) = grid.wrapped_cell(DVec2::new(xy[k], xy[n + k]));
        grid.cell_index(i, j)
    });
}

/// Fail on the first droplet outside `[0, Lx) x [0, Ly)`.
pub fn check_in_domain(droplets: &DropletPopulation, grid: &GridGeometry, backend: Backend) -> SdmResult<()> {
    let extent = grid.extent();
    let (x, y) = (droplets.x(), droplets.y());
    let inside = |k: usize| (0.0..extent.x).contains(&x[k]) && (0.0..extent.y).contains(&y[k]);

    match backend.find_first_violation(droplets.len(), inside) {
        Some(droplet) => Err(SdmError::OutOfDomain {
            droplet,
            x: x[droplet],
            y: y[droplet],
        }),
        None => Ok(()),
    }
}
