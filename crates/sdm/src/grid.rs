//! 2D staggered grid geometry shared with the Eulerian solver.
//!
//! Scalars live at cell centres, Courant numbers on cell faces:
//! - Cx (X-component) on left faces at x = i * dx, size (nx+1) * ny
//! - Cy (Y-component) on bottom faces at y = j * dy, size nx * (ny+1)
//!
//! All arrays are raveled with the X index fastest.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::error::{SdmError, SdmResult};

/// Grid geometry, fixed for the run.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridGeometry {
    /// Number of cells in X direction
    pub nx: usize,
    /// Number of cells in Y (vertical) direction
    pub ny: usize,
    /// Number of cells in Z direction; the droplet core handles slabs only
    #[serde(default = "default_nz")]
    pub nz: usize,
    /// Cell width in X (m)
    pub dx: f64,
    /// Cell height in Y (m)
    pub dy: f64,
    /// Slab thickness in Z (m)
    #[serde(default = "default_dz")]
    pub dz: f64,
}

fn default_nz() -> usize {
    1
}

fn default_dz() -> f64 {
    1.0
}

impl GridGeometry {
    /// Create a 2D slab geometry with unit depth.
    pub fn new(nx: usize, ny: usize, dx: f64, dy: f64) -> Self {
        Self {
            nx,
            ny,
            nz: 1,
            dx,
            dy,
            dz: 1.0,
        }
    }

    /// Check the geometry describes a usable 2D slab.
    pub fn validate(&self) -> SdmResult<()> {
        if self.nx == 0 || self.ny == 0 {
            return Err(SdmError::Dimensionality(format!(
                "grid must have at least one cell per direction, got {}x{}",
                self.nx, self.ny
            )));
        }
        if self.nz != 1 {
            return Err(SdmError::Dimensionality(format!(
                "droplet coupling supports 2D slabs only, got nz = {}",
                self.nz
            )));
        }
        for (name, value) in [("dx", self.dx), ("dy", self.dy), ("dz", self.dz)] {
            if !(value.is_finite() && value > 0.0) {
                return Err(SdmError::InvalidConfig(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }
        Ok(())
    }

    /// Number of cell centres.
    #[inline]
    pub fn cell_count(&self) -> usize {
        self.nx * self.ny
    }

    /// Number of X faces (Cx / vx).
    #[inline]
    pub fn x_face_count(&self) -> usize {
        (self.nx + 1) * self.ny
    }

    /// Number of Y faces (Cy / vy).
    #[inline]
    pub fn y_face_count(&self) -> usize {
        self.nx * (self.ny + 1)
    }

    /// Cell size as a vector.
    pub fn cell_size(&self) -> DVec2 {
        DVec2::new(self.dx, self.dy)
    }

    /// Domain extent (Lx, Ly).
    pub fn extent(&self) -> DVec2 {
        DVec2::new(self.nx as f64 * self.dx, self.ny as f64 * self.dy)
    }

    /// Cell volume dx * dy * dz (m³).
    pub fn cell_volume(&self) -> f64 {
        self.dx * self.dy * self.dz
    }

    /// Cell centre index.
    #[inline]
    pub fn cell_index(&self, i: usize, j: usize) -> usize {
        i + j * self.nx
    }

    /// Inverse of `cell_index`.
    #[inline]
    pub fn cell_coords(&self, idx: usize) -> (usize, usize) {
        (idx % self.nx, idx / self.nx)
    }

    /// X-face index (face i is the left face of cell i).
    #[inline]
    pub fn x_face_index(&self, i: usize, j: usize) -> usize {
        i + j * (self.nx + 1)
    }

    /// Y-face index (face j is the bottom face of cell j).
    #[inline]
    pub fn y_face_index(&self, i: usize, j: usize) -> usize {
        i + j * self.nx
    }

    /// Cell containing `pos`, wrapped periodically into the grid.
    #[inline]
    pub fn wrapped_cell(&self, pos: DVec2) -> (usize, usize) {
        let i = (pos.x / self.dx).floor() as i64;
        let j = (pos.y / self.dy).floor() as i64;
        (
            i.rem_euclid(self.nx as i64) as usize,
            j.rem_euclid(self.ny as i64) as usize,
        )
    }
}

/// Periodic wrap of a coordinate into `[0, extent)`.
///
/// `rem_euclid` can round up to exactly `extent` for tiny negative inputs;
/// that case maps to 0 so the result is always a valid cell coordinate.
#[inline]
pub fn wrap_periodic(a: f64, extent: f64) -> f64 {
    let w = a.rem_euclid(extent);
    if w >= extent {
        0.0
    } else {
        w
    }
}

/// Read-only snapshot of the Eulerian fields handed in each step.
#[derive(Clone, Copy, Debug)]
pub struct EulerianFields<'a> {
    /// Dry air density (kg/m³), cell centred
    pub rhod: &'a [f64],
    /// Density times potential temperature (kg K/m³), cell centred
    pub rhod_th: &'a [f64],
    /// Density times vapour mixing ratio (kg/m³), cell centred
    pub rhod_rv: &'a [f64],
    /// Courant number on X faces
    pub courant_x: &'a [f64],
    /// Courant number on Y faces
    pub courant_y: &'a [f64],
}

impl EulerianFields<'_> {
    /// Check every field has the size the grid requires.
    pub fn validate(&self, grid: &GridGeometry) -> SdmResult<()> {
        let n = grid.cell_count();
        check_len("rhod", self.rhod, n)?;
        check_len("rhod_th", self.rhod_th, n)?;
        check_len("rhod_rv", self.rhod_rv, n)?;
        check_len("courant_x", self.courant_x, grid.x_face_count())?;
        check_len("courant_y", self.courant_y, grid.y_face_count())?;
        Ok(())
    }
}

fn check_len(name: &'static str, field: &[f64], expected: usize) -> SdmResult<()> {
    if field.len() != expected {
        return Err(SdmError::FieldShape {
            name,
            expected,
            actual: field.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_face_counts() {
        let grid = GridGeometry::new(4, 3, 1.0, 2.0);
        assert_eq!(grid.cell_count(), 12);
        assert_eq!(grid.x_face_count(), 15);
        assert_eq!(grid.y_face_count(), 16);
        assert_eq!(grid.extent(), DVec2::new(4.0, 6.0));
    }

    #[test]
    fn test_cell_index_roundtrip() {
        let grid = GridGeometry::new(5, 7, 1.0, 1.0);
        for j in 0..7 {
            for i in 0..5 {
                assert_eq!(grid.cell_coords(grid.cell_index(i, j)), (i, j));
            }
        }
    }

    #[test]
    fn test_wrapped_cell_at_boundaries() {
        let grid = GridGeometry::new(4, 4, 0.5, 0.5);
        // Exactly on the far boundary wraps to the first cell
        assert_eq!(grid.wrapped_cell(DVec2::new(2.0, 2.0)), (0, 0));
        // Slightly below zero wraps to the last cell
        assert_eq!(grid.wrapped_cell(DVec2::new(-0.1, 1.2)), (3, 2));
    }

    #[test]
    fn test_wrap_periodic_tiny_negative() {
        let w = wrap_periodic(-1e-20, 1.0);
        assert!((0.0..1.0).contains(&w), "got {}", w);
    }

    #[test]
    fn test_validate_rejects_3d() {
        let mut grid = GridGeometry::new(4, 4, 1.0, 1.0);
        grid.nz = 2;
        assert!(matches!(grid.validate(), Err(SdmError::Dimensionality(_))));
    }

    #[test]
    fn test_field_shape_mismatch() {
        let grid = GridGeometry::new(2, 2, 1.0, 1.0);
        let cells = vec![1.0; 4];
        let cx = vec![0.0; 6];
        let cy_short = vec![0.0; 5];
        let fields = EulerianFields {
            rhod: &cells,
            rhod_th: &cells,
            rhod_rv: &cells,
            courant_x: &cx,
            courant_y: &cy_short,
        };
        match fields.validate(&grid) {
            Err(SdmError::FieldShape { name, expected, actual }) => {
                assert_eq!(name, "courant_y");
                assert_eq!(expected, 6);
                assert_eq!(actual, 5);
            }
            other => panic!("expected shape error, got {:?}", other),
        }
    }
}
