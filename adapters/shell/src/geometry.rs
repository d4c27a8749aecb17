use glam::Vec3;
use grid_sandbox_core::{CellCoord, GridGeometry};

/// Square cells laid out on the XY plane starting at `origin`.
///
/// Cells map to their centre, so converting a cell to world space and back
/// yields the same cell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UniformGridGeometry {
    origin: Vec3,
    cell_size: f32,
}

impl UniformGridGeometry {
    /// Creates a geometry whose cell (0, 0) has its lower-left corner at
    /// `origin`.
    #[must_use]
    pub const fn new(origin: Vec3, cell_size: f32) -> Self {
        Self { origin, cell_size }
    }

    /// Edge length of a cell in world units.
    #[must_use]
    pub const fn cell_size(&self) -> f32 {
        self.cell_size
    }
}

impl Default for UniformGridGeometry {
    fn default() -> Self {
        Self::new(Vec3::ZERO, 1.0)
    }
}

impl GridGeometry for UniformGridGeometry {
    fn cell_to_world(&self, cell: CellCoord) -> Vec3 {
        let half = self.cell_size * 0.5;
        self.origin
            + Vec3::new(
                cell.x() as f32 * self.cell_size + half,
                cell.y() as f32 * self.cell_size + half,
                0.0,
            )
    }

    fn world_to_cell(&self, position: Vec3) -> CellCoord {
        let local = (position - self.origin) / self.cell_size;
        CellCoord::new(local.x.floor() as i32, local.y.floor() as i32)
    }
}
