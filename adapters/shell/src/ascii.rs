use std::fmt::Write;

use grid_sandbox_core::CellCoord;
use grid_sandbox_registry::BuildingRegistry;
use grid_sandbox_world::OccupancyGrid;

const FREE: char = '.';
const UNOWNED: char = '#';

/// Draws the grid top row first, one character per cell.
///
/// Free cells print as `.`, cells covered by a registered building print the
/// first letter of its type, and occupied cells no record explains print as
/// `#`. Each row is prefixed with its `y` coordinate.
#[must_use]
pub fn render_grid(grid: &OccupancyGrid, registry: &BuildingRegistry) -> String {
    let label_width = grid.rows().saturating_sub(1).to_string().len();
    let mut output = String::new();

    let rows = (0..grid.rows()).rev();
    for (row, y) in grid.rows_top_down().zip(rows) {
        let y = i32::try_from(y).unwrap_or(i32::MAX);
        let _ = write!(output, "{y:>label_width$} ");
        for (x, occupied) in (0_i32..).zip(row.iter().copied()) {
            output.push(cell_glyph(occupied, CellCoord::new(x, y), registry));
        }
        output.push('\n');
    }
    output
}

fn cell_glyph(occupied: bool, cell: CellCoord, registry: &BuildingRegistry) -> char {
    if !occupied {
        return FREE;
    }
    registry
        .find_at(cell)
        .and_then(|placed| placed.record().type_id().as_str().chars().next())
        .unwrap_or(UNOWNED)
}
