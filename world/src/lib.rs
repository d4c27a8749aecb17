#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative occupancy state for the Grid Sandbox.
//!
//! The [`OccupancyGrid`] is a fixed-size table of free/occupied flags. Checks
//! reject any rectangle that leaves the grid, while mutations silently clip to
//! the in-bounds cells; callers validate with [`OccupancyGrid::can_place`]
//! before reserving.

use std::ops::Range;

use grid_sandbox_core::{CellCoord, CellRect, PlacementError};
use tracing::debug;

/// Default number of columns used when no configuration overrides it.
pub const DEFAULT_COLUMNS: u32 = 40;
/// Default number of rows used when no configuration overrides it.
pub const DEFAULT_ROWS: u32 = 30;
/// Largest number of cells a grid may hold.
pub const MAX_CELLS: u64 = 1 << 24;

/// Dense row-major table tracking which cells are covered by buildings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OccupancyGrid {
    columns: u32,
    rows: u32,
    cells: Vec<bool>,
}

impl OccupancyGrid {
    /// Creates a grid with every cell free.
    ///
    /// When the cell count does not fit in memory no table is allocated and
    /// every cell reads as occupied. Callers should stay within [`MAX_CELLS`].
    #[must_use]
    pub fn new(columns: u32, rows: u32) -> Self {
        let capacity_u64 = u64::from(columns) * u64::from(rows);
        let capacity = usize::try_from(capacity_u64).unwrap_or(0);
        Self {
            columns,
            rows,
            cells: vec![false; capacity],
        }
    }

    /// Number of columns contained in the grid.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows contained in the grid.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Reports whether `region` lies inside the grid and covers only free cells.
    #[must_use]
    pub fn can_place(&self, region: CellRect) -> bool {
        self.placement_error(region).is_none()
    }

    /// Preview-path twin of [`OccupancyGrid::can_place`]; always agrees with it.
    #[must_use]
    pub fn is_area_free(&self, region: CellRect) -> bool {
        self.placement_error(region).is_none()
    }

    /// Explains why `region` cannot be placed, or `None` when it can.
    ///
    /// Bounds are checked before occupancy, so a rectangle that is both
    /// partially outside the grid and overlapping reports `OutOfBounds`.
    #[must_use]
    pub fn placement_error(&self, region: CellRect) -> Option<PlacementError> {
        let origin = region.origin();
        if origin.x() < 0
            || origin.y() < 0
            || region.end_x() > i64::from(self.columns)
            || region.end_y() > i64::from(self.rows)
        {
            return Some(PlacementError::OutOfBounds);
        }

        let (columns, rows) = self.clip(region);
        for y in rows {
            for x in columns.clone() {
                if self.flat_index(x, y).map_or(true, |index| self.cells[index]) {
                    return Some(PlacementError::Occupied);
                }
            }
        }
        None
    }

    /// Marks every in-bounds cell of `region` as occupied.
    pub fn reserve(&mut self, region: CellRect) {
        debug!(?region, "reserving cells");
        self.fill(region, true);
    }

    /// Marks every in-bounds cell of `region` as free.
    pub fn release(&mut self, region: CellRect) {
        debug!(?region, "releasing cells");
        self.fill(region, false);
    }

    /// Reports whether the cell is occupied. Cells outside the grid are
    /// permanently blocked.
    #[must_use]
    pub fn is_occupied(&self, cell: CellCoord) -> bool {
        self.index(cell)
            .map_or(true, |index| self.cells.get(index).copied().unwrap_or(true))
    }

    /// Number of occupied cells.
    #[must_use]
    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|occupied| **occupied).count()
    }

    /// Frees every cell.
    pub fn clear(&mut self) {
        self.cells.fill(false);
    }

    /// Rows of occupancy flags ordered from the top row down, for display.
    pub fn rows_top_down(&self) -> impl Iterator<Item = &[bool]> + '_ {
        let width = usize::try_from(self.columns).unwrap_or(0).max(1);
        self.cells.chunks(width).rev()
    }

    fn fill(&mut self, region: CellRect, value: bool) {
        let (columns, rows) = self.clip(region);
        for y in rows {
            for x in columns.clone() {
                if let Some(index) = self.flat_index(x, y) {
                    self.cells[index] = value;
                }
            }
        }
    }

    /// Intersects `region` with the grid bounds.
    fn clip(&self, region: CellRect) -> (Range<u32>, Range<u32>) {
        let origin = region.origin();
        let columns = clamp_axis(i64::from(origin.x()), region.end_x(), self.columns);
        let rows = clamp_axis(i64::from(origin.y()), region.end_y(), self.rows);
        (columns, rows)
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        let x = u32::try_from(cell.x()).ok()?;
        let y = u32::try_from(cell.y()).ok()?;
        if x < self.columns && y < self.rows {
            self.flat_index(x, y)
        } else {
            None
        }
    }

    /// Position of `(x, y)` in `cells`, or `None` when the table could not be
    /// allocated for the requested dimensions.
    fn flat_index(&self, x: u32, y: u32) -> Option<usize> {
        let columns = usize::try_from(self.columns).ok()?;
        let index = usize::try_from(y)
            .ok()?
            .checked_mul(columns)?
            .checked_add(usize::try_from(x).ok()?)?;
        (index < self.cells.len()).then_some(index)
    }
}

impl Default for OccupancyGrid {
    fn default() -> Self {
        Self::new(DEFAULT_COLUMNS, DEFAULT_ROWS)
    }
}

fn clamp_axis(start: i64, end: i64, limit: u32) -> Range<u32> {
    let limit = i64::from(limit);
    let start = start.clamp(0, limit);
    let end = end.clamp(start, limit);
    // Both bounds lie in 0..=limit, which fits in u32.
    (start as u32)..(end as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use grid_sandbox_core::CellRectSize;

    fn rect(x: i32, y: i32, width: u32, height: u32) -> CellRect {
        CellRect::from_origin_and_size(CellCoord::new(x, y), CellRectSize::new(width, height))
    }

    fn snapshot(grid: &OccupancyGrid) -> Vec<bool> {
        grid.cells.clone()
    }

    #[test]
    fn new_grid_is_entirely_free() {
        let grid = OccupancyGrid::new(4, 3);
        assert_eq!(grid.occupied_count(), 0);
        assert!(grid.can_place(rect(0, 0, 4, 3)));
    }

    #[test]
    fn default_grid_matches_standard_dimensions() {
        let grid = OccupancyGrid::default();
        assert_eq!((grid.columns(), grid.rows()), (40, 30));
    }

    #[test]
    fn boundary_placement_at_right_edge() {
        let grid = OccupancyGrid::new(40, 30);
        assert!(grid.can_place(rect(38, 0, 2, 2)));
        assert!(!grid.can_place(rect(39, 0, 2, 2)));
        assert_eq!(
            grid.placement_error(rect(39, 0, 2, 2)),
            Some(PlacementError::OutOfBounds)
        );
    }

    #[test]
    fn negative_origin_is_out_of_bounds() {
        let grid = OccupancyGrid::new(10, 10);
        assert!(!grid.can_place(rect(-1, 0, 2, 2)));
        assert!(!grid.can_place(rect(0, -1, 2, 2)));
    }

    #[test]
    fn overlap_is_rejected_after_reserve() {
        let mut grid = OccupancyGrid::new(40, 30);
        grid.reserve(rect(5, 5, 2, 2));
        assert_eq!(
            grid.placement_error(rect(4, 4, 3, 3)),
            Some(PlacementError::Occupied)
        );
        assert!(grid.can_place(rect(7, 5, 2, 2)));
    }

    #[test]
    fn reserve_clips_to_grid() {
        let mut grid = OccupancyGrid::new(4, 4);
        grid.reserve(rect(-2, 2, 4, 5));
        assert_eq!(grid.occupied_count(), 4);
        assert!(grid.is_occupied(CellCoord::new(0, 2)));
        assert!(grid.is_occupied(CellCoord::new(1, 3)));
        assert!(!grid.is_occupied(CellCoord::new(2, 2)));
    }

    #[test]
    fn reserve_fully_outside_grid_is_ignored() {
        let mut grid = OccupancyGrid::new(4, 4);
        grid.reserve(rect(10, 10, 3, 3));
        grid.reserve(rect(i32::MIN, i32::MIN, u32::MAX, 1));
        assert_eq!(grid.occupied_count(), 0);
    }

    #[test]
    fn release_and_reserve_are_idempotent() {
        let mut grid = OccupancyGrid::new(8, 8);
        grid.release(rect(1, 1, 2, 2));
        assert_eq!(grid.occupied_count(), 0);

        grid.reserve(rect(1, 1, 2, 2));
        let once = snapshot(&grid);
        grid.reserve(rect(1, 1, 2, 2));
        assert_eq!(snapshot(&grid), once);

        grid.release(rect(1, 1, 2, 2));
        let freed = snapshot(&grid);
        grid.release(rect(1, 1, 2, 2));
        assert_eq!(snapshot(&grid), freed);
        assert_eq!(grid.occupied_count(), 0);
    }

    #[test]
    fn out_of_bounds_cells_are_occupied() {
        let grid = OccupancyGrid::new(3, 3);
        assert!(grid.is_occupied(CellCoord::new(-1, 0)));
        assert!(grid.is_occupied(CellCoord::new(3, 0)));
        assert!(grid.is_occupied(CellCoord::new(0, 3)));
        assert!(!grid.is_occupied(CellCoord::new(2, 2)));
    }

    #[test]
    fn preview_and_commit_checks_agree() {
        let mut grid = OccupancyGrid::new(6, 5);
        grid.reserve(rect(2, 1, 2, 2));
        for x in -2..8 {
            for y in -2..7 {
                for width in 0..4 {
                    for height in 0..4 {
                        let region = rect(x, y, width, height);
                        assert_eq!(grid.can_place(region), grid.is_area_free(region));
                    }
                }
            }
        }
    }

    #[test]
    fn unallocated_table_blocks_instead_of_panicking() {
        let mut grid = OccupancyGrid {
            columns: 4,
            rows: 4,
            cells: Vec::new(),
        };
        grid.reserve(rect(0, 0, 2, 2));
        grid.release(rect(0, 0, 4, 4));

        assert!(!grid.can_place(rect(1, 1, 1, 1)));
        assert!(grid.is_occupied(CellCoord::new(1, 1)));
        assert_eq!(grid.occupied_count(), 0);
    }

    #[test]
    fn rows_top_down_starts_with_highest_row() {
        let mut grid = OccupancyGrid::new(3, 2);
        grid.reserve(rect(0, 1, 1, 1));
        let rows: Vec<Vec<bool>> = grid.rows_top_down().map(<[bool]>::to_vec).collect();
        assert_eq!(rows, vec![vec![true, false, false], vec![false, false, false]]);
    }
}
