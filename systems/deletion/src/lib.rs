#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deletion session: while active, clicking a cell removes the building that
//! covers it from the grid, the scene and the registry.

use grid_sandbox_core::{BuildingRecord, CellCoord, CellRect, Scene};
use grid_sandbox_registry::{BuildingRegistry, PersistenceError};
use grid_sandbox_world::OccupancyGrid;
use thiserror::Error;
use tracing::{debug, info};

/// Informational result of a deletion attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeletionOutcome {
    /// The building covering the cell was removed.
    Deleted(BuildingRecord),
    /// No building covers the cell.
    NothingToDelete,
}

/// Reasons a deletion attempt did not complete normally.
#[derive(Debug, Error)]
pub enum DeletionError {
    /// Deletion was requested while the session was inactive.
    #[error("deletion mode is not active")]
    Inactive,
    /// The building was removed but the registry could not persist the change.
    #[error("building {} was removed but the change could not be saved", .record.instance_id())]
    Persistence {
        /// Record that was removed from memory.
        record: BuildingRecord,
        /// Underlying storage failure.
        #[source]
        source: PersistenceError,
    },
}

/// Mode flag plus the delete-at-cell operation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DeletionSession {
    active: bool,
}

impl DeletionSession {
    /// Creates an inactive session.
    #[must_use]
    pub const fn new() -> Self {
        Self { active: false }
    }

    /// Whether deletion mode is on.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Turns deletion mode on and shows its overlay.
    pub fn activate(&mut self, scene: &mut impl Scene) {
        self.active = true;
        scene.set_deletion_overlay(true);
        debug!("deletion mode on");
    }

    /// Turns deletion mode off and hides its overlay.
    pub fn deactivate(&mut self, scene: &mut impl Scene) {
        self.active = false;
        scene.set_deletion_overlay(false);
        debug!("deletion mode off");
    }

    /// Removes the building covering `cell`, if any. The session stays active.
    pub fn try_delete_at(
        &mut self,
        cell: CellCoord,
        grid: &mut OccupancyGrid,
        registry: &mut BuildingRegistry,
        scene: &mut impl Scene,
    ) -> Result<DeletionOutcome, DeletionError> {
        if !self.active {
            return Err(DeletionError::Inactive);
        }

        let Some(found) = registry.find_at(cell) else {
            info!(%cell, "no building in this cell");
            return Ok(DeletionOutcome::NothingToDelete);
        };
        let record = found.record().clone();
        let visual = found.visual();

        grid.release(record.region());
        if let Some(visual) = visual {
            scene.destroy_visual(visual);
        }

        let removed = registry.remove_by_instance_id(record.instance_id());
        reserve_overlapping_survivors(record.region(), grid, registry);

        match removed {
            Ok(_) => {
                info!(instance = %record.instance_id(), %cell, "building deleted");
                Ok(DeletionOutcome::Deleted(record))
            }
            Err(source) => Err(DeletionError::Persistence { record, source }),
        }
    }
}

/// Re-reserves rendered buildings that share cells with a released region.
///
/// Records skipped on restore never reserved their cells, so another building
/// may sit on top of them; freeing such a record must not free its neighbour.
fn reserve_overlapping_survivors(
    released: CellRect,
    grid: &mut OccupancyGrid,
    registry: &BuildingRegistry,
) {
    for survivor in registry
        .entries()
        .filter(|entry| entry.visual().is_some())
        .filter(|entry| entry.record().region().overlaps(&released))
    {
        debug!(instance = %survivor.record().instance_id(), "re-reserving overlapped building");
        grid.reserve(survivor.record().region());
    }
}
