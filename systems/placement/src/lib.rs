#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Placement session: pick a building type, preview it over the grid, then
//! commit it to a free spot or cancel.
//!
//! The session only mutates the occupancy grid and the registry on a
//! successful [`PlacementSession::commit`]; previews and cancellations touch
//! nothing but the scene.

use grid_sandbox_core::{
    BuildingRecord, BuildingType, CellCoord, GridGeometry, InstanceId, PlacementError, Scene, Tint,
    VisualHandle,
};
use grid_sandbox_registry::{BuildingRegistry, PersistenceError};
use grid_sandbox_world::OccupancyGrid;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Observable state of a [`PlacementSession`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PlacementState {
    /// No building is being placed.
    Idle,
    /// A building type was picked and its preview follows the cursor.
    Previewing,
}

/// Reasons a commit did not complete normally.
#[derive(Debug, Error)]
pub enum CommitError {
    /// Commit was requested while no preview was active.
    #[error("no building is being previewed")]
    NotPreviewing,
    /// The footprint does not fit at the requested cell; the preview stays active.
    #[error("cannot place building at {cell}: {reason}")]
    Rejected {
        /// Cell the commit targeted.
        cell: CellCoord,
        /// Why the grid refused the footprint.
        reason: PlacementError,
    },
    /// The building was placed but the registry could not persist it.
    #[error("building {} was placed but could not be saved", .record.instance_id())]
    Persistence {
        /// Record that was placed and kept in memory.
        record: BuildingRecord,
        /// Underlying storage failure.
        #[source]
        source: PersistenceError,
    },
}

#[derive(Debug)]
struct Preview {
    building: BuildingType,
    visual: VisualHandle,
    cell: CellCoord,
}

/// Short-lived state machine coordinating a single building placement.
#[derive(Debug, Default)]
pub struct PlacementSession {
    preview: Option<Preview>,
}

impl PlacementSession {
    /// Creates an idle session.
    #[must_use]
    pub const fn new() -> Self {
        Self { preview: None }
    }

    /// Current state of the session.
    #[must_use]
    pub const fn state(&self) -> PlacementState {
        if self.preview.is_some() {
            PlacementState::Previewing
        } else {
            PlacementState::Idle
        }
    }

    /// Building type being previewed, if any.
    #[must_use]
    pub fn building(&self) -> Option<&BuildingType> {
        self.preview.as_ref().map(|preview| &preview.building)
    }

    /// Visual handle of the active preview, if any.
    #[must_use]
    pub fn preview_visual(&self) -> Option<VisualHandle> {
        self.preview.as_ref().map(|preview| preview.visual)
    }

    /// Starts previewing `building`, replacing any preview already shown.
    pub fn start(
        &mut self,
        building: BuildingType,
        geometry: &impl GridGeometry,
        scene: &mut impl Scene,
    ) {
        if let Some(previous) = self.preview.take() {
            scene.destroy_visual(previous.visual);
        }

        let cell = CellCoord::new(0, 0);
        let visual = scene.spawn_visual(building.visual_asset(), geometry.cell_to_world(cell));
        scene.recolor_visual(visual, Tint::Valid);
        debug!(kind = %building.id(), "placement preview started");
        self.preview = Some(Preview {
            building,
            visual,
            cell,
        });
    }

    /// Moves the preview to `cell` and tints it by whether the footprint fits.
    ///
    /// Returns the placeability of the footprint, or `None` while idle.
    pub fn update_cursor(
        &mut self,
        cell: CellCoord,
        grid: &OccupancyGrid,
        geometry: &impl GridGeometry,
        scene: &mut impl Scene,
    ) -> Option<bool> {
        let preview = self.preview.as_mut()?;

        if preview.cell != cell {
            scene.destroy_visual(preview.visual);
            preview.visual =
                scene.spawn_visual(preview.building.visual_asset(), geometry.cell_to_world(cell));
            preview.cell = cell;
        }

        let placeable = grid.is_area_free(preview.building.region_at(cell));
        scene.recolor_visual(preview.visual, Tint::for_placeable(placeable));
        Some(placeable)
    }

    /// Places the previewed building with its bottom-left corner at `cell`.
    ///
    /// On rejection the session keeps previewing so another cell can be tried.
    /// On success the grid is reserved, a record is added to the registry, the
    /// preview is replaced by the final visual and the session returns to idle.
    pub fn commit(
        &mut self,
        cell: CellCoord,
        grid: &mut OccupancyGrid,
        registry: &mut BuildingRegistry,
        geometry: &impl GridGeometry,
        scene: &mut impl Scene,
    ) -> Result<BuildingRecord, CommitError> {
        let Some(preview) = self.preview.as_ref() else {
            return Err(CommitError::NotPreviewing);
        };

        let region = preview.building.region_at(cell);
        if let Some(reason) = grid.placement_error(region) {
            warn!(kind = %preview.building.id(), %cell, %reason, "placement rejected");
            return Err(CommitError::Rejected { cell, reason });
        }

        let Some(preview) = self.preview.take() else {
            return Err(CommitError::NotPreviewing);
        };
        let building = preview.building;

        grid.reserve(region);
        let instance_id = InstanceId::generate(building.id());
        let record = BuildingRecord::new(instance_id.clone(), building.id().clone(), region);
        let persisted = registry.add(record.clone());

        scene.destroy_visual(preview.visual);
        let visual = scene.spawn_visual(building.visual_asset(), geometry.cell_to_world(cell));
        let _ = registry.attach_visual(&instance_id, visual);
        info!(instance = %instance_id, %cell, "building placed");

        match persisted {
            Ok(()) => Ok(record),
            Err(source) => Err(CommitError::Persistence { record, source }),
        }
    }

    /// Abandons the preview without touching the grid or registry.
    ///
    /// Returns `false` when there was nothing to cancel.
    pub fn cancel(&mut self, scene: &mut impl Scene) -> bool {
        match self.preview.take() {
            Some(preview) => {
                scene.destroy_visual(preview.visual);
                debug!(kind = %preview.building.id(), "placement cancelled");
                true
            }
            None => false,
        }
    }
}
