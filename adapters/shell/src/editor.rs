use glam::Vec3;
use grid_sandbox_core::{
    BuildingCatalog, BuildingRecord, BuildingType, BuildingTypeId, CellCoord, GridGeometry, Scene,
    StaticCatalog,
};
use grid_sandbox_registry::{BuildingRegistry, LoadReport, PersistenceError, RestoreReport};
use grid_sandbox_system_deletion::{DeletionError, DeletionOutcome, DeletionSession};
use grid_sandbox_system_placement::{CommitError, PlacementSession, PlacementState};
use grid_sandbox_world::OccupancyGrid;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Interaction mode of the editor. Placing and deleting never overlap.
#[derive(Debug, Default)]
pub enum EditorMode {
    /// Clicks do nothing.
    #[default]
    Idle,
    /// A building preview follows the pointer.
    Placing(PlacementSession),
    /// Clicks remove buildings.
    Deleting(DeletionSession),
}

impl EditorMode {
    /// Whether neither placement nor deletion is in progress.
    #[must_use]
    pub const fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Whether a building is being placed.
    #[must_use]
    pub const fn is_placing(&self) -> bool {
        matches!(self, Self::Placing(_))
    }

    /// Whether deletion mode is on.
    #[must_use]
    pub const fn is_deleting(&self) -> bool {
        matches!(self, Self::Deleting(_))
    }
}

/// Failures surfaced by [`Editor`] callbacks.
#[derive(Debug, Error)]
pub enum EditorError {
    /// The selection index does not name a catalog entry.
    #[error("no building at selection index {0}")]
    UnknownSelection(usize),
    /// The identifier does not name a catalog entry.
    #[error("unknown building type `{0}`")]
    UnknownBuildingType(BuildingTypeId),
    /// Placement was refused or could not be saved.
    #[error(transparent)]
    Commit(#[from] CommitError),
    /// Deletion could not complete.
    #[error(transparent)]
    Deletion(#[from] DeletionError),
    /// Loading the save document failed.
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

/// What a primary click did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClickOutcome {
    /// A building was placed.
    Placed(BuildingRecord),
    /// A building was removed.
    Deleted(BuildingRecord),
    /// Deletion mode was on but the cell was empty.
    NothingToDelete,
    /// The editor was idle.
    Ignored,
}

/// Result of [`Editor::load_buildings`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReloadReport {
    /// What the registry read from storage.
    pub load: LoadReport,
    /// What was put back on the grid and in the scene.
    pub restore: RestoreReport,
}

/// Owns the grid, registry and collaborators and routes UI callbacks to the
/// active session.
#[derive(Debug)]
pub struct Editor<G, S> {
    grid: OccupancyGrid,
    registry: BuildingRegistry,
    catalog: StaticCatalog,
    geometry: G,
    scene: S,
    mode: EditorMode,
    panel_open: bool,
}

impl<G: GridGeometry, S: Scene> Editor<G, S> {
    /// Creates an idle editor over the provided state and collaborators.
    #[must_use]
    pub fn new(
        grid: OccupancyGrid,
        registry: BuildingRegistry,
        catalog: StaticCatalog,
        geometry: G,
        scene: S,
    ) -> Self {
        Self {
            grid,
            registry,
            catalog,
            geometry,
            scene,
            mode: EditorMode::Idle,
            panel_open: false,
        }
    }

    /// Occupancy of the grid.
    #[must_use]
    pub fn grid(&self) -> &OccupancyGrid {
        &self.grid
    }

    /// Placed buildings.
    #[must_use]
    pub fn registry(&self) -> &BuildingRegistry {
        &self.registry
    }

    /// Building types offered by the panel.
    #[must_use]
    pub fn catalog(&self) -> &StaticCatalog {
        &self.catalog
    }

    /// Cell/world conversion in use.
    #[must_use]
    pub fn geometry(&self) -> &G {
        &self.geometry
    }

    /// Host scene.
    #[must_use]
    pub fn scene(&self) -> &S {
        &self.scene
    }

    /// Current interaction mode.
    #[must_use]
    pub fn mode(&self) -> &EditorMode {
        &self.mode
    }

    /// Whether the building selection panel is shown.
    #[must_use]
    pub const fn is_panel_open(&self) -> bool {
        self.panel_open
    }

    /// Shows or hides the building panel. Opening it leaves deletion mode.
    ///
    /// Returns whether the panel is now open.
    pub fn toggle_building_panel(&mut self) -> bool {
        self.panel_open = !self.panel_open;
        if self.panel_open && self.mode.is_deleting() {
            self.leave_mode();
        }
        debug!(open = self.panel_open, "building panel toggled");
        self.panel_open
    }

    /// Starts placing the catalog entry at `index` and closes the panel.
    pub fn select_building(&mut self, index: usize) -> Result<(), EditorError> {
        let building = self
            .catalog
            .get(index)
            .cloned()
            .ok_or(EditorError::UnknownSelection(index))?;
        self.begin_placement(building);
        Ok(())
    }

    /// Starts placing the building type named `id` and closes the panel.
    pub fn select_building_by_id(&mut self, id: &BuildingTypeId) -> Result<(), EditorError> {
        let building = self
            .catalog
            .lookup(id)
            .cloned()
            .ok_or_else(|| EditorError::UnknownBuildingType(id.clone()))?;
        self.begin_placement(building);
        Ok(())
    }

    /// Turns deletion mode on, cancelling any placement, or turns it off.
    ///
    /// Returns whether deletion mode is now on.
    pub fn toggle_delete_mode(&mut self) -> bool {
        if self.mode.is_deleting() {
            self.leave_mode();
            return false;
        }

        self.leave_mode();
        let mut session = DeletionSession::new();
        session.activate(&mut self.scene);
        self.mode = EditorMode::Deleting(session);
        self.panel_open = false;
        true
    }

    /// Moves the placement preview to the cell under `position`.
    ///
    /// Returns whether the previewed footprint fits there, or `None` when not
    /// placing.
    pub fn pointer_moved(&mut self, position: Vec3) -> Option<bool> {
        let cell = self.geometry.world_to_cell(position);
        match &mut self.mode {
            EditorMode::Placing(session) => {
                session.update_cursor(cell, &self.grid, &self.geometry, &mut self.scene)
            }
            EditorMode::Idle | EditorMode::Deleting(_) => None,
        }
    }

    /// Commits the placement or deletes at the cell under `position`.
    pub fn primary_click(&mut self, position: Vec3) -> Result<ClickOutcome, EditorError> {
        let cell = self.geometry.world_to_cell(position);
        self.click_cell(cell)
    }

    /// Same as [`Editor::primary_click`] but addressed by cell.
    ///
    /// A rejected placement keeps the preview so another cell can be tried.
    /// Any other placement outcome returns the editor to idle.
    pub fn click_cell(&mut self, cell: CellCoord) -> Result<ClickOutcome, EditorError> {
        match &mut self.mode {
            EditorMode::Idle => Ok(ClickOutcome::Ignored),
            EditorMode::Placing(session) => {
                let result = session.commit(
                    cell,
                    &mut self.grid,
                    &mut self.registry,
                    &self.geometry,
                    &mut self.scene,
                );
                if session.state() == PlacementState::Idle {
                    self.mode = EditorMode::Idle;
                }
                Ok(ClickOutcome::Placed(result?))
            }
            EditorMode::Deleting(session) => {
                let outcome = session.try_delete_at(
                    cell,
                    &mut self.grid,
                    &mut self.registry,
                    &mut self.scene,
                )?;
                Ok(match outcome {
                    DeletionOutcome::Deleted(record) => ClickOutcome::Deleted(record),
                    DeletionOutcome::NothingToDelete => ClickOutcome::NothingToDelete,
                })
            }
        }
    }

    /// Cancels placement or leaves deletion mode.
    ///
    /// Returns `false` when the editor was already idle.
    pub fn secondary_click(&mut self) -> bool {
        if self.mode.is_idle() {
            return false;
        }
        self.leave_mode();
        true
    }

    /// Replaces the placed buildings with the stored document.
    ///
    /// On success the grid and scene are rebuilt from the loaded records. On
    /// failure the current buildings and their visuals are kept.
    pub fn load_buildings(&mut self) -> Result<ReloadReport, PersistenceError> {
        self.leave_mode();
        let detached = self.registry.detach_visuals();

        let load = match self.registry.load() {
            Ok(load) => load,
            Err(error) => {
                for (instance_id, visual) in detached {
                    let _ = self.registry.attach_visual(&instance_id, visual);
                }
                warn!(%error, "could not load buildings, keeping current state");
                return Err(error);
            }
        };

        for (_, visual) in detached {
            self.scene.destroy_visual(visual);
        }
        self.grid.clear();
        let restore =
            self.registry
                .restore(&self.catalog, &mut self.grid, &self.geometry, &mut self.scene);
        info!(
            restored = restore.restored.len(),
            skipped = restore.skipped.len(),
            "buildings reloaded"
        );
        Ok(ReloadReport { load, restore })
    }

    fn begin_placement(&mut self, building: BuildingType) {
        if !self.mode.is_placing() {
            self.leave_mode();
            self.mode = EditorMode::Placing(PlacementSession::new());
        }
        if let EditorMode::Placing(session) = &mut self.mode {
            session.start(building, &self.geometry, &mut self.scene);
        }
        self.panel_open = false;
    }

    fn leave_mode(&mut self) {
        match std::mem::take(&mut self.mode) {
            EditorMode::Idle => {}
            EditorMode::Placing(mut session) => {
                let _ = session.cancel(&mut self.scene);
            }
            EditorMode::Deleting(mut session) => session.deactivate(&mut self.scene),
        }
    }
}
