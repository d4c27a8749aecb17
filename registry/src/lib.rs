#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Registry of placed buildings and its JSON persistence.
//!
//! The [`BuildingRegistry`] keeps placed buildings in insertion order and
//! mirrors them to a [`DocumentStorage`] after every mutation. Loading runs the
//! versioned migration chain before records become visible, and
//! [`BuildingRegistry::restore`] replays the loaded records into the occupancy
//! grid and the host scene.

mod document;
mod error;
mod migrate;
mod storage;

use grid_sandbox_core::{
    BuildingCatalog, BuildingRecord, CellCoord, GridGeometry, InstanceId, Scene, VisualHandle,
};
use grid_sandbox_world::OccupancyGrid;
use tracing::{debug, info, warn};

use crate::document::SaveDocument;
use crate::migrate::MigrationRegistry;

pub use crate::error::PersistenceError;
pub use crate::migrate::MigrationReport;
pub use crate::storage::{DocumentStorage, JsonFile, MemoryStorage, SAVE_FILE_NAME};

/// A record together with the visual currently representing it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlacedBuilding {
    record: BuildingRecord,
    visual: Option<VisualHandle>,
}

impl PlacedBuilding {
    /// Persisted description of the building.
    #[must_use]
    pub fn record(&self) -> &BuildingRecord {
        &self.record
    }

    /// Handle of the visual spawned for the building, if one exists.
    #[must_use]
    pub const fn visual(&self) -> Option<VisualHandle> {
        self.visual
    }
}

/// Outcome of a successful [`BuildingRegistry::load`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadReport {
    /// Migrations applied to the stored document, when one existed.
    pub migration: Option<MigrationReport>,
    /// Number of records now held by the registry.
    pub records: usize,
    /// Whether a migrated document was written back to storage.
    pub repersisted: bool,
}

/// Outcome of replaying loaded records into the grid and scene.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RestoreReport {
    /// Buildings reserved on the grid and rendered.
    pub restored: Vec<InstanceId>,
    /// Buildings whose type is unknown to the catalog.
    pub skipped: Vec<InstanceId>,
}

/// Ordered collection of placed buildings backed by durable storage.
pub struct BuildingRegistry {
    entries: Vec<PlacedBuilding>,
    storage: Box<dyn DocumentStorage>,
    migrations: MigrationRegistry,
}

impl std::fmt::Debug for BuildingRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuildingRegistry")
            .field("entries", &self.entries)
            .field("storage", &self.storage.describe())
            .finish()
    }
}

impl BuildingRegistry {
    /// Creates an empty registry persisting to `storage`.
    #[must_use]
    pub fn new(storage: impl DocumentStorage + 'static) -> Self {
        Self {
            entries: Vec::new(),
            storage: Box::new(storage),
            migrations: MigrationRegistry::standard(),
        }
    }

    /// Description of the backing storage location.
    #[must_use]
    pub fn storage_location(&self) -> String {
        self.storage.describe()
    }

    /// Number of placed buildings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when no buildings are placed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterator over the placed buildings in insertion order.
    pub fn entries(&self) -> impl Iterator<Item = &PlacedBuilding> {
        self.entries.iter()
    }

    /// Iterator over the records in insertion order.
    pub fn records(&self) -> impl Iterator<Item = &BuildingRecord> {
        self.entries.iter().map(PlacedBuilding::record)
    }

    /// Looks up a building by its instance identity.
    #[must_use]
    pub fn get(&self, instance_id: &InstanceId) -> Option<&PlacedBuilding> {
        self.entries
            .iter()
            .find(|entry| entry.record.instance_id() == instance_id)
    }

    /// Appends `record` and persists the full document.
    ///
    /// The record stays registered even when persisting fails; the next
    /// successful save writes it out.
    pub fn add(&mut self, record: BuildingRecord) -> Result<(), PersistenceError> {
        info!(
            instance = %record.instance_id(),
            kind = %record.type_id(),
            origin = %record.region().origin(),
            "building added"
        );
        self.entries.push(PlacedBuilding {
            record,
            visual: None,
        });
        self.save()
    }

    /// Associates a spawned visual with a registered building.
    ///
    /// Returns `false` when no building with `instance_id` is registered.
    pub fn attach_visual(&mut self, instance_id: &InstanceId, visual: VisualHandle) -> bool {
        match self
            .entries
            .iter_mut()
            .find(|entry| entry.record.instance_id() == instance_id)
        {
            Some(entry) => {
                entry.visual = Some(visual);
                true
            }
            None => false,
        }
    }

    /// First building, in insertion order, whose region covers `cell`.
    #[must_use]
    pub fn find_at(&self, cell: CellCoord) -> Option<&PlacedBuilding> {
        self.entries
            .iter()
            .find(|entry| entry.record.region().contains(cell))
    }

    /// Removes the first building with `instance_id` and persists.
    ///
    /// Returns the removed building, or `None` without touching storage when
    /// no building matches.
    pub fn remove_by_instance_id(
        &mut self,
        instance_id: &InstanceId,
    ) -> Result<Option<PlacedBuilding>, PersistenceError> {
        let Some(position) = self
            .entries
            .iter()
            .position(|entry| entry.record.instance_id() == instance_id)
        else {
            debug!(instance = %instance_id, "no building to remove");
            return Ok(None);
        };

        let removed = self.entries.remove(position);
        info!(instance = %instance_id, "building removed");
        self.save()?;
        Ok(Some(removed))
    }

    /// Takes every visual handle out of the registry, paired with the
    /// building it belonged to.
    pub fn detach_visuals(&mut self) -> Vec<(InstanceId, VisualHandle)> {
        self.entries
            .iter_mut()
            .filter_map(|entry| {
                let visual = entry.visual.take()?;
                Some((entry.record.instance_id().clone(), visual))
            })
            .collect()
    }

    /// Serializes the full document to storage.
    ///
    /// Never mutates the in-memory records.
    pub fn save(&mut self) -> Result<(), PersistenceError> {
        let json = SaveDocument::from_records(self.records()).to_json()?;
        self.storage.write(&json)?;
        info!(
            buildings = self.entries.len(),
            location = %self.storage.describe(),
            "saved buildings"
        );
        Ok(())
    }

    /// Replaces the in-memory records with the stored document.
    ///
    /// A missing document leaves the registry empty. A corrupt or unsupported
    /// document is reported and the current records are kept. Migrated
    /// documents are written back immediately; a failure to do so is logged
    /// and reflected in [`LoadReport::repersisted`].
    pub fn load(&mut self) -> Result<LoadReport, PersistenceError> {
        let Some(json) = self.storage.read()? else {
            info!(location = %self.storage.describe(), "no save document yet");
            self.entries.clear();
            return Ok(LoadReport {
                migration: None,
                records: 0,
                repersisted: false,
            });
        };

        let mut document = SaveDocument::from_json(&json)?;
        let migration = self.migrations.migrate(&mut document)?;

        self.entries = document
            .buildings
            .into_iter()
            .map(|saved| PlacedBuilding {
                record: saved.into_record(),
                visual: None,
            })
            .collect();

        let mut repersisted = false;
        if migration.migrated() {
            match self.save() {
                Ok(()) => repersisted = true,
                Err(error) => warn!(%error, "could not write migrated save document"),
            }
        }

        info!(
            buildings = self.entries.len(),
            location = %self.storage.describe(),
            "loaded buildings"
        );
        Ok(LoadReport {
            migration: Some(migration),
            records: self.entries.len(),
            repersisted,
        })
    }

    /// Reserves every resolvable record on `grid` and renders it in `scene`.
    ///
    /// Records whose type the catalog does not know are skipped but stay
    /// registered, so they survive the next save.
    pub fn restore(
        &mut self,
        catalog: &impl BuildingCatalog,
        grid: &mut OccupancyGrid,
        geometry: &impl GridGeometry,
        scene: &mut impl Scene,
    ) -> RestoreReport {
        let mut report = RestoreReport::default();
        for entry in &mut self.entries {
            let record = &entry.record;
            let Some(building_type) = catalog.lookup(record.type_id()) else {
                warn!(
                    instance = %record.instance_id(),
                    kind = %record.type_id(),
                    "unknown building type, skipping"
                );
                report.skipped.push(record.instance_id().clone());
                continue;
            };

            let region = record.region();
            grid.reserve(region);
            if let Some(previous) = entry.visual.take() {
                scene.destroy_visual(previous);
            }
            let position = geometry.cell_to_world(region.origin());
            entry.visual = Some(scene.spawn_visual(building_type.visual_asset(), position));
            report.restored.push(record.instance_id().clone());
        }
        report
    }
}
