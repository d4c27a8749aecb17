//! Versioned migration chain for the save document.
//!
//! Each step upgrades a document from `from_version` to `from_version + 1`.
//! Steps are applied in order until the document reaches the current version.

use std::mem;

use grid_sandbox_core::InstanceId;
use tracing::info;

use crate::document::{
    SaveDocument, SavedBuilding, CURRENT_DOCUMENT_VERSION, UNVERSIONED_DOCUMENT,
};
use crate::error::PersistenceError;

/// A single upgrade step.
pub(crate) struct MigrationStep {
    pub(crate) from_version: u32,
    pub(crate) description: &'static str,
    pub(crate) migrate_fn: fn(&mut SaveDocument),
}

/// Summary of the migrations applied while loading a document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MigrationReport {
    /// Version recorded in the document before migration.
    pub original_version: u32,
    /// Version of the document after migration.
    pub final_version: u32,
    /// Descriptions of the steps that ran, in order.
    pub steps_applied: Vec<&'static str>,
}

impl MigrationReport {
    /// Returns `true` when at least one step changed the document.
    #[must_use]
    pub fn migrated(&self) -> bool {
        !self.steps_applied.is_empty()
    }
}

/// Ordered chain of migration steps.
pub(crate) struct MigrationRegistry {
    steps: Vec<MigrationStep>,
    current_version: u32,
}

impl MigrationRegistry {
    /// Builds a registry; the chain must cover every version from the oldest
    /// supported one up to `current_version - 1` exactly once.
    pub(crate) fn new(mut steps: Vec<MigrationStep>, current_version: u32) -> Self {
        steps.sort_by_key(|step| step.from_version);
        debug_assert!(
            steps
                .iter()
                .map(|step| step.from_version)
                .eq(UNVERSIONED_DOCUMENT..current_version),
            "migration chain must be contiguous up to v{current_version}"
        );
        Self {
            steps,
            current_version,
        }
    }

    /// The chain used by this build.
    pub(crate) fn standard() -> Self {
        Self::new(
            vec![MigrationStep {
                from_version: 1,
                description: "merge unnamed legacy buildings into named records",
                migrate_fn: merge_legacy_buildings,
            }],
            CURRENT_DOCUMENT_VERSION,
        )
    }

    /// Upgrades `document` to the current version.
    pub(crate) fn migrate(
        &self,
        document: &mut SaveDocument,
    ) -> Result<MigrationReport, PersistenceError> {
        if document.version > self.current_version {
            return Err(PersistenceError::UnsupportedVersion {
                found: document.version,
                supported: self.current_version,
            });
        }
        let original_version = document.version;
        document.version = document.version.max(UNVERSIONED_DOCUMENT);

        let mut steps_applied = Vec::new();
        for step in &self.steps {
            if document.version == step.from_version {
                info!(
                    from = step.from_version,
                    to = step.from_version + 1,
                    step = step.description,
                    "migrating save document"
                );
                (step.migrate_fn)(document);
                document.version = step.from_version + 1;
                steps_applied.push(step.description);
            }
        }

        if !document.legacy_buildings.is_empty() {
            info!(
                version = document.version,
                legacy = document.legacy_buildings.len(),
                "merging legacy buildings left in a current document"
            );
            merge_legacy_buildings(document);
            steps_applied.push(STRAY_LEGACY_MERGE);
        }

        Ok(MigrationReport {
            original_version,
            final_version: document.version,
            steps_applied,
        })
    }
}

const STRAY_LEGACY_MERGE: &str = "merge legacy buildings found in a current document";

/// v1 -> v2: legacy records gain generated instance names.
///
/// When the document has no named records every legacy record is converted.
/// Otherwise only legacy records without a named twin (same type and
/// rectangle) are appended. Named records with a blank name get one too.
fn merge_legacy_buildings(document: &mut SaveDocument) {
    let legacy = mem::take(&mut document.legacy_buildings);
    let convert_all = document.buildings.is_empty();

    for old in legacy {
        let already_named = !convert_all
            && document
                .buildings
                .iter()
                .any(|named| named.id == old.id && named.region() == old.region());
        if already_named {
            continue;
        }
        let instance_name = InstanceId::generate(&old.id).as_str().to_owned();
        document.buildings.push(SavedBuilding {
            id: old.id,
            x: old.x,
            y: old.y,
            w: old.w,
            h: old.h,
            instance_name,
        });
    }

    for named in &mut document.buildings {
        if named.instance_name.trim().is_empty() {
            named.instance_name = InstanceId::generate(&named.id).as_str().to_owned();
        }
    }
}
