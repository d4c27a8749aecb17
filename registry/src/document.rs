//! On-disk shape of the save document.
//!
//! Field names follow the established JSON layout (`buildingsWithNames`,
//! `instanceName`, ...) so existing save files keep loading.

use grid_sandbox_core::{
    BuildingRecord, BuildingTypeId, CellCoord, CellRect, CellRectSize, InstanceId,
};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::PersistenceError;

/// Version assumed for documents that predate the version tag.
pub(crate) const UNVERSIONED_DOCUMENT: u32 = 1;
/// Version written by this build.
pub(crate) const CURRENT_DOCUMENT_VERSION: u32 = 2;

/// Complete persisted document.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub(crate) struct SaveDocument {
    #[serde(default = "unversioned")]
    pub(crate) version: u32,
    #[serde(
        rename = "buildingsWithNames",
        default,
        deserialize_with = "null_as_empty"
    )]
    pub(crate) buildings: Vec<SavedBuilding>,
    /// Records written before instance names existed. Read, never written.
    #[serde(
        rename = "buildings",
        default,
        deserialize_with = "null_as_empty",
        skip_serializing
    )]
    pub(crate) legacy_buildings: Vec<LegacyBuilding>,
}

impl SaveDocument {
    /// Builds a current-version document from the provided records.
    pub(crate) fn from_records<'a>(records: impl IntoIterator<Item = &'a BuildingRecord>) -> Self {
        Self {
            version: CURRENT_DOCUMENT_VERSION,
            buildings: records.into_iter().map(SavedBuilding::from_record).collect(),
            legacy_buildings: Vec::new(),
        }
    }

    pub(crate) fn to_json(&self) -> Result<String, PersistenceError> {
        let json = serde_json::to_string_pretty(self).map_err(PersistenceError::Serialize)?;
        if json.trim().is_empty() {
            return Err(PersistenceError::EmptyDocument);
        }
        Ok(json)
    }

    pub(crate) fn from_json(json: &str) -> Result<Self, PersistenceError> {
        serde_json::from_str(json).map_err(PersistenceError::Deserialize)
    }
}

/// Current-format building entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct SavedBuilding {
    pub(crate) id: BuildingTypeId,
    pub(crate) x: i32,
    pub(crate) y: i32,
    pub(crate) w: u32,
    pub(crate) h: u32,
    #[serde(rename = "instanceName", default)]
    pub(crate) instance_name: String,
}

impl SavedBuilding {
    pub(crate) fn from_record(record: &BuildingRecord) -> Self {
        let region = record.region();
        Self {
            id: record.type_id().clone(),
            x: region.origin().x(),
            y: region.origin().y(),
            w: region.size().width(),
            h: region.size().height(),
            instance_name: record.instance_id().as_str().to_owned(),
        }
    }

    pub(crate) fn region(&self) -> CellRect {
        CellRect::from_origin_and_size(
            CellCoord::new(self.x, self.y),
            CellRectSize::new(self.w, self.h),
        )
    }

    pub(crate) fn into_record(self) -> BuildingRecord {
        let region = self.region();
        BuildingRecord::new(InstanceId::new(self.instance_name), self.id, region)
    }
}

/// Legacy building entry without an instance name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct LegacyBuilding {
    pub(crate) id: BuildingTypeId,
    pub(crate) x: i32,
    pub(crate) y: i32,
    pub(crate) w: u32,
    pub(crate) h: u32,
}

impl LegacyBuilding {
    pub(crate) fn region(&self) -> CellRect {
        CellRect::from_origin_and_size(
            CellCoord::new(self.x, self.y),
            CellRectSize::new(self.w, self.h),
        )
    }
}

fn unversioned() -> u32 {
    UNVERSIONED_DOCUMENT
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unversioned_legacy_document_parses() {
        let document = SaveDocument::from_json(
            r#"{ "buildings": [ { "id": "house", "x": 1, "y": 1, "w": 2, "h": 2 } ] }"#,
        )
        .expect("legacy document parses");

        assert_eq!(document.version, UNVERSIONED_DOCUMENT);
        assert!(document.buildings.is_empty());
        assert_eq!(document.legacy_buildings.len(), 1);
        assert_eq!(document.legacy_buildings[0].id, BuildingTypeId::new("house"));
    }

    #[test]
    fn null_lists_are_treated_as_empty() {
        let document =
            SaveDocument::from_json(r#"{ "buildingsWithNames": null, "buildings": null }"#)
                .expect("null lists parse");
        assert!(document.buildings.is_empty());
        assert!(document.legacy_buildings.is_empty());
    }

    #[test]
    fn serialized_document_omits_legacy_list() {
        let mut document = SaveDocument::default();
        document.legacy_buildings.push(LegacyBuilding {
            id: BuildingTypeId::new("house"),
            x: 0,
            y: 0,
            w: 1,
            h: 1,
        });

        let json = document.to_json().expect("document serializes");
        let value: serde_json::Value = serde_json::from_str(&json).expect("valid json");
        assert!(value.get("buildings").is_none());
        assert!(value.get("buildingsWithNames").is_some());
    }

    #[test]
    fn current_records_use_established_field_names() {
        let record = BuildingRecord::new(
            InstanceId::new("farm_1"),
            BuildingTypeId::new("farm"),
            CellRect::from_origin_and_size(CellCoord::new(3, 4), CellRectSize::new(3, 2)),
        );
        let json = SaveDocument::from_records([&record])
            .to_json()
            .expect("document serializes");
        let value: serde_json::Value = serde_json::from_str(&json).expect("valid json");

        assert_eq!(value["version"], CURRENT_DOCUMENT_VERSION);
        assert_eq!(
            value["buildingsWithNames"][0],
            serde_json::json!({
                "id": "farm",
                "x": 3,
                "y": 4,
                "w": 3,
                "h": 2,
                "instanceName": "farm_1",
            })
        );
    }

    #[test]
    fn negative_footprint_is_rejected() {
        let result = SaveDocument::from_json(
            r#"{ "buildingsWithNames": [ { "id": "house", "x": 1, "y": 1, "w": -2, "h": 2, "instanceName": "a" } ] }"#,
        );
        assert!(matches!(result, Err(PersistenceError::Deserialize(_))));
    }
}
