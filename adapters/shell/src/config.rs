use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use glam::Vec3;
use grid_sandbox_core::{BuildingType, BuildingTypeId, CellRectSize, StaticCatalog};
use grid_sandbox_registry::SAVE_FILE_NAME;
use grid_sandbox_world::{OccupancyGrid, DEFAULT_COLUMNS, DEFAULT_ROWS, MAX_CELLS};
use serde::Deserialize;

use crate::UniformGridGeometry;

const APP_DIRECTORY: &str = "grid-sandbox";

/// Settings for the sandbox: grid dimensions, save location and the catalog
/// of placeable building types.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SandboxConfig {
    /// Grid dimensions and world scale.
    pub grid: GridConfig,
    /// Location of the save document. Falls back to the platform data
    /// directory when absent.
    pub save_path: Option<PathBuf>,
    /// Building types offered for placement, in selection order.
    pub buildings: Vec<BuildingConfig>,
}

/// Grid section of the configuration.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GridConfig {
    /// Number of columns.
    pub columns: u32,
    /// Number of rows.
    pub rows: u32,
    /// Edge length of one cell in world units.
    pub cell_size: f32,
}

/// One `[[buildings]]` entry.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildingConfig {
    /// Identifier recorded in the save document.
    pub id: String,
    /// Footprint width in cells.
    pub width: u32,
    /// Footprint height in cells.
    pub height: u32,
    /// Asset reference handed to the scene.
    pub visual_asset: String,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            columns: DEFAULT_COLUMNS,
            rows: DEFAULT_ROWS,
            cell_size: 1.0,
        }
    }
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            grid: GridConfig::default(),
            save_path: None,
            buildings: default_buildings(),
        }
    }
}

fn default_buildings() -> Vec<BuildingConfig> {
    [("house", 2, 2), ("farm", 3, 3), ("tower", 1, 2)]
        .into_iter()
        .map(|(id, width, height)| BuildingConfig {
            id: id.to_owned(),
            width,
            height,
            visual_asset: format!("buildings/{id}.png"),
        })
        .collect()
}

impl SandboxConfig {
    /// Reads and validates the configuration stored at `path`.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read sandbox config at {}", path.display()))?;
        Self::from_toml_str(&contents)
            .with_context(|| format!("invalid sandbox config at {}", path.display()))
    }

    /// Parses and validates configuration from TOML text.
    ///
    /// Sections left out of the text keep their defaults. An explicit empty
    /// `buildings` list is rejected.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(contents).context("failed to parse sandbox config toml contents")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.grid.columns == 0 || self.grid.rows == 0 {
            bail!(
                "grid must have at least one cell, got {}x{}",
                self.grid.columns,
                self.grid.rows
            );
        }
        let cells = u64::from(self.grid.columns) * u64::from(self.grid.rows);
        if cells > MAX_CELLS {
            bail!(
                "grid {}x{} has {cells} cells; at most {MAX_CELLS} are supported",
                self.grid.columns,
                self.grid.rows
            );
        }
        if !(self.grid.cell_size.is_finite() && self.grid.cell_size > 0.0) {
            bail!("cell_size must be positive, got {}", self.grid.cell_size);
        }
        if self.buildings.is_empty() {
            bail!("sandbox config lists no buildings");
        }

        let mut seen = HashSet::new();
        for building in &self.buildings {
            if building.id.trim().is_empty() {
                bail!("building entries need a non-empty id");
            }
            if building.width == 0 || building.height == 0 {
                bail!(
                    "building `{}` has an empty footprint {}x{}",
                    building.id,
                    building.width,
                    building.height
                );
            }
            if !seen.insert(building.id.as_str()) {
                bail!("sandbox config contains duplicate building `{}`", building.id);
            }
        }
        Ok(())
    }

    /// Empty occupancy grid with the configured dimensions.
    #[must_use]
    pub fn grid(&self) -> OccupancyGrid {
        OccupancyGrid::new(self.grid.columns, self.grid.rows)
    }

    /// Geometry placing cell (0, 0) at the world origin.
    #[must_use]
    pub fn geometry(&self) -> UniformGridGeometry {
        UniformGridGeometry::new(Vec3::ZERO, self.grid.cell_size)
    }

    /// Catalog of the configured building types, in selection order.
    #[must_use]
    pub fn catalog(&self) -> StaticCatalog {
        StaticCatalog::from_types(
            self.buildings
                .iter()
                .map(|building| {
                    BuildingType::new(
                        BuildingTypeId::new(building.id.clone()),
                        CellRectSize::new(building.width, building.height),
                        building.visual_asset.clone(),
                    )
                })
                .collect(),
        )
    }

    /// Save document location: the configured path, or
    /// `<data dir>/grid-sandbox/SaveData.json`.
    pub fn resolved_save_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.save_path {
            return Ok(path.clone());
        }
        default_save_path()
    }
}

/// `<data dir>/grid-sandbox/SaveData.json` for the current platform.
pub fn default_save_path() -> Result<PathBuf> {
    let base = dirs::data_dir().context("no platform data directory available")?;
    Ok(base.join(APP_DIRECTORY).join(SAVE_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use grid_sandbox_core::BuildingCatalog;

    #[test]
    fn empty_text_yields_defaults() {
        let config = SandboxConfig::from_toml_str("").expect("defaults parse");
        assert_eq!(config, SandboxConfig::default());
        assert_eq!(config.grid().columns(), 40);
        assert_eq!(config.grid().rows(), 30);

        let catalog = config.catalog();
        let ids: Vec<&str> = catalog.iter().map(|kind| kind.id().as_str()).collect();
        assert_eq!(ids, ["house", "farm", "tower"]);
    }

    #[test]
    fn configured_buildings_replace_the_builtin_catalog() {
        let config = SandboxConfig::from_toml_str(
            r#"
            save_path = "saves/town.json"

            [grid]
            columns = 12
            rows = 8
            cell_size = 2.5

            [[buildings]]
            id = "mill"
            width = 2
            height = 3
            visual_asset = "mill.png"
            "#,
        )
        .expect("config should parse");

        assert_eq!(config.grid.cell_size, 2.5);
        assert_eq!(
            config.resolved_save_path().expect("explicit path"),
            PathBuf::from("saves/town.json")
        );

        let catalog = config.catalog();
        assert_eq!(catalog.len(), 1);
        let mill = catalog
            .lookup(&BuildingTypeId::new("mill"))
            .expect("mill registered");
        assert_eq!(mill.footprint(), CellRectSize::new(2, 3));
        assert_eq!(mill.visual_asset(), "mill.png");
    }

    #[test]
    fn duplicate_building_ids_are_rejected() {
        let result = SandboxConfig::from_toml_str(
            r#"
            [[buildings]]
            id = "house"
            width = 2
            height = 2
            visual_asset = "a.png"

            [[buildings]]
            id = "house"
            width = 1
            height = 1
            visual_asset = "b.png"
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn empty_footprint_is_rejected() {
        let result = SandboxConfig::from_toml_str(
            r#"
            [[buildings]]
            id = "flat"
            width = 0
            height = 2
            visual_asset = "flat.png"
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn zero_sized_grid_is_rejected() {
        assert!(SandboxConfig::from_toml_str("[grid]\ncolumns = 0\n").is_err());
        assert!(SandboxConfig::from_toml_str("[grid]\ncell_size = -1.0\n").is_err());
    }

    #[test]
    fn oversized_grid_is_rejected() {
        let error = SandboxConfig::from_toml_str("[grid]\ncolumns = 4294967295\nrows = 2\n")
            .expect_err("grid too large");
        assert!(format!("{error:#}").contains("at most"));
        assert!(SandboxConfig::from_toml_str("[grid]\ncolumns = 4096\nrows = 4096\n").is_ok());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(SandboxConfig::from_toml_str("[grid]\ndepth = 3\n").is_err());
    }

    #[test]
    fn bundled_sample_matches_defaults() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../assets/sandbox.toml");
        let config = SandboxConfig::from_path(path).expect("sample config parses");
        assert_eq!(config, SandboxConfig::default());
    }

    #[test]
    fn missing_file_reports_path() {
        let error = SandboxConfig::from_path("definitely/not/here.toml")
            .expect_err("missing file should fail");
        assert!(format!("{error:#}").contains("definitely/not/here.toml"));
    }
}
