#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Grid Sandbox engine.
//!
//! This crate defines the vocabulary that connects the occupancy grid, the
//! building registry, the interactive sessions and the adapters. Cells and
//! rectangles describe where buildings sit, [`BuildingType`] and
//! [`BuildingRecord`] describe what sits there, and the [`GridGeometry`],
//! [`Scene`] and [`BuildingCatalog`] traits are the only surface through which
//! the core talks to the engine hosting it.

use std::fmt;

use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::{Builder, Uuid};

/// Location of a single grid cell expressed as column and row coordinates.
///
/// Coordinates are signed so that positions left of or below the grid origin
/// remain representable and can be rejected by bounds checks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    x: i32,
    y: i32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Zero-based row index of the cell, growing upwards.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }
}

impl fmt::Display for CellCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Size of a [`CellRect`] measured in whole cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellRectSize {
    width: u32,
    height: u32,
}

impl CellRectSize {
    /// Creates a new size descriptor with explicit dimensions.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width of the rectangle in cells.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height of the rectangle in cells.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Returns `true` when the size covers no cells.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Axis-aligned rectangle expressed in cell coordinates.
///
/// The origin is the bottom-left cell; the rectangle covers the half-open
/// ranges `[x, x + width)` and `[y, y + height)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellRect {
    origin: CellCoord,
    size: CellRectSize,
}

impl CellRect {
    /// Constructs a rectangle from an origin cell and size.
    #[must_use]
    pub const fn from_origin_and_size(origin: CellCoord, size: CellRectSize) -> Self {
        Self { origin, size }
    }

    /// Bottom-left cell that anchors the rectangle.
    #[must_use]
    pub const fn origin(&self) -> CellCoord {
        self.origin
    }

    /// Dimensions of the rectangle measured in whole cells.
    #[must_use]
    pub const fn size(&self) -> CellRectSize {
        self.size
    }

    /// First column past the right edge, widened so it cannot overflow.
    #[must_use]
    pub fn end_x(&self) -> i64 {
        i64::from(self.origin.x) + i64::from(self.size.width)
    }

    /// First row past the top edge, widened so it cannot overflow.
    #[must_use]
    pub fn end_y(&self) -> i64 {
        i64::from(self.origin.y) + i64::from(self.size.height)
    }

    /// Reports whether the rectangle covers the provided cell.
    #[must_use]
    pub fn contains(&self, cell: CellCoord) -> bool {
        let x = i64::from(cell.x);
        let y = i64::from(cell.y);
        x >= i64::from(self.origin.x)
            && x < self.end_x()
            && y >= i64::from(self.origin.y)
            && y < self.end_y()
    }

    /// Reports whether the two rectangles share at least one cell.
    #[must_use]
    pub fn overlaps(&self, other: &CellRect) -> bool {
        if self.size.is_empty() || other.size.is_empty() {
            return false;
        }
        i64::from(self.origin.x) < other.end_x()
            && i64::from(other.origin.x) < self.end_x()
            && i64::from(self.origin.y) < other.end_y()
            && i64::from(other.origin.y) < self.end_y()
    }
}

/// Identifier of a building type as referenced by configuration and saves.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BuildingTypeId(String);

impl BuildingTypeId {
    /// Wraps the provided identifier.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrows the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BuildingTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unique identity of one placed building.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceId(String);

impl InstanceId {
    /// Wraps an existing identifier, typically one read back from storage.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Generates a fresh identifier for a building of the provided type.
    ///
    /// The identifier has the shape `{type}_{uuid}` with a random v4 UUID.
    #[must_use]
    pub fn generate(type_id: &BuildingTypeId) -> Self {
        Self::from_uuid(type_id, Uuid::new_v4())
    }

    /// Generates a fresh identifier drawing entropy from the supplied generator.
    #[must_use]
    pub fn generate_with<R: Rng + ?Sized>(type_id: &BuildingTypeId, rng: &mut R) -> Self {
        let uuid = Builder::from_random_bytes(rng.gen()).into_uuid();
        Self::from_uuid(type_id, uuid)
    }

    fn from_uuid(type_id: &BuildingTypeId, uuid: Uuid) -> Self {
        Self(format!("{type_id}_{uuid}"))
    }

    /// Borrows the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Static description of a kind of building that can be placed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuildingType {
    id: BuildingTypeId,
    footprint: CellRectSize,
    visual_asset: String,
}

impl BuildingType {
    /// Creates a new building type description.
    #[must_use]
    pub fn new(
        id: BuildingTypeId,
        footprint: CellRectSize,
        visual_asset: impl Into<String>,
    ) -> Self {
        Self {
            id,
            footprint,
            visual_asset: visual_asset.into(),
        }
    }

    /// Identifier used by saves to refer to this type.
    #[must_use]
    pub fn id(&self) -> &BuildingTypeId {
        &self.id
    }

    /// Rectangle of cells a building of this type occupies.
    #[must_use]
    pub const fn footprint(&self) -> CellRectSize {
        self.footprint
    }

    /// Reference to the visual asset rendered for this type.
    #[must_use]
    pub fn visual_asset(&self) -> &str {
        &self.visual_asset
    }

    /// Region this type would cover when anchored at `origin`.
    #[must_use]
    pub const fn region_at(&self, origin: CellCoord) -> CellRect {
        CellRect::from_origin_and_size(origin, self.footprint)
    }
}

/// Description of one placed building.
///
/// The footprint is copied from the building type at placement time so a
/// record stays meaningful even if its type later disappears from the catalog.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuildingRecord {
    instance_id: InstanceId,
    type_id: BuildingTypeId,
    region: CellRect,
}

impl BuildingRecord {
    /// Creates a new record.
    #[must_use]
    pub const fn new(instance_id: InstanceId, type_id: BuildingTypeId, region: CellRect) -> Self {
        Self {
            instance_id,
            type_id,
            region,
        }
    }

    /// Unique identity of the building.
    #[must_use]
    pub fn instance_id(&self) -> &InstanceId {
        &self.instance_id
    }

    /// Type the building was placed as.
    #[must_use]
    pub fn type_id(&self) -> &BuildingTypeId {
        &self.type_id
    }

    /// Region of cells occupied by the building.
    #[must_use]
    pub const fn region(&self) -> CellRect {
        self.region
    }
}

/// Reasons a placement request may be rejected by the occupancy grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlacementError {
    /// The requested region extends beyond the grid bounds.
    OutOfBounds,
    /// The requested footprint overlaps an occupied cell.
    Occupied,
}

impl fmt::Display for PlacementError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfBounds => write!(f, "footprint extends beyond the grid"),
            Self::Occupied => write!(f, "footprint overlaps an existing building"),
        }
    }
}

impl std::error::Error for PlacementError {}

/// Opaque handle to a visual spawned by a [`Scene`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VisualHandle(u64);

impl VisualHandle {
    /// Creates a handle from the scene's numeric representation.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the handle.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

/// Tint applied to a placement preview.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Tint {
    /// The previewed footprint can be placed.
    Valid,
    /// The previewed footprint is blocked or out of bounds.
    Invalid,
}

impl Tint {
    /// Selects the tint matching a placement check.
    #[must_use]
    pub const fn for_placeable(placeable: bool) -> Self {
        if placeable {
            Self::Valid
        } else {
            Self::Invalid
        }
    }
}

/// Converts between grid cells and engine world space.
pub trait GridGeometry {
    /// World position at which a visual anchored to `cell` is drawn.
    fn cell_to_world(&self, cell: CellCoord) -> Vec3;

    /// Cell containing the provided world position.
    fn world_to_cell(&self, position: Vec3) -> CellCoord;
}

/// Host scene that owns the visual representation of buildings.
pub trait Scene {
    /// Spawns a visual for `asset` at `position` and returns its handle.
    fn spawn_visual(&mut self, asset: &str, position: Vec3) -> VisualHandle;

    /// Destroys a previously spawned visual. Unknown handles are ignored.
    fn destroy_visual(&mut self, handle: VisualHandle);

    /// Applies a tint to a previously spawned visual.
    fn recolor_visual(&mut self, handle: VisualHandle, tint: Tint);

    /// Shows or hides the overlay that signals deletion mode.
    fn set_deletion_overlay(&mut self, visible: bool);
}

/// Read-only lookup of building types.
pub trait BuildingCatalog {
    /// Retrieves the type registered under `id`, if any.
    fn lookup(&self, id: &BuildingTypeId) -> Option<&BuildingType>;
}

/// Catalog backed by an ordered list of building types.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StaticCatalog {
    types: Vec<BuildingType>,
}

impl StaticCatalog {
    /// Creates a catalog from the provided types, keeping their order.
    #[must_use]
    pub fn from_types(types: Vec<BuildingType>) -> Self {
        Self { types }
    }

    /// Retrieves the type at the provided selection index.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&BuildingType> {
        self.types.get(index)
    }

    /// Iterator over the types in selection order.
    pub fn iter(&self) -> impl Iterator<Item = &BuildingType> {
        self.types.iter()
    }

    /// Number of types in the catalog.
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Returns `true` when the catalog holds no types.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl BuildingCatalog for StaticCatalog {
    fn lookup(&self, id: &BuildingTypeId) -> Option<&BuildingType> {
        self.types.iter().find(|candidate| candidate.id() == id)
    }
}
