#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Headless application shell for the building sandbox.
//!
//! [`Editor`] owns the occupancy grid, the building registry and the host
//! collaborators, and exposes the callbacks a UI would wire to its buttons and
//! pointer. [`SandboxConfig`] describes the grid and the building catalog,
//! [`UniformGridGeometry`] and [`HeadlessScene`] stand in for an engine, and
//! [`render_grid`] draws the occupancy as text.

mod ascii;
mod config;
mod editor;
mod geometry;
mod scene;

pub use crate::ascii::render_grid;
pub use crate::config::{default_save_path, BuildingConfig, GridConfig, SandboxConfig};
pub use crate::editor::{ClickOutcome, Editor, EditorError, EditorMode, ReloadReport};
pub use crate::geometry::UniformGridGeometry;
pub use crate::scene::{HeadlessScene, SceneVisual};
