use std::collections::BTreeMap;

use glam::Vec3;
use grid_sandbox_core::{Scene, Tint, VisualHandle};
use tracing::{debug, trace};

/// A visual tracked by the [`HeadlessScene`].
#[derive(Clone, Debug, PartialEq)]
pub struct SceneVisual {
    /// Asset the visual was spawned from.
    pub asset: String,
    /// World position of the visual.
    pub position: Vec3,
    /// Last tint applied, if any.
    pub tint: Option<Tint>,
}

/// Scene without a renderer: remembers what would be on screen.
#[derive(Clone, Debug, Default)]
pub struct HeadlessScene {
    next_handle: u64,
    visuals: BTreeMap<VisualHandle, SceneVisual>,
    deletion_overlay: bool,
}

impl HeadlessScene {
    /// Creates an empty scene.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Visuals currently alive, ordered by handle.
    pub fn visuals(&self) -> impl Iterator<Item = (VisualHandle, &SceneVisual)> {
        self.visuals.iter().map(|(handle, visual)| (*handle, visual))
    }

    /// Looks up a live visual.
    #[must_use]
    pub fn visual(&self, handle: VisualHandle) -> Option<&SceneVisual> {
        self.visuals.get(&handle)
    }

    /// Number of live visuals.
    #[must_use]
    pub fn visual_count(&self) -> usize {
        self.visuals.len()
    }

    /// Whether the deletion overlay is shown.
    #[must_use]
    pub const fn deletion_overlay(&self) -> bool {
        self.deletion_overlay
    }
}

impl Scene for HeadlessScene {
    fn spawn_visual(&mut self, asset: &str, position: Vec3) -> VisualHandle {
        self.next_handle += 1;
        let handle = VisualHandle::new(self.next_handle);
        trace!(handle = handle.get(), asset, ?position, "spawn visual");
        let _ = self.visuals.insert(
            handle,
            SceneVisual {
                asset: asset.to_owned(),
                position,
                tint: None,
            },
        );
        handle
    }

    fn destroy_visual(&mut self, handle: VisualHandle) {
        if self.visuals.remove(&handle).is_none() {
            debug!(handle = handle.get(), "destroy requested for unknown visual");
        }
    }

    fn recolor_visual(&mut self, handle: VisualHandle, tint: Tint) {
        if let Some(visual) = self.visuals.get_mut(&handle) {
            visual.tint = Some(tint);
        }
    }

    fn set_deletion_overlay(&mut self, visible: bool) {
        self.deletion_overlay = visible;
    }
}
