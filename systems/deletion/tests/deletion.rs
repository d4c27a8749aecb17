use glam::Vec3;
use grid_sandbox_core::{
    BuildingRecord, BuildingTypeId, CellCoord, CellRect, CellRectSize, InstanceId, Scene, Tint,
    VisualHandle,
};
use grid_sandbox_registry::{BuildingRegistry, MemoryStorage};
use grid_sandbox_system_deletion::{DeletionError, DeletionOutcome, DeletionSession};
use grid_sandbox_world::OccupancyGrid;

#[derive(Default)]
struct RecordingScene {
    destroyed: Vec<VisualHandle>,
    overlay: Vec<bool>,
}

impl Scene for RecordingScene {
    fn spawn_visual(&mut self, _asset: &str, _position: Vec3) -> VisualHandle {
        VisualHandle::new(0)
    }

    fn destroy_visual(&mut self, handle: VisualHandle) {
        self.destroyed.push(handle);
    }

    fn recolor_visual(&mut self, _handle: VisualHandle, _tint: Tint) {}

    fn set_deletion_overlay(&mut self, visible: bool) {
        self.overlay.push(visible);
    }
}

fn region(x: i32, y: i32, w: u32, h: u32) -> CellRect {
    CellRect::from_origin_and_size(CellCoord::new(x, y), CellRectSize::new(w, h))
}

/// Registry and grid holding a single 2x2 house at (5, 5) drawn as visual 7.
fn populated(storage: &MemoryStorage) -> (OccupancyGrid, BuildingRegistry) {
    let mut grid = OccupancyGrid::new(40, 30);
    let mut registry = BuildingRegistry::new(storage.clone());
    let house = BuildingRecord::new(
        InstanceId::new("house_a"),
        BuildingTypeId::new("house"),
        region(5, 5, 2, 2),
    );
    grid.reserve(house.region());
    registry.add(house).expect("add persists");
    assert!(registry.attach_visual(&InstanceId::new("house_a"), VisualHandle::new(7)));
    (grid, registry)
}

#[test]
fn activation_toggles_overlay() {
    let mut scene = RecordingScene::default();
    let mut session = DeletionSession::new();

    session.activate(&mut scene);
    assert!(session.is_active());
    session.deactivate(&mut scene);
    assert!(!session.is_active());

    assert_eq!(scene.overlay, vec![true, false]);
}

#[test]
fn delete_releases_grid_destroys_visual_and_removes_record() {
    let storage = MemoryStorage::new();
    let (mut grid, mut registry) = populated(&storage);
    let mut scene = RecordingScene::default();
    let mut session = DeletionSession::new();
    session.activate(&mut scene);

    let outcome = session
        .try_delete_at(CellCoord::new(6, 6), &mut grid, &mut registry, &mut scene)
        .expect("deletion succeeds");

    let DeletionOutcome::Deleted(record) = outcome else {
        panic!("expected a deletion");
    };
    assert_eq!(record.instance_id(), &InstanceId::new("house_a"));
    assert_eq!(grid.occupied_count(), 0);
    assert!(registry.is_empty());
    assert_eq!(scene.destroyed, vec![VisualHandle::new(7)]);
    assert_eq!(storage.write_count(), 2);
    assert!(session.is_active());
}

#[test]
fn empty_cell_reports_nothing_to_delete() {
    let storage = MemoryStorage::new();
    let (mut grid, mut registry) = populated(&storage);
    let mut scene = RecordingScene::default();
    let mut session = DeletionSession::new();
    session.activate(&mut scene);

    let outcome = session
        .try_delete_at(CellCoord::new(7, 7), &mut grid, &mut registry, &mut scene)
        .expect("lookup succeeds");

    assert_eq!(outcome, DeletionOutcome::NothingToDelete);
    assert_eq!(grid.occupied_count(), 4);
    assert_eq!(registry.len(), 1);
    assert!(scene.destroyed.is_empty());
    assert_eq!(storage.write_count(), 1);
}

#[test]
fn inactive_session_refuses_to_delete() {
    let storage = MemoryStorage::new();
    let (mut grid, mut registry) = populated(&storage);
    let mut scene = RecordingScene::default();
    let mut session = DeletionSession::new();

    let result = session.try_delete_at(CellCoord::new(6, 6), &mut grid, &mut registry, &mut scene);

    assert!(matches!(result, Err(DeletionError::Inactive)));
    assert_eq!(registry.len(), 1);
}

#[test]
fn repeated_deletes_stay_active() {
    let storage = MemoryStorage::new();
    let (mut grid, mut registry) = populated(&storage);
    let farm = BuildingRecord::new(
        InstanceId::new("farm_b"),
        BuildingTypeId::new("farm"),
        region(10, 10, 3, 3),
    );
    grid.reserve(farm.region());
    registry.add(farm).expect("add persists");

    let mut scene = RecordingScene::default();
    let mut session = DeletionSession::new();
    session.activate(&mut scene);

    for cell in [CellCoord::new(5, 5), CellCoord::new(12, 12)] {
        let outcome = session
            .try_delete_at(cell, &mut grid, &mut registry, &mut scene)
            .expect("deletion succeeds");
        assert!(matches!(outcome, DeletionOutcome::Deleted(_)));
    }

    assert!(registry.is_empty());
    assert_eq!(grid.occupied_count(), 0);
    assert!(session.is_active());
}

#[test]
fn persistence_failure_is_reported_after_removal() {
    let storage = MemoryStorage::new();
    let (mut grid, mut registry) = populated(&storage);
    let mut scene = RecordingScene::default();
    let mut session = DeletionSession::new();
    session.activate(&mut scene);
    storage.set_read_only(true);

    let result = session.try_delete_at(CellCoord::new(5, 6), &mut grid, &mut registry, &mut scene);

    assert!(matches!(result, Err(DeletionError::Persistence { .. })));
    assert!(registry.is_empty());
    assert_eq!(grid.occupied_count(), 0);
}

#[test]
fn deleting_an_unrendered_record_keeps_the_building_above_it_reserved() {
    let storage = MemoryStorage::new();
    let mut registry = BuildingRegistry::new(storage.clone());
    let mut grid = OccupancyGrid::new(40, 30);

    // Restored from disk with a type the catalog no longer knows: never reserved.
    registry
        .add(BuildingRecord::new(
            InstanceId::new("castle_1"),
            BuildingTypeId::new("castle"),
            region(5, 5, 2, 2),
        ))
        .expect("add persists");
    let house = BuildingRecord::new(
        InstanceId::new("house_a"),
        BuildingTypeId::new("house"),
        region(5, 5, 2, 2),
    );
    grid.reserve(house.region());
    registry.add(house).expect("add persists");
    assert!(registry.attach_visual(&InstanceId::new("house_a"), VisualHandle::new(3)));

    let mut scene = RecordingScene::default();
    let mut session = DeletionSession::new();
    session.activate(&mut scene);

    let outcome = session
        .try_delete_at(CellCoord::new(5, 5), &mut grid, &mut registry, &mut scene)
        .expect("deletion succeeds");

    let DeletionOutcome::Deleted(record) = outcome else {
        panic!("expected a deletion");
    };
    assert_eq!(record.instance_id(), &InstanceId::new("castle_1"));
    assert_eq!(grid.occupied_count(), 4);
    for (x, y) in [(5, 5), (5, 6), (6, 5), (6, 6)] {
        assert!(grid.is_occupied(CellCoord::new(x, y)));
    }
    assert!(!grid.can_place(region(4, 4, 3, 3)));
    assert!(scene.destroyed.is_empty());

    let second = session
        .try_delete_at(CellCoord::new(6, 6), &mut grid, &mut registry, &mut scene)
        .expect("deletion succeeds");
    assert!(matches!(second, DeletionOutcome::Deleted(_)));
    assert_eq!(grid.occupied_count(), 0);
    assert_eq!(scene.destroyed, vec![VisualHandle::new(3)]);
}
