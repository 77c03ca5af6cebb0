//! Registry domain: tests for entity lifecycle, columns and queries.

use bevy::math::Vec2;

use super::{Column, Enemy, EnemyKind, EntityId, EntityRegistry, Platform, Position, Table, Velocity};

fn tile() -> Platform {
    Platform {
        width: 80.0,
        height: 50.0,
        is_ground: true,
    }
}

// -----------------------------------------------------------------------------
// Column tests
// -----------------------------------------------------------------------------

#[test]
fn test_column_insert_overwrites() {
    let mut column = Column::default();
    column.insert(EntityId(1), 10);
    column.insert(EntityId(1), 20);
    assert_eq!(column.len(), 1);
    assert_eq!(column.get(EntityId(1)), Some(&20));
}

#[test]
fn test_column_remove_keeps_index_consistent() {
    let mut column = Column::default();
    for i in 0..4 {
        column.insert(EntityId(i), i * 10);
    }

    assert_eq!(column.remove(EntityId(1)), Some(10));
    assert_eq!(column.remove(EntityId(1)), None);

    // The row that was swapped into the hole is still found by id.
    for i in [0, 2, 3] {
        assert_eq!(column.get(EntityId(i)), Some(&(i * 10)));
    }
    assert_eq!(column.len(), 3);
}

// -----------------------------------------------------------------------------
// Registry lifecycle tests
// -----------------------------------------------------------------------------

#[test]
fn test_ids_are_unique_and_not_reused() {
    let mut registry = EntityRegistry::default();
    let a = registry.create();
    registry.destroy(a);
    let b = registry.create();
    assert_ne!(a, b);
    assert!(!registry.is_alive(a));
    assert!(registry.is_alive(b));
}

#[test]
fn test_destroy_invalidates_all_rows() {
    let mut registry = EntityRegistry::default();
    let id = registry.spawn_enemy(
        Vec2::new(100.0, 50.0),
        Enemy {
            kind: EnemyKind::Walker,
            speed: 90.0,
        },
    );
    assert!(registry.has::<Position>(id));
    assert!(registry.has::<Velocity>(id));
    assert!(registry.has::<Enemy>(id));

    registry.destroy(id);

    assert!(registry.get::<Position>(id).is_none());
    assert!(registry.get::<Velocity>(id).is_none());
    assert!(registry.get::<Enemy>(id).is_none());
    assert!(registry.query(Table::Enemy).is_empty());
}

#[test]
fn test_add_to_dead_entity_is_ignored() {
    let mut registry = EntityRegistry::default();
    let id = registry.create();
    registry.destroy(id);
    registry.add(id, Position(Vec2::ZERO));
    assert!(registry.query(Table::Position).is_empty());
}

#[test]
fn test_destroy_twice_is_harmless() {
    let mut registry = EntityRegistry::default();
    let id = registry.create();
    registry.destroy(id);
    registry.destroy(id);
    assert!(registry.is_empty());
}

// -----------------------------------------------------------------------------
// Query tests
// -----------------------------------------------------------------------------

#[test]
fn test_query_follows_insertion_order() {
    let mut registry = EntityRegistry::default();
    let ids: Vec<EntityId> = (0..5)
        .map(|i| registry.spawn_platform(Vec2::new(i as f32 * 80.0, 525.0), tile()))
        .collect();

    assert_eq!(registry.query(Table::Platform), ids);
}

#[test]
fn test_query_after_destroy_holds_survivors() {
    let mut registry = EntityRegistry::default();
    let ids: Vec<EntityId> = (0..5)
        .map(|i| registry.spawn_platform(Vec2::new(i as f32 * 80.0, 525.0), tile()))
        .collect();
    registry.destroy(ids[1]);
    registry.destroy(ids[3]);

    let mut remaining = registry.query(Table::Platform);
    remaining.sort();
    assert_eq!(remaining, vec![ids[0], ids[2], ids[4]]);
}

#[test]
fn test_get_mut_writes_through() {
    let mut registry = EntityRegistry::default();
    let id = registry.create();
    registry.add(id, Velocity(Vec2::new(1.0, 2.0)));
    if let Some(vel) = registry.get_mut::<Velocity>(id) {
        vel.0.x = 5.0;
    }
    assert_eq!(registry.get::<Velocity>(id), Some(&Velocity(Vec2::new(5.0, 2.0))));
}

#[test]
fn test_placed_skips_rows_without_position() {
    let mut registry = EntityRegistry::default();
    let placed = registry.spawn_platform(Vec2::new(40.0, 525.0), tile());
    let floating = registry.create();
    registry.add(floating, tile());

    let found: Vec<EntityId> = registry.placed::<Platform>().map(|(id, _, _)| id).collect();
    assert_eq!(found, vec![placed]);
}

#[test]
fn test_clear_keeps_ids_monotonic() {
    let mut registry = EntityRegistry::default();
    let before = registry.create();
    registry.clear();
    let after = registry.create();
    assert!(after > before);
    assert_eq!(registry.len(), 1);
}
