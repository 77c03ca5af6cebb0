//! Terrain domain: tests for seeding, break line culling and frontier fill.

use bevy::prelude::*;

use super::*;
use crate::core::WorldConfig;
use crate::registry::{EntityRegistry, Platform};

const DT: f32 = 1.0 / 60.0;

fn seeded(config: &WorldConfig) -> (TerrainScroller, EntityRegistry) {
    let mut scroller = TerrainScroller::new(7);
    let mut registry = EntityRegistry::default();
    scroller.seed_initial(&mut registry, config);
    (scroller, registry)
}

fn tiles(registry: &EntityRegistry) -> Vec<(f32, f32)> {
    let mut tiles: Vec<(f32, f32)> = registry
        .placed::<Platform>()
        .filter(|(_, _, platform)| platform.is_ground)
        .map(|(_, pos, _)| (pos.0.x, pos.0.y))
        .collect();
    tiles.sort_by(|a, b| a.0.total_cmp(&b.0));
    tiles
}

fn floating(registry: &EntityRegistry) -> Vec<(Vec2, Platform)> {
    let mut platforms: Vec<(Vec2, Platform)> = registry
        .placed::<Platform>()
        .filter(|(_, _, platform)| !platform.is_ground)
        .map(|(_, pos, platform)| (pos.0, platform))
        .collect();
    platforms.sort_by(|a, b| a.0.x.total_cmp(&b.0.x));
    platforms
}

// -----------------------------------------------------------------------------
// Seeding tests
// -----------------------------------------------------------------------------

#[test]
fn test_seed_lays_ground_across_view() {
    let config = WorldConfig::default();
    let (scroller, registry) = seeded(&config);

    let tiles = tiles(&registry);
    assert_eq!(tiles.len(), 14);
    assert_eq!(tiles[0], (40.0, 525.0));
    assert_eq!(scroller.frontier(), 1120.0);
    assert_eq!(scroller.break_x(), 0.0);
}

#[test]
fn test_seed_platforms_within_band() {
    let config = WorldConfig::default();
    let (scroller, registry) = seeded(&config);

    let platforms = floating(&registry);
    assert!(!platforms.is_empty());
    assert_eq!(platforms[0].0.x, 576.0);
    for (center, platform) in &platforms {
        assert!(center.y >= 150.0 && center.y <= 400.0, "y={}", center.y);
        assert!(platform.width >= 100.0 && platform.width <= 200.0);
        assert_eq!(platform.height, 24.0);
        assert!(center.x < 1360.0);
    }
    for pair in platforms.windows(2) {
        assert!(pair[1].0.x - pair[0].0.x >= 149.9);
    }
    assert_eq!(scroller.platform_frontier(), platforms[platforms.len() - 1].0.x);
}

#[test]
fn test_same_seed_same_layout() {
    let config = WorldConfig::default();
    let (_, a) = seeded(&config);
    let (_, b) = seeded(&config);
    assert_eq!(floating(&a), floating(&b));
}

// -----------------------------------------------------------------------------
// Scrolling tests
// -----------------------------------------------------------------------------

#[test]
fn test_ten_seconds_of_break_line() {
    let config = WorldConfig::default();
    let (mut scroller, mut registry) = seeded(&config);

    let mut spawned = 0;
    let mut destroyed = 0;
    for _ in 0..600 {
        let lead_x = config.player_spawn_x + scroller.break_x();
        let report = scroller.update(DT, lead_x, &mut registry, &config);
        spawned += report.spawned_tiles;
        destroyed += report.destroyed_tiles;
    }

    let break_x = scroller.break_x();
    assert!((break_x - 600.0).abs() < 0.1, "break_x={}", break_x);

    for (x, _) in tiles(&registry) {
        assert!(x + config.tile_width * 0.5 >= break_x);
    }
    for (center, platform) in floating(&registry) {
        assert!(center.x + platform.width * 0.5 >= break_x);
    }
    assert!(destroyed >= 7);
    assert!(spawned >= destroyed);
    assert!(scroller.frontier() >= config.player_spawn_x + break_x + config.tile_lookahead - 5.0);
}

#[test]
fn test_tiles_never_overlap() {
    let config = WorldConfig::default();
    let (mut scroller, mut registry) = seeded(&config);
    for step in 0..300 {
        scroller.update(DT, 480.0 + step as f32 * 3.0, &mut registry, &config);
    }

    let tiles = tiles(&registry);
    for pair in tiles.windows(2) {
        assert_eq!(pair[1].0 - pair[0].0, config.tile_width);
    }
}

#[test]
fn test_culled_platforms_are_reported() {
    let config = WorldConfig::default();
    let mut scroller = TerrainScroller::new(1);
    let mut registry = EntityRegistry::default();
    let doomed = registry.spawn_platform(
        Vec2::new(10.0, 300.0),
        Platform {
            width: 100.0,
            height: 24.0,
            is_ground: false,
        },
    );

    // 61 units of break line puts the right edge (60) behind it.
    let report = scroller.update(61.0 / config.break_rate, 480.0, &mut registry, &config);
    assert_eq!(report.destroyed_platforms, vec![doomed]);
    assert!(!registry.is_alive(doomed));
}

#[test]
fn test_break_line_never_recedes() {
    let config = WorldConfig::default();
    let (mut scroller, mut registry) = seeded(&config);
    scroller.update(1.0, 480.0, &mut registry, &config);
    let before = scroller.break_x();
    scroller.update(-1.0, 480.0, &mut registry, &config);
    assert_eq!(scroller.break_x(), before);
}

#[test]
fn test_reset_returns_to_origin() {
    let config = WorldConfig::default();
    let (mut scroller, mut registry) = seeded(&config);
    scroller.update(5.0, 900.0, &mut registry, &config);
    assert!(scroller.break_x() > 0.0);

    scroller.reset();
    assert_eq!(scroller.break_x(), 0.0);
    assert_eq!(scroller.frontier(), 0.0);
    assert_eq!(scroller.platform_frontier(), 0.0);

    let mut fresh = EntityRegistry::default();
    scroller.seed_initial(&mut fresh, &config);
    let (_, reference) = seeded(&config);
    assert_eq!(floating(&fresh), floating(&reference));
}
