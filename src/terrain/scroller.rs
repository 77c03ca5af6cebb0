//! Terrain domain: break line advance, frontier fill and culling.

use bevy::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::core::WorldConfig;
use crate::registry::{EntityId, EntityRegistry, Platform};

/// What one scroll step changed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScrollReport {
    /// Floating platforms culled this step. Any grapple anchored to one of
    /// these must be released before swings are integrated.
    pub destroyed_platforms: Vec<EntityId>,
    pub spawned_platforms: usize,
    pub spawned_tiles: usize,
    pub destroyed_tiles: usize,
}

/// Owns the break line and both generation frontiers.
#[derive(Debug, Clone)]
pub struct TerrainScroller {
    break_x: f32,
    /// Right edge of the rightmost ground tile.
    tile_frontier: f32,
    /// X of the most recently placed floating platform.
    platform_frontier: f32,
    seed: u64,
    rng: ChaCha8Rng,
}

impl TerrainScroller {
    pub fn new(seed: u64) -> Self {
        Self {
            break_x: 0.0,
            tile_frontier: 0.0,
            platform_frontier: 0.0,
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn break_x(&self) -> f32 {
        self.break_x
    }

    pub fn frontier(&self) -> f32 {
        self.tile_frontier
    }

    pub fn platform_frontier(&self) -> f32 {
        self.platform_frontier
    }

    /// Back to the origin with the initial random sequence.
    pub fn reset(&mut self) {
        *self = Self::new(self.seed);
    }

    /// Lay the starting ground across the view plus two spare tiles, and the
    /// first band of platforms starting part way across the view.
    pub fn seed_initial(&mut self, registry: &mut EntityRegistry, config: &WorldConfig) {
        let tiles = (config.width / config.tile_width).ceil() as usize + 2;
        for _ in 0..tiles {
            self.spawn_tile(registry, config);
        }

        let mut x = config.width * config.platform_start_factor;
        while x < config.width + config.initial_platform_extent {
            self.spawn_platform(registry, config, x);
            self.platform_frontier = x;
            x += self.spacing(config);
        }

        info!(
            "Seeded terrain: {} ground tiles to x={:.0}, platforms to x={:.0}",
            tiles, self.tile_frontier, self.platform_frontier
        );
    }

    /// Advance the break line by `dt`, fill both frontiers ahead of `lead_x`
    /// and cull terrain whose trailing edge is behind the break line.
    pub fn update(
        &mut self,
        dt: f32,
        lead_x: f32,
        registry: &mut EntityRegistry,
        config: &WorldConfig,
    ) -> ScrollReport {
        let mut report = ScrollReport::default();

        if dt > 0.0 {
            self.break_x += config.break_rate * dt;
        }

        self.tile_frontier = self.tile_frontier.max(self.break_x);
        while self.tile_frontier < lead_x + config.tile_lookahead {
            self.spawn_tile(registry, config);
            report.spawned_tiles += 1;
        }

        self.platform_frontier = self.platform_frontier.max(self.break_x);
        while self.platform_frontier < lead_x + config.platform_lookahead {
            self.platform_frontier += self.spacing(config);
            self.spawn_platform(registry, config, self.platform_frontier);
            report.spawned_platforms += 1;
        }

        let crumbled: Vec<(EntityId, bool)> = registry
            .placed::<Platform>()
            .filter(|(_, pos, platform)| pos.0.x + platform.width * 0.5 < self.break_x)
            .map(|(id, _, platform)| (id, platform.is_ground))
            .collect();

        for (id, is_ground) in crumbled {
            registry.destroy(id);
            if is_ground {
                report.destroyed_tiles += 1;
            } else {
                report.destroyed_platforms.push(id);
            }
        }

        if report.destroyed_tiles > 0 || !report.destroyed_platforms.is_empty() {
            debug!(
                "Break line at x={:.0}: {} tiles and {} platforms crumbled",
                self.break_x,
                report.destroyed_tiles,
                report.destroyed_platforms.len()
            );
        }

        report
    }

    fn spawn_tile(&mut self, registry: &mut EntityRegistry, config: &WorldConfig) -> EntityId {
        let center = Vec2::new(
            self.tile_frontier + config.tile_width * 0.5,
            config.ground_y + config.tile_height * 0.5,
        );
        self.tile_frontier += config.tile_width;
        registry.spawn_platform(
            center,
            Platform {
                width: config.tile_width,
                height: config.tile_height,
                is_ground: true,
            },
        )
    }

    fn spawn_platform(&mut self, registry: &mut EntityRegistry, config: &WorldConfig, x: f32) -> EntityId {
        let width = self
            .rng
            .random_range(config.platform_width_min..=config.platform_width_max);
        let top = config.height * config.platform_band_top_factor;
        let bottom = (config.ground_y - config.platform_floor_clearance).max(top);
        let y = self.rng.random_range(top..=bottom);

        registry.spawn_platform(
            Vec2::new(x, y),
            Platform {
                width,
                height: config.platform_height,
                is_ground: false,
            },
        )
    }

    fn spacing(&mut self, config: &WorldConfig) -> f32 {
        self.rng
            .random_range(config.platform_spacing_min..=config.platform_spacing_max)
    }
}
