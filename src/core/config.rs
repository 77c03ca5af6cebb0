//! Core domain: tuning for the world, characters, physics probes and combat.
//!
//! Every value has a default matching the shipped game feel. A RON file can
//! override any subset of fields; missing fields fall back to the defaults.

use bevy::prelude::*;
use ron::Options;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Default location of the optional tuning override file.
pub const DEFAULT_CONFIG_PATH: &str = "assets/config/simulation.ron";

/// Error type for configuration loading failures.
#[derive(Debug)]
pub struct ConfigLoadError {
    pub file: String,
    pub message: String,
}

impl std::fmt::Display for ConfigLoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Failed to load {}: {}", self.file, self.message)
    }
}

impl std::error::Error for ConfigLoadError {}

/// Width and height of an axis-aligned hitbox.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HitboxSize {
    pub width: f32,
    pub height: f32,
}

impl HitboxSize {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    pub fn half_height(&self) -> f32 {
        self.height * 0.5
    }
}

/// Complete tuning for one simulation instance.
#[derive(Resource, Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub world: WorldConfig,
    pub movement: MovementConfig,
    pub physics: PhysicsConfig,
    pub combat: CombatConfig,
    pub steering: SteeringConfig,
}

/// World layout, terrain generation and spawn pacing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Visible width; spawn distances are measured from it.
    pub width: f32,
    pub height: f32,
    /// Y of the top surface of the ground tiles (world is Y-down).
    pub ground_y: f32,
    /// Units per second the break line advances.
    pub break_rate: f32,
    pub tile_width: f32,
    pub tile_height: f32,
    /// Ground tiles are kept generated this far ahead of the lead character.
    pub tile_lookahead: f32,
    /// Platforms are kept generated this far ahead of the lead character.
    pub platform_lookahead: f32,
    /// First platform column, as a fraction of the view width.
    pub platform_start_factor: f32,
    /// Initial platforms extend this far beyond the right edge of the view.
    pub initial_platform_extent: f32,
    pub platform_width_min: f32,
    pub platform_width_max: f32,
    pub platform_height: f32,
    pub platform_spacing_min: f32,
    pub platform_spacing_max: f32,
    /// Highest platform center, as a fraction of the view height.
    pub platform_band_top_factor: f32,
    /// Lowest platform center sits this far above the ground surface.
    pub platform_floor_clearance: f32,
    pub player_spawn_x: f32,
    pub enemy_spawn_interval: f32,
    /// Enemies appear this far beyond the right edge of the view.
    pub enemy_spawn_ahead: f32,
    pub enemy_speed_bonus_min: f32,
    pub enemy_speed_bonus_max: f32,
    pub enemy_cull_margin: f32,
    pub ally_spawn_interval: f32,
    pub max_allies: usize,
    /// Allies spawn this far behind the player.
    pub ally_spawn_offset: f32,
    /// An ally spawn point must be at least this far ahead of the break line.
    pub ally_spawn_margin: f32,
    pub ally_cull_margin: f32,
    /// Characters below `height + fall_margin` are out of the world.
    pub fall_margin: f32,
    pub seed: u64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: 960.0,
            height: 600.0,
            ground_y: 500.0,
            break_rate: 60.0,
            tile_width: 80.0,
            tile_height: 50.0,
            tile_lookahead: 1360.0,
            platform_lookahead: 1260.0,
            platform_start_factor: 0.6,
            initial_platform_extent: 400.0,
            platform_width_min: 100.0,
            platform_width_max: 200.0,
            platform_height: 24.0,
            platform_spacing_min: 150.0,
            platform_spacing_max: 300.0,
            platform_band_top_factor: 0.25,
            platform_floor_clearance: 100.0,
            player_spawn_x: 480.0,
            enemy_spawn_interval: 3.0,
            enemy_spawn_ahead: 100.0,
            enemy_speed_bonus_min: 20.0,
            enemy_speed_bonus_max: 60.0,
            enemy_cull_margin: 50.0,
            ally_spawn_interval: 20.0,
            max_allies: 3,
            ally_spawn_offset: 150.0,
            ally_spawn_margin: 50.0,
            ally_cull_margin: 100.0,
            fall_margin: 100.0,
            seed: 0x5eed,
        }
    }
}

impl WorldConfig {
    /// Characters whose center passes this Y have fallen out of the world.
    pub fn fall_limit(&self) -> f32 {
        self.height + self.fall_margin
    }
}

/// Character locomotion and ability tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    pub max_speed: f32,
    pub accel: f32,
    pub decel: f32,
    /// Deceleration multiplier applied while airborne.
    pub air_decel_factor: f32,
    pub crouch_speed_factor: f32,
    pub jump_impulse: f32,
    pub wall_jump_factor: f32,
    pub wall_kick: f32,
    pub climb_up_speed: f32,
    pub climb_forward_speed: f32,
    /// Instant upward nudge applied when climbing out of a hang.
    pub climb_lift: f32,
    pub drop_fall_speed: f32,
    pub drop_push: f32,
    pub roll_speed: f32,
    pub roll_cooldown: f32,
    /// Horizontal speed after a roll is clamped to this fraction of `max_speed`.
    pub roll_exit_factor: f32,
    /// Below this horizontal speed a reversal counts as a standing turn.
    pub turn_speed_threshold: f32,
    /// Grounded horizontal speed below this snaps to zero.
    pub friction_cutoff: f32,
    /// Seconds after a climb during which ledges cannot be grabbed.
    pub climb_debounce: f32,
    /// Seconds after a drop during which ledges cannot be grabbed.
    pub drop_debounce: f32,
    pub standing_hitbox: HitboxSize,
    pub crouch_hitbox: HitboxSize,
    pub hang_hitbox: HitboxSize,
    /// Distance between the ledge surface and the top of the hang hitbox.
    pub hand_offset: f32,
    pub grapple_max_distance: f32,
    /// Margin around a platform that still counts as a grapple hit.
    pub grapple_padding: f32,
    /// Angular velocity multiplier applied every swing step.
    pub swing_damping: f32,
    pub release_boost: f32,
    /// Extra upward speed when releasing on the rising half of a swing.
    pub release_lift: f32,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            max_speed: 260.0,
            accel: 1400.0,
            decel: 1600.0,
            air_decel_factor: 0.3,
            crouch_speed_factor: 0.4,
            jump_impulse: 480.0,
            wall_jump_factor: 0.9,
            wall_kick: 350.0,
            climb_up_speed: 300.0,
            climb_forward_speed: 200.0,
            climb_lift: 20.0,
            drop_fall_speed: 50.0,
            drop_push: 30.0,
            roll_speed: 500.0,
            roll_cooldown: 0.5,
            roll_exit_factor: 0.5,
            turn_speed_threshold: 10.0,
            friction_cutoff: 10.0,
            climb_debounce: 0.3,
            drop_debounce: 0.4,
            standing_hitbox: HitboxSize::new(24.0, 36.0),
            crouch_hitbox: HitboxSize::new(24.0, 24.0),
            hang_hitbox: HitboxSize::new(20.0, 28.0),
            hand_offset: 10.0,
            grapple_max_distance: 400.0,
            grapple_padding: 20.0,
            swing_damping: 0.995,
            release_boost: 1.3,
            release_lift: 100.0,
        }
    }
}

/// Engine-facing tuning: gravity, fall cap and contact probe lengths.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    pub gravity: f32,
    pub max_fall_speed: f32,
    pub ground_probe: f32,
    pub ceiling_probe: f32,
    pub wall_probe: f32,
    /// How far above the top of the hitbox a ledge surface may still be grabbed.
    pub ledge_reach: f32,
    /// Minimum |normal| component along an axis for a contact to count on it.
    pub normal_cone: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: 980.0,
            max_fall_speed: 600.0,
            ground_probe: 4.0,
            ceiling_probe: 2.0,
            wall_probe: 8.0,
            ledge_reach: 8.0,
            normal_cone: 0.7,
        }
    }
}

/// Melee and scoring tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    pub sword_width: f32,
    pub sword_height: f32,
    /// Gap between the character center and the near edge of the sword box.
    pub sword_offset_x: f32,
    pub sword_offset_y: f32,
    pub enemy_size: f32,
    pub flyer_size: f32,
    pub kill_points: u32,
    /// Points accrued per second survived.
    pub score_rate: f32,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            sword_width: 45.0,
            sword_height: 30.0,
            sword_offset_x: 8.0,
            sword_offset_y: -5.0,
            enemy_size: 35.0,
            flyer_size: 28.0,
            kill_points: 50,
            score_rate: 10.0,
        }
    }
}

/// Companion steering defaults and per-slot spread.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SteeringConfig {
    pub behavior: BehaviorConfig,
    /// Trailing distance for the first companion slot.
    pub follow_base: f32,
    /// Extra trailing distance per additional companion slot.
    pub follow_step: f32,
    pub companion_attack_range: f32,
}

impl Default for SteeringConfig {
    fn default() -> Self {
        Self {
            behavior: BehaviorConfig::default(),
            follow_base: 80.0,
            follow_step: 40.0,
            companion_attack_range: 120.0,
        }
    }
}

impl SteeringConfig {
    /// Behavior for the companion occupying `slot` (0-based).
    pub fn companion_behavior(&self, slot: usize) -> BehaviorConfig {
        BehaviorConfig {
            follow_distance: self.follow_base + self.follow_step * slot as f32,
            attack_range: self.companion_attack_range,
            ..self.behavior.clone()
        }
    }
}

/// Follow-and-engage policy knobs for one companion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    pub follow_distance: f32,
    pub min_distance: f32,
    pub attack_range: f32,
    pub enemy_search_range: f32,
    pub grapple_chance: f32,
    pub roll_chance: f32,
    pub roll_cooldown: f32,
    pub grapple_cooldown: f32,
    pub retarget_interval: f32,
    /// Hysteresis: start closing in beyond this distance from the ideal spot.
    pub start_move_distance: f32,
    /// Hysteresis: stop once inside this distance of the ideal spot.
    pub stop_move_distance: f32,
    pub gap_lookahead: f32,
    pub obstacle_lookahead: f32,
    pub roll_dodge_range: f32,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            follow_distance: 150.0,
            min_distance: 80.0,
            attack_range: 100.0,
            enemy_search_range: 300.0,
            grapple_chance: 0.4,
            roll_chance: 0.4,
            roll_cooldown: 2.0,
            grapple_cooldown: 3.0,
            retarget_interval: 0.5,
            start_move_distance: 40.0,
            stop_move_distance: 20.0,
            gap_lookahead: 80.0,
            obstacle_lookahead: 60.0,
            roll_dodge_range: 60.0,
        }
    }
}

/// Create RON options with extensions enabled for more flexible parsing.
fn ron_options() -> Options {
    Options::default().with_default_extension(ron::extensions::Extensions::IMPLICIT_SOME)
}

/// Parse a config from RON text. `source` names the origin in errors.
pub fn parse_config(source: &str, contents: &str) -> Result<SimConfig, ConfigLoadError> {
    let config: SimConfig = ron_options()
        .from_str(contents)
        .map_err(|e| ConfigLoadError {
            file: source.to_string(),
            message: format!("Parse error: {}", e),
        })?;
    config.validate().map_err(|e| ConfigLoadError {
        file: source.to_string(),
        ..e
    })?;
    Ok(config)
}

/// Load a config from a RON file.
pub fn load_config(path: &Path) -> Result<SimConfig, ConfigLoadError> {
    let file_name = path.display().to_string();
    let contents = fs::read_to_string(path).map_err(|e| ConfigLoadError {
        file: file_name.clone(),
        message: format!("IO error: {}", e),
    })?;
    parse_config(&file_name, &contents)
}

/// Load the config at `path`, falling back to defaults when it is absent or invalid.
pub fn load_or_default(path: &Path) -> SimConfig {
    if !path.exists() {
        info!("No tuning file at {}, using defaults", path.display());
        return SimConfig::default();
    }

    match load_config(path) {
        Ok(config) => {
            info!("Loaded tuning from {}", path.display());
            config
        }
        Err(e) => {
            warn!("{}; using defaults", e);
            SimConfig::default()
        }
    }
}
