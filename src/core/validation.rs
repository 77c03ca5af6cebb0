//! Validation for tuning values the generators and spawners rely on.

use super::config::{ConfigLoadError, HitboxSize, SimConfig};

/// One rejected tuning value.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigIssue {
    pub section: &'static str,
    pub field: &'static str,
    pub reason: &'static str,
}

impl std::fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{} {}", self.section, self.field, self.reason)
    }
}

/// Helper macro for checking a value is strictly positive (NaN fails too)
macro_rules! check_positive {
    ($issues:expr, $section:expr, $field:expr, $value:expr) => {
        if !($value > 0.0) {
            $issues.push(ConfigIssue {
                section: $section,
                field: $field,
                reason: "must be positive",
            });
        }
    };
}

/// Helper macro for checking a `min..=max` pair
macro_rules! check_range {
    ($issues:expr, $section:expr, $field:expr, $min:expr, $max:expr) => {
        if !($min <= $max) {
            $issues.push(ConfigIssue {
                section: $section,
                field: $field,
                reason: "min must not exceed max",
            });
        }
    };
}

fn check_hitbox(issues: &mut Vec<ConfigIssue>, field: &'static str, hitbox: HitboxSize) {
    if !(hitbox.width > 0.0 && hitbox.height > 0.0) {
        issues.push(ConfigIssue {
            section: "movement",
            field,
            reason: "must have a positive width and height",
        });
    }
}

/// Check every value that would stall terrain generation or make a random
/// range empty. Returns the issues found, empty if the config is usable.
pub fn validate_config(config: &SimConfig) -> Vec<ConfigIssue> {
    let mut issues = Vec::new();
    let world = &config.world;

    check_positive!(issues, "world", "width", world.width);
    check_positive!(issues, "world", "height", world.height);
    // Frontier loops advance by these each iteration.
    check_positive!(issues, "world", "tile_width", world.tile_width);
    check_positive!(issues, "world", "tile_height", world.tile_height);
    check_positive!(issues, "world", "platform_spacing_min", world.platform_spacing_min);
    check_range!(
        issues,
        "world",
        "platform_spacing_min",
        world.platform_spacing_min,
        world.platform_spacing_max
    );
    check_positive!(issues, "world", "platform_width_min", world.platform_width_min);
    check_range!(
        issues,
        "world",
        "platform_width_min",
        world.platform_width_min,
        world.platform_width_max
    );
    check_positive!(issues, "world", "platform_height", world.platform_height);
    check_range!(
        issues,
        "world",
        "enemy_speed_bonus_min",
        world.enemy_speed_bonus_min,
        world.enemy_speed_bonus_max
    );
    check_positive!(issues, "world", "enemy_spawn_interval", world.enemy_spawn_interval);
    check_positive!(issues, "world", "ally_spawn_interval", world.ally_spawn_interval);

    let movement = &config.movement;
    check_hitbox(&mut issues, "standing_hitbox", movement.standing_hitbox);
    check_hitbox(&mut issues, "crouch_hitbox", movement.crouch_hitbox);
    check_hitbox(&mut issues, "hang_hitbox", movement.hang_hitbox);

    check_positive!(issues, "physics", "max_fall_speed", config.physics.max_fall_speed);

    let combat = &config.combat;
    check_positive!(issues, "combat", "enemy_size", combat.enemy_size);
    check_positive!(issues, "combat", "flyer_size", combat.flyer_size);

    issues
}

impl SimConfig {
    /// Reject tuning the simulation cannot run with.
    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        let issues = validate_config(self);
        if issues.is_empty() {
            return Ok(());
        }
        let message = issues
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        Err(ConfigLoadError {
            file: "tuning".to_string(),
            message: format!("Validation failed: {}", message),
        })
    }
}
