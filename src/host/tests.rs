//! Host domain: tests for the scripted pilot, clip timing and restart countdown.

use bevy::prelude::*;

use super::*;
use crate::character::{CharacterFlags, CommandSet, Facing, Role};
use crate::core::Ability;
use crate::registry::{EnemyKind, EntityId};
use crate::sim::{CharacterSnapshot, EnemySnapshot, FrameSnapshot};

fn row(id: u32, role: Role, flags: CharacterFlags) -> CharacterSnapshot {
    CharacterSnapshot {
        id: EntityId(id),
        role,
        x: 480.0,
        y: 482.0,
        vx: 0.0,
        vy: 0.0,
        facing: Facing::Right,
        flags: flags.bits(),
        width: 24.0,
        height: 36.0,
        grappling: false,
        anchor: None,
    }
}

fn walker(x: f32, y: f32) -> EnemySnapshot {
    EnemySnapshot {
        id: EntityId(99),
        kind: EnemyKind::Walker,
        x,
        y,
        size: 35.0,
    }
}

fn frame(characters: Vec<CharacterSnapshot>, enemies: Vec<EnemySnapshot>) -> FrameSnapshot {
    FrameSnapshot {
        characters,
        enemies,
        ..default()
    }
}

// -----------------------------------------------------------------------------
// Autopilot tests
// -----------------------------------------------------------------------------

#[test]
fn test_pilot_runs_right_on_open_ground() {
    let snapshot = frame(vec![row(1, Role::Player, CharacterFlags::GROUNDED)], vec![]);
    let commands = Autopilot::default().plan(&snapshot);
    assert_eq!(commands.horizontal(), 1.0);
    assert!(!commands.jump && !commands.attack);
}

#[test]
fn test_pilot_strikes_enemy_in_reach() {
    let snapshot = frame(
        vec![row(1, Role::Player, CharacterFlags::GROUNDED)],
        vec![walker(530.0, 482.0)],
    );
    let commands = Autopilot::default().plan(&snapshot);
    assert!(commands.attack);
    assert!(!commands.jump);
}

#[test]
fn test_pilot_hops_toward_enemy_out_of_reach() {
    let snapshot = frame(
        vec![row(1, Role::Player, CharacterFlags::GROUNDED)],
        vec![walker(600.0, 482.0)],
    );
    let commands = Autopilot::default().plan(&snapshot);
    assert!(commands.jump);
    assert!(!commands.attack);
}

#[test]
fn test_pilot_ignores_enemies_behind_or_out_of_lane() {
    let snapshot = frame(
        vec![row(1, Role::Player, CharacterFlags::GROUNDED)],
        vec![walker(440.0, 482.0), walker(520.0, 300.0)],
    );
    let commands = Autopilot::default().plan(&snapshot);
    assert!(!commands.attack && !commands.jump);
}

#[test]
fn test_pilot_climbs_from_hang() {
    let flags = CharacterFlags::WALL_HANGING | CharacterFlags::WALL_LEFT;
    let snapshot = frame(vec![row(1, Role::Player, flags)], vec![]);
    let commands = Autopilot::default().plan(&snapshot);
    assert_eq!(commands.horizontal(), -1.0);
    assert!(commands.holding_up());
}

#[test]
fn test_pilot_idle_when_dead_or_missing() {
    let pilot = Autopilot::default();
    let dead = frame(vec![row(1, Role::Player, CharacterFlags::DEAD)], vec![]);
    assert_eq!(pilot.plan(&dead), CommandSet::default());

    let only_ally = frame(
        vec![row(2, Role::Companion { slot: 0 }, CharacterFlags::GROUNDED)],
        vec![],
    );
    assert_eq!(pilot.plan(&only_ally), CommandSet::default());
}

// -----------------------------------------------------------------------------
// Animation clock tests
// -----------------------------------------------------------------------------

#[test]
fn test_clip_finishes_after_its_length() {
    let clips = AbilityClips::default();
    let mut clock = AnimationClock::default();
    let snapshot = frame(vec![row(1, Role::Player, CharacterFlags::ATTACKING)], vec![]);

    assert!(clock.advance(&snapshot, 0.2, &clips).is_empty());
    let done = clock.advance(&snapshot, 0.2, &clips);
    assert_eq!(done.len(), 1);
    assert_eq!(done[0].character, EntityId(1));
    assert_eq!(done[0].ability, Ability::Attack);
    assert_eq!(clock.playing(), 0);
}

#[test]
fn test_clip_forgotten_when_flag_clears() {
    let clips = AbilityClips::default();
    let mut clock = AnimationClock::default();
    let rolling = frame(vec![row(1, Role::Player, CharacterFlags::ROLLING)], vec![]);
    let idle = frame(vec![row(1, Role::Player, CharacterFlags::GROUNDED)], vec![]);

    clock.advance(&rolling, 0.3, &clips);
    assert_eq!(clock.playing(), 1);
    clock.advance(&idle, 0.3, &clips);
    assert_eq!(clock.playing(), 0);

    // A fresh roll starts its clip from zero.
    assert!(clock.advance(&rolling, 0.3, &clips).is_empty());
}

#[test]
fn test_clips_tracked_per_character_and_ability() {
    let clips = AbilityClips::default();
    let mut clock = AnimationClock::default();
    let snapshot = frame(
        vec![
            row(1, Role::Player, CharacterFlags::ATTACKING | CharacterFlags::TURNING),
            row(2, Role::Companion { slot: 0 }, CharacterFlags::ROLLING),
        ],
        vec![],
    );

    let done = clock.advance(&snapshot, 0.2, &clips);
    assert_eq!(done.len(), 1);
    assert_eq!(done[0].ability, Ability::Turn);
    assert_eq!(clock.playing(), 2);
}

// -----------------------------------------------------------------------------
// Restart countdown tests
// -----------------------------------------------------------------------------

#[test]
fn test_countdown_fires_once() {
    let mut countdown = RestartCountdown::default();
    assert!(!countdown.tick(1.0));

    countdown.start(0.5);
    assert!(countdown.is_pending());
    assert!(!countdown.tick(0.3));
    assert!(countdown.tick(0.3));
    assert!(!countdown.is_pending());
    assert!(!countdown.tick(0.3));
}
