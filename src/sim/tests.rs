//! Sim domain: end-to-end frames against the deterministic backend.

use avian2d::prelude::{Gravity, LinearVelocity, PhysicsPlugins, RigidBody};
use bevy::asset::AssetPlugin;
use bevy::ecs::system::RunSystemOnce;
use bevy::prelude::*;
use bevy::scene::ScenePlugin;
use bevy::state::app::StatesPlugin;
use bevy::time::TimeUpdateStrategy;
use bevy::transform::TransformPlugin;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::*;
use crate::character::{CharacterFlags, CommandSet, GrappleCommand, GrappleState, Swing};
use crate::core::{Ability, AbilityAnimationComplete, LossReason, RunState, SimConfig, SimEvent};
use crate::physics::{Aabb, AvianBackend, AvianLinks, KinematicBackend, PhysicsBackend, StaticCollider};
use crate::registry::{Enemy, EnemyKind, EntityId, Platform, Position, Velocity};

const DT: f32 = 1.0 / 60.0;

fn world() -> (Simulation, KinematicBackend) {
    let config = SimConfig::default();
    let backend = KinematicBackend::new(Vec2::new(0.0, config.physics.gravity));
    let mut sim = Simulation::new(config);
    sim.initialize_physics();
    clear_floating(&mut sim);
    (sim, backend)
}

/// Remove the random platforms so a scenario controls its own geometry.
fn clear_floating(sim: &mut Simulation) {
    let ids: Vec<EntityId> = sim
        .registry()
        .placed::<Platform>()
        .filter(|(_, _, platform)| !platform.is_ground)
        .map(|(id, _, _)| id)
        .collect();
    for id in ids {
        sim.registry_mut().destroy(id);
    }
}

fn block(sim: &mut Simulation, center: Vec2, size: Vec2) -> EntityId {
    sim.registry_mut().spawn_platform(
        center,
        Platform {
            width: size.x,
            height: size.y,
            is_ground: false,
        },
    )
}

fn place(sim: &mut Simulation, id: EntityId, position: Vec2, velocity: Vec2) {
    sim.registry_mut().add(id, Position(position));
    sim.registry_mut().add(id, Velocity(velocity));
}

fn player(sim: &Simulation) -> EntityId {
    sim.player_id().expect("player exists")
}

fn ally(sim: &Simulation) -> EntityId {
    sim.companions().next().map(|c| c.id).expect("initial ally")
}

fn make_airborne(sim: &mut Simulation, id: EntityId) {
    if let Some(character) = sim.character_mut(id) {
        character.flags.remove(CharacterFlags::GROUNDED);
    }
}

fn walker_at(sim: &mut Simulation, position: Vec2) -> EntityId {
    sim.registry_mut().spawn_enemy(
        position,
        Enemy {
            kind: EnemyKind::Walker,
            speed: 80.0,
        },
    )
}

// -----------------------------------------------------------------------------
// World construction tests
// -----------------------------------------------------------------------------

#[test]
fn test_new_world_layout() {
    let sim = Simulation::new(SimConfig::default());
    let id = player(&sim);

    assert_eq!(sim.position(id), Some(Vec2::new(480.0, 482.0)));
    assert_eq!(sim.companions().count(), 1);
    assert_eq!(sim.position(ally(&sim)), Some(Vec2::new(330.0, 482.0)));
    assert!(sim.steering().is_registered(ally(&sim)));
    assert_eq!(sim.run_state(), RunState::Running);
    assert!(!sim.physics().is_ready());
}

#[test]
fn test_ally_cap_and_break_margin() {
    let (mut sim, _) = world();
    assert!(sim.spawn_ally().is_some());
    assert!(sim.spawn_ally().is_some());
    assert!(sim.spawn_ally().is_none());
    assert_eq!(sim.companions().count(), 3);
    assert_eq!(sim.steering().companion_count(), 3);

    let (mut sim, _) = world();
    let id = player(&sim);
    place(&mut sim, id, Vec2::new(150.0, 482.0), Vec2::ZERO);
    assert!(sim.spawn_ally().is_none());
}

// -----------------------------------------------------------------------------
// End-to-end scenarios
// -----------------------------------------------------------------------------

#[test]
fn test_first_step_moving_right_stays_grounded() {
    let (mut sim, mut backend) = world();
    let id = player(&sim);

    sim.set_player_commands(CommandSet::new(Vec2::new(1.0, 0.0)));
    sim.tick(&mut backend, DT);

    let velocity = sim.velocity(id).expect("velocity");
    let position = sim.position(id).expect("position");
    assert!(velocity.x > 0.0);
    assert!((position.y - 482.0).abs() < 1e-3, "y={}", position.y);
    assert!(sim.character(id).is_some_and(|c| c.has(CharacterFlags::GROUNDED)));
}

#[test]
fn test_airborne_at_ledge_hangs_and_freezes() {
    let (mut sim, mut backend) = world();
    let id = player(&sim);
    block(&mut sim, Vec2::new(600.0, 330.0), Vec2::new(40.0, 60.0));
    place(&mut sim, id, Vec2::new(568.0, 320.0), Vec2::ZERO);
    make_airborne(&mut sim, id);

    sim.tick(&mut backend, DT);

    let character = sim.character(id).expect("player");
    assert!(character.is_hanging());
    assert!(!character.has(CharacterFlags::GROUNDED));
    assert!(sim.physics().is_frozen(id));
    assert_eq!(backend.gravity_scale(id), Some(0.0));
    assert_eq!(backend.velocity(id), Some(Vec2::ZERO));
    // Ledge top 300, hang half height 14, hand offset 10.
    assert_eq!(sim.position(id).map(|p| p.y), Some(324.0));

    // Still pinned on the next frame.
    sim.tick(&mut backend, DT);
    assert!(sim.character(id).is_some_and(|c| c.is_hanging()));
    assert_eq!(sim.position(id).map(|p| p.y), Some(324.0));
    assert_eq!(backend.translation(id).map(|p| p.y), Some(324.0));
}

#[test]
fn test_drop_does_not_regrab_same_ledge() {
    let (mut sim, mut backend) = world();
    let id = player(&sim);
    block(&mut sim, Vec2::new(600.0, 330.0), Vec2::new(40.0, 60.0));
    place(&mut sim, id, Vec2::new(568.0, 320.0), Vec2::ZERO);
    make_airborne(&mut sim, id);
    sim.tick(&mut backend, DT);
    assert!(sim.character(id).is_some_and(|c| c.is_hanging()));

    sim.set_player_commands(CommandSet::new(Vec2::new(0.0, -1.0)));
    sim.tick(&mut backend, DT);
    sim.set_player_commands(CommandSet::default());

    for _ in 0..10 {
        let character = sim.character(id).expect("player");
        assert!(!character.is_hanging());
        assert!(!sim.physics().is_frozen(id));
        sim.tick(&mut backend, DT);
    }
}

#[test]
fn test_melee_kill_prevents_body_hit() {
    let (mut sim, mut backend) = world();
    let id = player(&sim);
    let enemy = walker_at(&mut sim, Vec2::new(495.0, 482.0));
    if let Some(character) = sim.character_mut(id) {
        character.flags.insert(CharacterFlags::ATTACKING);
    }

    sim.tick(&mut backend, DT);

    assert!(!sim.registry().is_alive(enemy));
    assert_eq!(sim.run_state(), RunState::Running);
    assert!(sim.character(id).is_some_and(|c| !c.is_dead()));
    assert!(sim.score() >= 50);

    let events = sim.drain_events();
    assert_eq!(events.len(), 1);
    assert!(matches!(
        events[0],
        SimEvent::EnemyKilled(killed) if killed.enemy == enemy && killed.by == id && killed.points == 50
    ));
}

#[test]
fn test_body_hit_ends_run() {
    let (mut sim, mut backend) = world();
    let id = player(&sim);
    walker_at(&mut sim, Vec2::new(495.0, 482.0));

    sim.tick(&mut backend, DT);

    assert_eq!(sim.run_state(), RunState::GameOver);
    assert!(sim.character(id).is_some_and(|c| c.is_dead()));
    let events = sim.drain_events();
    assert!(matches!(
        events.as_slice(),
        [SimEvent::GameOver(over)] if over.reason == LossReason::Enemy
    ));

    // Frames after game over change nothing.
    let frame = sim.frame();
    sim.tick(&mut backend, DT);
    assert_eq!(sim.frame(), frame);
}

#[test]
fn test_player_falling_out_ends_run() {
    let (mut sim, mut backend) = world();
    let id = player(&sim);
    place(&mut sim, id, Vec2::new(480.0, 800.0), Vec2::ZERO);
    make_airborne(&mut sim, id);

    sim.tick(&mut backend, DT);

    assert_eq!(sim.run_state(), RunState::GameOver);
    let events = sim.drain_events();
    assert!(matches!(
        events.as_slice(),
        [SimEvent::GameOver(over)] if over.reason == LossReason::FellOut
    ));
}

#[test]
fn test_ally_hit_is_removed_not_fatal() {
    let (mut sim, mut backend) = world();
    let companion = ally(&sim);
    // Airborne allies neither swing nor roll, so the walker lands its hit.
    make_airborne(&mut sim, companion);
    walker_at(&mut sim, Vec2::new(340.0, 482.0));

    sim.tick(&mut backend, DT);

    assert_eq!(sim.run_state(), RunState::Running);
    assert!(sim.character(companion).is_none());
    assert!(!sim.registry().is_alive(companion));
    assert!(!sim.steering().is_registered(companion));
    assert!(!sim.physics().has_body(companion));
    assert_eq!(backend.translation(companion), None);

    let events = sim.drain_events();
    assert!(matches!(
        events.as_slice(),
        [SimEvent::CompanionLost(lost)] if lost.character == companion && lost.reason == LossReason::Enemy
    ));
}

#[test]
fn test_ally_left_behind_break_line() {
    let (mut sim, mut backend) = world();
    let companion = ally(&sim);
    place(&mut sim, companion, Vec2::new(-150.0, 482.0), Vec2::ZERO);

    sim.tick(&mut backend, DT);

    assert!(sim.character(companion).is_none());
    let events = sim.drain_events();
    assert!(matches!(
        events.as_slice(),
        [SimEvent::CompanionLost(lost)] if lost.reason == LossReason::BehindBreak
    ));
}

// -----------------------------------------------------------------------------
// Grapple tests
// -----------------------------------------------------------------------------

#[test]
fn test_grapple_command_swings_then_jump_releases() {
    let (mut sim, mut backend) = world();
    let id = player(&sim);
    let anchor = block(&mut sim, Vec2::new(600.0, 300.0), Vec2::new(120.0, 24.0));
    place(&mut sim, id, Vec2::new(480.0, 400.0), Vec2::ZERO);
    make_airborne(&mut sim, id);

    sim.set_player_commands(CommandSet::default().with_grapple(GrappleCommand::Attach {
        target: Vec2::new(600.0, 300.0),
        platform: Some(anchor),
    }));
    sim.tick(&mut backend, DT);

    let character = sim.character(id).expect("player");
    assert!(character.is_swinging());
    assert_eq!(character.grapple.anchor(), Some(anchor));

    sim.set_player_commands(CommandSet::default().with_jump());
    sim.tick(&mut backend, DT);
    assert!(sim.character(id).is_some_and(|c| !c.is_swinging()));
    assert!(sim.physics().has_body(id));
}

#[test]
fn test_grapple_miss_changes_nothing() {
    let (mut sim, mut backend) = world();
    let (mut control, mut control_backend) = world();
    let id = player(&sim);

    sim.set_player_commands(CommandSet::default().with_grapple(GrappleCommand::Attach {
        target: Vec2::new(600.0, 200.0),
        platform: None,
    }));
    sim.tick(&mut backend, DT);
    control.tick(&mut control_backend, DT);

    let character = sim.character(id).expect("player");
    let untouched = control.character(id).expect("player");
    assert_eq!(character.grapple, GrappleState::Idle);
    assert!(character.is_grounded());
    assert_eq!(character.flags, untouched.flags);
    assert_eq!(character.facing, untouched.facing);

    // Body and registry match a frame with no grapple at all.
    assert_eq!(sim.position(id), control.position(id));
    assert_eq!(sim.velocity(id), control.velocity(id));
    assert_eq!(backend.velocity(id), control_backend.velocity(id));
    assert_eq!(backend.gravity_scale(id), Some(1.0));
    assert_eq!(backend.is_kinematic(id), Some(false));
    assert!(!sim.physics().is_frozen(id));
    assert_eq!(sim.physics().body_size(id), control.physics().body_size(id));
}

#[test]
fn test_destroyed_anchor_releases_same_frame() {
    let (mut sim, mut backend) = world();
    let id = player(&sim);
    // Right edge at -10 falls behind the break line on the first frame.
    let anchor = block(&mut sim, Vec2::new(-60.0, 300.0), Vec2::new(100.0, 24.0));
    place(&mut sim, id, Vec2::new(-60.0, 400.0), Vec2::ZERO);
    make_airborne(&mut sim, id);
    if let Some(character) = sim.character_mut(id) {
        character.grapple = GrappleState::Swinging(Swing {
            anchor,
            pivot: Vec2::new(-60.0, 300.0),
            rope_length: 100.0,
            angle: std::f32::consts::FRAC_PI_2,
            angular_velocity: 1.0,
        });
    }

    sim.tick(&mut backend, DT);

    assert!(!sim.registry().is_alive(anchor));
    let character = sim.character(id).expect("player");
    assert_eq!(character.grapple, GrappleState::Idle);
    assert!(sim.physics().has_body(id));
}

// -----------------------------------------------------------------------------
// Ability and lifecycle tests
// -----------------------------------------------------------------------------

#[test]
fn test_roll_completion_bleeds_speed_into_engine() {
    let (mut sim, mut backend) = world();
    let id = player(&sim);
    sim.set_player_commands(CommandSet::default().with_roll());
    sim.tick(&mut backend, DT);
    assert!(sim.character(id).is_some_and(|c| c.has(CharacterFlags::ROLLING)));
    assert_eq!(sim.velocity(id).map(|v| v.x), Some(500.0));

    sim.on_ability_animation_complete(
        &mut backend,
        AbilityAnimationComplete {
            character: id,
            ability: Ability::Roll,
        },
    );

    assert!(sim.character(id).is_some_and(|c| !c.has(CharacterFlags::ROLLING)));
    assert_eq!(sim.velocity(id).map(|v| v.x), Some(130.0));
    assert_eq!(backend.velocity(id).map(|v| v.x), Some(130.0));
}

#[test]
fn test_without_physics_falls_back_to_floor_clamp() {
    let config = SimConfig::default();
    let mut backend = KinematicBackend::new(Vec2::new(0.0, config.physics.gravity));
    let mut sim = Simulation::new(config);
    let id = player(&sim);

    for _ in 0..30 {
        sim.tick(&mut backend, DT);
    }

    assert_eq!(sim.physics().body_count(), 0);
    assert_eq!(sim.position(id).map(|p| p.y), Some(482.0));
    assert!(sim.character(id).is_some_and(|c| c.is_grounded()));
}

#[test]
fn test_restart_rebuilds_from_origin() {
    let (mut sim, mut backend) = world();
    walker_at(&mut sim, Vec2::new(495.0, 482.0));
    for _ in 0..5 {
        sim.tick(&mut backend, DT);
    }
    assert_eq!(sim.run_state(), RunState::GameOver);

    sim.restart(&mut backend);

    assert_eq!(sim.run_state(), RunState::Running);
    assert_eq!(sim.frame(), 0);
    assert_eq!(sim.score(), 0);
    assert_eq!(sim.scroller().break_x(), 0.0);
    assert_eq!(sim.physics().body_count(), 0);
    assert_eq!(backend.body_count(), 0);
    assert_eq!(sim.companions().count(), 1);
    assert_eq!(sim.steering().companion_count(), 1);
    assert!(sim.drain_events().is_empty());
    assert_eq!(sim.registry().iter::<Enemy>().count(), 0);

    let id = player(&sim);
    assert!(sim.character(id).is_some_and(|c| !c.is_dead()));
}

#[test]
fn test_score_accrues_over_time() {
    let (mut sim, mut backend) = world();
    for _ in 0..120 {
        sim.tick(&mut backend, DT);
    }
    assert!(sim.score() >= 19 && sim.score() <= 20, "score={}", sim.score());
}

#[test]
fn test_enemies_spawn_on_timer() {
    let (mut sim, mut backend) = world();
    let interval = sim.config().world.enemy_spawn_interval;
    let frames = (interval / DT).ceil() as usize + 1;
    for _ in 0..frames {
        sim.tick(&mut backend, DT);
    }

    let enemies: Vec<Vec2> = sim
        .registry()
        .placed::<Enemy>()
        .map(|(_, pos, _)| pos.0)
        .collect();
    assert_eq!(enemies.len(), 1);
    assert!(enemies[0].x > 1400.0);
}

#[test]
fn test_snapshot_reports_frame() {
    let (mut sim, mut backend) = world();
    sim.tick(&mut backend, DT);

    let snapshot = sim.snapshot();
    assert_eq!(snapshot.frame, 1);
    assert_eq!(snapshot.characters.len(), 2);
    assert!(!snapshot.ground_tiles.is_empty());
    assert!(snapshot.platforms.iter().all(|p| p.x > 1200.0));

    let id = player(&sim);
    let me = snapshot.character(id).expect("player row");
    assert!(me.has(CharacterFlags::GROUNDED));
    assert_eq!((me.width, me.height), (24.0, 36.0));
    assert!(serde_json::to_string(&snapshot).is_ok());
}

// -----------------------------------------------------------------------------
// Property tests
// -----------------------------------------------------------------------------

fn random_commands(rng: &mut ChaCha8Rng) -> CommandSet {
    let axis = Vec2::new(rng.random_range(-1.0..=1.0), rng.random_range(-1.0..=1.0));
    let mut commands = CommandSet::new(axis);
    commands.jump = rng.random_bool(0.1);
    commands.attack = rng.random_bool(0.05);
    commands.roll = rng.random_bool(0.02);
    commands
}

#[test]
fn test_engine_state_is_authoritative_after_every_frame() {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let config = SimConfig::default();
    let mut backend = KinematicBackend::new(Vec2::new(0.0, config.physics.gravity));
    let mut sim = Simulation::new(config);
    sim.initialize_physics();

    for _ in 0..240 {
        sim.set_player_commands(random_commands(&mut rng));
        sim.tick(&mut backend, DT);

        for character in sim.characters() {
            let id = character.id;
            let flags = character.flags;
            assert!(!(flags.contains(CharacterFlags::GROUNDED) && flags.contains(CharacterFlags::WALL_HANGING)));
            assert!(!(flags.contains(CharacterFlags::WALL_SLIDING) && flags.contains(CharacterFlags::WALL_HANGING)));
            assert_eq!(sim.physics().is_frozen(id), character.is_hanging());

            if character.is_dead() || character.is_swinging() || !sim.physics().has_body(id) {
                continue;
            }
            assert_eq!(sim.position(id), backend.translation(id), "{} position", id);
        }
    }
}

// ----------------------------------------------------------------------------
// Avian host
// ----------------------------------------------------------------------------

/// Headless app with avian and nothing of ours on top. Every `update` after
/// the first runs exactly one fixed step.
fn physics_app() -> App {
    let mut app = App::new();
    app.add_plugins((
        MinimalPlugins,
        StatesPlugin,
        TransformPlugin,
        AssetPlugin::default(),
        ScenePlugin,
        PhysicsPlugins::default(),
    ))
    .init_resource::<AvianLinks>();
    let step = app.world().resource::<Time<Fixed>>().timestep();
    app.insert_resource(TimeUpdateStrategy::ManualDuration(step));
    app
}

fn backend_app() -> App {
    let mut app = physics_app();
    app.finish();
    app
}

fn runner_app(config: SimConfig) -> App {
    let mut app = physics_app();
    app.insert_resource(config).add_plugins(SimulationPlugin);
    app.finish();
    app
}

fn run_frames(app: &mut App, frames: usize) {
    for _ in 0..frames {
        app.update();
    }
}

fn quiet_config() -> SimConfig {
    let mut config = SimConfig::default();
    config.world.enemy_spawn_interval = 1.0e6;
    config
}

#[test]
fn test_avian_run_advances_and_publishes() {
    let mut app = runner_app(quiet_config());
    run_frames(&mut app, 30);

    let sim = app.world().resource::<Simulation>();
    let me = sim.player_id().expect("player exists");
    assert!(sim.frame() > 20, "fixed frames ran: {}", sim.frame());
    assert!(sim.physics().has_body(me));
    assert!(sim.is_running());

    let latest = app.world().resource::<LatestSnapshot>();
    assert_eq!(latest.0.frame, sim.frame());

    let links = app.world().resource::<AvianLinks>();
    assert!(links.character(me).is_some());
    assert_eq!(links.character_count(), sim.physics().body_count());
    assert!(links.terrain_count() > 0);
}

#[test]
fn test_avian_velocity_is_resolved_against_a_wall() {
    let mut app = runner_app(quiet_config());
    {
        let mut sim = app.world_mut().resource_mut::<Simulation>();
        clear_floating(&mut sim);
        block(&mut sim, Vec2::new(514.0, 400.0), Vec2::new(40.0, 200.0));
    }
    app.insert_resource(PlayerCommands(CommandSet::new(Vec2::X)));
    run_frames(&mut app, 90);

    let sim = app.world().resource::<Simulation>();
    let me = sim.player_id().expect("player exists");
    let position = sim.position(me).expect("player placed");
    let velocity = sim.velocity(me).expect("player moving");
    assert!(position.x < 496.0, "stopped at the wall face, got {}", position.x);
    assert!(velocity.x.abs() < 50.0, "registry holds the stopped velocity, got {}", velocity.x);

    let entity = app
        .world()
        .resource::<AvianLinks>()
        .character(me)
        .expect("player body");
    let engine = app
        .world()
        .get::<LinearVelocity>(entity)
        .expect("body velocity");
    assert!(engine.0.x.abs() < 50.0);
}

#[test]
fn test_avian_spawned_body_is_visible_after_commands_apply() {
    let mut app = backend_app();
    let id = EntityId(1);
    let center = Vec2::new(100.0, 300.0);

    let seen_at_spawn = app
        .world_mut()
        .run_system_once(move |mut backend: AvianBackend| {
            backend.spawn_body(id, center, Vec2::new(24.0, 36.0));
            backend.translation(id)
        })
        .expect("system runs");
    assert_eq!(seen_at_spawn, None);

    let seen_later = app
        .world_mut()
        .run_system_once(move |backend: AvianBackend| backend.translation(id))
        .expect("system runs");
    assert_eq!(seen_later, Some(center));
}

#[test]
fn test_avian_freeze_swaps_body_kind_and_pins_it() {
    let mut app = backend_app();
    app.insert_resource(Gravity(Vec2::new(0.0, 980.0)));
    let id = EntityId(1);
    let center = Vec2::new(100.0, 300.0);

    app.world_mut()
        .run_system_once(move |mut backend: AvianBackend| {
            backend.spawn_body(id, center, Vec2::new(24.0, 36.0));
        })
        .expect("system runs");
    app.world_mut()
        .run_system_once(move |mut backend: AvianBackend| {
            backend.set_velocity(id, Vec2::ZERO);
            backend.set_gravity_scale(id, 0.0);
            backend.set_kinematic(id, true);
        })
        .expect("system runs");

    let entity = app
        .world()
        .resource::<AvianLinks>()
        .character(id)
        .expect("body linked");
    assert_eq!(app.world().get::<RigidBody>(entity), Some(&RigidBody::Kinematic));

    run_frames(&mut app, 10);
    let pinned = app
        .world_mut()
        .run_system_once(move |backend: AvianBackend| backend.translation(id))
        .expect("system runs")
        .expect("body present");
    assert!(pinned.distance(center) < 0.01, "frozen body stays put, got {:?}", pinned);

    app.world_mut()
        .run_system_once(move |mut backend: AvianBackend| {
            backend.set_kinematic(id, false);
            backend.set_gravity_scale(id, 1.0);
        })
        .expect("system runs");
    assert_eq!(app.world().get::<RigidBody>(entity), Some(&RigidBody::Dynamic));

    run_frames(&mut app, 10);
    let fallen = app
        .world_mut()
        .run_system_once(move |backend: AvianBackend| backend.translation(id))
        .expect("system runs")
        .expect("body present");
    assert!(fallen.y > center.y, "released body falls, got {}", fallen.y);
}

#[test]
fn test_avian_ray_reports_terrain_top_face() {
    let mut app = backend_app();
    let tile = EntityId(7);
    let bounds = Aabb::from_center(Vec2::new(40.0, 525.0), Vec2::new(80.0, 50.0));

    app.world_mut()
        .run_system_once(move |mut backend: AvianBackend| {
            backend.rebuild_statics(&[StaticCollider { id: tile, bounds }]);
        })
        .expect("system runs");
    // The spatial pipeline refreshes inside the physics step.
    run_frames(&mut app, 3);

    let hit = app
        .world_mut()
        .run_system_once(|backend: AvianBackend| backend.cast_ray(Vec2::new(40.0, 480.0), Dir2::Y, 100.0))
        .expect("system runs")
        .expect("ray hits the tile");
    assert_eq!(hit.surface, tile);
    assert!((hit.distance - 20.0).abs() < 0.5, "distance {}", hit.distance);
    assert!(hit.normal.y < -0.9, "normal {:?}", hit.normal);
}
