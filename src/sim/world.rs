//! Sim domain: one runner world and its strictly ordered frame.
//!
//! A frame runs these stages in order:
//!
//! 1. [`Simulation::scroll`]: clock, score, terrain, anchor releases, enemies, spawns
//! 2. [`Simulation::sync_statics`]: mirror terrain into the physics engine
//! 3. [`Simulation::steer`]: refresh steering ground state, then companion commands
//! 4. [`Simulation::advance_characters`]: commands, movement, physics step, collision transitions
//!    ([`Simulation::resolve_movement`], engine step, [`Simulation::settle_movement`])
//! 5. [`Simulation::resolve_combat`]: melee, body contact, fall-outs
//!
//! [`Simulation::tick`] runs all of them against one backend. Under avian the
//! plugin splits stage 4 around the engine's own step instead.

use bevy::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::{HashMap, HashSet};

use super::enemies::{spawn_enemy, update_enemies};
use super::snapshot::FrameSnapshot;
use crate::character::{
    Character, CharacterFlags, CommandSet, GrappleCommand, Kinematics, Role, character_bounds,
    enemy_bounds, sword_hitbox,
};
use crate::core::{
    AbilityAnimationComplete, CompanionLost, EnemyKilled, GameOver, LossReason, RunState,
    SimConfig, SimEvent,
};
use crate::physics::{BoundPhysics, CollisionResult, MovementRequest, PhysicsBackend, PhysicsIntegration};
use crate::registry::{Enemy, EntityId, EntityRegistry, Position, Velocity};
use crate::steering::{CharacterView, SteeringModule};
use crate::terrain::TerrainScroller;

/// A complete runner world: registry, physics bookkeeping, terrain, steering
/// and the characters, passed explicitly to every stage.
#[derive(Resource, Debug)]
pub struct Simulation {
    config: SimConfig,
    registry: EntityRegistry,
    physics: PhysicsIntegration,
    scroller: TerrainScroller,
    steering: SteeringModule,
    /// The player is always first.
    characters: Vec<Character>,
    player_commands: CommandSet,
    commands: HashMap<EntityId, CommandSet>,
    collisions: HashMap<EntityId, CollisionResult>,
    /// Characters whose engine body must be moved to their registry state
    /// before anything else touches it this frame.
    reseat: HashSet<EntityId>,
    rng: ChaCha8Rng,
    run_state: RunState,
    frame: u64,
    time: f32,
    score: f32,
    enemy_timer: f32,
    ally_timer: f32,
    events: Vec<SimEvent>,
}

impl Simulation {
    pub fn new(config: SimConfig) -> Self {
        let mut sim = Self {
            registry: EntityRegistry::default(),
            physics: PhysicsIntegration::new(config.physics.clone()),
            scroller: TerrainScroller::new(config.world.seed),
            steering: SteeringModule::new(&config),
            characters: Vec::new(),
            player_commands: CommandSet::default(),
            commands: HashMap::new(),
            collisions: HashMap::new(),
            reseat: HashSet::new(),
            rng: ChaCha8Rng::seed_from_u64(config.world.seed),
            run_state: RunState::Running,
            frame: 0,
            time: 0.0,
            score: 0.0,
            enemy_timer: 0.0,
            ally_timer: 0.0,
            events: Vec::new(),
            config,
        };
        sim.build_world();
        sim
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    pub fn physics(&self) -> &PhysicsIntegration {
        &self.physics
    }

    pub fn scroller(&self) -> &TerrainScroller {
        &self.scroller
    }

    pub fn steering(&self) -> &SteeringModule {
        &self.steering
    }

    pub fn characters(&self) -> &[Character] {
        &self.characters
    }

    pub fn character(&self, id: EntityId) -> Option<&Character> {
        self.characters.iter().find(|c| c.id == id)
    }

    pub fn player(&self) -> Option<&Character> {
        self.characters.iter().find(|c| c.is_player())
    }

    pub fn player_id(&self) -> Option<EntityId> {
        self.player().map(|c| c.id)
    }

    pub fn companions(&self) -> impl Iterator<Item = &Character> {
        self.characters.iter().filter(|c| !c.is_player())
    }

    pub fn position(&self, id: EntityId) -> Option<Vec2> {
        self.registry.get::<Position>(id).map(|p| p.0)
    }

    pub fn velocity(&self, id: EntityId) -> Option<Vec2> {
        self.registry.get::<Velocity>(id).map(|v| v.0)
    }

    pub fn run_state(&self) -> RunState {
        self.run_state
    }

    pub fn is_running(&self) -> bool {
        self.run_state == RunState::Running
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn score(&self) -> u32 {
        self.score.floor() as u32
    }

    /// Collision classification the character got this frame.
    pub fn collision(&self, id: EntityId) -> Option<&CollisionResult> {
        self.collisions.get(&id)
    }

    /// Mutable access for hosts and tests that stage a world by hand.
    pub fn character_mut(&mut self, id: EntityId) -> Option<&mut Character> {
        self.characters.iter_mut().find(|c| c.id == id)
    }

    pub fn registry_mut(&mut self) -> &mut EntityRegistry {
        &mut self.registry
    }

    /// Take the notifications recorded since the last drain.
    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }

    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------

    /// The physics engine finished starting up; characters may now be
    /// advanced through it.
    pub fn initialize_physics(&mut self) {
        self.physics.initialize();
    }

    /// Tear the run down and build a fresh one. Companion AI stops and every
    /// body is released before any entity is destroyed.
    pub fn restart<B: PhysicsBackend>(&mut self, backend: &mut B) {
        self.steering.clear();
        self.physics.bind(backend).release_all();
        self.registry.clear();
        self.scroller.reset();
        self.characters.clear();
        self.commands.clear();
        self.collisions.clear();
        self.reseat.clear();
        self.player_commands = CommandSet::default();
        self.rng = ChaCha8Rng::seed_from_u64(self.config.world.seed);
        self.run_state = RunState::Running;
        self.frame = 0;
        self.time = 0.0;
        self.score = 0.0;
        self.enemy_timer = 0.0;
        self.ally_timer = 0.0;
        self.events.clear();

        self.build_world();
        info!("Run restarted");
    }

    fn build_world(&mut self) {
        let world = &self.config.world;
        self.scroller.seed_initial(&mut self.registry, world);

        let half = self.config.movement.standing_hitbox.half_height();
        let id = self.registry.create();
        self.registry
            .add(id, Position(Vec2::new(world.player_spawn_x, world.ground_y - half)));
        self.registry.add(id, Velocity(Vec2::ZERO));
        self.characters.push(Character::new(id, Role::Player));

        self.steering
            .update_ground_state(world.ground_y, self.scroller.break_x());
        self.spawn_ally();
    }

    /// Spawn a companion behind the player. Skipped at the ally cap or when
    /// the spawn point is too close to the break line.
    pub fn spawn_ally(&mut self) -> Option<EntityId> {
        let world = &self.config.world;
        let slot = self.companions().count();
        if slot >= world.max_allies {
            return None;
        }

        let player_x = self.player_id().and_then(|id| self.position(id))?.x;
        let x = player_x - world.ally_spawn_offset;
        if x < self.scroller.break_x() + world.ally_spawn_margin {
            debug!("Ally spawn at x={:.0} too close to the break line", x);
            return None;
        }

        let id = self.registry.create();
        let behavior = self.config.steering.companion_behavior(slot);
        if !self.steering.register_companion(id, behavior) {
            self.registry.destroy(id);
            return None;
        }

        let half = self.config.movement.standing_hitbox.half_height();
        self.registry
            .add(id, Position(Vec2::new(x, world.ground_y - half)));
        self.registry.add(id, Velocity(Vec2::ZERO));
        self.characters
            .push(Character::new(id, Role::Companion { slot }));

        info!("Ally {} joined in slot {} at x={:.0}", id, slot, x);
        Some(id)
    }

    /// Commands for the player for the next frame.
    pub fn set_player_commands(&mut self, commands: CommandSet) {
        self.player_commands = commands;
    }

    /// Presentation finished an ability clip. The cleared flag and any
    /// velocity change reach the engine body immediately.
    pub fn on_ability_animation_complete<B: PhysicsBackend>(
        &mut self,
        backend: &mut B,
        event: AbilityAnimationComplete,
    ) {
        let Some(character) = self.characters.iter_mut().find(|c| c.id == event.character) else {
            return;
        };
        let Some(mut kin) = Kinematics::load(&self.registry, character.id) else {
            return;
        };

        let before = kin.velocity;
        character.on_ability_animation_complete(event.ability, &mut kin.velocity, &self.config.movement);
        kin.store(&mut self.registry, character.id);

        if kin.velocity != before && !character.is_hanging() {
            self.physics
                .bind(backend)
                .set_velocity(character.id, kin.velocity);
        }
    }

    // -------------------------------------------------------------------------
    // Frame
    // -------------------------------------------------------------------------

    /// Run one full frame. Does nothing once the run is over.
    pub fn tick<B: PhysicsBackend>(&mut self, backend: &mut B, dt: f32) {
        if !self.is_running() {
            return;
        }
        self.scroll(dt);
        self.sync_statics(backend);
        self.steer();
        self.advance_characters(backend, dt);
        self.resolve_combat(backend);
    }

    /// Stage 1: clock, score, terrain, enemies and spawn timers.
    pub fn scroll(&mut self, dt: f32) {
        if !self.is_running() {
            return;
        }
        self.frame += 1;
        self.time += dt;
        self.score += self.config.combat.score_rate * dt;

        let lead_x = self
            .characters
            .iter()
            .filter(|c| !c.is_dead())
            .filter_map(|c| self.registry.get::<Position>(c.id))
            .map(|p| p.0.x)
            .fold(self.config.world.player_spawn_x, f32::max);
        let report = self
            .scroller
            .update(dt, lead_x, &mut self.registry, &self.config.world);

        if !report.destroyed_platforms.is_empty() {
            self.release_anchors(&report.destroyed_platforms);
        }

        update_enemies(
            &mut self.registry,
            dt,
            self.scroller.break_x(),
            &self.config.world,
            &self.config.combat,
        );

        self.enemy_timer += dt;
        if self.enemy_timer >= self.config.world.enemy_spawn_interval {
            self.enemy_timer -= self.config.world.enemy_spawn_interval;
            if let Some(player_x) = self.player_id().and_then(|id| self.position(id)).map(|p| p.x) {
                spawn_enemy(&mut self.registry, &mut self.rng, player_x, &self.config.world);
            }
        }

        self.ally_timer += dt;
        if self.ally_timer >= self.config.world.ally_spawn_interval {
            self.ally_timer -= self.config.world.ally_spawn_interval;
            self.spawn_ally();
        }
    }

    /// Drop every rope anchored to one of `platforms`.
    fn release_anchors(&mut self, platforms: &[EntityId]) {
        for character in &mut self.characters {
            let Some(anchor) = character.grapple.anchor() else {
                continue;
            };
            if !platforms.contains(&anchor) {
                continue;
            }
            let Some(mut kin) = Kinematics::load(&self.registry, character.id) else {
                continue;
            };
            character.release_grapple(&mut kin, &self.config.movement);
            kin.store(&mut self.registry, character.id);
            self.reseat.insert(character.id);
            info!("{} lost its anchor {}", character.id, anchor);
        }
    }

    /// Stage 2: rebuild the engine's static terrain from the registry.
    pub fn sync_statics<B: PhysicsBackend>(&mut self, backend: &mut B) {
        self.physics
            .bind(backend)
            .sync_static_colliders(&self.registry);
    }

    /// Stage 3: refresh steering's view of the ground, then collect this
    /// frame's commands for every live character.
    pub fn steer(&mut self) {
        self.steering
            .update_ground_state(self.config.world.ground_y, self.scroller.break_x());

        self.commands.clear();
        let Some(player) = self.characters.iter().find(|c| c.is_player()) else {
            return;
        };
        let Some(leader_position) = self.registry.get::<Position>(player.id) else {
            return;
        };
        let leader = CharacterView::of(player, leader_position.0);
        self.commands.insert(leader.id, self.player_commands);

        for companion in self.characters.iter().filter(|c| !c.is_player() && !c.is_dead()) {
            let Some(position) = self.registry.get::<Position>(companion.id) else {
                continue;
            };
            let me = CharacterView::of(companion, position.0);
            let commands = self
                .steering
                .get_commands(&me, &leader, &self.registry, self.time);
            self.commands.insert(companion.id, commands);
        }
    }

    /// Stage 4: apply commands, move bodies, step the engine, read back and
    /// run collision transitions.
    pub fn advance_characters<B: PhysicsBackend>(&mut self, backend: &mut B, dt: f32) {
        self.resolve_movement(backend, dt);
        self.physics.bind(backend).step(dt);
        self.settle_movement(backend);
    }

    /// Stage 4a: commands, pose changes and movement intent handed to the
    /// engine. Contacts are classified at the pre-step pose.
    pub fn resolve_movement<B: PhysicsBackend>(&mut self, backend: &mut B, dt: f32) {
        let Self {
            config,
            registry,
            physics,
            characters,
            commands,
            collisions,
            reseat,
            time,
            ..
        } = self;
        let now = *time;
        let movement = &config.movement;
        let ground_y = config.world.ground_y;
        let gravity = config.physics.gravity;

        collisions.clear();
        let mut physics = physics.bind(backend);

        if !physics.is_ready() {
            for character in characters.iter_mut().filter(|c| !c.is_dead()) {
                let Some(mut kin) = Kinematics::load(registry, character.id) else {
                    continue;
                };
                let frame_commands = commands.get(&character.id).copied().unwrap_or_default();
                character.process_commands(&mut kin, &frame_commands, dt, now, movement);
                if character.is_swinging() {
                    character.update_grapple(&mut kin, dt, ground_y, gravity, movement);
                } else {
                    character.integrate_without_physics(&mut kin, dt, ground_y, gravity, movement);
                }
                kin.store(registry, character.id);
            }
            return;
        }

        for character in characters.iter_mut().filter(|c| !c.is_dead()) {
            let id = character.id;
            let Some(mut kin) = Kinematics::load(registry, id) else {
                continue;
            };
            let frame_commands = commands.get(&id).copied().unwrap_or_default();

            // The anchor may be gone; never swing from a dead platform.
            if character
                .grapple
                .anchor()
                .is_some_and(|anchor| !registry.is_alive(anchor))
            {
                character.release_grapple(&mut kin, movement);
                reseat.insert(id);
            }

            if character.is_swinging() {
                if frame_commands.jump || frame_commands.grapple.is_some() {
                    character.release_grapple(&mut kin, movement);
                    reseat.insert(id);
                }
            } else if let Some(GrappleCommand::Attach { target, platform }) = frame_commands.grapple {
                character.start_grapple(&kin, target, platform, registry, movement);
            }

            let effects = character.process_commands(&mut kin, &frame_commands, dt, now, movement);
            if effects.exited_hang {
                physics.set_position(id, kin.position);
                physics.unfreeze(id, Some(kin.velocity.x), Some(kin.velocity.y));
            }
            if effects.launched {
                physics.set_velocity(id, kin.velocity);
            }
            if reseat.remove(&id) {
                seat(&mut physics, id, &kin);
            }

            if character.is_swinging() {
                character.update_grapple(&mut kin, dt, ground_y, gravity, movement);
                if !character.is_swinging() {
                    seat(&mut physics, id, &kin);
                }
                kin.store(registry, id);
                continue;
            }

            if character.is_hanging() {
                physics.freeze(id, kin.position);
                kin.store(registry, id);
                continue;
            }

            let size = character.hitbox(movement).size();
            if !physics.has_body(id) {
                physics.create_body(id, kin.position, size);
            } else if let Some(center) = physics.update_collider_size(id, size) {
                kin.position = center;
            }

            let request = MovementRequest {
                horizontal_velocity: kin.velocity.x,
                wants_jump: character.pending_jump,
                jump_impulse: movement.jump_impulse,
                ledge_grab_blocked: character.ledge_grab_blocked(now, movement),
            };
            character.pending_jump = false;
            if let Some(outcome) = physics.apply_movement(id, request) {
                kin.position = outcome.position;
                collisions.insert(id, outcome.collision);
            }
            kin.store(registry, id);
        }
    }

    /// Stage 4b: once the engine has stepped, pull resolved poses and
    /// velocities back into the registry and run collision transitions for
    /// every character that moved in stage 4a.
    pub fn settle_movement<B: PhysicsBackend>(&mut self, backend: &mut B) {
        let Self {
            config,
            registry,
            physics,
            characters,
            collisions,
            time,
            ..
        } = self;
        let now = *time;
        let movement = &config.movement;
        let mut physics = physics.bind(backend);

        for character in characters.iter_mut() {
            let id = character.id;
            let Some(collision) = collisions.get(&id) else {
                continue;
            };
            let Some(mut kin) = Kinematics::load(registry, id) else {
                continue;
            };
            if let Some(position) = physics.get_position(id) {
                kin.position = position;
            }
            if let Some(velocity) = physics.get_velocity(id) {
                kin.velocity = velocity;
            }
            character.apply_collision(&mut kin, collision, &mut physics, now, movement);
            kin.store(registry, id);
        }
    }

    /// Stage 5: melee first, then body contact and fall-outs.
    ///
    /// An enemy cut down by a sword this frame is gone before body contact is
    /// checked, so it can never also kill the character that struck it.
    pub fn resolve_combat<B: PhysicsBackend>(&mut self, backend: &mut B) {
        if !self.is_running() {
            return;
        }
        let combat = &self.config.combat;
        let movement = &self.config.movement;

        let enemies: Vec<(EntityId, Vec2, Enemy)> = self
            .registry
            .placed::<Enemy>()
            .map(|(id, pos, enemy)| (id, pos.0, enemy))
            .collect();

        let mut slain: Vec<(EntityId, EntityId)> = Vec::new();
        for character in self
            .characters
            .iter()
            .filter(|c| !c.is_dead() && c.has(CharacterFlags::ATTACKING))
        {
            let Some(position) = self.registry.get::<Position>(character.id) else {
                continue;
            };
            let sword = sword_hitbox(position.0, character.facing, combat);
            for (enemy, enemy_position, data) in &enemies {
                if slain.iter().any(|(id, _)| id == enemy) {
                    continue;
                }
                if enemy_bounds(*enemy_position, data.kind, combat).overlaps(&sword) {
                    slain.push((*enemy, character.id));
                }
            }
        }

        for (enemy, by) in slain {
            self.registry.destroy(enemy);
            self.score += combat.kill_points as f32;
            self.events.push(SimEvent::EnemyKilled(EnemyKilled {
                enemy,
                by,
                points: combat.kill_points,
            }));
            info!("{} cut down enemy {}", by, enemy);
        }

        let fall_limit = self.config.world.fall_limit();
        let behind_limit = self.scroller.break_x() - self.config.world.ally_cull_margin;
        let mut losses: Vec<(EntityId, LossReason)> = Vec::new();

        for character in self.characters.iter().filter(|c| !c.is_dead()) {
            let Some(position) = self.registry.get::<Position>(character.id) else {
                continue;
            };
            let body = character_bounds(position.0, character.hitbox(movement));
            let struck = self
                .registry
                .placed::<Enemy>()
                .any(|(_, pos, enemy)| enemy_bounds(pos.0, enemy.kind, combat).overlaps(&body));

            if struck {
                losses.push((character.id, LossReason::Enemy));
            } else if position.0.y > fall_limit {
                losses.push((character.id, LossReason::FellOut));
            } else if !character.is_player() && position.0.x < behind_limit {
                losses.push((character.id, LossReason::BehindBreak));
            }
        }

        for (id, reason) in losses {
            self.lose_character(backend, id, reason);
        }
    }

    fn lose_character<B: PhysicsBackend>(&mut self, backend: &mut B, id: EntityId, reason: LossReason) {
        let Some(index) = self.characters.iter().position(|c| c.id == id) else {
            return;
        };

        if self.characters[index].is_player() {
            self.characters[index].kill();
            self.run_state = RunState::GameOver;
            let score = self.score();
            self.events
                .push(SimEvent::GameOver(GameOver { score, reason }));
            info!("Game over ({:?}) with score {}", reason, score);
            return;
        }

        self.characters.remove(index);
        self.steering.unregister_companion(id);
        self.physics.bind(backend).remove_body(id);
        self.registry.destroy(id);
        self.events
            .push(SimEvent::CompanionLost(CompanionLost { character: id, reason }));
        info!("Ally {} lost ({:?})", id, reason);
    }

    /// Everything presentation needs for this frame.
    pub fn snapshot(&self) -> FrameSnapshot {
        FrameSnapshot::capture(self)
    }
}

/// Move an engine body to the character's swing-driven state.
fn seat<B: PhysicsBackend>(physics: &mut BoundPhysics<'_, B>, id: EntityId, kin: &Kinematics) {
    physics.set_position(id, kin.position);
    physics.set_velocity(id, kin.velocity);
}
