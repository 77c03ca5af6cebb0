//! Steering domain: the follow-and-engage policy for one companion.

use bevy::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::CharacterView;
use super::navigation::{
    GroundState, Obstacle, detect_obstacle, grapple_target, nearest_enemy, platform_ahead,
};
use crate::character::{CommandSet, Facing, GrappleCommand};
use crate::core::BehaviorConfig;
use crate::registry::{EntityId, EntityRegistry, Position};

/// Leader is considered far away beyond this horizontal gap.
const LEADER_FAR_DISTANCE: f32 = 300.0;
/// The leader must stand at least this much higher to be worth a hop.
const LEADER_RISE_FOR_JUMP: f32 = 60.0;

/// Which side of the leader a companion prefers to trail on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn for_slot(slot: usize) -> Self {
        if slot % 2 == 0 { Side::Left } else { Side::Right }
    }

    fn sign(self) -> f32 {
        match self {
            Side::Left => -1.0,
            Side::Right => 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Following,
    Combat,
}

/// Read-only world facts a decision may consult.
pub struct Surroundings<'a> {
    pub registry: &'a EntityRegistry,
    pub ground: GroundState,
    pub standing_height: f32,
    pub crouch_height: f32,
    pub grapple_max_distance: f32,
}

/// Decision accumulated over one frame before it becomes a `CommandSet`.
#[derive(Debug, Default)]
struct Intent {
    direction: f32,
    crouch: bool,
    jump: bool,
    attack: bool,
    roll: bool,
    grapple: Option<GrappleCommand>,
}

impl Intent {
    fn into_commands(self) -> CommandSet {
        let vertical = if self.crouch { -1.0 } else { 0.0 };
        let mut commands = CommandSet::new(Vec2::new(self.direction, vertical));
        commands.jump = self.jump;
        commands.attack = self.attack;
        commands.roll = self.roll;
        commands.grapple = self.grapple;
        commands
    }
}

/// Per-companion steering state.
#[derive(Debug, Clone)]
pub struct CompanionBrain {
    pub behavior: BehaviorConfig,
    side: Side,
    mode: Mode,
    chasing: bool,
    last_direction: f32,
    target: Option<EntityId>,
    retargeted_at: Option<f32>,
    rolled_at: Option<f32>,
    grappled_at: Option<f32>,
    rng: ChaCha8Rng,
}

impl CompanionBrain {
    pub fn new(behavior: BehaviorConfig, side: Side, seed: u64) -> Self {
        Self {
            behavior,
            side,
            mode: Mode::Following,
            chasing: false,
            last_direction: 0.0,
            target: None,
            retargeted_at: None,
            rolled_at: None,
            grappled_at: None,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn target(&self) -> Option<EntityId> {
        self.target
    }

    pub fn last_direction(&self) -> f32 {
        self.last_direction
    }

    /// Produce this frame's commands for the companion `me` trailing `leader`.
    pub fn decide(
        &mut self,
        me: &CharacterView,
        leader: &CharacterView,
        world: &Surroundings,
        time: f32,
    ) -> CommandSet {
        let mut intent = Intent::default();

        self.refresh_target(me, world.registry, time);

        let target_position = self
            .target
            .and_then(|id| world.registry.get::<Position>(id))
            .map(|pos| pos.0);

        match (self.mode, target_position) {
            (Mode::Combat, Some(enemy)) => {
                self.position_for_combat(&mut intent, me, leader, enemy, &world.ground)
            }
            _ => self.follow(&mut intent, me, leader, world),
        }

        self.avoid_obstacles(&mut intent, me, world);
        self.consider_grapple(&mut intent, me, leader, world, time);

        if let Some(enemy) = target_position {
            self.engage(&mut intent, me, enemy, &world.ground, time);
        }

        // Never walk toward ground that is about to vanish.
        if intent.direction < 0.0
            && world
                .ground
                .is_unsafe(me.position.x - self.behavior.gap_lookahead)
        {
            intent.direction = 0.0;
        }

        if intent.direction != 0.0 {
            self.last_direction = intent.direction;
        }

        intent.into_commands()
    }

    fn refresh_target(&mut self, me: &CharacterView, registry: &EntityRegistry, time: f32) {
        if self.target.is_some_and(|id| !registry.is_alive(id)) {
            self.target = None;
            self.mode = Mode::Following;
        }

        let due = self
            .retargeted_at
            .is_none_or(|at| time - at >= self.behavior.retarget_interval);
        if !due {
            return;
        }

        self.retargeted_at = Some(time);
        self.target = nearest_enemy(registry, me.position, self.behavior.enemy_search_range)
            .map(|(id, _)| id);
        self.mode = if self.target.is_some() {
            Mode::Combat
        } else {
            Mode::Following
        };
    }

    fn follow(
        &mut self,
        intent: &mut Intent,
        me: &CharacterView,
        leader: &CharacterView,
        world: &Surroundings,
    ) {
        let behavior = &self.behavior;
        let dx = leader.position.x - me.position.x;

        if dx.abs() < behavior.min_distance {
            intent.direction = if dx > 0.0 { -1.0 } else { 1.0 };
            self.chasing = false;
            return;
        }

        let ideal_x = leader.position.x + self.side.sign() * behavior.follow_distance;
        let to_ideal = ideal_x - me.position.x;

        if to_ideal.abs() > behavior.start_move_distance {
            self.chasing = true;
        } else if to_ideal.abs() < behavior.stop_move_distance {
            self.chasing = false;
        }

        if !self.chasing {
            return;
        }

        intent.direction = to_ideal.signum();

        let leader_rise = me.position.y - leader.position.y;
        if me.grounded
            && leader.grounded
            && leader_rise > LEADER_RISE_FOR_JUMP
            && platform_ahead(world.registry, &world.ground, me.position, intent.direction)
        {
            intent.jump = true;
        }

        self.jump_gaps(intent, me, &world.ground);
    }

    fn position_for_combat(
        &self,
        intent: &mut Intent,
        me: &CharacterView,
        leader: &CharacterView,
        enemy: Vec2,
        ground: &GroundState,
    ) {
        let to_enemy = enemy.x - me.position.x;
        let to_leader = leader.position.x - me.position.x;

        let leader_between = to_enemy.signum() == to_leader.signum()
            && to_leader != 0.0
            && to_leader.abs() < to_enemy.abs();
        if leader_between && to_leader.abs() < self.behavior.min_distance * 2.0 {
            // Step around instead of crowding the leader.
            intent.direction = -to_leader.signum();
            return;
        }

        if to_enemy.abs() > self.behavior.attack_range {
            intent.direction = to_enemy.signum();
            self.jump_gaps(intent, me, ground);
        } else if me.grounded && !me.attacking {
            intent.attack = true;
        }
    }

    fn jump_gaps(&self, intent: &mut Intent, me: &CharacterView, ground: &GroundState) {
        if !me.grounded || intent.direction == 0.0 {
            return;
        }
        let future_x = me.position.x + intent.direction * self.behavior.gap_lookahead;
        if ground.in_break_zone(future_x) {
            intent.jump = true;
        }
    }

    fn avoid_obstacles(&self, intent: &mut Intent, me: &CharacterView, world: &Surroundings) {
        let obstacle = detect_obstacle(
            world.registry,
            me.position,
            intent.direction,
            self.behavior.obstacle_lookahead,
            world.standing_height,
            world.crouch_height,
        );

        match obstacle {
            Obstacle::None => {}
            Obstacle::Low => intent.crouch = true,
            Obstacle::High | Obstacle::Blocking => {
                if me.grounded && !me.attacking {
                    intent.jump = true;
                }
            }
        }
    }

    fn consider_grapple(
        &mut self,
        intent: &mut Intent,
        me: &CharacterView,
        leader: &CharacterView,
        world: &Surroundings,
        time: f32,
    ) {
        if me.swinging() {
            return;
        }
        let ready = self
            .grappled_at
            .is_none_or(|at| time - at >= self.behavior.grapple_cooldown);
        if !ready {
            return;
        }

        let leader_far = (leader.position.x - me.position.x).abs() > LEADER_FAR_DISTANCE;
        if me.grounded && !leader_far && !leader.swinging() {
            return;
        }
        if self.rng.random::<f32>() >= self.behavior.grapple_chance {
            return;
        }

        let Some((platform, target)) = grapple_target(
            world.registry,
            &world.ground,
            me.position,
            leader.grapple_pivot,
            world.grapple_max_distance,
        ) else {
            return;
        };

        debug!("Companion {} grappling toward platform {}", me.id, platform);
        intent.grapple = Some(GrappleCommand::Attach {
            target,
            platform: Some(platform),
        });
        self.grappled_at = Some(time);
    }

    fn engage(
        &mut self,
        intent: &mut Intent,
        me: &CharacterView,
        enemy: Vec2,
        ground: &GroundState,
        time: f32,
    ) {
        let distance = (enemy.x - me.position.x).abs();
        let rolls_into_break = me.facing == Facing::Left
            && ground.is_unsafe(me.position.x - self.behavior.gap_lookahead);

        let roll_ready = self
            .rolled_at
            .is_none_or(|at| time - at >= self.behavior.roll_cooldown);
        if distance < self.behavior.roll_dodge_range
            && me.grounded
            && !me.rolling
            && !me.attacking
            && roll_ready
            && !rolls_into_break
            && self.rng.random::<f32>() < self.behavior.roll_chance
        {
            intent.roll = true;
            intent.attack = false;
            self.rolled_at = Some(time);
            return;
        }

        if distance < self.behavior.attack_range && me.grounded && !me.attacking {
            intent.attack = true;
        }
    }
}
