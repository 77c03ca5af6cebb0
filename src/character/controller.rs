//! Character domain: collision-driven transitions, command handling and
//! ability completion.

use bevy::prelude::*;

use super::{Character, CharacterFlags, CommandSet, Facing, Kinematics};
use crate::core::{Ability, MovementConfig};
use crate::physics::{BoundPhysics, CollisionResult, PhysicsBackend};

/// What command processing changed that the engine body has to follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CommandEffects {
    /// Left a ledge hang. The body must be moved to the new position and
    /// unfrozen with the new velocity before the next step.
    pub exited_hang: bool,
    /// Velocity was set outright (wall jump) and must be pushed as a whole.
    pub launched: bool,
}

impl Character {
    /// Apply the frame's collision result.
    ///
    /// Rules run in order: grounded, ceiling bump, ledge grab, wall slide,
    /// airborne.
    pub fn apply_collision<B: PhysicsBackend>(
        &mut self,
        kin: &mut Kinematics,
        collision: &CollisionResult,
        physics: &mut BoundPhysics<'_, B>,
        now: f32,
        config: &MovementConfig,
    ) {
        let was_hanging = self.is_hanging();

        if collision.grounded {
            self.flags.insert(CharacterFlags::GROUNDED);
            self.flags.remove(CharacterFlags::WALL_STATES);
            self.hang_ledge_y = None;
            if kin.velocity.x.abs() < config.friction_cutoff {
                kin.velocity.x = 0.0;
            }
            physics.unfreeze(self.id, None, None);
            return;
        }

        // Turning is a grounded-only animation.
        self.flags
            .remove(CharacterFlags::GROUNDED | CharacterFlags::TURNING);

        if collision.hit_ceiling && kin.velocity.y < 0.0 {
            // Bumping a ceiling ends the rise.
            kin.velocity.y = 0.0;
            physics.set_velocity(self.id, kin.velocity);
        }

        if collision.hit_wall() {
            self.flags
                .set(CharacterFlags::WALL_LEFT, collision.hit_wall_left);
            if (collision.hit_wall_left && kin.velocity.x < 0.0)
                || (collision.hit_wall_right && kin.velocity.x > 0.0)
            {
                kin.velocity.x = 0.0;
            }

            let ledge = collision
                .ledge_y
                .filter(|_| collision.can_ledge_grab && !self.ledge_grab_blocked(now, config));
            match ledge {
                Some(ledge_y) => self.enter_hang(kin, ledge_y, physics, config),
                None => {
                    self.flags.insert(CharacterFlags::WALL_SLIDING);
                    self.flags.remove(CharacterFlags::WALL_HANGING);
                    self.hang_ledge_y = None;
                    physics.unfreeze(self.id, None, None);
                }
            }
            return;
        }

        self.flags.remove(CharacterFlags::WALL_STATES);
        self.hang_ledge_y = None;
        if was_hanging {
            physics.unfreeze(self.id, None, None);
        }
    }

    fn enter_hang<B: PhysicsBackend>(
        &mut self,
        kin: &mut Kinematics,
        ledge_y: f32,
        physics: &mut BoundPhysics<'_, B>,
        config: &MovementConfig,
    ) {
        self.flags.remove(
            CharacterFlags::WALL_SLIDING | CharacterFlags::CROUCHING | CharacterFlags::ROLLING,
        );
        self.flags.insert(CharacterFlags::WALL_HANGING);
        self.hang_ledge_y = Some(ledge_y);
        self.pending_jump = false;
        // Face the ledge being held.
        self.facing = if self.wall_on_left() {
            Facing::Left
        } else {
            Facing::Right
        };

        let hitbox = config.hang_hitbox;
        let center = Vec2::new(
            kin.position.x,
            ledge_y + hitbox.half_height() + config.hand_offset,
        );
        physics.update_collider_size(self.id, hitbox.size());
        physics.freeze(self.id, center);
        kin.position = center;
        kin.velocity = Vec2::ZERO;

        info!("{} grabbed ledge at y={:.1}", self.id, ledge_y);
    }

    /// Turn this frame's commands into intent on `kin` and the flags.
    pub fn process_commands(
        &mut self,
        kin: &mut Kinematics,
        commands: &CommandSet,
        dt: f32,
        now: f32,
        config: &MovementConfig,
    ) -> CommandEffects {
        let mut effects = CommandEffects::default();
        if self.is_dead() || self.is_swinging() {
            return effects;
        }

        let horizontal = commands.horizontal();

        if self.is_hanging() {
            let wall_side = if self.wall_on_left() { -1.0 } else { 1.0 };
            let toward_wall = horizontal * wall_side > 0.0;
            let away_from_wall = horizontal * wall_side < 0.0;

            if commands.holding_up() && toward_wall {
                self.climb(kin, now, config);
            } else if away_from_wall {
                self.wall_jump(kin, now, config);
            } else if commands.holding_down() {
                self.drop_from_hang(kin, now, config);
            } else {
                return effects;
            }
            effects.exited_hang = true;
            return effects;
        }

        if self.has(CharacterFlags::ROLLING) {
            // Rolling keeps its momentum; only facing follows input.
            if horizontal != 0.0 && !self.has(CharacterFlags::TURNING) {
                self.facing = self.facing.toward(horizontal);
            }
            return effects;
        }

        if self.has(CharacterFlags::WALL_SLIDING) && commands.jump {
            self.wall_jump(kin, now, config);
            effects.launched = true;
            return effects;
        }

        let grounded = self.is_grounded();
        self.flags
            .set(CharacterFlags::CROUCHING, grounded && commands.holding_down());

        if commands.roll
            && grounded
            && !self.has(CharacterFlags::ATTACKING)
            && now >= self.timers.roll_ready_at
        {
            self.start_roll(kin, now, config);
            return effects;
        }

        self.steer_horizontal(kin, horizontal, dt, config);

        if commands.jump && grounded && !self.has(CharacterFlags::ATTACKING) {
            self.pending_jump = true;
        }

        if commands.attack && !self.has(CharacterFlags::ATTACKING) {
            self.flags.insert(CharacterFlags::ATTACKING);
            debug!("{} attacks facing {:?}", self.id, self.facing);
        }

        effects
    }

    fn steer_horizontal(&mut self, kin: &mut Kinematics, input: f32, dt: f32, config: &MovementConfig) {
        let grounded = self.is_grounded();

        if input != 0.0 && !self.has(CharacterFlags::TURNING) {
            let wanted = self.facing.toward(input);
            if wanted != self.facing
                && grounded
                && !self.has(CharacterFlags::ATTACKING)
                && kin.velocity.x.abs() < config.turn_speed_threshold
            {
                self.flags.insert(CharacterFlags::TURNING);
            }
            self.facing = wanted;
        }

        let factor = if self.has(CharacterFlags::CROUCHING) {
            config.crouch_speed_factor
        } else {
            1.0
        };
        let accepts_input = !self
            .flags
            .intersects(CharacterFlags::ATTACKING | CharacterFlags::TURNING);

        let mut vx = kin.velocity.x;
        if input != 0.0 && accepts_input {
            vx += input * config.accel * factor * dt;
        } else {
            let decel = if grounded {
                config.decel
            } else {
                config.decel * config.air_decel_factor
            } * dt;
            vx = if vx > 0.0 {
                (vx - decel).max(0.0)
            } else {
                (vx + decel).min(0.0)
            };
        }

        let max_speed = config.max_speed * factor;
        kin.velocity.x = vx.clamp(-max_speed, max_speed);
    }

    fn start_roll(&mut self, kin: &mut Kinematics, now: f32, config: &MovementConfig) {
        self.flags.insert(CharacterFlags::ROLLING);
        self.flags
            .remove(CharacterFlags::TURNING | CharacterFlags::CROUCHING);
        self.timers.roll_ready_at = now + config.roll_cooldown;
        kin.velocity.x = self.facing.sign() * config.roll_speed;
        debug!("{} rolls {:?}", self.id, self.facing);
    }

    fn wall_jump(&mut self, kin: &mut Kinematics, now: f32, config: &MovementConfig) {
        let away = if self.wall_on_left() { 1.0 } else { -1.0 };
        kin.velocity = Vec2::new(
            away * config.wall_kick,
            -config.jump_impulse * config.wall_jump_factor,
        );
        self.facing = self.facing.toward(away);
        self.leave_wall();
        self.timers.wall_jumped_at = Some(now);
        debug!("{} wall jumps", self.id);
    }

    fn climb(&mut self, kin: &mut Kinematics, now: f32, config: &MovementConfig) {
        let toward = if self.wall_on_left() { -1.0 } else { 1.0 };
        kin.velocity = Vec2::new(toward * config.climb_forward_speed, -config.climb_up_speed);
        kin.position.y -= config.climb_lift;
        self.facing = self.facing.toward(toward);
        self.leave_wall();
        self.timers.climbed_at = Some(now);
        info!("{} climbs onto ledge", self.id);
    }

    fn drop_from_hang(&mut self, kin: &mut Kinematics, now: f32, config: &MovementConfig) {
        let away = if self.wall_on_left() { 1.0 } else { -1.0 };
        kin.velocity = Vec2::new(away * config.drop_push, config.drop_fall_speed);
        self.leave_wall();
        self.timers.dropped_at = Some(now);
        info!("{} drops from ledge", self.id);
    }

    fn leave_wall(&mut self) {
        self.flags.remove(CharacterFlags::WALL_STATES);
        self.hang_ledge_y = None;
    }

    /// Presentation finished the clip for `ability`.
    ///
    /// `velocity` is the character's current velocity; a finished roll
    /// bleeds off to half of max speed.
    pub fn on_ability_animation_complete(
        &mut self,
        ability: Ability,
        velocity: &mut Vec2,
        config: &MovementConfig,
    ) {
        match ability {
            Ability::Attack => self.flags.remove(CharacterFlags::ATTACKING),
            Ability::Turn => self.flags.remove(CharacterFlags::TURNING),
            Ability::Roll => {
                if !self.has(CharacterFlags::ROLLING) {
                    return;
                }
                self.flags
                    .remove(CharacterFlags::ROLLING | CharacterFlags::TURNING);
                let exit_speed = config.max_speed * config.roll_exit_factor;
                velocity.x = velocity.x.clamp(-exit_speed, exit_speed);
            }
        }
        debug!("{} finished {:?}", self.id, ability);
    }

    /// Mark the character dead and drop any rope.
    pub fn kill(&mut self) {
        self.flags.insert(CharacterFlags::DEAD);
        self.flags.remove(
            CharacterFlags::ATTACKING | CharacterFlags::ROLLING | CharacterFlags::TURNING,
        );
        self.grapple = super::GrappleState::Idle;
        self.pending_jump = false;
    }

    /// Simple gravity and floor clamp for frames where the physics engine
    /// is not ready yet.
    pub fn integrate_without_physics(
        &mut self,
        kin: &mut Kinematics,
        dt: f32,
        ground_y: f32,
        gravity: f32,
        config: &MovementConfig,
    ) {
        if self.pending_jump && self.is_grounded() {
            kin.velocity.y = -config.jump_impulse;
        }
        self.pending_jump = false;

        if !self.is_grounded() || kin.velocity.y < 0.0 {
            kin.velocity.y += gravity * dt;
        }
        kin.position += kin.velocity * dt;

        let floor = ground_y - self.hitbox(config).half_height();
        let landed = kin.position.y >= floor;
        if landed {
            kin.position.y = floor;
            kin.velocity.y = 0.0;
        }
        self.flags.set(CharacterFlags::GROUNDED, landed);
    }
}
