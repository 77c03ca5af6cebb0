//! Physics domain: avian2d as the rigid-body engine behind [`PhysicsBackend`].
//!
//! Character bodies and terrain colliders are ECS entities tagged with the
//! registry id they mirror. Avian advances them in `FixedPostUpdate` between
//! the sim's movement and settle stages, so `step` is a no-op here. Spawns go through `Commands` and become visible to
//! queries on the next frame; reads for such bodies return `None` until then.

use avian2d::prelude::{
    Collider, CollisionLayers, Friction, GravityScale, LinearVelocity, LockedAxes, PhysicsLayer,
    Position, RigidBody, SpatialQueryFilter, SpatialQueryPipeline,
};
use bevy::ecs::system::SystemParam;
use bevy::prelude::*;
use std::collections::{HashMap, HashSet};

use super::{Aabb, PhysicsBackend, RayHit, StaticCollider};
use crate::registry::EntityId;

/// Physics layers for collision filtering
#[derive(PhysicsLayer, Clone, Copy, Debug, Default)]
pub enum RunnerLayer {
    #[default]
    Default,
    /// Ground tiles and platforms
    Terrain,
    /// Player and companion bodies
    Character,
}

/// Marks the avian body of a character.
#[derive(Component, Debug, Clone, Copy)]
pub struct CharacterBody(pub EntityId);

/// Marks the avian collider mirroring a terrain entity.
#[derive(Component, Debug, Clone, Copy)]
pub struct TerrainCollider(pub EntityId);

/// Registry id to avian entity links.
#[derive(Resource, Debug, Default)]
pub struct AvianLinks {
    characters: HashMap<EntityId, Entity>,
    terrain: HashMap<EntityId, (Entity, Aabb)>,
}

impl AvianLinks {
    /// The avian entity carrying the body for `id`.
    pub fn character(&self, id: EntityId) -> Option<Entity> {
        self.characters.get(&id).copied()
    }

    pub fn character_count(&self) -> usize {
        self.characters.len()
    }

    pub fn terrain_count(&self) -> usize {
        self.terrain.len()
    }
}

type BodyData = (
    &'static mut Position,
    &'static mut LinearVelocity,
    &'static mut GravityScale,
);

#[derive(SystemParam)]
pub struct AvianBackend<'w, 's> {
    commands: Commands<'w, 's>,
    /// Read directly: `SpatialQuery` also reads `Position` and would clash
    /// with the mutable body query.
    pipeline: Res<'w, SpatialQueryPipeline>,
    links: ResMut<'w, AvianLinks>,
    bodies: Query<'w, 's, BodyData, With<CharacterBody>>,
    terrain: Query<'w, 's, &'static TerrainCollider>,
}

impl AvianBackend<'_, '_> {
    fn character(&self, id: EntityId) -> Option<Entity> {
        self.links.character(id)
    }

    fn spawn_terrain(&mut self, collider: &StaticCollider) -> Entity {
        let size = collider.bounds.size();
        self.commands
            .spawn((
                Name::new(format!("terrain {}", collider.id)),
                TerrainCollider(collider.id),
                RigidBody::Static,
                Collider::rectangle(size.x, size.y),
                Position(collider.bounds.center()),
                Friction::new(0.0),
                CollisionLayers::new(RunnerLayer::Terrain, [RunnerLayer::Character]),
            ))
            .id()
    }
}

impl PhysicsBackend for AvianBackend<'_, '_> {
    fn spawn_body(&mut self, id: EntityId, center: Vec2, size: Vec2) {
        if let Some(old) = self.links.characters.remove(&id) {
            self.commands.entity(old).despawn();
        }

        let entity = self
            .commands
            .spawn((
                Name::new(format!("character {}", id)),
                CharacterBody(id),
                RigidBody::Dynamic,
                Collider::rectangle(size.x, size.y),
                LockedAxes::ROTATION_LOCKED,
                Position(center),
                LinearVelocity(Vec2::ZERO),
                GravityScale(1.0),
                Friction::new(0.0),
                CollisionLayers::new(RunnerLayer::Character, [RunnerLayer::Terrain]),
            ))
            .id();
        self.links.characters.insert(id, entity);
    }

    fn despawn_body(&mut self, id: EntityId) {
        if let Some(entity) = self.links.characters.remove(&id) {
            self.commands.entity(entity).despawn();
        }
    }

    fn reshape_body(&mut self, id: EntityId, center: Vec2, size: Vec2) {
        let Some(entity) = self.character(id) else {
            return;
        };
        self.commands
            .entity(entity)
            .insert((Collider::rectangle(size.x, size.y), Position(center)));
    }

    fn translation(&self, id: EntityId) -> Option<Vec2> {
        let entity = self.character(id)?;
        self.bodies.get(entity).ok().map(|(pos, ..)| pos.0)
    }

    fn set_translation(&mut self, id: EntityId, center: Vec2) {
        let Some(entity) = self.character(id) else {
            return;
        };
        match self.bodies.get_mut(entity) {
            Ok((mut pos, ..)) => pos.0 = center,
            Err(_) => {
                self.commands.entity(entity).insert(Position(center));
            }
        }
    }

    fn velocity(&self, id: EntityId) -> Option<Vec2> {
        let entity = self.character(id)?;
        self.bodies.get(entity).ok().map(|(_, vel, ..)| vel.0)
    }

    fn set_velocity(&mut self, id: EntityId, velocity: Vec2) {
        let Some(entity) = self.character(id) else {
            return;
        };
        match self.bodies.get_mut(entity) {
            Ok((_, mut vel, ..)) => vel.0 = velocity,
            Err(_) => {
                self.commands.entity(entity).insert(LinearVelocity(velocity));
            }
        }
    }

    fn set_gravity_scale(&mut self, id: EntityId, scale: f32) {
        let Some(entity) = self.character(id) else {
            return;
        };
        match self.bodies.get_mut(entity) {
            Ok((_, _, mut gravity)) => gravity.0 = scale,
            Err(_) => {
                self.commands.entity(entity).insert(GravityScale(scale));
            }
        }
    }

    fn set_kinematic(&mut self, id: EntityId, kinematic: bool) {
        let Some(entity) = self.character(id) else {
            return;
        };
        // `RigidBody` is immutable; swapping it in runs avian's body hooks.
        let body = if kinematic {
            RigidBody::Kinematic
        } else {
            RigidBody::Dynamic
        };
        self.commands.entity(entity).insert(body);
    }

    fn rebuild_statics(&mut self, colliders: &[StaticCollider]) {
        let mut live = HashSet::with_capacity(colliders.len());

        for collider in colliders {
            live.insert(collider.id);
            match self.links.terrain.get(&collider.id).copied() {
                Some((_, bounds)) if bounds == collider.bounds => {}
                Some((entity, _)) => {
                    let size = collider.bounds.size();
                    self.commands.entity(entity).insert((
                        Collider::rectangle(size.x, size.y),
                        Position(collider.bounds.center()),
                    ));
                    self.links.terrain.insert(collider.id, (entity, collider.bounds));
                }
                None => {
                    let entity = self.spawn_terrain(collider);
                    self.links.terrain.insert(collider.id, (entity, collider.bounds));
                }
            }
        }

        let stale: Vec<EntityId> = self
            .links
            .terrain
            .keys()
            .filter(|id| !live.contains(*id))
            .copied()
            .collect();
        for id in stale {
            if let Some((entity, _)) = self.links.terrain.remove(&id) {
                self.commands.entity(entity).despawn();
            }
        }
    }

    fn cast_ray(&self, origin: Vec2, direction: Dir2, max_distance: f32) -> Option<RayHit> {
        let filter = SpatialQueryFilter::from_mask(RunnerLayer::Terrain);
        let hit = self
            .pipeline
            .cast_ray(origin, direction, max_distance, true, &filter)?;
        let surface = self.terrain.get(hit.entity).ok()?;
        Some(RayHit {
            surface: surface.0,
            distance: hit.distance,
            normal: hit.normal,
        })
    }

    fn step(&mut self, _dt: f32) {}
}
