//! Registry domain: typed columnar storage for positions, velocities,
//! terrain platforms and enemies.
//!
//! An entity is only an id; what it is depends on which tables hold a row for
//! it. Ids are never reused, so a stale id can only ever miss.

mod column;
mod components;

#[cfg(test)]
mod tests;

use bevy::math::Vec2;
use serde::Serialize;
use std::collections::HashSet;

pub use column::Column;
pub use components::*;

/// Opaque entity identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct EntityId(pub u32);

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A row type stored in one of the registry's tables.
pub trait Columnar: Sized + 'static {
    const TABLE: Table;

    fn column(registry: &EntityRegistry) -> &Column<Self>;
    fn column_mut(registry: &mut EntityRegistry) -> &mut Column<Self>;
}

macro_rules! columnar {
    ($ty:ty, $table:ident, $field:ident) => {
        impl Columnar for $ty {
            const TABLE: Table = Table::$table;

            fn column(registry: &EntityRegistry) -> &Column<Self> {
                &registry.$field
            }

            fn column_mut(registry: &mut EntityRegistry) -> &mut Column<Self> {
                &mut registry.$field
            }
        }
    };
}

columnar!(Position, Position, positions);
columnar!(Velocity, Velocity, velocities);
columnar!(Platform, Platform, platforms);
columnar!(Enemy, Enemy, enemies);

#[derive(Debug, Default)]
pub struct EntityRegistry {
    next_id: u32,
    alive: HashSet<EntityId>,
    positions: Column<Position>,
    velocities: Column<Velocity>,
    platforms: Column<Platform>,
    enemies: Column<Enemy>,
}

impl EntityRegistry {
    pub fn create(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        self.alive.insert(id);
        id
    }

    /// Drop the entity and every row it owns. Releasing any physics body is
    /// the caller's job.
    pub fn destroy(&mut self, id: EntityId) {
        if !self.alive.remove(&id) {
            return;
        }
        self.positions.remove(id);
        self.velocities.remove(id);
        self.platforms.remove(id);
        self.enemies.remove(id);
    }

    pub fn is_alive(&self, id: EntityId) -> bool {
        self.alive.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.alive.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alive.is_empty()
    }

    /// Attach (or overwrite) a row. Ignored for ids that are not alive.
    pub fn add<T: Columnar>(&mut self, id: EntityId, value: T) {
        if !self.is_alive(id) {
            return;
        }
        T::column_mut(self).insert(id, value);
    }

    pub fn get<T: Columnar>(&self, id: EntityId) -> Option<&T> {
        T::column(self).get(id)
    }

    pub fn get_mut<T: Columnar>(&mut self, id: EntityId) -> Option<&mut T> {
        T::column_mut(self).get_mut(id)
    }

    pub fn has<T: Columnar>(&self, id: EntityId) -> bool {
        T::column(self).contains(id)
    }

    /// Ids holding a row in `table`, in table order.
    pub fn query(&self, table: Table) -> Vec<EntityId> {
        match table {
            Table::Position => self.positions.ids().to_vec(),
            Table::Velocity => self.velocities.ids().to_vec(),
            Table::Platform => self.platforms.ids().to_vec(),
            Table::Enemy => self.enemies.ids().to_vec(),
        }
    }

    pub fn iter<T: Columnar>(&self) -> impl Iterator<Item = (EntityId, &T)> {
        T::column(self).iter()
    }

    /// Entities that hold both a position and a row of type `T`.
    pub fn placed<T: Columnar + Copy>(&self) -> impl Iterator<Item = (EntityId, Position, T)> + '_ {
        T::column(self)
            .iter()
            .filter_map(|(id, value)| self.positions.get(id).map(|pos| (id, *pos, *value)))
    }

    /// Destroy everything. Ids keep counting up so old handles stay dead.
    pub fn clear(&mut self) {
        self.alive.clear();
        self.positions.clear();
        self.velocities.clear();
        self.platforms.clear();
        self.enemies.clear();
    }

    pub fn spawn_platform(&mut self, center: Vec2, platform: Platform) -> EntityId {
        let id = self.create();
        self.add(id, Position(center));
        self.add(id, platform);
        id
    }

    pub fn spawn_enemy(&mut self, center: Vec2, enemy: Enemy) -> EntityId {
        let id = self.create();
        self.add(id, Position(center));
        self.add(id, Velocity(Vec2::new(-enemy.speed, 0.0)));
        self.add(id, enemy);
        id
    }
}
