//! Dense component column with a sparse id index.

use std::collections::HashMap;

use super::EntityId;

/// One table of the registry: values packed densely, located by id.
///
/// Iteration follows insertion order until the first removal; removals swap
/// the last row into the freed slot.
#[derive(Debug, Clone)]
pub struct Column<T> {
    ids: Vec<EntityId>,
    values: Vec<T>,
    index: HashMap<EntityId, usize>,
}

impl<T> Default for Column<T> {
    fn default() -> Self {
        Self {
            ids: Vec::new(),
            values: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<T> Column<T> {
    /// Insert or overwrite the value for `id`.
    pub fn insert(&mut self, id: EntityId, value: T) {
        if let Some(&row) = self.index.get(&id) {
            self.values[row] = value;
            return;
        }
        self.index.insert(id, self.values.len());
        self.ids.push(id);
        self.values.push(value);
    }

    pub fn remove(&mut self, id: EntityId) -> Option<T> {
        let row = self.index.remove(&id)?;
        let last = self.values.len() - 1;
        if row != last {
            let moved = self.ids[last];
            self.index.insert(moved, row);
        }
        self.ids.swap_remove(row);
        Some(self.values.swap_remove(row))
    }

    pub fn get(&self, id: EntityId) -> Option<&T> {
        self.index.get(&id).map(|&row| &self.values[row])
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut T> {
        self.index.get(&id).map(|&row| &mut self.values[row])
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn ids(&self) -> &[EntityId] {
        &self.ids
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &T)> {
        self.ids.iter().copied().zip(self.values.iter())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn clear(&mut self) {
        self.ids.clear();
        self.values.clear();
        self.index.clear();
    }
}
