//! Generational slot storage for entities.
//!
//! Handles carry a generation; a slot bumps its generation when freed, so a
//! stale [`EntityId`] never resolves to the entity that reused its slot.

use laserline_common::EntityId;

use crate::error::{GameplayError, GameplayResult};

#[derive(Debug)]
struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Arena-based storage with a free list and generational handles.
#[derive(Debug)]
pub struct EntityArena<T> {
    slots: Vec<Slot<T>>,
    free_list: Vec<usize>,
    len: usize,
}

impl<T> Default for EntityArena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> EntityArena<T> {
    /// Creates an empty arena.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
            len: 0,
        }
    }

    /// Returns the number of live values.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Checks if the arena is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Inserts a value built from its future handle.
    pub fn insert_with(&mut self, build: impl FnOnce(EntityId) -> T) -> EntityId {
        let index = match self.free_list.pop() {
            Some(index) => index,
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    value: None,
                });
                self.slots.len() - 1
            },
        };

        let slot = &mut self.slots[index];
        let id = EntityId::new(index as u32, slot.generation);
        slot.value = Some(build(id));
        self.len += 1;
        id
    }

    fn slot(&self, id: EntityId) -> Option<&Slot<T>> {
        self.slots
            .get(id.index() as usize)
            .filter(|slot| slot.generation == id.generation())
    }

    /// Removes a value, invalidating its handle.
    pub fn remove(&mut self, id: EntityId) -> GameplayResult<T> {
        let index = id.index() as usize;
        let slot = self
            .slots
            .get_mut(index)
            .filter(|slot| slot.generation == id.generation())
            .ok_or(GameplayError::NotFound(id))?;
        let value = slot.value.take().ok_or(GameplayError::NotFound(id))?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free_list.push(index);
        self.len -= 1;
        Ok(value)
    }

    /// Returns the value behind a handle.
    pub fn get(&self, id: EntityId) -> GameplayResult<&T> {
        self.slot(id)
            .and_then(|slot| slot.value.as_ref())
            .ok_or(GameplayError::NotFound(id))
    }

    /// Returns the value behind a handle mutably.
    pub fn get_mut(&mut self, id: EntityId) -> GameplayResult<&mut T> {
        self.slots
            .get_mut(id.index() as usize)
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.value.as_mut())
            .ok_or(GameplayError::NotFound(id))
    }

    /// Checks if a handle resolves to a live value.
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.slot(id).is_some_and(|slot| slot.value.is_some())
    }

    /// Iterates over live values with their handles.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &T)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.value
                .as_ref()
                .map(|value| (EntityId::new(index as u32, slot.generation), value))
        })
    }

    /// Iterates mutably over live values with their handles.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (EntityId, &mut T)> {
        self.slots.iter_mut().enumerate().filter_map(|(index, slot)| {
            let generation = slot.generation;
            slot.value
                .as_mut()
                .map(|value| (EntityId::new(index as u32, generation), value))
        })
    }

    /// Returns handles of all live values.
    pub fn ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.iter().map(|(id, _)| id)
    }

    /// Removes every value. Outstanding handles become stale.
    pub fn clear(&mut self) {
        self.free_list.clear();
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.value.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
            }
            self.free_list.push(index);
        }
        self.len = 0;
    }
}
