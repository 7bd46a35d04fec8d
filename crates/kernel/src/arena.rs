//! Slot arena holding a world's entities.
//!
//! Iteration follows insertion order. Removal vacates the slot at once (the
//! generation bump invalidates old handles) but the order list is only
//! compacted, and the slot only reused, outside an entity pass. That keeps
//! positional iteration during a pass stable without copying the collection.

use tileworld_common::EntityId;

use crate::entity::{Behavior, Entity};

#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    entity: Option<Entity>,
}

#[derive(Debug, Default)]
pub(crate) struct Arena {
    slots: Vec<Slot>,
    order: Vec<EntityId>,
    free: Vec<u32>,
    pending_free: Vec<u32>,
    live: usize,
    in_pass: bool,
}

impl Arena {
    pub fn insert(&mut self, mut entity: Entity) -> EntityId {
        let index = match self.free.pop() {
            Some(index) => index,
            None => {
                self.slots.push(Slot::default());
                (self.slots.len() - 1) as u32
            }
        };
        let slot = &mut self.slots[index as usize];
        let id = EntityId::new(index, slot.generation);
        entity.id = Some(id);
        slot.entity = Some(entity);
        self.order.push(id);
        self.live += 1;
        id
    }

    pub fn remove(&mut self, id: EntityId) -> Option<Entity> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        let mut entity = slot.entity.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        entity.id = None;
        self.pending_free.push(id.index);
        self.live -= 1;
        if !self.in_pass {
            self.compact();
        }
        Some(entity)
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.slots
            .get(id.index as usize)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.entity.as_ref())
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.entity.as_mut())
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.live
    }

    /// Live entities in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &Entity)> + '_ {
        self.order
            .iter()
            .filter_map(move |id| self.get(*id).map(|e| (*id, e)))
    }

    pub fn ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.iter().map(|(id, _)| id)
    }

    /// Number of order positions, including entries vacated mid-pass.
    pub fn order_len(&self) -> usize {
        self.order.len()
    }

    pub fn order_at(&self, position: usize) -> Option<EntityId> {
        self.order.get(position).copied()
    }

    pub fn begin_pass(&mut self) {
        self.in_pass = true;
    }

    pub fn end_pass(&mut self) {
        self.in_pass = false;
        self.compact();
    }

    pub fn take_behavior(&mut self, id: EntityId) -> Option<Box<dyn Behavior>> {
        self.get_mut(id).and_then(|e| e.behavior.take())
    }

    /// Put a behavior back after its callback. Dropped if the entity left
    /// the world meanwhile, or if the callback installed a replacement.
    pub fn restore_behavior(&mut self, id: EntityId, behavior: Box<dyn Behavior>) {
        if let Some(entity) = self.get_mut(id) {
            if entity.behavior.is_none() {
                entity.behavior = Some(behavior);
            }
        }
    }

    fn compact(&mut self) {
        if self.pending_free.is_empty() {
            return;
        }
        let slots = &self.slots;
        self.order.retain(|id| {
            slots
                .get(id.index as usize)
                .is_some_and(|s| s.generation == id.generation && s.entity.is_some())
        });
        self.free.append(&mut self.pending_free);
    }
}
