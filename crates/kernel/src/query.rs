//! Read-only lookups over a world's entities. Results are entity ids in
//! insertion order.

use tileworld_common::{EngineError, EngineResult, EntityId, Shape, Tag};

use crate::world::World;

fn require_capability(tag: Tag) -> EngineResult<()> {
    if tag.is_capability() {
        Ok(())
    } else {
        Err(EngineError::InvalidArgument(format!(
            "{tag} is a kind, expected a capability"
        )))
    }
}

impl World {
    pub fn objects(&self) -> Vec<EntityId> {
        self.arena.ids().collect()
    }

    /// Entities that are `tag`: carry it as a kind (primary or declared
    /// supertype) or as a capability.
    pub fn objects_of(&self, tag: Tag) -> Vec<EntityId> {
        self.arena
            .iter()
            .filter(|(_, e)| e.matches(tag))
            .map(|(id, _)| id)
            .collect()
    }

    pub fn objects_of_not(&self, tag: Tag) -> Vec<EntityId> {
        self.arena
            .iter()
            .filter(|(_, e)| !e.matches(tag))
            .map(|(id, _)| id)
            .collect()
    }

    /// Like [`World::objects_of`], but refuses kind tags.
    pub fn objects_of_capability(&self, capability: Tag) -> EngineResult<Vec<EntityId>> {
        require_capability(capability)?;
        Ok(self.objects_of(capability))
    }

    /// Entities standing exactly on grid cell `(x, y)`. Hitboxes are not
    /// consulted; see [`World::objects_intersecting`] for that.
    pub fn objects_at(&self, x: i32, y: i32, tag: Option<Tag>) -> Vec<EntityId> {
        self.arena
            .iter()
            .filter(|(_, e)| tag.is_none_or(|t| e.matches(t)))
            .filter(|(_, e)| e.position.x == x && e.position.y == y)
            .map(|(id, _)| id)
            .collect()
    }

    pub fn objects_of_capability_at(
        &self,
        x: i32,
        y: i32,
        capability: Tag,
    ) -> EngineResult<Vec<EntityId>> {
        require_capability(capability)?;
        Ok(self.objects_at(x, y, Some(capability)))
    }

    pub fn is_object_at(&self, x: i32, y: i32, tag: Option<Tag>) -> bool {
        !self.objects_at(x, y, tag).is_empty()
    }

    /// Entities whose grid position lies within Euclidean `range` of `(x, y)`,
    /// inclusive.
    pub fn objects_in_range(&self, x: i32, y: i32, range: f64, tag: Option<Tag>) -> Vec<EntityId> {
        self.arena
            .iter()
            .filter(|(_, e)| tag.is_none_or(|t| e.matches(t)))
            .filter(|(_, e)| e.distance_to_point(x, y) <= range)
            .map(|(id, _)| id)
            .collect()
    }

    /// Entities whose hitbox overlaps an arbitrary pixel-space shape.
    pub fn objects_intersecting(&self, shape: &Shape, tag: Option<Tag>) -> Vec<EntityId> {
        self.arena
            .iter()
            .filter(|(_, e)| tag.is_none_or(|t| e.matches(t)))
            .filter(|(_, e)| shape.intersects(&Shape::Rect(self.rect_for(e))))
            .map(|(id, _)| id)
            .collect()
    }

    /// Entities whose hitbox contains pixel `(x, y)`, in insertion order.
    pub fn hits_at(&self, x: i32, y: i32) -> Vec<EntityId> {
        self.arena
            .iter()
            .filter(|(_, e)| self.rect_for(e).contains(x, y))
            .map(|(id, _)| id)
            .collect()
    }
}
