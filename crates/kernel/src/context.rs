use glam::IVec2;
use rand::rngs::StdRng;
use std::sync::Arc;
use tileworld_common::{EngineResult, EntityId, Shape, Tag};
use tileworld_input::InputBridge;

use crate::entity::{Entity, rotation_angle};
use crate::world::World;

/// An entity's view of its world during one of its callbacks.
///
/// Every entity-relative operation here forwards to the world with this
/// entity's id, so they fail with `NotAttached` once the entity has removed
/// itself.
pub struct EntityCtx<'w> {
    world: &'w mut World,
    id: EntityId,
}

impl<'w> EntityCtx<'w> {
    pub(crate) fn new(world: &'w mut World, id: EntityId) -> Self {
        Self { world, id }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn world(&self) -> &World {
        self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        self.world
    }

    pub fn is_attached(&self) -> bool {
        self.world.contains(self.id)
    }

    /// The entity itself. Its behavior slot is empty while the callback runs.
    pub fn entity(&self) -> EngineResult<&Entity> {
        self.world.entity(self.id)
    }

    pub fn position(&self) -> EngineResult<IVec2> {
        self.world.position(self.id)
    }

    pub fn rotation(&self) -> EngineResult<i32> {
        self.world.rotation(self.id)
    }

    pub fn set_position(&mut self, x: i32, y: i32) -> EngineResult<()> {
        self.world.set_position(self.id, x, y)
    }

    pub fn move_by(&mut self, dx: i32, dy: i32) -> EngineResult<()> {
        self.world.move_by(self.id, dx, dy)
    }

    pub fn move_forward(&mut self, distance: i32) -> EngineResult<()> {
        self.world.move_forward(self.id, distance)
    }

    pub fn set_rotation(&mut self, degrees: i32) -> EngineResult<()> {
        self.world.set_rotation(self.id, degrees)
    }

    pub fn rotate(&mut self, degrees: i32) -> EngineResult<()> {
        self.world.rotate(self.id, degrees)
    }

    /// Face the given grid cell.
    pub fn turn_towards(&mut self, x: i32, y: i32) -> EngineResult<()> {
        let p = self.position()?;
        let angle = rotation_angle(f64::from(x - p.x), f64::from(y - p.y));
        self.set_rotation(angle)
    }

    pub fn shape(&self) -> EngineResult<Shape> {
        self.world.shape_of(self.id)
    }

    pub fn is_touching(&self, tag: Option<Tag>) -> EngineResult<bool> {
        self.world.is_touching_any(self.id, tag)
    }

    pub fn is_touching_entity(&self, other: EntityId) -> EngineResult<bool> {
        self.world.is_touching(self.id, other)
    }

    pub fn touching(&self, tag: Option<Tag>) -> EngineResult<Vec<EntityId>> {
        self.world.touching(self.id, tag)
    }

    pub fn is_at_edge(&self) -> EngineResult<bool> {
        self.world.is_at_edge(self.id)
    }

    pub fn is_out_of_bounds(&self) -> EngineResult<bool> {
        self.world.is_out_of_bounds(self.id)
    }

    /// Shorthand for [`EntityCtx::is_out_of_bounds`].
    pub fn oob(&self) -> EngineResult<bool> {
        self.is_out_of_bounds()
    }

    pub fn objects_in_range(&self, range: f64, tag: Option<Tag>) -> EngineResult<Vec<EntityId>> {
        self.world.objects_in_range_of(self.id, range, tag)
    }

    pub fn objects_at_offset(&self, dx: i32, dy: i32, tag: Option<Tag>) -> EngineResult<Vec<EntityId>> {
        self.world.objects_at_offset(self.id, dx, dy, tag)
    }

    /// Add another entity to the same world. It is first ticked next step.
    pub fn spawn(&mut self, entity: Entity, x: i32, y: i32) -> EntityId {
        self.world.add_object(entity, x, y)
    }

    pub fn remove_self(&mut self) -> EngineResult<Entity> {
        self.world.remove_object(self.id)
    }

    pub fn input(&self) -> Option<Arc<InputBridge>> {
        self.world.input().cloned()
    }

    /// False when the world has no input bridge.
    pub fn is_key_down(&self, ch: char) -> bool {
        self.world.input().is_some_and(|b| b.is_key_down(ch))
    }

    pub fn rng(&mut self) -> &mut StdRng {
        self.world.rng()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{Behavior, Sprite};
    use tileworld_common::EngineError;
    use tileworld_input::KeyEvent;

    const ANT: Tag = Tag::kind("Ant");
    const FOOD: Tag = Tag::kind("Food");

    /// Eats touching food, then walks toward a fixed target.
    struct Forager {
        eaten: usize,
        after_removal: Option<EngineError>,
    }

    impl Behavior for Forager {
        fn tick(&mut self, ctx: &mut EntityCtx<'_>) -> anyhow::Result<()> {
            for food in ctx.touching(Some(FOOD))? {
                ctx.world_mut().remove_object(food)?;
                self.eaten += 1;
            }
            if ctx.is_key_down('q') {
                ctx.remove_self()?;
                self.after_removal = ctx.position().err();
                return Ok(());
            }
            ctx.turn_towards(9, 0)?;
            ctx.move_forward(1)?;
            Ok(())
        }
    }

    fn forager() -> Forager {
        Forager {
            eaten: 0,
            after_removal: None,
        }
    }

    #[test]
    fn forager_eats_and_walks() {
        let mut w = World::default();
        let ant = w.add_object(
            Entity::new(ANT)
                .with_sprite(Sprite::blank(16, 16))
                .with_behavior(forager()),
            0,
            0,
        );
        w.add_object(Entity::new(FOOD).with_sprite(Sprite::blank(16, 16)), 0, 0);
        w.step();
        assert_eq!(w.behavior::<Forager>(ant).unwrap().eaten, 1);
        assert_eq!(w.position(ant).unwrap(), IVec2::new(1, 0));
        assert_eq!(w.rotation(ant).unwrap(), 0);
        assert!(w.objects_of(FOOD).is_empty());
    }

    #[test]
    fn operations_after_self_removal_fail() {
        let bridge = Arc::new(InputBridge::new());
        let mut w = World::default().with_input(bridge.clone());
        let ant = w.add_object(Entity::new(ANT).with_behavior(forager()), 3, 3);
        bridge.on_key_pressed(KeyEvent::pressed('Q'));
        w.step();
        assert!(!w.contains(ant));
        assert_eq!(w.entity_count(), 0);
    }

    #[test]
    fn ctx_reports_not_attached_after_removal() {
        let mut w = World::default();
        let id = w.add_object(Entity::new(ANT), 1, 1);
        let mut ctx = EntityCtx::new(&mut w, id);
        assert!(ctx.is_attached());
        assert!(ctx.remove_self().is_ok());
        assert!(!ctx.is_attached());
        assert_eq!(ctx.move_by(1, 0), Err(EngineError::NotAttached(id)));
        assert!(ctx.is_at_edge().is_err());
        assert!(!ctx.is_key_down('a'));
    }

    #[test]
    fn turn_towards_uses_compass_angles() {
        let mut w = World::default();
        let id = w.add_object(Entity::new(ANT), 5, 5);
        let mut ctx = EntityCtx::new(&mut w, id);
        ctx.turn_towards(5, 9).unwrap();
        assert_eq!(ctx.rotation().unwrap(), 90);
        ctx.turn_towards(1, 5).unwrap();
        assert_eq!(ctx.rotation().unwrap(), 180);
        ctx.turn_towards(5, 0).unwrap();
        assert_eq!(ctx.rotation().unwrap(), 270);
    }
}
