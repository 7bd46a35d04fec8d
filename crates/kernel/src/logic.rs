use tileworld_common::EntityId;
use tileworld_input::{KeyEvent, PointerEvent, WindowEvent};

use crate::entity::AsAny;
use crate::world::World;

/// World-level hooks: the per-step update and the input callbacks.
///
/// Every method has an empty default, so a game implements only what it
/// uses. Errors are logged by the world and never abort the step.
pub trait WorldLogic: AsAny + Send {
    /// Runs once per step after input is drained and before entities tick.
    fn tick(&mut self, world: &mut World) -> anyhow::Result<()> {
        let _ = world;
        Ok(())
    }

    /// A stateless "typed" key event carrying a character.
    fn key_typed(&mut self, world: &mut World, event: &KeyEvent) -> anyhow::Result<()> {
        let _ = (world, event);
        Ok(())
    }

    fn key_pressed(&mut self, world: &mut World, event: &KeyEvent) -> anyhow::Result<()> {
        let _ = (world, event);
        Ok(())
    }

    fn key_released(&mut self, world: &mut World, event: &KeyEvent) -> anyhow::Result<()> {
        let _ = (world, event);
        Ok(())
    }

    /// Any pointer phase. `target` is the first entity, in world order,
    /// whose shape contains the pointer.
    fn pointer(
        &mut self,
        world: &mut World,
        event: &PointerEvent,
        target: Option<EntityId>,
    ) -> anyhow::Result<()> {
        let _ = (world, event, target);
        Ok(())
    }

    fn window(&mut self, world: &mut World, event: WindowEvent) -> anyhow::Result<()> {
        let _ = (world, event);
        Ok(())
    }
}
