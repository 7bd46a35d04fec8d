//! The demo garden: beetles wander, leaves regrow, and a gardener steered
//! with w/a/s/d collects leaves.

use anyhow::Context as _;
use rand::Rng;
use tileworld_assets::{AssetStore, ImageAsset};
use tileworld_common::{EntityId, Tag};
use tileworld_input::{KeyEvent, PointerEvent, PointerPhase};
use tileworld_kernel::{Behavior, Entity, EntityCtx, World, WorldConfig, WorldLogic};

pub const BEETLE: Tag = Tag::kind("Beetle");
pub const LEAF: Tag = Tag::kind("Leaf");
pub const GARDENER: Tag = Tag::kind("Gardener");
pub const EDIBLE: Tag = Tag::capability("Edible");

pub const WIDTH: i32 = 16;
pub const HEIGHT: i32 = 10;
pub const CELL: i32 = 16;
const LEAVES: usize = 6;

/// Random walk: keep heading, sometimes turn a quarter, bounce off edges.
#[derive(Debug, Default)]
pub struct Wander {
    pub steps: u32,
}

impl Behavior for Wander {
    fn tick(&mut self, ctx: &mut EntityCtx<'_>) -> anyhow::Result<()> {
        let turn = ctx.rng().random_range(0..8);
        match turn {
            0 => ctx.rotate(90)?,
            1 => ctx.rotate(-90)?,
            _ => {}
        }
        if ctx.is_at_edge()? {
            let p = ctx.position()?;
            ctx.turn_towards(WIDTH / 2, HEIGHT / 2)?;
            tracing::trace!(x = p.x, y = p.y, "beetle bounced");
        }
        ctx.move_forward(1)?;
        self.steps += 1;
        Ok(())
    }
}

/// Keyboard-driven collector. A click on it pauses or resumes it.
#[derive(Debug, Default)]
pub struct Gardener {
    pub collected: u32,
    pub paused: bool,
}

impl Behavior for Gardener {
    fn tick(&mut self, ctx: &mut EntityCtx<'_>) -> anyhow::Result<()> {
        for leaf in ctx.touching(Some(EDIBLE))? {
            ctx.world_mut().remove_object(leaf)?;
            self.collected += 1;
        }
        if self.paused {
            return Ok(());
        }
        let (mut dx, mut dy) = (0, 0);
        if ctx.is_key_down('a') {
            dx -= 1;
        }
        if ctx.is_key_down('d') {
            dx += 1;
        }
        if ctx.is_key_down('w') {
            dy -= 1;
        }
        if ctx.is_key_down('s') {
            dy += 1;
        }
        if dx != 0 || dy != 0 {
            ctx.move_by(dx, dy)?;
        }
        Ok(())
    }

    fn on_pointer(&mut self, _ctx: &mut EntityCtx<'_>, event: &PointerEvent) -> anyhow::Result<()> {
        if event.phase == PointerPhase::Clicked {
            self.paused = !self.paused;
        }
        Ok(())
    }
}

/// Regrows leaves when the field runs bare and counts typed keys.
#[derive(Debug, Default)]
pub struct Garden {
    pub regrowths: u32,
    pub typed: u32,
    pub clicks_on_entities: u32,
}

impl WorldLogic for Garden {
    fn tick(&mut self, world: &mut World) -> anyhow::Result<()> {
        if world.objects_of(LEAF).is_empty() {
            scatter_leaves(world, LEAVES);
            self.regrowths += 1;
        }
        Ok(())
    }

    fn key_typed(&mut self, _world: &mut World, _event: &KeyEvent) -> anyhow::Result<()> {
        self.typed += 1;
        Ok(())
    }

    fn pointer(
        &mut self,
        _world: &mut World,
        event: &PointerEvent,
        target: Option<EntityId>,
    ) -> anyhow::Result<()> {
        if event.phase == PointerPhase::Clicked && target.is_some() {
            self.clicks_on_entities += 1;
        }
        Ok(())
    }
}

fn scatter_leaves(world: &mut World, count: usize) {
    for _ in 0..count {
        let x = world.rng().random_range(0..WIDTH);
        let y = world.rng().random_range(0..HEIGHT);
        world.add_object(Entity::new(LEAF).with_capability(EDIBLE), x, y);
    }
}

pub fn assets() -> anyhow::Result<AssetStore> {
    let mut store = AssetStore::new();
    for (name, size) in [("beetle", 12), ("leaf", 8), ("gardener", 16)] {
        store
            .register_image(ImageAsset {
                name: name.into(),
                path: format!("images/{name}.png"),
                width: size,
                height: size,
            })
            .with_context(|| format!("registering {name}"))?;
    }
    Ok(store)
}

/// Build the garden. Returns the world and the gardener's id.
pub fn garden(seed: u64) -> anyhow::Result<(World, EntityId)> {
    let store = assets()?;
    let config = WorldConfig::new(WIDTH, HEIGHT, CELL)
        .with_hard_edge(true)
        .with_seed(seed);
    let mut world = World::with_config(config)?.with_logic(Garden::default());
    world.set_paint_order(&[GARDENER, BEETLE, LEAF]);

    for i in 0..3 {
        let beetle = Entity::new(BEETLE)
            .with_sprite(store.sprite("beetle")?)
            .with_rotation(i * 90)
            .with_behavior(Wander::default());
        world.add_object(beetle, 2 + i * 5, 2 + i * 2);
    }
    scatter_leaves(&mut world, LEAVES);
    let gardener = Entity::new(GARDENER)
        .with_sprite(store.sprite("gardener")?)
        .with_behavior(Gardener::default());
    let gardener = world.add_object(gardener, WIDTH / 2, HEIGHT / 2);
    Ok((world, gardener))
}

/// Pixel centre of a grid cell, for scripted clicks.
pub fn cell_center(x: i32, y: i32) -> (i32, i32) {
    (x * CELL + CELL / 2, y * CELL + CELL / 2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tileworld_input::InputBridge;

    #[test]
    fn garden_layout() {
        let (world, gardener) = garden(1).unwrap();
        assert_eq!(world.objects_of(BEETLE).len(), 3);
        assert_eq!(world.objects_of(EDIBLE).len(), LEAVES);
        assert_eq!(world.position(gardener).unwrap().x, WIDTH / 2);
    }

    #[test]
    fn same_seed_same_garden() {
        let run = |seed| {
            let (mut world, _) = garden(seed).unwrap();
            for _ in 0..25 {
                world.step();
            }
            world
                .entities()
                .map(|(_, e)| (e.x(), e.y()))
                .collect::<Vec<_>>()
        };
        assert_eq!(run(9), run(9));
    }

    #[test]
    fn gardener_follows_keys_and_pauses_on_click() {
        let bridge = Arc::new(InputBridge::new());
        let (world, gardener) = garden(3).unwrap();
        let mut world = world.with_input(bridge.clone());
        world.remove_objects_of(BEETLE);

        bridge.on_key_pressed(KeyEvent::pressed('d'));
        world.step();
        world.step();
        assert_eq!(world.position(gardener).unwrap().x, WIDTH / 2 + 2);

        let p = world.position(gardener).unwrap();
        let (px, py) = cell_center(p.x, p.y);
        bridge.on_pointer_clicked(PointerEvent::click(px, py));
        world.step();
        world.step();
        assert!(world.behavior::<Gardener>(gardener).unwrap().paused);
        assert_eq!(world.position(gardener).unwrap(), p);
        assert_eq!(world.logic::<Garden>().unwrap().clicks_on_entities, 1);
    }

    #[test]
    fn leaves_regrow_once_collected() {
        let (mut world, _) = garden(5).unwrap();
        world.remove_objects_of(LEAF);
        world.step();
        assert_eq!(world.objects_of(LEAF).len(), LEAVES);
        assert_eq!(world.logic::<Garden>().unwrap().regrowths, 1);
    }
}
