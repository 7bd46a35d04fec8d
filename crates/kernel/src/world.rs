use glam::IVec2;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::fmt;
use std::sync::Arc;
use tileworld_common::{
    EngineError, EngineResult, EntityId, ImageHandle, Rect, Shape, Tag, WorldId,
};
use tileworld_input::InputBridge;

use crate::arena::Arena;
use crate::entity::{Anchor, Behavior, Entity, Sprite, forward_delta};
use crate::frame::{Canvas, PaintOrder};
use crate::logic::WorldLogic;

/// Dimensions and policies a world is created with.
#[derive(Debug, Clone, PartialEq)]
pub struct WorldConfig {
    /// Cells along x.
    pub width: i32,
    /// Cells along y.
    pub height: i32,
    /// Pixels per cell side.
    pub cell_size: i32,
    /// Clamp entity positions to the grid instead of letting them leave it.
    pub hard_edge: bool,
    /// Seed of the world's random source.
    pub seed: u64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: 10,
            height: 10,
            cell_size: 16,
            hard_edge: false,
            seed: 0,
        }
    }
}

impl WorldConfig {
    pub fn new(width: i32, height: i32, cell_size: i32) -> Self {
        Self {
            width,
            height,
            cell_size,
            ..Self::default()
        }
    }

    pub fn with_hard_edge(mut self, hard_edge: bool) -> Self {
        self.hard_edge = hard_edge;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn validate(&self) -> EngineResult<()> {
        check_dimensions(self.width, self.height, self.cell_size)
    }
}

fn check_dimensions(width: i32, height: i32, cell_size: i32) -> EngineResult<()> {
    if width <= 0 || height <= 0 || cell_size <= 0 {
        return Err(EngineError::InvalidArgument(format!(
            "world dimensions must be positive, got {width}x{height} cells of {cell_size}px"
        )));
    }
    if width.checked_mul(cell_size).is_none() || height.checked_mul(cell_size).is_none() {
        return Err(EngineError::InvalidArgument(format!(
            "world of {width}x{height} cells of {cell_size}px exceeds the pixel range"
        )));
    }
    Ok(())
}

/// A tile grid owning its entities.
///
/// The world is the only path to world-relative entity operations: an
/// [`EntityId`] that no longer names a live entity yields
/// [`EngineError::NotAttached`].
pub struct World {
    id: WorldId,
    width: i32,
    height: i32,
    cell_size: i32,
    hard_edge: bool,
    origin: IVec2,
    /// Pixel size last set explicitly; `scale_field` measures against it.
    surface: IVec2,
    rng: StdRng,
    pub(crate) arena: Arena,
    pub(crate) logic: Option<Box<dyn WorldLogic>>,
    pub(crate) input: Option<Arc<InputBridge>>,
    pub(crate) canvas: Option<Arc<dyn Canvas>>,
    pub(crate) paint_order: PaintOrder,
    background: Option<ImageHandle>,
    background_opacity: f64,
    pub(crate) tick: u64,
}

impl World {
    /// A world of `width` x `height` cells, `cell_size` pixels each.
    pub fn new(width: i32, height: i32, cell_size: i32) -> EngineResult<Self> {
        Self::with_config(WorldConfig::new(width, height, cell_size))
    }

    pub fn with_config(config: WorldConfig) -> EngineResult<Self> {
        config.validate()?;
        Ok(Self::from_valid(config))
    }

    fn from_valid(config: WorldConfig) -> Self {
        let world = Self {
            id: WorldId::new(),
            width: config.width,
            height: config.height,
            cell_size: config.cell_size,
            hard_edge: config.hard_edge,
            origin: IVec2::ZERO,
            surface: IVec2::new(
                config.width * config.cell_size,
                config.height * config.cell_size,
            ),
            rng: StdRng::seed_from_u64(config.seed),
            arena: Arena::default(),
            logic: None,
            input: None,
            canvas: None,
            paint_order: PaintOrder::default(),
            background: None,
            background_opacity: 1.0,
            tick: 0,
        };
        tracing::debug!(
            world = %world.id,
            width = world.width,
            height = world.height,
            cell_size = world.cell_size,
            "world created"
        );
        world
    }

    pub fn id(&self) -> WorldId {
        self.id
    }

    /// Steps taken so far.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    // --- dimensions ---

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn cell_size(&self) -> i32 {
        self.cell_size
    }

    pub fn abs_width(&self) -> i32 {
        self.width * self.cell_size
    }

    pub fn abs_height(&self) -> i32 {
        self.height * self.cell_size
    }

    pub fn hard_edge(&self) -> bool {
        self.hard_edge
    }

    pub fn set_hard_edge(&mut self, hard_edge: bool) {
        self.hard_edge = hard_edge;
    }

    /// Location of the drawing surface, set by the presentation.
    pub fn origin(&self) -> IVec2 {
        self.origin
    }

    pub fn set_origin(&mut self, x: i32, y: i32) {
        self.origin = IVec2::new(x, y);
    }

    /// Pixel offset of cell centers: the surface origin plus half a cell.
    pub fn offset(&self) -> IVec2 {
        self.origin + IVec2::splat(self.cell_size / 2)
    }

    pub fn resize_field(&mut self, width: i32, height: i32) -> EngineResult<()> {
        check_dimensions(width, height, self.cell_size)?;
        self.width = width;
        self.height = height;
        self.surface = IVec2::new(self.abs_width(), self.abs_height());
        Ok(())
    }

    pub fn resize_cell(&mut self, cell_size: i32) -> EngineResult<()> {
        check_dimensions(self.width, self.height, cell_size)?;
        self.cell_size = cell_size;
        self.surface = IVec2::new(self.abs_width(), self.abs_height());
        Ok(())
    }

    /// Multiply the grid dimensions by `amount`.
    ///
    /// When the scaled grid would overflow the previous surface (growing) or
    /// leave more than a cell of slack in it (shrinking), the cell size is
    /// divided by `amount` so the surface keeps roughly its size.
    pub fn scale_field(&mut self, amount: f64) -> EngineResult<()> {
        if !(amount.is_finite() && amount > 0.0) {
            return Err(EngineError::InvalidArgument(format!(
                "scale amount must be positive and finite, got {amount}"
            )));
        }
        let width = (self.width as f64 * amount) as i32;
        let height = (self.height as f64 * amount) as i32;
        let mut cell = self.cell_size;
        let (sw, sh) = (self.surface.x as i64, self.surface.y as i64);
        let (w, h, c) = (width as i64, height as i64, cell as i64);
        let overflows = (w * c > sw || h * c > sh) && amount > 1.0;
        let slack = (sw > (w + 1) * c || sh > (h + 1) * c) && amount < 1.0;
        if overflows || slack {
            cell = (cell as f64 / amount) as i32;
        }
        check_dimensions(width, height, cell)?;
        self.width = width;
        self.height = height;
        self.cell_size = cell;
        Ok(())
    }

    // --- collaborators ---

    pub fn set_logic(&mut self, logic: impl WorldLogic + 'static) {
        self.logic = Some(Box::new(logic));
    }

    pub fn with_logic(mut self, logic: impl WorldLogic + 'static) -> Self {
        self.set_logic(logic);
        self
    }

    pub fn logic<T: WorldLogic + 'static>(&self) -> Option<&T> {
        self.logic
            .as_deref()
            .and_then(|l| l.as_any().downcast_ref::<T>())
    }

    pub fn logic_mut<T: WorldLogic + 'static>(&mut self) -> Option<&mut T> {
        self.logic
            .as_deref_mut()
            .and_then(|l| l.as_any_mut().downcast_mut::<T>())
    }

    /// Route the given bridge's events into this world on every step.
    pub fn attach_input(&mut self, bridge: Arc<InputBridge>) {
        self.input = Some(bridge);
    }

    pub fn with_input(mut self, bridge: Arc<InputBridge>) -> Self {
        self.attach_input(bridge);
        self
    }

    pub fn detach_input(&mut self) -> Option<Arc<InputBridge>> {
        self.input.take()
    }

    pub fn input(&self) -> Option<&Arc<InputBridge>> {
        self.input.as_ref()
    }

    pub fn set_canvas(&mut self, canvas: Arc<dyn Canvas>) {
        self.canvas = Some(canvas);
    }

    pub fn with_canvas(mut self, canvas: Arc<dyn Canvas>) -> Self {
        self.set_canvas(canvas);
        self
    }

    pub fn clear_canvas(&mut self) {
        self.canvas = None;
    }

    pub fn set_paint_order(&mut self, kinds: &[Tag]) {
        self.paint_order = PaintOrder::new(kinds);
    }

    pub fn paint_order(&self) -> &PaintOrder {
        &self.paint_order
    }

    pub fn set_background(&mut self, image: Option<ImageHandle>) {
        self.background = image;
    }

    pub fn background(&self) -> Option<ImageHandle> {
        self.background
    }

    /// Values below 1 let previous frames show through, fading trails.
    pub fn set_background_opacity(&mut self, opacity: f64) -> EngineResult<()> {
        if !(0.0..=1.0).contains(&opacity) {
            return Err(EngineError::InvalidArgument(format!(
                "background opacity must be within 0..=1, got {opacity}"
            )));
        }
        self.background_opacity = opacity;
        Ok(())
    }

    pub fn background_opacity(&self) -> f64 {
        self.background_opacity
    }

    /// The world's deterministic random source.
    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    // --- membership ---

    /// Attach `entity` at the given cell. The position goes through the same
    /// clamping as any later move.
    pub fn add_object(&mut self, mut entity: Entity, x: i32, y: i32) -> EntityId {
        entity.position = self.clamp(IVec2::new(x, y));
        let kind = entity.kind();
        let position = entity.position;
        let id = self.arena.insert(entity);
        tracing::debug!(world = %self.id, entity = %id, %kind, x = position.x, y = position.y, "entity added");
        id
    }

    /// Detach and return the entity.
    ///
    /// Called on an entity in the middle of its own callback, the entity comes
    /// back without its behavior, which is dropped when the callback returns.
    pub fn remove_object(&mut self, id: EntityId) -> EngineResult<Entity> {
        let entity = self.arena.remove(id).ok_or(EngineError::NotAttached(id))?;
        tracing::debug!(world = %self.id, entity = %id, "entity removed");
        Ok(entity)
    }

    /// Remove every listed entity that is still attached.
    pub fn remove_objects(&mut self, ids: impl IntoIterator<Item = EntityId>) -> Vec<Entity> {
        ids.into_iter()
            .filter_map(|id| self.arena.remove(id))
            .collect()
    }

    pub fn remove_objects_of(&mut self, tag: Tag) -> Vec<Entity> {
        let ids = self.objects_of(tag);
        self.remove_objects(ids)
    }

    pub fn remove_objects_of_capability(&mut self, capability: Tag) -> EngineResult<Vec<Entity>> {
        let ids = self.objects_of_capability(capability)?;
        Ok(self.remove_objects(ids))
    }

    /// Remove everything except entities of the listed kinds.
    pub fn remove_objects_exclusive(&mut self, keep: &[Tag]) -> Vec<Entity> {
        let ids: Vec<EntityId> = self
            .arena
            .iter()
            .filter(|(_, e)| !keep.iter().any(|k| e.matches(*k)))
            .map(|(id, _)| id)
            .collect();
        self.remove_objects(ids)
    }

    pub fn remove_all(&mut self) -> Vec<Entity> {
        let ids: Vec<EntityId> = self.arena.ids().collect();
        self.remove_objects(ids)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.arena.contains(id)
    }

    pub fn entity(&self, id: EntityId) -> EngineResult<&Entity> {
        self.arena.get(id).ok_or(EngineError::NotAttached(id))
    }

    pub fn entity_count(&self) -> usize {
        self.arena.len()
    }

    /// Live entities in insertion order.
    pub fn entities(&self) -> impl Iterator<Item = (EntityId, &Entity)> + '_ {
        self.arena.iter()
    }

    pub fn behavior<T: Behavior + 'static>(&self, id: EntityId) -> Option<&T> {
        self.arena.get(id).and_then(|e| e.behavior::<T>())
    }

    pub fn behavior_mut<T: Behavior + 'static>(&mut self, id: EntityId) -> Option<&mut T> {
        self.arena.get_mut(id).and_then(|e| e.behavior_mut::<T>())
    }

    pub fn set_behavior(&mut self, id: EntityId, behavior: impl Behavior + 'static) -> EngineResult<()> {
        self.entity_mut(id)?.set_behavior(behavior);
        Ok(())
    }

    fn entity_mut(&mut self, id: EntityId) -> EngineResult<&mut Entity> {
        self.arena.get_mut(id).ok_or(EngineError::NotAttached(id))
    }

    // --- movement ---

    fn clamp(&self, p: IVec2) -> IVec2 {
        if self.hard_edge {
            IVec2::new(p.x.clamp(0, self.width - 1), p.y.clamp(0, self.height - 1))
        } else {
            p
        }
    }

    pub fn position(&self, id: EntityId) -> EngineResult<IVec2> {
        Ok(self.entity(id)?.position)
    }

    pub fn set_position(&mut self, id: EntityId, x: i32, y: i32) -> EngineResult<()> {
        let clamped = self.clamp(IVec2::new(x, y));
        self.entity_mut(id)?.position = clamped;
        Ok(())
    }

    pub fn set_x(&mut self, id: EntityId, x: i32) -> EngineResult<()> {
        let y = self.entity(id)?.position.y;
        self.set_position(id, x, y)
    }

    pub fn set_y(&mut self, id: EntityId, y: i32) -> EngineResult<()> {
        let x = self.entity(id)?.position.x;
        self.set_position(id, x, y)
    }

    pub fn move_by(&mut self, id: EntityId, dx: i32, dy: i32) -> EngineResult<()> {
        let p = self.entity(id)?.position;
        self.set_position(id, p.x.saturating_add(dx), p.y.saturating_add(dy))
    }

    pub fn move_by_vector(&mut self, id: EntityId, delta: [i32; 2]) -> EngineResult<()> {
        self.move_by(id, delta[0], delta[1])
    }

    /// Step `distance` cells along the current rotation, see [`forward_delta`].
    pub fn move_forward(&mut self, id: EntityId, distance: i32) -> EngineResult<()> {
        let entity = self.entity(id)?;
        let delta = forward_delta(entity.rotation, distance);
        self.move_by(id, delta.x, delta.y)
    }

    pub fn rotation(&self, id: EntityId) -> EngineResult<i32> {
        Ok(self.entity(id)?.rotation)
    }

    pub fn set_rotation(&mut self, id: EntityId, degrees: i32) -> EngineResult<()> {
        self.entity_mut(id)?.set_rotation(degrees);
        Ok(())
    }

    pub fn rotate(&mut self, id: EntityId, degrees: i32) -> EngineResult<()> {
        self.entity_mut(id)?.rotate(degrees);
        Ok(())
    }

    pub fn set_sprite(&mut self, id: EntityId, sprite: Sprite) -> EngineResult<()> {
        self.entity_mut(id)?.set_sprite(sprite);
        Ok(())
    }

    // --- spatial relations ---

    /// Pixel-space hitbox derived from the sprite anchor.
    pub(crate) fn rect_for(&self, entity: &Entity) -> Rect {
        let sprite = &entity.sprite;
        match sprite.anchor {
            Anchor::Center => {
                let offset = self.offset();
                let x = entity
                    .position
                    .x
                    .saturating_mul(self.cell_size)
                    .saturating_add(offset.x)
                    .saturating_sub(sprite.width / 2);
                let y = entity
                    .position
                    .y
                    .saturating_mul(self.cell_size)
                    .saturating_add(offset.y)
                    .saturating_sub(sprite.height / 2);
                Rect::new(x, y, sprite.width, sprite.height)
            }
            Anchor::TopLeft => Rect::new(
                entity.position.x,
                entity.position.y,
                sprite.width,
                sprite.height,
            ),
            Anchor::Unanchored => Rect::default(),
        }
    }

    pub fn shape_of(&self, id: EntityId) -> EngineResult<Shape> {
        Ok(Shape::Rect(self.rect_for(self.entity(id)?)))
    }

    /// Whether the two hitboxes share a positive area. An entity never
    /// touches itself.
    pub fn is_touching(&self, a: EntityId, b: EntityId) -> EngineResult<bool> {
        let ra = self.rect_for(self.entity(a)?);
        let rb = self.rect_for(self.entity(b)?);
        Ok(a != b && ra.intersects(&rb))
    }

    /// Entities matching `tag` (any entity for `None`) that touch `id`.
    pub fn touching(&self, id: EntityId, tag: Option<Tag>) -> EngineResult<Vec<EntityId>> {
        let me = self.rect_for(self.entity(id)?);
        Ok(self
            .arena
            .iter()
            .filter(|(other, e)| *other != id && tag.is_none_or(|t| e.matches(t)))
            .filter(|(_, e)| me.intersects(&self.rect_for(e)))
            .map(|(other, _)| other)
            .collect())
    }

    pub fn is_touching_any(&self, id: EntityId, tag: Option<Tag>) -> EngineResult<bool> {
        Ok(!self.touching(id, tag)?.is_empty())
    }

    /// With `absolute`, whether the hitbox contains pixel `(x, y)`; otherwise
    /// whether it overlaps grid cell `(x, y)`.
    pub fn is_at(&self, id: EntityId, x: i32, y: i32, absolute: bool) -> EngineResult<bool> {
        let me = self.rect_for(self.entity(id)?);
        if absolute {
            Ok(me.contains(x, y))
        } else {
            let c = self.cell_size;
            let cell = Rect::new(x.saturating_mul(c), y.saturating_mul(c), c, c);
            Ok(me.intersects(&cell))
        }
    }

    pub fn is_at_cell(&self, id: EntityId, x: i32, y: i32) -> EngineResult<bool> {
        self.is_at(id, x, y, false)
    }

    pub fn is_at_edge(&self, id: EntityId) -> EngineResult<bool> {
        let p = self.entity(id)?.position;
        Ok(p.x == 0 || p.x == self.width - 1 || p.y == 0 || p.y == self.height - 1)
    }

    /// Only possible without a hard edge.
    pub fn is_out_of_bounds(&self, id: EntityId) -> EngineResult<bool> {
        let p = self.entity(id)?.position;
        Ok(p.x < 0 || p.x >= self.width || p.y < 0 || p.y >= self.height)
    }

    pub fn distance_between(&self, a: EntityId, b: EntityId) -> EngineResult<f64> {
        Ok(self.entity(a)?.distance_to(self.entity(b)?))
    }

    pub fn objects_in_range_of(
        &self,
        id: EntityId,
        range: f64,
        tag: Option<Tag>,
    ) -> EngineResult<Vec<EntityId>> {
        let p = self.entity(id)?.position;
        Ok(self.objects_in_range(p.x, p.y, range, tag))
    }

    pub fn objects_at_offset(
        &self,
        id: EntityId,
        dx: i32,
        dy: i32,
        tag: Option<Tag>,
    ) -> EngineResult<Vec<EntityId>> {
        let p = self.entity(id)?.position;
        Ok(self.objects_at(p.x + dx, p.y + dy, tag))
    }

    pub fn objects_of_capability_at_offset(
        &self,
        id: EntityId,
        dx: i32,
        dy: i32,
        capability: Tag,
    ) -> EngineResult<Vec<EntityId>> {
        let p = self.entity(id)?.position;
        self.objects_of_capability_at(p.x + dx, p.y + dy, capability)
    }
}

impl Default for World {
    /// 10 x 10 cells of 16 pixels.
    fn default() -> Self {
        Self::from_valid(WorldConfig::default())
    }
}

impl fmt::Debug for World {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("World")
            .field("id", &self.id)
            .field("tick", &self.tick)
            .field("size", &(self.width, self.height))
            .field("cell_size", &self.cell_size)
            .field("hard_edge", &self.hard_edge)
            .field("entities", &self.arena.len())
            .field("has_input", &self.input.is_some())
            .finish()
    }
}
