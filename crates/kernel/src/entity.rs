use glam::IVec2;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use tileworld_common::{EntityId, ImageHandle, Tag};
use tileworld_input::PointerEvent;

use crate::context::EntityCtx;

/// How an entity's pixel-space hitbox is derived from its grid position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Anchor {
    /// Centered on the entity's cell, shifted by the world offset.
    #[default]
    Center,
    /// Top-left corner at the raw grid coordinate.
    TopLeft,
    /// Drawn but without a hitbox; its shape has zero area.
    Unanchored,
}

/// Image handle plus the pixel size used for the hitbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sprite {
    pub image: Option<ImageHandle>,
    pub width: i32,
    pub height: i32,
    pub anchor: Anchor,
}

impl Sprite {
    pub fn new(image: ImageHandle, width: i32, height: i32) -> Self {
        Self {
            image: Some(image),
            width,
            height,
            anchor: Anchor::Center,
        }
    }

    /// A sprite without an image, only a hitbox of the given size.
    pub fn blank(width: i32, height: i32) -> Self {
        Self {
            image: None,
            width,
            height,
            anchor: Anchor::Center,
        }
    }

    pub fn with_anchor(mut self, anchor: Anchor) -> Self {
        self.anchor = anchor;
        self
    }
}

impl Default for Sprite {
    fn default() -> Self {
        Self::blank(1, 1)
    }
}

/// Blanket downcasting support for behavior and world-logic trait objects.
pub trait AsAny {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Per-entity logic, run once per world step.
///
/// Errors returned from a callback are logged by the world and do not stop
/// the step; the entity simply misses that update.
pub trait Behavior: AsAny + Send {
    fn tick(&mut self, ctx: &mut EntityCtx<'_>) -> anyhow::Result<()>;

    /// Raw pointer callback, raised for every entity whose shape contains the
    /// pointer position.
    fn on_pointer(&mut self, ctx: &mut EntityCtx<'_>, event: &PointerEvent) -> anyhow::Result<()> {
        let _ = (ctx, event);
        Ok(())
    }
}

/// A positioned, rotatable, image-bearing object.
///
/// Built detached; a world takes ownership on `add_object` and hands it
/// back on removal. While detached, setters store raw values and nothing
/// world-relative can be asked of it.
pub struct Entity {
    pub(crate) position: IVec2,
    pub(crate) rotation: i32,
    pub(crate) sprite: Sprite,
    kinds: Vec<Tag>,
    capabilities: Vec<Tag>,
    pub(crate) behavior: Option<Box<dyn Behavior>>,
    pub(crate) id: Option<EntityId>,
}

impl Entity {
    /// A new detached entity of the given kind at (0, 0), facing +x.
    pub fn new(kind: Tag) -> Self {
        Self {
            position: IVec2::ZERO,
            rotation: 0,
            sprite: Sprite::default(),
            kinds: vec![kind.as_kind()],
            capabilities: Vec::new(),
            behavior: None,
            id: None,
        }
    }

    /// Also match queries for a broader kind, e.g. `Enemy` also being an `Actor`.
    pub fn with_kind(mut self, kind: Tag) -> Self {
        let kind = kind.as_kind();
        if !self.kinds.contains(&kind) {
            self.kinds.push(kind);
        }
        self
    }

    pub fn with_capability(mut self, capability: Tag) -> Self {
        let capability = capability.as_capability();
        if !self.capabilities.contains(&capability) {
            self.capabilities.push(capability);
        }
        self
    }

    pub fn with_sprite(mut self, sprite: Sprite) -> Self {
        self.sprite = sprite;
        self
    }

    pub fn with_behavior(mut self, behavior: impl Behavior + 'static) -> Self {
        self.behavior = Some(Box::new(behavior));
        self
    }

    pub fn with_rotation(mut self, degrees: i32) -> Self {
        self.set_rotation(degrees);
        self
    }

    /// The most specific kind.
    pub fn kind(&self) -> Tag {
        self.kinds[0]
    }

    pub fn kinds(&self) -> &[Tag] {
        &self.kinds
    }

    pub fn capabilities(&self) -> &[Tag] {
        &self.capabilities
    }

    /// Kind tags match declared kinds, capability tags match declared capabilities.
    pub fn matches(&self, tag: Tag) -> bool {
        if tag.is_kind() {
            self.kinds.contains(&tag)
        } else {
            self.capabilities.contains(&tag)
        }
    }

    pub fn id(&self) -> Option<EntityId> {
        self.id
    }

    pub fn is_attached(&self) -> bool {
        self.id.is_some()
    }

    pub fn position(&self) -> IVec2 {
        self.position
    }

    pub fn x(&self) -> i32 {
        self.position.x
    }

    pub fn y(&self) -> i32 {
        self.position.y
    }

    /// Stores the raw position. Attached entities move through the world,
    /// which applies hard-edge clamping.
    pub fn set_position(&mut self, x: i32, y: i32) {
        self.position = IVec2::new(x, y);
    }

    /// Degrees in `0..360`; 0 faces +x and increasing values turn toward +y.
    pub fn rotation(&self) -> i32 {
        self.rotation
    }

    pub fn set_rotation(&mut self, degrees: i32) {
        self.rotation = degrees.rem_euclid(360);
    }

    pub fn rotate(&mut self, degrees: i32) {
        self.set_rotation(self.rotation.wrapping_add(degrees));
    }

    pub fn sprite(&self) -> &Sprite {
        &self.sprite
    }

    pub fn set_sprite(&mut self, sprite: Sprite) {
        self.sprite = sprite;
    }

    pub fn set_behavior(&mut self, behavior: impl Behavior + 'static) {
        self.behavior = Some(Box::new(behavior));
    }

    pub fn has_behavior(&self) -> bool {
        self.behavior.is_some()
    }

    pub fn behavior<T: Behavior + 'static>(&self) -> Option<&T> {
        self.behavior
            .as_deref()
            .and_then(|b| b.as_any().downcast_ref::<T>())
    }

    pub fn behavior_mut<T: Behavior + 'static>(&mut self) -> Option<&mut T> {
        self.behavior
            .as_deref_mut()
            .and_then(|b| b.as_any_mut().downcast_mut::<T>())
    }

    /// Euclidean distance between grid positions.
    pub fn distance_to_point(&self, x: i32, y: i32) -> f64 {
        let dx = (x as f64) - (self.position.x as f64);
        let dy = (y as f64) - (self.position.y as f64);
        (dx * dx + dy * dy).sqrt()
    }

    pub fn distance_to(&self, other: &Entity) -> f64 {
        self.distance_to_point(other.position.x, other.position.y)
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("kind", &self.kind().name())
            .field("id", &self.id)
            .field("position", &self.position)
            .field("rotation", &self.rotation)
            .field("sprite", &self.sprite)
            .field("has_behavior", &self.behavior.is_some())
            .finish()
    }
}

/// Grid delta of one `move_forward(distance)` at the given rotation.
///
/// Each axis is rounded half away from zero, so a forward step followed by
/// the opposite step can be off by one cell at non-axis-aligned angles.
pub fn forward_delta(rotation: i32, distance: i32) -> IVec2 {
    let radians = (rotation as f64).to_radians();
    let d = distance as f64;
    IVec2::new(
        (radians.cos() * d).round() as i32,
        (radians.sin() * d).round() as i32,
    )
}

/// Rotation in degrees (`0..360`) that faces along the vector `(dx, dy)`.
/// The zero vector faces 0.
pub fn rotation_angle(dx: f64, dy: f64) -> i32 {
    let len = (dx * dx + dy * dy).sqrt();
    if len == 0.0 {
        return 0;
    }
    let angle = (dx / len).clamp(-1.0, 1.0).acos().to_degrees().round() as i32;
    if dy < 0.0 { (360 - angle) % 360 } else { angle }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROCK: Tag = Tag::kind("Rock");
    const ACTOR: Tag = Tag::kind("Actor");
    const SOLID: Tag = Tag::capability("Solid");

    struct Counter(u32);

    impl Behavior for Counter {
        fn tick(&mut self, _ctx: &mut EntityCtx<'_>) -> anyhow::Result<()> {
            self.0 += 1;
            Ok(())
        }
    }

    #[test]
    fn new_entity_is_detached_at_origin() {
        let e = Entity::new(ROCK);
        assert!(!e.is_attached());
        assert_eq!(e.position(), IVec2::ZERO);
        assert_eq!(e.rotation(), 0);
        assert_eq!(e.kind(), ROCK);
        assert_eq!(e.sprite().anchor, Anchor::Center);
    }

    #[test]
    fn detached_set_position_is_raw() {
        let mut e = Entity::new(ROCK);
        e.set_position(-40, 900);
        assert_eq!((e.x(), e.y()), (-40, 900));
    }

    #[test]
    fn tags_are_normalized_by_role() {
        let e = Entity::new(ROCK)
            .with_kind(ACTOR)
            .with_kind(ACTOR)
            .with_capability(SOLID.as_kind());
        assert!(e.matches(ROCK));
        assert!(e.matches(ACTOR));
        assert!(e.matches(SOLID));
        assert!(!e.matches(SOLID.as_kind()));
        assert_eq!(e.kinds().len(), 2);
    }

    #[test]
    fn rotation_wraps_into_range() {
        let mut e = Entity::new(ROCK);
        e.set_rotation(-90);
        assert_eq!(e.rotation(), 270);
        e.rotate(100);
        assert_eq!(e.rotation(), 10);
        e.rotate(720);
        assert_eq!(e.rotation(), 10);
    }

    #[test]
    fn behavior_downcast() {
        let mut e = Entity::new(ROCK).with_behavior(Counter(3));
        assert_eq!(e.behavior::<Counter>().map(|c| c.0), Some(3));
        e.behavior_mut::<Counter>().unwrap().0 = 9;
        assert_eq!(e.behavior::<Counter>().map(|c| c.0), Some(9));
    }

    #[test]
    fn forward_delta_axis_aligned() {
        assert_eq!(forward_delta(0, 5), IVec2::new(5, 0));
        assert_eq!(forward_delta(90, 5), IVec2::new(0, 5));
        assert_eq!(forward_delta(180, 5), IVec2::new(-5, 0));
        assert_eq!(forward_delta(270, 5), IVec2::new(0, -5));
    }

    #[test]
    fn forward_delta_rounds_half_away_from_zero() {
        // cos(60°) * 3 = 1.5 -> 2, and the mirrored step -> -2
        assert_eq!(forward_delta(60, 3).x, 2);
        assert_eq!(forward_delta(60, -3).x, -2);
    }

    #[test]
    fn rotation_angle_faces_vector() {
        assert_eq!(rotation_angle(1.0, 0.0), 0);
        assert_eq!(rotation_angle(0.0, 1.0), 90);
        assert_eq!(rotation_angle(-1.0, 0.0), 180);
        assert_eq!(rotation_angle(0.0, -1.0), 270);
        assert_eq!(rotation_angle(0.0, 0.0), 0);
    }

    #[test]
    fn distance_is_euclidean() {
        let mut a = Entity::new(ROCK);
        let mut b = Entity::new(ROCK);
        a.set_position(0, 0);
        b.set_position(3, 4);
        assert_eq!(a.distance_to(&b), 5.0);
    }
}
