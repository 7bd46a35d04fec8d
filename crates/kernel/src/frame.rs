//! Draw snapshot handed to the presentation once per step.

use serde::Serialize;
use tileworld_common::{EntityId, ImageHandle, Rect, Tag, WorldId};

use crate::entity::Anchor;

/// One entity as it should be drawn.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Drawable {
    pub id: EntityId,
    pub kind: &'static str,
    pub cell: [i32; 2],
    /// Pixel bounds of the hitbox, i.e. where the image lands.
    pub bounds: Rect,
    pub rotation: i32,
    pub image: Option<ImageHandle>,
    pub anchor: Anchor,
}

/// Everything a presentation needs to repaint a world.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Frame {
    pub world: WorldId,
    pub tick: u64,
    pub abs_width: i32,
    pub abs_height: i32,
    pub cell_size: i32,
    pub background: Option<ImageHandle>,
    pub background_opacity: f64,
    /// Back to front.
    pub drawables: Vec<Drawable>,
}

/// Repaint sink implemented by the presentation layer.
///
/// Called from the engine thread at the end of every world step; an
/// implementation should store or forward the frame and return quickly.
pub trait Canvas: Send + Sync {
    fn repaint(&self, frame: Frame);
}

/// Draw precedence declared with `World::set_paint_order`.
///
/// The first listed kind is painted on top. Entities matching none of the
/// listed kinds are painted first, underneath, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaintOrder {
    kinds: Vec<Tag>,
}

impl PaintOrder {
    pub fn new(kinds: &[Tag]) -> Self {
        Self {
            kinds: kinds.iter().map(|k| k.as_kind()).collect(),
        }
    }

    pub fn kinds(&self) -> &[Tag] {
        &self.kinds
    }

    /// Sort layer for an entity with the given kinds; lower draws first.
    pub fn layer(&self, entity_kinds: &[Tag]) -> usize {
        match self.kinds.iter().position(|k| entity_kinds.contains(k)) {
            Some(precedence) => self.kinds.len() - precedence,
            None => 0,
        }
    }
}
