//! Tile-grid worlds: the entity arena, spatial and tag queries, and the
//! per-step update that drains input, runs logic and repaints.
//!
//! # Invariants
//! - An entity belongs to at most one world; its [`EntityId`] is the only
//!   handle, and stale ids fail with `NotAttached`.
//! - Within one step, entities tick in insertion order and newcomers wait
//!   for the next step.

mod arena;
pub mod context;
pub mod entity;
pub mod frame;
pub mod logic;
mod query;
mod step;
pub mod world;

pub use context::EntityCtx;
pub use entity::{Anchor, AsAny, Behavior, Entity, Sprite, forward_delta, rotation_angle};
pub use frame::{Canvas, Drawable, Frame, PaintOrder};
pub use logic::WorldLogic;
pub use world::{World, WorldConfig};

pub use tileworld_common::{EngineError, EngineResult, EntityId, Tag};

pub fn crate_info() -> &'static str {
    "tileworld-kernel v0.1.0"
}

#[cfg(test)]
mod tests {
    #[test]
    fn crate_loads() {
        assert_eq!(super::crate_info(), "tileworld-kernel v0.1.0");
    }
}
