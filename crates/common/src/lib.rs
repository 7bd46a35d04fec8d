//! Shared types for the tileworld engine.
//!
//! # Invariants
//! - Handles are plain data; holding one never keeps a world or entity alive.
//! - Entity metadata is declared through [`Tag`]s, never discovered at runtime.

mod error;
mod shape;
mod types;

pub use error::{EngineError, EngineResult};
pub use shape::{Rect, Shape};
pub use types::{
    ClipHandle, EntityId, FontHandle, ImageHandle, Tag, TagClass, TickableId, WorldId,
};

pub fn crate_info() -> &'static str {
    "tileworld-common v0.1.0"
}
