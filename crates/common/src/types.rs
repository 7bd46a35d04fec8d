use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Handle to an entity slot inside a world's arena.
///
/// The generation changes every time the slot is vacated, so a handle to a
/// removed entity never aliases whatever is stored in the slot later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId {
    pub index: u32,
    pub generation: u32,
}

impl EntityId {
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

/// Unique identifier for a world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WorldId(pub Uuid);

impl WorldId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for WorldId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for WorldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.8}", self.0.to_string())
    }
}

/// Identifier the engine hands out for each registered tickable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TickableId(pub u64);

impl fmt::Display for TickableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

/// Opaque handle to an image supplied by the asset store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ImageHandle(pub u64);

/// Opaque handle to a font supplied by the asset store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FontHandle(pub u64);

/// Opaque handle to an audio clip supplied by the asset store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClipHandle(pub u64);

/// What a [`Tag`] names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum TagClass {
    /// A concrete entity kind ("Player", "Wall").
    Kind,
    /// A capability an entity opts into ("Clickable", "Solid").
    Capability,
}

/// Declared entity metadata used by class and capability queries.
///
/// Entities list their kinds (most specific first) and capabilities when they
/// are built; world queries filter on those lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Tag {
    name: &'static str,
    class: TagClass,
}

impl Tag {
    pub const fn kind(name: &'static str) -> Self {
        Self {
            name,
            class: TagClass::Kind,
        }
    }

    pub const fn capability(name: &'static str) -> Self {
        Self {
            name,
            class: TagClass::Capability,
        }
    }

    pub const fn name(&self) -> &'static str {
        self.name
    }

    pub const fn class(&self) -> TagClass {
        self.class
    }

    pub fn is_kind(&self) -> bool {
        self.class == TagClass::Kind
    }

    pub fn is_capability(&self) -> bool {
        self.class == TagClass::Capability
    }

    /// The same name re-declared as a kind.
    pub const fn as_kind(self) -> Self {
        Self::kind(self.name)
    }

    /// The same name re-declared as a capability.
    pub const fn as_capability(self) -> Self {
        Self::capability(self.name)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn world_id_uniqueness() {
        assert_ne!(WorldId::new(), WorldId::new());
    }

    #[test]
    fn entity_id_orders_by_index_then_generation() {
        let a = EntityId::new(1, 0);
        let b = EntityId::new(1, 1);
        let c = EntityId::new(2, 0);
        assert!(a < b && b < c);
        assert_eq!(format!("{b}"), "1v1");
    }

    #[test]
    fn tags_distinguish_kind_from_capability() {
        const PLAYER: Tag = Tag::kind("Player");
        const CLICKABLE: Tag = Tag::capability("Clickable");
        assert!(PLAYER.is_kind());
        assert!(!PLAYER.is_capability());
        assert!(CLICKABLE.is_capability());
        assert_ne!(PLAYER, PLAYER.as_capability());
        assert_eq!(PLAYER.as_capability().as_kind(), PLAYER);
        assert_eq!(CLICKABLE.to_string(), "Clickable");
    }
}
