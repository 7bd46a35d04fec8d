use std::any::TypeId;
use std::fmt;
use std::sync::{Arc, Mutex};

use tileworld_common::TickableId;
use tileworld_kernel::World;

/// Anything the engine advances once per cycle.
pub trait Tickable: Send {
    fn tick(&mut self) -> anyhow::Result<()>;
}

impl Tickable for World {
    fn tick(&mut self) -> anyhow::Result<()> {
        self.step();
        Ok(())
    }
}

/// A world shared between the engine thread and the embedding code.
pub type SharedWorld = Arc<Mutex<World>>;

pub fn shared(world: World) -> SharedWorld {
    Arc::new(Mutex::new(world))
}

/// Registration record as reported by [`crate::Engine::tickables`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickableInfo {
    pub id: TickableId,
    /// Short type name of the registered value.
    pub label: String,
    pub is_world: bool,
    pub(crate) type_id: TypeId,
}

impl TickableInfo {
    pub(crate) fn of<T: 'static>(id: TickableId, is_world: bool) -> Self {
        let full = std::any::type_name::<T>();
        let label = full.rsplit("::").next().unwrap_or(full).to_string();
        Self {
            id,
            label,
            is_world,
            type_id: TypeId::of::<T>(),
        }
    }

    pub fn is<T: 'static>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }
}

impl fmt::Display for TickableInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.id, self.label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Blinker;

    impl Tickable for Blinker {
        fn tick(&mut self) -> anyhow::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn info_uses_short_type_name() {
        let info = TickableInfo::of::<Blinker>(TickableId(3), false);
        assert_eq!(info.label, "Blinker");
        assert!(info.is::<Blinker>());
        assert!(!info.is::<World>());
        assert_eq!(info.to_string(), "t3 (Blinker)");
    }

    #[test]
    fn world_tick_steps_the_world() {
        let mut world = World::default();
        Tickable::tick(&mut world).unwrap();
        Tickable::tick(&mut world).unwrap();
        assert_eq!(world.tick(), 2);
    }
}
