use crate::tickable::SharedWorld;

/// Display side of the engine: whatever owns the drawable surface.
///
/// The engine calls `show_world` after an active-world switch. The switch can
/// be issued from inside a world's tick, while that world is locked, so an
/// implementation must not block on any world lock here; record the new
/// target and pick it up on the presentation's own thread.
pub trait Presentation: Send + Sync {
    fn show_world(&self, world: &SharedWorld);
}
