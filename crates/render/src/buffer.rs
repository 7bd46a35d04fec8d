use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use tileworld_kernel::{Canvas, Frame};

/// Canvas that keeps the most recent frame for a presentation thread to
/// pick up. Older frames are overwritten, never queued.
#[derive(Debug, Default)]
pub struct FrameBuffer {
    latest: Mutex<Option<Frame>>,
    repaints: AtomicU64,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn latest(&self) -> Option<Frame> {
        self.latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn take(&self) -> Option<Frame> {
        self.latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    /// Frames received since creation.
    pub fn repaints(&self) -> u64 {
        self.repaints.load(Ordering::Relaxed)
    }
}

impl Canvas for FrameBuffer {
    fn repaint(&self, frame: Frame) {
        *self.latest.lock().unwrap_or_else(PoisonError::into_inner) = Some(frame);
        self.repaints.fetch_add(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tileworld_kernel::World;

    #[test]
    fn keeps_only_latest_frame() {
        let buffer = Arc::new(FrameBuffer::new());
        let mut world = World::default().with_canvas(buffer.clone());
        assert!(buffer.latest().is_none());
        world.step();
        world.step();
        world.step();
        assert_eq!(buffer.repaints(), 3);
        assert_eq!(buffer.latest().unwrap().tick, 3);
        assert_eq!(buffer.take().unwrap().tick, 3);
        assert!(buffer.take().is_none());
    }
}
