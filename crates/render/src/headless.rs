use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tileworld_engine::{Presentation, SharedWorld};
use tileworld_input::{InputBridge, KeyEvent, PointerEvent};
use tracing::debug;

use crate::buffer::FrameBuffer;
use crate::renderer::Renderer;

/// A presentation without a window: it owns a frame buffer and an input
/// bridge, and forwards scripted input the way a windowed front end
/// forwards OS events.
#[derive(Debug)]
pub struct HeadlessPresentation {
    buffer: Arc<FrameBuffer>,
    input: Arc<InputBridge>,
    shown: Mutex<Option<SharedWorld>>,
    /// World switched to but not yet wired to the buffer and bridge.
    pending: Mutex<bool>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Default for HeadlessPresentation {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessPresentation {
    pub fn new() -> Self {
        Self {
            buffer: Arc::new(FrameBuffer::new()),
            input: Arc::new(InputBridge::new()),
            shown: Mutex::new(None),
            pending: Mutex::new(false),
        }
    }

    pub fn input(&self) -> &Arc<InputBridge> {
        &self.input
    }

    pub fn buffer(&self) -> &Arc<FrameBuffer> {
        &self.buffer
    }

    pub fn shown(&self) -> Option<SharedWorld> {
        lock(&self.shown).clone()
    }

    /// Wire the shown world to this presentation's canvas and input. Call
    /// from the presentation side, outside any world tick.
    pub fn sync(&self) {
        if !std::mem::take(&mut *lock(&self.pending)) {
            return;
        }
        if let Some(world) = self.shown() {
            let mut world = lock(&world);
            world.set_canvas(self.buffer.clone());
            world.attach_input(self.input.clone());
            world.set_origin(0, 0);
            debug!(world = %world.id(), "presentation bound to world");
        }
    }

    /// Render the latest frame, if any has been painted.
    pub fn present<R: Renderer>(&self, renderer: &R) -> Option<R::Output> {
        self.sync();
        self.buffer.latest().map(|frame| renderer.render(&frame))
    }

    pub fn key(&self, event: KeyEvent) {
        self.input.on_key(event);
    }

    pub fn pointer(&self, event: PointerEvent) {
        self.input.on_pointer(event);
    }
}

impl Presentation for HeadlessPresentation {
    fn show_world(&self, world: &SharedWorld) {
        *lock(&self.shown) = Some(world.clone());
        *lock(&self.pending) = true;
    }
}
