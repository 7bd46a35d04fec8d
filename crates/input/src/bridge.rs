use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::event::{KeyCode, KeyEvent, KeyPhase, PointerEvent, PointerPhase, WindowEvent};

/// Queue lengths waiting for the next drain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PendingCounts {
    pub keys: usize,
    pub pointers: usize,
    pub windows: usize,
}

/// Multiple-producer, single-consumer bridge for raw input.
///
/// Producers (the presentation's event threads) call the `on_*` methods.
/// The tick loop calls the `drain_*` methods once per tick; a drain takes the
/// whole queue under its lock, so events pushed while the consumer dispatches
/// land in the next drain. Nothing is coalesced or deduplicated.
#[derive(Debug, Default)]
pub struct InputBridge {
    keys: Mutex<VecDeque<KeyEvent>>,
    pointers: Mutex<VecDeque<PointerEvent>>,
    windows: Mutex<VecDeque<WindowEvent>>,
    /// Press events of keys currently down, one per key code.
    held: Mutex<Vec<KeyEvent>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl InputBridge {
    pub fn new() -> Self {
        Self::default()
    }

    // --- producer side ---

    /// Route a key event by its phase.
    pub fn on_key(&self, event: KeyEvent) {
        if let Err(err) = event.validate() {
            tracing::warn!(?event, %err, "dropping malformed key event");
            return;
        }
        match event.phase {
            KeyPhase::Pressed => {
                let mut held = lock(&self.held);
                if !held.iter().any(|k| k.code == event.code) {
                    held.push(event);
                }
            }
            KeyPhase::Released => {
                lock(&self.held).retain(|k| k.code != event.code);
            }
            KeyPhase::Typed => {}
        }
        lock(&self.keys).push_back(event);
    }

    pub fn on_key_typed(&self, mut event: KeyEvent) {
        event.phase = KeyPhase::Typed;
        self.on_key(event);
    }

    pub fn on_key_pressed(&self, mut event: KeyEvent) {
        event.phase = KeyPhase::Pressed;
        self.on_key(event);
    }

    pub fn on_key_released(&self, mut event: KeyEvent) {
        event.phase = KeyPhase::Released;
        self.on_key(event);
    }

    /// Queue a pointer event of any phase.
    pub fn on_pointer(&self, event: PointerEvent) {
        if let Err(err) = event.validate() {
            tracing::warn!(?event, %err, "dropping malformed pointer event");
            return;
        }
        lock(&self.pointers).push_back(event);
    }

    pub fn on_pointer_pressed(&self, event: PointerEvent) {
        self.on_pointer(PointerEvent {
            phase: PointerPhase::Pressed,
            ..event
        });
    }

    pub fn on_pointer_released(&self, event: PointerEvent) {
        self.on_pointer(PointerEvent {
            phase: PointerPhase::Released,
            ..event
        });
    }

    pub fn on_pointer_clicked(&self, event: PointerEvent) {
        self.on_pointer(PointerEvent {
            phase: PointerPhase::Clicked,
            ..event
        });
    }

    pub fn on_pointer_entered(&self, event: PointerEvent) {
        self.on_pointer(PointerEvent {
            phase: PointerPhase::Entered,
            ..event
        });
    }

    pub fn on_pointer_exited(&self, event: PointerEvent) {
        self.on_pointer(PointerEvent {
            phase: PointerPhase::Exited,
            ..event
        });
    }

    pub fn on_window(&self, event: WindowEvent) {
        lock(&self.windows).push_back(event);
    }

    // --- consumer side ---

    /// Take every key event queued since the last drain, oldest first.
    pub fn drain_key_events(&self) -> VecDeque<KeyEvent> {
        std::mem::take(&mut *lock(&self.keys))
    }

    /// Take every pointer event queued since the last drain, oldest first.
    pub fn drain_pointer_events(&self) -> VecDeque<PointerEvent> {
        std::mem::take(&mut *lock(&self.pointers))
    }

    pub fn drain_window_events(&self) -> VecDeque<WindowEvent> {
        std::mem::take(&mut *lock(&self.windows))
    }

    pub fn pending(&self) -> PendingCounts {
        PendingCounts {
            keys: lock(&self.keys).len(),
            pointers: lock(&self.pointers).len(),
            windows: lock(&self.windows).len(),
        }
    }

    // --- queries ---

    pub fn is_shift_down(&self) -> bool {
        self.any_held(|k| k.modifiers.shift || k.code == KeyCode::SHIFT)
    }

    pub fn is_control_down(&self) -> bool {
        self.any_held(|k| k.modifiers.control || k.code == KeyCode::CONTROL)
    }

    /// Meta is the Windows / Super / Command key.
    pub fn is_meta_down(&self) -> bool {
        self.any_held(|k| k.modifiers.meta || k.code == KeyCode::META)
    }

    pub fn is_alt_down(&self) -> bool {
        self.any_held(|k| k.modifiers.alt || k.code == KeyCode::ALT)
    }

    /// Whether a key producing `ch` is down, ignoring case.
    pub fn is_key_down(&self, ch: char) -> bool {
        let wanted = ch.to_lowercase().next();
        self.any_held(|k| k.ch.and_then(|c| c.to_lowercase().next()) == wanted)
    }

    pub fn is_code_down(&self, code: KeyCode) -> bool {
        self.any_held(|k| k.code == code)
    }

    /// Characters of the keys currently down, in press order.
    pub fn held_keys(&self) -> Vec<char> {
        lock(&self.held).iter().filter_map(|k| k.ch).collect()
    }

    pub fn held_codes(&self) -> Vec<KeyCode> {
        lock(&self.held).iter().map(|k| k.code).collect()
    }

    /// Forget every held key, e.g. when the window loses focus.
    pub fn release_all(&self) {
        lock(&self.held).clear();
    }

    fn any_held(&self, pred: impl Fn(&KeyEvent) -> bool) -> bool {
        lock(&self.held).iter().any(pred)
    }
}
