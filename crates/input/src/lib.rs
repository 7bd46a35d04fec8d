//! Input bridge between an asynchronous presentation layer and the tick loop.
//!
//! # Invariants
//! - Any number of producer threads may push events at any time.
//! - Exactly one consumer drains each queue, once per tick, in FIFO order.
//! - The held-key set reflects press/release pairing at the instant of a query.

mod bridge;
mod event;

pub use bridge::{InputBridge, PendingCounts};
pub use event::{
    EventError, KeyCode, KeyEvent, KeyPhase, Modifiers, PointerButton, PointerEvent,
    PointerPhase, WindowEvent,
};

pub fn crate_info() -> &'static str {
    "tileworld-input v0.1.0"
}
