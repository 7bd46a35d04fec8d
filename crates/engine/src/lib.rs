//! Engine: the fixed-rate scheduler that ticks worlds and other tickables.
//!
//! # Invariants
//! - One scheduling thread at a time drives every registered tickable.
//! - A failing or panicking tickable is logged and never stops the loop.

pub mod clock;
pub mod config;
pub mod presentation;
pub mod scheduler;
pub mod stats;
pub mod tickable;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::EngineConfig;
pub use presentation::Presentation;
pub use scheduler::Engine;
pub use stats::CycleStats;
pub use tickable::{SharedWorld, Tickable, TickableInfo, shared};

pub fn crate_info() -> &'static str {
    "tileworld-engine v0.1.0"
}
