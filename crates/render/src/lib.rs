//! Frame consumers: the canvas side of a world's repaint, renderers that turn
//! frames into text, and a headless presentation.
//!
//! # Invariants
//! - Renderers read published frames only; they never touch world state.

mod buffer;
mod headless;
mod renderer;

pub use buffer::FrameBuffer;
pub use headless::HeadlessPresentation;
pub use renderer::{AsciiGridRenderer, DebugTextRenderer, JsonRenderer, Renderer};

pub fn crate_info() -> &'static str {
    "tileworld-render v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("render"));
    }
}
