use std::fmt::Write as _;

use tileworld_kernel::Frame;

/// Turns a frame snapshot into some output. Renderers never see the world,
/// only what the world chose to publish.
pub trait Renderer {
    type Output;

    fn render(&self, frame: &Frame) -> Self::Output;
}

/// One line per drawable, back to front.
#[derive(Debug, Default)]
pub struct DebugTextRenderer;

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn render(&self, frame: &Frame) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "=== World {} (tick={}, {}x{} px, cell={}) ===",
            frame.world, frame.tick, frame.abs_width, frame.abs_height, frame.cell_size
        );
        let _ = writeln!(out, "Entities: {}", frame.drawables.len());
        for d in &frame.drawables {
            let _ = writeln!(
                out,
                "  [{}] {:<10} cell=({}, {}) rot={} bounds=({}, {}, {}x{})",
                d.id,
                d.kind,
                d.cell[0],
                d.cell[1],
                d.rotation,
                d.bounds.x,
                d.bounds.y,
                d.bounds.width,
                d.bounds.height
            );
        }
        out
    }
}

/// Character grid of the field, one glyph per cell. The topmost drawable in
/// a cell wins; drawables outside the field are not shown.
#[derive(Debug)]
pub struct AsciiGridRenderer {
    pub empty: char,
}

impl Default for AsciiGridRenderer {
    fn default() -> Self {
        Self { empty: '.' }
    }
}

impl AsciiGridRenderer {
    fn glyph(kind: &str) -> char {
        kind.chars().next().unwrap_or('?')
    }
}

impl Renderer for AsciiGridRenderer {
    type Output = String;

    fn render(&self, frame: &Frame) -> String {
        if frame.cell_size <= 0 {
            return String::new();
        }
        let cols = (frame.abs_width / frame.cell_size).max(0) as usize;
        let rows = (frame.abs_height / frame.cell_size).max(0) as usize;
        let mut grid = vec![vec![self.empty; cols]; rows];
        for d in &frame.drawables {
            let (x, y) = (d.cell[0], d.cell[1]);
            if x < 0 || y < 0 || x as usize >= cols || y as usize >= rows {
                continue;
            }
            grid[y as usize][x as usize] = Self::glyph(d.kind);
        }
        let mut out = String::with_capacity(rows * (cols + 1));
        for row in grid {
            out.extend(row);
            out.push('\n');
        }
        out
    }
}

/// The frame as pretty-printed JSON.
#[derive(Debug, Default)]
pub struct JsonRenderer;

impl Renderer for JsonRenderer {
    type Output = serde_json::Result<String>;

    fn render(&self, frame: &Frame) -> Self::Output {
        serde_json::to_string_pretty(frame)
    }
}
