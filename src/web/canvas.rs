// Canvas 2D renderer. Flat colors only; every tile value maps to one fill.
use std::collections::HashSet;
use std::f64::consts::TAU;

use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use crate::animation::{Particle, TileTransform};
use crate::board::{Board, Position, TileValue};
use crate::session::Renderer;

const BACKGROUND: &str = "#181818";
const GRID_LINE: &str = "#222";
const TILE_COLORS: &[&str] = &[
    "#e63946", "#f4a261", "#e9c46a", "#2a9d8f", "#457b9d", "#9b5de5", "#f15bb5", "#00bbf9",
];

fn tile_color(tile: TileValue) -> &'static str {
    TILE_COLORS[tile.0 as usize % TILE_COLORS.len()]
}

pub struct CanvasRenderer {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    tile_size: f64,
}

impl CanvasRenderer {
    pub fn new(canvas: HtmlCanvasElement, ctx: CanvasRenderingContext2d, tile_size: f64) -> Self {
        Self {
            canvas,
            ctx,
            tile_size,
        }
    }

    fn draw_cell(&self, x: f64, y: f64, size: f64, tile: TileValue) {
        let inset = (size * 0.06).max(1.0);
        self.ctx.set_fill_style_str(tile_color(tile));
        self.ctx
            .fill_rect(x + inset, y + inset, size - 2.0 * inset, size - 2.0 * inset);
    }
}

impl Renderer for CanvasRenderer {
    fn render_board(&mut self, board: &Board, hidden: &HashSet<Position>) {
        let w = self.canvas.width() as f64;
        let h = self.canvas.height() as f64;
        self.ctx.set_global_alpha(1.0);
        self.ctx.set_fill_style_str(BACKGROUND);
        self.ctx.fill_rect(0.0, 0.0, w, h);

        self.ctx.set_stroke_style_str(GRID_LINE);
        self.ctx.set_line_width(1.0);
        for pos in board.positions() {
            let x = pos.col as f64 * self.tile_size;
            let y = pos.row as f64 * self.tile_size;
            self.ctx.stroke_rect(x, y, self.tile_size, self.tile_size);
            if hidden.contains(&pos) {
                continue;
            }
            if let Ok(Some(tile)) = board.get(pos) {
                self.draw_cell(x, y, self.tile_size, tile);
            }
        }
    }

    fn render_tile(&mut self, x: f64, y: f64, size: f64, tile: TileValue, transform: TileTransform) {
        let cx = x + size / 2.0;
        let cy = y + size / 2.0;
        self.ctx.save();
        self.ctx.set_global_alpha(transform.opacity.clamp(0.0, 1.0));
        // Transform failures only affect this frame's look.
        let _ = self.ctx.translate(cx, cy);
        let _ = self.ctx.rotate(transform.rotation);
        let _ = self.ctx.scale(transform.scale, transform.scale);
        self.draw_cell(-size / 2.0, -size / 2.0, size, tile);
        self.ctx.restore();
    }

    fn render_particle(&mut self, particle: &Particle) {
        self.ctx.set_global_alpha(particle.opacity.clamp(0.0, 1.0));
        self.ctx.set_fill_style_str(tile_color(particle.tile));
        self.ctx.begin_path();
        if self
            .ctx
            .arc(particle.x, particle.y, particle.radius, 0.0, TAU)
            .is_ok()
        {
            self.ctx.fill();
        }
        self.ctx.set_global_alpha(1.0);
    }
}
