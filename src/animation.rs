//! Animation sequencing for the match cycle.
//!
//! The sequencer only tracks which phase is playing and how far along it is. It never
//! mutates the board; the session applies the clear / fall / refill steps when a phase
//! reports completion. Everything here is expressed in canvas pixels through the
//! `Renderer` collaborator.
use std::collections::HashSet;
use std::f64::consts::FRAC_PI_4;

use rand::Rng;

use crate::board::{Board, Compaction, MatchSet, Position, TileValue};
use crate::session::Renderer;

// --- Easing -----------------------------------------------------------------

/// Ease-out quadratic, used for the disappearance effect.
pub fn ease_out_quad(t: f64) -> f64 {
    t * (2.0 - t)
}

/// Ease-out cubic, used for falling tiles.
pub fn ease_out_cubic(t: f64) -> f64 {
    1.0 - (1.0 - t).powi(3)
}

/// Fraction of `duration_ms` covered since `started_ms`, clamped to `0..=1`.
/// A zero-length phase is complete immediately.
pub fn progress(started_ms: f64, now_ms: f64, duration_ms: f64) -> f64 {
    if duration_ms <= 0.0 {
        return 1.0;
    }
    ((now_ms - started_ms) / duration_ms).clamp(0.0, 1.0)
}

// --- Per-tile visual transform ----------------------------------------------

/// Visual-only adjustments applied when drawing a single tile.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TileTransform {
    pub scale: f64,
    pub opacity: f64,
    /// Radians, clockwise around the tile center.
    pub rotation: f64,
}

impl TileTransform {
    pub const IDENTITY: TileTransform = TileTransform {
        scale: 1.0,
        opacity: 1.0,
        rotation: 0.0,
    };

    /// Shrink from 110% to 70%, fade out, and turn up to 45 degrees.
    pub fn disappearing(eased: f64) -> Self {
        Self {
            scale: 1.1 - 0.4 * eased,
            opacity: 1.0 - eased,
            rotation: eased * FRAC_PI_4,
        }
    }
}

impl Default for TileTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

// --- Particles ----------------------------------------------------------------

const PARTICLE_FADE_PER_FRAME: f64 = 0.03;

/// Debris thrown off a tile while it disappears.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Particle {
    pub x: f64,
    pub y: f64,
    pub radius: f64,
    pub vx: f64,
    pub vy: f64,
    pub tile: TileValue,
    pub opacity: f64,
}

impl Particle {
    /// `count` particles scattered over the tile whose top-left corner is `(x, y)`.
    pub fn burst<R: Rng + ?Sized>(
        rng: &mut R,
        x: f64,
        y: f64,
        tile_size: f64,
        tile: TileValue,
        count: usize,
    ) -> Vec<Particle> {
        (0..count)
            .map(|_| Particle {
                x: x + rng.gen_range(0.0..1.0) * tile_size,
                y: y + rng.gen_range(0.0..1.0) * tile_size,
                radius: rng.gen_range(0.0..1.0) * 3.0 + 1.0,
                vx: (rng.gen_range(0.0..1.0) - 0.5) * 2.0,
                vy: (rng.gen_range(0.0..1.0) - 0.5) * 2.0,
                tile,
                opacity: 1.0,
            })
            .collect()
    }

    /// Advance one frame.
    pub fn step(&mut self) {
        self.x += self.vx;
        self.y += self.vy;
        self.opacity -= PARTICLE_FADE_PER_FRAME;
    }

    pub fn is_alive(&self) -> bool {
        self.opacity > 0.0
    }
}

// --- Phases -----------------------------------------------------------------

/// Observable name of the current phase.
///
/// `Refilling` runs synchronously inside the frame that ends the last animated phase,
/// so a caller polling between frames never sees it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PhaseKind {
    Idle,
    Disappearing,
    Falling,
    Refilling,
}

/// Matched tiles shrinking away before they are cleared.
#[derive(Debug)]
pub struct Disappearance {
    tiles: MatchSet,
    order: Vec<Position>,
    particles: Vec<Particle>,
    started_ms: f64,
}

impl Disappearance {
    pub(crate) fn into_tiles(self) -> MatchSet {
        self.tiles
    }

    /// Draw one frame: the board without the matched cells, then each matched tile
    /// with its transform, then the surviving particles.
    pub(crate) fn draw<R: Renderer + ?Sized>(
        &mut self,
        board: &Board,
        eased: f64,
        tile_size: f64,
        renderer: &mut R,
    ) {
        renderer.render_board(board, &self.tiles);
        let transform = TileTransform::disappearing(eased);
        for &pos in &self.order {
            if let Ok(Some(tile)) = board.get(pos) {
                let x = pos.col as f64 * tile_size;
                let y = pos.row as f64 * tile_size;
                renderer.render_tile(x, y, tile_size, tile, transform);
            }
        }
        for particle in &mut self.particles {
            particle.step();
        }
        self.particles.retain(Particle::is_alive);
        for particle in &self.particles {
            renderer.render_particle(particle);
        }
    }
}

/// Tiles sliding down into the gaps left by a clear.
#[derive(Debug)]
pub struct FallAnimation {
    compaction: Compaction,
    sources: HashSet<Position>,
    started_ms: f64,
}

impl FallAnimation {
    pub(crate) fn into_compaction(self) -> Compaction {
        self.compaction
    }

    /// Draw one frame. The board has not moved yet, so every falling tile is still
    /// read from its source cell and that cell is hidden from the board pass.
    pub(crate) fn draw<R: Renderer + ?Sized>(
        &self,
        board: &Board,
        eased: f64,
        tile_size: f64,
        renderer: &mut R,
    ) {
        renderer.render_board(board, &self.sources);
        for fall in self.compaction.falls() {
            if let Ok(Some(tile)) = board.get(fall.source()) {
                let x = fall.col as f64 * tile_size;
                let y_start = fall.from_row as f64 * tile_size;
                let y_end = fall.to_row as f64 * tile_size;
                let y = y_start + (y_end - y_start) * eased;
                renderer.render_tile(x, y, tile_size, tile, TileTransform::IDENTITY);
            }
        }
    }
}

#[derive(Debug, Default)]
pub enum Phase {
    #[default]
    Idle,
    Disappearing(Disappearance),
    Falling(FallAnimation),
}

// --- Sequencer --------------------------------------------------------------

/// Phase state machine. At most one animated phase is active at a time.
#[derive(Debug)]
pub struct Sequencer {
    phase: Phase,
    disappear_ms: f64,
    fall_ms: f64,
}

impl Sequencer {
    pub fn new(disappear_ms: f64, fall_ms: f64) -> Self {
        Self {
            phase: Phase::Idle,
            disappear_ms,
            fall_ms,
        }
    }

    pub fn kind(&self) -> PhaseKind {
        match self.phase {
            Phase::Idle => PhaseKind::Idle,
            Phase::Disappearing(_) => PhaseKind::Disappearing,
            Phase::Falling(_) => PhaseKind::Falling,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.phase, Phase::Idle)
    }

    pub(crate) fn phase_mut(&mut self) -> &mut Phase {
        &mut self.phase
    }

    /// Hand the finished phase to the caller and return to `Idle`.
    pub(crate) fn take_phase(&mut self) -> Phase {
        std::mem::take(&mut self.phase)
    }

    /// Start the disappearance of `tiles`. Refused unless idle.
    pub fn begin_disappearing(
        &mut self,
        tiles: MatchSet,
        particles: Vec<Particle>,
        now_ms: f64,
    ) -> bool {
        if !self.is_idle() {
            return false;
        }
        let mut order: Vec<Position> = tiles.iter().copied().collect();
        order.sort_unstable();
        self.phase = Phase::Disappearing(Disappearance {
            tiles,
            order,
            particles,
            started_ms: now_ms,
        });
        true
    }

    /// Start the falling animation for `compaction`. Refused unless idle.
    pub fn begin_falling(&mut self, compaction: Compaction, now_ms: f64) -> bool {
        if !self.is_idle() {
            return false;
        }
        let sources = compaction.falls().iter().map(|f| f.source()).collect();
        self.phase = Phase::Falling(FallAnimation {
            compaction,
            sources,
            started_ms: now_ms,
        });
        true
    }

    /// Linear progress of the active phase; `1.0` when idle.
    pub fn progress(&self, now_ms: f64) -> f64 {
        match &self.phase {
            Phase::Idle => 1.0,
            Phase::Disappearing(d) => progress(d.started_ms, now_ms, self.disappear_ms),
            Phase::Falling(f) => progress(f.started_ms, now_ms, self.fall_ms),
        }
    }

    /// Eased progress for the active phase's curve.
    pub fn eased_progress(&self, now_ms: f64) -> f64 {
        let t = self.progress(now_ms);
        match self.phase {
            Phase::Falling(_) => ease_out_cubic(t),
            _ => ease_out_quad(t),
        }
    }
}
