//! Game session: the single owner of the board, configuration, random source and
//! animation sequencer.
//!
//! A session is driven from outside through two calls:
//! - `on_tile_selected`: the only input path, starts a match cycle when the selected
//!   group is large enough
//! - `tick`: once per display frame, draws the active phase and commits the board
//!   mutation that belongs to a finished phase
//!
//! A full cycle runs disappear → clear → fall (skipped when nothing moves) → apply
//! falls → refill, strictly in that order and never overlapping another cycle.
use std::collections::HashSet;

use log::{debug, info, warn};
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::animation::{Particle, Phase, PhaseKind, Sequencer, TileTransform};
use crate::board::{
    Board, MatchSet, Palette, Position, TileValue, compute_falls, find_matching_tiles, refill,
};
use crate::config::GameConfig;
use crate::error::{BoardError, ConfigError, GameError};

// --- Collaborators ----------------------------------------------------------

/// Monotonic millisecond time source.
pub trait Clock {
    fn now(&self) -> f64;
}

impl<F: Fn() -> f64> Clock for F {
    fn now(&self) -> f64 {
        self()
    }
}

/// Drawing surface supplied by the host.
pub trait Renderer {
    /// Redraw every tile on `board` except the cells listed in `hidden`, which the
    /// active animation draws itself.
    fn render_board(&mut self, board: &Board, hidden: &HashSet<Position>);

    /// Draw one tile with its top-left corner at `(x, y)`.
    fn render_tile(&mut self, x: f64, y: f64, size: f64, tile: TileValue, transform: TileTransform);

    fn render_particle(&mut self, _particle: &Particle) {}
}

// --- Outcomes ---------------------------------------------------------------

/// What happened to a tile selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectOutcome {
    /// A disappearance animation started for `matched` tiles.
    Started { matched: usize },
    /// The group was smaller than the goal; nothing changed.
    BelowGoal { matched: usize },
    /// Off the board or an empty cell.
    NoMatch,
    /// A cycle is already animating; the selection was dropped.
    Busy,
    /// The session has been terminated.
    Stopped,
}

/// Whether the host should schedule another frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameRequest {
    Continue,
    Idle,
    Stopped,
}

// --- Session ----------------------------------------------------------------

pub struct GameSession {
    config: GameConfig,
    palette: Palette,
    board: Board,
    sequencer: Sequencer,
    rng: StdRng,
    clock: Box<dyn Clock>,
    terminated: bool,
    cycles_completed: u64,
}

impl GameSession {
    /// Validate `config` and start a session on a freshly randomized board.
    pub fn new(config: GameConfig, clock: Box<dyn Clock>) -> Result<Self, GameError> {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_rng(config, clock, rng)
    }

    pub fn with_rng(
        config: GameConfig,
        clock: Box<dyn Clock>,
        mut rng: StdRng,
    ) -> Result<Self, GameError> {
        config.validate()?;
        let palette = Palette::new(config.palette_size)?;
        let board = Board::random(config.rows, config.cols, &palette, &mut rng)?;
        Self::with_board(config, clock, board, rng)
    }

    /// Start from a prepared board. Its dimensions must agree with `config`.
    pub fn with_board(
        config: GameConfig,
        clock: Box<dyn Clock>,
        board: Board,
        rng: StdRng,
    ) -> Result<Self, GameError> {
        config.validate()?;
        if (board.rows(), board.cols()) != (config.rows, config.cols) {
            return Err(ConfigError::Validation(format!(
                "board is {}x{} but config expects {}x{}",
                board.rows(),
                board.cols(),
                config.rows,
                config.cols
            ))
            .into());
        }
        let palette = Palette::new(config.palette_size)?;
        let sequencer = Sequencer::new(config.disappear_duration_ms, config.fall_duration_ms);
        info!(
            "session started: {}x{} board, {} tile values, match goal {}",
            config.rows, config.cols, config.palette_size, config.match_goal
        );
        Ok(Self {
            config,
            palette,
            board,
            sequencer,
            rng,
            clock,
            terminated: false,
            cycles_completed: 0,
        })
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn phase(&self) -> PhaseKind {
        self.sequencer.kind()
    }

    pub fn cycles_completed(&self) -> u64 {
        self.cycles_completed
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    /// Stop the session. Later input is refused and `tick` asks for no more frames.
    pub fn terminate(&mut self) {
        if !self.terminated {
            info!("session terminated after {} cycles", self.cycles_completed);
        }
        self.terminated = true;
    }

    /// Draw the whole board with nothing hidden.
    pub fn render<R: Renderer + ?Sized>(&self, renderer: &mut R) {
        renderer.render_board(&self.board, &HashSet::new());
    }

    /// Input boundary: the player picked the tile at `pos`.
    ///
    /// Selections that arrive while a cycle is animating are ignored rather than queued.
    pub fn on_tile_selected(&mut self, pos: Position) -> SelectOutcome {
        if self.terminated {
            return SelectOutcome::Stopped;
        }
        if !self.sequencer.is_idle() {
            debug!(
                "ignoring selection at ({}, {}) during {:?}",
                pos.row,
                pos.col,
                self.sequencer.kind()
            );
            return SelectOutcome::Busy;
        }
        let matched = find_matching_tiles(pos, &self.board);
        if matched.is_empty() {
            return SelectOutcome::NoMatch;
        }
        let count = matched.len();
        if count < self.config.match_goal {
            debug!(
                "group of {count} at ({}, {}) is below goal {}",
                pos.row, pos.col, self.config.match_goal
            );
            return SelectOutcome::BelowGoal { matched: count };
        }
        let particles = self.spawn_particles(&matched);
        let now = self.clock.now();
        self.sequencer.begin_disappearing(matched, particles, now);
        debug!("removing group of {count} from ({}, {})", pos.row, pos.col);
        SelectOutcome::Started { matched: count }
    }

    fn spawn_particles(&mut self, matched: &MatchSet) -> Vec<Particle> {
        let count = self.config.particles_per_tile;
        if count == 0 {
            return Vec::new();
        }
        let size = self.config.tile_size;
        let mut ordered: Vec<Position> = matched.iter().copied().collect();
        ordered.sort_unstable();
        let mut particles = Vec::with_capacity(ordered.len() * count);
        for pos in ordered {
            if let Ok(Some(tile)) = self.board.get(pos) {
                particles.extend(Particle::burst(
                    &mut self.rng,
                    pos.col as f64 * size,
                    pos.row as f64 * size,
                    size,
                    tile,
                    count,
                ));
            }
        }
        particles
    }

    /// Advance one display frame.
    ///
    /// Draws the active phase and, once its progress reaches 1, commits the board
    /// mutation it was deferring before the next phase starts.
    pub fn tick<R: Renderer + ?Sized>(
        &mut self,
        renderer: &mut R,
    ) -> Result<FrameRequest, BoardError> {
        if self.terminated {
            return Ok(FrameRequest::Stopped);
        }
        let now = self.clock.now();
        let eased = self.sequencer.eased_progress(now);
        let tile_size = self.config.tile_size;
        match self.sequencer.phase_mut() {
            Phase::Idle => return Ok(FrameRequest::Idle),
            Phase::Disappearing(disappearance) => {
                disappearance.draw(&self.board, eased, tile_size, renderer)
            }
            Phase::Falling(falling) => falling.draw(&self.board, eased, tile_size, renderer),
        }
        if self.sequencer.progress(now) < 1.0 {
            return Ok(FrameRequest::Continue);
        }
        self.complete_phase(now, renderer)
    }

    fn complete_phase<R: Renderer + ?Sized>(
        &mut self,
        now: f64,
        renderer: &mut R,
    ) -> Result<FrameRequest, BoardError> {
        match self.sequencer.take_phase() {
            Phase::Idle => Ok(FrameRequest::Idle),
            Phase::Disappearing(disappearance) => {
                let cleared = self.board.clear(disappearance.into_tiles())?;
                let compaction = compute_falls(&self.board);
                debug!("cleared {cleared} tiles, {} falls pending", compaction.len());
                if compaction.is_empty() {
                    self.settle(renderer);
                    Ok(FrameRequest::Idle)
                } else {
                    self.sequencer.begin_falling(compaction, now);
                    Ok(FrameRequest::Continue)
                }
            }
            Phase::Falling(falling) => {
                if let Err(err) = falling.into_compaction().apply(&mut self.board) {
                    warn!("dropping falls that no longer match the board: {err}");
                    return Err(err);
                }
                self.settle(renderer);
                Ok(FrameRequest::Idle)
            }
        }
    }

    fn settle<R: Renderer + ?Sized>(&mut self, renderer: &mut R) {
        let filled = refill(&mut self.board, &self.palette, &mut self.rng);
        self.cycles_completed += 1;
        debug!("refilled {filled} cells, cycle {} complete", self.cycles_completed);
        self.render(renderer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::tests::{A, B, C};
    use std::cell::Cell;
    use std::rc::Rc;

    #[derive(Default)]
    struct CountingRenderer {
        boards: usize,
        tiles: Vec<(f64, f64, TileTransform)>,
        particles: usize,
        last_hidden: HashSet<Position>,
    }

    impl Renderer for CountingRenderer {
        fn render_board(&mut self, _board: &Board, hidden: &HashSet<Position>) {
            self.boards += 1;
            self.last_hidden = hidden.clone();
        }

        fn render_tile(&mut self, x: f64, y: f64, _size: f64, _tile: TileValue, t: TileTransform) {
            self.tiles.push((x, y, t));
        }

        fn render_particle(&mut self, _particle: &Particle) {
            self.particles += 1;
        }
    }

    fn manual_clock() -> (Rc<Cell<f64>>, Box<dyn Clock>) {
        let now = Rc::new(Cell::new(0.0));
        let handle = now.clone();
        let clock: Box<dyn Clock> = Box::new(move || handle.get());
        (now, clock)
    }

    fn session_with(rows: Vec<Vec<Option<TileValue>>>) -> (Rc<Cell<f64>>, GameSession) {
        let board = Board::from_rows(rows).unwrap();
        let config = GameConfig {
            rows: board.rows(),
            cols: board.cols(),
            tile_size: 10.0,
            ..GameConfig::default()
        };
        let (now, clock) = manual_clock();
        let session =
            GameSession::with_board(config, clock, board, StdRng::seed_from_u64(5)).unwrap();
        (now, session)
    }

    #[test]
    fn test_rejects_invalid_config() {
        let (_, clock) = manual_clock();
        let config = GameConfig {
            match_goal: 0,
            ..GameConfig::default()
        };
        assert!(matches!(
            GameSession::new(config, clock),
            Err(GameError::Config(ConfigError::Validation(_)))
        ));
    }

    #[test]
    fn test_oversized_board_is_an_error_not_a_panic() {
        let (_, clock) = manual_clock();
        let config = GameConfig {
            rows: usize::MAX,
            cols: 2,
            ..GameConfig::default()
        };
        assert!(matches!(
            GameSession::new(config, clock),
            Err(GameError::Config(ConfigError::Validation(_)))
        ));
    }

    #[test]
    fn test_rejects_board_config_mismatch() {
        let (_, clock) = manual_clock();
        let board = Board::from_rows(vec![vec![A, B]]).unwrap();
        let result =
            GameSession::with_board(GameConfig::default(), clock, board, StdRng::seed_from_u64(1));
        assert!(result.is_err());
    }

    #[test]
    fn test_seeded_sessions_share_a_board() {
        let config = GameConfig {
            seed: Some(1234),
            ..GameConfig::default()
        };
        let (_, c1) = manual_clock();
        let (_, c2) = manual_clock();
        let a = GameSession::new(config.clone(), c1).unwrap();
        let b = GameSession::new(config, c2).unwrap();
        assert_eq!(a.board(), b.board());
    }

    #[test]
    fn test_below_goal_selection_is_noop() {
        let (_, mut session) = session_with(vec![vec![A, B], vec![B, A]]);
        let before = session.board().clone();
        assert_eq!(
            session.on_tile_selected(Position::new(0, 0)),
            SelectOutcome::BelowGoal { matched: 1 }
        );
        assert_eq!(session.board(), &before);
        assert_eq!(session.phase(), PhaseKind::Idle);
    }

    #[test]
    fn test_busy_while_animating() {
        let (now, mut session) = session_with(vec![vec![A, B], vec![A, C], vec![A, B]]);
        assert_eq!(
            session.on_tile_selected(Position::new(0, 0)),
            SelectOutcome::Started { matched: 3 }
        );
        now.set(100.0);
        let mut renderer = CountingRenderer::default();
        assert_eq!(session.tick(&mut renderer), Ok(FrameRequest::Continue));
        assert_eq!(
            session.on_tile_selected(Position::new(0, 1)),
            SelectOutcome::Busy
        );
        assert_eq!(session.board().filled_count(), 6);
    }

    #[test]
    fn test_disappearing_frame_hides_matched_cells() {
        let (now, mut session) = session_with(vec![vec![B, A], vec![A, A]]);
        session.on_tile_selected(Position::new(1, 1));
        now.set(150.0);
        let mut renderer = CountingRenderer::default();
        session.tick(&mut renderer).unwrap();
        assert_eq!(renderer.boards, 1);
        assert_eq!(renderer.last_hidden.len(), 3);
        assert_eq!(renderer.tiles.len(), 3);
        let (_, _, transform) = renderer.tiles[0];
        assert!(transform.opacity < 1.0 && transform.opacity > 0.0);
        assert!(renderer.particles > 0);
        assert_eq!(session.board().filled_count(), 4);
    }

    #[test]
    fn test_full_cycle_with_falls() {
        // Column 0: B over A, A, A. Clearing the A's drops B to the bottom.
        let (now, mut session) = session_with(vec![
            vec![B, C],
            vec![A, C],
            vec![A, B],
            vec![A, C],
        ]);
        assert_eq!(
            session.on_tile_selected(Position::new(3, 0)),
            SelectOutcome::Started { matched: 3 }
        );
        let mut renderer = CountingRenderer::default();

        now.set(300.0);
        assert_eq!(session.tick(&mut renderer), Ok(FrameRequest::Continue));
        assert_eq!(session.phase(), PhaseKind::Falling);
        assert_eq!(session.board().column(0), vec![B, None, None, None]);

        now.set(450.0);
        renderer.tiles.clear();
        assert_eq!(session.tick(&mut renderer), Ok(FrameRequest::Continue));
        let (x, y, _) = renderer.tiles[0];
        assert_eq!(x, 0.0);
        // from row 0 to row 3 at eased 0.875
        assert!((y - 26.25).abs() < 1e-9);
        assert!(renderer.last_hidden.contains(&Position::new(0, 0)));

        now.set(600.0);
        assert_eq!(session.tick(&mut renderer), Ok(FrameRequest::Idle));
        assert_eq!(session.phase(), PhaseKind::Idle);
        assert_eq!(session.board().get(Position::new(3, 0)), Ok(B));
        assert_eq!(session.board().empty_count(), 0);
        assert_eq!(session.cycles_completed(), 1);
        assert!(renderer.last_hidden.is_empty());
    }

    #[test]
    fn test_cycle_without_falls_skips_falling_phase() {
        let (now, mut session) = session_with(vec![vec![A], vec![A], vec![A]]);
        session.on_tile_selected(Position::new(0, 0));
        now.set(300.0);
        let mut renderer = CountingRenderer::default();
        assert_eq!(session.tick(&mut renderer), Ok(FrameRequest::Idle));
        assert_eq!(session.phase(), PhaseKind::Idle);
        assert_eq!(session.board().empty_count(), 0);
    }

    #[test]
    fn test_terminated_session_stops() {
        let (now, mut session) = session_with(vec![vec![A], vec![A], vec![A]]);
        session.on_tile_selected(Position::new(0, 0));
        session.terminate();
        now.set(1_000.0);
        let mut renderer = CountingRenderer::default();
        assert_eq!(session.tick(&mut renderer), Ok(FrameRequest::Stopped));
        assert_eq!(renderer.boards, 0);
        assert_eq!(
            session.on_tile_selected(Position::new(0, 0)),
            SelectOutcome::Stopped
        );
    }

    #[test]
    fn test_idle_tick_draws_nothing() {
        let (_, mut session) = session_with(vec![vec![A, B]]);
        let mut renderer = CountingRenderer::default();
        assert_eq!(session.tick(&mut renderer), Ok(FrameRequest::Idle));
        assert_eq!(renderer.boards, 0);
    }
}
