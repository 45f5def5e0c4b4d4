//! Tile Cascade core crate.
//!
//! A tile-matching puzzle for the browser. Selecting a tile removes its 4-connected
//! group of same-colored tiles when the group reaches the match goal; the tiles
//! above fall into the gaps and fresh random tiles fill the top of each column.
//!
//! The board engine (`board`), the phase sequencer (`animation`) and the session
//! that ties them together (`session`) are plain Rust and run natively, which is
//! how the tests exercise them. The `web` driver binds a session to a canvas.

use wasm_bindgen::prelude::*;

pub mod animation;
pub mod board;
pub mod config;
pub mod error;
pub mod session;
mod web;

pub use animation::{PhaseKind, TileTransform, ease_out_cubic, ease_out_quad};
pub use board::{Board, Compaction, Fall, MatchSet, Palette, Position, TileValue};
pub use config::GameConfig;
pub use error::{BoardError, ConfigError, GameError};
pub use session::{Clock, FrameRequest, GameSession, Renderer, SelectOutcome};

// Optional small allocator for size (feature gated)
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn wasm_start() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

fn to_js(err: GameError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

// -----------------------------------------------------------------------------
// Browser entrypoints
// -----------------------------------------------------------------------------

/// Start a game with the default 8x8 board.
#[wasm_bindgen]
pub fn start_game() -> Result<(), JsValue> {
    web::start(GameConfig::default()).map_err(to_js)
}

/// Start a game from a JSON configuration; omitted fields keep their defaults.
#[wasm_bindgen]
pub fn start_game_with_config(config_json: &str) -> Result<(), JsValue> {
    let config = GameConfig::from_json(config_json).map_err(|e| to_js(e.into()))?;
    web::start(config).map_err(to_js)
}

/// Select the tile at `(row, col)`. Returns true when a removal started.
#[wasm_bindgen]
pub fn select_tile(row: u32, col: u32) -> bool {
    matches!(
        web::select(Position::new(row as usize, col as usize)),
        Some(SelectOutcome::Started { .. })
    )
}

#[wasm_bindgen]
pub fn stop_game() {
    web::stop();
}
