//! Browser driver: canvas setup, click-to-select input and the animation frame loop.
//!
//! The running session lives in a thread-local so the frame callback and the input
//! listener can reach it. Frames are only requested while a match cycle is
//! animating; an idle board costs nothing.
use std::cell::RefCell;

use log::{debug, error, warn};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, window};

use crate::board::Position;
use crate::config::GameConfig;
use crate::error::GameError;
use crate::session::{FrameRequest, GameSession, SelectOutcome};

mod canvas;
mod console;

use canvas::CanvasRenderer;

const CANVAS_ID: &str = "tc-board-canvas";

/// Remembers which element currently carries the input listener.
struct BoundTarget<T>(Option<T>);

impl<T: PartialEq> BoundTarget<T> {
    fn is_bound_to(&self, target: &T) -> bool {
        self.0.as_ref() == Some(target)
    }

    fn bind(&mut self, target: T) {
        self.0 = Some(target);
    }
}

struct WebSession {
    game: GameSession,
    renderer: CanvasRenderer,
    frame_pending: bool,
}

thread_local! {
    static SESSION: RefCell<Option<WebSession>> = const { RefCell::new(None) };
    static FRAME_CALLBACK: RefCell<Option<Closure<dyn FnMut(f64)>>> = const { RefCell::new(None) };
    static CLICK_TARGET: RefCell<BoundTarget<HtmlCanvasElement>> =
        const { RefCell::new(BoundTarget(None)) };
}

fn js_err(err: JsValue) -> GameError {
    GameError::Environment(format!("{err:?}"))
}

fn missing(what: &str) -> GameError {
    GameError::Environment(format!("no {what}"))
}

/// Create (or reuse) the board canvas, start a session and draw the first board.
/// A session that was already running is terminated and replaced.
pub fn start(config: GameConfig) -> Result<(), GameError> {
    console::install(config.log_level);
    let win = window().ok_or_else(|| missing("window"))?;
    let doc = win.document().ok_or_else(|| missing("document"))?;

    let canvas: HtmlCanvasElement = if let Some(el) = doc.get_element_by_id(CANVAS_ID) {
        el.dyn_into()
            .map_err(|_| GameError::Environment(format!("#{CANVAS_ID} is not a canvas")))?
    } else {
        let c: HtmlCanvasElement = doc
            .create_element("canvas")
            .map_err(js_err)?
            .dyn_into()
            .map_err(|_| missing("canvas element"))?;
        c.set_id(CANVAS_ID);
        let body = doc.body().ok_or_else(|| missing("document body"))?;
        body.append_child(&c).map_err(js_err)?;
        c
    };
    let (width, height) = config.canvas_size();
    canvas.set_width(width);
    canvas.set_height(height);
    let ctx: CanvasRenderingContext2d = canvas
        .get_context("2d")
        .map_err(js_err)?
        .ok_or_else(|| missing("2d context"))?
        .dyn_into()
        .map_err(|_| missing("2d context"))?;

    let tile_size = config.tile_size;
    let game = GameSession::new(config, Box::new(console::performance_now))?;
    let mut renderer = CanvasRenderer::new(canvas.clone(), ctx, tile_size);
    game.render(&mut renderer);

    // A frame already requested for the old session will tick the new one instead.
    let previous = SESSION.with(|cell| cell.borrow_mut().take());
    let frame_pending = previous.as_ref().is_some_and(|web| web.frame_pending);
    if let Some(mut old) = previous {
        old.game.terminate();
    }
    SESSION.with(|cell| {
        cell.replace(Some(WebSession {
            game,
            renderer,
            frame_pending,
        }))
    });

    install_frame_callback();
    install_click_listener(&canvas)?;
    Ok(())
}

/// Forward a selection to the running session and start the frame loop if a cycle began.
pub fn select(pos: Position) -> Option<SelectOutcome> {
    let (outcome, schedule) = SESSION.with(|cell| {
        let mut guard = cell.borrow_mut();
        let web = guard.as_mut()?;
        let outcome = web.game.on_tile_selected(pos);
        let schedule = matches!(outcome, SelectOutcome::Started { .. }) && !web.frame_pending;
        if schedule {
            web.frame_pending = true;
        }
        Some((outcome, schedule))
    })?;
    if schedule {
        request_frame();
    }
    Some(outcome)
}

/// Terminate the running session. The next frame callback sees the flag and stops.
pub fn stop() {
    SESSION.with(|cell| {
        if let Some(web) = cell.borrow_mut().as_mut() {
            web.game.terminate();
        }
    });
}

fn on_frame(_ts: f64) {
    let again = SESSION.with(|cell| {
        let mut guard = cell.borrow_mut();
        let Some(web) = guard.as_mut() else {
            return false;
        };
        let again = match web.game.tick(&mut web.renderer) {
            Ok(FrameRequest::Continue) => true,
            Ok(FrameRequest::Idle | FrameRequest::Stopped) => false,
            Err(err) => {
                error!("frame aborted, stopping session: {err}");
                web.game.terminate();
                false
            }
        };
        web.frame_pending = again;
        again
    });
    if again {
        request_frame();
    }
}

fn install_frame_callback() {
    FRAME_CALLBACK.with(|cb| {
        if cb.borrow().is_none() {
            *cb.borrow_mut() = Some(Closure::wrap(Box::new(on_frame) as Box<dyn FnMut(f64)>));
        }
    });
}

fn request_frame() {
    FRAME_CALLBACK.with(|cb| {
        let guard = cb.borrow();
        let (Some(w), Some(callback)) = (window(), guard.as_ref()) else {
            return;
        };
        if let Err(err) = w.request_animation_frame(callback.as_ref().unchecked_ref()) {
            warn!("requestAnimationFrame failed: {err:?}");
        }
    });
}

fn install_click_listener(canvas: &HtmlCanvasElement) -> Result<(), GameError> {
    // A replaced canvas element needs its own listener.
    if CLICK_TARGET.with(|bound| bound.borrow().is_bound_to(canvas)) {
        return Ok(());
    }
    let closure = Closure::wrap(Box::new(move |evt: web_sys::MouseEvent| {
        // offset_x/offset_y are already canvas-local.
        let x = evt.offset_x() as f64;
        let y = evt.offset_y() as f64;
        if x < 0.0 || y < 0.0 {
            return;
        }
        let Some(tile_size) =
            SESSION.with(|cell| cell.borrow().as_ref().map(|web| web.game.config().tile_size))
        else {
            return;
        };
        let pos = Position::new((y / tile_size) as usize, (x / tile_size) as usize);
        if let Some(outcome) = select(pos) {
            debug!("click on ({}, {}): {outcome:?}", pos.row, pos.col);
        }
    }) as Box<dyn FnMut(_)>);
    canvas
        .add_event_listener_with_callback("mousedown", closure.as_ref().unchecked_ref())
        .map_err(js_err)?;
    closure.forget();
    CLICK_TARGET.with(|bound| bound.borrow_mut().bind(canvas.clone()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::BoundTarget;

    #[test]
    fn test_listener_rebinds_to_a_new_element() {
        let mut bound = BoundTarget(None);
        assert!(!bound.is_bound_to(&"first"));
        bound.bind("first");
        assert!(bound.is_bound_to(&"first"));
        assert!(!bound.is_bound_to(&"second"));
        bound.bind("second");
        assert!(bound.is_bound_to(&"second"));
        assert!(!bound.is_bound_to(&"first"));
    }
}
