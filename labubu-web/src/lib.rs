#![forbid(unsafe_code)]
//! Browser bindings for the Labubu engine: `localStorage` persistence, a
//! `Date.now()` clock and the JS exports.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

pub mod bindings;
pub mod dom;
pub mod game;
pub mod storage;

pub use game::{BrowserClock, LabubuGame, WebSession};
pub use storage::{LocalStorage, WebStorageError};

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn start() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
    log::info!("labubu engine loaded");
}
