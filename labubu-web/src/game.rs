//! Stateful browser session: the JS page owns one `LabubuGame` and calls
//! `advance()` from its own interval timer.

use labubu_game::{Action, ActionOutcome, PetSession, ProgressionConfig, SessionError};
use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::storage::{LocalStorage, WebStorageError};

/// Clock backed by `Date.now()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserClock;

impl labubu_game::Clock for BrowserClock {
    fn now_ms(&self) -> i64 {
        labubu_game::numbers::f64_to_i64(crate::dom::now_ms()).unwrap_or_default()
    }
}

pub type WebSession = PetSession<LocalStorage, BrowserClock>;

fn session_error(err: &SessionError<WebStorageError>) -> JsValue {
    JsValue::from_str(&err.to_string())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NoticeView<'a> {
    message: &'a str,
    expires_at: i64,
}

#[wasm_bindgen]
pub struct LabubuGame {
    session: WebSession,
}

#[wasm_bindgen]
impl LabubuGame {
    /// Load the saved pet (or start a new one) and catch it up.
    ///
    /// # Errors
    /// Returns an error if `localStorage` cannot be used.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Result<LabubuGame, JsValue> {
        let session =
            PetSession::start(LocalStorage, BrowserClock, ProgressionConfig::default())
                .map_err(|err| session_error(&err))?;
        Ok(Self { session })
    }

    /// Fire every timer that is due. Returns the progression events.
    ///
    /// # Errors
    /// Returns an error if the snapshot cannot be saved.
    pub fn advance(&mut self) -> Result<JsValue, JsValue> {
        let events = self.session.advance().map_err(|err| session_error(&err))?;
        serde_wasm_bindgen::to_value(&events).map_err(Into::into)
    }

    /// Apply an action by name. Returns whether it ran.
    ///
    /// # Errors
    /// Returns an error if the snapshot cannot be saved.
    pub fn apply(&mut self, action: &str) -> Result<bool, JsValue> {
        let Ok(action) = action.parse::<Action>() else {
            log::debug!("ignoring unknown action {action:?}");
            return Ok(false);
        };
        let outcome = self
            .session
            .apply(action)
            .map_err(|err| session_error(&err))?;
        Ok(matches!(outcome, ActionOutcome::Applied { .. }))
    }

    /// Wipe the save and start a new pet.
    ///
    /// # Errors
    /// Returns an error if the saved snapshot cannot be removed.
    pub fn reset(&mut self) -> Result<(), JsValue> {
        self.session.reset().map_err(|err| session_error(&err))
    }

    /// # Errors
    /// Returns an error if the state cannot be converted to a JS object.
    pub fn state(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(self.session.state()).map_err(Into::into)
    }

    /// # Errors
    /// Returns an error if the timers cannot be converted to a JS object.
    pub fn timers(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(self.session.timers()).map_err(Into::into)
    }

    /// # Errors
    /// Returns an error if the notices cannot be converted to JS objects.
    pub fn notices(&self) -> Result<JsValue, JsValue> {
        let views: Vec<NoticeView<'_>> = self
            .session
            .notices()
            .iter()
            .map(|notice| NoticeView {
                message: &notice.message,
                expires_at: notice.expires_at,
            })
            .collect();
        serde_wasm_bindgen::to_value(&views).map_err(Into::into)
    }

    #[wasm_bindgen(js_name = isGameOver)]
    #[must_use]
    pub fn is_game_over(&self) -> bool {
        self.session.is_game_over()
    }

    #[must_use]
    pub fn visual(&self) -> String {
        self.session.visual().to_string()
    }
}
