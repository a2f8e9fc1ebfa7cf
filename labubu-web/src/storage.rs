//! `localStorage` backend for the pet snapshot.

use labubu_game::PetStorage;
use wasm_bindgen::JsValue;

use crate::dom;

#[derive(Debug, thiserror::Error)]
pub enum WebStorageError {
    #[error("localStorage unavailable: {0}")]
    Unavailable(String),
    #[error("Storage error: {0}")]
    Storage(String),
}

impl WebStorageError {
    fn storage(value: &JsValue) -> Self {
        Self::Storage(dom::js_error_message(value))
    }
}

fn handle() -> Result<web_sys::Storage, WebStorageError> {
    dom::local_storage().map_err(|err| WebStorageError::Unavailable(dom::js_error_message(&err)))
}

/// Browser `localStorage`, one string value per key.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStorage;

impl PetStorage for LocalStorage {
    type Error = WebStorageError;

    fn read(&self, key: &str) -> Result<Option<String>, Self::Error> {
        handle()?
            .get_item(key)
            .map_err(|err| WebStorageError::storage(&err))
    }

    fn write(&self, key: &str, raw: &str) -> Result<(), Self::Error> {
        handle()?
            .set_item(key, raw)
            .map_err(|err| WebStorageError::storage(&err))
    }

    fn remove(&self, key: &str) -> Result<(), Self::Error> {
        handle()?
            .remove_item(key)
            .map_err(|err| WebStorageError::storage(&err))
    }
}
