//! Browser Glue
//!
//! `localStorage` session persistence and the few `window.location`
//! operations the OAuth redirect flow needs.

use todo_core::{DomainError, DomainResult, SessionStore};
use wasm_bindgen::JsValue;

fn local_storage() -> Option<web_sys::Storage> {
    web_sys::window()?.local_storage().ok().flatten()
}

fn js_error(err: JsValue) -> DomainError {
    DomainError::Storage(format!("{:?}", err))
}

/// Keeps the serialized session under a single `localStorage` key
pub struct LocalStorageSessionStore {
    key: String,
}

impl LocalStorageSessionStore {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

impl SessionStore for LocalStorageSessionStore {
    fn load(&self) -> Option<String> {
        local_storage()?.get_item(&self.key).ok().flatten()
    }

    fn save(&self, value: &str) -> DomainResult<()> {
        let storage = local_storage()
            .ok_or_else(|| DomainError::Storage("localStorage is unavailable".to_string()))?;
        storage.set_item(&self.key, value).map_err(js_error)
    }

    fn remove(&self) {
        if let Some(storage) = local_storage() {
            if let Err(err) = storage.remove_item(&self.key) {
                tracing::warn!(error = ?err, "failed to remove stored session");
            }
        }
    }
}

/// Current URL fragment without the leading `#`, if any
pub fn location_hash() -> Option<String> {
    let hash = web_sys::window()?.location().hash().ok()?;
    let hash = hash.trim_start_matches('#');
    (!hash.is_empty()).then(|| hash.to_string())
}

/// Drop the OAuth tokens from the address bar
pub fn clear_location_hash() {
    if let Some(window) = web_sys::window() {
        if let Err(err) = window.location().set_hash("") {
            tracing::warn!(error = ?err, "failed to clear location hash");
        }
    }
}

/// Where OAuth providers should send the user back to
pub fn redirect_target() -> Option<String> {
    let location = web_sys::window()?.location();
    let origin = location.origin().ok()?;
    let path = location.pathname().unwrap_or_default();
    Some(format!("{}{}", origin, path))
}

pub fn navigate(url: &str) {
    if let Some(window) = web_sys::window() {
        if let Err(err) = window.location().set_href(url) {
            tracing::error!(error = ?err, "failed to navigate");
        }
    }
}
