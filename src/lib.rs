/// npm faves - Chrome extension for keeping favorite npm packages
/// Built with Rust + WASM + Yew

pub mod bus;
pub mod coordinator;
mod error;
pub mod host;
pub mod identifier;
pub mod message;
pub mod page;
pub mod settings;
pub mod store;
pub mod ui;

#[cfg(test)]
mod testing;

pub use error::{FavesError, Result};

use wasm_bindgen::prelude::*;

// Set up panic hook and logging for every context that loads the module
#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    // Trace here; each context narrows it to the configured level once settings load
    wasm_logger::init(wasm_logger::Config::new(log::Level::Trace));
}

// Start the favorite toggle on a catalog page (content script)
#[wasm_bindgen]
pub fn start_content_script() {
    host::spawn_logged(host::run_content_script());
}

// Answer one bus request in the background context
#[wasm_bindgen]
pub async fn handle_message(message: JsValue) -> JsValue {
    let raw = match serde_wasm_bindgen::from_value::<serde_json::Value>(message) {
        Ok(raw) => raw,
        Err(e) => {
            log::warn!("Unreadable request: {}", e);
            serde_json::Value::Null
        }
    };

    let response = host::handle_background_message(raw).await;
    serde_wasm_bindgen::to_value(&response).unwrap_or(JsValue::NULL)
}

// Start the Yew app for the popup panel
#[wasm_bindgen]
pub fn start_panel() {
    yew::Renderer::<ui::panel::Panel>::new().render();
}
