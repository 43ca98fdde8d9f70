/// Popup panel UI
mod components;
pub mod panel;
