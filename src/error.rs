/// Error taxonomy shared by every execution context

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FavesError {
    /// The page's structural anchor is missing (interstitial, redesign, ...)
    #[error("page not applicable: {0}")]
    PageNotApplicable(String),

    /// The address does not look like an item page
    #[error("no package identifier in {0:?}")]
    IdentifierUnresolvable(String),

    #[error("registry lookup failed: {0}")]
    RemoteMetadata(String),

    /// No live recipient on the message bus, or the bus itself threw
    #[error("message bus delivery failed: {0}")]
    ChannelDelivery(String),

    #[error("storage failure: {0}")]
    Store(String),

    #[error("serialization failure: {0}")]
    Serialization(String),

    /// Stored settings that cannot be used as-is
    #[error("invalid settings: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, FavesError>;

impl From<serde_json::Error> for FavesError {
    fn from(e: serde_json::Error) -> Self {
        FavesError::Serialization(e.to_string())
    }
}

impl From<serde_wasm_bindgen::Error> for FavesError {
    fn from(e: serde_wasm_bindgen::Error) -> Self {
        FavesError::Serialization(e.to_string())
    }
}
