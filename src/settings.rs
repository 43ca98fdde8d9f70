/// Extension settings, read from chrome.storage.local and merged over defaults

use crate::error::{FavesError, Result};
use crate::identifier::PackageMatcher;
use crate::store::KeyValueStore;
use serde::{Deserialize, Serialize};

/// Storage key holding user overrides
pub const SETTINGS_KEY: &str = "npm_faves_settings";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Host serving the catalog pages
    pub catalog_host: String,
    /// Path pattern of an item page; must capture a `name` group
    pub package_path_pattern: String,
    /// Base URL of the registry metadata documents
    pub registry_url: String,
    /// CSS selector of the element the toggle is inserted into
    pub anchor_selector: String,
    pub control_id: String,
    /// Extension-relative stylesheet paths injected into the page head
    pub stylesheets: Vec<String>,
    pub storage_prefix: String,
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            catalog_host: "www.npmjs.com".to_string(),
            package_path_pattern: r"^/package/(?P<name>(?:@[^/]+/)?[^/]+)(?:/.*)?$".to_string(),
            registry_url: "https://registry.npmjs.org".to_string(),
            anchor_selector: "#top".to_string(),
            control_id: "npm-faves-toggle".to_string(),
            stylesheets: vec!["styles/faves.css".to_string()],
            storage_prefix: "fave:".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl Settings {
    /// Load overrides from storage; anything missing or invalid falls back to defaults
    pub async fn load(store: &dyn KeyValueStore) -> Settings {
        let raw = match store.get(SETTINGS_KEY).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return Settings::default(),
            Err(e) => {
                log::warn!("Could not read settings, using defaults: {}", e);
                return Settings::default();
            }
        };

        let parsed = serde_json::from_value::<Settings>(raw)
            .map_err(FavesError::from)
            .and_then(|settings| settings.validate().map(|_| settings));

        match parsed {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("Ignoring stored settings: {}", e);
                Settings::default()
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.control_id.trim().is_empty() {
            return Err(FavesError::Config("control_id is empty".to_string()));
        }
        if self.storage_prefix.is_empty() {
            return Err(FavesError::Config("storage_prefix is empty".to_string()));
        }
        PackageMatcher::new(self)?;
        Ok(())
    }

    pub fn log_level(&self) -> log::Level {
        self.log_level.parse().unwrap_or(log::Level::Info)
    }

    /// Storage key of a favorite record
    pub fn record_key(&self, identifier: &str) -> String {
        format!("{}{}", self.storage_prefix, identifier)
    }

    /// Registry document URL; scoped names keep the `@` and escape the slash
    pub fn registry_document_url(&self, identifier: &str) -> String {
        format!(
            "{}/{}",
            self.registry_url.trim_end_matches('/'),
            identifier.replace('/', "%2F")
        )
    }

    pub fn catalog_page_url(&self, identifier: &str) -> String {
        format!("https://{}/package/{}", self.catalog_host, identifier)
    }

    /// Match pattern for chrome.tabs.query covering every item page
    pub fn catalog_tab_pattern(&self) -> String {
        format!("https://{}/package/*", self.catalog_host)
    }
}
