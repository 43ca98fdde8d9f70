/// Favorite records over chrome.storage.local

use crate::error::{FavesError, Result};
use crate::settings::Settings;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::rc::Rc;

/// Opaque async key-value persistence (chrome.storage.local in the extension)
#[async_trait(?Send)]
pub trait KeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    async fn set(&self, key: &str, value: Value) -> Result<()>;

    /// Removing a missing key is not an error
    async fn remove(&self, key: &str) -> Result<()>;

    async fn entries(&self) -> Result<Vec<(String, Value)>>;
}

/// Remote catalog lookup (the npm registry in the extension)
#[async_trait(?Send)]
pub trait MetadataSource {
    async fn fetch(&self, identifier: &str) -> Result<PackageSummary>;
}

/// Read-only view of the favorites, the only part handed to pages and the panel
#[async_trait(?Send)]
pub trait FavoriteLookup {
    async fn get(
        &self,
        identifier: &str,
        refresh_from_remote: bool,
    ) -> Result<Option<FavoriteRecord>>;

    async fn list(&self) -> Result<Vec<FavoriteRecord>>;
}

/// Descriptive payload stored with a favorite; may be stale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageSummary {
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub homepage: Option<String>,
    /// Milliseconds since the epoch
    #[serde(default)]
    pub fetched_at: f64,
}

impl PackageSummary {
    /// Build from a registry document (`GET <registry>/<name>`)
    pub fn from_registry_document(document: &Value, fetched_at: f64) -> Result<PackageSummary> {
        let name = document
            .get("name")
            .and_then(Value::as_str)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| {
                FavesError::RemoteMetadata("registry document has no name".to_string())
            })?;

        let text = |field: &str| {
            document
                .get(field)
                .and_then(Value::as_str)
                .map(str::to_string)
        };

        Ok(PackageSummary {
            name: name.to_string(),
            version: document
                .pointer("/dist-tags/latest")
                .and_then(Value::as_str)
                .map(str::to_string),
            description: text("description"),
            homepage: text("homepage"),
            fetched_at,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FavoriteRecord {
    pub identifier: String,
    pub metadata: PackageSummary,
}

/// Durable identifier → record mapping
///
/// Presence of a key is the favorite flag. Only the background coordinator
/// calls `add`/`remove`; everything else goes through `FavoriteLookup`.
pub struct FavoriteStore<K, M> {
    kv: K,
    registry: M,
    settings: Rc<Settings>,
}

impl<K: KeyValueStore, M: MetadataSource> FavoriteStore<K, M> {
    pub fn new(kv: K, registry: M, settings: Rc<Settings>) -> Self {
        FavoriteStore { kv, registry, settings }
    }

    /// Fetch current metadata and persist a record; nothing is written if the fetch fails
    pub async fn add(&self, identifier: &str) -> Result<()> {
        let key = self.key_for(identifier)?;
        let summary = self.registry.fetch(identifier).await?;

        self.kv.set(&key, serde_json::to_value(&summary)?).await?;
        log::info!("Added {} to faves", identifier);
        Ok(())
    }

    pub async fn remove(&self, identifier: &str) -> Result<()> {
        let key = self.key_for(identifier)?;
        self.kv.remove(&key).await?;
        log::info!("Removed {} from faves", identifier);
        Ok(())
    }

    fn key_for(&self, identifier: &str) -> Result<String> {
        if identifier.is_empty() {
            return Err(FavesError::IdentifierUnresolvable(identifier.to_string()));
        }
        Ok(self.settings.record_key(identifier))
    }
}

#[async_trait(?Send)]
impl<K: KeyValueStore, M: MetadataSource> FavoriteLookup for FavoriteStore<K, M> {
    async fn get(
        &self,
        identifier: &str,
        refresh_from_remote: bool,
    ) -> Result<Option<FavoriteRecord>> {
        let key = self.key_for(identifier)?;
        let Some(raw) = self.kv.get(&key).await? else {
            return Ok(None);
        };
        let stored: PackageSummary = serde_json::from_value(raw)?;

        let metadata = if refresh_from_remote {
            match self.registry.fetch(identifier).await {
                Ok(fresh) => fresh,
                Err(e) => {
                    log::warn!("Keeping stale metadata for {}: {}", identifier, e);
                    stored
                }
            }
        } else {
            stored
        };

        Ok(Some(FavoriteRecord {
            identifier: identifier.to_string(),
            metadata,
        }))
    }

    async fn list(&self) -> Result<Vec<FavoriteRecord>> {
        let prefix = &self.settings.storage_prefix;

        let mut records: Vec<FavoriteRecord> = self
            .kv
            .entries()
            .await?
            .into_iter()
            .filter_map(|(key, raw)| {
                let identifier = key.strip_prefix(prefix.as_str())?.to_string();
                match serde_json::from_value::<PackageSummary>(raw) {
                    Ok(metadata) => Some(FavoriteRecord { identifier, metadata }),
                    Err(e) => {
                        log::warn!("Skipping unreadable record {}: {}", key, e);
                        None
                    }
                }
            })
            .collect();

        records.sort_by(|a, b| a.identifier.cmp(&b.identifier));
        Ok(records)
    }
}
