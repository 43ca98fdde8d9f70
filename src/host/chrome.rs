/// chrome.* implementations of the storage, registry and bus seams

use crate::bus::{Delivery, Listener, MessageBus, Notifier};
use crate::error::{FavesError, Result};
use crate::message::{SyncMessage, SyncResponse};
use crate::settings::Settings;
use crate::store::{KeyValueStore, MetadataSource, PackageSummary};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;

// Import JS bridge functions
#[wasm_bindgen(module = "/js/chrome.js")]
extern "C" {
    #[wasm_bindgen(catch)]
    async fn getStorage(key: &str) -> std::result::Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn setStorage(key: &str, value: JsValue) -> std::result::Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn removeStorage(key: &str) -> std::result::Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn getAllStorage() -> std::result::Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn sendMessage(message: JsValue) -> std::result::Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn broadcast(message: JsValue, tab_url_pattern: &str) -> std::result::Result<(), JsValue>;

    fn addMessageListener(callback: &js_sys::Function);

    #[wasm_bindgen(catch)]
    async fn fetchJson(url: &str) -> std::result::Result<JsValue, JsValue>;

    pub fn extensionUrl(path: &str) -> String;
}

/// Plain objects rather than ES maps, so chrome.storage can persist them
fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue> {
    Ok(value.serialize(&serde_wasm_bindgen::Serializer::json_compatible())?)
}

fn describe(e: &JsValue) -> String {
    e.as_string()
        .or_else(|| {
            e.dyn_ref::<js_sys::Error>()
                .map(|err| String::from(err.message()))
        })
        .unwrap_or_else(|| format!("{:?}", e))
}

/// chrome.storage.local
pub struct ChromeStorage;

#[async_trait(?Send)]
impl KeyValueStore for ChromeStorage {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let raw = getStorage(key)
            .await
            .map_err(|e| FavesError::Store(describe(&e)))?;

        if raw.is_null() || raw.is_undefined() {
            return Ok(None);
        }
        Ok(Some(serde_wasm_bindgen::from_value(raw)?))
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        setStorage(key, to_js(&value)?)
            .await
            .map_err(|e| FavesError::Store(describe(&e)))
    }

    async fn remove(&self, key: &str) -> Result<()> {
        removeStorage(key)
            .await
            .map_err(|e| FavesError::Store(describe(&e)))
    }

    async fn entries(&self) -> Result<Vec<(String, Value)>> {
        let raw = getAllStorage()
            .await
            .map_err(|e| FavesError::Store(describe(&e)))?;
        let all: serde_json::Map<String, Value> = serde_wasm_bindgen::from_value(raw)?;
        Ok(all.into_iter().collect())
    }
}

/// npm registry documents over fetch
pub struct RegistryClient {
    settings: Rc<Settings>,
}

impl RegistryClient {
    pub fn new(settings: Rc<Settings>) -> Self {
        RegistryClient { settings }
    }
}

#[async_trait(?Send)]
impl MetadataSource for RegistryClient {
    async fn fetch(&self, identifier: &str) -> Result<PackageSummary> {
        let url = self.settings.registry_document_url(identifier);
        log::debug!("Fetching {}", url);

        let raw = fetchJson(&url)
            .await
            .map_err(|e| FavesError::RemoteMetadata(describe(&e)))?;
        let document: Value = serde_wasm_bindgen::from_value(raw)
            .map_err(|e| FavesError::RemoteMetadata(e.to_string()))?;

        PackageSummary::from_registry_document(&document, js_sys::Date::now())
    }
}

/// chrome.runtime.sendMessage towards the background
pub struct RuntimeBus;

#[async_trait(?Send)]
impl MessageBus for RuntimeBus {
    async fn request(&self, message: &SyncMessage) -> Result<SyncResponse> {
        let raw = sendMessage(to_js(message)?)
            .await
            .map_err(|e| FavesError::ChannelDelivery(describe(&e)))?;

        // An undefined reply means the listener went away before answering
        serde_wasm_bindgen::from_value(raw)
            .map_err(|e| FavesError::ChannelDelivery(format!("unreadable response: {}", e)))
    }
}

/// Tab + extension page broadcast; subscribing listens on chrome.runtime.onMessage
pub struct TabBroadcast {
    tab_url_pattern: String,
}

impl TabBroadcast {
    pub fn new(settings: &Settings) -> Self {
        TabBroadcast {
            tab_url_pattern: settings.catalog_tab_pattern(),
        }
    }
}

impl Notifier for TabBroadcast {
    fn publish(&self, message: &SyncMessage) -> Delivery {
        let payload = match to_js(message) {
            Ok(payload) => payload,
            Err(e) => return Delivery::Undeliverable(e.to_string()),
        };

        let pattern = self.tab_url_pattern.clone();
        let identifier = message.identifier.clone();
        spawn_local(async move {
            if let Err(e) = broadcast(payload, &pattern).await {
                log::warn!("Broadcast for {} failed: {}", identifier, describe(&e));
            }
        });
        Delivery::Dispatched
    }

    fn subscribe(&self, listener: Listener) {
        let callback = Closure::wrap(Box::new(move |raw: JsValue| {
            match serde_wasm_bindgen::from_value::<SyncMessage>(raw) {
                Ok(message) => listener(message),
                Err(e) => log::debug!("Ignoring foreign message: {}", e),
            }
        }) as Box<dyn Fn(JsValue)>);

        addMessageListener(callback.as_ref().unchecked_ref());
        // Lives as long as the context
        callback.forget();
    }
}
