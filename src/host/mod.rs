/// Browser-side wiring of each execution context

pub mod chrome;
pub mod dom;

use crate::bus::{MessageBus, Notifier};
use crate::coordinator::BackgroundCoordinator;
use crate::error::{FavesError, Result};
use crate::message::{Action, SyncMessage, SyncResponse};
use crate::page::PageController;
use crate::settings::Settings;
use crate::store::{FavoriteLookup, FavoriteRecord, FavoriteStore};
use chrome::{ChromeStorage, RegistryClient, RuntimeBus, TabBroadcast};
use dom::DomSurface;
use futures::future::FutureExt;
use futures::task::{LocalFutureObj, LocalSpawn, SpawnError};
use std::rc::Rc;

/// Spawns onto the browser microtask queue
pub struct WasmSpawner;

impl LocalSpawn for WasmSpawner {
    fn spawn_local_obj(
        &self,
        future: LocalFutureObj<'static, ()>,
    ) -> std::result::Result<(), SpawnError> {
        wasm_bindgen_futures::spawn_local(future);
        Ok(())
    }
}

/// Settings for this context; also applies the configured log level
pub async fn load_settings() -> Rc<Settings> {
    let settings = Settings::load(&ChromeStorage).await;
    log::set_max_level(settings.log_level().to_level_filter());
    Rc::new(settings)
}

fn favorite_store(settings: &Rc<Settings>) -> FavoriteStore<ChromeStorage, RegistryClient> {
    FavoriteStore::new(ChromeStorage, RegistryClient::new(settings.clone()), settings.clone())
}

/// Content script: inject the toggle and keep it reconciled
pub async fn run_content_script() -> Result<()> {
    let settings = load_settings().await;
    let surface = DomSurface::new(&settings.anchor_selector)?;

    let controller = match PageController::initialize(
        surface,
        favorite_store(&settings),
        RuntimeBus,
        Rc::new(WasmSpawner),
        settings.clone(),
    )
    .await
    {
        Ok(controller) => controller,
        Err(FavesError::PageNotApplicable(reason)) => {
            log::warn!("Toggle not injected: {}", reason);
            return Ok(());
        }
        Err(FavesError::IdentifierUnresolvable(_)) => return Ok(()),
        Err(e) => return Err(e),
    };

    // Registered first: this listener owns the controller for the document's lifetime
    dom::on_page_transition("pagehide", controller.page_hide_listener())?;
    dom::on_page_transition("pageshow", controller.page_show_listener())?;

    TabBroadcast::new(&settings).subscribe(controller.bus_listener());
    dom::on_visibility_change(controller.visibility_listener())?;
    Ok(())
}

/// Background: one coordinator per request, nothing kept in between
pub async fn handle_background_message(raw: serde_json::Value) -> SyncResponse {
    let settings = load_settings().await;
    let coordinator =
        BackgroundCoordinator::new(favorite_store(&settings), TabBroadcast::new(&settings));
    coordinator.handle_value(raw).await
}

/// Panel: every favorite, optionally with metadata refreshed from the registry
pub async fn load_faves(refresh: bool) -> Result<Vec<FavoriteRecord>> {
    let settings = load_settings().await;
    let store = favorite_store(&settings);
    let records = store.list().await?;

    if !refresh {
        return Ok(records);
    }

    let mut refreshed = Vec::with_capacity(records.len());
    for record in records {
        // Removed in the meantime: drop it from the listing
        if let Some(fresh) = store.get(&record.identifier, true).await? {
            refreshed.push(fresh);
        }
    }
    Ok(refreshed)
}

/// Panel: ask the background to remove a favorite; Ok(false) when it refused
pub async fn remove_fave(identifier: &str) -> Result<bool> {
    let response = RuntimeBus.request(&SyncMessage::remove(identifier)).await?;
    Ok(response.result)
}

/// Panel: reload whenever a removal is broadcast
pub fn on_removal(settings: &Settings, callback: impl Fn(SyncMessage) + 'static) {
    TabBroadcast::new(settings).subscribe(Rc::new(move |message: SyncMessage| {
        if message.action == Action::Remove {
            callback(message);
        }
    }));
}

/// Spawn a context's startup task, logging a failure instead of throwing
pub fn spawn_logged(task: impl std::future::Future<Output = Result<()>> + 'static) {
    wasm_bindgen_futures::spawn_local(task.map(|result| {
        if let Err(e) = result {
            log::error!("{}", e);
        }
    }));
}
