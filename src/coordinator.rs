/// Background request handling: the single writer of the favorite store

use crate::bus::{Delivery, Notifier};
use crate::message::{Action, SyncMessage, SyncResponse};
use crate::store::{FavoriteStore, KeyValueStore, MetadataSource};
use serde_json::Value;

/// Stateless handler over an injected store and notifier
///
/// Nothing survives between requests, so the host may suspend and restart
/// the background context at any point. Two requests for the same package
/// that interleave at an await point resolve as last-write-wins.
pub struct BackgroundCoordinator<K, M, N> {
    store: FavoriteStore<K, M>,
    notifier: N,
}

impl<K, M, N> BackgroundCoordinator<K, M, N>
where
    K: KeyValueStore,
    M: MetadataSource,
    N: Notifier,
{
    pub fn new(store: FavoriteStore<K, M>, notifier: N) -> Self {
        BackgroundCoordinator { store, notifier }
    }

    pub async fn handle(&self, message: SyncMessage) -> SyncResponse {
        log::debug!("Handling {:?} for {}", message.action, message.identifier);

        match message.action {
            Action::Add => match self.store.add(&message.identifier).await {
                Ok(()) => SyncResponse::ok(),
                Err(e) => {
                    log::warn!("Could not add {}: {}", message.identifier, e);
                    SyncResponse::failed()
                }
            },
            Action::Remove => match self.store.remove(&message.identifier).await {
                Ok(()) => {
                    self.rebroadcast(&message);
                    SyncResponse::ok()
                }
                Err(e) => {
                    log::error!("Could not remove {}: {}", message.identifier, e);
                    SyncResponse::failed()
                }
            },
        }
    }

    /// Entry point for raw bus payloads
    pub async fn handle_value(&self, raw: Value) -> SyncResponse {
        match serde_json::from_value::<SyncMessage>(raw) {
            Ok(message) => self.handle(message).await,
            Err(e) => {
                log::warn!("Ignoring malformed request: {}", e);
                SyncResponse::failed()
            }
        }
    }

    // Every applied REMOVE goes out, whoever sent it; receivers re-query the
    // store, so a page seeing its own removal again just re-renders.
    fn rebroadcast(&self, message: &SyncMessage) {
        match self.notifier.publish(message) {
            Delivery::Dispatched => {
                log::debug!("Broadcast removal of {}", message.identifier);
            }
            Delivery::Undeliverable(reason) => {
                log::warn!("Removal of {} not broadcast: {}", message.identifier, reason);
            }
        }
    }
}
