/// Message bus seams between the page, panel and background contexts

use crate::error::Result;
use crate::message::{SyncMessage, SyncResponse};
use async_trait::async_trait;
use std::rc::Rc;

/// Callback invoked for every message a context receives from the bus
pub type Listener = Rc<dyn Fn(SyncMessage)>;

/// Request/response path to the background coordinator
#[async_trait(?Send)]
pub trait MessageBus {
    /// At most one response per request; fails with `ChannelDelivery` when nobody answers
    async fn request(&self, message: &SyncMessage) -> Result<SyncResponse>;
}

/// Outcome of a best-effort publish
///
/// `Dispatched` only means the message left this context. Receivers may not
/// exist, may be suspended, or the sending context may be torn down first.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Dispatched,
    Undeliverable(String),
}

/// Fire-and-forget pub/sub used to reconcile live contexts
pub trait Notifier {
    fn publish(&self, message: &SyncMessage) -> Delivery;

    fn subscribe(&self, listener: Listener);
}

impl<T: Notifier + ?Sized> Notifier for Rc<T> {
    fn publish(&self, message: &SyncMessage) -> Delivery {
        (**self).publish(message)
    }

    fn subscribe(&self, listener: Listener) {
        (**self).subscribe(listener)
    }
}

#[async_trait(?Send)]
impl<T: MessageBus + ?Sized> MessageBus for Rc<T> {
    async fn request(&self, message: &SyncMessage) -> Result<SyncResponse> {
        (**self).request(message).await
    }
}
