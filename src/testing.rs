/// In-memory fakes for the host collaborators, shared by the unit tests

use crate::bus::{Delivery, Listener, MessageBus, Notifier};
use crate::coordinator::BackgroundCoordinator;
use crate::error::{FavesError, Result};
use crate::message::{SyncMessage, SyncResponse, ToggleIntent};
use crate::page::{ClickHandler, PageSurface, ToggleControl};
use crate::store::{KeyValueStore, MetadataSource, PackageSummary};
use async_trait::async_trait;
use futures::channel::oneshot;
use futures::future::{FutureExt, LocalBoxFuture};
use serde_json::Value;
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

pub fn summary(name: &str, version: &str) -> PackageSummary {
    PackageSummary {
        name: name.to_string(),
        version: Some(version.to_string()),
        description: None,
        homepage: None,
        fetched_at: 1698508200000.0,
    }
}

/// chrome.storage.local stand-in; clones share the same map
#[derive(Clone, Default)]
pub struct MemoryStore {
    entries: Rc<RefCell<BTreeMap<String, Value>>>,
    fail_reads: Rc<Cell<bool>>,
    fail_writes: Rc<Cell<bool>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, key: &str, value: Value) {
        self.entries.borrow_mut().insert(key.to_string(), value);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.borrow().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.set(fail);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }

    fn check_readable(&self) -> Result<()> {
        if self.fail_reads.get() {
            Err(FavesError::Store("storage unavailable".to_string()))
        } else {
            Ok(())
        }
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_writes.get() {
            Err(FavesError::Store("quota exceeded".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait(?Send)]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        self.check_readable()?;
        Ok(self.entries.borrow().get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        self.check_writable()?;
        self.insert(key, value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.check_writable()?;
        self.entries.borrow_mut().remove(key);
        Ok(())
    }

    async fn entries(&self) -> Result<Vec<(String, Value)>> {
        self.check_readable()?;
        Ok(self
            .entries
            .borrow()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}

/// Registry stand-in; unknown packages fail like a 404
#[derive(Clone, Default)]
pub struct FakeRegistry {
    packages: Rc<RefCell<HashMap<String, PackageSummary>>>,
    failure: Rc<RefCell<Option<String>>>,
}

impl FakeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, summary: PackageSummary) {
        self.packages.borrow_mut().insert(summary.name.clone(), summary);
    }

    pub fn fail_with(&self, reason: &str) {
        *self.failure.borrow_mut() = Some(reason.to_string());
    }
}

#[async_trait(?Send)]
impl MetadataSource for FakeRegistry {
    async fn fetch(&self, identifier: &str) -> Result<PackageSummary> {
        if let Some(reason) = self.failure.borrow().clone() {
            return Err(FavesError::RemoteMetadata(reason));
        }
        self.packages
            .borrow()
            .get(identifier)
            .cloned()
            .ok_or_else(|| FavesError::RemoteMetadata(format!("404 {}", identifier)))
    }
}

type RequestHandler = Rc<dyn Fn(SyncMessage) -> LocalBoxFuture<'static, SyncResponse>>;

/// Single-process message bus: requests go to the wired coordinator,
/// publishes reach every subscriber
#[derive(Default)]
pub struct LoopbackBus {
    handler: RefCell<Option<RequestHandler>>,
    listeners: RefCell<Vec<Listener>>,
    published: RefCell<Vec<SyncMessage>>,
    refusal: RefCell<Option<String>>,
    hold: Cell<bool>,
    held: RefCell<Vec<oneshot::Sender<()>>>,
}

impl LoopbackBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route requests to `coordinator`; the bus only keeps a weak reference
    pub fn wire<K, M>(&self, coordinator: &Rc<BackgroundCoordinator<K, M, Rc<LoopbackBus>>>)
    where
        K: KeyValueStore + 'static,
        M: MetadataSource + 'static,
    {
        let weak = Rc::downgrade(coordinator);
        let handler: RequestHandler = Rc::new(move |message| {
            let weak = weak.clone();
            async move {
                match weak.upgrade() {
                    Some(coordinator) => coordinator.handle(message).await,
                    None => SyncResponse::failed(),
                }
            }
            .boxed_local()
        });
        *self.handler.borrow_mut() = Some(handler);
    }

    /// Simulates a suspended background context
    pub fn disconnect(&self) {
        *self.handler.borrow_mut() = None;
    }

    /// Requests still reach the coordinator, but responses wait for `release`
    pub fn hold_responses(&self) {
        self.hold.set(true);
    }

    pub fn release(&self) {
        self.hold.set(false);
        for sender in self.held.borrow_mut().drain(..) {
            let _ = sender.send(());
        }
    }

    pub fn refuse_publish(&self, reason: &str) {
        *self.refusal.borrow_mut() = Some(reason.to_string());
    }

    pub fn published(&self) -> Vec<SyncMessage> {
        self.published.borrow().clone()
    }
}

#[async_trait(?Send)]
impl MessageBus for LoopbackBus {
    async fn request(&self, message: &SyncMessage) -> Result<SyncResponse> {
        let handler = self.handler.borrow().clone();
        let Some(handler) = handler else {
            return Err(FavesError::ChannelDelivery(
                "Could not establish connection. Receiving end does not exist.".to_string(),
            ));
        };

        let response = handler(message.clone()).await;
        if self.hold.get() {
            let (sender, receiver) = oneshot::channel();
            self.held.borrow_mut().push(sender);
            let _ = receiver.await;
        }
        Ok(response)
    }
}

impl Notifier for LoopbackBus {
    fn publish(&self, message: &SyncMessage) -> Delivery {
        self.published.borrow_mut().push(message.clone());

        if let Some(reason) = self.refusal.borrow().clone() {
            return Delivery::Undeliverable(reason);
        }

        let listeners = self.listeners.borrow().clone();
        for listener in listeners {
            listener(message.clone());
        }
        Delivery::Dispatched
    }

    fn subscribe(&self, listener: Listener) {
        self.listeners.borrow_mut().push(listener);
    }
}

struct MountedControl {
    control: ToggleControl,
    on_click: ClickHandler,
    disabled: bool,
}

struct SurfaceState {
    url: String,
    visible: bool,
    anchor: bool,
    controls: Vec<MountedControl>,
    stylesheets: Vec<String>,
}

/// DOM stand-in; clones share the same page
#[derive(Clone)]
pub struct FakeSurface {
    state: Rc<RefCell<SurfaceState>>,
}

impl FakeSurface {
    pub fn new(url: &str) -> Self {
        FakeSurface {
            state: Rc::new(RefCell::new(SurfaceState {
                url: url.to_string(),
                visible: true,
                anchor: true,
                controls: Vec::new(),
                stylesheets: Vec::new(),
            })),
        }
    }

    pub fn without_anchor(self) -> Self {
        self.state.borrow_mut().anchor = false;
        self
    }

    pub fn set_url(&self, url: &str) {
        self.state.borrow_mut().url = url.to_string();
    }

    pub fn set_visible(&self, visible: bool) {
        self.state.borrow_mut().visible = visible;
    }

    pub fn control_count(&self) -> usize {
        self.state.borrow().controls.len()
    }

    pub fn control(&self) -> Option<ToggleControl> {
        self.state.borrow().controls.last().map(|m| m.control.clone())
    }

    pub fn is_disabled(&self) -> bool {
        self.state.borrow().controls.iter().all(|m| m.disabled)
    }

    pub fn stylesheets(&self) -> Vec<String> {
        self.state.borrow().stylesheets.clone()
    }

    /// Clicks the control like a user would; disabled controls ignore clicks
    pub fn click(&self) -> bool {
        let target: Option<(ClickHandler, ToggleIntent)> = self
            .state
            .borrow()
            .controls
            .iter()
            .find(|m| !m.disabled)
            .map(|m| (m.on_click.clone(), m.control.intent.clone()));

        match target {
            Some((on_click, intent)) => {
                on_click(intent);
                true
            }
            None => false,
        }
    }
}

impl PageSurface for FakeSurface {
    fn current_url(&self) -> String {
        self.state.borrow().url.clone()
    }

    fn is_visible(&self) -> bool {
        self.state.borrow().visible
    }

    fn has_anchor(&self) -> bool {
        self.state.borrow().anchor
    }

    fn inject_stylesheets(&self, hrefs: &[String]) {
        let mut state = self.state.borrow_mut();
        for href in hrefs {
            if !state.stylesheets.contains(href) {
                state.stylesheets.push(href.clone());
            }
        }
    }

    fn remove_control(&self, element_id: &str) {
        self.state
            .borrow_mut()
            .controls
            .retain(|m| m.control.element_id != element_id);
    }

    fn insert_control(&self, control: &ToggleControl, on_click: ClickHandler) -> Result<()> {
        let mut state = self.state.borrow_mut();
        if !state.anchor {
            return Err(FavesError::PageNotApplicable("anchor vanished".to_string()));
        }
        state.controls.push(MountedControl {
            control: control.clone(),
            on_click,
            disabled: false,
        });
        Ok(())
    }

    fn disable_control(&self, element_id: &str) -> bool {
        let mut state = self.state.borrow_mut();
        let mut found = false;
        for mounted in state.controls.iter_mut().filter(|m| m.control.element_id == element_id) {
            mounted.disabled = true;
            found = true;
        }
        found
    }
}
