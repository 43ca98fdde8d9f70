/// Per-page-load favorite toggle injected into catalog item pages

use crate::bus::{Listener, MessageBus};
use crate::error::{FavesError, Result};
use crate::identifier::PackageMatcher;
use crate::message::{Action, SyncMessage, ToggleIntent};
use crate::settings::Settings;
use crate::store::FavoriteLookup;
use futures::task::{LocalSpawn, LocalSpawnExt};
use std::cell::Cell;
use std::future::Future;
use std::rc::Rc;

pub const ADD_LABEL: &str = "Add to faves";
pub const REMOVE_LABEL: &str = "Remove from faves";

pub const ADDED_MESSAGE: &str = "Package added to faves :)";
pub const REMOVED_MESSAGE: &str = "Package removed from faves :(";
pub const FAILED_MESSAGE: &str = "An error occurred :/";

/// Invoked with the intent bound when the control was rendered
pub type ClickHandler = Rc<dyn Fn(ToggleIntent)>;

/// Everything needed to draw one toggle
#[derive(Debug, Clone, PartialEq)]
pub struct ToggleControl {
    pub element_id: String,
    pub intent: ToggleIntent,
    /// Transient status shown next to the control
    pub message: Option<String>,
}

impl ToggleControl {
    pub fn label(&self) -> &'static str {
        match self.intent.action {
            Action::Add => ADD_LABEL,
            Action::Remove => REMOVE_LABEL,
        }
    }

    pub fn data_action(&self) -> &'static str {
        self.intent.action.data_attribute()
    }

    pub fn favorited(&self) -> bool {
        self.intent.action == Action::Remove
    }
}

/// The page DOM as seen by the controller
///
/// Implementations look elements up again on every call; nothing is cached
/// across an await, since the page may have changed in between.
pub trait PageSurface {
    fn current_url(&self) -> String;

    fn is_visible(&self) -> bool;

    /// Named anchor lookup; false on interstitials and unexpected layouts
    fn has_anchor(&self) -> bool;

    /// Adds each stylesheet once; already-present links are skipped
    fn inject_stylesheets(&self, hrefs: &[String]);

    /// Removes every control with this id; no-op when there is none
    fn remove_control(&self, element_id: &str);

    fn insert_control(&self, control: &ToggleControl, on_click: ClickHandler) -> Result<()>;

    /// Returns false when the control is no longer in the document
    fn disable_control(&self, element_id: &str) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Uninitialized,
    Rendered { favorited: bool },
    Disposed,
}

pub struct PageController<S, L, B> {
    surface: S,
    lookup: L,
    bus: B,
    spawner: Rc<dyn LocalSpawn>,
    settings: Rc<Settings>,
    matcher: PackageMatcher,
    identifier: String,
    state: Cell<ControllerState>,
}

impl<S, L, B> PageController<S, L, B>
where
    S: PageSurface + 'static,
    L: FavoriteLookup + 'static,
    B: MessageBus + 'static,
{
    /// Set up the toggle for the current page and draw it once
    ///
    /// Fails with `PageNotApplicable` when the anchor is missing and with
    /// `IdentifierUnresolvable` when the address is not an item page. Callers
    /// log the first and ignore the second.
    pub async fn initialize(
        surface: S,
        lookup: L,
        bus: B,
        spawner: Rc<dyn LocalSpawn>,
        settings: Rc<Settings>,
    ) -> Result<Rc<Self>> {
        if !surface.has_anchor() {
            return Err(FavesError::PageNotApplicable(format!(
                "nothing matches {}",
                settings.anchor_selector
            )));
        }

        let matcher = PackageMatcher::new(&settings)?;
        let identifier = matcher.require_package(&surface.current_url())?;

        surface.inject_stylesheets(&settings.stylesheets);

        let controller = Rc::new(PageController {
            surface,
            lookup,
            bus,
            spawner,
            settings,
            matcher,
            identifier,
            state: Cell::new(ControllerState::Uninitialized),
        });

        log::info!("Favorite toggle ready for {}", controller.identifier);
        controller.render(None).await;
        Ok(controller)
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn state(&self) -> ControllerState {
        self.state.get()
    }

    fn is_disposed(&self) -> bool {
        self.state.get() == ControllerState::Disposed
    }

    /// Stop reacting; late responses and broadcasts become no-ops
    pub fn dispose(&self) {
        self.state.set(ControllerState::Disposed);
    }

    /// Re-query the store and replace the control
    ///
    /// Always reads the store instead of trusting the last response, so the
    /// control shows what the background actually persisted.
    pub async fn render(self: &Rc<Self>, message: Option<&str>) {
        if self.is_disposed() {
            return;
        }

        let (favorited, message) = match self.lookup.get(&self.identifier, false).await {
            Ok(record) => (record.is_some(), message.map(str::to_string)),
            Err(e) => {
                log::error!("Could not read favorite state of {}: {}", self.identifier, e);
                (false, Some(FAILED_MESSAGE.to_string()))
            }
        };

        // Disposed while the lookup was in flight
        if self.is_disposed() {
            return;
        }

        let control = ToggleControl {
            element_id: self.settings.control_id.clone(),
            intent: ToggleIntent::new(Action::toggling(favorited), self.identifier.clone()),
            message,
        };

        self.surface.remove_control(&control.element_id);
        match self.surface.insert_control(&control, self.click_handler()) {
            Ok(()) => self.state.set(ControllerState::Rendered { favorited }),
            Err(e) => log::warn!("Toggle for {} not rendered: {}", self.identifier, e),
        }
    }

    /// Submit one click to the background and redraw from the store
    pub async fn handle_click(self: &Rc<Self>, intent: ToggleIntent) {
        if self.is_disposed() {
            return;
        }

        if !self.surface.disable_control(&self.settings.control_id) {
            log::debug!("Toggle for {} already gone", self.identifier);
        }

        let action = intent.action;
        match self.bus.request(&intent.into_message()).await {
            Ok(response) => {
                let message = match (response.result, action) {
                    (true, Action::Add) => ADDED_MESSAGE,
                    (true, Action::Remove) => REMOVED_MESSAGE,
                    (false, _) => FAILED_MESSAGE,
                };
                self.render(Some(message)).await;
            }
            Err(e) => {
                // The control stays disabled until the next render
                log::error!("Toggle request for {} failed: {}", self.identifier, e);
            }
        }
    }

    /// Reconcile with a removal made elsewhere (the panel, another tab)
    pub async fn on_bus_message(self: &Rc<Self>, message: SyncMessage) {
        if message.removes(&self.identifier) {
            log::debug!("{} removed elsewhere", self.identifier);
            self.render(Some(REMOVED_MESSAGE)).await;
        }
    }

    /// Catch up on removals broadcast while the page was hidden
    pub async fn on_visibility_change(self: &Rc<Self>) {
        if self.surface.is_visible() && self.matcher.is_item_page(&self.surface.current_url()) {
            self.render(None).await;
        }
    }

    /// `pagehide`: a page parked in the back/forward cache (`persisted`) may
    /// come back, so only a real unload disposes
    pub fn on_page_hide(&self, persisted: bool) {
        if persisted {
            log::debug!("Page of {} entered the back/forward cache", self.identifier);
        } else {
            self.dispose();
        }
    }

    /// `pageshow`: a page restored from the back/forward cache missed every
    /// broadcast while parked
    pub async fn on_page_show(self: &Rc<Self>, persisted: bool) {
        if persisted {
            self.render(None).await;
        }
    }

    /// Bus listener forwarding to `on_bus_message`
    pub fn bus_listener(self: &Rc<Self>) -> Listener {
        let weak = Rc::downgrade(self);
        Rc::new(move |message: SyncMessage| {
            if let Some(controller) = weak.upgrade() {
                let task = controller.clone();
                controller.spawn(async move { task.on_bus_message(message).await });
            }
        })
    }

    /// Callback for the document's visibilitychange event
    pub fn visibility_listener(self: &Rc<Self>) -> Rc<dyn Fn()> {
        let weak = Rc::downgrade(self);
        Rc::new(move || {
            if let Some(controller) = weak.upgrade() {
                let task = controller.clone();
                controller.spawn(async move { task.on_visibility_change().await });
            }
        })
    }

    /// Callback for the window's `pagehide` event
    ///
    /// Holds a strong reference: whoever registers it keeps the controller
    /// alive for the lifetime of the document. Every other listener is weak.
    pub fn page_hide_listener(self: &Rc<Self>) -> Rc<dyn Fn(bool)> {
        let controller = self.clone();
        Rc::new(move |persisted: bool| controller.on_page_hide(persisted))
    }

    /// Callback for the window's `pageshow` event
    pub fn page_show_listener(self: &Rc<Self>) -> Rc<dyn Fn(bool)> {
        let weak = Rc::downgrade(self);
        Rc::new(move |persisted: bool| {
            if let Some(controller) = weak.upgrade() {
                let task = controller.clone();
                controller.spawn(async move { task.on_page_show(persisted).await });
            }
        })
    }

    fn click_handler(self: &Rc<Self>) -> ClickHandler {
        let weak = Rc::downgrade(self);
        Rc::new(move |intent: ToggleIntent| {
            if let Some(controller) = weak.upgrade() {
                let task = controller.clone();
                controller.spawn(async move { task.handle_click(intent).await });
            }
        })
    }

    fn spawn(&self, task: impl Future<Output = ()> + 'static) {
        if let Err(e) = self.spawner.spawn_local(task) {
            log::error!("Could not schedule task for {}: {}", self.identifier, e);
        }
    }
}
