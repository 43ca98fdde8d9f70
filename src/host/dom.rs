/// Page DOM implementation of `PageSurface`

use crate::error::{FavesError, Result};
use crate::host::chrome::extensionUrl;
use crate::page::{ClickHandler, PageSurface, ToggleControl};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, MouseEvent, PageTransitionEvent, VisibilityState};

/// How long a status message stays next to the toggle
const MESSAGE_TIMEOUT_MS: i32 = 4000;

pub struct DomSurface {
    document: Document,
    anchor_selector: String,
    // Only the current control's listener is kept; replaced on every render
    click_listener: RefCell<Option<Closure<dyn FnMut(MouseEvent)>>>,
}

impl DomSurface {
    pub fn new(anchor_selector: &str) -> Result<Self> {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| FavesError::PageNotApplicable("no document".to_string()))?;

        Ok(DomSurface {
            document,
            anchor_selector: anchor_selector.to_string(),
            click_listener: RefCell::new(None),
        })
    }

    fn anchor(&self) -> Option<Element> {
        self.document
            .query_selector(&self.anchor_selector)
            .ok()
            .flatten()
    }

    fn create(&self, tag: &str) -> Result<Element> {
        self.document.create_element(tag).map_err(dom_error)
    }

    fn build_control(&self, control: &ToggleControl) -> Result<(Element, Element)> {
        let container = self.create("div")?;
        container.set_id(&control.element_id);
        container.set_class_name(if control.favorited() {
            "npm-faves npm-faves--favorited"
        } else {
            "npm-faves"
        });

        let button = self.create("button")?;
        button.set_attribute("type", "button").map_err(dom_error)?;
        button
            .set_attribute("data-action", control.data_action())
            .map_err(dom_error)?;
        button.set_class_name("npm-faves__button");
        button.set_text_content(Some(control.label()));
        container.append_child(&button).map_err(dom_error)?;

        if let Some(message) = &control.message {
            let status = self.create("span")?;
            status.set_class_name("npm-faves__message");
            status.set_text_content(Some(message));
            container.append_child(&status).map_err(dom_error)?;
            fade_out(status);
        }

        Ok((container, button))
    }
}

fn dom_error(e: JsValue) -> FavesError {
    FavesError::PageNotApplicable(format!("{:?}", e))
}

// Removing an already detached node is a no-op, so a late timer is harmless
fn fade_out(status: Element) {
    let Some(window) = web_sys::window() else {
        return;
    };
    let remove = Closure::once_into_js(move || status.remove());
    if let Err(e) = window.set_timeout_with_callback_and_timeout_and_arguments_0(
        remove.unchecked_ref(),
        MESSAGE_TIMEOUT_MS,
    ) {
        log::debug!("Status message will not fade: {:?}", e);
    }
}

impl PageSurface for DomSurface {
    fn current_url(&self) -> String {
        self.document
            .location()
            .and_then(|location| location.href().ok())
            .unwrap_or_default()
    }

    fn is_visible(&self) -> bool {
        self.document.visibility_state() == VisibilityState::Visible
    }

    fn has_anchor(&self) -> bool {
        self.anchor().is_some()
    }

    fn inject_stylesheets(&self, hrefs: &[String]) {
        let Some(head) = self.document.head() else {
            log::warn!("No <head>, stylesheets not injected");
            return;
        };

        for path in hrefs {
            let href = extensionUrl(path);
            let selector = format!("link[href=\"{}\"]", href);
            if let Ok(Some(_)) = self.document.query_selector(&selector) {
                continue;
            }

            let injected = self.create("link").and_then(|link| {
                link.set_attribute("rel", "stylesheet").map_err(dom_error)?;
                link.set_attribute("href", &href).map_err(dom_error)?;
                head.append_child(&link).map_err(dom_error)?;
                Ok(())
            });
            if let Err(e) = injected {
                log::warn!("Stylesheet {} not injected: {}", path, e);
            }
        }
    }

    fn remove_control(&self, element_id: &str) {
        // Ids are unique in a well-formed page, but the host page is not ours
        while let Some(existing) = self.document.get_element_by_id(element_id) {
            existing.remove();
        }
        self.click_listener.borrow_mut().take();
    }

    fn insert_control(&self, control: &ToggleControl, on_click: ClickHandler) -> Result<()> {
        let anchor = self.anchor().ok_or_else(|| {
            FavesError::PageNotApplicable(format!("nothing matches {}", self.anchor_selector))
        })?;

        let (container, button) = self.build_control(control)?;

        let intent = control.intent.clone();
        let listener = Closure::wrap(Box::new(move |event: MouseEvent| {
            event.prevent_default();
            on_click(intent.clone());
        }) as Box<dyn FnMut(MouseEvent)>);

        button
            .add_event_listener_with_callback("click", listener.as_ref().unchecked_ref())
            .map_err(dom_error)?;
        anchor.append_child(&container).map_err(dom_error)?;

        *self.click_listener.borrow_mut() = Some(listener);
        Ok(())
    }

    fn disable_control(&self, element_id: &str) -> bool {
        let selector = format!("#{} button", element_id);
        match self.document.query_selector(&selector) {
            Ok(Some(button)) => {
                if let Err(e) = button.set_attribute("disabled", "") {
                    log::debug!("Could not disable toggle: {:?}", e);
                }
                true
            }
            _ => false,
        }
    }
}

/// Run `callback` on every `visibilitychange` of the document
pub fn on_visibility_change(callback: Rc<dyn Fn()>) -> Result<()> {
    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| FavesError::PageNotApplicable("no document".to_string()))?;

    let listener = Closure::wrap(Box::new(move || callback()) as Box<dyn Fn()>);
    document
        .add_event_listener_with_callback("visibilitychange", listener.as_ref().unchecked_ref())
        .map_err(dom_error)?;
    listener.forget();
    Ok(())
}

/// Run `callback` with `persisted` on every `event` of the window
///
/// `event` is `pagehide` or `pageshow`; `persisted` is true when the page
/// enters or leaves the back/forward cache.
pub fn on_page_transition(event: &str, callback: Rc<dyn Fn(bool)>) -> Result<()> {
    let window = web_sys::window()
        .ok_or_else(|| FavesError::PageNotApplicable("no window".to_string()))?;

    let listener = Closure::wrap(Box::new(move |event: PageTransitionEvent| {
        callback(event.persisted())
    }) as Box<dyn Fn(PageTransitionEvent)>);

    window
        .add_event_listener_with_callback(event, listener.as_ref().unchecked_ref())
        .map_err(dom_error)?;
    listener.forget();
    Ok(())
}
