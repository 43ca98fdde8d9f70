/// Popup panel listing the favorites

use crate::host::{load_faves, load_settings, on_removal, remove_fave};
use crate::settings::Settings;
use crate::store::FavoriteRecord;
use crate::ui::components::{EmptyFaves, FaveRow};
use patternfly_yew::prelude::*;
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

#[derive(Clone, PartialEq)]
enum PanelState {
    Loading(String),
    Idle,
    Removing(String),
    Error(String),
}

/// Reload the listing into `faves`, reporting failures through `state`
fn reload(
    faves: UseStateHandle<Vec<FavoriteRecord>>,
    state: UseStateHandle<PanelState>,
    refresh: bool,
) {
    spawn_local(async move {
        match load_faves(refresh).await {
            Ok(records) => {
                faves.set(records);
                state.set(PanelState::Idle);
            }
            Err(e) => {
                state.set(PanelState::Error(format!("Failed to load faves: {}", e)));
            }
        }
    });
}

#[function_component(Panel)]
pub fn panel() -> Html {
    let state = use_state(|| PanelState::Loading("Loading faves...".to_string()));
    let faves = use_state(Vec::<FavoriteRecord>::new);
    let settings = use_state(Settings::default);

    // Load on mount and follow removals made from any context
    {
        let state = state.clone();
        let faves = faves.clone();
        let settings = settings.clone();

        use_effect_with((), move |_| {
            spawn_local(async move {
                let loaded = load_settings().await;
                settings.set((*loaded).clone());

                let (listener_faves, listener_state) = (faves.clone(), state.clone());
                on_removal(&loaded, move |message| {
                    log::debug!("Reloading after removal of {}", message.identifier);
                    reload(listener_faves.clone(), listener_state.clone(), false);
                });

                reload(faves, state, false);
            });
            || ()
        });
    }

    let on_refresh = {
        let state = state.clone();
        let faves = faves.clone();

        Callback::from(move |_: MouseEvent| {
            state.set(PanelState::Loading("Refreshing from the registry...".to_string()));
            reload(faves.clone(), state.clone(), true);
        })
    };

    let on_remove = {
        let state = state.clone();
        let faves = faves.clone();

        Callback::from(move |identifier: String| {
            let state = state.clone();
            let faves = faves.clone();

            state.set(PanelState::Removing(identifier.clone()));

            spawn_local(async move {
                match remove_fave(&identifier).await {
                    Ok(true) => reload(faves, state, false),
                    Ok(false) => {
                        state.set(PanelState::Error(format!("Could not remove {}", identifier)));
                    }
                    Err(e) => {
                        state.set(PanelState::Error(format!("Remove failed: {}", e)));
                    }
                }
            });
        })
    };

    let is_busy = !matches!(*state, PanelState::Idle | PanelState::Error(_));

    html! {
        <div class="padding-20">
            <h1 class="popup-title">{"npm faves"}</h1>

            // Status display
            {match &*state {
                PanelState::Loading(msg) => html! {
                    <div class="loading-text-center">
                        <Spinner />
                        <p class="loading-text">{msg}</p>
                    </div>
                },
                PanelState::Removing(identifier) => html! {
                    <p class="loading-text">{format!("Removing {}...", identifier)}</p>
                },
                PanelState::Error(err) => html! {
                    <div class="message-top-margin">
                        <Alert r#type={AlertType::Danger} title={"Error"} inline={true}>
                            {err.clone()}
                        </Alert>
                    </div>
                },
                PanelState::Idle => html! {}
            }}

            <div class="flex-column-gap">
                if faves.is_empty() && matches!(*state, PanelState::Idle) {
                    <EmptyFaves catalog_url={format!("https://{}/", settings.catalog_host)} />
                }
                {for faves.iter().map(|record| html! {
                    <FaveRow
                        key={record.identifier.clone()}
                        record={record.clone()}
                        page_url={settings.catalog_page_url(&record.identifier)}
                        on_remove={on_remove.clone()}
                        disabled={is_busy}
                    />
                })}
            </div>

            <Button
                onclick={on_refresh}
                disabled={is_busy}
                variant={ButtonVariant::Secondary}
                block={true}
            >
                {"Refresh from registry"}
            </Button>

            <p class="footer-popup">
                {"npm faves v0.1.0"}
            </p>
        </div>
    }
}
