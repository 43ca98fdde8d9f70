/// Reusable panel components

use crate::store::FavoriteRecord;
use patternfly_yew::prelude::*;
use yew::prelude::*;

#[derive(Properties, PartialEq)]
pub struct FaveRowProps {
    pub record: FavoriteRecord,
    pub page_url: String,
    pub on_remove: Callback<String>,
    #[prop_or(false)]
    pub disabled: bool,
}

#[function_component(FaveRow)]
pub fn fave_row(props: &FaveRowProps) -> Html {
    let on_click = {
        let on_remove = props.on_remove.clone();
        let identifier = props.record.identifier.clone();
        Callback::from(move |_: MouseEvent| on_remove.emit(identifier.clone()))
    };

    let metadata = &props.record.metadata;

    html! {
        <div class="fave-item">
            <div class="fave-heading">
                <a class="fave-name" href={props.page_url.clone()} target="_blank" rel="noopener">
                    {&props.record.identifier}
                </a>
                if let Some(version) = &metadata.version {
                    <span class="fave-version">{format!("v{}", version)}</span>
                }
            </div>
            if let Some(description) = &metadata.description {
                <p class="fave-description">{description}</p>
            }
            <Button onclick={on_click} disabled={props.disabled} variant={ButtonVariant::Danger}>
                {"Remove"}
            </Button>
        </div>
    }
}

#[derive(Properties, PartialEq)]
pub struct EmptyFavesProps {
    pub catalog_url: String,
}

#[function_component(EmptyFaves)]
pub fn empty_faves(props: &EmptyFavesProps) -> Html {
    html! {
        <div class="empty-faves">
            <p>{"No faves yet."}</p>
            <p>
                {"Open a package on "}
                <a href={props.catalog_url.clone()} target="_blank" rel="noopener">{"npm"}</a>
                {" and press \"Add to faves\"."}
            </p>
        </div>
    }
}
