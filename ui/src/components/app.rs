use chrono::{DateTime, Utc};
use dioxus::prelude::*;

use wave_portal_common::portal_state::PortalState;
use wave_portal_common::session::PortalAction;
use wave_portal_common::view::{project, Affordance};

use super::compose_form::ComposeForm;
use super::portal_api::{use_portal_action, use_portal_coroutine};
use super::portal_state::use_portal_state;
use super::wave_list::WaveList;

const MAIN_CSS: &str = include_str!("../../assets/main.css");

#[component]
pub fn App() -> Element {
    let state = use_context_provider(|| Signal::new(PortalState::new()));
    use_portal_coroutine(state);

    rsx! {
        style { "{MAIN_CSS}" }
        Portal {}
    }
}

#[component]
fn Portal() -> Element {
    let state = use_portal_state();
    let now = use_now();
    let view = project(&state.read(), *now.read());

    rsx! {
        div { class: "main-container",
            div { class: "data-container",
                header { class: "header",
                    h1 { "👋 Hey there!" }
                    if let Some(account) = view.account.clone() {
                        span { class: "account", "Connected as {account}" }
                    }
                }
                p { class: "bio",
                    "Connect your Ethereum wallet and wave at me! Every wave is stored on chain."
                }
                if let Some(text) = view.notice.clone() {
                    NoticeToast { text }
                }
                {
                    match view.affordance.clone() {
                        Affordance::Connect => rsx! { ConnectButton {} },
                        Affordance::Compose { text, submitting, can_submit } => rsx! {
                            ComposeForm { text, submitting, can_submit }
                        },
                    }
                }
                WaveList { cards: view.cards.clone() }
            }
        }
    }
}

#[component]
fn ConnectButton() -> Element {
    let portal = use_portal_action();
    rsx! {
        button {
            class: "wave-button",
            onclick: move |_| portal.send(PortalAction::ConnectWallet),
            "Connect Wallet"
        }
    }
}

#[component]
fn NoticeToast(text: String) -> Element {
    let mut state = use_portal_state();
    rsx! {
        div { class: "notice",
            span { "{text}" }
            button {
                class: "notice-dismiss",
                onclick: move |_| state.write().dismiss_notice(),
                "×"
            }
        }
    }
}

/// The current time, refreshed periodically so wave ages keep moving.
#[allow(unused_mut)]
fn use_now() -> Signal<DateTime<Utc>> {
    let mut now = use_signal(Utc::now);

    #[cfg(target_family = "wasm")]
    use_future(move || async move {
        loop {
            gloo_timers::future::TimeoutFuture::new(30_000).await;
            now.set(Utc::now());
        }
    });

    now
}
