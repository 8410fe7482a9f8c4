use dioxus::prelude::*;

use wave_portal_common::session::PortalAction;

use super::portal_api::use_portal_action;
use super::portal_state::use_portal_state;

#[component]
pub fn ComposeForm(text: String, submitting: bool, can_submit: bool) -> Element {
    let mut state = use_portal_state();
    let portal = use_portal_action();

    let label = if submitting { "Waving..." } else { "Wave at Me" };

    rsx! {
        form {
            class: "compose",
            onsubmit: move |evt| {
                evt.prevent_default();
                portal.send(PortalAction::SubmitWave);
            },
            textarea {
                class: "message-input",
                placeholder: "Type your message",
                disabled: submitting,
                value: "{text}",
                oninput: move |evt| state.write().set_compose(evt.value()),
            }
            button {
                class: "wave-button",
                r#type: "submit",
                disabled: !can_submit,
                "{label}"
            }
        }
    }
}
