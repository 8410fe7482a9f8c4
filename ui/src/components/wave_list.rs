use dioxus::prelude::*;

use wave_portal_common::view::WaveCard;

#[component]
pub fn WaveList(cards: Vec<WaveCard>) -> Element {
    if cards.is_empty() {
        return rsx! {
            p { class: "empty", "No waves yet." }
        };
    }

    rsx! {
        ul { class: "waves",
            // Waves are append-only, so the index is a stable key.
            for (i, card) in cards.into_iter().enumerate() {
                li { key: "{i}", class: "wave",
                    div { class: "wave-sender", "Address: {card.sender}" }
                    div { class: "wave-text", "Message: {card.text}" }
                    div { class: "wave-age", "{card.age} ago" }
                }
            }
        }
    }
}
