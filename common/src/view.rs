//! Render-ready projection of [`PortalState`].
//!
//! UI components draw only what `project` returns, so the decisions about
//! what is visible are testable without a DOM.

use chrono::{DateTime, Utc};

use crate::portal_state::PortalState;
use crate::relative_time::distance_in_words;

/// The control shown above the wave list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Affordance {
    Connect,
    Compose {
        text: String,
        submitting: bool,
        can_submit: bool,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WaveCard {
    pub sender: String,
    pub age: String,
    pub text: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PortalView {
    pub account: Option<String>,
    pub affordance: Affordance,
    pub cards: Vec<WaveCard>,
    pub notice: Option<String>,
}

pub fn project(state: &PortalState, now: DateTime<Utc>) -> PortalView {
    let affordance = if state.is_connected() {
        let submitting = state.is_submitting();
        Affordance::Compose {
            text: state.compose.clone(),
            submitting,
            can_submit: !submitting && !state.compose.trim().is_empty(),
        }
    } else {
        Affordance::Connect
    };

    let cards = state
        .waves
        .iter()
        .map(|wave| WaveCard {
            sender: wave.sender.to_checksum(None),
            age: distance_in_words(wave.posted_at, now),
            text: wave.text.clone(),
        })
        .collect();

    PortalView {
        account: state.account().map(|a| a.to_checksum(None)),
        affordance,
        cards,
        notice: state.notice.as_ref().map(|n| n.text()),
    }
}
