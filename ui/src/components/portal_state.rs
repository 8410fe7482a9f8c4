use dioxus::prelude::*;

use wave_portal_common::portal_state::PortalState;
use wave_portal_common::session::PortalStore;

/// Get the portal state provided by [`App`](super::app::App).
pub fn use_portal_state() -> Signal<PortalState> {
    use_context::<Signal<PortalState>>()
}

/// Lets a [`PortalSession`](wave_portal_common::session::PortalSession)
/// write straight into the reactive state, so every update re-renders.
#[derive(Clone, Copy)]
pub struct SignalStore(pub Signal<PortalState>);

impl PortalStore for SignalStore {
    fn update<R>(&mut self, f: impl FnOnce(&mut PortalState) -> R) -> R {
        f(&mut self.0.write())
    }
}
