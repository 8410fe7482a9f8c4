use dioxus::prelude::*;

use wave_portal_common::config::PortalConfig;
use wave_portal_common::portal_state::PortalState;
use wave_portal_common::session::{PortalAction, PortalSession};

use super::portal_state::SignalStore;

/// Get a handle to send actions to the portal coroutine.
pub fn use_portal_action() -> Coroutine<PortalAction> {
    use_coroutine_handle::<PortalAction>()
}

/// Start the portal coroutine.
///
/// With the `use-wallet` feature on a wasm target the session talks to
/// `window.ethereum`. Otherwise it runs against an in-memory dev chain so
/// the UI can be exercised without a wallet.
pub fn use_portal_coroutine(state: Signal<PortalState>) {
    use_coroutine(move |rx: UnboundedReceiver<PortalAction>| async move {
        let config = load_config();
        tracing::info!("Wave portal contract: {}", config.contract_address);

        #[cfg(all(target_family = "wasm", feature = "use-wallet"))]
        let bridge = super::eip1193::Eip1193Bridge::detect(&config);

        #[cfg(not(all(target_family = "wasm", feature = "use-wallet")))]
        let bridge = dev_wallet(&config);

        let mut session = PortalSession::new(bridge, &config, SignalStore(state));
        session.run(rx).await;
    });
}

/// Compile-time config, with the contract optionally replaced by a
/// `?contract=0x...` query parameter.
fn load_config() -> PortalConfig {
    let config = PortalConfig::from_env().unwrap_or_else(|e| {
        tracing::error!("Ignoring WAVE_PORTAL_ADDRESS: {e}");
        PortalConfig::default()
    });

    match contract_query_param() {
        Some(raw) => config.clone().with_contract_override(&raw).unwrap_or_else(|e| {
            tracing::error!("Ignoring ?contract= parameter: {e}");
            config
        }),
        None => config,
    }
}

#[cfg(target_family = "wasm")]
fn contract_query_param() -> Option<String> {
    let search = web_sys::window()?.location().search().ok()?;
    web_sys::UrlSearchParams::new_with_str(&search)
        .ok()?
        .get("contract")
}

#[cfg(not(target_family = "wasm"))]
fn contract_query_param() -> Option<String> {
    None
}

#[cfg(not(all(target_family = "wasm", feature = "use-wallet")))]
fn dev_wallet(config: &PortalConfig) -> wave_portal_common::mock_bridge::MockWallet {
    use alloy_primitives::address;
    use wave_portal_common::mock_bridge::{MockChain, MockWallet};

    let chain = MockChain::with_contract(config.contract_address);
    chain.seed_wave(
        address!("00000000000000000000000000000000000000a1"),
        "Welcome to the wave portal",
    );
    tracing::debug!("Dev chain at block {}", chain.block_number());
    MockWallet::new(&chain, address!("00000000000000000000000000000000000000b0"))
}
