//! The portal's operations and the loop that drives them.
//!
//! A [`PortalSession`] owns the live `NewWave` subscription. Dropping the
//! session (or ending [`PortalSession::run`]) releases it.

use std::cell::RefCell;
use std::rc::Rc;

use alloy_primitives::Address;
use futures::future::{self, FutureExt};
use futures::stream::{FusedStream, LocalBoxStream, Stream, StreamExt};

use crate::bridge::{BridgeError, TxReceipt, WalletBridge};
use crate::config::PortalConfig;
use crate::contract::WavePortalClient;
use crate::portal_state::{ComposeError, Notice, PortalState};
use crate::wave::WaveRecord;

/// User-triggered operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortalAction {
    /// Prompt the wallet for authorization.
    ConnectWallet,
    /// Send the compose field as a wave.
    SubmitWave,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmitError {
    #[error(transparent)]
    Compose(#[from] ComposeError),
    #[error(transparent)]
    Bridge(#[from] BridgeError),
}

/// Somewhere the session can keep its [`PortalState`].
///
/// The UI backs this with a reactive signal; tests use the state directly.
pub trait PortalStore {
    fn update<R>(&mut self, f: impl FnOnce(&mut PortalState) -> R) -> R;
}

impl PortalStore for PortalState {
    fn update<R>(&mut self, f: impl FnOnce(&mut PortalState) -> R) -> R {
        f(self)
    }
}

impl PortalStore for Rc<RefCell<PortalState>> {
    fn update<R>(&mut self, f: impl FnOnce(&mut PortalState) -> R) -> R {
        f(&mut self.borrow_mut())
    }
}

enum Step {
    Wave(Option<WaveRecord>),
    Action(Option<PortalAction>),
}

pub struct PortalSession<B, S> {
    bridge: B,
    contract: Address,
    store: S,
    subscription: Option<LocalBoxStream<'static, WaveRecord>>,
}

impl<B: WalletBridge, S: PortalStore> PortalSession<B, S> {
    pub fn new(bridge: B, config: &PortalConfig, store: S) -> Self {
        Self {
            bridge,
            contract: config.contract_address,
            store,
            subscription: None,
        }
    }

    fn client(&self) -> WavePortalClient<'_, B> {
        WavePortalClient::new(&self.bridge, self.contract)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_some()
    }

    /// Drop the live subscription, if any.
    pub fn release_subscription(&mut self) {
        if self.subscription.take().is_some() {
            tracing::debug!("Released NewWave subscription");
        }
    }

    /// Startup hook: silently adopt an already-authorized account and load
    /// the wave list if there is one.
    pub async fn start(&mut self) {
        tracing::debug!("Starting portal session via {}", self.bridge.bridge_name());
        if let Some(account) = self.check_connected().await {
            self.adopt(account).await;
        }
    }

    /// Ask the provider, without prompting, for an authorized account.
    pub async fn check_connected(&mut self) -> Option<Address> {
        match self.bridge.authorized_accounts().await {
            Ok(accounts) => match accounts.first() {
                Some(&account) => {
                    tracing::info!("Found an authorized account: {account}");
                    Some(account)
                }
                None => {
                    tracing::info!("No authorized account found");
                    None
                }
            },
            Err(BridgeError::NoProvider) => {
                tracing::warn!("No wallet provider found; install a browser wallet");
                None
            }
            Err(e) => {
                tracing::error!("Checking authorized accounts failed: {e}");
                None
            }
        }
    }

    /// Prompt the provider for authorization and adopt the first account.
    pub async fn connect_wallet(&mut self) {
        match self.bridge.request_accounts().await {
            Ok(accounts) => match accounts.first() {
                Some(&account) => {
                    tracing::info!("Connected {account}");
                    self.adopt(account).await;
                }
                None => {
                    tracing::warn!("Wallet returned no accounts");
                    self.store.update(|s| {
                        s.notify(Notice::ConnectFailed("no accounts returned".into()))
                    });
                }
            },
            Err(BridgeError::NoProvider) => {
                tracing::warn!("Connect requested but no wallet is installed");
                self.store.update(|s| s.notify(Notice::NoWallet));
            }
            Err(e) => {
                tracing::error!("Wallet connection failed: {e}");
                self.store
                    .update(|s| s.notify(Notice::ConnectFailed(e.to_string())));
            }
        }
    }

    async fn adopt(&mut self, account: Address) {
        if !self.store.update(|s| s.connect(account)) {
            tracing::debug!("Already connected; keeping the current account");
            return;
        }
        if let Err(e) = self.load_waves().await {
            tracing::error!("Loading waves failed: {e}");
        }
    }

    /// Read path: fetch the history as of the current head once, then
    /// subscribe to waves from the next block on.
    pub async fn load_waves(&mut self) -> Result<(), BridgeError> {
        let head = self.client().head().await?;
        let waves = self.client().all_waves(Some(head)).await?;
        tracing::info!("Loaded {} waves as of block {head}", waves.len());
        self.store.update(|s| s.replace_waves(waves));

        let subscription = self.client().subscribe_new_waves(head + 1)?;
        self.subscription = Some(subscription);
        Ok(())
    }

    /// Append one wave observed on the live subscription.
    pub fn apply_wave(&mut self, wave: WaveRecord) {
        tracing::debug!("NewWave from {} at {}", wave.sender, wave.posted_at);
        self.store.update(|s| s.append_wave(wave));
    }

    /// Next wave from the live subscription. Never resolves while there is
    /// no subscription.
    pub async fn next_wave(&mut self) -> Option<WaveRecord> {
        match self.subscription.as_mut() {
            Some(subscription) => subscription.next().await,
            None => future::pending().await,
        }
    }

    /// Write path: send the compose text and wait until it is mined.
    ///
    /// The wave itself is not appended here; it arrives as a `NewWave` event.
    pub async fn submit_wave(&mut self) -> Result<TxReceipt, SubmitError> {
        let (account, text) = match self.store.update(|s| s.begin_submit()) {
            Ok(pending) => pending,
            Err(e) => {
                tracing::debug!("Wave not submitted: {e}");
                return Err(e.into());
            }
        };

        self.log_total_waves().await;
        match self.send_and_confirm(account, &text).await {
            Ok(receipt) => {
                tracing::info!(
                    "Mined {} in block {}",
                    receipt.tx_hash,
                    receipt.block_number
                );
                self.store.update(|s| s.finish_submit());
                self.log_total_waves().await;
                Ok(receipt)
            }
            Err(e) => {
                tracing::error!("Wave failed: {e}");
                self.store
                    .update(|s| s.fail_submit(Notice::WaveFailed(e.to_string())));
                Err(e.into())
            }
        }
    }

    async fn send_and_confirm(
        &mut self,
        account: Address,
        text: &str,
    ) -> Result<TxReceipt, BridgeError> {
        let tx = self.client().wave(account, text).await?;
        tracing::info!("Mining {tx}");
        self.store.update(|s| s.mark_sent(tx));
        self.client().confirm(tx).await
    }

    async fn log_total_waves(&self) {
        match self.client().total_waves().await {
            Ok(total) => tracing::info!("Retrieved total wave count: {total}"),
            Err(e) => tracing::warn!("Could not read total wave count: {e}"),
        }
    }

    pub async fn handle(&mut self, action: PortalAction) {
        match action {
            PortalAction::ConnectWallet => self.connect_wallet().await,
            PortalAction::SubmitWave => {
                // Failures are already logged and surfaced as notices.
                let _ = self.submit_wave().await;
            }
        }
    }

    /// Run the startup hook, then serve actions and live waves until the
    /// action stream ends. Waves that are already available are applied
    /// before the next action.
    pub async fn run<A>(&mut self, mut actions: A)
    where
        A: Stream<Item = PortalAction> + FusedStream + Unpin,
    {
        self.start().await;

        loop {
            let step = {
                let incoming = self.next_wave().fuse();
                futures::pin_mut!(incoming);
                futures::select_biased! {
                    wave = incoming => Step::Wave(wave),
                    action = actions.next() => Step::Action(action),
                }
            };

            match step {
                Step::Wave(Some(wave)) => self.apply_wave(wave),
                Step::Wave(None) => {
                    tracing::warn!("NewWave subscription closed by the provider");
                    self.subscription = None;
                }
                Step::Action(Some(action)) => self.handle(action).await,
                Step::Action(None) => break,
            }
        }

        self.release_subscription();
    }
}
