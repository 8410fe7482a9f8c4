use std::cell::RefCell;
use std::future::Future;
use std::rc::Rc;
use std::time::Duration;

use alloy_primitives::Address;
use futures::channel::mpsc;
use tokio::task::{JoinHandle, LocalSet};

use wave_portal_common::config::PortalConfig;
use wave_portal_common::mock_bridge::{MockChain, MockWallet};
use wave_portal_common::portal_state::PortalState;
use wave_portal_common::session::{PortalAction, PortalSession};
use wave_portal_common::view::{project, PortalView};

use crate::{account_for, init_tracing};

const TIMEOUT: Duration = Duration::from_secs(5);

/// How a participant's wallet is set up before the page loads.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WalletSetup {
    /// Site authorized on a previous visit.
    Authorized,
    /// Wallet installed, site not yet authorized.
    Unauthorized,
    /// Wallet installed; the user declines every prompt.
    Rejecting,
    /// No wallet extension.
    Absent,
}

/// Run a test body on a `LocalSet`; sessions are not `Send`.
pub async fn local<F: Future>(body: F) -> F::Output {
    LocalSet::new().run_until(body).await
}

/// One open browser tab running the portal against the shared chain.
pub struct Browser {
    pub name: String,
    pub account: Address,
    pub state: Rc<RefCell<PortalState>>,
    actions: mpsc::UnboundedSender<PortalAction>,
    task: JoinHandle<()>,
}

impl Browser {
    /// Load the page. Must be called from inside [`local`].
    pub fn open(chain: &MockChain, name: &str, setup: WalletSetup) -> Self {
        let account = account_for(name);
        let wallet = match setup {
            WalletSetup::Authorized => MockWallet::authorized(chain, account),
            WalletSetup::Unauthorized => MockWallet::new(chain, account),
            WalletSetup::Rejecting => MockWallet::new(chain, account).rejecting_prompts(),
            WalletSetup::Absent => MockWallet::absent(chain),
        };
        let config = PortalConfig::new(chain.contract_address());
        let state = Rc::new(RefCell::new(PortalState::new()));
        let (actions, rx) = mpsc::unbounded();

        tracing::info!("Opening portal for {name} ({account}) with {setup:?} wallet");
        let mut session = PortalSession::new(wallet, &config, state.clone());
        let task = tokio::task::spawn_local(async move {
            session.run(rx).await;
        });

        Self {
            name: name.to_string(),
            account,
            state,
            actions,
            task,
        }
    }

    pub fn type_message(&self, text: &str) {
        self.state.borrow_mut().set_compose(text);
    }

    pub fn click_connect(&self) {
        self.send(PortalAction::ConnectWallet);
    }

    pub fn click_wave(&self) {
        self.send(PortalAction::SubmitWave);
    }

    fn send(&self, action: PortalAction) {
        self.actions
            .unbounded_send(action)
            .unwrap_or_else(|e| panic!("{}: session is gone: {e}", self.name));
    }

    pub fn view(&self) -> PortalView {
        project(&self.state.borrow(), chrono::Utc::now())
    }

    pub fn wave_texts(&self) -> Vec<String> {
        self.state
            .borrow()
            .waves
            .iter()
            .map(|w| w.text.clone())
            .collect()
    }

    /// Wait until the portal state satisfies `pred`.
    pub async fn wait_for(&self, what: &str, pred: impl Fn(&PortalState) -> bool) {
        let state = self.state.clone();
        wait_until(&format!("{}: {what}", self.name), move || pred(&state.borrow())).await;
    }

    /// Let the session work through everything already queued.
    pub async fn settle(&self) {
        for _ in 0..32 {
            tokio::task::yield_now().await;
        }
    }

    /// Close the tab: end the action stream and wait for the session to stop.
    pub async fn close(self) {
        tracing::info!("Closing portal for {}", self.name);
        drop(self.actions);
        self.task
            .await
            .unwrap_or_else(|e| panic!("{}: session task failed: {e}", self.name));
    }
}

pub async fn wait_until(what: &str, cond: impl Fn() -> bool) {
    let waited = tokio::time::timeout(TIMEOUT, async {
        while !cond() {
            tokio::task::yield_now().await;
        }
    })
    .await;
    if waited.is_err() {
        panic!("timed out waiting for {what}");
    }
}

/// A chain plus two participants who have both visited the site before.
pub struct TestHarness {
    pub chain: MockChain,
    pub alice: Browser,
    pub bob: Browser,
}

impl TestHarness {
    /// Open both browsers and wait until each has loaded and subscribed.
    /// Must be called from inside [`local`].
    pub async fn setup() -> Self {
        Self::setup_with_history(&[]).await
    }

    /// Like [`setup`](Self::setup), with waves already on chain.
    pub async fn setup_with_history(history: &[(&str, &str)]) -> Self {
        init_tracing();
        let chain = MockChain::new();
        for (name, message) in history {
            chain.seed_wave(account_for(name), message);
        }
        tracing::info!("Seeded {} waves", history.len());

        let alice = Browser::open(&chain, "alice", WalletSetup::Authorized);
        let bob = Browser::open(&chain, "bob", WalletSetup::Authorized);

        let subscribed = chain.clone();
        wait_until("both browsers subscribed", move || {
            subscribed.active_subscriptions() == 2
        })
        .await;
        tracing::info!("Harness ready at block {}", chain.block_number());

        Self { chain, alice, bob }
    }
}
