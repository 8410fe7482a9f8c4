use alloy_sol_types::SolCall;

use wave_portal_common::abi::getAllWavesCall;
use wave_portal_common::mock_bridge::MockChain;
use wave_portal_common::portal_state::Notice;
use wave_portal_common::view::Affordance;
use wave_portal_integration::account_for;
use wave_portal_integration::harness::{local, wait_until, Browser, TestHarness, WalletSetup};

/// Alice's wave reaches Bob's list through the event path only.
#[tokio::test]
async fn bob_sees_alice_wave() {
    local(async {
        let h = TestHarness::setup().await;

        h.alice.type_message("gm bob");
        h.alice.click_wave();

        h.bob
            .wait_for("alice's wave", |s| s.waves.len() == 1)
            .await;
        h.alice
            .wait_for("own wave via event", |s| s.waves.len() == 1)
            .await;

        assert_eq!(h.bob.wave_texts(), ["gm bob"]);
        assert_eq!(h.bob.state.borrow().waves[0].sender, h.alice.account);
        assert!(h.alice.state.borrow().compose.is_empty());
    })
    .await;
}

/// History is fetched once per page load and precedes live events.
#[tokio::test]
async fn history_then_live_events_in_order() {
    local(async {
        let h = TestHarness::setup_with_history(&[("carol", "first"), ("dave", "second")]).await;
        assert_eq!(h.chain.calls_to(getAllWavesCall::SELECTOR), 2);
        assert_eq!(h.alice.wave_texts(), ["first", "second"]);

        h.chain.seed_wave(account_for("erin"), "m1");
        h.chain.seed_wave(account_for("frank"), "m2");

        for browser in [&h.alice, &h.bob] {
            browser
                .wait_for("two live waves", |s| s.waves.len() == 4)
                .await;
            assert_eq!(browser.wave_texts(), ["first", "second", "m1", "m2"]);
            let state = browser.state.borrow();
            assert_eq!(state.waves[2].sender, account_for("erin"));
            assert_eq!(state.waves[3].sender, account_for("frank"));
        }
    })
    .await;
}

/// A first-time visitor sees the connect button until they authorize.
#[tokio::test]
async fn new_visitor_connects_then_composes() {
    local(async {
        wave_portal_integration::init_tracing();
        let chain = MockChain::new();
        chain.seed_wave(account_for("carol"), "already here");

        let visitor = Browser::open(&chain, "grace", WalletSetup::Unauthorized);
        visitor.settle().await;
        assert_eq!(visitor.view().affordance, Affordance::Connect);
        assert!(visitor.wave_texts().is_empty());
        assert_eq!(chain.calls_to(getAllWavesCall::SELECTOR), 0);

        visitor.click_connect();
        visitor
            .wait_for("connection", |s| s.is_connected())
            .await;
        visitor
            .wait_for("history", |s| s.waves.len() == 1)
            .await;
        assert!(matches!(
            visitor.view().affordance,
            Affordance::Compose { .. }
        ));
        assert_eq!(chain.calls_to(getAllWavesCall::SELECTOR), 1);
    })
    .await;
}

#[tokio::test]
async fn missing_wallet_shows_notice() {
    local(async {
        let chain = MockChain::new();
        let visitor = Browser::open(&chain, "heidi", WalletSetup::Absent);
        visitor.click_connect();
        visitor
            .wait_for("notice", |s| s.notice.is_some())
            .await;
        assert_eq!(visitor.state.borrow().notice, Some(Notice::NoWallet));
        assert_eq!(visitor.view().affordance, Affordance::Connect);
    })
    .await;
}

#[tokio::test]
async fn declined_prompt_shows_notice() {
    local(async {
        let chain = MockChain::new();
        let visitor = Browser::open(&chain, "ivan", WalletSetup::Rejecting);
        visitor.click_connect();
        visitor
            .wait_for("notice", |s| s.notice.is_some())
            .await;
        assert!(matches!(
            visitor.state.borrow().notice,
            Some(Notice::ConnectFailed(_))
        ));
        assert!(!visitor.state.borrow().is_connected());
    })
    .await;
}

#[tokio::test]
async fn blank_wave_is_never_sent() {
    local(async {
        let h = TestHarness::setup().await;
        h.alice.type_message("   ");
        h.alice.click_wave();
        h.alice.settle().await;

        assert_eq!(h.chain.transactions_sent(), 0);
        assert_eq!(h.alice.state.borrow().compose, "   ");
    })
    .await;
}

#[tokio::test]
async fn reverted_wave_keeps_text_for_retry() {
    local(async {
        let h = TestHarness::setup().await;
        h.chain.revert_next_transaction();

        h.alice.type_message("try again");
        h.alice.click_wave();
        h.alice
            .wait_for("failure notice", |s| s.notice.is_some())
            .await;

        let state = h.alice.state.borrow();
        assert!(matches!(state.notice, Some(Notice::WaveFailed(_))));
        assert_eq!(state.compose, "try again");
        assert!(!state.is_submitting());
        assert!(state.waves.is_empty());
    })
    .await;
}

/// Closing a tab releases its subscription; the other tab keeps receiving.
#[tokio::test]
async fn closing_a_tab_releases_its_subscription() {
    local(async {
        let TestHarness { chain, alice, bob } = TestHarness::setup().await;

        alice.close().await;
        let remaining = chain.clone();
        wait_until("one subscription left", move || {
            remaining.active_subscriptions() == 1
        })
        .await;

        chain.seed_wave(account_for("carol"), "still live");
        bob.wait_for("wave after close", |s| s.waves.len() == 1)
            .await;
    })
    .await;
}

/// A successful retry replaces the earlier failure; the text goes out as typed.
#[tokio::test]
async fn retry_after_revert_clears_the_notice() {
    local(async {
        let h = TestHarness::setup().await;
        h.chain.revert_next_transaction();

        h.alice.type_message("  once more  ");
        h.alice.click_wave();
        h.alice
            .wait_for("failure notice", |s| s.notice.is_some())
            .await;

        h.alice.click_wave();
        h.bob
            .wait_for("retried wave", |s| s.waves.len() == 1)
            .await;
        h.alice
            .wait_for("compose cleared", |s| s.compose.is_empty())
            .await;

        assert_eq!(h.alice.state.borrow().notice, None);
        assert_eq!(h.bob.wave_texts(), ["  once more  "]);
    })
    .await;
}
