use alloy_primitives::Address;

use crate::bridge::TxHash;
use crate::wave::WaveRecord;

/// Whether the user has authorized an account for this site.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Connection {
    #[default]
    Disconnected,
    Connected {
        account: Address,
    },
}

/// Progress of the user's wave.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Submission {
    #[default]
    Idle,
    /// Waiting on the wallet, then on the transaction being mined.
    Pending { tx: Option<TxHash> },
}

/// A short message shown to the user until dismissed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notice {
    NoWallet,
    ConnectFailed(String),
    WaveFailed(String),
}

impl Notice {
    pub fn text(&self) -> String {
        match self {
            Self::NoWallet => "No wallet installed, get MetaMask!".into(),
            Self::ConnectFailed(reason) => format!("Could not connect wallet: {reason}"),
            Self::WaveFailed(reason) => format!("Wave failed: {reason}"),
        }
    }
}

/// Why a submit was refused before reaching the contract.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ComposeError {
    #[error("message is empty")]
    Empty,
    #[error("no wallet connected")]
    NotConnected,
    #[error("a wave is already being submitted")]
    AlreadySubmitting,
}

/// Everything the portal view is rendered from.
///
/// Transitions are plain methods; the UI keeps this in a signal and the
/// session driver is the only writer besides compose-field input.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PortalState {
    pub connection: Connection,
    pub waves: Vec<WaveRecord>,
    pub compose: String,
    pub submission: Submission,
    pub notice: Option<Notice>,
}

impl PortalState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn account(&self) -> Option<Address> {
        match self.connection {
            Connection::Connected { account } => Some(account),
            Connection::Disconnected => None,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.account().is_some()
    }

    pub fn is_submitting(&self) -> bool {
        matches!(self.submission, Submission::Pending { .. })
    }

    /// Adopt `account`. Returns false if an account was already active, in
    /// which case it is kept.
    pub fn connect(&mut self, account: Address) -> bool {
        if self.is_connected() {
            return false;
        }
        self.connection = Connection::Connected { account };
        self.notice = None;
        true
    }

    /// Replace the list with a freshly fetched history.
    pub fn replace_waves(&mut self, waves: Vec<WaveRecord>) {
        self.waves = waves;
    }

    pub fn append_wave(&mut self, wave: WaveRecord) {
        self.waves.push(wave);
    }

    pub fn set_compose(&mut self, text: impl Into<String>) {
        self.compose = text.into();
    }

    /// Validate the compose field and enter the pending state.
    ///
    /// Blank text is refused; anything else is submitted exactly as typed.
    pub fn begin_submit(&mut self) -> Result<(Address, String), ComposeError> {
        if self.compose.trim().is_empty() {
            return Err(ComposeError::Empty);
        }
        let account = self.account().ok_or(ComposeError::NotConnected)?;
        if self.is_submitting() {
            return Err(ComposeError::AlreadySubmitting);
        }
        self.submission = Submission::Pending { tx: None };
        self.notice = None;
        Ok((account, self.compose.clone()))
    }

    /// The wallet accepted the transaction; now waiting for it to be mined.
    pub fn mark_sent(&mut self, tx: TxHash) {
        if self.is_submitting() {
            self.submission = Submission::Pending { tx: Some(tx) };
        }
    }

    /// The transaction was mined. The new wave itself arrives via the event.
    pub fn finish_submit(&mut self) {
        self.submission = Submission::Idle;
        self.compose.clear();
    }

    /// Give up on the pending wave, keeping the compose text for a retry.
    pub fn fail_submit(&mut self, notice: Notice) {
        self.submission = Submission::Idle;
        self.notice = Some(notice);
    }

    pub fn notify(&mut self, notice: Notice) {
        self.notice = Some(notice);
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::{address, B256};
    use chrono::DateTime;

    use super::*;

    const ALICE: Address = address!("00000000000000000000000000000000000a11ce");
    const BOB: Address = address!("0000000000000000000000000000000000000b0b");

    fn record(sender: Address, secs: i64, text: &str) -> WaveRecord {
        WaveRecord::new(sender, DateTime::from_timestamp(secs, 0).unwrap(), text)
    }

    #[test]
    fn connection_is_one_way() {
        let mut state = PortalState::new();
        assert!(state.connect(ALICE));
        assert!(!state.connect(BOB));
        assert_eq!(state.account(), Some(ALICE));
    }

    #[test]
    fn appends_keep_prior_order() {
        let mut state = PortalState::new();
        state.replace_waves(vec![record(ALICE, 1, "a"), record(BOB, 2, "b")]);
        state.append_wave(record(ALICE, 3, "c"));
        state.append_wave(record(BOB, 4, "d"));
        let texts: Vec<_> = state.waves.iter().map(|w| w.text.as_str()).collect();
        assert_eq!(texts, ["a", "b", "c", "d"]);
    }

    #[test]
    fn replace_discards_previous_list() {
        let mut state = PortalState::new();
        state.append_wave(record(ALICE, 1, "stale"));
        state.replace_waves(vec![record(BOB, 2, "fresh")]);
        assert_eq!(state.waves, vec![record(BOB, 2, "fresh")]);
    }

    #[test]
    fn empty_or_blank_compose_is_rejected() {
        let mut state = PortalState::new();
        state.connect(ALICE);
        assert_eq!(state.begin_submit(), Err(ComposeError::Empty));
        state.set_compose("   \n");
        assert_eq!(state.begin_submit(), Err(ComposeError::Empty));
        assert_eq!(state.submission, Submission::Idle);
    }

    #[test]
    fn submit_requires_a_connection() {
        let mut state = PortalState::new();
        state.set_compose("hi");
        assert_eq!(state.begin_submit(), Err(ComposeError::NotConnected));
    }

    #[test]
    fn second_submit_while_pending_is_refused() {
        let mut state = PortalState::new();
        state.connect(ALICE);
        state.set_compose("  gm  ");
        assert_eq!(state.begin_submit(), Ok((ALICE, "  gm  ".to_string())));
        assert_eq!(state.begin_submit(), Err(ComposeError::AlreadySubmitting));
    }

    #[test]
    fn success_clears_compose_and_failure_keeps_it() {
        let mut state = PortalState::new();
        state.connect(ALICE);
        state.set_compose("gm");
        state.begin_submit().unwrap();
        state.mark_sent(B256::repeat_byte(7));
        assert_eq!(
            state.submission,
            Submission::Pending {
                tx: Some(B256::repeat_byte(7))
            }
        );
        state.finish_submit();
        assert!(state.compose.is_empty());
        assert!(!state.is_submitting());

        state.set_compose("again");
        state.begin_submit().unwrap();
        state.fail_submit(Notice::WaveFailed("reverted".into()));
        assert_eq!(state.compose, "again");
        assert!(!state.is_submitting());
        assert_eq!(state.notice, Some(Notice::WaveFailed("reverted".into())));
    }

    #[test]
    fn later_success_clears_an_earlier_failure_notice() {
        let mut state = PortalState::new();
        state.connect(ALICE);
        state.set_compose("first");
        state.begin_submit().unwrap();
        state.fail_submit(Notice::WaveFailed("reverted".into()));
        assert!(state.notice.is_some());

        state.begin_submit().unwrap();
        assert_eq!(state.notice, None);
        state.finish_submit();
        assert_eq!(state.notice, None);
        assert!(state.compose.is_empty());
    }

    #[test]
    fn connecting_clears_a_connect_failure_notice() {
        let mut state = PortalState::new();
        state.notify(Notice::ConnectFailed("rejected".into()));
        assert!(state.connect(ALICE));
        assert_eq!(state.notice, None);
    }
}
