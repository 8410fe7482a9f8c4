//! In-memory WavePortal chain for development and tests.
//!
//! `MockChain` plays the deployed contract: it decodes calldata, stores
//! waves, mines every transaction into its own block, keeps its log history
//! and fans `NewWave` logs out to subscribers. `MockWallet` is one browser's provider on
//! top of it. Several wallets may share a chain.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use alloy_primitives::{keccak256, Address, Bytes, B256, U256};
use alloy_sol_types::{SolCall, SolEvent, SolInterface};
use futures::channel::mpsc;
use futures::stream::{LocalBoxStream, StreamExt};

use crate::abi::{getAllWavesCall, getTotalWavesCall, IWavePortalCalls, NewWave, Wave};
use crate::bridge::{BridgeError, RawLog, TxHash, TxReceipt, WalletBridge};
use crate::config::DEFAULT_CONTRACT_ADDRESS;

/// Address the mock contract is deployed at unless overridden.
pub const MOCK_CONTRACT_ADDRESS: Address = DEFAULT_CONTRACT_ADDRESS;

/// Timestamp of block zero.
pub const GENESIS_TIMESTAMP: u64 = 1_700_000_000;

/// Seconds between consecutive blocks.
pub const BLOCK_INTERVAL_SECS: u64 = 12;

/// Provider code for "the requested account has not been authorized".
const UNAUTHORIZED_CODE: i64 = 4100;

struct Subscriber {
    address: Address,
    topic0: B256,
    sender: mpsc::UnboundedSender<RawLog>,
}

struct ChainState {
    contract: Address,
    /// Each wave with the block it was mined in.
    waves: Vec<(u64, Wave)>,
    logs: Vec<RawLog>,
    block_number: u64,
    timestamp: u64,
    receipts: HashMap<TxHash, TxReceipt>,
    subscribers: Vec<Subscriber>,
    calls: HashMap<[u8; 4], usize>,
    tx_count: u64,
    revert_next: bool,
    fail_next_confirmation: bool,
    fail_total_reads: bool,
}

/// Shared handle to the simulated chain.
#[derive(Clone)]
pub struct MockChain {
    inner: Rc<RefCell<ChainState>>,
}

impl Default for MockChain {
    fn default() -> Self {
        Self::new()
    }
}

impl MockChain {
    pub fn new() -> Self {
        Self::with_contract(MOCK_CONTRACT_ADDRESS)
    }

    pub fn with_contract(contract: Address) -> Self {
        Self {
            inner: Rc::new(RefCell::new(ChainState {
                contract,
                waves: Vec::new(),
                logs: Vec::new(),
                block_number: 0,
                timestamp: GENESIS_TIMESTAMP,
                receipts: HashMap::new(),
                subscribers: Vec::new(),
                calls: HashMap::new(),
                tx_count: 0,
                revert_next: false,
                fail_next_confirmation: false,
                fail_total_reads: false,
            })),
        }
    }

    pub fn contract_address(&self) -> Address {
        self.inner.borrow().contract
    }

    pub fn block_number(&self) -> u64 {
        self.inner.borrow().block_number
    }

    /// Timestamp of the latest block.
    pub fn timestamp(&self) -> u64 {
        self.inner.borrow().timestamp
    }

    /// Record a wave directly, as if another client had sent it.
    pub fn seed_wave(&self, from: Address, message: &str) {
        let mut state = self.inner.borrow_mut();
        state.mine_wave(from, message.to_string());
    }

    /// Make the next transaction revert once mined.
    pub fn revert_next_transaction(&self) {
        self.inner.borrow_mut().revert_next = true;
    }

    /// Make the next confirmation wait fail without a receipt.
    pub fn fail_next_confirmation(&self) {
        self.inner.borrow_mut().fail_next_confirmation = true;
    }

    /// Make every `getTotalWaves()` read fail until turned off again.
    pub fn fail_total_waves_reads(&self, fail: bool) {
        self.inner.borrow_mut().fail_total_reads = fail;
    }

    /// Deliver `log` to matching subscribers without touching contract state.
    pub fn emit_log(&self, log: RawLog) {
        self.inner.borrow_mut().publish(log);
    }

    /// Number of read calls made with the given selector.
    pub fn calls_to(&self, selector: [u8; 4]) -> usize {
        self.inner
            .borrow()
            .calls
            .get(&selector)
            .copied()
            .unwrap_or(0)
    }

    pub fn transactions_sent(&self) -> u64 {
        self.inner.borrow().tx_count
    }

    /// Subscriptions whose stream is still alive.
    pub fn active_subscriptions(&self) -> usize {
        let mut state = self.inner.borrow_mut();
        state.subscribers.retain(|s| !s.sender.is_closed());
        state.subscribers.len()
    }

    /// Evaluate a read call against the state as of `block` (latest if `None`).
    fn call(&self, to: Address, data: &[u8], block: Option<u64>) -> Result<Bytes, BridgeError> {
        let mut state = self.inner.borrow_mut();
        if to != state.contract || data.len() < 4 {
            return Ok(Bytes::new());
        }
        let selector = [data[0], data[1], data[2], data[3]];
        *state.calls.entry(selector).or_insert(0) += 1;

        let at = block.unwrap_or(state.block_number);
        let waves: Vec<Wave> = state
            .waves
            .iter()
            .filter(|(mined, _)| *mined <= at)
            .map(|(_, wave)| wave.clone())
            .collect();

        match IWavePortalCalls::abi_decode(data, true) {
            Ok(IWavePortalCalls::getAllWaves(_)) => {
                Ok(Bytes::from(getAllWavesCall::abi_encode_returns(&(waves,))))
            }
            Ok(IWavePortalCalls::getTotalWaves(_)) if state.fail_total_reads => {
                Err(BridgeError::Rpc {
                    code: -32603,
                    message: "internal error".into(),
                })
            }
            Ok(IWavePortalCalls::getTotalWaves(_)) => {
                let total = U256::from(waves.len());
                Ok(Bytes::from(getTotalWavesCall::abi_encode_returns(&(total,))))
            }
            Ok(IWavePortalCalls::wave(_)) | Err(_) => Ok(Bytes::new()),
        }
    }

    fn transact(&self, from: Address, to: Address, data: &[u8]) -> TxHash {
        let mut state = self.inner.borrow_mut();
        state.tx_count += 1;
        let mut preimage = from.to_vec();
        preimage.extend_from_slice(&state.tx_count.to_be_bytes());
        let tx_hash = keccak256(&preimage);

        let call = if to == state.contract {
            IWavePortalCalls::abi_decode(data, true).ok()
        } else {
            None
        };
        let succeeded = match call {
            Some(IWavePortalCalls::wave(call)) if !state.revert_next => {
                state.mine_wave(from, call._message);
                true
            }
            _ => {
                state.mine_empty_block();
                false
            }
        };
        state.revert_next = false;

        let receipt = TxReceipt {
            tx_hash,
            block_number: state.block_number,
            succeeded,
        };
        state.receipts.insert(tx_hash, receipt);
        tx_hash
    }

    fn receipt(&self, tx: TxHash) -> Result<TxReceipt, BridgeError> {
        let mut state = self.inner.borrow_mut();
        if std::mem::take(&mut state.fail_next_confirmation) {
            return Err(BridgeError::Transport("receipt unavailable".into()));
        }
        state
            .receipts
            .get(&tx)
            .cloned()
            .ok_or_else(|| BridgeError::Rpc {
                code: -32000,
                message: format!("unknown transaction {tx}"),
            })
    }

    /// Replay matching logs from `from_block` on, then follow new ones.
    fn subscribe(
        &self,
        address: Address,
        topic0: B256,
        from_block: u64,
    ) -> LocalBoxStream<'static, RawLog> {
        let (sender, receiver) = mpsc::unbounded();
        let mut state = self.inner.borrow_mut();
        for log in &state.logs {
            let replay = log.address == address
                && log.topics.first() == Some(&topic0)
                && log.block_number.is_some_and(|n| n >= from_block);
            if replay {
                let _ = sender.unbounded_send(log.clone());
            }
        }
        state.subscribers.push(Subscriber {
            address,
            topic0,
            sender,
        });
        receiver.boxed_local()
    }
}

impl ChainState {
    fn mine_empty_block(&mut self) {
        self.block_number += 1;
        self.timestamp += BLOCK_INTERVAL_SECS;
    }

    fn mine_wave(&mut self, from: Address, message: String) {
        self.mine_empty_block();
        let timestamp = U256::from(self.timestamp);
        let wave = Wave {
            waver: from,
            message: message.clone(),
            timestamp,
        };
        self.waves.push((self.block_number, wave));

        let event = NewWave {
            from,
            timestamp,
            message,
        };
        let log = RawLog {
            address: self.contract,
            topics: vec![NewWave::SIGNATURE_HASH, from.into_word()],
            data: Bytes::from(event.encode_data()),
            block_number: Some(self.block_number),
        };
        self.publish(log);
    }

    fn publish(&mut self, log: RawLog) {
        if log.block_number.is_some() {
            self.logs.push(log.clone());
        }
        self.subscribers.retain(|s| !s.sender.is_closed());
        let topic0 = log.topics.first().copied();
        for sub in &self.subscribers {
            if sub.address == log.address && Some(sub.topic0) == topic0 {
                let _ = sub.sender.unbounded_send(log.clone());
            }
        }
    }
}

/// One browser's wallet on a [`MockChain`].
pub struct MockWallet {
    chain: MockChain,
    accounts: Vec<Address>,
    authorized: Cell<bool>,
    present: bool,
    reject_prompts: bool,
}

impl MockWallet {
    /// A wallet holding `account` that has not yet authorized this site.
    pub fn new(chain: &MockChain, account: Address) -> Self {
        Self {
            chain: chain.clone(),
            accounts: vec![account],
            authorized: Cell::new(false),
            present: true,
            reject_prompts: false,
        }
    }

    /// A wallet that already authorized this site on a previous visit.
    pub fn authorized(chain: &MockChain, account: Address) -> Self {
        let wallet = Self::new(chain, account);
        wallet.authorized.set(true);
        wallet
    }

    /// No wallet extension installed.
    pub fn absent(chain: &MockChain) -> Self {
        Self {
            present: false,
            accounts: Vec::new(),
            ..Self::new(chain, Address::ZERO)
        }
    }

    /// The user declines every authorization prompt.
    pub fn rejecting_prompts(mut self) -> Self {
        self.reject_prompts = true;
        self
    }

    fn ensure_present(&self) -> Result<(), BridgeError> {
        if self.present {
            Ok(())
        } else {
            Err(BridgeError::NoProvider)
        }
    }
}

impl WalletBridge for MockWallet {
    async fn authorized_accounts(&self) -> Result<Vec<Address>, BridgeError> {
        self.ensure_present()?;
        if self.authorized.get() {
            Ok(self.accounts.clone())
        } else {
            Ok(Vec::new())
        }
    }

    async fn request_accounts(&self) -> Result<Vec<Address>, BridgeError> {
        self.ensure_present()?;
        if self.reject_prompts {
            return Err(BridgeError::Rejected);
        }
        self.authorized.set(true);
        Ok(self.accounts.clone())
    }

    async fn block_number(&self) -> Result<u64, BridgeError> {
        self.ensure_present()?;
        Ok(self.chain.block_number())
    }

    async fn call(
        &self,
        to: Address,
        data: Bytes,
        block: Option<u64>,
    ) -> Result<Bytes, BridgeError> {
        self.ensure_present()?;
        self.chain.call(to, &data, block)
    }

    async fn send_transaction(
        &self,
        from: Address,
        to: Address,
        data: Bytes,
    ) -> Result<TxHash, BridgeError> {
        self.ensure_present()?;
        if !self.authorized.get() || !self.accounts.contains(&from) {
            return Err(BridgeError::Rpc {
                code: UNAUTHORIZED_CODE,
                message: format!("account {from} is not authorized"),
            });
        }
        Ok(self.chain.transact(from, to, &data))
    }

    async fn wait_for_confirmation(&self, tx: TxHash) -> Result<TxReceipt, BridgeError> {
        self.ensure_present()?;
        self.chain.receipt(tx)
    }

    fn subscribe_logs(
        &self,
        address: Address,
        topic0: B256,
        from_block: u64,
    ) -> Result<LocalBoxStream<'static, RawLog>, BridgeError> {
        self.ensure_present()?;
        Ok(self.chain.subscribe(address, topic0, from_block))
    }

    fn bridge_name(&self) -> &str {
        "mock"
    }
}
