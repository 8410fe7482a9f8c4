use alloy_primitives::{Address, Bytes, B256};
use futures::stream::LocalBoxStream;

/// Transaction hash returned when a write is accepted by the wallet.
pub type TxHash = B256;

/// Error code an EIP-1193 provider returns when the user declines a prompt.
pub const USER_REJECTED_CODE: i64 = 4001;

/// A contract log as delivered by a subscription.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawLog {
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: Bytes,
    pub block_number: Option<u64>,
}

/// Outcome of a mined transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxReceipt {
    pub tx_hash: TxHash,
    pub block_number: u64,
    pub succeeded: bool,
}

/// Errors from the wallet/contract bridge.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum BridgeError {
    #[error("no wallet provider is available")]
    NoProvider,
    #[error("request rejected by the user")]
    Rejected,
    #[error("provider error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("could not decode provider response: {0}")]
    Decode(String),
    #[error("transaction {0} reverted")]
    Reverted(TxHash),
    #[error("transport failure: {0}")]
    Transport(String),
}

impl BridgeError {
    /// Classify a JSON-RPC style error by its code.
    pub fn from_rpc(code: i64, message: impl Into<String>) -> Self {
        if code == USER_REJECTED_CODE {
            Self::Rejected
        } else {
            Self::Rpc {
                code,
                message: message.into(),
            }
        }
    }
}

/// Capabilities the portal needs from an injected wallet provider.
///
/// The browser implementation talks to `window.ethereum`; the dev
/// implementation is an in-memory chain. Log subscriptions are owned
/// streams: dropping the stream releases the subscription.
#[allow(async_fn_in_trait)]
pub trait WalletBridge {
    /// Accounts the user has already authorized, without prompting.
    async fn authorized_accounts(&self) -> Result<Vec<Address>, BridgeError>;

    /// Prompt the user to authorize accounts.
    async fn request_accounts(&self) -> Result<Vec<Address>, BridgeError>;

    /// Number of the latest block.
    async fn block_number(&self) -> Result<u64, BridgeError>;

    /// Execute a read-only contract call at `block` (latest if `None`) and
    /// return the raw return data.
    async fn call(
        &self,
        to: Address,
        data: Bytes,
        block: Option<u64>,
    ) -> Result<Bytes, BridgeError>;

    /// Submit a state-changing transaction. Resolves once the wallet has
    /// accepted it, before it is mined.
    async fn send_transaction(
        &self,
        from: Address,
        to: Address,
        data: Bytes,
    ) -> Result<TxHash, BridgeError>;

    /// Wait until the transaction is mined.
    async fn wait_for_confirmation(&self, tx: TxHash) -> Result<TxReceipt, BridgeError>;

    /// Stream logs emitted by `address` whose first topic is `topic0`,
    /// starting at `from_block`. Logs already mined at or after that block
    /// are delivered before new ones.
    fn subscribe_logs(
        &self,
        address: Address,
        topic0: B256,
        from_block: u64,
    ) -> Result<LocalBoxStream<'static, RawLog>, BridgeError>;

    /// Human-readable backend name (e.g. "eip-1193", "mock").
    fn bridge_name(&self) -> &str;
}
