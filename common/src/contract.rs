//! Typed access to the WavePortal contract over a [`WalletBridge`].

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::{SolCall, SolEvent};
use futures::stream::{LocalBoxStream, StreamExt};

use crate::abi::{getAllWavesCall, getTotalWavesCall, waveCall, NewWave};
use crate::bridge::{BridgeError, TxHash, TxReceipt, WalletBridge};
use crate::wave::WaveRecord;

/// Client bound to one deployed contract address.
pub struct WavePortalClient<'b, B> {
    bridge: &'b B,
    address: Address,
}

impl<'b, B: WalletBridge> WavePortalClient<'b, B> {
    pub fn new(bridge: &'b B, address: Address) -> Self {
        Self { bridge, address }
    }

    pub async fn head(&self) -> Result<u64, BridgeError> {
        self.bridge.block_number().await
    }

    /// Every wave stored by the contract as of `block` (latest if `None`),
    /// in contract order.
    pub async fn all_waves(&self, block: Option<u64>) -> Result<Vec<WaveRecord>, BridgeError> {
        let data = Bytes::from(getAllWavesCall {}.abi_encode());
        let raw = self.bridge.call(self.address, data, block).await?;
        let decoded = getAllWavesCall::abi_decode_returns(&raw, true)
            .map_err(|e| BridgeError::Decode(e.to_string()))?;
        Ok(decoded._0.into_iter().map(WaveRecord::from).collect())
    }

    pub async fn total_waves(&self) -> Result<U256, BridgeError> {
        let data = Bytes::from(getTotalWavesCall {}.abi_encode());
        let raw = self.bridge.call(self.address, data, None).await?;
        let decoded = getTotalWavesCall::abi_decode_returns(&raw, true)
            .map_err(|e| BridgeError::Decode(e.to_string()))?;
        Ok(decoded._0)
    }

    /// Submit `wave(message)` from `from`. Returns once the wallet accepts.
    pub async fn wave(&self, from: Address, message: &str) -> Result<TxHash, BridgeError> {
        let data = Bytes::from(
            waveCall {
                _message: message.to_string(),
            }
            .abi_encode(),
        );
        self.bridge.send_transaction(from, self.address, data).await
    }

    /// Wait for a submitted transaction; a mined-but-reverted one is an error.
    pub async fn confirm(&self, tx: TxHash) -> Result<TxReceipt, BridgeError> {
        let receipt = self.bridge.wait_for_confirmation(tx).await?;
        if !receipt.succeeded {
            return Err(BridgeError::Reverted(tx));
        }
        Ok(receipt)
    }

    /// `NewWave` events from `from_block` on, as records. Undecodable logs
    /// are skipped.
    ///
    /// Dropping the returned stream releases the underlying subscription.
    pub fn subscribe_new_waves(
        &self,
        from_block: u64,
    ) -> Result<LocalBoxStream<'static, WaveRecord>, BridgeError> {
        let logs = self
            .bridge
            .subscribe_logs(self.address, NewWave::SIGNATURE_HASH, from_block)?;
        Ok(logs
            .filter_map(|log| async move {
                match NewWave::decode_raw_log(log.topics.iter().copied(), &log.data, true) {
                    Ok(event) => Some(WaveRecord::from(event)),
                    Err(e) => {
                        tracing::warn!("Skipping undecodable NewWave log: {e}");
                        None
                    }
                }
            })
            .boxed_local())
    }
}
