//! Bridge to the wallet injected at `window.ethereum` (EIP-1193).
//!
//! Confirmations and log subscriptions are polled; a subscription's poll
//! loop stops as soon as its stream is dropped.

use std::time::Duration;

use alloy_primitives::{Address, Bytes, B256, U64};
use futures::channel::mpsc;
use futures::stream::{LocalBoxStream, StreamExt};
use gloo_timers::future::TimeoutFuture;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

use wave_portal_common::bridge::{BridgeError, RawLog, TxHash, TxReceipt, WalletBridge};
use wave_portal_common::config::PortalConfig;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(extends = js_sys::Object)]
    #[derive(Clone, Debug)]
    type Eip1193Provider;

    #[wasm_bindgen(method, catch)]
    fn request(this: &Eip1193Provider, args: &JsValue) -> Result<js_sys::Promise, JsValue>;
}

#[derive(Serialize)]
struct RequestArguments<'a> {
    method: &'a str,
    params: Value,
}

#[derive(Deserialize)]
struct ProviderRpcError {
    code: i64,
    #[serde(default)]
    message: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireReceipt {
    transaction_hash: B256,
    block_number: U64,
    /// Absent on pre-Byzantium chains.
    #[serde(default)]
    status: Option<U64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireLog {
    address: Address,
    topics: Vec<B256>,
    data: Bytes,
    #[serde(default)]
    block_number: Option<U64>,
    #[serde(default)]
    removed: bool,
}

impl From<WireLog> for RawLog {
    fn from(log: WireLog) -> Self {
        RawLog {
            address: log.address,
            topics: log.topics,
            data: log.data,
            block_number: log.block_number.map(|n| n.to::<u64>()),
        }
    }
}

#[derive(Clone)]
pub struct Eip1193Bridge {
    provider: Option<Eip1193Provider>,
    confirmation_poll: Duration,
    log_poll: Duration,
}

impl Eip1193Bridge {
    /// Look for an injected provider. A missing provider is not an error
    /// here; every request will fail with `BridgeError::NoProvider`.
    pub fn detect(config: &PortalConfig) -> Self {
        let provider = web_sys::window()
            .and_then(|w| js_sys::Reflect::get(&w, &JsValue::from_str("ethereum")).ok())
            .filter(|p| !p.is_undefined() && !p.is_null())
            .map(|p| p.unchecked_into::<Eip1193Provider>());
        if provider.is_none() {
            tracing::warn!("window.ethereum not found");
        }
        Self {
            provider,
            confirmation_poll: config.confirmation_poll,
            log_poll: config.log_poll,
        }
    }

    fn provider(&self) -> Result<&Eip1193Provider, BridgeError> {
        self.provider.as_ref().ok_or(BridgeError::NoProvider)
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<T, BridgeError> {
        rpc(self.provider()?, method, params).await
    }
}

async fn rpc<T: DeserializeOwned>(
    provider: &Eip1193Provider,
    method: &str,
    params: Value,
) -> Result<T, BridgeError> {
    let args = RequestArguments { method, params }
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| BridgeError::Transport(e.to_string()))?;
    let promise = provider.request(&args).map_err(provider_error)?;
    let value = JsFuture::from(promise).await.map_err(provider_error)?;
    serde_wasm_bindgen::from_value(value)
        .map_err(|e| BridgeError::Decode(format!("{method}: {e}")))
}

fn provider_error(err: JsValue) -> BridgeError {
    match serde_wasm_bindgen::from_value::<ProviderRpcError>(err.clone()) {
        Ok(e) => BridgeError::from_rpc(e.code, e.message),
        Err(_) => BridgeError::Transport(format!("{err:?}")),
    }
}

fn millis(d: Duration) -> u32 {
    u32::try_from(d.as_millis()).unwrap_or(u32::MAX)
}

fn block_tag(block: Option<u64>) -> Value {
    match block {
        Some(n) => Value::String(format!("{n:#x}")),
        None => Value::String("latest".into()),
    }
}

async fn poll_logs(
    provider: Eip1193Provider,
    address: Address,
    topic0: B256,
    mut from_block: u64,
    interval: Duration,
    sink: mpsc::UnboundedSender<RawLog>,
) {
    let mut first = true;
    while !sink.is_closed() {
        if !std::mem::take(&mut first) {
            TimeoutFuture::new(millis(interval)).await;
        }
        if sink.is_closed() {
            break;
        }

        let filter = json!([{
            "address": address,
            "topics": [topic0],
            "fromBlock": format!("{from_block:#x}"),
            "toBlock": "latest",
        }]);
        match rpc::<Vec<WireLog>>(&provider, "eth_getLogs", filter).await {
            Ok(logs) => {
                for log in logs.into_iter().filter(|l| !l.removed) {
                    if let Some(n) = log.block_number {
                        from_block = from_block.max(n.to::<u64>() + 1);
                    }
                    if sink.unbounded_send(log.into()).is_err() {
                        break;
                    }
                }
            }
            Err(e) => tracing::warn!("eth_getLogs failed: {e}"),
        }
    }
    tracing::debug!("Log subscription for {address} released");
}

impl WalletBridge for Eip1193Bridge {
    async fn authorized_accounts(&self) -> Result<Vec<Address>, BridgeError> {
        self.request("eth_accounts", json!([])).await
    }

    async fn request_accounts(&self) -> Result<Vec<Address>, BridgeError> {
        self.request("eth_requestAccounts", json!([])).await
    }

    async fn block_number(&self) -> Result<u64, BridgeError> {
        let head: U64 = self.request("eth_blockNumber", json!([])).await?;
        Ok(head.to::<u64>())
    }

    async fn call(
        &self,
        to: Address,
        data: Bytes,
        block: Option<u64>,
    ) -> Result<Bytes, BridgeError> {
        self.request(
            "eth_call",
            json!([{ "to": to, "data": data }, block_tag(block)]),
        )
        .await
    }

    async fn send_transaction(
        &self,
        from: Address,
        to: Address,
        data: Bytes,
    ) -> Result<TxHash, BridgeError> {
        self.request(
            "eth_sendTransaction",
            json!([{ "from": from, "to": to, "data": data }]),
        )
        .await
    }

    async fn wait_for_confirmation(&self, tx: TxHash) -> Result<TxReceipt, BridgeError> {
        loop {
            let receipt: Option<WireReceipt> = self
                .request("eth_getTransactionReceipt", json!([tx]))
                .await?;
            if let Some(r) = receipt {
                return Ok(TxReceipt {
                    tx_hash: r.transaction_hash,
                    block_number: r.block_number.to::<u64>(),
                    succeeded: r.status.is_none_or(|s| s == U64::from(1)),
                });
            }
            TimeoutFuture::new(millis(self.confirmation_poll)).await;
        }
    }

    fn subscribe_logs(
        &self,
        address: Address,
        topic0: B256,
        from_block: u64,
    ) -> Result<LocalBoxStream<'static, RawLog>, BridgeError> {
        let provider = self.provider()?.clone();
        let (sink, stream) = mpsc::unbounded();
        wasm_bindgen_futures::spawn_local(poll_logs(
            provider,
            address,
            topic0,
            from_block,
            self.log_poll,
            sink,
        ));
        Ok(stream.boxed_local())
    }

    fn bridge_name(&self) -> &str {
        "eip-1193"
    }
}
