//! PendingTransaction - submitted, not yet included.

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use crate::core::messages::rpc;
use crate::core::{Receipt, TxHash};
use crate::error::{ProviderError, TransactionError};
use crate::provider::Provider;

/// How `confirm` polls for the receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmPolicy {
    pub poll_interval: Duration,
    /// `None` waits until the receipt appears or the provider errors.
    /// Measured from the first receipt request, provider latency included.
    pub timeout: Option<Duration>,
}

impl Default for ConfirmPolicy {
    fn default() -> Self { Self { poll_interval: Duration::from_millis(250), timeout: None } }
}

impl ConfirmPolicy {
    pub fn with_timeout(mut self, timeout: Duration) -> Self { self.timeout = Some(timeout); self }
    pub fn with_poll_interval(mut self, interval: Duration) -> Self { self.poll_interval = interval; self }
}

pub struct PendingTransaction {
    hash: TxHash,
    provider: Arc<dyn Provider>,
    policy: ConfirmPolicy,
}

impl PendingTransaction {
    pub(crate) fn new(hash: TxHash, provider: Arc<dyn Provider>, policy: ConfirmPolicy) -> Self { Self { hash, provider, policy } }

    pub fn hash(&self) -> &TxHash { &self.hash }

    /// Suspend until the transaction is included. Reverts and timeouts are errors.
    pub async fn confirm(self) -> Result<Receipt, TransactionError> {
        let started = Stopwatch::start();
        loop {
            let value = self.provider
                .request(rpc::GET_TRANSACTION_RECEIPT, json!([self.hash]))
                .await
                .map_err(|source| TransactionError::Confirmation { hash: self.hash.clone(), source })?;
            if !value.is_null() {
                let receipt = Receipt::from_value(&value).map_err(|e| TransactionError::Confirmation {
                    hash: self.hash.clone(),
                    source: ProviderError::internal(e),
                })?;
                if !receipt.success {
                    return Err(TransactionError::Reverted(self.hash));
                }
                return Ok(receipt);
            }
            if let Some(timeout) = self.policy.timeout {
                let waited = started.elapsed();
                if waited >= timeout {
                    return Err(TransactionError::Timeout { hash: self.hash, waited_ms: waited.as_millis() as u64 });
                }
            }
            pause(self.policy.poll_interval).await;
        }
    }
}

#[cfg(all(feature = "native", not(target_arch = "wasm32")))]
struct Stopwatch(tokio::time::Instant);

#[cfg(all(feature = "native", not(target_arch = "wasm32")))]
impl Stopwatch {
    fn start() -> Self { Self(tokio::time::Instant::now()) }
    fn elapsed(&self) -> Duration { self.0.elapsed() }
}

#[cfg(all(feature = "native", not(target_arch = "wasm32")))]
async fn pause(duration: Duration) { tokio::time::sleep(duration).await }

/// Wall clock in milliseconds (`Date.now()`).
#[cfg(all(feature = "wasm", target_arch = "wasm32"))]
struct Stopwatch(f64);

#[cfg(all(feature = "wasm", target_arch = "wasm32"))]
impl Stopwatch {
    fn start() -> Self { Self(js_sys::Date::now()) }
    fn elapsed(&self) -> Duration { Duration::from_millis((js_sys::Date::now() - self.0).max(0.0) as u64) }
}

#[cfg(all(feature = "wasm", target_arch = "wasm32"))]
async fn pause(duration: Duration) {
    let ms = duration.as_millis().min(i32::MAX as u128) as i32;
    let promise = js_sys::Promise::new(&mut |resolve, _reject| {
        let scheduled = web_sys::window()
            .map(|w| w.set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, ms).is_ok())
            .unwrap_or(false);
        if !scheduled {
            let _ = resolve.call0(&wasm_bindgen::JsValue::NULL);
        }
    });
    let _ = wasm_bindgen_futures::JsFuture::from(promise).await;
}

#[cfg(not(any(
    all(feature = "native", not(target_arch = "wasm32")),
    all(feature = "wasm", target_arch = "wasm32"),
)))]
compile_error!("enable the `native` feature (non-wasm targets) or the `wasm` feature (wasm32)");
