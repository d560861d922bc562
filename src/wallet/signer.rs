//! Signer: one account, authorizing transactions through the provider.

use serde_json::json;
use std::fmt;
use std::sync::Arc;

use crate::core::messages::rpc;
use crate::core::types::{to_data, to_quantity};
use crate::core::{Address, TxHash, Units};
use crate::error::ProviderError;
use crate::provider::Provider;

#[derive(Clone)]
pub struct Signer {
    provider: Arc<dyn Provider>,
    account: Address,
}

impl fmt::Debug for Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signer").field("account", &self.account).finish()
    }
}

impl Signer {
    pub(crate) fn new(provider: Arc<dyn Provider>, account: Address) -> Self { Self { provider, account } }

    pub fn address(&self) -> &Address { &self.account }

    pub fn provider(&self) -> &Arc<dyn Provider> { &self.provider }

    /// Submit `{from, to, data[, value]}`; the wallet prompts, signs and broadcasts.
    pub async fn send_transaction(&self, to: &Address, data: &[u8], value: Option<Units>) -> Result<TxHash, ProviderError> {
        let mut tx = json!({"from": self.account, "to": to, "data": to_data(data)});
        if let Some(v) = value {
            tx["value"] = json!(to_quantity(v));
        }
        tracing::debug!(from = %self.account, to = %to, "eth_sendTransaction");
        let result = self.provider.request(rpc::SEND_TRANSACTION, json!([tx])).await?;
        result.as_str()
            .and_then(|hash| hash.parse::<TxHash>().ok())
            .ok_or_else(|| ProviderError::internal(format!("transaction hash expected, got {}", result)))
    }
}
