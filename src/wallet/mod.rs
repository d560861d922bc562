//! Wallet module - account discovery, connection, signing
//!
//! Thin handle over a detected [`Provider`]. No key material lives here; the
//! provider (browser extension or node with unlocked accounts) signs.
//!
//! # Operations
//!
//! | Operation | Provider method | Prompts the user |
//! |-----------|-----------------|------------------|
//! | `list_accounts` | `eth_accounts` | no |
//! | `request_accounts` | `eth_requestAccounts` | yes |
//! | `signer(account)` | `eth_accounts` (membership) | no |
//! | `Signer::send_transaction` | `eth_sendTransaction` | yes |

mod signer;

pub use signer::Signer;

use serde_json::{json, Value};
use std::sync::Arc;

use crate::core::messages::rpc;
use crate::core::{parse_address, Address};
use crate::error::{AtmError, AtmResult};
use crate::provider::{Host, Provider};

#[derive(Clone)]
pub struct WalletHandle {
    provider: Arc<dyn Provider>,
}

impl WalletHandle {
    /// `None` when the host exposes no wallet provider.
    pub fn detect(host: &dyn Host) -> Option<Self> { host.detect().map(Self::new) }

    pub fn new(provider: Arc<dyn Provider>) -> Self { Self { provider } }

    pub fn provider(&self) -> &Arc<dyn Provider> { &self.provider }

    pub async fn list_accounts(&self) -> AtmResult<Vec<Address>> {
        let value = self.provider.request(rpc::ACCOUNTS, json!([])).await?;
        parse_accounts(value)
    }

    pub async fn request_accounts(&self) -> AtmResult<Vec<Address>> {
        match self.provider.request(rpc::REQUEST_ACCOUNTS, json!([])).await {
            Ok(value) => parse_accounts(value),
            Err(e) if e.is_user_rejected() => Err(AtmError::ConnectionRejected),
            Err(e) => Err(e.into()),
        }
    }

    /// Signer for `account`; the provider must currently expose it.
    pub async fn signer(&self, account: &Address) -> AtmResult<Signer> {
        let accounts = self.list_accounts().await
            .map_err(|e| AtmError::Binding(format!("listing accounts: {}", e)))?;
        if !accounts.contains(account) {
            return Err(AtmError::Binding(format!("wallet has no signer for {}", account)));
        }
        Ok(Signer::new(self.provider.clone(), *account))
    }
}

fn parse_accounts(value: Value) -> AtmResult<Vec<Address>> {
    let Value::Array(items) = value else {
        return Err(AtmError::Response(format!("accounts: expected array, got {}", value)));
    };
    items.iter().map(|item| {
        item.as_str()
            .ok_or_else(|| AtmError::Response(format!("accounts: non-string entry {}", item)))
            .and_then(parse_address)
    }).collect()
}
