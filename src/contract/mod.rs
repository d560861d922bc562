//! Contract module - signer-bound reference to one deployed contract
//!
//! ```text
//! ContractBinding { address, abi, signer }
//!     │
//!     ├── query(fn, args)  → eth_call            → decoded tokens
//!     │
//!     └── call(fn, args)   → eth_sendTransaction → PendingTransaction
//!                                                        │
//!                                                 confirm() polls
//!                                                 eth_getTransactionReceipt
//! ```

pub mod abi;
mod pending;

pub use abi::{AbiDescriptor, CallCodec};
pub use alloy_dyn_abi::DynSolValue;
pub use alloy_json_abi::{Function, Param, StateMutability};
pub use pending::{ConfirmPolicy, PendingTransaction};

use serde_json::json;
use std::fmt;
use std::sync::Arc;

use crate::core::messages::rpc;
use crate::core::types::{parse_data, to_data};
use crate::core::{Address, Units};
use crate::error::{AbiError, AtmError, AtmResult, TransactionError};
use crate::wallet::{Signer, WalletHandle};

#[derive(Clone)]
pub struct ContractBinding {
    address: Address,
    abi: Arc<AbiDescriptor>,
    signer: Signer,
    confirm: ConfirmPolicy,
}

impl fmt::Debug for ContractBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContractBinding")
            .field("address", &self.address)
            .field("account", self.signer.address())
            .finish()
    }
}

impl ContractBinding {
    /// Bind `address` to the signer the wallet produces for `account`.
    pub async fn bind(address: Address, abi: Arc<AbiDescriptor>, wallet: &WalletHandle, account: &Address) -> AtmResult<Self> {
        let signer = wallet.signer(account).await?;
        Ok(Self { address, abi, signer, confirm: ConfirmPolicy::default() })
    }

    pub fn with_confirm_policy(mut self, policy: ConfirmPolicy) -> Self { self.confirm = policy; self }

    pub fn address(&self) -> &Address { &self.address }
    pub fn account(&self) -> &Address { self.signer.address() }
    pub fn abi(&self) -> &AbiDescriptor { &self.abi }

    /// Mutating call. Wallet rejection and send failures are `TransactionError::Rejected`.
    pub async fn call(&self, function: &str, args: &[DynSolValue]) -> AtmResult<PendingTransaction> {
        self.call_with_value(function, args, None).await
    }

    pub async fn call_with_value(&self, function: &str, args: &[DynSolValue], value: Option<Units>) -> AtmResult<PendingTransaction> {
        let f = self.abi.function(function)?;
        if f.is_read_only() {
            return Err(AbiError::Mismatch(format!("{} is read-only; use query", f.signature())).into());
        }
        let data = f.encode_call(args)?;
        let hash = self.signer.send_transaction(&self.address, &data, value).await
            .map_err(TransactionError::Rejected)?;
        tracing::debug!(function, %hash, "transaction submitted");
        Ok(PendingTransaction::new(hash, self.signer.provider().clone(), self.confirm))
    }

    /// Read-only call against the latest block.
    pub async fn query(&self, function: &str, args: &[DynSolValue]) -> AtmResult<Vec<DynSolValue>> {
        let f = self.abi.function(function)?;
        let data = f.encode_call(args)?;
        let call = json!({"from": self.signer.address(), "to": self.address, "data": to_data(&data)});
        let result = self.signer.provider().request(rpc::CALL, json!([call, rpc::LATEST])).await?;
        let raw = result.as_str().ok_or_else(|| AtmError::Response(format!("eth_call: expected hex, got {}", result)))?;
        let bytes = parse_data(raw).map_err(AtmError::Response)?;
        Ok(f.decode_output(&bytes)?)
    }

    /// `query` for functions returning a single unsigned integer.
    pub async fn query_uint(&self, function: &str, args: &[DynSolValue]) -> AtmResult<Units> {
        self.query(function, args).await?
            .first()
            .and_then(DynSolValue::as_uint)
            .map(|(value, _)| value)
            .ok_or_else(|| AbiError::Decode(format!("{} did not return an integer", function)).into())
    }
}
