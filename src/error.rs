//! Error taxonomy for the wallet, contract and session layers.

use thiserror::Error;

use crate::core::messages::code;
use crate::core::TxHash;

/// Error reported by a provider (EIP-1193 `ProviderRpcError` / JSON-RPC error object).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("provider error {code}: {message}")]
pub struct ProviderError {
    pub code: i64,
    pub message: String,
}

impl ProviderError {
    pub fn new(code: i64, message: impl Into<String>) -> Self { Self { code, message: message.into() } }
    pub fn user_rejected() -> Self { Self::new(code::USER_REJECTED, "User rejected the request.") }
    pub fn unauthorized(message: impl Into<String>) -> Self { Self::new(code::UNAUTHORIZED, message) }
    pub fn disconnected(message: impl Into<String>) -> Self { Self::new(code::DISCONNECTED, message) }
    pub fn invalid_params(message: impl Into<String>) -> Self { Self::new(code::INVALID_PARAMS, message) }
    pub fn method_not_found(method: &str) -> Self { Self::new(code::METHOD_NOT_FOUND, format!("method not found: {}", method)) }
    pub fn internal(message: impl Into<String>) -> Self { Self::new(code::INTERNAL, message) }

    pub fn is_user_rejected(&self) -> bool { self.code == code::USER_REJECTED }
}

/// ABI descriptor and codec errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AbiError {
    #[error("invalid ABI artifact: {0}")]
    Artifact(String),
    #[error("unknown function: {0}")]
    UnknownFunction(String),
    #[error("{function}: expected {expected} arguments, got {got}")]
    Arity { function: String, expected: usize, got: usize },
    #[error("unsupported ABI type: {0}")]
    UnsupportedType(String),
    #[error("argument does not match {0}")]
    Mismatch(String),
    #[error("value does not fit {0}")]
    Overflow(String),
    #[error("selector mismatch for {0}")]
    Selector(String),
    #[error("malformed ABI data: {0}")]
    Decode(String),
}

/// A mutating call that did not end in a successful receipt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransactionError {
    #[error("transaction rejected: {0}")]
    Rejected(ProviderError),
    #[error("transaction {0} reverted")]
    Reverted(TxHash),
    #[error("transaction {hash} not confirmed after {waited_ms} ms")]
    Timeout { hash: TxHash, waited_ms: u64 },
    #[error("transaction {hash} failed to confirm: {source}")]
    Confirmation { hash: TxHash, source: ProviderError },
}

#[derive(Debug, Error)]
pub enum AtmError {
    #[error("no wallet provider detected")]
    WalletUnavailable,
    #[error("wallet connection rejected")]
    ConnectionRejected,
    #[error("contract binding failed: {0}")]
    Binding(String),
    #[error(transparent)]
    Transaction(#[from] TransactionError),
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error(transparent)]
    Abi(#[from] AbiError),
    #[error("invalid address: {0}")]
    Address(String),
    #[error("unexpected provider response: {0}")]
    Response(String),
    #[error("config: {0}")]
    Config(String),
}

pub type AtmResult<T> = Result<T, AtmError>;
