//! Session configuration - contract address, ABI, amounts, confirmation policy

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::contract::{AbiDescriptor, ConfirmPolicy};
use alloy_primitives::address;

use crate::core::{parse_address, types, Address, Units};
use crate::error::{AtmError, AtmResult};

pub const DEFAULT_CONTRACT: Address = address!("5fbdb2315678afecb367f032d93f642f64180aa3");
pub const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8545";
pub const DEFAULT_DEPOSIT: Units = Units::from_limbs([100, 0, 0, 0]);
pub const DEFAULT_WITHDRAW: Units = Units::from_limbs([60, 0, 0, 0]);

/// Static configuration loaded at startup. Higher layers construct this.
#[derive(Debug, Clone)]
pub struct AtmConfig {
    pub contract_address: Address,
    pub abi: Arc<AbiDescriptor>,
    pub rpc_url: String,
    pub deposit_amount: Units,
    pub withdraw_amount: Units,
    pub confirm: ConfirmPolicy,
}

impl Default for AtmConfig {
    fn default() -> Self {
        Self {
            contract_address: DEFAULT_CONTRACT,
            abi: Arc::new(AbiDescriptor::assessment()),
            rpc_url: DEFAULT_RPC_URL.into(),
            deposit_amount: DEFAULT_DEPOSIT,
            withdraw_amount: DEFAULT_WITHDRAW,
            confirm: ConfirmPolicy::default(),
        }
    }
}

impl AtmConfig {
    pub fn new() -> Self { Self::default() }
    pub fn with_contract(mut self, address: Address) -> Self { self.contract_address = address; self }
    pub fn with_abi(mut self, abi: AbiDescriptor) -> Self { self.abi = Arc::new(abi); self }
    pub fn with_rpc_url(mut self, url: impl Into<String>) -> Self { self.rpc_url = url.into(); self }
    pub fn with_amounts(mut self, deposit: Units, withdraw: Units) -> Self { self.deposit_amount = deposit; self.withdraw_amount = withdraw; self }
    pub fn with_confirm_policy(mut self, policy: ConfirmPolicy) -> Self { self.confirm = policy; self }

    /// Load the ABI from a compiler artifact or bare ABI JSON file.
    pub fn with_abi_file(self, path: impl AsRef<Path>) -> AtmResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| AtmError::Config(format!("reading {}: {}", path.display(), e)))?;
        Ok(self.with_abi(AbiDescriptor::from_json(&raw)?))
    }

    /// Defaults overridden by `ATM_*` environment variables.
    ///
    /// | Variable | Meaning |
    /// |----------|---------|
    /// | `ATM_CONTRACT_ADDRESS` | deployed contract |
    /// | `ATM_ABI_PATH` | artifact JSON file |
    /// | `ATM_RPC_URL` | JSON-RPC endpoint (native) |
    /// | `ATM_DEPOSIT_AMOUNT` / `ATM_WITHDRAW_AMOUNT` | fixed amounts |
    /// | `ATM_POLL_INTERVAL_MS` / `ATM_CONFIRM_TIMEOUT_MS` | confirmation policy |
    pub fn from_env() -> AtmResult<Self> {
        let mut config = Self::default();
        if let Some(address) = env_var("ATM_CONTRACT_ADDRESS") {
            config.contract_address = parse_address(&address)?;
        }
        if let Some(path) = env_var("ATM_ABI_PATH") {
            config = config.with_abi_file(path)?;
        }
        if let Some(url) = env_var("ATM_RPC_URL") {
            config.rpc_url = url;
        }
        if let Some(amount) = env_var("ATM_DEPOSIT_AMOUNT") {
            config.deposit_amount = parse_units("ATM_DEPOSIT_AMOUNT", &amount)?;
        }
        if let Some(amount) = env_var("ATM_WITHDRAW_AMOUNT") {
            config.withdraw_amount = parse_units("ATM_WITHDRAW_AMOUNT", &amount)?;
        }
        if let Some(ms) = env_var("ATM_POLL_INTERVAL_MS") {
            config.confirm.poll_interval = Duration::from_millis(parse_millis("ATM_POLL_INTERVAL_MS", &ms)?);
        }
        if let Some(ms) = env_var("ATM_CONFIRM_TIMEOUT_MS") {
            config.confirm.timeout = Some(Duration::from_millis(parse_millis("ATM_CONFIRM_TIMEOUT_MS", &ms)?));
        }
        Ok(config)
    }
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Decimal `uint256` amount for the setting `key`.
pub fn parse_units(key: &str, raw: &str) -> AtmResult<Units> {
    types::parse_units(raw).map_err(|e| AtmError::Config(format!("{}: {}", key, e)))
}

fn parse_millis(key: &str, raw: &str) -> AtmResult<u64> {
    raw.parse().map_err(|e| AtmError::Config(format!("{}: '{}' is not milliseconds: {}", key, raw, e)))
}
