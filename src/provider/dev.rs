//! DevChain - in-memory wallet + ATM contract
//!
//! Answers the provider methods the session uses and executes the ATM
//! contract against a single owner balance: `deposit` adds, `withdraw` reverts
//! on insufficient funds, both revert for non-owners. Faults can be injected to
//! script wallet rejections, reverts and confirmation failures.

use alloy_primitives::{address, keccak256, Address, U256};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use super::Provider;
use crate::contract::{AbiDescriptor, CallCodec, DynSolValue};
use crate::core::messages::{contract as names, rpc};
use crate::core::types::{parse_data, to_data, to_quantity};
use crate::core::{parse_address, TxHash, Units};
use crate::error::ProviderError;

/// Hardhat's default chain id.
pub const DEV_CHAIN_ID: u64 = 31337;
/// Address of the first contract deployed by the first hardhat account.
pub const DEV_CONTRACT: Address = address!("5fbdb2315678afecb367f032d93f642f64180aa3");
/// First hardhat account.
pub const DEV_ACCOUNT: Address = address!("f39fd6e51aad88f6f4ce6ab8827279cfffb92266");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fault {
    /// `eth_requestAccounts` fails with code 4001
    RejectConnection,
    /// `eth_sendTransaction` fails with code 4001
    RejectSend,
    /// Every mined transaction gets `status: 0x0`
    Revert,
    /// `eth_getTransactionReceipt` errors
    FailConfirmation,
    /// `eth_call` errors
    FailBalanceQuery,
    /// Every request fails with code 4900
    Disconnect,
}

struct ChainState {
    accounts: Vec<Address>,
    authorized: bool,
    owner: Address,
    balance: Units,
    receipts: HashMap<TxHash, (Value, u32)>,
    confirmation_delay: u32,
    nonce: u64,
    block: u64,
    faults: HashSet<Fault>,
    calls: HashMap<String, usize>,
}

pub struct DevChain {
    contract: Address,
    abi: AbiDescriptor,
    state: Mutex<ChainState>,
}

impl Default for DevChain {
    fn default() -> Self { Self::new() }
}

impl DevChain {
    pub fn new() -> Self {
        Self {
            contract: DEV_CONTRACT,
            abi: AbiDescriptor::assessment(),
            state: Mutex::new(ChainState {
                accounts: vec![DEV_ACCOUNT],
                authorized: false,
                owner: DEV_ACCOUNT,
                balance: U256::from(1),
                receipts: HashMap::new(),
                confirmation_delay: 0,
                nonce: 0,
                block: 0,
                faults: HashSet::new(),
                calls: HashMap::new(),
            }),
        }
    }

    /// Wallet accounts; the first one owns the contract.
    pub fn with_accounts(self, accounts: Vec<Address>) -> Self {
        {
            let mut state = self.lock();
            if let Some(first) = accounts.first() { state.owner = *first; }
            state.accounts = accounts;
        }
        self
    }

    pub fn with_owner(self, owner: Address) -> Self { self.lock().owner = owner; self }
    pub fn with_balance(self, balance: Units) -> Self { self.lock().balance = balance; self }
    pub fn with_contract(mut self, contract: Address) -> Self { self.contract = contract; self }

    /// The site was connected before: `eth_accounts` answers without a prompt.
    pub fn authorized(self) -> Self { self.lock().authorized = true; self }

    /// Receipts appear only after this many polls.
    pub fn with_confirmation_delay(self, polls: u32) -> Self { self.lock().confirmation_delay = polls; self }

    pub fn inject(&self, fault: Fault) { self.lock().faults.insert(fault); }
    pub fn clear(&self, fault: Fault) { self.lock().faults.remove(&fault); }

    pub fn contract(&self) -> &Address { &self.contract }
    pub fn balance(&self) -> Units { self.lock().balance }
    pub fn set_balance(&self, balance: Units) { self.lock().balance = balance; }

    /// Account switch in the wallet. Ownership of the contract does not move.
    pub fn set_accounts(&self, accounts: Vec<Address>) { self.lock().accounts = accounts; }

    /// Number of requests seen for `method`.
    pub fn calls(&self, method: &str) -> usize { self.lock().calls.get(method).copied().unwrap_or(0) }

    fn lock(&self) -> MutexGuard<'_, ChainState> { self.state.lock().unwrap_or_else(|p| p.into_inner()) }

    fn handle(&self, method: &str, params: &Value) -> Result<Value, ProviderError> {
        let mut state = self.lock();
        *state.calls.entry(method.to_string()).or_default() += 1;
        if state.faults.contains(&Fault::Disconnect) {
            return Err(ProviderError::disconnected("dev chain disconnected"));
        }
        match method {
            rpc::ACCOUNTS => Ok(if state.authorized { json!(state.accounts) } else { json!([]) }),
            rpc::REQUEST_ACCOUNTS => {
                if state.faults.contains(&Fault::RejectConnection) {
                    return Err(ProviderError::user_rejected());
                }
                state.authorized = true;
                Ok(json!(state.accounts))
            }
            rpc::SEND_TRANSACTION => self.send(&mut state, params),
            rpc::CALL => self.call(&state, params),
            rpc::GET_TRANSACTION_RECEIPT => Self::receipt(&mut state, params),
            rpc::CHAIN_ID => Ok(json!(to_quantity(U256::from(DEV_CHAIN_ID)))),
            other => Err(ProviderError::method_not_found(other)),
        }
    }

    fn decode<'a>(&'a self, tx: &Value) -> Result<(&'a str, Vec<DynSolValue>), ProviderError> {
        let to = tx["to"].as_str().ok_or_else(|| ProviderError::invalid_params("missing 'to'"))?;
        let to = parse_address(to).map_err(|e| ProviderError::invalid_params(e.to_string()))?;
        if to != self.contract {
            return Err(ProviderError::invalid_params(format!("no contract at {}", to)));
        }
        let data = parse_data(tx["data"].as_str().unwrap_or("0x")).map_err(ProviderError::invalid_params)?;
        let function = self.abi.by_selector(&data)
            .ok_or_else(|| ProviderError::invalid_params("unknown function selector"))?;
        let args = function.decode_call(&data).map_err(|e| ProviderError::invalid_params(e.to_string()))?;
        Ok((function.name.as_str(), args))
    }

    fn send(&self, state: &mut ChainState, params: &Value) -> Result<Value, ProviderError> {
        let tx = params.get(0).ok_or_else(|| ProviderError::invalid_params("missing transaction"))?;
        let from = tx["from"].as_str()
            .ok_or_else(|| ProviderError::invalid_params("missing 'from'"))
            .and_then(|raw| parse_address(raw).map_err(|e| ProviderError::invalid_params(e.to_string())))?;
        if !state.authorized || !state.accounts.contains(&from) {
            return Err(ProviderError::unauthorized(format!("{} is not connected", from)));
        }
        if state.faults.contains(&Fault::RejectSend) {
            return Err(ProviderError::user_rejected());
        }
        let (function, args) = self.decode(tx)?;
        let amount = args.first().and_then(DynSolValue::as_uint).map(|(v, _)| v).unwrap_or_default();
        let success = !state.faults.contains(&Fault::Revert) && Self::execute(state, &from, function, amount);

        state.nonce += 1;
        state.block += 1;
        let hash = keccak256([from.as_slice(), &state.nonce.to_be_bytes()[..]].concat());
        let receipt = json!({
            "transactionHash": hash,
            "blockNumber": to_quantity(U256::from(state.block)),
            "from": from,
            "to": self.contract,
            "gasUsed": to_quantity(U256::from(21_000)),
            "status": if success { "0x1" } else { "0x0" },
        });
        let delay = state.confirmation_delay;
        state.receipts.insert(hash, (receipt, delay));
        tracing::debug!(function, %amount, success, "dev chain mined transaction");
        Ok(json!(hash))
    }

    /// Contract semantics. `false` means the transaction reverted.
    fn execute(state: &mut ChainState, from: &Address, function: &str, amount: Units) -> bool {
        if *from != state.owner {
            return false;
        }
        match function {
            names::DEPOSIT => match state.balance.checked_add(amount) {
                Some(next) => { state.balance = next; true }
                None => false,
            },
            names::WITHDRAW => match state.balance.checked_sub(amount) {
                Some(next) => { state.balance = next; true }
                None => false,
            },
            _ => true,
        }
    }

    fn call(&self, state: &ChainState, params: &Value) -> Result<Value, ProviderError> {
        let tx = params.get(0).ok_or_else(|| ProviderError::invalid_params("missing call"))?;
        let (function, _) = self.decode(tx)?;
        if function != names::GET_BALANCE {
            return Err(ProviderError::invalid_params(format!("{} is not a view function", function)));
        }
        if state.faults.contains(&Fault::FailBalanceQuery) {
            return Err(ProviderError::internal("eth_call failed"));
        }
        let output = self.abi.function(names::GET_BALANCE)
            .and_then(|f| f.encode_output(&[DynSolValue::from(state.balance)]))
            .map_err(|e| ProviderError::internal(e.to_string()))?;
        Ok(json!(to_data(&output)))
    }

    fn receipt(state: &mut ChainState, params: &Value) -> Result<Value, ProviderError> {
        let hash = params.get(0).and_then(Value::as_str)
            .ok_or_else(|| ProviderError::invalid_params("missing transaction hash"))?
            .parse::<TxHash>()
            .map_err(|e| ProviderError::invalid_params(format!("transaction hash: {}", e)))?;
        if state.faults.contains(&Fault::FailConfirmation) {
            return Err(ProviderError::internal("receipt unavailable"));
        }
        match state.receipts.get_mut(&hash) {
            None => Ok(Value::Null),
            Some((_, remaining)) if *remaining > 0 => { *remaining -= 1; Ok(Value::Null) }
            Some((receipt, _)) => Ok(receipt.clone()),
        }
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl Provider for DevChain {
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
        self.handle(method, &params)
    }
}
