//! Session - the observable state of one wallet binding to one contract
//!
//! # State machine
//!
//! ```text
//! Unknown ──detect──► WalletAbsent                       (terminal)
//!    │
//!    └──detect──► Disconnected ──accounts──► Connected(NoContract)
//!                                                  │
//!                                                bind
//!                                                  ▼
//!                                           Connected(Bound) ◄─┐
//!                                                  │           │
//!                                                  └ refresh / deposit / withdraw
//! ```
//!
//! The state is derived from the session fields, never stored separately.

mod controller;
mod notifications;

pub use controller::{Operation, OperationOutcome, SessionController};
pub use notifications::NotificationLog;

use crate::contract::ContractBinding;
use crate::core::{Address, Units};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractState { NoContract, Bound }

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unknown,
    WalletAbsent,
    Disconnected,
    Connected(ContractState),
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Unknown => "unknown",
            SessionState::WalletAbsent => "wallet_absent",
            SessionState::Disconnected => "disconnected",
            SessionState::Connected(ContractState::NoContract) => "connected",
            SessionState::Connected(ContractState::Bound) => "bound",
        }
    }

    pub fn is_bound(&self) -> bool { matches!(self, SessionState::Connected(ContractState::Bound)) }
}

/// Invariants: `contract` only with `account` (and for that account);
/// `balance` only with `contract`.
#[derive(Debug, Clone, Default)]
pub struct Session {
    detected: bool,
    wallet_present: bool,
    account: Option<Address>,
    contract: Option<ContractBinding>,
    balance: Option<Units>,
    notifications: NotificationLog,
    alert: Option<String>,
}

impl Session {
    pub fn new() -> Self { Self::default() }

    pub fn state(&self) -> SessionState {
        match (self.detected, self.wallet_present, &self.account, &self.contract) {
            (false, _, _, _) => SessionState::Unknown,
            (true, false, _, _) => SessionState::WalletAbsent,
            (true, true, None, _) => SessionState::Disconnected,
            (true, true, Some(_), None) => SessionState::Connected(ContractState::NoContract),
            (true, true, Some(_), Some(_)) => SessionState::Connected(ContractState::Bound),
        }
    }

    pub fn wallet_present(&self) -> bool { self.wallet_present }
    pub fn account(&self) -> Option<&Address> { self.account.as_ref() }
    pub fn contract(&self) -> Option<&ContractBinding> { self.contract.as_ref() }
    pub fn balance(&self) -> Option<Units> { self.balance }
    pub fn notifications(&self) -> &NotificationLog { &self.notifications }
    pub fn alert(&self) -> Option<&str> { self.alert.as_deref() }

    pub(crate) fn set_detected(&mut self, wallet_present: bool) {
        self.detected = true;
        self.wallet_present = wallet_present;
    }

    /// A new account drops the binding and balance of the previous one.
    pub(crate) fn set_account(&mut self, account: Address) {
        if self.account.as_ref() != Some(&account) {
            self.contract = None;
            self.balance = None;
        }
        self.account = Some(account);
    }

    /// Ignored unless the binding belongs to the active account.
    pub(crate) fn set_contract(&mut self, contract: ContractBinding) -> bool {
        if self.account.as_ref() != Some(contract.account()) {
            return false;
        }
        self.contract = Some(contract);
        true
    }

    /// Ignored unless a contract is bound for `account`.
    pub(crate) fn set_balance(&mut self, account: &Address, balance: Units) -> bool {
        match &self.contract {
            Some(c) if c.account() == account => { self.balance = Some(balance); true }
            _ => false,
        }
    }

    pub(crate) fn notify(&mut self, message: impl Into<String>) { self.notifications.append(message); }
    pub(crate) fn raise(&mut self, message: impl Into<String>) { self.alert = Some(message.into()); }
    pub(crate) fn dismiss_alert(&mut self) -> Option<String> { self.alert.take() }
}
