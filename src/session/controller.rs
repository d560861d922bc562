//! SessionController - wallet → contract → operation dispatch.
//!
//! Every public operation converts wallet/contract failures into alerts or
//! notifications; nothing is returned as an error. The session lock is never
//! held across a suspension point.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use super::{Session, SessionState};
use crate::config::AtmConfig;
use crate::contract::{ContractBinding, DynSolValue};
use crate::core::messages::{alert, contract as names, notice};
use crate::core::{Address, Receipt, Units};
use crate::error::{AtmError, AtmResult};
use crate::provider::Host;
use crate::view::{self, View};
use crate::wallet::WalletHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation { Deposit, Withdraw }

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self { Operation::Deposit => "deposit", Operation::Withdraw => "withdraw" }
    }

    pub fn function(&self) -> &'static str {
        match self { Operation::Deposit => names::DEPOSIT, Operation::Withdraw => names::WITHDRAW }
    }

    fn success_notice(&self) -> &'static str {
        match self { Operation::Deposit => notice::DEPOSIT_OK, Operation::Withdraw => notice::WITHDRAW_OK }
    }

    fn failure_notice(&self) -> &'static str {
        match self { Operation::Deposit => notice::DEPOSIT_FAILED, Operation::Withdraw => notice::WITHDRAW_FAILED }
    }

    fn busy_notice(&self) -> &'static str {
        match self { Operation::Deposit => notice::DEPOSIT_BUSY, Operation::Withdraw => notice::WITHDRAW_BUSY }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationOutcome {
    Succeeded(Receipt),
    Failed(String),
    /// Another deposit/withdraw was still in flight; nothing was sent.
    Busy,
}

impl OperationOutcome {
    pub fn is_success(&self) -> bool { matches!(self, OperationOutcome::Succeeded(_)) }

    pub fn as_str(&self) -> &'static str {
        match self {
            OperationOutcome::Succeeded(_) => "succeeded",
            OperationOutcome::Failed(_) => "failed",
            OperationOutcome::Busy => "busy",
        }
    }
}

/// Single-slot guard: at most one mutating operation in flight.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire).ok().map(|_| Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) { self.0.store(false, Ordering::Release); }
}

struct Inner {
    session: Session,
    wallet: Option<WalletHandle>,
}

pub struct SessionController {
    host: Arc<dyn Host>,
    config: AtmConfig,
    inner: Mutex<Inner>,
    in_flight: AtomicBool,
}

impl SessionController {
    pub fn new(host: Arc<dyn Host>, config: AtmConfig) -> Self {
        Self {
            host,
            config,
            inner: Mutex::new(Inner { session: Session::new(), wallet: None }),
            in_flight: AtomicBool::new(false),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> { self.inner.lock().unwrap_or_else(|p| p.into_inner()) }

    pub fn config(&self) -> &AtmConfig { &self.config }
    pub fn snapshot(&self) -> Session { self.lock().session.clone() }
    pub fn state(&self) -> SessionState { self.lock().session.state() }
    pub fn balance(&self) -> Option<Units> { self.lock().session.balance() }
    pub fn notifications(&self) -> Vec<String> { self.lock().session.notifications().list_all().to_vec() }
    pub fn is_busy(&self) -> bool { self.in_flight.load(Ordering::Acquire) }
    pub fn dismiss_alert(&self) -> Option<String> { self.lock().session.dismiss_alert() }

    pub fn view(&self) -> View {
        let session = self.snapshot();
        view::render(&session, &self.config, self.is_busy())
    }

    /// Detect the wallet and adopt an already-authorized account. Runs once per session.
    pub async fn init(&self) -> SessionState {
        let wallet = {
            let mut inner = self.lock();
            if inner.session.state() != SessionState::Unknown {
                return inner.session.state();
            }
            let wallet = WalletHandle::detect(self.host.as_ref());
            inner.session.set_detected(wallet.is_some());
            inner.wallet = wallet.clone();
            wallet
        };
        let Some(wallet) = wallet else {
            tracing::info!("no wallet provider detected");
            return self.state();
        };
        match wallet.list_accounts().await {
            Ok(accounts) => match accounts.into_iter().next() {
                Some(account) => {
                    if let Err(e) = self.adopt(&wallet, account).await {
                        self.binding_failed(e);
                    }
                }
                None => tracing::info!("wallet present, no authorized account"),
            },
            Err(e) => tracing::warn!(error = %e, "listing accounts failed"),
        }
        self.state()
    }

    /// Prompt the wallet for an account and bind the contract to the first one.
    ///
    /// While the wallet is absent every call asks the host again, so a
    /// provider injected after `init` is picked up here.
    pub async fn connect(&self) -> SessionState {
        match self.state() {
            SessionState::Unknown => { self.init().await; }
            SessionState::WalletAbsent => self.redetect(),
            _ => {}
        }
        let wallet = self.lock().wallet.clone();
        let Some(wallet) = wallet else {
            tracing::warn!("connect requested without a wallet provider");
            self.raise(alert::WALLET_REQUIRED);
            return self.state();
        };
        match wallet.request_accounts().await {
            Ok(accounts) => match accounts.into_iter().next() {
                Some(account) => {
                    if let Err(e) = self.adopt(&wallet, account).await {
                        self.binding_failed(e);
                    }
                }
                None => self.raise(alert::NO_ACCOUNT),
            },
            Err(AtmError::ConnectionRejected) => {
                tracing::info!("wallet connection rejected by user");
                self.raise(alert::CONNECTION_REJECTED);
            }
            Err(e) => {
                tracing::warn!(error = %e, "wallet connection failed");
                self.raise(alert::CONNECTION_FAILED);
            }
        }
        self.state()
    }

    fn redetect(&self) {
        let Some(wallet) = WalletHandle::detect(self.host.as_ref()) else { return };
        let mut inner = self.lock();
        if inner.wallet.is_none() {
            tracing::info!("wallet provider appeared after detection");
            inner.session.set_detected(true);
            inner.wallet = Some(wallet);
        }
    }

    /// No-op without a bound contract. A failed read keeps the previous balance.
    pub async fn refresh_balance(&self) -> Option<Units> {
        let contract = self.lock().session.contract().cloned();
        let contract = contract?;
        match self.fetch_balance(&contract).await {
            Ok(balance) => Some(balance),
            Err(e) => {
                tracing::warn!(error = %e, "balance query failed");
                self.balance()
            }
        }
    }

    pub async fn deposit(&self) -> OperationOutcome { self.execute(Operation::Deposit, self.config.deposit_amount).await }
    pub async fn withdraw(&self) -> OperationOutcome { self.execute(Operation::Withdraw, self.config.withdraw_amount).await }
    pub async fn deposit_amount(&self, amount: Units) -> OperationOutcome { self.execute(Operation::Deposit, amount).await }
    pub async fn withdraw_amount(&self, amount: Units) -> OperationOutcome { self.execute(Operation::Withdraw, amount).await }

    /// One call, one notification. Balance changes only through a post-confirmation refresh.
    pub async fn execute(&self, op: Operation, amount: Units) -> OperationOutcome {
        let Some(_slot) = InFlight::acquire(&self.in_flight) else {
            tracing::warn!(operation = op.as_str(), "rejected: another operation is in flight");
            self.lock().session.notify(op.busy_notice());
            return OperationOutcome::Busy;
        };
        let contract = self.lock().session.contract().cloned();
        let Some(contract) = contract else {
            return self.fail(op, AtmError::Binding("no contract bound".into()));
        };
        match Self::submit(&contract, op, amount).await {
            Ok(receipt) => {
                if let Err(e) = self.fetch_balance(&contract).await {
                    tracing::warn!(operation = op.as_str(), error = %e, "balance refresh after confirmation failed");
                }
                tracing::info!(operation = op.as_str(), %amount, hash = %receipt.transaction_hash, "transaction confirmed");
                self.lock().session.notify(op.success_notice());
                OperationOutcome::Succeeded(receipt)
            }
            Err(e) => self.fail(op, e),
        }
    }

    async fn submit(contract: &ContractBinding, op: Operation, amount: Units) -> AtmResult<Receipt> {
        let pending = contract.call(op.function(), &[DynSolValue::from(amount)]).await?;
        Ok(pending.confirm().await?)
    }

    async fn adopt(&self, wallet: &WalletHandle, account: Address) -> AtmResult<()> {
        self.lock().session.set_account(account);
        tracing::info!(%account, "account connected");
        self.config.abi.require(names::REQUIRED).map_err(|e| AtmError::Binding(e.to_string()))?;
        let binding = ContractBinding::bind(self.config.contract_address, self.config.abi.clone(), wallet, &account)
            .await?
            .with_confirm_policy(self.config.confirm);
        if !self.lock().session.set_contract(binding) {
            return Err(AtmError::Binding(format!("account changed while binding {}", account)));
        }
        tracing::info!(contract = %self.config.contract_address, %account, "contract bound");
        self.refresh_balance().await;
        Ok(())
    }

    async fn fetch_balance(&self, contract: &ContractBinding) -> AtmResult<Units> {
        let balance = contract.query_uint(names::GET_BALANCE, &[]).await?;
        self.lock().session.set_balance(contract.account(), balance);
        Ok(balance)
    }

    fn fail(&self, op: Operation, error: AtmError) -> OperationOutcome {
        tracing::warn!(operation = op.as_str(), error = %error, "operation failed");
        self.lock().session.notify(op.failure_notice());
        OperationOutcome::Failed(error.to_string())
    }

    fn binding_failed(&self, error: AtmError) {
        tracing::warn!(error = %error, "contract binding failed");
        self.raise(alert::BINDING_FAILED);
    }

    fn raise(&self, message: &str) { self.lock().session.raise(message); }
}
