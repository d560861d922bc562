//! Session Tests: wallet → contract → deposit/withdraw against the dev chain
//!
//! These tests verify:
//! 1. Wallet detection and the install / connect prompts
//! 2. Silent adoption of an already-authorized account
//! 3. Deposit and withdraw: one notification per call, balance from the chain
//! 4. Failure paths: rejection, revert, confirmation errors, timeouts
//! 5. At most one deposit/withdraw in flight

use atm_session::core::messages::{alert, notice, rpc};
use atm_session::provider::{DevChain, Fault, Host, Provider};
use atm_session::session::ContractState;
use atm_session::view::AccountPanel;
use atm_session::{
    parse_address, AbiDescriptor, Address, AtmConfig, ConfirmPolicy, OperationOutcome, SessionController, SessionState,
    StaticHost, Units,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const ALICE: &str = "0x0000000000000000000000000000000000000abc";
const BOB: &str = "0x0000000000000000000000000000000000000def";

fn addr(raw: &str) -> Address {
    parse_address(raw).expect("address")
}

fn units(n: u64) -> Units {
    Units::from(n)
}

fn controller(chain: &Arc<DevChain>) -> SessionController {
    controller_with(chain, AtmConfig::new())
}

fn controller_with(chain: &Arc<DevChain>, config: AtmConfig) -> SessionController {
    SessionController::new(Arc::new(StaticHost::new(chain.clone())), config)
}

/// Wallet with ALICE already authorized; contract balance 150.
fn authorized_chain() -> Arc<DevChain> {
    Arc::new(DevChain::new().with_accounts(vec![addr(ALICE)]).authorized().with_balance(units(150)))
}

async fn bound(chain: &Arc<DevChain>) -> SessionController {
    let controller = controller(chain);
    assert!(controller.init().await.is_bound());
    controller
}

/// Test: No wallet → install prompt, connect raises an alert and sends nothing
#[tokio::test]
async fn absent_wallet_shows_install_prompt() {
    let controller = SessionController::new(Arc::new(StaticHost::empty()), AtmConfig::new());

    assert_eq!(controller.state(), SessionState::Unknown);
    assert_eq!(controller.init().await, SessionState::WalletAbsent);

    let view = controller.view();
    assert!(matches!(view.panel, AccountPanel::InstallWallet { .. }));
    assert!(!view.wallet_present);
    assert!(!view.actions_enabled);

    assert_eq!(controller.connect().await, SessionState::WalletAbsent);
    assert_eq!(controller.snapshot().alert(), Some(alert::WALLET_REQUIRED));
    assert!(controller.notifications().is_empty());
}

/// Test: Authorized account is adopted on init without prompting
#[tokio::test]
async fn authorized_account_binds_on_init() {
    let chain = authorized_chain();
    let controller = controller(&chain);

    assert_eq!(controller.init().await, SessionState::Connected(ContractState::Bound));
    assert_eq!(chain.calls(rpc::REQUEST_ACCOUNTS), 0);

    let session = controller.snapshot();
    assert_eq!(session.account(), Some(&addr(&ALICE.to_uppercase().replace("0X", "0x"))));
    assert_eq!(session.balance(), Some(units(150)));

    let view = controller.view();
    assert_eq!(view.state, "bound");
    assert_eq!(view.balance.as_deref(), Some("150"));
    assert!(view.actions_enabled);
}

/// Test: init runs once; a second call does not re-query the wallet
#[tokio::test]
async fn init_is_idempotent() {
    let chain = authorized_chain();
    let controller = controller(&chain);
    controller.init().await;
    let after_first = chain.calls(rpc::ACCOUNTS);
    controller.init().await;
    assert_eq!(chain.calls(rpc::ACCOUNTS), after_first);
}

/// Test: Unauthorized wallet → connect prompt; connect binds and reads the balance
#[tokio::test]
async fn connect_prompts_then_binds() {
    let chain = Arc::new(DevChain::new().with_balance(units(42)));
    let controller = controller(&chain);

    assert_eq!(controller.init().await, SessionState::Disconnected);
    assert!(matches!(controller.view().panel, AccountPanel::Connect { .. }));

    assert!(controller.connect().await.is_bound());
    assert_eq!(chain.calls(rpc::REQUEST_ACCOUNTS), 1);
    assert_eq!(controller.balance(), Some(units(42)));
    assert!(controller.snapshot().alert().is_none());
}

/// Test: connect on a fresh controller detects first
#[tokio::test]
async fn connect_without_init_detects() {
    let chain = Arc::new(DevChain::new());
    let controller = controller(&chain);
    assert!(controller.connect().await.is_bound());
    // detection, then the signer lookup during binding
    assert_eq!(chain.calls(rpc::ACCOUNTS), 2);
}

/// Test: User declines the connection prompt
#[tokio::test]
async fn rejected_connection_raises_alert() {
    let chain = Arc::new(DevChain::new());
    chain.inject(Fault::RejectConnection);
    let controller = controller(&chain);

    assert_eq!(controller.connect().await, SessionState::Disconnected);
    assert_eq!(controller.snapshot().alert(), Some(alert::CONNECTION_REJECTED));
    assert!(controller.notifications().is_empty());

    assert_eq!(controller.dismiss_alert().as_deref(), Some(alert::CONNECTION_REJECTED));
    assert!(controller.snapshot().alert().is_none());

    chain.clear(Fault::RejectConnection);
    assert!(controller.connect().await.is_bound());
}

/// Test: Provider failure other than rejection
#[tokio::test]
async fn disconnected_provider_raises_connection_failed() {
    let chain = Arc::new(DevChain::new());
    let controller = controller(&chain);
    controller.init().await;
    chain.inject(Fault::Disconnect);
    assert_eq!(controller.connect().await, SessionState::Disconnected);
    assert_eq!(controller.snapshot().alert(), Some(alert::CONNECTION_FAILED));
}

/// Test: ABI without withdraw → account adopted, contract not bound
#[tokio::test]
async fn incomplete_abi_fails_binding() {
    let abi = AbiDescriptor::from_json(
        r#"[{"type":"function","name":"getBalance","inputs":[],"outputs":[{"name":"","type":"uint256"}],"stateMutability":"view"},
            {"type":"function","name":"deposit","inputs":[{"name":"_amount","type":"uint256"}],"outputs":[],"stateMutability":"payable"}]"#,
    ).expect("abi");
    let chain = authorized_chain();
    let controller = controller_with(&chain, AtmConfig::new().with_abi(abi));

    assert_eq!(controller.init().await, SessionState::Connected(ContractState::NoContract));
    assert_eq!(controller.snapshot().alert(), Some(alert::BINDING_FAILED));
    assert_eq!(controller.balance(), None);
}

/// Test: refresh before binding touches nothing
#[tokio::test]
async fn refresh_without_contract_is_noop() {
    let chain = Arc::new(DevChain::new());
    let controller = controller(&chain);
    controller.init().await;

    assert_eq!(controller.refresh_balance().await, None);
    assert_eq!(chain.calls(rpc::CALL), 0);
    assert!(controller.notifications().is_empty());
}

/// Test: refresh picks up balance changes made elsewhere
#[tokio::test]
async fn refresh_reads_current_balance() {
    let chain = authorized_chain();
    let controller = bound(&chain).await;
    chain.set_balance(units(7));
    assert_eq!(controller.refresh_balance().await, Some(units(7)));
    assert_eq!(controller.balance(), Some(units(7)));
}

/// Test: failed balance read keeps the previous value
#[tokio::test]
async fn refresh_failure_keeps_balance() {
    let chain = authorized_chain();
    let controller = bound(&chain).await;
    chain.set_balance(units(7));
    chain.inject(Fault::FailBalanceQuery);
    assert_eq!(controller.refresh_balance().await, Some(units(150)));
    assert!(controller.notifications().is_empty());
}

/// Test: Deposit 100 on 150 → 250, one success notification
#[tokio::test]
async fn deposit_updates_balance_and_notifies() {
    let chain = authorized_chain();
    let controller = bound(&chain).await;

    let outcome = controller.deposit().await;
    assert!(outcome.is_success(), "{:?}", outcome);
    assert_eq!(controller.balance(), Some(units(250)));
    assert_eq!(controller.notifications(), vec![notice::DEPOSIT_OK]);
}

/// Test: Withdraw 60 on 150 → 90
#[tokio::test]
async fn withdraw_updates_balance_and_notifies() {
    let chain = authorized_chain();
    let controller = bound(&chain).await;

    assert!(controller.withdraw().await.is_success());
    assert_eq!(controller.balance(), Some(units(90)));
    assert_eq!(controller.notifications(), vec![notice::WITHDRAW_OK]);
}

/// Test: Successful operation re-reads the balance exactly once
#[tokio::test]
async fn one_refresh_per_success() {
    let chain = authorized_chain();
    let controller = bound(&chain).await;
    let before = chain.calls(rpc::CALL);

    controller.deposit().await;
    assert_eq!(chain.calls(rpc::CALL), before + 1);
}

/// Test: Withdraw beyond balance reverts; session balance unchanged
#[tokio::test]
async fn overdraw_reverts() {
    let chain = Arc::new(DevChain::new().authorized().with_balance(units(50)));
    let controller = bound(&chain).await;

    let outcome = controller.withdraw().await;
    assert!(matches!(outcome, OperationOutcome::Failed(_)));
    assert_eq!(controller.balance(), Some(units(50)));
    assert_eq!(controller.notifications(), vec![notice::WITHDRAW_FAILED]);
}

/// Test: Reverted withdraw → failure notification, no balance refresh
#[tokio::test]
async fn reverted_withdraw_keeps_balance() {
    let chain = authorized_chain();
    let controller = bound(&chain).await;
    chain.inject(Fault::Revert);
    let before = chain.calls(rpc::CALL);

    assert!(!controller.withdraw().await.is_success());
    assert_eq!(controller.balance(), Some(units(150)));
    assert_eq!(controller.notifications(), vec![notice::WITHDRAW_FAILED]);
    assert_eq!(chain.calls(rpc::CALL), before);
}

/// Test: Non-owner account binds but every mutation reverts
#[tokio::test]
async fn non_owner_deposit_reverts() {
    let chain = Arc::new(
        DevChain::new()
            .with_accounts(vec![addr(ALICE)])
            .with_owner(addr(BOB))
            .authorized()
            .with_balance(units(150)),
    );
    let controller = bound(&chain).await;

    assert!(!controller.deposit().await.is_success());
    assert_eq!(chain.balance(), units(150));
    assert_eq!(controller.notifications(), vec![notice::DEPOSIT_FAILED]);
}

/// Test: User declines signing; no receipt is polled
#[tokio::test]
async fn rejected_send_fails_without_polling() {
    let chain = authorized_chain();
    let controller = bound(&chain).await;
    chain.inject(Fault::RejectSend);

    assert!(!controller.deposit().await.is_success());
    assert_eq!(chain.calls(rpc::GET_TRANSACTION_RECEIPT), 0);
    assert_eq!(controller.notifications(), vec![notice::DEPOSIT_FAILED]);
    assert!(controller.snapshot().alert().is_none());
}

/// Test: Receipt lookup errors → failure notification
#[tokio::test]
async fn confirmation_error_fails_operation() {
    let chain = authorized_chain();
    let controller = bound(&chain).await;
    chain.inject(Fault::FailConfirmation);

    assert!(!controller.deposit().await.is_success());
    assert_eq!(controller.balance(), Some(units(150)));
    assert_eq!(controller.notifications(), vec![notice::DEPOSIT_FAILED]);
}

/// Test: Receipt never arrives within the configured timeout
#[tokio::test]
async fn confirmation_timeout_fails_operation() {
    let chain = Arc::new(DevChain::new().authorized().with_balance(units(150)).with_confirmation_delay(1_000));
    let policy = ConfirmPolicy::default()
        .with_poll_interval(Duration::from_millis(1))
        .with_timeout(Duration::from_millis(5));
    let controller = controller_with(&chain, AtmConfig::new().with_confirm_policy(policy));
    controller.init().await;

    match controller.deposit().await {
        OperationOutcome::Failed(reason) => assert!(reason.contains("not confirmed"), "{}", reason),
        other => panic!("expected failure, got {:?}", other),
    }
    assert_eq!(controller.balance(), Some(units(150)));
    assert!(!controller.is_busy());
}

/// Test: Confirmed transaction whose balance read fails still counts as success
#[tokio::test]
async fn success_with_failed_refresh_keeps_old_balance() {
    let chain = authorized_chain();
    let controller = bound(&chain).await;
    chain.inject(Fault::FailBalanceQuery);

    assert!(controller.deposit().await.is_success());
    assert_eq!(controller.balance(), Some(units(150)));
    assert_eq!(chain.balance(), units(250));
    assert_eq!(controller.notifications(), vec![notice::DEPOSIT_OK]);
}

/// Test: Deposit before binding → failure notification, nothing sent
#[tokio::test]
async fn deposit_without_contract_fails() {
    let chain = Arc::new(DevChain::new());
    let controller = controller(&chain);
    controller.init().await;

    assert!(!controller.deposit().await.is_success());
    assert_eq!(chain.calls(rpc::SEND_TRANSACTION), 0);
    assert_eq!(controller.notifications(), vec![notice::DEPOSIT_FAILED]);
}

/// Test: Notifications accumulate in call order, duplicates kept
#[tokio::test]
async fn notifications_append_in_order() {
    let chain = authorized_chain();
    let controller = bound(&chain).await;

    controller.deposit().await;
    controller.withdraw_amount(units(1_000)).await;
    controller.deposit().await;
    controller.withdraw().await;

    assert_eq!(
        controller.notifications(),
        vec![notice::DEPOSIT_OK, notice::WITHDRAW_FAILED, notice::DEPOSIT_OK, notice::WITHDRAW_OK]
    );
    assert_eq!(controller.balance(), Some(units(150 + 100 + 100 - 60)));
}

/// Test: Custom amounts go through unchanged
#[tokio::test]
async fn explicit_amounts() {
    let chain = authorized_chain();
    let controller = bound(&chain).await;
    controller.deposit_amount(units(5)).await;
    controller.withdraw_amount(units(55)).await;
    assert_eq!(controller.balance(), Some(units(100)));
}

/// Test: Second operation while the first awaits confirmation is rejected
#[tokio::test]
async fn concurrent_operation_is_busy() {
    let chain = Arc::new(DevChain::new().authorized().with_balance(units(150)).with_confirmation_delay(3));
    let policy = ConfirmPolicy::default().with_poll_interval(Duration::from_millis(5));
    let controller = Arc::new(controller_with(&chain, AtmConfig::new().with_confirm_policy(policy)));
    controller.init().await;

    let first = {
        let controller = controller.clone();
        tokio::spawn(async move { controller.deposit().await })
    };
    while !controller.is_busy() {
        tokio::task::yield_now().await;
    }
    assert!(!controller.view().actions_enabled);

    assert_eq!(controller.withdraw().await, OperationOutcome::Busy);
    assert!(first.await.expect("join").is_success());

    assert_eq!(chain.calls(rpc::SEND_TRANSACTION), 1);
    assert_eq!(controller.balance(), Some(units(250)));
    assert_eq!(controller.notifications(), vec![notice::WITHDRAW_BUSY, notice::DEPOSIT_OK]);
    assert!(!controller.is_busy());
}

/// Test: Wallet exposes several accounts → the first one is used
#[tokio::test]
async fn connect_uses_first_of_several_accounts() {
    let chain = Arc::new(DevChain::new().with_accounts(vec![addr(ALICE), addr(BOB)]).with_balance(units(150)));
    let controller = controller(&chain);

    assert!(controller.connect().await.is_bound());
    let session = controller.snapshot();
    assert_eq!(session.account(), Some(&addr(ALICE)));
    assert_eq!(session.contract().map(|c| *c.account()), Some(addr(ALICE)));
    assert_eq!(controller.view().account, Some(addr(ALICE).to_string()));
}

/// Test: Account switch in the wallet → reconnect rebinds to the new account and drops the old balance
#[tokio::test]
async fn account_change_rebinds_and_clears_balance() {
    let chain = authorized_chain();
    let controller = bound(&chain).await;
    assert_eq!(controller.balance(), Some(units(150)));

    chain.set_accounts(vec![addr(BOB), addr(ALICE)]);
    chain.inject(Fault::FailBalanceQuery);
    assert!(controller.connect().await.is_bound());

    let session = controller.snapshot();
    assert_eq!(session.account(), Some(&addr(BOB)));
    assert_eq!(session.contract().map(|c| *c.account()), Some(addr(BOB)));
    assert_eq!(session.balance(), None);

    chain.clear(Fault::FailBalanceQuery);
    assert_eq!(controller.refresh_balance().await, Some(units(150)));

    // BOB does not own the contract
    assert!(!controller.deposit().await.is_success());
    assert_eq!(chain.balance(), units(150));
}

/// Test: Reconnecting with the same account keeps the session bound
#[tokio::test]
async fn reconnect_same_account_keeps_binding() {
    let chain = authorized_chain();
    let controller = bound(&chain).await;
    chain.set_balance(units(70));

    assert!(controller.connect().await.is_bound());
    assert_eq!(controller.snapshot().account(), Some(&addr(ALICE)));
    assert_eq!(controller.balance(), Some(units(70)));
}

/// Host whose wallet shows up after the page loaded.
#[derive(Default)]
struct LateHost {
    provider: Mutex<Option<Arc<dyn Provider>>>,
}

impl LateHost {
    fn inject(&self, provider: Arc<dyn Provider>) {
        *self.provider.lock().unwrap_or_else(|p| p.into_inner()) = Some(provider);
    }
}

impl Host for LateHost {
    fn detect(&self) -> Option<Arc<dyn Provider>> {
        self.provider.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }
}

/// Test: Wallet injected after init is picked up by the next connect
#[tokio::test]
async fn late_wallet_is_detected_on_connect() {
    let host = Arc::new(LateHost::default());
    let controller = SessionController::new(host.clone(), AtmConfig::new());

    assert_eq!(controller.init().await, SessionState::WalletAbsent);
    assert_eq!(controller.connect().await, SessionState::WalletAbsent);
    assert_eq!(controller.dismiss_alert().as_deref(), Some(alert::WALLET_REQUIRED));

    let chain = Arc::new(DevChain::new().with_balance(units(42)));
    host.inject(chain.clone());
    // init stays a one-shot
    assert_eq!(controller.init().await, SessionState::WalletAbsent);

    assert!(controller.connect().await.is_bound());
    assert!(controller.snapshot().wallet_present());
    assert_eq!(controller.balance(), Some(units(42)));
    assert!(controller.snapshot().alert().is_none());
    assert_eq!(chain.calls(rpc::REQUEST_ACCOUNTS), 1);
}

/// Test: Balances above u128 are carried exactly
#[tokio::test]
async fn balances_keep_full_uint256_range() {
    let start = Units::from(u128::MAX);
    let chain = Arc::new(DevChain::new().authorized().with_balance(start));
    let controller = bound(&chain).await;

    assert!(controller.deposit().await.is_success());
    assert_eq!(controller.balance(), Some(start + units(100)));
    assert_eq!(controller.view().balance, Some("340282366920938463463374607431768211555".to_string()));
}
