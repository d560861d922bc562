//! View - pure mapping from session state to a render model.

use serde::Serialize;

use crate::config::AtmConfig;
use crate::core::messages::prompt;
use crate::session::{Session, SessionState};

/// What the account area shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AccountPanel {
    Detecting { message: String },
    InstallWallet { message: String },
    Connect { label: String },
    Account { account: String, balance: Option<String> },
}

/// Render model. Integers are decimal strings so JS consumers keep full precision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct View {
    pub state: &'static str,
    pub wallet_present: bool,
    pub account: Option<String>,
    pub balance: Option<String>,
    pub panel: AccountPanel,
    pub alert: Option<String>,
    pub notifications: Vec<String>,
    pub deposit_label: String,
    pub withdraw_label: String,
    /// Deposit/withdraw enabled (bound and nothing in flight)
    pub actions_enabled: bool,
}

pub fn render(session: &Session, config: &AtmConfig, busy: bool) -> View {
    let state = session.state();
    let account = session.account().map(|a| a.to_string());
    let balance = session.balance().map(|b| b.to_string());
    let panel = match state {
        SessionState::Unknown => AccountPanel::Detecting { message: prompt::DETECTING.into() },
        SessionState::WalletAbsent => AccountPanel::InstallWallet { message: prompt::INSTALL_WALLET.into() },
        SessionState::Disconnected => AccountPanel::Connect { label: prompt::CONNECT_WALLET.into() },
        SessionState::Connected(_) => AccountPanel::Account {
            account: account.clone().unwrap_or_default(),
            balance: balance.clone(),
        },
    };
    View {
        state: state.as_str(),
        wallet_present: session.wallet_present(),
        account,
        balance,
        panel,
        alert: session.alert().map(str::to_string),
        notifications: session.notifications().list_all().to_vec(),
        deposit_label: format!("Deposit {} ETH", config.deposit_amount),
        withdraw_label: format!("Withdraw {} ETH", config.withdraw_amount),
        actions_enabled: state.is_bound() && !busy,
    }
}
