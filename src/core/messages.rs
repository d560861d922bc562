//! Message and method constants
//!
//! Centralized registry for every user-visible string and every provider
//! method name. Notification wording is part of the observable contract.

/// Notification log entries (one per deposit/withdraw call)
pub mod notice {
    pub const DEPOSIT_OK: &str = "Deposit successful!";
    pub const DEPOSIT_FAILED: &str = "Deposit failed. Please try again.";
    pub const DEPOSIT_BUSY: &str = "Deposit rejected: another transaction is in progress.";

    pub const WITHDRAW_OK: &str = "Withdrawal successful!";
    pub const WITHDRAW_FAILED: &str = "Withdrawal failed. Please try again.";
    pub const WITHDRAW_BUSY: &str = "Withdrawal rejected: another transaction is in progress.";
}

/// Alerts (replace each other, dismissed by the presentation layer)
pub mod alert {
    pub const WALLET_REQUIRED: &str = "MetaMask wallet is required to connect";
    pub const CONNECTION_REJECTED: &str = "Wallet connection was rejected.";
    pub const CONNECTION_FAILED: &str = "Could not connect to the wallet. Please try again.";
    pub const NO_ACCOUNT: &str = "The wallet did not return any account.";
    pub const BINDING_FAILED: &str = "Could not attach the ATM contract to this account.";
}

/// Static prompts rendered by the view
pub mod prompt {
    pub const INSTALL_WALLET: &str = "Please install Metamask in order to use this ATM.";
    pub const CONNECT_WALLET: &str = "Please connect your Metamask wallet";
    pub const DETECTING: &str = "Looking for a wallet...";
}

/// Provider methods (EIP-1193 / Ethereum JSON-RPC)
pub mod rpc {
    pub const ACCOUNTS: &str = "eth_accounts";
    pub const REQUEST_ACCOUNTS: &str = "eth_requestAccounts";
    pub const SEND_TRANSACTION: &str = "eth_sendTransaction";
    pub const CALL: &str = "eth_call";
    pub const GET_TRANSACTION_RECEIPT: &str = "eth_getTransactionReceipt";
    pub const CHAIN_ID: &str = "eth_chainId";

    pub const LATEST: &str = "latest";
}

/// ATM contract functions
pub mod contract {
    pub const GET_BALANCE: &str = "getBalance";
    pub const DEPOSIT: &str = "deposit";
    pub const WITHDRAW: &str = "withdraw";

    pub const REQUIRED: &[&str] = &[GET_BALANCE, DEPOSIT, WITHDRAW];
}

/// Provider error codes
pub mod code {
    /// User rejected the request
    pub const USER_REJECTED: i64 = 4001;
    /// Requested account/method not authorized
    pub const UNAUTHORIZED: i64 = 4100;
    /// Provider is disconnected from all chains
    pub const DISCONNECTED: i64 = 4900;
    pub const INVALID_PARAMS: i64 = -32602;
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INTERNAL: i64 = -32603;
    /// Execution reverted (returned by nodes for eth_call)
    pub const EXECUTION_REVERTED: i64 = 3;
}
