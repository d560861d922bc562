//! atm-session: one wallet, one contract, two buttons.
//!
//! # Architecture
//!
//! ```text
//! SessionController (entry point)
//!   │
//!   ├── Host ──detect──► Provider (request(method, params))
//!   │                      ├── HttpProvider    (JSON-RPC, native)
//!   │                      ├── BrowserProvider (window.ethereum, wasm)
//!   │                      └── DevChain        (in-memory ATM contract)
//!   │
//!   ├── WalletHandle ──► Signer (one account)
//!   │
//!   ├── ContractBinding (alloy ABI codec + Signer)
//!   │     └── PendingTransaction::confirm (receipt polling)
//!   │
//!   └── Session ──render──► View
//!         └── NotificationLog (append-only outcomes)
//! ```
//!
//! # Operations
//!
//! | Operation | Method | Effect |
//! |-----------|--------|--------|
//! | init | `controller.init()` | Detect wallet, adopt an authorized account |
//! | connect | `controller.connect()` | Request accounts, bind contract, read balance |
//! | refresh | `controller.refresh_balance()` | Re-read `getBalance()` |
//! | deposit | `controller.deposit()` | `deposit(amount)`, confirm, refresh, notify |
//! | withdraw | `controller.withdraw()` | `withdraw(amount)`, confirm, refresh, notify |
//!
//! # Features
//!
//! - `native` - JSON-RPC provider, tokio, HTTP server, CLI
//! - `wasm` - `window.ethereum` provider and the `AtmSession` JS class (wasm32 only)
//!
//! # Usage
//!
//! ```ignore
//! use atm_session::{AtmConfig, SessionController, Units};
//! use atm_session::provider::{DevChain, StaticHost};
//! use std::sync::Arc;
//!
//! let chain = Arc::new(DevChain::new().with_balance(Units::from(150)));
//! let controller = SessionController::new(Arc::new(StaticHost::new(chain)), AtmConfig::new());
//!
//! controller.connect().await;
//! controller.deposit().await;
//! assert_eq!(controller.balance(), Some(Units::from(250)));
//! ```

// =============================================================================
// Shared modules (compile everywhere)
// =============================================================================
pub mod config;
pub mod contract;
pub mod core;
pub mod error;
pub mod provider;
pub mod session;
pub mod view;
pub mod wallet;

// =============================================================================
// Native-only modules (server, CLI, tokio)
// =============================================================================
#[cfg(feature = "native")]
pub mod logging;
#[cfg(feature = "native")]
pub mod runtime;
#[cfg(feature = "native")]
pub mod server;

// =============================================================================
// WASM-only modules (browser, wasm-bindgen)
// =============================================================================
#[cfg(all(feature = "wasm", target_arch = "wasm32"))]
pub mod wasm;

// =============================================================================
// Re-exports: Shared
// =============================================================================
pub use config::AtmConfig;
pub use contract::{AbiDescriptor, ConfirmPolicy, ContractBinding, PendingTransaction};
pub use core::{parse_address, Address, Receipt, TxHash, Units};
pub use error::{AtmError, AtmResult, ProviderError, TransactionError};
pub use provider::{Host, Provider, StaticHost};
pub use session::{NotificationLog, Operation, OperationOutcome, Session, SessionController, SessionState};
pub use view::View;
pub use wallet::{Signer, WalletHandle};

// =============================================================================
// Re-exports: Native
// =============================================================================
#[cfg(feature = "native")]
pub use runtime::{Shutdown, install_signal_handlers};
#[cfg(feature = "native")]
pub use server::{create_router, create_router_with_name};

// =============================================================================
// Re-exports: WASM
// =============================================================================
#[cfg(all(feature = "wasm", target_arch = "wasm32"))]
pub use wasm::{AtmSession, BrowserHost, BrowserProvider};
