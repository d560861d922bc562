//! WASM module: the ATM session inside a browser page
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │         AtmSession (JS API)             │
//! │  init, connect, refreshBalance,         │
//! │  deposit, withdraw, view                │
//! └─────────────────┬───────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────┐
//! │          SessionController              │
//! └─────────────────┬───────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────┐
//! │   BrowserHost → BrowserProvider         │
//! │   window.ethereum.request({...})        │
//! └─────────────────────────────────────────┘
//! ```

mod provider;
mod session;

pub use provider::{BrowserHost, BrowserProvider};
pub use session::AtmSession;

use wasm_bindgen::prelude::*;

/// Initialize WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Log to browser console
pub fn console_log(s: &str) {
    web_sys::console::log_1(&JsValue::from_str(s));
}

macro_rules! log {
    ($($t:tt)*) => {
        crate::wasm::console_log(&format!($($t)*))
    }
}

pub(crate) use log;
