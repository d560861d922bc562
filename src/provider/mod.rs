//! Provider - the request/response seam to the wallet and the chain
//!
//! Every wallet and contract operation is a single provider request, the same
//! shape the browser-injected wallet exposes (`request({ method, params })`).
//!
//! ```text
//! WalletHandle / Signer / ContractBinding
//!                 │
//!                 ▼
//!        Provider::request(method, params)
//!                 │
//!     ┌───────────┼────────────────┐
//!     ▼           ▼                ▼
//! HttpProvider  BrowserProvider  DevChain
//! (JSON-RPC)    (window.ethereum) (in-memory ATM)
//! ```

mod dev;
#[cfg(feature = "native")]
mod http;

pub use dev::{DevChain, Fault, DEV_ACCOUNT, DEV_CHAIN_ID, DEV_CONTRACT};
#[cfg(feature = "native")]
pub use http::HttpProvider;

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use crate::error::ProviderError;

/// `Send + Sync` on native targets, nothing on wasm32 (JS values are single-threaded).
#[cfg(not(target_arch = "wasm32"))]
pub trait MaybeSend: Send + Sync {}
#[cfg(not(target_arch = "wasm32"))]
impl<T: Send + Sync + ?Sized> MaybeSend for T {}

#[cfg(target_arch = "wasm32")]
pub trait MaybeSend {}
#[cfg(target_arch = "wasm32")]
impl<T: ?Sized> MaybeSend for T {}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait Provider: MaybeSend {
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError>;
}

/// Environment the session runs in. Absence of a provider is a value.
pub trait Host: MaybeSend {
    fn detect(&self) -> Option<Arc<dyn Provider>>;
}

/// Host with a fixed (possibly absent) provider.
#[derive(Clone, Default)]
pub struct StaticHost {
    provider: Option<Arc<dyn Provider>>,
}

impl StaticHost {
    pub fn new(provider: Arc<dyn Provider>) -> Self { Self { provider: Some(provider) } }
    pub fn empty() -> Self { Self { provider: None } }
}

impl Host for StaticHost {
    fn detect(&self) -> Option<Arc<dyn Provider>> { self.provider.clone() }
}
