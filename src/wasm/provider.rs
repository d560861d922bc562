//! window.ethereum as a Provider

use async_trait::async_trait;
use js_sys::{Function, Object, Promise, Reflect};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;

use crate::core::messages::code;
use crate::error::ProviderError;
use crate::provider::{Host, Provider};

/// The injected EIP-1193 object.
pub struct BrowserProvider {
    ethereum: JsValue,
}

impl BrowserProvider {
    pub fn new(ethereum: JsValue) -> Self { Self { ethereum } }

    /// `window.ethereum`, if a wallet extension injected one.
    pub fn from_window() -> Option<Self> {
        let window = web_sys::window()?;
        let ethereum = Reflect::get(&window, &JsValue::from_str("ethereum")).ok()?;
        if ethereum.is_undefined() || ethereum.is_null() {
            return None;
        }
        Some(Self::new(ethereum))
    }
}

#[async_trait(?Send)]
impl Provider for BrowserProvider {
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
        let args = Object::new();
        let params = params
            .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
            .map_err(|e| ProviderError::invalid_params(e.to_string()))?;
        Reflect::set(&args, &JsValue::from_str("method"), &JsValue::from_str(method)).map_err(js_error)?;
        Reflect::set(&args, &JsValue::from_str("params"), &params).map_err(js_error)?;

        let request: Function = Reflect::get(&self.ethereum, &JsValue::from_str("request"))
            .map_err(js_error)?
            .dyn_into()
            .map_err(|_| ProviderError::internal("ethereum.request is not a function"))?;
        let promise: Promise = request
            .call1(&self.ethereum, &args)
            .map_err(js_error)?
            .dyn_into()
            .map_err(|_| ProviderError::internal("ethereum.request did not return a promise"))?;

        let result = JsFuture::from(promise).await.map_err(js_error)?;
        if result.is_undefined() {
            return Ok(Value::Null);
        }
        serde_wasm_bindgen::from_value(result).map_err(|e| ProviderError::internal(e.to_string()))
    }
}

/// Map a rejected wallet promise (`{ code, message }`) to a ProviderError.
fn js_error(err: JsValue) -> ProviderError {
    let field = |name: &str| Reflect::get(&err, &JsValue::from_str(name)).ok();
    let code = field("code").and_then(|c| c.as_f64()).map(|c| c as i64).unwrap_or(code::INTERNAL);
    let message = field("message")
        .and_then(|m| m.as_string())
        .or_else(|| err.as_string())
        .unwrap_or_else(|| "wallet request failed".into());
    ProviderError::new(code, message)
}

/// Reads `window.ethereum` on every call. An extension that injects late is
/// picked up by the next `connect` while the session shows the install prompt.
#[derive(Default)]
pub struct BrowserHost;

impl Host for BrowserHost {
    fn detect(&self) -> Option<Arc<dyn Provider>> {
        BrowserProvider::from_window().map(|p| Arc::new(p) as Arc<dyn Provider>)
    }
}
