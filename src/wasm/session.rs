//! AtmSession: JS-facing handle over one SessionController

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;
use wasm_bindgen::prelude::*;

use super::log;
use super::provider::BrowserHost;
use crate::config::{parse_units, AtmConfig};
use crate::contract::AbiDescriptor;
use crate::core::parse_address;
use crate::provider::{DevChain, Host, StaticHost};
use crate::session::SessionController;

/// Constructor options. Amounts are decimal strings so they survive JS numbers.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct SessionOptions {
    contract_address: Option<String>,
    abi: Option<Value>,
    deposit_amount: Option<String>,
    withdraw_amount: Option<String>,
    poll_interval_ms: Option<u64>,
    confirm_timeout_ms: Option<u64>,
    /// Use the in-memory chain instead of window.ethereum
    dev: bool,
}

impl SessionOptions {
    fn into_config(self) -> Result<AtmConfig, JsValue> {
        let mut config = AtmConfig::new();
        if let Some(addr) = self.contract_address {
            config = config.with_contract(parse_address(&addr).map_err(to_js)?);
        }
        if let Some(abi) = self.abi {
            config = config.with_abi(AbiDescriptor::from_value(abi).map_err(to_js)?);
        }
        if let Some(raw) = self.deposit_amount {
            config.deposit_amount = parse_units("depositAmount", &raw).map_err(to_js)?;
        }
        if let Some(raw) = self.withdraw_amount {
            config.withdraw_amount = parse_units("withdrawAmount", &raw).map_err(to_js)?;
        }
        if let Some(ms) = self.poll_interval_ms {
            config.confirm.poll_interval = Duration::from_millis(ms);
        }
        if let Some(ms) = self.confirm_timeout_ms {
            config.confirm.timeout = Some(Duration::from_millis(ms));
        }
        Ok(config)
    }
}

fn to_js(e: impl std::fmt::Display) -> JsValue { JsValue::from_str(&e.to_string()) }

/// Browser ATM session
#[wasm_bindgen]
pub struct AtmSession {
    controller: Rc<SessionController>,
}

#[wasm_bindgen]
impl AtmSession {
    /// `new AtmSession({ contractAddress, abi, depositAmount, withdrawAmount, dev })`; every field optional.
    #[wasm_bindgen(constructor)]
    pub fn new(options: JsValue) -> Result<AtmSession, JsValue> {
        let options: SessionOptions = if options.is_undefined() || options.is_null() {
            SessionOptions::default()
        } else {
            serde_wasm_bindgen::from_value(options).map_err(to_js)?
        };
        let dev = options.dev;
        let config = options.into_config()?;
        let host: Arc<dyn Host> = if dev {
            log!("[AtmSession] using in-memory dev chain");
            Arc::new(StaticHost::new(Arc::new(DevChain::new().with_contract(config.contract_address))))
        } else {
            Arc::new(BrowserHost)
        };
        Ok(Self { controller: Rc::new(SessionController::new(host, config)) })
    }

    /// Detect the wallet and adopt an authorized account. Resolves to the view.
    pub async fn init(&self) -> Result<JsValue, JsValue> {
        let state = self.controller.init().await;
        log!("[AtmSession] init → {}", state.as_str());
        self.view()
    }

    pub async fn connect(&self) -> Result<JsValue, JsValue> {
        self.controller.connect().await;
        self.view()
    }

    #[wasm_bindgen(js_name = "refreshBalance")]
    pub async fn refresh_balance(&self) -> Result<JsValue, JsValue> {
        self.controller.refresh_balance().await;
        self.view()
    }

    /// Resolves to the view plus `outcome` ("succeeded" | "failed" | "busy").
    pub async fn deposit(&self) -> Result<JsValue, JsValue> {
        let outcome = self.controller.deposit().await;
        self.view_with(outcome.as_str())
    }

    pub async fn withdraw(&self) -> Result<JsValue, JsValue> {
        let outcome = self.controller.withdraw().await;
        self.view_with(outcome.as_str())
    }

    #[wasm_bindgen(js_name = "dismissAlert")]
    pub fn dismiss_alert(&self) -> Option<String> { self.controller.dismiss_alert() }

    #[wasm_bindgen(getter, js_name = "isBusy")]
    pub fn is_busy(&self) -> bool { self.controller.is_busy() }

    /// Current render model
    pub fn view(&self) -> Result<JsValue, JsValue> {
        let serializer = serde_wasm_bindgen::Serializer::new().serialize_maps_as_objects(true);
        self.controller.view().serialize(&serializer).map_err(to_js)
    }
}

impl AtmSession {
    fn view_with(&self, outcome: &str) -> Result<JsValue, JsValue> {
        let view = self.view()?;
        js_sys::Reflect::set(&view, &JsValue::from_str("outcome"), &JsValue::from_str(outcome))?;
        Ok(view)
    }
}
