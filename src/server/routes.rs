//! HTTP routes for the session view and the four user actions

use axum::body::Bytes;
use axum::http::StatusCode;
use axum::{extract::State, response::IntoResponse, routing::{delete, get, post}, Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::core::{parse_units, Units};
use crate::session::{OperationOutcome, SessionController};
use crate::view::View;

#[derive(Clone)]
pub struct AppState { pub controller: Arc<SessionController>, pub app_name: String }

impl AppState {
    pub fn new(controller: Arc<SessionController>, app_name: impl Into<String>) -> Self {
        Self { controller, app_name: app_name.into() }
    }
}

/// Body of deposit/withdraw. An empty body or `{}` uses the configured amount.
///
/// `amount` is a JSON integer or a decimal string (for values past 2^53).
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AmountRequest {
    #[serde(default)]
    pub amount: Option<AmountField>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AmountField {
    Number(u64),
    Decimal(String),
}

impl AmountRequest {
    /// `Ok(None)` only for a blank body or an absent `amount`.
    pub fn parse(body: &[u8]) -> Result<Option<Units>, String> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }
        let request: AmountRequest = serde_json::from_slice(body).map_err(|e| format!("invalid amount body: {}", e))?;
        match request.amount {
            None => Ok(None),
            Some(AmountField::Number(n)) => Ok(Some(Units::from(n))),
            Some(AmountField::Decimal(raw)) => parse_units(&raw).map(Some).map_err(|e| format!("invalid amount: {}", e)),
        }
    }
}

type Rejection = (StatusCode, Json<Value>);

fn unprocessable(error: String) -> Rejection {
    tracing::debug!(%error, "rejected amount body");
    (StatusCode::UNPROCESSABLE_ENTITY, Json(json!({"error": error})))
}

#[derive(Debug, Serialize)]
struct OutcomeBody {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")] transaction_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")] error: Option<String>,
}

impl From<&OperationOutcome> for OutcomeBody {
    fn from(outcome: &OperationOutcome) -> Self {
        let (transaction_hash, error) = match outcome {
            OperationOutcome::Succeeded(r) => (Some(r.transaction_hash.to_string()), None),
            OperationOutcome::Failed(e) => (None, Some(e.clone())),
            OperationOutcome::Busy => (None, None),
        };
        Self { status: outcome.as_str(), transaction_hash, error }
    }
}

#[derive(Debug, Serialize)]
pub struct ActionResponse {
    #[serde(skip_serializing_if = "Option::is_none")] outcome: Option<OutcomeBody>,
    view: View,
}

impl ActionResponse {
    fn view(view: View) -> Self { Self { outcome: None, view } }
    fn outcome(outcome: &OperationOutcome, view: View) -> Self { Self { outcome: Some(outcome.into()), view } }
}

pub fn create_router(controller: Arc<SessionController>) -> Router { create_router_with_name(controller, "atm") }

pub fn create_router_with_name(controller: Arc<SessionController>, app_name: &str) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/session", get(session_view))
        .route("/session/init", post(init))
        .route("/session/connect", post(connect))
        .route("/session/balance", post(refresh_balance))
        .route("/session/deposit", post(deposit))
        .route("/session/withdraw", post(withdraw))
        .route("/session/alert", delete(dismiss_alert))
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState::new(controller, app_name))
}

async fn health(State(s): State<AppState>) -> impl IntoResponse {
    Json(json!({"status": "ok", "service": s.app_name, "state": s.controller.state().as_str()}))
}

async fn session_view(State(s): State<AppState>) -> Json<View> { Json(s.controller.view()) }

async fn init(State(s): State<AppState>) -> Json<ActionResponse> {
    s.controller.init().await;
    Json(ActionResponse::view(s.controller.view()))
}

async fn connect(State(s): State<AppState>) -> Json<ActionResponse> {
    s.controller.connect().await;
    Json(ActionResponse::view(s.controller.view()))
}

async fn refresh_balance(State(s): State<AppState>) -> Json<ActionResponse> {
    s.controller.refresh_balance().await;
    Json(ActionResponse::view(s.controller.view()))
}

async fn deposit(State(s): State<AppState>, body: Bytes) -> Result<Json<ActionResponse>, Rejection> {
    let amount = AmountRequest::parse(&body).map_err(unprocessable)?.unwrap_or(s.controller.config().deposit_amount);
    let outcome = s.controller.deposit_amount(amount).await;
    Ok(Json(ActionResponse::outcome(&outcome, s.controller.view())))
}

async fn withdraw(State(s): State<AppState>, body: Bytes) -> Result<Json<ActionResponse>, Rejection> {
    let amount = AmountRequest::parse(&body).map_err(unprocessable)?.unwrap_or(s.controller.config().withdraw_amount);
    let outcome = s.controller.withdraw_amount(amount).await;
    Ok(Json(ActionResponse::outcome(&outcome, s.controller.view())))
}

async fn dismiss_alert(State(s): State<AppState>) -> Json<ActionResponse> {
    s.controller.dismiss_alert();
    Json(ActionResponse::view(s.controller.view()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_or_empty_body_uses_default() {
        assert_eq!(AmountRequest::parse(b"").unwrap(), None);
        assert_eq!(AmountRequest::parse(b" \n").unwrap(), None);
        assert_eq!(AmountRequest::parse(b"{}").unwrap(), None);
        assert_eq!(AmountRequest::parse(b"{\"amount\": null}").unwrap(), None);
    }

    #[test]
    fn amounts_as_number_or_decimal_string() {
        assert_eq!(AmountRequest::parse(br#"{"amount": 50}"#).unwrap(), Some(Units::from(50)));
        let big = "340282366920938463463374607431768211456";
        let parsed = AmountRequest::parse(format!(r#"{{"amount": "{}"}}"#, big).as_bytes()).unwrap();
        assert_eq!(parsed, Some(Units::from(1u8) << 128));
    }

    #[test]
    fn malformed_bodies_are_errors() {
        for body in [r#"{"amount": "abc"}"#, r#"{"amount": -5}"#, r#"{"amount": 2.5}"#, r#"{"amout": 5}"#, "amount=5"] {
            assert!(AmountRequest::parse(body.as_bytes()).is_err(), "{} accepted", body);
        }
    }
}
