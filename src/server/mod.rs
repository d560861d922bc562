//! HTTP surface - the presentation boundary over JSON

mod routes;

pub use routes::{create_router, create_router_with_name, ActionResponse, AmountField, AmountRequest, AppState};
