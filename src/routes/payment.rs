//! Checkout.

use super::RouteGroup;
use crate::auth::{AppState, CurrentUser};
use crate::context::RequestContext;
use crate::views::render;
use axum::{response::Response, routing::post, Router};
use serde_json::json;

pub struct PaymentRoutes;

impl RouteGroup for PaymentRoutes {
    fn name(&self) -> &'static str {
        "payment"
    }

    fn routes(&self) -> Router<AppState> {
        Router::new().route("/payment", post(checkout))
    }
}

/// POST /payment
pub async fn checkout(CurrentUser(user): CurrentUser, ctx: RequestContext) -> Response {
    render("payment/checkout", &ctx, json!({ "customer": user.username }))
}
