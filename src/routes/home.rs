//! Landing page.

use super::RouteGroup;
use crate::auth::AppState;
use crate::context::RequestContext;
use crate::views::render;
use axum::{response::Response, routing::get, Router};
use serde_json::json;

pub struct HomeRoutes;

impl RouteGroup for HomeRoutes {
    fn name(&self) -> &'static str {
        "home"
    }

    fn routes(&self) -> Router<AppState> {
        Router::new().route("/", get(home))
    }
}

/// GET /
pub async fn home(ctx: RequestContext) -> Response {
    render("home", &ctx, json!({}))
}
