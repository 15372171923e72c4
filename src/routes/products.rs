//! Product catalogue pages.

use super::RouteGroup;
use crate::auth::AppState;
use crate::context::RequestContext;
use crate::views::render;
use axum::{extract::Path, response::Response, routing::get, Router};
use serde_json::json;

pub struct ProductRoutes;

impl RouteGroup for ProductRoutes {
    fn name(&self) -> &'static str {
        "products"
    }

    fn routes(&self) -> Router<AppState> {
        Router::new()
            .route("/products", get(index))
            .route("/products/{id}", get(show))
    }
}

/// GET /products
pub async fn index(ctx: RequestContext) -> Response {
    render("products/index", &ctx, json!({ "products": [] }))
}

/// GET /products/{id}
pub async fn show(ctx: RequestContext, Path(id): Path<String>) -> Response {
    render("products/show", &ctx, json!({ "productId": id }))
}
