//! JSON product API.

use super::RouteGroup;
use crate::auth::AppState;
use crate::context::RequestContext;
use crate::error::AppError;
use axum::{extract::Path, routing::post, Json, Router};
use serde_json::{json, Value};

pub struct ProductApiRoutes;

impl RouteGroup for ProductApiRoutes {
    fn name(&self) -> &'static str {
        "product_api"
    }

    fn routes(&self) -> Router<AppState> {
        Router::new().route("/api/products/{id}/like", post(like_product))
    }
}

/// POST /api/products/{id}/like
///
/// API clients get a 401 instead of the login redirect.
pub async fn like_product(
    ctx: RequestContext,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let user = ctx
        .current_user
        .ok_or_else(|| AppError::Unauthorized("Please login first".to_string()))?;

    tracing::debug!(action = "product_liked", user_id = %user.id, product_id = %id, "Product liked");
    Ok(Json(json!({ "liked": id })))
}
