//! Shopping cart.

use super::RouteGroup;
use crate::auth::{AppState, CurrentUser, SessionHandle};
use crate::context::RequestContext;
use crate::error::AppError;
use crate::flash::FlashCategory;
use crate::views::render;
use axum::{
    extract::Path,
    response::{IntoResponse, Redirect, Response},
    routing::{delete, get, post},
    Router,
};
use serde_json::json;

pub struct CartRoutes;

impl RouteGroup for CartRoutes {
    fn name(&self) -> &'static str {
        "cart"
    }

    fn routes(&self) -> Router<AppState> {
        Router::new()
            .route("/user/cart", get(show_cart))
            .route("/user/{id}/add", post(add_to_cart))
            .route("/users/{user_id}/cart", delete(clear_cart))
    }
}

/// GET /user/cart
pub async fn show_cart(CurrentUser(user): CurrentUser, ctx: RequestContext) -> Response {
    render("cart/cart", &ctx, json!({ "owner": user.id, "items": [] }))
}

/// POST /user/{id}/add
pub async fn add_to_cart(
    CurrentUser(user): CurrentUser,
    session: SessionHandle,
    Path(product_id): Path<String>,
) -> Response {
    tracing::debug!(action = "cart_add", user_id = %user.id, product_id = %product_id, "Added to cart");
    session
        .flash(FlashCategory::Success, "Added product to your cart")
        .await;
    Redirect::to("/user/cart").into_response()
}

/// DELETE /users/{user_id}/cart
///
/// Forms reach this with `POST ...?_method=DELETE`. Only the owner may clear a cart.
pub async fn clear_cart(
    CurrentUser(_): CurrentUser,
    ctx: RequestContext,
    session: SessionHandle,
    Path(user_id): Path<String>,
) -> Result<Response, AppError> {
    if !ctx.owns(&user_id) {
        tracing::warn!(action = "cart_forbidden", owner_id = %user_id, "Cart access denied");
        return Err(AppError::Forbidden("You can only change your own cart".to_string()));
    }

    session.flash(FlashCategory::Success, "Your cart is empty").await;
    Ok(Redirect::to("/user/cart").into_response())
}
