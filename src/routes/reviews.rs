//! Product reviews.

use super::RouteGroup;
use crate::auth::{AppState, CurrentUser, SessionHandle};
use crate::error::AppError;
use crate::flash::FlashCategory;
use axum::{
    extract::Path,
    response::{IntoResponse, Redirect, Response},
    routing::post,
    Form, Router,
};
use serde::Deserialize;

pub struct ReviewRoutes;

impl RouteGroup for ReviewRoutes {
    fn name(&self) -> &'static str {
        "reviews"
    }

    fn routes(&self) -> Router<AppState> {
        Router::new().route("/products/{id}/review", post(create_review))
    }
}

#[derive(Debug, Deserialize)]
pub struct ReviewForm {
    pub rating: u8,
    #[serde(default)]
    pub body: String,
}

pub const REVIEW_ADDED: &str = "Added your review successfully";

/// POST /products/{id}/review
pub async fn create_review(
    CurrentUser(user): CurrentUser,
    session: SessionHandle,
    Path(id): Path<String>,
    Form(form): Form<ReviewForm>,
) -> Result<Response, AppError> {
    if !(1..=5).contains(&form.rating) {
        return Err(AppError::BadRequest("Rating must be between 1 and 5".to_string()));
    }
    if form.body.len() > 2000 {
        return Err(AppError::BadRequest("Review is too long".to_string()));
    }

    tracing::info!(action = "review_added", user_id = %user.id, product_id = %id, rating = form.rating, "Review added");
    session.flash(FlashCategory::Success, REVIEW_ADDED).await;
    Ok(Redirect::to(&format!("/products/{}", id)).into_response())
}
