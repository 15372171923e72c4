//! View models.
//!
//! Templates live outside this crate; handlers hand over the template name,
//! the request context and page data as JSON.

use crate::context::RequestContext;
use axum::{
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

/// Render `template` with the request context and `data`.
pub fn render(template: &str, ctx: &RequestContext, data: Value) -> Response {
    Json(json!({
        "view": template,
        "currentUser": ctx.current_user,
        "success": ctx.success,
        "error": ctx.error,
        "data": data,
    }))
    .into_response()
}
