//! HTTP method override for HTML forms.
//!
//! Browsers only submit GET and POST. A POST carrying `?_method=PUT`,
//! `PATCH` or `DELETE` is rewritten to that method before dispatch.

use axum::{
    extract::Request,
    http::Method,
    middleware::Next,
    response::Response,
};

/// Query parameter naming the intended method.
const OVERRIDE_PARAM: &str = "_method";

fn override_method(query: &str) -> Option<Method> {
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == OVERRIDE_PARAM)
        .and_then(|(_, value)| match value.to_ascii_uppercase().as_str() {
            "PUT" => Some(Method::PUT),
            "PATCH" => Some(Method::PATCH),
            "DELETE" => Some(Method::DELETE),
            _ => None,
        })
}

/// Middleware rewriting overridden POST requests.
///
/// # Usage
///
/// ```rust,no_run
/// use axum::Router;
/// use axum::middleware;
/// use storefront::middleware::method_override;
///
/// let app: Router = Router::new()
///     .layer(middleware::from_fn(method_override));
/// ```
pub async fn method_override(mut request: Request, next: Next) -> Response {
    if request.method() == Method::POST {
        if let Some(method) = request.uri().query().and_then(override_method) {
            tracing::trace!(%method, "Method override");
            *request.method_mut() = method;
        }
    }
    next.run(request).await
}
