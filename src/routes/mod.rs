//! Route groups and the ordered dispatcher.

pub mod auth;
pub mod cart;
pub mod home;
pub mod payment;
pub mod product_api;
pub mod products;
pub mod reviews;

use crate::auth::middleware::{session_layer, AppState, SessionHandle};
use crate::context::RequestContext;
use crate::error::AppError;
use crate::middleware::method_override;
use axum::{
    body::Body,
    extract::Request,
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Router,
};
use std::sync::Arc;
use tower::ServiceExt;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Prefix under which static assets are served, before any session work.
pub const STATIC_PREFIX: &str = "/static";

/// An independently authored set of handlers.
pub trait RouteGroup: Send + Sync {
    fn name(&self) -> &'static str;
    fn routes(&self) -> Router<AppState>;
}

/// Marker set on responses from a group that had no matching route.
#[derive(Debug, Clone, Copy)]
struct Unclaimed;

async fn unclaimed() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Extension(Unclaimed))
}

/// Offers each request to the route groups in order until one claims it.
#[derive(Clone)]
pub struct Dispatcher {
    groups: Arc<Vec<(&'static str, Router)>>,
    body_limit: usize,
}

impl Dispatcher {
    pub fn new(state: &AppState, groups: Vec<Box<dyn RouteGroup>>) -> Self {
        let groups = groups
            .into_iter()
            .map(|group| {
                let router = group
                    .routes()
                    .fallback(unclaimed)
                    .with_state(state.clone());
                (group.name(), router)
            })
            .collect();

        Self {
            groups: Arc::new(groups),
            body_limit: state.config.max_body_bytes,
        }
    }

    /// Group names in dispatch order.
    pub fn order(&self) -> Vec<&'static str> {
        self.groups.iter().map(|(name, _)| *name).collect()
    }

    pub async fn dispatch(&self, request: Request) -> Response {
        let (parts, body) = request.into_parts();
        let bytes = match axum::body::to_bytes(body, self.body_limit).await {
            Ok(bytes) => bytes,
            Err(_) => {
                return AppError::PayloadTooLarge("Request body too large".to_string())
                    .into_response()
            }
        };

        for (name, router) in self.groups.iter() {
            let mut request = Request::new(Body::from(bytes.clone()));
            *request.method_mut() = parts.method.clone();
            *request.uri_mut() = parts.uri.clone();
            *request.version_mut() = parts.version;
            *request.headers_mut() = parts.headers.clone();
            if let Some(ctx) = parts.extensions.get::<RequestContext>() {
                request.extensions_mut().insert(ctx.clone());
            }
            if let Some(session) = parts.extensions.get::<SessionHandle>() {
                request.extensions_mut().insert(session.clone());
            }

            let response = match router.clone().oneshot(request).await {
                Ok(response) => response,
                Err(never) => match never {},
            };
            if response.extensions().get::<Unclaimed>().is_none() {
                tracing::debug!(group = name, path = %parts.uri.path(), "Request claimed");
                return response;
            }
        }

        AppError::NotFound("Page not found".to_string()).into_response()
    }
}

/// Route groups in precedence order.
pub fn default_groups() -> Vec<Box<dyn RouteGroup>> {
    vec![
        Box::new(home::HomeRoutes),
        Box::new(products::ProductRoutes),
        Box::new(reviews::ReviewRoutes),
        Box::new(auth::AuthRoutes),
        Box::new(cart::CartRoutes),
        Box::new(product_api::ProductApiRoutes),
        Box::new(payment::PaymentRoutes),
    ]
}

/// Build the full application:
/// - static assets under [`STATIC_PREFIX`], bypassing sessions
/// - method override, session pipeline, ordered dispatch for everything else
pub fn app(state: AppState, groups: Vec<Box<dyn RouteGroup>>) -> Router {
    let static_dir = state.config.static_dir.clone();
    let dispatcher = Dispatcher::new(&state, groups);

    let pipeline = Router::new()
        .fallback(move |request: Request| {
            let dispatcher = dispatcher.clone();
            async move { dispatcher.dispatch(request).await }
        })
        .layer(axum::middleware::from_fn_with_state(state, session_layer))
        .layer(axum::middleware::from_fn(method_override));

    Router::new()
        .nest_service(STATIC_PREFIX, ServeDir::new(static_dir))
        .fallback_service(pipeline)
        .layer(TraceLayer::new_for_http())
}
