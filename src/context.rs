//! Per-request rendering context.

use crate::auth::session::SessionState;
use crate::error::AppError;
use crate::flash::{self, FlashCategory};
use crate::models::UserView;
use axum::{extract::FromRequestParts, http::request::Parts};
use serde::Serialize;

/// Current user and flash messages for this request. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestContext {
    pub current_user: Option<UserView>,
    pub success: Vec<String>,
    pub error: Vec<String>,
}

impl RequestContext {
    pub fn is_authenticated(&self) -> bool {
        self.current_user.is_some()
    }

    /// True when the current user is `owner_id`.
    pub fn owns(&self, owner_id: &str) -> bool {
        self.current_user
            .as_ref()
            .is_some_and(|user| user.id == owner_id)
    }
}

/// Build the context for this request, draining pending flash messages.
///
/// This is the only place flash messages are drained.
pub fn enrich(session: &mut SessionState, current_user: Option<UserView>) -> RequestContext {
    let success = flash::drain(&mut session.record, FlashCategory::Success);
    let error = flash::drain(&mut session.record, FlashCategory::Error);
    if !success.is_empty() || !error.is_empty() {
        session.dirty = true;
    }

    RequestContext {
        current_user,
        success,
        error,
    }
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestContext>()
            .cloned()
            .ok_or_else(|| AppError::Internal("Request context missing".to_string()))
    }
}
