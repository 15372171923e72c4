//! Session pipeline and authentication extractors.
//!
//! Every non-static request runs, in order: load session, resolve identity,
//! enrich context, dispatch, persist session.

use super::cookie::{read_session_cookie, session_cookie, verify_signed_cookie};
use super::session::{Persistence, SessionState};
use crate::config::Config;
use crate::context::{self, RequestContext};
use crate::error::AppError;
use crate::flash::FlashCategory;
use crate::models::{now_secs, StoredUser, UserView};
use crate::storage::{SessionStore, StoreError, UserStore};
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub sessions: Arc<dyn SessionStore>,
    pub config: Arc<Config>,
}

/// Handle on the current request's session.
///
/// Handlers use it to log in, log out and push flash messages.
#[derive(Clone)]
pub struct SessionHandle(Arc<Mutex<SessionState>>);

impl SessionHandle {
    pub fn new(state: SessionState) -> Self {
        Self(Arc::new(Mutex::new(state)))
    }

    pub async fn login(&self, user: &StoredUser) {
        self.0.lock().await.login(user);
    }

    pub async fn logout(&self) {
        self.0.lock().await.logout();
    }

    pub async fn flash(&self, category: FlashCategory, message: impl Into<String>) {
        self.0.lock().await.push_flash(category, message);
    }

    /// User id currently referenced by the session.
    pub async fn user_id(&self) -> Option<String> {
        self.0
            .lock()
            .await
            .record
            .identity
            .as_ref()
            .map(|r| r.user_id().to_string())
    }
}

impl<S> FromRequestParts<S> for SessionHandle
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SessionHandle>()
            .cloned()
            .ok_or_else(|| AppError::Internal("Session layer not installed".to_string()))
    }
}

/// Load the session named by the request cookie, or start a new one.
///
/// Store outages and corrupt payloads never fail the request.
pub async fn load_session(state: &AppState, cookie_value: Option<&str>, now: u64) -> SessionState {
    let ttl = state.config.session_ttl_secs;

    let Some(session_id) =
        cookie_value.and_then(|v| verify_signed_cookie(v, &state.config.session_secret))
    else {
        return SessionState::fresh(now, ttl);
    };

    match state.sessions.load(&session_id).await {
        Ok(Some(record)) if record.is_expired(now) => {
            if let Err(e) = state.sessions.destroy(&record.id).await {
                tracing::warn!(action = "session_destroy_failed", error = %e, "Could not remove expired session");
            }
            SessionState::fresh(now, ttl)
        }
        Ok(Some(record)) => SessionState::loaded(record),
        Ok(None) => SessionState::fresh(now, ttl),
        Err(StoreError::Corrupt(e)) => {
            tracing::warn!(action = "session_corrupt", error = %e, "Unreadable session, issuing a new one");
            SessionState::fresh(now, ttl)
        }
        Err(e) => {
            tracing::warn!(action = "session_store_degraded", error = %e, "Session store unavailable, using in-memory session");
            SessionState::in_memory(now, ttl)
        }
    }
}

/// Resolve the session's identity reference to a user view.
///
/// A reference to a deleted user is cleared. A store outage yields an
/// anonymous request but keeps the reference.
pub async fn resolve_identity(state: &AppState, session: &mut SessionState) -> Option<UserView> {
    let user_id = session.record.identity.as_ref()?.user_id().to_string();

    match state.users.get_user(&user_id).await {
        Ok(Some(user)) => Some(user.view()),
        Ok(None) => {
            tracing::info!(action = "stale_identity_cleared", user_id = %user_id, "Session referenced a missing user");
            session.logout();
            None
        }
        Err(e) => {
            tracing::warn!(action = "identity_lookup_failed", error = %e, "Credential store unavailable, treating request as anonymous");
            None
        }
    }
}

/// Write the session back according to its persistence decision.
///
/// Returns true when the client should receive a refreshed cookie.
pub async fn persist_session(state: &AppState, session: &mut SessionState, now: u64) -> bool {
    let config = &state.config;

    if let Some(old_id) = session.replaced_id.take() {
        if let Err(e) = state.sessions.destroy(&old_id).await {
            tracing::warn!(action = "session_destroy_failed", error = %e, "Could not remove rotated session");
        }
    }

    let decision = session.persistence(now, config.session_touch_after_secs);
    if decision == Persistence::Skip {
        return false;
    }

    session.record.mark_persisted(now, config.session_ttl_secs);
    let result = match decision {
        Persistence::Save => state.sessions.save(&session.record).await,
        Persistence::Touch => state.sessions.touch(&session.record).await,
        Persistence::Skip => Ok(()),
    };

    match result {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(action = "session_persist_failed", ?decision, error = %e, "Session write failed");
            false
        }
    }
}

/// Middleware running the session pipeline around the rest of the stack.
pub async fn session_layer(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let now = now_secs();
    let cookie_value = read_session_cookie(request.headers(), &state.config);

    let mut session = load_session(&state, cookie_value.as_deref(), now).await;
    let current_user = resolve_identity(&state, &mut session).await;
    let ctx = context::enrich(&mut session, current_user);

    let handle = SessionHandle::new(session);
    request.extensions_mut().insert(ctx);
    request.extensions_mut().insert(handle.clone());

    let mut response = next.run(request).await;

    let mut session = handle.0.lock().await;
    if persist_session(&state, &mut session, now).await {
        if let Some(value) = session_cookie(&session.record.id, &state.config) {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
    }

    response
}

/// Authenticated user extractor.
///
/// Anonymous requests are redirected to the login page with an error flash.
pub struct CurrentUser(pub UserView);

/// Message flashed when a signed-in user is required.
pub const LOGIN_REQUIRED: &str = "You must be signed in first!";

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let ctx = RequestContext::from_request_parts(parts, state)
            .await
            .map_err(IntoResponse::into_response)?;

        match ctx.current_user {
            Some(user) => Ok(CurrentUser(user)),
            None => {
                let session = SessionHandle::from_request_parts(parts, state)
                    .await
                    .map_err(IntoResponse::into_response)?;
                session.flash(FlashCategory::Error, LOGIN_REQUIRED).await;
                Err(Redirect::to("/login").into_response())
            }
        }
    }
}
