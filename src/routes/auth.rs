//! Login and logout.

use super::RouteGroup;
use crate::auth::{authenticate, AppState, AuthError, SessionHandle, INVALID_CREDENTIALS};
use crate::context::RequestContext;
use crate::flash::FlashCategory;
use crate::models::LoginForm;
use crate::views::render;
use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Form, Router,
};
use serde_json::json;
use zeroize::Zeroizing;

pub struct AuthRoutes;

impl RouteGroup for AuthRoutes {
    fn name(&self) -> &'static str {
        "auth"
    }

    fn routes(&self) -> Router<AppState> {
        Router::new()
            .route("/login", get(login_page).post(login))
            .route("/logout", get(logout).post(logout))
    }
}

pub const WELCOME_BACK: &str = "Welcome back!";
pub const GOODBYE: &str = "Goodbye!";
pub const LOGIN_UNAVAILABLE: &str = "Sign in is temporarily unavailable, please try again";

/// GET /login
pub async fn login_page(ctx: RequestContext) -> Response {
    render("auth/login", &ctx, json!({}))
}

/// POST /login
pub async fn login(
    State(state): State<AppState>,
    session: SessionHandle,
    Form(form): Form<LoginForm>,
) -> Response {
    let username = form.username;
    let password = Zeroizing::new(form.password);

    match authenticate(state.users.as_ref(), &username, &password).await {
        Ok(user) => {
            session.login(&user).await;
            session.flash(FlashCategory::Success, WELCOME_BACK).await;
            tracing::info!(action = "login", user_id = %user.id, "User logged in");
            Redirect::to("/products").into_response()
        }
        Err(AuthError::InvalidCredentials) => {
            tracing::warn!(action = "auth_failed", username = %username, "Login failed");
            session.flash(FlashCategory::Error, INVALID_CREDENTIALS).await;
            Redirect::to("/login").into_response()
        }
        Err(e) => {
            tracing::error!(action = "auth_error", error = %e, "Login could not be checked");
            session.flash(FlashCategory::Error, LOGIN_UNAVAILABLE).await;
            Redirect::to("/login").into_response()
        }
    }
}

/// POST /logout, also reachable as GET.
pub async fn logout(session: SessionHandle) -> Response {
    if let Some(user_id) = session.user_id().await {
        tracing::info!(action = "logout", user_id = %user_id, "User logged out");
    }
    session.logout().await;
    session.flash(FlashCategory::Success, GOODBYE).await;
    Redirect::to("/products").into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::register;
    use crate::auth::middleware::LOGIN_REQUIRED;
    use crate::routes::test_support::*;
    use crate::routes::{app, default_groups};
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use tower::ServiceExt;

    fn form_post(uri: &str, body: &str, cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::empty()).unwrap()
    }

    fn location(response: &Response) -> &str {
        response.headers()[header::LOCATION].to_str().unwrap()
    }

    #[tokio::test]
    async fn test_login_then_home_shows_user() {
        let (state, users, sessions) = test_state();
        register(&users, "alice", "correct horse", None).await.unwrap();
        let app = app(state, default_groups());

        let response = app
            .clone()
            .oneshot(form_post("/login", "username=alice&password=correct+horse", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/products");
        assert_eq!(sessions.writes(), 1);
        let cookie = session_cookie(&response).unwrap();

        let response = app.oneshot(get("/", Some(&cookie))).await.unwrap();
        let body = json_body(response).await;
        assert_eq!(body["currentUser"]["username"], "alice");
        assert_eq!(body["success"][0], WELCOME_BACK);
    }

    #[tokio::test]
    async fn test_failed_login_messages_match() {
        let (state, users, _) = test_state();
        register(&users, "alice", "correct horse", None).await.unwrap();
        let app = app(state, default_groups());

        let mut messages = Vec::new();
        for body in ["username=alice&password=wrong", "username=nobody&password=wrong"] {
            let response = app.clone().oneshot(form_post("/login", body, None)).await.unwrap();
            assert_eq!(location(&response), "/login");
            let cookie = session_cookie(&response).unwrap();

            let page = app.clone().oneshot(get("/login", Some(&cookie))).await.unwrap();
            let page = json_body(page).await;
            assert!(page["currentUser"].is_null());
            messages.push(page["error"].clone());
        }

        assert_eq!(messages[0], messages[1]);
        assert_eq!(messages[0][0], INVALID_CREDENTIALS);
    }

    #[tokio::test]
    async fn test_login_with_users_offline_flashes_error() {
        let (state, users, _) = test_state();
        users.set_offline(true);
        let app = app(state, default_groups());

        let response = app
            .clone()
            .oneshot(form_post("/login", "username=alice&password=x", None))
            .await
            .unwrap();
        assert_eq!(location(&response), "/login");
        let cookie = session_cookie(&response).unwrap();

        let page = json_body(app.oneshot(get("/login", Some(&cookie))).await.unwrap()).await;
        assert_eq!(page["error"][0], LOGIN_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_logout_keeps_session() {
        let (state, users, sessions) = test_state();
        register(&users, "alice", "pw-123456", None).await.unwrap();
        let app = app(state, default_groups());

        let response = app
            .clone()
            .oneshot(form_post("/login", "username=alice&password=pw-123456", None))
            .await
            .unwrap();
        let cookie = session_cookie(&response).unwrap();

        let response = app
            .clone()
            .oneshot(form_post("/logout", "", Some(&cookie)))
            .await
            .unwrap();
        assert_eq!(location(&response), "/products");
        assert_eq!(session_cookie(&response).as_deref(), Some(cookie.as_str()));
        assert_eq!(sessions.len(), 1);

        let page = json_body(app.oneshot(get("/", Some(&cookie))).await.unwrap()).await;
        assert!(page["currentUser"].is_null());
        assert_eq!(page["success"][0], GOODBYE);
    }

    #[tokio::test]
    async fn test_protected_route_redirects_to_login() {
        let (state, _, _) = test_state();
        let app = app(state, default_groups());

        let response = app.clone().oneshot(get("/user/cart", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/login");
        let cookie = session_cookie(&response).unwrap();

        let page = json_body(app.oneshot(get("/login", Some(&cookie))).await.unwrap()).await;
        assert_eq!(page["error"][0], LOGIN_REQUIRED);
    }
}
