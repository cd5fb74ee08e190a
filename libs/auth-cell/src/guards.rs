use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde_json::json;
use tracing::debug;

use shared_models::notice::Notice;
use shared_models::route::{Access, Route};

use crate::models::SessionSnapshot;
use crate::session::SessionStore;

pub const ADMIN_DENIED_MESSAGE: &str = "You are not authorized to access the admin panel.";

#[derive(Debug, Clone, PartialEq)]
pub enum GuardDecision {
    Render,
    /// Session data is still arriving; show a placeholder, decide later.
    Loading,
    Redirect { to: Route, notice: Option<Notice> },
}

pub fn authorize(access: Access, session: &SessionSnapshot) -> GuardDecision {
    match access {
        Access::Public => GuardDecision::Render,
        Access::Authenticated => {
            if session.has_token() {
                GuardDecision::Render
            } else {
                GuardDecision::Redirect { to: Route::Login, notice: None }
            }
        }
        Access::Admin => {
            if session.loading {
                GuardDecision::Loading
            } else if session.has_token() && session.is_admin() {
                GuardDecision::Render
            } else {
                GuardDecision::Redirect {
                    to: Route::Home,
                    notice: Some(Notice::error(ADMIN_DENIED_MESSAGE)),
                }
            }
        }
    }
}

pub async fn require_session(
    State(session): State<Arc<SessionStore>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    guard(Access::Authenticated, &session, request, next).await
}

pub async fn require_admin(
    State(session): State<Arc<SessionStore>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    guard(Access::Admin, &session, request, next).await
}

async fn guard(access: Access, session: &SessionStore, request: Request<Body>, next: Next) -> Response {
    session.check_expiry().await;
    let snapshot = session.snapshot().await;

    match authorize(access, &snapshot) {
        GuardDecision::Render => next.run(request).await,
        GuardDecision::Loading => (
            StatusCode::ACCEPTED,
            Json(json!({ "loading": true, "message": "Authenticating Admin..." })),
        )
            .into_response(),
        GuardDecision::Redirect { to, notice } => {
            debug!("Guard redirecting {} to {}", request.uri().path(), to);
            if let Some(notice) = notice {
                session.notices().push(notice);
            }
            Redirect::to(&to.path()).into_response()
        }
    }
}
