use std::sync::Arc;

use axum::{
    extract::{Json, State},
    response::{IntoResponse, Redirect, Response},
};
use tracing::debug;

use shared_config::PortalConfig;
use shared_models::notice::Screen;
use shared_models::route::Route;

use crate::models::{LoginRequest, LoginView, RegisterRequest, SessionView, VerifyOtpRequest};
use crate::services::auth::AuthService;
use crate::session::SessionStore;

pub struct AuthState {
    pub config: Arc<PortalConfig>,
    pub session: Arc<SessionStore>,
    pub auth: AuthService,
}

impl AuthState {
    pub fn new(config: Arc<PortalConfig>, session: Arc<SessionStore>) -> Self {
        let auth = AuthService::new(&config, session.clone());
        Self { config, session, auth }
    }
}

fn redirect(route: Route) -> Response {
    Redirect::to(&route.path()).into_response()
}

pub async fn login_page(State(state): State<Arc<AuthState>>) -> Response {
    if let Some(route) = state.auth.already_signed_in().await {
        return redirect(route);
    }
    Json(state.session.notices().screen(LoginView { otp_sent: false, email: None })).into_response()
}

pub async fn login(
    State(state): State<Arc<AuthState>>,
    Json(request): Json<LoginRequest>,
) -> Response {
    match state.auth.login(&request).await {
        Ok(route) => redirect(route),
        Err(e) => {
            debug!("Login did not complete: {}", e);
            redirect(Route::Login)
        }
    }
}

pub async fn register(
    State(state): State<Arc<AuthState>>,
    Json(request): Json<RegisterRequest>,
) -> Json<Screen<LoginView>> {
    let otp_sent = state.auth.register(&request).await.is_ok();
    Json(state.session.notices().screen(LoginView {
        otp_sent,
        email: otp_sent.then(|| request.email.clone()),
    }))
}

pub async fn verify_otp(
    State(state): State<Arc<AuthState>>,
    Json(request): Json<VerifyOtpRequest>,
) -> Response {
    match state.auth.verify_otp(&request).await {
        Ok(route) => redirect(route),
        Err(_) => Json(state.session.notices().screen(LoginView {
            otp_sent: true,
            email: Some(request.email),
        }))
        .into_response(),
    }
}

pub async fn logout(State(state): State<Arc<AuthState>>) -> Response {
    state.session.logout().await;
    redirect(Route::Home)
}

pub async fn session(State(state): State<Arc<AuthState>>) -> Json<Screen<SessionView>> {
    state.session.check_expiry().await;
    let snapshot = state.session.snapshot().await;
    Json(state.session.notices().screen(SessionView {
        is_authenticated: snapshot.is_authenticated,
        loading: snapshot.loading,
        is_admin: snapshot.is_admin(),
        profile: snapshot.profile,
        currency_symbol: state.config.currency_symbol.clone(),
    }))
}
