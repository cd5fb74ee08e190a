use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::{self, AuthState};

pub fn auth_routes(state: Arc<AuthState>) -> Router {
    Router::new()
        .route("/login", get(handlers::login_page).post(handlers::login))
        .route("/register", post(handlers::register))
        .route("/verify-otp", post(handlers::verify_otp))
        .route("/logout", post(handlers::logout))
        .route("/session", get(handlers::session))
        .with_state(state)
}
