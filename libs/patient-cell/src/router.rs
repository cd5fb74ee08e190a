use std::sync::Arc;

use axum::{middleware, routing::get, Router};

use auth_cell::guards::require_session;

use crate::handlers::{self, ProfileState};

pub fn profile_routes(state: Arc<ProfileState>) -> Router {
    Router::new()
        .route("/my-profile", get(handlers::my_profile).put(handlers::update_profile))
        .layer(middleware::from_fn_with_state(state.session.clone(), require_session))
        .with_state(state)
}
