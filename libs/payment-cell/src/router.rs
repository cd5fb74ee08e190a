use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use auth_cell::guards::require_session;

use crate::handlers::{self, PaymentState};

pub fn payment_routes(state: Arc<PaymentState>) -> Router {
    // The callback checks the session itself so it can explain why it
    // bounced the user.
    let public_routes = Router::new()
        .route("/payment-success", get(handlers::payment_success))
        .route("/payment-failure", get(handlers::payment_failure));

    let protected_routes = Router::new()
        .route("/my-appointments/{appointment_id}/pay", post(handlers::pay_appointment))
        .layer(middleware::from_fn_with_state(state.session.clone(), require_session));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
