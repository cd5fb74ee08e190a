use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use tracing::error;

use auth_cell::SessionStore;
use shared_models::route::Route;

use crate::models::{CallbackQuery, GatewayForm};
use crate::services::callback::PaymentCallbackHandler;
use crate::services::gateway::PaymentService;
use crate::services::redirect::GatewayRedirect;

pub struct PaymentState {
    pub payments: Arc<PaymentService>,
    pub callback: PaymentCallbackHandler,
    pub redirect: Arc<dyn GatewayRedirect>,
    pub session: Arc<SessionStore>,
}

impl PaymentState {
    pub fn new(
        payments: Arc<PaymentService>,
        redirect: Arc<dyn GatewayRedirect>,
        session: Arc<SessionStore>,
    ) -> Self {
        Self {
            callback: PaymentCallbackHandler::new(payments.clone(), session.clone()),
            payments,
            redirect,
            session,
        }
    }

    /// Renders the navigation-away page for `form`. A form that cannot be
    /// rendered sends the user back to their appointments.
    pub fn gateway_response(&self, form: &GatewayForm) -> Response {
        match self.redirect.render(form) {
            Ok(html) => Html(html).into_response(),
            Err(e) => {
                error!("Gateway redirect failed: {}", e);
                self.session.notices().error("Could not initiate payment.");
                Redirect::to(&Route::MyAppointments.path()).into_response()
            }
        }
    }
}

pub async fn payment_success(
    State(state): State<Arc<PaymentState>>,
    Query(query): Query<CallbackQuery>,
) -> Redirect {
    let outcome = state.callback.handle(query.data.as_deref()).await;
    Redirect::to(&outcome.redirect().path())
}

pub async fn payment_failure(State(state): State<Arc<PaymentState>>) -> Redirect {
    state.session.notices().error("Payment was not completed. Please try again.");
    Redirect::to(&Route::MyAppointments.path())
}

/// Starts payment for an appointment that was booked but never paid.
pub async fn pay_appointment(
    State(state): State<Arc<PaymentState>>,
    Path(appointment_id): Path<i64>,
) -> Response {
    let Some(token) = state.session.token().await else {
        return Redirect::to(&Route::Login.path()).into_response();
    };

    match state.payments.initiate(appointment_id, &token).await {
        Ok(form) => state.gateway_response(&form),
        Err(e) => {
            error!("Payment initiation for {} failed: {}", appointment_id, e);
            state.session.notices().error(e.user_message("Could not initiate payment."));
            Redirect::to(&Route::MyAppointments.path()).into_response()
        }
    }
}
