use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use auth_cell::guards::require_session;

use crate::handlers::{self, AppointmentState, BookingState};

pub fn appointment_routes(booking: Arc<BookingState>, appointments: Arc<AppointmentState>) -> Router {
    // Booking is public; submit sends anonymous visitors to the login page.
    let booking_routes = Router::new()
        .route("/book-appointment", get(handlers::booking_page).post(handlers::start_booking))
        .route("/book-appointment/hospital", post(handlers::select_hospital))
        .route("/book-appointment/day", post(handlers::select_day))
        .route("/book-appointment/time", post(handlers::select_time))
        .route("/book-appointment/submit", post(handlers::submit_booking))
        .route("/book-appointment/retry-payment", post(handlers::retry_payment))
        .with_state(booking);

    let patient_routes = Router::new()
        .route("/my-appointments", get(handlers::my_appointments))
        .route("/my-appointments/{appointment_id}/cancel", post(handlers::cancel_appointment))
        .layer(middleware::from_fn_with_state(appointments.session.clone(), require_session))
        .with_state(appointments);

    Router::new().merge(booking_routes).merge(patient_routes)
}
