use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use auth_cell::guards::require_admin;

use crate::handlers::{self, AdminState};

pub fn admin_routes(state: Arc<AdminState>) -> Router {
    Router::new()
        .route("/admin", get(handlers::admin_home))
        .route("/admin/dashboard", get(handlers::dashboard))
        .route("/admin/appointments", get(handlers::appointments_board))
        .route("/admin/appointments/filters", post(handlers::filter_appointments))
        .route("/admin/appointments/reconcile", post(handlers::reconcile_appointments))
        .route("/admin/appointments/{appointment_id}/status", post(handlers::change_status))
        .route("/admin/doctors", get(handlers::doctor_management).post(handlers::create_doctor))
        .route("/admin/doctors/existing", post(handlers::add_existing_doctor))
        .route("/admin/doctors-manage", get(handlers::my_doctors))
        .route(
            "/admin/doctors/{doctor_id}/schedule",
            get(handlers::schedule_page).put(handlers::save_schedule),
        )
        .route("/admin/doctors/{doctor_id}/schedule/days/{day_id}", post(handlers::toggle_day))
        .route("/admin/doctors/{doctor_id}/schedule/times/{time_id}", post(handlers::toggle_time))
        .layer(middleware::from_fn_with_state(state.session.clone(), require_admin))
        .with_state(state)
}
