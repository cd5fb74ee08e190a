use std::sync::Arc;

use axum::{
    extract::{Json, Path, State},
    response::{IntoResponse, Redirect, Response},
};
use tokio::sync::Mutex;
use tracing::error;

use auth_cell::SessionStore;
use payment_cell::handlers::PaymentState;
use shared_models::error::AppError;
use shared_models::route::Route;

use crate::models::{
    AppointmentRow, SelectDayRequest, SelectHospitalRequest, SelectTimeRequest, StartBookingRequest,
};
use crate::services::appointments::AppointmentService;
use crate::services::booking::{BookingFlow, BookingService, BookingStep, DOCTOR_MISSING_MESSAGE};

pub struct BookingState {
    pub booking: BookingService,
    pub flow: Mutex<Option<BookingFlow>>,
    pub payment: Arc<PaymentState>,
}

impl BookingState {
    pub fn new(booking: BookingService, payment: Arc<PaymentState>) -> Self {
        Self {
            booking,
            flow: Mutex::new(None),
            payment,
        }
    }

    /// The booking screen with any pending notices, or back to the
    /// directory when no doctor has been chosen.
    async fn render(&self) -> Response {
        let notices = self.payment.session.notices();
        match self.booking.view(&self.flow).await {
            Some(view) => Json(notices.screen(view)).into_response(),
            None => {
                notices.error(DOCTOR_MISSING_MESSAGE);
                Redirect::to(&Route::Doctors.path()).into_response()
            }
        }
    }

    async fn respond(&self, step: BookingStep) -> Response {
        match step {
            BookingStep::Stay => self.render().await,
            BookingStep::Redirect(route) => Redirect::to(&route.path()).into_response(),
            BookingStep::Gateway(form) => self.payment.gateway_response(&form),
        }
    }

    async fn after_edit(&self, result: Result<(), AppError>) -> Response {
        match result {
            Ok(()) | Err(AppError::NotFound(_)) => self.render().await,
            Err(e) => {
                self.payment.session.notices().error(e.user_message("Invalid selection."));
                self.render().await
            }
        }
    }
}

pub async fn booking_page(State(state): State<Arc<BookingState>>) -> Response {
    state.render().await
}

pub async fn start_booking(
    State(state): State<Arc<BookingState>>,
    Json(request): Json<StartBookingRequest>,
) -> Response {
    let doctor = state.booking.resolve_doctor(request).await;
    let step = state.booking.open(&state.flow, doctor).await;
    state.respond(step).await
}

pub async fn select_hospital(
    State(state): State<Arc<BookingState>>,
    Json(request): Json<SelectHospitalRequest>,
) -> Response {
    let result = state.booking.select_hospital(&state.flow, request.hospital_id).await;
    state.after_edit(result).await
}

pub async fn select_day(
    State(state): State<Arc<BookingState>>,
    Json(request): Json<SelectDayRequest>,
) -> Response {
    let result = state.booking.select_day(&state.flow, &request.day).await;
    state.after_edit(result).await
}

pub async fn select_time(
    State(state): State<Arc<BookingState>>,
    Json(request): Json<SelectTimeRequest>,
) -> Response {
    let result = state.booking.select_time(&state.flow, &request.time).await;
    state.after_edit(result).await
}

pub async fn submit_booking(State(state): State<Arc<BookingState>>) -> Response {
    let step = state.booking.submit(&state.flow).await;
    state.respond(step).await
}

pub async fn retry_payment(State(state): State<Arc<BookingState>>) -> Response {
    let step = state.booking.retry_payment(&state.flow).await;
    state.respond(step).await
}

pub struct AppointmentState {
    pub appointments: Arc<AppointmentService>,
    pub session: Arc<SessionStore>,
}

impl AppointmentState {
    pub fn new(appointments: Arc<AppointmentService>, session: Arc<SessionStore>) -> Self {
        Self { appointments, session }
    }
}

pub async fn my_appointments(State(state): State<Arc<AppointmentState>>) -> Response {
    let notices = state.session.notices();
    let Some(token) = state.session.token().await else {
        return Redirect::to(&Route::Login.path()).into_response();
    };

    let rows: Vec<AppointmentRow> = match state.appointments.my_appointments(&token).await {
        Ok(appointments) => appointments.into_iter().map(AppointmentRow::from).collect(),
        Err(e) => {
            error!("Error fetching appointments: {}", e);
            notices.error("Failed to load your appointments.");
            Vec::new()
        }
    };

    Json(notices.screen(rows)).into_response()
}

pub async fn cancel_appointment(
    State(state): State<Arc<AppointmentState>>,
    Path(appointment_id): Path<i64>,
) -> Redirect {
    let notices = state.session.notices();
    let Some(token) = state.session.token().await else {
        return Redirect::to(&Route::Login.path());
    };

    match state.appointments.cancel(appointment_id, &token).await {
        Ok(message) => notices.success(message),
        Err(e) => {
            error!("Error cancelling appointment {}: {}", appointment_id, e);
            notices.error(e.user_message("Failed to cancel the appointment."));
        }
    }
    Redirect::to(&Route::MyAppointments.path())
}
