use std::sync::Arc;

use axum::{
    extract::{Json, Path, State},
    response::{IntoResponse, Redirect, Response},
};
use tokio::sync::Mutex;
use tracing::error;

use auth_cell::SessionStore;
use shared_config::PortalConfig;
use shared_models::directory::Doctor;
use shared_models::error::AppError;
use shared_models::notice::Screen;
use shared_models::route::{AdminRoute, Route};

use crate::models::{
    AddExistingDoctorRequest, AppointmentFilters, BoardView, DashboardView, DoctorManagementView, NewDoctorRequest,
    ScheduleView, StatusChange,
};
use crate::services::appointments::{AdminAppointmentService, AppointmentBoard, BoardService};
use crate::services::dashboard::DashboardService;
use crate::services::doctors::DoctorAdminService;
use crate::services::schedule::{ScheduleEditor, ScheduleService};

pub struct AdminState {
    pub board_service: BoardService,
    pub board: Mutex<AppointmentBoard>,
    pub schedules: ScheduleService,
    pub editor: Mutex<Option<ScheduleEditor>>,
    pub dashboard: DashboardService,
    pub doctors: DoctorAdminService,
    pub session: Arc<SessionStore>,
}

impl AdminState {
    pub fn new(config: &PortalConfig, session: Arc<SessionStore>) -> Self {
        Self {
            board_service: BoardService::new(Arc::new(AdminAppointmentService::new(config)), session.clone()),
            board: Mutex::new(AppointmentBoard::new()),
            schedules: ScheduleService::new(config),
            editor: Mutex::new(None),
            dashboard: DashboardService::new(config),
            doctors: DoctorAdminService::new(config),
            session,
        }
    }

    fn screen<T>(&self, view: T) -> Json<Screen<T>> {
        Json(self.session.notices().screen(view))
    }

    async fn board_screen(&self) -> Response {
        let view: BoardView = self.board.lock().await.view();
        self.screen(view).into_response()
    }
}

fn to_login() -> Response {
    Redirect::to(&Route::Login.path()).into_response()
}

pub async fn admin_home() -> Redirect {
    Redirect::to(&Route::Admin(AdminRoute::Dashboard).path())
}

pub async fn dashboard(State(state): State<Arc<AdminState>>) -> Response {
    let Some(token) = state.session.token().await else {
        return to_login();
    };

    let view: Option<DashboardView> = match state.dashboard.load(&token).await {
        Ok(view) => Some(view),
        Err(e) => {
            error!("Failed to fetch dashboard data: {}", e);
            state.session.notices().error("Could not load dashboard data.");
            None
        }
    };
    state.screen(view).into_response()
}

pub async fn appointments_board(State(state): State<Arc<AdminState>>) -> Response {
    let Some(token) = state.session.token().await else {
        return to_login();
    };
    state.board_service.load(&state.board, &token).await;
    state.board_screen().await
}

pub async fn filter_appointments(
    State(state): State<Arc<AdminState>>,
    Json(filters): Json<AppointmentFilters>,
) -> Response {
    let Some(token) = state.session.token().await else {
        return to_login();
    };
    state.board_service.filter(&state.board, filters, &token).await;
    state.board_screen().await
}

pub async fn change_status(
    State(state): State<Arc<AdminState>>,
    Path(appointment_id): Path<i64>,
    Json(change): Json<StatusChange>,
) -> Response {
    let Some(token) = state.session.token().await else {
        return to_login();
    };
    state
        .board_service
        .change_status(&state.board, appointment_id, change.status, &token)
        .await;
    state.board_screen().await
}

pub async fn reconcile_appointments(State(state): State<Arc<AdminState>>) -> Response {
    let Some(token) = state.session.token().await else {
        return to_login();
    };
    state.board_service.reconcile(&state.board, &token).await;
    state.board_screen().await
}

async fn management_screen(state: &AdminState, token: &str) -> Response {
    let view = state.doctors.management_view(token).await.unwrap_or_else(|e| {
        error!("Failed to load doctor management data: {}", e);
        state.session.notices().error("Could not load necessary data.");
        DoctorManagementView::default()
    });
    state.screen(view).into_response()
}

pub async fn doctor_management(State(state): State<Arc<AdminState>>) -> Response {
    let Some(token) = state.session.token().await else {
        return to_login();
    };
    management_screen(&state, &token).await
}

pub async fn create_doctor(
    State(state): State<Arc<AdminState>>,
    Json(request): Json<NewDoctorRequest>,
) -> Response {
    let Some(token) = state.session.token().await else {
        return to_login();
    };

    match state.doctors.create_doctor(&request, &token).await {
        Ok(message) => state.session.notices().success(message),
        Err(e) => {
            error!("Failed to create doctor: {}", e);
            state.session.notices().error(e.user_message("Failed to create doctor."));
        }
    }
    management_screen(&state, &token).await
}

/// Adds an unassigned doctor, then reloads the unassigned list.
pub async fn add_existing_doctor(
    State(state): State<Arc<AdminState>>,
    Json(request): Json<AddExistingDoctorRequest>,
) -> Response {
    let Some(token) = state.session.token().await else {
        return to_login();
    };

    match state.doctors.add_existing(&request, &token).await {
        Ok(message) => state.session.notices().success(message),
        Err(e) => {
            error!("Failed to add doctor {}: {}", request.doctor_id, e);
            state.session.notices().error(e.user_message("Failed to add doctor."));
        }
    }
    management_screen(&state, &token).await
}

pub async fn my_doctors(State(state): State<Arc<AdminState>>) -> Response {
    let Some(token) = state.session.token().await else {
        return to_login();
    };

    let doctors: Vec<Doctor> = state.doctors.my_doctors(&token).await.unwrap_or_else(|e| {
        error!("Failed to fetch hospital doctors: {}", e);
        state.session.notices().error("Could not load your hospital's doctors list.");
        Vec::new()
    });
    state.screen(doctors).into_response()
}

pub async fn schedule_page(State(state): State<Arc<AdminState>>, Path(doctor_id): Path<i64>) -> Response {
    let Some(token) = state.session.token().await else {
        return to_login();
    };

    let view: Option<ScheduleView> = match state.schedules.load(doctor_id, &token).await {
        Ok(editor) => {
            let view = editor.view();
            *state.editor.lock().await = Some(editor);
            Some(view)
        }
        Err(e) => {
            error!("Failed to load schedule for doctor {}: {}", doctor_id, e);
            state.session.notices().error("Could not load doctor's schedule.");
            None
        }
    };
    state.screen(view).into_response()
}

enum Toggle {
    Day,
    Time,
}

async fn toggle(state: &AdminState, doctor_id: i64, option_id: i64, kind: Toggle) -> Result<Response, AppError> {
    let mut guard = state.editor.lock().await;
    let editor = guard
        .as_mut()
        .filter(|e| e.doctor_id() == doctor_id)
        .ok_or_else(|| AppError::NotFound(format!("No schedule loaded for doctor {}", doctor_id)))?;

    let toggled = match kind {
        Toggle::Day => editor.toggle_day(option_id),
        Toggle::Time => editor.toggle_time(option_id),
    };
    if toggled.is_none() {
        return Err(AppError::ValidationError(format!("Unknown schedule option {}", option_id)));
    }

    let view = editor.view();
    drop(guard);
    Ok(state.screen(view).into_response())
}

pub async fn toggle_day(
    State(state): State<Arc<AdminState>>,
    Path((doctor_id, day_id)): Path<(i64, i64)>,
) -> Result<Response, AppError> {
    toggle(&state, doctor_id, day_id, Toggle::Day).await
}

pub async fn toggle_time(
    State(state): State<Arc<AdminState>>,
    Path((doctor_id, time_id)): Path<(i64, i64)>,
) -> Result<Response, AppError> {
    toggle(&state, doctor_id, time_id, Toggle::Time).await
}

/// Saves the full selection and returns to the doctors page.
pub async fn save_schedule(
    State(state): State<Arc<AdminState>>,
    Path(doctor_id): Path<i64>,
) -> Result<Response, AppError> {
    let Some(token) = state.session.token().await else {
        return Ok(to_login());
    };

    let (update, view) = {
        let guard = state.editor.lock().await;
        let editor = guard
            .as_ref()
            .filter(|e| e.doctor_id() == doctor_id)
            .ok_or_else(|| AppError::NotFound(format!("No schedule loaded for doctor {}", doctor_id)))?;
        (editor.to_update(), editor.view())
    };

    match state.schedules.save(doctor_id, &update, &token).await {
        Ok(()) => {
            state.session.notices().success("Schedule updated successfully!");
            Ok(Redirect::to(&Route::Admin(AdminRoute::Doctors).path()).into_response())
        }
        Err(e) => {
            error!("Failed to save schedule for doctor {}: {}", doctor_id, e);
            state.session.notices().error("Failed to update schedule.");
            Ok(state.screen(view).into_response())
        }
    }
}
