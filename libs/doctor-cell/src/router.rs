use std::sync::Arc;

use axum::{routing::get, Router};

use crate::handlers::{self, DirectoryState};

pub fn directory_routes(state: Arc<DirectoryState>) -> Router {
    Router::new()
        .route("/doctors", get(handlers::list_doctors))
        .route("/doctors/{specialty}", get(handlers::doctors_by_specialty))
        .route("/hospitals", get(handlers::list_hospitals))
        .route("/hospital/{hospital_id}", get(handlers::hospital_detail))
        .route("/speciality", get(handlers::list_specialties))
        .route("/search", get(handlers::search))
        .route("/chat", get(handlers::chat_transcript).post(handlers::send_chat))
        .with_state(state)
}
