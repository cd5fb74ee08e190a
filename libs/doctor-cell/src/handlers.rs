use std::sync::Arc;

use axum::{
    extract::{Json, Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use tokio::sync::Mutex;
use tracing::{debug, error};

use shared_config::PortalConfig;
use shared_models::directory::{Doctor, Hospital, Specialty};
use shared_models::notice::Screen;
use shared_models::route::Route;
use shared_utils::Notices;

use crate::models::{ChatRequest, DoctorQuery, SearchQuery, SearchResults};
use crate::services::chatbot::{ChatSession, ChatbotService};
use crate::services::directory::DirectoryService;

pub struct DirectoryState {
    pub directory: Arc<DirectoryService>,
    pub chatbot: ChatbotService,
    pub chat: Mutex<ChatSession>,
    pub notices: Notices,
}

impl DirectoryState {
    pub fn new(config: &PortalConfig, directory: Arc<DirectoryService>, notices: Notices) -> Self {
        Self {
            directory,
            chatbot: ChatbotService::new(config),
            chat: Mutex::new(ChatSession::new(&config.currency_symbol)),
            notices,
        }
    }
}

pub async fn list_doctors(
    State(state): State<Arc<DirectoryState>>,
    Query(query): Query<DoctorQuery>,
) -> Json<Screen<Vec<Doctor>>> {
    let fallback = if query.hospital_id.is_some() {
        "Could not load the list of doctors for this hospital."
    } else {
        "Could not load the list of doctors."
    };
    doctors_screen(&state, &query, fallback).await
}

pub async fn doctors_by_specialty(
    State(state): State<Arc<DirectoryState>>,
    Path(specialty): Path<String>,
) -> Json<Screen<Vec<Doctor>>> {
    doctors_screen(&state, &DoctorQuery::by_specialty(specialty), "Could not load the list of doctors.").await
}

async fn doctors_screen(state: &DirectoryState, query: &DoctorQuery, fallback: &str) -> Json<Screen<Vec<Doctor>>> {
    let doctors = state.directory.list_doctors(query, None).await.unwrap_or_else(|e| {
        error!("Failed to fetch doctors: {}", e);
        state.notices.error(fallback);
        Vec::new()
    });
    Json(state.notices.screen(doctors))
}

pub async fn list_hospitals(State(state): State<Arc<DirectoryState>>) -> Json<Screen<Vec<Hospital>>> {
    let hospitals = state.directory.list_hospitals(None).await.unwrap_or_else(|e| {
        error!("Failed to fetch hospitals: {}", e);
        state.notices.error("Could not load the list of hospitals.");
        Vec::new()
    });
    Json(state.notices.screen(hospitals))
}

pub async fn hospital_detail(
    State(state): State<Arc<DirectoryState>>,
    Path(hospital_id): Path<i64>,
) -> Response {
    match state.directory.hospital_detail(hospital_id).await {
        Ok(detail) => Json(state.notices.screen(detail)).into_response(),
        Err(e) => {
            error!("Failed to fetch hospital {}: {}", hospital_id, e);
            state.notices.error(e.user_message("Hospital not found."));
            Redirect::to(&Route::Hospitals.path()).into_response()
        }
    }
}

pub async fn list_specialties(State(state): State<Arc<DirectoryState>>) -> Json<Screen<Vec<Specialty>>> {
    let specialties = state.directory.list_specialties().await.unwrap_or_else(|e| {
        error!("Failed to fetch specialties: {}", e);
        state.notices.error("Could not load specialties.");
        Vec::new()
    });
    Json(state.notices.screen(specialties))
}

pub async fn search(
    State(state): State<Arc<DirectoryState>>,
    Query(query): Query<SearchQuery>,
) -> Json<Screen<SearchResults>> {
    debug!("Searching for {:?}", query.query);
    let results = state.directory.search(&query.query).await.unwrap_or_else(|e| {
        error!("Search failed: {}", e);
        state.notices.error("An error occurred during search.");
        SearchResults::default()
    });
    Json(state.notices.screen(results))
}

pub async fn chat_transcript(State(state): State<Arc<DirectoryState>>) -> Json<ChatSession> {
    Json(state.chat.lock().await.clone())
}

pub async fn send_chat(
    State(state): State<Arc<DirectoryState>>,
    Json(request): Json<ChatRequest>,
) -> Json<ChatSession> {
    let step = state.chat.lock().await.begin(&request.message);

    if let Some(step) = step {
        let reply = state.chatbot.run(step).await;
        state.chat.lock().await.apply(reply);
    }

    Json(state.chat.lock().await.clone())
}
