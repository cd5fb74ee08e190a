use std::sync::Arc;

use axum::extract::{Json, State};
use tracing::error;

use auth_cell::SessionStore;
use shared_models::notice::Screen;

use crate::models::{ProfileUpdateRequest, ProfileView};
use crate::services::profile::ProfileService;

pub struct ProfileState {
    pub profiles: Arc<ProfileService>,
    pub session: Arc<SessionStore>,
}

async fn profile_screen(state: &ProfileState) -> Json<Screen<ProfileView>> {
    let profile = state.session.snapshot().await.profile;
    let form = profile
        .as_ref()
        .map(ProfileUpdateRequest::from_profile)
        .unwrap_or_default();
    Json(state.session.notices().screen(ProfileView { profile, form }))
}

pub async fn my_profile(State(state): State<Arc<ProfileState>>) -> Json<Screen<ProfileView>> {
    profile_screen(&state).await
}

pub async fn update_profile(
    State(state): State<Arc<ProfileState>>,
    Json(request): Json<ProfileUpdateRequest>,
) -> Json<Screen<ProfileView>> {
    let notices = state.session.notices();

    match state.session.token().await {
        Some(token) => match state.profiles.update_profile(&token, &request).await {
            Ok(()) => {
                notices.success("Profile updated successfully!");
                if let Err(e) = state.session.reload_profile().await {
                    error!("Profile reload after update failed: {}", e);
                }
            }
            Err(e) => {
                error!("Profile update failed: {}", e);
                notices.error("Failed to update profile. Please try again.");
            }
        },
        None => notices.error("Failed to update profile. Please try again."),
    }

    profile_screen(&state).await
}
