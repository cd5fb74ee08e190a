use async_trait::async_trait;
use reqwest::{multipart::Form, Method};
use tracing::{debug, info};

use auth_cell::ProfileLoader;
use shared_backend::BackendClient;
use shared_config::PortalConfig;
use shared_models::error::AppError;
use shared_models::profile::{ProfileEnvelope, UserProfile};

use crate::models::{ProfileUpdateRequest, ProfileUpdateResponse};

pub struct ProfileService {
    backend: BackendClient,
    config: PortalConfig,
}

impl ProfileService {
    pub fn new(config: &PortalConfig) -> Self {
        Self {
            backend: BackendClient::new(config),
            config: config.clone(),
        }
    }

    pub async fn get_profile(&self, auth_token: &str) -> Result<UserProfile, AppError> {
        debug!("Fetching user profile");

        let envelope: ProfileEnvelope = self.backend.get("user/profile/", Some(auth_token)).await?;
        let mut profile = match envelope.user_data {
            Some(profile) if envelope.success => profile,
            _ => return Err(AppError::Decode("Invalid user profile response".to_string())),
        };

        profile.profile_pic = profile
            .profile_pic
            .filter(|p| !p.is_empty())
            .map(|p| self.config.media_url(&p));

        Ok(profile)
    }

    /// Sends the edited fields as multipart, with the picture when one was chosen.
    pub async fn update_profile(
        &self,
        auth_token: &str,
        request: &ProfileUpdateRequest,
    ) -> Result<(), AppError> {
        let mut form = Form::new()
            .text("phone", request.phone.clone())
            .text("address", request.address.clone())
            .text("gender", request.gender.clone())
            .text("birthday", request.birthday.clone());

        if let Some(picture) = &request.profile_pic {
            form = form.part("profile_pic", picture.into_part()?);
        }

        let response: ProfileUpdateResponse = self
            .backend
            .multipart(Method::PUT, "user/profile/", form, Some(auth_token))
            .await?;

        if !response.success {
            return Err(AppError::ValidationError(
                response.message.unwrap_or_else(|| "Profile update rejected".to_string()),
            ));
        }

        info!("Profile updated");
        Ok(())
    }
}

#[async_trait]
impl ProfileLoader for ProfileService {
    async fn load_profile(&self, token: &str) -> Result<UserProfile, AppError> {
        self.get_profile(token).await
    }
}
