use serde::{Deserialize, Serialize};

use shared_backend::ImageUpload;
use shared_models::profile::UserProfile;

/// Editable profile fields. Name and email are owned by the account and
/// cannot be changed here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileUpdateRequest {
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub gender: String,
    /// `YYYY-MM-DD`, or empty when unset.
    #[serde(default)]
    pub birthday: String,
    pub profile_pic: Option<ImageUpload>,
}

impl ProfileUpdateRequest {
    /// Pre-fills the form from the current profile.
    pub fn from_profile(profile: &UserProfile) -> Self {
        Self {
            phone: profile.phone.clone().unwrap_or_default(),
            address: profile.address.clone().unwrap_or_default(),
            gender: profile.gender.clone().unwrap_or_default(),
            birthday: profile.birthday.map(|d| d.to_string()).unwrap_or_default(),
            profile_pic: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProfileUpdateResponse {
    #[serde(default)]
    pub success: bool,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfileView {
    pub profile: Option<UserProfile>,
    pub form: ProfileUpdateRequest,
}
