use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub gender: Option<String>,
    pub birthday: Option<NaiveDate>,
    pub profile_pic: Option<String>,
    #[serde(default)]
    pub is_hospital_admin: bool,
    #[serde(default)]
    pub email_verified: bool,
}

/// `user/profile/` wraps the profile as `{ "success": true, "userData": {...} }`.
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileEnvelope {
    pub success: bool,
    #[serde(rename = "userData")]
    pub user_data: Option<UserProfile>,
}
