use serde::{Deserialize, Serialize};

use shared_models::directory::{Doctor, Hospital};
use shared_models::profile::UserProfile;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyOtpRequest {
    pub email: String,
    pub otp: String,
}

/// Point-in-time copy of the session, handed to guards and views.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SessionSnapshot {
    pub token: Option<String>,
    pub is_authenticated: bool,
    pub loading: bool,
    pub profile: Option<UserProfile>,
    pub doctors: Vec<Doctor>,
    pub hospitals: Vec<Hospital>,
}

impl SessionSnapshot {
    pub fn has_token(&self) -> bool {
        self.token.as_deref().is_some_and(|t| !t.is_empty())
    }

    pub fn is_admin(&self) -> bool {
        self.profile.as_ref().is_some_and(|p| p.is_hospital_admin)
    }

    pub fn doctor(&self, doctor_id: i64) -> Option<&Doctor> {
        self.doctors.iter().find(|d| d.id == doctor_id)
    }
}

/// What the login page shows: the credentials form or the OTP step.
#[derive(Debug, Clone, Serialize)]
pub struct LoginView {
    pub otp_sent: bool,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub is_authenticated: bool,
    pub loading: bool,
    pub is_admin: bool,
    pub profile: Option<UserProfile>,
    pub currency_symbol: String,
}
