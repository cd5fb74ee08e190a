use serde::{Deserialize, Serialize};

/// Claims carried in the payload segment of the backend's access token.
/// Only `exp` is inspected client-side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    pub exp: Option<i64>,
    pub iat: Option<i64>,
    pub user_id: Option<i64>,
    pub token_type: Option<String>,
    pub jti: Option<String>,
}

/// Envelope returned by login, registration and OTP verification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub success: bool,
    pub token: Option<String>,
    pub message: Option<String>,
}
