use std::sync::Arc;

use tracing::{debug, info, warn};

use shared_backend::BackendClient;
use shared_config::PortalConfig;
use shared_models::auth::AuthResponse;
use shared_models::error::AppError;
use shared_models::route::{AdminRoute, Route};

use crate::models::{LoginRequest, RegisterRequest, SessionSnapshot, VerifyOtpRequest};
use crate::session::SessionStore;

pub struct AuthService {
    backend: BackendClient,
    session: Arc<SessionStore>,
}

impl AuthService {
    pub fn new(config: &PortalConfig, session: Arc<SessionStore>) -> Self {
        Self {
            backend: BackendClient::new(config),
            session,
        }
    }

    /// Where a signed-in user lands instead of the login page.
    pub async fn already_signed_in(&self) -> Option<Route> {
        let snapshot = self.session.snapshot().await;
        if !snapshot.has_token() || snapshot.profile.is_none() {
            return None;
        }
        self.session.notices().info("You are already logged in.");
        Some(landing_route(&snapshot))
    }

    pub async fn login(&self, request: &LoginRequest) -> Result<Route, AppError> {
        debug!("Logging in {}", request.email);

        let response: AuthResponse = self
            .backend
            .post("user/login/", request, None)
            .await
            .inspect_err(|e| self.session.notices().error(e.user_message("Login failed.")))?;

        let token = self.accept(response, "Login failed.")?;
        let snapshot = self.session.set_token(&token).await;
        if !snapshot.is_authenticated {
            return Err(AppError::SessionExpired);
        }

        info!("User {} logged in", request.email);
        self.session.notices().success("Logged in successfully!");
        Ok(landing_route(&snapshot))
    }

    /// Starts sign-up; the backend mails a one-time code.
    pub async fn register(&self, request: &RegisterRequest) -> Result<(), AppError> {
        let response: AuthResponse = self
            .backend
            .post("user/register/", request, None)
            .await
            .inspect_err(|e| self.session.notices().error(e.user_message("Failed to send OTP.")))?;

        if !response.success {
            let message = response.message.unwrap_or_else(|| "Failed to send OTP.".to_string());
            self.session.notices().error(message.clone());
            return Err(AppError::ValidationError(message));
        }

        self.session
            .notices()
            .info(response.message.unwrap_or_else(|| "OTP sent to your email.".to_string()));
        Ok(())
    }

    pub async fn verify_otp(&self, request: &VerifyOtpRequest) -> Result<Route, AppError> {
        let response: AuthResponse = self
            .backend
            .post("user/verify-otp/", request, None)
            .await
            .inspect_err(|e| self.session.notices().error(e.user_message("OTP verification failed.")))?;

        let token = self.accept(response, "OTP verification failed.")?;
        let snapshot = self.session.set_token(&token).await;
        if !snapshot.is_authenticated {
            return Err(AppError::SessionExpired);
        }

        info!("Account created for {}", request.email);
        self.session.notices().success("Account created successfully!");
        Ok(Route::Home)
    }

    fn accept(&self, response: AuthResponse, fallback: &str) -> Result<String, AppError> {
        match response.token.filter(|t| response.success && !t.is_empty()) {
            Some(token) => Ok(token),
            None => {
                let message = response.message.unwrap_or_else(|| fallback.to_string());
                warn!("Authentication rejected: {}", message);
                self.session.notices().error(message.clone());
                Err(AppError::Auth(message))
            }
        }
    }
}

fn landing_route(snapshot: &SessionSnapshot) -> Route {
    if snapshot.is_admin() {
        Route::Admin(AdminRoute::Dashboard)
    } else {
        Route::Home
    }
}
