use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

use shared_models::directory::{Doctor, Hospital};
use shared_models::error::AppError;
use shared_models::notice::Notice;
use shared_models::profile::UserProfile;
use shared_utils::jwt::is_token_expired;
use shared_utils::Notices;

use crate::models::SessionSnapshot;
use crate::storage::TokenStorage;

pub const SESSION_EXPIRED_MESSAGE: &str = "Session expired. Please log in again.";

/// Fetches the signed-in user's profile.
#[async_trait]
pub trait ProfileLoader: Send + Sync {
    async fn load_profile(&self, token: &str) -> Result<UserProfile, AppError>;
}

/// Fetches the doctor and hospital lists cached on the session.
#[async_trait]
pub trait ReferenceDataLoader: Send + Sync {
    async fn load_doctors(&self, token: Option<&str>) -> Result<Vec<Doctor>, AppError>;
    async fn load_hospitals(&self, token: Option<&str>) -> Result<Vec<Hospital>, AppError>;
}

#[derive(Default)]
struct SessionState {
    token: String,
    profile: Option<UserProfile>,
    doctors: Vec<Doctor>,
    hospitals: Vec<Hospital>,
    loading: bool,
    /// Bumped on every token change; loads tagged with an older value are dropped.
    generation: u64,
}

impl SessionState {
    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            token: (!self.token.is_empty()).then(|| self.token.clone()),
            is_authenticated: !self.token.is_empty(),
            loading: self.loading,
            profile: self.profile.clone(),
            doctors: self.doctors.clone(),
            hospitals: self.hospitals.clone(),
        }
    }
}

/// Process-wide session: the bearer token plus the data loaded for it.
///
/// Every mutation goes through this type. Readers get [`SessionSnapshot`]
/// copies and never hold the lock across a backend call.
pub struct SessionStore {
    state: RwLock<SessionState>,
    /// Serializes token persistence so storage and state change in the same order.
    writer: Mutex<()>,
    storage: Arc<dyn TokenStorage>,
    profiles: Arc<dyn ProfileLoader>,
    reference: Arc<dyn ReferenceDataLoader>,
    notices: Notices,
}

impl SessionStore {
    pub fn new(
        storage: Arc<dyn TokenStorage>,
        profiles: Arc<dyn ProfileLoader>,
        reference: Arc<dyn ReferenceDataLoader>,
        notices: Notices,
    ) -> Self {
        Self {
            state: RwLock::new(SessionState {
                loading: true,
                ..SessionState::default()
            }),
            writer: Mutex::new(()),
            storage,
            profiles,
            reference,
            notices,
        }
    }

    pub fn notices(&self) -> &Notices {
        &self.notices
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        self.state.read().await.snapshot()
    }

    pub async fn token(&self) -> Option<String> {
        let state = self.state.read().await;
        (!state.token.is_empty()).then(|| state.token.clone())
    }

    /// Reads the persisted token at start-up and loads the session for it.
    pub async fn restore(&self) -> SessionSnapshot {
        let stored = match self.storage.load().await {
            Ok(token) => token.unwrap_or_default(),
            Err(e) => {
                error!("Failed to read stored token: {}", e);
                String::new()
            }
        };

        let generation = {
            let mut state = self.state.write().await;
            state.token = stored;
            state.loading = true;
            state.generation += 1;
            state.generation
        };
        debug!("Restoring session (generation {})", generation);

        self.on_token_change(generation).await;
        self.snapshot().await
    }

    /// Replaces the token. An empty value signs the user out.
    pub async fn set_token(&self, value: &str) -> SessionSnapshot {
        let generation = {
            let _writer = self.writer.lock().await;

            let persisted = if value.is_empty() {
                self.storage.clear().await
            } else {
                self.storage.save(value).await
            };
            if let Err(e) = persisted {
                error!("Failed to persist token: {}", e);
            }

            let mut state = self.state.write().await;
            state.token = value.to_string();
            if value.is_empty() {
                state.profile = None;
            }
            state.loading = true;
            state.generation += 1;
            state.generation
        };

        self.on_token_change(generation).await;
        self.snapshot().await
    }

    pub async fn logout(&self) {
        self.set_token("").await;
        info!("User logged out");
        self.notices.info("Logged out successfully");
    }

    /// Clears the session if its token has expired since it was set.
    /// Returns `true` when the session was cleared.
    pub async fn check_expiry(&self) -> bool {
        let token = match self.token().await {
            Some(token) => token,
            None => return false,
        };
        if !is_token_expired(&token) {
            return false;
        }
        self.expire(&token, Notice::warning(SESSION_EXPIRED_MESSAGE)).await
    }

    /// Re-fetches the profile after it has been edited.
    pub async fn reload_profile(&self) -> Result<UserProfile, AppError> {
        let (token, generation) = {
            let state = self.state.read().await;
            (state.token.clone(), state.generation)
        };
        if token.is_empty() {
            return Err(AppError::Auth("Not logged in".to_string()));
        }

        match self.profiles.load_profile(&token).await {
            Ok(profile) => {
                let mut state = self.state.write().await;
                if state.generation == generation {
                    state.profile = Some(profile.clone());
                }
                Ok(profile)
            }
            Err(e) => {
                error!("Failed to reload profile: {}", e);
                self.expire(&token, Notice::error(SESSION_EXPIRED_MESSAGE)).await;
                Err(e)
            }
        }
    }

    /// Drops the session for `token` unless it was already replaced, then
    /// raises `notice`.
    async fn expire(&self, token: &str, notice: Notice) -> bool {
        let _writer = self.writer.lock().await;
        if self.state.read().await.token != token {
            return false;
        }

        warn!("Session token rejected or expired, signing out");
        if let Err(e) = self.storage.clear().await {
            error!("Failed to clear stored token: {}", e);
        }

        let mut state = self.state.write().await;
        state.token.clear();
        state.profile = None;
        state.doctors.clear();
        state.hospitals.clear();
        state.loading = false;
        state.generation += 1;
        drop(state);

        self.notices.push(notice);
        true
    }

    async fn on_token_change(&self, generation: u64) {
        let token = self.state.read().await.token.clone();

        if token.is_empty() {
            let mut state = self.state.write().await;
            if state.generation == generation {
                state.profile = None;
                state.doctors.clear();
                state.hospitals.clear();
                state.loading = false;
            }
            return;
        }

        if is_token_expired(&token) {
            self.expire(&token, Notice::warning(SESSION_EXPIRED_MESSAGE)).await;
            return;
        }

        let (profile, doctors, hospitals) = tokio::join!(
            self.profiles.load_profile(&token),
            self.reference.load_doctors(Some(&token)),
            self.reference.load_hospitals(Some(&token)),
        );

        {
            let mut state = self.state.write().await;
            if state.generation != generation {
                debug!("Discarding session data for superseded generation {}", generation);
                return;
            }

            match doctors {
                Ok(doctors) => state.doctors = doctors,
                Err(e) => {
                    error!("Error loading doctors: {}", e);
                    self.notices.error(e.user_message("Error fetching doctors"));
                }
            }
            match hospitals {
                Ok(hospitals) => state.hospitals = hospitals,
                Err(e) => {
                    error!("Error loading hospitals: {}", e);
                    self.notices.error("Error fetching hospitals");
                }
            }

            if let Ok(profile) = &profile {
                info!("Session loaded for {}", profile.email);
                state.profile = Some(profile.clone());
                state.loading = false;
                return;
            }
        }

        if let Err(e) = profile {
            error!("Failed to load user profile: {}", e);
            self.expire(&token, Notice::error(SESSION_EXPIRED_MESSAGE)).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::storage::MemoryTokenStorage;
    use shared_utils::test_utils::{JwtTestUtils, TestConfig, TestUser};

    struct FixedProfile(Option<UserProfile>);

    #[async_trait]
    impl ProfileLoader for FixedProfile {
        async fn load_profile(&self, _token: &str) -> Result<UserProfile, AppError> {
            self.0
                .clone()
                .ok_or(AppError::Backend { status: 401, message: None })
        }
    }

    struct NoReference;

    #[async_trait]
    impl ReferenceDataLoader for NoReference {
        async fn load_doctors(&self, _token: Option<&str>) -> Result<Vec<Doctor>, AppError> {
            Ok(Vec::new())
        }

        async fn load_hospitals(&self, _token: Option<&str>) -> Result<Vec<Hospital>, AppError> {
            Ok(Vec::new())
        }
    }

    fn profile() -> UserProfile {
        serde_json::from_value(serde_json::json!({
            "name": "Test Patient",
            "email": "patient@example.com",
            "is_hospital_admin": false
        }))
        .unwrap()
    }

    fn store(profile: Option<UserProfile>, storage: Arc<MemoryTokenStorage>) -> SessionStore {
        SessionStore::new(
            storage,
            Arc::new(FixedProfile(profile)),
            Arc::new(NoReference),
            Notices::new(),
        )
    }

    #[tokio::test]
    async fn starts_loading_until_restored() {
        let session = store(None, Arc::new(MemoryTokenStorage::new()));
        assert!(session.snapshot().await.loading);

        let restored = session.restore().await;
        assert!(!restored.loading);
        assert!(!restored.is_authenticated);
    }

    #[tokio::test]
    async fn expired_token_is_cleared_on_restore() {
        let secret = TestConfig::default().jwt_secret;
        let expired = JwtTestUtils::create_expired_token(&TestUser::default(), &secret);
        let storage = Arc::new(MemoryTokenStorage::with_token(&expired));
        let session = store(Some(profile()), storage.clone());

        let snapshot = session.restore().await;

        assert!(!snapshot.is_authenticated);
        assert!(snapshot.profile.is_none());
        assert!(!snapshot.loading);
        assert_eq!(storage.load().await.unwrap(), None);
        assert_eq!(session.notices().drain(), vec![Notice::warning(SESSION_EXPIRED_MESSAGE)]);
    }

    #[tokio::test]
    async fn profile_failure_signs_out() {
        let secret = TestConfig::default().jwt_secret;
        let token = JwtTestUtils::create_test_token(&TestUser::default(), &secret, Some(1));
        let storage = Arc::new(MemoryTokenStorage::new());
        let session = store(None, storage.clone());

        let snapshot = session.set_token(&token).await;

        assert!(!snapshot.is_authenticated);
        assert_eq!(storage.load().await.unwrap(), None);
        assert_eq!(session.notices().drain(), vec![Notice::error(SESSION_EXPIRED_MESSAGE)]);
    }

    #[tokio::test]
    async fn token_expiring_after_sign_in_is_cleared_on_next_check() {
        let secret = TestConfig::default().jwt_secret;
        let token = JwtTestUtils::create_token_expiring_in(&TestUser::default(), &secret, 2);
        let storage = Arc::new(MemoryTokenStorage::new());
        let session = store(Some(profile()), storage.clone());

        assert!(session.set_token(&token).await.is_authenticated);
        assert!(!session.check_expiry().await);

        tokio::time::sleep(Duration::from_millis(2100)).await;

        assert!(session.check_expiry().await);
        assert!(!session.snapshot().await.is_authenticated);
        assert_eq!(storage.load().await.unwrap(), None);
        assert_eq!(session.notices().drain(), vec![Notice::warning(SESSION_EXPIRED_MESSAGE)]);
    }

    #[tokio::test]
    async fn valid_token_loads_profile_and_persists() {
        let secret = TestConfig::default().jwt_secret;
        let token = JwtTestUtils::create_test_token(&TestUser::default(), &secret, Some(1));
        let storage = Arc::new(MemoryTokenStorage::new());
        let session = store(Some(profile()), storage.clone());

        let snapshot = session.set_token(&token).await;

        assert!(snapshot.is_authenticated);
        assert_eq!(snapshot.profile.map(|p| p.email).as_deref(), Some("patient@example.com"));
        assert_eq!(storage.load().await.unwrap(), Some(token));

        session.logout().await;
        assert!(!session.snapshot().await.is_authenticated);
        assert_eq!(session.notices().drain(), vec![Notice::info("Logged out successfully")]);
    }
}
