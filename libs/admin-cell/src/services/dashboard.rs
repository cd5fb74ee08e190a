use shared_backend::BackendClient;
use shared_config::PortalConfig;
use shared_models::error::AppError;

use crate::models::{DashboardCharts, DashboardStats, DashboardView};

pub struct DashboardService {
    backend: BackendClient,
}

impl DashboardService {
    pub fn new(config: &PortalConfig) -> Self {
        Self { backend: BackendClient::new(config) }
    }

    /// Counters and chart datasets, fetched together.
    pub async fn load(&self, auth_token: &str) -> Result<DashboardView, AppError> {
        let (stats, charts) = tokio::try_join!(
            self.backend.get::<DashboardStats>("admin/dashboard-stats/", Some(auth_token)),
            self.backend.get::<DashboardCharts>("admin/dashboard-charts/", Some(auth_token)),
        )?;
        Ok(DashboardView { stats, charts })
    }
}
