use chrono::NaiveDate;
use tracing::debug;

use shared_backend::BackendClient;
use shared_config::PortalConfig;
use shared_models::error::AppError;

use crate::models::AvailableSlot;

pub struct SlotService {
    backend: BackendClient,
}

impl SlotService {
    pub fn new(config: &PortalConfig) -> Self {
        Self { backend: BackendClient::new(config) }
    }

    /// Unbooked slots for a doctor on one date. An empty list means the
    /// doctor has nothing free that day.
    pub async fn available_slots(&self, doctor_id: i64, date: NaiveDate) -> Result<Vec<AvailableSlot>, AppError> {
        let date = date.format("%Y-%m-%d").to_string();
        debug!("Fetching slots for doctor {} on {}", doctor_id, date);

        let query = [("doctor_id", doctor_id.to_string()), ("date", date)];
        self.backend.get_with_query("available-slots/", &query, None).await
    }
}
