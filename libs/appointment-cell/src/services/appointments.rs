use tracing::{debug, info, warn};

use shared_backend::BackendClient;
use shared_config::PortalConfig;
use shared_models::error::AppError;

use crate::models::{
    BookAppointmentRequest, BookAppointmentResponse, CancelAppointmentRequest, CancelAppointmentResponse,
    PatientAppointment,
};

/// The patient's own appointments: booking, listing and cancelling.
pub struct AppointmentService {
    backend: BackendClient,
    config: PortalConfig,
}

impl AppointmentService {
    pub fn new(config: &PortalConfig) -> Self {
        Self {
            backend: BackendClient::new(config),
            config: config.clone(),
        }
    }

    /// Books a slot and returns the new appointment's id.
    pub async fn book(&self, request: &BookAppointmentRequest, auth_token: &str) -> Result<i64, AppError> {
        info!(
            "Booking doctor {} at hospital {} on {} {}",
            request.doctor_id, request.hospital_id, request.day, request.time
        );

        let response: BookAppointmentResponse = self
            .backend
            .post("book-appointment/", request, Some(auth_token))
            .await?;

        debug!("Booked appointment {}: {:?}", response.appointment_id, response.message);
        Ok(response.appointment_id)
    }

    pub async fn my_appointments(&self, auth_token: &str) -> Result<Vec<PatientAppointment>, AppError> {
        let appointments: Vec<PatientAppointment> = self.backend.get("my-appointments/", Some(auth_token)).await?;

        Ok(appointments
            .into_iter()
            .map(|mut a| {
                a.doctor_photo = a
                    .doctor_photo
                    .filter(|p| !p.is_empty())
                    .map(|p| self.config.media_url(&p));
                a
            })
            .collect())
    }

    /// Cancels an appointment and returns the backend's confirmation text.
    pub async fn cancel(&self, appointment_id: i64, auth_token: &str) -> Result<String, AppError> {
        let response: CancelAppointmentResponse = self
            .backend
            .post("cancel-appointment/", &CancelAppointmentRequest { appointment_id }, Some(auth_token))
            .await?;

        if !response.success {
            warn!("Cancellation of {} refused: {:?}", appointment_id, response.message);
            return Err(AppError::ValidationError(
                response.message.unwrap_or_else(|| "Could not cancel the appointment.".to_string()),
            ));
        }

        info!("Cancelled appointment {}", appointment_id);
        Ok(response.message.unwrap_or_else(|| "Appointment cancelled".to_string()))
    }
}
