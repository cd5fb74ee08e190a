use tracing::{debug, info};

use shared_backend::BackendClient;
use shared_config::PortalConfig;
use shared_models::error::AppError;

use crate::models::{GatewayForm, InitiatePaymentRequest, VerifyPaymentRequest, VerifyPaymentResponse};

pub struct PaymentService {
    backend: BackendClient,
}

impl PaymentService {
    pub fn new(config: &PortalConfig) -> Self {
        Self { backend: BackendClient::new(config) }
    }

    /// Asks the backend to sign a gateway form for an unpaid appointment.
    pub async fn initiate(&self, appointment_id: i64, auth_token: &str) -> Result<GatewayForm, AppError> {
        debug!("Initiating payment for appointment {}", appointment_id);

        let form: GatewayForm = self
            .backend
            .post("initiate-payment/", &InitiatePaymentRequest { appointment_id }, Some(auth_token))
            .await?;

        info!("Payment initiated for appointment {}", appointment_id);
        Ok(form)
    }

    pub async fn verify(
        &self,
        request: &VerifyPaymentRequest,
        auth_token: &str,
    ) -> Result<VerifyPaymentResponse, AppError> {
        self.backend.post("verify-payment/", request, Some(auth_token)).await
    }
}
