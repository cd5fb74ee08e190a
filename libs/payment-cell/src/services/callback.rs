use std::sync::Arc;

use base64::{
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine as _,
};
use tracing::{error, info, warn};

use auth_cell::SessionStore;
use shared_models::error::AppError;

use crate::models::{CallbackOutcome, GatewayReceipt, VerifyPaymentRequest};
use crate::services::gateway::PaymentService;

const STANDARD_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Handles the gateway's return to `/payment-success?data=<base64 json>`.
/// Runs once per callback and never retries verification.
pub struct PaymentCallbackHandler {
    payments: Arc<PaymentService>,
    session: Arc<SessionStore>,
}

impl PaymentCallbackHandler {
    pub fn new(payments: Arc<PaymentService>, session: Arc<SessionStore>) -> Self {
        Self { payments, session }
    }

    pub async fn handle(&self, data: Option<&str>) -> CallbackOutcome {
        let notices = self.session.notices();

        self.session.check_expiry().await;
        let token = match self.session.token().await {
            Some(token) => token,
            None => {
                notices.error("You must be logged in to verify a payment.");
                return CallbackOutcome::LoginRequired;
            }
        };

        let data = match data.map(str::trim).filter(|d| !d.is_empty()) {
            Some(data) => data,
            None => {
                notices.error("Payment data not found.");
                return CallbackOutcome::MissingData;
            }
        };

        let receipt = match decode_receipt(data) {
            Ok(receipt) => receipt,
            Err(e) => {
                error!("Could not decode payment callback: {}", e);
                notices.error("Payment verification failed. Please check your appointments.");
                return CallbackOutcome::Undecodable;
            }
        };

        if !receipt.is_complete() {
            warn!("Gateway reported status {:?}", receipt.status);
            notices.error("Payment was not completed. Please try again.");
            return CallbackOutcome::NotCompleted;
        }

        let request = VerifyPaymentRequest {
            transaction_uuid: receipt.transaction_uuid,
            transaction_code: receipt.transaction_code,
        };

        match self.payments.verify(&request, &token).await {
            Ok(_) => {
                info!("Payment {:?} verified", request.transaction_uuid);
                notices.success("Payment successful! Your appointment is confirmed.");
                CallbackOutcome::Verified
            }
            Err(e) => {
                error!("Payment verification failed: {}", e);
                notices.error(e.user_message("Payment verification failed. Please check your appointments."));
                CallbackOutcome::VerificationFailed
            }
        }
    }
}

/// Decodes the callback payload. Query parsing turns `+` into a space, so
/// spaces are mapped back before decoding.
pub fn decode_receipt(data: &str) -> Result<GatewayReceipt, AppError> {
    let normalized = data.replace(' ', "+");
    let bytes = STANDARD_LENIENT
        .decode(normalized)
        .map_err(|e| AppError::Decode(e.to_string()))?;
    Ok(serde_json::from_slice(&bytes)?)
}
