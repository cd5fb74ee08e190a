use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use shared_models::amount::Amount;
use shared_models::route::Route;

/// Where to send the browser to pay: the gateway URL and the signed fields
/// to post to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayForm {
    pub esewa_url: String,
    #[serde(default)]
    pub form_data: BTreeMap<String, Value>,
}

impl GatewayForm {
    /// Form fields as strings, in a stable order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, String)> {
        self.form_data.iter().map(|(name, value)| {
            let value = match value {
                Value::String(s) => s.clone(),
                Value::Null => String::new(),
                other => other.to_string(),
            };
            (name.as_str(), value)
        })
    }
}

/// The gateway's base64 JSON callback payload.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayReceipt {
    #[serde(default)]
    pub status: Option<String>,
    pub transaction_uuid: Option<String>,
    pub transaction_code: Option<String>,
    pub total_amount: Option<Amount>,
    pub product_code: Option<String>,
    pub signed_field_names: Option<String>,
    pub signature: Option<String>,
}

impl GatewayReceipt {
    pub fn is_complete(&self) -> bool {
        self.status.as_deref() == Some("COMPLETE")
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct InitiatePaymentRequest {
    pub appointment_id: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct VerifyPaymentRequest {
    pub transaction_uuid: Option<String>,
    pub transaction_code: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VerifyPaymentResponse {
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackQuery {
    pub data: Option<String>,
}

/// How a gateway callback ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackOutcome {
    LoginRequired,
    MissingData,
    Undecodable,
    NotCompleted,
    Verified,
    VerificationFailed,
}

impl CallbackOutcome {
    pub fn redirect(&self) -> Route {
        match self {
            CallbackOutcome::LoginRequired => Route::Login,
            CallbackOutcome::MissingData => Route::Home,
            CallbackOutcome::Undecodable
            | CallbackOutcome::NotCompleted
            | CallbackOutcome::Verified
            | CallbackOutcome::VerificationFailed => Route::MyAppointments,
        }
    }
}
