use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use shared_models::amount::Amount;
use shared_models::directory::{Doctor, Hospital};

/// Filters accepted by `doctors/`. Unset filters are left off the query string.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DoctorQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specialty: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hospital_id: Option<i64>,
}

impl DoctorQuery {
    pub fn by_specialty(specialty: impl Into<String>) -> Self {
        Self { specialty: Some(specialty.into()), hospital_id: None }
    }

    pub fn by_hospital(hospital_id: i64) -> Self {
        Self { specialty: None, hospital_id: Some(hospital_id) }
    }

    pub fn is_empty(&self) -> bool {
        self.hospital_id.is_none() && self.specialty.as_deref().map_or(true, str::is_empty)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub query: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResults {
    #[serde(default)]
    pub doctors: Vec<Doctor>,
    #[serde(default)]
    pub hospitals: Vec<Hospital>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HospitalDetail {
    pub hospital: Hospital,
    pub doctors: Vec<Doctor>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpecialtyPrediction {
    pub specialty: Option<String>,
    pub reasoning: Option<String>,
    #[serde(default)]
    pub probabilities: HashMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoctorSuggestion {
    pub id: i64,
    pub doctor_name: String,
    pub hospital_name: String,
    pub fees: Amount,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SuggestionResponse {
    #[serde(default)]
    pub doctors: Vec<DoctorSuggestion>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    User,
    Bot,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub from: ChatRole,
    pub text: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}
