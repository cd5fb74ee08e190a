use serde::Serialize;
use serde_json::json;
use tracing::{debug, warn};

use shared_backend::BackendClient;
use shared_config::PortalConfig;
use shared_models::error::AppError;

use crate::models::{
    ChatMessage, ChatRole, DoctorSuggestion, SpecialtyPrediction, SuggestionResponse,
};

pub const GREETING: &str = "Hi! How can I assist you today?";
const UNKNOWN_SPECIALTY: &str = "Sorry, I couldn't determine the specialty.";
const PREDICTION_FAILED: &str = "Oops! Something went wrong. Please try again.";
const NO_DOCTORS: &str = "Sorry, no doctors found for this specialty.";
const SUGGESTION_FAILED: &str = "Something went wrong while fetching doctors.";

pub struct ChatbotService {
    backend: BackendClient,
}

/// The backend call a chat turn needs.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatStep {
    Predict(String),
    Suggest(String),
}

#[derive(Debug)]
pub enum ChatReply {
    Prediction(Result<SpecialtyPrediction, AppError>),
    Suggestions(Result<Vec<DoctorSuggestion>, AppError>),
}

impl ChatbotService {
    pub fn new(config: &PortalConfig) -> Self {
        Self { backend: BackendClient::new(config) }
    }

    pub async fn predict_specialty(&self, symptom: &str) -> Result<SpecialtyPrediction, AppError> {
        debug!("Predicting specialty");
        self.backend
            .post("predict-specialty/", &json!({ "symptom": symptom }), None)
            .await
    }

    pub async fn suggest_doctors(&self, specialty: &str) -> Result<Vec<DoctorSuggestion>, AppError> {
        let response: SuggestionResponse = self
            .backend
            .post("suggest-doctor/", &json!({ "specialty": specialty }), None)
            .await?;
        Ok(response.doctors)
    }

    pub async fn run(&self, step: ChatStep) -> ChatReply {
        match step {
            ChatStep::Predict(symptom) => ChatReply::Prediction(self.predict_specialty(&symptom).await),
            ChatStep::Suggest(specialty) => ChatReply::Suggestions(self.suggest_doctors(&specialty).await),
        }
    }
}

/// One symptom-checker conversation. A turn is split into [`begin`] and
/// [`apply`] so callers can release their lock while the backend answers.
///
/// [`begin`]: ChatSession::begin
/// [`apply`]: ChatSession::apply
#[derive(Debug, Clone, Serialize)]
pub struct ChatSession {
    messages: Vec<ChatMessage>,
    pending_specialty: Option<String>,
    suggestions: Vec<DoctorSuggestion>,
    #[serde(skip)]
    currency_symbol: String,
}

impl ChatSession {
    pub fn new(currency_symbol: &str) -> Self {
        Self {
            messages: vec![ChatMessage { from: ChatRole::Bot, text: GREETING.to_string() }],
            pending_specialty: None,
            suggestions: Vec::new(),
            currency_symbol: currency_symbol.to_string(),
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn pending_specialty(&self) -> Option<&str> {
        self.pending_specialty.as_deref()
    }

    pub fn suggestions(&self) -> &[DoctorSuggestion] {
        &self.suggestions
    }

    /// Records the user's message and decides what to ask the backend.
    /// Blank input is ignored.
    pub fn begin(&mut self, input: &str) -> Option<ChatStep> {
        let input = input.trim();
        if input.is_empty() {
            return None;
        }
        self.messages.push(ChatMessage { from: ChatRole::User, text: input.to_string() });

        if input.to_lowercase().contains("yes") {
            if let Some(specialty) = self.pending_specialty.take() {
                return Some(ChatStep::Suggest(specialty));
            }
        }
        Some(ChatStep::Predict(input.to_string()))
    }

    pub fn apply(&mut self, reply: ChatReply) {
        let text = match reply {
            ChatReply::Prediction(Ok(SpecialtyPrediction { specialty: Some(specialty), reasoning, .. })) => {
                let text = format!(
                    "Based on your symptoms, you may need {}.\n\n{}\n\nWould you like me to suggest a doctor for this specialty? (yes/no)",
                    specialty,
                    reasoning.unwrap_or_default()
                );
                self.pending_specialty = Some(specialty);
                text
            }
            ChatReply::Prediction(Ok(_)) | ChatReply::Prediction(Err(AppError::Backend { .. })) => {
                UNKNOWN_SPECIALTY.to_string()
            }
            ChatReply::Prediction(Err(e)) => {
                warn!("Specialty prediction failed: {}", e);
                PREDICTION_FAILED.to_string()
            }
            ChatReply::Suggestions(Ok(doctors)) if !doctors.is_empty() => {
                let text = doctors
                    .iter()
                    .map(|d| {
                        format!(
                            "Dr. {}\n{}\nFees: {} {}",
                            d.doctor_name, d.hospital_name, self.currency_symbol, d.fees
                        )
                    })
                    .collect::<Vec<_>>()
                    .join("\n\n");
                self.suggestions = doctors;
                text
            }
            ChatReply::Suggestions(Ok(_)) | ChatReply::Suggestions(Err(AppError::Backend { .. })) => {
                NO_DOCTORS.to_string()
            }
            ChatReply::Suggestions(Err(e)) => {
                warn!("Doctor suggestion failed: {}", e);
                SUGGESTION_FAILED.to_string()
            }
        };

        self.messages.push(ChatMessage { from: ChatRole::Bot, text });
    }

    pub async fn send(&mut self, service: &ChatbotService, input: &str) {
        if let Some(step) = self.begin(input) {
            let reply = service.run(step).await;
            self.apply(reply);
        }
    }
}
