use std::sync::Arc;
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use base64::{Engine as _, engine::general_purpose};
use serde_json::json;
use uuid::Uuid;

use shared_config::PortalConfig;

pub struct TestConfig {
    pub backend_url: String,
    pub jwt_secret: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            backend_url: "http://localhost:8000/api/".to_string(),
            jwt_secret: "test-secret-key-for-jwt-signing-must-be-long-enough".to_string(),
        }
    }
}

impl TestConfig {
    /// Config pointing at a wiremock server, with the `/api/` prefix the
    /// real backend mounts its routes under.
    pub fn for_mock_server(uri: &str) -> Self {
        Self {
            backend_url: format!("{}/api/", uri),
            ..Self::default()
        }
    }

    pub fn to_portal_config(&self) -> PortalConfig {
        PortalConfig::new(&self.backend_url)
    }

    pub fn to_arc(&self) -> Arc<PortalConfig> {
        Arc::new(self.to_portal_config())
    }
}

pub struct TestUser {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub is_hospital_admin: bool,
}

impl Default for TestUser {
    fn default() -> Self {
        Self {
            id: 1,
            name: "Test Patient".to_string(),
            email: "patient@example.com".to_string(),
            is_hospital_admin: false,
        }
    }
}

impl TestUser {
    pub fn patient(email: &str) -> Self {
        Self {
            email: email.to_string(),
            ..Self::default()
        }
    }

    pub fn admin(email: &str) -> Self {
        Self {
            id: 2,
            name: "Hospital Admin".to_string(),
            email: email.to_string(),
            is_hospital_admin: true,
        }
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    pub fn create_test_token(user: &TestUser, secret: &str, exp_hours: Option<i64>) -> String {
        Self::create_token_expiring_in(user, secret, exp_hours.unwrap_or(24) * 3600)
    }

    /// Token whose `exp` lies `seconds` from now.
    pub fn create_token_expiring_in(user: &TestUser, secret: &str, seconds: i64) -> String {
        let now = Utc::now();
        let exp = now + Duration::seconds(seconds);

        let header = json!({
            "alg": "HS256",
            "typ": "JWT"
        });

        let payload = json!({
            "token_type": "access",
            "user_id": user.id,
            "jti": Uuid::new_v4().simple().to_string(),
            "iat": now.timestamp(),
            "exp": exp.timestamp()
        });

        Self::sign(&header, &payload, secret)
    }

    pub fn create_expired_token(user: &TestUser, secret: &str) -> String {
        Self::create_test_token(user, secret, Some(-1))
    }

    pub fn create_token_without_exp(user: &TestUser, secret: &str) -> String {
        let header = json!({ "alg": "HS256", "typ": "JWT" });
        let payload = json!({ "token_type": "access", "user_id": user.id });
        Self::sign(&header, &payload, secret)
    }

    pub fn create_malformed_token() -> String {
        "invalid.token.format".to_string()
    }

    fn sign(header: &serde_json::Value, payload: &serde_json::Value, secret: &str) -> String {
        let header_encoded = general_purpose::URL_SAFE_NO_PAD.encode(header.to_string());
        let payload_encoded = general_purpose::URL_SAFE_NO_PAD.encode(payload.to_string());

        let signing_input = format!("{}.{}", header_encoded, payload_encoded);

        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(signing_input.as_bytes());
        let signature = mac.finalize().into_bytes();
        let signature_encoded = general_purpose::URL_SAFE_NO_PAD.encode(signature);

        format!("{}.{}", signing_input, signature_encoded)
    }
}

pub struct MockBackendResponses;

impl MockBackendResponses {
    pub fn profile_response(user: &TestUser) -> serde_json::Value {
        json!({
            "success": true,
            "userData": {
                "email": user.email,
                "name": user.name,
                "is_hospital_admin": user.is_hospital_admin,
                "phone": "9800000000",
                "address": "Kathmandu",
                "gender": "Other",
                "birthday": "1990-01-01",
                "profile_pic": "/media/profile_pics/test.png",
                "email_verified": true
            }
        })
    }

    pub fn doctor_response(id: i64, name: &str, days: &[&str]) -> serde_json::Value {
        json!({
            "id": id,
            "name": name,
            "specialty": "Cardiology",
            "photo": "/media/doctors/test.png",
            "about": "Experienced cardiologist",
            "fees": "800.00",
            "hospitals": [
                { "hospital_id": 10, "hospital_name": "City Hospital", "opd_charge": "500.00" },
                { "hospital_id": 11, "hospital_name": "Valley Clinic", "opd_charge": "650.00" }
            ],
            "available_days": days,
            "available_times": ["09:00:00", "10:00:00"]
        })
    }

    pub fn hospital_response(id: i64, name: &str) -> serde_json::Value {
        json!({
            "id": id,
            "name": name,
            "location": "Kathmandu",
            "description": "General hospital",
            "phone_number": "01-4000000",
            "email": "info@hospital.example",
            "website": null,
            "logo": "/media/hospital_logos/logo.png",
            "doctors": []
        })
    }

    pub fn slot_response(id: i64, time: &str) -> serde_json::Value {
        json!({ "id": id, "time": time })
    }

    pub fn admin_appointment_response(id: i64, status: &str, paid: bool) -> serde_json::Value {
        json!({
            "id": id,
            "patient": { "id": 1, "first_name": "Test", "last_name": "Patient", "email": "patient@example.com" },
            "doctor": { "id": 3, "name": "Dr. Heart" },
            "hospital": "City Hospital",
            "appointment_datetime": "2024-06-10T09:00:00Z",
            "status": status,
            "payment_status": paid,
            "payment_method": if paid { json!("eSewa") } else { json!(null) },
            "payment_amount": if paid { "500.00" } else { "0.00" }
        })
    }

    pub fn error_response(message: &str) -> serde_json::Value {
        json!({ "error": message })
    }
}
