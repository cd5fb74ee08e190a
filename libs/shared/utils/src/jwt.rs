use base64::{
    alphabet,
    engine::{general_purpose::{GeneralPurpose, GeneralPurposeConfig}, DecodePaddingMode},
    Engine,
};
use chrono::{DateTime, TimeZone, Utc};
use tracing::debug;

use shared_models::auth::TokenClaims;
use shared_models::error::AppError;

/// base64url that accepts payload segments with or without `=` padding.
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Decodes the payload segment of a `header.payload.signature` token.
/// The signature is not checked; the backend remains the authority.
pub fn decode_claims(token: &str) -> Result<TokenClaims, AppError> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err(AppError::Decode("Invalid token format".to_string()));
    }

    let claims_bytes = URL_SAFE_LENIENT
        .decode(parts[1])
        .map_err(|e| AppError::Decode(format!("Invalid claims encoding: {}", e)))?;

    let claims: TokenClaims = serde_json::from_slice(&claims_bytes)
        .map_err(|e| AppError::Decode(format!("Invalid claims format: {}", e)))?;

    Ok(claims)
}

/// Expiry instant of a token, if it can be decoded and carries `exp`.
pub fn expires_at(token: &str) -> Option<DateTime<Utc>> {
    let exp = decode_claims(token).ok()?.exp?;
    Utc.timestamp_opt(exp, 0).single()
}

pub fn is_token_expired(token: &str) -> bool {
    is_token_expired_at(token, Utc::now().timestamp())
}

/// Fail-closed expiry check: an empty, malformed or `exp`-less token counts
/// as expired, and so does one whose `exp` is at or before `now`.
pub fn is_token_expired_at(token: &str, now: i64) -> bool {
    if token.is_empty() {
        return true;
    }

    match decode_claims(token) {
        Ok(TokenClaims { exp: Some(exp), .. }) => {
            if now >= exp {
                debug!("Token expired at {} (now: {})", exp, now);
                true
            } else {
                false
            }
        }
        Ok(_) => {
            debug!("Token has no exp claim");
            true
        }
        Err(e) => {
            debug!("Failed to decode token: {}", e);
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use serde_json::json;

    fn token_with_payload(payload: serde_json::Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(json!({"alg": "HS256", "typ": "JWT"}).to_string());
        let body = URL_SAFE_NO_PAD.encode(payload.to_string());
        format!("{}.{}.signature", header, body)
    }

    #[test]
    fn non_three_segment_tokens_are_expired() {
        assert!(is_token_expired("abc"));
        assert!(is_token_expired("a.b"));
        assert!(is_token_expired("a.b.c.d"));
        assert!(is_token_expired(""));
    }

    #[test]
    fn missing_exp_is_expired() {
        let token = token_with_payload(json!({"user_id": 4}));
        assert!(is_token_expired_at(&token, 0));
    }

    #[test]
    fn garbage_payload_is_expired() {
        assert!(is_token_expired_at("x.%%%.y", 0));
        let not_json = format!("x.{}.y", URL_SAFE_NO_PAD.encode("not json"));
        assert!(is_token_expired_at(&not_json, 0));
        assert_matches!(decode_claims("only.two"), Err(AppError::Decode(_)));
        assert_matches!(decode_claims(&not_json), Err(AppError::Decode(_)));
    }

    #[test]
    fn exp_is_compared_against_now() {
        let token = token_with_payload(json!({"exp": 1_000, "user_id": 1}));
        assert!(!is_token_expired_at(&token, 999));
        assert!(is_token_expired_at(&token, 1_000));
        assert!(is_token_expired_at(&token, 5_000));
    }

    #[test]
    fn padded_payloads_decode() {
        let header = URL_SAFE_NO_PAD.encode("{}");
        let body = base64::engine::general_purpose::URL_SAFE.encode(json!({"exp": 50}).to_string());
        let token = format!("{}.{}.sig", header, body);
        assert_eq!(decode_claims(&token).unwrap().exp, Some(50));
        assert_eq!(expires_at(&token).map(|t| t.timestamp()), Some(50));
    }
}
