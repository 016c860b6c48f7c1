//! Session expiry evaluation over bearer tokens issued by the identity provider.
//!
//! Nothing here verifies a signature. The claims are read only to decide when
//! the front-end should sign the user out; the backend remains the only
//! authority on whether a token is valid.

use base64::engine::{general_purpose::GeneralPurpose, DecodePaddingMode, GeneralPurposeConfig};
use base64::{alphabet, Engine};
use chrono::Utc;
use serde::{Deserialize, Deserializer, Serialize};

/// base64url, with or without trailing `=`.
const TOKEN_SEGMENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Payload claims read from a token without checking its signature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnverifiedClaims {
    /// User id. Some issuers emit it as a JSON number.
    #[serde(deserialize_with = "string_or_number")]
    pub sub: String,
    pub username: String,
    /// Issued-at, epoch seconds. Any JSON number.
    pub iat: f64,
    /// Expiry, epoch seconds. Any JSON number; the only input to the expiry decision.
    pub exp: f64,
}

impl UnverifiedClaims {
    /// First whole millisecond at or after `exp * 1000`.
    pub fn expires_at_ms(&self) -> i64 {
        // float to int casts saturate
        (self.exp * 1000.0).ceil() as i64
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Sub {
        Text(String),
        Number(i64),
    }

    Ok(match Sub::deserialize(deserializer)? {
        Sub::Text(s) => s,
        Sub::Number(n) => n.to_string(),
    })
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("Malformed token: {0}")]
    MalformedToken(String),
}

/// Reads the payload segment of `token` without verifying it.
///
/// For display and expiry hints only. Never use the result to grant access.
pub fn peek_unverified_claims(token: &str) -> Result<UnverifiedClaims, SessionError> {
    let payload = token
        .split('.')
        .nth(1)
        .ok_or_else(|| SessionError::MalformedToken("expected at least two segments".to_string()))?;

    let bytes = TOKEN_SEGMENT
        .decode(payload)
        .map_err(|e| SessionError::MalformedToken(format!("payload is not base64url: {}", e)))?;

    let text = String::from_utf8(bytes)
        .map_err(|_| SessionError::MalformedToken("payload is not UTF-8".to_string()))?;

    serde_json::from_str(&text)
        .map_err(|e| SessionError::MalformedToken(format!("payload is not a claims object: {}", e)))
}

/// `true` once `now_ms` (epoch milliseconds) reaches `exp` (epoch seconds).
pub fn is_session_expired(claims: &UnverifiedClaims, now_ms: i64) -> bool {
    now_ms >= claims.expires_at_ms()
}

pub fn is_session_expired_now(claims: &UnverifiedClaims) -> bool {
    is_session_expired(claims, Utc::now().timestamp_millis())
}

/// Outcome of looking at a bearer token.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionStatus {
    Active(UnverifiedClaims),
    Expired(UnverifiedClaims),
    /// The token could not be read. Handled like an expired session.
    Invalid(SessionError),
}

impl SessionStatus {
    /// Whether the caller must sign the user out and send them to login.
    pub fn requires_sign_out(&self) -> bool {
        !matches!(self, SessionStatus::Active(_))
    }

    pub fn claims(&self) -> Option<&UnverifiedClaims> {
        match self {
            SessionStatus::Active(claims) | SessionStatus::Expired(claims) => Some(claims),
            SessionStatus::Invalid(_) => None,
        }
    }
}

pub fn evaluate_session(token: &str, now_ms: i64) -> SessionStatus {
    match peek_unverified_claims(token) {
        Ok(claims) if is_session_expired(&claims, now_ms) => {
            tracing::debug!(sub = %claims.sub, exp = claims.exp, "session expired");
            SessionStatus::Expired(claims)
        }
        Ok(claims) => SessionStatus::Active(claims),
        Err(e) => {
            tracing::debug!("unreadable session token: {}", e);
            SessionStatus::Invalid(e)
        }
    }
}
