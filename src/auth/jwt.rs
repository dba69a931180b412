//! JWT issue and validation.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,
    #[error("invalid token signature")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
    #[error("token signing failed: {0}")]
    Signing(String),
}

/// `iat` and `exp` are fractional NumericDates (seconds, microsecond precision).
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user_id
    pub iat: f64,
    pub exp: f64,
}

fn numeric_date(at: DateTime<Utc>) -> f64 {
    at.timestamp_micros() as f64 / 1_000_000.0
}

/// A freshly signed token and the instant it stops being accepted.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Issues and checks bearer tokens. Pure functions of their inputs and the secret;
/// nothing about issued tokens is remembered.
pub trait TokenService: Send + Sync {
    fn issue(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<IssuedToken, TokenError>;

    /// Returns the subject of a well-formed, correctly signed token with `now < exp`.
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<Uuid, TokenError>;
}

/// HS256 tokens signed with a server-held secret.
#[derive(Clone)]
pub struct JwtTokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl fmt::Debug for JwtTokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtTokenService")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl JwtTokenService {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    fn validation() -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked against the caller's clock below; a fractional
        // `exp` is not an integer to jsonwebtoken, so only `sub` is required here.
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["sub"]);
        validation
    }
}

impl TokenService for JwtTokenService {
    fn issue(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<IssuedToken, TokenError> {
        let expires_at = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| TokenError::Signing("expiry out of range".to_string()))?;
        let claims = Claims {
            sub: user_id.to_string(),
            iat: numeric_date(now),
            exp: numeric_date(expires_at),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))?;
        Ok(IssuedToken { token, expires_at })
    }

    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<Uuid, TokenError> {
        let data = decode::<Claims>(token, &self.decoding, &Self::validation()).map_err(|e| {
            match e.kind() {
                ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Malformed,
            }
        })?;
        if numeric_date(now) >= data.claims.exp {
            return Err(TokenError::Expired);
        }
        Uuid::parse_str(&data.claims.sub).map_err(|_| TokenError::Malformed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const SECRET: &str = "test-jwt-secret-min-32-chars!!!!";

    fn service() -> JwtTokenService {
        JwtTokenService::new(SECRET, Duration::hours(1))
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    /// Replace one character of the given segment with a different base64url character.
    fn flip(token: &str, segment: usize) -> String {
        let mut parts: Vec<String> = token.split('.').map(str::to_string).collect();
        let first = parts[segment].remove(0);
        let replacement = if first == 'A' { 'B' } else { 'A' };
        parts[segment].insert(0, replacement);
        parts.join(".")
    }

    #[test]
    fn issue_then_validate_returns_subject() {
        let svc = service();
        let user = Uuid::new_v4();
        let issued = svc.issue(user, t0()).unwrap();
        assert_eq!(issued.token.split('.').count(), 3);
        assert_eq!(issued.expires_at, t0() + Duration::hours(1));
        assert_eq!(svc.validate(&issued.token, t0()).unwrap(), user);
        assert_eq!(
            svc.validate(&issued.token, t0() + Duration::minutes(59)).unwrap(),
            user
        );
    }

    #[test]
    fn token_expires_at_ttl() {
        let svc = service();
        let issued = svc.issue(Uuid::new_v4(), t0()).unwrap();
        let last_valid = t0() + Duration::hours(1) - Duration::seconds(1);
        assert!(svc.validate(&issued.token, last_valid).is_ok());
        assert_eq!(
            svc.validate(&issued.token, t0() + Duration::hours(1)),
            Err(TokenError::Expired)
        );
        assert_eq!(
            svc.validate(&issued.token, t0() + Duration::days(3)),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn sub_second_issue_time_keeps_full_lifetime() {
        let svc = service();
        let user = Uuid::new_v4();
        let issued_at = t0() + Duration::milliseconds(900);
        let issued = svc.issue(user, issued_at).unwrap();
        assert_eq!(issued.expires_at, issued_at + Duration::hours(1));

        let almost = issued_at + Duration::hours(1) - Duration::milliseconds(100);
        assert_eq!(svc.validate(&issued.token, almost).unwrap(), user);
        let just_before = issued_at + Duration::hours(1) - Duration::milliseconds(1);
        assert_eq!(svc.validate(&issued.token, just_before).unwrap(), user);
        assert_eq!(
            svc.validate(&issued.token, issued_at + Duration::hours(1)),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn missing_expiry_is_malformed() {
        let token = encode(
            &Header::new(Algorithm::HS256),
            &serde_json::json!({ "sub": Uuid::new_v4().to_string() }),
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();
        assert_eq!(service().validate(&token, t0()), Err(TokenError::Malformed));
    }

    #[test]
    fn tampered_signature_is_rejected() {
        let svc = service();
        let issued = svc.issue(Uuid::new_v4(), t0()).unwrap();
        assert_eq!(
            svc.validate(&flip(&issued.token, 2), t0()),
            Err(TokenError::InvalidSignature)
        );
    }

    #[test]
    fn tampered_claims_are_rejected() {
        let svc = service();
        let issued = svc.issue(Uuid::new_v4(), t0()).unwrap();
        assert!(svc.validate(&flip(&issued.token, 1), t0()).is_err());
    }

    #[test]
    fn other_secret_is_rejected() {
        let issued = service().issue(Uuid::new_v4(), t0()).unwrap();
        let other = JwtTokenService::new("another-secret-that-is-32-bytes!", Duration::hours(1));
        assert_eq!(
            other.validate(&issued.token, t0()),
            Err(TokenError::InvalidSignature)
        );
    }

    #[test]
    fn structural_garbage_is_malformed() {
        let svc = service();
        assert_eq!(svc.validate("", t0()), Err(TokenError::Malformed));
        assert_eq!(svc.validate("abc", t0()), Err(TokenError::Malformed));
        assert_eq!(svc.validate("a.b", t0()), Err(TokenError::Malformed));
        assert_eq!(svc.validate("a.b.c.d", t0()), Err(TokenError::Malformed));
        assert_eq!(svc.validate("!!!.@@@.###", t0()), Err(TokenError::Malformed));
    }

    #[test]
    fn other_algorithm_is_rejected() {
        let claims = Claims {
            sub: Uuid::new_v4().to_string(),
            iat: numeric_date(t0()),
            exp: numeric_date(t0() + Duration::hours(1)),
        };
        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();
        assert_eq!(service().validate(&token, t0()), Err(TokenError::Malformed));
    }

    #[test]
    fn non_uuid_subject_is_malformed() {
        let claims = Claims {
            sub: "admin".to_string(),
            iat: numeric_date(t0()),
            exp: numeric_date(t0() + Duration::hours(1)),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();
        assert_eq!(service().validate(&token, t0()), Err(TokenError::Malformed));
    }

    #[test]
    fn debug_does_not_print_keys() {
        let rendered = format!("{:?}", service());
        assert!(!rendered.contains(SECRET));
    }
}
