use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use outpost_core::UserId;

/// JWT claims carried by an Outpost bearer token.
///
/// Only the subject is embedded: permissions and the admin flag are read
/// fresh from the credential store on every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject / user identifier.
    pub sub: UserId,

    /// Issued-at timestamp (seconds precision on the wire).
    #[serde(rename = "iat", with = "chrono::serde::ts_seconds")]
    pub issued_at: DateTime<Utc>,

    /// Expiration timestamp (seconds precision on the wire).
    #[serde(rename = "exp", with = "chrono::serde::ts_seconds")]
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("token has expired")]
    Expired,

    #[error("malformed token: {0}")]
    Malformed(String),

    #[error("token signing failed: {0}")]
    Signing(String),
}

/// Deterministically validate the time window of decoded claims.
///
/// Signature verification happens in [`crate::TokenService`]; this only
/// checks `iat`/`exp` against `now`.
pub fn validate_claims(claims: &JwtClaims, now: DateTime<Utc>) -> Result<(), TokenError> {
    if claims.expires_at <= claims.issued_at {
        return Err(TokenError::Malformed("expires_at <= issued_at".to_string()));
    }
    if now < claims.issued_at {
        return Err(TokenError::Malformed("issued in the future".to_string()));
    }
    if now >= claims.expires_at {
        return Err(TokenError::Expired);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn claims_at(issued: DateTime<Utc>, ttl: Duration) -> JwtClaims {
        JwtClaims {
            sub: UserId::new(),
            issued_at: issued,
            expires_at: issued + ttl,
        }
    }

    #[test]
    fn valid_inside_window() {
        let t0 = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();
        let claims = claims_at(t0, Duration::hours(24));
        assert_eq!(validate_claims(&claims, t0 + Duration::hours(23)), Ok(()));
    }

    #[test]
    fn expired_at_exact_boundary() {
        let t0 = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();
        let claims = claims_at(t0, Duration::hours(24));
        assert_eq!(
            validate_claims(&claims, t0 + Duration::hours(24)),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn inverted_window_is_malformed() {
        let t0 = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();
        let claims = claims_at(t0, Duration::seconds(-1));
        assert!(matches!(validate_claims(&claims, t0), Err(TokenError::Malformed(_))));
    }

    #[test]
    fn wire_format_uses_numeric_iat_and_exp() {
        let t0 = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let claims = claims_at(t0, Duration::seconds(60));
        let json = serde_json::to_value(&claims).unwrap();
        assert_eq!(json["iat"], serde_json::json!(t0.timestamp()));
        assert_eq!(json["exp"], serde_json::json!(t0.timestamp() + 60));
    }
}
