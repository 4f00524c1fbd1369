//! HS256 bearer token issuing and validation.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};

use outpost_core::UserId;

use crate::claims::{JwtClaims, TokenError, validate_claims};

/// Issues and validates time-bounded bearer tokens.
///
/// There is no revocation list: a token stays valid until `exp`, even after a
/// password change or permission edit.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl core::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TokenService")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    pub const DEFAULT_TTL_MINUTES: i64 = 60 * 24;

    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
        }
    }

    /// Issue a token for `user_id`, valid from `now` for the configured TTL.
    pub fn issue(&self, user_id: UserId, now: DateTime<Utc>) -> Result<String, TokenError> {
        let expires_at = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| TokenError::Signing("token expiry out of range".to_string()))?;
        let claims = JwtClaims {
            sub: user_id,
            issued_at: now,
            expires_at,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Verify signature + structure, then check the time window against `now`.
    pub fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<UserId, TokenError> {
        // Expiry is checked by `validate_claims` so tests can inject `now`.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        let data = decode::<JwtClaims>(token, &self.decoding, &validation)
            .map_err(|e| TokenError::Malformed(e.to_string()))?;

        validate_claims(&data.claims, now)?;
        Ok(data.claims.sub)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new(b"test-secret", Duration::minutes(TokenService::DEFAULT_TTL_MINUTES))
    }

    #[test]
    fn issued_token_validates_to_same_user() {
        let svc = service();
        let user = UserId::new();
        let now = Utc::now();
        let token = svc.issue(user, now).unwrap();
        assert_eq!(svc.validate(&token, now + Duration::hours(1)).unwrap(), user);
    }

    #[test]
    fn token_expires_after_24_hours() {
        let svc = service();
        let now = Utc::now();
        let token = svc.issue(UserId::new(), now).unwrap();
        assert_eq!(
            svc.validate(&token, now + Duration::hours(25)),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn foreign_signature_is_malformed() {
        let now = Utc::now();
        let other = TokenService::new(b"other-secret", Duration::hours(1));
        let token = other.issue(UserId::new(), now).unwrap();
        assert!(matches!(service().validate(&token, now), Err(TokenError::Malformed(_))));
    }

    #[test]
    fn expiry_overflow_is_an_error() {
        let svc = TokenService::new(b"test-secret", Duration::days(365 * 1_000_000));
        assert!(matches!(
            svc.issue(UserId::new(), Utc::now()),
            Err(TokenError::Signing(_))
        ));
    }

    #[test]
    fn garbage_is_malformed() {
        assert!(matches!(
            service().validate("definitely.not.ajwt", Utc::now()),
            Err(TokenError::Malformed(_))
        ));
    }
}
