//! Bearer token issuing and validation
//!
//! Tokens are HS256 JWTs carrying the username as `sub` and an absolute
//! `exp`. Expiry is checked against the injected clock with no leeway, so a
//! token is rejected from the very second its `exp` is reached.

use std::{collections::HashSet, fmt::Debug, sync::Arc};

use chrono::Duration;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lifetime applied when a caller issues a token without choosing one
pub const FALLBACK_TOKEN_TTL_MINUTES: i64 = 15;

/// JWT claims structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject (username)
    pub sub: String,
    /// Issued at (unix seconds)
    pub iat: i64,
    /// Expiration (unix seconds)
    pub exp: i64,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("invalid token: {0}")]
    Invalid(String),

    #[error("token expired")]
    Expired,

    #[error("failed to sign token: {0}")]
    Signing(String),
}

/// Signs and verifies bearer tokens with a process-wide secret
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    clock: Arc<dyn Clock>,
}

impl Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("encoding_key", &"[hidden]")
            .field("decoding_key", &"[hidden]")
            .finish()
    }
}

impl TokenCodec {
    pub fn new(secret: &str, clock: Arc<dyn Clock>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked against `clock` in `validate`
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.required_spec_claims =
            HashSet::from(["exp".to_string(), "sub".to_string()]);

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            clock,
        }
    }

    /// Issue a token for `subject` valid for `ttl`, or for
    /// [`FALLBACK_TOKEN_TTL_MINUTES`] when no lifetime is given.
    pub fn issue(&self, subject: &str, ttl: Option<Duration>) -> Result<String, TokenError> {
        let ttl = ttl.unwrap_or_else(|| Duration::minutes(FALLBACK_TOKEN_TTL_MINUTES));
        let now = self.clock.utc();
        let expires_at = now
            .checked_add_signed(ttl)
            .ok_or_else(|| TokenError::Signing(format!("lifetime {} out of range", ttl)))?;

        let claims = TokenClaims {
            sub: subject.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Verify signature and expiry, returning the subject
    pub fn validate(&self, token: &str) -> Result<String, TokenError> {
        let claims = self.decode_claims(token)?;

        if self.clock.utc().timestamp() >= claims.exp {
            return Err(TokenError::Expired);
        }
        if claims.sub.is_empty() {
            return Err(TokenError::Invalid("empty subject".to_string()));
        }

        Ok(claims.sub)
    }

    fn decode_claims(&self, token: &str) -> Result<TokenClaims, TokenError> {
        decode::<TokenClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| TokenError::Invalid(e.to_string()))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use chrono::{DateTime, Duration, Local, TimeZone, Utc};
    use mockable::Clock;

    /// Clock that only moves when told to
    #[derive(Debug)]
    pub struct ManualClock {
        now: Mutex<DateTime<Utc>>,
    }

    impl ManualClock {
        pub fn new() -> Self {
            Self {
                now: Mutex::new(Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()),
            }
        }

        pub fn advance(&self, by: Duration) {
            let mut now = self.now.lock().unwrap();
            *now += by;
        }
    }

    impl Clock for ManualClock {
        fn local(&self) -> DateTime<Local> {
            self.utc().with_timezone(&Local)
        }

        fn utc(&self) -> DateTime<Utc> {
            *self.now.lock().unwrap()
        }
    }
}

#[cfg(test)]
mod tests {
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

    use super::testing::ManualClock;
    use super::*;

    const SECRET: &str = "test-signing-secret";

    fn codec() -> (TokenCodec, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        (TokenCodec::new(SECRET, clock.clone()), clock)
    }

    #[test]
    fn test_token_valid_until_expiry() {
        let (codec, clock) = codec();
        let token = codec.issue("alice", Some(Duration::minutes(30))).unwrap();

        assert_eq!(codec.validate(&token).unwrap(), "alice");

        clock.advance(Duration::minutes(30) - Duration::seconds(1));
        assert_eq!(codec.validate(&token).unwrap(), "alice");

        clock.advance(Duration::seconds(1));
        assert_eq!(codec.validate(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_issue_without_ttl_uses_fallback() {
        let (codec, clock) = codec();
        let token = codec.issue("alice", None).unwrap();
        let claims = codec.decode_claims(&token).unwrap();
        assert_eq!(claims.exp - claims.iat, FALLBACK_TOKEN_TTL_MINUTES * 60);

        clock.advance(Duration::minutes(FALLBACK_TOKEN_TTL_MINUTES));
        assert_eq!(codec.validate(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_unrepresentable_expiry_is_an_error() {
        let (codec, _clock) = codec();
        assert!(matches!(
            codec.issue("alice", Some(Duration::MAX)),
            Err(TokenError::Signing(_))
        ));
        assert!(matches!(
            codec.issue("alice", Some(Duration::days(365 * 300_000))),
            Err(TokenError::Signing(_))
        ));
    }

    #[test]
    fn test_any_flipped_signature_bit_is_rejected() {
        let (codec, _clock) = codec();
        let token = codec.issue("alice", None).unwrap();
        let (signed_part, signature) = token.rsplit_once('.').unwrap();
        let signature = URL_SAFE_NO_PAD.decode(signature).unwrap();

        for bit in 0..signature.len() * 8 {
            let mut tampered = signature.clone();
            tampered[bit / 8] ^= 1 << (bit % 8);
            let forged = format!("{}.{}", signed_part, URL_SAFE_NO_PAD.encode(&tampered));
            assert!(
                matches!(codec.validate(&forged), Err(TokenError::Invalid(_))),
                "bit {} flip accepted",
                bit
            );
        }
    }

    #[test]
    fn test_rewritten_payload_is_rejected() {
        let (codec, _clock) = codec();
        let token = codec.issue("alice", None).unwrap();
        let parts: Vec<&str> = token.split('.').collect();

        let mut claims = codec.decode_claims(&token).unwrap();
        claims.sub = "mallory".to_string();
        claims.exp += 3600;
        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims).unwrap());
        let forged = format!("{}.{}.{}", parts[0], payload, parts[2]);

        assert!(matches!(codec.validate(&forged), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn test_foreign_secret_and_garbage_are_rejected() {
        let (codec, clock) = codec();
        let other = TokenCodec::new("another-secret", clock);
        let token = other.issue("alice", None).unwrap();

        assert!(matches!(codec.validate(&token), Err(TokenError::Invalid(_))));
        assert!(matches!(codec.validate("not-a-token"), Err(TokenError::Invalid(_))));
        assert!(matches!(codec.validate(""), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn test_empty_subject_is_rejected() {
        let (codec, _clock) = codec();
        let token = codec.issue("", None).unwrap();
        assert!(matches!(codec.validate(&token), Err(TokenError::Invalid(_))));
    }
}
