//! Session token generation and validation

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use joinhub_shared::Role;
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

/// Issuer tag embedded in every token this service signs
const ISSUER: &str = "joinhub";

/// Claims carried by a JoinHub session token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: Uuid,
    /// Email at issue time
    pub email: String,
    /// Role at issue time
    pub role: Role,
    /// Issued at
    pub iat: i64,
    /// Expiration
    pub exp: i64,
    /// Issuer
    pub iss: String,
}

/// Signs and verifies session tokens
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl_hours: i64,
}

impl TokenCodec {
    pub fn new(secret: &str, ttl_hours: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl_hours,
        }
    }

    /// Issue a signed token for the given account
    pub fn issue(&self, user_id: Uuid, email: &str, role: Role) -> Result<String, TokenError> {
        let now = OffsetDateTime::now_utc();
        let exp = now + Duration::hours(self.ttl_hours);

        let claims = Claims {
            sub: user_id,
            email: email.to_string(),
            role,
            iat: now.unix_timestamp(),
            exp: exp.unix_timestamp(),
            iss: ISSUER.to_string(),
        };

        // Explicit algorithm prevents algorithm confusion attacks
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Encoding(e.to_string()))
    }

    /// Validate signature, expiry and issuer, and return the claims
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 60; // 60 second clock skew tolerance
        validation.set_issuer(&[ISSUER]);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            })
    }

    /// Token lifetime in seconds, for `expires_in` response fields and
    /// cookie Max-Age
    pub fn ttl_seconds(&self) -> i64 {
        self.ttl_hours * 3600
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("Token has expired")]
    Expired,
    #[error("Invalid token")]
    Invalid,
    #[error("Token encoding failed: {0}")]
    Encoding(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-at-least-32-chars!";

    #[test]
    fn test_issue_and_verify() {
        let codec = TokenCodec::new(SECRET, 168);
        let user_id = Uuid::new_v4();

        let token = codec
            .issue(user_id, "test@example.com", Role::Interviewee)
            .expect("Failed to issue token");

        let claims = codec.verify(&token).expect("Invalid token");
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.email, "test@example.com");
        assert_eq!(claims.role, Role::Interviewee);
        assert_eq!(claims.iss, ISSUER);
        assert_eq!(claims.exp - claims.iat, 168 * 3600);
    }

    #[test]
    fn test_tampered_token_rejected() {
        let codec = TokenCodec::new(SECRET, 168);
        let token = codec
            .issue(Uuid::new_v4(), "test@example.com", Role::Interviewer)
            .expect("Failed to issue token");

        let mut tampered = token.clone();
        tampered.push('x');
        assert!(matches!(codec.verify(&tampered), Err(TokenError::Invalid)));
        assert!(matches!(codec.verify("not-a-jwt"), Err(TokenError::Invalid)));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let codec = TokenCodec::new(SECRET, 168);
        let other = TokenCodec::new("another-secret-key-with-32-chars!!", 168);

        let token = codec
            .issue(Uuid::new_v4(), "test@example.com", Role::Interviewee)
            .expect("Failed to issue token");
        assert!(matches!(other.verify(&token), Err(TokenError::Invalid)));
    }

    #[test]
    fn test_expired_token() {
        let codec = TokenCodec::new(SECRET, 168);
        let now = OffsetDateTime::now_utc();

        // Expired beyond the 60s leeway
        let claims = Claims {
            sub: Uuid::new_v4(),
            email: "test@example.com".to_string(),
            role: Role::Interviewee,
            iat: (now - Duration::hours(2)).unix_timestamp(),
            exp: (now - Duration::hours(1)).unix_timestamp(),
            iss: ISSUER.to_string(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .expect("Failed to encode token");

        assert!(matches!(codec.verify(&token), Err(TokenError::Expired)));
    }

    #[test]
    fn test_wrong_issuer_rejected() {
        let codec = TokenCodec::new(SECRET, 168);
        let now = OffsetDateTime::now_utc();

        let claims = Claims {
            sub: Uuid::new_v4(),
            email: "test@example.com".to_string(),
            role: Role::Interviewee,
            iat: now.unix_timestamp(),
            exp: (now + Duration::hours(1)).unix_timestamp(),
            iss: "someone-else".to_string(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .expect("Failed to encode token");

        assert!(matches!(codec.verify(&token), Err(TokenError::Invalid)));
    }
}
