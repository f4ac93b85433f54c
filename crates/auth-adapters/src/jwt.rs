//! HS256 JSON Web Tokens implementing `TokenIssuer`.

use chrono::{Duration, Utc};
use domains::{DomainError, Identity, Result, TokenIssuer};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    /// User id
    sub: String,
    username: String,
    iat: i64,
    exp: i64,
}

pub struct JwtIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl JwtIssuer {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl,
        }
    }
}

impl TokenIssuer for JwtIssuer {
    fn issue(&self, identity: &Identity) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: identity.user_id.to_string(),
            username: identity.username.clone(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(DomainError::internal)
    }

    fn verify(&self, token: &str) -> Result<Identity> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|err| {
            tracing::debug!(error = %err, "rejected bearer token");
            DomainError::unauthorized("invalid or expired token")
        })?;
        let user_id = Uuid::parse_str(&data.claims.sub)
            .map_err(|_| DomainError::unauthorized("invalid token subject"))?;
        Ok(Identity {
            user_id,
            username: data.claims.username,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> Identity {
        Identity {
            user_id: Uuid::now_v7(),
            username: "alice".into(),
        }
    }

    #[test]
    fn test_issued_token_verifies() {
        let issuer = JwtIssuer::new(b"test-secret", Duration::hours(1));
        let who = identity();
        let token = issuer.issue(&who).unwrap();
        assert_eq!(issuer.verify(&token).unwrap(), who);
    }

    #[test]
    fn test_foreign_signature_is_unauthorized() {
        let token = JwtIssuer::new(b"one", Duration::hours(1))
            .issue(&identity())
            .unwrap();
        let err = JwtIssuer::new(b"two", Duration::hours(1))
            .verify(&token)
            .unwrap_err();
        assert!(matches!(err, DomainError::Unauthorized(_)));
    }

    #[test]
    fn test_expired_token_is_unauthorized() {
        let issuer = JwtIssuer::new(b"test-secret", Duration::seconds(-120));
        let token = issuer.issue(&identity()).unwrap();
        assert!(issuer.verify(&token).is_err());
    }
}
