use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::Identity;
use crate::entities::Role;
use crate::error::Error;

const DEFAULT_TTL_DAYS: i64 = 7;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: Uuid,
    role: Role,
    email_verified: bool,
    exp: i64,
}

/// HS256 bearer tokens shared with the identity service that signs users in.
pub struct TokenAuthority {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenAuthority {
    pub fn new(secret: &[u8]) -> Self {
        Self::with_ttl(secret, Duration::days(DEFAULT_TTL_DAYS))
    }

    pub fn with_ttl(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation: Validation::new(Algorithm::HS256),
            ttl,
        }
    }

    pub fn issue(&self, identity: &Identity) -> Result<String, Error> {
        let claims = Claims {
            sub: identity.id,
            role: identity.role,
            email_verified: identity.email_verified,
            exp: (Utc::now() + self.ttl).timestamp(),
        };

        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?)
    }

    pub fn verify(&self, token: &str) -> Result<Identity, Error> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|err| {
            tracing::debug!(error = %err, "rejected bearer token");
            Error::unauthenticated()
        })?;

        let claims = data.claims;
        Ok(Identity::new(claims.sub, claims.role, claims.email_verified))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test-secret";

    #[test]
    fn issued_token_resolves_to_identity() {
        let authority = TokenAuthority::new(SECRET);
        let identity = Identity::new(Uuid::new_v4(), Role::Driver, false);

        let token = authority.issue(&identity).unwrap();
        assert_eq!(authority.verify(&token).unwrap(), identity);
    }

    #[test]
    fn expired_token_is_unauthenticated() {
        let authority = TokenAuthority::with_ttl(SECRET, Duration::minutes(-10));
        let token = authority
            .issue(&Identity::new(Uuid::new_v4(), Role::Rider, true))
            .unwrap();

        assert!(authority.verify(&token).unwrap_err().is_unauthenticated());
    }

    #[test]
    fn foreign_signature_is_unauthenticated() {
        let token = TokenAuthority::new(b"other-secret")
            .issue(&Identity::new(Uuid::new_v4(), Role::Rider, true))
            .unwrap();

        let err = TokenAuthority::new(SECRET).verify(&token).unwrap_err();
        assert!(err.is_unauthenticated());
    }

    #[test]
    fn garbage_is_unauthenticated() {
        let authority = TokenAuthority::new(SECRET);
        assert!(authority.verify("not-a-token").unwrap_err().is_unauthenticated());
        assert!(authority.verify("").unwrap_err().is_unauthenticated());
    }
}
