use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::{AuthError, AuthResult};

pub const MAX_SESSION_HOURS: i64 = 72;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub tier: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Clone)]
pub struct TokenIssuer {
    secret: Vec<u8>,
}

impl TokenIssuer {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self { secret: secret.into() }
    }

    pub fn issue(&self, user_id: &str, tier: &str, now: DateTime<Utc>, ttl_hours: i64) -> AuthResult<String> {
        let ttl = ttl_hours.clamp(1, MAX_SESSION_HOURS);
        let claims = Claims {
            sub: user_id.to_string(),
            tier: tier.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::hours(ttl)).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &EncodingKey::from_secret(&self.secret))
            .map_err(|_| AuthError::Malformed)
    }

    /// Decode and check expiry. Subject existence/deactivation is checked
    /// separately against the user store by the caller.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> AuthResult<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false; // checked manually below for a distinct error kind
        let data = decode::<Claims>(token, &DecodingKey::from_secret(&self.secret), &validation)
            .map_err(|_| AuthError::Malformed)?;
        if data.claims.exp < now.timestamp() {
            return Err(AuthError::Expired);
        }
        Ok(data.claims)
    }
}
