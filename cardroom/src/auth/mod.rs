//! Bearer-token authentication.
//!
//! Thin by design: the gateways only need to turn a password into a stored
//! hash, a login into a signed token, and a token back into a player id.
//! Hashes are Argon2id over the peppered password; tokens are HS256 JWTs.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::game::entities::PlayerId;
use crate::game::errors::GameError;

/// Access-token claims.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Claims {
    /// Player id.
    pub sub: PlayerId,
    pub username: String,
    pub exp: i64,
    pub iat: i64,
}

#[derive(Clone)]
pub struct AuthManager {
    jwt_secret: String,
    pepper: String,
    token_ttl: Duration,
}

impl AuthManager {
    pub fn new(jwt_secret: String, pepper: String) -> Self {
        Self {
            jwt_secret,
            pepper,
            token_ttl: Duration::hours(12),
        }
    }

    fn peppered(&self, password: &str) -> String {
        format!("{password}{}", self.pepper)
    }

    pub fn hash_password(&self, password: &str) -> Result<String, GameError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(self.peppered(password).as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| GameError::Internal(format!("password hashing: {e}")))
    }

    pub fn verify_password(&self, password: &str, hash: &str) -> Result<(), GameError> {
        let parsed =
            PasswordHash::new(hash).map_err(|e| GameError::Internal(format!("bad hash: {e}")))?;
        Argon2::default()
            .verify_password(self.peppered(password).as_bytes(), &parsed)
            .map_err(|_| GameError::Unauthenticated)
    }

    pub fn issue_token(
        &self,
        player_id: PlayerId,
        username: &str,
        now: DateTime<Utc>,
    ) -> Result<String, GameError> {
        let claims = Claims {
            sub: player_id,
            username: username.to_string(),
            iat: now.timestamp(),
            exp: (now + self.token_ttl).timestamp(),
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| GameError::Internal(format!("token signing: {e}")))
    }

    pub fn verify_token(&self, token: &str) -> Result<Claims, GameError> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|_| GameError::Unauthenticated)
    }
}
