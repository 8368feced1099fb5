//! # pm-auth-argon
//!
//! Argon2-based implementation of `AuthProvider`.
//! Handles password hashing and stateless, signed session tokens (HS256 JWT),
//! so no session table lives in process memory.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use pm_core::models::{SessionUser, User};
use pm_core::traits::AuthProvider;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Serialize, Deserialize)]
struct SessionClaims {
    /// User id
    sub: String,
    name: String,
    exp: i64,
    iat: i64,
}

pub struct ArgonAuthProvider {
    encoding: EncodingKey,
    decoding: DecodingKey,
    session_ttl: Duration,
}

impl ArgonAuthProvider {
    /// Accepts the signing secret (e.g., from configuration) and how long
    /// issued sessions stay valid.
    pub fn new(secret: &[u8], session_ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            session_ttl,
        }
    }

    pub fn session_ttl(&self) -> Duration {
        self.session_ttl
    }
}

impl AuthProvider for ArgonAuthProvider {
    /// Produces a PHC string ("$argon2id$v=19$...") with a random salt.
    fn hash_password(&self, password: &str) -> anyhow::Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| anyhow::anyhow!("hashing password: {e}"))?;
        Ok(hash.to_string())
    }

    /// Verifies if a provided password matches a stored Argon2 hash.
    fn verify_password(&self, password: &str, hash: &str) -> bool {
        let parsed_hash = match PasswordHash::new(hash) {
            Ok(p) => p,
            Err(_) => return false,
        };
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }

    fn issue_session(&self, user: &User) -> anyhow::Result<String> {
        let now = Utc::now();
        let claims = SessionClaims {
            sub: user.id.clone(),
            name: user.username.clone(),
            iat: now.timestamp(),
            exp: (now + self.session_ttl).timestamp(),
        };
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?)
    }

    fn resolve_session(&self, token: &str) -> Option<SessionUser> {
        let validation = Validation::new(Algorithm::HS256);
        match decode::<SessionClaims>(token, &self.decoding, &validation) {
            Ok(data) => Some(SessionUser {
                user_id: data.claims.sub,
                username: data.claims.name,
            }),
            Err(e) => {
                debug!(error = %e, "rejected session token");
                None
            }
        }
    }
}
