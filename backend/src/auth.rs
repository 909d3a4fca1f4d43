//! Access guard: HTTP Basic authentication against a fixed set of users, plus
//! per-route role checks.

use argon2::password_hash::{
    rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
};
use argon2::Argon2;
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::{engine::general_purpose::STANDARD, Engine};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::JoinError;

use crate::error::ApiError;

const REALM: &str = r#"Basic realm="tasks""#;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    User,
}

/// A provisioned user as it appears in configuration.
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub username: String,
    pub password: String,
    pub role: Role,
}

/// The authenticated caller, attached to the request as an extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub username: String,
    pub role: Role,
}

#[derive(Debug, thiserror::Error)]
pub enum GuardError {
    #[error("failed to hash password for {username}: {message}")]
    Hash { username: String, message: String },
    #[error("username '{0}' is provisioned more than once")]
    DuplicateUser(String),
}

struct StoredUser {
    password_hash: String,
    role: Role,
}

#[derive(Clone)]
pub struct AccessGuard {
    users: Arc<HashMap<String, StoredUser>>,
}

impl AccessGuard {
    /// Hashes every password up front; plaintext is dropped with `users`.
    pub fn new(users: &[UserCredentials]) -> Result<Self, GuardError> {
        let argon2 = Argon2::default();
        let mut stored = HashMap::with_capacity(users.len());
        for user in users {
            if stored.contains_key(&user.username) {
                return Err(GuardError::DuplicateUser(user.username.clone()));
            }
            let salt = SaltString::generate(&mut OsRng);
            let password_hash = argon2
                .hash_password(user.password.as_bytes(), &salt)
                .map_err(|e| GuardError::Hash {
                    username: user.username.clone(),
                    message: e.to_string(),
                })?
                .to_string();
            stored.insert(
                user.username.clone(),
                StoredUser {
                    password_hash,
                    role: user.role,
                },
            );
        }
        Ok(Self {
            users: Arc::new(stored),
        })
    }

    pub fn authenticate(&self, authorization: Option<&HeaderValue>) -> Option<Identity> {
        let (username, password) = parse_basic(authorization?)?;
        let user = self.users.get(&username)?;
        let hash = PasswordHash::new(&user.password_hash).ok()?;
        Argon2::default()
            .verify_password(password.as_bytes(), &hash)
            .ok()?;
        Some(Identity {
            username,
            role: user.role,
        })
    }
}

fn parse_basic(value: &HeaderValue) -> Option<(String, String)> {
    let (scheme, encoded) = value.to_str().ok()?.trim_start().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("Basic") {
        return None;
    }
    let decoded = String::from_utf8(STANDARD.decode(encoded.trim()).ok()?).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}

fn unauthorized() -> Response {
    (StatusCode::UNAUTHORIZED, [(header::WWW_AUTHENTICATE, REALM)]).into_response()
}

pub async fn require_auth(
    State(guard): State<AccessGuard>,
    mut request: Request,
    next: Next,
) -> Response {
    let authorization = request.headers().get(header::AUTHORIZATION).cloned();
    // Argon2 verification is CPU-bound; keep it off the async workers.
    let checked =
        tokio::task::spawn_blocking(move || guard.authenticate(authorization.as_ref())).await;
    match identity_from(checked) {
        Ok(identity) => {
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        Err(response) => {
            tracing::debug!(path = %request.uri().path(), "rejected request");
            response
        }
    }
}

fn identity_from(checked: Result<Option<Identity>, JoinError>) -> Result<Identity, Response> {
    match checked {
        Ok(Some(identity)) => Ok(identity),
        Ok(None) => Err(unauthorized()),
        Err(error) => {
            Err(ApiError::Internal(format!("credential check failed: {error}")).into_response())
        }
    }
}

pub async fn require_role(State(role): State<Role>, request: Request, next: Next) -> Response {
    match request.extensions().get::<Identity>() {
        Some(identity) if identity.role == role => next.run(request).await,
        Some(identity) => {
            tracing::debug!(user = %identity.username, ?role, "forbidden");
            StatusCode::FORBIDDEN.into_response()
        }
        None => unauthorized(),
    }
}
