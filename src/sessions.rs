//! Session and credential handling. Raw tokens are handed to the client
//! once; only digests are persisted.

use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use chrono::Utc;
use rand::{distributions::Alphanumeric, Rng};
use rusqlite::{Connection, OptionalExtension};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::{error::ApiError, models::User, state::AppState};

pub fn sha256_hex(input: &str) -> String {
    let digest = Sha256::digest(input.as_bytes());
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

fn new_salt() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(16)
        .map(char::from)
        .collect()
}

fn hash_password(password: &str, salt: &str) -> String {
    sha256_hex(&format!("{salt}{password}"))
}

pub fn create_user(
    conn: &Connection,
    email: &str,
    password: &str,
    name: &str,
) -> Result<User, ApiError> {
    let email = email.trim().to_lowercase();

    if email.is_empty() || !email.contains('@') {
        return Err(ApiError::Validation("a valid email is required".to_string()));
    }
    if password.len() < 8 {
        return Err(ApiError::Validation(
            "password must be at least 8 characters".to_string(),
        ));
    }
    if name.trim().is_empty() {
        return Err(ApiError::Validation("a name is required".to_string()));
    }

    let existing: Option<String> = conn
        .query_row("SELECT id FROM users WHERE email = ?1", [&email], |row| {
            row.get(0)
        })
        .optional()?;

    if existing.is_some() {
        return Err(ApiError::Validation("email already registered".to_string()));
    }

    let id = Uuid::new_v4().to_string();
    let salt = new_salt();
    let hash = hash_password(password, &salt);

    conn.execute(
        "INSERT INTO users (id, email, password_hash, password_salt, name) VALUES (?1, ?2, ?3, ?4, ?5)",
        rusqlite::params![id, email, hash, salt, name.trim()],
    )?;

    user_by_id(conn, &id)?.ok_or_else(|| ApiError::Internal("user row missing after insert".to_string()))
}

pub fn verify_credentials(
    conn: &Connection,
    email: &str,
    password: &str,
) -> Result<User, ApiError> {
    let email = email.trim().to_lowercase();

    let user = user_by_email(conn, &email)?.ok_or(ApiError::Unauthorized)?;

    if hash_password(password, &user.password_salt) != user.password_hash {
        return Err(ApiError::Unauthorized);
    }

    Ok(user)
}

pub fn create_session(
    conn: &Connection,
    user_id: &str,
    ttl_hours: i64,
) -> Result<String, rusqlite::Error> {
    let token = Uuid::new_v4().simple().to_string();
    let expires_at = Utc::now().timestamp() + ttl_hours * 3600;

    conn.execute(
        "INSERT INTO sessions (token_hash, user_id, expires_at) VALUES (?1, ?2, ?3)",
        rusqlite::params![sha256_hex(&token), user_id, expires_at],
    )?;

    Ok(token)
}

pub fn resolve_token(conn: &Connection, token: &str) -> Result<Option<String>, rusqlite::Error> {
    conn.query_row(
        "SELECT user_id FROM sessions WHERE token_hash = ?1 AND expires_at > ?2",
        rusqlite::params![sha256_hex(token), Utc::now().timestamp()],
        |row| row.get(0),
    )
    .optional()
}

pub fn revoke_session(conn: &Connection, token: &str) -> Result<(), rusqlite::Error> {
    conn.execute(
        "DELETE FROM sessions WHERE token_hash = ?1",
        [sha256_hex(token)],
    )?;

    Ok(())
}

pub fn user_by_id(conn: &Connection, id: &str) -> Result<Option<User>, rusqlite::Error> {
    conn.query_row(
        "SELECT id, email, password_hash, password_salt, name, created_at FROM users WHERE id = ?1",
        [id],
        map_user,
    )
    .optional()
}

fn user_by_email(conn: &Connection, email: &str) -> Result<Option<User>, rusqlite::Error> {
    conn.query_row(
        "SELECT id, email, password_hash, password_salt, name, created_at FROM users WHERE email = ?1",
        [email],
        map_user,
    )
    .optional()
}

fn map_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        password_hash: row.get(2)?,
        password_salt: row.get(3)?,
        name: row.get(4)?,
        created_at: row.get(5)?,
    })
}

/// The caller identity every cart and order handler runs under: given a
/// request, yields a user id or rejects with 401.
pub struct AuthUser {
    pub id: String,
}

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)
            .ok_or(ApiError::Unauthorized)?
            .to_string();

        let conn = state.db.lock()?;
        let user_id = resolve_token(&conn, &token)?.ok_or(ApiError::Unauthorized)?;

        Ok(AuthUser { id: user_id })
    }
}

pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}
