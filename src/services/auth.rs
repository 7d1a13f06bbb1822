use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{DateTime, Duration, Utc};
use sqlx::SqlitePool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::db::users;
use crate::error::AppError;
use crate::models::{Session, User};

const BAD_CREDENTIALS: &str = "invalid username or password";

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("password hashing failed: {}", e)))
}

pub fn verify_password(password: &str, stored: &str) -> bool {
    match PasswordHash::new(stored) {
        Ok(hash) => Argon2::default()
            .verify_password(password.as_bytes(), &hash)
            .is_ok(),
        Err(e) => {
            warn!("stored password hash is unreadable: {}", e);
            false
        }
    }
}

pub async fn register(
    db: &SqlitePool,
    username: &str,
    password: &str,
    confirm: &str,
) -> Result<User, AppError> {
    let username = username.trim();
    if username.is_empty() {
        return Err(AppError::validation("username required"));
    }
    if password.is_empty() {
        return Err(AppError::validation("password required"));
    }
    if password != confirm {
        return Err(AppError::validation("passwords do not match"));
    }

    let mut tx = db.begin().await?;
    if users::find_user_by_username(&mut *tx, username).await?.is_some() {
        return Err(AppError::Conflict("username taken".to_string()));
    }

    let hash = hash_password(password)?;
    let user = users::insert_user(&mut *tx, username, &hash)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict("username taken".to_string())
            }
            other => AppError::Database(other),
        })?;
    tx.commit().await?;

    info!("registered user {}", user.username);
    Ok(user)
}

pub async fn authenticate(db: &SqlitePool, username: &str, password: &str) -> Result<User, AppError> {
    let user = users::find_user_by_username(db, username.trim())
        .await?
        .ok_or_else(|| AppError::Unauthorized(BAD_CREDENTIALS.to_string()))?;

    if !verify_password(password, &user.password_hash) {
        warn!("failed login for {}", user.username);
        return Err(AppError::Unauthorized(BAD_CREDENTIALS.to_string()));
    }

    Ok(user)
}

pub async fn start_session(db: &SqlitePool, user: &User, ttl: Duration) -> Result<Session, AppError> {
    let expires_at = Utc::now()
        .checked_add_signed(ttl)
        .ok_or_else(|| AppError::Internal(format!("session lifetime out of range: {}", ttl)))?;
    let session = Session {
        token: Uuid::new_v4().to_string(),
        user_id: user.id,
        expires_at: expires_at.to_rfc3339(),
    };
    users::insert_session(db, &session).await?;

    info!("user {} logged in", user.username);
    Ok(session)
}

/// The user behind `token`, if the session exists and is still live. Expired
/// sessions are removed on sight.
pub async fn resolve_session(db: &SqlitePool, token: &str) -> Result<Option<User>, AppError> {
    let Some(session) = users::find_session(db, token).await? else {
        return Ok(None);
    };

    if is_expired(&session.expires_at) {
        users::delete_session(db, token).await?;
        return Ok(None);
    }

    Ok(users::find_user_by_id(db, session.user_id).await?)
}

pub async fn end_session(db: &SqlitePool, token: &str) -> Result<(), AppError> {
    users::delete_session(db, token).await?;
    Ok(())
}

fn is_expired(expires_at: &str) -> bool {
    match DateTime::parse_from_rfc3339(expires_at) {
        Ok(at) => Utc::now() > at.with_timezone(&Utc),
        Err(_) => true,
    }
}
