use sqlx::{SqliteExecutor, SqlitePool};

use crate::models::{Flash, FlashKind, Session, User};

pub async fn find_user_by_username<'e, E: SqliteExecutor<'e>>(
    db: E,
    username: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "SELECT id, username, password_hash FROM users WHERE username = ? LIMIT 1"
    )
    .bind(username)
    .fetch_optional(db)
    .await
}

pub async fn find_user_by_id<'e, E: SqliteExecutor<'e>>(
    db: E,
    id: i64,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "SELECT id, username, password_hash FROM users WHERE id = ?"
    )
    .bind(id)
    .fetch_optional(db)
    .await
}

pub async fn insert_user<'e, E: SqliteExecutor<'e>>(
    db: E,
    username: &str,
    password_hash: &str,
) -> Result<User, sqlx::Error> {
    let id = sqlx::query("INSERT INTO users (username, password_hash) VALUES (?1, ?2)")
        .bind(username)
        .bind(password_hash)
        .execute(db)
        .await?
        .last_insert_rowid();

    Ok(User {
        id,
        username: username.to_string(),
        password_hash: password_hash.to_string(),
    })
}

pub async fn insert_session<'e, E: SqliteExecutor<'e>>(
    db: E,
    session: &Session,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO sessions (token, user_id, expires_at) VALUES (?1, ?2, ?3)")
        .bind(&session.token)
        .bind(session.user_id)
        .bind(&session.expires_at)
        .execute(db)
        .await?;

    Ok(())
}

pub async fn find_session<'e, E: SqliteExecutor<'e>>(
    db: E,
    token: &str,
) -> Result<Option<Session>, sqlx::Error> {
    sqlx::query_as::<_, Session>(
        "SELECT token, user_id, expires_at FROM sessions WHERE token = ?"
    )
    .bind(token)
    .fetch_optional(db)
    .await
}

pub async fn delete_session<'e, E: SqliteExecutor<'e>>(db: E, token: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM sessions WHERE token = ?")
        .bind(token)
        .execute(db)
        .await?
        .rows_affected();

    Ok(result > 0)
}

pub async fn set_flash<'e, E: SqliteExecutor<'e>>(
    db: E,
    token: &str,
    flash: &Flash,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE sessions SET flash_kind = ?1, flash_message = ?2 WHERE token = ?3")
        .bind(flash.kind)
        .bind(&flash.message)
        .bind(token)
        .execute(db)
        .await?;

    Ok(())
}

/// Reads and clears the session's pending message.
pub async fn take_flash(db: &SqlitePool, token: &str) -> Result<Option<Flash>, sqlx::Error> {
    let mut tx = db.begin().await?;

    let row: Option<(Option<FlashKind>, Option<String>)> = sqlx::query_as(
        "SELECT flash_kind, flash_message FROM sessions WHERE token = ?"
    )
    .bind(token)
    .fetch_optional(&mut *tx)
    .await?;

    let flash = match row {
        Some((Some(kind), Some(message))) => Some(Flash { kind, message }),
        _ => return Ok(None),
    };

    sqlx::query("UPDATE sessions SET flash_kind = NULL, flash_message = NULL WHERE token = ?")
        .bind(token)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    Ok(flash)
}
